use glam::Vec2;
use trail_arena_core::{
    AgentId, Boundary, Command, Controller, Direction, Event, GridCell, Lifecycle, Occupant,
    OccupantKind, OccupancyView,
};
use trail_arena_system_spawning::{Config, Spawning};
use trail_arena_world::{self as world, query, World};

const REQUEST: Event = Event::OpponentRequested {
    requested_by: AgentId::new(0),
};

fn started_world() -> World {
    let mut world = World::default();
    let mut events = Vec::new();
    world::apply(&mut world, Command::StartMatch, &mut events);
    world
}

#[test]
fn opponent_request_spawns_a_grace_period_opponent() {
    let mut world = started_world();
    let mut spawning = Spawning::new(Config::new(60, 0x4d59_5df4_d0f3_3173));
    let look_ahead = query::config(&world).ai.look_ahead;

    let mut commands = Vec::new();
    spawning.handle(
        &[REQUEST],
        &query::occupancy_view(&world),
        look_ahead,
        &mut commands,
    );
    assert_eq!(commands.len(), 1);

    let mut events = Vec::new();
    for command in commands {
        world::apply(&mut world, command, &mut events);
    }
    let spawned = events
        .iter()
        .find_map(|event| match event {
            Event::AgentSpawned {
                agent, controller, ..
            } => Some((*agent, *controller)),
            _ => None,
        })
        .expect("opponent spawned");
    assert_eq!(spawned.1, Controller::Ai);

    let view = query::agent_view(&world);
    let snapshot = view.get(spawned.0).expect("snapshot");
    assert_eq!(snapshot.lifecycle, Lifecycle::Spawning);
}

#[test]
fn spawns_face_the_longest_clear_run() {
    let world = started_world();
    let occupancy = query::occupancy_view(&world);
    let look_ahead = query::config(&world).ai.look_ahead;

    for seed in 0..16 {
        let mut spawning = Spawning::new(Config::new(60, seed));
        let mut commands = Vec::new();
        spawning.handle(&[REQUEST, REQUEST], &occupancy, look_ahead, &mut commands);
        assert_eq!(commands.len(), 2);

        let mut cells = Vec::new();
        for command in &commands {
            let Command::SpawnOpponent {
                position,
                direction,
                ..
            } = command
            else {
                panic!("unexpected command emitted: {command:?}");
            };
            let cell = occupancy.cell_of(*position);
            assert!(occupancy.is_isolated(cell));
            let chosen = occupancy.safe_run(cell, *direction, look_ahead);
            let best = Direction::ALL
                .iter()
                .map(|candidate| occupancy.safe_run(cell, *candidate, look_ahead))
                .max()
                .unwrap_or(0);
            assert_eq!(chosen, best, "seed {seed} picked a shorter run");
            cells.push(cell);
        }
        assert_ne!(cells[0], cells[1], "two requests need two cells");
    }
}

#[test]
fn crowded_arena_skips_the_request() {
    let boundary = Boundary::new(0.0, 6.0, 0.0, 6.0);
    let owner = Occupant {
        agent: AgentId::new(0),
        kind: OccupantKind::Trail,
    };
    let occupancy = OccupancyView::from_positions(
        boundary,
        2.0,
        [boundary.cell_center(GridCell::new(1, 1), 2.0)]
            .into_iter()
            .map(|position: Vec2| (position, owner)),
    );
    let mut spawning = Spawning::new(Config::new(200, 5));
    let mut commands = Vec::new();
    spawning.handle(&[REQUEST], &occupancy, 6, &mut commands);
    assert!(commands.is_empty(), "no isolated cell in a 3x3 arena");
}

#[test]
fn colors_restart_after_reset() {
    let world = started_world();
    let occupancy = query::occupancy_view(&world);
    let colors = |events: &[Event], spawning: &mut Spawning| {
        let mut commands = Vec::new();
        spawning.handle(events, &occupancy, 6, &mut commands);
        commands
            .into_iter()
            .filter_map(|command| match command {
                Command::SpawnOpponent { color, .. } => Some(color),
                _ => None,
            })
            .collect::<Vec<_>>()
    };

    let mut spawning = Spawning::new(Config::new(60, 9));
    let first = colors(&[REQUEST, REQUEST], &mut spawning);
    let reset = Event::MatchReset {
        boundary: query::boundary(&world),
        top_score: 0,
    };
    let second = colors(&[reset, REQUEST], &mut spawning);
    assert_eq!(first.len(), 2);
    assert_ne!(first[0], first[1]);
    assert_eq!(second, vec![first[0]]);
}

#[test]
fn ignores_unrelated_events() {
    let world = started_world();
    let mut spawning = Spawning::new(Config::new(60, 1));
    let mut commands = Vec::new();
    spawning.handle(
        &[Event::MatchStarted, Event::TrailsCleared],
        &query::occupancy_view(&world),
        6,
        &mut commands,
    );
    assert!(commands.is_empty());
}
