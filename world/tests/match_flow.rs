use std::time::Duration;

use trail_arena_core::{
    AiTuning, ArenaConfig, Command, Direction, Event, LossCause, MatchOutcome, MatchPhase,
    PickupKind, Turn,
};
use trail_arena_world::{self as world, query, World};

const FRAME: Duration = Duration::from_millis(120);

fn patient_opponents() -> ArenaConfig {
    ArenaConfig {
        ai: AiTuning {
            spawn_grace_ms: 60_000,
            ..AiTuning::default()
        },
        ..ArenaConfig::default()
    }
}

fn run_frame(world: &mut World) -> Vec<Event> {
    let mut events = Vec::new();
    world::apply(world, Command::Tick { dt: FRAME }, &mut events);
    world::apply(world, Command::AdvanceAgents, &mut events);
    events
}

#[test]
fn uncontested_player_drives_into_the_east_wall() {
    let mut world = World::new(patient_opponents());
    let mut events = Vec::new();
    world::apply(&mut world, Command::ResetMatch { top_score: 0 }, &mut events);
    world::apply(&mut world, Command::StartMatch, &mut events);
    assert_eq!(query::phase(&world), MatchPhase::Active);

    let player = query::player(&world).expect("player spawned");
    let mut frames = 0;
    let ended = loop {
        frames += 1;
        assert!(frames <= 100, "match never ended");
        let events = run_frame(&mut world);
        if let Some(ended) = events
            .iter()
            .find(|event| matches!(event, Event::MatchEnded { .. }))
        {
            assert!(events.contains(&Event::AgentLost {
                agent: player,
                cause: LossCause::Boundary,
            }));
            break ended.clone();
        }
    };

    assert_eq!(frames, 30, "player starts 30 cells from the east wall");
    assert_eq!(
        ended,
        Event::MatchEnded {
            outcome: MatchOutcome::OpponentsWin,
            score: 0,
            top_score: 0,
        }
    );
    assert_eq!(query::phase(&world), MatchPhase::GameOver);
    assert_eq!(
        query::trail_view(&world).segments_of(player).len(),
        29,
        "the losing step commits no segment"
    );
}

#[test]
fn turning_twice_between_steps_cannot_reverse() {
    let mut world = World::default();
    let mut events = Vec::new();
    world::apply(&mut world, Command::StartMatch, &mut events);
    let player = query::player(&world).expect("player spawned");

    for turn in [Turn::Right, Turn::Right] {
        world::apply(&mut world, Command::SteerAgent { agent: player, turn }, &mut events);
    }
    let _ = run_frame(&mut world);

    let view = query::agent_view(&world);
    let snapshot = view.get(player).expect("player snapshot");
    assert_ne!(snapshot.committed_direction, Direction::West);
    assert_eq!(snapshot.committed_direction, Direction::South);
}

#[test]
fn game_over_refuses_pickups_and_pause() {
    let mut world = World::new(patient_opponents());
    let mut events = Vec::new();
    world::apply(&mut world, Command::StartMatch, &mut events);
    let player = query::player(&world).expect("player spawned");
    world::apply(&mut world, Command::DetachAgent { agent: player }, &mut events);
    assert_eq!(query::phase(&world), MatchPhase::GameOver);

    events.clear();
    world::apply(
        &mut world,
        Command::SpawnPickup {
            kind: PickupKind::Score,
            position: glam::Vec2::new(-31.0, -31.0),
        },
        &mut events,
    );
    world::apply(&mut world, Command::TogglePause, &mut events);
    assert!(matches!(
        events.as_slice(),
        [
            Event::PickupSpawnRejected { .. },
            Event::IntentRejected { agent: None, .. }
        ]
    ));
    assert!(query::pickup_view(&world).iter().next().is_none());
}

#[test]
fn restart_rebuilds_with_persisted_top_score() {
    let mut world = World::default();
    let mut events = Vec::new();
    world::apply(&mut world, Command::StartMatch, &mut events);
    for _ in 0..3 {
        let _ = run_frame(&mut world);
    }

    events.clear();
    world::apply(&mut world, Command::ResetMatch { top_score: 250 }, &mut events);
    assert_eq!(query::phase(&world), MatchPhase::Idle);
    assert_eq!(query::top_score(&world), 250);
    assert_eq!(query::persisted_top_score(&world), 250);
    assert_eq!(query::trail_view(&world).segment_count(), 0);
    assert!(matches!(events.first(), Some(Event::MatchReset { top_score: 250, .. })));
}
