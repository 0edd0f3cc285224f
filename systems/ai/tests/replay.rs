use std::time::Duration;

use trail_arena_core::{Command, Event, MatchPhase};
use trail_arena_system_ai::{Config, OpponentAi};
use trail_arena_world::{self as world, query, World};

const FRAME: Duration = Duration::from_millis(40);

fn autopilot_match(seed: u64, frames: usize) -> Vec<Event> {
    let mut world = World::default();
    let mut ai = OpponentAi::new(Config::new(seed).with_player_autopilot(true));
    let mut log = Vec::new();
    world::apply(&mut world, Command::StartMatch, &mut log);

    for _ in 0..frames {
        if query::phase(&world) == MatchPhase::GameOver {
            break;
        }
        let mut events = Vec::new();
        world::apply(&mut world, Command::Tick { dt: FRAME }, &mut events);

        let mut commands = Vec::new();
        ai.handle(
            &events,
            &query::agent_view(&world),
            &query::pickup_view(&world),
            &query::occupancy_view(&world),
            &query::config(&world).ai,
            &mut commands,
        );
        for command in commands {
            world::apply(&mut world, command, &mut events);
        }
        world::apply(&mut world, Command::AdvanceAgents, &mut events);
        log.extend(events);
    }
    log
}

#[test]
fn same_seed_replays_identically() {
    let first = autopilot_match(0x5eed, 600);
    let second = autopilot_match(0x5eed, 600);
    assert_eq!(first, second);
}

#[test]
fn autopilot_outlives_the_straight_line() {
    let events = autopilot_match(17, 400);
    let steered = events
        .iter()
        .filter(|event| matches!(event, Event::AgentSteered { .. }))
        .count();
    assert!(steered > 0, "autopilot never turned");
    let advances = events
        .iter()
        .filter(|event| matches!(event, Event::AgentAdvanced { .. }))
        .count();
    assert!(
        advances > 30,
        "the player would hit the wall after 30 straight steps"
    );
}
