use std::time::Duration;

use trail_arena_core::{Command, Event, MatchPhase, PickupKind};
use trail_arena_system_ai::{self as ai, OpponentAi};
use trail_arena_system_pickups::{Config, PickupSpawning};
use trail_arena_world::{self as world, query, World};

const FRAME: Duration = Duration::from_millis(40);

struct Harness {
    world: World,
    ai: OpponentAi,
    pickups: PickupSpawning,
}

impl Harness {
    fn new(seed: u64) -> Self {
        Self {
            world: World::default(),
            ai: OpponentAi::new(ai::Config::new(seed).with_player_autopilot(true)),
            pickups: PickupSpawning::new(Config::new(seed)),
        }
    }

    fn feed_pickups(&mut self, mut events: Vec<Event>) -> Vec<Event> {
        let mut log = Vec::new();
        while !events.is_empty() {
            let mut commands = Vec::new();
            self.pickups.handle(
                &events,
                &query::pickup_view(&self.world),
                &query::occupancy_view(&self.world),
                &query::config(&self.world).pickups,
                &mut commands,
            );
            log.append(&mut events);
            for command in commands {
                world::apply(&mut self.world, command, &mut events);
            }
        }
        log
    }

    fn start(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        world::apply(&mut self.world, Command::ResetMatch { top_score: 0 }, &mut events);
        world::apply(&mut self.world, Command::StartMatch, &mut events);
        self.feed_pickups(events)
    }

    fn frame(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        world::apply(&mut self.world, Command::Tick { dt: FRAME }, &mut events);
        let mut commands = Vec::new();
        self.ai.handle(
            &events,
            &query::agent_view(&self.world),
            &query::pickup_view(&self.world),
            &query::occupancy_view(&self.world),
            &query::config(&self.world).ai,
            &mut commands,
        );
        for command in commands {
            world::apply(&mut self.world, command, &mut events);
        }
        world::apply(&mut self.world, Command::AdvanceAgents, &mut events);
        self.feed_pickups(events)
    }
}

fn assert_caps_hold(world: &World) {
    let view = query::pickup_view(world);
    for kind in PickupKind::ALL {
        assert!(
            view.live_count(kind) <= view.cap(kind),
            "{kind:?} exceeds its cap"
        );
    }
}

#[test]
fn match_start_populates_the_arena() {
    let mut harness = Harness::new(21);
    let events = harness.start();
    let spawned = events
        .iter()
        .filter(|event| matches!(event, Event::PickupSpawned { .. }))
        .count();
    assert_eq!(spawned, 2);
    assert_eq!(query::pickup_view(&harness.world).iter().count(), 2);
}

#[test]
fn caps_hold_throughout_an_autopilot_match() {
    for seed in [1, 2, 3] {
        let mut harness = Harness::new(seed);
        let _ = harness.start();
        assert_caps_hold(&harness.world);
        for _ in 0..1_500 {
            if query::phase(&harness.world) == MatchPhase::GameOver {
                break;
            }
            let _ = harness.frame();
            assert_caps_hold(&harness.world);
        }
    }
}

#[test]
fn pickup_replays_are_deterministic() {
    let run = |seed: u64| {
        let mut harness = Harness::new(seed);
        let mut log = harness.start();
        for _ in 0..600 {
            if query::phase(&harness.world) == MatchPhase::GameOver {
                break;
            }
            log.extend(harness.frame());
        }
        log
    };
    assert_eq!(run(77), run(77));
}
