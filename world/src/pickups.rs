//! Live pickup registry and the effects applied when one is collected.

use std::time::Duration;

use glam::Vec2;
use tracing::debug;
use trail_arena_core::{
    Controller, Event, PickupCaps, PickupId, PickupKind, PickupSnapshot, PickupTuning,
    PickupView, PowerUpKind,
};

use crate::World;

#[derive(Clone, Copy, Debug)]
pub(crate) struct Pickup {
    pub(crate) id: PickupId,
    pub(crate) kind: PickupKind,
    pub(crate) position: Vec2,
    pub(crate) age: Duration,
}

/// Live pickups, their caps and the per-match collection counter.
#[derive(Clone, Debug)]
pub(crate) struct PickupRegistry {
    live: Vec<Pickup>,
    caps: PickupCaps,
    collected_total: u32,
    next_id: u32,
}

impl PickupRegistry {
    pub(crate) fn new(tuning: &PickupTuning) -> Self {
        Self {
            live: Vec::new(),
            caps: PickupCaps::from_fn(|kind| tuning.rule(kind).initial_cap),
            collected_total: 0,
            next_id: 0,
        }
    }

    pub(crate) fn live_count(&self, kind: PickupKind) -> u32 {
        let count = self.live.iter().filter(|pickup| pickup.kind == kind).count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }

    pub(crate) const fn cap(&self, kind: PickupKind) -> u32 {
        self.caps.cap(kind)
    }

    pub(crate) fn raise_cap(&mut self, kind: PickupKind) -> u32 {
        self.caps.raise(kind)
    }

    pub(crate) fn occupies(&self, position: Vec2, radius: f32) -> bool {
        self.live
            .iter()
            .any(|pickup| pickup.position.distance(position) < radius)
    }

    pub(crate) fn insert(&mut self, kind: PickupKind, position: Vec2) -> PickupId {
        let id = PickupId::new(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.live.push(Pickup {
            id,
            kind,
            position,
            age: Duration::ZERO,
        });
        id
    }

    /// Removes and returns the oldest pickup touching `head`.
    pub(crate) fn take_touching(&mut self, head: Vec2, radius: f32) -> Option<Pickup> {
        let index = self
            .live
            .iter()
            .position(|pickup| pickup.position.distance(head) < radius)?;
        Some(self.live.remove(index))
    }

    pub(crate) fn record_collection(&mut self) -> u32 {
        self.collected_total = self.collected_total.saturating_add(1);
        self.collected_total
    }

    pub(crate) const fn collected_total(&self) -> u32 {
        self.collected_total
    }

    pub(crate) fn age(&mut self, dt: Duration) {
        for pickup in &mut self.live {
            pickup.age = pickup.age.saturating_add(dt);
        }
    }

    pub(crate) fn view(&self) -> PickupView {
        PickupView::from_snapshots(
            self.live
                .iter()
                .map(|pickup| PickupSnapshot {
                    id: pickup.id,
                    kind: pickup.kind,
                    position: pickup.position,
                    age: pickup.age,
                })
                .collect(),
            self.caps,
        )
    }
}

/// Applies the effect of `pickup` collected by the agent at `agent_index`.
pub(crate) fn collect(world: &mut World, agent_index: usize, pickup: Pickup, out: &mut Vec<Event>) {
    let collected_total = world.pickups.record_collection();
    let Some(agent) = world.agents.get(agent_index) else {
        return;
    };
    let agent_id = agent.id;
    let controller = agent.controller;
    let facing = agent.committed_direction;

    debug!(
        agent = agent_id.get(),
        kind = ?pickup.kind,
        collected_total,
        "pickup collected"
    );
    out.push(Event::PickupCollected {
        agent: agent_id,
        kind: pickup.kind,
        position: pickup.position,
        collected_total,
    });

    let tuning = world.config.pickups.clone();
    match pickup.kind {
        PickupKind::Score => {
            if controller == Controller::Human {
                world.award_points(tuning.score_points, out);
            }
            activate_power_up(world, agent_index, PowerUpKind::SpeedBoost, out);
        }
        PickupKind::Expansion => {
            let amount = world.config.grid.expansion_amount();
            world.boundary = world.boundary.expanded(facing, amount);
            debug!(edge = ?facing, amount, "boundary expanded");
            out.push(Event::BoundaryExpanded {
                boundary: world.boundary,
                edge: facing,
            });
        }
        PickupKind::Clear => {
            for agent in &mut world.agents {
                agent.trail.clear();
            }
            out.push(Event::TrailsCleared);
        }
        PickupKind::Zoom => activate_power_up(world, agent_index, PowerUpKind::ZoomOut, out),
        PickupKind::Sparse => {
            activate_power_up(world, agent_index, PowerUpKind::SparseTrail, out);
        }
        PickupKind::Ammo => {
            if let Some(agent) = world.agents.get_mut(agent_index) {
                agent.ammo = agent.ammo.saturating_add(tuning.ammo_per_pickup);
                out.push(Event::AmmoChanged {
                    agent: agent_id,
                    ammo: agent.ammo,
                });
            }
        }
        PickupKind::AddAi => out.push(Event::OpponentRequested {
            requested_by: agent_id,
        }),
        PickupKind::Multi => {
            if controller == Controller::Human {
                world.award_points(tuning.multi_bonus_points, out);
            }
            for kind in PickupKind::SCORE_GATED {
                let cap = world.pickups.raise_cap(kind);
                out.push(Event::PickupCapRaised { kind, cap });
            }
        }
    }
}

fn activate_power_up(
    world: &mut World,
    agent_index: usize,
    kind: PowerUpKind,
    out: &mut Vec<Event>,
) {
    let durations = &world.config.power_ups;
    let Some(agent) = world.agents.get_mut(agent_index) else {
        return;
    };
    let level = match kind {
        PowerUpKind::SpeedBoost => agent
            .speed_boost
            .activate(Duration::from_millis(durations.speed_boost_ms)),
        PowerUpKind::ZoomOut => agent
            .zoom_out
            .activate(Duration::from_millis(durations.zoom_out_ms)),
        PowerUpKind::SparseTrail => agent
            .sparse_trail
            .activate(Duration::from_millis(durations.sparse_trail_ms)),
    };
    out.push(Event::PowerUpActivated {
        agent: agent.id,
        kind,
        level,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caps_start_from_tuning() {
        let registry = PickupRegistry::new(&PickupTuning::default());
        for kind in PickupKind::ALL {
            assert_eq!(registry.cap(kind), 1);
        }
    }

    #[test]
    fn take_touching_removes_only_the_touched_pickup() {
        let mut registry = PickupRegistry::new(&PickupTuning::default());
        let _ = registry.insert(PickupKind::Score, Vec2::new(1.0, 1.0));
        let far = registry.insert(PickupKind::Zoom, Vec2::new(9.0, 9.0));
        let taken = registry.take_touching(Vec2::new(1.0, 1.0), 1.0);
        assert_eq!(taken.map(|pickup| pickup.kind), Some(PickupKind::Score));
        assert_eq!(registry.live_count(PickupKind::Score), 0);
        assert_eq!(registry.view().iter().next().map(|pickup| pickup.id), Some(far));
        assert!(registry.take_touching(Vec2::new(1.0, 1.0), 1.0).is_none());
    }

    #[test]
    fn collection_counter_is_monotonic() {
        let mut registry = PickupRegistry::new(&PickupTuning::default());
        assert_eq!(registry.record_collection(), 1);
        assert_eq!(registry.record_collection(), 2);
        assert_eq!(registry.collected_total(), 2);
    }
}
