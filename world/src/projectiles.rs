//! Straight-line projectiles that erase a single trail segment on impact.

use std::time::Duration;

use glam::Vec2;
use tracing::debug;
use trail_arena_core::{AgentId, Controller, Event, ProjectileId, ProjectileSnapshot};

use crate::agents::Agent;

#[derive(Clone, Copy, Debug)]
pub(crate) struct Projectile {
    pub(crate) id: ProjectileId,
    pub(crate) owner: AgentId,
    pub(crate) owner_controller: Controller,
    pub(crate) position: Vec2,
    pub(crate) velocity: Vec2,
    pub(crate) remaining: Duration,
}

impl Projectile {
    pub(crate) const fn snapshot(&self) -> ProjectileSnapshot {
        ProjectileSnapshot {
            id: self.id,
            owner: self.owner,
            position: self.position,
            velocity: self.velocity,
            remaining: self.remaining,
        }
    }
}

/// Location of a trail segment inside the agent list.
#[derive(Clone, Copy, Debug, PartialEq)]
struct SegmentHit {
    agent_index: usize,
    segment_index: usize,
    distance: f32,
}

/// Moves every projectile, resolves at most one hit each and drops spent ones.
pub(crate) fn advance(
    projectiles: &mut Vec<Projectile>,
    agents: &mut [Agent],
    hit_radius: f32,
    dt: Duration,
    out: &mut Vec<Event>,
) {
    let seconds = dt.as_secs_f32();
    let mut index = 0;
    while index < projectiles.len() {
        let projectile = &mut projectiles[index];
        projectile.position += projectile.velocity * seconds;
        projectile.remaining = projectile.remaining.saturating_sub(dt);
        let projectile = *projectile;

        if let Some(hit) = find_target(agents, &projectile, hit_radius) {
            let agent = &mut agents[hit.agent_index];
            let position = agent.trail.remove(hit.segment_index);
            debug!(
                projectile = projectile.id.get(),
                trail_owner = agent.id.get(),
                "projectile erased trail segment"
            );
            out.push(Event::TrailSegmentRemoved {
                agent: agent.id,
                position,
            });
            out.push(Event::ProjectileHit {
                projectile: projectile.id,
                trail_owner: agent.id,
                position,
            });
            let _ = projectiles.remove(index);
            continue;
        }

        if projectile.remaining.is_zero() {
            out.push(Event::ProjectileExpired {
                projectile: projectile.id,
            });
            let _ = projectiles.remove(index);
            continue;
        }

        index += 1;
    }
}

/// Picks the segment a projectile strikes.
///
/// Player shots only hit AI trails. AI shots prefer the player's trail and
/// fall back to every AI trail, the shooter's own included.
fn find_target(agents: &[Agent], projectile: &Projectile, hit_radius: f32) -> Option<SegmentHit> {
    let nearest_in = |controller: Controller| {
        agents
            .iter()
            .enumerate()
            .filter(|(_, agent)| agent.controller == controller)
            .flat_map(|(agent_index, agent)| {
                agent
                    .trail
                    .iter()
                    .enumerate()
                    .map(move |(segment_index, segment)| SegmentHit {
                        agent_index,
                        segment_index,
                        distance: segment.distance(projectile.position),
                    })
            })
            .filter(|hit| hit.distance < hit_radius)
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    };

    match projectile.owner_controller {
        Controller::Human => nearest_in(Controller::Ai),
        Controller::Ai => nearest_in(Controller::Human).or_else(|| nearest_in(Controller::Ai)),
    }
}
