//! Frame-wide collision resolution over a frozen snapshot.
//!
//! Every verdict is computed from the same immutable [`Body`] slice, so one
//! agent's loss this frame never influences another agent's verdict.

use glam::Vec2;
use trail_arena_core::{AgentId, Boundary, LossCause};

/// Step taken by an agent during the current frame.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Stride {
    pub(crate) from: Vec2,
    pub(crate) to: Vec2,
    /// Whether the vacated cell becomes a trail segment this frame.
    pub(crate) commits: bool,
}

/// Frozen view of one agent used while resolving a frame.
#[derive(Clone, Debug)]
pub(crate) struct Body<'a> {
    pub(crate) id: AgentId,
    pub(crate) head: Vec2,
    pub(crate) trail: &'a [Vec2],
    /// Active and not lost in a previous frame.
    pub(crate) live: bool,
    pub(crate) stride: Option<Stride>,
}

/// Geometry shared by every check.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Arena {
    pub(crate) boundary: Boundary,
    pub(crate) contact_radius: f32,
    pub(crate) epsilon: f32,
}

/// Computes the agents lost this frame, in body order.
///
/// Checks run per live agent in a fixed order and the first hit decides the
/// cause: boundary, head-on, crossed paths, then trail.
pub(crate) fn resolve(bodies: &[Body<'_>], arena: Arena) -> Vec<(AgentId, LossCause)> {
    bodies
        .iter()
        .enumerate()
        .filter(|(_, body)| body.live)
        .filter_map(|(index, body)| verdict(bodies, index, body, arena).map(|cause| (body.id, cause)))
        .collect()
}

fn verdict(bodies: &[Body<'_>], index: usize, body: &Body<'_>, arena: Arena) -> Option<LossCause> {
    if arena.boundary.is_outside(body.head, arena.epsilon) {
        return Some(LossCause::Boundary);
    }

    let others = bodies
        .iter()
        .enumerate()
        .filter(|(other_index, _)| *other_index != index)
        .map(|(_, other)| other);

    let touching = |a: Vec2, b: Vec2| a.distance(b) < arena.contact_radius;

    if others.clone().any(|other| other.live && touching(body.head, other.head)) {
        return Some(LossCause::HeadOn);
    }

    if let Some(stride) = body.stride {
        let crossed = others.clone().any(|other| {
            other.live
                && other.stride.is_some_and(|theirs| {
                    touching(stride.to, theirs.from) && touching(theirs.to, stride.from)
                })
        });
        if crossed {
            return Some(LossCause::CrossedPaths);
        }
    }

    // The newest own segment is the pending `stride.from`, committed after
    // this check, so every committed segment is an obstacle.
    if body.trail.iter().any(|segment| touching(body.head, *segment)) {
        return Some(LossCause::Trail);
    }

    let struck_other = others.clone().any(|other| {
        other.trail.iter().any(|segment| touching(body.head, *segment))
            || other
                .stride
                .is_some_and(|theirs| theirs.commits && touching(body.head, theirs.from))
    });
    if struck_other {
        return Some(LossCause::Trail);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const CELL: f32 = 2.0;

    fn arena() -> Arena {
        Arena {
            boundary: Boundary::new(0.0, 20.0, 0.0, 20.0),
            contact_radius: CELL * 0.5,
            epsilon: 0.01,
        }
    }

    fn mover<'a>(id: u32, from: Vec2, to: Vec2, trail: &'a [Vec2]) -> Body<'a> {
        Body {
            id: AgentId::new(id),
            head: to,
            trail,
            live: true,
            stride: Some(Stride {
                from,
                to,
                commits: true,
            }),
        }
    }

    #[test]
    fn head_past_the_edge_is_a_boundary_loss() {
        let bodies = [mover(0, Vec2::new(19.0, 5.0), Vec2::new(21.0, 5.0), &[])];
        assert_eq!(
            resolve(&bodies, arena()),
            vec![(AgentId::new(0), LossCause::Boundary)]
        );
    }

    #[test]
    fn heads_in_the_same_cell_both_lose() {
        let bodies = [
            mover(0, Vec2::new(5.0, 5.0), Vec2::new(7.0, 5.0), &[]),
            mover(1, Vec2::new(9.0, 5.0), Vec2::new(7.0, 5.0), &[]),
        ];
        let losses = resolve(&bodies, arena());
        assert_eq!(
            losses,
            vec![
                (AgentId::new(0), LossCause::HeadOn),
                (AgentId::new(1), LossCause::HeadOn),
            ]
        );
    }

    #[test]
    fn swapping_cells_is_a_mutual_loss() {
        let bodies = [
            mover(0, Vec2::new(5.0, 5.0), Vec2::new(7.0, 5.0), &[]),
            mover(1, Vec2::new(7.0, 5.0), Vec2::new(5.0, 5.0), &[]),
        ];
        let losses = resolve(&bodies, arena());
        assert_eq!(losses.len(), 2, "both agents must lose: {losses:?}");
        assert!(losses
            .iter()
            .all(|(_, cause)| *cause == LossCause::CrossedPaths));
    }

    #[test]
    fn vacated_cell_is_not_an_obstacle_for_its_owner() {
        let trail = [Vec2::new(1.0, 5.0), Vec2::new(3.0, 5.0)];
        let bodies = [mover(0, Vec2::new(5.0, 5.0), Vec2::new(7.0, 5.0), &trail)];
        assert!(resolve(&bodies, arena()).is_empty());
    }

    #[test]
    fn last_committed_segment_blocks_a_sparse_loop() {
        let trail = [Vec2::new(5.0, 5.0)];
        let mut body = mover(0, Vec2::new(5.0, 7.0), Vec2::new(5.0, 5.0), &trail);
        if let Some(stride) = body.stride.as_mut() {
            stride.commits = false;
        }
        assert_eq!(
            resolve(&[body], arena()),
            vec![(AgentId::new(0), LossCause::Trail)]
        );
    }

    #[test]
    fn older_own_segment_is_a_trail_loss() {
        let trail = [Vec2::new(3.0, 5.0), Vec2::new(5.0, 5.0), Vec2::new(5.0, 7.0)];
        let bodies = [mover(0, Vec2::new(3.0, 7.0), Vec2::new(3.0, 5.0), &trail)];
        assert_eq!(
            resolve(&bodies, arena()),
            vec![(AgentId::new(0), LossCause::Trail)]
        );
    }

    #[test]
    fn lost_agents_keep_their_trail_as_an_obstacle() {
        let wreck_trail = [Vec2::new(9.0, 9.0)];
        let wreck = Body {
            id: AgentId::new(1),
            head: Vec2::new(11.0, 9.0),
            trail: &wreck_trail,
            live: false,
            stride: None,
        };
        let bodies = [
            mover(0, Vec2::new(7.0, 9.0), Vec2::new(9.0, 9.0), &[]),
            wreck,
        ];
        assert_eq!(
            resolve(&bodies, arena()),
            vec![(AgentId::new(0), LossCause::Trail)]
        );
    }

    #[test]
    fn following_into_a_vacated_cell_hits_the_pending_segment() {
        let bodies = [
            mover(0, Vec2::new(5.0, 5.0), Vec2::new(7.0, 5.0), &[]),
            mover(1, Vec2::new(7.0, 5.0), Vec2::new(7.0, 7.0), &[]),
        ];
        assert_eq!(
            resolve(&bodies, arena()),
            vec![(AgentId::new(0), LossCause::Trail)]
        );
    }

    #[test]
    fn sparse_gap_lets_a_follower_through() {
        let mut leader = mover(1, Vec2::new(7.0, 5.0), Vec2::new(7.0, 7.0), &[]);
        if let Some(stride) = leader.stride.as_mut() {
            stride.commits = false;
        }
        let bodies = [mover(0, Vec2::new(5.0, 5.0), Vec2::new(7.0, 5.0), &[]), leader];
        assert!(resolve(&bodies, arena()).is_empty());
    }
}
