//! Tuning surface shared by the world and the systems.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Boundary, PickupKind};

/// Aggregated tuning knobs controlling every adjustable aspect of a match.
///
/// Every field carries a default, so partial TOML files are accepted.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    /// Grid spacing and initial boundary.
    pub grid: GridTuning,
    /// Step pacing and collision tolerances.
    pub movement: MovementTuning,
    /// Power-up durations.
    pub power_ups: PowerUpTuning,
    /// Pickup economy rules.
    pub pickups: PickupTuning,
    /// Projectile ballistics.
    pub projectiles: ProjectileTuning,
    /// AI look-ahead and temperament.
    pub ai: AiTuning,
}

/// Grid spacing and initial play area.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridTuning {
    /// Side length of one square cell in world units.
    pub cell_size: f32,
    /// Half the initial arena width along x.
    pub half_width: f32,
    /// Half the initial arena depth along z.
    pub half_depth: f32,
    /// Cells added to an edge by the expansion pickup.
    pub expansion_cells: u32,
}

impl Default for GridTuning {
    fn default() -> Self {
        Self {
            cell_size: 2.0,
            half_width: 40.0,
            half_depth: 40.0,
            expansion_cells: 5,
        }
    }
}

impl GridTuning {
    /// Boundary every match starts with, centered on the origin.
    #[must_use]
    pub fn initial_boundary(&self) -> Boundary {
        Boundary::new(
            -self.half_width,
            self.half_width,
            -self.half_depth,
            self.half_depth,
        )
    }

    /// Distance an expansion pushes an edge, always a whole number of cells.
    #[must_use]
    pub fn expansion_amount(&self) -> f32 {
        self.expansion_cells as f32 * self.cell_size
    }

    /// Radius under which heads, trails and pickups are considered touching.
    #[must_use]
    pub fn contact_radius(&self) -> f32 {
        self.cell_size * 0.5
    }
}

/// Step pacing and collision tolerances.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementTuning {
    /// Interval between steps without any speed boost, in milliseconds.
    pub base_step_interval_ms: u64,
    /// Diminishing-returns factor applied per speed-boost level.
    pub speed_boost_factor: f32,
    /// Tolerance applied to boundary checks.
    pub boundary_epsilon: f32,
}

impl Default for MovementTuning {
    fn default() -> Self {
        Self {
            base_step_interval_ms: 120,
            speed_boost_factor: 0.35,
            boundary_epsilon: 0.01,
        }
    }
}

impl MovementTuning {
    /// Step interval without any speed boost.
    #[must_use]
    pub fn base_step_interval(&self) -> Duration {
        Duration::from_millis(self.base_step_interval_ms)
    }

    /// Step interval for a speed-boost level: `base / (1 + level * factor)`.
    #[must_use]
    pub fn step_interval(&self, speed_level: u32) -> Duration {
        if speed_level == 0 {
            return self.base_step_interval();
        }
        let divisor = 1.0 + f64::from(speed_level) * f64::from(self.speed_boost_factor.max(0.0));
        Duration::from_secs_f64(self.base_step_interval().as_secs_f64() / divisor)
    }
}

/// Power-up durations.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerUpTuning {
    /// Speed boost duration in milliseconds.
    pub speed_boost_ms: u64,
    /// Zoom-out duration in milliseconds.
    pub zoom_out_ms: u64,
    /// Sparse trail duration in milliseconds.
    pub sparse_trail_ms: u64,
}

impl Default for PowerUpTuning {
    fn default() -> Self {
        Self {
            speed_boost_ms: 6_000,
            zoom_out_ms: 8_000,
            sparse_trail_ms: 8_000,
        }
    }
}

/// Spawn gate and cap for one pickup kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickupRule {
    /// All-time top score required before the kind may spawn.
    pub unlock_score: u32,
    /// Live-instance cap at match start.
    pub initial_cap: u32,
    /// Collected-pickup stride between counter-gated spawns; zero disables.
    pub counter_stride: u32,
}

impl PickupRule {
    const fn new(unlock_score: u32, counter_stride: u32) -> Self {
        Self {
            unlock_score,
            initial_cap: 1,
            counter_stride,
        }
    }
}

/// Pickup economy rules.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PickupTuning {
    /// Points awarded by a score pickup.
    pub score_points: u32,
    /// Points awarded by a multi pickup.
    pub multi_bonus_points: u32,
    /// Ammo granted by an ammo pickup.
    pub ammo_per_pickup: u32,
    /// Random cells tried before a placement search gives up.
    pub placement_attempts: u32,
    /// Length of the spawn animation reported to renderers, in milliseconds.
    pub spawn_animation_ms: u64,
    /// Extra opportunistic spawns triggered by a multi pickup.
    pub multi_extra_spawns: u32,
    /// Rule for [`PickupKind::Score`].
    pub score: PickupRule,
    /// Rule for [`PickupKind::Expansion`].
    pub expansion: PickupRule,
    /// Rule for [`PickupKind::Clear`].
    pub clear: PickupRule,
    /// Rule for [`PickupKind::Zoom`].
    pub zoom: PickupRule,
    /// Rule for [`PickupKind::Sparse`].
    pub sparse: PickupRule,
    /// Rule for [`PickupKind::Ammo`].
    pub ammo: PickupRule,
    /// Rule for [`PickupKind::AddAi`].
    pub add_ai: PickupRule,
    /// Rule for [`PickupKind::Multi`].
    pub multi: PickupRule,
}

impl Default for PickupTuning {
    fn default() -> Self {
        Self {
            score_points: 40,
            multi_bonus_points: 100,
            ammo_per_pickup: 1,
            placement_attempts: 60,
            spawn_animation_ms: 500,
            multi_extra_spawns: 2,
            score: PickupRule::new(0, 0),
            expansion: PickupRule::new(300, 4),
            clear: PickupRule::new(200, 5),
            zoom: PickupRule::new(0, 0),
            sparse: PickupRule::new(100, 0),
            ammo: PickupRule::new(150, 3),
            add_ai: PickupRule::new(400, 6),
            multi: PickupRule::new(500, 8),
        }
    }
}

impl PickupTuning {
    /// Rule governing the provided kind.
    #[must_use]
    pub const fn rule(&self, kind: PickupKind) -> PickupRule {
        match kind {
            PickupKind::Score => self.score,
            PickupKind::Expansion => self.expansion,
            PickupKind::Clear => self.clear,
            PickupKind::Zoom => self.zoom,
            PickupKind::Sparse => self.sparse,
            PickupKind::Ammo => self.ammo,
            PickupKind::AddAi => self.add_ai,
            PickupKind::Multi => self.multi,
        }
    }

    /// Reports whether the kind may spawn given the all-time top score.
    #[must_use]
    pub const fn is_unlocked(&self, kind: PickupKind, top_score: u32) -> bool {
        top_score >= self.rule(kind).unlock_score
    }

    /// Length of the spawn animation.
    #[must_use]
    pub fn spawn_animation(&self) -> Duration {
        Duration::from_millis(self.spawn_animation_ms)
    }
}

/// Projectile ballistics.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectileTuning {
    /// Travel speed in world units per second.
    pub speed: f32,
    /// Lifetime in milliseconds.
    pub lifetime_ms: u64,
    /// Hit radius as a fraction of the cell size.
    pub hit_radius_cells: f32,
    /// Spawn offset ahead of the shooter as a fraction of the cell size.
    pub muzzle_offset_cells: f32,
}

impl Default for ProjectileTuning {
    fn default() -> Self {
        Self {
            speed: 30.0,
            lifetime_ms: 1_200,
            hit_radius_cells: 0.6,
            muzzle_offset_cells: 0.6,
        }
    }
}

impl ProjectileTuning {
    /// Lifetime of a projectile.
    #[must_use]
    pub fn lifetime(&self) -> Duration {
        Duration::from_millis(self.lifetime_ms)
    }
}

/// AI look-ahead and temperament.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiTuning {
    /// Steps probed ahead by the safety scan (K).
    pub look_ahead: u32,
    /// Radius, in cells, inside which pickups attract the AI.
    pub pickup_seek_radius: u32,
    /// Probability of holding course when the whole window ahead is clear.
    pub cruise_straight_probability: f64,
    /// Cells scanned ahead for a hostile trail worth shooting.
    pub shoot_look_ahead: u32,
    /// Grace period before a freshly spawned AI may move, in milliseconds.
    pub spawn_grace_ms: u64,
}

impl Default for AiTuning {
    fn default() -> Self {
        Self {
            look_ahead: 6,
            pickup_seek_radius: 12,
            cruise_straight_probability: 0.95,
            shoot_look_ahead: 5,
            spawn_grace_ms: 1_500,
        }
    }
}

impl AiTuning {
    /// Grace period before a freshly spawned AI may move.
    #[must_use]
    pub fn spawn_grace(&self) -> Duration {
        Duration::from_millis(self.spawn_grace_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_interval_shrinks_with_diminishing_returns() {
        let movement = MovementTuning::default();
        let base = movement.step_interval(0);
        let one = movement.step_interval(1);
        let two = movement.step_interval(2);
        assert_eq!(base, Duration::from_millis(120));
        assert!(one < base);
        assert!(two < one);
        assert!(base - one > one - two, "each level must gain less than the last");
    }

    #[test]
    fn expansion_amount_is_whole_cells() {
        let grid = GridTuning::default();
        let cells = grid.expansion_amount() / grid.cell_size;
        assert_eq!(cells, cells.round());
    }

    #[test]
    fn counter_gated_kinds_have_strides() {
        let pickups = PickupTuning::default();
        for kind in PickupKind::COUNTER_GATED {
            assert!(pickups.rule(kind).counter_stride > 0, "{kind:?} needs a stride");
        }
        for kind in PickupKind::SCORE_GATED {
            assert_eq!(pickups.rule(kind).counter_stride, 0);
        }
    }

    #[test]
    fn unlock_checks_use_rule_threshold() {
        let pickups = PickupTuning::default();
        assert!(pickups.is_unlocked(PickupKind::Score, 0));
        assert!(!pickups.is_unlocked(PickupKind::Multi, 499));
        assert!(pickups.is_unlocked(PickupKind::Multi, 500));
    }
}
