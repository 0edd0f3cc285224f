//! Per-agent state machine, power-up timers and step pacing.

use std::time::Duration;

use glam::Vec2;
use trail_arena_core::{
    AgentColor, AgentId, AgentSnapshot, Controller, Direction, Lifecycle, LossCause,
    MovementTuning, PowerUpStatus,
};

/// Stackable timed effect.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct PowerUp {
    level: u32,
    remaining: Duration,
}

impl PowerUp {
    /// Stacks the level when already active, otherwise starts at level one.
    ///
    /// The timer restarts in both cases.
    pub(crate) fn activate(&mut self, duration: Duration) -> u32 {
        self.level = if self.is_active() {
            self.level.saturating_add(1)
        } else {
            1
        };
        self.remaining = duration;
        self.level
    }

    /// Counts the timer down and reports whether the effect just expired.
    pub(crate) fn tick(&mut self, dt: Duration) -> bool {
        if !self.is_active() {
            return false;
        }
        self.remaining = self.remaining.saturating_sub(dt);
        if self.remaining.is_zero() {
            self.level = 0;
            return true;
        }
        false
    }

    pub(crate) const fn is_active(&self) -> bool {
        self.level > 0
    }

    pub(crate) const fn level(&self) -> u32 {
        self.level
    }

    pub(crate) const fn status(&self) -> PowerUpStatus {
        PowerUpStatus {
            level: self.level,
            remaining: self.remaining,
        }
    }
}

/// Sparse trail power-up together with the step counter that gates commits.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct SparseTrail {
    power: PowerUp,
    step_counter: u32,
}

impl SparseTrail {
    /// Activates or stacks the effect; a fresh activation restarts the counter.
    pub(crate) fn activate(&mut self, duration: Duration) -> u32 {
        if !self.power.is_active() {
            self.step_counter = 0;
        }
        self.power.activate(duration)
    }

    pub(crate) fn tick(&mut self, dt: Duration) -> bool {
        let expired = self.power.tick(dt);
        if expired {
            self.step_counter = 0;
        }
        expired
    }

    /// Reports whether the next step would commit a segment, without consuming it.
    pub(crate) const fn would_commit(&self) -> bool {
        if !self.power.is_active() {
            return true;
        }
        self.step_counter % (self.power.level() + 1) == 0
    }

    /// Consumes one step and reports whether it commits a segment.
    pub(crate) fn commit_step(&mut self) -> bool {
        let commits = self.would_commit();
        if self.power.is_active() {
            self.step_counter = self.step_counter.wrapping_add(1);
        }
        commits
    }

    pub(crate) const fn status(&self) -> PowerUpStatus {
        self.power.status()
    }
}

/// Lifecycle of an agent with the data each stage carries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum AgentState {
    Spawning { remaining: Duration },
    Active,
    Lost { cause: LossCause },
}

/// Unified agent record for human and AI controlled light cycles.
#[derive(Clone, Debug)]
pub(crate) struct Agent {
    pub(crate) id: AgentId,
    pub(crate) controller: Controller,
    pub(crate) color: AgentColor,
    pub(crate) position: Vec2,
    pub(crate) direction: Direction,
    pub(crate) committed_direction: Direction,
    pub(crate) trail: Vec<Vec2>,
    pub(crate) accumulator: Duration,
    pub(crate) state: AgentState,
    pub(crate) speed_boost: PowerUp,
    pub(crate) zoom_out: PowerUp,
    pub(crate) sparse_trail: SparseTrail,
    pub(crate) ammo: u32,
}

impl Agent {
    pub(crate) fn new(
        id: AgentId,
        controller: Controller,
        color: AgentColor,
        position: Vec2,
        direction: Direction,
        state: AgentState,
    ) -> Self {
        Self {
            id,
            controller,
            color,
            position,
            direction,
            committed_direction: direction,
            trail: Vec::new(),
            accumulator: Duration::ZERO,
            state,
            speed_boost: PowerUp::default(),
            zoom_out: PowerUp::default(),
            sparse_trail: SparseTrail::default(),
            ammo: 0,
        }
    }

    pub(crate) fn lifecycle(&self) -> Lifecycle {
        match self.state {
            AgentState::Spawning { .. } => Lifecycle::Spawning,
            AgentState::Active => Lifecycle::Active,
            AgentState::Lost { .. } => Lifecycle::Lost,
        }
    }

    pub(crate) fn is_active(&self) -> bool {
        self.state == AgentState::Active
    }

    pub(crate) fn is_lost(&self) -> bool {
        matches!(self.state, AgentState::Lost { .. })
    }

    pub(crate) fn loss_cause(&self) -> Option<LossCause> {
        match self.state {
            AgentState::Lost { cause } => Some(cause),
            AgentState::Spawning { .. } | AgentState::Active => None,
        }
    }

    pub(crate) fn step_interval(&self, movement: &MovementTuning) -> Duration {
        movement.step_interval(self.speed_boost.level())
    }

    pub(crate) fn ready_for_step(&self, movement: &MovementTuning) -> bool {
        self.is_active() && self.accumulator >= self.step_interval(movement)
    }

    /// Counts down the spawn grace period and reports whether it just ended.
    pub(crate) fn tick_spawn_grace(&mut self, dt: Duration) -> bool {
        let AgentState::Spawning { remaining } = self.state else {
            return false;
        };
        let remaining = remaining.saturating_sub(dt);
        if remaining.is_zero() {
            self.state = AgentState::Active;
            self.accumulator = Duration::ZERO;
            true
        } else {
            self.state = AgentState::Spawning { remaining };
            false
        }
    }

    /// Consumes one interval from the accumulator after a step.
    ///
    /// At most one further interval is carried over so a long frame never
    /// queues a burst of steps.
    pub(crate) fn consume_interval(&mut self, movement: &MovementTuning) {
        let interval = self.step_interval(movement);
        self.accumulator = self.accumulator.saturating_sub(interval).min(interval);
    }

    pub(crate) fn snapshot(&self, movement: &MovementTuning) -> AgentSnapshot {
        AgentSnapshot {
            id: self.id,
            controller: self.controller,
            color: self.color,
            position: self.position,
            direction: self.direction,
            committed_direction: self.committed_direction,
            lifecycle: self.lifecycle(),
            loss_cause: self.loss_cause(),
            ready_for_step: self.ready_for_step(movement),
            ammo: self.ammo,
            speed_boost: self.speed_boost.status(),
            zoom_out: self.zoom_out.status(),
            sparse_trail: self.sparse_trail.status(),
            trail_len: self.trail.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECOND: Duration = Duration::from_secs(1);

    #[test]
    fn power_up_stacks_while_active_and_resets_after_expiry() {
        let mut power = PowerUp::default();
        assert_eq!(power.activate(SECOND), 1);
        assert_eq!(power.activate(SECOND), 2);
        assert!(power.tick(SECOND));
        assert!(!power.is_active());
        assert_eq!(power.activate(SECOND), 1);
    }

    #[test]
    fn stacking_restarts_the_timer() {
        let mut power = PowerUp::default();
        let _ = power.activate(SECOND);
        assert!(!power.tick(Duration::from_millis(900)));
        let _ = power.activate(SECOND);
        assert!(!power.tick(Duration::from_millis(900)));
        assert_eq!(power.level(), 2);
    }

    #[test]
    fn sparse_level_two_commits_every_third_step() {
        let mut sparse = SparseTrail::default();
        let _ = sparse.activate(SECOND * 10);
        let _ = sparse.activate(SECOND * 10);
        let mut committed = Vec::new();
        for step in 0..10 {
            if sparse.commit_step() {
                committed.push(step);
            }
        }
        assert_eq!(committed, vec![0, 3, 6, 9]);
    }

    #[test]
    fn fresh_sparse_activation_restarts_the_counter() {
        let mut sparse = SparseTrail::default();
        let _ = sparse.activate(SECOND);
        assert!(sparse.commit_step());
        assert!(!sparse.commit_step());
        assert!(sparse.tick(SECOND));
        assert!(sparse.would_commit());
        let _ = sparse.activate(SECOND);
        assert!(sparse.commit_step());
        assert!(!sparse.commit_step());
        assert!(sparse.commit_step());
    }

    #[test]
    fn inactive_sparse_always_commits() {
        let mut sparse = SparseTrail::default();
        assert!((0..5).all(|_| sparse.commit_step()));
    }

    #[test]
    fn spawn_grace_admits_once() {
        let mut agent = Agent::new(
            AgentId::new(1),
            Controller::Ai,
            AgentColor::from_rgb(0xe5, 0x39, 0x35),
            Vec2::ZERO,
            Direction::West,
            AgentState::Spawning { remaining: SECOND },
        );
        assert!(!agent.tick_spawn_grace(Duration::from_millis(600)));
        assert_eq!(agent.lifecycle(), Lifecycle::Spawning);
        assert!(agent.tick_spawn_grace(Duration::from_millis(600)));
        assert!(agent.is_active());
        assert!(!agent.tick_spawn_grace(SECOND));
    }
}
