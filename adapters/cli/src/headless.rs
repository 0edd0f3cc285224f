//! Window-less backend that drives scenes at a fixed frame step.

use std::time::Duration;

use anyhow::{bail, Result};
use trail_arena_rendering::{FrameInput, Presentation, RenderingBackend, Scene};

/// Backend that feeds the update closure without drawing anything.
#[derive(Clone, Copy, Debug)]
pub(crate) struct HeadlessBackend {
    frame_step: Duration,
    max_frames: u32,
}

impl HeadlessBackend {
    pub(crate) const fn new(frame_step: Duration, max_frames: u32) -> Self {
        Self {
            frame_step,
            max_frames,
        }
    }
}

impl RenderingBackend for HeadlessBackend {
    fn run<F>(self, presentation: Presentation, mut update_scene: F) -> Result<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) -> bool,
    {
        let mut scene = presentation.scene;
        for _ in 0..self.max_frames {
            if !update_scene(self.frame_step, FrameInput::default(), &mut scene) {
                return Ok(());
            }
        }
        bail!(
            "{} did not finish within {} frames",
            presentation.window_title,
            self.max_frames
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trail_arena_rendering::Color;
    use trail_arena_world::World;

    fn presentation() -> Presentation {
        let scene = Scene::capture(&World::default(), false, &[]).expect("scene");
        Presentation::new("test", Color::new(0.0, 0.0, 0.0, 1.0), scene)
    }

    #[test]
    fn stops_when_the_closure_asks() {
        let mut frames = 0;
        HeadlessBackend::new(Duration::from_millis(16), 100)
            .run(presentation(), |dt, input, _| {
                assert_eq!(dt, Duration::from_millis(16));
                assert_eq!(input, FrameInput::default());
                frames += 1;
                frames < 5
            })
            .expect("finished early");
        assert_eq!(frames, 5);
    }

    #[test]
    fn frame_budget_exhaustion_is_an_error() {
        let result = HeadlessBackend::new(Duration::from_millis(16), 3).run(presentation(), |_, _, _| true);
        assert!(result.is_err());
    }
}
