//! Tilt orientation: off, wall-clock auto wobble, or pointer-dragged manual angles.

use crate::foundation::core::{Point, Rect};
use crate::scene::settings::{MAX_TILT_DEG, Motion, TiltAngles};

/// Degrees of rotation per pixel of pointer travel.
pub const DRAG_DEG_PER_PX: f64 = 0.5;

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub enum TiltMode {
    Off,
    Auto,
    Manual,
}

impl TiltMode {
    pub fn from_motion(motion: &Motion) -> Self {
        match (motion.tilt, motion.tilt_auto) {
            (false, _) => Self::Off,
            (true, true) => Self::Auto,
            (true, false) => Self::Manual,
        }
    }
}

/// Auto-mode orientation at `t_s` wall-clock seconds.
pub fn auto_orientation(t_s: f64) -> TiltAngles {
    TiltAngles {
        x: 5.0 * (0.5 * t_s).sin(),
        y: 5.0 * (0.3 * t_s).cos(),
    }
}

#[derive(Clone, Debug)]
pub struct TiltController {
    mode: TiltMode,
    angles: TiltAngles,
    drag_from: Option<Point>,
}

impl TiltController {
    pub fn new(mode: TiltMode, persisted: TiltAngles) -> Self {
        Self {
            mode,
            angles: persisted.clamped(),
            drag_from: None,
        }
    }

    pub fn mode(&self) -> TiltMode {
        self.mode
    }

    pub fn is_dragging(&self) -> bool {
        self.drag_from.is_some()
    }

    /// Switch mode and resync the manual angles. An active drag is dropped.
    pub fn reconfigure(&mut self, mode: TiltMode, persisted: TiltAngles) {
        if self.mode != mode {
            tracing::debug!(from = ?self.mode, to = ?mode, "tilt mode changed");
        }
        self.mode = mode;
        self.angles = persisted.clamped();
        self.drag_from = None;
    }

    /// Start a drag if `pos` lies on the composition `surface`. Returns whether a drag started.
    pub fn pointer_down(&mut self, pos: Point, surface: Rect) -> bool {
        if self.mode != TiltMode::Manual || !surface.contains(pos) {
            return false;
        }
        self.drag_from = Some(pos);
        true
    }

    /// Accumulate pointer travel: horizontal drives `y`, vertical drives `x` (inverted).
    pub fn pointer_move(&mut self, pos: Point) {
        let Some(from) = self.drag_from else {
            return;
        };
        let d = pos - from;
        self.angles = TiltAngles {
            x: self.angles.x - d.y * DRAG_DEG_PER_PX,
            y: self.angles.y + d.x * DRAG_DEG_PER_PX,
        }
        .clamped();
        self.drag_from = Some(pos);
    }

    /// End the drag and return the released orientation, to be persisted by the caller.
    pub fn pointer_up(&mut self) -> Option<TiltAngles> {
        self.drag_from.take()?;
        debug_assert!(self.angles.x.abs() <= MAX_TILT_DEG && self.angles.y.abs() <= MAX_TILT_DEG);
        Some(self.angles)
    }

    /// Orientation to display at wall-clock `now_s` seconds.
    pub fn orientation(&self, now_s: f64) -> TiltAngles {
        match self.mode {
            TiltMode::Off => TiltAngles::ZERO,
            TiltMode::Auto => auto_orientation(now_s),
            TiltMode::Manual => self.angles,
        }
    }
}

#[cfg(test)]
#[path = "../tests/unit/tilt.rs"]
mod tests;
