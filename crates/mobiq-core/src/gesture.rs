//! Pointer gesture composition.
//!
//! A [`PointerSequence`] is an ordered list of timed actions for a single
//! touch pointer. It is built fresh for every gesture, sent to the driver as
//! one batch, and then dropped.
//!
//! The drag gesture used by the puzzle screen is
//!
//! ```text
//! move(source) -> down -> pause(press_dwell) -> move(target) -> pause(drop_dwell) -> up
//! ```
//!
//! The dwell intervals make the app's gesture recognizer treat the motion as a
//! deliberate drag instead of a flick. Their defaults are tuned for the demo
//! app and are configurable through [`DragTiming`].
//!
//! # Example
//!
//! ```
//! use mobiq_core::element::Point;
//! use mobiq_core::gesture::{DragTiming, PointerSequence};
//!
//! let seq = PointerSequence::drag(Point::new(50, 600), Point::new(50, 100), &DragTiming::default());
//! assert_eq!(seq.actions().len(), 6);
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::element::Point;

/// Pointer id used for single-finger gestures.
pub const FINGER: &str = "finger";

/// Timing of the drag gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DragTiming {
    /// Hold after pressing on the source, in milliseconds.
    pub press_dwell_ms: u64,
    /// Hold over the target before releasing, in milliseconds.
    pub drop_dwell_ms: u64,
    /// Duration of each pointer move, in milliseconds.
    pub move_duration_ms: u64,
}

impl Default for DragTiming {
    fn default() -> Self {
        Self {
            press_dwell_ms: 200,
            drop_dwell_ms: 1000,
            move_duration_ms: 250,
        }
    }
}

impl DragTiming {
    pub fn press_dwell(&self) -> Duration {
        Duration::from_millis(self.press_dwell_ms)
    }

    pub fn drop_dwell(&self) -> Duration {
        Duration::from_millis(self.drop_dwell_ms)
    }

    pub fn move_duration(&self) -> Duration {
        Duration::from_millis(self.move_duration_ms)
    }
}

/// A single step of a pointer gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerAction {
    /// Move the pointer to an absolute viewport point.
    MoveTo { point: Point, duration: Duration },
    /// Press the pointer (touch contact / primary button).
    Down,
    /// Hold the current state.
    Pause(Duration),
    /// Release the pointer.
    Up,
}

impl PointerAction {
    fn to_w3c(self) -> Value {
        match self {
            PointerAction::MoveTo { point, duration } => json!({
                "type": "pointerMove",
                "duration": duration.as_millis() as u64,
                "origin": "viewport",
                "x": point.x,
                "y": point.y,
            }),
            PointerAction::Down => json!({"type": "pointerDown", "button": 0}),
            PointerAction::Pause(duration) => json!({
                "type": "pause",
                "duration": duration.as_millis() as u64,
            }),
            PointerAction::Up => json!({"type": "pointerUp", "button": 0}),
        }
    }
}

/// An ordered gesture for one touch pointer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointerSequence {
    pointer_id: String,
    actions: Vec<PointerAction>,
}

impl PointerSequence {
    /// Starts an empty sequence for the pointer `id`.
    pub fn touch(id: impl Into<String>) -> Self {
        Self {
            pointer_id: id.into(),
            actions: Vec::new(),
        }
    }

    pub fn move_to(mut self, point: Point, duration: Duration) -> Self {
        self.actions.push(PointerAction::MoveTo { point, duration });
        self
    }

    pub fn down(mut self) -> Self {
        self.actions.push(PointerAction::Down);
        self
    }

    pub fn pause(mut self, duration: Duration) -> Self {
        self.actions.push(PointerAction::Pause(duration));
        self
    }

    pub fn up(mut self) -> Self {
        self.actions.push(PointerAction::Up);
        self
    }

    /// Press-hold-move-hold-release from `from` to `to`.
    pub fn drag(from: Point, to: Point, timing: &DragTiming) -> Self {
        Self::touch(FINGER)
            .move_to(from, timing.move_duration())
            .down()
            .pause(timing.press_dwell())
            .move_to(to, timing.move_duration())
            .pause(timing.drop_dwell())
            .up()
    }

    pub fn pointer_id(&self) -> &str {
        &self.pointer_id
    }

    pub fn actions(&self) -> &[PointerAction] {
        &self.actions
    }

    /// Total time the gesture holds the pointer, summing moves and pauses.
    pub fn total_duration(&self) -> Duration {
        self.actions
            .iter()
            .map(|a| match a {
                PointerAction::MoveTo { duration, .. } | PointerAction::Pause(duration) => {
                    *duration
                }
                PointerAction::Down | PointerAction::Up => Duration::ZERO,
            })
            .sum()
    }

    /// The W3C `POST /actions` request body for this sequence.
    pub fn to_w3c(&self) -> Value {
        json!({
            "actions": [{
                "type": "pointer",
                "id": self.pointer_id,
                "parameters": {"pointerType": "touch"},
                "actions": self.actions.iter().map(|a| a.to_w3c()).collect::<Vec<_>>(),
            }]
        })
    }
}
