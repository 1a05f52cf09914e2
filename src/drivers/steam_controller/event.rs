use std::time::Instant;

use super::component::{AxisId, ButtonId};

/// Events that can be emitted by the Steam Controller
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    Button(ButtonEvent),
    Axis(AxisEvent),
}

impl Event {
    /// Numeric value of the event. Buttons report 0.0 or 1.0.
    pub fn value(&self) -> f32 {
        match self {
            Event::Button(event) => {
                if event.pressed {
                    1.0
                } else {
                    0.0
                }
            }
            Event::Axis(event) => event.value,
        }
    }

    /// When the input state the event was derived from was received
    pub fn timestamp(&self) -> Option<Instant> {
        match self {
            Event::Button(event) => event.timestamp,
            Event::Axis(event) => event.timestamp,
        }
    }
}

/// Button pressed or released
#[derive(Clone, Debug, PartialEq)]
pub struct ButtonEvent {
    pub button: ButtonId,
    pub pressed: bool,
    pub timestamp: Option<Instant>,
}

/// Axis moved to a new normalized value
#[derive(Clone, Debug, PartialEq)]
pub struct AxisEvent {
    pub axis: AxisId,
    pub value: f32,
    pub timestamp: Option<Instant>,
}
