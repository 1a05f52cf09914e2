//! Automatic touchpad haptics and manual rumble blending.
//!
//! Every [HAPTIC_INTERVAL] each pad with auto haptics enabled computes a short
//! burst of pulses from how far and how fast the finger moved since the
//! previous tick. Crossing the center or the edge of the pad adds a strong
//! "snap" to simulate a detent.
use std::time::{Duration, Instant};

use super::hid_report::Motor;

/// Minimum time between two haptic updates
pub const HAPTIC_INTERVAL: Duration = Duration::from_millis(33);
/// Time it takes a manual rumble request to decay to zero
pub const RUMBLE_DECAY: Duration = Duration::from_millis(200);
/// Period and count used when manual rumble overrides the auto haptics
pub const RUMBLE_PERIOD: u16 = 0xB000;
pub const RUMBLE_COUNT: u16 = 0x0002;

const EDGE_ENTER: f64 = 0.9995;
const CENTER_ENTER: f64 = 0.0005;
const TRAVEL_MIN: f64 = 0.0015;
const TRAVEL_MAX: f64 = 0.9985;
const BASE_PERIOD: f64 = 0x1400 as f64;
const PERIOD_RANGE: f64 = 0x4400 as f64;
const CENTER_SNOOP: f64 = 0x7000 as f64;
const TRAVEL_SNOOP: f64 = 0x0800 as f64;
const BURST_MICROS: u32 = 50_000;

/// Hysteresis state of a pad, used so that resting at the center or edge does
/// not trigger a new snap on every tick.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Outcode {
    #[default]
    Center = -1,
    Travel = 0,
    Edge = 1,
}

/// Haptic pulse parameters sent to one motor
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct HapticPulse {
    pub intensity: u16,
    pub period: u16,
    pub count: u16,
}

/// Computes the haptic pulse for a pad that moved from `from` to `to` in
/// `elapsed` time, updating the outcode.
pub fn compute_pulse(
    outcode: &mut Outcode,
    from: (f32, f32),
    to: (f32, f32),
    elapsed: Duration,
) -> HapticPulse {
    let (x0, y0) = (from.0 as f64, from.1 as f64);
    let (x1, y1) = (to.0 as f64, to.1 as f64);
    let distance = (x1 * x1 + y1 * y1).sqrt().min(1.0);

    let mut snap = 0.0;
    let mut snoop = 0.0;
    if distance > EDGE_ENTER && *outcode != Outcode::Edge {
        snap = 0.875;
        *outcode = Outcode::Edge;
    } else if distance < CENTER_ENTER && *outcode != Outcode::Center {
        snap = 1.0;
        snoop = CENTER_SNOOP;
        *outcode = Outcode::Center;
    }
    if distance > TRAVEL_MIN && distance < TRAVEL_MAX && *outcode != Outcode::Travel {
        snap = 0.0075;
        if *outcode != Outcode::Edge {
            snoop = TRAVEL_SNOOP;
        }
        *outcode = Outcode::Travel;
    }

    let nanos = elapsed.as_nanos() as f64;
    let travel = ((x1 - x0).powi(2) + (y1 - y0).powi(2)).sqrt();
    let speed = if nanos > 0.0 {
        (travel * 1e7 / nanos).min(1.0)
    } else {
        0.0
    };

    let period = BASE_PERIOD + snoop + (PERIOD_RANGE * distance).floor();
    let intensity = (0xFFFF as f64 * (snap + (1.0 - snap) * speed * (0.05 + 0.075 * distance)))
        .round()
        .clamp(0.0, 0xFFFF as f64);
    let period = period as u16;
    let count = (BURST_MICROS / period as u32) as u16;

    HapticPulse {
        intensity: intensity as u16,
        period,
        count,
    }
}

/// Auto haptic state of a single pad
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct PadHaptics {
    outcode: Outcode,
    position: (f32, f32),
    pulse: HapticPulse,
}

impl PadHaptics {
    /// Advance to the given normalized pad position
    pub fn update(&mut self, x: f32, y: f32, elapsed: Duration) -> HapticPulse {
        self.pulse = compute_pulse(&mut self.outcode, self.position, (x, y), elapsed);
        self.position = (x, y);
        self.pulse
    }

    /// Output nothing this tick
    pub fn silence(&mut self) {
        self.pulse = HapticPulse::default();
    }

    pub fn pulse(&self) -> HapticPulse {
        self.pulse
    }

    pub fn outcode(&self) -> Outcode {
        self.outcode
    }
}

/// Manual rumble request deposited by the consumer thread
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct RumbleRequest {
    pub intensity: f32,
    pub requested_at: Option<Instant>,
}

impl RumbleRequest {
    pub fn new(intensity: f32, requested_at: Instant) -> Self {
        Self {
            intensity,
            requested_at: Some(requested_at),
        }
    }

    /// Returns the linearly decayed intensity at `now`, scaled to 0..=0xFFFF
    pub fn level_at(&self, now: Instant) -> u16 {
        let Some(requested_at) = self.requested_at else {
            return 0;
        };
        let age = now.saturating_duration_since(requested_at);
        if age > RUMBLE_DECAY {
            return 0;
        }
        let remaining = 1.0 - age.as_secs_f64() / RUMBLE_DECAY.as_secs_f64();
        let level = 0xFFFF as f64 * self.intensity as f64 * remaining;
        level.clamp(0.0, 0xFFFF as f64) as u16
    }
}

/// Picks the stronger of the auto haptic pulse and the manual rumble level.
/// Manual rumble always interrupts with a short sharp pulse.
pub fn blend(auto: HapticPulse, manual: u16) -> HapticPulse {
    if manual > auto.intensity {
        HapticPulse {
            intensity: manual,
            period: RUMBLE_PERIOD,
            count: RUMBLE_COUNT,
        }
    } else {
        auto
    }
}

/// Haptic state of both pads plus the update cadence
#[derive(Debug, Default, Clone)]
pub struct HapticModel {
    pads: [PadHaptics; 2],
    last_tick: Option<Instant>,
}

impl HapticModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the time since the previous tick if a new tick is due. The
    /// very first tick is always due.
    pub fn due(&self, now: Instant) -> Option<Duration> {
        match self.last_tick {
            None => Some(Duration::MAX),
            Some(last) => {
                let elapsed = now.saturating_duration_since(last);
                (elapsed > HAPTIC_INTERVAL).then_some(elapsed)
            }
        }
    }

    pub fn mark(&mut self, now: Instant) {
        self.last_tick = Some(now);
    }

    pub fn pad(&self, motor: Motor) -> &PadHaptics {
        &self.pads[motor.index()]
    }

    pub fn pad_mut(&mut self, motor: Motor) -> &mut PadHaptics {
        &mut self.pads[motor.index()]
    }

    /// Forget all pad state, as after a disconnect
    pub fn reset(&mut self, now: Instant) {
        self.pads = Default::default();
        self.last_tick = Some(now);
    }
}
