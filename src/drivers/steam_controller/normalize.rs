use serde::{Deserialize, Serialize};

/// Dead zone and edge zone of a two dimensional input, both given as a
/// fraction of the full radius.
#[derive(Debug, Default, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct Zone {
    pub dead: f32,
    pub edge: f32,
}

impl Zone {
    /// Create a zone. Both fractions are clamped into [0, 1] and a value
    /// that is not a number reads as 0.
    pub fn new(dead: f32, edge: f32) -> Self {
        Self {
            dead: fraction("dead zone", dead),
            edge: fraction("edge zone", edge),
        }
    }
}

fn fraction(name: &str, value: f32) -> f32 {
    let clamped = if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    };
    if clamped != value {
        log::warn!("Invalid {name} {value}, using {clamped}");
    }
    clamped
}

/// Normalizes the primary member of a paired axis using the magnitude of the
/// combined (primary, secondary) vector. Inputs within the dead zone read as
/// zero, the radius `1 - edge` maps to full scale and anything beyond it is
/// clamped.
pub fn normalize_paired(primary: f32, secondary: f32, zone: Zone) -> f32 {
    let primary = primary as f64;
    let secondary = secondary as f64;
    let dead = zone.dead as f64;
    let edge = zone.edge as f64;

    let magnitude = (primary * primary + secondary * secondary).sqrt();
    if magnitude == 0.0 || magnitude <= dead {
        return 0.0;
    }

    let span = 1.0 - dead - edge;
    if span <= 0.0 {
        // The edge zone swallows the whole range, saturate immediately
        return (primary / magnitude) as f32;
    }

    let scaled = ((magnitude - dead) / span).min(1.0);
    (primary * scaled / magnitude) as f32
}

/// Normalizes both members of a paired axis
pub fn normalize_pair(x: f32, y: f32, zone: Zone) -> (f32, f32) {
    (normalize_paired(x, y, zone), normalize_paired(y, x, zone))
}
