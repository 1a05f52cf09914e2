//! Converts gyro rotation into relative pointer movement.
use crate::config::SessionConfig;

/// Receives pointer movement computed from the gyro. Moving the system pointer
/// is up to the implementation.
pub trait PointerSink: Send {
    /// Move the pointer by the given number of pixels. Positive `dy` is up.
    fn move_by(&mut self, dx: i32, dy: i32);
}

/// Returns true if the gyro mouse may move the pointer with the given buttons
/// held. Without enable bits it is active unless a disable button is held,
/// otherwise at least one enable button must also be held.
pub fn is_active(buttons: u32, enable_mask: u32, disable_mask: u32) -> bool {
    (enable_mask == 0 || buttons & enable_mask != 0) && buttons & disable_mask == 0
}

/// Accumulates scaled gyro values and forwards whole pixels to a
/// [PointerSink]. Fractional movement is carried over to the next report.
pub struct GyroMouse {
    x_speed: f32,
    y_speed: f32,
    scale: f32,
    enable_mask: u32,
    disable_mask: u32,
    accumulated: (f32, f32),
    sink: Box<dyn PointerSink>,
}

impl GyroMouse {
    /// Returns a gyro mouse if the configuration enables it
    pub fn new(config: &SessionConfig, sink: Box<dyn PointerSink>) -> Option<Self> {
        if !config.gyro_mouse_enabled() {
            return None;
        }
        Some(Self {
            x_speed: config.gyro_mouse_x,
            y_speed: config.gyro_mouse_y,
            scale: config.gyro_mouse_scale,
            enable_mask: config.gyro_mouse_enable_mask,
            disable_mask: config.gyro_mouse_disable_mask,
            accumulated: (0.0, 0.0),
            sink,
        })
    }

    /// Feed one input report worth of gyro data. Yaw (gyro Z) moves the
    /// pointer horizontally and pitch (gyro X) vertically.
    pub fn update(&mut self, gyro_z: f32, gyro_x: f32, buttons: u32) {
        let (mut dx, mut dy) = self.accumulated;
        dx += self.x_speed * gyro_z * self.scale;
        dy += self.y_speed * gyro_x * self.scale;

        if is_active(buttons, self.enable_mask, self.disable_mask) {
            let (px, py) = (dx.trunc() as i32, dy.trunc() as i32);
            if px != 0 || py != 0 {
                self.sink.move_by(px, py);
            }
        }

        // Whole pixels are dropped while inactive so that releasing a
        // disable button does not make the pointer jump.
        self.accumulated = (dx % 1.0, dy % 1.0);
    }

    /// Returns the fractional movement carried over to the next report
    pub fn remainder(&self) -> (f32, f32) {
        self.accumulated
    }
}

impl std::fmt::Debug for GyroMouse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GyroMouse")
            .field("x_speed", &self.x_speed)
            .field("y_speed", &self.y_speed)
            .field("scale", &self.scale)
            .field("enable_mask", &self.enable_mask)
            .field("disable_mask", &self.disable_mask)
            .field("accumulated", &self.accumulated)
            .finish()
    }
}
