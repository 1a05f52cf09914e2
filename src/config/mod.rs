pub mod path;


use std::{collections::HashMap, io, path::Path, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::drivers::steam_controller::normalize::Zone;

/// Gyro and accelerometer disabled
pub const GYRO_MODE_OFF: u16 = 0x0000;
pub const GYRO_MODE_STEERING: u16 = 0x0001;
pub const GYRO_MODE_TILT: u16 = 0x0002;
pub const GYRO_MODE_SEND_ORIENTATION: u16 = 0x0004;
/// Report raw accelerometer values
pub const GYRO_MODE_SEND_RAW_ACCEL: u16 = 0x0008;
/// Report raw gyro values
pub const GYRO_MODE_SEND_RAW_GYRO: u16 = 0x0010;

/// Every button bit that can be enabled
pub const ALL_BUTTONS_MASK: u32 = 0x7FFFFF;

/// Represents all possible errors loading a [SessionConfig]
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Could not read: {0}")]
    IoError(#[from] io::Error),
    #[error("Unable to deserialize: {0}")]
    DeserializeError(#[from] serde_yaml::Error),
}

/// Behavior of the left stick or right pad register
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InputMode {
    /// The input moves the system mouse pointer
    Mouse = 0,
    /// The input only reports its position
    #[default]
    Joystick = 1,
}

impl InputMode {
    pub fn register_value(&self) -> u16 {
        *self as u16
    }
}

impl FromStr for InputMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mouse" | "0" => Ok(InputMode::Mouse),
            "joystick" | "1" => Ok(InputMode::Joystick),
            _ => Err(format!("Invalid input mode: {s}")),
        }
    }
}

/// Configuration of a single controller session. It is read once when the
/// session is opened and never changes afterwards.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case", default)]
pub struct SessionConfig {
    /// Whether the mode registers below are written to the controller
    pub apply_configuration: bool,
    pub left_stick_mode: InputMode,
    pub right_pad_mode: InputMode,
    /// Raw trackball/margin register value. When absent, it defaults to
    /// trackball (0x8000) in mouse mode and 0 otherwise.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trackball_or_margin: Option<u16>,
    /// Bitmask of the `GYRO_MODE_*` flags
    pub gyro_mode: u16,
    /// Expose both haptic motors as rumblers
    pub rumblers: bool,
    pub left_pad_auto_haptics: bool,
    /// Has no effect while the right pad is in mouse mode
    pub right_pad_auto_haptics: bool,
    pub left_stick_dead_zone: f32,
    pub left_pad_dead_zone: f32,
    pub right_pad_dead_zone: f32,
    pub left_stick_edge_zone: f32,
    pub left_pad_edge_zone: f32,
    pub right_pad_edge_zone: f32,
    /// Horizontal gyro mouse speed. Zero disables the horizontal component.
    pub gyro_mouse_x: f32,
    /// Vertical gyro mouse speed. Zero disables the vertical component.
    pub gyro_mouse_y: f32,
    /// Scale applied to raw gyro values before the per-axis speeds
    pub gyro_mouse_scale: f32,
    /// Buttons of which at least one must be held for the gyro mouse to move.
    /// Zero means the gyro mouse is always active.
    pub gyro_mouse_enable_mask: u32,
    /// Buttons that stop the gyro mouse while held
    pub gyro_mouse_disable_mask: u32,
    /// Bitmask of enabled buttons
    pub button_mask: u32,
    /// Hide disabled buttons instead of reporting them as never pressed
    pub hide_disabled_buttons: bool,
    /// Capacity of the button transition queue
    pub event_queue_size: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            apply_configuration: true,
            left_stick_mode: InputMode::Joystick,
            right_pad_mode: InputMode::Joystick,
            trackball_or_margin: None,
            gyro_mode: GYRO_MODE_SEND_RAW_GYRO,
            rumblers: true,
            left_pad_auto_haptics: false,
            right_pad_auto_haptics: true,
            left_stick_dead_zone: 0.0,
            left_pad_dead_zone: 0.2,
            right_pad_dead_zone: 0.2,
            left_stick_edge_zone: 0.0,
            left_pad_edge_zone: 0.3,
            right_pad_edge_zone: 0.3,
            gyro_mouse_x: 0.0,
            gyro_mouse_y: 0.0,
            gyro_mouse_scale: 1000.0,
            gyro_mouse_enable_mask: 0,
            gyro_mouse_disable_mask: 0,
            button_mask: ALL_BUTTONS_MASK,
            hide_disabled_buttons: false,
            event_queue_size: 32,
        }
    }
}

impl SessionConfig {
    /// Load a [SessionConfig] from the given YAML string
    pub fn from_yaml(content: String) -> Result<SessionConfig, LoadError> {
        let config: SessionConfig = serde_yaml::from_str(content.as_str())?;
        Ok(config)
    }

    /// Load a [SessionConfig] from the given YAML file
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<SessionConfig, LoadError> {
        let file = std::fs::File::open(path)?;
        let config: SessionConfig = serde_yaml::from_reader(file)?;
        Ok(config)
    }

    /// Serialize the effective configuration to YAML
    pub fn to_yaml(&self) -> Result<String, LoadError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Build a [SessionConfig] from flat key/value properties. Integer values
    /// may carry a `0x`, `0o` or `0b` radix prefix. Missing keys use their
    /// default and invalid values are logged and replaced by the default.
    pub fn from_properties(properties: &HashMap<String, String>) -> SessionConfig {
        let defaults = SessionConfig::default();
        let props = Properties(properties);

        let right_pad_mode = props.parse("right_pad_mode", defaults.right_pad_mode, |v| {
            InputMode::from_str(v).ok()
        });

        SessionConfig {
            apply_configuration: props.flag("apply_configuration", defaults.apply_configuration),
            left_stick_mode: props.parse("left_stick_mode", defaults.left_stick_mode, |v| {
                InputMode::from_str(v).ok()
            }),
            right_pad_mode,
            trackball_or_margin: props.parse("trackball_or_margin", None, |v| {
                parse_radix::<u16>(v).map(Some)
            }),
            gyro_mode: props.integer("gyro_mode", defaults.gyro_mode),
            rumblers: props.flag("rumblers", defaults.rumblers),
            left_pad_auto_haptics: props
                .flag("left_pad_auto_haptics", defaults.left_pad_auto_haptics),
            right_pad_auto_haptics: props
                .flag("right_pad_auto_haptics", defaults.right_pad_auto_haptics),
            left_stick_dead_zone: props.float("left_stick_dead_zone", defaults.left_stick_dead_zone),
            left_pad_dead_zone: props.float("left_pad_dead_zone", defaults.left_pad_dead_zone),
            right_pad_dead_zone: props.float("right_pad_dead_zone", defaults.right_pad_dead_zone),
            left_stick_edge_zone: props.float("left_stick_edge_zone", defaults.left_stick_edge_zone),
            left_pad_edge_zone: props.float("left_pad_edge_zone", defaults.left_pad_edge_zone),
            right_pad_edge_zone: props.float("right_pad_edge_zone", defaults.right_pad_edge_zone),
            gyro_mouse_x: props.float("gyro_mouse_x", defaults.gyro_mouse_x),
            gyro_mouse_y: props.float("gyro_mouse_y", defaults.gyro_mouse_y),
            gyro_mouse_scale: props.float("gyro_mouse_scale", defaults.gyro_mouse_scale),
            gyro_mouse_enable_mask: props
                .integer("gyro_mouse_enable_mask", defaults.gyro_mouse_enable_mask),
            gyro_mouse_disable_mask: props
                .integer("gyro_mouse_disable_mask", defaults.gyro_mouse_disable_mask),
            button_mask: props.integer("button_mask", defaults.button_mask),
            hide_disabled_buttons: props
                .flag("hide_disabled_buttons", defaults.hide_disabled_buttons),
            event_queue_size: props.integer("event_queue_size", defaults.event_queue_size),
        }
    }

    /// Returns the trackball/margin register value, applying the mode
    /// dependent default when none was configured.
    pub fn trackball_or_margin(&self) -> u16 {
        self.trackball_or_margin
            .unwrap_or(match self.right_pad_mode {
                InputMode::Mouse => 0x8000,
                InputMode::Joystick => 0x0000,
            })
    }

    pub fn left_pad_auto_haptics(&self) -> bool {
        self.left_pad_auto_haptics
    }

    /// Right pad auto haptics are disabled while the pad moves the mouse
    pub fn right_pad_auto_haptics(&self) -> bool {
        self.right_pad_auto_haptics && self.right_pad_mode != InputMode::Mouse
    }

    pub fn left_stick_zone(&self) -> Zone {
        Zone::new(self.left_stick_dead_zone, self.left_stick_edge_zone)
    }

    pub fn left_pad_zone(&self) -> Zone {
        Zone::new(self.left_pad_dead_zone, self.left_pad_edge_zone)
    }

    pub fn right_pad_zone(&self) -> Zone {
        Zone::new(self.right_pad_dead_zone, self.right_pad_edge_zone)
    }

    pub fn sends_raw_gyro(&self) -> bool {
        self.gyro_mode & GYRO_MODE_SEND_RAW_GYRO != 0
    }

    pub fn sends_raw_accel(&self) -> bool {
        self.gyro_mode & GYRO_MODE_SEND_RAW_ACCEL != 0
    }

    /// Whether the gyro mouse produces any pointer movement at all
    pub fn gyro_mouse_enabled(&self) -> bool {
        (self.gyro_mouse_x != 0.0 || self.gyro_mouse_y != 0.0)
            && self.apply_configuration
            && self.sends_raw_gyro()
    }
}

/// Integer types that can be parsed from a flat property value
pub trait RadixInteger: Sized + Copy {
    fn from_str_radix(src: &str, radix: u32) -> Result<Self, std::num::ParseIntError>;
}

macro_rules! impl_radix_integer {
    ($($t:ty),*) => {
        $(impl RadixInteger for $t {
            fn from_str_radix(src: &str, radix: u32) -> Result<Self, std::num::ParseIntError> {
                <$t>::from_str_radix(src, radix)
            }
        })*
    };
}

impl_radix_integer!(u16, u32, usize);

/// Parses an integer with an optional `0x`, `0o` or `0b` radix prefix
pub fn parse_radix<T: RadixInteger>(value: &str) -> Option<T> {
    let value = value.trim();
    let (digits, radix) = if let Some(rest) = value.strip_prefix("0x") {
        (rest, 16)
    } else if let Some(rest) = value.strip_prefix("0o") {
        (rest, 8)
    } else if let Some(rest) = value.strip_prefix("0b") {
        (rest, 2)
    } else {
        (value, 10)
    };
    T::from_str_radix(digits, radix).ok()
}

/// Typed lookups over flat key/value properties
struct Properties<'a>(&'a HashMap<String, String>);

impl Properties<'_> {
    fn parse<T, F>(&self, key: &str, default: T, parse: F) -> T
    where
        F: Fn(&str) -> Option<T>,
    {
        let Some(value) = self.0.get(key) else {
            return default;
        };
        match parse(value) {
            Some(parsed) => parsed,
            None => {
                log::info!("Property '{key}' has an invalid value '{value}'. Using default.");
                default
            }
        }
    }

    fn integer<T: RadixInteger>(&self, key: &str, default: T) -> T {
        self.parse(key, default, parse_radix::<T>)
    }

    fn float(&self, key: &str, default: f32) -> f32 {
        self.parse(key, default, |v| v.trim().parse::<f32>().ok())
    }

    /// Flags accept `true`/`false` or any integer, where non-zero is true
    fn flag(&self, key: &str, default: bool) -> bool {
        self.parse(key, default, |v| match v.trim() {
            "true" => Some(true),
            "false" => Some(false),
            other => parse_radix::<u32>(other).map(|n| n != 0),
        })
    }
}
