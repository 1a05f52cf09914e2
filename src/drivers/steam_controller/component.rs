//! Declarative description of every button and axis the controller exposes.
//!
//! Components are stored in a flat [ComponentTable] that is built once per
//! session. Paired axes refer to their partner by index into the same table.
use std::fmt::Display;

use crate::config::SessionConfig;

use super::{
    codec::{self, ContextBuffers},
    normalize::{normalize_paired, Zone},
};

/// Offsets of the analog fields in a context buffer
const STICK_X_OFFSET: usize = 16;
const STICK_Y_OFFSET: usize = 18;
const LPAD_X_OFFSET: usize = 16;
const LPAD_Y_OFFSET: usize = 18;
const RPAD_X_OFFSET: usize = 20;
const RPAD_Y_OFFSET: usize = 22;
const LEFT_TRIGGER_OFFSET: usize = 11;
const RIGHT_TRIGGER_OFFSET: usize = 12;
const ACCEL_X_OFFSET: usize = 28;
const ACCEL_Y_OFFSET: usize = 30;
const ACCEL_Z_OFFSET: usize = 32;
const GYRO_X_OFFSET: usize = 34;
const GYRO_Y_OFFSET: usize = 36;
const GYRO_Z_OFFSET: usize = 38;

/// Buttons of the Steam Controller and their bit index in the button bitfield.
/// Bit 21 is unused and bit 23 is the pad/stick conjunction flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ButtonId {
    /// Right trigger fully pressed
    R2,
    /// Left trigger fully pressed
    L2,
    /// Right shoulder button
    R1,
    /// Left shoulder button
    L1,
    Y,
    B,
    X,
    A,
    /// Top of the left pad pressed down
    LPadUp,
    /// Right side of the left pad pressed down
    LPadRight,
    /// Left side of the left pad pressed down
    LPadLeft,
    /// Bottom of the left pad pressed down
    LPadDown,
    /// Left menu button
    Back,
    /// Steam logo button
    Steam,
    /// Right menu button
    Start,
    LeftGrip,
    RightGrip,
    /// Left pad clicked
    LPadPress,
    /// Right pad clicked
    RPadPress,
    /// Left pad touched
    LPadTouch,
    /// Right pad touched
    RPadTouch,
    /// Joystick pressed down
    StickButton,
}

impl ButtonId {
    /// All buttons in the order they are exposed to applications
    pub const ALL: [ButtonId; 22] = [
        ButtonId::R2,
        ButtonId::L2,
        ButtonId::R1,
        ButtonId::L1,
        ButtonId::A,
        ButtonId::B,
        ButtonId::X,
        ButtonId::Y,
        ButtonId::LPadUp,
        ButtonId::LPadRight,
        ButtonId::LPadLeft,
        ButtonId::LPadDown,
        ButtonId::Back,
        ButtonId::Steam,
        ButtonId::Start,
        ButtonId::LeftGrip,
        ButtonId::RightGrip,
        ButtonId::LPadPress,
        ButtonId::RPadPress,
        ButtonId::LPadTouch,
        ButtonId::RPadTouch,
        ButtonId::StickButton,
    ];

    /// Bit index of the button in the 24 bit button field
    pub fn bit(&self) -> u32 {
        match self {
            ButtonId::R2 => 0,
            ButtonId::L2 => 1,
            ButtonId::R1 => 2,
            ButtonId::L1 => 3,
            ButtonId::Y => 4,
            ButtonId::B => 5,
            ButtonId::X => 6,
            ButtonId::A => 7,
            ButtonId::LPadUp => 8,
            ButtonId::LPadRight => 9,
            ButtonId::LPadLeft => 10,
            ButtonId::LPadDown => 11,
            ButtonId::Back => 12,
            ButtonId::Steam => 13,
            ButtonId::Start => 14,
            ButtonId::LeftGrip => 15,
            ButtonId::RightGrip => 16,
            ButtonId::LPadPress => 17,
            ButtonId::RPadPress => 18,
            ButtonId::LPadTouch => 19,
            ButtonId::RPadTouch => 20,
            ButtonId::StickButton => 22,
        }
    }

    /// Bit mask of the button in the configuration button masks
    pub fn mask(&self) -> u32 {
        1 << self.bit()
    }

    pub fn title(&self) -> &'static str {
        match self {
            ButtonId::R2 => "R2",
            ButtonId::L2 => "L2",
            ButtonId::R1 => "R1",
            ButtonId::L1 => "L1",
            ButtonId::Y => "Y",
            ButtonId::B => "B",
            ButtonId::X => "X",
            ButtonId::A => "A",
            ButtonId::LPadUp => "LPad Up",
            ButtonId::LPadRight => "LPad Rt",
            ButtonId::LPadLeft => "LPad Lt",
            ButtonId::LPadDown => "LPad Dn",
            ButtonId::Back => "Back",
            ButtonId::Steam => "Steam",
            ButtonId::Start => "Start",
            ButtonId::LeftGrip => "LG",
            ButtonId::RightGrip => "RG",
            ButtonId::LPadPress => "LPad Press",
            ButtonId::RPadPress => "RPad Press",
            ButtonId::LPadTouch => "LPad Touch",
            ButtonId::RPadTouch => "RPad Touch",
            ButtonId::StickButton => "Stick Btn",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ButtonId::R2 => "Right trigger fully pressed",
            ButtonId::L2 => "Left trigger fully pressed",
            ButtonId::R1 => "Right shoulder button",
            ButtonId::L1 => "Left shoulder button",
            ButtonId::Y => "Face button Y",
            ButtonId::B => "Face button B",
            ButtonId::X => "Face button X",
            ButtonId::A => "Face button A",
            ButtonId::LPadUp => "Top of left pad pressed down",
            ButtonId::LPadRight => "Right side of left pad pressed down",
            ButtonId::LPadLeft => "Left side of left pad pressed down",
            ButtonId::LPadDown => "Bottom of left pad pressed down",
            ButtonId::Back => "Left menu button",
            ButtonId::Steam => "Steam logo button",
            ButtonId::Start => "Right menu button",
            ButtonId::LeftGrip => "Left grip button",
            ButtonId::RightGrip => "Right grip button",
            ButtonId::LPadPress => "Left pad pressed down",
            ButtonId::RPadPress => "Right pad pressed down",
            ButtonId::LPadTouch => "Left pad touched",
            ButtonId::RPadTouch => "Right pad touched",
            ButtonId::StickButton => "Joystick pressed down",
        }
    }
}

impl Display for ButtonId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.title())
    }
}

/// Analog inputs of the Steam Controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AxisId {
    StickX,
    StickY,
    LPadX,
    LPadY,
    RPadX,
    RPadY,
    LeftTrigger,
    RightTrigger,
    GyroX,
    GyroY,
    GyroZ,
    AccelX,
    AccelY,
    AccelZ,
}

impl AxisId {
    pub fn title(&self) -> &'static str {
        match self {
            AxisId::StickX => "X Axis",
            AxisId::StickY => "Y Axis",
            AxisId::LPadX => "LPad X",
            AxisId::LPadY => "LPad Y",
            AxisId::RPadX => "RPad X",
            AxisId::RPadY => "RPad Y",
            AxisId::LeftTrigger => "LT",
            AxisId::RightTrigger => "RT",
            AxisId::GyroX => "Gyro X",
            AxisId::GyroY => "Gyro Y",
            AxisId::GyroZ => "Gyro Z",
            AxisId::AccelX => "Accel X",
            AxisId::AccelY => "Accel Y",
            AxisId::AccelZ => "Accel Z",
        }
    }
}

impl Display for AxisId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.title())
    }
}

/// Identity of a component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Identifier {
    Button(ButtonId),
    Axis(AxisId),
}

impl Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Identifier::Button(button) => button.fmt(f),
            Identifier::Axis(axis) => axis.fmt(f),
        }
    }
}

/// Decodes a raw axis value from the context buffers
pub type DecodeFn = fn(&ContextBuffers) -> f32;

/// How a component reads its value
#[derive(Debug, Clone, Copy)]
pub enum ComponentKind {
    /// Button read from the latest report
    Button { byte_offset: usize, bit_mask: u8 },
    /// Button read from the pad context buffer only. The left pad click bit
    /// mirrors the stick click while the pad is untouched, so the latest
    /// buffer cannot be trusted for it.
    PadButton { byte_offset: usize, bit_mask: u8 },
    /// Disabled button that is still visible; always reads 0
    DisabledButton,
    /// Independent axis with linear scaling
    Axis { decode: DecodeFn },
    /// One half of a two dimensional input, normalized together with the
    /// component at `partner`
    PairedAxis {
        partner: usize,
        zone: Zone,
        decode: DecodeFn,
    },
}

/// A single button or axis
#[derive(Debug, Clone)]
pub struct ComponentSpec {
    pub id: Identifier,
    pub kind: ComponentKind,
}

impl ComponentSpec {
    fn button(button: ButtonId, enabled: bool) -> Self {
        let bit = button.bit();
        let byte_offset = (bit / 8) as usize;
        let bit_mask = 1 << (bit % 8);
        let kind = match (enabled, button) {
            (false, _) => ComponentKind::DisabledButton,
            (true, ButtonId::LPadPress) => ComponentKind::PadButton {
                byte_offset,
                bit_mask,
            },
            (true, _) => ComponentKind::Button {
                byte_offset,
                bit_mask,
            },
        };
        Self {
            id: Identifier::Button(button),
            kind,
        }
    }

    fn axis(axis: AxisId, decode: DecodeFn) -> Self {
        Self {
            id: Identifier::Axis(axis),
            kind: ComponentKind::Axis { decode },
        }
    }

    fn paired(axis: AxisId, partner: usize, zone: Zone, decode: DecodeFn) -> Self {
        Self {
            id: Identifier::Axis(axis),
            kind: ComponentKind::PairedAxis {
                partner,
                zone,
                decode,
            },
        }
    }

    pub fn name(&self) -> &'static str {
        match self.id {
            Identifier::Button(button) => button.title(),
            Identifier::Axis(axis) => axis.title(),
        }
    }

    pub fn is_button(&self) -> bool {
        matches!(self.id, Identifier::Button(_))
    }

    /// Decodes the value of this component without any pairing applied
    pub fn decode_raw(&self, buffers: &ContextBuffers) -> f32 {
        match self.kind {
            ComponentKind::Button {
                byte_offset,
                bit_mask,
            } => codec::button(buffers.latest(), byte_offset, bit_mask),
            ComponentKind::PadButton {
                byte_offset,
                bit_mask,
            } => codec::button(&buffers.pad, byte_offset, bit_mask),
            ComponentKind::DisabledButton => 0.0,
            ComponentKind::Axis { decode } => decode(buffers),
            ComponentKind::PairedAxis { decode, .. } => decode(buffers),
        }
    }
}

/// Immutable table of every component exposed by a session
#[derive(Debug, Clone)]
pub struct ComponentTable {
    components: Vec<ComponentSpec>,
}

impl ComponentTable {
    /// Build the component table for the given configuration. Buttons not in
    /// the button mask are either hidden or always read 0 depending on
    /// `hide_disabled_buttons`. Gyro and accelerometer axes exist only when
    /// the gyro mode sends their raw values.
    pub fn new(config: &SessionConfig) -> Self {
        let mut components = Vec::with_capacity(36);

        for button in ButtonId::ALL {
            let enabled = config.button_mask & button.mask() != 0;
            if !enabled && config.hide_disabled_buttons {
                continue;
            }
            components.push(ComponentSpec::button(button, enabled));
        }

        let pairs: [(AxisId, DecodeFn, AxisId, DecodeFn, Zone); 3] = [
            (
                AxisId::StickX,
                stick_x,
                AxisId::StickY,
                stick_y,
                config.left_stick_zone(),
            ),
            (
                AxisId::LPadX,
                lpad_x,
                AxisId::LPadY,
                lpad_y,
                config.left_pad_zone(),
            ),
            (
                AxisId::RPadX,
                rpad_x,
                AxisId::RPadY,
                rpad_y,
                config.right_pad_zone(),
            ),
        ];
        for (x_id, x_decode, y_id, y_decode, zone) in pairs {
            let x = components.len();
            let y = x + 1;
            components.push(ComponentSpec::paired(x_id, y, zone, x_decode));
            components.push(ComponentSpec::paired(y_id, x, zone, y_decode));
        }

        components.push(ComponentSpec::axis(AxisId::LeftTrigger, left_trigger));
        components.push(ComponentSpec::axis(AxisId::RightTrigger, right_trigger));

        if config.sends_raw_gyro() {
            components.push(ComponentSpec::axis(AxisId::GyroX, gyro_x));
            components.push(ComponentSpec::axis(AxisId::GyroY, gyro_y));
            components.push(ComponentSpec::axis(AxisId::GyroZ, gyro_z));
        }
        if config.sends_raw_accel() {
            components.push(ComponentSpec::axis(AxisId::AccelX, accel_x));
            components.push(ComponentSpec::axis(AxisId::AccelY, accel_y));
            components.push(ComponentSpec::axis(AxisId::AccelZ, accel_z));
        }

        Self { components }
    }

    pub fn components(&self) -> &[ComponentSpec] {
        &self.components
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ComponentSpec> {
        self.components.get(index)
    }

    /// Returns the index of the component with the given identity
    pub fn position(&self, id: Identifier) -> Option<usize> {
        self.components.iter().position(|c| c.id == id)
    }

    /// Returns the indices of all button components
    pub fn buttons(&self) -> impl Iterator<Item = usize> + '_ {
        self.components
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_button())
            .map(|(i, _)| i)
    }

    /// Decodes the value of the component at the given index, applying the
    /// dead zone and edge zone of paired axes.
    pub fn value(&self, index: usize, buffers: &ContextBuffers) -> f32 {
        let Some(component) = self.components.get(index) else {
            return 0.0;
        };
        match component.kind {
            ComponentKind::PairedAxis {
                partner,
                zone,
                decode,
            } => {
                let primary = decode(buffers);
                let secondary = self
                    .components
                    .get(partner)
                    .map(|other| other.decode_raw(buffers))
                    .unwrap_or_default();
                normalize_paired(primary, secondary, zone)
            }
            _ => component.decode_raw(buffers),
        }
    }
}

fn stick_x(buffers: &ContextBuffers) -> f32 {
    codec::val16(&buffers.stick, STICK_X_OFFSET)
}

fn stick_y(buffers: &ContextBuffers) -> f32 {
    -codec::val16(&buffers.stick, STICK_Y_OFFSET)
}

fn lpad_x(buffers: &ContextBuffers) -> f32 {
    codec::val16(&buffers.pad, LPAD_X_OFFSET)
}

fn lpad_y(buffers: &ContextBuffers) -> f32 {
    -codec::val16(&buffers.pad, LPAD_Y_OFFSET)
}

fn rpad_x(buffers: &ContextBuffers) -> f32 {
    codec::val16(buffers.latest(), RPAD_X_OFFSET)
}

fn rpad_y(buffers: &ContextBuffers) -> f32 {
    -codec::val16(buffers.latest(), RPAD_Y_OFFSET)
}

fn left_trigger(buffers: &ContextBuffers) -> f32 {
    codec::unsigned8(buffers.latest(), LEFT_TRIGGER_OFFSET)
}

fn right_trigger(buffers: &ContextBuffers) -> f32 {
    codec::unsigned8(buffers.latest(), RIGHT_TRIGGER_OFFSET)
}

fn gyro_x(buffers: &ContextBuffers) -> f32 {
    codec::val16(buffers.latest(), GYRO_X_OFFSET)
}

fn gyro_y(buffers: &ContextBuffers) -> f32 {
    -codec::val16(buffers.latest(), GYRO_Y_OFFSET)
}

fn gyro_z(buffers: &ContextBuffers) -> f32 {
    -codec::val16(buffers.latest(), GYRO_Z_OFFSET)
}

fn accel_x(buffers: &ContextBuffers) -> f32 {
    codec::val16(buffers.latest(), ACCEL_X_OFFSET)
}

fn accel_y(buffers: &ContextBuffers) -> f32 {
    -codec::val16(buffers.latest(), ACCEL_Y_OFFSET)
}

fn accel_z(buffers: &ContextBuffers) -> f32 {
    -codec::val16(buffers.latest(), ACCEL_Z_OFFSET)
}
