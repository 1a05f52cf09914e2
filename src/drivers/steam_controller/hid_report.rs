//! Source: https://github.com/torvalds/linux/blob/master/drivers/hid/hid-steam.c
//! Source: https://github.com/rodrigorc/steamctrl
use packed_struct::prelude::*;
use thiserror::Error;

/// All reports sent to and received from the controller are 64 bytes
pub const PACKET_SIZE: usize = 64;

/// Byte offset of the event type tag in an input report
pub const EVENT_TYPE_OFFSET: usize = 2;
/// Byte offset of the wireless connection status payload
pub const WIRELESS_STATUS_OFFSET: usize = 4;

/// Input report flag byte (third byte of the button bitfield)
pub const INPUT_FLAGS_OFFSET: usize = 10;
/// Set when the report carries left pad data rather than stick data
pub const PAD_CONTEXT_FLAG: u8 = 0x08;
/// Set when the left pad and stick are being used at the same time
pub const CONJUNCTION_FLAG: u8 = 0x80;
/// Left pad touch bit within the flag byte
pub const PAD_TOUCH_FLAG: u8 = 0x08;
/// Left pad click bit within the flag byte
pub const PAD_CLICK_FLAG: u8 = 0x02;

/// Offset of the button bitfield in an input report
pub const BUTTONS_OFFSET: usize = 8;
/// Offsets of the analog slot shared between the left pad and the stick
pub const SHARED_ANALOG_OFFSETS: std::ops::Range<usize> = 16..20;

/// Event types reported in byte 2 of every input report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventType {
    InputData = 0x01,
    WirelessConnect = 0x03,
    BatteryStatus = 0x04,
}

impl TryFrom<u8> for EventType {
    type Error = &'static str;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x01 => Ok(Self::InputData),
            0x03 => Ok(Self::WirelessConnect),
            0x04 => Ok(Self::BatteryStatus),
            _ => Err("Invalid event type"),
        }
    }
}

/// Payload of a [EventType::WirelessConnect] report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WirelessStatus {
    Disconnect = 0x01,
    Connect = 0x02,
}

impl TryFrom<u8> for WirelessStatus {
    type Error = &'static str;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x01 => Ok(Self::Disconnect),
            0x02 => Ok(Self::Connect),
            _ => Err("Invalid wireless status"),
        }
    }
}

/// Outbound command codes (byte 0 of a feature report)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportType {
    ClearMappings = 0x81,
    DefaultMappings = 0x85,
    WriteRegister = 0x87,
    DefaultMouse = 0x8e,
    TriggerHapticPulse = 0x8f,
    RequestCommStatus = 0xb4,
}

impl TryFrom<u8> for ReportType {
    type Error = &'static str;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x81 => Ok(Self::ClearMappings),
            0x85 => Ok(Self::DefaultMappings),
            0x87 => Ok(Self::WriteRegister),
            0x8e => Ok(Self::DefaultMouse),
            0x8f => Ok(Self::TriggerHapticPulse),
            0xb4 => Ok(Self::RequestCommStatus),
            _ => Err("Invalid report type"),
        }
    }
}

/// Register settings written during setup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Register {
    LStickMode = 0x07,
    RPadMode = 0x08,
    TrackballOrMargin = 0x18,
    GyroMode = 0x30,
}

/// Haptic motors. The protocol numbers the right motor first.
#[derive(PrimitiveEnum_u8, Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum Motor {
    Right = 0,
    Left = 1,
}

impl Motor {
    /// Both motors in the order haptic updates are sent
    pub const ALL: [Motor; 2] = [Motor::Left, Motor::Right];

    /// Index into per-motor arrays
    pub fn index(&self) -> usize {
        *self as usize
    }
}

/// Possible errors building an outbound report
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("unable to pack report: {0:?}")]
    PackingError(#[from] PackingError),
}

/// Command report without a payload (clear/default mappings, default mouse,
/// connection status request)
#[derive(PackedStruct, Debug, Copy, Clone, PartialEq)]
#[packed_struct(bit_numbering = "msb0", size_bytes = "64")]
pub struct PackedCommandReport {
    #[packed_field(bytes = "0")]
    pub report_id: u8,
}

impl PackedCommandReport {
    pub fn new(report_type: ReportType) -> Self {
        Self {
            report_id: report_type as u8,
        }
    }
}

/// One (register, value) triple inside a [PackedWriteRegisterReport]
#[derive(PackedStruct, Debug, Copy, Clone, PartialEq)]
#[packed_struct(bit_numbering = "msb0", size_bytes = "3")]
pub struct PackedRegisterWrite {
    #[packed_field(bytes = "0")]
    pub register: u8,
    #[packed_field(bytes = "1..=2", endian = "lsb")]
    pub value: Integer<u16, packed_bits::Bits<16>>,
}

impl PackedRegisterWrite {
    pub fn new(register: Register, value: u16) -> Self {
        Self {
            register: register as u8,
            value: Integer::from_primitive(value),
        }
    }
}

/// Writes the gyro, stick, pad and trackball registers in one command
#[derive(PackedStruct, Debug, Copy, Clone, PartialEq)]
#[packed_struct(bit_numbering = "msb0", size_bytes = "64")]
pub struct PackedWriteRegisterReport {
    #[packed_field(bytes = "0")]
    pub report_id: u8,
    #[packed_field(bytes = "1")]
    pub report_size: u8,
    #[packed_field(bytes = "2..=13", element_size_bytes = "3")]
    pub registers: [PackedRegisterWrite; 4],
}

impl PackedWriteRegisterReport {
    pub fn new(gyro_mode: u16, stick_mode: u16, pad_mode: u16, trackball_or_margin: u16) -> Self {
        Self {
            report_id: ReportType::WriteRegister as u8,
            report_size: 12,
            registers: [
                PackedRegisterWrite::new(Register::GyroMode, gyro_mode),
                PackedRegisterWrite::new(Register::LStickMode, stick_mode),
                PackedRegisterWrite::new(Register::RPadMode, pad_mode),
                PackedRegisterWrite::new(Register::TrackballOrMargin, trackball_or_margin),
            ],
        }
    }
}

/*
 * Send a haptic pulse to one of the trackpad motors.
 * Intensity is a 16 bit amplitude, period is measured in microseconds and
 * count is the number of pulses to send.
 */
#[derive(PackedStruct, Debug, Copy, Clone, PartialEq)]
#[packed_struct(bit_numbering = "msb0", size_bytes = "64")]
pub struct PackedHapticPulseReport {
    #[packed_field(bytes = "0")]
    pub report_id: u8,
    #[packed_field(bytes = "1")]
    pub report_size: u8,
    #[packed_field(bytes = "2", ty = "enum")]
    pub motor: Motor,
    #[packed_field(bytes = "3..=4", endian = "lsb")]
    pub intensity: Integer<u16, packed_bits::Bits<16>>,
    #[packed_field(bytes = "5..=6", endian = "lsb")]
    pub period: Integer<u16, packed_bits::Bits<16>>,
    #[packed_field(bytes = "7..=8", endian = "lsb")]
    pub count: Integer<u16, packed_bits::Bits<16>>,
}

impl PackedHapticPulseReport {
    pub fn new(motor: Motor, intensity: u16, period: u16, count: u16) -> Self {
        Self {
            report_id: ReportType::TriggerHapticPulse as u8,
            report_size: 7,
            motor,
            intensity: Integer::from_primitive(intensity),
            period: Integer::from_primitive(period),
            count: Integer::from_primitive(count),
        }
    }
}

impl Default for PackedHapticPulseReport {
    fn default() -> Self {
        Self::new(Motor::Right, 0, 0, 0)
    }
}
