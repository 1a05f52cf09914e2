//! Decoding of raw input report bytes into button and axis values.
//!
//! The left pad and the analog stick report their positions through the same
//! wire fields. A flag bit selects which of the two they describe, so the most
//! recent report of each kind is kept in its own [ContextBuffers] slot.
use super::hid_report::{
    EventType, BUTTONS_OFFSET, CONJUNCTION_FLAG, EVENT_TYPE_OFFSET, INPUT_FLAGS_OFFSET,
    PACKET_SIZE, PAD_CLICK_FLAG, PAD_CONTEXT_FLAG, PAD_TOUCH_FLAG, SHARED_ANALOG_OFFSETS,
};

/// A single raw report or context buffer
pub type Report = [u8; PACKET_SIZE];

/// Reads a signed 16 bit little endian value at the given offset and scales
/// it into [-1, 1).
pub fn val16(data: &Report, offset: usize) -> f32 {
    i16::from_le_bytes([data[offset], data[offset + 1]]) as f32 / 32768.0
}

/// Reads an unsigned byte at the given offset and scales it into [0, 1].
pub fn unsigned8(data: &Report, offset: usize) -> f32 {
    data[offset] as f32 / 255.0
}

/// Returns 1.0 if every bit in the mask is set in the button bitfield byte at
/// the given offset.
pub fn button(data: &Report, byte_offset: usize, bit_mask: u8) -> f32 {
    if data[BUTTONS_OFFSET + byte_offset] & bit_mask == bit_mask {
        1.0
    } else {
        0.0
    }
}

/// Returns the full button bitfield as a little endian integer
pub fn button_bits(data: &Report) -> u32 {
    u32::from_le_bytes([
        data[BUTTONS_OFFSET],
        data[BUTTONS_OFFSET + 1],
        data[BUTTONS_OFFSET + 2],
        data[BUTTONS_OFFSET + 3],
    ])
}

/// Returns the event type tag of the given report, if known
pub fn event_type(data: &Report) -> Option<EventType> {
    EventType::try_from(data[EVENT_TYPE_OFFSET]).ok()
}

/// Which context buffer holds the most recent input report
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ContextSlot {
    #[default]
    Pad,
    Stick,
}

/// The most recent pad-context and stick-context reports
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextBuffers {
    pub pad: Report,
    pub stick: Report,
    pub latest: ContextSlot,
}

impl Default for ContextBuffers {
    fn default() -> Self {
        Self {
            pad: [0; PACKET_SIZE],
            stick: [0; PACKET_SIZE],
            latest: ContextSlot::Pad,
        }
    }
}

impl ContextBuffers {
    /// Returns the buffer that was updated by the most recent report
    pub fn latest(&self) -> &Report {
        match self.latest {
            ContextSlot::Pad => &self.pad,
            ContextSlot::Stick => &self.stick,
        }
    }

    /// Stores an input data report in the slot selected by its context flag.
    /// Unless the pad and stick are in use together, the shared analog fields
    /// of the other slot are zeroed so that a released pad or stick does not
    /// keep reporting its last position.
    pub fn update(&mut self, report: &Report) {
        let flags = report[INPUT_FLAGS_OFFSET];
        self.latest = if flags & PAD_CONTEXT_FLAG != 0 {
            ContextSlot::Pad
        } else {
            ContextSlot::Stick
        };

        match self.latest {
            ContextSlot::Pad => self.pad.copy_from_slice(report),
            ContextSlot::Stick => self.stick.copy_from_slice(report),
        }

        if flags & CONJUNCTION_FLAG != 0 {
            return;
        }
        match self.latest {
            ContextSlot::Pad => {
                self.stick[SHARED_ANALOG_OFFSETS].fill(0);
            }
            ContextSlot::Stick => {
                self.pad[INPUT_FLAGS_OFFSET] &= !(PAD_CLICK_FLAG | PAD_TOUCH_FLAG);
                self.pad[SHARED_ANALOG_OFFSETS].fill(0);
            }
        }
    }

    /// Zero both buffers and select the pad slot
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
