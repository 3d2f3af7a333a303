//! Control bytes understood by the SyncBox hardware.
//!
//! The driver never sends any of these on its own: the device already emits
//! trigger bytes without being told to, and whether the physical start/stop
//! bytes should accompany [`SyncDevice::start`](crate::SyncDevice::start) and
//! [`SyncDevice::stop`](crate::SyncDevice::stop) is unresolved with the
//! hardware owner. Callers who know their box wants them can send them
//! explicitly via [`SyncDevice::send_command`](crate::SyncDevice::send_command).

pub(crate) const CTRL_START: u8 = 0xA0;
pub(crate) const CTRL_STOP: u8 = 0x20;
pub(crate) const CTRL_LIGHTS_BASE: u8 = 0x60;

/// Lights are selected by the low five bits of the light command byte.
pub const LIGHT_PATTERN_MASK: u8 = 0x1F;

/// A command byte to transmit to the SyncBox.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    /// Physically put the box in sending mode (`0xA0`)
    StartSending,
    /// Physically take the box out of sending mode (`0x20`)
    StopSending,
    /// Set the response lights. Bit `n` turns on light `n + 1`; a zero
    /// pattern turns all lights off (`0x60`, `0x61` for light 1, `0x63`
    /// for lights 1 and 2, and so on).
    Lights(u8),
}

impl ControlCommand {
    /// The wire byte for this command.
    pub fn byte(self) -> u8 {
        match self {
            ControlCommand::StartSending => CTRL_START,
            ControlCommand::StopSending => CTRL_STOP,
            ControlCommand::Lights(pattern) => CTRL_LIGHTS_BASE | (pattern & LIGHT_PATTERN_MASK),
        }
    }
}

/// Byte masks for the box's buttons, one bit cleared per button. The PST
/// box only has five buttons; the VU boxes use the higher numbers.
///
/// These belong to a multi-button report mode this driver does not match
/// against (responses are compared as whole symbols). They are published
/// for callers that decode raw reports themselves.
pub const BUTTON_MASKS: [u8; 8] = [
    0b1111_1110,
    0b1111_1101,
    0b1111_1011,
    0b1111_0111,
    0b1110_1111,
    0b1101_1111,
    0b1011_1111,
    0b0111_1111,
];

/// Mask for 1-based button `number`, or `None` if out of range.
pub fn button_mask(number: u8) -> Option<u8> {
    match number {
        1..=8 => Some(BUTTON_MASKS[usize::from(number) - 1]),
        _ => None,
    }
}
