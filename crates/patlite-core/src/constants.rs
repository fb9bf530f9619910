//! Core constants for the signal tower USB command protocol.
//!
//! The tower accepts a single fixed-layout output report. Every command
//! carries the complete desired state of the buzzer and all lamps:
//!
//! ```text
//! index:  0      1        2       3      4      5        6        7        8
//!        [RID] [VER=0] [CMD=0] [MODE] [SOUND] [R | Y] [G | B] [W | 0] [RSV=0]
//! ```
//!
//! - `RID` - HID report id, always 0
//! - `MODE` - buzzer repeat mode (0 = continuous, 1-15 = repeat count)
//! - `SOUND` - buzzer pitch (0 = off, 1-13 = pitches, 14 = device default)
//! - `R | Y`, `G | B`, `W | 0` - one 4-bit lamp code per channel, high nibble first
//!
//! # Usage
//!
//! ```
//! use patlite_core::constants::*;
//!
//! assert_eq!(PACKET_LEN, 9);
//! assert_eq!(DEFAULT_VENDOR_ID, 0x191a);
//! ```

// ============================================================================
// USB identification
// ============================================================================

/// Vendor ID of the USB signal tower.
pub const DEFAULT_VENDOR_ID: u16 = 0x191a;

/// Product ID of the USB signal tower.
pub const DEFAULT_PRODUCT_ID: u16 = 0x8003;

// ============================================================================
// Packet layout
// ============================================================================

/// Total length of a command packet including the report id byte.
pub const PACKET_LEN: usize = 9;

/// HID report id prepended to every command.
pub const REPORT_ID: u8 = 0x00;

/// Protocol version byte, fixed.
pub const PROTOCOL_VERSION: u8 = 0x00;

/// Command id byte, fixed.
pub const COMMAND_ID: u8 = 0x00;

pub const OFFSET_REPORT_ID: usize = 0;
pub const OFFSET_VERSION: usize = 1;
pub const OFFSET_COMMAND: usize = 2;
pub const OFFSET_BUZZER_MODE: usize = 3;
pub const OFFSET_BUZZER_SOUND: usize = 4;
/// Red lamp in the high nibble, yellow in the low nibble.
pub const OFFSET_LED_RED_YELLOW: usize = 5;
/// Green lamp in the high nibble, blue in the low nibble.
pub const OFFSET_LED_GREEN_BLUE: usize = 6;
/// White lamp in the high nibble, low nibble unused.
pub const OFFSET_LED_WHITE: usize = 7;
pub const OFFSET_RESERVED: usize = 8;

// ============================================================================
// Value ranges
// ============================================================================

/// Highest valid color value.
pub const MAX_COLOR: u8 = 7;

/// Highest valid pattern value.
pub const MAX_PATTERN: u8 = 3;

/// Highest buzzer mode (15 repetitions).
pub const MAX_BUZZER_MODE: u8 = 15;

/// Highest buzzer sound that may be stored.
pub const MAX_BUZZER_SOUND: u8 = 14;

/// Legacy request value meaning "leave the buzzer sound as it is".
///
/// Only accepted at the request boundary; never stored or encoded.
pub const BUZZER_SOUND_KEEP: u8 = 15;

/// Number of independently addressable lamps.
pub const CHANNEL_COUNT: usize = 5;
