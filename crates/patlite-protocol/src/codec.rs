//! Command codec for the signal tower output report.
//!
//! This module is the only place that knows the wire layout. It maps a
//! complete [`DeviceState`] to the 9-byte packet written to the HID device
//! and back.
//!
//! # Wire Format
//!
//! ```text
//! [0x00] [0x00] [0x00] [mode] [sound] [R:Y] [G:B] [W:0] [0x00]
//!  RID    VER    CMD
//! ```
//!
//! Each lamp contributes a 4-bit code: its pattern (1 = steady, 2 = blink,
//! 3 = flash) when the assigned color lights that lamp, otherwise 0. The
//! first channel named in a byte takes the high nibble.
//!
//! # Example
//!
//! ```
//! use patlite_core::{Color, DeviceState, LedState, Pattern, StateUpdate};
//! use patlite_protocol::codec::{decode, encode};
//!
//! let state = DeviceState::default()
//!     .apply(&StateUpdate::light(LedState::new(Color::Red, Pattern::On)));
//! let packet = encode(&state);
//!
//! assert_eq!(packet.as_bytes(), &[0x00, 0x00, 0x00, 0x00, 0x00, 0x10, 0x00, 0x00, 0x00]);
//! assert_eq!(decode(packet.as_bytes()).unwrap(), state.normalized());
//! ```

use std::fmt;

use patlite_core::{
    BuzzerMode, BuzzerSound, Channel, DeviceState, Error, LedState, Pattern, Result,
    constants::{
        COMMAND_ID, OFFSET_BUZZER_MODE, OFFSET_BUZZER_SOUND, OFFSET_COMMAND,
        OFFSET_LED_GREEN_BLUE, OFFSET_LED_RED_YELLOW, OFFSET_LED_WHITE, OFFSET_REPORT_ID,
        OFFSET_RESERVED, OFFSET_VERSION, PACKET_LEN, PROTOCOL_VERSION, REPORT_ID,
    },
};

/// Lamp byte layout: (offset, high-nibble channel, low-nibble channel).
const LAMP_BYTES: [(usize, Channel, Option<Channel>); 3] = [
    (OFFSET_LED_RED_YELLOW, Channel::Red, Some(Channel::Yellow)),
    (OFFSET_LED_GREEN_BLUE, Channel::Green, Some(Channel::Blue)),
    (OFFSET_LED_WHITE, Channel::White, None),
];

/// Encoded command, ready for a single HID write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandPacket([u8; PACKET_LEN]);

impl CommandPacket {
    /// Full report including the leading report id.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; PACKET_LEN] {
        &self.0
    }

    /// Command body without the report id (indices 1..=8).
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.0[OFFSET_VERSION..]
    }
}

impl From<&DeviceState> for CommandPacket {
    fn from(state: &DeviceState) -> Self {
        encode(state)
    }
}

impl fmt::Display for CommandPacket {
    /// Space separated hex dump, for logs.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, byte) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{byte:02X}")?;
        }
        Ok(())
    }
}

/// 4-bit wire code of one lamp.
fn lamp_code(led: LedState, channel: Channel) -> u8 {
    if led.is_lit(channel) {
        led.pattern.as_u8()
    } else {
        0
    }
}

/// Encode a state snapshot. Total and deterministic.
#[must_use]
pub fn encode(state: &DeviceState) -> CommandPacket {
    let mut bytes = [0u8; PACKET_LEN];
    bytes[OFFSET_REPORT_ID] = REPORT_ID;
    bytes[OFFSET_VERSION] = PROTOCOL_VERSION;
    bytes[OFFSET_COMMAND] = COMMAND_ID;
    bytes[OFFSET_BUZZER_MODE] = state.buzzer_mode().as_u8();
    bytes[OFFSET_BUZZER_SOUND] = state.buzzer_sound().as_u8();

    for (offset, high, low) in LAMP_BYTES {
        let high_code = lamp_code(state.led(high), high);
        let low_code = low.map_or(0, |channel| lamp_code(state.led(channel), channel));
        bytes[offset] = (high_code << 4) | low_code;
    }

    CommandPacket(bytes)
}

fn decode_lamp(code: u8, channel: Channel) -> Result<LedState> {
    let pattern = Pattern::from_u8(code).map_err(|_| {
        Error::invalid_parameter(format!("invalid lamp code {code:#x} for {channel}"))
    })?;
    Ok(if pattern == Pattern::Off {
        LedState::OFF
    } else {
        LedState::new(channel.native_color(), pattern)
    })
}

fn expect_byte(bytes: &[u8], offset: usize, expected: u8, what: &str) -> Result<()> {
    if bytes[offset] != expected {
        return Err(Error::invalid_parameter(format!(
            "{what} byte must be {expected:#04x}, got {:#04x}",
            bytes[offset]
        )));
    }
    Ok(())
}

/// Decode a full 9-byte packet into the state the tower will show.
///
/// The result is always normalized: lit lamps carry their native color.
///
/// # Errors
///
/// Returns `Error::InvalidParameter` if:
/// - the slice is not exactly 9 bytes
/// - a fixed byte (report id, version, command, reserved) is not zero
/// - the buzzer fields are out of range
/// - a lamp code is above 3 or the unused white nibble is set
pub fn decode(bytes: &[u8]) -> Result<DeviceState> {
    if bytes.len() != PACKET_LEN {
        return Err(Error::invalid_parameter(format!(
            "packet must be {PACKET_LEN} bytes, got {}",
            bytes.len()
        )));
    }

    expect_byte(bytes, OFFSET_REPORT_ID, REPORT_ID, "report id")?;
    expect_byte(bytes, OFFSET_VERSION, PROTOCOL_VERSION, "version")?;
    expect_byte(bytes, OFFSET_COMMAND, COMMAND_ID, "command")?;
    expect_byte(bytes, OFFSET_RESERVED, 0, "reserved")?;

    let mode = BuzzerMode::new(bytes[OFFSET_BUZZER_MODE])?;
    let sound = BuzzerSound::new(bytes[OFFSET_BUZZER_SOUND])?;
    let mut state = DeviceState::default().with_buzzer(sound, mode);

    for (offset, high, low) in LAMP_BYTES {
        let byte = bytes[offset];
        state = state.with_led(high, decode_lamp(byte >> 4, high)?);
        match low {
            Some(channel) => state = state.with_led(channel, decode_lamp(byte & 0x0f, channel)?),
            None if byte & 0x0f != 0 => {
                return Err(Error::invalid_parameter(format!(
                    "unused low nibble set in lamp byte {offset}: {byte:#04x}"
                )));
            }
            None => {}
        }
    }

    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use patlite_core::{BuzzerUpdate, Color, LedUpdate, StateUpdate};
    use rstest::rstest;

    fn light(color: Color, pattern: Pattern) -> DeviceState {
        DeviceState::default().apply(&StateUpdate::light(LedState::new(color, pattern)))
    }

    #[test]
    fn test_encode_all_off() {
        let packet = encode(&DeviceState::default());
        assert_eq!(packet.as_bytes(), &[0u8; PACKET_LEN]);
        assert_eq!(packet.payload().len(), PACKET_LEN - 1);
    }

    /// Reference packets produced by the previous implementation for a steady light.
    #[rstest]
    #[case(Color::Red, [0x10, 0x00, 0x00])]
    #[case(Color::Yellow, [0x01, 0x00, 0x00])]
    #[case(Color::Green, [0x00, 0x10, 0x00])]
    #[case(Color::Blue, [0x00, 0x01, 0x00])]
    #[case(Color::Purple, [0x10, 0x01, 0x00])]
    #[case(Color::Cyan, [0x00, 0x11, 0x00])]
    #[case(Color::White, [0x00, 0x00, 0x10])]
    #[case(Color::Off, [0x00, 0x00, 0x00])]
    fn test_encode_reference_colors(#[case] color: Color, #[case] lamps: [u8; 3]) {
        let packet = encode(&light(color, Pattern::On));
        assert_eq!(&packet.as_bytes()[5..8], &lamps);
    }

    #[rstest]
    #[case(Pattern::Off, 0x00)]
    #[case(Pattern::On, 0x10)]
    #[case(Pattern::Blink, 0x20)]
    #[case(Pattern::Flash, 0x30)]
    fn test_encode_pattern_nibble(#[case] pattern: Pattern, #[case] expected: u8) {
        let packet = encode(&light(Color::Red, pattern));
        assert_eq!(packet.as_bytes()[OFFSET_LED_RED_YELLOW], expected);
    }

    #[test]
    fn test_encode_buzzer_bytes() {
        let state = DeviceState::default()
            .apply(&StateUpdate::buzzer(BuzzerUpdate::from_raw(6, 3).unwrap()));
        let packet = encode(&state);
        assert_eq!(packet.as_bytes()[OFFSET_BUZZER_MODE], 3);
        assert_eq!(packet.as_bytes()[OFFSET_BUZZER_SOUND], 6);
    }

    #[test]
    fn test_encode_mixed_channels() {
        let update = LedUpdate::native(&[Channel::Yellow, Channel::Green], Pattern::Flash).unwrap();
        let state = DeviceState::default()
            .apply(&StateUpdate::leds(update))
            .with_led(Channel::White, LedState::new(Color::White, Pattern::Blink));
        let packet = encode(&state);
        assert_eq!(&packet.as_bytes()[5..8], &[0x03, 0x30, 0x20]);
    }

    #[test]
    fn test_wrong_color_on_channel_is_dark() {
        let state = DeviceState::default()
            .with_led(Channel::Yellow, LedState::new(Color::Red, Pattern::On));
        assert_eq!(encode(&state).as_bytes()[OFFSET_LED_RED_YELLOW], 0x00);
    }

    #[test]
    fn test_display_hex() {
        let packet = encode(&light(Color::White, Pattern::Flash));
        assert_eq!(packet.to_string(), "00 00 00 00 00 00 00 30 00");
    }

    #[test]
    fn test_decode_reference_packet() {
        let state = decode(&[0x00, 0x00, 0x00, 0x03, 0x06, 0x12, 0x00, 0x10, 0x00]).unwrap();
        assert_eq!(state.buzzer_mode().as_u8(), 3);
        assert_eq!(state.buzzer_sound(), BuzzerSound::D7);
        assert_eq!(state.led(Channel::Red), LedState::new(Color::Red, Pattern::On));
        assert_eq!(state.led(Channel::Yellow), LedState::new(Color::Yellow, Pattern::Blink));
        assert_eq!(state.led(Channel::Green), LedState::OFF);
        assert_eq!(state.led(Channel::White), LedState::new(Color::White, Pattern::On));
    }

    #[rstest]
    #[case(&[0u8; 8])]
    #[case(&[0u8; 10])]
    #[case(&[0x01, 0, 0, 0, 0, 0, 0, 0, 0])]
    #[case(&[0, 0x01, 0, 0, 0, 0, 0, 0, 0])]
    #[case(&[0, 0, 0x01, 0, 0, 0, 0, 0, 0])]
    #[case(&[0, 0, 0, 0x10, 0, 0, 0, 0, 0])]
    #[case(&[0, 0, 0, 0, 0x0f, 0, 0, 0, 0])]
    #[case(&[0, 0, 0, 0, 0, 0x40, 0, 0, 0])]
    #[case(&[0, 0, 0, 0, 0, 0, 0, 0x01, 0])]
    #[case(&[0, 0, 0, 0, 0, 0, 0, 0, 0x01])]
    fn test_decode_rejects_malformed(#[case] bytes: &[u8]) {
        assert!(decode(bytes).unwrap_err().is_invalid_parameter());
    }
}
