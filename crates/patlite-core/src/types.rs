use crate::{
    Result,
    constants::{
        BUZZER_SOUND_KEEP, CHANNEL_COUNT, MAX_BUZZER_MODE, MAX_BUZZER_SOUND, MAX_COLOR,
        MAX_PATTERN,
    },
    error::Error,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lamp color as understood by the tower.
///
/// Mixed colors light more than one lamp: purple drives red and blue,
/// cyan drives green and blue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Color {
    #[default]
    Off,
    Red,
    Green,
    Blue,
    Yellow,
    Purple,
    Cyan,
    White,
}

impl Color {
    /// Create a color from its wire value.
    ///
    /// # Errors
    /// Returns `Error::InvalidParameter` if the value is greater than 7.
    pub fn from_u8(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Self::Off),
            1 => Ok(Self::Red),
            2 => Ok(Self::Green),
            3 => Ok(Self::Blue),
            4 => Ok(Self::Yellow),
            5 => Ok(Self::Purple),
            6 => Ok(Self::Cyan),
            7 => Ok(Self::White),
            _ => Err(Error::invalid_parameter(format!(
                "color must be 0-{MAX_COLOR}, got {value}"
            ))),
        }
    }

    #[must_use]
    pub fn as_u8(self) -> u8 {
        match self {
            Self::Off => 0,
            Self::Red => 1,
            Self::Green => 2,
            Self::Blue => 3,
            Self::Yellow => 4,
            Self::Purple => 5,
            Self::Cyan => 6,
            Self::White => 7,
        }
    }

    /// Whether a lamp set to this color emits light.
    ///
    /// ```
    /// use patlite_core::{Channel, Color};
    ///
    /// assert!(Color::Purple.lights(Channel::Red));
    /// assert!(Color::Purple.lights(Channel::Blue));
    /// assert!(!Color::Purple.lights(Channel::Green));
    /// ```
    #[must_use]
    pub fn lights(self, channel: Channel) -> bool {
        match self {
            Self::Off => false,
            Self::Red => channel == Channel::Red,
            Self::Yellow => channel == Channel::Yellow,
            Self::Green => channel == Channel::Green,
            Self::Blue => channel == Channel::Blue,
            Self::Purple => matches!(channel, Channel::Red | Channel::Blue),
            Self::Cyan => matches!(channel, Channel::Green | Channel::Blue),
            Self::White => channel == Channel::White,
        }
    }
}

impl TryFrom<u8> for Color {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        Self::from_u8(value)
    }
}

/// Lighting behavior of a lamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Pattern {
    #[default]
    Off,
    /// Steady light.
    On,
    Blink,
    Flash,
}

impl Pattern {
    /// Create a pattern from its wire value.
    ///
    /// # Errors
    /// Returns `Error::InvalidParameter` if the value is greater than 3.
    pub fn from_u8(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Self::Off),
            1 => Ok(Self::On),
            2 => Ok(Self::Blink),
            3 => Ok(Self::Flash),
            _ => Err(Error::invalid_parameter(format!(
                "pattern must be 0-{MAX_PATTERN}, got {value}"
            ))),
        }
    }

    #[must_use]
    pub fn as_u8(self) -> u8 {
        match self {
            Self::Off => 0,
            Self::On => 1,
            Self::Blink => 2,
            Self::Flash => 3,
        }
    }
}

impl TryFrom<u8> for Pattern {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        Self::from_u8(value)
    }
}

/// One of the five lamps of the tower.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Channel {
    Red,
    Yellow,
    Green,
    Blue,
    White,
}

impl Channel {
    /// All channels in storage order.
    pub const ALL: [Channel; CHANNEL_COUNT] = [
        Channel::Red,
        Channel::Yellow,
        Channel::Green,
        Channel::Blue,
        Channel::White,
    ];

    /// Position of this channel in [`Channel::ALL`].
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Self::Red => 0,
            Self::Yellow => 1,
            Self::Green => 2,
            Self::Blue => 3,
            Self::White => 4,
        }
    }

    /// Color of the physical lamp behind this channel.
    #[must_use]
    pub fn native_color(self) -> Color {
        match self {
            Self::Red => Color::Red,
            Self::Yellow => Color::Yellow,
            Self::Green => Color::Green,
            Self::Blue => Color::Blue,
            Self::White => Color::White,
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Red => "RED",
            Self::Yellow => "YELLOW",
            Self::Green => "GREEN",
            Self::Blue => "BLUE",
            Self::White => "WHITE",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Channel {
    type Err = Error;

    /// Channel names are matched case-insensitively.
    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim();
        Channel::ALL
            .into_iter()
            .find(|channel| channel.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| Error::invalid_parameter(format!("unknown LED channel: {s}")))
    }
}

/// Color and pattern assigned to one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct LedState {
    pub color: Color,
    pub pattern: Pattern,
}

impl LedState {
    /// Dark lamp.
    pub const OFF: LedState = LedState {
        color: Color::Off,
        pattern: Pattern::Off,
    };

    #[must_use]
    pub const fn new(color: Color, pattern: Pattern) -> Self {
        Self { color, pattern }
    }

    /// Build from raw request values.
    ///
    /// # Errors
    /// Returns `Error::InvalidParameter` if color > 7 or pattern > 3.
    pub fn from_raw(color: u8, pattern: u8) -> Result<Self> {
        Ok(Self::new(Color::from_u8(color)?, Pattern::from_u8(pattern)?))
    }

    /// Whether the lamp behind `channel` emits light in this state.
    #[must_use]
    pub fn is_lit(self, channel: Channel) -> bool {
        self.pattern != Pattern::Off && self.color.lights(channel)
    }
}

/// Buzzer pitch.
///
/// The legacy "keep current" value 15 is not representable here; requests
/// carry it as `None` (see [`BuzzerSound::from_request`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct BuzzerSound(u8);

impl BuzzerSound {
    pub const OFF: BuzzerSound = BuzzerSound(0x00);
    pub const A6: BuzzerSound = BuzzerSound(0x01);
    pub const B_FLAT6: BuzzerSound = BuzzerSound(0x02);
    pub const B6: BuzzerSound = BuzzerSound(0x03);
    pub const C7: BuzzerSound = BuzzerSound(0x04);
    pub const D_FLAT7: BuzzerSound = BuzzerSound(0x05);
    pub const D7: BuzzerSound = BuzzerSound(0x06);
    pub const E_FLAT7: BuzzerSound = BuzzerSound(0x07);
    pub const E7: BuzzerSound = BuzzerSound(0x08);
    pub const F7: BuzzerSound = BuzzerSound(0x09);
    pub const G_FLAT7: BuzzerSound = BuzzerSound(0x0a);
    pub const G7: BuzzerSound = BuzzerSound(0x0b);
    pub const A_FLAT7: BuzzerSound = BuzzerSound(0x0c);
    pub const A7: BuzzerSound = BuzzerSound(0x0d);
    /// Device default pitch (D7, 2349.3 Hz).
    pub const DEFAULT: BuzzerSound = BuzzerSound(0x0e);

    /// Create a buzzer sound with validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidParameter` if the value is outside 0-14.
    pub fn new(value: u8) -> Result<Self> {
        if value > MAX_BUZZER_SOUND {
            return Err(Error::invalid_parameter(format!(
                "buzzer sound must be 0-{MAX_BUZZER_SOUND}, got {value}"
            )));
        }
        Ok(Self(value))
    }

    /// Interpret a raw request value, mapping 15 to "keep current".
    ///
    /// ```
    /// use patlite_core::BuzzerSound;
    ///
    /// assert_eq!(BuzzerSound::from_request(15).unwrap(), None);
    /// assert_eq!(BuzzerSound::from_request(6).unwrap(), Some(BuzzerSound::D7));
    /// assert!(BuzzerSound::from_request(16).is_err());
    /// ```
    ///
    /// # Errors
    /// Returns `Error::InvalidParameter` if the value is greater than 15.
    pub fn from_request(value: u8) -> Result<Option<Self>> {
        if value == BUZZER_SOUND_KEEP {
            return Ok(None);
        }
        Self::new(value).map(Some).map_err(|_| {
            Error::invalid_parameter(format!(
                "buzzer sound must be 0-{BUZZER_SOUND_KEEP}, got {value}"
            ))
        })
    }

    #[must_use]
    pub fn as_u8(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for BuzzerSound {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        Self::new(value)
    }
}

impl From<BuzzerSound> for u8 {
    fn from(sound: BuzzerSound) -> u8 {
        sound.0
    }
}

/// Buzzer repeat mode: 0 sounds continuously, 1-15 is a repeat count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct BuzzerMode(u8);

impl BuzzerMode {
    pub const CONTINUOUS: BuzzerMode = BuzzerMode(0);

    /// Create a buzzer mode with validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidParameter` if the value is outside 0-15.
    pub fn new(value: u8) -> Result<Self> {
        if value > MAX_BUZZER_MODE {
            return Err(Error::invalid_parameter(format!(
                "buzzer mode must be 0-{MAX_BUZZER_MODE}, got {value}"
            )));
        }
        Ok(Self(value))
    }

    /// Number of repetitions, or `None` for continuous sounding.
    #[must_use]
    pub fn repeat_count(self) -> Option<u8> {
        (self.0 != 0).then_some(self.0)
    }

    #[must_use]
    pub fn as_u8(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for BuzzerMode {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        Self::new(value)
    }
}

impl From<BuzzerMode> for u8 {
    fn from(mode: BuzzerMode) -> u8 {
        mode.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("RED", Channel::Red)]
    #[case("yellow", Channel::Yellow)]
    #[case("Green", Channel::Green)]
    #[case(" blue ", Channel::Blue)]
    #[case("WHITE", Channel::White)]
    fn test_channel_parse_valid(#[case] input: &str, #[case] expected: Channel) {
        let channel: Channel = input.parse().unwrap();
        assert_eq!(channel, expected);
    }

    #[rstest]
    #[case("PURPLE")]
    #[case("")]
    #[case("REDD")]
    fn test_channel_parse_invalid(#[case] input: &str) {
        let result: Result<Channel> = input.parse();
        assert!(matches!(result, Err(Error::InvalidParameter(_))));
    }

    #[test]
    fn test_channel_index_matches_all_order() {
        for (i, channel) in Channel::ALL.into_iter().enumerate() {
            assert_eq!(channel.index(), i);
        }
    }

    #[test]
    fn test_color_wire_values() {
        for value in 0..=MAX_COLOR {
            assert_eq!(Color::from_u8(value).unwrap().as_u8(), value);
        }
        assert!(Color::from_u8(8).is_err());
        assert_eq!(Color::try_from(4).unwrap(), Color::Yellow);
    }

    #[test]
    fn test_pattern_wire_values() {
        for value in 0..=MAX_PATTERN {
            assert_eq!(Pattern::from_u8(value).unwrap().as_u8(), value);
        }
        assert!(Pattern::from_u8(4).is_err());
    }

    #[rstest]
    #[case(Color::Red, &[Channel::Red])]
    #[case(Color::Yellow, &[Channel::Yellow])]
    #[case(Color::Green, &[Channel::Green])]
    #[case(Color::Blue, &[Channel::Blue])]
    #[case(Color::Purple, &[Channel::Red, Channel::Blue])]
    #[case(Color::Cyan, &[Channel::Green, Channel::Blue])]
    #[case(Color::White, &[Channel::White])]
    #[case(Color::Off, &[])]
    fn test_color_lights(#[case] color: Color, #[case] lit: &[Channel]) {
        for channel in Channel::ALL {
            assert_eq!(color.lights(channel), lit.contains(&channel), "{channel}");
        }
    }

    #[test]
    fn test_native_color_lights_own_channel() {
        for channel in Channel::ALL {
            assert!(channel.native_color().lights(channel));
        }
    }

    #[test]
    fn test_led_state_is_lit() {
        let steady_red = LedState::new(Color::Red, Pattern::On);
        assert!(steady_red.is_lit(Channel::Red));
        assert!(!steady_red.is_lit(Channel::Yellow));

        let red_off = LedState::new(Color::Red, Pattern::Off);
        assert!(!red_off.is_lit(Channel::Red));
        assert!(!LedState::OFF.is_lit(Channel::White));
    }

    #[test]
    fn test_led_state_from_raw() {
        assert_eq!(
            LedState::from_raw(1, 2).unwrap(),
            LedState::new(Color::Red, Pattern::Blink)
        );
        assert!(LedState::from_raw(8, 0).is_err());
        assert!(LedState::from_raw(0, 4).is_err());
    }

    #[rstest]
    #[case(0, Some(BuzzerSound::OFF))]
    #[case(6, Some(BuzzerSound::D7))]
    #[case(14, Some(BuzzerSound::DEFAULT))]
    #[case(15, None)]
    fn test_buzzer_sound_from_request(#[case] raw: u8, #[case] expected: Option<BuzzerSound>) {
        assert_eq!(BuzzerSound::from_request(raw).unwrap(), expected);
    }

    #[test]
    fn test_buzzer_sound_rejects_sentinel_as_value() {
        assert!(BuzzerSound::new(15).is_err());
        assert!(BuzzerSound::from_request(16).is_err());
    }

    #[test]
    fn test_buzzer_mode_range() {
        assert_eq!(BuzzerMode::new(0).unwrap(), BuzzerMode::CONTINUOUS);
        assert_eq!(BuzzerMode::new(15).unwrap().repeat_count(), Some(15));
        assert_eq!(BuzzerMode::CONTINUOUS.repeat_count(), None);
        assert!(BuzzerMode::new(16).is_err());
    }

    #[test]
    fn test_serialization() {
        let led = LedState::new(Color::Cyan, Pattern::Flash);
        let json = serde_json::to_string(&led).unwrap();
        assert_eq!(json, r#"{"color":"CYAN","pattern":"FLASH"}"#);

        let sound: BuzzerSound = serde_json::from_str("13").unwrap();
        assert_eq!(sound, BuzzerSound::A7);
        assert!(serde_json::from_str::<BuzzerSound>("15").is_err());
    }
}
