//! Desired device state and partial-update merging.
//!
//! [`DeviceState`] is a plain value: the complete picture of what the tower
//! should display and sound. Requests are expressed as a [`StateUpdate`]
//! whose constructors do all validation, so [`DeviceState::apply`] is a pure
//! total function. Fields a request does not mention are carried over
//! unchanged.
//!
//! ```
//! use patlite_core::{Channel, Color, DeviceState, LedState, LedUpdate, Pattern, StateUpdate};
//!
//! let red = LedUpdate::uniform(&[Channel::Red], LedState::new(Color::Red, Pattern::On)).unwrap();
//! let green = LedUpdate::uniform(&[Channel::Green], LedState::new(Color::Green, Pattern::Blink)).unwrap();
//!
//! let state = DeviceState::default()
//!     .apply(&StateUpdate::leds(red))
//!     .apply(&StateUpdate::leds(green));
//!
//! assert_eq!(state.led(Channel::Red), LedState::new(Color::Red, Pattern::On));
//! assert_eq!(state.led(Channel::Green), LedState::new(Color::Green, Pattern::Blink));
//! assert_eq!(state.led(Channel::Yellow), LedState::OFF);
//! ```

use crate::{
    Result,
    constants::CHANNEL_COUNT,
    error::Error,
    types::{BuzzerMode, BuzzerSound, Channel, LedState, Pattern},
};

/// Complete desired state of the tower.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeviceState {
    buzzer_mode: BuzzerMode,
    buzzer_sound: BuzzerSound,
    leds: [LedState; CHANNEL_COUNT],
}

impl DeviceState {
    #[must_use]
    pub fn buzzer_mode(&self) -> BuzzerMode {
        self.buzzer_mode
    }

    #[must_use]
    pub fn buzzer_sound(&self) -> BuzzerSound {
        self.buzzer_sound
    }

    #[must_use]
    pub fn led(&self, channel: Channel) -> LedState {
        self.leds[channel.index()]
    }

    /// Iterate over every channel with its state, in [`Channel::ALL`] order.
    pub fn leds(&self) -> impl Iterator<Item = (Channel, LedState)> + '_ {
        Channel::ALL.into_iter().map(|channel| (channel, self.led(channel)))
    }

    /// Copy of this state with one channel replaced.
    #[must_use]
    pub fn with_led(mut self, channel: Channel, led: LedState) -> Self {
        self.leds[channel.index()] = led;
        self
    }

    /// Copy of this state with the buzzer replaced.
    #[must_use]
    pub fn with_buzzer(mut self, sound: BuzzerSound, mode: BuzzerMode) -> Self {
        self.buzzer_sound = sound;
        self.buzzer_mode = mode;
        self
    }

    /// Merge an update into a copy of this state.
    ///
    /// Channels the update does not name keep their value; a buzzer update
    /// without a sound keeps the current sound but always replaces the mode.
    #[must_use]
    pub fn apply(&self, update: &StateUpdate) -> Self {
        let mut next = *self;

        if let Some(leds) = &update.leds {
            for &(channel, led) in leds.assignments() {
                next.leds[channel.index()] = led;
            }
        }

        if let Some(buzzer) = update.buzzer {
            if let Some(sound) = buzzer.sound {
                next.buzzer_sound = sound;
            }
            next.buzzer_mode = buzzer.mode;
        }

        next
    }

    /// What the tower physically shows for this state.
    ///
    /// Lit channels become `(native color, pattern)`, dark channels become
    /// [`LedState::OFF`]. Two states with the same normalized form produce
    /// identical command packets.
    #[must_use]
    pub fn normalized(&self) -> Self {
        let mut next = *self;
        for channel in Channel::ALL {
            let led = self.led(channel);
            next.leds[channel.index()] = if led.is_lit(channel) {
                LedState::new(channel.native_color(), led.pattern)
            } else {
                LedState::OFF
            };
        }
        next
    }

    /// True when no lamp is lit and the buzzer is silent.
    #[must_use]
    pub fn is_all_off(&self) -> bool {
        self.buzzer_sound == BuzzerSound::OFF
            && self.leds().all(|(channel, led)| !led.is_lit(channel))
    }
}

/// Per-channel assignments of a single request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedUpdate {
    assignments: Vec<(Channel, LedState)>,
}

impl LedUpdate {
    /// Set every named channel to the same color and pattern.
    ///
    /// # Errors
    /// Returns `Error::InvalidParameter` if `channels` is empty.
    pub fn uniform(channels: &[Channel], led: LedState) -> Result<Self> {
        Self::ensure_not_empty(channels)?;
        Ok(Self {
            assignments: channels.iter().map(|&channel| (channel, led)).collect(),
        })
    }

    /// Light every named channel in its own lamp color.
    ///
    /// # Errors
    /// Returns `Error::InvalidParameter` if `channels` is empty.
    pub fn native(channels: &[Channel], pattern: Pattern) -> Result<Self> {
        Self::ensure_not_empty(channels)?;
        Ok(Self {
            assignments: channels
                .iter()
                .map(|&channel| (channel, LedState::new(channel.native_color(), pattern)))
                .collect(),
        })
    }

    /// Set all five channels to the same color and pattern.
    #[must_use]
    pub fn whole_tower(led: LedState) -> Self {
        Self {
            assignments: Channel::ALL.into_iter().map(|channel| (channel, led)).collect(),
        }
    }

    #[must_use]
    pub fn assignments(&self) -> &[(Channel, LedState)] {
        &self.assignments
    }

    fn ensure_not_empty(channels: &[Channel]) -> Result<()> {
        if channels.is_empty() {
            return Err(Error::invalid_parameter(
                "at least one LED channel is required",
            ));
        }
        Ok(())
    }
}

/// Buzzer half of a request. `sound: None` keeps the current sound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuzzerUpdate {
    pub sound: Option<BuzzerSound>,
    pub mode: BuzzerMode,
}

impl BuzzerUpdate {
    #[must_use]
    pub fn new(sound: Option<BuzzerSound>, mode: BuzzerMode) -> Self {
        Self { sound, mode }
    }

    /// Build from raw request values, honoring the legacy sound value 15.
    ///
    /// # Errors
    /// Returns `Error::InvalidParameter` if sound > 15 or mode > 15.
    pub fn from_raw(sound: u8, mode: u8) -> Result<Self> {
        Ok(Self::new(
            BuzzerSound::from_request(sound)?,
            BuzzerMode::new(mode)?,
        ))
    }

    /// Silence the buzzer.
    #[must_use]
    pub fn stop() -> Self {
        Self::new(Some(BuzzerSound::OFF), BuzzerMode::CONTINUOUS)
    }
}

/// A validated partial update, applied atomically.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StateUpdate {
    pub leds: Option<LedUpdate>,
    pub buzzer: Option<BuzzerUpdate>,
}

impl StateUpdate {
    /// Whole tower to one color and pattern.
    #[must_use]
    pub fn light(led: LedState) -> Self {
        Self::leds(LedUpdate::whole_tower(led))
    }

    #[must_use]
    pub fn leds(leds: LedUpdate) -> Self {
        Self {
            leds: Some(leds),
            buzzer: None,
        }
    }

    #[must_use]
    pub fn buzzer(buzzer: BuzzerUpdate) -> Self {
        Self {
            leds: None,
            buzzer: Some(buzzer),
        }
    }

    #[must_use]
    pub fn stop_buzzer() -> Self {
        Self::buzzer(BuzzerUpdate::stop())
    }

    /// Lamps and buzzer together.
    ///
    /// # Errors
    /// Returns `Error::InvalidParameter` if neither half is present.
    pub fn all(leds: Option<LedUpdate>, buzzer: Option<BuzzerUpdate>) -> Result<Self> {
        if leds.is_none() && buzzer.is_none() {
            return Err(Error::invalid_parameter(
                "update must contain an LED block, a buzzer block, or both",
            ));
        }
        Ok(Self { leds, buzzer })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Color;

    fn led(color: Color, pattern: Pattern) -> LedState {
        LedState::new(color, pattern)
    }

    #[test]
    fn test_default_is_all_off() {
        let state = DeviceState::default();
        assert!(state.is_all_off());
        assert_eq!(state.buzzer_mode(), BuzzerMode::CONTINUOUS);
        assert!(state.leds().all(|(_, l)| l == LedState::OFF));
    }

    #[test]
    fn test_light_sets_every_channel() {
        let target = led(Color::Purple, Pattern::Flash);
        let state = DeviceState::default().apply(&StateUpdate::light(target));
        for (_, l) in state.leds() {
            assert_eq!(l, target);
        }
    }

    #[test]
    fn test_partial_leds_do_not_clobber() {
        let red = LedUpdate::uniform(&[Channel::Red], led(Color::Red, Pattern::On)).unwrap();
        let green =
            LedUpdate::uniform(&[Channel::Green], led(Color::Green, Pattern::Blink)).unwrap();

        let state = DeviceState::default()
            .apply(&StateUpdate::leds(red))
            .apply(&StateUpdate::leds(green));

        assert_eq!(state.led(Channel::Red), led(Color::Red, Pattern::On));
        assert_eq!(state.led(Channel::Yellow), LedState::OFF);
        assert_eq!(state.led(Channel::Green), led(Color::Green, Pattern::Blink));
        assert_eq!(state.led(Channel::Blue), LedState::OFF);
        assert_eq!(state.led(Channel::White), LedState::OFF);
    }

    #[test]
    fn test_led_update_keeps_buzzer() {
        let state = DeviceState::default()
            .apply(&StateUpdate::buzzer(BuzzerUpdate::from_raw(6, 1).unwrap()))
            .apply(&StateUpdate::light(led(Color::Red, Pattern::On)));
        assert_eq!(state.buzzer_sound(), BuzzerSound::D7);
        assert_eq!(state.buzzer_mode().as_u8(), 1);
    }

    #[test]
    fn test_buzzer_keep_sound() {
        let state = DeviceState::default()
            .apply(&StateUpdate::buzzer(BuzzerUpdate::from_raw(6, 1).unwrap()))
            .apply(&StateUpdate::buzzer(BuzzerUpdate::from_raw(15, 3).unwrap()));
        assert_eq!(state.buzzer_sound(), BuzzerSound::D7);
        assert_eq!(state.buzzer_mode().as_u8(), 3);
    }

    #[test]
    fn test_stop_buzzer() {
        let state = DeviceState::default()
            .apply(&StateUpdate::buzzer(BuzzerUpdate::from_raw(14, 0).unwrap()))
            .apply(&StateUpdate::stop_buzzer());
        assert_eq!(state.buzzer_sound(), BuzzerSound::OFF);
        assert_eq!(state.buzzer_mode(), BuzzerMode::CONTINUOUS);
    }

    #[test]
    fn test_native_update() {
        let update = LedUpdate::native(&[Channel::Yellow, Channel::White], Pattern::On).unwrap();
        let state = DeviceState::default().apply(&StateUpdate::leds(update));
        assert_eq!(state.led(Channel::Yellow), led(Color::Yellow, Pattern::On));
        assert_eq!(state.led(Channel::White), led(Color::White, Pattern::On));
        assert_eq!(state.led(Channel::Red), LedState::OFF);
    }

    #[test]
    fn test_empty_channel_set_rejected() {
        assert!(LedUpdate::uniform(&[], LedState::OFF).unwrap_err().is_invalid_parameter());
        assert!(LedUpdate::native(&[], Pattern::On).is_err());
    }

    #[test]
    fn test_all_requires_some_block() {
        assert!(StateUpdate::all(None, None).is_err());

        let update = StateUpdate::all(
            Some(LedUpdate::whole_tower(led(Color::Cyan, Pattern::On))),
            Some(BuzzerUpdate::from_raw(2, 5).unwrap()),
        )
        .unwrap();
        let state = DeviceState::default().apply(&update);
        assert_eq!(state.led(Channel::Blue), led(Color::Cyan, Pattern::On));
        assert_eq!(state.buzzer_sound(), BuzzerSound::B_FLAT6);
        assert_eq!(state.buzzer_mode().as_u8(), 5);
    }

    #[test]
    fn test_normalized() {
        let state =
            DeviceState::default().apply(&StateUpdate::light(led(Color::Purple, Pattern::Blink)));
        let normalized = state.normalized();

        assert_eq!(normalized.led(Channel::Red), led(Color::Red, Pattern::Blink));
        assert_eq!(normalized.led(Channel::Blue), led(Color::Blue, Pattern::Blink));
        assert_eq!(normalized.led(Channel::Yellow), LedState::OFF);
        assert_eq!(normalized.led(Channel::Green), LedState::OFF);
        assert_eq!(normalized.led(Channel::White), LedState::OFF);
        assert_eq!(normalized.normalized(), normalized);
    }

    #[test]
    fn test_color_without_pattern_is_dark() {
        let state =
            DeviceState::default().apply(&StateUpdate::light(led(Color::Red, Pattern::Off)));
        assert!(state.is_all_off());
        assert_eq!(state.normalized(), DeviceState::default());
    }
}
