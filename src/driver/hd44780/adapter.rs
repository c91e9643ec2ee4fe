pub mod adafruit_lcd_backpack;
pub mod generic_pcf8574t;
pub mod mcp23008;
pub mod pcf8574;

use embedded_hal::delay::DelayNs;

use crate::{driver::Connection, CharacterDisplayError, ConfigError};

/// Settle time after power-on before the controller accepts the first nibble.
const POWER_ON_DELAY_MS: u32 = 20;
/// Gap after the first 8-bit function set nibble of the reset sequence.
const FIRST_RESET_DELAY_MS: u32 = 4;
/// Gap after the second 8-bit function set nibble of the reset sequence.
const SECOND_RESET_DELAY_US: u32 = 100;
/// Enable pulse width. The controller needs at least 450ns.
const ENABLE_PULSE_US: u32 = 1;
/// Execution time of every instruction except clear and return home.
const EXECUTION_TIME_US: u32 = 50;

/// Direction of a GPIO expander pin.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinDirection {
    Input,
    Output,
}

/// Trait for an 8-bit GPIO expander. Pins are addressed with a bit mask, bit `n` being pin `n`.
/// The outputs can only be written as a whole register.
pub trait GpioExpander {
    type Error;

    /// Enables or disables the pull-up resistors of the pins in `pins`.
    fn set_pull_ups(&mut self, pins: u8, enabled: bool) -> Result<(), Self::Error>;

    /// Sets the direction of the pins in `pins`.
    fn set_direction(&mut self, pins: u8, direction: PinDirection) -> Result<(), Self::Error>;

    /// Writes the full output register.
    fn set_all_outputs(&mut self, value: u8) -> Result<(), Self::Error>;
}

/// Which expander pins are wired to the display. The four data pins are consecutive,
/// `first_data` connects to DB4 and `first_data + 3` to DB7.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinAssignment {
    register_select: u8,
    enable: u8,
    backlight: u8,
    first_data: u8,
}

impl PinAssignment {
    /// Validates and creates a pin assignment. Every pin must exist on the 8-bit register and
    /// no two roles may share a pin.
    pub const fn new(
        register_select: u8,
        enable: u8,
        backlight: u8,
        first_data: u8,
    ) -> Result<Self, ConfigError> {
        if register_select > 7 || enable > 7 || backlight > 7 || first_data > 4 {
            return Err(ConfigError::PinOutOfRange);
        }
        let pins = Self {
            register_select,
            enable,
            backlight,
            first_data,
        };
        let rs = pins.register_select_mask();
        let en = pins.enable_mask();
        let light = pins.backlight_mask();
        if rs & en != 0 || (rs | en) & light != 0 || (rs | en | light) & pins.data_mask() != 0 {
            return Err(ConfigError::PinConflict);
        }
        Ok(pins)
    }

    pub const fn register_select(&self) -> u8 {
        self.register_select
    }

    pub const fn enable(&self) -> u8 {
        self.enable
    }

    pub const fn backlight(&self) -> u8 {
        self.backlight
    }

    pub const fn first_data(&self) -> u8 {
        self.first_data
    }

    pub const fn register_select_mask(&self) -> u8 {
        1 << self.register_select
    }

    pub const fn enable_mask(&self) -> u8 {
        1 << self.enable
    }

    pub const fn backlight_mask(&self) -> u8 {
        1 << self.backlight
    }

    pub const fn data_mask(&self) -> u8 {
        0b1111 << self.first_data
    }

    /// All pins driven by the connection.
    pub const fn used_mask(&self) -> u8 {
        self.register_select_mask() | self.enable_mask() | self.backlight_mask() | self.data_mask()
    }
}

/// Connection to a HD44780 controller in 4-bit mode through the pins of a GPIO expander.
///
/// The expander can only write its whole output register, so the connection keeps an image of
/// the last written value and derives each write from it. Register select and backlight survive
/// the enable pulses and nibble changes this way. Pins not in the `PinAssignment` stay low.
pub struct NibbleConnection<EXP, DELAY>
where
    EXP: GpioExpander,
    DELAY: DelayNs,
{
    expander: EXP,
    delay: DELAY,
    pins: PinAssignment,
    output: u8,
    register_select_mask: u8,
    enable_mask: u8,
    backlight_mask: u8,
    data_mask: u8,
}

impl<EXP, DELAY> NibbleConnection<EXP, DELAY>
where
    EXP: GpioExpander,
    DELAY: DelayNs,
{
    pub fn new(expander: EXP, pins: PinAssignment, delay: DELAY) -> Self {
        Self {
            expander,
            delay,
            pins,
            output: 0,
            register_select_mask: pins.register_select_mask(),
            enable_mask: pins.enable_mask(),
            backlight_mask: pins.backlight_mask(),
            data_mask: pins.data_mask(),
        }
    }

    pub fn pins(&self) -> PinAssignment {
        self.pins
    }

    /// The value last written to the expander output register.
    pub fn output(&self) -> u8 {
        self.output
    }

    /// returns the expander. mostly used for testing
    pub fn expander(&mut self) -> &mut EXP {
        &mut self.expander
    }

    pub fn release(self) -> (EXP, DELAY) {
        (self.expander, self.delay)
    }

    fn write_output(&mut self) -> Result<(), CharacterDisplayError<EXP::Error>> {
        self.expander.set_all_outputs(self.output).map_err(|e| {
            #[cfg(feature = "defmt")]
            defmt::warn!("GPIO expander write of {=u8:#b} failed", self.output);
            CharacterDisplayError::ExpanderError(e)
        })
    }

    /// Presents the low nibble of `value` on the data pins and latches it with an enable pulse.
    /// Only the enable and data bits of the output image change.
    fn send_bits(&mut self, value: u8) -> Result<(), CharacterDisplayError<EXP::Error>> {
        let data = ((value & 0x0F) << self.pins.first_data) & self.data_mask;
        self.output = ((self.output | self.enable_mask) & !self.data_mask) | data;
        self.write_output()?;
        self.delay.delay_us(ENABLE_PULSE_US);
        self.output &= !self.enable_mask;
        self.write_output()?;
        self.delay.delay_us(EXECUTION_TIME_US);
        Ok(())
    }

    /// writes a full byte, high nibble first. If `rs_setting` is `true`, the byte goes to the
    /// data register, otherwise to the instruction register.
    fn send_byte(
        &mut self,
        rs_setting: bool,
        value: u8,
    ) -> Result<(), CharacterDisplayError<EXP::Error>> {
        if rs_setting {
            self.output |= self.register_select_mask;
        } else {
            self.output &= !self.register_select_mask;
        }
        self.send_bits(value >> 4)?;
        self.send_bits(value & 0x0F)
    }
}

impl<EXP, DELAY> Connection for NibbleConnection<EXP, DELAY>
where
    EXP: GpioExpander,
    DELAY: DelayNs,
{
    type Error = EXP::Error;
    type Delay = DELAY;

    fn init(&mut self) -> Result<(), CharacterDisplayError<EXP::Error>> {
        #[cfg(feature = "defmt")]
        defmt::debug!("Initializing 4-bit connection on pins {}", self.pins);
        let used = self.pins.used_mask();
        self.expander
            .set_pull_ups(used, false)
            .map_err(CharacterDisplayError::ExpanderError)?;
        self.expander
            .set_direction(used, PinDirection::Output)
            .map_err(CharacterDisplayError::ExpanderError)?;

        // start with all lines low and wait for the internal reset
        self.output = 0;
        self.write_output()?;
        self.delay.delay_ms(POWER_ON_DELAY_MS);

        // the controller may be in 8-bit mode or halfway through a 4-bit transfer. three
        // 8-bit function sets put it into 8-bit mode from any of these states.
        self.send_bits(0b0011)?;
        self.delay.delay_ms(FIRST_RESET_DELAY_MS);
        self.send_bits(0b0011)?;
        self.delay.delay_us(SECOND_RESET_DELAY_US);
        self.send_bits(0b0011)?;
        // now switch to 4-bit mode
        self.send_bits(0b0010)
    }

    fn send_command(&mut self, command: u8) -> Result<(), CharacterDisplayError<EXP::Error>> {
        self.send_byte(false, command)
    }

    fn send_data(&mut self, data: u8) -> Result<(), CharacterDisplayError<EXP::Error>> {
        self.send_byte(true, data)
    }

    fn set_backlight(&mut self, on: bool) -> Result<(), CharacterDisplayError<EXP::Error>> {
        if on {
            self.output |= self.backlight_mask;
        } else {
            self.output &= !self.backlight_mask;
        }
        self.write_output()
    }

    fn delay(&mut self) -> &mut DELAY {
        &mut self.delay
    }
}
