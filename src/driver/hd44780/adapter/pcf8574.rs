use embedded_hal::i2c;

use super::{GpioExpander, PinDirection};

/// PCF8574 8-bit I2C GPIO expander.
///
/// The PCF8574 has quasi-bidirectional pins: a pin written low is driven low, a pin written high
/// is pulled up weakly and can be read. There are no direction or pull-up registers, so those
/// requests succeed without bus traffic. The output register is written with a single byte.
pub struct Pcf8574<I2C>
where
    I2C: i2c::I2c,
{
    i2c: I2C,
    address: u8,
}

impl<I2C> Pcf8574<I2C>
where
    I2C: i2c::I2c,
{
    pub fn new(i2c: I2C, address: u8) -> Self {
        Self { i2c, address }
    }

    /// returns the default I2C address of the common LCD adapter boards
    pub fn default_i2c_address() -> u8 {
        0x27
    }

    pub fn i2c_address(&self) -> u8 {
        self.address
    }

    /// returns the i2c object. mostly used for testing
    pub fn i2c(&mut self) -> &mut I2C {
        &mut self.i2c
    }

    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C> GpioExpander for Pcf8574<I2C>
where
    I2C: i2c::I2c,
{
    type Error = I2C::Error;

    fn set_pull_ups(&mut self, _pins: u8, _enabled: bool) -> Result<(), I2C::Error> {
        Ok(())
    }

    fn set_direction(&mut self, _pins: u8, _direction: PinDirection) -> Result<(), I2C::Error> {
        Ok(())
    }

    fn set_all_outputs(&mut self, value: u8) -> Result<(), I2C::Error> {
        self.i2c.write(self.address, &[value])
    }
}
