use embedded_hal::i2c;

use super::{GpioExpander, PinDirection};

// MCP23008 registers
const MCP23008_IODIR: u8 = 0x00; //  Pin direction, 1 = input
const MCP23008_GPPU: u8 = 0x06; //  Pull-up resistors, 1 = enabled
const MCP23008_OLAT: u8 = 0x0A; //  Output latch

// register values after power-on reset
const IODIR_RESET: u8 = 0xFF;
const GPPU_RESET: u8 = 0x00;

/// MCP23008 8-bit I2C GPIO expander.
///
/// The chip cannot change single pins, so the driver keeps images of the direction and pull-up
/// registers, starting from their power-on values, and writes the whole register on each change.
/// An image is only updated after the write succeeded. Outputs go straight to the output latch.
pub struct Mcp23008<I2C>
where
    I2C: i2c::I2c,
{
    i2c: I2C,
    address: u8,
    iodir: u8,
    gppu: u8,
}

impl<I2C> Mcp23008<I2C>
where
    I2C: i2c::I2c,
{
    pub fn new(i2c: I2C, address: u8) -> Self {
        Self {
            i2c,
            address,
            iodir: IODIR_RESET,
            gppu: GPPU_RESET,
        }
    }

    /// returns the default I2C address with all address pins low
    pub fn default_i2c_address() -> u8 {
        0x20
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

    fn write_register(&mut self, register: u8, value: u8) -> Result<(), I2C::Error> {
        self.i2c.write(self.address, &[register, value])
    }
}

impl<I2C> GpioExpander for Mcp23008<I2C>
where
    I2C: i2c::I2c,
{
    type Error = I2C::Error;

    fn set_pull_ups(&mut self, pins: u8, enabled: bool) -> Result<(), I2C::Error> {
        let gppu = if enabled {
            self.gppu | pins
        } else {
            self.gppu & !pins
        };
        self.write_register(MCP23008_GPPU, gppu)?;
        self.gppu = gppu;
        Ok(())
    }

    fn set_direction(&mut self, pins: u8, direction: PinDirection) -> Result<(), I2C::Error> {
        let iodir = match direction {
            PinDirection::Input => self.iodir | pins,
            PinDirection::Output => self.iodir & !pins,
        };
        self.write_register(MCP23008_IODIR, iodir)?;
        self.iodir = iodir;
        Ok(())
    }

    fn set_all_outputs(&mut self, value: u8) -> Result<(), I2C::Error> {
        self.write_register(MCP23008_OLAT, value)
    }
}

#[cfg(test)]
mod tests {
    extern crate std;
    use super::*;
    use embedded_hal::i2c::ErrorKind;
    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTransaction};

    #[test]
    fn test_mcp23008_direction_and_pull_ups() {
        let i2c_address = 0x20_u8;
        let expected_i2c_transactions = std::vec![
            // outputs on the upper nibble, the rest stay inputs
            I2cTransaction::write(i2c_address, std::vec![0x00, 0b0000_1111]),
            // two more outputs
            I2cTransaction::write(i2c_address, std::vec![0x00, 0b0000_1100]),
            // back to input
            I2cTransaction::write(i2c_address, std::vec![0x00, 0b1000_1100]),
            I2cTransaction::write(i2c_address, std::vec![0x06, 0b0000_0011]),
            I2cTransaction::write(i2c_address, std::vec![0x06, 0b0000_0010]),
        ];
        let i2c = I2cMock::new(&expected_i2c_transactions);
        let mut expander = Mcp23008::new(i2c, i2c_address);

        assert!(expander.set_direction(0b1111_0000, PinDirection::Output).is_ok());
        assert!(expander.set_direction(0b0000_0011, PinDirection::Output).is_ok());
        assert!(expander.set_direction(0b1000_0000, PinDirection::Input).is_ok());
        assert!(expander.set_pull_ups(0b0000_0011, true).is_ok());
        assert!(expander.set_pull_ups(0b0000_0001, false).is_ok());

        // finish the i2c mock
        expander.i2c().done();
    }

    #[test]
    fn test_mcp23008_outputs_write_latch() {
        let i2c_address = 0x21_u8;
        let expected_i2c_transactions = std::vec![
            I2cTransaction::write(i2c_address, std::vec![0x0A, 0b1010_0101]),
            I2cTransaction::write(i2c_address, std::vec![0x0A, 0b0000_0000]),
        ];
        let i2c = I2cMock::new(&expected_i2c_transactions);
        let mut expander = Mcp23008::new(i2c, i2c_address);

        assert!(expander.set_all_outputs(0b1010_0101).is_ok());
        assert!(expander.set_all_outputs(0).is_ok());
        assert_eq!(expander.i2c_address(), 0x21);

        // finish the i2c mock
        expander.i2c().done();
    }

    #[test]
    fn test_mcp23008_failed_write_keeps_register_image() {
        let i2c_address = 0x20_u8;
        let expected_i2c_transactions = std::vec![
            I2cTransaction::write(i2c_address, std::vec![0x00, 0b0000_1111])
                .with_error(ErrorKind::Other),
            // the retry starts again from the power-on value
            I2cTransaction::write(i2c_address, std::vec![0x00, 0b0111_1111]),
        ];
        let i2c = I2cMock::new(&expected_i2c_transactions);
        let mut expander = Mcp23008::new(i2c, i2c_address);

        assert_eq!(
            expander.set_direction(0b1111_0000, PinDirection::Output),
            Err(ErrorKind::Other)
        );
        assert!(expander.set_direction(0b1000_0000, PinDirection::Output).is_ok());

        // finish the i2c mock
        expander.i2c().done();
    }

    #[test]
    fn test_mcp23008_default_address() {
        assert_eq!(Mcp23008::<I2cMock>::default_i2c_address(), 0x20);
    }
}
