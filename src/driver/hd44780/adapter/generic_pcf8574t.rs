use embedded_hal::{delay::DelayNs, i2c};

use super::{pcf8574::Pcf8574, NibbleConnection, PinAssignment};

/// Wiring of the generic PCF8574T LCD adapter boards.
/// RS on P0, E on P2, the backlight on P3 and DB4-DB7 on P4-P7. RW is wired to P1, which is never
/// driven high, so the display is write only.
pub const GENERIC_PCF8574T_PINS: PinAssignment = match PinAssignment::new(0, 2, 3, 4) {
    Ok(pins) => pins,
    Err(_) => panic!("invalid PCF8574T adapter wiring"),
};

/// 4-bit connection through a generic PCF8574T adapter.
pub type GenericPCF8574TConnection<I2C, DELAY> = NibbleConnection<Pcf8574<I2C>, DELAY>;

/// Creates the connection for a generic PCF8574T adapter at `address`.
pub fn generic_pcf8574t<I2C, DELAY>(
    i2c: I2C,
    address: u8,
    delay: DELAY,
) -> GenericPCF8574TConnection<I2C, DELAY>
where
    I2C: i2c::I2c,
    DELAY: DelayNs,
{
    NibbleConnection::new(Pcf8574::new(i2c, address), GENERIC_PCF8574T_PINS, delay)
}

#[cfg(test)]
mod tests {
    extern crate std;
    use super::*;
    use crate::driver::Connection;
    use embedded_hal_mock::eh1::{
        delay::NoopDelay,
        i2c::{Mock as I2cMock, Transaction as I2cTransaction},
    };

    #[test]
    fn test_generic_pcf8574t_pins() {
        assert_eq!(GENERIC_PCF8574T_PINS.used_mask(), 0b1111_1101);
    }

    #[test]
    fn test_generic_pcf8574t_init() {
        let expected_transactions = [
            // all lines low
            I2cTransaction::write(0x27, std::vec![0b0000_0000]),
            I2cTransaction::write(0x27, std::vec![0b0011_0100]),
            I2cTransaction::write(0x27, std::vec![0b0011_0000]),
            I2cTransaction::write(0x27, std::vec![0b0011_0100]),
            I2cTransaction::write(0x27, std::vec![0b0011_0000]),
            I2cTransaction::write(0x27, std::vec![0b0011_0100]),
            I2cTransaction::write(0x27, std::vec![0b0011_0000]),
            // 4-bit mode
            I2cTransaction::write(0x27, std::vec![0b0010_0100]),
            I2cTransaction::write(0x27, std::vec![0b0010_0000]),
        ];
        let i2c = I2cMock::new(&expected_transactions);
        let mut connection = generic_pcf8574t(i2c, 0x27, NoopDelay);

        assert!(connection.init().is_ok());
        connection.expander().i2c().done();
    }

    #[test]
    fn test_generic_pcf8574t_write_byte() {
        let expected_transactions = [
            // write byte 0xDE with RS = 1
            I2cTransaction::write(0x27, std::vec![0b1101_0101]), // enable = 1, rs = 1
            I2cTransaction::write(0x27, std::vec![0b1101_0001]), // enable = 0, rs = 1
            I2cTransaction::write(0x27, std::vec![0b1110_0101]),
            I2cTransaction::write(0x27, std::vec![0b1110_0001]),
            // backlight on keeps the last nibble
            I2cTransaction::write(0x27, std::vec![0b1110_1001]),
            // write byte 0xAD with RS = 0
            I2cTransaction::write(0x27, std::vec![0b1010_1100]), // enable = 1, rs = 0
            I2cTransaction::write(0x27, std::vec![0b1010_1000]), // enable = 0, rs = 0
            I2cTransaction::write(0x27, std::vec![0b1101_1100]),
            I2cTransaction::write(0x27, std::vec![0b1101_1000]),
        ];
        let i2c = I2cMock::new(&expected_transactions);
        let mut connection = generic_pcf8574t(i2c, 0x27, NoopDelay);

        assert!(connection.send_data(0xDE).is_ok());
        assert!(connection.set_backlight(true).is_ok());
        assert!(connection.send_command(0xAD).is_ok());
        connection.expander().i2c().done();
    }
}
