use embedded_hal::{delay::DelayNs, i2c};

use super::{mcp23008::Mcp23008, NibbleConnection, PinAssignment};

/// Wiring of the MCP23008 based I2C/SPI LCD backpack from Adafruit.
/// RS on GP1, E on GP2, DB4-DB7 on GP3-GP6 and the backlight transistor on GP7.
pub const ADAFRUIT_LCD_BACKPACK_PINS: PinAssignment = match PinAssignment::new(1, 2, 7, 3) {
    Ok(pins) => pins,
    Err(_) => panic!("invalid Adafruit LCD backpack wiring"),
};

/// 4-bit connection through the Adafruit LCD backpack.
pub type AdafruitLCDBackpackConnection<I2C, DELAY> = NibbleConnection<Mcp23008<I2C>, DELAY>;

/// Creates the connection for an Adafruit LCD backpack at `address`.
pub fn adafruit_lcd_backpack<I2C, DELAY>(
    i2c: I2C,
    address: u8,
    delay: DELAY,
) -> AdafruitLCDBackpackConnection<I2C, DELAY>
where
    I2C: i2c::I2c,
    DELAY: DelayNs,
{
    NibbleConnection::new(
        Mcp23008::new(i2c, address),
        ADAFRUIT_LCD_BACKPACK_PINS,
        delay,
    )
}
