pub mod hd44780;

use embedded_hal::delay::DelayNs;

use crate::CharacterDisplayError;

/// Trait for the connection to a HD44780 controller. Embodies the transport-specific
/// functionality: how a command or data byte reaches the controller and how the backlight
/// is switched. The HD44780 command set itself lives in `hd44780::HD44780`, which drives
/// any implementation of this trait.
///
/// There are no read methods. Most adapters leave the R/W line tied low.
pub trait Connection {
    /// Error type reported by the hardware underneath the connection.
    type Error;

    /// Delay provider, shared with the display driver for the command execution times.
    type Delay: DelayNs;

    /// Sets up the hardware and brings the controller into 4-bit mode. Called by the display
    /// driver as the first step of its own initialization.
    fn init(&mut self) -> Result<(), CharacterDisplayError<Self::Error>>;

    /// Sends a byte to the instruction register.
    fn send_command(&mut self, command: u8) -> Result<(), CharacterDisplayError<Self::Error>>;

    /// Sends a byte to the data register, either the CGRAM or DDRAM, depending on the
    /// prior address command.
    fn send_data(&mut self, data: u8) -> Result<(), CharacterDisplayError<Self::Error>>;

    /// Sets the backlight pin. A value of `true` indicates the backlight is on.
    fn set_backlight(&mut self, on: bool) -> Result<(), CharacterDisplayError<Self::Error>>;

    /// returns the delay object
    fn delay(&mut self) -> &mut Self::Delay;
}
