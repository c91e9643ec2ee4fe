//! This Rust `embedded-hal`-based library drives [HD44780](https://en.wikipedia.org/wiki/Hitachi_HD44780_LCD_controller)
//! compatible character displays that are wired to an 8-bit GPIO expander in 4-bit mode, in an embedded, `no_std` environment.
//! Every command or character byte is sent as two nibbles, each latched with a pulse on the enable line, and the expander's
//! output register is always written as a whole. Two common I2C adapter boards are supported out of the box:
//!
//! - **[Adafruit I2C/SPI LCD Backpack](https://www.adafruit.com/product/292)** - MCP23008 based. This library only supports the I2C interface.
//! - **PCF8574-based I2C adapter** - These adapters are ubiquitous on eBay and AliExpress and have no clear branding. The display 4-bit
//!   data pins are connected to P4-P7 of the PCF8574, RS to P0, E to P2 and the backlight to P3.
//!
//! Any other wiring can be described with a `PinAssignment`, and any other expander can be used by implementing the
//! `GpioExpander` trait.
//!
//! Key features include:
//! - Convenient high-level API for controlling the display, with chainable calls
//! - 1, 2 and 4 line layouts with 8 to 40 columns
//! - Support for custom characters
//! - Backlight control
//! - `core::fmt::Write` implementation for easy use with the `write!` macro
//! - Compatible with the `embedded-hal` traits v1.0 and later
//! - Optional support for the `defmt` and `ufmt` logging frameworks
//!
//! ## Usage
//! Add this to your `Cargo.toml`:
//! ```toml
//! [dependencies]
//! hd44780-expander = { version = "0.1", features = ["defmt"] }
//! ```
//! The `features = ["defmt"]` line is optional and enables the `defmt` feature, which adds log output and allows the library's
//! types to be used with the `defmt` logging framework. Another optional feature is `features = ["ufmt"]`, which enables the
//! `ufmt` feature, allowing the `uwriteln!` and `uwrite!` macros to be used.
//!
//! Then select the appropriate adapter for your display:
//! ```rust
//! use hd44780_expander::{AdafruitLCDBackpack, CharacterDisplayPCF8574T, LcdDisplayType};
//!
//! // board setup
//! let i2c = ...; // I2C peripheral
//! let delay = ...; // DelayNs implementation
//!
//! // Adafruit backpack
//! let mut lcd = AdafruitLCDBackpack::new(i2c, LcdDisplayType::Lcd16x2, delay);
//! // PCF8574T adapter
//! let mut lcd = CharacterDisplayPCF8574T::new(i2c, LcdDisplayType::Lcd16x2, delay);
//! ```
//! The display type configures the number of rows and columns. Displays not covered by `LcdDisplayType` can be described
//! with `Layout::new(rows, columns)`.
//!
//! Initialize the display:
//! ```rust
//! if let Err(e) = lcd.init() {
//!    panic!("Error initializing LCD: {}", e);
//! }
//! ```
//! Use the display:
//! ```rust
//! // set up the display
//! lcd.set_backlight(true)?.clear()?.home()?;
//! // print a message
//! lcd.print("Hello, world!")?;
//! // can also use the `core::fmt::write!` macro
//! use core::fmt::Write;
//!
//! write!(lcd, "Hello, world!")?;
//! ```
//! Every operation returns a `Result`. The first failed expander write aborts the operation and is reported as
//! `CharacterDisplayError::ExpanderError`. Nothing is retried; re-running `init` is the usual recovery.
//!
//! ### Other wirings
//! ```rust
//! use hd44780_expander::{CharacterDisplay, Layout, NibbleConnection, PinAssignment, Pcf8574};
//!
//! let pins = PinAssignment::new(4, 5, 6, 0)?; // RS, E, backlight, DB4
//! let connection = NibbleConnection::new(Pcf8574::new(i2c, 0x3F), pins, delay);
//! let mut lcd = CharacterDisplay::from_connection(connection, Layout::new(4, 20)?);
//! ```
#![no_std]
use core::fmt::Display;

use embedded_hal::{delay::DelayNs, i2c};

mod driver;
#[cfg(test)]
mod testing;

pub use driver::{
    hd44780::{
        adapter::{
            adafruit_lcd_backpack::{
                adafruit_lcd_backpack, AdafruitLCDBackpackConnection, ADAFRUIT_LCD_BACKPACK_PINS,
            },
            generic_pcf8574t::{generic_pcf8574t, GenericPCF8574TConnection, GENERIC_PCF8574T_PINS},
            mcp23008::Mcp23008,
            pcf8574::Pcf8574,
            GpioExpander, NibbleConnection, PinAssignment, PinDirection,
        },
        DisplayState, HD44780,
    },
    Connection,
};

/// HD44780 based character display using a generic PCF8574T I2C adapter.
pub type CharacterDisplayPCF8574T<I2C, DELAY> =
    CharacterDisplay<GenericPCF8574TConnection<I2C, DELAY>>;

/// HD44780 based character display using an Adafruit I2C/SPI LCD backpack adapter.
pub type AdafruitLCDBackpack<I2C, DELAY> =
    CharacterDisplay<AdafruitLCDBackpackConnection<I2C, DELAY>>;

#[derive(Debug, PartialEq, Copy, Clone)]
/// Errors that can occur when using the display. `E` is the error type of the GPIO expander.
pub enum CharacterDisplayError<E> {
    /// Error returned from the GPIO expander
    ExpanderError(E),
    /// Formatting error
    FormattingError(core::fmt::Error),
}

impl<E> From<core::fmt::Error> for CharacterDisplayError<E> {
    fn from(err: core::fmt::Error) -> Self {
        CharacterDisplayError::FormattingError(err)
    }
}

impl<E> From<&CharacterDisplayError<E>> for &'static str {
    fn from(err: &CharacterDisplayError<E>) -> Self {
        match err {
            CharacterDisplayError::ExpanderError(_) => "GPIO expander error",
            CharacterDisplayError::FormattingError(_) => "Formatting error",
        }
    }
}

#[cfg(feature = "defmt")]
impl<E> defmt::Format for CharacterDisplayError<E> {
    fn format(&self, fmt: defmt::Formatter) {
        let msg: &'static str = From::from(self);
        defmt::write!(fmt, "{}", msg);
    }
}

#[cfg(feature = "ufmt")]
impl<E> ufmt::uDisplay for CharacterDisplayError<E> {
    fn fmt<W>(&self, w: &mut ufmt::Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: ufmt::uWrite + ?Sized,
    {
        let msg: &'static str = From::from(self);
        ufmt::uwrite!(w, "{}", msg)
    }
}

impl<E> Display for CharacterDisplayError<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let msg: &'static str = From::from(self);
        write!(f, "{}", msg)
    }
}

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
/// Errors in a display layout or pin assignment, reported when it is created.
pub enum ConfigError {
    /// A pin number does not exist on the 8-bit expander register
    PinOutOfRange,
    /// Two pin roles share a pin
    PinConflict,
    /// Only 1, 2 and 4 row layouts are supported
    UnsupportedRows,
    /// Column count outside 8 to 40
    UnsupportedColumns,
}

impl From<&ConfigError> for &'static str {
    fn from(err: &ConfigError) -> Self {
        match err {
            ConfigError::PinOutOfRange => "Pin out of range",
            ConfigError::PinConflict => "Pin used twice",
            ConfigError::UnsupportedRows => "Unsupported row count",
            ConfigError::UnsupportedColumns => "Unsupported column count",
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ConfigError {
    fn format(&self, fmt: defmt::Formatter) {
        let msg: &'static str = From::from(self);
        defmt::write!(fmt, "{}", msg);
    }
}

#[cfg(feature = "ufmt")]
impl ufmt::uDisplay for ConfigError {
    fn fmt<W>(&self, w: &mut ufmt::Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: ufmt::uWrite + ?Sized,
    {
        let msg: &'static str = From::from(self);
        ufmt::uwrite!(w, "{}", msg)
    }
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let msg: &'static str = From::from(self);
        write!(f, "{}", msg)
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
/// Common display sizes. Converts into a `Layout`.
pub enum LcdDisplayType {
    /// 8x1 display
    Lcd8x1,
    /// 16x1 display
    Lcd16x1,
    /// 8x2 display
    Lcd8x2,
    /// 16x2 display
    Lcd16x2,
    /// 20x2 display
    Lcd20x2,
    /// 40x2 display
    Lcd40x2,
    /// 16x4 display
    Lcd16x4,
    /// 20x4 display
    Lcd20x4,
}

impl From<&LcdDisplayType> for &'static str {
    fn from(display_type: &LcdDisplayType) -> Self {
        match display_type {
            LcdDisplayType::Lcd8x1 => "8x1",
            LcdDisplayType::Lcd16x1 => "16x1",
            LcdDisplayType::Lcd8x2 => "8x2",
            LcdDisplayType::Lcd16x2 => "16x2",
            LcdDisplayType::Lcd20x2 => "20x2",
            LcdDisplayType::Lcd40x2 => "40x2",
            LcdDisplayType::Lcd16x4 => "16x4",
            LcdDisplayType::Lcd20x4 => "20x4",
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for LcdDisplayType {
    fn format(&self, fmt: defmt::Formatter) {
        let msg: &'static str = From::from(self);
        defmt::write!(fmt, "{}", msg);
    }
}

#[cfg(feature = "ufmt")]
impl ufmt::uDisplay for LcdDisplayType {
    fn fmt<W>(&self, w: &mut ufmt::Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: ufmt::uWrite + ?Sized,
    {
        let msg: &'static str = From::from(self);
        ufmt::uwrite!(w, "{}", msg)
    }
}

impl Display for LcdDisplayType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let msg: &'static str = From::from(self);
        write!(f, "{}", msg)
    }
}

impl LcdDisplayType {
    /// Get the number of rows for the display type
    pub const fn rows(&self) -> u8 {
        match self {
            LcdDisplayType::Lcd8x1 | LcdDisplayType::Lcd16x1 => 1,
            LcdDisplayType::Lcd8x2
            | LcdDisplayType::Lcd16x2
            | LcdDisplayType::Lcd20x2
            | LcdDisplayType::Lcd40x2 => 2,
            LcdDisplayType::Lcd16x4 | LcdDisplayType::Lcd20x4 => 4,
        }
    }

    /// Get the number of columns for the display type
    pub const fn cols(&self) -> u8 {
        match self {
            LcdDisplayType::Lcd8x1 | LcdDisplayType::Lcd8x2 => 8,
            LcdDisplayType::Lcd16x1 | LcdDisplayType::Lcd16x2 | LcdDisplayType::Lcd16x4 => 16,
            LcdDisplayType::Lcd20x2 | LcdDisplayType::Lcd20x4 => 20,
            LcdDisplayType::Lcd40x2 => 40,
        }
    }
}

/// Rows and columns of a display. Fixed for the lifetime of the display object.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Layout {
    rows: u8,
    columns: u8,
}

impl Layout {
    pub const MIN_COLUMNS: u8 = 8;
    pub const MAX_COLUMNS: u8 = 40;

    /// Creates a layout. `rows` must be 1, 2 or 4 and `columns` between 8 and 40.
    pub const fn new(rows: u8, columns: u8) -> Result<Self, ConfigError> {
        if !matches!(rows, 1 | 2 | 4) {
            return Err(ConfigError::UnsupportedRows);
        }
        if columns < Self::MIN_COLUMNS || columns > Self::MAX_COLUMNS {
            return Err(ConfigError::UnsupportedColumns);
        }
        Ok(Self { rows, columns })
    }

    pub const fn rows(&self) -> u8 {
        self.rows
    }

    pub const fn columns(&self) -> u8 {
        self.columns
    }

    /// Layouts with more than one row use the controller's 2 line mode. On 4 line displays the
    /// third and fourth rows continue the first and second in memory.
    pub const fn is_two_line_mode(&self) -> bool {
        self.rows > 1
    }
}

impl From<LcdDisplayType> for Layout {
    fn from(display_type: LcdDisplayType) -> Self {
        Self {
            rows: display_type.rows(),
            columns: display_type.cols(),
        }
    }
}

/// Cursor appearance.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CursorMode {
    /// No cursor
    Off,
    /// Underline cursor
    Line,
    /// Underline plus blinking block
    Block,
}

/// Direction the cursor moves after each written character.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WritingDirection {
    LeftToRight,
    RightToLeft,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ScrollDirection {
    Left,
    Right,
}

/// A character display driven through any `Connection`.
pub struct CharacterDisplay<CONN>
where
    CONN: Connection,
{
    device: HD44780<CONN>,
}

impl<CONN> CharacterDisplay<CONN>
where
    CONN: Connection,
{
    /// Create a new character display object on top of an existing connection.
    pub fn from_connection(connection: CONN, layout: impl Into<Layout>) -> Self {
        Self {
            device: HD44780::new(connection, layout.into()),
        }
    }

    /// Initialize the display. This must be called before using the display.
    /// Leaves the display cleared and on, with the cursor hidden and left to right writing.
    pub fn init(&mut self) -> Result<&mut Self, CharacterDisplayError<CONN::Error>> {
        self.device.init()?;
        Ok(self)
    }

    /// returns the `Layout` used to create the display
    pub fn layout(&self) -> Layout {
        self.device.layout()
    }

    /// returns the display flags as last sent to the controller
    pub fn state(&self) -> DisplayState {
        self.device.state()
    }

    /// returns the connection. mostly needed for testing
    pub fn connection(&mut self) -> &mut CONN {
        self.device.connection()
    }

    /// Consumes the display and gives back the connection.
    pub fn release(self) -> CONN {
        self.device.release()
    }

    //--------------------------------------------------------------------------------------------------
    // high level commands, for the user!
    //--------------------------------------------------------------------------------------------------

    /// Clear the display, restore the display on, cursor off, left to right writing and no autoscroll.
    pub fn reset(&mut self) -> Result<&mut Self, CharacterDisplayError<CONN::Error>> {
        self.device.reset()?;
        Ok(self)
    }

    /// Clear the display
    pub fn clear(&mut self) -> Result<&mut Self, CharacterDisplayError<CONN::Error>> {
        self.device.clear()?;
        Ok(self)
    }

    /// Set the cursor to the home position.
    pub fn home(&mut self) -> Result<&mut Self, CharacterDisplayError<CONN::Error>> {
        self.device.home()?;
        Ok(self)
    }

    /// Set the cursor position at specified column and row. Columns and rows are zero-indexed.
    /// Values beyond the layout are clamped.
    pub fn set_cursor(
        &mut self,
        col: u8,
        row: u8,
    ) -> Result<&mut Self, CharacterDisplayError<CONN::Error>> {
        self.device.set_cursor(col, row)?;
        Ok(self)
    }

    /// Writes one byte of the character ROM, or a custom character 0-7, at the cursor.
    pub fn write_char(&mut self, c: u8) -> Result<&mut Self, CharacterDisplayError<CONN::Error>> {
        self.device.write_char(c)?;
        Ok(self)
    }

    /// Writes raw character ROM bytes at the cursor.
    pub fn write_bytes(
        &mut self,
        bytes: &[u8],
    ) -> Result<&mut Self, CharacterDisplayError<CONN::Error>> {
        self.device.write_bytes(bytes)?;
        Ok(self)
    }

    /// Prints a string to the LCD at the current cursor position.
    pub fn print(&mut self, text: &str) -> Result<&mut Self, CharacterDisplayError<CONN::Error>> {
        self.device.print(text)?;
        Ok(self)
    }

    /// Prints formatted text. Unlike `write!`, an expander failure is reported as such.
    pub fn print_fmt(
        &mut self,
        args: core::fmt::Arguments<'_>,
    ) -> Result<&mut Self, CharacterDisplayError<CONN::Error>> {
        let mut writer = FmtWriter {
            device: &mut self.device,
            error: None,
        };
        let result = core::fmt::write(&mut writer, args);
        if let Err(e) = result {
            return Err(writer
                .error
                .take()
                .unwrap_or(CharacterDisplayError::FormattingError(e)));
        }
        Ok(self)
    }

    /// Set the display visibility. The display memory is kept while the display is off.
    pub fn set_enabled(&mut self, on: bool) -> Result<&mut Self, CharacterDisplayError<CONN::Error>> {
        self.device.set_enabled(on)?;
        Ok(self)
    }

    /// Set the cursor appearance.
    pub fn set_cursor_mode(
        &mut self,
        mode: CursorMode,
    ) -> Result<&mut Self, CharacterDisplayError<CONN::Error>> {
        self.device.set_cursor_mode(mode)?;
        Ok(self)
    }

    /// Turn the backlight on or off
    pub fn set_backlight(
        &mut self,
        on: bool,
    ) -> Result<&mut Self, CharacterDisplayError<CONN::Error>> {
        self.device.set_backlight(on)?;
        Ok(self)
    }

    /// Set the text flow direction.
    pub fn set_writing_direction(
        &mut self,
        direction: WritingDirection,
    ) -> Result<&mut Self, CharacterDisplayError<CONN::Error>> {
        self.device.set_writing_direction(direction)?;
        Ok(self)
    }

    /// Set the auto scroll mode. When on, the display shifts with every written character
    /// instead of the cursor moving.
    pub fn set_autoscroll(
        &mut self,
        on: bool,
    ) -> Result<&mut Self, CharacterDisplayError<CONN::Error>> {
        self.device.set_autoscroll(on)?;
        Ok(self)
    }

    /// Scroll the display content one position.
    pub fn scroll(
        &mut self,
        direction: ScrollDirection,
    ) -> Result<&mut Self, CharacterDisplayError<CONN::Error>> {
        self.device.scroll(direction)?;
        Ok(self)
    }

    /// Create a new custom character.
    pub fn create_char(
        &mut self,
        location: u8,
        charmap: [u8; 8],
    ) -> Result<&mut Self, CharacterDisplayError<CONN::Error>> {
        self.device.create_char(location, charmap)?;
        Ok(self)
    }
}

impl<I2C, DELAY> AdafruitLCDBackpack<I2C, DELAY>
where
    I2C: i2c::I2c,
    DELAY: DelayNs,
{
    /// Create a new character display object with the default I2C address for the adapter.
    pub fn new(i2c: I2C, lcd_type: impl Into<Layout>, delay: DELAY) -> Self {
        Self::new_with_address(i2c, Mcp23008::<I2C>::default_i2c_address(), lcd_type, delay)
    }

    /// Create a new character display object with a specific I2C address for the adapter.
    pub fn new_with_address(
        i2c: I2C,
        address: u8,
        lcd_type: impl Into<Layout>,
        delay: DELAY,
    ) -> Self {
        Self::from_connection(adafruit_lcd_backpack(i2c, address, delay), lcd_type)
    }

    /// returns a reference to the I2C peripheral. mostly needed for testing
    pub fn i2c(&mut self) -> &mut I2C {
        self.connection().expander().i2c()
    }
}

impl<I2C, DELAY> CharacterDisplayPCF8574T<I2C, DELAY>
where
    I2C: i2c::I2c,
    DELAY: DelayNs,
{
    /// Create a new character display object with the default I2C address for the adapter.
    pub fn new(i2c: I2C, lcd_type: impl Into<Layout>, delay: DELAY) -> Self {
        Self::new_with_address(i2c, Pcf8574::<I2C>::default_i2c_address(), lcd_type, delay)
    }

    /// Create a new character display object with a specific I2C address for the adapter.
    pub fn new_with_address(
        i2c: I2C,
        address: u8,
        lcd_type: impl Into<Layout>,
        delay: DELAY,
    ) -> Self {
        Self::from_connection(generic_pcf8574t(i2c, address, delay), lcd_type)
    }

    /// returns a reference to the I2C peripheral. mostly needed for testing
    pub fn i2c(&mut self) -> &mut I2C {
        self.connection().expander().i2c()
    }
}

/// Keeps the first connection error, which `core::fmt::Error` cannot carry.
struct FmtWriter<'a, CONN>
where
    CONN: Connection,
{
    device: &'a mut HD44780<CONN>,
    error: Option<CharacterDisplayError<CONN::Error>>,
}

impl<CONN> core::fmt::Write for FmtWriter<'_, CONN>
where
    CONN: Connection,
{
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        self.device.print(s).map_err(|e| {
            self.error = Some(e);
            core::fmt::Error
        })
    }
}

/// Implement the `core::fmt::Write` trait for the display, allowing it to be used with the `write!` macro.
/// Expander errors become `core::fmt::Error`; use `print_fmt` to keep them.
impl<CONN> core::fmt::Write for CharacterDisplay<CONN>
where
    CONN: Connection,
{
    fn write_str(&mut self, s: &str) -> Result<(), core::fmt::Error> {
        if let Err(_e) = self.print(s) {
            #[cfg(feature = "defmt")]
            defmt::warn!("Write to display failed: {}", _e);
            return Err(core::fmt::Error);
        }
        Ok(())
    }
}

#[cfg(feature = "ufmt")]
/// Implement the `ufmt::uWrite` trait for the display, allowing it to be used with the `uwriteln!` and `uwrite!` macros.
impl<CONN> ufmt::uWrite for CharacterDisplay<CONN>
where
    CONN: Connection,
{
    fn write_str(&mut self, s: &str) -> Result<(), CharacterDisplayError<CONN::Error>> {
        self.print(s)?;
        Ok(())
    }

    type Error = CharacterDisplayError<CONN::Error>;
}
