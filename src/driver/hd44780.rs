// HD44780 Support
// This module encodes the display operations into the HD44780 instruction set. The HD44780
// struct owns a `Connection` and keeps the entry mode and display control flags, because both
// instructions carry several flags at once and have to be re-sent as a whole whenever one of
// them changes. The connection decides how a byte reaches the controller; the 4-bit GPIO
// expander transport is in the `adapter` module.
//

pub mod adapter;

use bitfield::bitfield;
use embedded_hal::delay::DelayNs;

use crate::{
    driver::Connection, CharacterDisplayError, CursorMode, Layout, ScrollDirection,
    WritingDirection,
};

// commands
const LCD_CMD_CLEARDISPLAY: u8 = 0x01; //  Clear display, set cursor position to zero
const LCD_CMD_RETURNHOME: u8 = 0x02; //  Set cursor position to zero
const LCD_CMD_ENTRYMODESET: u8 = 0x04; //  Sets the entry mode
const LCD_CMD_DISPLAYCONTROL: u8 = 0x08; //  Turns display, cursor and blinking on and off
const LCD_CMD_CURSORSHIFT: u8 = 0x10; //  Moves the cursor or shifts the display
const LCD_CMD_FUNCTIONSET: u8 = 0x20; //  Sets the line count and font
const LCD_CMD_SETCGRAMADDR: u8 = 0x40; //  Sets the CGRAM (character generator RAM) address
const LCD_CMD_SETDDRAMADDR: u8 = 0x80; //  Sets the DDRAM (display data RAM) address

// flags for display/cursor shift
const LCD_FLAG_DISPLAYMOVE: u8 = 0x08; //  Shift the display instead of the cursor
const LCD_FLAG_MOVERIGHT: u8 = 0x04; //  Shift to the right

// flags for function set
const LCD_FLAG_2LINE: u8 = 0x08; //  LCD 2 line mode

/// Worst case execution time of clear and return home.
const CLEAR_HOME_DELAY_MS: u32 = 3;

/// Code sent for characters the controller ROM cannot address with one byte.
const REPLACEMENT_CHARACTER: u8 = b'?';

// flags for display entry mode, at their bit positions in the entry mode set instruction
bitfield! {
    struct EntryModeFlags(u8);
    impl Debug;
    increment, set_increment: 1; //  Address counter increments after each write
    shift, set_shift: 0; //  Display shifts after each write
}

// flags for display on/off control, at their bit positions in the display control instruction
bitfield! {
    struct DisplayControlFlags(u8);
    impl Debug;
    display, set_display: 2; //  Turns the display on
    cursor, set_cursor: 1; //  Turns the cursor on
    blink, set_blink: 0; //  Turns on the blinking cursor
}

impl Clone for EntryModeFlags {
    fn clone(&self) -> Self {
        *self
    }
}

impl Copy for EntryModeFlags {}

impl Clone for DisplayControlFlags {
    fn clone(&self) -> Self {
        *self
    }
}

impl Copy for DisplayControlFlags {}

/// The display state the controller cannot report back: the flags of the entry mode and
/// display control instructions as they were last sent.
#[derive(Debug, Clone, Copy)]
pub struct DisplayState {
    entry_mode: EntryModeFlags,
    control: DisplayControlFlags,
}

impl Default for DisplayState {
    fn default() -> Self {
        Self {
            entry_mode: EntryModeFlags(0),
            control: DisplayControlFlags(0),
        }
    }
}

impl PartialEq for DisplayState {
    fn eq(&self, other: &Self) -> bool {
        self.entry_mode.0 == other.entry_mode.0 && self.control.0 == other.control.0
    }
}

impl Eq for DisplayState {}

#[cfg(feature = "defmt")]
impl defmt::Format for DisplayState {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(
            fmt,
            "DisplayState(increment={}, auto_shift={}, display={}, cursor={}, blink={})",
            self.increment(),
            self.auto_shift(),
            self.display_enabled(),
            self.cursor_visible(),
            self.cursor_blinks()
        );
    }
}

impl DisplayState {
    /// State right after a successful `HD44780::init`.
    fn initialized() -> Self {
        let mut state = Self::default();
        state.entry_mode.set_increment(true);
        state.control.set_display(true);
        state
    }

    /// The address counter increments after each write (left to right).
    pub fn increment(&self) -> bool {
        self.entry_mode.increment()
    }

    /// The display shifts after each write.
    pub fn auto_shift(&self) -> bool {
        self.entry_mode.shift()
    }

    pub fn display_enabled(&self) -> bool {
        self.control.display()
    }

    pub fn cursor_visible(&self) -> bool {
        self.control.cursor()
    }

    /// The cursor blinks, shown as a block.
    pub fn cursor_blinks(&self) -> bool {
        self.control.blink()
    }

    /// The entry mode set instruction encoding the current flags.
    pub fn entry_mode_command(&self) -> u8 {
        LCD_CMD_ENTRYMODESET | self.entry_mode.0
    }

    /// The display control instruction encoding the current flags.
    pub fn display_control_command(&self) -> u8 {
        LCD_CMD_DISPLAYCONTROL | self.control.0
    }
}

impl Layout {
    /// Returns the DDRAM address for a column and row. Out of range values are clamped to the
    /// last valid column and row.
    ///
    /// One and two line layouts address the full 80 character memory, including the parts that
    /// are only visible after shifting the display. On four line layouts rows 3 and 4 continue
    /// rows 1 and 2 in memory, so they start `columns` characters into the 40 byte halves.
    pub fn address_for_position(&self, col: u8, row: u8) -> u8 {
        let rows = self.rows();
        let columns = self.columns();
        let col = match rows {
            1 => col.min(79),
            2 => col.min(39),
            _ => col.min(columns - 1),
        };
        let row = row.min(rows - 1);

        match rows {
            1 => col,
            2 => {
                let offset = if row == 0 { 0 } else { 40 };
                col + offset
            }
            _ => {
                let half_offset = if row & 0b01 == 0 { 0 } else { 40 };
                let extension_offset = if row & 0b10 == 0 { 0 } else { columns };
                col + half_offset + extension_offset
            }
        }
    }
}

/// Converts a character to the byte sent to the controller.
fn rom_code(c: char) -> u8 {
    u8::try_from(c).unwrap_or(REPLACEMENT_CHARACTER)
}

/// HD44780 command set driver for one controller behind a `Connection`.
pub struct HD44780<CONN>
where
    CONN: Connection,
{
    connection: CONN,
    layout: Layout,
    state: DisplayState,
}

impl<CONN> HD44780<CONN>
where
    CONN: Connection,
{
    pub fn new(connection: CONN, layout: Layout) -> Self {
        Self {
            connection,
            layout,
            state: DisplayState::default(),
        }
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn state(&self) -> DisplayState {
        self.state
    }

    /// returns the connection. mostly used for testing
    pub fn connection(&mut self) -> &mut CONN {
        &mut self.connection
    }

    pub fn release(self) -> CONN {
        self.connection
    }

    fn send_command(&mut self, command: u8) -> Result<(), CharacterDisplayError<CONN::Error>> {
        #[cfg(feature = "defmt")]
        defmt::trace!("HD44780 command {=u8:#x}", command);
        self.connection.send_command(command)
    }

    fn send_entry_mode(&mut self) -> Result<(), CharacterDisplayError<CONN::Error>> {
        self.send_command(self.state.entry_mode_command())
    }

    fn send_display_control(&mut self) -> Result<(), CharacterDisplayError<CONN::Error>> {
        self.send_command(self.state.display_control_command())
    }

    /// Initializes the connection and the controller, then leaves the display cleared and
    /// switched on with a hidden cursor and left to right entry. The in-memory state is only
    /// updated once every step succeeded.
    pub fn init(&mut self) -> Result<(), CharacterDisplayError<CONN::Error>> {
        #[cfg(feature = "defmt")]
        defmt::debug!("Initializing HD44780 with {} layout", self.layout);
        self.connection.init()?;

        let target = DisplayState::initialized();
        let mut function = LCD_CMD_FUNCTIONSET;
        if self.layout.is_two_line_mode() {
            function |= LCD_FLAG_2LINE;
        }
        self.send_command(function)?;
        self.send_command(target.entry_mode_command())?;
        // keep the display dark while the memory is cleared
        self.send_command(LCD_CMD_DISPLAYCONTROL)?;
        self.clear()?;
        self.home()?;
        self.send_command(target.display_control_command())?;

        self.state = target;
        Ok(())
    }

    /// Clears the display and restores the default modes one by one. Stops at the first failure.
    pub fn reset(&mut self) -> Result<(), CharacterDisplayError<CONN::Error>> {
        self.clear()?;
        self.home()?;
        self.set_enabled(true)?;
        self.set_cursor_mode(CursorMode::Off)?;
        self.set_writing_direction(WritingDirection::LeftToRight)?;
        self.set_autoscroll(false)
    }

    pub fn clear(&mut self) -> Result<(), CharacterDisplayError<CONN::Error>> {
        self.send_command(LCD_CMD_CLEARDISPLAY)?;
        self.connection.delay().delay_ms(CLEAR_HOME_DELAY_MS);
        Ok(())
    }

    pub fn home(&mut self) -> Result<(), CharacterDisplayError<CONN::Error>> {
        self.send_command(LCD_CMD_RETURNHOME)?;
        self.connection.delay().delay_ms(CLEAR_HOME_DELAY_MS);
        Ok(())
    }

    pub fn set_cursor(&mut self, col: u8, row: u8) -> Result<(), CharacterDisplayError<CONN::Error>> {
        let address = self.layout.address_for_position(col, row);
        self.send_command(LCD_CMD_SETDDRAMADDR | (address & 0x7F))
    }

    /// Writes one raw byte to the data register. The controller moves the address counter.
    pub fn write_char(&mut self, c: u8) -> Result<(), CharacterDisplayError<CONN::Error>> {
        self.connection.send_data(c)
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), CharacterDisplayError<CONN::Error>> {
        for &byte in bytes {
            self.write_char(byte)?;
        }
        Ok(())
    }

    /// Writes the characters of `text` in order. Characters above U+00FF are sent as `?`.
    pub fn print(&mut self, text: &str) -> Result<(), CharacterDisplayError<CONN::Error>> {
        #[cfg(feature = "defmt")]
        defmt::debug!("Printing: {}", text);
        for c in text.chars() {
            self.write_char(rom_code(c))?;
        }
        Ok(())
    }

    pub fn set_enabled(&mut self, on: bool) -> Result<(), CharacterDisplayError<CONN::Error>> {
        self.state.control.set_display(on);
        self.send_display_control()
    }

    pub fn set_cursor_mode(
        &mut self,
        mode: CursorMode,
    ) -> Result<(), CharacterDisplayError<CONN::Error>> {
        self.state.control.set_cursor(mode != CursorMode::Off);
        self.state.control.set_blink(mode == CursorMode::Block);
        self.send_display_control()
    }

    pub fn set_backlight(&mut self, on: bool) -> Result<(), CharacterDisplayError<CONN::Error>> {
        self.connection.set_backlight(on)
    }

    pub fn set_writing_direction(
        &mut self,
        direction: WritingDirection,
    ) -> Result<(), CharacterDisplayError<CONN::Error>> {
        self.state
            .entry_mode
            .set_increment(direction == WritingDirection::LeftToRight);
        self.send_entry_mode()
    }

    pub fn set_autoscroll(&mut self, on: bool) -> Result<(), CharacterDisplayError<CONN::Error>> {
        self.state.entry_mode.set_shift(on);
        self.send_entry_mode()
    }

    /// Shifts the whole display content by one position.
    pub fn scroll(
        &mut self,
        direction: ScrollDirection,
    ) -> Result<(), CharacterDisplayError<CONN::Error>> {
        let mut command = LCD_CMD_CURSORSHIFT | LCD_FLAG_DISPLAYMOVE;
        if direction == ScrollDirection::Right {
            command |= LCD_FLAG_MOVERIGHT;
        }
        self.send_command(command)
    }

    /// Stores a 5x8 custom character in one of the 8 CGRAM slots. The character is then
    /// printed with the byte `location`. Set the cursor afterwards, the address counter
    /// points into CGRAM.
    pub fn create_char(
        &mut self,
        location: u8,
        charmap: [u8; 8],
    ) -> Result<(), CharacterDisplayError<CONN::Error>> {
        self.send_command(LCD_CMD_SETCGRAMADDR | ((location & 0x7) << 3))?;
        self.write_bytes(&charmap)
    }
}
