use crossterm::{ExecutableCommand, cursor, terminal};
use std::io::{Write, stdout};

/// Switches to the alternate screen for the lifetime of a playback.
pub struct TerminalGuard;

impl TerminalGuard {
    pub fn new() -> Self {
        let mut stdout = stdout();
        let _ = stdout.execute(terminal::EnterAlternateScreen);
        let _ = stdout.execute(cursor::Hide);
        Self
    }

    /// Puts the terminal back; safe to call from a signal handler.
    pub fn restore() {
        let mut stdout = stdout();
        let _ = stdout.execute(cursor::Show);
        let _ = stdout.execute(terminal::LeaveAlternateScreen);
        let _ = stdout.flush();
    }
}

impl Default for TerminalGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        Self::restore();
    }
}
