use std::io::{self, Stdout};
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use super::app::App;

/// How long to wait for input before redrawing.
const POLL_INTERVAL: Duration = Duration::from_millis(250);

type Backend = CrosstermBackend<Stdout>;

/// Raw-mode, alternate-screen terminal. Restored explicitly on the normal
/// path so failures surface, and on drop when the loop bails out early.
struct TerminalSession {
    terminal: Terminal<Backend>,
    restored: bool,
}

impl TerminalSession {
    fn start() -> Result<Self> {
        enable_raw_mode().context("failed to enable raw mode")?;
        let terminal = execute!(io::stdout(), EnterAlternateScreen)
            .context("failed to enter alternate screen")
            .and_then(|()| {
                Terminal::new(CrosstermBackend::new(io::stdout()))
                    .context("failed to create terminal backend")
            });
        let terminal = match terminal {
            Ok(terminal) => terminal,
            Err(err) => {
                let _ = execute!(io::stdout(), LeaveAlternateScreen);
                let _ = disable_raw_mode();
                return Err(err);
            }
        };

        // Drop restores the terminal from here on.
        let mut session = Self {
            terminal,
            restored: false,
        };
        session.terminal.clear().context("failed to clear terminal")?;
        Ok(session)
    }

    /// Draw and dispatch keys until the app asks to leave.
    fn run(&mut self, app: &mut App) -> Result<()> {
        loop {
            self.terminal
                .draw(|frame| app.draw(frame))
                .context("failed to draw frame")?;

            if !event::poll(POLL_INTERVAL).context("event polling failed")? {
                continue;
            }
            if let Event::Key(key) = event::read().context("failed to read event")? {
                if key.kind == KeyEventKind::Press && app.handle_key(key.code)? {
                    return Ok(());
                }
            }
        }
    }

    fn restore(&mut self) -> Result<()> {
        self.restored = true;
        disable_raw_mode().context("failed to disable raw mode")?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)
            .context("failed to leave alternate screen")?;
        self.terminal
            .show_cursor()
            .context("failed to restore cursor visibility")
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        if !self.restored {
            let _ = self.restore();
        }
    }
}

/// Take over the terminal, run the catalog UI until the user quits, and hand
/// the terminal back. A loop error wins over a restore error.
pub fn run_app(app: &mut App) -> Result<()> {
    let mut session = TerminalSession::start()?;
    let outcome = session.run(app);
    let restored = session.restore();
    outcome.and(restored)
}
