/// Per-connection terminal state: the shell channel and its current size
use std::ops::RangeInclusive;

use tracing::{debug, info, warn};

use crate::pty::{PtyError, RemoteShell};

pub const COLS_RANGE: RangeInclusive<i64> = 10..=500;
pub const ROWS_RANGE: RangeInclusive<i64> = 5..=200;

pub struct TerminalSession {
    shell: Box<dyn RemoteShell>,
    cols: u16,
    rows: u16,
    alive: bool,
}

impl TerminalSession {
    pub fn new(shell: Box<dyn RemoteShell>, cols: u16, rows: u16) -> Self {
        Self {
            shell,
            cols,
            rows,
            alive: true,
        }
    }

    pub fn size(&self) -> (u16, u16) {
        (self.cols, self.rows)
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn shell_mut(&mut self) -> &mut dyn RemoteShell {
        self.shell.as_mut()
    }

    /// Apply a resize request.
    ///
    /// Out-of-range values leave the stored size untouched and return `Ok(false)`.
    pub async fn apply_resize(&mut self, cols: i64, rows: i64) -> Result<bool, PtyError> {
        if !COLS_RANGE.contains(&cols) || !ROWS_RANGE.contains(&rows) {
            debug!("Ignoring out-of-range resize {}x{}", cols, rows);
            return Ok(false);
        }
        // both ranges fit in u16
        let (cols, rows) = (cols as u16, rows as u16);
        info!("Resizing terminal to {}x{}", cols, rows);
        self.cols = cols;
        self.rows = rows;
        self.shell.resize(cols, rows).await?;
        Ok(true)
    }

    /// Mark the session dead and release the shell; safe to call twice
    pub async fn close(&mut self) {
        if !self.alive {
            return;
        }
        self.alive = false;
        self.shell.close().await;
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        if self.alive {
            warn!("Terminal session dropped without close");
        }
    }
}
