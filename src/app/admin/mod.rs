// Terminal admin over the todo table: browse, search, filter, edit and delete.
// Based on https://github.com/ratatui-org/ratatui/blob/main/examples/list.rs
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use std::{io, time::Duration};

use crate::app::storage::Storage;

pub mod todo_edit;
pub mod todo_list;
pub mod ui;

// Start the admin on the current terminal; blocks until the user quits
pub fn run(storage: &Storage) -> io::Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Create an app with 250 ms tick
    let tick_rate = Duration::from_millis(250);
    let app = ui::App::new(storage);
    let res = ui::run_app(&mut terminal, app, tick_rate);

    // Restore previous terminal state after exit, even if the app failed
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    res
}
