use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{prelude::*, widgets::*};
use std::{
    io,
    time::{Duration, Instant},
};

use crate::app::admin::{todo_edit::*, todo_list::*};
use crate::app::storage::Storage;

pub struct App<'a> {
    pub items: TodoList<'a>,
    pub todo_edit_dialog_state: TodoEditDialogState,
    pub storage: &'a Storage,
}

impl<'a> App<'a> {
    pub fn new(storage: &'a Storage) -> App<'a> {
        App {
            items: TodoList::with_items_from_storage(storage),
            todo_edit_dialog_state: TodoEditDialogState::default(),
            storage,
        }
    }
}

pub fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    mut app: App,
    tick_rate: Duration,
) -> io::Result<()> {
    let mut last_tick = Instant::now();
    loop {
        terminal.draw(|f| draw_ui(f, &mut app))?;
        let timeout = tick_rate.saturating_sub(last_tick.elapsed());

        if crossterm::event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && handle_key(&mut app, key.code) {
                    return Ok(());
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }
    }
}

// Routes one key press to the active mode; returns true when the admin should quit
fn handle_key(app: &mut App, code: KeyCode) -> bool {
    if app.todo_edit_dialog_state.dialog_active {
        // Handle input for the todo edit dialog
        match code {
            KeyCode::Down | KeyCode::Tab => app.todo_edit_dialog_state.move_cursor_down(),
            KeyCode::Up | KeyCode::BackTab => app.todo_edit_dialog_state.move_cursor_up(),
            KeyCode::Esc => app.todo_edit_dialog_state.close(),
            KeyCode::Enter => {
                app.todo_edit_dialog_state.save_todo(app.storage);
                app.items.update_items();
            }
            KeyCode::Left => app.todo_edit_dialog_state.move_cursor_left(),
            KeyCode::Right => app.todo_edit_dialog_state.move_cursor_right(),
            KeyCode::Backspace => app.todo_edit_dialog_state.delete_char(),
            KeyCode::Char(to_insert) => app.todo_edit_dialog_state.input(to_insert),
            _ => {}
        }
    } else if app.items.search_active {
        match code {
            KeyCode::Enter => app.items.finish_search(true),
            KeyCode::Esc => app.items.finish_search(false),
            KeyCode::Backspace => app.items.search_delete_char(),
            KeyCode::Char(c) => app.items.search_input(c),
            _ => {}
        }
    } else if app.items.pending_delete.is_some() {
        match code {
            KeyCode::Char('y') => app.items.confirm_delete(),
            _ => app.items.cancel_delete(),
        }
    } else {
        // Handle input for the todo list navigation, filtering and state change
        match code {
            KeyCode::Char('q') => return true,
            KeyCode::Char('x') => app.items.request_delete(),
            KeyCode::Left => app.items.unselect(),
            KeyCode::Down => app.items.next(),
            KeyCode::Up => app.items.previous(),
            KeyCode::Char('a') => app.todo_edit_dialog_state.create_a_new_todo(),
            KeyCode::Char('e') => {
                if let Some(todo) = app.items.get_selected() {
                    app.todo_edit_dialog_state.edit_todo(todo);
                }
            }
            KeyCode::Char('/') => app.items.start_search(),
            KeyCode::Char('r') => app.items.cycle_resolved_filter(),
            KeyCode::Char('d') => app.items.cycle_date_filter(),
            KeyCode::Char('y') => app.items.drill_year(),
            KeyCode::Char('m') => app.items.drill_month(),
            KeyCode::Char('h') => app.items.reset_drill(),
            KeyCode::Enter | KeyCode::Char(' ') => app.items.toggle_resolved(),
            _ => {}
        }
    }
    false
}

// Draws the whole user interface
fn draw_ui(f: &mut Frame, app: &mut App) {
    // Create two chunks of screen in 60-40 ratio
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(f.size());

    // DRAW LEFT PART
    // Create a List from the matching todos and highlight the currently selected one
    let todo_list = List::new(get_list_items_ui(app.items.items.as_slice()))
        .block(Block::default().borders(Borders::ALL).title("TODOs"))
        .highlight_style(
            Style::default()
                .bg(Color::LightGreen)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol(">> ");

    f.render_stateful_widget(todo_list, chunks[0], &mut app.items.state);

    // DRAW RIGHT PART
    if app.todo_edit_dialog_state.dialog_active {
        let create_or_edit_todo = Paragraph::new(get_todo_edit_ui(app))
            .block(Block::new().title("Add/Edit TODO").borders(Borders::ALL))
            .style(Style::new().white());

        f.render_widget(create_or_edit_todo, chunks[1]);
    } else {
        // If not editing, display filters, instructions and statistics stacked vertically
        let right_side = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Percentage(30),
                Constraint::Percentage(40),
                Constraint::Percentage(30),
            ])
            .split(chunks[1]);

        let filters = Paragraph::new(get_filters_ui(app))
            .block(Block::new().title("Filters").borders(Borders::ALL))
            .style(Style::new().white());

        let instructions = Paragraph::new(get_instructions_ui())
            .block(Block::new().title("Commands").borders(Borders::ALL))
            .style(Style::new().white());

        let statistics = Paragraph::new(get_statistics_ui(app))
            .block(Block::new().title("Statistics").borders(Borders::ALL))
            .style(Style::new().white());

        f.render_widget(filters, right_side[0]);
        f.render_widget(instructions, right_side[1]);
        f.render_widget(statistics, right_side[2]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::models::TodoDraft;
    use ratatui::backend::TestBackend;

    fn storage_with_one() -> Storage {
        let storage = Storage::open_in_memory().unwrap();
        storage
            .insert_todo(&TodoDraft {
                title: "Water plants".to_string(),
                ..TodoDraft::default()
            })
            .unwrap();
        storage
    }

    #[test]
    fn keys_drive_toggle_and_delete() {
        let storage = storage_with_one();
        let mut app = App::new(&storage);

        handle_key(&mut app, KeyCode::Down);
        handle_key(&mut app, KeyCode::Enter);
        assert!(app.items.items[0].resolved);

        handle_key(&mut app, KeyCode::Char('x'));
        assert!(app.items.pending_delete.is_some());
        handle_key(&mut app, KeyCode::Char('n'));
        assert_eq!(app.items.items.len(), 1);

        handle_key(&mut app, KeyCode::Char('x'));
        handle_key(&mut app, KeyCode::Char('y'));
        assert!(app.items.items.is_empty());

        assert!(handle_key(&mut app, KeyCode::Char('q')));
    }

    #[test]
    fn keys_in_dialog_are_typed_not_commands() {
        let storage = Storage::open_in_memory().unwrap();
        let mut app = App::new(&storage);

        handle_key(&mut app, KeyCode::Char('a'));
        for c in "quiz".chars() {
            handle_key(&mut app, KeyCode::Char(c));
        }
        assert!(!handle_key(&mut app, KeyCode::Enter));
        assert!(!app.todo_edit_dialog_state.dialog_active);
        assert_eq!(app.items.items[0].title, "quiz");
    }

    #[test]
    fn draws_list_and_panels() {
        let storage = storage_with_one();
        let mut app = App::new(&storage);
        let mut terminal = Terminal::new(TestBackend::new(120, 30)).unwrap();

        terminal.draw(|f| draw_ui(f, &mut app)).unwrap();
        let buffer = terminal.backend().buffer();
        let screen: String = buffer.content().iter().map(|cell| cell.symbol.as_str()).collect();
        assert!(screen.contains("Water plants"));
        assert!(screen.contains("Statistics"));
    }
}
