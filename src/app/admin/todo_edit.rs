use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use crate::app::forms::{FormErrors, TodoForm};
use crate::app::models::{Todo, TodoId};
use crate::app::storage::Storage;
use derivative::Derivative;

use super::ui::App;

// Field rows of the dialog, top to bottom
const TITLE_ROW: usize = 0;
const DESCRIPTION_ROW: usize = 1;
const RESOLVED_ROW: usize = 2;
const DUE_DATE_ROW: usize = 3;
const LAST_ROW: usize = DUE_DATE_ROW;

// State object for the todo edit dialog
// Keeps track of the state of the dialog and the content of the todo being edited
#[derive(Derivative)]
#[derivative(Default)]
pub struct TodoEditDialogState {
    pub dialog_active: bool,
    todo_id: Option<TodoId>,
    content: Option<TodoEditDialogContent>,
    errors: Option<FormErrors>,
    error_message: Option<String>,
    // (char column, row)
    cursor_position: Option<(usize, usize)>,
}

// Current content of the todo being edited/created
#[derive(Derivative)]
#[derivative(Default)]
struct TodoEditDialogContent {
    title: String,
    description: String,
    resolved: bool,
    due_date: String,
}

// Refer to https://stackoverflow.com/a/66609806
impl<'a> Default for &'a TodoEditDialogContent {
    fn default() -> &'a TodoEditDialogContent {
        static VALUE: TodoEditDialogContent = TodoEditDialogContent {
            title: String::new(),
            description: String::new(),
            resolved: false,
            due_date: String::new(),
        };
        &VALUE
    }
}

impl TodoEditDialogContent {
    fn as_form(&self) -> TodoForm {
        TodoForm {
            title: self.title.clone(),
            description: self.description.clone(),
            due_date: self.due_date.clone(),
            resolved: self.resolved.then(|| "on".to_string()),
        }
    }

    fn text_at_row_mut(&mut self, row: usize) -> Option<&mut String> {
        match row {
            TITLE_ROW => Some(&mut self.title),
            DESCRIPTION_ROW => Some(&mut self.description),
            DUE_DATE_ROW => Some(&mut self.due_date),
            _ => None,
        }
    }
}

impl TodoEditDialogState {
    // Opens the dialog and prepares to accept an input for the new todo
    pub fn create_a_new_todo(&mut self) {
        self.open(None, TodoEditDialogContent::default());
    }

    // Opens the dialog and prepares to accept an input for the existing todo
    pub fn edit_todo(&mut self, todo: &Todo) {
        let form = TodoForm::from_todo(todo);
        self.open(
            Some(todo.id),
            TodoEditDialogContent {
                title: form.title,
                description: form.description,
                resolved: todo.resolved,
                due_date: form.due_date,
            },
        );
    }

    fn open(&mut self, todo_id: Option<TodoId>, content: TodoEditDialogContent) {
        self.dialog_active = true;
        self.todo_id = todo_id;
        self.cursor_position = Some((content.title.chars().count(), TITLE_ROW));
        self.content = Some(content);
        self.errors = None;
        self.error_message = None;
    }

    pub fn close(&mut self) {
        self.dialog_active = false;
    }

    fn cursor(&self) -> (usize, usize) {
        self.cursor_position.unwrap_or((0, TITLE_ROW))
    }

    // Move the cursor one row BELOW the current one.
    // The column is clamped to the length of the new row.
    pub fn move_cursor_down(&mut self) {
        let (column, row) = self.cursor();
        let row = (row + 1).min(LAST_ROW);
        self.cursor_position = Some((column.min(self.row_length(row)), row));
    }

    // Move the cursor one row ABOVE the current one
    pub fn move_cursor_up(&mut self) {
        let (column, row) = self.cursor();
        let row = row.saturating_sub(1);
        self.cursor_position = Some((column.min(self.row_length(row)), row));
    }

    pub fn move_cursor_left(&mut self) {
        let (column, row) = self.cursor();
        self.cursor_position = Some((column.saturating_sub(1), row));
    }

    pub fn move_cursor_right(&mut self) {
        let (column, row) = self.cursor();
        self.cursor_position = Some(((column + 1).min(self.row_length(row)), row));
    }

    // Number of chars in the given row; the checkbox row has none
    fn row_length(&self, row: usize) -> usize {
        let content = self.content.as_ref().unwrap_or_default();
        match row {
            TITLE_ROW => content.title.chars().count(),
            DESCRIPTION_ROW => content.description.chars().count(),
            DUE_DATE_ROW => content.due_date.chars().count(),
            _ => 0,
        }
    }

    // Delete the char before the cursor
    pub fn delete_char(&mut self) {
        let (column, row) = self.cursor();
        if column == 0 {
            return;
        }

        let Some(text) = self
            .content
            .as_mut()
            .and_then(|content| content.text_at_row_mut(row))
        else {
            return;
        };
        if let Some((index, _)) = text.char_indices().nth(column - 1) {
            text.remove(index);
        }

        self.move_cursor_left();
    }

    // Handles the input of a char: typed into text rows, toggles the checkbox row
    pub fn input(&mut self, to_insert: char) {
        let (column, row) = self.cursor();
        let Some(content) = self.content.as_mut() else {
            return;
        };

        if row == RESOLVED_ROW {
            match to_insert {
                ' ' | 'x' => content.resolved = !content.resolved,
                'y' => content.resolved = true,
                'n' => content.resolved = false,
                _ => {}
            }
            return;
        }

        if let Some(text) = content.text_at_row_mut(row) {
            let index = text
                .char_indices()
                .nth(column)
                .map(|(index, _)| index)
                .unwrap_or(text.len());
            text.insert(index, to_insert);
            self.move_cursor_right();
        }
    }

    // Validates the dialog content and saves the todo to the database.
    // The dialog stays open while there are errors.
    pub fn save_todo(&mut self, storage: &Storage) {
        let form = self.content.as_ref().unwrap_or_default().as_form();
        let draft = match form.validate() {
            Ok(draft) => draft,
            Err(errors) => {
                self.errors = Some(errors);
                return;
            }
        };

        let result = match self.todo_id {
            Some(id) => storage.update_todo(id, &draft),
            None => storage.insert_todo(&draft),
        };

        match result {
            Ok(_) => {
                self.errors = None;
                self.error_message = None;
                self.dialog_active = false;
            }
            Err(error) => self.error_message = Some(format!("Could not save: {error}")),
        }
    }
}

// Returns the UI content for the todo edit dialog
pub fn get_todo_edit_ui<'a>(app: &'a App<'a>) -> Vec<Line<'a>> {
    const GRAY_TEXT: Style = Style::new().fg(Color::Rgb(62, 62, 62));
    const WHITE_TEXT: Style = Style::new().fg(Color::White);
    const BLACK_ON_WHITE: Style = Style::new().fg(Color::Black).bg(Color::White);
    const RED_TEXT: Style = Style::new().fg(Color::Red);
    let header = Style::new().fg(Color::White).add_modifier(Modifier::BOLD);

    let dialog = &app.todo_edit_dialog_state;
    let content = dialog.content.as_ref().unwrap_or_default();
    let (column, cursor_row) = dialog.cursor();

    struct TextDialogInputLine<'v> {
        prefix: &'static str,
        placeholder: &'static str,
        value: &'v str,
        field: &'static str,
    }

    let text_line = |row: usize| match row {
        TITLE_ROW => TextDialogInputLine {
            prefix: "Title:       ",
            placeholder: "Enter TODO title",
            value: content.title.as_str(),
            field: "title",
        },
        DESCRIPTION_ROW => TextDialogInputLine {
            prefix: "Description: ",
            placeholder: "Optional description",
            value: content.description.as_str(),
            field: "description",
        },
        _ => TextDialogInputLine {
            prefix: "Due date:    ",
            placeholder: "2024-01-31",
            value: content.due_date.as_str(),
            field: "due_date",
        },
    };

    let mut text = vec![Line::from(Span::styled("Basic information", header))];

    for row in 0..=LAST_ROW {
        if row == RESOLVED_ROW {
            text.push(Line::raw(""));
            text.push(Line::from(Span::styled("Status & dates", header)));
            let mark = if content.resolved { "[x]" } else { "[ ]" };
            let style = if cursor_row == RESOLVED_ROW {
                BLACK_ON_WHITE
            } else {
                WHITE_TEXT
            };
            text.push(Line::from(vec![
                Span::styled("Resolved:    ", WHITE_TEXT),
                Span::styled(mark, style),
            ]));
            continue;
        }

        let line = text_line(row);
        let mut spans = vec![Span::styled(line.prefix, WHITE_TEXT)];

        if line.value.is_empty() {
            // If the line is empty, a placeholder is displayed
            if cursor_row == row {
                spans.push(Span::styled(
                    line.placeholder.chars().take(1).collect::<String>(),
                    BLACK_ON_WHITE,
                ));
                spans.push(Span::styled(
                    line.placeholder.chars().skip(1).collect::<String>(),
                    GRAY_TEXT,
                ));
            } else {
                spans.push(Span::styled(line.placeholder, GRAY_TEXT));
            }
        } else if cursor_row == row {
            // All chars are white, except for the one at the cursor position which is highlighted
            spans.push(Span::styled(
                line.value.chars().take(column).collect::<String>(),
                WHITE_TEXT,
            ));
            spans.push(Span::styled(
                line.value.chars().skip(column).take(1).collect::<String>(),
                BLACK_ON_WHITE,
            ));
            spans.push(Span::styled(
                line.value.chars().skip(column + 1).collect::<String>(),
                WHITE_TEXT,
            ));
            if column == line.value.chars().count() {
                spans.push(Span::styled(" ", BLACK_ON_WHITE));
            }
        } else {
            spans.push(Span::styled(line.value, WHITE_TEXT));
        }
        text.push(Line::from(spans));

        if let Some(message) = dialog.errors.as_ref().and_then(|errors| errors.get(line.field)) {
            text.push(Line::from(Span::styled(format!("             {message}"), RED_TEXT)));
        }
    }

    text.push(Line::raw(""));

    // Display the storage error if there is one
    if let Some(error_message) = &dialog.error_message {
        text.push(Line::from(Span::styled(error_message.as_str(), RED_TEXT)));
        text.push(Line::raw(""));
    }

    text.push(Line::from(Span::styled(
        "Enter - save, Esc - cancel, space - toggle resolved",
        WHITE_TEXT,
    )));

    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::forms::REQUIRED;
    use crate::app::models::TodoDraft;
    use crate::app::storage::ListFilter;
    use chrono::NaiveDate;

    fn type_text(dialog: &mut TodoEditDialogState, text: &str) {
        for c in text.chars() {
            dialog.input(c);
        }
    }

    #[test]
    fn new_todo_is_saved_after_validation() {
        let storage = Storage::open_in_memory().unwrap();
        let mut dialog = TodoEditDialogState::default();
        dialog.create_a_new_todo();

        dialog.save_todo(&storage);
        assert!(dialog.dialog_active);
        assert_eq!(dialog.errors.as_ref().unwrap().get("title"), Some(REQUIRED));

        type_text(&mut dialog, "Buy milk");
        dialog.move_cursor_down();
        dialog.move_cursor_down();
        dialog.input(' ');
        dialog.move_cursor_down();
        type_text(&mut dialog, "2024-01-01");
        dialog.save_todo(&storage);
        assert!(!dialog.dialog_active);

        let todos = storage.list_todos(ListFilter::default()).unwrap();
        assert_eq!(todos.len(), 1);
        assert_eq!(todos[0].title, "Buy milk");
        assert!(todos[0].resolved);
        assert_eq!(todos[0].due_date, NaiveDate::from_ymd_opt(2024, 1, 1));
    }

    #[test]
    fn editing_updates_the_existing_todo() {
        let storage = Storage::open_in_memory().unwrap();
        let todo = storage
            .insert_todo(&TodoDraft {
                title: "Caf\u{e9}".to_string(),
                ..TodoDraft::default()
            })
            .unwrap();

        let mut dialog = TodoEditDialogState::default();
        dialog.edit_todo(&todo);
        // Cursor starts after the last char; multi-byte chars are handled per char
        dialog.delete_char();
        type_text(&mut dialog, "e au lait");
        dialog.save_todo(&storage);

        assert!(!dialog.dialog_active);
        let stored = storage.get_todo(todo.id).unwrap();
        assert_eq!(stored.title, "Cafe au lait");
        assert_eq!(stored.created_at, todo.created_at);
    }

    #[test]
    fn invalid_date_keeps_dialog_open() {
        let storage = Storage::open_in_memory().unwrap();
        let mut dialog = TodoEditDialogState::default();
        dialog.create_a_new_todo();
        type_text(&mut dialog, "Dated");
        for _ in 0..LAST_ROW {
            dialog.move_cursor_down();
        }
        type_text(&mut dialog, "someday");
        dialog.save_todo(&storage);

        assert!(dialog.dialog_active);
        assert!(dialog.errors.as_ref().unwrap().get("due_date").is_some());
        assert!(storage.list_todos(ListFilter::default()).unwrap().is_empty());
    }

    #[test]
    fn cursor_stays_inside_the_dialog() {
        let mut dialog = TodoEditDialogState::default();
        dialog.create_a_new_todo();
        dialog.move_cursor_up();
        dialog.move_cursor_left();
        assert_eq!(dialog.cursor(), (0, TITLE_ROW));

        type_text(&mut dialog, "ab");
        dialog.move_cursor_right();
        assert_eq!(dialog.cursor(), (2, TITLE_ROW));

        for _ in 0..10 {
            dialog.move_cursor_down();
        }
        assert_eq!(dialog.cursor(), (0, DUE_DATE_ROW));
    }
}
