use chrono::{NaiveDate, Utc};
use now::DateTimeNow;
use ratatui::style::{Color, Style, Stylize};
use ratatui::text::{Line, Span};
use ratatui::widgets::*;

use crate::app::error::StorageError;
use crate::app::models::{today, Todo, TodoId};
use crate::app::storage::{AdminQuery, DateDrill, Storage};

use super::ui::App;

// The admin's view of the todo table: current query, selection and pending delete
pub struct TodoList<'a> {
    pub state: ListState,
    pub items: Vec<Todo>,
    pub query: AdminQuery,
    pub search_active: bool,
    pub pending_delete: Option<TodoId>,
    pub status: Option<String>,
    storage: &'a Storage,
}

impl<'a> TodoList<'a> {
    // Initialize a todo list with items from the database
    pub fn with_items_from_storage(storage: &'a Storage) -> TodoList<'a> {
        let mut list = TodoList {
            state: ListState::default(),
            items: Vec::new(),
            query: AdminQuery::default(),
            search_active: false,
            pending_delete: None,
            status: None,
            storage,
        };
        list.update_items();
        list
    }

    // Refresh the items of this list with the items matching the current query
    pub fn update_items(&mut self) {
        match self.storage.admin_todos(&self.query, today()) {
            Ok(items) => {
                self.items = items;
                if let Some(i) = self.state.selected() {
                    if i >= self.items.len() {
                        self.state.select(self.items.len().checked_sub(1));
                    }
                }
            }
            Err(error) => self.report(error),
        }
    }

    fn report(&mut self, error: StorageError) {
        self.status = Some(format!("Error: {error}"));
    }

    // Move the selection to the next item
    pub fn next(&mut self) {
        let i = match self.state.selected() {
            Some(i) => {
                if self.items.is_empty() || i >= self.items.len() - 1 {
                    0
                } else {
                    i + 1
                }
            }
            None => 0,
        };
        self.state.select(Some(i));
    }

    // Move the selection to the previous item
    pub fn previous(&mut self) {
        let i = match self.state.selected() {
            Some(i) => {
                if self.items.is_empty() {
                    0
                } else if i == 0 {
                    self.items.len() - 1
                } else {
                    i - 1
                }
            }
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn unselect(&mut self) {
        self.state.select(None);
    }

    // Get the selected todo
    pub fn get_selected(&self) -> Option<&Todo> {
        self.state.selected().and_then(|i| self.items.get(i))
    }

    // Flip resolved of the selected todo; save in database
    pub fn toggle_resolved(&mut self) {
        let Some(id) = self.get_selected().map(|todo| todo.id) else {
            return;
        };
        match self.storage.toggle_resolved(id) {
            Ok(todo) => {
                let state = if todo.resolved { "resolved" } else { "reopened" };
                self.status = Some(format!("\"{}\" {state}", todo.title));
            }
            Err(error) => self.report(error),
        }
        self.update_items();
    }

    // First step of a delete: remember the selected todo and ask for confirmation
    pub fn request_delete(&mut self) {
        self.pending_delete = self.get_selected().map(|todo| todo.id);
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
    }

    // Second step of a delete: remove the remembered todo for good
    pub fn confirm_delete(&mut self) {
        let Some(id) = self.pending_delete.take() else {
            return;
        };
        match self.storage.delete_todo(id) {
            Ok(()) => self.status = Some(format!("Deleted todo {id}")),
            Err(error) => self.report(error),
        }
        self.update_items();
    }

    pub fn cycle_resolved_filter(&mut self) {
        self.query.resolved = self.query.resolved.next();
        self.update_items();
    }

    pub fn cycle_date_filter(&mut self) {
        self.query.due = self.query.due.next();
        self.update_items();
    }

    // Step to the next year that has due dates; past the last one the hierarchy resets
    pub fn drill_year(&mut self) {
        let years = match self.storage.date_hierarchy(None) {
            Ok(years) => years,
            Err(error) => return self.report(error),
        };
        let years: Vec<i32> = years.into_iter().filter_map(|y| i32::try_from(y).ok()).collect();
        let year = next_in(&years, self.query.drill.year);
        self.query.drill = DateDrill { year, month: None };
        self.update_items();
    }

    // Step to the next month of the drilled-into year that has due dates
    pub fn drill_month(&mut self) {
        let Some(year) = self.query.drill.year else {
            self.status = Some("Choose a year first".to_string());
            return;
        };
        let months = match self.storage.date_hierarchy(Some(year)) {
            Ok(months) => months,
            Err(error) => return self.report(error),
        };
        self.query.drill.month = next_in(&months, self.query.drill.month);
        self.update_items();
    }

    pub fn reset_drill(&mut self) {
        self.query.drill = DateDrill::default();
        self.update_items();
    }

    pub fn start_search(&mut self) {
        self.search_active = true;
    }

    pub fn search_input(&mut self, c: char) {
        self.query.search.push(c);
        self.update_items();
    }

    pub fn search_delete_char(&mut self) {
        self.query.search.pop();
        self.update_items();
    }

    // Leave search mode, optionally dropping the search term
    pub fn finish_search(&mut self, keep: bool) {
        self.search_active = false;
        if !keep {
            self.query.search.clear();
            self.update_items();
        }
    }

    // Get the unresolved todos
    pub fn get_unresolved(&self) -> Vec<&Todo> {
        self.items.iter().filter(|todo| !todo.resolved).collect()
    }

    // Get the overdue todos
    pub fn get_overdue(&self, today: NaiveDate) -> Vec<&Todo> {
        self.items
            .iter()
            .filter(|todo| todo.is_overdue_on(today))
            .collect()
    }

    // Get the unresolved todos due from today until the end of the week
    pub fn get_due_this_week(&self) -> Vec<&Todo> {
        let today = today();
        let end_of_week = Utc::now().end_of_week().date_naive();
        self.items
            .iter()
            .filter(|todo| {
                !todo.resolved
                    && todo
                        .due_date
                        .is_some_and(|due| due >= today && due <= end_of_week)
            })
            .collect()
    }
}

// The value after `current` in `values`, `None` after the last one
fn next_in<T: Copy + PartialEq>(values: &[T], current: Option<T>) -> Option<T> {
    match current {
        None => values.first().copied(),
        Some(current) => {
            let position = values.iter().position(|value| *value == current)?;
            values.get(position + 1).copied()
        }
    }
}

// Build the UI (list) for the todo table
pub fn get_list_items_ui(todos: &[Todo]) -> Vec<ListItem<'_>> {
    let today = today();
    todos
        .iter()
        .map(|todo| {
            let title_color = if todo.is_overdue_on(today) {
                Color::Red
            } else if todo.resolved {
                Color::DarkGray
            } else {
                Color::White
            };

            let due = todo
                .due_date
                .map(|date| date.format("%d.%m.%Y").to_string())
                .unwrap_or_else(|| "-".to_string());

            let lines = vec![
                Line::from(vec![
                    Span::from(if todo.resolved { "[x] " } else { "[ ] " }),
                    Span::from(todo.title.as_str()).fg(title_color),
                ]),
                Line::from(vec![
                    Span::from(format!("    Due: {due}")),
                    Span::from(format!(
                        "  Created: {}",
                        todo.created_at.format("%d.%m.%Y %H:%M")
                    )),
                ]),
            ];
            ListItem::new(lines).style(Style::default().fg(Color::White))
        })
        .collect()
}

// Build the UI (lines) for the filter infobox
pub fn get_filters_ui<'a>(app: &'a App<'a>) -> Vec<Line<'a>> {
    let list = &app.items;
    let drill = match (list.query.drill.year, list.query.drill.month) {
        (None, _) => "All dates".to_string(),
        (Some(year), None) => format!("{year}"),
        (Some(year), Some(month)) => format!("{year}-{month:02}"),
    };
    let search_cursor = if list.search_active { "_" } else { "" };

    let mut lines = vec![
        Line::from(format!("Search: {}{search_cursor}", list.query.search)),
        Line::from(format!("Resolved: {}", list.query.resolved.label())),
        Line::from(format!("Due date: {}", list.query.due.label())),
        Line::from(format!("Date hierarchy: {drill}")),
    ];

    if let Some(id) = list.pending_delete {
        let title = list
            .items
            .iter()
            .find(|todo| todo.id == id)
            .map(|todo| todo.title.as_str())
            .unwrap_or_default();
        lines.push(Line::from(
            Span::from(format!("Delete \"{title}\"? y - yes, n - no")).fg(Color::Red),
        ));
    } else if let Some(status) = &list.status {
        lines.push(Line::from(Span::from(status.as_str()).fg(Color::Yellow)));
    }
    lines
}

// Build the UI (lines) for statistics infobox
pub fn get_statistics_ui<'a>(app: &'a App<'a>) -> Vec<Line<'a>> {
    vec![
        Line::from(format!("Shown todos: {}", app.items.items.len())),
        Line::from(format!("Unresolved: {}", app.items.get_unresolved().len())),
        Line::from(format!("Overdue: {}", app.items.get_overdue(today()).len())),
        Line::from(format!("Due this week: {}", app.items.get_due_this_week().len())),
    ]
}

// Build the UI (lines) for instructions infobox
pub fn get_instructions_ui<'a>() -> Vec<Line<'a>> {
    vec![
        "Enter/space - toggle resolved".into(),
        "a - add a todo, e - edit a todo".into(),
        "x - delete a todo".into(),
        "/ - search title and description".into(),
        "r - filter by resolved".into(),
        "d - filter by due date".into(),
        "y / m - browse by year / month, h - all dates".into(),
        "q - quit".into(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::models::TodoDraft;
    use crate::app::storage::ResolvedFilter;

    fn storage_with(titles: &[(&str, Option<NaiveDate>)]) -> Storage {
        let storage = Storage::open_in_memory().unwrap();
        for (title, due_date) in titles {
            storage
                .insert_todo(&TodoDraft {
                    title: title.to_string(),
                    due_date: *due_date,
                    ..TodoDraft::default()
                })
                .unwrap();
        }
        storage
    }

    fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[test]
    fn selection_wraps_around() {
        let storage = storage_with(&[("a", None), ("b", None)]);
        let mut list = TodoList::with_items_from_storage(&storage);
        assert!(list.get_selected().is_none());

        list.next();
        list.next();
        list.next();
        assert_eq!(list.state.selected(), Some(0));
        list.previous();
        assert_eq!(list.state.selected(), Some(1));
        list.unselect();
        assert!(list.get_selected().is_none());
    }

    #[test]
    fn toggle_updates_database_and_filter() {
        let storage = storage_with(&[("only", None)]);
        let mut list = TodoList::with_items_from_storage(&storage);
        list.next();
        list.toggle_resolved();
        assert!(list.items[0].resolved);

        list.cycle_resolved_filter();
        assert_eq!(list.query.resolved, ResolvedFilter::Resolved);
        assert_eq!(list.items.len(), 1);
        list.cycle_resolved_filter();
        assert!(list.items.is_empty());
    }

    #[test]
    fn delete_requires_confirmation() {
        let storage = storage_with(&[("keep", None), ("drop", None)]);
        let mut list = TodoList::with_items_from_storage(&storage);
        list.next();
        let doomed = list.get_selected().unwrap().id;

        list.request_delete();
        list.cancel_delete();
        list.confirm_delete();
        assert_eq!(list.items.len(), 2);

        list.request_delete();
        assert_eq!(list.pending_delete, Some(doomed));
        list.confirm_delete();
        assert_eq!(list.items.len(), 1);
        assert!(list.items.iter().all(|todo| todo.id != doomed));
        assert!(storage.get_todo(doomed).is_err());
    }

    #[test]
    fn search_narrows_and_clears() {
        let storage = storage_with(&[("Buy milk", None), ("Walk dog", None)]);
        let mut list = TodoList::with_items_from_storage(&storage);
        list.start_search();
        for c in "MILK".chars() {
            list.search_input(c);
        }
        assert_eq!(list.items.len(), 1);
        list.search_delete_char();
        assert_eq!(list.query.search, "MIL");

        list.finish_search(false);
        assert!(!list.search_active);
        assert_eq!(list.items.len(), 2);
    }

    #[test]
    fn date_hierarchy_drills_years_and_months() {
        let storage = storage_with(&[
            ("a", date(2023, 5, 1)),
            ("b", date(2024, 2, 1)),
            ("c", date(2024, 9, 1)),
            ("d", None),
        ]);
        let mut list = TodoList::with_items_from_storage(&storage);
        assert_eq!(list.items.len(), 4);

        list.drill_month();
        assert_eq!(list.status.as_deref(), Some("Choose a year first"));

        list.drill_year();
        assert_eq!(list.query.drill.year, Some(2023));
        assert_eq!(list.items.len(), 1);
        list.drill_year();
        assert_eq!(list.query.drill.year, Some(2024));
        list.drill_month();
        assert_eq!(list.query.drill.month, Some(2));
        assert_eq!(list.items.len(), 1);
        list.drill_month();
        list.drill_month();
        assert_eq!(list.query.drill.month, None);
        assert_eq!(list.items.len(), 2);

        list.reset_drill();
        assert_eq!(list.items.len(), 4);
    }

    #[test]
    fn statistics_count_overdue_and_unresolved() {
        let storage = storage_with(&[("late", date(2020, 1, 1)), ("undated", None)]);
        let list = TodoList::with_items_from_storage(&storage);
        assert_eq!(list.get_unresolved().len(), 2);
        assert_eq!(list.get_overdue(today()).len(), 1);
        assert!(list.get_due_this_week().is_empty());
    }

    #[test]
    fn next_in_cycles_to_none() {
        assert_eq!(next_in(&[1, 2], None), Some(1));
        assert_eq!(next_in(&[1, 2], Some(1)), Some(2));
        assert_eq!(next_in(&[1, 2], Some(2)), None);
        assert_eq!(next_in::<u32>(&[], None), None);
    }
}
