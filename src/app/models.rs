use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::fmt;

pub type TodoId = i64;

// Maximum length of a title, in characters
pub const TITLE_MAX_LENGTH: usize = 200;

// A single persisted task.
#[derive(Debug, Clone, PartialEq)]
pub struct Todo {
    pub id: TodoId,
    pub title: String,
    pub description: String,
    pub due_date: Option<NaiveDate>,
    pub resolved: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Validated field values of a todo, ready to be written.
// Produced by the form layer; carries no id and no timestamps.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TodoDraft {
    pub title: String,
    pub description: String,
    pub due_date: Option<NaiveDate>,
    pub resolved: bool,
}

impl Todo {
    // A todo is overdue when it is unresolved and its due date lies strictly before `today`
    pub fn is_overdue_on(&self, today: NaiveDate) -> bool {
        match self.due_date {
            Some(due_date) if !self.resolved => due_date < today,
            _ => false,
        }
    }

    pub fn is_overdue(&self) -> bool {
        self.is_overdue_on(today())
    }
}

impl fmt::Display for Todo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)
    }
}

// The calendar date every overdue check is made against
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

// Timestamp for a mutation of a row last touched at `previous`.
// Never equal to or older than `previous`, even if the clock did not move.
pub fn next_timestamp(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = Utc::now();
    if now > previous {
        now
    } else {
        previous + Duration::microseconds(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn todo_due(due_date: Option<NaiveDate>, resolved: bool) -> Todo {
        let now = Utc::now();
        Todo {
            id: 1,
            title: "Buy milk".to_string(),
            description: String::new(),
            due_date,
            resolved,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn overdue_when_due_yesterday_and_unresolved() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let yesterday = today.pred_opt().unwrap();
        assert!(todo_due(Some(yesterday), false).is_overdue_on(today));
    }

    #[test]
    fn resolved_todo_is_never_overdue() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let yesterday = today.pred_opt().unwrap();
        assert!(!todo_due(Some(yesterday), true).is_overdue_on(today));
    }

    #[test]
    fn todo_without_due_date_is_not_overdue() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        assert!(!todo_due(None, false).is_overdue_on(today));
    }

    #[test]
    fn todo_due_today_or_later_is_not_overdue() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        assert!(!todo_due(Some(today), false).is_overdue_on(today));
        assert!(!todo_due(today.succ_opt(), false).is_overdue_on(today));
    }

    #[test]
    fn is_overdue_uses_current_date() {
        let yesterday = today().pred_opt().unwrap();
        assert!(todo_due(Some(yesterday), false).is_overdue());
        assert!(!todo_due(Some(today()), false).is_overdue());
    }

    #[test]
    fn display_is_the_title() {
        assert_eq!(todo_due(None, false).to_string(), "Buy milk");
    }

    #[test]
    fn next_timestamp_strictly_increases() {
        let future = Utc::now() + Duration::hours(1);
        let next = next_timestamp(future);
        assert!(next > future);
        assert!(next_timestamp(next) > next);
    }
}
