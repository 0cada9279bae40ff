//! crates/studyhub_core/src/stats.rs
//!
//! The aggregation engine: pure, read-only summaries computed over
//! owner-scoped entity slices. Nothing here is materialized; every
//! dashboard request recomputes from the rows the store returned.

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::{Homework, StudySession, Todo};

/// How many subjects the per-subject breakdown keeps.
pub const TOP_SUBJECTS: usize = 5;

/// Completion percentage rounded to one decimal. Defined as 0 for an empty
/// set, so an account with no items never divides by zero.
pub fn completion_rate(completed: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let rate = completed as f64 / total as f64 * 100.0;
    (rate * 10.0).round() / 10.0
}

/// Total minutes across completed sessions.
pub fn total_minutes(sessions: &[StudySession]) -> i64 {
    sessions
        .iter()
        .filter(|s| s.completed)
        .map(|s| s.duration_minutes as i64)
        .sum()
}

/// Minutes from completed sessions started on the given day.
pub fn minutes_on(sessions: &[StudySession], day: NaiveDate) -> i64 {
    sessions
        .iter()
        .filter(|s| s.completed && s.started_at.date_naive() == day)
        .map(|s| s.duration_minutes as i64)
        .sum()
}

/// Minutes from completed sessions started on or after the given day.
pub fn minutes_since(sessions: &[StudySession], day: NaiveDate) -> i64 {
    sessions
        .iter()
        .filter(|s| s.completed && s.started_at.date_naive() >= day)
        .map(|s| s.duration_minutes as i64)
        .sum()
}

/// One row of the per-subject breakdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectTotal {
    pub subject: String,
    pub total_minutes: i64,
}

/// Summed completed minutes grouped by subject, descending, truncated to
/// `TOP_SUBJECTS`. Ties keep the first-seen subject ahead.
pub fn top_subjects(sessions: &[StudySession]) -> Vec<SubjectTotal> {
    let mut totals: Vec<SubjectTotal> = Vec::new();
    for session in sessions.iter().filter(|s| s.completed) {
        match totals.iter_mut().find(|t| t.subject == session.subject) {
            Some(entry) => entry.total_minutes += session.duration_minutes as i64,
            None => totals.push(SubjectTotal {
                subject: session.subject.clone(),
                total_minutes: session.duration_minutes as i64,
            }),
        }
    }
    totals.sort_by(|a, b| b.total_minutes.cmp(&a.total_minutes));
    totals.truncate(TOP_SUBJECTS);
    totals
}

/// The progress dashboard payload.
#[derive(Debug, Clone, Serialize)]
pub struct ProgressReport {
    pub total_study_minutes: i64,
    pub week_study_minutes: i64,
    pub today_study_minutes: i64,
    pub total_homework: usize,
    pub completed_homework: usize,
    pub pending_homework: usize,
    pub homework_completion_rate: f64,
    pub total_todos: usize,
    pub completed_todos: usize,
    pub pending_todos: usize,
    pub todo_completion_rate: f64,
    pub total_notes: usize,
    pub study_by_subject: Vec<SubjectTotal>,
}

/// Assembles the full dashboard from one account's rows. `today` is passed
/// in so callers (and tests) control the clock.
pub fn progress_report(
    homework: &[Homework],
    todos: &[Todo],
    sessions: &[StudySession],
    total_notes: usize,
    today: NaiveDate,
) -> ProgressReport {
    let week_ago = today - chrono::Duration::days(7);

    let completed_homework = homework.iter().filter(|h| h.is_finished).count();
    let completed_todos = todos.iter().filter(|t| t.is_finished).count();

    ProgressReport {
        total_study_minutes: total_minutes(sessions),
        week_study_minutes: minutes_since(sessions, week_ago),
        today_study_minutes: minutes_on(sessions, today),
        total_homework: homework.len(),
        completed_homework,
        pending_homework: homework.len() - completed_homework,
        homework_completion_rate: completion_rate(completed_homework, homework.len()),
        total_todos: todos.len(),
        completed_todos,
        pending_todos: todos.len() - completed_todos,
        todo_completion_rate: completion_rate(completed_todos, todos.len()),
        total_notes,
        study_by_subject: top_subjects(sessions),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use uuid::Uuid;

    fn session(subject: &str, minutes: i32, days_ago: i64, completed: bool) -> StudySession {
        let started_at = Utc.with_ymd_and_hms(2026, 8, 30, 10, 0, 0).unwrap() - Duration::days(days_ago);
        StudySession {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            subject: subject.to_string(),
            duration_minutes: minutes,
            started_at,
            ended_at: completed.then(|| started_at + Duration::minutes(minutes as i64)),
            completed,
        }
    }

    fn homework_item(finished: bool) -> Homework {
        Homework {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            subject: "Math".to_string(),
            title: "Problem set".to_string(),
            description: String::new(),
            due_at: Utc::now(),
            is_finished: finished,
        }
    }

    #[test]
    fn completion_rate_handles_empty_and_full_sets() {
        assert_eq!(completion_rate(0, 0), 0.0);
        assert_eq!(completion_rate(4, 4), 100.0);
        assert_eq!(completion_rate(1, 3), 33.3);
        assert_eq!(completion_rate(2, 3), 66.7);
    }

    #[test]
    fn time_window_sums_only_count_completed_sessions() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 30).unwrap();
        let sessions = vec![
            session("Math", 25, 0, true),
            session("Math", 40, 0, false), // in progress, excluded
            session("History", 30, 3, true),
            session("Math", 60, 10, true), // outside the week window
        ];

        assert_eq!(minutes_on(&sessions, today), 25);
        assert_eq!(minutes_since(&sessions, today - Duration::days(7)), 55);
        assert_eq!(total_minutes(&sessions), 115);
    }

    #[test]
    fn top_subjects_orders_descending_and_truncates() {
        let mut sessions = vec![
            session("Math", 30, 0, true),
            session("Math", 30, 1, true),
            session("History", 45, 0, true),
            session("Art", 5, 0, true),
        ];
        for (i, subject) in ["Bio", "Chem", "Phys", "Econ"].iter().enumerate() {
            sessions.push(session(subject, 10 + i as i32, 0, true));
        }

        let totals = top_subjects(&sessions);
        assert_eq!(totals.len(), TOP_SUBJECTS);
        assert_eq!(totals[0].subject, "Math");
        assert_eq!(totals[0].total_minutes, 60);
        assert_eq!(totals[1].subject, "History");
        // Strictly non-increasing from there on.
        for pair in totals.windows(2) {
            assert!(pair[0].total_minutes >= pair[1].total_minutes);
        }
    }

    #[test]
    fn progress_report_counts_pending_items() {
        let homework = vec![homework_item(true), homework_item(false), homework_item(false)];
        let todos: Vec<Todo> = Vec::new();
        let sessions = vec![session("Math", 25, 0, true)];
        let today = NaiveDate::from_ymd_opt(2026, 8, 30).unwrap();

        let report = progress_report(&homework, &todos, &sessions, 2, today);

        assert_eq!(report.total_homework, 3);
        assert_eq!(report.pending_homework, 2);
        assert_eq!(report.homework_completion_rate, 33.3);
        // Zero todos must not fault the rate.
        assert_eq!(report.todo_completion_rate, 0.0);
        assert_eq!(report.total_notes, 2);
        assert_eq!(report.today_study_minutes, 25);
    }
}
