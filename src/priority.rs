use chrono::NaiveDate;

use crate::domain::Task;

/// Stand-in day distance for tasks without a date. Larger than the span
/// between any two representable `NaiveDate`s, so a dateless task always
/// scores after a dated one, while `3 * FAR_FUTURE_DAYS` still fits an `i64`
/// with room to spare.
pub const FAR_FUTURE_DAYS: i64 = 100_000_000;

/// Floor for how far overdue a task can count as. Keeps very old overdue
/// tasks from dominating the ranking without bound.
pub const OVERDUE_FLOOR_DAYS: i64 = -999;

/// Computes the urgency score for a task. Lower score = more urgent.
///
/// The due-date distance is doubled so deadline proximity outweighs the
/// start-date term, and the estimate contributes half a point per hour so it
/// only breaks ties between similarly dated tasks.
pub fn priority_score(
    due_date: Option<NaiveDate>,
    start_by: Option<NaiveDate>,
    estimated_hours: f64,
    today: NaiveDate,
) -> i64 {
    let days_until_due = due_date
        .map(|due| (due - today).num_days().max(OVERDUE_FLOOR_DAYS))
        .unwrap_or(FAR_FUTURE_DAYS);

    // A start date in the past contributes nothing, not a negative term.
    let days_until_start = start_by
        .map(|start| (start - today).num_days().max(0))
        .unwrap_or(FAR_FUTURE_DAYS);

    ((days_until_due * 2 + days_until_start) as f64 + estimated_hours / 2.0).round() as i64
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Urgency {
    NoDate,
    Overdue,
    DueToday,
    Recurring,
    Upcoming,
}

/// Buckets a task for display. Due-date checks win over the recurring flag;
/// a task with neither date lands in `NoDate` regardless of anything else.
pub fn classify(task: &Task, today: NaiveDate) -> Urgency {
    if task.due_date.is_none() && task.start_by.is_none() {
        return Urgency::NoDate;
    }

    if let Some(due_date) = task.due_date {
        if due_date < today {
            return Urgency::Overdue;
        }
        if due_date == today {
            return Urgency::DueToday;
        }
    }

    if task.is_recurring {
        return Urgency::Recurring;
    }

    Urgency::Upcoming
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate};

    use crate::domain::Planner;

    use super::{FAR_FUTURE_DAYS, OVERDUE_FLOOR_DAYS, Urgency, classify, priority_score};

    fn day(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("test date should be valid")
    }

    #[test]
    fn earlier_due_dates_score_as_more_urgent() {
        let today = day(2026, 3, 10);
        let overdue = priority_score(Some(today - Duration::days(1)), None, 0.0, today);
        let due_today = priority_score(Some(today), None, 0.0, today);
        let next_week = priority_score(Some(today + Duration::days(5)), None, 0.0, today);

        assert!(overdue < due_today);
        assert!(due_today < next_week);
    }

    #[test]
    fn dateless_tasks_rank_after_any_dated_task() {
        let today = day(2026, 3, 10);
        let dateless = priority_score(None, None, 0.0, today);
        assert_eq!(dateless, FAR_FUTURE_DAYS * 3);

        let far_out = priority_score(Some(day(2200, 12, 31)), None, 0.0, today);
        assert!(far_out < dateless);
    }

    #[test]
    fn overdue_distance_is_floored() {
        let today = day(2026, 3, 10);
        let ancient = priority_score(Some(today - Duration::days(10_000)), None, 0.0, today);
        let at_floor = priority_score(
            Some(today + Duration::days(OVERDUE_FLOOR_DAYS)),
            None,
            0.0,
            today,
        );
        assert_eq!(ancient, at_floor);
    }

    #[test]
    fn past_start_date_contributes_zero() {
        let today = day(2026, 3, 10);
        let due = Some(today + Duration::days(4));
        let started_long_ago = priority_score(due, Some(today - Duration::days(30)), 0.0, today);
        let starts_today = priority_score(due, Some(today), 0.0, today);
        assert_eq!(started_long_ago, starts_today);
    }

    #[test]
    fn estimate_nudges_ties_between_equal_dates() {
        let today = day(2026, 3, 10);
        let due = Some(today + Duration::days(2));
        let start = Some(today + Duration::days(1));
        let light = priority_score(due, start, 1.0, today);
        let heavy = priority_score(due, start, 9.0, today);
        assert!(light < heavy);
        assert_eq!(heavy - light, 4);
    }

    #[test]
    fn recomputation_is_idempotent() {
        let today = day(2026, 3, 10);
        let first = priority_score(Some(day(2026, 3, 14)), Some(day(2026, 3, 11)), 2.5, today);
        let second = priority_score(Some(day(2026, 3, 14)), Some(day(2026, 3, 11)), 2.5, today);
        assert_eq!(first, second);
    }

    #[test]
    fn classify_covers_every_bucket() {
        let today = day(2026, 3, 10);
        let mut planner = Planner::new(today);
        planner
            .sign_in("ada@example.com", "hunter2")
            .expect("sign in should succeed");
        let category_id = planner
            .add_category("Chores", "mint")
            .expect("category should be created");
        let task_id = planner
            .add_task(&category_id, "Laundry", today)
            .expect("task should be created");

        let snapshot =
            |planner: &Planner| planner.task(&task_id).expect("task should exist").clone();

        assert_eq!(classify(&snapshot(&planner), today), Urgency::NoDate);

        planner
            .set_due_date(&task_id, "2026-03-09", today)
            .expect("due date should parse");
        assert_eq!(classify(&snapshot(&planner), today), Urgency::Overdue);

        planner
            .set_due_date(&task_id, "2026-03-10", today)
            .expect("due date should parse");
        assert_eq!(classify(&snapshot(&planner), today), Urgency::DueToday);

        planner
            .set_due_date(&task_id, "2026-03-20", today)
            .expect("due date should parse");
        assert_eq!(classify(&snapshot(&planner), today), Urgency::Upcoming);

        planner.toggle_recurring(&task_id);
        assert_eq!(classify(&snapshot(&planner), today), Urgency::Recurring);

        // Due today wins over the recurring flag.
        planner
            .set_due_date(&task_id, "2026-03-10", today)
            .expect("due date should parse");
        assert_eq!(classify(&snapshot(&planner), today), Urgency::DueToday);
    }
}
