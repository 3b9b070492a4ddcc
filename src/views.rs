use chrono::{Datelike, Duration, NaiveDate};

use crate::domain::Task;

pub const DAY_PREVIEW_CAP: usize = 3;

/// The "today" projection: active task ids split into three ordered groups,
/// plus the aggregates the header shows. Groups that end up empty stay in the
/// struct; renderers decide whether to draw them.
#[derive(Debug, Clone, Default)]
pub struct TodayView {
    pub due_now: Vec<String>,
    pub future_due: Vec<String>,
    pub no_due_date: Vec<String>,
    pub task_count: usize,
    pub estimated_hours: f64,
}

impl TodayView {
    pub fn is_empty(&self) -> bool {
        self.task_count == 0
    }
}

pub fn today_view(tasks: &[Task], today: NaiveDate) -> TodayView {
    let mut due_now: Vec<&Task> = Vec::new();
    let mut future_due: Vec<&Task> = Vec::new();
    let mut no_due_date: Vec<&Task> = Vec::new();

    for task in tasks.iter().filter(|task| task.is_active()) {
        match task.due_date {
            Some(due_date) if due_date <= today => due_now.push(task),
            Some(_) => future_due.push(task),
            None => no_due_date.push(task),
        }
    }

    // Stable sorts, so insertion order settles any tie.
    due_now.sort_by_key(|task| task.due_date);
    future_due.sort_by_key(|task| task.due_date);
    no_due_date.sort_by_key(|task| task.priority.rank());

    let task_count = due_now.len() + future_due.len() + no_due_date.len();
    let estimated_hours: f64 = due_now
        .iter()
        .chain(&future_due)
        .chain(&no_due_date)
        .map(|task| task.estimated_hours)
        .sum();

    TodayView {
        due_now: ids(&due_now),
        future_due: ids(&future_due),
        no_due_date: ids(&no_due_date),
        task_count,
        estimated_hours,
    }
}

fn ids(tasks: &[&Task]) -> Vec<String> {
    tasks.iter().map(|task| task.id.clone()).collect()
}

#[derive(Debug, Clone)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub in_month: bool,
    pub is_today: bool,
    /// Up to `DAY_PREVIEW_CAP` active task ids due this day, creation order.
    pub preview: Vec<String>,
    /// How many matching tasks did not fit the preview.
    pub more: usize,
}

#[derive(Debug, Clone)]
pub struct MonthGrid {
    pub year: i32,
    pub month: u32,
    pub days: Vec<CalendarDay>,
}

impl MonthGrid {
    pub fn weeks(&self) -> impl Iterator<Item = &[CalendarDay]> {
        self.days.chunks(7)
    }
}

/// Builds the Sunday-started month grid. Leading and trailing cells carry
/// real dates from the neighboring months so every row is exactly seven
/// cells; only in-month cells get previews or the today mark.
pub fn calendar_view(tasks: &[Task], year: i32, month: u32, today: NaiveDate) -> MonthGrid {
    let first = NaiveDate::from_ymd_opt(year, month, 1).expect("first of month must be valid");
    let leading = first.weekday().num_days_from_sunday() as i64;
    let day_count = days_in_month(year, month);
    let in_current_month = today.year() == year && today.month() == month;

    let mut days = Vec::new();
    for offset in (1..=leading).rev() {
        days.push(CalendarDay {
            date: first - Duration::days(offset),
            in_month: false,
            is_today: false,
            preview: Vec::new(),
            more: 0,
        });
    }

    for day_number in 1..=day_count {
        let date = NaiveDate::from_ymd_opt(year, month, day_number)
            .expect("calendar day must be valid");
        let due_here: Vec<&Task> = tasks
            .iter()
            .filter(|task| task.is_active() && task.due_date == Some(date))
            .collect();
        let more = due_here.len().saturating_sub(DAY_PREVIEW_CAP);
        let preview = due_here
            .iter()
            .take(DAY_PREVIEW_CAP)
            .map(|task| task.id.clone())
            .collect();

        days.push(CalendarDay {
            date,
            in_month: true,
            is_today: in_current_month && date == today,
            preview,
            more,
        });
    }

    let mut trailing_date =
        NaiveDate::from_ymd_opt(year, month, day_count).expect("last of month must be valid");
    while days.len() % 7 != 0 {
        trailing_date = trailing_date.succ_opt().expect("next day should exist");
        days.push(CalendarDay {
            date: trailing_date,
            in_month: false,
            is_today: false,
            preview: Vec::new(),
            more: 0,
        });
    }

    MonthGrid { year, month, days }
}

/// The selected-date panel: every task due that day, completed ones
/// included, in storage order.
pub fn tasks_due_on(tasks: &[Task], date: NaiveDate) -> Vec<String> {
    tasks
        .iter()
        .filter(|task| task.due_date == Some(date))
        .map(|task| task.id.clone())
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct CategoryTasks {
    pub active: Vec<String>,
    pub completed: Vec<String>,
}

pub fn category_tasks(tasks: &[Task], category_id: &str) -> CategoryTasks {
    let mut split = CategoryTasks::default();
    for task in tasks.iter().filter(|task| task.category_id == category_id) {
        if task.is_active() {
            split.active.push(task.id.clone());
        } else {
            split.completed.push(task.id.clone());
        }
    }
    split
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    let first_of_next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1).expect("next year date should be valid")
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1).expect("next month date should be valid")
    };
    (first_of_next - Duration::days(1)).day()
}

pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1)
        .expect("first day of month must be valid")
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};

    use crate::domain::Planner;

    use super::{
        DAY_PREVIEW_CAP, calendar_view, category_tasks, days_in_month, tasks_due_on, today_view,
    };

    fn day(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("test date should be valid")
    }

    fn iso(date: NaiveDate) -> String {
        date.format("%Y-%m-%d").to_string()
    }

    fn planner_with_category(today: NaiveDate) -> (Planner, String) {
        let mut planner = Planner::new(today);
        planner
            .sign_in("ada@example.com", "hunter2")
            .expect("sign in should succeed");
        let category_id = planner
            .add_category("Everything", "lavender")
            .expect("category should be created");
        (planner, category_id)
    }

    fn add_task_due(
        planner: &mut Planner,
        category_id: &str,
        title: &str,
        due: Option<NaiveDate>,
        today: NaiveDate,
    ) -> String {
        let task_id = planner
            .add_task(category_id, title, today)
            .expect("task should be created");
        if let Some(due) = due {
            planner
                .set_due_date(&task_id, &iso(due), today)
                .expect("due date should parse");
        }
        task_id
    }

    #[test]
    fn groups_come_out_in_order_with_sorted_members() {
        let today = day(2026, 3, 10);
        let (mut planner, category_id) = planner_with_category(today);

        // Insert out of order on purpose: sorting, not insertion, must decide.
        let due_tomorrow = add_task_due(
            &mut planner,
            &category_id,
            "Tomorrow",
            Some(day(2026, 3, 11)),
            today,
        );
        let no_date_low = add_task_due(&mut planner, &category_id, "Someday low", None, today);
        let due_today = add_task_due(
            &mut planner,
            &category_id,
            "Today",
            Some(day(2026, 3, 10)),
            today,
        );
        let no_date_high = add_task_due(&mut planner, &category_id, "Someday high", None, today);
        let overdue = add_task_due(
            &mut planner,
            &category_id,
            "Yesterday",
            Some(day(2026, 3, 9)),
            today,
        );

        planner.cycle_priority(&no_date_high);
        planner.cycle_priority(&no_date_high);

        let view = today_view(&planner.tasks, today);
        assert_eq!(view.due_now, vec![overdue.clone(), due_today.clone()]);
        assert_eq!(view.future_due, vec![due_tomorrow.clone()]);
        assert_eq!(view.no_due_date, vec![no_date_high, no_date_low]);
        assert_eq!(view.task_count, 5);
    }

    #[test]
    fn aggregates_span_all_groups_and_skip_completed_tasks() {
        let today = day(2026, 3, 10);
        let (mut planner, category_id) = planner_with_category(today);

        let dated = add_task_due(
            &mut planner,
            &category_id,
            "Dated",
            Some(day(2026, 3, 12)),
            today,
        );
        let dateless = add_task_due(&mut planner, &category_id, "Dateless", None, today);
        let finished = add_task_due(&mut planner, &category_id, "Finished", None, today);

        planner
            .set_estimate(&dated, "1.5", today)
            .expect("estimate should parse");
        planner
            .set_estimate(&dateless, "2", today)
            .expect("estimate should parse");
        planner
            .set_estimate(&finished, "8", today)
            .expect("estimate should parse");
        planner.toggle_complete(&finished, Utc::now());

        let view = today_view(&planner.tasks, today);
        assert_eq!(view.task_count, 2);
        assert_eq!(view.estimated_hours, 3.5);
        assert!(!view.is_empty());

        let nothing = today_view(&[], today);
        assert!(nothing.is_empty());
        assert_eq!(nothing.estimated_hours, 0.0);
    }

    #[test]
    fn thirty_day_month_starting_wednesday_gets_three_leading_cells() {
        // June 2022: starts on a Wednesday, 30 days.
        let today = day(2022, 6, 15);
        let grid = calendar_view(&[], 2022, 6, today);

        assert_eq!(grid.days.len(), 35);
        assert_eq!(grid.days[0].date, day(2022, 5, 29));
        assert!(!grid.days[0].in_month);
        assert!(!grid.days[2].in_month);
        assert_eq!(grid.days[3].date, day(2022, 6, 1));
        assert!(grid.days[3].in_month);
        assert_eq!(grid.days[33].date, day(2022, 7, 1));
        assert!(!grid.days[33].in_month);
        assert_eq!(grid.weeks().count(), 5);
        assert!(grid.weeks().all(|week| week.len() == 7));
    }

    #[test]
    fn exactly_one_cell_is_marked_today_and_only_in_the_right_month() {
        let today = day(2022, 6, 15);
        let grid = calendar_view(&[], 2022, 6, today);
        let marked: Vec<_> = grid.days.iter().filter(|cell| cell.is_today).collect();
        assert_eq!(marked.len(), 1);
        assert_eq!(marked[0].date, today);

        let other_month = calendar_view(&[], 2022, 7, today);
        assert!(other_month.days.iter().all(|cell| !cell.is_today));
    }

    #[test]
    fn day_previews_cap_at_three_with_a_remainder_count() {
        let today = day(2026, 3, 10);
        let (mut planner, category_id) = planner_with_category(today);
        let due = day(2026, 3, 12);

        let mut created = Vec::new();
        for title in ["A", "B", "C", "D", "E"] {
            created.push(add_task_due(
                &mut planner,
                &category_id,
                title,
                Some(due),
                today,
            ));
        }
        // Completed tasks disappear from the preview entirely.
        planner.toggle_complete(&created[1], Utc::now());

        let grid = calendar_view(&planner.tasks, 2026, 3, today);
        let cell = grid
            .days
            .iter()
            .find(|cell| cell.in_month && cell.date == due)
            .expect("cell for the due date should exist");

        assert_eq!(cell.preview.len(), DAY_PREVIEW_CAP);
        assert_eq!(cell.preview, vec![created[0].clone(), created[2].clone(), created[3].clone()]);
        assert_eq!(cell.more, 1);

        let quiet_cell = grid
            .days
            .iter()
            .find(|cell| cell.in_month && cell.date == day(2026, 3, 13))
            .expect("cell should exist");
        assert!(quiet_cell.preview.is_empty());
        assert_eq!(quiet_cell.more, 0);
    }

    #[test]
    fn selected_date_list_keeps_completed_tasks_and_storage_order() {
        let today = day(2026, 3, 10);
        let (mut planner, category_id) = planner_with_category(today);
        let due = day(2026, 3, 12);

        let first = add_task_due(&mut planner, &category_id, "First", Some(due), today);
        let second = add_task_due(&mut planner, &category_id, "Second", Some(due), today);
        add_task_due(&mut planner, &category_id, "Elsewhere", Some(day(2026, 3, 13)), today);
        planner.toggle_complete(&second, Utc::now());

        assert_eq!(tasks_due_on(&planner.tasks, due), vec![first, second]);
        assert!(tasks_due_on(&planner.tasks, day(2026, 3, 20)).is_empty());
    }

    #[test]
    fn category_split_separates_active_from_completed() {
        let today = day(2026, 3, 10);
        let (mut planner, category_id) = planner_with_category(today);
        let other = planner
            .add_category("Other", "sky")
            .expect("category should be created");

        let active = add_task_due(&mut planner, &category_id, "Open", None, today);
        let done = add_task_due(&mut planner, &category_id, "Done", None, today);
        add_task_due(&mut planner, &other, "Elsewhere", None, today);
        planner.toggle_complete(&done, Utc::now());

        let split = category_tasks(&planner.tasks, &category_id);
        assert_eq!(split.active, vec![active]);
        assert_eq!(split.completed, vec![done]);
    }

    #[test]
    fn month_lengths_respect_leap_years() {
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2025, 2), 28);
        assert_eq!(days_in_month(2026, 12), 31);
        assert_eq!(days_in_month(2026, 6), 30);
    }
}
