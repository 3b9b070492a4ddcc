use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rand::{Rng, distributions::Alphanumeric, thread_rng};
use serde::{Deserialize, Serialize};

use crate::priority::priority_score;

const ID_LEN: usize = 8;

pub const PALETTE_COLORS: [&str; 8] = [
    "pink", "peach", "lemon", "mint", "sky", "lavender", "blush", "sage",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Active,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn next(self) -> Self {
        match self {
            Priority::Low => Priority::Medium,
            Priority::Medium => Priority::High,
            Priority::High => Priority::Low,
        }
    }

    /// Sort rank for the no-due-date group: high before medium before low.
    pub fn rank(self) -> u8 {
        match self {
            Priority::High => 0,
            Priority::Medium => 1,
            Priority::Low => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewKind {
    Categories,
    Today,
    Calendar,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub color: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub user_id: String,
    pub category_id: String,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub due_date: Option<NaiveDate>,
    pub start_by: Option<NaiveDate>,
    pub estimated_hours: f64,
    pub priority: Priority,
    pub priority_score: i64,
    pub is_recurring: bool,
    #[serde(default)]
    pub recurrence_days: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn is_active(&self) -> bool {
        self.status == TaskStatus::Active
    }
}

#[derive(Debug, Clone)]
pub struct CategoryRemoval {
    pub category: Category,
    pub tasks_removed: usize,
}

/// The whole application snapshot: one user, their categories and tasks, and
/// the view state the renderer left behind. Loaded at startup, overwritten
/// wholesale after every mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Planner {
    pub current_user: Option<User>,
    pub categories: Vec<Category>,
    pub tasks: Vec<Task>,
    pub current_view: ViewKind,
    pub current_month: NaiveDate,
    pub selected_date: Option<NaiveDate>,
}

impl Planner {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            current_user: None,
            categories: Vec::new(),
            tasks: Vec::new(),
            current_view: ViewKind::Categories,
            current_month: NaiveDate::from_ymd_opt(today.year(), today.month(), 1)
                .expect("first of month must be valid"),
            selected_date: None,
        }
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn category(&self, id: &str) -> Option<&Category> {
        self.categories.iter().find(|category| category.id == id)
    }

    fn task_mut(&mut self, id: &str) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|task| task.id == id)
    }

    /// Locally simulated authentication: any non-empty credential pair is
    /// accepted and the display name is the email's local part.
    pub fn sign_in(&mut self, email: &str, password: &str) -> Result<&User, String> {
        let email = required_trimmed(email, "email")?;
        if password.trim().is_empty() {
            return Err("password is required".to_string());
        }

        let name = email.split('@').next().unwrap_or("").to_string();
        let user = User {
            id: generate_id(),
            email,
            name,
        };
        Ok(self.current_user.insert(user))
    }

    /// Signing out discards the user's data along with the session.
    pub fn sign_out(&mut self) {
        self.current_user = None;
        self.categories.clear();
        self.tasks.clear();
    }

    pub fn add_category(&mut self, name: &str, color: &str) -> Result<String, String> {
        let user_id = self.signed_in_user_id()?;
        let name = required_trimmed(name, "category name")?;
        if !PALETTE_COLORS.contains(&color) {
            return Err(format!(
                "unknown color '{color}', expected one of: {}",
                PALETTE_COLORS.join(", ")
            ));
        }

        let id = generate_id();
        self.categories.push(Category {
            id: id.clone(),
            user_id,
            name,
            color: color.to_string(),
            created_at: Utc::now(),
        });
        Ok(id)
    }

    /// Quick-add: a fresh active task with no dates, no estimate, and a low
    /// priority tag. The score still gets computed so the record is never
    /// read with a stale derived field.
    pub fn add_task(
        &mut self,
        category_id: &str,
        title: &str,
        today: NaiveDate,
    ) -> Result<String, String> {
        let user_id = self.signed_in_user_id()?;
        if self.category(category_id).is_none() {
            return Err(format!("category not found: {category_id}"));
        }
        let title = required_trimmed(title, "task title")?;

        let id = generate_id();
        self.tasks.push(Task {
            id: id.clone(),
            user_id,
            category_id: category_id.to_string(),
            title,
            description: None,
            status: TaskStatus::Active,
            due_date: None,
            start_by: None,
            estimated_hours: 0.0,
            priority: Priority::Low,
            priority_score: priority_score(None, None, 0.0, today),
            is_recurring: false,
            recurrence_days: Vec::new(),
            created_at: Utc::now(),
            completed_at: None,
        });
        Ok(id)
    }

    pub fn edit_task_title(&mut self, task_id: &str, title: &str) -> Result<Option<&Task>, String> {
        let title = required_trimmed(title, "task title")?;
        let Some(task) = self.task_mut(task_id) else {
            return Ok(None);
        };
        task.title = title;
        Ok(self.task(task_id))
    }

    /// Sets or clears the due date from raw text input. An empty string
    /// clears the date; anything else must be a real `YYYY-MM-DD` calendar
    /// date or the task is left untouched.
    pub fn set_due_date(
        &mut self,
        task_id: &str,
        raw: &str,
        today: NaiveDate,
    ) -> Result<Option<&Task>, String> {
        let due_date = parse_date_input(raw)?;
        let Some(task) = self.task_mut(task_id) else {
            return Ok(None);
        };
        task.due_date = due_date;
        rescore(task, today);
        Ok(self.task(task_id))
    }

    pub fn set_start_by(
        &mut self,
        task_id: &str,
        raw: &str,
        today: NaiveDate,
    ) -> Result<Option<&Task>, String> {
        let start_by = parse_date_input(raw)?;
        let Some(task) = self.task_mut(task_id) else {
            return Ok(None);
        };
        task.start_by = start_by;
        rescore(task, today);
        Ok(self.task(task_id))
    }

    /// Non-numeric input is rejected; a negative estimate is clamped to zero
    /// rather than rejected.
    pub fn set_estimate(
        &mut self,
        task_id: &str,
        raw: &str,
        today: NaiveDate,
    ) -> Result<Option<&Task>, String> {
        let hours = raw
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|hours| hours.is_finite())
            .ok_or_else(|| {
                format!("invalid estimate '{}', expected a number of hours", raw.trim())
            })?;
        let Some(task) = self.task_mut(task_id) else {
            return Ok(None);
        };
        task.estimated_hours = hours.max(0.0);
        rescore(task, today);
        Ok(self.task(task_id))
    }

    pub fn cycle_priority(&mut self, task_id: &str) -> Option<&Task> {
        let task = self.task_mut(task_id)?;
        task.priority = task.priority.next();
        self.task(task_id)
    }

    pub fn toggle_recurring(&mut self, task_id: &str) -> Option<&Task> {
        let task = self.task_mut(task_id)?;
        task.is_recurring = !task.is_recurring;
        self.task(task_id)
    }

    /// Flips completion and stamps/clears `completed_at`. The priority score
    /// is deliberately left alone: completion is not an urgency change.
    pub fn toggle_complete(&mut self, task_id: &str, now: DateTime<Utc>) -> Option<&Task> {
        let task = self.task_mut(task_id)?;
        match task.status {
            TaskStatus::Active => {
                task.status = TaskStatus::Completed;
                task.completed_at = Some(now);
            }
            TaskStatus::Completed => {
                task.status = TaskStatus::Active;
                task.completed_at = None;
            }
        }
        self.task(task_id)
    }

    pub fn delete_task(&mut self, task_id: &str) -> Option<Task> {
        let index = self.tasks.iter().position(|task| task.id == task_id)?;
        Some(self.tasks.remove(index))
    }

    /// Removes a category and every task that referenced it in one step, so
    /// no orphaned task can ever be observed.
    pub fn delete_category(&mut self, category_id: &str) -> Option<CategoryRemoval> {
        let index = self
            .categories
            .iter()
            .position(|category| category.id == category_id)?;
        let category = self.categories.remove(index);
        let before = self.tasks.len();
        self.tasks.retain(|task| task.category_id != category_id);
        Some(CategoryRemoval {
            category,
            tasks_removed: before - self.tasks.len(),
        })
    }

    fn signed_in_user_id(&self) -> Result<String, String> {
        self.current_user
            .as_ref()
            .map(|user| user.id.clone())
            .ok_or_else(|| "sign in first".to_string())
    }
}

fn rescore(task: &mut Task, today: NaiveDate) {
    task.priority_score = priority_score(
        task.due_date,
        task.start_by,
        task.estimated_hours,
        today,
    );
}

fn parse_date_input(raw: &str) -> Result<Option<NaiveDate>, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if !is_iso_date_shaped(trimmed) {
        return Err(format!("invalid date '{trimmed}', expected YYYY-MM-DD"));
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| format!("'{trimmed}' is not a real calendar date"))
}

fn is_iso_date_shaped(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(index, byte)| match index {
            4 | 7 => *byte == b'-',
            _ => byte.is_ascii_digit(),
        })
}

fn required_trimmed(value: &str, field_name: &str) -> Result<String, String> {
    let value = value.trim();
    if value.is_empty() {
        Err(format!("{field_name} is required"))
    } else {
        Ok(value.to_string())
    }
}

pub fn generate_id() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(ID_LEN)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};

    use crate::priority::priority_score;

    use super::{Planner, Priority, TaskStatus};

    fn day(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("test date should be valid")
    }

    fn signed_in_planner(today: NaiveDate) -> Planner {
        let mut planner = Planner::new(today);
        planner
            .sign_in("ada@example.com", "hunter2")
            .expect("sign in should succeed");
        planner
    }

    fn planner_with_task(today: NaiveDate) -> (Planner, String) {
        let mut planner = signed_in_planner(today);
        let category_id = planner
            .add_category("Errands", "peach")
            .expect("category should be created");
        let task_id = planner
            .add_task(&category_id, "Buy stamps", today)
            .expect("task should be created");
        (planner, task_id)
    }

    #[test]
    fn sign_in_accepts_any_credentials_and_derives_name() {
        let mut planner = Planner::new(day(2026, 3, 10));
        let user = planner
            .sign_in("grace@example.com", "anything")
            .expect("sign in should succeed");
        assert_eq!(user.name, "grace");
        assert_eq!(user.email, "grace@example.com");

        assert!(planner.sign_in("", "pw").is_err());
        assert!(planner.sign_in("x@y.z", "   ").is_err());
    }

    #[test]
    fn sign_out_discards_session_data() {
        let today = day(2026, 3, 10);
        let (mut planner, _) = planner_with_task(today);
        planner.sign_out();
        assert!(planner.current_user.is_none());
        assert!(planner.categories.is_empty());
        assert!(planner.tasks.is_empty());
    }

    #[test]
    fn add_category_validates_palette_and_session() {
        let today = day(2026, 3, 10);
        let mut planner = Planner::new(today);
        assert!(planner.add_category("Home", "mint").is_err());

        planner
            .sign_in("ada@example.com", "pw")
            .expect("sign in should succeed");
        assert!(planner.add_category("Home", "chartreuse").is_err());
        assert!(planner.add_category("   ", "mint").is_err());

        let id = planner
            .add_category("Home", "mint")
            .expect("category should be created");
        let category = planner.category(&id).expect("category should exist");
        assert_eq!(category.color, "mint");
        assert_eq!(
            category.user_id,
            planner.current_user.as_ref().expect("user should be set").id
        );
    }

    #[test]
    fn quick_added_task_gets_defaults_and_a_score() {
        let today = day(2026, 3, 10);
        let (planner, task_id) = planner_with_task(today);
        let task = planner.task(&task_id).expect("task should exist");

        assert_eq!(task.status, TaskStatus::Active);
        assert_eq!(task.priority, Priority::Low);
        assert!(task.due_date.is_none());
        assert!(task.start_by.is_none());
        assert_eq!(task.estimated_hours, 0.0);
        assert_eq!(task.priority_score, priority_score(None, None, 0.0, today));
    }

    #[test]
    fn add_task_rejects_blank_titles_and_unknown_categories() {
        let today = day(2026, 3, 10);
        let mut planner = signed_in_planner(today);
        let category_id = planner
            .add_category("Errands", "sky")
            .expect("category should be created");

        assert!(planner.add_task(&category_id, "   ", today).is_err());
        assert!(planner.add_task("missing", "Valid title", today).is_err());
    }

    #[test]
    fn edit_title_trims_and_rejects_empty() {
        let today = day(2026, 3, 10);
        let (mut planner, task_id) = planner_with_task(today);

        let task = planner
            .edit_task_title(&task_id, "  Buy more stamps  ")
            .expect("edit should succeed")
            .expect("task should be found");
        assert_eq!(task.title, "Buy more stamps");

        assert!(planner.edit_task_title(&task_id, "   ").is_err());
        let untouched = planner
            .edit_task_title("missing", "Whatever")
            .expect("missing task should be a no-op");
        assert!(untouched.is_none());
    }

    #[test]
    fn set_due_date_rescores_and_clears() {
        let today = day(2026, 3, 10);
        let (mut planner, task_id) = planner_with_task(today);

        let task = planner
            .set_due_date(&task_id, "2026-03-14", today)
            .expect("date should parse")
            .expect("task should be found");
        assert_eq!(task.due_date, Some(day(2026, 3, 14)));
        assert_eq!(
            task.priority_score,
            priority_score(Some(day(2026, 3, 14)), None, 0.0, today)
        );

        let cleared = planner
            .set_due_date(&task_id, "", today)
            .expect("empty input should clear")
            .expect("task should be found");
        assert!(cleared.due_date.is_none());
        assert_eq!(cleared.priority_score, priority_score(None, None, 0.0, today));
    }

    #[test]
    fn malformed_due_dates_leave_the_task_unchanged() {
        let today = day(2026, 3, 10);
        let (mut planner, task_id) = planner_with_task(today);
        planner
            .set_due_date(&task_id, "2026-03-14", today)
            .expect("date should parse");

        // Lexically valid shape but not a real calendar date.
        assert!(planner.set_due_date(&task_id, "2024-13-40", today).is_err());
        assert!(planner.set_due_date(&task_id, "14/03/2026", today).is_err());
        assert!(planner.set_due_date(&task_id, "2026-3-4", today).is_err());

        let task = planner.task(&task_id).expect("task should exist");
        assert_eq!(task.due_date, Some(day(2026, 3, 14)));
    }

    #[test]
    fn set_estimate_rejects_garbage_and_clamps_negatives() {
        let today = day(2026, 3, 10);
        let (mut planner, task_id) = planner_with_task(today);

        assert!(planner.set_estimate(&task_id, "soon", today).is_err());
        assert!(planner.set_estimate(&task_id, "NaN", today).is_err());

        let clamped = planner
            .set_estimate(&task_id, "-5", today)
            .expect("negative estimate should clamp")
            .expect("task should be found");
        assert_eq!(clamped.estimated_hours, 0.0);

        let task = planner
            .set_estimate(&task_id, "2.5", today)
            .expect("estimate should parse")
            .expect("task should be found");
        assert_eq!(task.estimated_hours, 2.5);
        assert_eq!(task.priority_score, priority_score(None, None, 2.5, today));
    }

    #[test]
    fn cycle_priority_wraps_around() {
        let today = day(2026, 3, 10);
        let (mut planner, task_id) = planner_with_task(today);

        let medium = planner.cycle_priority(&task_id).expect("task should exist");
        assert_eq!(medium.priority, Priority::Medium);
        let high = planner.cycle_priority(&task_id).expect("task should exist");
        assert_eq!(high.priority, Priority::High);
        let low = planner.cycle_priority(&task_id).expect("task should exist");
        assert_eq!(low.priority, Priority::Low);

        assert!(planner.cycle_priority("missing").is_none());
    }

    #[test]
    fn toggle_complete_round_trips_and_keeps_the_score() {
        let today = day(2026, 3, 10);
        let (mut planner, task_id) = planner_with_task(today);
        let now = Utc.with_ymd_and_hms(2026, 3, 10, 9, 0, 0).unwrap();
        let original_score = planner
            .task(&task_id)
            .expect("task should exist")
            .priority_score;

        let completed = planner
            .toggle_complete(&task_id, now)
            .expect("task should exist");
        assert_eq!(completed.status, TaskStatus::Completed);
        assert_eq!(completed.completed_at, Some(now));

        let active = planner
            .toggle_complete(&task_id, now)
            .expect("task should exist");
        assert_eq!(active.status, TaskStatus::Active);
        assert!(active.completed_at.is_none());
        assert_eq!(active.priority_score, original_score);
    }

    #[test]
    fn delete_category_cascades_to_its_tasks() {
        let today = day(2026, 3, 10);
        let mut planner = signed_in_planner(today);
        let doomed = planner
            .add_category("Doomed", "blush")
            .expect("category should be created");
        let kept = planner
            .add_category("Kept", "sage")
            .expect("category should be created");
        planner
            .add_task(&doomed, "First", today)
            .expect("task should be created");
        planner
            .add_task(&doomed, "Second", today)
            .expect("task should be created");
        let survivor = planner
            .add_task(&kept, "Survivor", today)
            .expect("task should be created");

        let removal = planner
            .delete_category(&doomed)
            .expect("category should be removed");
        assert_eq!(removal.tasks_removed, 2);
        assert!(planner.category(&doomed).is_none());
        assert!(planner.tasks.iter().all(|task| task.category_id != doomed));
        assert!(planner.task(&survivor).is_some());

        assert!(planner.delete_category("missing").is_none());
    }

    #[test]
    fn delete_task_is_a_no_op_for_unknown_ids() {
        let today = day(2026, 3, 10);
        let (mut planner, task_id) = planner_with_task(today);

        assert!(planner.delete_task("missing").is_none());
        let removed = planner.delete_task(&task_id).expect("task should be removed");
        assert_eq!(removed.id, task_id);
        assert!(planner.task(&task_id).is_none());
    }
}
