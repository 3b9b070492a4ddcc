use std::fmt::{Display, Formatter};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use chrono::NaiveDate;

use crate::domain::Planner;

#[derive(Debug)]
pub enum StorageError {
    Io(std::io::Error),
    Decode(serde_json::Error),
    Encode(serde_json::Error),
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::Io(err) => write!(f, "io error: {err}"),
            StorageError::Decode(err) => write!(f, "failed to parse snapshot: {err}"),
            StorageError::Encode(err) => write!(f, "failed to encode snapshot: {err}"),
        }
    }
}

impl std::error::Error for StorageError {}

/// Loads the whole snapshot. A missing or empty file means a first run, not
/// an error.
pub fn load_snapshot(path: &Path, today: NaiveDate) -> Result<Planner, StorageError> {
    let raw = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Planner::new(today)),
        Err(err) => return Err(StorageError::Io(err)),
    };

    if raw.trim().is_empty() {
        return Ok(Planner::new(today));
    }

    serde_json::from_str(&raw).map_err(StorageError::Decode)
}

/// Serializes and writes the whole snapshot in one go; there is no partial
/// update path.
pub fn save_snapshot(path: &Path, planner: &Planner) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(StorageError::Io)?;
        }
    }

    let blob = serde_json::to_string_pretty(planner).map_err(StorageError::Encode)?;
    fs::write(path, blob).map_err(StorageError::Io)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use std::fs;
    use std::path::PathBuf;

    use crate::domain::Planner;

    use super::{load_snapshot, save_snapshot};

    fn day(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("test date should be valid")
    }

    #[test]
    fn round_trips_the_whole_snapshot() {
        let today = day(2026, 3, 10);
        let mut planner = Planner::new(today);
        planner
            .sign_in("ada@example.com", "hunter2")
            .expect("sign in should succeed");
        let category_id = planner
            .add_category("Home", "pink")
            .expect("category should be created");
        let task_id = planner
            .add_task(&category_id, "Water the plants", today)
            .expect("task should be created");
        planner
            .set_due_date(&task_id, "2026-03-12", today)
            .expect("due date should parse");
        planner.selected_date = Some(day(2026, 3, 12));

        let path = temp_file("pastel_priority_roundtrip.json");
        save_snapshot(&path, &planner).expect("save should succeed");
        let loaded = load_snapshot(&path, today).expect("load should succeed");

        assert_eq!(loaded.categories.len(), 1);
        assert_eq!(loaded.tasks.len(), 1);
        assert_eq!(loaded.selected_date, Some(day(2026, 3, 12)));
        let task = loaded.task(&task_id).expect("task should survive the trip");
        assert_eq!(task.due_date, Some(day(2026, 3, 12)));
        assert_eq!(
            task.priority_score,
            planner.task(&task_id).expect("task should exist").priority_score
        );
        let _ = fs::remove_file(path);
    }

    #[test]
    fn missing_file_means_a_fresh_planner() {
        let today = day(2026, 3, 10);
        let path = temp_file("pastel_priority_never_written.json");
        let _ = fs::remove_file(&path);

        let planner = load_snapshot(&path, today).expect("missing file should load fresh");
        assert!(planner.current_user.is_none());
        assert!(planner.categories.is_empty());
        assert!(planner.tasks.is_empty());
    }

    fn temp_file(name: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("{}_{}", name, std::process::id()));
        path
    }
}
