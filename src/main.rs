mod domain;
mod logging;
mod paths;
mod priority;
mod storage;
mod ui;
mod views;

use std::error::Error;
use std::path::PathBuf;

use chrono::{Datelike, Local, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use log::info;

use crate::domain::{Planner, Task, TaskStatus};
use crate::priority::{Urgency, classify};
use crate::storage::{load_snapshot, save_snapshot};
use crate::ui::run_dashboard;
use crate::views::{calendar_view, today_view};

#[derive(Debug, Parser)]
#[command(name = "pastel-priority", about = "Pastel-flavored task and category organizer")]
struct Cli {
	#[arg(long)]
	snapshot: Option<PathBuf>,
	#[command(subcommand)]
	command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
	Init,
	Dashboard,
	Login {
		#[arg(long)]
		email: String,
		#[arg(long)]
		password: String,
	},
	Logout,
	AddCategory {
		#[arg(long)]
		name: String,
		#[arg(long)]
		color: String,
	},
	AddTask {
		#[arg(long)]
		category: String,
		#[arg(long)]
		title: String,
	},
	ListTasks,
	Today,
	Calendar {
		#[arg(long)]
		month: Option<String>,
	},
	Complete {
		#[arg(long)]
		task: String,
	},
	Due {
		#[arg(long)]
		task: String,
		#[arg(long, default_value = "")]
		date: String,
	},
	StartBy {
		#[arg(long)]
		task: String,
		#[arg(long, default_value = "")]
		date: String,
	},
	Estimate {
		#[arg(long)]
		task: String,
		#[arg(long)]
		hours: String,
	},
	Priority {
		#[arg(long)]
		task: String,
	},
	Recurring {
		#[arg(long)]
		task: String,
	},
	Edit {
		#[arg(long)]
		task: String,
		#[arg(long)]
		title: String,
	},
	DeleteTask {
		#[arg(long)]
		task: String,
	},
	DeleteCategory {
		#[arg(long)]
		category: String,
	},
}

fn main() {
	if let Err(err) = run() {
		eprintln!("error: {err}");
		std::process::exit(1);
	}
}

fn run() -> Result<(), Box<dyn Error>> {
	let cli = Cli::parse();

	let _logger = match logging::init_logging(&paths::logs_dir()) {
		Ok(handle) => Some(handle),
		Err(err) => {
			eprintln!("warning: logging disabled: {err}");
			None
		}
	};

	let snapshot_path = paths::resolve_snapshot_path(cli.snapshot);
	let today = Local::now().date_naive();
	let mut planner = load_snapshot(&snapshot_path, today)?;

	match cli.command.unwrap_or(Command::Dashboard) {
		Command::Init => {
			save_snapshot(&snapshot_path, &planner)?;
			println!("initialized snapshot at {}", snapshot_path.display());
		}
		Command::Dashboard => {
			run_dashboard(&mut planner, &snapshot_path)?;
		}
		Command::Login { email, password } => {
			let name = planner.sign_in(&email, &password)?.name.clone();
			save_snapshot(&snapshot_path, &planner)?;
			info!("signed in as {name}");
			println!("signed in as {name}");
		}
		Command::Logout => {
			planner.sign_out();
			save_snapshot(&snapshot_path, &planner)?;
			info!("signed out, local data cleared");
			println!("signed out");
		}
		Command::AddCategory { name, color } => {
			let category_id = planner.add_category(&name, &color)?;
			save_snapshot(&snapshot_path, &planner)?;
			info!("created category {category_id}");
			println!("created category {category_id}");
		}
		Command::AddTask { category, title } => {
			let task_id = planner.add_task(&category, &title, today)?;
			save_snapshot(&snapshot_path, &planner)?;
			info!("created task {task_id}");
			println!("created task {task_id}");
		}
		Command::ListTasks => {
			print_tasks(&planner, today);
		}
		Command::Today => {
			print_today(&planner, today);
		}
		Command::Calendar { month } => {
			let (year, month) = parse_month(month.as_deref(), today)?;
			print_calendar(&planner, year, month, today);
		}
		Command::Complete { task } => {
			let updated = planner
				.toggle_complete(&task, Utc::now())
				.map(|task| (task.title.clone(), task.status));
			match updated {
				Some((title, TaskStatus::Completed)) => {
					save_snapshot(&snapshot_path, &planner)?;
					println!("completed: {title}");
				}
				Some((title, TaskStatus::Active)) => {
					save_snapshot(&snapshot_path, &planner)?;
					println!("reopened: {title}");
				}
				None => println!("no such task: {task}"),
			}
		}
		Command::Due { task, date } => {
			let updated = planner
				.set_due_date(&task, &date, today)?
				.map(|task| (task.title.clone(), task.due_date));
			match updated {
				Some((title, Some(due_date))) => {
					save_snapshot(&snapshot_path, &planner)?;
					println!("{title} is now due {due_date}");
				}
				Some((title, None)) => {
					save_snapshot(&snapshot_path, &planner)?;
					println!("cleared due date for {title}");
				}
				None => println!("no such task: {task}"),
			}
		}
		Command::StartBy { task, date } => {
			let updated = planner
				.set_start_by(&task, &date, today)?
				.map(|task| (task.title.clone(), task.start_by));
			match updated {
				Some((title, Some(start_by))) => {
					save_snapshot(&snapshot_path, &planner)?;
					println!("{title} should be started by {start_by}");
				}
				Some((title, None)) => {
					save_snapshot(&snapshot_path, &planner)?;
					println!("cleared start date for {title}");
				}
				None => println!("no such task: {task}"),
			}
		}
		Command::Estimate { task, hours } => {
			let updated = planner
				.set_estimate(&task, &hours, today)?
				.map(|task| (task.title.clone(), task.estimated_hours));
			match updated {
				Some((title, estimated_hours)) => {
					save_snapshot(&snapshot_path, &planner)?;
					println!("estimated {title} at {estimated_hours}h");
				}
				None => println!("no such task: {task}"),
			}
		}
		Command::Priority { task } => {
			let updated = planner
				.cycle_priority(&task)
				.map(|task| (task.title.clone(), task.priority));
			match updated {
				Some((title, priority)) => {
					save_snapshot(&snapshot_path, &planner)?;
					println!("priority for {title}: {}", priority.label());
				}
				None => println!("no such task: {task}"),
			}
		}
		Command::Recurring { task } => {
			let updated = planner
				.toggle_recurring(&task)
				.map(|task| (task.title.clone(), task.is_recurring));
			match updated {
				Some((title, true)) => {
					save_snapshot(&snapshot_path, &planner)?;
					println!("{title} is now recurring");
				}
				Some((title, false)) => {
					save_snapshot(&snapshot_path, &planner)?;
					println!("{title} is no longer recurring");
				}
				None => println!("no such task: {task}"),
			}
		}
		Command::Edit { task, title } => {
			let updated = planner
				.edit_task_title(&task, &title)?
				.map(|task| task.title.clone());
			match updated {
				Some(title) => {
					save_snapshot(&snapshot_path, &planner)?;
					println!("renamed task to {title}");
				}
				None => println!("no such task: {task}"),
			}
		}
		Command::DeleteTask { task } => {
			match planner.delete_task(&task) {
				Some(removed) => {
					save_snapshot(&snapshot_path, &planner)?;
					info!("deleted task {}", removed.id);
					println!("deleted task: {}", removed.title);
				}
				None => println!("no such task: {task}"),
			}
		}
		Command::DeleteCategory { category } => {
			match planner.delete_category(&category) {
				Some(removal) => {
					save_snapshot(&snapshot_path, &planner)?;
					info!(
						"deleted category {} with {} task(s)",
						removal.category.id, removal.tasks_removed
					);
					println!(
						"deleted category {} and {} task(s)",
						removal.category.name, removal.tasks_removed
					);
				}
				None => println!("no such category: {category}"),
			}
		}
	}

	Ok(())
}

fn parse_month(input: Option<&str>, today: NaiveDate) -> Result<(i32, u32), Box<dyn Error>> {
	if let Some(raw) = input {
		let first = NaiveDate::parse_from_str(&format!("{raw}-01"), "%Y-%m-%d")?;
		Ok((first.year(), first.month()))
	} else {
		Ok((today.year(), today.month()))
	}
}

fn print_tasks(planner: &Planner, today: NaiveDate) {
	if planner.tasks.is_empty() {
		println!("no tasks yet");
		return;
	}

	for task in &planner.tasks {
		let status = match task.status {
			TaskStatus::Active => "active",
			TaskStatus::Completed => "done",
		};
		println!("{status} | {}", task_line(planner, task, today));
	}
}

fn print_today(planner: &Planner, today: NaiveDate) {
	let view = today_view(&planner.tasks, today);
	println!("today: {}", today.format("%A, %d %B %Y"));
	println!("{} task(s), {:.1}h estimated", view.task_count, view.estimated_hours);

	if view.is_empty() {
		println!("nothing on the list. great job!");
		return;
	}

	print_task_group(planner, "due today or overdue", &view.due_now, today);
	print_task_group(planner, "future due dates", &view.future_due, today);
	print_task_group(planner, "no due date", &view.no_due_date, today);
}

fn print_task_group(planner: &Planner, label: &str, task_ids: &[String], today: NaiveDate) {
	if task_ids.is_empty() {
		return;
	}

	println!("\n{label}:");
	for task_id in task_ids {
		if let Some(task) = planner.task(task_id) {
			println!("{}", task_line(planner, task, today));
		}
	}
}

fn print_calendar(planner: &Planner, year: i32, month: u32, today: NaiveDate) {
	let grid = calendar_view(&planner.tasks, year, month, today);
	let month_start = NaiveDate::from_ymd_opt(year, month, 1).expect("first of month must be valid");
	println!("{}", month_start.format("%B %Y"));
	println!(" Su  Mo  Tu  We  Th  Fr  Sa");

	for week in grid.weeks() {
		let mut row = String::new();
		for cell in week {
			if !cell.in_month {
				row.push_str("  . ");
				continue;
			}

			let marker = if cell.is_today {
				'*'
			} else if !cell.preview.is_empty() {
				'+'
			} else {
				' '
			};
			row.push_str(&format!("{:>3}{marker}", cell.date.day()));
		}
		println!("{row}");
	}

	let busy_days = grid
		.days
		.iter()
		.filter(|cell| cell.in_month && !cell.preview.is_empty());
	for cell in busy_days {
		let titles = cell
			.preview
			.iter()
			.filter_map(|task_id| planner.task(task_id))
			.map(|task| task.title.clone())
			.collect::<Vec<_>>()
			.join(", ");
		let more = if cell.more > 0 {
			format!(" (+{} more)", cell.more)
		} else {
			String::new()
		};
		println!("{:>2}: {titles}{more}", cell.date.day());
	}
}

fn task_line(planner: &Planner, task: &Task, today: NaiveDate) -> String {
	let category = planner
		.category(&task.category_id)
		.map(|category| category.name.clone())
		.unwrap_or_else(|| "Unknown category".to_string());
	let due = task
		.due_date
		.map(|date| format!("due {date}"))
		.unwrap_or_else(|| "no due date".to_string());
	let hours = if task.estimated_hours > 0.0 {
		format!(" | {}h", task.estimated_hours)
	} else {
		String::new()
	};

	format!(
		"{} | {} | {} | {} | {}{} | {}",
		task.id,
		urgency_tag(classify(task, today)),
		category,
		due,
		task.priority.label(),
		hours,
		task.title,
	)
}

fn urgency_tag(urgency: Urgency) -> &'static str {
	match urgency {
		Urgency::NoDate => "unplanned",
		Urgency::Overdue => "overdue",
		Urgency::DueToday => "today",
		Urgency::Recurring => "recurring",
		Urgency::Upcoming => "upcoming",
	}
}
