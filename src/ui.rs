use std::collections::HashSet;
use std::error::Error;
use std::io;
use std::path::Path;
use std::time::Duration as StdDuration;

use chrono::{Datelike, Duration, Local, NaiveDate, Utc};
use crossterm::event::{self, Event as CEvent, KeyCode, KeyEventKind};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{execute, ExecutableCommand};
use log::{info, warn};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph};
use ratatui::{Frame, Terminal};

use crate::domain::{PALETTE_COLORS, Planner, Task, ViewKind};
use crate::priority::{classify, Urgency};
use crate::storage::save_snapshot;
use crate::views::{
	calendar_view, category_tasks, first_of_month, days_in_month, tasks_due_on, today_view,
	MonthGrid, TodayView,
};

const FOCUSED_PANEL_BORDER_COLOR: Color = Color::Yellow;
const INACTIVE_PANEL_BORDER_COLOR: Color = Color::DarkGray;
const HIGHLIGHT_BACKGROUND_COLOR: Color = Color::Rgb(52, 44, 58);

pub fn run_dashboard(planner: &mut Planner, snapshot_path: &Path) -> Result<(), Box<dyn Error>> {
	enable_raw_mode()?;
	let mut stdout = io::stdout();
	stdout.execute(EnterAlternateScreen)?;
	let backend = CrosstermBackend::new(stdout);
	let mut terminal = Terminal::new(backend)?;

	info!("dashboard started");
	let result = run_event_loop(&mut terminal, planner, snapshot_path);

	disable_raw_mode()?;
	execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
	terminal.show_cursor()?;

	result
}

fn run_event_loop(
	terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
	planner: &mut Planner,
	snapshot_path: &Path,
) -> Result<(), Box<dyn Error>> {
	let mut app = App::from_planner(planner, Local::now().date_naive());
	if planner.current_user.is_none() {
		app.mode = InputMode::Prompt(PromptState::new("Email", PromptKind::LoginEmail));
	}

	loop {
		let today = Local::now().date_naive();
		let view = build_view(&app, planner, today);
		app.clamp_selection(&view);
		terminal.draw(|frame| draw_dashboard(frame, &app, planner, &view))?;

		if event::poll(StdDuration::from_millis(250))? {
			if let CEvent::Key(key) = event::read()? {
				if key.kind != KeyEventKind::Press {
					continue;
				}

				let should_quit = match &app.mode {
					InputMode::Prompt(_) => {
						handle_prompt_key(&mut app, key.code, planner, snapshot_path, today)
					}
					InputMode::Select(_) => {
						handle_select_key(&mut app, key.code, planner, snapshot_path)
					}
					InputMode::Normal => {
						handle_normal_key(&mut app, key.code, planner, snapshot_path, &view)
					}
				};

				if should_quit {
					break;
				}
			}
		}
	}

	Ok(())
}

fn draw_dashboard(frame: &mut Frame, app: &App, planner: &Planner, view: &ViewModel) {
	let layout = Layout::default()
		.direction(Direction::Vertical)
		.constraints([Constraint::Min(12), Constraint::Length(5)])
		.split(frame.area());

	let body = Layout::default()
		.direction(Direction::Horizontal)
		.constraints([
			Constraint::Percentage(30),
			Constraint::Percentage(40),
			Constraint::Percentage(30),
		])
		.split(layout[0]);

	let left = Layout::default()
		.direction(Direction::Vertical)
		.constraints([Constraint::Length(10), Constraint::Min(8)])
		.split(body[0]);

	render_calendar_panel(frame, left[0], app, &view.grid);
	render_categories_panel(frame, left[1], app, view);
	render_today_panel(frame, body[1], app, view);
	render_day_panel(frame, body[2], app, view);
	render_footer(frame, layout[1], app, planner);

	if let InputMode::Select(select) = &app.mode {
		render_select_popup(frame, select);
	}
}

fn render_calendar_panel(frame: &mut Frame, area: Rect, app: &App, grid: &MonthGrid) {
	let mut lines = Vec::new();
	lines.push(Line::from(format!(
		"{} {}",
		app.calendar_month.format("%B"),
		app.calendar_month.year()
	)));
	lines.push(Line::from("Su Mo Tu We Th Fr Sa"));

	for week in grid.weeks() {
		let mut spans = Vec::new();
		for cell in week {
			let mut style = Style::default();
			if !cell.in_month {
				style = style.fg(Color::DarkGray);
			}
			if !cell.preview.is_empty() {
				style = style.fg(Color::LightMagenta).add_modifier(Modifier::BOLD);
			}
			if cell.is_today {
				style = style.add_modifier(Modifier::UNDERLINED);
			}
			if cell.in_month && cell.date == app.selected_date {
				style = style.fg(Color::Black).bg(Color::Yellow).add_modifier(Modifier::BOLD);
			}

			spans.push(Span::styled(format!("{:>2} ", cell.date.day()), style));
		}
		lines.push(Line::from(spans));
	}

	let block = Block::default()
		.borders(Borders::ALL)
		.title("Calendar")
		.border_style(border_style(app.focus == FocusPane::Calendar));
	frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_categories_panel(frame: &mut Frame, area: Rect, app: &App, view: &ViewModel) {
	let items = view
		.category_rows
		.iter()
		.map(|row| ListItem::new(row.line.clone()))
		.collect::<Vec<_>>();

	let mut state = ListState::default();
	if !view.category_rows.is_empty() {
		state.select(Some(app.category_index.min(view.category_rows.len() - 1)));
	}

	let block = Block::default()
		.borders(Borders::ALL)
		.title("Categories")
		.border_style(border_style(app.focus == FocusPane::Categories));
	let list = List::new(if items.is_empty() {
		vec![ListItem::new("(no categories yet)")]
	} else {
		items
	})
	.block(block)
	.highlight_style(Style::default().bg(HIGHLIGHT_BACKGROUND_COLOR).add_modifier(Modifier::BOLD));

	frame.render_stateful_widget(list, area, &mut state);
}

fn render_today_panel(frame: &mut Frame, area: Rect, app: &App, view: &ViewModel) {
	let items = if view.today_rows.is_empty() {
		vec![ListItem::new("(nothing on the list. great job!)")]
	} else {
		view.today_rows
			.iter()
			.map(|row| ListItem::new(row.line.clone()))
			.collect::<Vec<_>>()
	};

	let mut state = ListState::default();
	if !view.today_rows.is_empty() {
		state.select(Some(app.today_index.min(view.today_rows.len() - 1)));
	}

	let title = format!(
		"Today | {} task(s) | {:.1}h",
		view.today.task_count, view.today.estimated_hours
	);
	let list = List::new(items)
		.block(
			Block::default()
				.borders(Borders::ALL)
				.title(title)
				.border_style(border_style(app.focus == FocusPane::Today)),
		)
		.highlight_style(Style::default().bg(HIGHLIGHT_BACKGROUND_COLOR).add_modifier(Modifier::BOLD));

	frame.render_stateful_widget(list, area, &mut state);
}

fn render_day_panel(frame: &mut Frame, area: Rect, app: &App, view: &ViewModel) {
	let lines = if view.day_lines.is_empty() {
		vec![Line::from("(no tasks for this day)")]
	} else {
		view.day_lines.clone()
	};

	let title = app.selected_date.format("%A, %d %B %Y").to_string();
	let panel = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(title));
	frame.render_widget(panel, area);
}

fn render_footer(frame: &mut Frame, area: Rect, app: &App, planner: &Planner) {
	let greeting = planner
		.current_user
		.as_ref()
		.map(|user| format!("hello, {}", user.name))
		.unwrap_or_else(|| "signed out".to_string());

	let footer_lines = match &app.mode {
		InputMode::Normal => vec![
			Line::from("Tab pane | arrows/hjkl navigate | n/N month | Enter pick day / collapse | q quit"),
			Line::from(
				"space complete | a task | c category | e edit | d due | b start by | t estimate | p priority | r recurring",
			),
			Line::from("x delete task | D delete category | i sign in | L sign out"),
			Line::from(format!("{} | {}", greeting, app.status)),
		],
		InputMode::Prompt(prompt) => vec![
			Line::from(prompt.title.clone()),
			Line::from(format!("> {}", prompt.input)),
			Line::from("Enter submit | Esc cancel"),
			Line::from(app.status.clone()),
		],
		InputMode::Select(select) => vec![
			Line::from(select.title.clone()),
			Line::from(format!(
				"Selected: {}",
				select
					.selected_option()
					.map(|option| option.label.as_str())
					.unwrap_or("(none)")
			)),
			Line::from("j/k or arrows move | Enter choose | Esc cancel"),
			Line::from(app.status.clone()),
		],
	};

	let footer = Paragraph::new(footer_lines).block(Block::default().borders(Borders::ALL).title("Shortcuts"));
	frame.render_widget(footer, area);
}

fn render_select_popup(frame: &mut Frame, select: &SelectState) {
	let area = centered_rect(62, 55, frame.area());
	frame.render_widget(Clear, area);

	let items = if select.options.is_empty() {
		vec![ListItem::new("(no choices)")]
	} else {
		select
			.options
			.iter()
			.map(|option| ListItem::new(option.label.clone()).style(option.style))
			.collect::<Vec<_>>()
	};

	let current = if select.options.is_empty() {
		0
	} else {
		select.selected.saturating_add(1)
	};
	let total = select.options.len();
	let list = List::new(items)
		.block(
			Block::default()
				.borders(Borders::ALL)
				.title(format!("{} ({current}/{total})", select.title)),
		)
		.highlight_symbol(">> ")
		.highlight_style(Style::default().bg(HIGHLIGHT_BACKGROUND_COLOR));

	let mut state = ListState::default();
	if !select.options.is_empty() {
		state.select(Some(select.selected.min(select.options.len().saturating_sub(1))));
	}
	frame.render_stateful_widget(list, area, &mut state);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
	let popup_layout = Layout::default()
		.direction(Direction::Vertical)
		.constraints([
			Constraint::Percentage((100 - percent_y) / 2),
			Constraint::Percentage(percent_y),
			Constraint::Percentage((100 - percent_y) / 2),
		])
		.split(area);
	Layout::default()
		.direction(Direction::Horizontal)
		.constraints([
			Constraint::Percentage((100 - percent_x) / 2),
			Constraint::Percentage(percent_x),
			Constraint::Percentage((100 - percent_x) / 2),
		])
		.split(popup_layout[1])[1]
}

fn handle_normal_key(
	app: &mut App,
	code: KeyCode,
	planner: &mut Planner,
	snapshot_path: &Path,
	view: &ViewModel,
) -> bool {
	match code {
		KeyCode::Char('q') | KeyCode::Esc => true,
		KeyCode::Tab => {
			app.focus = app.focus.next();
			planner.current_view = app.focus.view_kind();
			false
		}
		KeyCode::BackTab => {
			app.focus = app.focus.prev();
			planner.current_view = app.focus.view_kind();
			false
		}
		KeyCode::Up | KeyCode::Char('k') => {
			match app.focus {
				FocusPane::Calendar => {
					app.shift_selected_day(-7);
					planner.current_month = app.calendar_month;
				}
				FocusPane::Categories => app.move_category_selection(-1, view),
				FocusPane::Today => app.move_today_selection(-1, view),
			}
			false
		}
		KeyCode::Down | KeyCode::Char('j') => {
			match app.focus {
				FocusPane::Calendar => {
					app.shift_selected_day(7);
					planner.current_month = app.calendar_month;
				}
				FocusPane::Categories => app.move_category_selection(1, view),
				FocusPane::Today => app.move_today_selection(1, view),
			}
			false
		}
		KeyCode::Left | KeyCode::Char('h') => {
			if app.focus == FocusPane::Calendar {
				app.shift_selected_day(-1);
				planner.current_month = app.calendar_month;
			}
			false
		}
		KeyCode::Right | KeyCode::Char('l') => {
			if app.focus == FocusPane::Calendar {
				app.shift_selected_day(1);
				planner.current_month = app.calendar_month;
			}
			false
		}
		KeyCode::Char('n') => {
			app.shift_selected_month(1);
			planner.current_month = app.calendar_month;
			false
		}
		KeyCode::Char('N') => {
			app.shift_selected_month(-1);
			planner.current_month = app.calendar_month;
			false
		}
		KeyCode::Enter => {
			match app.focus {
				FocusPane::Calendar => {
					planner.selected_date = Some(app.selected_date);
					app.status = format!("showing {}", app.selected_date.format("%d %B %Y"));
				}
				FocusPane::Categories => match app.selected_category_row(view) {
					Some(RowKind::Category { category_id }) => {
						if app.collapsed_categories.contains(&category_id) {
							app.collapsed_categories.remove(&category_id);
						} else {
							app.collapsed_categories.insert(category_id);
						}
					}
					Some(RowKind::Task { .. }) => {
						app.status = "press space to complete this task".to_string();
					}
					_ => {}
				},
				FocusPane::Today => {}
			}
			false
		}
		KeyCode::Char('i') => {
			if planner.current_user.is_none() {
				app.mode = InputMode::Prompt(PromptState::new("Email", PromptKind::LoginEmail));
			} else {
				app.status = "already signed in".to_string();
			}
			false
		}
		KeyCode::Char('c') => {
			app.mode = InputMode::Prompt(PromptState::new("Category name", PromptKind::AddCategoryName));
			false
		}
		KeyCode::Char('a') => {
			match build_task_category_select(planner) {
				Ok(select) => app.mode = InputMode::Select(select),
				Err(err) => app.status = err,
			}
			false
		}
		KeyCode::Char('e') => {
			if let Some(task_id) = app.selected_task_id(view) {
				let title = task_title(planner, &task_id);
				app.mode = InputMode::Prompt(PromptState::new(
					format!("New title for '{title}'"),
					PromptKind::EditTaskTitle { task_id },
				));
			} else {
				app.status = "select a task first".to_string();
			}
			false
		}
		KeyCode::Char('d') => {
			if let Some(task_id) = app.selected_task_id(view) {
				app.mode = InputMode::Prompt(PromptState::new(
					"Due date (YYYY-MM-DD, empty clears)",
					PromptKind::DueDate { task_id },
				));
			} else {
				app.status = "select a task first".to_string();
			}
			false
		}
		KeyCode::Char('b') => {
			if let Some(task_id) = app.selected_task_id(view) {
				app.mode = InputMode::Prompt(PromptState::new(
					"Start by (YYYY-MM-DD, empty clears)",
					PromptKind::StartBy { task_id },
				));
			} else {
				app.status = "select a task first".to_string();
			}
			false
		}
		KeyCode::Char('t') => {
			if let Some(task_id) = app.selected_task_id(view) {
				app.mode = InputMode::Prompt(PromptState::new(
					"Estimated hours (e.g. 1.5)",
					PromptKind::Estimate { task_id },
				));
			} else {
				app.status = "select a task first".to_string();
			}
			false
		}
		KeyCode::Char('p') => {
			if let Some(task_id) = app.selected_task_id(view) {
				let updated = planner
					.cycle_priority(&task_id)
					.map(|task| (task.title.clone(), task.priority));
				app.status = match updated {
					Some((title, priority)) => match persist(snapshot_path, planner) {
						Ok(()) => format!("priority for {title}: {}", priority.label()),
						Err(err) => format!("error: {err}"),
					},
					None => "task no longer exists".to_string(),
				};
			} else {
				app.status = "select a task first".to_string();
			}
			false
		}
		KeyCode::Char('r') => {
			if let Some(task_id) = app.selected_task_id(view) {
				let updated = planner
					.toggle_recurring(&task_id)
					.map(|task| (task.title.clone(), task.is_recurring));
				app.status = match updated {
					Some((title, is_recurring)) => match persist(snapshot_path, planner) {
						Ok(()) if is_recurring => format!("{title} is now recurring"),
						Ok(()) => format!("{title} is no longer recurring"),
						Err(err) => format!("error: {err}"),
					},
					None => "task no longer exists".to_string(),
				};
			} else {
				app.status = "select a task first".to_string();
			}
			false
		}
		KeyCode::Char(' ') => {
			if let Some(task_id) = app.selected_task_id(view) {
				let updated = planner
					.toggle_complete(&task_id, Utc::now())
					.map(|task| (task.title.clone(), task.is_active()));
				app.status = match updated {
					Some((title, is_active)) => match persist(snapshot_path, planner) {
						Ok(()) if is_active => format!("reopened: {title}"),
						Ok(()) => format!("completed: {title}"),
						Err(err) => format!("error: {err}"),
					},
					None => "task no longer exists".to_string(),
				};
			} else {
				app.status = "select a task first".to_string();
			}
			false
		}
		KeyCode::Char('x') => {
			if let Some(task_id) = app.selected_task_id(view) {
				let title = task_title(planner, &task_id);
				app.mode = InputMode::Select(build_delete_task_select(task_id, title));
			} else {
				app.status = "select a task first".to_string();
			}
			false
		}
		KeyCode::Char('D') => {
			if let Some(category_id) = app.selected_category_id(view, planner) {
				app.mode = InputMode::Select(build_delete_category_select(planner, &category_id));
			} else {
				app.status = "select a category first".to_string();
			}
			false
		}
		KeyCode::Char('L') => {
			if planner.current_user.is_some() {
				app.mode = InputMode::Select(build_logout_select());
			} else {
				app.status = "not signed in".to_string();
			}
			false
		}
		_ => false,
	}
}

fn handle_prompt_key(
	app: &mut App,
	code: KeyCode,
	planner: &mut Planner,
	snapshot_path: &Path,
	today: NaiveDate,
) -> bool {
	match code {
		KeyCode::Esc => {
			let was_login = matches!(
				&app.mode,
				InputMode::Prompt(prompt)
					if matches!(prompt.kind, PromptKind::LoginEmail | PromptKind::LoginPassword { .. })
			);
			app.mode = InputMode::Normal;
			app.status = if was_login && planner.current_user.is_none() {
				"sign in required for changes, press i".to_string()
			} else {
				"input cancelled".to_string()
			};
		}
		KeyCode::Backspace => {
			if let InputMode::Prompt(prompt) = &mut app.mode {
				prompt.input.pop();
			}
		}
		KeyCode::Char(value) => {
			if let InputMode::Prompt(prompt) = &mut app.mode {
				prompt.input.push(value);
			}
		}
		KeyCode::Enter => {
			let prompt = match std::mem::replace(&mut app.mode, InputMode::Normal) {
				InputMode::Prompt(prompt) => prompt,
				InputMode::Normal | InputMode::Select(_) => return false,
			};

			match submit_prompt(prompt.clone(), planner, snapshot_path, today) {
				Ok(PromptOutcome::NextPrompt(next_prompt)) => app.mode = InputMode::Prompt(next_prompt),
				Ok(PromptOutcome::Select(select)) => app.mode = InputMode::Select(select),
				Ok(PromptOutcome::Done(message)) => {
					app.mode = InputMode::Normal;
					app.status = message;
				}
				Err(err) => {
					app.mode = InputMode::Prompt(prompt);
					app.status = format!("error: {err}");
				}
			}
		}
		_ => {}
	}

	false
}

fn handle_select_key(
	app: &mut App,
	code: KeyCode,
	planner: &mut Planner,
	snapshot_path: &Path,
) -> bool {
	match code {
		KeyCode::Esc => {
			app.mode = InputMode::Normal;
			app.status = "selection cancelled".to_string();
		}
		KeyCode::Up | KeyCode::Char('k') => {
			if let InputMode::Select(select) = &mut app.mode {
				select.move_selection(-1);
			}
		}
		KeyCode::Down | KeyCode::Char('j') => {
			if let InputMode::Select(select) = &mut app.mode {
				select.move_selection(1);
			}
		}
		KeyCode::Enter => {
			let select = match std::mem::replace(&mut app.mode, InputMode::Normal) {
				InputMode::Select(select) => select,
				_ => return false,
			};

			match submit_select(select.clone(), planner, snapshot_path) {
				Ok(SelectOutcome::NextPrompt(prompt)) => app.mode = InputMode::Prompt(prompt),
				Ok(SelectOutcome::Done(message)) => {
					app.mode = InputMode::Normal;
					app.status = message;
				}
				Err(err) => {
					app.mode = InputMode::Select(select);
					app.status = format!("error: {err}");
				}
			}
		}
		_ => {}
	}

	false
}

fn submit_prompt(
	prompt: PromptState,
	planner: &mut Planner,
	snapshot_path: &Path,
	today: NaiveDate,
) -> Result<PromptOutcome, String> {
	match prompt.kind {
		PromptKind::LoginEmail => {
			let email = required_text(&prompt.input, "email")?;
			Ok(PromptOutcome::NextPrompt(PromptState::new(
				format!("Password for {email}"),
				PromptKind::LoginPassword { email },
			)))
		}
		PromptKind::LoginPassword { email } => {
			let name = planner.sign_in(&email, &prompt.input)?.name.clone();
			persist(snapshot_path, planner)?;
			info!("signed in as {name}");
			Ok(PromptOutcome::Done(format!("hello, {name}!")))
		}
		PromptKind::AddCategoryName => {
			let name = required_text(&prompt.input, "category name")?;
			Ok(PromptOutcome::Select(build_color_select(name)))
		}
		PromptKind::AddTaskTitle { category_id } => {
			let title = required_text(&prompt.input, "task title")?;
			planner.add_task(&category_id, &title, today)?;
			persist(snapshot_path, planner)?;
			Ok(PromptOutcome::Done(format!("created task: {title}")))
		}
		PromptKind::EditTaskTitle { task_id } => {
			let updated = planner
				.edit_task_title(&task_id, &prompt.input)?
				.map(|task| task.title.clone());
			match updated {
				Some(title) => {
					persist(snapshot_path, planner)?;
					Ok(PromptOutcome::Done(format!("renamed to: {title}")))
				}
				None => Ok(PromptOutcome::Done("task no longer exists".to_string())),
			}
		}
		PromptKind::DueDate { task_id } => {
			let updated = planner
				.set_due_date(&task_id, &prompt.input, today)?
				.map(|task| (task.title.clone(), task.due_date));
			match updated {
				Some((title, Some(due_date))) => {
					persist(snapshot_path, planner)?;
					Ok(PromptOutcome::Done(format!("{title} is now due {due_date}")))
				}
				Some((title, None)) => {
					persist(snapshot_path, planner)?;
					Ok(PromptOutcome::Done(format!("cleared due date for {title}")))
				}
				None => Ok(PromptOutcome::Done("task no longer exists".to_string())),
			}
		}
		PromptKind::StartBy { task_id } => {
			let updated = planner
				.set_start_by(&task_id, &prompt.input, today)?
				.map(|task| (task.title.clone(), task.start_by));
			match updated {
				Some((title, Some(start_by))) => {
					persist(snapshot_path, planner)?;
					Ok(PromptOutcome::Done(format!("{title} should start by {start_by}")))
				}
				Some((title, None)) => {
					persist(snapshot_path, planner)?;
					Ok(PromptOutcome::Done(format!("cleared start date for {title}")))
				}
				None => Ok(PromptOutcome::Done("task no longer exists".to_string())),
			}
		}
		PromptKind::Estimate { task_id } => {
			let updated = planner
				.set_estimate(&task_id, &prompt.input, today)?
				.map(|task| (task.title.clone(), task.estimated_hours));
			match updated {
				Some((title, estimated_hours)) => {
					persist(snapshot_path, planner)?;
					Ok(PromptOutcome::Done(format!("estimated {title} at {estimated_hours}h")))
				}
				None => Ok(PromptOutcome::Done("task no longer exists".to_string())),
			}
		}
	}
}

fn submit_select(
	select: SelectState,
	planner: &mut Planner,
	snapshot_path: &Path,
) -> Result<SelectOutcome, String> {
	let selected_value = select
		.selected_option()
		.map(|option| option.value.clone())
		.ok_or_else(|| "no option selected".to_string())?;

	match select.kind {
		SelectKind::CategoryColor { name } => {
			let color = selected_value.ok_or_else(|| "selected color is missing".to_string())?;
			let created_name = name.clone();
			planner.add_category(&name, &color)?;
			persist(snapshot_path, planner)?;
			info!("created category {created_name}");
			Ok(SelectOutcome::Done(format!("created category: {created_name}")))
		}
		SelectKind::TaskCategory => {
			let category_id =
				selected_value.ok_or_else(|| "selected category is missing".to_string())?;
			Ok(SelectOutcome::NextPrompt(PromptState::new(
				"Task title",
				PromptKind::AddTaskTitle { category_id },
			)))
		}
		SelectKind::DeleteTaskConfirm { task_id, title } => {
			let action = selected_value
				.as_deref()
				.ok_or_else(|| "selected action is missing".to_string())?;
			if action != "delete" {
				return Ok(SelectOutcome::Done("delete cancelled".to_string()));
			}

			match planner.delete_task(&task_id) {
				Some(_) => {
					persist(snapshot_path, planner)?;
					info!("deleted task {task_id}");
					Ok(SelectOutcome::Done(format!("deleted task: {title}")))
				}
				None => Ok(SelectOutcome::Done("task no longer exists".to_string())),
			}
		}
		SelectKind::DeleteCategoryConfirm { category_id, name } => {
			let action = selected_value
				.as_deref()
				.ok_or_else(|| "selected action is missing".to_string())?;
			if action != "delete" {
				return Ok(SelectOutcome::Done("delete cancelled".to_string()));
			}

			match planner.delete_category(&category_id) {
				Some(removal) => {
					persist(snapshot_path, planner)?;
					info!(
						"deleted category {category_id} with {} task(s)",
						removal.tasks_removed
					);
					Ok(SelectOutcome::Done(format!(
						"deleted {name} and {} task(s)",
						removal.tasks_removed
					)))
				}
				None => Ok(SelectOutcome::Done("category no longer exists".to_string())),
			}
		}
		SelectKind::LogoutConfirm => {
			let action = selected_value
				.as_deref()
				.ok_or_else(|| "selected action is missing".to_string())?;
			if action != "logout" {
				return Ok(SelectOutcome::Done("sign out cancelled".to_string()));
			}

			planner.sign_out();
			persist(snapshot_path, planner)?;
			info!("signed out, local data cleared");
			Ok(SelectOutcome::Done("signed out. press i to sign in".to_string()))
		}
	}
}

fn build_color_select(name: String) -> SelectState {
	let options = PALETTE_COLORS
		.iter()
		.copied()
		.map(|color| {
			SelectOption::new(
				format!("████████  {color}"),
				Some(color.to_string()),
				style_from_palette(color),
			)
		})
		.collect::<Vec<_>>();

	SelectState::new("Select category color", SelectKind::CategoryColor { name }, options)
}

fn build_task_category_select(planner: &Planner) -> Result<SelectState, String> {
	let mut categories = planner.categories.iter().collect::<Vec<_>>();
	categories.sort_by(|left, right| left.name.cmp(&right.name).then_with(|| left.id.cmp(&right.id)));

	if categories.is_empty() {
		return Err("no categories yet. press 'c' to create one first".to_string());
	}

	let options = categories
		.into_iter()
		.map(|category| {
			SelectOption::new(
				category.name.clone(),
				Some(category.id.clone()),
				style_from_palette(&category.color),
			)
		})
		.collect::<Vec<_>>();

	Ok(SelectState::new("Select category", SelectKind::TaskCategory, options))
}

fn build_delete_task_select(task_id: String, title: String) -> SelectState {
	let options = vec![
		SelectOption::new(
			"Delete",
			Some("delete".to_string()),
			Style::default().fg(Color::LightRed).add_modifier(Modifier::BOLD),
		),
		SelectOption::new("Cancel", Some("cancel".to_string()), Style::default()),
	];

	let mut select = SelectState::new(
		format!("Delete task? {title}"),
		SelectKind::DeleteTaskConfirm { task_id, title },
		options,
	);
	// Default to cancel to prevent accidental deletions.
	select.selected = 1;
	select
}

fn build_delete_category_select(planner: &Planner, category_id: &str) -> SelectState {
	let name = planner
		.category(category_id)
		.map(|category| category.name.clone())
		.unwrap_or_else(|| "Unknown category".to_string());
	let task_count = planner
		.tasks
		.iter()
		.filter(|task| task.category_id == category_id)
		.count();

	let options = vec![
		SelectOption::new(
			"Delete category and its tasks",
			Some("delete".to_string()),
			Style::default().fg(Color::LightRed).add_modifier(Modifier::BOLD),
		),
		SelectOption::new("Cancel", Some("cancel".to_string()), Style::default()),
	];

	let mut select = SelectState::new(
		format!("Delete {name} and its {task_count} task(s)?"),
		SelectKind::DeleteCategoryConfirm {
			category_id: category_id.to_string(),
			name,
		},
		options,
	);
	select.selected = 1;
	select
}

fn build_logout_select() -> SelectState {
	let options = vec![
		SelectOption::new(
			"Sign out and clear local data",
			Some("logout".to_string()),
			Style::default().fg(Color::LightRed).add_modifier(Modifier::BOLD),
		),
		SelectOption::new("Cancel", Some("cancel".to_string()), Style::default()),
	];

	let mut select = SelectState::new("Sign out?", SelectKind::LogoutConfirm, options);
	select.selected = 1;
	select
}

fn build_view(app: &App, planner: &Planner, today: NaiveDate) -> ViewModel {
	let today_summary = today_view(&planner.tasks, today);
	let today_rows = build_today_rows(planner, &today_summary, today);
	let category_rows = build_category_rows(app, planner, today);
	let grid = calendar_view(
		&planner.tasks,
		app.calendar_month.year(),
		app.calendar_month.month(),
		today,
	);
	let day_lines = build_day_lines(planner, app.selected_date, today);

	ViewModel {
		today: today_summary,
		today_rows,
		category_rows,
		grid,
		day_lines,
	}
}

fn build_today_rows(planner: &Planner, summary: &TodayView, today: NaiveDate) -> Vec<Row> {
	let groups = [
		("DUE TODAY OR OVERDUE", &summary.due_now, Color::LightRed),
		("FUTURE DUE DATES", &summary.future_due, Color::LightYellow),
		("NO DUE DATE", &summary.no_due_date, Color::DarkGray),
	];

	let mut rows = Vec::new();
	for (label, task_ids, color) in groups {
		if task_ids.is_empty() {
			continue;
		}

		rows.push(Row {
			line: Line::from(Span::styled(
				label,
				Style::default().fg(color).add_modifier(Modifier::BOLD),
			)),
			kind: RowKind::Header,
		});

		for task_id in task_ids {
			if let Some(task) = planner.task(task_id) {
				rows.push(task_row(planner, task, today));
			}
		}
	}

	rows
}

fn build_category_rows(app: &App, planner: &Planner, today: NaiveDate) -> Vec<Row> {
	if planner.categories.is_empty() {
		return vec![Row {
			line: Line::from("(no categories yet, press 'c')"),
			kind: RowKind::Empty,
		}];
	}

	let mut rows = Vec::new();
	for category in &planner.categories {
		let split = category_tasks(&planner.tasks, &category.id);
		let is_collapsed = app.collapsed_categories.contains(&category.id);

		rows.push(Row {
			line: Line::from(vec![
				Span::raw(if is_collapsed { "[+] " } else { "[-] " }),
				Span::styled(
					category.name.clone(),
					style_from_palette(&category.color).add_modifier(Modifier::BOLD),
				),
				Span::raw(format!(
					" ({} open, {} done)",
					split.active.len(),
					split.completed.len()
				)),
			]),
			kind: RowKind::Category {
				category_id: category.id.clone(),
			},
		});

		if is_collapsed {
			continue;
		}

		for task_id in split.active.iter().chain(split.completed.iter()) {
			if let Some(task) = planner.task(task_id) {
				rows.push(task_row(planner, task, today));
			}
		}
	}

	rows
}

fn build_day_lines(planner: &Planner, date: NaiveDate, today: NaiveDate) -> Vec<Line<'static>> {
	tasks_due_on(&planner.tasks, date)
		.iter()
		.filter_map(|task_id| planner.task(task_id))
		.map(|task| task_row(planner, task, today).line)
		.collect()
}

fn task_row(planner: &Planner, task: &Task, today: NaiveDate) -> Row {
	let checkbox = if task.is_active() { "[ ]" } else { "[x]" };
	let marker = urgency_marker(classify(task, today));

	let mut detail = String::new();
	if let Some(due_date) = task.due_date {
		detail.push_str(&format!(" | due {due_date}"));
	}
	if task.estimated_hours > 0.0 {
		detail.push_str(&format!(" | {}h", task.estimated_hours));
	}
	detail.push_str(&format!(" | {}", task.priority.label()));

	let category_style = planner
		.category(&task.category_id)
		.map(|category| style_from_palette(&category.color))
		.unwrap_or_default();

	let line_style = if task.is_active() {
		Style::default()
	} else {
		Style::default().fg(Color::DarkGray)
	};
	let title_style = if task.is_active() { category_style } else { line_style };

	Row {
		line: Line::from(vec![
			Span::styled(format!("  {checkbox} {marker} "), line_style),
			Span::styled(task.title.clone(), title_style),
			Span::styled(detail, Style::default().fg(Color::DarkGray)),
		]),
		kind: RowKind::Task {
			task_id: task.id.clone(),
		},
	}
}

fn urgency_marker(urgency: Urgency) -> &'static str {
	match urgency {
		Urgency::NoDate => "·",
		Urgency::Overdue => "!",
		Urgency::DueToday => "*",
		Urgency::Recurring => "~",
		Urgency::Upcoming => ">",
	}
}

fn style_from_palette(color_name: &str) -> Style {
	palette_color(color_name)
		.map(|color| Style::default().fg(color))
		.unwrap_or_default()
}

fn palette_color(color_name: &str) -> Option<Color> {
	match color_name {
		"pink" => Some(Color::LightMagenta),
		"peach" => Some(Color::LightRed),
		"lemon" => Some(Color::LightYellow),
		"mint" => Some(Color::LightGreen),
		"sky" => Some(Color::LightCyan),
		"lavender" => Some(Color::LightBlue),
		"blush" => Some(Color::Magenta),
		"sage" => Some(Color::Green),
		_ => None,
	}
}

fn border_style(focused: bool) -> Style {
	if focused {
		Style::default()
			.fg(FOCUSED_PANEL_BORDER_COLOR)
			.add_modifier(Modifier::BOLD)
	} else {
		Style::default().fg(INACTIVE_PANEL_BORDER_COLOR)
	}
}

fn persist(path: &Path, planner: &Planner) -> Result<(), String> {
	save_snapshot(path, planner).map_err(|err| {
		warn!("snapshot write failed: {err}");
		err.to_string()
	})
}

fn required_text(input: &str, field_name: &str) -> Result<String, String> {
	let value = input.trim();
	if value.is_empty() {
		Err(format!("{field_name} is required"))
	} else {
		Ok(value.to_string())
	}
}

fn task_title(planner: &Planner, task_id: &str) -> String {
	planner
		.task(task_id)
		.map(|task| task.title.clone())
		.unwrap_or_else(|| "Unknown task".to_string())
}

fn shift_month(day: NaiveDate, delta: i32) -> NaiveDate {
	let mut year = day.year();
	let mut month = day.month() as i32 + delta;
	while month > 12 {
		year += 1;
		month -= 12;
	}
	while month < 1 {
		year -= 1;
		month += 12;
	}
	let month_u32 = month as u32;
	let max_day = days_in_month(year, month_u32);
	let target_day = day.day().min(max_day);
	NaiveDate::from_ymd_opt(year, month_u32, target_day).expect("shifted month date must be valid")
}

#[derive(Debug, Clone)]
enum PromptOutcome {
	NextPrompt(PromptState),
	Select(SelectState),
	Done(String),
}

#[derive(Debug, Clone)]
enum SelectOutcome {
	NextPrompt(PromptState),
	Done(String),
}

#[derive(Debug, Clone)]
struct PromptState {
	title: String,
	input: String,
	kind: PromptKind,
}

impl PromptState {
	fn new(title: impl Into<String>, kind: PromptKind) -> Self {
		Self {
			title: title.into(),
			input: String::new(),
			kind,
		}
	}
}

#[derive(Debug, Clone)]
struct SelectState {
	title: String,
	options: Vec<SelectOption>,
	selected: usize,
	kind: SelectKind,
}

impl SelectState {
	fn new(title: impl Into<String>, kind: SelectKind, options: Vec<SelectOption>) -> Self {
		Self {
			title: title.into(),
			options,
			selected: 0,
			kind,
		}
	}

	fn move_selection(&mut self, delta: i32) {
		if self.options.is_empty() {
			self.selected = 0;
			return;
		}

		if delta > 0 {
			self.selected = (self.selected + delta as usize).min(self.options.len() - 1);
		} else {
			self.selected = self.selected.saturating_sub(delta.unsigned_abs() as usize);
		}
	}

	fn selected_option(&self) -> Option<&SelectOption> {
		self.options.get(self.selected)
	}
}

#[derive(Debug, Clone)]
struct SelectOption {
	label: String,
	value: Option<String>,
	style: Style,
}

impl SelectOption {
	fn new(label: impl Into<String>, value: Option<String>, style: Style) -> Self {
		Self {
			label: label.into(),
			value,
			style,
		}
	}
}

#[derive(Debug, Clone)]
enum PromptKind {
	LoginEmail,
	LoginPassword {
		email: String,
	},
	AddCategoryName,
	AddTaskTitle {
		category_id: String,
	},
	EditTaskTitle {
		task_id: String,
	},
	DueDate {
		task_id: String,
	},
	StartBy {
		task_id: String,
	},
	Estimate {
		task_id: String,
	},
}

#[derive(Debug, Clone)]
enum SelectKind {
	CategoryColor {
		name: String,
	},
	TaskCategory,
	DeleteTaskConfirm {
		task_id: String,
		title: String,
	},
	DeleteCategoryConfirm {
		category_id: String,
		name: String,
	},
	LogoutConfirm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FocusPane {
	Calendar,
	Categories,
	Today,
}

impl FocusPane {
	fn next(self) -> Self {
		match self {
			FocusPane::Calendar => FocusPane::Categories,
			FocusPane::Categories => FocusPane::Today,
			FocusPane::Today => FocusPane::Calendar,
		}
	}

	fn prev(self) -> Self {
		match self {
			FocusPane::Calendar => FocusPane::Today,
			FocusPane::Categories => FocusPane::Calendar,
			FocusPane::Today => FocusPane::Categories,
		}
	}

	fn view_kind(self) -> ViewKind {
		match self {
			FocusPane::Calendar => ViewKind::Calendar,
			FocusPane::Categories => ViewKind::Categories,
			FocusPane::Today => ViewKind::Today,
		}
	}

	fn from_view_kind(view: ViewKind) -> Self {
		match view {
			ViewKind::Calendar => FocusPane::Calendar,
			ViewKind::Categories => FocusPane::Categories,
			ViewKind::Today => FocusPane::Today,
		}
	}
}

#[derive(Debug, Clone)]
enum InputMode {
	Normal,
	Prompt(PromptState),
	Select(SelectState),
}

#[derive(Debug, Clone)]
struct App {
	focus: FocusPane,
	selected_date: NaiveDate,
	calendar_month: NaiveDate,
	category_index: usize,
	today_index: usize,
	collapsed_categories: HashSet<String>,
	mode: InputMode,
	status: String,
}

impl App {
	fn from_planner(planner: &Planner, today: NaiveDate) -> Self {
		let selected_date = planner.selected_date.unwrap_or(today);
		Self {
			focus: FocusPane::from_view_kind(planner.current_view),
			selected_date,
			calendar_month: first_of_month(selected_date),
			category_index: 0,
			today_index: 0,
			collapsed_categories: HashSet::new(),
			mode: InputMode::Normal,
			status: "ready".to_string(),
		}
	}

	fn clamp_selection(&mut self, view: &ViewModel) {
		if view.category_rows.is_empty() {
			self.category_index = 0;
		} else {
			self.category_index = self.category_index.min(view.category_rows.len() - 1);
		}

		if view.today_rows.is_empty() {
			self.today_index = 0;
		} else {
			self.today_index = self.today_index.min(view.today_rows.len() - 1);
		}
	}

	fn shift_selected_day(&mut self, delta_days: i64) {
		self.selected_date += Duration::days(delta_days);
		self.calendar_month = first_of_month(self.selected_date);
	}

	fn shift_selected_month(&mut self, delta_months: i32) {
		self.selected_date = shift_month(self.selected_date, delta_months);
		self.calendar_month = first_of_month(self.selected_date);
	}

	fn move_category_selection(&mut self, delta: i32, view: &ViewModel) {
		if view.category_rows.is_empty() {
			self.category_index = 0;
			return;
		}

		if delta > 0 {
			self.category_index =
				(self.category_index + delta as usize).min(view.category_rows.len() - 1);
		} else {
			self.category_index = self.category_index.saturating_sub(delta.unsigned_abs() as usize);
		}
	}

	fn move_today_selection(&mut self, delta: i32, view: &ViewModel) {
		if view.today_rows.is_empty() {
			self.today_index = 0;
			return;
		}

		if delta > 0 {
			self.today_index = (self.today_index + delta as usize).min(view.today_rows.len() - 1);
		} else {
			self.today_index = self.today_index.saturating_sub(delta.unsigned_abs() as usize);
		}
	}

	fn selected_task_id(&self, view: &ViewModel) -> Option<String> {
		let row = match self.focus {
			FocusPane::Calendar => None,
			FocusPane::Categories => view.category_rows.get(self.category_index),
			FocusPane::Today => view.today_rows.get(self.today_index),
		}?;

		match &row.kind {
			RowKind::Task { task_id } => Some(task_id.clone()),
			_ => None,
		}
	}

	fn selected_category_row(&self, view: &ViewModel) -> Option<RowKind> {
		view.category_rows
			.get(self.category_index)
			.map(|row| row.kind.clone())
	}

	fn selected_category_id(&self, view: &ViewModel, planner: &Planner) -> Option<String> {
		if self.focus != FocusPane::Categories {
			return None;
		}

		match self.selected_category_row(view)? {
			RowKind::Category { category_id } => Some(category_id),
			RowKind::Task { task_id } => planner
				.task(&task_id)
				.map(|task| task.category_id.clone()),
			_ => None,
		}
	}
}

struct ViewModel {
	today: TodayView,
	today_rows: Vec<Row>,
	category_rows: Vec<Row>,
	grid: MonthGrid,
	day_lines: Vec<Line<'static>>,
}

#[derive(Clone)]
struct Row {
	line: Line<'static>,
	kind: RowKind,
}

#[derive(Debug, Clone)]
enum RowKind {
	Empty,
	Header,
	Category { category_id: String },
	Task { task_id: String },
}
