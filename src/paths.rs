use std::env;
use std::fs;
use std::path::PathBuf;

const SNAPSHOT_FILE: &str = "snapshot.json";

pub fn resolve_snapshot_path(cli_path: Option<PathBuf>) -> PathBuf {
	if let Some(path) = cli_path {
		return absolutize(path);
	}

	if let Some(path) = env::var_os("PASTEL_SNAPSHOT") {
		let path = PathBuf::from(path);
		if !path.as_os_str().is_empty() {
			return absolutize(path);
		}
	}

	state_dir().join(SNAPSHOT_FILE)
}

pub fn logs_dir() -> PathBuf {
	state_dir().join("logs")
}

fn state_dir() -> PathBuf {
	if let Some(path) = env::var_os("PASTEL_STATE_DIR") {
		return PathBuf::from(path);
	}

	#[cfg(target_os = "windows")]
	{
		if let Some(path) = env::var_os("LOCALAPPDATA") {
			return PathBuf::from(path).join("pastel_priority");
		}
	}

	if let Some(path) = env::var_os("XDG_STATE_HOME") {
		return PathBuf::from(path).join("pastel_priority");
	}

	if let Some(path) = env::var_os("HOME") {
		return PathBuf::from(path)
			.join(".local")
			.join("state")
			.join("pastel_priority");
	}

	PathBuf::from(".pastel_priority")
}

fn absolutize(path: PathBuf) -> PathBuf {
	let path = if path.is_absolute() {
		path
	} else if let Ok(cwd) = env::current_dir() {
		cwd.join(path)
	} else {
		path
	};

	if path.exists() {
		fs::canonicalize(&path).unwrap_or(path)
	} else {
		path
	}
}
