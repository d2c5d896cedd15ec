//! Where the demo keeps its settings and session logs.

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use directories::ProjectDirs;

const LATEST_LOG: &str = "latest.log";
const CONFIG_FILE: &str = "grid.json";

/// Session logs kept besides the latest one.
const KEPT_SESSIONS: usize = 25;

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("dev", "norpie", "datagrid")
}

/// Grid settings, e.g. `~/.config/datagrid/grid.json` on Linux.
pub fn config_file() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE))
}

/// Log of the running session, in the platform cache directory.
pub fn log_file() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.cache_dir().join(LATEST_LOG))
}

/// Archives the previous session's log under its start time and prunes the
/// oldest archives.
pub fn rotate_logs() {
    let Some(latest) = log_file() else { return };
    let Some(dir) = latest.parent() else { return };

    if latest.exists() {
        let stamp = chrono::Local::now().format("session-%Y%m%d-%H%M%S.log");
        if let Err(e) = fs::rename(&latest, dir.join(stamp.to_string())) {
            eprintln!("Could not archive {}: {}", latest.display(), e);
        }
    }
    prune_sessions(dir);
}

fn prune_sessions(dir: &Path) {
    let Ok(entries) = fs::read_dir(dir) else { return };

    let mut archived: Vec<(std::time::SystemTime, PathBuf)> = entries
        .filter_map(Result::ok)
        .filter(|entry| entry.file_name().to_string_lossy().starts_with("session-"))
        .filter_map(|entry| {
            let modified = entry.metadata().and_then(|m| m.modified()).ok()?;
            Some((modified, entry.path()))
        })
        .collect();
    archived.sort();

    let excess = archived.len().saturating_sub(KEPT_SESSIONS);
    for (_, path) in archived.into_iter().take(excess) {
        let _ = fs::remove_file(path);
    }
}
