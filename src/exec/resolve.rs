// src/exec/resolve.rs

use std::path::{Path, PathBuf};

/// Resolve a command name to an executable path for an exec action.
///
/// Tries, in order: the name as an existing path, a `PATH` lookup via
/// `which` (probing Windows `.cmd`/`.exe` suffixes when the bare name is not
/// found), then the same sequence with the name resolved against the working
/// directory. On Windows a sibling `.cmd`/`.exe` with the same name is
/// preferred over a bare file, so `npm` resolves to `npm.cmd`.
///
/// Returns `None` when the command cannot be located; the caller reports
/// that as an action failure at run time.
pub fn executable(working_dir: &Path, base_cmd: &str) -> Option<PathBuf> {
    let resolved = resolve_base(Path::new(base_cmd))
        .or_else(|| resolve_base(&working_dir.join(base_cmd)))?;
    Some(prefer_windows_sibling(resolved))
}

fn resolve_base(cmd: &Path) -> Option<PathBuf> {
    if cmd.exists() {
        return Some(cmd.to_path_buf());
    }
    if let Ok(found) = which::which(cmd) {
        return Some(found);
    }
    if cfg!(windows) {
        for suffix in [".cmd", ".exe"] {
            let mut probe = cmd.as_os_str().to_os_string();
            probe.push(suffix);
            if let Ok(found) = which::which(&probe) {
                return Some(found);
            }
        }
    }
    None
}

fn prefer_windows_sibling(cmd: PathBuf) -> PathBuf {
    if cfg!(windows) {
        for suffix in [".cmd", ".exe"] {
            let mut probe = cmd.as_os_str().to_os_string();
            probe.push(suffix);
            let probe = PathBuf::from(probe);
            if probe.exists() {
                return probe;
            }
        }
    }
    cmd
}
