use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

const LOG_FOLDER: &str = "Wizard_Log";

/// Resolve deployment folder (absolute path)
pub fn resolve_deployment_folder() -> PathBuf {
    // Prefer the folder where the executable runs from
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(dir) = exe_path.parent() {
            return dir.to_path_buf();
        }
    }

    // Fallback: current working directory
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

/// Resolve log folder (absolute path), creating it when needed.
///
/// Order: explicit override, an existing `Wizard_Log/` in the working directory or one of its
/// parents, the per-user data directory, then the deployment folder.
pub fn resolve_log_folder(override_dir: Option<&Path>) -> Result<PathBuf> {
    if let Some(dir) = override_dir {
        return ensure_dir(dir.to_path_buf());
    }

    if let Ok(cwd) = std::env::current_dir() {
        if let Some(found) = find_upwards(&cwd, LOG_FOLDER, 12) {
            return Ok(found);
        }
    }

    if let Some(data) = dirs::data_local_dir() {
        return ensure_dir(data.join("install-wizard").join(LOG_FOLDER));
    }

    ensure_dir(resolve_deployment_folder().join(LOG_FOLDER))
}

/// Walk up from `start` looking for an existing directory named `name`.
fn find_upwards(start: &Path, name: &str, max_levels: usize) -> Option<PathBuf> {
    let mut dir = Some(start);
    for _ in 0..max_levels {
        let current = dir?;
        let candidate = current.join(name);
        if candidate.is_dir() {
            return Some(candidate);
        }
        dir = current.parent();
    }
    None
}

fn ensure_dir(dir: PathBuf) -> Result<PathBuf> {
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create log folder {:?}", dir))?;
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_is_created_and_used() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let target = tmp.path().join("nested").join("logs");
        let resolved = resolve_log_folder(Some(&target)).expect("resolve");
        assert_eq!(resolved, target);
        assert!(target.is_dir());
    }

    #[test]
    fn find_upwards_locates_parent_log_folder() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let logs = tmp.path().join(LOG_FOLDER);
        std::fs::create_dir_all(&logs).expect("mkdir");
        let deep = tmp.path().join("a").join("b");
        std::fs::create_dir_all(&deep).expect("mkdir");

        assert_eq!(find_upwards(&deep, LOG_FOLDER, 12), Some(logs));
        assert_eq!(find_upwards(&deep, LOG_FOLDER, 1), None);
    }
}
