/*
 * Path helpers shared by the core stores: locating the per-user configuration
 * directory that holds preferences and histories, and converting test case paths
 * between the absolute form used in memory and the suite-relative form written to
 * suite files.
 */
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};

/*
 * Retrieves the application's local configuration directory, creating it when
 * missing. The path is derived without an organization qualifier (e.g.
 * `~/.config/<app_name>` on Linux, `AppData/Local/<app_name>/config` on Windows).
 *
 * Returns `None` when no home directory can be determined or the directory cannot
 * be created.
 */
pub fn get_base_app_config_local_dir(app_name: &str) -> Option<PathBuf> {
    log::trace!("PathUtils: Attempting to get base app config local dir for '{app_name}'");
    ProjectDirs::from("", "", app_name).and_then(|proj_dirs| {
        let config_path = proj_dirs.config_local_dir();
        if !config_path.exists() {
            if let Err(e) = fs::create_dir_all(config_path) {
                log::error!(
                    "PathUtils: Failed to create base app config directory {config_path:?}: {e}"
                );
                return None;
            }
            log::debug!("PathUtils: Created base app config directory: {config_path:?}");
        }
        Some(config_path.to_path_buf())
    })
}

// Paths below `base_dir` become relative; anything else is kept as given.
pub fn relative_to(base_dir: &Path, path: &Path) -> PathBuf {
    match path.strip_prefix(base_dir) {
        Ok(relative) => relative.to_path_buf(),
        Err(_) => path.to_path_buf(),
    }
}

pub fn resolve_against(base_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

// Name of the directory holding `file`, e.g. "smoke" for "/tests/smoke/suite.json".
pub fn parent_directory_name(file: &Path) -> Option<String> {
    file.parent()
        .and_then(Path::file_name)
        .map(|name| name.to_string_lossy().into_owned())
}

// Display title for a file without an explicit one: its stem.
pub fn file_title(file: &Path) -> String {
    file.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_base_app_config_local_dir_creates_and_reuses() {
        // Arrange
        let unique_app_name = format!("TestApp_PathUtils_{}", rand::random::<u128>());

        // Act
        let first = get_base_app_config_local_dir(&unique_app_name);
        let second = get_base_app_config_local_dir(&unique_app_name);

        // Assert
        let Some(first) = first else {
            // No home directory in this environment; nothing to verify.
            return;
        };
        assert!(first.is_dir());
        assert_eq!(second.as_ref(), Some(&first));
        assert!(
            first
                .to_string_lossy()
                .to_lowercase()
                .contains(&unique_app_name.to_lowercase())
        );

        if let Err(e) = fs::remove_dir_all(&first) {
            eprintln!("Test cleanup failed for {first:?}: {e}");
        }
    }

    #[test]
    fn test_relative_and_resolve_round_trip_inside_base() {
        let base = Path::new("/work/suites");
        let inside = Path::new("/work/suites/cases/login.json");
        let relative = relative_to(base, inside);
        assert_eq!(relative, PathBuf::from("cases/login.json"));
        assert_eq!(resolve_against(base, &relative), inside);
    }

    #[test]
    fn test_relative_keeps_paths_outside_base() {
        let base = Path::new("/work/suites");
        let outside = Path::new("/elsewhere/login.json");
        assert_eq!(relative_to(base, outside), outside);
        assert_eq!(resolve_against(base, outside), outside);
    }

    #[test]
    fn test_parent_directory_name_and_title() {
        let file = Path::new("/tests/smoke/suite.json");
        assert_eq!(parent_directory_name(file).as_deref(), Some("smoke"));
        assert_eq!(file_title(file), "suite");
        assert_eq!(parent_directory_name(Path::new("suite.json")), None);
    }
}
