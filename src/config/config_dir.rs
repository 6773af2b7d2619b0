use std::path::{Path, PathBuf};

use super::error::{ConfigError, ConfigResult};

/// Explicit path to the configuration file, checked before anything else.
pub const CONFIG_ENV: &str = "TINA_CONFIG";

const LOCAL_CONFIG: &str = "./config.toml";

/// `$TINA_CONFIG`, then `~/.config/tina/config.toml` (or `%APPDATA%\tina`),
/// then the working directory. `use_local` skips the user directory.
pub fn find_config_file(use_local: bool) -> PathBuf {
    if let Some(explicit) = std::env::var_os(CONFIG_ENV).filter(|p| !p.is_empty()) {
        return PathBuf::from(explicit);
    }

    if use_local {
        return PathBuf::from(LOCAL_CONFIG);
    }

    user_config_file()
        .filter(|path| path.exists())
        .unwrap_or_else(|| PathBuf::from(LOCAL_CONFIG))
}

fn user_config_file() -> Option<PathBuf> {
    #[cfg(windows)]
    let base = std::env::var_os("APPDATA").map(PathBuf::from);
    #[cfg(not(windows))]
    let base = std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config"));

    base.map(|dir| dir.join(crate::APPLICATION_NAME).join("config.toml"))
}

pub fn read_config(use_local: bool) -> ConfigResult<String> {
    read_config_from(&find_config_file(use_local))
}

pub fn read_config_from(filename: &Path) -> ConfigResult<String> {
    if !filename.is_file() {
        return Err(ConfigError::ConfigNotFound {
            path: filename.to_path_buf(),
        });
    }

    let filename = filename.canonicalize()?;
    tracing::debug!(path = %filename.display(), "Reading configuration.");

    Ok(std::fs::read_to_string(filename)?)
}

#[cfg(test)]
mod test {
    use std::fs;

    use super::*;

    // the only test that sets CONFIG_ENV
    #[test]
    fn explicit_path_wins_over_local_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("tina-prod.toml");
        fs::write(&file, "[host]\nbindto = '0.0.0.0:80'").unwrap();

        unsafe {
            std::env::set_var(CONFIG_ENV, &file);
        }
        let local = find_config_file(true);
        let user = find_config_file(false);
        unsafe {
            std::env::remove_var(CONFIG_ENV);
        }

        assert_eq!(local, file);
        assert_eq!(user, file);
        assert!(read_config_from(&local).unwrap().contains("bindto"));
        assert_eq!(find_config_file(true), PathBuf::from(LOCAL_CONFIG));
    }

    #[test]
    fn missing_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");

        match read_config_from(&missing) {
            Err(ConfigError::ConfigNotFound { path }) => assert_eq!(path, missing),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn directory_is_not_a_config() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            read_config_from(dir.path()),
            Err(ConfigError::ConfigNotFound { .. })
        ));
    }
}
