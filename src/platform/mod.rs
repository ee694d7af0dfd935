// Scrollkeeper platform paths
// Resolves where settings and the session database live on each OS.

use std::env;
use std::path::PathBuf;

const APP_DIR: &str = "scrollkeeper";

/// Returns the configuration directory.
///
/// - **Linux**: `$XDG_CONFIG_HOME/scrollkeeper` or `~/.config/scrollkeeper`
/// - **macOS**: `~/Library/Application Support/scrollkeeper`
/// - **Windows**: `%APPDATA%/scrollkeeper`
pub fn get_config_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        roaming_app_data().join(APP_DIR)
    }
    #[cfg(target_os = "macos")]
    {
        home_dir()
            .join("Library")
            .join("Application Support")
            .join(APP_DIR)
    }
    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        xdg_dir("XDG_CONFIG_HOME", &[".config"])
    }
}

/// Returns the data directory holding the session database.
///
/// - **Linux**: `$XDG_DATA_HOME/scrollkeeper` or `~/.local/share/scrollkeeper`
/// - **macOS** and **Windows**: same as the config directory
pub fn get_data_dir() -> PathBuf {
    #[cfg(any(target_os = "windows", target_os = "macos"))]
    {
        get_config_dir()
    }
    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        xdg_dir("XDG_DATA_HOME", &[".local", "share"])
    }
}

#[allow(dead_code)]
fn home_dir() -> PathBuf {
    PathBuf::from(env::var("HOME").unwrap_or_else(|_| String::from("/tmp")))
}

#[cfg(target_os = "windows")]
fn roaming_app_data() -> PathBuf {
    PathBuf::from(
        env::var("APPDATA").unwrap_or_else(|_| String::from("C:\\Users\\Default\\AppData\\Roaming")),
    )
}

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
fn xdg_dir(var: &str, fallback: &[&str]) -> PathBuf {
    match env::var(var) {
        Ok(dir) if !dir.is_empty() => PathBuf::from(dir).join(APP_DIR),
        _ => {
            let mut path = home_dir();
            for part in fallback {
                path.push(part);
            }
            path.join(APP_DIR)
        }
    }
}
