//! Module for searching for steampad config files

use std::path::PathBuf;

/// System fallback path to use if one cannot be found with XDG
const FALLBACK_CONFIG_PATH: &str = "/etc/steampad/config.yaml";
const CONFIG_FILE_NAME: &str = "config.yaml";
const PREFIX: &str = "steampad";

/// Returns the path of the session configuration file. The user config
/// directory is preferred, then any system config directory that contains a
/// config file, then the fallback path.
pub fn get_config_path() -> PathBuf {
    let Ok(base_dirs) = xdg::BaseDirectories::with_prefix(PREFIX) else {
        log::warn!("Unable to determine config base path. Using fallback path.");
        return PathBuf::from(FALLBACK_CONFIG_PATH);
    };

    if let Some(path) = base_dirs.find_config_file(CONFIG_FILE_NAME) {
        log::debug!("Found config file: {path:?}");
        return path;
    }

    log::debug!("Config file not found. Using fallback path.");
    PathBuf::from(FALLBACK_CONFIG_PATH)
}

/// Returns the paths that are searched for a configuration file, in
/// preference order.
pub fn get_config_search_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Ok(base_dirs) = xdg::BaseDirectories::with_prefix(PREFIX) {
        paths.push(base_dirs.get_config_home().join(PREFIX).join(CONFIG_FILE_NAME));
        for dir in base_dirs.get_config_dirs() {
            paths.push(dir.join(PREFIX).join(CONFIG_FILE_NAME));
        }
    }
    paths.push(PathBuf::from(FALLBACK_CONFIG_PATH));

    paths
}
