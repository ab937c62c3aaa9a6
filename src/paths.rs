// SPDX-FileCopyrightText: 2026 hexide contributors
// SPDX-License-Identifier: MIT

//! Where the config file and bundled plugins live.

use std::env;
use std::path::PathBuf;

pub const CONFIG_FILE_NAME: &str = "hexide.lua";

/// Resolves the config file: an explicit path wins, then
/// `$XDG_CONFIG_HOME/hexide.lua`, then `$HOME/.config/hexide.lua`.
pub fn config_file_path(explicit: Option<PathBuf>) -> PathBuf {
    if let Some(path) = explicit {
        return path;
    }
    if let Some(xdg) = env::var_os("XDG_CONFIG_HOME").filter(|v| !v.is_empty()) {
        return PathBuf::from(xdg).join(CONFIG_FILE_NAME);
    }
    if let Some(home) = env::var_os("HOME").filter(|v| !v.is_empty()) {
        return PathBuf::from(home).join(".config").join(CONFIG_FILE_NAME);
    }
    PathBuf::from(CONFIG_FILE_NAME)
}

/// Resolves the plugin directory: an explicit path wins, otherwise the
/// `plugins` directory next to the executable.
pub fn plugin_dir(explicit: Option<PathBuf>) -> PathBuf {
    if let Some(path) = explicit {
        return path;
    }
    env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join("plugins")))
        .unwrap_or_else(|| PathBuf::from("plugins"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_paths_win() {
        let config = config_file_path(Some(PathBuf::from("/tmp/custom.lua")));
        assert_eq!(config, PathBuf::from("/tmp/custom.lua"));

        let plugins = plugin_dir(Some(PathBuf::from("/tmp/plugins")));
        assert_eq!(plugins, PathBuf::from("/tmp/plugins"));
    }
}
