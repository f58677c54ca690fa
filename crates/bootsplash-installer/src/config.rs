use std::fs;
use std::path::Path;

use bootsplash_core::HelperError;
use tracing::debug;

use crate::HelperLayout;

const DAEMON_GROUP: &str = "Daemon";
const THEME_KEY: &str = "Theme";

/// Persist `theme` as the active theme in the config store.
///
/// Rewrites only the `Theme` entry of the `[Daemon]` group; everything else
/// in the file is preserved. The file ends up owner-rw, group/other-read —
/// the store must never be left world-writable by a privileged writer.
pub fn set_active_theme(layout: &HelperLayout, theme: &str) -> Result<(), HelperError> {
    let path = layout.config_path();
    let config_failed = |source| HelperError::Config {
        path: path.to_path_buf(),
        source,
    };

    let existing = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(source) => return Err(config_failed(source)),
    };

    let updated = set_group_entry(&existing, DAEMON_GROUP, THEME_KEY, theme);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(config_failed)?;
    }
    fs::write(path, updated).map_err(config_failed)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        fs::set_permissions(path, fs::Permissions::from_mode(0o644)).map_err(config_failed)?;
    }

    debug!(theme, config = %path.display(), "active theme persisted");
    Ok(())
}

/// Line-based read-modify-write of a `[group]` / `key=value` store.
fn set_group_entry(raw: &str, group: &str, key: &str, value: &str) -> String {
    let header = format!("[{group}]");
    let entry = format!("{key}={value}");
    let key_prefix = format!("{key}=");

    let mut output = Vec::new();
    let mut in_group = false;
    let mut written = false;

    for line in raw.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with('[') {
            // Leaving the target group without having seen the key: the
            // entry belongs at the end of that group.
            if in_group && !written {
                output.push(entry.clone());
                written = true;
            }
            in_group = trimmed == header;
        } else if in_group && !written && trimmed.starts_with(&key_prefix) {
            output.push(entry.clone());
            written = true;
            continue;
        }
        output.push(line.to_string());
    }

    if !written {
        if !in_group {
            if !output.is_empty() && !output.last().is_some_and(|line| line.is_empty()) {
                output.push(String::new());
            }
            output.push(header);
        }
        output.push(entry);
    }

    let mut joined = output.join("\n");
    joined.push('\n');
    joined
}
