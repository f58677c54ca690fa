use std::fs;
use std::path::{Component, Path, PathBuf};

use bootsplash_core::HelperError;

use crate::HelperLayout;

/// Sorted names of the installed theme directories.
pub fn themes(layout: &HelperLayout) -> Result<Vec<String>, HelperError> {
    let root = layout.themes_root();
    if !root.is_dir() {
        return Err(HelperError::MissingThemesRoot {
            path: root.to_path_buf(),
        });
    }

    let read_context = |source| HelperError::Io {
        context: format!("failed to read themes directory {}", root.display()),
        source,
    };

    let mut names = Vec::new();
    for entry in fs::read_dir(root).map_err(read_context)? {
        let entry = entry.map_err(read_context)?;
        if entry.file_type().map_err(read_context)?.is_dir() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}

/// Resolve a theme name to its directory. Names carrying separators or
/// parent components never resolve, regardless of what exists on disk.
pub fn resolve_theme(layout: &HelperLayout, name: &str) -> Result<PathBuf, HelperError> {
    let root = layout.themes_root();
    if !root.is_dir() {
        return Err(HelperError::MissingThemesRoot {
            path: root.to_path_buf(),
        });
    }

    if !is_plain_name(name) {
        return Err(HelperError::NotFound {
            name: name.to_string(),
        });
    }

    let dir = layout.theme_dir(name);
    if !dir.is_dir() {
        return Err(HelperError::NotFound {
            name: name.to_string(),
        });
    }
    Ok(dir)
}

/// Recursively delete an installed theme. A partial deletion surfaces as
/// `RemovalFailed`, never as silent success.
pub fn remove_theme(layout: &HelperLayout, name: &str) -> Result<(), HelperError> {
    let dir = resolve_theme(layout, name)?;
    fs::remove_dir_all(&dir).map_err(|source| HelperError::RemovalFailed {
        name: name.to_string(),
        source,
    })
}

fn is_plain_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}
