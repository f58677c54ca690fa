mod config;
mod extract;
mod registry;
mod rebuild;

pub use config::set_active_theme;
pub use extract::{install_theme, InstallLayout};
pub use rebuild::{rebuild_boot_image, REBUILD_TIMEOUT};
pub use registry::{remove_theme, resolve_theme, themes};

use std::path::{Path, PathBuf};

/// The fixed filesystem surface one helper invocation operates on: where
/// themes live, where the active-theme setting persists, and which command
/// regenerates the boot image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelperLayout {
    themes_root: PathBuf,
    config_path: PathBuf,
    rebuild_command: PathBuf,
}

impl HelperLayout {
    pub fn new(
        themes_root: impl Into<PathBuf>,
        config_path: impl Into<PathBuf>,
        rebuild_command: impl Into<PathBuf>,
    ) -> Self {
        Self {
            themes_root: themes_root.into(),
            config_path: config_path.into(),
            rebuild_command: rebuild_command.into(),
        }
    }

    pub fn system_default() -> Self {
        Self::new(
            "/usr/share/bootsplash/themes",
            "/etc/bootsplash/bootsplash.conf",
            "/usr/sbin/update-initramfs",
        )
    }

    pub fn themes_root(&self) -> &Path {
        &self.themes_root
    }

    pub fn theme_dir(&self, name: &str) -> PathBuf {
        self.themes_root.join(name)
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn rebuild_command(&self) -> &Path {
        &self.rebuild_command
    }
}
