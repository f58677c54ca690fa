use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Component, Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use bootsplash_core::{ArchiveKind, HelperError, TarCompression};
use bzip2::read::BzDecoder;
use flate2::read::GzDecoder;
use tracing::debug;
use xz2::read::XzDecoder;

use crate::HelperLayout;

/// Where an archive's contents land and under which theme name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallLayout {
    pub theme_name: String,
    pub install_path: PathBuf,
}

/// Scoped staging directory for decoding untrusted archives. Removed on
/// drop, so every exit path from an install releases it.
struct StagingDir {
    path: PathBuf,
}

impl StagingDir {
    fn create() -> Result<Self, HelperError> {
        let path = std::env::temp_dir().join(format!(
            "bootsplash-install-{}-{}",
            std::process::id(),
            unix_timestamp()
        ));
        fs::create_dir_all(&path).map_err(|source| HelperError::Io {
            context: format!("failed to create staging directory {}", path.display()),
            source,
        })?;
        Ok(Self { path })
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StagingDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}

/// Install a theme bundle from `archive_path` into the themes root.
///
/// The archive is decoded into a staging directory first; the themes root
/// is only touched once every entry path has been validated and the
/// destination is known to be free. A failed move cleans up whatever was
/// partially written, so no half-populated theme directory survives.
pub fn install_theme(
    archive_path: &Path,
    layout: &HelperLayout,
) -> Result<InstallLayout, HelperError> {
    let themes_root = layout.themes_root();
    if !themes_root.is_dir() {
        return Err(HelperError::MissingThemesRoot {
            path: themes_root.to_path_buf(),
        });
    }

    let kind = ArchiveKind::sniff(archive_path)?;
    debug!(archive = %archive_path.display(), kind = kind.as_str(), "decoding theme archive");

    let staging = StagingDir::create()?;
    match kind {
        ArchiveKind::Zip => extract_zip(archive_path, staging.path())?,
        ArchiveKind::Tar(compression) => extract_tar(archive_path, staging.path(), compression)?,
    }

    let entries = top_level_entries(staging.path())?;
    let (theme_name, staged_source) = match entries.as_slice() {
        [] => {
            return Err(HelperError::EmptyArchive {
                path: archive_path.to_path_buf(),
            })
        }
        // A single top-level entry names the theme itself.
        [only] => (only.clone(), staging.path().join(only)),
        // Loose contents get grouped under the archive's own base name.
        _ => (
            archive_base_name(archive_path)?,
            staging.path().to_path_buf(),
        ),
    };

    let install_path = resolve_install_path(themes_root, &theme_name)?;
    if install_path.symlink_metadata().is_ok() {
        return Err(HelperError::AlreadyExists {
            name: theme_name,
            path: install_path,
        });
    }

    if let Err(source) = move_dir_or_copy(&staged_source, &install_path) {
        let _ = fs::remove_dir_all(&install_path);
        return Err(HelperError::Io {
            context: format!(
                "failed to move staged theme into {}",
                install_path.display()
            ),
            source,
        });
    }

    Ok(InstallLayout {
        theme_name,
        install_path,
    })
}

/// The derived theme name must be one plain path component, and the
/// destination it produces must stay inside the canonicalized themes root.
fn resolve_install_path(themes_root: &Path, theme_name: &str) -> Result<PathBuf, HelperError> {
    let mut components = Path::new(theme_name).components();
    let plain = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    );
    if !plain {
        return Err(HelperError::UnsafePath {
            entry: theme_name.to_string(),
        });
    }

    let canonical_root = themes_root
        .canonicalize()
        .map_err(|source| HelperError::Io {
            context: format!(
                "failed to canonicalize themes directory {}",
                themes_root.display()
            ),
            source,
        })?;
    let resolved = canonical_root.join(theme_name);
    if !resolved.starts_with(&canonical_root) {
        return Err(HelperError::UnsafePath {
            entry: theme_name.to_string(),
        });
    }

    Ok(themes_root.join(theme_name))
}

/// Archive file name up to its first dot: `loose-files.tar.gz` installs as
/// `loose-files`.
fn archive_base_name(archive_path: &Path) -> Result<String, HelperError> {
    archive_path
        .file_name()
        .and_then(|name| name.to_str())
        .and_then(|name| name.split('.').next())
        .filter(|base| !base.is_empty())
        .map(ToOwned::to_owned)
        .ok_or_else(|| HelperError::UnsafePath {
            entry: archive_path.display().to_string(),
        })
}

fn top_level_entries(dir: &Path) -> Result<Vec<String>, HelperError> {
    let read_context = |source| HelperError::Io {
        context: format!("failed to read staging directory {}", dir.display()),
        source,
    };

    let mut names = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_context)? {
        let entry = entry.map_err(read_context)?;
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    names.sort();
    Ok(names)
}

fn extract_zip(archive_path: &Path, dst: &Path) -> Result<(), HelperError> {
    let open_failed = |source| HelperError::OpenFailed {
        path: archive_path.to_path_buf(),
        source,
    };

    let file = File::open(archive_path).map_err(open_failed)?;
    let mut archive = zip::ZipArchive::new(file)
        .map_err(|source| open_failed(io::Error::new(io::ErrorKind::InvalidData, source)))?;

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index).map_err(|source| HelperError::Extract {
            entry: format!("#{index}"),
            source: io::Error::new(io::ErrorKind::InvalidData, source),
        })?;
        let entry_name = entry.name().to_string();
        let Some(relative) = entry.enclosed_name() else {
            return Err(HelperError::UnsafePath { entry: entry_name });
        };

        let out_path = dst.join(relative);
        let extract_failed = |source| HelperError::Extract {
            entry: entry_name.clone(),
            source,
        };

        if entry.is_dir() {
            fs::create_dir_all(&out_path).map_err(extract_failed)?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent).map_err(extract_failed)?;
        }
        let mut out = File::create(&out_path).map_err(extract_failed)?;
        io::copy(&mut entry, &mut out).map_err(extract_failed)?;

        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            use std::os::unix::fs::PermissionsExt;

            fs::set_permissions(&out_path, fs::Permissions::from_mode(mode & 0o777))
                .map_err(extract_failed)?;
        }
    }

    Ok(())
}

fn extract_tar(
    archive_path: &Path,
    dst: &Path,
    compression: TarCompression,
) -> Result<(), HelperError> {
    let open_failed = |source| HelperError::OpenFailed {
        path: archive_path.to_path_buf(),
        source,
    };

    let file = File::open(archive_path).map_err(open_failed)?;
    let reader: Box<dyn Read> = match compression {
        TarCompression::None => Box::new(file),
        TarCompression::Gzip => Box::new(GzDecoder::new(file)),
        TarCompression::Bzip2 => Box::new(BzDecoder::new(file)),
        // liblzma's decoder accepts both the standalone-lzma and xz
        // container framings.
        TarCompression::Lzma | TarCompression::Xz => Box::new(XzDecoder::new(file)),
    };

    let mut archive = tar::Archive::new(reader);
    for entry in archive.entries().map_err(open_failed)? {
        let mut entry = entry.map_err(|source| HelperError::Extract {
            entry: "<stream>".to_string(),
            source,
        })?;
        let entry_name = String::from_utf8_lossy(&entry.path_bytes()).into_owned();
        reject_escaping_entry(&entry_name)?;

        // unpack_in re-checks containment and reports a skipped entry as
        // false rather than an error.
        let unpacked = entry.unpack_in(dst).map_err(|source| HelperError::Extract {
            entry: entry_name.clone(),
            source,
        })?;
        if !unpacked {
            return Err(HelperError::UnsafePath { entry: entry_name });
        }
    }

    Ok(())
}

fn reject_escaping_entry(entry: &str) -> Result<(), HelperError> {
    let path = Path::new(entry);
    let escapes = path.is_absolute()
        || path
            .components()
            .any(|component| matches!(component, Component::ParentDir));
    if escapes {
        return Err(HelperError::UnsafePath {
            entry: entry.to_string(),
        });
    }
    Ok(())
}

fn move_dir_or_copy(src: &Path, dst: &Path) -> io::Result<()> {
    match fs::rename(src, dst) {
        Ok(()) => Ok(()),
        // Staging may sit on a different filesystem than the themes root.
        Err(_) => {
            copy_recursive(src, dst)?;
            if fs::symlink_metadata(src)?.is_dir() {
                fs::remove_dir_all(src)
            } else {
                fs::remove_file(src)
            }
        }
    }
}

fn copy_recursive(src: &Path, dst: &Path) -> io::Result<()> {
    let metadata = fs::symlink_metadata(src)?;
    if !metadata.is_dir() {
        fs::copy(src, dst)?;
        return Ok(());
    }

    fs::create_dir_all(dst)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());
        let metadata = fs::symlink_metadata(&src_path)?;
        if metadata.is_dir() {
            copy_recursive(&src_path, &dst_path)?;
            continue;
        }

        #[cfg(unix)]
        if metadata.file_type().is_symlink() {
            let target = fs::read_link(&src_path)?;
            std::os::unix::fs::symlink(&target, &dst_path)?;
            continue;
        }

        fs::copy(&src_path, &dst_path)?;
    }
    Ok(())
}
