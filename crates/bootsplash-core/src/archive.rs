use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::HelperError;

/// Compression wrapped around a sequential tar stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TarCompression {
    None,
    Gzip,
    Bzip2,
    Lzma,
    Xz,
}

/// Decoder family selected for an archive file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    Zip,
    Tar(TarCompression),
}

// The sniff buffer must cover the `ustar` magic, which sits past the name
// and mode fields of the first tar header block.
const SNIFF_LEN: usize = 512;
const USTAR_MAGIC_OFFSET: usize = 257;

impl ArchiveKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Zip => "zip",
            Self::Tar(TarCompression::None) => "tar",
            Self::Tar(TarCompression::Gzip) => "tar.gz",
            Self::Tar(TarCompression::Bzip2) => "tar.bz2",
            Self::Tar(TarCompression::Lzma) => "tar.lzma",
            Self::Tar(TarCompression::Xz) => "tar.xz",
        }
    }

    /// Determine the archive kind from file content, never from the file
    /// name. Anything outside the recognized set is a hard failure and must
    /// not be handed to a decoder.
    pub fn sniff(path: &Path) -> Result<Self, HelperError> {
        let mut file = File::open(path).map_err(|source| HelperError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;

        let mut header = [0u8; SNIFF_LEN];
        let len = read_up_to(&mut file, &mut header).map_err(|source| HelperError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let header = &header[..len];

        // "PK\x05\x06" is the end-of-central-directory record an empty zip
        // starts with.
        if header.starts_with(b"PK\x03\x04") || header.starts_with(b"PK\x05\x06") {
            return Ok(Self::Zip);
        }
        if header.starts_with(&[0x1f, 0x8b]) {
            return Ok(Self::Tar(TarCompression::Gzip));
        }
        if header.starts_with(b"BZh") {
            return Ok(Self::Tar(TarCompression::Bzip2));
        }
        if header.starts_with(&[0xfd, b'7', b'z', b'X', b'Z', 0x00]) {
            return Ok(Self::Tar(TarCompression::Xz));
        }
        // Standalone lzma has no magic; the default-preset properties byte
        // followed by a little-endian dictionary size is the usual marker.
        if header.starts_with(&[0x5d, 0x00, 0x00]) {
            return Ok(Self::Tar(TarCompression::Lzma));
        }
        if header.len() > USTAR_MAGIC_OFFSET + 5
            && &header[USTAR_MAGIC_OFFSET..USTAR_MAGIC_OFFSET + 5] == b"ustar"
        {
            return Ok(Self::Tar(TarCompression::None));
        }

        Err(HelperError::UnknownFormat {
            path: path.to_path_buf(),
        })
    }
}

fn read_up_to(reader: &mut impl Read, buffer: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buffer.len() {
        match reader.read(&mut buffer[filled..])? {
            0 => break,
            n => filled += n,
        }
    }
    Ok(filled)
}
