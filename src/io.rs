// File-level persistence helpers.
//
// `save_file()` streams the history into a temporary file next to the
// destination and renames it into place only after a successful flush and
// sync, so a failed save never leaves a half-written history at `path`.
// `load_file()` reads the whole document before parsing. SHA-256 checksums of
// the bytes written/read are computed when the `file-io` feature is enabled.

use std::io::{self, BufWriter, Write};
use std::path::Path;

#[cfg(feature = "file-io")]
use sha2::Digest;

use crate::error::{Result, StoreError};
use crate::store::{StoreOptions, VersionStore};

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// Statistics returned by `save_file()`.
#[derive(Debug, Clone)]
pub struct SaveStats {
    /// Versions written.
    pub versions: usize,
    /// Size of the history file in bytes.
    pub bytes: u64,
    /// SHA-256 of the file contents (if `file-io` feature is enabled).
    pub sha256: Option<[u8; 32]>,
}

/// Statistics returned by `load_file()`.
#[derive(Debug, Clone)]
pub struct LoadStats {
    /// Versions restored.
    pub versions: usize,
    /// Size of the history file in bytes.
    pub bytes: u64,
    /// SHA-256 of the file contents (if `file-io` feature is enabled).
    pub sha256: Option<[u8; 32]>,
}

// ---------------------------------------------------------------------------
// Default buffer size
// ---------------------------------------------------------------------------

const BUF_SIZE: usize = 64 * 1024; // 64 KiB

// ---------------------------------------------------------------------------
// save_file
// ---------------------------------------------------------------------------

/// Persist `store` to `path`, atomically replacing any existing file.
pub fn save_file(store: &VersionStore, path: &Path) -> Result<SaveStats> {
    let (bytes, sha256) = write_atomically(path, |w| store.save(w))?;
    Ok(SaveStats {
        versions: store.len(),
        bytes,
        sha256,
    })
}

/// Stream `write` into a temporary file next to `path` and rename it into
/// place. If `write` fails, `path` is not touched.
fn write_atomically<F>(path: &Path, write: F) -> Result<(u64, Option<[u8; 32]>)>
where
    F: FnOnce(&mut dyn Write) -> Result<()>,
{
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let tmp = tempfile::NamedTempFile::new_in(dir)?;

    let mut writer = CountingWriter {
        inner: BufWriter::with_capacity(BUF_SIZE, tmp),
        bytes: 0,
        #[cfg(feature = "file-io")]
        hasher: sha2::Sha256::new(),
    };
    write(&mut writer)?;
    writer.flush()?;

    let bytes = writer.bytes;
    #[cfg(feature = "file-io")]
    let sha256 = Some(writer.hasher.finalize().into());
    #[cfg(not(feature = "file-io"))]
    let sha256: Option<[u8; 32]> = None;

    let tmp = writer.inner.into_inner().map_err(|e| e.into_error())?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| StoreError::IoFailure(e.error))?;

    log::debug!("wrote {} ({bytes} bytes)", path.display());
    Ok((bytes, sha256))
}

// ---------------------------------------------------------------------------
// load_file
// ---------------------------------------------------------------------------

/// Read a history file into a new store.
pub fn load_file(path: &Path, opts: StoreOptions) -> Result<(VersionStore, LoadStats)> {
    let data = std::fs::read(path)?;
    let store = VersionStore::from_reader(data.as_slice(), opts)?;

    #[cfg(feature = "file-io")]
    let sha256 = Some(sha2::Sha256::digest(&data).into());
    #[cfg(not(feature = "file-io"))]
    let sha256: Option<[u8; 32]> = None;

    let stats = LoadStats {
        versions: store.len(),
        bytes: data.len() as u64,
        sha256,
    };
    log::debug!("read {} ({} bytes)", path.display(), stats.bytes);
    Ok((store, stats))
}

/// Like `load_file()`, but a missing file yields an empty store.
pub fn load_or_default(path: &Path, opts: StoreOptions) -> Result<VersionStore> {
    match load_file(path, opts.clone()) {
        Ok((store, _)) => Ok(store),
        Err(StoreError::IoFailure(e)) if e.kind() == io::ErrorKind::NotFound => {
            Ok(VersionStore::with_options(opts))
        }
        Err(e) => Err(e),
    }
}

/// Lowercase hex rendering of a checksum.
pub fn hex_digest(digest: &[u8; 32]) -> String {
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

// ---------------------------------------------------------------------------
// Counting writer
// ---------------------------------------------------------------------------

struct CountingWriter<W: Write> {
    inner: W,
    bytes: u64,
    #[cfg(feature = "file-io")]
    hasher: sha2::Sha256,
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.bytes += n as u64;
        #[cfg(feature = "file-io")]
        self.hasher.update(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
