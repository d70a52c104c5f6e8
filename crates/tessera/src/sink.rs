//! atomic token sink
//!
//! publishes credential bytes to a path so that readers observe either the
//! previous contents or the new contents, never a partial write. the token
//! goes to `<name>.tmp.<8 hex>` in the target directory (same filesystem),
//! is flushed to disk, and is then renamed over the target. the rename is
//! the only point at which the target changes.
//!
//! an empty payload is a probe: the temp file is created, written, closed
//! and unlinked, which proves permissions and free space without touching
//! the target.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::config::SinkConfig;
use crate::rng::{os_random, random_hex, RandomSource, SharedRandom};
use crate::{Error, Result};

/// permission bits a sink mode may carry (rwx for ugo plus setuid/setgid/sticky)
pub const PERMISSION_BITS: u32 = 0o7777;

/// random bytes in the temp suffix, rendered as twice as many hex chars
const TEMP_SUFFIX_BYTES: usize = 4;

/// one publication of a token to a path
#[derive(Debug, Clone, Copy)]
pub struct SinkJob<'a> {
    pub path: &'a Path,
    pub mode: u32,
    pub payload: &'a [u8],
    pub probe: bool,
}

impl<'a> SinkJob<'a> {
    /// a job for `payload`; an empty payload makes it a probe
    pub fn new(path: &'a Path, payload: &'a [u8], mode: u32) -> Self {
        Self {
            path,
            mode,
            payload,
            probe: payload.is_empty(),
        }
    }

    pub fn probe(path: &'a Path, mode: u32) -> Self {
        Self {
            path,
            mode,
            payload: &[],
            probe: true,
        }
    }

    /// run the job, drawing the temp suffix from `rng`
    pub fn run(&self, rng: &dyn RandomSource) -> Result<()> {
        check_mode(self.mode)?;

        let (dir, base) = split_target(self.path)?;
        check_directory(&dir)?;

        let mut name = OsString::from(base);
        name.push(".tmp.");
        name.push(random_hex(rng, TEMP_SUFFIX_BYTES)?);
        let temp = dir.join(name);

        let file = create_temp(&temp, self.mode)?;
        if let Err(e) = fill_and_close(file, &temp, self.payload) {
            remove_temp(&temp);
            return Err(e);
        }

        if self.probe {
            remove_temp(&temp);
            debug!("sink probe ok for {}", self.path.display());
            return Ok(());
        }

        if let Err(source) = fs::rename(&temp, self.path) {
            remove_temp(&temp);
            return Err(Error::RenameFailed {
                path: self.path.to_path_buf(),
                source,
            });
        }

        debug!("published {} bytes to {}", self.payload.len(), self.path.display());
        Ok(())
    }
}

/// publish `payload` to `path` with `mode`, using the os random source for
/// the temp name. an empty payload probes instead of publishing.
pub fn write(path: impl AsRef<Path>, payload: &[u8], mode: u32) -> Result<()> {
    SinkJob::new(path.as_ref(), payload, mode).run(&*os_random())
}

/// a configured sink that publishes every new token to one path
pub struct FileSink {
    config: SinkConfig,
    rng: SharedRandom,
}

impl FileSink {
    /// create the sink and probe the target so misconfiguration fails now
    pub fn new(config: SinkConfig) -> Result<Self> {
        Self::with_rng(config, os_random())
    }

    pub fn with_rng(config: SinkConfig, rng: SharedRandom) -> Result<Self> {
        let sink = Self { config, rng };
        SinkJob::probe(&sink.config.path, sink.mode()).run(&*sink.rng)?;
        Ok(sink)
    }

    pub fn path(&self) -> &Path {
        &self.config.path
    }

    pub fn mode(&self) -> u32 {
        self.config.effective_mode()
    }

    /// publish `token`; an empty token re-probes the target
    pub fn write_token(&self, token: &[u8]) -> Result<()> {
        SinkJob::new(&self.config.path, token, self.mode()).run(&*self.rng)
    }
}

fn check_mode(mode: u32) -> Result<()> {
    if mode & !PERMISSION_BITS != 0 {
        return Err(Error::BadMode { mode });
    }
    Ok(())
}

/// directory and final component of the target
fn split_target(path: &Path) -> Result<(PathBuf, &std::ffi::OsStr)> {
    let base = path.file_name().ok_or_else(|| Error::FilesystemUnavailable {
        path: path.to_path_buf(),
        source: io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"),
    })?;

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok((dir, base))
}

fn check_directory(dir: &Path) -> Result<()> {
    let meta = fs::metadata(dir).map_err(|source| classify(dir, source))?;
    if !meta.is_dir() {
        return Err(Error::FilesystemUnavailable {
            path: dir.to_path_buf(),
            source: io::Error::new(io::ErrorKind::Other, "not a directory"),
        });
    }
    Ok(())
}

fn create_temp(temp: &Path, mode: u32) -> Result<File> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(mode);
    }

    let file = options.open(temp).map_err(|source| classify(temp, source))?;

    // open() is filtered through the umask, set the exact bits afterwards
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Err(source) = file.set_permissions(fs::Permissions::from_mode(mode)) {
            drop(file);
            remove_temp(temp);
            return Err(classify(temp, source));
        }
    }
    #[cfg(not(unix))]
    let _ = mode;

    Ok(file)
}

fn fill_and_close(mut file: File, temp: &Path, payload: &[u8]) -> Result<()> {
    file.write_all(payload).map_err(|source| Error::WriteFailed {
        path: temp.to_path_buf(),
        source,
    })?;

    // flush to disk before the rename can expose the file; errors that a
    // close would report surface here
    file.sync_all().map_err(|source| Error::CloseFailed {
        path: temp.to_path_buf(),
        source,
    })?;
    drop(file);
    Ok(())
}

fn classify(path: &Path, source: io::Error) -> Error {
    let path = path.to_path_buf();
    if source.kind() == io::ErrorKind::PermissionDenied {
        Error::PermissionDenied { path, source }
    } else {
        Error::FilesystemUnavailable { path, source }
    }
}

fn remove_temp(temp: &Path) {
    match fs::remove_file(temp) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!("leaving temporary token file {}: {}", temp.display(), e),
    }
}
