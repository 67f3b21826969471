//! Zip archive helpers: build an archive from files on disk, read one back.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{Read, Seek, Write};
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::{debug, instrument};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::fs::remove_file;
use crate::logf;
use crate::logging::Logger;

/// Archive entry name → entry bytes.
pub type ZipContents = BTreeMap<String, Vec<u8>>;

/// Read every entry of the archive at `path` into memory.
///
/// Directory entries (names ending in `/`) map to empty contents.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn read_zip_file(path: &Path) -> Result<ZipContents> {
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut archive =
        ZipArchive::new(file).with_context(|| format!("read zip archive {}", path.display()))?;
    let mut contents = ZipContents::new();
    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .with_context(|| format!("open entry {index} of {}", path.display()))?;
        let name = entry.name().to_string();
        let mut data = Vec::new();
        entry
            .read_to_end(&mut data)
            .with_context(|| format!("read entry {name} of {}", path.display()))?;
        contents.insert(name, data);
    }
    debug!(entries = contents.len(), "archive read");
    Ok(contents)
}

/// Add the file at `path` to the archive as `entry_name`.
///
/// `entry_name` is relative; its separators become `/` in the archive.
pub fn zip_add_file<W: Write + Seek>(
    log: &Logger,
    zw: &mut ZipWriter<W>,
    entry_name: &Path,
    path: &Path,
) -> Result<()> {
    let name = entry_name_of(entry_name)?;
    let data = fs::read(path).with_context(|| format!("read {}", path.display()))?;
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    zw.start_file(name.as_str(), options)
        .with_context(|| format!("start zip entry {name}"))?;
    zw.write_all(&data)
        .with_context(|| format!("write zip entry {name}"))?;
    logf!(log, "  added {} from {}\n", name, path.display());
    Ok(())
}

/// Add every regular file under `base_dir/dir_to_zip`, named relative to `base_dir`.
///
/// Symlinks, devices, sockets and other special files are rejected.
pub fn zip_dir_recur<W: Write + Seek>(
    log: &Logger,
    zw: &mut ZipWriter<W>,
    base_dir: &Path,
    dir_to_zip: &Path,
) -> Result<()> {
    let root = base_dir.join(dir_to_zip);
    for entry in WalkDir::new(&root).min_depth(1).sort_by_file_name() {
        let entry = entry.with_context(|| format!("walk {}", root.display()))?;
        let file_type = entry.file_type();
        if file_type.is_dir() {
            continue;
        }
        if !file_type.is_file() {
            bail!("{} is not a dir or regular file", entry.path().display());
        }
        let relative = entry.path().strip_prefix(base_dir).with_context(|| {
            format!(
                "{} is outside {}",
                entry.path().display(),
                base_dir.display()
            )
        })?;
        zip_add_file(log, zw, relative, entry.path())?;
    }
    Ok(())
}

/// Create a zip archive at `dst` from the given entries of `base_dir`.
///
/// Directories are added recursively. Any existing file at `dst` is replaced.
/// At least one name is required; without one `dst` is left untouched. A
/// failure part-way through can leave an incomplete archive behind.
#[instrument(skip_all, fields(dst = %dst.display(), names = names.len()))]
pub fn create_zip_file<P: AsRef<Path>>(
    log: &Logger,
    dst: &Path,
    base_dir: &Path,
    names: &[P],
) -> Result<()> {
    if names.is_empty() {
        bail!("must provide at least one name to zip");
    }
    remove_file(log, dst);
    logf!(log, "Creating zip file {}\n", dst.display());
    let file = File::create(dst).with_context(|| format!("create {}", dst.display()))?;
    let mut zw = ZipWriter::new(file);
    for name in names {
        let name = name.as_ref();
        let path = base_dir.join(name);
        let meta = fs::metadata(&path).with_context(|| format!("stat {}", path.display()))?;
        if meta.is_dir() {
            zip_dir_recur(log, &mut zw, base_dir, name)?;
        } else if meta.is_file() {
            zip_add_file(log, &mut zw, name, &path)?;
        } else {
            bail!("{} is not a dir or regular file", path.display());
        }
    }
    zw.finish()
        .with_context(|| format!("finish zip archive {}", dst.display()))?;
    Ok(())
}

/// Write every entry of the archive at `archive` under `dest`.
///
/// Directory entries become directories. Returns the number of files written.
/// Entries whose names would land outside `dest` are rejected before anything
/// is written.
#[instrument(skip_all, fields(archive = %archive.display(), dest = %dest.display()))]
pub fn extract_zip_file(log: &Logger, archive: &Path, dest: &Path) -> Result<usize> {
    let contents = read_zip_file(archive)?;
    let mut targets = Vec::with_capacity(contents.len());
    let mut dirs = Vec::new();
    for (name, data) in &contents {
        let target = entry_destination(dest, name)?;
        if is_dir_entry(name) {
            dirs.push(target);
        } else {
            targets.push((target, data));
        }
    }
    for dir in &dirs {
        fs::create_dir_all(dir).with_context(|| format!("create directory {}", dir.display()))?;
    }
    for (target, data) in &targets {
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create directory {}", parent.display()))?;
        }
        fs::write(target, data).with_context(|| format!("write {}", target.display()))?;
        logf!(log, "  extracted {}\n", target.display());
    }
    Ok(targets.len())
}

/// True for archive entries that name a directory rather than a file.
pub fn is_dir_entry(name: &str) -> bool {
    name.ends_with('/')
}

/// Join a `/`-separated archive entry name onto `dest`.
fn entry_destination(dest: &Path, name: &str) -> Result<PathBuf> {
    let mut target = dest.to_path_buf();
    for part in name.split('/') {
        match part {
            "" | "." => {}
            ".." => bail!("zip entry {name} escapes {}", dest.display()),
            part if part.contains('\\') || Path::new(part).has_root() => {
                bail!("zip entry {name} escapes {}", dest.display())
            }
            part => target.push(part),
        }
    }
    if name.starts_with('/') || target == dest {
        bail!("invalid zip entry name {name:?}");
    }
    Ok(target)
}

/// Archive entry name for a relative path, with `/` separators.
fn entry_name_of(path: &Path) -> Result<String> {
    let mut parts = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::CurDir => {}
            _ => bail!("zip entry name must be a relative path: {}", path.display()),
        }
    }
    if parts.is_empty() {
        bail!("zip entry name is empty: {}", path.display());
    }
    Ok(parts.join("/"))
}
