//! dms_io
//!
//! File staging and result packaging shared by the step tools.
#![deny(
    future_incompatible,
    nonstandard_style,
    rust_2018_compatibility,
    rust_2021_compatibility,
    rust_2018_idioms,
    unused
)]

use anyhow::{bail, ensure, Context, Result};
use log::{debug, info};
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

// ▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓
// STAGING
// ▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓

fn file_name(path: &Path) -> Result<&std::ffi::OsStr> {
    path.file_name()
        .with_context(|| format!("{} has no file name", path.display()))
}

/// Copy `src` to `dest` and check the copy has the same size as the source.
/// Returns the number of bytes copied.
pub fn copy_file_verified(src: &Path, dest: &Path) -> Result<u64> {
    let expected = fs::metadata(src)
        .with_context(|| src.display().to_string())?
        .len();
    let copied = fs::copy(src, dest)
        .with_context(|| format!("copying {} to {}", src.display(), dest.display()))?;
    ensure!(
        copied == expected && fs::metadata(dest)?.len() == expected,
        "copy of {} is {copied} bytes, expected {expected}",
        src.display()
    );
    debug!("copied {} ({expected} bytes)", src.display());
    Ok(copied)
}

/// Copy a file into `dest_dir`, keeping its name. Returns the path of the copy.
pub fn stage_file(src: &Path, dest_dir: &Path) -> Result<PathBuf> {
    let dest = dest_dir.join(file_name(src)?);
    copy_file_verified(src, &dest)?;
    Ok(dest)
}

/// Copy a file or a whole directory into `dest_dir`, keeping its name.
pub fn stage_path(src: &Path, dest_dir: &Path) -> Result<PathBuf> {
    if !src.is_dir() {
        return stage_file(src, dest_dir);
    }
    let dest = dest_dir.join(file_name(src)?);
    copy_dir(src, &dest)?;
    Ok(dest)
}

/// Recursively copy the directory `src` to `dest`. Returns the number of files copied.
pub fn copy_dir(src: &Path, dest: &Path) -> Result<usize> {
    fs::create_dir_all(dest).with_context(|| dest.display().to_string())?;
    let mut copied = 0;
    for entry in fs::read_dir(src).with_context(|| src.display().to_string())? {
        let entry = entry?;
        let target = dest.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copied += copy_dir(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target)
                .with_context(|| entry.path().display().to_string())?;
            copied += 1;
        }
    }
    Ok(copied)
}

/// Hard link `src` to `dest`, copying when a link cannot be made.
/// Directories are recreated and their files linked one by one.
pub fn link_or_copy(src: &Path, dest: &Path) -> Result<()> {
    if src.is_dir() {
        fs::create_dir_all(dest).with_context(|| dest.display().to_string())?;
        for entry in fs::read_dir(src).with_context(|| src.display().to_string())? {
            let entry = entry?;
            link_or_copy(&entry.path(), &dest.join(entry.file_name()))?;
        }
        return Ok(());
    }
    fs::hard_link(src, dest)
        .or_else(|_| fs::copy(src, dest).map(|_| ()))
        .with_context(|| format!("linking {} to {}", src.display(), dest.display()))
}

// ▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓
// ZIP
// ▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓

fn zip_options() -> FileOptions {
    FileOptions::default().compression_method(CompressionMethod::Deflated)
}

/// Files below `dir`, sorted, as (path, name relative to `dir` with `/` separators).
fn files_below(dir: &Path, prefix: &str, files: &mut Vec<(PathBuf, String)>) -> Result<()> {
    let mut entries = fs::read_dir(dir)
        .with_context(|| dir.display().to_string())?
        .collect::<io::Result<Vec<_>>>()?;
    entries.sort_by_key(fs::DirEntry::file_name);
    for entry in entries {
        let name = format!("{prefix}{}", entry.file_name().to_string_lossy());
        if entry.file_type()?.is_dir() {
            files_below(&entry.path(), &format!("{name}/"), files)?;
        } else {
            files.push((entry.path(), name));
        }
    }
    Ok(())
}

fn write_zip(entries: &[(PathBuf, String)], zip_path: &Path) -> Result<usize> {
    let file = File::create(zip_path).with_context(|| zip_path.display().to_string())?;
    let mut zip = ZipWriter::new(BufWriter::new(file));
    for (path, name) in entries {
        zip.start_file(name.as_str(), zip_options())?;
        let mut reader = File::open(path).with_context(|| path.display().to_string())?;
        io::copy(&mut reader, &mut zip).with_context(|| path.display().to_string())?;
    }
    zip.finish()?.flush()?;
    info!("wrote {} files to {}", entries.len(), zip_path.display());
    Ok(entries.len())
}

/// Zip every file below `dir`, named relative to `dir`. Returns the entry count.
pub fn zip_directory(dir: &Path, zip_path: &Path) -> Result<usize> {
    let mut files = Vec::new();
    files_below(dir, "", &mut files)?;
    files.retain(|(path, _)| path != zip_path);
    write_zip(&files, zip_path)
}

/// Zip the given files, each named by its file name. Returns the entry count.
pub fn zip_files<P: AsRef<Path>>(files: &[P], zip_path: &Path) -> Result<usize> {
    let entries = files
        .iter()
        .map(|path| {
            let path = path.as_ref();
            Ok((
                path.to_path_buf(),
                file_name(path)?.to_string_lossy().into_owned(),
            ))
        })
        .collect::<Result<Vec<_>>>()?;
    write_zip(&entries, zip_path)
}

/// Extract a zip file into `dest`. Returns the extracted file paths.
/// Entries that would land outside `dest` are rejected.
pub fn unzip(zip_path: &Path, dest: &Path) -> Result<Vec<PathBuf>> {
    let file = File::open(zip_path).with_context(|| zip_path.display().to_string())?;
    let mut archive = ZipArchive::new(BufReader::new(file))
        .with_context(|| format!("{} is not a zip file", zip_path.display()))?;

    let mut extracted = Vec::new();
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let Some(relative) = entry.enclosed_name().map(Path::to_path_buf) else {
            bail!(
                "{} contains an entry outside the extraction folder: {}",
                zip_path.display(),
                entry.name()
            );
        };
        let target = dest.join(relative);
        if entry.is_dir() {
            fs::create_dir_all(&target)?;
            continue;
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = File::create(&target).with_context(|| target.display().to_string())?;
        io::copy(&mut entry, &mut out)?;
        extracted.push(target);
    }
    info!(
        "extracted {} files from {}",
        extracted.len(),
        zip_path.display()
    );
    Ok(extracted)
}
