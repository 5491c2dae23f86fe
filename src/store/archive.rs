// src/store/archive.rs

//! Gzip'd tar archives of recipe directories

use crate::error::Result;
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use std::fs::{self, File};
use std::path::Path;
use tar::{Archive, Builder};

/// Compress the contents of `src_dir` into a `.tar.gz` at `dest`
///
/// Entries are stored relative to `src_dir` (under `./`). Returns the size of
/// the written archive.
pub fn compress_dir(src_dir: &Path, dest: &Path) -> Result<u64> {
    let output_file = File::create(dest)?;
    let encoder = GzEncoder::new(output_file, Compression::default());
    let mut archive = Builder::new(encoder);
    archive.follow_symlinks(false);

    archive.append_dir_all(".", src_dir)?;

    let encoder = archive.into_inner()?;
    let file = encoder.finish()?;
    file.sync_all()?;

    Ok(fs::metadata(dest)?.len())
}

/// List the regular file paths stored in a `.tar.gz`, in archive order
pub fn list_files(path: &Path) -> Result<Vec<String>> {
    let file = File::open(path)?;
    let mut archive = Archive::new(GzDecoder::new(file));

    let mut names = Vec::new();
    for entry in archive.entries()? {
        let entry = entry?;
        if !entry.header().entry_type().is_file() {
            continue;
        }
        let entry_path = entry.path()?;
        let name = entry_path
            .strip_prefix(".")
            .unwrap_or(&entry_path)
            .to_string_lossy()
            .into_owned();
        names.push(name);
    }

    Ok(names)
}
