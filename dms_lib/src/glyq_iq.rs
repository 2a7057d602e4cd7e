//! Splitting GlyQ-IQ target lists across cores and merging the per-core results.

use anyhow::{bail, Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// A tab-delimited target list: a header line followed by one target per line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetList {
    pub header: String,
    pub targets: Vec<String>,
}

impl TargetList {
    pub fn read(path: &Path) -> Result<Self> {
        let reader = BufReader::new(File::open(path).with_context(|| path.display().to_string())?);
        let mut lines = reader.lines();
        let Some(header) = lines.next().transpose()? else {
            bail!("target file {} is empty", path.display());
        };
        let targets = lines
            .filter(|line| !matches!(line, Ok(l) if l.trim().is_empty()))
            .collect::<std::io::Result<Vec<_>>>()
            .with_context(|| path.display().to_string())?;
        Ok(TargetList { header, targets })
    }

    /// Contiguous runs of targets, one per chunk, whose sizes differ by at most one.
    pub fn split(&self, chunks: usize) -> Vec<&[String]> {
        let mut parts = Vec::with_capacity(chunks);
        let mut start = 0;
        for size in chunk_sizes(self.targets.len(), chunks) {
            parts.push(&self.targets[start..start + size]);
            start += size;
        }
        parts
    }

    pub fn write_part(&self, targets: &[String], path: &Path) -> Result<()> {
        let mut out =
            BufWriter::new(File::create(path).with_context(|| path.display().to_string())?);
        writeln!(out, "{}", self.header)?;
        for target in targets {
            writeln!(out, "{target}")?;
        }
        out.flush()?;
        Ok(())
    }
}

/// Number of GlyQ-IQ instances to run: no more than the cores available, the
/// configured maximum, or the number of targets, and at least one.
pub fn core_count(targets: usize, cores: usize, max_cores: usize) -> usize {
    targets.min(cores).min(max_cores).max(1)
}

/// Sizes of `chunks` contiguous chunks covering `total` items. Earlier chunks
/// take the remainder. Empty chunks are dropped.
pub fn chunk_sizes(total: usize, chunks: usize) -> Vec<usize> {
    let chunks = chunks.max(1);
    let base = total / chunks;
    let extra = total % chunks;
    (0..chunks)
        .map(|i| base + usize::from(i < extra))
        .filter(|&size| size > 0)
        .collect()
}

/// Concatenate result files that each begin with the same header, keeping one
/// header. Returns the number of result rows written.
pub fn merge_results<P: AsRef<Path>>(parts: &[P], merged: &Path) -> Result<usize> {
    let mut out =
        BufWriter::new(File::create(merged).with_context(|| merged.display().to_string())?);
    let mut header: Option<String> = None;
    let mut rows = 0;
    for part in parts {
        let part = part.as_ref();
        let reader = BufReader::new(File::open(part).with_context(|| part.display().to_string())?);
        let mut lines = reader.lines();
        let Some(part_header) = lines.next().transpose()? else {
            continue;
        };
        match &header {
            None => {
                writeln!(out, "{part_header}")?;
                header = Some(part_header);
            }
            Some(h) if *h != part_header => {
                bail!(
                    "{} has a different header than the other GlyQ-IQ results",
                    part.display()
                );
            }
            Some(_) => {}
        }
        for line in lines {
            let line = line?;
            if !line.trim().is_empty() {
                writeln!(out, "{line}")?;
                rows += 1;
            }
        }
    }
    out.flush()?;
    Ok(rows)
}
