//! Scanning and tidying captured console output.

use anyhow::{Context, Result};
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

fn error_pattern() -> &'static Regex {
    static ERROR_LINE: OnceLock<Regex> = OnceLock::new();
    ERROR_LINE.get_or_init(|| Regex::new(r"(?i)\b(error|exception|fatal)\b").unwrap())
}

/// Lines that report an error, exception or fatal condition.
pub fn error_lines<S: AsRef<str>>(lines: &[S]) -> Vec<&str> {
    lines
        .iter()
        .map(AsRef::as_ref)
        .filter(|line| error_pattern().is_match(line))
        .collect()
}

/// Remove lines matching any of `noise`, and repeats of the line before, from
/// a console output file. Returns the number of lines removed.
pub fn prune_console_output(path: &Path, noise: &[Regex]) -> Result<usize> {
    let text = std::fs::read_to_string(path).with_context(|| path.display().to_string())?;

    let mut kept: Vec<&str> = Vec::new();
    let mut removed = 0;
    for line in text.lines() {
        let is_noise = noise.iter().any(|re| re.is_match(line));
        let is_repeat = kept.last() == Some(&line);
        if is_noise || is_repeat {
            removed += 1;
        } else {
            kept.push(line);
        }
    }

    if removed > 0 {
        let mut pruned = kept.join("\n");
        if !kept.is_empty() {
            pruned.push('\n');
        }
        std::fs::write(path, pruned).with_context(|| path.display().to_string())?;
    }
    Ok(removed)
}
