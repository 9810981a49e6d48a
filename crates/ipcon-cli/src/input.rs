//! Reading address lists from files or stdin

use anyhow::{bail, Context, Result};
use std::io::Read;

/// Read all text from a file, or stdin when `file` is `None` or `-`
pub fn read_source(file: Option<&str>) -> Result<String> {
    match file {
        None | Some("-") => {
            let mut content = String::new();
            std::io::stdin()
                .read_to_string(&mut content)
                .context("Failed to read stdin")?;
            Ok(content)
        }
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path))
        }
    }
}

/// Trimmed, non-blank lines of `content`, at most `limit` of them
pub fn collect_lines(content: &str, limit: usize) -> Result<Vec<String>> {
    let lines: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect();

    if lines.len() > limit {
        bail!("Too many lines: {} (limit {})", lines.len(), limit);
    }
    Ok(lines)
}
