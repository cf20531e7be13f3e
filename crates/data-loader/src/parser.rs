//! Parser for interaction CSV exports.
//!
//! Format (header line optional):
//!
//! ```text
//! userId,itemId,rating,implicitScore
//! u1,B12,4,
//! u1,B7,,3.5
//! ```
//!
//! An empty field means "missing". Ids are kept as opaque strings. A fifth
//! `itemName` column is optional and takes the rest of the line, so names
//! may contain commas.

use crate::error::{DataLoadError, Result};
use crate::types::*;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// Column names of the canonical export
pub const HEADER: [&str; 4] = ["userId", "itemId", "rating", "implicitScore"];

/// Optional trailing column with the book's display name
pub const NAME_COLUMN: &str = "itemName";

fn read_lines(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => DataLoadError::FileNotFound {
            path: path.display().to_string(),
        },
        _ => DataLoadError::IoError(e),
    })?;
    Ok(content.lines().map(|s| s.to_string()).collect())
}

/// Parse the interactions file at `path`
pub fn parse_interactions(path: &Path) -> Result<Vec<Interaction>> {
    let file = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let lines = read_lines(path)?;
    parse_lines(&file, lines.iter().map(|s| s.as_str()))
}

/// Parse already-read lines; `file` is only used for error context
pub fn parse_lines<'a>(
    file: &str,
    lines: impl IntoIterator<Item = &'a str>,
) -> Result<Vec<Interaction>> {
    let mut interactions = Vec::new();

    for (idx, line) in lines.into_iter().enumerate() {
        let line_no = idx + 1;
        // spreadsheet exports prefix the first line with a UTF-8 BOM
        let line = if line_no == 1 { line.trim_start_matches('\u{feff}') } else { line };
        let line_trimmed = line.trim();
        if line_trimmed.is_empty() {
            continue;
        }
        if line_no == 1 && is_header(line_trimmed) {
            continue;
        }

        let parts: Vec<&str> = line_trimmed
            .splitn(HEADER.len() + 1, ',')
            .map(str::trim)
            .collect();
        if parts.len() < HEADER.len() {
            return Err(DataLoadError::FieldCountMismatch {
                expected: HEADER.len(),
                found: parts.len(),
                line: line_no,
            });
        }

        let user_id = required_field(file, line_no, "userId", parts[0])?;
        let item_id = required_field(file, line_no, "itemId", parts[1])?;

        let interaction = Interaction {
            user_id,
            item_id,
            rating: optional_score(file, line_no, "rating", parts[2])?,
            implicit_score: optional_score(file, line_no, "implicitScore", parts[3])?,
            item_name: parts
                .get(HEADER.len())
                .filter(|name| !name.is_empty())
                .map(|name| name.to_string()),
        };

        if interaction.is_empty() {
            return Err(DataLoadError::ValidationError(format!(
                "line {} in {}: neither rating nor implicitScore is present",
                line_no, file
            )));
        }

        interactions.push(interaction);
    }

    Ok(interactions)
}

fn is_header(line: &str) -> bool {
    line.split(',')
        .next()
        .map(|first| first.trim().eq_ignore_ascii_case(HEADER[0]))
        .unwrap_or(false)
}

fn required_field(file: &str, line: usize, name: &str, value: &str) -> Result<String> {
    if value.is_empty() {
        return Err(DataLoadError::ParseError {
            file: file.to_string(),
            line,
            reason: format!("Missing {}", name),
        });
    }
    Ok(value.to_string())
}

fn optional_score(file: &str, line: usize, name: &str, value: &str) -> Result<Option<f64>> {
    if value.is_empty() {
        return Ok(None);
    }
    let parsed: f64 = value.parse().map_err(|e| DataLoadError::ParseError {
        file: file.to_string(),
        line,
        reason: format!("Invalid {}: {}", name, e),
    })?;
    if !parsed.is_finite() {
        return Err(DataLoadError::InvalidValue {
            field: name.to_string(),
            value: value.to_string(),
        });
    }
    Ok(Some(parsed))
}
