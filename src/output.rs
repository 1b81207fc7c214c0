//! Output naming and JSON file writing

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use serde::Serialize;

/// Characters that are not allowed in output file names
const INVALID_FILENAME_CHARS: &[char] = &['<', '>', ':', '"', '|', '?', '*', '/', '\\'];

/// Replace characters that are invalid in file names with `_`
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| if INVALID_FILENAME_CHARS.contains(&c) { '_' } else { c })
        .collect()
}

/// `%Y%m%d_%H%M%S` stamp used in default output names
pub fn timestamp(now: DateTime<Local>) -> String {
    now.format("%Y%m%d_%H%M%S").to_string()
}

/// Directory a harvest writes into; a trailing `.json` on the requested
/// name is dropped
pub fn output_dir(requested: Option<&str>, now: DateTime<Local>) -> PathBuf {
    match requested {
        Some(name) => PathBuf::from(name.strip_suffix(".json").unwrap_or(name)),
        None => PathBuf::from(format!("canvas_submissions_{}", timestamp(now))),
    }
}

/// File stem for a submission; the number is appended when known
pub fn submission_stem(id: &str, number: &str) -> String {
    if number.is_empty() {
        format!("submission_{id}")
    } else {
        format!("submission_{id}_{number}")
    }
}

pub fn form_file_name(form_id: u64, form_name: &str) -> String {
    format!("form_{form_id}_{}.json", sanitize_filename(form_name))
}

/// Default file name for a submission listing
pub fn submission_list_file_name(
    start_date: Option<&str>,
    end_date: Option<&str>,
    form_id: Option<u64>,
    now: DateTime<Local>,
) -> String {
    match (start_date, end_date, form_id) {
        (Some(start), Some(end), Some(form_id)) => {
            format!("submission_list_form_{form_id}_{start}_to_{end}.json")
        }
        (Some(start), Some(end), None) => format!("submission_list_{start}_to_{end}.json"),
        _ => format!("submission_list_{}.json", timestamp(now)),
    }
}

pub fn forms_list_file_name(now: DateTime<Local>) -> String {
    format!("canvas_forms_{}.json", timestamp(now))
}

/// Create `dir` if needed; returns whether it was created
pub fn ensure_dir(dir: &Path) -> Result<bool> {
    if dir.is_dir() {
        return Ok(false);
    }
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
    Ok(true)
}

/// Render `value` as JSON indented by three spaces
pub fn to_json_string<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"   ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value
        .serialize(&mut serializer)
        .context("Failed to serialize JSON")?;
    String::from_utf8(buf).context("Serialized JSON was not UTF-8")
}

/// Write `value` to `path` as indented JSON
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let content = to_json_string(value)?;
    let mut file = fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    file.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
