//! Line-level record parsing
//!
//! The reassembled stream is newline-delimited; each line is ideally a JSON
//! object with the short Logan keys `c,f,l,n,i,m`. A line that is not a JSON
//! object degrades to a plain-text record instead of being dropped - corrupt
//! files routinely contain readable non-JSON fragments worth keeping.

use chrono::{SecondsFormat, TimeZone, Utc};
use serde_json::Value;

use crate::types::{LogEntry, ParseStatistics};

/// Logan JSON field keys
mod keys {
    pub const CONTENT: &str = "c";
    pub const FLAG: &str = "f";
    pub const LOG_TIME: &str = "l";
    pub const THREAD_NAME: &str = "n";
    pub const THREAD_ID: &str = "i";
    pub const IS_MAIN_THREAD: &str = "m";
}

/// Parse the reassembled stream into ordered log entries
///
/// Splits on `\n`, `\r\n` and `\r` alike, trims each line, skips (and counts)
/// empty lines, and appends entries in line order.
pub fn parse_content(content: &str, stats: &mut ParseStatistics) -> Vec<LogEntry> {
    let mut entries = Vec::new();

    for line in content.split(['\n', '\r']) {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            stats.empty_lines += 1;
            continue;
        }

        match parse_json_line(trimmed) {
            Some(entry) => {
                stats.structured_lines += 1;
                entries.push(entry);
            }
            None => {
                stats.plain_text_lines += 1;
                entries.push(LogEntry::plain_text(trimmed));
            }
        }
    }

    log::debug!(
        "Parsed {} entries ({} structured, {} plain-text, {} empty lines skipped)",
        entries.len(),
        stats.structured_lines,
        stats.plain_text_lines,
        stats.empty_lines
    );

    entries
}

/// Decode one line as a Logan JSON record; None if it is not a JSON object
fn parse_json_line(line: &str) -> Option<LogEntry> {
    let value: Value = serde_json::from_str(line).ok()?;
    let object = value.as_object()?;

    let is_main_thread = coerce_string(object.get(keys::IS_MAIN_THREAD), "false");
    Some(LogEntry {
        content: coerce_string(object.get(keys::CONTENT), ""),
        flag: coerce_string(object.get(keys::FLAG), "3"),
        log_time: format_log_time(object.get(keys::LOG_TIME)),
        thread_name: coerce_string(object.get(keys::THREAD_NAME), "unknown"),
        thread_id: coerce_string(object.get(keys::THREAD_ID), "0"),
        is_main_thread: is_main_thread == "1" || is_main_thread.eq_ignore_ascii_case("true"),
    })
}

/// Coerce a scalar JSON value to its string form; missing or non-scalar
/// values use the listed default
fn coerce_string(value: Option<&Value>, default: &str) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => default.to_string(),
    }
}

/// Format the `l` field: Logan writes epoch milliseconds, as a string or a
/// number. Anything unparseable falls back to the current instant.
fn format_log_time(value: Option<&Value>) -> String {
    let millis = match value {
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        _ => None,
    };

    millis
        .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_else(|| Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true))
}
