//! Output for pycensus reports.
//!
//! Tables are written as JSON in the layout Python's `json.dump` produces
//! with its defaults: `", "` and `": "` separators, non-ASCII characters
//! escaped. A human-readable summary goes to the terminal.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use anyhow::Context;
use colored::*;
use serde::Serialize;
use serde_json::ser::Formatter;

use crate::analysis::{CallTable, Report, UnclassifiedCall};

/// Default output file for the call-frequency report.
pub const CALLS_OUTPUT: &str = "calls.json";

/// Default output file for the docstring report.
pub const DOCSTRINGS_OUTPUT: &str = "docstrings.json";

/// Compact JSON with spaced separators and ASCII-only output.
#[derive(Debug, Clone, Copy, Default)]
pub struct PythonJsonFormatter;

impl Formatter for PythonJsonFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        writer.write_all(b": ")
    }

    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        let mut start = 0;
        for (i, ch) in fragment.char_indices() {
            if (' '..='~').contains(&ch) {
                continue;
            }
            writer.write_all(fragment[start..i].as_bytes())?;
            let mut units = [0u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                write!(writer, "\\u{:04x}", unit)?;
            }
            start = i + ch.len_utf8();
        }
        writer.write_all(fragment[start..].as_bytes())
    }
}

/// Serialize `value` with [`PythonJsonFormatter`].
pub fn to_json_bytes<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<Vec<u8>> {
    let mut buf = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, PythonJsonFormatter);
    value.serialize(&mut serializer)?;
    Ok(buf)
}

/// Write `value` as JSON to `path`, replacing any existing file.
///
/// The document is fully serialized before the file is touched.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> anyhow::Result<()> {
    let json = to_json_bytes(value).context("serializing report")?;
    fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

/// Print the `limit` most called names.
pub fn write_top_calls(table: &CallTable, limit: usize) {
    let top = table.most_common();
    if top.is_empty() || limit == 0 {
        return;
    }

    let width = top
        .iter()
        .take(limit)
        .map(|(name, _)| name.len())
        .max()
        .unwrap_or(0);

    println!();
    println!(
        "  {} {}",
        "Most called".cyan().bold(),
        format!("({} distinct names, {} calls)", table.len(), table.total()).dimmed()
    );
    for (name, count) in top.iter().take(limit) {
        println!("  {:<width$}  {}", name, count.to_string().bold(), width = width);
    }
    println!();
}

/// Print skipped files and unclassified call sites to stderr.
pub fn write_diagnostics<T>(report: &Report<T>, unclassified: &[UnclassifiedCall]) {
    for failed in &report.failed {
        eprintln!("{} skipped {}", "warning:".yellow().bold(), failed.error);
    }

    if !unclassified.is_empty() {
        eprintln!(
            "{} {} call site(s) with unclassified callee shapes:",
            "warning:".yellow().bold(),
            unclassified.len()
        );
        for call in unclassified {
            eprintln!(
                "  {}:{}  {}",
                call.path.display(),
                call.line,
                call.shape.dimmed()
            );
        }
    }
}
