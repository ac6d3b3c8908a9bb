//! JSON output helpers for CLI commands.
//!
//! Every command prints pretty JSON, either to stdout or to a file named
//! with `--output`.

use std::io::Write;
use std::path::Path;

use anyhow::Context;
use serde::Serialize;

/// Serializes `value` as pretty JSON followed by a newline.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn render_json<T: Serialize>(value: &T) -> anyhow::Result<String> {
    let mut json = serde_json::to_string_pretty(value).context("serializing output")?;
    json.push('\n');
    Ok(json)
}

/// Writes `value` as JSON to `path`, or to stdout when no path is given.
///
/// # Errors
///
/// Returns an error if serialization or the write fails.
pub fn write_json<T: Serialize>(value: &T, path: Option<&Path>) -> anyhow::Result<()> {
    let json = render_json(value)?;
    match path {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("writing {}", path.display()))?;
            tracing::info!(path = %path.display(), "wrote output");
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(json.as_bytes()).context("writing stdout")?;
        }
    }
    Ok(())
}
