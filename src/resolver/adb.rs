//! Query a device's brokers through `adb shell content query`.
//!
//! The `content` tool prints one line per row:
//!
//! ```text
//! Row: 0 _id=0, package_name=com.example.runtime, so_filename=libexample.so
//! ```
//!
//! or `No result found.` when the provider returned no cursor or an empty
//! one. Provider failures are printed as a Java exception.
//!
//! `adb shell` hands its arguments to the device shell as one command line,
//! so the URI and projection are single-quoted.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::{ContentResolver, QueryError, QueryResult};
use crate::cursor::{CellValue, Cursor, MatrixCursor};
use crate::uri::ContentUri;

/// Default adb executable, looked up on `PATH`.
const DEFAULT_ADB: &str = "adb";

const NO_RESULT: &str = "No result found.";
const PROVIDER_ERROR_PREFIX: &str = "Error while accessing provider";

static ROW_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Row: (\d+) (.*)$").unwrap());

static EXCEPTION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:Caused by: )?((?:[\w$]+\.)+[\w$]*(?:Exception|Error)): ?(.*)$").unwrap()
});

/// A [`ContentResolver`] that shells out to `adb`.
///
/// Each query is one blocking `adb` invocation.
#[derive(Debug, Clone)]
pub struct AdbResolver {
    program: PathBuf,
    serial: Option<String>,
}

impl Default for AdbResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl AdbResolver {
    /// Use `adb` from `PATH` and the only attached device.
    pub fn new() -> Self {
        Self {
            program: PathBuf::from(DEFAULT_ADB),
            serial: None,
        }
    }

    /// Use a specific adb executable.
    pub fn with_program<P: AsRef<Path>>(mut self, program: P) -> Self {
        self.program = program.as_ref().to_path_buf();
        self
    }

    /// Target one device by serial number.
    pub fn with_serial(mut self, serial: impl Into<String>) -> Self {
        self.serial = Some(serial.into());
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn serial(&self) -> Option<&str> {
        self.serial.as_deref()
    }

    /// Arguments passed to adb for one query, quoted for the device shell.
    pub fn command_args(&self, uri: &ContentUri, projection: &[&str]) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(serial) = &self.serial {
            args.push("-s".to_string());
            args.push(serial.clone());
        }
        args.extend(
            ["shell", "content", "query", "--uri"]
                .iter()
                .map(|s| s.to_string()),
        );
        args.push(shell_quote(uri.as_str()));
        if !projection.is_empty() {
            args.push("--projection".to_string());
            args.push(shell_quote(&projection.join(":")));
        }
        args
    }
}

/// Quote a word for `/system/bin/sh`.
fn shell_quote(word: &str) -> String {
    format!("'{}'", word.replace('\'', r"'\''"))
}

impl ContentResolver for AdbResolver {
    fn query(
        &self,
        uri: &ContentUri,
        projection: &[&str],
    ) -> QueryResult<Option<Box<dyn Cursor>>> {
        let args = self.command_args(uri, projection);
        debug!(program = %self.program.display(), ?args, "running content query");

        let output = Command::new(&self.program)
            .args(&args)
            .output()
            .map_err(QueryError::SpawnFailed)?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        if let Some(error) = detect_failure(uri, &stdout, &stderr) {
            return Err(error);
        }
        if !output.status.success() {
            let message = stderr.trim();
            return Err(QueryError::remote(
                "adb",
                if message.is_empty() {
                    format!("adb exited with {}", output.status)
                } else {
                    message.to_string()
                },
            ));
        }

        Ok(parse_query_output(&stdout, projection)?.map(MatrixCursor::into_boxed))
    }
}

/// Find a provider failure in the tool's output.
fn detect_failure(uri: &ContentUri, stdout: &str, stderr: &str) -> Option<QueryError> {
    let lines: Vec<&str> = stdout.lines().chain(stderr.lines()).map(str::trim).collect();
    let reported = lines
        .iter()
        .any(|line| line.starts_with(PROVIDER_ERROR_PREFIX));

    let exception = lines
        .iter()
        .find_map(|line| EXCEPTION_PATTERN.captures(line))
        .map(|caps| (caps[1].to_string(), caps[2].trim().to_string()));

    match exception {
        Some((kind, message)) => Some(classify_exception(uri, &kind, message)),
        None if reported => Some(QueryError::ProviderUnavailable(uri.authority().to_string())),
        None => None,
    }
}

/// Map a Java exception to a query error.
fn classify_exception(uri: &ContentUri, kind: &str, message: String) -> QueryError {
    if kind.ends_with("SecurityException") {
        QueryError::PermissionDenied(message)
    } else if message.contains("Could not find provider") || message.contains("Unknown URI") {
        QueryError::ProviderUnavailable(uri.authority().to_string())
    } else {
        QueryError::remote(kind, message)
    }
}

/// Parse `content query` output into a cursor.
///
/// Returns `Ok(None)` for `No result found.`; the tool prints the same line
/// for a missing and an empty cursor.
pub fn parse_query_output(output: &str, projection: &[&str]) -> QueryResult<Option<MatrixCursor>> {
    let mut cursor: Option<MatrixCursor> = None;

    for line in output.lines().map(str::trim_end) {
        if line.trim() == NO_RESULT {
            return Ok(None);
        }
        let Some(caps) = ROW_PATTERN.captures(line) else {
            continue;
        };
        let fields = split_fields(&caps[2], projection)?;

        let cursor = cursor.get_or_insert_with(|| {
            MatrixCursor::new(fields.iter().map(|(name, _)| name.to_string()))
        });
        let same_columns = cursor.columns().len() == fields.len()
            && cursor
                .columns()
                .iter()
                .zip(&fields)
                .all(|(column, (name, _))| column == name);
        if !same_columns {
            return Err(QueryError::Malformed(format!(
                "row {} has different columns than the first row",
                &caps[1]
            )));
        }
        cursor.add_row(fields.into_iter().map(|(_, value)| value))?;
    }

    match cursor {
        Some(cursor) => Ok(Some(cursor)),
        None => Err(QueryError::Malformed(format!(
            "unexpected content query output: {:?}",
            output.trim()
        ))),
    }
}

/// Split `a=1, b=two` into named cells, using the projection to find the
/// column boundaries.
fn split_fields<'a>(
    body: &'a str,
    projection: &[&'a str],
) -> QueryResult<Vec<(&'a str, CellValue)>> {
    let mut fields = Vec::new();
    let mut rest = body;

    while !rest.is_empty() {
        let name = projection
            .iter()
            .copied()
            .filter(|name| {
                rest.strip_prefix(name)
                    .is_some_and(|after| after.starts_with('='))
            })
            .max_by_key(|name| name.len())
            .ok_or_else(|| QueryError::Malformed(format!("unexpected column in row: {rest:?}")))?;

        let value_start = name.len() + 1;
        let value_end = projection
            .iter()
            .filter_map(|next| rest[value_start..].find(&format!(", {next}=")))
            .min()
            .map_or(rest.len(), |offset| value_start + offset);

        fields.push((name, cell_value(&rest[value_start..value_end])));
        rest = rest[value_end..].strip_prefix(", ").unwrap_or("");
    }

    Ok(fields)
}

fn cell_value(raw: &str) -> CellValue {
    match raw {
        "NULL" => CellValue::Null,
        text => CellValue::Text(text.to_string()),
    }
}
