//! Shared pieces of the `::`-delimited line format the data files use.

use std::fmt::Display;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;

use crate::StoreError;

pub const SEPARATOR: &str = "::";

/// Reads every line of a data file. A missing file is an empty data set,
/// not an error, so a fresh installation starts up clean.
pub fn read_lines(path: &str) -> Result<Vec<String>, StoreError> {
    if !Path::new(path).exists() {
        tracing::warn!(file = path, "data file not found, starting empty");
        return Ok(Vec::new());
    }
    let reader = BufReader::new(File::open(path)?);
    let mut lines = Vec::new();
    for line in reader.lines() {
        lines.push(line?);
    }
    Ok(lines)
}

/// One split line, with positional typed accessors that produce parse
/// errors carrying the file name and line number.
#[derive(Debug)]
pub struct Fields<'a> {
    file: &'a str,
    line_no: usize,
    parts: Vec<&'a str>,
}

impl<'a> Fields<'a> {
    /// Splits a line, tolerating one trailing separator.
    pub fn split(file: &'a str, line_no: usize, line: &'a str, expected: usize) -> Result<Self, StoreError> {
        let line = line.strip_suffix(SEPARATOR).unwrap_or(line);
        let parts: Vec<&str> = line.split(SEPARATOR).collect();
        if parts.len() != expected {
            return Err(StoreError::Parse {
                file: file.to_string(),
                line: line_no,
                message: format!("expected {expected} fields, found {}", parts.len()),
            });
        }
        Ok(Self { file, line_no, parts })
    }

    pub fn raw(&self, idx: usize) -> &str {
        self.parts[idx].trim()
    }

    pub fn text(&self, idx: usize) -> String {
        self.raw(idx).to_string()
    }

    pub fn parse<T>(&self, idx: usize, name: &str) -> Result<T, StoreError>
    where
        T: FromStr,
        T::Err: Display,
    {
        self.raw(idx).parse().map_err(|e| self.error(name, e))
    }

    pub fn error(&self, name: &str, cause: impl Display) -> StoreError {
        StoreError::Parse {
            file: self.file.to_string(),
            line: self.line_no,
            message: format!("invalid {name}: {cause}"),
        }
    }
}
