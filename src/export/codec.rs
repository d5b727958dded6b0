//! export::codec
//!
//! Reading and writing transfer batches.
//!
//! # Format
//!
//! One header row naming [`COLUMNS`], then one row per commit. Every
//! field is wrapped in double quotes and separated by `,`; rows end with
//! `\n`. Fields may span lines (commit messages keep their newlines).
//! There is no escape mechanism: fields never contain `"` and never end
//! in `\`.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::iter::Peekable;
use std::path::{Path, PathBuf};
use std::str::Chars;

use super::row::{CommitRow, COLUMNS};
use super::ExportError;
use crate::core::commit::transfer_text;

/// Writes a transfer batch.
///
/// The header is written by the constructor, so a batch always has
/// exactly one. Any write failure is returned and leaves the batch
/// unusable.
pub struct BatchWriter<W: Write> {
    inner: W,
    path: PathBuf,
    rows: usize,
}

impl BatchWriter<BufWriter<File>> {
    /// Create (or truncate) the batch file at `path`.
    pub fn create(path: &Path) -> Result<Self, ExportError> {
        let file = File::create(path).map_err(|e| ExportError::io(path, e))?;
        Self::new(BufWriter::new(file), path)
    }
}

impl<W: Write> BatchWriter<W> {
    /// Wrap a writer. `path` is only used in error messages.
    pub fn new(inner: W, path: impl Into<PathBuf>) -> Result<Self, ExportError> {
        let mut writer = Self {
            inner,
            path: path.into(),
            rows: 0,
        };
        let header = COLUMNS.map(String::from);
        writer.write_fields(&header)?;
        Ok(writer)
    }

    /// Append one row.
    pub fn write_row(&mut self, row: &CommitRow) -> Result<(), ExportError> {
        self.write_fields(&row.fields())?;
        self.rows += 1;
        Ok(())
    }

    /// Rows written so far, excluding the header.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Flush and return the inner writer.
    pub fn finish(mut self) -> Result<W, ExportError> {
        self.inner
            .flush()
            .map_err(|e| ExportError::io(&self.path, e))?;
        Ok(self.inner)
    }

    fn write_fields(&mut self, fields: &[String]) -> Result<(), ExportError> {
        let mut line = String::new();
        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                line.push(',');
            }
            line.push('"');
            line.push_str(&transfer_text(field));
            line.push('"');
        }
        line.push('\n');
        self.inner
            .write_all(line.as_bytes())
            .map_err(|e| ExportError::io(&self.path, e))
    }
}

/// Reads a transfer batch back into rows.
#[derive(Debug, Clone, Copy, Default)]
pub struct BatchReader;

impl BatchReader {
    /// Read and parse the batch file at `path`.
    pub fn read(path: &Path) -> Result<Vec<CommitRow>, ExportError> {
        let text = std::fs::read_to_string(path).map_err(|e| ExportError::io(path, e))?;
        Self::parse(&text)
    }

    /// Parse batch text. The first record must be the header.
    pub fn parse(text: &str) -> Result<Vec<CommitRow>, ExportError> {
        let mut records = Records::new(text);

        let (_, header) = records.next().ok_or(ExportError::Malformed {
            line: 1,
            message: "missing header row".to_string(),
        })??;
        if header != COLUMNS {
            return Err(ExportError::HeaderMismatch {
                found: header.join(","),
            });
        }

        records
            .map(|record| {
                let (line, fields) = record?;
                row_from_fields(line, fields)
            })
            .collect()
    }
}

fn row_from_fields(line: usize, fields: Vec<String>) -> Result<CommitRow, ExportError> {
    let Ok([hash, message, author_name, author_email, author_time, author_ts, commit_time, commit_ts, parents]) =
        <[String; 9]>::try_from(fields)
    else {
        return Err(ExportError::Malformed {
            line,
            message: format!("expected {} fields", COLUMNS.len()),
        });
    };

    let timestamp = |value: &str, column: &str| {
        value.parse::<i64>().map_err(|_| ExportError::Malformed {
            line,
            message: format!("{column} is not an integer: '{value}'"),
        })
    };

    Ok(CommitRow {
        author_timestamp: timestamp(&author_ts, "author_timestamp")?,
        commit_timestamp: timestamp(&commit_ts, "commit_timestamp")?,
        hash,
        message,
        author_name,
        author_email,
        author_time,
        commit_time,
        parents,
    })
}

/// Iterator over `(starting line, fields)` records.
struct Records<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
    failed: bool,
}

impl<'a> Records<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            chars: text.chars().peekable(),
            line: 1,
            failed: false,
        }
    }

    fn malformed(&mut self, line: usize, message: impl Into<String>) -> ExportError {
        self.failed = true;
        ExportError::Malformed {
            line,
            message: message.into(),
        }
    }

    fn record(&mut self) -> Result<Vec<String>, ExportError> {
        let start = self.line;
        let mut fields = Vec::new();
        loop {
            match self.chars.next() {
                Some('"') => {}
                Some(c) => return Err(self.malformed(self.line, format!("expected '\"', found '{c}'"))),
                None => return Err(self.malformed(self.line, "expected '\"', found end of input")),
            }

            let mut field = String::new();
            loop {
                match self.chars.next() {
                    Some('"') => break,
                    Some(c) => {
                        if c == '\n' {
                            self.line += 1;
                        }
                        field.push(c);
                    }
                    None => return Err(self.malformed(start, "unterminated field")),
                }
            }
            fields.push(field);

            match self.chars.next() {
                Some(',') => continue,
                Some('\n') => {
                    self.line += 1;
                    return Ok(fields);
                }
                Some('\r') if self.chars.peek() == Some(&'\n') => {
                    self.chars.next();
                    self.line += 1;
                    return Ok(fields);
                }
                None => return Ok(fields),
                Some(c) => return Err(self.malformed(self.line, format!("unexpected '{c}' after field"))),
            }
        }
    }
}

impl Iterator for Records<'_> {
    type Item = Result<(usize, Vec<String>), ExportError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        self.chars.peek()?;
        let line = self.line;
        Some(self.record().map(|fields| (line, fields)))
    }
}
