//!
//! Flat-file record store: `data/<domain>/<id>`, one file per record,
//! atomic commit via rename. No locking; writers achieve atomicity by
//! writing to `<id>.tmp` and renaming it over `<id>` at `write_end`.
//!

mod escape;

pub mod background;

pub use escape::{escape_value, unescape_value};

use crate::common::{domain_dir, ensure_domain_dir, record_path, tmp_path};
use crate::error::{Error, Result};
use std::{
    fs::{self, File},
    io::{BufRead, BufReader, Write as _},
};

/////////////////////////////////////////////////////////////////////////////
/////////////////////////////////////////////////////////////////////////////

/// Creates `data/<domain>` if it does not already exist. Must be called
/// before any [`write_begin`].
pub fn domain_init(domain: &str) -> Result<()> {
    ensure_domain_dir(domain)
}

/////////////////////////////////////////////////////////////////////////////
// Write transaction
/////////////////////////////////////////////////////////////////////////////

/// An in-progress write to `data/<domain>/<id>.tmp`.
pub struct WriteHandle {
    domain: String,
    id: u16,
    file: File,
    errored: bool,
}

/// Opens `data/<domain>/<id>.tmp` truncated for writing.
pub fn write_begin(domain: &str, id: u16) -> Result<WriteHandle> {
    let path = tmp_path(domain, id);
    let file = File::create(&path)?;
    Ok(WriteHandle {
        domain: domain.to_owned(),
        id,
        file,
        errored: false,
    })
}

impl WriteHandle {
    /// Emits one escaped `name = value` line. The caller must not reuse a
    /// name within one transaction; the core does not detect duplicates.
    pub fn write_pair(&mut self, name: &str, value: impl AsRef<[u8]>) {
        if self.errored {
            return;
        }
        let line = format!("{:<12} = {}\n", name, escape_value(value.as_ref()));
        if self.file.write_all(line.as_bytes()).is_err() {
            self.errored = true;
        }
    }

    /// Formats `args` into a 4 KiB buffer and writes it as a pair, the same
    /// bounded-buffer convenience the sources offer for numeric/derived
    /// values.
    pub fn write_format(&mut self, name: &str, args: std::fmt::Arguments<'_>) {
        if self.errored {
            return;
        }
        let mut buf = String::with_capacity(256);
        if std::fmt::Write::write_fmt(&mut buf, args).is_err() {
            self.errored = true;
            return;
        }
        let mut limit = buf.len().min(4096);
        while !buf.is_char_boundary(limit) {
            limit -= 1;
        }
        buf.truncate(limit);
        self.write_pair(name, buf.as_bytes());
    }

    /// Marks this handle as errored, so [`WriteHandle::end`] discards the
    /// temp file instead of committing it.
    pub fn abort(&mut self) {
        self.errored = true;
    }

    /// Closes the temp file. On success, renames it over `data/<domain>/<id>`,
    /// the atomic commit point. On error (a prior write failed, or
    /// [`WriteHandle::abort`] was called), deletes the temp file and leaves
    /// any previous record untouched.
    pub fn end(self) -> Result<()> {
        let tmp = tmp_path(&self.domain, self.id);
        drop(self.file);
        if self.errored {
            let _ = fs::remove_file(&tmp);
            return Err(Error::IoFailure(format!(
                "write to {}/{} aborted",
                self.domain, self.id
            )));
        }
        let dest = record_path(&self.domain, self.id);
        fs::rename(&tmp, &dest)?;
        Ok(())
    }
}

/////////////////////////////////////////////////////////////////////////////
// Read transaction
/////////////////////////////////////////////////////////////////////////////

/// An in-progress read of `data/<domain>/<id>`, yielding successive
/// `(name, value)` pairs.
pub struct ReadHandle {
    lines: std::io::Lines<BufReader<File>>,
    error: Option<Error>,
}

/// Opens the record for reading.
pub fn read_begin(domain: &str, id: u16) -> Result<ReadHandle> {
    let path = record_path(domain, id);
    let file = File::open(&path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::NotFound
        } else {
            Error::from(e)
        }
    })?;
    Ok(ReadHandle {
        lines: BufReader::new(file).lines(),
        error: None,
    })
}

impl ReadHandle {
    /// Returns the next `(name, value)` pair, or `None` once exhausted or
    /// after a malformed line / I/O error (check [`ReadHandle::end`] to
    /// distinguish the two).
    pub fn read_next(&mut self) -> Option<(String, String)> {
        if self.error.is_some() {
            return None;
        }
        let raw = match self.lines.next() {
            None => return None,
            Some(Ok(line)) => line,
            Some(Err(e)) => {
                self.error = Some(Error::from(e));
                return None;
            }
        };
        let trimmed = raw.trim_end().trim_start();
        if trimmed.is_empty() {
            self.error = Some(Error::Malformed("blank line".to_owned()));
            return None;
        }
        let Some((name, value)) = trimmed.split_once('=') else {
            self.error = Some(Error::Malformed(format!(
                "missing '=' separator: {trimmed:?}"
            )));
            return None;
        };
        let name = name.trim_end().to_owned();
        let value = value.trim_start();
        Some((
            name,
            String::from_utf8_lossy(&unescape_value(value)).into_owned(),
        ))
    }

    /// Returns an error iff any read encountered a malformed line or I/O
    /// error.
    pub fn end(self) -> Result<()> {
        match self.error {
            None => Ok(()),
            Some(e) => Err(e),
        }
    }
}

impl Iterator for ReadHandle {
    type Item = (String, String);

    fn next(&mut self) -> Option<Self::Item> {
        self.read_next()
    }
}

/////////////////////////////////////////////////////////////////////////////
// Iteration
/////////////////////////////////////////////////////////////////////////////

/// Iterates the ids present in a domain, filtering dot files, orphaned
/// `.tmp` files, backup `~` files, and non-regular entries. Order is
/// unspecified.
pub struct DomainIterator {
    entries: fs::ReadDir,
}

/// Opens the domain directory for iteration.
pub fn iterator_begin(domain: &str) -> Result<DomainIterator> {
    let entries = fs::read_dir(domain_dir(domain))?;
    Ok(DomainIterator { entries })
}

/// No-op: [`DomainIterator`]'s `Drop` already closes the directory handle.
/// Kept so callers can mirror the source's explicit begin/next/end shape.
pub fn iterator_end(_it: DomainIterator) {}

impl Iterator for DomainIterator {
    type Item = u16;

    fn next(&mut self) -> Option<u16> {
        for entry in self.entries.by_ref() {
            let Ok(entry) = entry else { continue };
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if name.starts_with('.') || name.ends_with(".tmp") || name.ends_with('~') {
                continue;
            }
            let Ok(file_type) = entry.file_type() else {
                continue;
            };
            if !file_type.is_file() {
                continue;
            }
            if let Ok(id) = name.parse::<u16>() {
                return Some(id);
            }
        }
        None
    }
}
