//! Session files
//!
//! One record per line: `<pos=P> path`. `P` is the caret offset plus one,
//! negated for the buffer that was current. Loading stops at the first line
//! that does not parse and keeps what was read before it.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use buffer_core::FilePath;
use thiserror::Error;

/// Session errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Session file '{path}': {reason}")]
    Io { path: String, reason: String },

    #[error("Malformed session record: {record}")]
    MalformedRecord { record: String },
}

/// One open buffer in a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    /// Caret offset
    pub position: usize,
    pub is_current: bool,
    pub path: FilePath,
}

impl SessionRecord {
    pub fn new(path: FilePath, position: usize, is_current: bool) -> Self {
        Self {
            position,
            is_current,
            path,
        }
    }
}

impl SessionRecord {
    fn signed_position(&self) -> i64 {
        let pos = self.position as i64 + 1;
        if self.is_current {
            -pos
        } else {
            pos
        }
    }

    /// Encodes the record as one line, path bytes written verbatim
    pub fn to_line(&self) -> Vec<u8> {
        let mut line = format!("<pos={}> ", self.signed_position()).into_bytes();
        line.extend_from_slice(self.path.as_bytes());
        line
    }

    /// Parses one line; the path is taken byte for byte
    pub fn parse_line(line: &[u8]) -> Result<Self, SessionError> {
        let malformed = || SessionError::MalformedRecord {
            record: String::from_utf8_lossy(line).into_owned(),
        };

        let rest = line.strip_prefix(b"<pos=").ok_or_else(malformed)?;
        let close = rest.iter().position(|&b| b == b'>').ok_or_else(malformed)?;
        let pos: i64 = std::str::from_utf8(&rest[..close])
            .ok()
            .and_then(|number| number.trim().parse().ok())
            .ok_or_else(malformed)?;
        if pos == 0 {
            return Err(malformed());
        }
        let path = &rest[close + 1..];
        let path = path.strip_prefix(b" ").unwrap_or(path);

        Ok(Self {
            position: (pos.unsigned_abs() - 1) as usize,
            is_current: pos < 0,
            path: FilePath::from_bytes(path).ok_or_else(malformed)?,
        })
    }
}

impl fmt::Display for SessionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<pos={}> {}", self.signed_position(), self.path)
    }
}

/// Records read from a session, and where reading stopped early
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionLoad {
    pub records: Vec<SessionRecord>,
    /// 1-based line number of the record that failed to parse
    pub malformed_line: Option<usize>,
}

/// Formats records, one per line
pub fn encode_session(records: &[SessionRecord]) -> Vec<u8> {
    let mut out = Vec::new();
    for record in records {
        out.extend_from_slice(&record.to_line());
        out.push(b'\n');
    }
    out
}

/// Parses at most `limit` records
pub fn decode_session(bytes: &[u8], limit: usize) -> SessionLoad {
    let mut load = SessionLoad::default();
    for (i, line) in byte_lines(bytes).take(limit).enumerate() {
        match SessionRecord::parse_line(line) {
            Ok(record) => load.records.push(record),
            Err(err) => {
                tracing::warn!(line = i + 1, error = %err, "session loading stopped");
                load.malformed_line = Some(i + 1);
                break;
            }
        }
    }
    load
}

/// Splits on `\n` the way `str::lines` does, dropping a trailing `\r`
pub(crate) fn byte_lines(bytes: &[u8]) -> impl Iterator<Item = &[u8]> {
    let body = bytes.strip_suffix(b"\n").unwrap_or(bytes);
    let count = if bytes.is_empty() { 0 } else { usize::MAX };
    body.split(|&b| b == b'\n')
        .take(count)
        .map(|line| line.strip_suffix(b"\r").unwrap_or(line))
}

/// A session file on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self, limit: usize) -> Result<SessionLoad, SessionError> {
        let bytes = fs::read(&self.path).map_err(|e| self.io_error(e))?;
        Ok(decode_session(&bytes, limit))
    }

    pub fn save(&self, records: &[SessionRecord]) -> Result<(), SessionError> {
        fs::write(&self.path, encode_session(records)).map_err(|e| self.io_error(e))
    }

    fn io_error(&self, err: std::io::Error) -> SessionError {
        SessionError::Io {
            path: self.path.display().to_string(),
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_format() {
        let record = SessionRecord::new(FilePath::new("/src/a.rs"), 0, false);
        assert_eq!(record.to_string(), "<pos=1> /src/a.rs");
        assert_eq!(record.to_line(), b"<pos=1> /src/a.rs");
        let current = SessionRecord::new(FilePath::new("/src/b.rs"), 41, true);
        assert_eq!(current.to_string(), "<pos=-42> /src/b.rs");
    }

    #[test]
    fn test_record_parse() {
        let record = SessionRecord::parse_line(b"<pos=-42> /src/b.rs").unwrap();
        assert_eq!(record.position, 41);
        assert!(record.is_current);
        assert!(record.path.same_name_as("/src/b.rs"));
    }

    #[test]
    fn test_path_with_spaces() {
        let record = SessionRecord::parse_line(b"<pos=3> /my docs/notes one.txt").unwrap();
        assert_eq!(record.path.to_string(), "/my docs/notes one.txt");
        assert_eq!(record.position, 2);
    }

    #[test]
    fn test_malformed_records() {
        assert!(SessionRecord::parse_line(b"pos=1 /a").is_err());
        assert!(SessionRecord::parse_line(b"<pos=abc> /a").is_err());
        assert!(SessionRecord::parse_line(b"<pos=1 /a").is_err());
        assert!(SessionRecord::parse_line(b"<pos=0> /a").is_err());
    }

    #[test]
    fn test_decode_stops_at_malformed_line() {
        let text = b"<pos=1> /a\n<pos=-5> /b\ngarbage\n<pos=2> /c\n";
        let load = decode_session(text, 100);
        assert_eq!(load.records.len(), 2);
        assert_eq!(load.malformed_line, Some(3));
    }

    #[test]
    fn test_decode_respects_limit() {
        let text = b"<pos=1> /a\n<pos=1> /b\n<pos=1> /c\n";
        let load = decode_session(text, 2);
        assert_eq!(load.records.len(), 2);
        assert_eq!(load.malformed_line, None);
    }

    #[test]
    fn test_encode_decode() {
        let records = vec![
            SessionRecord::new(FilePath::new("/a"), 10, false),
            SessionRecord::new(FilePath::new("/b"), 0, true),
        ];
        let load = decode_session(&encode_session(&records), 10);
        assert_eq!(load.records, records);
    }

    #[test]
    fn test_byte_lines_match_str_lines() {
        for text in ["", "\n", "a", "a\n", "a\r\nb", "a\n\nb\n"] {
            let bytes: Vec<&[u8]> = byte_lines(text.as_bytes()).collect();
            let lines: Vec<&[u8]> = text.lines().map(str::as_bytes).collect();
            assert_eq!(bytes, lines, "input {:?}", text);
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_path_survives_encoding() {
        let path = FilePath::from_bytes(b"/tmp/caf\xe9.txt").unwrap();
        let records = vec![SessionRecord::new(path, 4, true)];
        let bytes = encode_session(&records);
        assert_eq!(bytes, b"<pos=-5> /tmp/caf\xe9.txt\n");
        assert_eq!(decode_session(&bytes, 10).records, records);
    }

    #[test]
    fn test_invalid_position_bytes_are_malformed() {
        let load = decode_session(b"<pos=1> /a\n<pos=\xff> /b\n", 10);
        assert_eq!(load.records.len(), 1);
        assert_eq!(load.malformed_line, Some(2));
    }
}
