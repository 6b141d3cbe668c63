//! Location resolution and file-backed resources.
//!
//! A location is the raw string stored in the catalog: an absolute path, a
//! path relative to some base resource, or a `file:` URI. [`resolve_location`]
//! turns it into an owned path; [`FileSource`] wraps that path with an
//! explicit open/close stream lifecycle.

use crate::error::SourceError;
use roxmltree::{Document, ParsingOptions};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

// Longest first so `file:///x` loses exactly `file://`.
const FILE_PREFIXES: [&str; 3] = ["file://", "file:/", "file:"];

// A ':' further in than this is not a drive marker (e.g. a Windows `C:`).
const DRIVE_MARKER_WINDOW: usize = 10;

/// Strip one `file:` style prefix, if present.
pub fn strip_file_prefix(location: &str) -> Option<&str> {
    FILE_PREFIXES
        .iter()
        .find_map(|prefix| location.strip_prefix(prefix))
}

/// True when the location has no root, drive or scheme marker.
pub fn is_relative(location: &str) -> bool {
    if location.starts_with('/') || location.starts_with('\\') {
        return false;
    }
    if has_drive_letter(location) {
        return false;
    }
    if location.starts_with("file:") || location.contains("://") {
        return false;
    }
    true
}

fn has_drive_letter(location: &str) -> bool {
    let bytes = location.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

/// Join `relative` onto the directory part of `base`.
///
/// `base` names a resource (usually the catalog file), so everything after
/// its last separator is dropped before joining.
pub fn absolute_path(base: &Path, relative: &str) -> String {
    let base = base.to_string_lossy();
    match base.rfind(['/', '\\']) {
        Some(idx) => format!("{}{}", &base[..=idx], relative),
        None => relative.to_string(),
    }
}

/// Resolve a catalog location against an optional base resource location.
///
/// The rules are applied in order: strip a `file:` prefix, otherwise join a
/// relative location onto `base`; expand environment references; root a
/// stripped URI path that carries no drive marker.
pub fn resolve_location(location: &str, base: Option<&Path>) -> PathBuf {
    let (raw, prefixed) = match strip_file_prefix(location) {
        Some(rest) => (rest.to_string(), true),
        None => match base {
            Some(base) if is_relative(location) => (absolute_path(base, location), false),
            _ => (location.to_string(), false),
        },
    };

    let mut resolved = expand_env_vars(&raw);
    if prefixed && needs_root(&resolved) {
        resolved.insert(0, '/');
    }
    PathBuf::from(resolved)
}

fn needs_root(path: &str) -> bool {
    if path.starts_with('/') {
        return false;
    }
    path.find(':').is_none_or(|idx| idx > DRIVE_MARKER_WINDOW)
}

/// Expand environment references using the current platform's syntax.
pub fn expand_env_vars(input: &str) -> String {
    let lookup = |name: &str| env::var(name).ok();
    if cfg!(windows) {
        expand_percent_vars(input, lookup)
    } else {
        expand_dollar_vars(input, lookup)
    }
}

/// Expand `%NAME%` references. Unknown names are kept verbatim.
pub fn expand_percent_vars(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(start) = rest.find('%') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        match after.find('%') {
            Some(end) if end > 0 => {
                let name = &after[..end];
                match lookup(name) {
                    Some(value) => out.push_str(&value),
                    None => {
                        out.push('%');
                        out.push_str(name);
                        out.push('%');
                    }
                }
                rest = &after[end + 1..];
            }
            _ => {
                out.push('%');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Expand `$NAME` and `${NAME}` references. Unknown names are kept verbatim.
pub fn expand_dollar_vars(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(start) = rest.find('$') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];

        let (name, consumed, braced) = if let Some(inner) = after.strip_prefix('{') {
            match inner.find('}') {
                Some(end) => (&inner[..end], end + 2, true),
                None => ("", 0, true),
            }
        } else {
            let end = after
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                .unwrap_or(after.len());
            (&after[..end], end, false)
        };

        if name.is_empty() {
            out.push('$');
            rest = after;
            continue;
        }

        match lookup(name) {
            Some(value) => out.push_str(&value),
            None if braced => {
                out.push_str("${");
                out.push_str(name);
                out.push('}');
            }
            None => {
                out.push('$');
                out.push_str(name);
            }
        }
        rest = &after[consumed..];
    }
    out.push_str(rest);
    out
}

/// Parse a catalog, grammar or scheme document.
///
/// Colorer documents carry a `<!DOCTYPE ... PUBLIC ...>` header, so DTDs are
/// accepted. External subsets are never fetched.
pub fn parse_document(text: &str) -> Result<Document<'_>, roxmltree::Error> {
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    Document::parse_with_options(text, options)
}

/// A resolved, file-backed resource.
///
/// The stream is read fully on [`open_stream`](Self::open_stream) and dropped on
/// [`close_stream`](Self::close_stream); opening twice is an error.
#[derive(Debug)]
pub struct FileSource {
    location: PathBuf,
    stream: Option<Vec<u8>>,
}

impl FileSource {
    /// Resolve `location` with no base resource.
    pub fn new(location: &str) -> Self {
        Self::with_base(location, None)
    }

    /// Resolve `location` relative to `base`'s own resolved location.
    pub fn with_base(location: &str, base: Option<&FileSource>) -> Self {
        Self {
            location: resolve_location(location, base.map(FileSource::location)),
            stream: None,
        }
    }

    /// Source for a path that is already resolved; no expansion is applied.
    pub fn from_path(location: impl Into<PathBuf>) -> Self {
        Self {
            location: location.into(),
            stream: None,
        }
    }

    /// Child source for a location relative to this one.
    pub fn create_relative(&self, relative: &str) -> FileSource {
        FileSource::with_base(relative, Some(self))
    }

    pub fn location(&self) -> &Path {
        &self.location
    }

    pub fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    pub fn open_stream(&mut self) -> Result<&[u8], SourceError> {
        if self.stream.is_some() {
            return Err(SourceError::AlreadyOpen(self.location.clone()));
        }
        let bytes = fs::read(&self.location).map_err(|source| SourceError::Io {
            location: self.location.clone(),
            source,
        })?;
        let bytes = self.stream.insert(bytes);
        Ok(bytes.as_slice())
    }

    pub fn close_stream(&mut self) -> Result<(), SourceError> {
        match self.stream.take() {
            Some(_) => Ok(()),
            None => Err(SourceError::NotOpen(self.location.clone())),
        }
    }

    /// Byte length of the open stream.
    pub fn length(&self) -> Result<usize, SourceError> {
        self.stream
            .as_ref()
            .map(Vec::len)
            .ok_or_else(|| SourceError::NotOpen(self.location.clone()))
    }

    /// Open, hand the bytes to `consume`, and close again whatever it returns.
    pub fn with_stream<T>(
        &mut self,
        consume: impl FnOnce(&Path, &[u8]) -> Result<T, SourceError>,
    ) -> Result<T, SourceError> {
        self.open_stream()?;
        let result = match self.stream.as_deref() {
            Some(bytes) => consume(&self.location, bytes),
            None => Err(SourceError::NotOpen(self.location.clone())),
        };
        self.stream = None;
        result
    }

    /// Trial open used to test that the target exists and is readable.
    pub fn probe(&mut self) -> Result<(), SourceError> {
        self.with_stream(|_, _| Ok(()))
    }
}
