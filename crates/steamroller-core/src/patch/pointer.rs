//! Patch paths.
//!
//! A path is written `/seg/seg/...`. Each segment is either a plain mapping
//! key or an equality selector `key=value`, which picks the one mapping inside
//! a sequence whose `key` entry equals `value`. Inside a segment `~` is
//! written `~0`, `/` is written `~1` and `=` is written `~2`.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Path parse errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PointerError {
    #[error("patch path must start with '/': {0:?}")]
    NotAbsolute(String),
}

/// One step of a patch path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Plain mapping key.
    Key(String),
    /// Equality selector into a sequence of mappings.
    Select { key: String, value: String },
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Key(key) => f.write_str(&escape(key)),
            Segment::Select { key, value } => write!(f, "{}={}", escape(key), escape(value)),
        }
    }
}

/// An absolute path into a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Pointer {
    segments: Vec<Segment>,
}

impl Pointer {
    /// The document root.
    pub fn root() -> Self {
        Self::default()
    }

    /// Append a plain key segment.
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.segments.push(Segment::Key(key.into()));
        self
    }

    /// Append an equality selector segment.
    pub fn select(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.segments.push(Segment::Select {
            key: key.into(),
            value: value.into(),
        });
        self
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for Pointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("/");
        }
        for segment in &self.segments {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}

impl FromStr for Pointer {
    type Err = PointerError;

    /// Parse `/a/key=value/b`. A segment holding a bare `=` is a selector; the
    /// first one separates key from value.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some(rest) = s.strip_prefix('/') else {
            return Err(PointerError::NotAbsolute(s.to_string()));
        };
        if rest.is_empty() {
            return Ok(Self::root());
        }

        let segments = rest
            .split('/')
            .map(|part| match part.split_once('=') {
                Some((key, value)) => Segment::Select {
                    key: unescape(key).into_owned(),
                    value: unescape(value).into_owned(),
                },
                None => Segment::Key(unescape(part).into_owned()),
            })
            .collect();

        Ok(Self { segments })
    }
}

/// Escape `~`, `/` and `=` for embedding in a path segment.
pub fn escape(raw: &str) -> Cow<'_, str> {
    if raw.contains(['~', '/', '=']) {
        Cow::Owned(
            raw.replace('~', "~0")
                .replace('/', "~1")
                .replace('=', "~2"),
        )
    } else {
        Cow::Borrowed(raw)
    }
}

/// Reverse [`escape`]. `~0` is decoded last.
pub fn unescape(segment: &str) -> Cow<'_, str> {
    if segment.contains('~') {
        Cow::Owned(
            segment
                .replace("~1", "/")
                .replace("~2", "=")
                .replace("~0", "~"),
        )
    } else {
        Cow::Borrowed(segment)
    }
}
