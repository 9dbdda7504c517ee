//! Path addressing for flattened content trees
//!
//! A position in a tree is a [`FlatPath`]: a chain of object keys and list
//! indices. [`PathCodec`] turns it into a single `/`-delimited string key, which
//! is what the translation connector sees, and back again.
//!
//! Key segments are escaped so the encoding stays injective:
//!
//! - `~` is written as `~0` and `/` as `~1`
//! - a key that is empty or reads as a list index (`"0"`, `"42"`) gets the
//!   `~2` marker in front, so `{"0": ..}` and `[..]` never share a path

use crate::error::PathError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

/// Separator between encoded segments
pub const DELIMITER: char = '/';

/// Marks a key segment that would otherwise read as an index or be empty
const KEY_MARKER: &str = "~2";

static INDEX_SEGMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(0|[1-9][0-9]*)$").unwrap());

/// One step in a path: an object key or a list index
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl PathSegment {
    /// Literal text of the segment, as exact-name exclusion rules see it
    pub fn text(&self) -> Cow<'_, str> {
        match self {
            PathSegment::Key(key) => Cow::Borrowed(key.as_str()),
            PathSegment::Index(index) => Cow::Owned(index.to_string()),
        }
    }

    pub fn is_index(&self) -> bool {
        matches!(self, PathSegment::Index(_))
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(key.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        PathSegment::Key(key)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

/// Ordered chain of segments identifying one position in a tree
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FlatPath(Vec<PathSegment>);

impl FlatPath {
    /// The empty path, addressing the tree root
    pub fn root() -> Self {
        FlatPath(Vec::new())
    }

    pub fn new(segments: Vec<PathSegment>) -> Self {
        FlatPath(segments)
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// A new path one level below this one
    pub fn child(&self, segment: impl Into<PathSegment>) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        FlatPath(segments)
    }

    /// A new path with `other` appended below this one
    pub fn join(&self, other: &FlatPath) -> Self {
        let mut segments = self.0.clone();
        segments.extend(other.0.iter().cloned());
        FlatPath(segments)
    }

    pub fn starts_with(&self, prefix: &FlatPath) -> bool {
        self.0.starts_with(&prefix.0)
    }

    pub fn encode(&self) -> String {
        PathCodec::encode(self)
    }
}

impl From<Vec<PathSegment>> for FlatPath {
    fn from(segments: Vec<PathSegment>) -> Self {
        FlatPath(segments)
    }
}

impl From<&[PathSegment]> for FlatPath {
    fn from(segments: &[PathSegment]) -> Self {
        FlatPath(segments.to_vec())
    }
}

impl fmt::Display for FlatPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromStr for FlatPath {
    type Err = PathError;

    fn from_str(key: &str) -> Result<Self, Self::Err> {
        PathCodec::decode(key)
    }
}

/// Encoder/decoder between [`FlatPath`] and its string key
pub struct PathCodec;

impl PathCodec {
    /// Join the segments of `path` with [`DELIMITER`], escaping keys as needed
    pub fn encode(path: &FlatPath) -> String {
        let mut encoded = String::new();
        for (i, segment) in path.segments().iter().enumerate() {
            if i > 0 {
                encoded.push(DELIMITER);
            }
            Self::encode_segment(segment, &mut encoded);
        }
        encoded
    }

    /// Exact inverse of [`PathCodec::encode`]
    pub fn decode(key: &str) -> Result<FlatPath, PathError> {
        if key.is_empty() {
            return Ok(FlatPath::root());
        }

        key.split(DELIMITER)
            .map(|segment| Self::decode_segment(key, segment))
            .collect::<Result<Vec<_>, _>>()
            .map(FlatPath)
    }

    fn encode_segment(segment: &PathSegment, out: &mut String) {
        match segment {
            PathSegment::Index(index) => out.push_str(&index.to_string()),
            PathSegment::Key(key) => {
                if key.is_empty() || INDEX_SEGMENT.is_match(key) {
                    out.push_str(KEY_MARKER);
                }
                for c in key.chars() {
                    match c {
                        '~' => out.push_str("~0"),
                        DELIMITER => out.push_str("~1"),
                        _ => out.push(c),
                    }
                }
            }
        }
    }

    fn decode_segment(key: &str, segment: &str) -> Result<PathSegment, PathError> {
        if segment.is_empty() {
            return Err(PathError::malformed(key, "empty segment"));
        }

        if let Some(rest) = segment.strip_prefix(KEY_MARKER) {
            let unescaped = Self::unescape(key, rest)?;
            if !unescaped.is_empty() && !INDEX_SEGMENT.is_match(&unescaped) {
                return Err(PathError::malformed(
                    key,
                    format!("key marker on plain key '{unescaped}'"),
                ));
            }
            return Ok(PathSegment::Key(unescaped));
        }

        if INDEX_SEGMENT.is_match(segment) {
            return segment
                .parse::<usize>()
                .map(PathSegment::Index)
                .map_err(|_| PathError::malformed(key, format!("index '{segment}' out of range")));
        }

        Self::unescape(key, segment).map(PathSegment::Key)
    }

    fn unescape(key: &str, segment: &str) -> Result<String, PathError> {
        let mut out = String::with_capacity(segment.len());
        let mut chars = segment.chars();
        while let Some(c) = chars.next() {
            if c != '~' {
                out.push(c);
                continue;
            }
            match chars.next() {
                Some('0') => out.push('~'),
                Some('1') => out.push(DELIMITER),
                Some('2') => {
                    return Err(PathError::malformed(key, "key marker must start its segment"))
                }
                Some(other) => {
                    return Err(PathError::malformed(key, format!("unknown escape '~{other}'")))
                }
                None => return Err(PathError::malformed(key, "dangling '~'")),
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(segments: Vec<PathSegment>) -> FlatPath {
        FlatPath::new(segments)
    }

    #[test]
    fn test_encode_plain_path() {
        let p = path(vec!["a".into(), "b".into(), 0.into(), "c".into()]);
        assert_eq!(p.encode(), "a/b/0/c");
        assert_eq!(PathCodec::decode("a/b/0/c").unwrap(), p);
    }

    #[test]
    fn test_root_path_is_empty_string() {
        assert_eq!(FlatPath::root().encode(), "");
        assert_eq!(PathCodec::decode("").unwrap(), FlatPath::root());
    }

    #[test]
    fn test_delimiter_inside_key_is_escaped() {
        let p = path(vec!["meta".into(), "a/b".into(), "x~y".into()]);
        let encoded = p.encode();
        assert_eq!(encoded, "meta/a~1b/x~0y");
        assert_eq!(PathCodec::decode(&encoded).unwrap(), p);
    }

    #[test]
    fn test_numeric_key_differs_from_index() {
        let key = path(vec!["items".into(), "0".into()]);
        let index = path(vec!["items".into(), 0.into()]);

        assert_ne!(key.encode(), index.encode());
        assert_eq!(key.encode(), "items/~20");
        assert_eq!(PathCodec::decode("items/~20").unwrap(), key);
        assert_eq!(PathCodec::decode("items/0").unwrap(), index);
    }

    #[test]
    fn test_empty_key_differs_from_root() {
        let p = path(vec!["".into()]);
        assert_eq!(p.encode(), "~2");
        assert_eq!(PathCodec::decode("~2").unwrap(), p);
    }

    #[test]
    fn test_leading_zero_stays_a_key() {
        let decoded = PathCodec::decode("007").unwrap();
        assert_eq!(decoded, path(vec!["007".into()]));
        assert_eq!(decoded.encode(), "007");
    }

    #[test]
    fn test_malformed_paths() {
        for bad in ["a//b", "a/", "/a", "a~", "a~9", "a~2b", "~2abc", "99999999999999999999999"] {
            let err = PathCodec::decode(bad).unwrap_err();
            assert!(matches!(err, PathError::Malformed { .. }), "{bad} should be malformed");
        }
    }

    #[test]
    fn test_from_str_and_display() {
        let p: FlatPath = "meta/_elementor_data/0/id".parse().unwrap();
        assert_eq!(p.len(), 4);
        assert_eq!(p.to_string(), "meta/_elementor_data/0/id");
    }

    #[test]
    fn test_child_and_join() {
        let base = FlatPath::root().child("meta");
        let joined = base.join(&path(vec![0.into(), "title".into()]));
        assert_eq!(joined.encode(), "meta/0/title");
        assert!(joined.starts_with(&base));
        assert!(!base.starts_with(&joined));
    }
}
