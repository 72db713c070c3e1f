use serde_json::Value as Json;
use std::fmt;

/// One step of a property path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

/// A dotted property path such as `payload.readings[0].value`, resolved against a
/// message or flow store.
///
/// An empty segment list addresses the store itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct PropertyPath {
    segments: Vec<PathSegment>,
}

impl PropertyPath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn from_segments(segments: Vec<PathSegment>) -> Self {
        Self { segments }
    }

    /// Parses the `a.b[0]["c d"]` notation used by rule properties.
    ///
    /// Returns `None` when the text is empty or malformed.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        let chars: Vec<char> = text.chars().collect();
        let mut segments = Vec::new();
        let mut key = String::new();
        let mut i = 0;
        // Set after a bracket so that `a[0].b` and `a[0]b`-style input are told apart.
        let mut after_bracket = false;

        while i < chars.len() {
            match chars[i] {
                '.' => {
                    if key.is_empty() && !after_bracket {
                        return None;
                    }
                    if !key.is_empty() {
                        segments.push(PathSegment::Key(std::mem::take(&mut key)));
                    }
                    after_bracket = false;
                    i += 1;
                    // A trailing dot leaves nothing to address.
                    if i == chars.len() {
                        return None;
                    }
                }
                '[' => {
                    if !key.is_empty() {
                        segments.push(PathSegment::Key(std::mem::take(&mut key)));
                    } else if segments.is_empty() {
                        return None;
                    }
                    let close = chars[i..].iter().position(|c| *c == ']')? + i;
                    let inner: String = chars[i + 1..close].iter().collect();
                    segments.push(Self::parse_bracket(inner.trim())?);
                    after_bracket = true;
                    i = close + 1;
                }
                c => {
                    if after_bracket {
                        return None;
                    }
                    key.push(c);
                    i += 1;
                }
            }
        }

        if !key.is_empty() {
            segments.push(PathSegment::Key(key));
        }
        Some(Self { segments })
    }

    fn parse_bracket(inner: &str) -> Option<PathSegment> {
        let quoted = inner.len() >= 2
            && ((inner.starts_with('"') && inner.ends_with('"'))
                || (inner.starts_with('\'') && inner.ends_with('\'')));
        if quoted {
            return Some(PathSegment::Key(inner[1..inner.len() - 1].to_string()));
        }
        inner.parse::<usize>().ok().map(PathSegment::Index)
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Walks the path through `store`. Missing keys, out-of-range indexes and
    /// stepping into scalars all resolve to `None`.
    pub fn resolve<'a>(&self, store: &'a Json) -> Option<&'a Json> {
        self.segments
            .iter()
            .try_fold(store, |current, segment| match (segment, current) {
                (PathSegment::Key(key), Json::Object(map)) => map.get(key),
                (PathSegment::Index(index), Json::Array(items)) => items.get(*index),
                _ => None,
            })
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return write!(f, "$");
        }
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                PathSegment::Key(key) if i == 0 => write!(f, "{}", key)?,
                PathSegment::Key(key) => write!(f, ".{}", key)?,
                PathSegment::Index(index) => write!(f, "[{}]", index)?,
            }
        }
        Ok(())
    }
}
