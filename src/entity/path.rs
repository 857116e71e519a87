//! Property paths into nested containers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One step below a property: a mapping key or a sequence position.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => f.write_str(key),
            PathSegment::Index(index) => write!(f, "{}", index),
        }
    }
}

/// Location of a value inside an object: a property name plus container segments.
///
/// Displayed dotted, e.g. `items.3` or `byKey.a.0`. The structured form is
/// what gets serialized, so keys containing dots stay unambiguous.
///
/// ```
/// use weft_di::PropertyPath;
///
/// let path = PropertyPath::new("byKey").key("a").index(0);
/// assert_eq!(path.to_string(), "byKey.a.0");
/// assert_eq!(path.property(), "byKey");
/// assert_eq!(path.segments().len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PropertyPath {
    property: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    segments: Vec<PathSegment>,
}

impl PropertyPath {
    pub fn new(property: impl Into<String>) -> Self {
        Self { property: property.into(), segments: Vec::new() }
    }

    /// Extends the path with a mapping key.
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.segments.push(PathSegment::Key(key.into()));
        self
    }

    /// Extends the path with a sequence position.
    pub fn index(mut self, index: usize) -> Self {
        self.segments.push(PathSegment::Index(index));
        self
    }

    pub(crate) fn child(&self, segment: PathSegment) -> Self {
        let mut path = self.clone();
        path.segments.push(segment);
        path
    }

    pub fn property(&self) -> &str {
        &self.property
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// `true` when the path points below the top-level property.
    pub fn is_nested(&self) -> bool {
        !self.segments.is_empty()
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.property)?;
        for segment in &self.segments {
            write!(f, ".{}", segment)?;
        }
        Ok(())
    }
}
