//! Hierarchical cache keys.
//!
//! A `CacheKey` is an ordered tuple `(namespace, ...segments)`. The private
//! inner struct means a key can ONLY be built from a namespace root and then
//! extended, so every key starts with its namespace and two namespaces can
//! never share a root. Invalidating a key invalidates every key it prefixes.

use serde::Serialize;
use std::fmt;
use stockroom_core::{EntityIdType, MovementType};
use uuid::Uuid;

/// Top-level cache namespaces, one per entity family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Namespace {
    Products,
    Categories,
    Movements,
    Technicians,
    Dashboard,
    Organizations,
    Inventory,
}

impl Namespace {
    pub const ALL: [Namespace; 7] = [
        Namespace::Products,
        Namespace::Categories,
        Namespace::Movements,
        Namespace::Technicians,
        Namespace::Dashboard,
        Namespace::Organizations,
        Namespace::Inventory,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Products => "products",
            Self::Categories => "categories",
            Self::Movements => "movements",
            Self::Technicians => "technicians",
            Self::Dashboard => "dashboard",
            Self::Organizations => "organizations",
            Self::Inventory => "inventory",
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One segment of a cache key after the namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum KeySegment {
    /// Fixed sub-resource name ("list", "detail", "summary", ...).
    Tag(&'static str),
    Id(Uuid),
    Text(String),
    Int(i64),
    Bool(bool),
    /// An optional parameter that was not supplied. Kept positionally so
    /// "all organizations" and "organization X" never share a key.
    Absent,
    /// Named filter parameters, in declaration order.
    Params(Vec<(&'static str, KeySegment)>),
}

impl KeySegment {
    pub fn tag(name: &'static str) -> Self {
        Self::Tag(name)
    }

    pub fn id<T: EntityIdType>(id: T) -> Self {
        Self::Id(id.as_uuid())
    }

    pub fn opt_id<T: EntityIdType>(id: Option<T>) -> Self {
        id.map_or(Self::Absent, Self::id)
    }

    pub fn opt_text(text: Option<&str>) -> Self {
        text.map_or(Self::Absent, |t| Self::Text(t.to_string()))
    }

    pub fn opt_int(value: Option<i64>) -> Self {
        value.map_or(Self::Absent, Self::Int)
    }

    pub fn opt_movement_type(movement_type: Option<MovementType>) -> Self {
        movement_type.map_or(Self::Absent, |t| Self::Tag(t.as_str()))
    }
}

impl fmt::Display for KeySegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tag(tag) => f.write_str(tag),
            Self::Id(id) => id.fmt(f),
            Self::Text(text) => write!(f, "{:?}", text),
            Self::Int(value) => value.fmt(f),
            Self::Bool(value) => value.fmt(f),
            Self::Absent => f.write_str("_"),
            Self::Params(params) => {
                f.write_str("{")?;
                for (i, (name, value)) in params.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}={}", name, value)?;
                }
                f.write_str("}")
            }
        }
    }
}

/// Structured cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CacheKey {
    /// Private inner data - cannot be constructed externally
    inner: KeyInner,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
struct KeyInner {
    namespace: Namespace,
    segments: Vec<KeySegment>,
}

impl CacheKey {
    /// The root key of a namespace: a singleton tuple.
    pub fn root(namespace: Namespace) -> Self {
        Self {
            inner: KeyInner {
                namespace,
                segments: Vec::new(),
            },
        }
    }

    /// A new key extending this one by a single segment.
    pub fn child(&self, segment: KeySegment) -> Self {
        let mut segments = Vec::with_capacity(self.inner.segments.len() + 1);
        segments.extend_from_slice(&self.inner.segments);
        segments.push(segment);
        Self {
            inner: KeyInner {
                namespace: self.inner.namespace,
                segments,
            },
        }
    }

    pub fn namespace(&self) -> Namespace {
        self.inner.namespace
    }

    /// Segments after the namespace.
    pub fn segments(&self) -> &[KeySegment] {
        &self.inner.segments
    }

    /// Number of tuple elements, namespace included.
    pub fn len(&self) -> usize {
        1 + self.inner.segments.len()
    }

    /// Keys always hold at least their namespace.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn is_root(&self) -> bool {
        self.inner.segments.is_empty()
    }

    /// True if `self` is a (non-strict) tuple prefix of `other`.
    pub fn is_prefix_of(&self, other: &CacheKey) -> bool {
        self.inner.namespace == other.inner.namespace
            && other.inner.segments.starts_with(&self.inner.segments)
    }

    /// True if `prefix` is a (non-strict) tuple prefix of `self`.
    pub fn starts_with(&self, prefix: &CacheKey) -> bool {
        prefix.is_prefix_of(self)
    }

    /// The key one level up, or `None` for a namespace root.
    pub fn parent(&self) -> Option<CacheKey> {
        let (_, head) = self.inner.segments.split_last()?;
        Some(Self {
            inner: KeyInner {
                namespace: self.inner.namespace,
                segments: head.to_vec(),
            },
        })
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.inner.namespace.as_str())?;
        for segment in &self.inner.segments {
            write!(f, "/{}", segment)?;
        }
        Ok(())
    }
}
