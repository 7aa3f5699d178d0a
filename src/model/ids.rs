//! Typed identifiers for trail graph nodes.
//!
//! Node identifiers are small integers assigned in creation order and are
//! unique within their trail. They serialize as plain numbers, which keeps
//! query output compact and gives a stable sort key for deterministic
//! ordering (creation order == id order).

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier of a trail (one execution run's provenance graph).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TrailId(Uuid);

impl TrailId {
    /// Generate a fresh trail identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a trail identifier from its string form.
    pub fn parse(s: &str) -> Option<Self> {
        Uuid::parse_str(s).ok().map(Self)
    }
}

impl fmt::Display for TrailId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

macro_rules! node_id {
    ($(#[$doc:meta])* $name:ident, $prefix:literal) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        pub struct $name(pub u32);

        impl $name {
            /// Index into the owning arena.
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, ":{}"), self.0)
            }
        }
    };
}

node_id!(
    /// Identifier of a schema-level table node.
    TableId,
    "table"
);
node_id!(
    /// Identifier of a schema-level column node.
    ColumnId,
    "column"
);
node_id!(
    /// Identifier of a populated (per-trail) table node.
    PopulatedTableId,
    "populated"
);
node_id!(
    /// Identifier of a row node.
    RowId,
    "row"
);
node_id!(
    /// Identifier of a value node.
    ValueId,
    "value"
);
