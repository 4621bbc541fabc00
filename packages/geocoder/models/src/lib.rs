#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Shared types for the hierarchical OSM geocoder.
//!
//! This crate contains only data types, configuration structs, and simple
//! conversions. It has no heavyweight dependencies (no regex, no I/O).

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Maximum number of candidates kept by the search beam, and therefore the
/// maximum number of results returned for a single query.
pub const MAX_RESULTS: usize = 100;

/// Administrative level of a hierarchy entry, ordered from the most general
/// (`Country`) to the most specific (`Building`).
///
/// `Count` is a sentinel meaning "unassigned" (for query tokens) or "past
/// the last level" (for the search recursion).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Type {
    Country,
    Region,
    Subregion,
    Locality,
    Suburb,
    Sublocality,
    Street,
    Building,
    Count,
}

impl Type {
    /// Number of real levels (everything except `Count`).
    pub const COUNT: usize = 8;

    /// All real levels in search order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::Country,
        Self::Region,
        Self::Subregion,
        Self::Locality,
        Self::Suburb,
        Self::Sublocality,
        Self::Street,
        Self::Building,
    ];

    /// Position of this level in [`Type::ALL`]. `Count` maps to
    /// [`Type::COUNT`].
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Returns the next more specific level, or `None` for `Count`.
    #[must_use]
    pub const fn checked_next(self) -> Option<Self> {
        match self {
            Self::Country => Some(Self::Region),
            Self::Region => Some(Self::Subregion),
            Self::Subregion => Some(Self::Locality),
            Self::Locality => Some(Self::Suburb),
            Self::Suburb => Some(Self::Sublocality),
            Self::Sublocality => Some(Self::Street),
            Self::Street => Some(Self::Building),
            Self::Building => Some(Self::Count),
            Self::Count => None,
        }
    }

    /// Returns the next more specific level.
    ///
    /// # Panics
    ///
    /// Panics if called on `Count`. The search recursion stops before
    /// reaching it, so this indicates a broken recursion guard.
    #[must_use]
    pub fn next(self) -> Self {
        self.checked_next()
            .unwrap_or_else(|| panic!("Type::next() called on the Count sentinel"))
    }

    /// Score contributed by one query token matched at this level.
    #[must_use]
    pub const fn weight(self) -> f64 {
        match self {
            Self::Country => 10.0,
            Self::Region => 5.0,
            Self::Subregion => 4.0,
            Self::Locality | Self::Suburb => 3.0,
            Self::Sublocality => 2.0,
            Self::Street => 1.0,
            Self::Building => 0.1,
            Self::Count => 0.0,
        }
    }
}

/// Kind tag embedded in the two high bits of a [`GeoObjectId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum GeoObjectKind {
    Node,
    Way,
    Relation,
}

/// OSM object identifier with the object kind encoded in bits 62 and 63.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GeoObjectId(u64);

impl GeoObjectId {
    pub const NODE_BIT: u64 = 1 << 62;
    pub const WAY_BIT: u64 = 1 << 63;
    pub const RELATION_BIT: u64 = Self::NODE_BIT | Self::WAY_BIT;

    const TAG_MASK: u64 = Self::NODE_BIT | Self::WAY_BIT | Self::RELATION_BIT;

    /// Wraps an already-encoded id (tag bits included).
    #[must_use]
    pub const fn from_encoded(encoded: u64) -> Self {
        Self(encoded)
    }

    #[must_use]
    pub const fn node(serial: u64) -> Self {
        Self((serial & !Self::TAG_MASK) | Self::NODE_BIT)
    }

    #[must_use]
    pub const fn way(serial: u64) -> Self {
        Self((serial & !Self::TAG_MASK) | Self::WAY_BIT)
    }

    #[must_use]
    pub const fn relation(serial: u64) -> Self {
        Self((serial & !Self::TAG_MASK) | Self::RELATION_BIT)
    }

    /// The encoded id, tag bits included.
    #[must_use]
    pub const fn encoded(self) -> u64 {
        self.0
    }

    /// The raw OSM id with the kind tag masked off.
    #[must_use]
    pub const fn serial(self) -> u64 {
        self.0 & !Self::TAG_MASK
    }

    /// Decodes the kind tag. Returns `None` when no tag bit is set.
    #[must_use]
    pub const fn kind(self) -> Option<GeoObjectKind> {
        match self.0 & Self::TAG_MASK {
            Self::NODE_BIT => Some(GeoObjectKind::Node),
            Self::WAY_BIT => Some(GeoObjectKind::Way),
            Self::RELATION_BIT => Some(GeoObjectKind::Relation),
            _ => None,
        }
    }
}

impl std::fmt::Display for GeoObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

/// A single geocoding result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Matched hierarchy entry.
    pub id: GeoObjectId,
    /// Confidence in `[0, 1]`; the best result of a query has exactly 1.0.
    pub certainty: f64,
}

/// Counters collected while reading a hierarchy corpus.
///
/// None of these abort loading; they exist to diagnose the quality of the
/// source data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsingStats {
    /// Lines whose id could not be parsed (skipped).
    pub bad_ids: u64,
    /// Lines whose JSON payload was malformed (skipped).
    pub bad_jsons: u64,
    /// Records without a name (kept).
    pub empty_names: u64,
    /// Records without any address level (skipped).
    pub empty_addresses: u64,
    /// Records where a level repeats a more general level (kept).
    pub duplicate_addresses: u64,
    /// Records whose name differs from their finest address level (kept).
    pub mismatched_names: u64,
    /// Records that made it into the hierarchy.
    pub loaded: u64,
}

/// Configuration for loading a hierarchy and answering queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeocoderConfig {
    /// Path to the hierarchy corpus (`<id> <json>` per line).
    #[serde(default)]
    pub hierarchy_path: String,

    /// Whether the corpus is already sorted by id.
    #[serde(default)]
    pub hierarchy_sorted: bool,

    /// Number of results to print per query.
    /// Defaults to 5.
    #[serde(default = "default_top")]
    pub top: usize,
}

const fn default_top() -> usize {
    5
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            hierarchy_path: String::new(),
            hierarchy_sorted: false,
            top: default_top(),
        }
    }
}
