//! The address hierarchy: every country, region, ..., street and building
//! known to the geocoder.
//!
//! A [`Hierarchy`] owns its entries in a vector sorted by id and is never
//! mutated after construction. Other structures (the [`crate::index::Index`],
//! search layers) refer to entries by their position in that vector.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use osm_geocoder_models::{GeoObjectId, ParsingStats, Type};

use crate::GeocoderError;
use crate::normalize;
use crate::progress::ProgressCallback;
use crate::reader;

/// One node of the address hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub id: GeoObjectId,

    /// Display name as found in the corpus.
    pub name: String,

    /// Normalized tokens of `name`. Only used to flag corpus
    /// inconsistencies; matching relies on `address`.
    pub name_tokens: Vec<String>,

    /// Most specific level with a non-empty address, or `Count` if none.
    pub finest_type: Type,

    /// Normalized address tokens, one sequence per level (indexed by
    /// [`Type::index`]). Levels without data are empty.
    pub address: [Vec<String>; Type::COUNT],
}

impl Entry {
    /// Builds an entry from raw (not yet normalized) per-level values.
    ///
    /// Levels may be given in any order; `Count` and empty values are
    /// ignored.
    #[must_use]
    pub fn new(id: GeoObjectId, name: &str, levels: &[(Type, &str)]) -> Self {
        let mut address: [Vec<String>; Type::COUNT] = Default::default();
        for &(ty, value) in levels {
            if ty != Type::Count {
                address[ty.index()] = normalize::tokenize(value);
            }
        }

        Self {
            id,
            name: name.to_string(),
            name_tokens: normalize::tokenize(name),
            finest_type: finest_type(&address),
            address,
        }
    }

    /// Address tokens at `ty`. Empty for `Count` and for levels without data.
    #[must_use]
    pub fn address(&self, ty: Type) -> &[String] {
        match ty {
            Type::Count => &[],
            _ => &self.address[ty.index()],
        }
    }
}

/// Returns the most specific level with non-empty tokens.
#[must_use]
pub fn finest_type(address: &[Vec<String>; Type::COUNT]) -> Type {
    Type::ALL
        .iter()
        .rev()
        .copied()
        .find(|ty| !address[ty.index()].is_empty())
        .unwrap_or(Type::Count)
}

/// Owning, id-sorted collection of all [`Entry`] values.
#[derive(Debug, Default)]
pub struct Hierarchy {
    entries: Vec<Entry>,
    stats: ParsingStats,
}

impl Hierarchy {
    /// Builds a hierarchy from already-parsed entries.
    ///
    /// Entries are sorted by id unless `sorted` says they already are.
    #[must_use]
    pub fn new(entries: Vec<Entry>, sorted: bool) -> Self {
        let loaded = entries.len() as u64;
        Self::with_stats(
            entries,
            sorted,
            ParsingStats {
                loaded,
                ..ParsingStats::default()
            },
        )
    }

    /// Builds a hierarchy and keeps the counters collected while parsing
    /// its entries.
    #[must_use]
    pub fn with_stats(mut entries: Vec<Entry>, sorted: bool, stats: ParsingStats) -> Self {
        if !sorted {
            log::debug!("Sorting {} hierarchy entries by id", entries.len());
            entries.sort_by_key(|e| e.id);
        }

        Self { entries, stats }
    }

    /// Reads a hierarchy corpus file (`<id> <json>` per line).
    ///
    /// Malformed lines are skipped and counted in [`Hierarchy::stats`].
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist or cannot be read.
    pub fn load(
        path: impl AsRef<Path>,
        sorted: bool,
        progress: &dyn ProgressCallback,
    ) -> Result<Self, GeocoderError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(GeocoderError::HierarchyNotFound(path.display().to_string()));
        }

        log::info!("Loading hierarchy from {}", path.display());

        let file = File::open(path)?;
        progress.set_total(file.metadata()?.len());

        let (entries, stats) = reader::read_entries(BufReader::new(file), progress)?;
        progress.finish(format!("{} entries loaded", stats.loaded));

        log::info!(
            "Hierarchy loaded: {} entries (bad ids: {}, bad jsons: {}, empty addresses: {}, \
             empty names: {}, duplicate addresses: {}, mismatched names: {})",
            stats.loaded,
            stats.bad_ids,
            stats.bad_jsons,
            stats.empty_addresses,
            stats.empty_names,
            stats.duplicate_addresses,
            stats.mismatched_names,
        );

        Ok(Self::with_stats(entries, sorted, stats))
    }

    #[must_use]
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Entry at position `pos` of [`Hierarchy::entries`].
    ///
    /// # Panics
    ///
    /// Panics if `pos` is out of bounds. Positions handed out by the index
    /// built over this hierarchy are always valid.
    #[must_use]
    pub fn entry(&self, pos: usize) -> &Entry {
        &self.entries[pos]
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub const fn stats(&self) -> &ParsingStats {
        &self.stats
    }

    /// Looks up an entry by id.
    #[must_use]
    pub fn get_entry(&self, id: GeoObjectId) -> Option<&Entry> {
        self.entries
            .binary_search_by_key(&id, |e| e.id)
            .ok()
            .map(|pos| &self.entries[pos])
    }

    /// Returns `true` if `candidate` can be an ancestor of `entry`: every
    /// level populated in `candidate` holds exactly the same tokens in
    /// `entry`. Levels empty in `candidate` are unconstrained.
    #[must_use]
    #[allow(clippy::unused_self)]
    pub fn is_parent_to(&self, candidate: &Entry, entry: &Entry) -> bool {
        candidate
            .address
            .iter()
            .zip(&entry.address)
            .all(|(parent, child)| parent.is_empty() || parent == child)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn country() -> Entry {
        Entry::new(
            GeoObjectId::relation(1),
            "France",
            &[(Type::Country, "France")],
        )
    }

    fn locality() -> Entry {
        Entry::new(
            GeoObjectId::node(2),
            "Paris",
            &[
                (Type::Country, "France"),
                (Type::Region, "Île-de-France"),
                (Type::Locality, "Paris"),
            ],
        )
    }

    #[test]
    fn entry_computes_finest_type() {
        assert_eq!(country().finest_type, Type::Country);
        assert_eq!(locality().finest_type, Type::Locality);
        assert_eq!(
            Entry::new(GeoObjectId::node(3), "", &[]).finest_type,
            Type::Count
        );
    }

    #[test]
    fn entry_tokenizes_levels() {
        let e = locality();
        assert_eq!(e.address(Type::Region), ["ile", "de", "france"]);
        assert!(e.address(Type::Subregion).is_empty());
        assert!(e.address(Type::Count).is_empty());
    }

    #[test]
    fn sorts_entries_by_id() {
        let hierarchy = Hierarchy::new(vec![locality(), country()], false);
        let ids: Vec<_> = hierarchy.entries().iter().map(|e| e.id).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
        assert_eq!(hierarchy.stats().loaded, 2);
    }

    #[test]
    fn finds_entries_by_id() {
        let hierarchy = Hierarchy::new(vec![locality(), country()], false);
        assert_eq!(
            hierarchy.get_entry(GeoObjectId::node(2)).map(|e| e.name.as_str()),
            Some("Paris")
        );
        assert!(hierarchy.get_entry(GeoObjectId::way(2)).is_none());
    }

    #[test]
    fn parent_levels_must_match_exactly() {
        let hierarchy = Hierarchy::default();
        let france = country();
        let paris = locality();
        assert!(hierarchy.is_parent_to(&france, &paris));
        assert!(!hierarchy.is_parent_to(&paris, &france));

        let other = Entry::new(
            GeoObjectId::relation(9),
            "Other",
            &[(Type::Country, "Other")],
        );
        assert!(!hierarchy.is_parent_to(&other, &paris));
    }

    #[test]
    fn entry_is_parent_to_itself() {
        let hierarchy = Hierarchy::default();
        let paris = locality();
        assert!(hierarchy.is_parent_to(&paris, &paris));
    }

    #[test]
    fn load_reports_missing_file() {
        let result = Hierarchy::load(
            "/nonexistent/hierarchy.jsonl",
            false,
            &crate::progress::NullProgress,
        );
        assert!(matches!(result, Err(GeocoderError::HierarchyNotFound(_))));
    }
}
