#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Hierarchical geocoder over OSM-derived address entries.
//!
//! Resolves free-text queries such as "Paris, rue de la Paix 10" to the
//! ids of the countries, regions, ..., streets and buildings they name.
//!
//! # Architecture
//!
//! - **Load time**: A corpus of `<id> <json>` lines is read into a
//!   [`Hierarchy`] (every address level tokenized by [`normalize`]), then an
//!   [`Index`] is built from joined level tokens to entries, plus a map from
//!   each street to its buildings.
//! - **Query time**: The query is tokenized identically into a
//!   [`Context`]. A recursive search walks the levels from `Country` to
//!   `Building`, trying every window of unused tokens at each level,
//!   keeping only entries consistent with the previously matched level,
//!   and scoring candidates by the levels of the tokens they explain. The
//!   best 100 candidates are deduplicated and normalized so the top one
//!   scores 1.0.
//!
//! # Usage
//!
//! ```rust,no_run
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! use osm_geocoder::{Geocoder, progress::NullProgress};
//!
//! let geocoder = Geocoder::load("data/hierarchy.jsonl", false, &NullProgress)?;
//! for result in geocoder.process_query("France, Paris, rue de la Paix 10") {
//!     println!("{} {:.3}", result.id, result.certainty);
//! }
//! # Ok(())
//! # }
//! ```

pub mod beam;
pub mod context;
pub mod hierarchy;
pub mod house_numbers;
pub mod index;
pub mod normalize;
pub mod progress;
pub mod reader;
pub mod synonyms;
pub mod verify;

use std::ops::Range;
use std::path::Path;

pub use context::{BeamKey, Context, Layer};
pub use hierarchy::{Entry, Hierarchy};
pub use index::Index;
pub use osm_geocoder_models::{
    GeoObjectId, GeoObjectKind, GeocoderConfig, MAX_RESULTS, ParsingStats, SearchResult, Type,
};

use progress::ProgressCallback;

/// Errors from loading a geocoder.
#[derive(Debug, thiserror::Error)]
pub enum GeocoderError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be parsed.
    #[error("Config error: {0}")]
    Config(String),

    /// Hierarchy file not found.
    #[error("Hierarchy file not found: {0}")]
    HierarchyNotFound(String),
}

/// Reads a [`GeocoderConfig`] from a TOML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not valid TOML.
pub fn load_config(path: impl AsRef<Path>) -> Result<GeocoderConfig, GeocoderError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    toml::from_str(&text).map_err(|e| GeocoderError::Config(format!("{}: {e}", path.display())))
}

/// A hierarchy together with the index built over it.
///
/// Read-only once constructed, so one instance can answer queries from
/// many threads at once; each query gets its own [`Context`].
#[derive(Debug)]
pub struct Geocoder {
    hierarchy: Hierarchy,
    index: Index,
}

impl Geocoder {
    /// Builds the index over `hierarchy`.
    #[must_use]
    pub fn new(hierarchy: Hierarchy) -> Self {
        let index = Index::new(&hierarchy);
        Self { hierarchy, index }
    }

    /// Loads a hierarchy corpus file and builds the index over it.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist or cannot be read.
    pub fn load(
        hierarchy_path: impl AsRef<Path>,
        sorted: bool,
        progress: &dyn ProgressCallback,
    ) -> Result<Self, GeocoderError> {
        let hierarchy = Hierarchy::load(hierarchy_path, sorted, progress)?;
        Ok(Self::new(hierarchy))
    }

    /// Loads the hierarchy named by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist or cannot be read.
    pub fn from_config(
        config: &GeocoderConfig,
        progress: &dyn ProgressCallback,
    ) -> Result<Self, GeocoderError> {
        Self::load(&config.hierarchy_path, config.hierarchy_sorted, progress)
    }

    #[must_use]
    pub const fn hierarchy(&self) -> &Hierarchy {
        &self.hierarchy
    }

    #[must_use]
    pub const fn index(&self) -> &Index {
        &self.index
    }

    /// Geocodes a free-text query.
    ///
    /// Returns at most [`MAX_RESULTS`] results ordered by descending
    /// certainty, the first one with certainty 1.0. A query that matches
    /// nothing yields an empty list.
    #[must_use]
    pub fn process_query(&self, query: &str) -> Vec<SearchResult> {
        let mut ctx = Context::new(query);
        self.go(&mut ctx, Type::Country);
        let results = ctx.fill_results();

        log::debug!(
            "Query {query:?}: {} tokens, {} candidates, {} results",
            ctx.num_tokens(),
            ctx.beam().len(),
            results.len()
        );

        results
    }

    /// Tries every window of unused tokens at level `ty`, recursing into
    /// the next level for each window that matched something, and once
    /// more with nothing matched so that a level may be absent from the
    /// query.
    fn go(&self, ctx: &mut Context, ty: Type) {
        if ctx.num_tokens() == 0 || ctx.all_tokens_used() || ty == Type::Count {
            return;
        }

        let num_tokens = ctx.num_tokens();
        for i in 0..num_tokens {
            let mut j = i;
            while j < num_tokens && !ctx.is_token_used(j) {
                j += 1;

                let layer = if ty == Type::Building {
                    self.fill_buildings_layer(ctx, i..j)
                } else {
                    self.fill_regular_layer(ctx, ty, i..j)
                };
                if layer.entries.is_empty() {
                    continue;
                }

                log::trace!(
                    "{ty} window {:?} matched {} entries",
                    &ctx.tokens()[i..j],
                    layer.entries.len()
                );

                let mut marked = ctx.mark_tokens(i..j, ty);
                let certainty = marked.certainty();
                let all_types = marked.marked_types();
                let all_tokens_used = marked.all_tokens_used();

                for &pos in &layer.entries {
                    marked.add_result(
                        BeamKey {
                            id: self.hierarchy.entry(pos).id,
                            ty,
                            all_types: all_types.clone(),
                            all_tokens_used,
                        },
                        certainty,
                    );
                }

                let mut framed = marked.push_layer(layer);
                self.go(&mut framed, ty.next());
            }
        }

        self.go(ctx, ty.next());
    }

    /// Entries of level `ty` keyed by the window's tokens that fit under
    /// every entry of the last committed layer.
    ///
    /// A layer holding homonyms from different branches (two "Springfield"s)
    /// therefore never chains further down; the deeper level is only reached
    /// by skipping the ambiguous one.
    fn fill_regular_layer(&self, ctx: &Context, ty: Type, window: Range<usize>) -> Layer {
        let mut layer = Layer::new(ty);

        let Some(positions) = self.index.get_entries(&ctx.tokens()[window]) else {
            return layer;
        };
        let parent = ctx.layers().last();

        layer.entries = positions
            .iter()
            .copied()
            .filter(|&pos| {
                let entry = self.hierarchy.entry(pos);
                entry.finest_type == ty
                    && parent.is_none_or(|parent| {
                        parent
                            .entries
                            .iter()
                            .all(|&p| self.hierarchy.is_parent_to(self.hierarchy.entry(p), entry))
                    })
            })
            .collect();

        layer
    }

    /// Buildings on the streets of the last committed layer whose house
    /// number matches the window.
    fn fill_buildings_layer(&self, ctx: &mut Context, window: Range<usize>) -> Layer {
        let mut layer = Layer::new(Type::Building);

        if !ctx.layers().last().is_some_and(|l| l.ty == Type::Street) {
            return layer;
        }
        if !house_numbers::looks_like_house_number(&ctx.tokens()[window.clone()]) {
            return layer;
        }

        // Something resembling a house number follows a street. It may
        // still be e.g. a postcode, but results that ignore it are no
        // longer trustworthy.
        ctx.set_house_number_bit();

        let query_number = &ctx.tokens()[window];
        let Some(streets) = ctx.layers().last() else {
            return layer;
        };

        for &street_pos in &streets.entries {
            let street = self.hierarchy.entry(street_pos);
            let Some(buildings) = self.index.get_buildings_on_street(street.id) else {
                continue;
            };
            for &building_pos in buildings {
                let real_number = self.hierarchy.entry(building_pos).address(Type::Building);
                if house_numbers::house_numbers_match(real_number, query_number) {
                    layer.entries.push(building_pos);
                }
            }
        }

        layer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: GeoObjectId, levels: &[(Type, &str)]) -> Entry {
        let name = levels.last().map_or("", |&(_, value)| value);
        Entry::new(id, name, levels)
    }

    const FRANCE: GeoObjectId = GeoObjectId::relation(1);
    const IDF: GeoObjectId = GeoObjectId::relation(2);
    const PARIS: GeoObjectId = GeoObjectId::node(3);
    const PAIX: GeoObjectId = GeoObjectId::way(4);
    const PAIX_10: GeoObjectId = GeoObjectId::way(5);
    const OTHER: GeoObjectId = GeoObjectId::relation(6);
    const OTHER_IDF: GeoObjectId = GeoObjectId::relation(7);

    fn paris_geocoder() -> Geocoder {
        let country = [(Type::Country, "France")];
        let region = [country[0], (Type::Region, "Île-de-France")];
        let locality = [region[0], region[1], (Type::Locality, "Paris")];
        let street = [locality[0], locality[1], locality[2], (Type::Street, "Rue de la Paix")];
        let building = [street[0], street[1], street[2], street[3], (Type::Building, "10")];

        Geocoder::new(Hierarchy::new(
            vec![
                entry(PAIX_10, &building),
                entry(PAIX, &street),
                entry(PARIS, &locality),
                entry(IDF, &region),
                entry(FRANCE, &country),
                entry(OTHER, &[(Type::Country, "Other")]),
                entry(
                    OTHER_IDF,
                    &[(Type::Country, "Other"), (Type::Region, "Île-de-France")],
                ),
            ],
            false,
        ))
    }

    fn ids(results: &[SearchResult]) -> Vec<GeoObjectId> {
        results.iter().map(|r| r.id).collect()
    }

    fn assert_well_formed(results: &[SearchResult]) {
        assert!(results.len() <= MAX_RESULTS);
        if let Some(first) = results.first() {
            assert!((first.certainty - 1.0).abs() < f64::EPSILON);
        }
        for pair in results.windows(2) {
            assert!(pair[0].certainty >= pair[1].certainty);
        }
        for r in results {
            assert!((0.0..=1.0).contains(&r.certainty));
        }
        let mut unique = ids(results);
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), results.len(), "duplicate ids in {results:?}");
    }

    #[test]
    fn full_address_round_trips() {
        let geocoder = paris_geocoder();
        for (query, expected) in [
            ("France", FRANCE),
            ("France Île-de-France", IDF),
            ("France Île-de-France Paris", PARIS),
            ("France Île-de-France Paris Rue de la Paix", PAIX),
            ("France Île-de-France Paris Rue de la Paix 10", PAIX_10),
        ] {
            let results = geocoder.process_query(query);
            assert_well_formed(&results);
            assert_eq!(results[0].id, expected, "query {query:?}: {results:?}");
        }
    }

    #[test]
    fn levels_may_be_omitted() {
        let geocoder = paris_geocoder();
        let results = geocoder.process_query("Paris, rue de la Paix");
        assert_well_formed(&results);
        assert_eq!(results[0].id, PAIX);
    }

    #[test]
    fn street_word_may_be_omitted() {
        let geocoder = paris_geocoder();

        assert!(ids(&geocoder.process_query("rue de la paix")).contains(&PAIX));
        assert!(ids(&geocoder.process_query("de la paix")).contains(&PAIX));
        assert!(!ids(&geocoder.process_query("paix")).contains(&PAIX));
    }

    #[test]
    fn regions_do_not_leak_across_countries() {
        let geocoder = paris_geocoder();
        let results = geocoder.process_query("other ile-de-france");
        assert_well_formed(&results);
        assert_eq!(results[0].id, OTHER_IDF);

        let results = geocoder.process_query("france ile-de-france");
        assert_eq!(results[0].id, IDF);
    }

    #[test]
    fn matching_house_number_finds_building() {
        let geocoder = paris_geocoder();
        let results = geocoder.process_query("Paris rue de la Paix 10");
        assert_well_formed(&results);
        assert_eq!(results[0].id, PAIX_10);

        let results = geocoder.process_query("rue de la Paix 10");
        assert_eq!(results[0].id, PAIX_10);
    }

    #[test]
    fn unknown_house_number_never_returns_building() {
        let geocoder = paris_geocoder();
        let results = geocoder.process_query("Paris rue de la Paix 999");
        assert_well_formed(&results);
        assert!(!ids(&results).contains(&PAIX_10));
    }

    #[test]
    fn house_number_requires_street_first() {
        let geocoder = paris_geocoder();
        let results = geocoder.process_query("10 Paris");
        assert!(!ids(&results).contains(&PAIX_10));
    }

    #[test]
    fn empty_and_garbage_queries_yield_nothing() {
        let geocoder = paris_geocoder();
        assert!(geocoder.process_query("").is_empty());
        assert!(geocoder.process_query("  ,;. ").is_empty());
        assert!(geocoder.process_query("qwerty uiop").is_empty());
    }

    #[test]
    fn results_are_capped() {
        let streets: Vec<Entry> = (0..150)
            .map(|i| entry(GeoObjectId::way(i), &[(Type::Street, "Main Street")]))
            .collect();
        let geocoder = Geocoder::new(Hierarchy::new(streets, true));

        let results = geocoder.process_query("main street");
        assert_eq!(results.len(), MAX_RESULTS);
        assert_well_formed(&results);
    }

    #[test]
    fn homonym_layer_does_not_chain() {
        const ILLINOIS: GeoObjectId = GeoObjectId::relation(10);
        const OREGON: GeoObjectId = GeoObjectId::relation(11);
        const SPRINGFIELD_IL: GeoObjectId = GeoObjectId::node(12);
        const SPRINGFIELD_OR: GeoObjectId = GeoObjectId::node(13);
        const MAIN_STREET: GeoObjectId = GeoObjectId::way(14);
        const MAIN_STREET_10: GeoObjectId = GeoObjectId::way(15);

        let illinois = [(Type::Region, "Illinois")];
        let springfield_il = [illinois[0], (Type::Locality, "Springfield")];
        let springfield_or = [(Type::Region, "Oregon"), (Type::Locality, "Springfield")];
        let main_street = [springfield_il[0], springfield_il[1], (Type::Street, "Main Street")];
        let house = [main_street[0], main_street[1], main_street[2], (Type::Building, "10")];

        let geocoder = Geocoder::new(Hierarchy::new(
            vec![
                entry(ILLINOIS, &illinois),
                entry(OREGON, &springfield_or[..1]),
                entry(SPRINGFIELD_IL, &springfield_il),
                entry(SPRINGFIELD_OR, &springfield_or),
                entry(MAIN_STREET, &main_street),
                entry(MAIN_STREET_10, &house),
            ],
            false,
        ));

        let results = geocoder.process_query("springfield main street");
        assert_well_formed(&results);
        assert!([SPRINGFIELD_IL, SPRINGFIELD_OR].contains(&results[0].id));
        // Only "main" counts for the street, reached without the locality.
        let street = results.iter().find(|r| r.id == MAIN_STREET).unwrap();
        assert!((street.certainty - 1.0 / 3.0).abs() < 1e-9);

        assert!(geocoder.process_query("springfield main street 10").is_empty());
    }

    #[test]
    fn serves_concurrent_queries() {
        let geocoder = paris_geocoder();
        std::thread::scope(|s| {
            let handles: Vec<_> = (0..4)
                .map(|_| s.spawn(|| geocoder.process_query("Paris rue de la Paix 10")))
                .collect();
            for handle in handles {
                let results = handle.join().unwrap();
                assert_eq!(results[0].id, PAIX_10);
            }
        });
    }
}
