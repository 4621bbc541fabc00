//! Token index over a [`Hierarchy`].
//!
//! Maps the joined address tokens of each entry's finest level to the
//! entries carrying them, and each street to the buildings standing on it.
//! Built once right after the hierarchy and read-only afterwards. Entries
//! are referenced by their position in [`Hierarchy::entries`].

use std::collections::HashMap;

use osm_geocoder_models::{GeoObjectId, Type};

use crate::hierarchy::{Entry, Hierarchy};
use crate::synonyms;

/// Lookup structure from normalized address tokens to hierarchy entries.
#[derive(Debug, Default)]
pub struct Index {
    entries_by_tokens: HashMap<String, Vec<usize>>,
    buildings_on_street: HashMap<GeoObjectId, Vec<usize>>,
}

/// Canonical key for a token sequence.
fn make_key<S: AsRef<str>>(tokens: &[S]) -> String {
    let mut key = String::new();
    for (i, token) in tokens.iter().enumerate() {
        if i > 0 {
            key.push(' ');
        }
        key.push_str(token.as_ref());
    }
    key
}

impl Index {
    /// Builds the index over every entry of `hierarchy`.
    #[must_use]
    pub fn new(hierarchy: &Hierarchy) -> Self {
        let mut index = Self::default();

        log::info!("Indexing {} hierarchy entries...", hierarchy.len());
        index.add_entries(hierarchy);
        log::info!("  {} keys indexed", index.entries_by_tokens.len());

        log::info!("Linking buildings to streets...");
        index.add_houses(hierarchy);
        log::info!(
            "  {} building links on {} streets",
            index.buildings_on_street.values().map(Vec::len).sum::<usize>(),
            index.buildings_on_street.len()
        );

        index
    }

    fn add_entries(&mut self, hierarchy: &Hierarchy) {
        for (pos, entry) in hierarchy.entries().iter().enumerate() {
            match entry.finest_type {
                Type::Count => {}
                Type::Street => self.add_street(pos, entry),
                ty => self.insert(make_key(entry.address(ty)), pos),
            }
        }
    }

    /// Streets are indexed under their full name and, for every generic
    /// street word in it, under the name with that word removed.
    fn add_street(&mut self, pos: usize, entry: &Entry) {
        let tokens = entry.address(Type::Street);
        self.insert(make_key(tokens), pos);

        for (i, token) in tokens.iter().enumerate() {
            if !synonyms::is_street_synonym(token) {
                continue;
            }
            let rest: Vec<&str> = tokens
                .iter()
                .enumerate()
                .filter(|&(j, _)| j != i)
                .map(|(_, t)| t.as_str())
                .collect();
            if rest.is_empty() {
                continue;
            }
            self.insert(make_key(&rest), pos);
        }
    }

    fn add_houses(&mut self, hierarchy: &Hierarchy) {
        for (pos, building) in hierarchy.entries().iter().enumerate() {
            if building.finest_type != Type::Building {
                continue;
            }

            let street_tokens = building.address(Type::Street);
            if street_tokens.is_empty() {
                continue;
            }
            let Some(candidates) = self.entries_by_tokens.get(&make_key(street_tokens)) else {
                continue;
            };

            for &street_pos in candidates {
                let street = hierarchy.entry(street_pos);
                if street.finest_type != Type::Street || !hierarchy.is_parent_to(street, building)
                {
                    continue;
                }
                self.buildings_on_street
                    .entry(street.id)
                    .or_default()
                    .push(pos);
            }
        }
    }

    fn insert(&mut self, key: String, pos: usize) {
        let positions = self.entries_by_tokens.entry(key).or_default();
        // A street whose name holds the same synonym twice yields the same
        // stripped key twice.
        if positions.last() != Some(&pos) {
            positions.push(pos);
        }
    }

    /// Returns the entries whose finest-level tokens equal `tokens`
    /// exactly (or, for streets, equal them with one street word removed).
    #[must_use]
    pub fn get_entries<S: AsRef<str>>(&self, tokens: &[S]) -> Option<&[usize]> {
        self.entries_by_tokens
            .get(&make_key(tokens))
            .map(Vec::as_slice)
    }

    /// Returns the buildings linked to the street with id `street_id`.
    #[must_use]
    pub fn get_buildings_on_street(&self, street_id: GeoObjectId) -> Option<&[usize]> {
        self.buildings_on_street
            .get(&street_id)
            .map(Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paix_hierarchy() -> Hierarchy {
        let levels = [
            (Type::Country, "France"),
            (Type::Locality, "Paris"),
            (Type::Street, "Rue de la Paix"),
        ];
        let street = Entry::new(GeoObjectId::way(10), "Rue de la Paix", &levels);
        let building = Entry::new(
            GeoObjectId::way(11),
            "10",
            &[
                (Type::Country, "France"),
                (Type::Locality, "Paris"),
                (Type::Street, "Rue de la Paix"),
                (Type::Building, "10"),
            ],
        );
        let elsewhere = Entry::new(
            GeoObjectId::way(12),
            "10",
            &[
                (Type::Country, "France"),
                (Type::Locality, "Lyon"),
                (Type::Street, "Rue de la Paix"),
                (Type::Building, "10"),
            ],
        );
        let country = Entry::new(GeoObjectId::relation(1), "France", &[levels[0]]);
        Hierarchy::new(vec![street, building, elsewhere, country], false)
    }

    fn ids(hierarchy: &Hierarchy, positions: Option<&[usize]>) -> Vec<GeoObjectId> {
        positions
            .unwrap_or_default()
            .iter()
            .map(|&pos| hierarchy.entry(pos).id)
            .collect()
    }

    #[test]
    fn indexes_finest_level() {
        let hierarchy = paix_hierarchy();
        let index = Index::new(&hierarchy);
        assert_eq!(
            ids(&hierarchy, index.get_entries(&["france"])),
            [GeoObjectId::relation(1)]
        );
        assert!(index.get_entries(&["paris"]).is_none());
    }

    #[test]
    fn indexes_streets_with_and_without_synonym() {
        let hierarchy = paix_hierarchy();
        let index = Index::new(&hierarchy);
        let street = [GeoObjectId::way(10)];

        assert_eq!(
            ids(&hierarchy, index.get_entries(&["rue", "de", "la", "paix"])),
            street
        );
        assert_eq!(
            ids(&hierarchy, index.get_entries(&["de", "la", "paix"])),
            street
        );
        assert!(index.get_entries(&["paix"]).is_none());
    }

    #[test]
    fn links_buildings_to_their_street_only() {
        let hierarchy = paix_hierarchy();
        let index = Index::new(&hierarchy);

        assert_eq!(
            ids(&hierarchy, index.get_buildings_on_street(GeoObjectId::way(10))),
            [GeoObjectId::way(11)]
        );
        assert!(index.get_buildings_on_street(GeoObjectId::way(11)).is_none());
    }

    #[test]
    fn lone_synonym_is_not_stripped_to_empty_key() {
        let street = Entry::new(GeoObjectId::way(1), "Street", &[(Type::Street, "Street")]);
        let hierarchy = Hierarchy::new(vec![street], true);
        let index = Index::new(&hierarchy);

        assert!(index.get_entries(&["street"]).is_some());
        assert!(index.get_entries::<&str>(&[]).is_none());
    }
}
