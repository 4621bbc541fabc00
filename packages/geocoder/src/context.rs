//! Per-query search state.
//!
//! A [`Context`] holds the query tokens, which level each token is
//! currently matched at, the stack of committed [`Layer`]s and the beam of
//! scored candidates. The search marks tokens and pushes layers through
//! guards ([`MarkedTokens`], [`PushedLayer`]) that undo the change when
//! dropped, so every return path out of a recursion frame leaves the
//! context as it found it.

use std::collections::HashSet;
use std::ops::{Deref, DerefMut, Range};

use osm_geocoder_models::{GeoObjectId, MAX_RESULTS, SearchResult, Type};

use crate::beam::{Beam, BeamEntry};
use crate::normalize;
use crate::synonyms;

/// Entries matched at one level by one token window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layer {
    pub ty: Type,
    /// Positions in [`crate::Hierarchy::entries`].
    pub entries: Vec<usize>,
}

impl Layer {
    #[must_use]
    pub const fn new(ty: Type) -> Self {
        Self {
            ty,
            entries: Vec::new(),
        }
    }
}

/// Identity of a candidate in the beam.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeamKey {
    pub id: GeoObjectId,
    pub ty: Type,
    /// Levels of all tokens marked when the candidate was found.
    pub all_types: Vec<Type>,
    pub all_tokens_used: bool,
}

impl BeamKey {
    /// A building reached through a settlement (region, subregion or
    /// locality), a street and its house number.
    #[must_use]
    pub fn is_good_house_number(&self) -> bool {
        if self.ty != Type::Building {
            return false;
        }

        let mut got_locality = false;
        let mut got_street = false;
        let mut got_building = false;
        for ty in &self.all_types {
            match ty {
                Type::Region | Type::Subregion | Type::Locality => got_locality = true,
                Type::Street => got_street = true,
                Type::Building => got_building = true,
                _ => {}
            }
        }
        got_locality && got_street && got_building
    }
}

/// Mutable state of one query.
#[derive(Debug)]
pub struct Context {
    tokens: Vec<String>,
    street_synonyms: Vec<bool>,
    token_types: Vec<Type>,
    num_used_tokens: usize,
    layers: Vec<Layer>,
    beam: Beam<BeamKey, f64>,
    surely_has_house_number: bool,
}

impl Context {
    /// Tokenizes `query` with the same normalization used for the corpus.
    #[must_use]
    pub fn new(query: &str) -> Self {
        Self::from_tokens(normalize::tokenize(query))
    }

    /// Builds a context over already-normalized tokens.
    #[must_use]
    pub fn from_tokens(tokens: Vec<String>) -> Self {
        let street_synonyms = tokens
            .iter()
            .map(|t| synonyms::is_street_synonym(t))
            .collect();
        let token_types = vec![Type::Count; tokens.len()];

        Self {
            tokens,
            street_synonyms,
            token_types,
            num_used_tokens: 0,
            layers: Vec::new(),
            beam: Beam::new(MAX_RESULTS),
            surely_has_house_number: false,
        }
    }

    #[must_use]
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    #[must_use]
    pub fn num_tokens(&self) -> usize {
        self.tokens.len()
    }

    /// Level the token at `i` is currently matched at (`Count` if unused).
    #[must_use]
    pub fn token_type(&self, i: usize) -> Type {
        self.token_types[i]
    }

    #[must_use]
    pub fn is_token_used(&self, i: usize) -> bool {
        self.token_types[i] != Type::Count
    }

    #[must_use]
    pub const fn num_used_tokens(&self) -> usize {
        self.num_used_tokens
    }

    #[must_use]
    pub fn all_tokens_used(&self) -> bool {
        self.num_used_tokens == self.tokens.len()
    }

    #[must_use]
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    #[must_use]
    pub const fn surely_has_house_number(&self) -> bool {
        self.surely_has_house_number
    }

    pub(crate) fn set_house_number_bit(&mut self) {
        self.surely_has_house_number = true;
    }

    #[must_use]
    pub fn beam(&self) -> &Beam<BeamKey, f64> {
        &self.beam
    }

    /// Marks the tokens in `range` as matched at `ty` until the returned
    /// guard is dropped.
    ///
    /// # Panics
    ///
    /// Panics if `ty` is `Count` or a token in `range` is already marked.
    pub fn mark_tokens(&mut self, range: Range<usize>, ty: Type) -> MarkedTokens<'_> {
        assert_ne!(ty, Type::Count, "tokens cannot be marked with Count");
        for i in range.clone() {
            assert!(!self.is_token_used(i), "token {i} is already marked");
            self.token_types[i] = ty;
        }
        self.num_used_tokens += range.len();

        MarkedTokens { ctx: self, range }
    }

    /// Commits `layer` until the returned guard is dropped.
    pub fn push_layer(&mut self, layer: Layer) -> PushedLayer<'_> {
        self.layers.push(layer);
        PushedLayer { ctx: self }
    }

    /// Sum of the level weights of all marked tokens. Generic street words
    /// carry no weight.
    #[must_use]
    pub fn certainty(&self) -> f64 {
        self.token_types
            .iter()
            .zip(&self.street_synonyms)
            .filter(|&(ty, is_synonym)| *ty != Type::Count && !is_synonym)
            .map(|(ty, _)| ty.weight())
            .sum()
    }

    /// Levels of all marked tokens, in query order.
    #[must_use]
    pub fn marked_types(&self) -> Vec<Type> {
        self.token_types
            .iter()
            .copied()
            .filter(|ty| *ty != Type::Count)
            .collect()
    }

    /// Offers a candidate to the beam.
    pub fn add_result(&mut self, key: BeamKey, certainty: f64) {
        self.beam.add(key, certainty);
    }

    /// Turns the beam into the final result list: one result per id, the
    /// best one scoring exactly 1.0.
    ///
    /// Once a house number was seen after a street, only buildings with a
    /// full address and candidates that explain the whole query survive.
    #[must_use]
    pub fn fill_results(&self) -> Vec<SearchResult> {
        let mut seen = HashSet::new();
        let mut results = Vec::new();

        for BeamEntry { key, value } in self.beam.entries() {
            if !seen.insert(key.id) {
                continue;
            }
            if self.surely_has_house_number && !key.is_good_house_number() && !key.all_tokens_used
            {
                continue;
            }
            results.push(SearchResult {
                id: key.id,
                certainty: *value,
            });
        }

        match results.first().map(|r| r.certainty) {
            Some(best) if best > 0.0 => {
                for result in &mut results {
                    result.certainty /= best;
                }
            }
            // Nothing but street words matched.
            _ => return Vec::new(),
        }

        results.truncate(MAX_RESULTS);
        results
    }
}

/// Guard returned by [`Context::mark_tokens`]. Unmarks the tokens on drop.
pub struct MarkedTokens<'a> {
    ctx: &'a mut Context,
    range: Range<usize>,
}

impl Deref for MarkedTokens<'_> {
    type Target = Context;

    fn deref(&self) -> &Context {
        self.ctx
    }
}

impl DerefMut for MarkedTokens<'_> {
    fn deref_mut(&mut self) -> &mut Context {
        self.ctx
    }
}

impl Drop for MarkedTokens<'_> {
    fn drop(&mut self) {
        for i in self.range.clone() {
            self.ctx.token_types[i] = Type::Count;
        }
        self.ctx.num_used_tokens -= self.range.len();
    }
}

/// Guard returned by [`Context::push_layer`]. Pops the layer on drop.
pub struct PushedLayer<'a> {
    ctx: &'a mut Context,
}

impl Deref for PushedLayer<'_> {
    type Target = Context;

    fn deref(&self) -> &Context {
        self.ctx
    }
}

impl DerefMut for PushedLayer<'_> {
    fn deref_mut(&mut self) -> &mut Context {
        self.ctx
    }
}

impl Drop for PushedLayer<'_> {
    fn drop(&mut self) {
        self.ctx.layers.pop();
    }
}
