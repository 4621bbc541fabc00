#![allow(clippy::too_many_lines)]
//! Generic "street" words in the languages covered by OSM address data.
//!
//! An entry like "Rue de la Paix" is also reachable as "de la paix", and
//! "ул. Тверская" as "тверская": the index stores street keys with any one
//! of these words removed, and the scorer ignores them when summing token
//! weights.
//!
//! The table holds words in their normalized form (lowercase, diacritics
//! stripped), so membership can be checked against query tokens directly.

use std::collections::BTreeSet;
use std::sync::LazyLock;

static STREET_SYNONYMS: LazyLock<BTreeSet<&'static str>> = LazyLock::new(|| {
    BTreeSet::from([
        // English
        "street",
        "st",
        "road",
        "rd",
        "avenue",
        "ave",
        "av",
        "boulevard",
        "blvd",
        "drive",
        "dr",
        "lane",
        "ln",
        "way",
        "place",
        "pl",
        "court",
        "ct",
        "terrace",
        "crescent",
        "highway",
        "hwy",
        "parkway",
        "pkwy",
        "alley",
        // French
        "rue",
        "r",
        "boulevard",
        "bd",
        "bvd",
        "allee",
        "chemin",
        "ch",
        "impasse",
        "imp",
        "quai",
        "route",
        "rte",
        "cours",
        "passage",
        // German
        "strasse",
        "straße",
        "str",
        "gasse",
        "weg",
        "allee",
        "damm",
        "ring",
        "ufer",
        "chaussee",
        // Dutch
        "straat",
        "laan",
        "steeg",
        "gracht",
        "kade",
        // Spanish / Portuguese / Galician
        "calle",
        "c",
        "avenida",
        "avda",
        "paseo",
        "camino",
        "carrer",
        "rua",
        "travessa",
        "calcada",
        "estrada",
        // Italian
        "via",
        "viale",
        "vicolo",
        "corso",
        "strada",
        // Russian / Ukrainian / Belarusian
        "улица",
        "ул",
        "вулиця",
        "вул",
        "вуліца",
        "проспект",
        "просп",
        "пр",
        "переулок",
        "пер",
        "провулок",
        "бульвар",
        "бул",
        "шоссе",
        "ш",
        "шосе",
        "проезд",
        "набережная",
        "наб",
        "тупик",
        "туп",
        "аллея",
        // Polish / Czech / Slovak
        "ulica",
        "ul",
        "aleja",
        "al",
        "ulice",
        "trida",
        "cesta",
        // Turkish
        "sokak",
        "sok",
        "sokagi",
        "cadde",
        "cad",
        "caddesi",
        "bulvar",
        "bulvari",
        // Scandinavian
        "gatan",
        "gata",
        "gate",
        "gade",
        "vej",
        "vagen",
        "vei",
        "katu",
        "tie",
    ])
});

/// Returns `true` if the token is a generic word for "street" (or one of
/// its abbreviations) in some language.
///
/// The token must already be normalized (see [`crate::normalize::tokenize`]).
#[must_use]
pub fn is_street_synonym(token: &str) -> bool {
    STREET_SYNONYMS.contains(token)
}
