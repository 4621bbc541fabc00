//! Hierarchy corpus reader.
//!
//! Each line of a corpus file holds one entry:
//!
//! ```text
//! -4611686018427387903 {"properties": {"name": "Paris", "address": {"country": "France", "locality": "Paris"}}}
//! ```
//!
//! The id is the encoded [`GeoObjectId`] written as a signed or unsigned
//! decimal. Address keys are the lowercase level names. Malformed lines
//! are logged, counted in [`ParsingStats`] and skipped; they never abort a
//! load.

use std::collections::BTreeMap;
use std::io::BufRead;
use std::str::FromStr;

use osm_geocoder_models::{GeoObjectId, ParsingStats, Type};
use serde::Deserialize;

use crate::GeocoderError;
use crate::hierarchy::{Entry, finest_type};
use crate::normalize;
use crate::progress::ProgressCallback;

/// Log a progress line every this many loaded entries.
const LOG_BATCH: u64 = 100_000;

#[derive(Debug, Deserialize)]
struct RawEntry {
    properties: RawProperties,
}

#[derive(Debug, Deserialize)]
struct RawProperties {
    #[serde(default)]
    name: Option<String>,
    address: BTreeMap<String, String>,
}

/// Reads every entry from a corpus stream.
///
/// # Errors
///
/// Returns an error only if the underlying reader fails. Bad records are
/// skipped and counted.
pub fn read_entries<R: BufRead>(
    mut reader: R,
    progress: &dyn ProgressCallback,
) -> Result<(Vec<Entry>, ParsingStats), GeocoderError> {
    let mut entries = Vec::new();
    let mut stats = ParsingStats::default();
    let mut buf = Vec::new();

    loop {
        buf.clear();
        let read = reader.read_until(b'\n', &mut buf)?;
        if read == 0 {
            break;
        }
        progress.inc(read as u64);

        let Ok(line) = std::str::from_utf8(&buf) else {
            log::warn!("Skipping line with invalid UTF-8");
            stats.bad_jsons += 1;
            continue;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(entry) = parse_line(line, &mut stats) {
            stats.loaded += 1;
            if stats.loaded.is_multiple_of(LOG_BATCH) {
                log::info!("  read {} entries...", stats.loaded);
            }
            entries.push(entry);
        }
    }

    Ok((entries, stats))
}

/// Parses one corpus line. Returns `None` (and bumps a counter) for lines
/// that cannot become an entry.
pub fn parse_line(line: &str, stats: &mut ParsingStats) -> Option<Entry> {
    let (raw_id, json) = line.split_once(char::is_whitespace).unwrap_or((line, ""));

    let Some(id) = parse_encoded_id(raw_id) else {
        log::warn!("Cannot read osm id from line: {line}");
        stats.bad_ids += 1;
        return None;
    };

    parse_entry(id, json.trim_start(), stats)
}

fn parse_encoded_id(raw: &str) -> Option<GeoObjectId> {
    #[allow(clippy::cast_sign_loss)]
    let encoded = raw
        .parse::<u64>()
        .ok()
        .or_else(|| raw.parse::<i64>().ok().map(|v| v as u64))?;
    Some(GeoObjectId::from_encoded(encoded))
}

/// Builds an entry from its JSON payload.
fn parse_entry(id: GeoObjectId, json: &str, stats: &mut ParsingStats) -> Option<Entry> {
    let raw: RawEntry = match serde_json::from_str(json) {
        Ok(raw) => raw,
        Err(e) => {
            log::debug!("Bad json for {id}: {e}");
            stats.bad_jsons += 1;
            return None;
        }
    };

    let mut address: [Vec<String>; Type::COUNT] = Default::default();
    let mut has_duplicate = false;

    for (key, value) in &raw.properties.address {
        let Ok(ty) = Type::from_str(key) else {
            continue;
        };
        if ty == Type::Count {
            continue;
        }

        let tokens = normalize::tokenize(value);
        if tokens.is_empty() {
            continue;
        }
        address[ty.index()] = tokens;
    }

    for ty in Type::ALL {
        let tokens = &address[ty.index()];
        if tokens.is_empty() {
            continue;
        }
        if address[..ty.index()].iter().any(|general| general == tokens) {
            log::debug!("Duplicate {ty} address for {id}");
            has_duplicate = true;
        }
    }

    let name = raw.properties.name.unwrap_or_default();
    let name_tokens = normalize::tokenize(&name);
    let finest = finest_type(&address);

    if name.is_empty() {
        stats.empty_names += 1;
    }
    if has_duplicate {
        stats.duplicate_addresses += 1;
    }
    if finest == Type::Count {
        log::debug!("Empty address for {id}");
        stats.empty_addresses += 1;
        return None;
    }
    if name_tokens != address[finest.index()] {
        stats.mismatched_names += 1;
    }

    Some(Entry {
        id,
        name,
        name_tokens,
        finest_type: finest,
        address,
    })
}
