//! Smoke test runner for the geocoder.
//!
//! Loads a small corpus and a list of queries from the embedded
//! `smoke_tests.toml` file, builds a [`Geocoder`] over the corpus and checks
//! that each query puts the expected entry on top (or returns nothing when
//! no entry is expected).

use serde::Deserialize;

use crate::progress::NullProgress;
use crate::{GeoObjectId, Geocoder, GeocoderError, Hierarchy, SearchResult, reader};

/// Embedded smoke test configuration (compiled into the binary).
const SMOKE_TESTS_TOML: &str = include_str!("../smoke_tests.toml");

/// Parsed smoke test configuration.
#[derive(Debug, Deserialize)]
struct SmokeTestConfig {
    /// Corpus in the `<id> <json>` line format.
    hierarchy: String,
    /// Individual test cases.
    tests: Vec<SmokeTestEntry>,
}

/// A single smoke test entry from the TOML file.
#[derive(Debug, Deserialize)]
struct SmokeTestEntry {
    query: String,
    /// Encoded id of the expected top result, as a signed decimal.
    expected: Option<i64>,
}

/// Result of a single smoke test.
#[derive(Debug)]
pub struct SmokeTestResult {
    /// The query that was issued.
    pub query: String,
    /// Expected top result, `None` if no result was expected.
    pub expected: Option<GeoObjectId>,
    /// Actual top result.
    pub actual: Option<SearchResult>,
    /// Total number of results returned.
    pub num_results: usize,
    /// Whether the test passed.
    pub passed: bool,
    /// Reason for failure (if any).
    pub failure_reason: Option<String>,
}

/// Aggregate report from running all smoke tests.
#[derive(Debug)]
pub struct SmokeTestReport {
    /// Individual test results.
    pub results: Vec<SmokeTestResult>,
    /// Number of tests that passed.
    pub passed: usize,
    /// Total number of tests.
    pub total: usize,
}

impl SmokeTestReport {
    /// Returns `true` if all tests passed.
    #[must_use]
    pub const fn all_passed(&self) -> bool {
        self.passed == self.total
    }
}

fn parse_config() -> Result<SmokeTestConfig, GeocoderError> {
    toml::from_str(SMOKE_TESTS_TOML)
        .map_err(|e| GeocoderError::Config(format!("Failed to parse smoke_tests.toml: {e}")))
}

/// Runs all smoke tests against a geocoder built from the embedded corpus.
///
/// # Errors
///
/// Returns an error if the embedded TOML cannot be parsed.
pub fn run_smoke_tests() -> Result<SmokeTestReport, GeocoderError> {
    let config = parse_config()?;

    let (entries, stats) = reader::read_entries(config.hierarchy.as_bytes(), &NullProgress)?;
    let geocoder = Geocoder::new(Hierarchy::with_stats(entries, false, stats));

    let results: Vec<SmokeTestResult> = config
        .tests
        .iter()
        .map(|entry| run_single_test(&geocoder, entry))
        .collect();

    let passed = results.iter().filter(|r| r.passed).count();
    let total = results.len();

    Ok(SmokeTestReport {
        results,
        passed,
        total,
    })
}

fn run_single_test(geocoder: &Geocoder, entry: &SmokeTestEntry) -> SmokeTestResult {
    #[allow(clippy::cast_sign_loss)]
    let expected = entry
        .expected
        .map(|encoded| GeoObjectId::from_encoded(encoded as u64));

    let results = geocoder.process_query(&entry.query);
    let actual = results.first().copied();

    let failure_reason = match (expected, actual) {
        (Some(want), Some(got)) if want == got.id => None,
        (Some(want), Some(got)) => Some(format!("expected {want} on top, got {}", got.id)),
        (Some(want), None) => Some(format!("expected {want}, got no results")),
        (None, Some(_)) => Some(format!("expected no results, got {}", results.len())),
        (None, None) => None,
    };

    SmokeTestResult {
        query: entry.query.clone(),
        expected,
        actual,
        num_results: results.len(),
        passed: failure_reason.is_none(),
        failure_reason,
    }
}
