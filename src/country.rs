use std::fs;
use std::io::ErrorKind;

use serde::Deserialize;
use tracing::{info, warn};

use crate::domain::CtvError;

/// One country of the dataset. Records are immutable once loaded, the
/// viewer only ever reorders and slices them.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Country {
    pub id: String,
    /// Short identifier, display only. Not guaranteed unique.
    pub code: String,
    pub name: String,
    /// Canonical display and sort name.
    pub name_un: String,
    pub continent: String,
    pub has_states: bool,
}

// Dataset shipped with the binary, used when no file is given on the
// command line. Same shape as a user supplied file.
pub const BUNDLED_COUNTRIES: &str = include_str!("../data/countries.json");

/// Parses a dataset: a top level object with a `countries` array.
///
/// Array elements are deserialized independently. A malformed element is
/// skipped with a warning instead of aborting the load, so one bad record
/// can never take the viewer down.
pub fn parse_countries(raw: &str) -> Result<Vec<Country>, CtvError> {
    let root: serde_json::Value = serde_json::from_str(raw)?;
    let entries = root
        .get("countries")
        .and_then(|v| v.as_array())
        .ok_or_else(|| {
            CtvError::LoadingFailed("expected a top level \"countries\" array".to_string())
        })?;

    let mut countries = Vec::with_capacity(entries.len());
    for (idx, entry) in entries.iter().enumerate() {
        match Country::deserialize(entry) {
            Ok(country) => countries.push(country),
            Err(e) => warn!("Skipping malformed country record {idx}: {e}"),
        }
    }
    info!("Loaded {} country records", countries.len());
    Ok(countries)
}

/// Loads the dataset from `path`, falling back to the bundled data when
/// no path is given. User paths are shell expanded first.
pub fn load_countries(path: Option<&str>) -> Result<Vec<Country>, CtvError> {
    let Some(path) = path else {
        return parse_countries(BUNDLED_COUNTRIES);
    };

    let expanded = shellexpand::full(path).map_err(|e| CtvError::LoadingFailed(e.to_string()))?;
    let raw = fs::read_to_string(expanded.as_ref()).map_err(|e| match e.kind() {
        ErrorKind::NotFound => CtvError::FileNotFound,
        ErrorKind::PermissionDenied => CtvError::PermissionDenied,
        _ => CtvError::IoError(e),
    })?;
    parse_countries(&raw)
}
