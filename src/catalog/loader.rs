//! Catalog file formats
//!
//! JSON: either a bare array of records or
//! `{ "landmarks": [...], "municipalities": [...] }`.
//!
//! Text landmarks are sectioned by category, one place per line with an
//! optional municipality after a `|`:
//!
//! ```text
//! # beaches of the west coast
//! [beaches]
//! Playa Buyé | Cabo Rojo
//! Crash Boat Beach
//! ```
//!
//! Text municipalities are one name per line.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::models::{Category, Municipality, Place};
use crate::{AssistantError, Result};

/// Both record sets as stored in a catalog JSON file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogFile {
    #[serde(default)]
    pub landmarks: Vec<Place>,
    #[serde(default)]
    pub municipalities: Vec<Municipality>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LandmarkJson {
    Records(Vec<Place>),
    Catalog(CatalogFile),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MunicipalityJson {
    Records(Vec<Municipality>),
    Catalog(CatalogFile),
}

fn read(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(AssistantError::validation(format!(
            "Catalog file not found: {}",
            path.display()
        )));
    }
    Ok(fs::read_to_string(path)?)
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

/// Parse a full catalog JSON document
pub fn parse_json(content: &str) -> Result<CatalogFile> {
    match serde_json::from_str::<LandmarkJson>(content) {
        Ok(LandmarkJson::Records(landmarks)) => Ok(CatalogFile {
            landmarks,
            municipalities: Vec::new(),
        }),
        Ok(LandmarkJson::Catalog(file)) => Ok(file),
        // Untagged errors are vague, re-parse strictly for a useful message
        Err(_) => Ok(serde_json::from_str::<CatalogFile>(content)?),
    }
}

/// Load landmarks from a `.json` or sectioned text file
pub fn load_landmarks(path: &Path) -> Result<Vec<Place>> {
    let content = read(path)?;
    let landmarks = if is_json(path) {
        parse_json(&content)?.landmarks
    } else {
        parse_text(&content)?
    };
    info!("Loaded {} landmarks from {}", landmarks.len(), path.display());
    Ok(landmarks)
}

/// Load municipalities from JSON records or a plain list of names
pub fn load_municipalities(path: &Path) -> Result<Vec<Municipality>> {
    let content = read(path)?;
    let municipalities = if is_json(path) {
        match serde_json::from_str::<MunicipalityJson>(&content) {
            Ok(MunicipalityJson::Records(records)) => records,
            Ok(MunicipalityJson::Catalog(file)) => file.municipalities,
            Err(_) => serde_json::from_str::<Vec<Municipality>>(&content)?,
        }
    } else {
        parse_names(&content).into_iter().map(Municipality::new).collect()
    };
    info!(
        "Loaded {} municipalities from {}",
        municipalities.len(),
        path.display()
    );
    Ok(municipalities)
}

/// Read a list of names, one per line
pub fn load_municipality_names(path: &Path) -> Result<Vec<String>> {
    Ok(parse_names(&read(path)?))
}

fn strip_comment(line: &str) -> &str {
    line.split('#').next().unwrap_or_default().trim()
}

/// Parse one-name-per-line text, skipping blanks, comments and duplicates
#[must_use]
pub fn parse_names(content: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for name in content.lines().map(strip_comment).filter(|l| !l.is_empty()) {
        if names.iter().any(|n| n.eq_ignore_ascii_case(name)) {
            warn!("Skipping duplicate name '{}'", name);
            continue;
        }
        names.push(name.to_string());
    }
    names
}

/// Parse the sectioned landmark text format
pub fn parse_text(content: &str) -> Result<Vec<Place>> {
    let mut current: Option<Category> = None;
    let mut places = Vec::new();

    for (index, raw) in content.lines().enumerate() {
        let line_no = index + 1;
        let line = strip_comment(raw);
        if line.is_empty() {
            continue;
        }

        if let Some(header) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            let category = header.parse::<Category>().map_err(|_| {
                AssistantError::validation(format!(
                    "Line {line_no}: unknown category section '[{header}]'"
                ))
            })?;
            current = Some(category);
            continue;
        }

        let category = current.ok_or_else(|| {
            AssistantError::validation(format!(
                "Line {line_no}: place '{line}' appears before any [category] section"
            ))
        })?;

        let mut parts = line.splitn(2, '|').map(str::trim);
        let name = parts.next().unwrap_or_default();
        if name.is_empty() {
            return Err(AssistantError::validation(format!(
                "Line {line_no}: missing place name"
            )));
        }

        let mut place = Place::new(name, category);
        if let Some(municipality) = parts.next().filter(|m| !m.is_empty()) {
            place = place.with_municipality(municipality);
        }
        places.push(place);
    }

    Ok(places)
}

/// One-shot export of records (typically scrape results) as pretty JSON
pub fn export_json<T: Serialize>(path: &Path, records: &[T]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(records)?;
    fs::write(path, json)?;
    info!("Exported {} records to {}", records.len(), path.display());
    Ok(())
}
