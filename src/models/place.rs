//! Place records and their categories
//!
//! Source files are hand-written or scraped, so deserialization is lenient:
//! coordinates may be numbers, numeric strings or a sentinel such as
//! `"unavailable"`, and a sentinel summary reads as no summary at all.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::{AssistantError, Result};

/// Rendered in place of missing coordinates
pub const UNAVAILABLE: &str = "unavailable";
/// Rendered in place of a missing summary
pub const SUMMARY_UNAVAILABLE: &str = "Summary unavailable";

const SENTINELS: [&str; 7] = [
    "",
    "unavailable",
    "n/a",
    "na",
    "none",
    "unknown",
    "summary unavailable",
];

fn is_sentinel(text: &str) -> bool {
    let lower = text.trim().to_lowercase();
    SENTINELS.contains(&lower.as_str())
}

/// Interest category of a landmark
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Beaches,
    Nature,
    HistoricalSites,
    FoodAndCulture,
    FestivalsAndEvents,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Beaches,
        Category::Nature,
        Category::HistoricalSites,
        Category::FoodAndCulture,
        Category::FestivalsAndEvents,
    ];

    /// Human readable label
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Category::Beaches => "Beaches",
            Category::Nature => "Nature",
            Category::HistoricalSites => "Historical Sites",
            Category::FoodAndCulture => "Food & Culture",
            Category::FestivalsAndEvents => "Festivals & Events",
        }
    }

    /// Stable identifier used in files and URLs
    #[must_use]
    pub fn slug(self) -> &'static str {
        match self {
            Category::Beaches => "beaches",
            Category::Nature => "nature",
            Category::HistoricalSites => "historical_sites",
            Category::FoodAndCulture => "food_and_culture",
            Category::FestivalsAndEvents => "festivals_and_events",
        }
    }

    fn from_keyword(word: &str) -> Option<Self> {
        match word {
            "beach" | "beaches" | "playa" | "playas" => Some(Category::Beaches),
            "nature" | "outdoors" | "hiking" => Some(Category::Nature),
            "history" | "historic" | "historical" | "historical sites" | "historical site" => {
                Some(Category::HistoricalSites)
            }
            "culture" | "food" | "cuisine" | "food and culture" => Some(Category::FoodAndCulture),
            "festival" | "festivals" | "event" | "events" | "festivals and events" => {
                Some(Category::FestivalsAndEvents)
            }
            _ => None,
        }
    }

    /// Find the first category keyword mentioned in free text
    #[must_use]
    pub fn detect(text: &str) -> Option<Self> {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|word| !word.is_empty())
            .find_map(|word| Self::from_keyword(&word.to_lowercase()))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = AssistantError;

    /// Parse a label, slug or alias, ignoring case, `&`/`and` and separators
    fn from_str(s: &str) -> Result<Self> {
        let normalized = s
            .trim()
            .to_lowercase()
            .replace('&', " and ")
            .replace(['_', '-'], " ")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");

        Self::from_keyword(&normalized)
            .ok_or_else(|| AssistantError::validation(format!("Unknown category '{}'", s.trim())))
    }
}

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.slug())
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Decimal degree coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    /// Create coordinates after range validation
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        let coordinates = Self { latitude, longitude };
        coordinates.validate()?;
        Ok(coordinates)
    }

    pub fn validate(&self) -> Result<()> {
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(AssistantError::validation(format!(
                "Latitude must be between -90 and 90, got: {}",
                self.latitude
            )));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(AssistantError::validation(format!(
                "Longitude must be between -180 and 180, got: {}",
                self.longitude
            )));
        }
        Ok(())
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// Format optional coordinates, falling back to the sentinel
#[must_use]
pub fn format_coordinates(coordinates: Option<&Coordinates>) -> String {
    coordinates.map_or_else(|| UNAVAILABLE.to_string(), ToString::to_string)
}

/// A point of interest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "FlatPlace", into = "FlatPlace")]
pub struct Place {
    pub name: String,
    pub category: Category,
    pub municipality: Option<String>,
    pub coordinates: Option<Coordinates>,
    pub summary: Option<String>,
}

impl Place {
    #[must_use]
    pub fn new(name: impl Into<String>, category: Category) -> Self {
        Self {
            name: name.into(),
            category,
            municipality: None,
            coordinates: None,
            summary: None,
        }
    }

    #[must_use]
    pub fn with_municipality(mut self, municipality: impl Into<String>) -> Self {
        self.municipality = Some(municipality.into());
        self
    }

    #[must_use]
    pub fn with_coordinates(mut self, coordinates: Coordinates) -> Self {
        self.coordinates = Some(coordinates);
        self
    }

    #[must_use]
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    #[must_use]
    pub fn summary_or_sentinel(&self) -> &str {
        self.summary.as_deref().unwrap_or(SUMMARY_UNAVAILABLE)
    }
}

/// A municipality record, kept apart from landmarks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "FlatMunicipality", into = "FlatMunicipality")]
pub struct Municipality {
    pub name: String,
    pub coordinates: Option<Coordinates>,
    pub summary: Option<String>,
}

impl Municipality {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            coordinates: None,
            summary: None,
        }
    }

    #[must_use]
    pub fn summary_or_sentinel(&self) -> &str {
        self.summary.as_deref().unwrap_or(SUMMARY_UNAVAILABLE)
    }
}

// On-disk layout: flat latitude/longitude fields that may hold sentinels.

#[derive(Serialize, Deserialize)]
struct FlatPlace {
    name: String,
    category: Category,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    municipality: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    latitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    longitude: Option<f64>,
    #[serde(default, alias = "description", deserialize_with = "lenient_text")]
    summary: Option<String>,
}

#[derive(Serialize, Deserialize)]
struct FlatMunicipality {
    name: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    latitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    longitude: Option<f64>,
    #[serde(default, alias = "description", deserialize_with = "lenient_text")]
    summary: Option<String>,
}

fn join_coordinates(latitude: Option<f64>, longitude: Option<f64>) -> Result<Option<Coordinates>> {
    match (latitude, longitude) {
        (Some(lat), Some(lon)) => Coordinates::new(lat, lon).map(Some),
        _ => Ok(None),
    }
}

fn non_empty_name(name: String) -> Result<String> {
    let name = name.trim().to_string();
    if name.is_empty() {
        return Err(AssistantError::validation("Place name cannot be empty"));
    }
    Ok(name)
}

impl TryFrom<FlatPlace> for Place {
    type Error = AssistantError;

    fn try_from(flat: FlatPlace) -> Result<Self> {
        Ok(Self {
            name: non_empty_name(flat.name)?,
            category: flat.category,
            municipality: flat.municipality.filter(|m| !is_sentinel(m)),
            coordinates: join_coordinates(flat.latitude, flat.longitude)?,
            summary: flat.summary,
        })
    }
}

impl From<Place> for FlatPlace {
    fn from(place: Place) -> Self {
        Self {
            name: place.name,
            category: place.category,
            municipality: place.municipality,
            latitude: place.coordinates.map(|c| c.latitude),
            longitude: place.coordinates.map(|c| c.longitude),
            summary: place.summary,
        }
    }
}

impl TryFrom<FlatMunicipality> for Municipality {
    type Error = AssistantError;

    fn try_from(flat: FlatMunicipality) -> Result<Self> {
        Ok(Self {
            name: non_empty_name(flat.name)?,
            coordinates: join_coordinates(flat.latitude, flat.longitude)?,
            summary: flat.summary,
        })
    }
}

impl From<Municipality> for FlatMunicipality {
    fn from(municipality: Municipality) -> Self {
        Self {
            name: municipality.name,
            latitude: municipality.coordinates.map(|c| c.latitude),
            longitude: municipality.coordinates.map(|c| c.longitude),
            summary: municipality.summary,
        }
    }
}

fn lenient_f64<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<f64>, D::Error> {
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => Ok(n.as_f64()),
        Some(Value::String(s)) if is_sentinel(&s) => Ok(None),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid coordinate '{s}'"))),
        Some(other) => Err(serde::de::Error::custom(format!("invalid coordinate {other}"))),
    }
}

fn lenient_text<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<String>, D::Error> {
    let text = Option::<String>::deserialize(deserializer)?;
    Ok(text
        .map(|t| t.trim().to_string())
        .filter(|t| !is_sentinel(t)))
}
