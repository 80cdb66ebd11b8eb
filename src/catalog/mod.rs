//! Place catalog
//!
//! Read-only landmark and municipality record sets, either bundled with the
//! binary or loaded from JSON/text files. The two sets are independent: a
//! landmark's municipality is a plain name that may not resolve.

use tracing::{debug, info};

use crate::config::CatalogConfig;
use crate::models::{Category, Municipality, Place};
use crate::{AssistantError, Result};

pub mod geo;
pub mod loader;
pub mod matcher;

pub use geo::GeographicSearch;
pub use loader::{CatalogFile, export_json};

const BUILTIN_DATASET: &str = include_str!("../../data/puerto_rico.json");

/// In-memory landmark and municipality tables
#[derive(Debug, Clone, Default)]
pub struct PlaceCatalog {
    landmarks: Vec<Place>,
    municipalities: Vec<Municipality>,
}

impl PlaceCatalog {
    #[must_use]
    pub fn new(landmarks: Vec<Place>, municipalities: Vec<Municipality>) -> Self {
        Self {
            landmarks,
            municipalities,
        }
    }

    /// Bundled Puerto Rico dataset
    pub fn builtin() -> Result<Self> {
        let file = loader::parse_json(BUILTIN_DATASET)
            .map_err(|e| AssistantError::general(format!("Bundled dataset is invalid: {e}")))?;
        Ok(Self::new(file.landmarks, file.municipalities))
    }

    /// Build the catalog from configured files, falling back to the bundled data
    pub fn from_config(config: &CatalogConfig) -> Result<Self> {
        let builtin = Self::builtin()?;

        let landmarks = match &config.path {
            Some(path) => loader::load_landmarks(path)?,
            None => builtin.landmarks,
        };
        let municipalities = match &config.municipalities_path {
            Some(path) => loader::load_municipalities(path)?,
            None => builtin.municipalities,
        };

        info!(
            "Catalog ready: {} landmarks, {} municipalities",
            landmarks.len(),
            municipalities.len()
        );
        Ok(Self::new(landmarks, municipalities))
    }

    #[must_use]
    pub fn landmarks(&self) -> &[Place] {
        &self.landmarks
    }

    #[must_use]
    pub fn municipalities(&self) -> &[Municipality] {
        &self.municipalities
    }

    /// Categories with at least one landmark, in declaration order
    #[must_use]
    pub fn categories(&self) -> Vec<Category> {
        Category::ALL
            .into_iter()
            .filter(|c| self.landmarks.iter().any(|p| p.category == *c))
            .collect()
    }

    /// Case-insensitive exact lookup by landmark name
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&Place> {
        let lower = name.trim().to_lowercase();
        self.landmarks.iter().find(|p| p.name.to_lowercase() == lower)
    }

    #[must_use]
    pub fn find_municipality(&self, name: &str) -> Option<&Municipality> {
        let lower = name.trim().to_lowercase();
        self.municipalities
            .iter()
            .find(|m| m.name.to_lowercase() == lower)
    }

    /// Resolve a landmark's municipality, `None` when unset or dangling
    #[must_use]
    pub fn municipality_of(&self, place: &Place) -> Option<&Municipality> {
        let name = place.municipality.as_deref()?;
        let found = self.find_municipality(name);
        if found.is_none() {
            debug!("Municipality '{}' of '{}' is not in the catalog", name, place.name);
        }
        found
    }

    /// All landmarks of one category, in catalog order
    #[must_use]
    pub fn by_category(&self, category: Category) -> Vec<&Place> {
        matcher::by_category(&self.landmarks, category)
    }

    /// Keyword search over landmarks
    pub fn search(&self, query: &str, limit: usize) -> Result<Vec<&Place>> {
        matcher::search(&self.landmarks, query, limit)
    }
}
