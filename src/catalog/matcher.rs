//! Category and keyword matching over place records
//!
//! Matching is case-insensitive substring search. Results are ordered by the
//! best field that matched (name, category, municipality, summary), then by
//! name, then by catalog position, and capped by the caller's limit.

use std::cmp::Ordering;

use rand::RngExt;
use rand::seq::IndexedRandom;

use crate::models::{Category, Place};
use crate::{AssistantError, Result};

/// Which field of a place matched a query, best first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchField {
    Name,
    Category,
    Municipality,
    Summary,
}

fn contains(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

/// Best matching field for an already lowercased needle
#[must_use]
pub fn match_field(place: &Place, needle: &str) -> Option<MatchField> {
    if contains(&place.name, needle) {
        Some(MatchField::Name)
    } else if contains(place.category.label(), needle) {
        Some(MatchField::Category)
    } else if place.municipality.as_deref().is_some_and(|m| contains(m, needle)) {
        Some(MatchField::Municipality)
    } else if place.summary.as_deref().is_some_and(|s| contains(s, needle)) {
        Some(MatchField::Summary)
    } else {
        None
    }
}

/// Every place of `category`, in input order
#[must_use]
pub fn by_category(places: &[Place], category: Category) -> Vec<&Place> {
    places.iter().filter(|p| p.category == category).collect()
}

/// Keyword search. An empty query is rejected rather than matching everything.
pub fn search<'a>(places: &'a [Place], query: &str, limit: usize) -> Result<Vec<&'a Place>> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Err(AssistantError::validation("Search query cannot be empty"));
    }

    let mut hits: Vec<(MatchField, String, &Place)> = places
        .iter()
        .filter_map(|place| {
            match_field(place, &needle).map(|field| (field, place.name.to_lowercase(), place))
        })
        .collect();

    // Stable sort keeps catalog order for full ties
    hits.sort_by(|a, b| match a.0.cmp(&b.0) {
        Ordering::Equal => a.1.cmp(&b.1),
        other => other,
    });

    Ok(hits
        .into_iter()
        .take(limit)
        .map(|(_, _, place)| place)
        .collect())
}

/// Random sample of `min(count, len)` distinct places
pub fn suggest<'a, R: RngExt>(places: &[&'a Place], count: usize, rng: &mut R) -> Vec<&'a Place> {
    places.sample(rng, count).copied().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn places() -> Vec<Place> {
        vec![
            Place::new("Playa Buyé", Category::Beaches).with_municipality("Cabo Rojo"),
            Place::new("Flamenco Beach", Category::Beaches).with_municipality("Culebra"),
            Place::new("El Morro", Category::HistoricalSites)
                .with_municipality("San Juan")
                .with_summary("A citadel overlooking the beach and bay."),
            Place::new("Crash Boat Beach", Category::Beaches).with_municipality("Aguadilla"),
            Place::new("Cabo Rojo Lighthouse", Category::HistoricalSites),
        ]
    }

    #[test]
    fn test_by_category_exact() {
        let places = places();
        let beaches = by_category(&places, Category::Beaches);
        let names: Vec<_> = beaches.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Playa Buyé", "Flamenco Beach", "Crash Boat Beach"]);
        assert!(by_category(&places, Category::FestivalsAndEvents).is_empty());
    }

    #[test]
    fn test_search_ranks_name_before_category_and_summary() {
        let places = places();
        let results = search(&places, "BEACH", 10).unwrap();
        let names: Vec<_> = results.iter().map(|p| p.name.as_str()).collect();
        // Name hits sorted by name, then category-only hit, then summary-only hit
        assert_eq!(
            names,
            vec!["Crash Boat Beach", "Flamenco Beach", "Playa Buyé", "El Morro"]
        );
    }

    #[test]
    fn test_search_municipality_field() {
        let places = places();
        let results = search(&places, "cabo rojo", 10).unwrap();
        let names: Vec<_> = results.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Cabo Rojo Lighthouse", "Playa Buyé"]);
    }

    #[test]
    fn test_search_cap_and_empty() {
        let places = places();
        assert_eq!(search(&places, "beach", 2).unwrap().len(), 2);
        assert!(search(&places, "volcano", 10).unwrap().is_empty());
        assert!(search(&places, "   ", 10).is_err());
    }

    #[test]
    fn test_search_uses_category_label_not_slug() {
        let places = vec![
            Place::new("Lechonera Los Pinos", Category::FoodAndCulture),
            Place::new("Flamenco Beach", Category::Beaches),
        ];
        assert!(search(&places, "_", 10).unwrap().is_empty());
        assert!(search(&places, "food_and", 10).unwrap().is_empty());
        let names: Vec<_> = search(&places, "food & culture", 10)
            .unwrap()
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(names, vec!["Lechonera Los Pinos"]);
    }

    #[test]
    fn test_search_is_deterministic() {
        let places = places();
        let first = search(&places, "a", 10).unwrap();
        let second = search(&places, "a", 10).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_suggest_samples_distinct_places() {
        let places = places();
        let beaches = by_category(&places, Category::Beaches);
        let mut rng = StdRng::seed_from_u64(7);

        let picks = suggest(&beaches, 2, &mut rng);
        assert_eq!(picks.len(), 2);
        assert_ne!(picks[0].name, picks[1].name);
        assert!(picks.iter().all(|p| p.category == Category::Beaches));

        let all = suggest(&beaches, 10, &mut rng);
        assert_eq!(all.len(), 3);
        assert!(suggest(&[], 2, &mut rng).is_empty());
    }

    #[test]
    fn test_suggest_is_reproducible_with_seed() {
        let places = places();
        let refs: Vec<&Place> = places.iter().collect();
        let a = suggest(&refs, 3, &mut StdRng::seed_from_u64(42));
        let b = suggest(&refs, 3, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }
}
