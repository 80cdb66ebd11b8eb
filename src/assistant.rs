//! The travel assistant facade shared by the CLI, the chat loop and the web API

use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDate};
use rand::RngExt;
use serde::Serialize;
use tracing::{info, warn};

use crate::cache::PersistentCache;
use crate::catalog::matcher::{self, MatchField};
use crate::catalog::{GeographicSearch, PlaceCatalog};
use crate::completion::HttpCompletionClient;
use crate::config::{AssistantConfig, DefaultsConfig};
use crate::itinerary::{ItineraryPlanner, ItineraryRequest};
use crate::models::{Category, Coordinates, Itinerary, Municipality, Place, WeatherReport};
use crate::session::VisitList;
use crate::weather::WeatherApiClient;
use crate::wiki::WikiClient;
use crate::{AssistantError, Result};

pub const NO_RECOMMENDATIONS: &str = "Sorry, I don't have recommendations for that category.";
pub const NO_PLACES_FOR_CATEGORY: &str = "No places found for this category.";

const HOUR: Duration = Duration::from_secs(60 * 60);

/// Reply to a free-text question
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Answer {
    /// Random picks from a category the question named
    Suggestions { category: Category, places: Vec<Place> },
    /// Keyword search hits
    Matches { query: String, places: Vec<Place> },
    NoMatch { message: String },
}

impl Answer {
    #[must_use]
    pub fn places(&self) -> &[Place] {
        match self {
            Answer::Suggestions { places, .. } | Answer::Matches { places, .. } => places,
            Answer::NoMatch { .. } => &[],
        }
    }
}

pub struct TravelAssistant {
    catalog: PlaceCatalog,
    weather: WeatherApiClient,
    wiki: Option<WikiClient>,
    planner: Option<ItineraryPlanner>,
    defaults: DefaultsConfig,
}

impl TravelAssistant {
    pub fn new(catalog: PlaceCatalog, weather: WeatherApiClient, defaults: DefaultsConfig) -> Self {
        Self {
            catalog,
            weather,
            wiki: None,
            planner: None,
            defaults,
        }
    }

    #[must_use]
    pub fn with_wiki(mut self, wiki: WikiClient) -> Self {
        self.wiki = Some(wiki);
        self
    }

    #[must_use]
    pub fn with_planner(mut self, planner: ItineraryPlanner) -> Self {
        self.planner = Some(planner);
        self
    }

    /// Wire everything up from configuration. An unusable cache is logged and skipped.
    pub fn from_config(config: &AssistantConfig) -> Result<Self> {
        let catalog = PlaceCatalog::from_config(&config.catalog)?;

        let cache = if config.cache.enabled {
            match PersistentCache::open(&config.cache.location) {
                Ok(cache) => Some(Arc::new(cache)),
                Err(e) => {
                    warn!("Running without cache, failed to open {}: {}", config.cache.location, e);
                    None
                }
            }
        } else {
            None
        };

        let mut weather = WeatherApiClient::new(config.weather.clone())?;
        let mut wiki = WikiClient::new(config.wiki.clone())?;
        if let Some(cache) = cache {
            weather = weather.with_cache(
                cache.clone(),
                HOUR * config.cache.weather_ttl_hours,
            );
            wiki = wiki.with_cache(cache, HOUR * config.cache.wiki_ttl_hours);
        }

        let completion = HttpCompletionClient::new(config.completion.clone())?;
        let planner = ItineraryPlanner::new(Arc::new(completion));

        Ok(Self::new(catalog, weather, config.defaults.clone())
            .with_wiki(wiki)
            .with_planner(planner))
    }

    #[must_use]
    pub fn catalog(&self) -> &PlaceCatalog {
        &self.catalog
    }

    #[must_use]
    pub fn defaults(&self) -> &DefaultsConfig {
        &self.defaults
    }

    /// Answer a question.
    ///
    /// A question that is exactly a category gets suggestions. A landmark named
    /// in the question beats a category keyword found inside it, so "Crash Boat
    /// Beach" finds that beach instead of two random ones.
    pub fn ask<R: RngExt>(&self, question: &str, rng: &mut R) -> Result<Answer> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AssistantError::validation("Question cannot be empty"));
        }

        if let Ok(category) = question.parse::<Category>() {
            return Ok(self.suggestions(category, rng));
        }

        let places: Vec<Place> = self
            .catalog
            .search(question, self.defaults.max_results)?
            .into_iter()
            .cloned()
            .collect();
        let needle = question.to_lowercase();
        let named = places
            .first()
            .is_some_and(|p| matcher::match_field(p, &needle) == Some(MatchField::Name));

        if !named && let Some(category) = Category::detect(question) {
            return Ok(self.suggestions(category, rng));
        }

        if places.is_empty() {
            info!("No recommendations for '{}'", question);
            return Ok(Answer::NoMatch {
                message: NO_RECOMMENDATIONS.to_string(),
            });
        }
        Ok(Answer::Matches {
            query: question.to_string(),
            places,
        })
    }

    fn suggestions<R: RngExt>(&self, category: Category, rng: &mut R) -> Answer {
        let pool = self.catalog.by_category(category);
        if pool.is_empty() {
            return Answer::NoMatch {
                message: NO_RECOMMENDATIONS.to_string(),
            };
        }
        let places = matcher::suggest(&pool, self.defaults.suggestion_count, rng)
            .into_iter()
            .cloned()
            .collect();
        Answer::Suggestions { category, places }
    }

    /// Every landmark in a category
    #[must_use]
    pub fn explore(&self, category: Category) -> Vec<&Place> {
        self.catalog.by_category(category)
    }

    /// Landmarks filtered by category and/or keyword, capped at `limit`
    pub fn places(
        &self,
        category: Option<Category>,
        query: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<&Place>> {
        let limit = limit.unwrap_or(self.defaults.max_results);
        if limit == 0 {
            return Err(AssistantError::validation("Limit must be greater than 0"));
        }

        let query = query.map(str::trim).filter(|q| !q.is_empty());
        let mut places = match query {
            Some(query) => self.catalog.search(query, usize::MAX)?,
            None => self.catalog.landmarks().iter().collect(),
        };
        if let Some(category) = category {
            places.retain(|p| p.category == category);
        }
        places.truncate(limit);
        Ok(places)
    }

    /// Landmarks around a point, closest first
    pub fn nearby(
        &self,
        latitude: f64,
        longitude: f64,
        radius_km: Option<f64>,
        limit: Option<usize>,
    ) -> Result<Vec<(&Place, f64)>> {
        let center = Coordinates::new(latitude, longitude)?;
        let radius_km = radius_km.unwrap_or(self.defaults.search_radius_km);
        if !radius_km.is_finite() || radius_km <= 0.0 {
            return Err(AssistantError::validation(format!(
                "Radius must be a positive number of kilometers, got {radius_km}"
            )));
        }
        Ok(GeographicSearch::places_within_radius(
            self.catalog.landmarks(),
            &center,
            radius_km,
            limit.unwrap_or(self.defaults.max_results),
        ))
    }

    /// Forecast for a catalog place (by its coordinates) or any free-text location
    pub async fn weather(&self, location: &str, date: NaiveDate) -> Result<WeatherReport> {
        match self.catalog.find(location) {
            Some(place) => self.weather.forecast_for_place(place, date).await,
            None => self.weather.forecast(location, date).await,
        }
    }

    pub async fn itinerary(
        &self,
        visits: &VisitList,
        request: ItineraryRequest,
    ) -> Result<Itinerary> {
        ItineraryPlanner::check(visits, &request)?;
        let planner = self
            .planner
            .as_ref()
            .ok_or_else(|| AssistantError::config("Itinerary generation is not configured"))?;
        planner.plan(&self.catalog, visits, request).await
    }

    /// Itinerary with an optional forecast for `location` on the first day.
    ///
    /// The request is validated before the forecast is fetched. A failed
    /// forecast is logged and the plan goes ahead without it.
    pub async fn itinerary_with_forecast(
        &self,
        visits: &VisitList,
        mut request: ItineraryRequest,
        location: Option<&str>,
    ) -> Result<Itinerary> {
        ItineraryPlanner::check(visits, &request)?;

        if let Some(location) = location.map(str::trim).filter(|l| !l.is_empty()) {
            let date = request.start_date.unwrap_or_else(|| Local::now().date_naive());
            match self.weather(location, date).await {
                Ok(report) => request.weather = Some(report),
                Err(e) => {
                    warn!("Planning without weather for '{}': {}", location, e.user_message())
                }
            }
        }

        self.itinerary(visits, request).await
    }

    /// A catalog place with gaps filled from Wikipedia when available
    pub async fn describe(&self, name: &str) -> Result<Place> {
        let place = self
            .catalog
            .find(name)
            .cloned()
            .ok_or_else(|| AssistantError::validation(format!("Unknown place '{}'", name.trim())))?;
        Ok(match &self.wiki {
            Some(wiki) => wiki.enrich(place).await,
            None => place,
        })
    }

    /// One-shot municipality scrape
    pub async fn scrape_municipalities(&self, names: &[String]) -> Result<Vec<Municipality>> {
        let wiki = self
            .wiki
            .as_ref()
            .ok_or_else(|| AssistantError::config("Wikipedia scraping is not configured"))?;
        if names.is_empty() {
            return Err(AssistantError::validation("No municipality names to scrape"));
        }
        Ok(wiki.scrape_municipalities(names).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WeatherConfig;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rstest::rstest;

    fn assistant() -> TravelAssistant {
        TravelAssistant::new(
            PlaceCatalog::builtin().unwrap(),
            WeatherApiClient::new(WeatherConfig::default()).unwrap(),
            DefaultsConfig::default(),
        )
    }

    #[test]
    fn test_category_question_gives_two_suggestions() {
        let assistant = assistant();
        let mut rng = StdRng::seed_from_u64(1);

        for question in ["beach", "Beaches", "what about the beaches near Culebra?"] {
            let answer = assistant.ask(question, &mut rng).unwrap();
            let Answer::Suggestions { category, places } = answer else {
                panic!("expected suggestions for '{question}'");
            };
            assert_eq!(category, Category::Beaches);
            assert_eq!(places.len(), 2);
            assert_ne!(places[0].name, places[1].name);
            assert!(places.iter().all(|p| p.category == Category::Beaches));
        }
    }

    #[test]
    fn test_keyword_question_falls_back_to_search() {
        let assistant = assistant();
        let answer = assistant.ask("Morro", &mut StdRng::seed_from_u64(1)).unwrap();
        match answer {
            Answer::Matches { places, .. } => assert_eq!(places[0].name, "El Morro"),
            other => panic!("unexpected answer {other:?}"),
        }
    }

    #[rstest]
    #[case("Crash Boat Beach")]
    #[case("flamenco beach")]
    #[case("Playa Buyé")]
    #[case("Festival de Santiago Apóstol")]
    fn test_landmark_name_beats_category_keyword(#[case] name: &str) {
        let assistant = assistant();
        for seed in 0..5 {
            let answer = assistant.ask(name, &mut StdRng::seed_from_u64(seed)).unwrap();
            let Answer::Matches { places, .. } = answer else {
                panic!("expected matches for '{name}', got {answer:?}");
            };
            assert!(places[0].name.eq_ignore_ascii_case(name), "got {}", places[0].name);
        }
    }

    #[test]
    fn test_unknown_question_apologizes() {
        let assistant = assistant();
        let answer = assistant.ask("shopping malls", &mut StdRng::seed_from_u64(1)).unwrap();
        assert_eq!(
            answer,
            Answer::NoMatch {
                message: NO_RECOMMENDATIONS.to_string()
            }
        );
        assert!(answer.places().is_empty());
        assert!(assistant.ask("  ", &mut StdRng::seed_from_u64(1)).is_err());
    }

    #[test]
    fn test_places_filters() {
        let assistant = assistant();
        let beaches = assistant.places(Some(Category::Beaches), None, Some(100)).unwrap();
        assert_eq!(beaches.len(), 5);

        let san_juan_history = assistant
            .places(Some(Category::HistoricalSites), Some("san juan"), Some(100))
            .unwrap();
        assert_eq!(san_juan_history.len(), 3);

        assert!(assistant.places(None, None, Some(0)).is_err());
        assert_eq!(assistant.places(None, None, None).unwrap().len(), 5);
    }

    #[test]
    fn test_nearby_validates_input() {
        let assistant = assistant();
        let around_old_san_juan = assistant.nearby(18.4655, -66.1057, Some(3.0), Some(10)).unwrap();
        assert!(!around_old_san_juan.is_empty());
        assert!(around_old_san_juan.iter().all(|(_, d)| *d <= 3.0));

        assert!(assistant.nearby(91.0, 0.0, None, None).is_err());
        assert!(assistant.nearby(18.0, -66.0, Some(-1.0), None).is_err());
    }

    #[tokio::test]
    async fn test_itinerary_requires_planner() {
        let assistant = assistant();
        let visits: VisitList = ["El Morro"].into_iter().collect();
        let err = assistant
            .itinerary(&visits, ItineraryRequest::new(1))
            .await
            .unwrap_err();
        assert!(matches!(err, AssistantError::Config { .. }));
    }

    #[tokio::test]
    async fn test_invalid_itinerary_skips_forecast() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/forecast.json")
            .match_query(mockito::Matcher::Any)
            .expect(0)
            .create_async()
            .await;
        let assistant = TravelAssistant::new(
            PlaceCatalog::builtin().unwrap(),
            WeatherApiClient::new(WeatherConfig {
                api_key: Some("test-weather-key".to_string()),
                base_url: server.url(),
                max_retries: 0,
                ..WeatherConfig::default()
            })
            .unwrap(),
            DefaultsConfig::default(),
        );

        let visits: VisitList = ["El Morro"].into_iter().collect();
        let err = assistant
            .itinerary_with_forecast(&visits, ItineraryRequest::new(99), Some("San Juan"))
            .await
            .unwrap_err();
        assert!(matches!(err, AssistantError::Validation { .. }));

        let err = assistant
            .itinerary_with_forecast(&VisitList::new(), ItineraryRequest::new(2), Some("San Juan"))
            .await
            .unwrap_err();
        assert!(matches!(err, AssistantError::Validation { .. }));

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_describe_without_wiki_returns_catalog_record() {
        let assistant = assistant();
        let place = assistant.describe("el morro").await.unwrap();
        assert_eq!(place.name, "El Morro");
        assert!(assistant.describe("Atlantis").await.is_err());
    }
}
