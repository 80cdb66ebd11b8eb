//! Itinerary generation from a visit list

use std::fmt::Write as _;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::{debug, info};

use crate::catalog::PlaceCatalog;
use crate::completion::{CompletionClient, CompletionRequest};
use crate::models::{Itinerary, WeatherReport};
use crate::session::VisitList;
use crate::{AssistantError, Result};

pub const MAX_DAYS: u32 = 14;

const SYSTEM_PROMPT: &str = "You are a local travel guide for Puerto Rico. \
Write a practical day-by-day itinerary that only uses the places provided. \
Group nearby places on the same day and keep each day realistic. \
If a weather forecast is given, move outdoor activities away from rain.";

#[derive(Debug, Clone, PartialEq)]
pub struct ItineraryRequest {
    pub days: u32,
    pub start_date: Option<NaiveDate>,
    /// Forecast for the first day, if one was fetched
    pub weather: Option<WeatherReport>,
}

impl ItineraryRequest {
    #[must_use]
    pub fn new(days: u32) -> Self {
        Self {
            days,
            start_date: None,
            weather: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_DAYS).contains(&self.days) {
            return Err(AssistantError::validation(format!(
                "Itinerary length must be between 1 and {MAX_DAYS} days, got {}",
                self.days
            )));
        }
        Ok(())
    }
}

pub struct ItineraryPlanner {
    client: Arc<dyn CompletionClient>,
}

impl ItineraryPlanner {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self { client }
    }

    /// Prompt listing every stop with whatever the catalog knows about it.
    /// Names the catalog does not know are passed through as-is.
    #[must_use]
    pub fn build_prompt(
        catalog: &PlaceCatalog,
        visits: &VisitList,
        request: &ItineraryRequest,
    ) -> CompletionRequest {
        let mut user = String::new();
        let _ = writeln!(user, "Plan a {}-day trip in Puerto Rico.", request.days);
        if let Some(date) = request.start_date {
            let _ = writeln!(user, "The trip starts on {}.", date.format("%A, %B %-d, %Y"));
        }

        let _ = writeln!(user, "\nPlaces to visit:");
        for name in visits.names() {
            match catalog.find(name) {
                Some(place) => {
                    let _ = write!(user, "- {} ({})", place.name, place.category);
                    if let Some(municipality) = &place.municipality {
                        let _ = write!(user, ", in {municipality}");
                    }
                    if let Some(summary) = &place.summary {
                        let _ = write!(user, ": {summary}");
                    }
                    user.push('\n');
                }
                None => {
                    debug!("'{}' is not in the catalog, passing the name through", name);
                    let _ = writeln!(user, "- {name}");
                }
            }
        }

        if let Some(weather) = &request.weather {
            let _ = writeln!(
                user,
                "\nForecast for {} on {}: {}, {}, humidity {:.0}%, wind up to {}.",
                weather.location,
                weather.date,
                weather.condition,
                weather.format_temperature(),
                weather.avg_humidity,
                weather.format_wind()
            );
            if weather.is_rainy() {
                user.push_str("Rain is expected, so favour indoor stops on that day.\n");
            }
        }

        CompletionRequest::new(SYSTEM_PROMPT, user.trim_end())
    }

    /// Reject plans that would never reach the model
    pub fn check(visits: &VisitList, request: &ItineraryRequest) -> Result<()> {
        if visits.is_empty() {
            return Err(AssistantError::validation(
                "Add at least one place to your visit list before planning",
            ));
        }
        request.validate()
    }

    pub async fn plan(
        &self,
        catalog: &PlaceCatalog,
        visits: &VisitList,
        request: ItineraryRequest,
    ) -> Result<Itinerary> {
        Self::check(visits, &request)?;

        info!(
            "Planning a {}-day itinerary for {} places",
            request.days,
            visits.len()
        );
        let prompt = Self::build_prompt(catalog, visits, &request);
        let text = self.client.complete(&prompt).await?;

        Ok(Itinerary {
            days: request.days,
            start_date: request.start_date,
            places: visits.names().to_vec(),
            text,
            generated_at: Utc::now(),
        })
    }
}
