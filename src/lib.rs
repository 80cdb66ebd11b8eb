//! `TravelAssist` - Puerto Rico travel information assistant
//!
//! This library provides the place catalog and matcher, the session visit
//! list, and clients for weather forecasts, Wikipedia summaries and
//! LLM-generated itineraries.

pub mod api;
pub mod assistant;
pub mod cache;
pub mod catalog;
pub mod chat;
pub mod completion;
pub mod config;
pub mod error;
pub mod http;
pub mod itinerary;
pub mod logging;
pub mod models;
pub mod session;
pub mod weather;
pub mod web;
pub mod wiki;

// Re-export core types for public API
pub use assistant::{Answer, TravelAssistant};
pub use cache::PersistentCache;
pub use catalog::{GeographicSearch, PlaceCatalog};
pub use completion::{CompletionClient, CompletionRequest, HttpCompletionClient};
pub use config::AssistantConfig;
pub use error::{AssistantError, ErrorCode};
pub use itinerary::{ItineraryPlanner, ItineraryRequest};
pub use models::{Category, Coordinates, Itinerary, Municipality, Place, WeatherReport};
pub use session::VisitList;
pub use weather::WeatherApiClient;
pub use wiki::{WikiClient, WikiSummary};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, AssistantError>;
