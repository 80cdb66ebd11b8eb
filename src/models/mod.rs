//! Data models for `TravelAssist`
//!
//! - Place: points of interest, municipalities and their categories
//! - Weather: single-day forecast reports
//! - Itinerary: generated trip plans

pub mod itinerary;
pub mod place;
pub mod weather;

pub use itinerary::Itinerary;
pub use place::{Category, Coordinates, Municipality, Place, format_coordinates};
pub use weather::WeatherReport;
