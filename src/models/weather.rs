//! Weather report model and display methods

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Single-day forecast for one location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    /// Location as requested by the user
    pub location: String,
    pub date: NaiveDate,
    /// Provider condition text, e.g. "Patchy rain possible"
    pub condition: String,
    /// Maximum temperature in Celsius
    pub max_temp_c: f32,
    /// Minimum temperature in Celsius
    pub min_temp_c: f32,
    /// Average relative humidity in percent
    pub avg_humidity: f32,
    /// Maximum wind speed in km/h
    pub max_wind_kph: f32,
}

impl WeatherReport {
    /// Format temperature range with unit
    #[must_use]
    pub fn format_temperature(&self) -> String {
        format!("{:.1}°C - {:.1}°C", self.min_temp_c, self.max_temp_c)
    }

    #[must_use]
    pub fn format_wind(&self) -> String {
        format!("{:.1} km/h", self.max_wind_kph)
    }

    /// Rough outdoor-friendliness check used in itinerary prompts
    #[must_use]
    pub fn is_rainy(&self) -> bool {
        let condition = self.condition.to_lowercase();
        ["rain", "shower", "drizzle", "thunder", "storm"]
            .iter()
            .any(|word| condition.contains(word))
    }
}

impl fmt::Display for WeatherReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Weather for {} on {}", self.location, self.date)?;
        writeln!(f, "   Condition:   {}", self.condition)?;
        writeln!(f, "   Temperature: {}", self.format_temperature())?;
        writeln!(f, "   Humidity:    {:.0}%", self.avg_humidity)?;
        write!(f, "   Wind:        {}", self.format_wind())
    }
}
