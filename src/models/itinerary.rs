//! Generated itinerary model

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A trip plan produced by the completion API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Itinerary {
    pub days: u32,
    pub start_date: Option<NaiveDate>,
    /// Place names the plan was generated for, in visit-list order
    pub places: Vec<String>,
    /// Free-form plan text as returned by the model
    pub text: String,
    pub generated_at: DateTime<Utc>,
}

impl fmt::Display for Itinerary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.start_date {
            Some(date) => writeln!(f, "{}-day itinerary starting {}", self.days, date)?,
            None => writeln!(f, "{}-day itinerary", self.days)?,
        }
        writeln!(f, "Places: {}", self.places.join(", "))?;
        writeln!(f)?;
        write!(f, "{}", self.text.trim())
    }
}
