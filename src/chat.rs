//! Interactive chat loop
//!
//! One [`ChatSession`] owns one visit list for as long as the loop runs.

use std::fmt::Write as _;

use chrono::{Local, NaiveDate};
use rand::RngExt;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

use crate::assistant::{Answer, NO_PLACES_FOR_CATEGORY, TravelAssistant};
use crate::itinerary::ItineraryRequest;
use crate::models::Category;
use crate::session::VisitList;
use crate::{AssistantError, Result};

pub const HELP: &str = "\
Commands:
  <question>                      ask about beaches, nature, history, culture, festivals...
  explore <category>              list every place in a category
  add <place>                     add a place to your visit list
  remove <place>                  remove a place from your visit list
  list                            show your visit list
  clear                           empty your visit list
  weather <location> [YYYY-MM-DD] forecast for a place or town
  plan [days]                     generate an itinerary for your visit list
  help                            show this help
  quit                            leave the chat";

#[derive(Debug, Clone, PartialEq)]
pub enum ChatCommand {
    Ask(String),
    Explore(Category),
    Add(String),
    Remove(String),
    List,
    Clear,
    Weather {
        location: String,
        date: Option<NaiveDate>,
    },
    Plan {
        days: Option<u32>,
    },
    Help,
    Quit,
}

fn required(arg: &str, usage: &str) -> Result<String> {
    if arg.is_empty() {
        return Err(AssistantError::validation(format!("Usage: {usage}")));
    }
    Ok(arg.to_string())
}

impl ChatCommand {
    /// Parse one input line. Blank lines yield `None`.
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let command = match word.to_lowercase().as_str() {
            "add" => Self::Add(required(rest, "add <place>")?),
            "remove" => Self::Remove(required(rest, "remove <place>")?),
            "explore" => Self::Explore(required(rest, "explore <category>")?.parse()?),
            "list" if rest.is_empty() => Self::List,
            "clear" if rest.is_empty() => Self::Clear,
            "help" if rest.is_empty() => Self::Help,
            "quit" | "exit" if rest.is_empty() => Self::Quit,
            "weather" => {
                let rest = required(rest, "weather <location> [YYYY-MM-DD]")?;
                let dated = rest.rsplit_once(char::is_whitespace).and_then(|(location, last)| {
                    NaiveDate::parse_from_str(last, "%Y-%m-%d")
                        .ok()
                        .map(|date| (location.trim().to_string(), date))
                });
                match dated {
                    Some((location, date)) => Self::Weather {
                        location,
                        date: Some(date),
                    },
                    None => Self::Weather {
                        location: rest,
                        date: None,
                    },
                }
            }
            "plan" => {
                let days = if rest.is_empty() {
                    None
                } else {
                    Some(rest.parse::<u32>().map_err(|_| {
                        AssistantError::validation(format!("'{rest}' is not a number of days"))
                    })?)
                };
                Self::Plan { days }
            }
            _ => Self::Ask(line.to_string()),
        };
        Ok(Some(command))
    }
}

pub struct ChatSession<'a, R> {
    assistant: &'a TravelAssistant,
    visits: VisitList,
    rng: R,
}

impl<'a, R: RngExt> ChatSession<'a, R> {
    pub fn new(assistant: &'a TravelAssistant, rng: R) -> Self {
        Self {
            assistant,
            visits: VisitList::new(),
            rng,
        }
    }

    #[must_use]
    pub fn visits(&self) -> &VisitList {
        &self.visits
    }

    /// Execute one command and render the reply
    pub async fn handle(&mut self, command: ChatCommand) -> Result<String> {
        debug!("Handling {:?}", command);
        let mut out = String::new();

        match command {
            ChatCommand::Ask(question) => {
                match self.assistant.ask(&question, &mut self.rng)? {
                    Answer::Suggestions { category, places } => {
                        let _ = writeln!(out, "Here are some recommended places for {category}:");
                        for place in &places {
                            let _ = writeln!(out, "  - {}", describe(place));
                        }
                        out.push_str("Type `add <place>` to add one to your visit list.");
                    }
                    Answer::Matches { places, .. } => {
                        out.push_str("Here is what I found:\n");
                        for place in &places {
                            let _ = writeln!(out, "  - {} [{}]", describe(place), place.category);
                        }
                        out.push_str("Type `add <place>` to add one to your visit list.");
                    }
                    Answer::NoMatch { message } => out.push_str(&message),
                }
            }
            ChatCommand::Explore(category) => {
                let places = self.assistant.explore(category);
                if places.is_empty() {
                    out.push_str(NO_PLACES_FOR_CATEGORY);
                } else {
                    let _ = writeln!(out, "Here are some great places for {category}:");
                    for place in places {
                        let _ = writeln!(out, "  - {}", describe(place));
                    }
                }
            }
            ChatCommand::Add(name) => {
                // Prefer the catalog's spelling
                let name = self
                    .assistant
                    .catalog()
                    .find(&name)
                    .map_or(name, |place| place.name.clone());
                if self.visits.add(&name) {
                    let _ = write!(out, "Added {name} to your visit list.");
                } else {
                    let _ = write!(out, "{name} is already on your visit list.");
                }
            }
            ChatCommand::Remove(name) => {
                if self.visits.remove(&name) {
                    let _ = write!(out, "Removed {name} from your visit list.");
                } else {
                    let _ = write!(out, "{name} is not on your visit list.");
                }
            }
            ChatCommand::List => {
                if self.visits.is_empty() {
                    out.push_str("Your visit list is empty.");
                } else {
                    out.push_str("Your selected places to visit:");
                    for (i, name) in self.visits.names().iter().enumerate() {
                        let _ = write!(out, "\n  {}. {}", i + 1, name);
                    }
                }
            }
            ChatCommand::Clear => {
                self.visits.clear();
                out.push_str("Your visit list is now empty.");
            }
            ChatCommand::Weather { location, date } => {
                let date = date.unwrap_or_else(|| Local::now().date_naive());
                let report = self.assistant.weather(&location, date).await?;
                out.push_str(&report.to_string());
            }
            ChatCommand::Plan { days } => {
                let request = ItineraryRequest {
                    days: days.unwrap_or(self.assistant.defaults().itinerary_days),
                    start_date: None,
                    weather: None,
                };
                let itinerary = self.assistant.itinerary(&self.visits, request).await?;
                out.push_str(&itinerary.to_string());
            }
            ChatCommand::Help => out.push_str(HELP),
            ChatCommand::Quit => out.push_str("Goodbye!"),
        }

        Ok(out.trim_end().to_string())
    }

    /// Read commands until `quit` or end of input. Command errors are printed, not returned.
    pub async fn run<I, O>(&mut self, input: I, mut output: O) -> Result<()>
    where
        I: AsyncBufRead + Unpin,
        O: AsyncWrite + Unpin,
    {
        let mut lines = input.lines();
        output
            .write_all(b"Ask me about Puerto Rico! Type `help` for commands.\n> ")
            .await?;
        output.flush().await?;

        while let Some(line) = lines.next_line().await? {
            let reply = match ChatCommand::parse(&line) {
                Ok(None) => None,
                Ok(Some(ChatCommand::Quit)) => {
                    output.write_all(b"Goodbye!\n").await?;
                    output.flush().await?;
                    return Ok(());
                }
                Ok(Some(command)) => Some(self.handle(command).await),
                Err(e) => Some(Err(e)),
            };

            match reply {
                Some(Ok(text)) => output.write_all(format!("{text}\n").as_bytes()).await?,
                Some(Err(e)) => {
                    output
                        .write_all(format!("Error: {}\n", e.user_message()).as_bytes())
                        .await?;
                }
                None => {}
            }
            output.write_all(b"> ").await?;
            output.flush().await?;
        }
        Ok(())
    }
}

fn describe(place: &crate::models::Place) -> String {
    match &place.municipality {
        Some(municipality) => format!("{} ({municipality})", place.name),
        None => place.name.clone(),
    }
}
