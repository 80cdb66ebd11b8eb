use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::debug;

use travelassist::catalog::{export_json, loader};
use travelassist::chat::ChatSession;
use travelassist::models::format_coordinates;
use travelassist::{
    Answer, AssistantConfig, AssistantError, Category, ItineraryRequest, Place, TravelAssistant,
    VERSION, VisitList, logging, web,
};

#[derive(Parser)]
#[command(name = "travelassist")]
#[command(about = "Puerto Rico travel assistant: places, weather and itineraries", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to a TOML config file
    #[arg(short, long, global = true, env = "TRAVELASSIST_CONFIG")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List landmarks, optionally filtered by category or keyword
    Places {
        /// Category (beaches, nature, history, culture, festivals)
        #[arg(long)]
        category: Option<Category>,

        /// Keyword to search names, municipalities and summaries for
        #[arg(short, long)]
        query: Option<String>,

        /// Maximum number of places to show
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Ask the assistant a question
    Ask {
        /// Question text, e.g. "beach" or "forts in San Juan"
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
    },

    /// Show the weather forecast for a place or town
    Weather {
        #[arg(short, long)]
        location: String,

        /// Forecast date (YYYY-MM-DD), defaults to today
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },

    /// Find landmarks around a point
    Nearby {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,

        #[arg(long, allow_negative_numbers = true)]
        lon: f64,

        #[arg(long)]
        radius_km: Option<f64>,

        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Show a landmark, filling gaps from Wikipedia
    Describe {
        #[arg(required = true, num_args = 1..)]
        name: Vec<String>,
    },

    /// Generate an itinerary for a list of places
    Itinerary {
        /// Place to visit (repeatable)
        #[arg(short, long = "place", required = true)]
        places: Vec<String>,

        /// Number of days
        #[arg(long)]
        days: Option<u32>,

        /// First day of the trip (YYYY-MM-DD)
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Include the forecast for this location
        #[arg(long)]
        weather_location: Option<String>,
    },

    /// Scrape municipality summaries and coordinates into a JSON file
    Scrape {
        /// Text file with one municipality name per line
        #[arg(long)]
        names: PathBuf,

        /// Output JSON file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Start an interactive chat session
    Chat,

    /// Serve the JSON API
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        host: IpAddr,

        #[arg(short, long, default_value = "8080")]
        port: u16,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", user_message(&e));
            ExitCode::FAILURE
        }
    }
}

fn user_message(err: &anyhow::Error) -> String {
    err.downcast_ref::<AssistantError>()
        .map_or_else(|| format!("{err:#}"), AssistantError::user_message)
}

async fn run(cli: Cli) -> Result<()> {
    let Some(command) = cli.command else {
        print_banner();
        return Ok(());
    };

    let config = AssistantConfig::load_from_path(cli.config)?;
    let _guard = logging::init(&config.logging, cli.verbose)?;
    debug!("Loaded configuration");

    let assistant = TravelAssistant::from_config(&config)?;
    let json = cli.json;

    match command {
        Commands::Places {
            category,
            query,
            limit,
        } => {
            let places = assistant.places(category, query.as_deref(), limit)?;
            if json {
                return print_json(&places);
            }
            if places.is_empty() {
                println!("No places found for this category.");
            }
            for place in places {
                print_place(place);
            }
        }
        Commands::Ask { question } => {
            let answer = assistant.ask(&question.join(" "), &mut rand::rng())?;
            if json {
                return print_json(&answer);
            }
            match answer {
                Answer::Suggestions { category, places } => {
                    println!("Here are some recommended places for {category}:");
                    places.iter().for_each(print_place);
                }
                Answer::Matches { places, .. } => places.iter().for_each(print_place),
                Answer::NoMatch { message } => println!("{message}"),
            }
        }
        Commands::Weather { location, date } => {
            let date = date.unwrap_or_else(|| Local::now().date_naive());
            let report = assistant.weather(&location, date).await?;
            if json {
                return print_json(&report);
            }
            println!("{report}");
        }
        Commands::Nearby {
            lat,
            lon,
            radius_km,
            limit,
        } => {
            let nearby = assistant.nearby(lat, lon, radius_km, limit)?;
            if json {
                let rows: Vec<_> = nearby
                    .iter()
                    .map(|(place, distance)| {
                        serde_json::json!({ "place": place, "distance_km": distance })
                    })
                    .collect();
                return print_json(&rows);
            }
            if nearby.is_empty() {
                println!("No places within range.");
            }
            for (place, distance) in nearby {
                println!("  {:>6.1} km  {}", distance, place.name);
            }
        }
        Commands::Describe { name } => {
            let place = assistant.describe(&name.join(" ")).await?;
            if json {
                return print_json(&place);
            }
            print_place(&place);
            println!("    {}", place.summary_or_sentinel());
            if let Some(municipality) = assistant.catalog().municipality_of(&place) {
                println!(
                    "    Municipality: {} ({})",
                    municipality.name,
                    format_coordinates(municipality.coordinates.as_ref())
                );
            }
        }
        Commands::Itinerary {
            places,
            days,
            date,
            weather_location,
        } => {
            let visits: VisitList = places.iter().collect();
            let request = ItineraryRequest {
                days: days.unwrap_or(config.defaults.itinerary_days),
                start_date: date,
                weather: None,
            };
            let itinerary = assistant
                .itinerary_with_forecast(&visits, request, weather_location.as_deref())
                .await?;
            if json {
                return print_json(&itinerary);
            }
            println!("{itinerary}");
        }
        Commands::Scrape { names, output } => {
            let names = loader::load_municipality_names(&names)?;
            let municipalities = assistant.scrape_municipalities(&names).await?;
            export_json(&output, &municipalities)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            println!(
                "Wrote {} municipalities to {}",
                municipalities.len(),
                output.display()
            );
        }
        Commands::Chat => {
            let mut session = ChatSession::new(&assistant, rand::rng());
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            session.run(stdin, tokio::io::stdout()).await?;
        }
        Commands::Serve { host, port } => {
            web::run(SocketAddr::new(host, port), Arc::new(assistant)).await?;
        }
    }

    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_place(place: &Place) {
    match &place.municipality {
        Some(municipality) => {
            println!("  - {} [{}] in {}", place.name, place.category, municipality)
        }
        None => println!("  - {} [{}]", place.name, place.category),
    }
}

fn print_banner() {
    println!("TravelAssist {VERSION} - Puerto Rico travel assistant");
    println!();
    println!("Try:");
    println!("  travelassist places --category beaches");
    println!("  travelassist ask \"historical sites\"");
    println!("  travelassist weather --location \"San Juan\"");
    println!("  travelassist chat");
    println!();
    match AssistantConfig::get_config_path() {
        Some(path) => println!("Config file: {}", path.display()),
        None => println!("Config file: pass --config <path>"),
    }
    println!("API keys: set WEATHER_API_KEY and OPENAI_API_KEY, or weather.api_key and");
    println!("completion.api_key in the config file. Run with --help for all commands.");
}
