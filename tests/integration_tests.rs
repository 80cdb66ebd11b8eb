//! Integration tests for the TravelAssist CLI
//!
//! Every test runs offline: API keys are cleared, the cache is disabled and
//! the config directory points at an empty temp dir.

use std::fs;
use std::process::{Command, Output};

use tempfile::TempDir;

fn travelassist(home: &TempDir, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_travelassist"))
        .args(args)
        .env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join("config"))
        .env("TRAVELASSIST_CACHE__ENABLED", "false")
        .env_remove("WEATHER_API_KEY")
        .env_remove("OPENAI_API_KEY")
        .env_remove("TRAVELASSIST_CONFIG")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute travelassist")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_help_lists_commands() {
    let home = TempDir::new().unwrap();
    let output = travelassist(&home, &["--help"]);

    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("Puerto Rico travel assistant"));
    for command in ["places", "ask", "weather", "nearby", "itinerary", "scrape", "chat", "serve"] {
        assert!(text.contains(command), "missing {command} in help:\n{text}");
    }
}

#[test]
fn test_banner_without_subcommand() {
    let home = TempDir::new().unwrap();
    let output = travelassist(&home, &[]);

    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("TravelAssist"));
    assert!(text.contains("WEATHER_API_KEY"));
}

#[test]
fn test_places_by_category() {
    let home = TempDir::new().unwrap();
    let output = travelassist(&home, &["places", "--category", "beaches", "--limit", "10"]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let text = stdout(&output);
    assert!(text.contains("Flamenco Beach"));
    assert!(text.contains("Crash Boat Beach"));
    assert!(!text.contains("El Morro"));
}

#[test]
fn test_places_json_output() {
    let home = TempDir::new().unwrap();
    let output = travelassist(&home, &["--json", "places", "--query", "morro"]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let places: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(places[0]["name"], "El Morro");
    assert_eq!(places[0]["category"], "historical_sites");
}

#[test]
fn test_unknown_category_is_rejected() {
    let home = TempDir::new().unwrap();
    let output = travelassist(&home, &["places", "--category", "shopping"]);

    assert!(!output.status.success());
    assert!(stderr(&output).contains("shopping"));
}

#[test]
fn test_ask_category_and_unknown() {
    let home = TempDir::new().unwrap();

    let output = travelassist(&home, &["ask", "history"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("Here are some recommended places for Historical Sites:"));

    let output = travelassist(&home, &["ask", "shopping", "malls"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("Sorry, I don't have recommendations for that category."));
}

#[test]
fn test_weather_without_api_key() {
    let home = TempDir::new().unwrap();
    let output = travelassist(&home, &["weather", "--location", "San Juan"]);

    assert_eq!(output.status.code(), Some(1));
    let text = stderr(&output);
    assert!(text.contains("Error: Configuration error"), "got: {text}");
    assert!(text.contains("WEATHER_API_KEY"));
}

#[test]
fn test_weather_empty_location() {
    let home = TempDir::new().unwrap();
    let output = travelassist(&home, &["weather", "--location", "  "]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Location cannot be empty"));
}

#[test]
fn test_nearby_old_san_juan() {
    let home = TempDir::new().unwrap();
    let output = travelassist(
        &home,
        &["nearby", "--lat", "18.4655", "--lon", "-66.1057", "--radius-km", "2"],
    );

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let text = stdout(&output);
    assert!(text.contains("San Cristóbal Fort"));
    assert!(!text.contains("Flamenco Beach"));
}

#[test]
fn test_custom_catalog_from_config_file() {
    let home = TempDir::new().unwrap();
    let catalog_path = home.path().join("places.txt");
    fs::write(&catalog_path, "[beaches]\nPlaya Secreta | Rincón\n").unwrap();

    let config_path = home.path().join("config.toml");
    fs::write(
        &config_path,
        format!("[catalog]\npath = {:?}\n", catalog_path.display().to_string()),
    )
    .unwrap();

    let output = travelassist(
        &home,
        &["--config", config_path.to_str().unwrap(), "places", "--category", "beach"],
    );
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let text = stdout(&output);
    assert!(text.contains("Playa Secreta [Beaches] in Rincón"));
    assert!(!text.contains("Flamenco Beach"));
}

#[test]
fn test_missing_config_file() {
    let home = TempDir::new().unwrap();
    let output = travelassist(&home, &["--config", "/nonexistent/travelassist.toml", "places"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Config file not found"));
}

#[test]
fn test_itinerary_rejects_long_trips() {
    let home = TempDir::new().unwrap();
    let output = travelassist(&home, &["itinerary", "--place", "El Morro", "--days", "30"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("between 1 and 14 days"));
}
