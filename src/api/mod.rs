use std::sync::Arc;

use axum::{
    Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;

use crate::assistant::{Answer, TravelAssistant};
use crate::itinerary::ItineraryRequest;
use crate::models::{Category, Itinerary, Place, WeatherReport};
use crate::session::VisitList;
use crate::{AssistantError, ErrorCode};

type AppState = Arc<TravelAssistant>;

/// JSON error body with a status derived from the error kind
#[derive(Debug)]
pub struct ApiError(AssistantError);

impl From<AssistantError> for ApiError {
    fn from(err: AssistantError) -> Self {
        Self(err)
    }
}

fn status_for(err: &AssistantError) -> StatusCode {
    match err.code() {
        ErrorCode::ValidationFailed => StatusCode::BAD_REQUEST,
        ErrorCode::ApiNotFound => StatusCode::NOT_FOUND,
        ErrorCode::ApiUnauthorized | ErrorCode::ConfigInvalid => StatusCode::SERVICE_UNAVAILABLE,
        ErrorCode::ApiRateLimit => StatusCode::TOO_MANY_REQUESTS,
        ErrorCode::ApiNetworkError | ErrorCode::ApiServerError | ErrorCode::ApiInvalidResponse => {
            StatusCode::BAD_GATEWAY
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            error!("Request failed: {}", self.0);
        }
        let body = json!({
            "error": self.0.user_message(),
            "code": self.0.code().as_str(),
        });
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Serialize)]
pub struct ApiCategory {
    pub slug: &'static str,
    pub label: &'static str,
    pub count: usize,
}

#[derive(Serialize)]
pub struct ApiNearbyPlace {
    #[serde(flatten)]
    pub place: Place,
    pub distance_km: f64,
}

#[derive(Deserialize)]
pub struct PlacesQuery {
    pub category: Option<String>,
    pub q: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Deserialize)]
pub struct NearbyQuery {
    pub lat: f64,
    pub lon: f64,
    pub radius_km: Option<f64>,
    pub limit: Option<usize>,
}

#[derive(Deserialize)]
pub struct AskQuery {
    pub q: String,
}

#[derive(Deserialize)]
pub struct WeatherQuery {
    pub location: String,
    pub date: Option<NaiveDate>,
}

/// The server keeps no sessions, so the visit list travels with the request
#[derive(Deserialize)]
pub struct ItineraryBody {
    pub places: Vec<String>,
    pub days: Option<u32>,
    pub start_date: Option<NaiveDate>,
    /// Fetch a forecast for this location and hand it to the planner
    pub location: Option<String>,
}

pub fn router(assistant: AppState) -> Router {
    Router::new()
        .route("/categories", get(get_categories))
        .route("/places", get(get_places))
        .route("/places/nearby", get(get_nearby))
        .route("/ask", get(ask))
        .route("/weather", get(get_weather))
        .route("/itinerary", post(post_itinerary))
        .with_state(assistant)
}

async fn get_categories(State(assistant): State<AppState>) -> Json<Vec<ApiCategory>> {
    let categories = assistant
        .catalog()
        .categories()
        .into_iter()
        .map(|c| ApiCategory {
            slug: c.slug(),
            label: c.label(),
            count: assistant.explore(c).len(),
        })
        .collect();
    Json(categories)
}

async fn get_places(
    State(assistant): State<AppState>,
    Query(query): Query<PlacesQuery>,
) -> ApiResult<Vec<Place>> {
    let category = query
        .category
        .as_deref()
        .map(str::parse::<Category>)
        .transpose()?;
    let places = assistant.places(category, query.q.as_deref(), query.limit)?;
    Ok(Json(places.into_iter().cloned().collect()))
}

async fn get_nearby(
    State(assistant): State<AppState>,
    Query(query): Query<NearbyQuery>,
) -> ApiResult<Vec<ApiNearbyPlace>> {
    let nearby = assistant.nearby(query.lat, query.lon, query.radius_km, query.limit)?;
    Ok(Json(
        nearby
            .into_iter()
            .map(|(place, distance_km)| ApiNearbyPlace {
                place: place.clone(),
                distance_km,
            })
            .collect(),
    ))
}

async fn ask(
    State(assistant): State<AppState>,
    Query(query): Query<AskQuery>,
) -> ApiResult<Answer> {
    let answer = assistant.ask(&query.q, &mut rand::rng())?;
    Ok(Json(answer))
}

async fn get_weather(
    State(assistant): State<AppState>,
    Query(query): Query<WeatherQuery>,
) -> ApiResult<WeatherReport> {
    let date = query.date.unwrap_or_else(|| Local::now().date_naive());
    Ok(Json(assistant.weather(&query.location, date).await?))
}

async fn post_itinerary(
    State(assistant): State<AppState>,
    Json(body): Json<ItineraryBody>,
) -> ApiResult<Itinerary> {
    let visits: VisitList = body.places.iter().collect();
    let request = ItineraryRequest {
        days: body.days.unwrap_or(assistant.defaults().itinerary_days),
        start_date: body.start_date,
        weather: None,
    };
    let itinerary = assistant
        .itinerary_with_forecast(&visits, request, body.location.as_deref())
        .await?;
    Ok(Json(itinerary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::PlaceCatalog;
    use crate::config::{DefaultsConfig, WeatherConfig};
    use crate::weather::WeatherApiClient;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tower::ServiceExt;

    fn app() -> Router {
        let assistant = TravelAssistant::new(
            PlaceCatalog::builtin().unwrap(),
            WeatherApiClient::new(WeatherConfig::default()).unwrap(),
            DefaultsConfig::default(),
        );
        router(Arc::new(assistant))
    }

    async fn call(request: Request<Body>) -> (StatusCode, Value) {
        let response = app().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn get_json(uri: &str) -> (StatusCode, Value) {
        call(Request::builder().uri(uri).body(Body::empty()).unwrap()).await
    }

    #[tokio::test]
    async fn test_categories() {
        let (status, body) = get_json("/categories").await;
        assert_eq!(status, StatusCode::OK);
        let categories = body.as_array().unwrap();
        assert_eq!(categories.len(), 5);
        assert_eq!(categories[0]["slug"], "beaches");
        assert_eq!(categories[0]["count"], 5);
    }

    #[tokio::test]
    async fn test_places_by_category_and_limit() {
        let (status, body) = get_json("/places?category=Historical%20Sites&limit=2").await;
        assert_eq!(status, StatusCode::OK);
        let places = body.as_array().unwrap();
        assert_eq!(places.len(), 2);
        assert_eq!(places[0]["name"], "El Morro");
        assert_eq!(places[0]["category"], "historical_sites");
    }

    #[tokio::test]
    async fn test_unknown_category_is_bad_request() {
        let (status, body) = get_json("/places?category=shopping").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "validation_failed");
    }

    #[tokio::test]
    async fn test_nearby_includes_distance() {
        let (status, body) = get_json("/places/nearby?lat=18.4655&lon=-66.1057&radius_km=2").await;
        assert_eq!(status, StatusCode::OK);
        let places = body.as_array().unwrap();
        assert!(!places.is_empty());
        assert!(places[0]["distance_km"].as_f64().unwrap() <= 2.0);
        assert!(places[0]["name"].is_string());
    }

    #[tokio::test]
    async fn test_ask_no_match() {
        let (status, body) = get_json("/ask?q=shopping").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["kind"], "no_match");
        assert_eq!(body["message"], crate::assistant::NO_RECOMMENDATIONS);
    }

    #[tokio::test]
    async fn test_ask_category() {
        let (_, body) = get_json("/ask?q=nature").await;
        assert_eq!(body["kind"], "suggestions");
        assert_eq!(body["category"], "nature");
        assert_eq!(body["places"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_weather_without_key_is_unavailable() {
        let (status, body) = get_json("/weather?location=Ponce").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["code"], "config_invalid");
    }

    #[tokio::test]
    async fn test_itinerary_rejects_empty_visit_list() {
        let request = Request::builder()
            .method("POST")
            .uri("/itinerary")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"places": [], "days": 2}"#))
            .unwrap();
        let (status, body) = call(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("visit list"));
    }

    #[tokio::test]
    async fn test_invalid_itinerary_makes_no_weather_call() {
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
        let request = Request::builder()
            .method("POST")
            .uri("/itinerary")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"places": [], "days": 99, "location": "San Juan"}"#))
            .unwrap();

        let response = router(Arc::new(assistant)).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        mock.assert_async().await;
    }

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AssistantError::validation("x"), StatusCode::BAD_REQUEST),
            (AssistantError::api("x", ErrorCode::ApiNotFound), StatusCode::NOT_FOUND),
            (AssistantError::api("x", ErrorCode::ApiRateLimit), StatusCode::TOO_MANY_REQUESTS),
            (AssistantError::api("x", ErrorCode::ApiServerError), StatusCode::BAD_GATEWAY),
            (AssistantError::config("x"), StatusCode::SERVICE_UNAVAILABLE),
            (AssistantError::cache("x"), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, expected) in cases {
            assert_eq!(status_for(&err), expected);
        }
    }
}
