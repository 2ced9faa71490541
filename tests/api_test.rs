use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use lobster_energy::server::{router, AppState};
use lobster_energy::{MarketService, ServiceError, Settings};
use mockito::{Matcher, Mock, ServerGuard};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

const MARKET_INDEX_PATH: &str = "/balancing/pricing/market-index";

fn settings_for(bmrs_url: String, weather_url: String) -> Settings {
    let mut settings = Settings::default();
    settings.bmrs.base_url = bmrs_url;
    settings.bmrs.max_retries = 2;
    settings.bmrs.backoff_base_ms = 1;
    settings.bmrs.requests_per_minute = 6000;
    settings.weather.base_url = weather_url;
    settings
}

fn app(server: &ServerGuard) -> Router {
    let service = MarketService::new(settings_for(server.url(), server.url())).unwrap();
    router(Arc::new(AppState { service }))
}

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

/// Half-hourly prices for the last `days` UTC days, a weekly sawtooth
fn market_index_body(days: i64) -> String {
    let today = Utc::now().date_naive();
    let mut data = Vec::new();
    for d in 0..days {
        let midnight = (today - Duration::days(d)).and_hms_opt(0, 0, 0).unwrap().and_utc();
        let price = 60.0 + (d % 7) as f64 * 5.0;
        for period in 0..48 {
            data.push(json!({
                "startTime": midnight + Duration::minutes(30 * period),
                "settlementPeriod": period + 1,
                "dataProvider": "APXMIDP",
                "price": price,
            }));
        }
    }
    json!({ "data": data }).to_string()
}

/// Every weekly chunk gets the same body; the client de-duplicates overlaps
async fn mock_bmrs(server: &mut ServerGuard, days: i64) -> Mock {
    server
        .mock("GET", MARKET_INDEX_PATH)
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(market_index_body(days))
        .create_async()
        .await
}

#[tokio::test]
async fn test_health() {
    let server = mockito::Server::new_async().await;
    let (status, body) = get(app(&server), "/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_market_summary() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", MARKET_INDEX_PATH)
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(market_index_body(14))
        // 14 days -> two weekly chunks
        .expect(2)
        .create_async()
        .await;

    let (status, body) = get(app(&server), "/api/market?days=14&product=peak").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["product"], "peak");
    assert_eq!(body["period"], "14 days");
    assert_eq!(body["current"]["unit"], "£/MWh");
    assert_eq!(body["totalRecords"], 14 * 48);
    assert_eq!(body["prices"].as_array().unwrap().len(), 168);
    assert_eq!(body["prices"][0]["product"], "peak");
    assert_eq!(body["prices"][0]["source"], "BMRS");
    assert!(body["prices"][0]["timestamp"].is_string());
    assert!(body["lastUpdated"].is_string());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_signal() {
    let mut server = mockito::Server::new_async().await;
    let _mock = mock_bmrs(&mut server, 28).await;

    let (status, body) = get(app(&server), "/api/signals").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["product"], "baseload");
    let signal = body["signal"].as_str().unwrap();
    assert!(["BUY", "WAIT", "HOLD"].contains(&signal));
    assert_eq!(body["priceContext"]["current"], 60.0);
    assert_eq!(body["contractComparison"]["fixedPremium"], "8%");
}

#[tokio::test]
async fn test_predictions() {
    let mut server = mockito::Server::new_async().await;
    let _mock = mock_bmrs(&mut server, 28).await;

    let (status, body) = get(app(&server), "/api/predictions?horizon=10").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["horizon"], "10 days");
    assert_eq!(body["model"], "Smoothed Conservative (max 4%/day)");
    let forecast = body["forecast"].as_array().unwrap();
    assert_eq!(forecast.len(), 10);
    let tomorrow = (Utc::now().date_naive() + Duration::days(1)).to_string();
    assert_eq!(forecast[0]["date"], tomorrow);
    assert_eq!(forecast[0]["confidence"], 1.0);
}

#[tokio::test]
async fn test_backtest() {
    let mut server = mockito::Server::new_async().await;
    let _mock = mock_bmrs(&mut server, 28).await;

    let (status, body) = get(app(&server), "/api/backtest").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["period"]["tradingDays"], 14);
    assert_eq!(body["naiveStrategy"]["buyDays"], 14);
    assert_eq!(body["recentTrades"].as_array().unwrap().len(), 10);
    assert!(body["comparison"]["annualSavingsPerMW"].is_number());
}

#[tokio::test]
async fn test_backtest_with_short_history_is_not_found() {
    let mut server = mockito::Server::new_async().await;
    let _mock = mock_bmrs(&mut server, 10).await;

    let (status, body) = get(app(&server), "/api/backtest").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Failed to run backtest");
    assert!(body["details"].as_str().unwrap().contains("need at least 15"));
}

#[tokio::test]
async fn test_forecast_accuracy() {
    let mut server = mockito::Server::new_async().await;
    let _mock = mock_bmrs(&mut server, 56).await;

    let (status, body) = get(app(&server), "/api/forecast-accuracy?days=5&horizon=3").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["period"]["totalDays"], 56);
    assert_eq!(body["period"]["forecastsEvaluated"], 15);
    assert_eq!(body["byHorizon"].as_array().unwrap().len(), 3);
    assert_eq!(body["recentExamples"].as_array().unwrap().len(), 10);
}

#[tokio::test]
async fn test_empty_bmrs_is_not_found() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", MARKET_INDEX_PATH)
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"data":[]}"#)
        .create_async()
        .await;

    let (status, body) = get(app(&server), "/api/signals").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "success": false, "error": "No data from BMRS" }));
}

#[tokio::test]
async fn test_bmrs_outage_is_not_found() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", MARKET_INDEX_PATH)
        .match_query(Matcher::Any)
        .with_status(503)
        .create_async()
        .await;

    let (status, body) = get(app(&server), "/api/market").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "No data from BMRS");
}

#[tokio::test]
async fn test_unreachable_bmrs_is_server_error() {
    // Nothing listens on the discard port
    let settings = settings_for("http://127.0.0.1:9".to_string(), "http://127.0.0.1:9".to_string());
    let service = MarketService::new(settings).unwrap();

    let err = service.signal("baseload").await.unwrap_err();
    assert!(matches!(err, ServiceError::Upstream(_)));

    let app = router(Arc::new(AppState { service }));
    let (status, body) = get(app, "/api/signals").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Failed to generate signal");
    assert!(body["details"]
        .as_str()
        .unwrap()
        .contains("network error after 2 attempts"));
}

#[tokio::test]
async fn test_weather() {
    let mut server = mockito::Server::new_async().await;
    let today = Utc::now().date_naive();
    let dates: Vec<String> = (-1..=1)
        .map(|d| (today + Duration::days(d)).to_string())
        .collect();
    let _mock = server
        .mock("GET", "/forecast")
        .match_query(Matcher::UrlEncoded("past_days".into(), "7".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "current": {
                    "time": "2025-01-15T12:00",
                    "temperature_2m": 3.5,
                    "wind_speed_10m": 9.0,
                    "cloud_cover": 90.0
                },
                "daily": {
                    "time": dates,
                    "temperature_2m_max": [4.0, 3.0, null],
                    "temperature_2m_min": [-2.0, -3.0, -4.0],
                    "wind_speed_10m_max": [10.0, 12.0, 8.0],
                    "precipitation_sum": [0.0, 1.2, 0.0],
                    "sunshine_duration": [3600.0, 0.0, 7200.0]
                }
            })
            .to_string(),
        )
        .create_async()
        .await;

    let (status, body) = get(app(&server), "/api/weather").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["current"]["temperature"], 3.5);
    assert_eq!(body["pastWeek"].as_array().unwrap().len(), 2);
    assert_eq!(body["forecast"].as_array().unwrap().len(), 2);
    assert_eq!(body["analysis"]["demandImpact"], "high");
    assert_eq!(body["analysis"]["pricePressure"], "upward");
}

#[tokio::test]
async fn test_weather_outage_is_server_error() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/forecast")
        .match_query(Matcher::Any)
        .with_status(502)
        .create_async()
        .await;

    let (status, body) = get(app(&server), "/api/weather").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to fetch weather data");
    assert!(body["details"].as_str().unwrap().contains("Weather API failed"));
}

#[tokio::test]
async fn test_demand() {
    let server = mockito::Server::new_async().await;
    let (status, body) = get(app(&server), "/api/demand?baseload=2.5&days=3").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["baseloadMW"], 2.5);
    assert_eq!(body["forecastDays"], 3);
    assert_eq!(body["forecast"].as_array().unwrap().len(), 72);
    assert_eq!(body["dailySummary"].as_array().unwrap().len(), 3);
    assert_eq!(body["flexibility"]["offPeakHours"], "23:00-06:00");
}

#[tokio::test]
async fn test_demand_rejects_bad_baseload() {
    let server = mockito::Server::new_async().await;

    let (status, body) = get(app(&server), "/api/demand?baseload=-3").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Failed to generate demand forecast");

    let (status, body) = get(app(&server), "/api/demand?baseload=lots").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid query parameters");
}

#[tokio::test]
async fn test_recommendations() {
    let mut server = mockito::Server::new_async().await;
    let _mock = mock_bmrs(&mut server, 28).await;

    let (status, body) = get(
        app(&server),
        "/api/recommendations?volume=500&deliveryPeriod=Q3-2026",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deliveryPeriod"], "Q3-2026");
    assert_eq!(body["totalVolumeMwh"], 500.0);
    let tranches = body["recommendations"].as_array().unwrap();
    assert!(!tranches.is_empty());
    let total_pct: u64 = tranches
        .iter()
        .map(|t| t["percentage"].as_u64().unwrap())
        .sum();
    assert!(total_pct <= 100);
}

#[tokio::test]
async fn test_compare() {
    let mut server = mockito::Server::new_async().await;
    let _mock = mock_bmrs(&mut server, 28).await;

    let (status, body) = get(app(&server), "/api/compare?fixedRate=500&volume=1000").await;

    assert_eq!(status, StatusCode::OK);
    // Forecasts sit around £60-90/MWh, far below a £500 fixed rate
    assert_eq!(body["recommendation"], "FLEXIBLE");
    assert_eq!(body["fixedAnnualCost"], 500_000.0);
}

#[tokio::test]
async fn test_compare_requires_fixed_rate() {
    let server = mockito::Server::new_async().await;
    let (status, body) = get(app(&server), "/api/compare?volume=1000").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"], "Invalid input: fixedRate is required");
}
