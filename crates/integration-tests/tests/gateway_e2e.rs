//! Gateway End-to-End Tests
//!
//! Real HTTP server, real child processes (`sh` scripts standing in for the
//! python models), mocked chat completion.

#![cfg(unix)]

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use greenearth_api_http::{ApiState, HttpServer, HttpServerConfig, ServerHandle};
use greenearth_core::application::{ChatService, PredictionOptions, PredictionService};
use greenearth_core::domain::OutputProtocol;
use greenearth_core::port::chat_completion::mocks::MockChatCompletion;
use greenearth_core::port::id_provider::UuidProvider;
use greenearth_core::port::time_provider::SystemTimeProvider;
use greenearth_infra_system::{ProcessInvoker, ProcessRunner, ProcessRunnerConfig, ScriptRegistry};
use reqwest::StatusCode;
use serde_json::{json, Value};
use tempfile::TempDir;

struct Gateway {
    base: String,
    handle: ServerHandle,
    scripts: TempDir,
    client: reqwest::Client,
}

impl Gateway {
    async fn start(protocol: OutputProtocol, timeout: Duration) -> Self {
        let scripts = TempDir::new().unwrap();

        let runner = ProcessRunner::new(
            Arc::new(SystemTimeProvider),
            ProcessRunnerConfig {
                interpreter: "sh".to_string(),
                timeout: Some(timeout),
                kill_grace: Duration::from_millis(200),
                env_allowlist: vec!["PATH".to_string()],
            },
        );
        let invoker = ProcessInvoker::new(runner, ScriptRegistry::new(scripts.path()), protocol);

        let predictions = Arc::new(PredictionService::new(
            Arc::new(invoker),
            Arc::new(UuidProvider),
            Arc::new(SystemTimeProvider),
            PredictionOptions::default(),
        ));
        let chat = Arc::new(ChatService::new(Arc::new(MockChatCompletion::new_reply(
            "unused",
        ))));
        let state = ApiState::new(predictions, chat, scripts.path().join("plots"));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let handle = HttpServer::new(HttpServerConfig::default(), state)
            .start(listener)
            .unwrap();

        Self {
            base: format!("http://{}", handle.local_addr()),
            handle,
            scripts,
            client: reqwest::Client::new(),
        }
    }

    async fn start_default() -> Self {
        Self::start(OutputProtocol::LastLine, Duration::from_secs(10)).await
    }

    fn script(&self, name: &str, body: &str) {
        std::fs::write(self.scripts.path().join(name), body).unwrap();
    }

    fn dir(&self) -> &Path {
        self.scripts.path()
    }

    async fn get(&self, path: &str) -> (StatusCode, Value) {
        let response = self
            .client
            .get(format!("{}{}", self.base, path))
            .send()
            .await
            .unwrap();
        let status = response.status();
        (status, response.json().await.unwrap())
    }
}

const AQI_QUERY: &str = "/api/aqi/predict?temperature=70&humidity=30&wind_speed=10&precipitation=0";

const ACTIVITY_QUERY: &str =
    "/api/activity/recommend?age=34&time_of_day=morning&aqi=42&temperature=68&precipitation=0";

/// Concrete scenario: noise lines, then the result line
#[tokio::test]
async fn test_aqi_prediction_end_to_end() {
    let gateway = Gateway::start_default().await;
    gateway.script(
        "aqi_prediction.py",
        r#"echo "Loading historical data..."
echo "UserWarning: X does not have valid feature names"
echo '{"aqi_pm25": 42, "category": "Good", "predicted_pm25": 10.5}'
"#,
    );

    let (status, body) = gateway.get(AQI_QUERY).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"aqi_pm25": 42, "category": "Good", "predicted_pm25": 10.5})
    );

    gateway.handle.stop().await;
}

#[tokio::test]
async fn test_arguments_follow_declared_order() {
    let gateway = Gateway::start_default().await;
    gateway.script(
        "activity_recommender.py",
        r#"printf '{"user_input": {"age": "%s", "time_of_day": "%s", "aqi": "%s", "temperature": "%s", "precipitation": "%s"}, "recommended_activity": "Cycling"}\n' "$1" "$2" "$3" "$4" "$5"
"#,
    );

    let (status, body) = gateway.get(ACTIVITY_QUERY).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["user_input"],
        json!({
            "age": "34",
            "time_of_day": "morning",
            "aqi": "42",
            "temperature": "68",
            "precipitation": "0"
        })
    );
}

#[tokio::test]
async fn test_missing_parameter_never_spawns_script() {
    let gateway = Gateway::start_default().await;
    gateway.script(
        "aqi_prediction.py",
        "touch invoked\necho '{\"aqi_pm25\": 1, \"category\": \"Good\", \"predicted_pm25\": 1}'\n",
    );

    for missing in ["temperature", "humidity", "wind_speed", "precipitation"] {
        let query: Vec<String> = ["temperature", "humidity", "wind_speed", "precipitation"]
            .iter()
            .filter(|p| **p != missing)
            .map(|p| format!("{p}=1"))
            .collect();

        let (status, body) = gateway
            .get(&format!("/api/aqi/predict?{}", query.join("&")))
            .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains(missing));
    }

    assert!(!gateway.dir().join("invoked").exists());
}

#[tokio::test]
async fn test_malformed_result_line_is_500() {
    let gateway = Gateway::start_default().await;
    gateway.script(
        "aqi_prediction.py",
        "echo '{\"aqi_pm25\": 42, \"category\": \"Go'\n",
    );

    let (status, body) = gateway.get(AQI_QUERY).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "Failed to process request."}));
}

#[tokio::test]
async fn test_non_zero_exit_is_500_even_with_valid_output() {
    let gateway = Gateway::start_default().await;
    gateway.script(
        "aqi_prediction.py",
        r#"echo '{"aqi_pm25": 42, "category": "Good", "predicted_pm25": 10.5}'
echo "Traceback (most recent call last):" >&2
exit 1
"#,
    );

    let (status, body) = gateway.get(AQI_QUERY).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "Failed to process request."}));
}

#[tokio::test]
async fn test_blank_output_is_500() {
    let gateway = Gateway::start_default().await;
    gateway.script("newsfeed.py", "echo ''\necho '   '\n");

    let (status, body) = gateway.get("/api/newsfeed").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "Failed to fetch newsfeed data."}));
}

#[tokio::test]
async fn test_usage_message_fails_schema() {
    let gateway = Gateway::start_default().await;
    gateway.script(
        "activity_recommender.py",
        "echo '{\"message\": \"Please provide 5 parameters: age, time_of_day, aqi, temperature, precipitation\"}'\n",
    );

    let (status, body) = gateway.get(ACTIVITY_QUERY).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        json!({"error": "Failed to process recommendation request."})
    );
}

#[tokio::test]
async fn test_hung_script_times_out() {
    let gateway = Gateway::start(OutputProtocol::LastLine, Duration::from_millis(300)).await;
    gateway.script("airquality_regression.py", "exec sleep 10\n");

    let started = std::time::Instant::now();
    let (status, body) = gateway.get("/api/aqiRegress/regression").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "Failed to process regression request."}));
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_marker_protocol_ignores_trailing_json_noise() {
    let gateway = Gateway::start(
        OutputProtocol::Marker("@@GREENEARTH_RESULT@@".to_string()),
        Duration::from_secs(10),
    )
    .await;
    gateway.script(
        "newsfeed.py",
        r#"echo '@@GREENEARTH_RESULT@@{"articles": [{"original_title": "Smog alert"}]}'
echo '{"progress": 100}'
"#,
    );

    let (status, body) = gateway.get("/api/newsfeed").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"articles": [{"original_title": "Smog alert"}]}));
}

#[tokio::test]
async fn test_partial_forecast_range_sends_no_dates() {
    let gateway = Gateway::start_default().await;
    gateway.script(
        "capstone_airquality.py",
        "echo \"{\\\"forecast\\\": [], \\\"argc\\\": $#}\"\n",
    );

    let (status, body) = gateway
        .get("/api/aqi/capstone/predict?forecast_start=2024-06-01")
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["argc"], 0);

    let (status, body) = gateway
        .get("/api/aqi/capstone/predict?forecast_start=2024-06-01&forecast_end=2024-06-07")
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["argc"], 2);
}

#[tokio::test]
async fn test_concurrent_requests_do_not_block_each_other() {
    let gateway = Gateway::start_default().await;
    gateway.script(
        "aqi_prediction.py",
        "sleep 2\necho \"{\\\"aqi_pm25\\\": $1, \\\"category\\\": \\\"Good\\\", \\\"predicted_pm25\\\": 1.0}\"\n",
    );

    let started = std::time::Instant::now();
    let (a, b) = tokio::join!(
        gateway.get("/api/aqi/predict?temperature=1&humidity=1&wind_speed=1&precipitation=1"),
        gateway.get("/api/aqi/predict?temperature=2&humidity=1&wind_speed=1&precipitation=1"),
    );

    assert_eq!(a.0, StatusCode::OK);
    assert_eq!(b.0, StatusCode::OK);
    assert_eq!(a.1["aqi_pm25"], 1);
    assert_eq!(b.1["aqi_pm25"], 2);
    // Sequential execution would take at least 4s
    assert!(started.elapsed() < Duration::from_millis(3500));
}
