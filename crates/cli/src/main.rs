//! GreenEarth CLI - Command-line client for the GreenEarth prediction gateway

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use serde::Deserialize;
use serde_json::{json, Value};
use tabled::builder::Builder;
use tabled::{Table, Tabled};

const DEFAULT_API_URL: &str = "http://127.0.0.1:5000";

#[derive(Parser)]
#[command(name = "greenearth")]
#[command(about = "GreenEarth Connect prediction gateway CLI", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Gateway base URL
    #[arg(long, env = "GREENEARTH_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Predict PM2.5 and AQI from current weather
    Aqi {
        #[arg(long)]
        temperature: String,
        #[arg(long)]
        humidity: String,
        #[arg(long)]
        wind_speed: String,
        #[arg(long)]
        precipitation: String,
    },

    /// Forecast NO2 concentrations (both dates or neither)
    Forecast {
        /// First forecast day (YYYY-MM-DD)
        #[arg(long, requires = "end")]
        start: Option<String>,
        /// Last forecast day (YYYY-MM-DD)
        #[arg(long, requires = "start")]
        end: Option<String>,
    },

    /// Recommend an outdoor activity
    Activity {
        #[arg(long)]
        age: String,
        /// morning, afternoon, evening or night
        #[arg(long)]
        time_of_day: String,
        #[arg(long)]
        aqi: String,
        #[arg(long)]
        temperature: String,
        #[arg(long)]
        precipitation: String,
    },

    /// Recommend an activity from the extended profile model
    ActivityV2(ActivityV2Args),

    /// Run the AQI regression model comparison
    Regression,

    /// Fetch summarized air-quality news
    Newsfeed,

    /// Ask the assistant a question
    Chat {
        message: String,
    },

    /// Show gateway health
    Health,
}

#[derive(Args)]
struct ActivityV2Args {
    #[arg(long)]
    age: String,
    #[arg(long)]
    gender: String,
    #[arg(long)]
    health_condition: String,
    #[arg(long)]
    activity_level: String,
    #[arg(long)]
    preference: String,
    #[arg(long)]
    temperature: String,
    #[arg(long)]
    humidity: String,
    #[arg(long)]
    wind_speed: String,
    #[arg(long)]
    air_quality_index: String,
    #[arg(long)]
    crime_rate: String,
    #[arg(long)]
    traffic_congestion_index: String,
    #[arg(long)]
    community_event: String,
    #[arg(long)]
    health_advisory: String,
}

impl ActivityV2Args {
    fn query(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("age", self.age.as_str()),
            ("gender", self.gender.as_str()),
            ("health_condition", self.health_condition.as_str()),
            ("activity_level", self.activity_level.as_str()),
            ("preference", self.preference.as_str()),
            ("temperature", self.temperature.as_str()),
            ("humidity", self.humidity.as_str()),
            ("wind_speed", self.wind_speed.as_str()),
            ("air_quality_index", self.air_quality_index.as_str()),
            ("crime_rate", self.crime_rate.as_str()),
            ("traffic_congestion_index", self.traffic_congestion_index.as_str()),
            ("community_event", self.community_event.as_str()),
            ("health_advisory", self.health_advisory.as_str()),
        ]
    }
}

#[derive(Deserialize, Tabled)]
struct HealthResult {
    status: String,
    version: String,
    uptime_secs: u64,
}

struct Gateway {
    base: String,
    client: reqwest::Client,
}

impl Gateway {
    fn new(base: &str) -> Self {
        Self {
            base: base.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<Value> {
        let response = self
            .client
            .get(format!("{}{}", self.base, path))
            .query(query)
            .send()
            .await
            .context("Failed to connect to gateway")?;
        read_response(response).await
    }

    async fn post(&self, path: &str, body: Value) -> Result<Value> {
        let response = self
            .client
            .post(format!("{}{}", self.base, path))
            .json(&body)
            .send()
            .await
            .context("Failed to connect to gateway")?;
        read_response(response).await
    }
}

/// Body of a 2xx response, or the error envelope turned into an error
async fn read_response(response: reqwest::Response) -> Result<Value> {
    let status = response.status();
    let text = response.text().await.context("Failed to read response")?;

    if !status.is_success() {
        anyhow::bail!("Gateway error ({}): {}", status, error_message(&text));
    }

    serde_json::from_str(&text).context("Failed to parse response")
}

/// Envelope message plus details when present, else the raw body
fn error_message(body: &str) -> String {
    let Ok(envelope) = serde_json::from_str::<Value>(body) else {
        return body.trim().to_string();
    };
    match (envelope["error"].as_str(), envelope.get("details")) {
        (Some(message), Some(details)) => format!("{message} {details}"),
        (Some(message), None) => message.to_string(),
        (None, _) => body.trim().to_string(),
    }
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "-".to_string(),
        other => other.to_string(),
    }
}

/// Two-column table of an object's fields
fn fields_table(value: &Value) -> String {
    let mut builder = Builder::default();
    builder.push_record(["field", "value"]);
    if let Some(object) = value.as_object() {
        for (key, v) in object {
            builder.push_record([key.clone(), scalar(v)]);
        }
    }
    builder.build().to_string()
}

/// One row per array element, columns from the first element's keys
fn records_table(rows: &[Value]) -> String {
    let columns: Vec<String> = rows
        .first()
        .and_then(Value::as_object)
        .map(|o| o.keys().cloned().collect())
        .unwrap_or_default();

    let mut builder = Builder::default();
    builder.push_record(columns.clone());
    for row in rows {
        builder.push_record(columns.iter().map(|c| scalar(&row[c.as_str()])));
    }
    builder.build().to_string()
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let gateway = Gateway::new(&cli.api_url);

    match cli.command {
        Commands::Aqi {
            temperature,
            humidity,
            wind_speed,
            precipitation,
        } => {
            let result = gateway
                .get(
                    "/api/aqi/predict",
                    &[
                        ("temperature", temperature.as_str()),
                        ("humidity", humidity.as_str()),
                        ("wind_speed", wind_speed.as_str()),
                        ("precipitation", precipitation.as_str()),
                    ],
                )
                .await?;

            let category = scalar(&result["category"]);
            println!("{} {}", "Air quality:".cyan().bold(), category.bold());
            println!();
            println!("{}", fields_table(&result));
        }

        Commands::Forecast { start, end } => {
            let mut query = Vec::new();
            if let (Some(start), Some(end)) = (&start, &end) {
                query.push(("forecast_start", start.as_str()));
                query.push(("forecast_end", end.as_str()));
            }

            let result = gateway.get("/api/aqi/capstone/predict", &query).await?;
            let rows = result["forecast"].as_array().cloned().unwrap_or_default();

            println!("{}", "NO2 forecast".cyan().bold());
            println!();
            if rows.is_empty() {
                println!("{}", "No forecast rows returned".yellow());
            } else {
                println!("{}", records_table(&rows));
            }
        }

        Commands::Activity {
            age,
            time_of_day,
            aqi,
            temperature,
            precipitation,
        } => {
            let result = gateway
                .get(
                    "/api/activity/recommend",
                    &[
                        ("age", age.as_str()),
                        ("time_of_day", time_of_day.as_str()),
                        ("aqi", aqi.as_str()),
                        ("temperature", temperature.as_str()),
                        ("precipitation", precipitation.as_str()),
                    ],
                )
                .await?;
            print_recommendation(&result);
        }

        Commands::ActivityV2(args) => {
            let result = gateway
                .get("/api/activity/v2/recommend", &args.query())
                .await?;
            print_recommendation(&result);
        }

        Commands::Regression => {
            println!("{}", "Running regression (this can take a while)...".cyan());
            let result = gateway.get("/api/aqiRegress/regression", &[]).await?;

            println!(
                "{} {}",
                "Best model:".bold(),
                scalar(&result["best_model"]).green().bold()
            );
            println!();

            let mut builder = Builder::default();
            builder.push_record(["model", "R2", "RMSE", "MAE"]);
            if let Some(models) = result["model_performance"].as_object() {
                for (name, scores) in models {
                    builder.push_record([
                        name.clone(),
                        scalar(&scores["R2"]),
                        scalar(&scores["RMSE"]),
                        scalar(&scores["MAE"]),
                    ]);
                }
            }
            println!("{}", builder.build());
            println!();
            println!("{}", "AQI category distribution".bold());
            println!("{}", fields_table(&result["aqi_category_distribution"]));
            println!();
            println!("{}", "Plots".bold());
            println!("{}", fields_table(&result["plots"]));
        }

        Commands::Newsfeed => {
            let result = gateway.get("/api/newsfeed", &[]).await?;
            let articles = result["articles"].as_array().cloned().unwrap_or_default();

            if articles.is_empty() {
                println!("{}", "No articles found".yellow());
            }
            for article in &articles {
                println!("{}", scalar(&article["clickbait_headline"]).bold());
                println!("  {} {}", "Source:".dimmed(), scalar(&article["original_title"]));
                println!("  {} {}", "Sentiment:".dimmed(), scalar(&article["sentiment"]));
                println!("  {}", scalar(&article["summary"]));
                println!("  {}", scalar(&article["link"]).blue());
                println!();
            }
        }

        Commands::Chat { message } => {
            let result = gateway
                .post("/api/chat", json!({ "message": message }))
                .await?;
            println!("{}", scalar(&result["reply"]));
        }

        Commands::Health => match gateway.get("/health", &[]).await {
            Ok(value) => {
                let health: HealthResult = serde_json::from_value(value)?;
                println!("  {} {}", "API URL:".bold(), cli.api_url);
                println!("  {} {}", "Status:".bold(), "ONLINE".green());
                println!();
                println!("{}", Table::new(vec![health]));
            }
            Err(e) => {
                println!("  {} {}", "Status:".bold(), "ERROR".red());
                println!("  {} {}", "Error:".bold(), e);
                std::process::exit(1);
            }
        },
    }

    Ok(())
}

fn print_recommendation(result: &Value) {
    println!(
        "{} {}",
        "Recommended activity:".cyan().bold(),
        scalar(&result["recommended_activity"]).green().bold()
    );
    println!();
    println!("{}", fields_table(&result["user_input"]));
}
