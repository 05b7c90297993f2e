// Capability Domain Model
// One capability per prediction script exposed through the gateway

use serde::{Deserialize, Serialize};

use super::schema::{FieldKind, FieldSpec, ResultSchema};

/// Presence rule for a query parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// Must be present and non-empty, otherwise the request is rejected
    Required,
    /// Part of the optional group; forwarded only when the whole group is present
    Optional,
}

/// Named query parameter mapped to one positional script argument
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub presence: Presence,
}

const fn required(name: &'static str) -> ParamSpec {
    ParamSpec {
        name,
        presence: Presence::Required,
    }
}

const fn optional(name: &'static str) -> ParamSpec {
    ParamSpec {
        name,
        presence: Presence::Optional,
    }
}

const AIR_QUALITY_PARAMS: &[ParamSpec] = &[
    required("temperature"),
    required("humidity"),
    required("wind_speed"),
    required("precipitation"),
];

const FORECAST_PARAMS: &[ParamSpec] = &[optional("forecast_start"), optional("forecast_end")];

const ACTIVITY_PARAMS: &[ParamSpec] = &[
    required("age"),
    required("time_of_day"),
    required("aqi"),
    required("temperature"),
    required("precipitation"),
];

const ACTIVITY_V2_PARAMS: &[ParamSpec] = &[
    required("age"),
    required("gender"),
    required("health_condition"),
    required("activity_level"),
    required("preference"),
    required("temperature"),
    required("humidity"),
    required("wind_speed"),
    required("air_quality_index"),
    required("crime_rate"),
    required("traffic_congestion_index"),
    required("community_event"),
    required("health_advisory"),
];

const AIR_QUALITY_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("predicted_pm25", FieldKind::Number),
    FieldSpec::new("aqi_pm25", FieldKind::Number),
    FieldSpec::new("category", FieldKind::String),
];

const FORECAST_FIELDS: &[FieldSpec] = &[FieldSpec::new("forecast", FieldKind::Array)];

const RECOMMENDATION_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("user_input", FieldKind::Object),
    FieldSpec::new("recommended_activity", FieldKind::String),
];

const REGRESSION_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("model_performance", FieldKind::Object),
    FieldSpec::new("best_model", FieldKind::String),
    FieldSpec::new("aqi_category_distribution", FieldKind::Object),
    FieldSpec::new("plots", FieldKind::Object),
];

const NEWSFEED_FIELDS: &[FieldSpec] = &[FieldSpec::new("articles", FieldKind::Array)];

static AIR_QUALITY_SCHEMA: ResultSchema = ResultSchema::new(AIR_QUALITY_FIELDS);
static FORECAST_SCHEMA: ResultSchema = ResultSchema::new(FORECAST_FIELDS);
static RECOMMENDATION_SCHEMA: ResultSchema = ResultSchema::new(RECOMMENDATION_FIELDS);
static REGRESSION_SCHEMA: ResultSchema = ResultSchema::new(REGRESSION_FIELDS);
static NEWSFEED_SCHEMA: ResultSchema = ResultSchema::new(NEWSFEED_FIELDS);

/// Prediction capability backed by an external script
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    #[serde(rename = "aqi_prediction")]
    AirQuality,
    #[serde(rename = "aqi_forecast")]
    Forecast,
    ActivityRecommendation,
    ActivityRecommendationV2,
    #[serde(rename = "aqi_regression")]
    Regression,
    Newsfeed,
}

impl Capability {
    pub const ALL: [Capability; 6] = [
        Capability::AirQuality,
        Capability::Forecast,
        Capability::ActivityRecommendation,
        Capability::ActivityRecommendationV2,
        Capability::Regression,
        Capability::Newsfeed,
    ];

    /// Stable identifier used in configuration, logs and the HTTP invoker path
    pub fn id(&self) -> &'static str {
        match self {
            Capability::AirQuality => "aqi_prediction",
            Capability::Forecast => "aqi_forecast",
            Capability::ActivityRecommendation => "activity_recommendation",
            Capability::ActivityRecommendationV2 => "activity_recommendation_v2",
            Capability::Regression => "aqi_regression",
            Capability::Newsfeed => "newsfeed",
        }
    }

    /// Look up a capability by its identifier
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.id() == id)
    }

    /// Script file name, relative to the configured script directory
    pub fn default_script(&self) -> &'static str {
        match self {
            Capability::AirQuality => "aqi_prediction.py",
            Capability::Forecast => "capstone_airquality.py",
            Capability::ActivityRecommendation => "activity_recommender.py",
            Capability::ActivityRecommendationV2 => "activityrecommendationv2.py",
            Capability::Regression => "airquality_regression.py",
            Capability::Newsfeed => "newsfeed.py",
        }
    }

    /// Query parameters in positional-argument order
    pub fn params(&self) -> &'static [ParamSpec] {
        match self {
            Capability::AirQuality => AIR_QUALITY_PARAMS,
            Capability::Forecast => FORECAST_PARAMS,
            Capability::ActivityRecommendation => ACTIVITY_PARAMS,
            Capability::ActivityRecommendationV2 => ACTIVITY_V2_PARAMS,
            Capability::Regression | Capability::Newsfeed => &[],
        }
    }

    /// Generic message returned to callers when an invocation fails
    pub fn failure_message(&self) -> &'static str {
        match self {
            Capability::AirQuality => "Failed to process request.",
            Capability::Forecast => "Failed to process prediction request.",
            Capability::ActivityRecommendation | Capability::ActivityRecommendationV2 => {
                "Failed to process recommendation request."
            }
            Capability::Regression => "Failed to process regression request.",
            Capability::Newsfeed => "Failed to fetch newsfeed data.",
        }
    }

    /// Declared shape of the script's result
    pub fn result_schema(&self) -> &'static ResultSchema {
        match self {
            Capability::AirQuality => &AIR_QUALITY_SCHEMA,
            Capability::Forecast => &FORECAST_SCHEMA,
            Capability::ActivityRecommendation | Capability::ActivityRecommendationV2 => {
                &RECOMMENDATION_SCHEMA
            }
            Capability::Regression => &REGRESSION_SCHEMA,
            Capability::Newsfeed => &NEWSFEED_SCHEMA,
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}
