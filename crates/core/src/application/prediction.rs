// Prediction Use Case
// Validating -> Invoking -> Extracting -> Responding, with Failed absorbing

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::domain::{Capability, DomainError, InvocationRequest, Payload, QueryParams};
use crate::error::Result;
use crate::port::{IdProvider, ModelInvoker, TimeProvider};

/// Prediction service options
#[derive(Debug, Clone)]
pub struct PredictionOptions {
    /// Check payloads against the capability's declared result schema
    pub validate_results: bool,
}

impl Default for PredictionOptions {
    fn default() -> Self {
        Self {
            validate_results: true,
        }
    }
}

/// Prediction Service
///
/// Each call is independent: no retries, no shared mutable state.
pub struct PredictionService {
    invoker: Arc<dyn ModelInvoker>,
    id_provider: Arc<dyn IdProvider>,
    time_provider: Arc<dyn TimeProvider>,
    options: PredictionOptions,
}

impl PredictionService {
    pub fn new(
        invoker: Arc<dyn ModelInvoker>,
        id_provider: Arc<dyn IdProvider>,
        time_provider: Arc<dyn TimeProvider>,
        options: PredictionOptions,
    ) -> Self {
        Self {
            invoker,
            id_provider,
            time_provider,
            options,
        }
    }

    /// Run one prediction for `capability` with the caller's query parameters
    ///
    /// # Errors
    /// - `AppError::Domain(MissingParameters)` before anything is invoked
    /// - `AppError::Invocation` if the invoker fails (spawn, exit, timeout, extraction)
    /// - `AppError::Domain(SchemaViolation)` if result validation is on and fails
    pub async fn predict(&self, capability: Capability, params: &QueryParams) -> Result<Payload> {
        let invocation_id = self.id_provider.generate_id();

        let request = match InvocationRequest::from_params(capability, params) {
            Ok(request) => request,
            Err(e) => {
                warn!(
                    invocation_id = %invocation_id,
                    capability = %capability,
                    error = %e,
                    "Rejected prediction request"
                );
                return Err(e.into());
            }
        };

        let start = self.time_provider.now_millis();
        info!(
            invocation_id = %invocation_id,
            capability = %capability,
            args = ?request.args(),
            "Invoking model"
        );

        let payload = match self.invoker.invoke(&request).await {
            Ok(payload) => payload,
            Err(e) => {
                error!(
                    invocation_id = %invocation_id,
                    capability = %capability,
                    duration_ms = self.time_provider.elapsed_since(start),
                    error = %e,
                    "Model invocation failed"
                );
                return Err(e.into());
            }
        };

        if self.options.validate_results {
            if let Err(violation) = capability.result_schema().check(payload.as_value()) {
                let err = DomainError::SchemaViolation {
                    capability: capability.id().to_string(),
                    field: violation.field,
                    expected: violation.expected,
                };
                error!(
                    invocation_id = %invocation_id,
                    capability = %capability,
                    error = %err,
                    "Model result rejected"
                );
                return Err(err.into());
            }
        }

        info!(
            invocation_id = %invocation_id,
            capability = %capability,
            duration_ms = self.time_provider.elapsed_since(start),
            "Prediction completed"
        );

        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::port::id_provider::SequentialIdProvider;
    use crate::port::model_invoker::mocks::{MockBehavior, MockModelInvoker};
    use crate::port::time_provider::SystemTimeProvider;
    use crate::port::InvocationError;
    use serde_json::json;

    fn service(invoker: Arc<MockModelInvoker>, validate_results: bool) -> PredictionService {
        PredictionService::new(
            invoker,
            Arc::new(SequentialIdProvider::default()),
            Arc::new(SystemTimeProvider),
            PredictionOptions { validate_results },
        )
    }

    fn aqi_params() -> QueryParams {
        [
            ("temperature", "70"),
            ("humidity", "30"),
            ("wind_speed", "10"),
            ("precipitation", "0"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[tokio::test]
    async fn test_predict_returns_payload_verbatim() {
        let body = json!({"aqi_pm25": 42, "category": "Good", "predicted_pm25": 10.5});
        let invoker = Arc::new(MockModelInvoker::new_respond(body.clone()));
        let service = service(invoker.clone(), true);

        let payload = service
            .predict(Capability::AirQuality, &aqi_params())
            .await
            .unwrap();

        assert_eq!(payload.into_value(), body);
        let requests = invoker.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].args(), ["70", "30", "10", "0"]);
    }

    #[tokio::test]
    async fn test_missing_parameter_never_invokes() {
        let invoker = Arc::new(MockModelInvoker::new_respond(json!({})));
        let service = service(invoker.clone(), true);

        for name in ["temperature", "humidity", "wind_speed", "precipitation"] {
            let mut params = aqi_params();
            params.remove(name);

            let err = service
                .predict(Capability::AirQuality, &params)
                .await
                .unwrap_err();

            assert!(err.is_client_error());
            assert!(err.to_string().contains(name));
        }

        assert_eq!(invoker.call_count(), 0);
    }

    #[tokio::test]
    async fn test_invocation_failure_is_server_error() {
        let invoker = Arc::new(MockModelInvoker::new(MockBehavior::Exit(1)));
        let service = service(invoker, true);

        let err = service
            .predict(Capability::AirQuality, &aqi_params())
            .await
            .unwrap_err();

        assert!(!err.is_client_error());
        assert!(matches!(
            err,
            AppError::Invocation(InvocationError::NonZeroExit { code: Some(1), .. })
        ));
    }

    #[tokio::test]
    async fn test_schema_violation_is_rejected() {
        let usage = json!({"message": "Please provide 5 parameters: age, time_of_day, aqi, temperature, precipitation"});
        let invoker = Arc::new(MockModelInvoker::new_respond(usage));
        let service = service(invoker, true);

        let err = service
            .predict(Capability::Newsfeed, &QueryParams::new())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            AppError::Domain(DomainError::SchemaViolation { ref field, .. }) if field == "articles"
        ));
    }

    #[tokio::test]
    async fn test_schema_check_can_be_disabled() {
        let invoker = Arc::new(MockModelInvoker::new_respond(json!({"anything": true})));
        let service = service(invoker, false);

        let payload = service
            .predict(Capability::Regression, &QueryParams::new())
            .await
            .unwrap();

        assert_eq!(payload.as_value(), &json!({"anything": true}));
    }
}
