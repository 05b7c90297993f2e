// Invocation Domain Model
// Validated, positional request for one script invocation

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::capability::{Capability, Presence};
use super::error::{DomainError, Result};

/// Query parameters as received from the caller
pub type QueryParams = HashMap<String, String>;

/// Invocation request: capability plus positional arguments in contract order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationRequest {
    capability: Capability,
    args: Vec<String>,
}

impl InvocationRequest {
    /// Validate query parameters and map them to the capability's positional contract
    ///
    /// # Errors
    /// - `DomainError::MissingParameters` naming every required parameter that is
    ///   absent or blank, in declared order
    pub fn from_params(capability: Capability, params: &QueryParams) -> Result<Self> {
        let value_of = |name: &str| {
            params
                .get(name)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
        };

        let missing: Vec<String> = capability
            .params()
            .iter()
            .filter(|p| p.presence == Presence::Required && value_of(p.name).is_none())
            .map(|p| p.name.to_string())
            .collect();

        if !missing.is_empty() {
            return Err(DomainError::MissingParameters(missing));
        }

        let mut args: Vec<String> = capability
            .params()
            .iter()
            .filter(|p| p.presence == Presence::Required)
            .filter_map(|p| value_of(p.name).map(str::to_string))
            .collect();

        // The optional group is forwarded whole or not at all
        let optional: Vec<Option<&str>> = capability
            .params()
            .iter()
            .filter(|p| p.presence == Presence::Optional)
            .map(|p| value_of(p.name))
            .collect();

        if !optional.is_empty() && optional.iter().all(Option::is_some) {
            args.extend(optional.into_iter().flatten().map(str::to_string));
        }

        Ok(Self { capability, args })
    }

    pub fn capability(&self) -> Capability {
        self.capability
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}
