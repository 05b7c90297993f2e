// Result Extractor
// Isolates the authoritative result line of a script's stdout and parses it

use crate::domain::{OutputProtocol, Payload};
use crate::port::ExtractionError;

/// Extract the payload from captured stdout
///
/// Scripts may print any number of diagnostic lines; only the line selected by
/// `protocol` is parsed. Earlier candidate lines are ignored even when they hold
/// valid JSON.
///
/// # Errors
/// - `ExtractionError::EmptyOutput` if stdout has no non-blank line
/// - `ExtractionError::MarkerNotFound` if no line carries the marker
/// - `ExtractionError::InvalidJson` if the selected line does not parse
pub fn extract_payload(stdout: &str, protocol: &OutputProtocol) -> Result<Payload, ExtractionError> {
    let candidate = match protocol {
        OutputProtocol::LastLine => stdout
            .lines()
            .rev()
            .find(|line| !line.trim().is_empty())
            .ok_or(ExtractionError::EmptyOutput)?,
        OutputProtocol::Marker(marker) => {
            if stdout.trim().is_empty() {
                return Err(ExtractionError::EmptyOutput);
            }
            stdout
                .lines()
                .rev()
                .find_map(|line| line.trim_start().strip_prefix(marker.as_str()))
                .ok_or_else(|| ExtractionError::MarkerNotFound(marker.clone()))?
        }
    };

    let line = candidate.trim();
    serde_json::from_str(line)
        .map(Payload::new)
        .map_err(|source| ExtractionError::InvalidJson {
            line: line.to_string(),
            source,
        })
}
