//! Parsing model output into a [`ToneAnalysis`].
//!
//! Models are asked for bare JSON but routinely wrap it in a code fence or
//! a sentence of prose. We strip fences, then take everything from the first
//! `{` to the last `}` before handing it to serde.

use tonepro_common::{ToneAnalysis, ToneError};

pub fn parse_ai_response(content: &str) -> Result<ToneAnalysis, ToneError> {
    let unfenced = content.replace("```json", "").replace("```", "");
    let trimmed = unfenced.trim();

    let candidate = match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if end > start => &trimmed[start..=end],
        _ => trimmed,
    };

    serde_json::from_str(candidate).map_err(|e| {
        tracing::warn!(target: "tonepro::gateway", error = %e, content = candidate, "unparseable model output");
        ToneError::GatewayBadResponse(format!("invalid JSON response from AI: {e}"))
    })
}
