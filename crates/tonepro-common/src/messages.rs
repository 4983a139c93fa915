//! Message contract between the page controller and the background dispatcher.
//!
//! The wire shapes match what `chrome.runtime.sendMessage` carries:
//! `{action: "analyzeTone", text}` going out and `{success, data?, error?}`
//! coming back. [`AnalysisResult`] is the in-process form the controller
//! consumes.

use serde::{Deserialize, Serialize};

/// Action name for tone analysis requests.
pub const ANALYZE_TONE: &str = "analyzeTone";

/// Requests accepted by the background dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum RuntimeRequest {
    /// Analyze `text` for tone issues.
    #[serde(rename = "analyzeTone")]
    AnalyzeTone { text: String },
}

impl RuntimeRequest {
    pub fn analyze(text: impl Into<String>) -> Self {
        RuntimeRequest::AnalyzeTone { text: text.into() }
    }
}

/// Action name for the background worker's captured logs.
pub const GET_LOGS: &str = "getLogs";

/// Request for the worker's log buffer, sent by the popup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum DiagnosticsRequest {
    #[serde(rename = "getLogs")]
    GetLogs,
}

/// Reply to [`DiagnosticsRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogsReply {
    pub logs: String,
}

/// Tone critique as produced by the language model (or the canned table).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToneAnalysis {
    pub has_issues: bool,
    #[serde(default)]
    pub issues: Vec<String>,
    #[serde(default)]
    pub suggestion: String,
    #[serde(default)]
    pub explanation: String,
}

impl ToneAnalysis {
    /// Analysis for text that needs no changes.
    pub fn clean(text: impl Into<String>) -> Self {
        Self {
            has_issues: false,
            issues: Vec::new(),
            suggestion: text.into(),
            explanation: "Text appears professional".to_string(),
        }
    }
}

/// Dispatcher reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<ToneAnalysis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RuntimeResponse {
    pub fn ok(data: ToneAnalysis) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }

    /// Collapse the reply into the result the controller consumes.
    pub fn into_result(self) -> AnalysisResult {
        match (self.success, self.data) {
            (true, Some(data)) => AnalysisResult::from(data),
            (true, None) => AnalysisResult::failed("response carried no analysis"),
            (false, _) => {
                AnalysisResult::failed(self.error.unwrap_or_else(|| "unknown error".to_string()))
            }
        }
    }
}

/// Suggested rewrite shown in the overlay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub issues: Vec<String>,
    pub suggestion: String,
    pub explanation: String,
}

/// Outcome of one analysis request. Consumed exactly once by the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisResult {
    /// No tone issues.
    Clean,
    /// Issues found, with a replacement.
    Issues(Suggestion),
    /// Gateway, transport or parse failure.
    Failed { reason: String },
}

impl AnalysisResult {
    pub fn failed(reason: impl Into<String>) -> Self {
        AnalysisResult::Failed {
            reason: reason.into(),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, AnalysisResult::Failed { .. })
    }
}

impl From<ToneAnalysis> for AnalysisResult {
    fn from(analysis: ToneAnalysis) -> Self {
        if !analysis.has_issues {
            return AnalysisResult::Clean;
        }
        // A rewrite is the whole point of the overlay; without one there is
        // nothing to accept.
        if analysis.suggestion.trim().is_empty() {
            return AnalysisResult::failed("analysis flagged issues without a suggestion");
        }
        AnalysisResult::Issues(Suggestion {
            issues: analysis.issues,
            suggestion: analysis.suggestion,
            explanation: analysis.explanation,
        })
    }
}
