//! Canned responses for development and as a provider fallback.

use std::time::Duration;

use tonepro_common::ToneAnalysis;

/// Delay the extension uses before answering from the table.
pub const MOCK_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone)]
pub struct MockAnalyzer {
    delay: Duration,
}

impl Default for MockAnalyzer {
    fn default() -> Self {
        Self::new(MOCK_DELAY)
    }
}

impl MockAnalyzer {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// Look `text` up in the table. Exact match only; anything else is clean.
    pub fn respond(&self, text: &str) -> ToneAnalysis {
        match text {
            "I need this done immediately!" => ToneAnalysis {
                has_issues: true,
                issues: vec!["Demanding tone".into(), "Lacks politeness".into()],
                suggestion:
                    "I would appreciate if this could be completed at your earliest convenience."
                        .into(),
                explanation: "Replaced demanding language with polite request".into(),
            },
            "You're wrong about this." => ToneAnalysis {
                has_issues: true,
                issues: vec!["Direct contradiction".into(), "Dismissive tone".into()],
                suggestion:
                    "I have a different perspective on this matter. Could we discuss the details?"
                        .into(),
                explanation: "Transformed direct contradiction into collaborative discussion"
                    .into(),
            },
            _ => ToneAnalysis::clean(text),
        }
    }

    pub async fn analyze(&self, text: &str) -> ToneAnalysis {
        if !self.delay.is_zero() {
            n0_future::time::sleep(self.delay).await;
        }
        self.respond(text)
    }
}
