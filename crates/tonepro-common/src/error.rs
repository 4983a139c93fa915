//! Error types for the tone extension.
//!
//! None of these are fatal to the page controller: each one ends up as
//! "no suggestion available" plus a transient notification.

use miette::Diagnostic;

/// Main error type shared by the gateway, the settings store and the hosts.
#[derive(thiserror::Error, Debug, Diagnostic)]
pub enum ToneError {
    /// Transport failure or non-success status from the provider.
    #[error("analysis gateway unreachable: {0}")]
    #[diagnostic(
        code(tonepro::gateway::unreachable),
        help("check the network connection and the configured API key")
    )]
    GatewayUnreachable(String),

    /// The provider answered, but not with something we can use.
    #[error("analysis gateway returned a malformed response: {0}")]
    #[diagnostic(code(tonepro::gateway::bad_response))]
    GatewayBadResponse(String),

    /// Settings store read or write failed.
    #[error("settings storage unavailable: {0}")]
    #[diagnostic(code(tonepro::settings::unavailable))]
    SettingsUnavailable(String),

    /// Serialization/deserialization error
    #[error(transparent)]
    #[diagnostic(code(tonepro::serde))]
    Serde(#[from] serde_json::Error),
}

impl ToneError {
    /// Short text suitable for a toast. Keeps provider payloads out of the page.
    pub fn user_message(&self) -> &'static str {
        match self {
            ToneError::GatewayUnreachable(_) => "Tone check unavailable: could not reach the service",
            ToneError::GatewayBadResponse(_) | ToneError::Serde(_) => {
                "Tone check unavailable: unexpected response"
            }
            ToneError::SettingsUnavailable(_) => "Could not access extension settings",
        }
    }
}
