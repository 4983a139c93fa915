//! tonepro-gateway: the privileged side of tone analysis.
//!
//! The page controller never talks to a language model directly. It sends
//! `{action: "analyzeTone", text}` to the background [`Dispatcher`], which
//! reads the settings, picks the canned table or a chat-completions
//! provider, and answers `{success, data}` or `{success: false, error}`.

pub mod api;
pub mod dispatcher;
pub mod mock;
pub mod parser;
pub mod prompt;
pub mod provider;

pub use dispatcher::{Dispatcher, Endpoints};
pub use mock::{MOCK_DELAY, MockAnalyzer};
pub use parser::parse_ai_response;
pub use prompt::{PROBE_TEXT, SYSTEM_PROMPT};
pub use provider::ChatCompletionProvider;
