//! Shared pieces of the tone extension: the error taxonomy, persisted
//! settings, the runtime message contract and logging setup.
//!
//! Every other crate in the workspace depends on this one; it has no
//! browser dependencies of its own outside of the wasm telemetry init.

pub mod error;
pub mod log_buffer;
pub mod messages;
pub mod settings;
pub mod telemetry;

pub use crate::error::ToneError;
pub use crate::log_buffer::{LogCaptureLayer, LogEntry, clear_logs, get_logs, recent};
pub use crate::messages::{
    ANALYZE_TONE, AnalysisResult, DiagnosticsRequest, GET_LOGS, LogsReply, RuntimeRequest,
    RuntimeResponse, Suggestion, ToneAnalysis,
};
pub use crate::settings::{MemoryStore, Provider, Settings, SettingsLoader, SettingsSaver};
