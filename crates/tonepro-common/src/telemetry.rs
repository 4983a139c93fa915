//! Tracing setup for the extension's entry points.
//!
//! In the browser, logs go to the devtools console through `tracing-wasm`
//! and are also captured by [`LogCaptureLayer`]. Native builds (tests and
//! diagnostics) use a compact `fmt` layer behind an env filter when the
//! `telemetry` feature is enabled.

use tracing::Level;

use crate::log_buffer::LogCaptureLayer;

/// Console log level: DEBUG in debug builds, INFO otherwise.
pub fn console_level() -> Level {
    if cfg!(debug_assertions) {
        Level::DEBUG
    } else {
        Level::INFO
    }
}

/// Install the panic hook and the global subscriber for a wasm entry point.
///
/// Safe to call more than once; later calls leave the first subscriber in place.
#[cfg(all(target_family = "wasm", target_os = "unknown"))]
pub fn init(context: &str) {
    use tracing::subscriber::set_global_default;
    use tracing_subscriber::Registry;
    use tracing_subscriber::layer::SubscriberExt;

    console_error_panic_hook::set_once();

    let wasm_layer = tracing_wasm::WASMLayer::new(
        tracing_wasm::WASMLayerConfigBuilder::new()
            .set_max_level(console_level())
            .build(),
    );

    let reg = Registry::default().with(wasm_layer).with(LogCaptureLayer);

    if set_global_default(reg).is_ok() {
        tracing::debug!(context, "tracing initialized");
    }
}

/// Install a console subscriber for native builds.
#[cfg(all(
    feature = "telemetry",
    not(all(target_family = "wasm", target_os = "unknown"))
))]
pub fn init(context: &str) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::{EnvFilter, Layer};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(console_level().as_str().to_lowercase()));

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .with_filter(env_filter);

    if tracing_subscriber::registry()
        .with(console_layer)
        .with(LogCaptureLayer)
        .try_init()
        .is_ok()
    {
        tracing::debug!(context, "tracing initialized");
    }
}

/// Without the `telemetry` feature native builds only capture to the ring buffer.
#[cfg(all(
    not(feature = "telemetry"),
    not(all(target_family = "wasm", target_os = "unknown"))
))]
pub fn init(context: &str) {
    use tracing_subscriber::layer::SubscriberExt;

    let reg = tracing_subscriber::registry().with(LogCaptureLayer);
    if tracing::subscriber::set_global_default(reg).is_ok() {
        tracing::debug!(context, "tracing initialized");
    }
}
