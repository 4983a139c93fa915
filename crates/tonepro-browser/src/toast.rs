//! Transient page notifications.

use gloo_timers::callback::Timeout;
use tonepro_core::{Notice, NoticeLevel, PlatformError};

use crate::dom;

pub fn level_class(level: NoticeLevel) -> &'static str {
    match level {
        NoticeLevel::Info => "tone-toast info",
        NoticeLevel::Success => "tone-toast success",
        NoticeLevel::Error => "tone-toast error",
    }
}

/// Show `notice` in the page and remove it after its ttl.
pub fn show(notice: &Notice) -> Result<(), PlatformError> {
    let toast = dom::create_text("div", level_class(notice.level), &notice.message)?;
    toast
        .set_attribute("role", "status")
        .map_err(|e| format!("set_attribute failed: {:?}", e))?;
    dom::set_style(&toast, "position", "fixed");
    dom::set_style(&toast, "right", "16px");
    dom::set_style(&toast, "bottom", "16px");
    dom::set_style(&toast, "z-index", "2147483647");
    dom::body()?
        .append_child(&toast)
        .map_err(|e| format!("append_child failed: {:?}", e))?;

    let ttl = u32::try_from(notice.ttl.as_millis()).unwrap_or(u32::MAX);
    Timeout::new(ttl, move || toast.remove()).forget();
    Ok(())
}
