//! Query timing lines with a thread-local sink for deterministic tests.
//! Lines go to the `telemetry_gateway::query` log target and, when a sink is
//! enabled on the current thread, are captured for assertions.

use std::cell::RefCell;

pub const QUERY_TARGET: &str = "telemetry_gateway::query";

thread_local! {
    static TL_SINK: RefCell<Option<Vec<String>>> = const { RefCell::new(None) };
}

/// Guard that disables the thread-local sink on drop.
pub struct QuerySinkGuard;
impl Drop for QuerySinkGuard {
    fn drop(&mut self) {
        TL_SINK.with(|s| *s.borrow_mut() = None);
    }
}

/// Enable the sink for the current thread until the guard is dropped.
pub fn enable_thread_sink() -> QuerySinkGuard {
    TL_SINK.with(|s| *s.borrow_mut() = Some(Vec::new()));
    QuerySinkGuard
}

pub fn write_str(msg: &str) {
    TL_SINK.with(|s| {
        if let Some(buf) = s.borrow_mut().as_mut() {
            buf.push(msg.to_owned());
        }
    });
}

/// Drain captured lines. Empty when the sink is disabled.
pub fn drain() -> Vec<String> {
    TL_SINK.with(|s| match s.borrow_mut().as_mut() {
        Some(buf) => std::mem::take(buf),
        None => Vec::new(),
    })
}

pub fn snapshot() -> Vec<String> {
    TL_SINK.with(|s| s.borrow().as_ref().cloned().unwrap_or_default())
}

/// Emit a query timing line.
#[macro_export]
macro_rules! qlog {
    ($($arg:tt)*) => {{
        let __s = format!($($arg)*);
        $crate::utils::devlog::write_str(&__s);
        log::log!(target: $crate::utils::devlog::QUERY_TARGET, log::Level::Debug, "{}", __s);
    }};
}
