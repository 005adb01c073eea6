// crates/devdesc-rs/src/log.rs

//! Context-prefixed logging macros shared by every crate of the workspace.

use std::fmt;

/// Trait for structs that provide metadata for logging.
pub trait LogMetadata {
    fn meta(&self) -> String;
}

/// Identifies the pipeline component and (optionally) the device a log line
/// belongs to.
#[derive(Debug, Clone, Copy)]
pub struct LogContext<'a> {
    pub component: &'static str,
    pub device: Option<&'a str>,
}

impl<'a> LogContext<'a> {
    pub const fn new(component: &'static str) -> Self {
        Self {
            component,
            device: None,
        }
    }

    pub const fn device(component: &'static str, device: &'a str) -> Self {
        Self {
            component,
            device: Some(device),
        }
    }
}

impl LogMetadata for LogContext<'_> {
    fn meta(&self) -> String {
        match self.device {
            Some(device) => format!("component={}, device={}", self.component, device),
            None => format!("component={}", self.component),
        }
    }
}

impl fmt::Display for LogContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.meta())
    }
}

// =============================================
// Logging Macros
// =============================================

// ===== dd_info! =====
#[macro_export]
macro_rules! dd_info {
    ($ctx:expr, $fmt:literal $(, $($arg:tt)+)?) => {{
        let meta = $crate::log::LogMetadata::meta(&$ctx);
        $crate::__log::info!(concat!("[{}] ", $fmt), meta $(, $($arg)+)?);
    }};
}

// ===== dd_warn! =====
#[macro_export]
macro_rules! dd_warn {
    ($ctx:expr, $fmt:literal $(, $($arg:tt)+)?) => {{
        let meta = $crate::log::LogMetadata::meta(&$ctx);
        $crate::__log::warn!(concat!("[{}] ", $fmt), meta $(, $($arg)+)?);
    }};
}

// ===== dd_error! =====
#[macro_export]
macro_rules! dd_error {
    ($ctx:expr, $fmt:literal $(, $($arg:tt)+)?) => {{
        let meta = $crate::log::LogMetadata::meta(&$ctx);
        $crate::__log::error!(concat!("[{}] ", $fmt), meta $(, $($arg)+)?);
    }};
}

// ===== dd_debug! =====
#[macro_export]
macro_rules! dd_debug {
    ($ctx:expr, $fmt:literal $(, $($arg:tt)+)?) => {{
        let meta = $crate::log::LogMetadata::meta(&$ctx);
        $crate::__log::debug!(concat!("[{}] ", $fmt), meta $(, $($arg)+)?);
    }};
}

// ===== dd_trace! =====
#[macro_export]
macro_rules! dd_trace {
    ($ctx:expr, $fmt:literal $(, $($arg:tt)+)?) => {{
        let meta = $crate::log::LogMetadata::meta(&$ctx);
        $crate::__log::trace!(concat!("[{}] ", $fmt), meta $(, $($arg)+)?);
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meta_with_and_without_device() {
        assert_eq!(LogContext::new("mapper").meta(), "component=mapper");
        assert_eq!(
            LogContext::device("store", "iodd:310:1:1.1").meta(),
            "component=store, device=iodd:310:1:1.1"
        );
    }

    #[test]
    fn test_macros_expand() {
        let _ = env_logger::builder().is_test(true).try_init();
        let ctx = LogContext::device("test", "dev");
        crate::dd_info!(ctx, "value {}", 1);
        crate::dd_debug!(ctx, "plain");
        crate::dd_warn!(ctx, "{} and {}", "a", "b");
    }
}
