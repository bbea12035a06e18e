//! Call-site capture and leveled logging macros.
//!
//! The logger methods already record the file and line of their caller
//! through `#[track_caller]`; these macros add the enclosing function name,
//! which only a macro expansion can see.

/// Expands to a [`CallSite`](crate::CallSite) describing the current file,
/// enclosing function and line.
#[macro_export]
macro_rules! callsite {
    () => {{
        fn __here() {}
        fn __type_name_of<T>(_: T) -> &'static str {
            ::std::any::type_name::<T>()
        }
        $crate::CallSite::new(
            file!(),
            $crate::record::enclosing_function(__type_name_of(__here)),
            line!(),
        )
    }};
}

/// Logs a formatted message at the given level, with the full call site.
///
/// ```ignore
/// viewer_log!(logger, LogLevel::Warning, "retrying {} in {}s", job, delay);
/// ```
#[macro_export]
macro_rules! viewer_log {
    ($logger:expr, $lvl:expr, $($arg:tt)*) => {{
        $logger.log(
            format!($($arg)*),
            $lvl,
            $crate::LogOptions::new().callsite($crate::callsite!()),
        );
    }};
}

#[macro_export]
macro_rules! viewer_info {
    ($logger:expr, $($arg:tt)*) => { $crate::viewer_log!($logger, $crate::LogLevel::Info, $($arg)*) };
}

#[macro_export]
macro_rules! viewer_warn {
    ($logger:expr, $($arg:tt)*) => { $crate::viewer_log!($logger, $crate::LogLevel::Warning, $($arg)*) };
}

#[macro_export]
macro_rules! viewer_error {
    ($logger:expr, $($arg:tt)*) => { $crate::viewer_log!($logger, $crate::LogLevel::Error, $($arg)*) };
}

#[cfg(test)]
mod tests {
    use crate::logger::test_support::{test_config, FakeFactory};
    use crate::{CallSite, LogLevel, Logger};

    #[test]
    fn test_callsite_names_enclosing_function() {
        let site: CallSite = callsite!();
        assert_eq!(site.function(), "test_callsite_names_enclosing_function");
        assert!(site.file().ends_with("macros.rs"));
        assert!(site
            .to_string()
            .starts_with("macros.rs:test_callsite_names_enclosing_function:"));
    }

    #[test]
    fn test_viewer_macros_format_and_locate() {
        let factory = FakeFactory::new();
        let logger = Logger::with_factory(test_config(), factory.clone());
        assert!(logger.initialize());

        viewer_warn!(logger, "retrying {} in {}s", "upload", 5);

        let sent = factory.channel().unwrap().sent_records();
        let record = sent.last().unwrap();
        assert_eq!(record.message(), "retrying upload in 5s");
        assert_eq!(record.level(), LogLevel::Warning);
        assert!(record
            .location()
            .starts_with("macros.rs:test_viewer_macros_format_and_locate:"));
    }
}
