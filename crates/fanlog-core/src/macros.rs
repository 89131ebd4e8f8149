//! Logging macros that record the calling function, file and line.
//!
//! Each macro takes an optional engine followed by `format!` arguments:
//!
//! ```
//! use fanlog_core::{Engine, SinkConfig, SinkMask};
//!
//! let engine = Engine::new();
//! engine.change(SinkMask::MEMORY, &SinkConfig::default()).unwrap();
//!
//! let attempts = 3;
//! fanlog_core::warn!(&engine, "retrying after {} attempts", attempts);
//!
//! let held = engine.all();
//! assert_eq!(held[0].message(), Some("retrying after 3 attempts"));
//! assert_eq!(held[0].caller(), Some("main"));
//! ```
//!
//! Without an engine they log through [`global()`](crate::global).

/// Name of the enclosing function, without its module path.
#[doc(hidden)]
#[macro_export]
macro_rules! __function_name {
    () => {{
        fn f() {}
        fn type_name_of<T>(_: T) -> &'static str {
            ::std::any::type_name::<T>()
        }
        let name = type_name_of(f);
        let name = name.strip_suffix("::f").unwrap_or(name);
        let name = name.trim_end_matches("::{{closure}}");
        match name.rfind("::") {
            Some(pos) => &name[pos + 2..],
            None => name,
        }
    }};
}

#[doc(hidden)]
#[macro_export]
macro_rules! __emit {
    ($engine:expr, $severity:expr, $($fmt:tt)+) => {{
        let severity: $crate::Severity = $severity;
        let message = ::std::format!($($fmt)+);
        $crate::Engine::emit(
            $engine,
            severity,
            ::std::option::Option::Some(message.as_str()),
            severity.default_detail(),
            $crate::CallSite::new($crate::__function_name!(), ::std::file!(), ::std::line!()),
        )
    }};
}

/// Log at Debug severity; evaluates to `true` if every sink accepted.
#[macro_export]
macro_rules! debug {
    ($fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::__emit!($crate::global(), $crate::Severity::Debug, $fmt $(, $arg)*)
    };
    ($engine:expr, $fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::__emit!($engine, $crate::Severity::Debug, $fmt $(, $arg)*)
    };
}

/// Log at Info severity; evaluates to `true` if every sink accepted.
#[macro_export]
macro_rules! info {
    ($fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::__emit!($crate::global(), $crate::Severity::Info, $fmt $(, $arg)*)
    };
    ($engine:expr, $fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::__emit!($engine, $crate::Severity::Info, $fmt $(, $arg)*)
    };
}

/// Log at Warn severity; evaluates to `true` if every sink accepted.
#[macro_export]
macro_rules! warn {
    ($fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::__emit!($crate::global(), $crate::Severity::Warn, $fmt $(, $arg)*)
    };
    ($engine:expr, $fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::__emit!($engine, $crate::Severity::Warn, $fmt $(, $arg)*)
    };
}

/// Log at Error severity with call-site detail in the text line.
#[macro_export]
macro_rules! error {
    ($fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::__emit!($crate::global(), $crate::Severity::Error, $fmt $(, $arg)*)
    };
    ($engine:expr, $fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::__emit!($engine, $crate::Severity::Error, $fmt $(, $arg)*)
    };
}

/// Log at Fatal severity with call-site detail in the text line.
#[macro_export]
macro_rules! fatal {
    ($fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::__emit!($crate::global(), $crate::Severity::Fatal, $fmt $(, $arg)*)
    };
    ($engine:expr, $fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::__emit!($engine, $crate::Severity::Fatal, $fmt $(, $arg)*)
    };
}
