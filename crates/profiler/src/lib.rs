//! Scope instrumentation used across the bridge.
//!
//! Without the `stats` feature every macro expands to nothing but the wrapped code.
//! With `stats` each scope records its duration into the global statistic (see `runtime_stats`).

pub use instrumentation_macro::*;

#[cfg(feature = "stats")]
pub use runtime_stats::*;

#[macro_export]
macro_rules! add_file_line {
    ($a:expr) => { concat!($a, " (", file!(), ":", line!() ,")") }
}

#[macro_export]
macro_rules! session_begin {
    ($a:expr) => {
        #[cfg(feature = "stats")]
        profiler::init_statistics($a);
    };
}

#[macro_export(local_inner_macros)]
macro_rules! scope {
    ($a:expr) => {
        #[cfg(feature = "stats")]
        let _stat_guard = profiler::TimedScope::new(add_file_line!($a), false);
    };
    ($a:expr, pinned) => {
        #[cfg(feature = "stats")]
        let _stat_guard = profiler::TimedScope::new(add_file_line!($a), true);
    };
}

#[macro_export]
macro_rules! call {
    ($($a:tt)*) => {
        {
            profiler::scope!(stringify!($($a)*));
            $($a)*
        }
    };
}
