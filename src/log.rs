// This is a wrapper implementation for logging to any log command will have time measured by profiler

#[cfg(feature = "log")]
use std::sync::Once;

#[macro_export]
macro_rules! profiled_log {
    ($a:ident, $($b:tt)*) => {
        {
            profiler::scope!(concat!(stringify!($a), "!(", stringify!($($b)*), ")"));
            #[cfg(feature = "log")]
            ::log::$a!($($b)*);
            // never called, keeps the arguments used
            #[cfg(not(feature = "log"))]
            let _ = || ::std::format!($($b)*);
        }
    };
}

#[macro_export(local_inner_macros)]
macro_rules! trace {
    ($($a:tt)*) => { profiled_log!(trace, $($a)*); };
}

#[macro_export(local_inner_macros)]
macro_rules! debug {
    ($($a:tt)*) => { profiled_log!(debug, $($a)*); };
}

#[macro_export(local_inner_macros)]
macro_rules! info {
    ($($a:tt)*) => { profiled_log!(info, $($a)*); };
}

#[macro_export(local_inner_macros)]
macro_rules! warn {
    ($($a:tt)*) => { profiled_log!(warn, $($a)*); };
}

#[macro_export(local_inner_macros)]
macro_rules! error {
    ($($a:tt)*) => { profiled_log!(error, $($a)*); };
}

#[cfg(feature = "log")]
static INIT: Once = Once::new();

/// Initializes `env_logger` once.
/// - `filter` uses `env_logger` filter syntax (e.g. "info" or "volume_bridge=debug,wgpu=warn").
/// - Without `filter` the `RUST_LOG` variable is used, falling back to `info` for this crate and `warn` for wgpu.
#[cfg(feature = "log")]
pub fn init_logging(filter: Option<&str>) {
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();
        match (filter, std::env::var("RUST_LOG")) {
            (Some(filter), _) => { builder.parse_filters(filter); },
            (None, Ok(filter)) => { builder.parse_filters(&filter); },
            (None, Err(_)) => {
                builder
                    .filter_level(::log::LevelFilter::Warn)
                    .filter_module("volume_bridge", ::log::LevelFilter::Info);
            },
        }
        // tests may have installed a logger already
        let _ = builder.try_init();
    });
}

/// Logging is compiled out without the `log` feature.
#[cfg(not(feature = "log"))]
pub fn init_logging(_filter: Option<&str>) {}
