use cfg_if::cfg_if;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{layer::SubscriberExt, EnvFilter};

/// Filter used when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "info";

fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

cfg_if! {
    if #[cfg(target_arch = "wasm32")] {
        pub fn init() {
            init_with_filter(DEFAULT_FILTER);
        }

        /// Browser console logging through tracing-wasm
        pub fn init_with_filter(default: &str) {
            let wasm_layer = tracing_wasm::WASMLayer::new(tracing_wasm::WASMLayerConfig::default());

            // a second start() on page reload keeps the first subscriber
            let _ = tracing_subscriber::registry()
                .with(env_filter(default))
                .with(wasm_layer)
                .try_init();

            #[cfg(feature = "console_error_panic_hook")]
            console_error_panic_hook::set_once();
        }
    } else {
        use std::io;
        use std::path::Path;

        use once_cell::sync::OnceCell;
        use tracing_appender::non_blocking::WorkerGuard;
        use tracing_subscriber::fmt;

        static FILE_GUARD: OnceCell<WorkerGuard> = OnceCell::new();

        pub fn init() {
            init_with_filter(DEFAULT_FILTER);
        }

        /// stderr plus a daily rolling file at `RUST_LOG_FILE` (default `logs/app.log`)
        pub fn init_with_filter(default: &str) {
            let console_layer = fmt::layer()
                .with_writer(io::stderr)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .compact();

            let log_path = std::env::var("RUST_LOG_FILE").unwrap_or_else(|_| "logs/app.log".to_string());
            let (dir, file) = split_log_path(&log_path);
            let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, file));
            let _ = FILE_GUARD.set(guard);

            let file_layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .compact();

            if tracing_subscriber::registry()
                .with(env_filter(default))
                .with(console_layer)
                .with(file_layer)
                .try_init()
                .is_err()
            {
                return;
            }

            std::panic::set_hook(Box::new(|info| {
                let location = info
                    .location()
                    .map(|loc| format!("{}:{}:{}", loc.file(), loc.line(), loc.column()))
                    .unwrap_or_else(|| "<unknown>".to_string());
                let backtrace = std::backtrace::Backtrace::force_capture();
                tracing::error!(%location, "panic: {}\nBacktrace:\n{:?}", panic_message(info.payload()), backtrace);
            }));
        }

        fn split_log_path(path: &str) -> (&Path, &std::ffi::OsStr) {
            let path = Path::new(path);
            let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
            let file = path.file_name().unwrap_or(std::ffi::OsStr::new("app.log"));
            (dir, file)
        }

        fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
            if let Some(s) = payload.downcast_ref::<&str>() {
                s
            } else if let Some(s) = payload.downcast_ref::<String>() {
                s
            } else {
                "<non-string panic>"
            }
        }

    }
}
