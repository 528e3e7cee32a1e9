use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    /// 給日誌收集器使用
    Json,
}

/// Filter used when `RUST_LOG` is not set.
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "service_dashboard=debug,info"
    } else {
        "service_dashboard=info"
    }
}

fn env_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)))
}

fn base_layer<S>() -> fmt::Layer<S> {
    fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
}

pub fn init_logger(format: LogFormat, verbose: bool) {
    let compact = (format == LogFormat::Compact).then(|| base_layer().compact());
    let json = (format == LogFormat::Json).then(|| base_layer().json());

    tracing_subscriber::registry()
        .with(env_filter(verbose))
        .with(compact)
        .with(json)
        .init();
}

pub fn init_cli_logger(verbose: bool) {
    init_logger(LogFormat::Compact, verbose);
}

pub fn init_json_logger(verbose: bool) {
    init_logger(LogFormat::Json, verbose);
}
