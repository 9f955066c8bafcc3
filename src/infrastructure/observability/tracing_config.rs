/// Configuration for tracing initialization.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Directive used when `RUST_LOG` is not set.
    pub default_filter: String,
    pub json_format: bool,
    pub profile: String,
}

