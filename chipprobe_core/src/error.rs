use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unknown benchmark '{name}' on line {line}")]
    UnknownBenchmark { name: String, line: usize },

    #[error("unknown token '{token}' on line {line}")]
    UnknownToken { token: String, line: usize },

    #[error("invalid {key} value '{value}' on line {line}")]
    InvalidValue { key: &'static str, value: String, line: usize },

    #[error("'{key}' does not apply to {benchmark} (line {line})")]
    NotApplicable { key: &'static str, benchmark: &'static str, line: usize },
}

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("alignment {0} is not a power of two")]
    BadAlignment(usize),

    #[error("failed to allocate {size} bytes aligned to {alignment}")]
    OutOfMemory { size: usize, alignment: usize },
}
