use super::config::LogLevel;
use super::initialization::{FallbackStrategy, InitializationError, LogDirective};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Builds the tracing filter for the sink and installs the global subscriber.
///
/// HTTP stack crates are pinned to `warn` so per-request connection chatter
/// does not drown out delivery outcomes.
pub struct LoggingSystem {
    directives: Vec<LogDirective>,
    fallback_level: LogLevel,
}

impl LoggingSystem {
    pub fn new() -> Self {
        Self {
            directives: Vec::new(),
            fallback_level: LogLevel::Info,
        }
    }

    /// Adds a `target=level` directive. Malformed directives are skipped or
    /// downgraded to the fallback level instead of failing startup.
    pub fn add_directive(&mut self, directive_str: &str) -> Result<(), InitializationError> {
        match LogDirective::parse(directive_str) {
            Ok(directive) => {
                self.directives.push(directive);
                Ok(())
            }
            Err(e) => match e.fallback_strategy() {
                FallbackStrategy::UseDefaultLevel => {
                    eprintln!("Warning: {e}, using default level");
                    let target = directive_str.split('=').next().unwrap_or_default().trim();
                    self.directives
                        .push(LogDirective::new(target, self.fallback_level));
                    Ok(())
                }
                FallbackStrategy::SkipDirective => {
                    eprintln!("Warning: {e}, skipping directive");
                    Ok(())
                }
                FallbackStrategy::AbortStartup => Err(e),
            },
        }
    }

    pub fn add_default_directives(&mut self) {
        for target in ["hyper", "hyper_util", "reqwest", "rustls", "h2"] {
            self.directives.push(LogDirective::new(target, LogLevel::Warn));
        }
    }

    pub fn build_filter_string(&self, default_level: LogLevel) -> String {
        std::iter::once(default_level.as_str().to_string())
            .chain(self.directives.iter().map(LogDirective::to_filter_string))
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn initialize_tracing(&self, default_level: LogLevel) -> Result<(), InitializationError> {
        let filter_string = self.build_filter_string(default_level);

        let env_filter =
            EnvFilter::try_new(&filter_string).map_err(|e| InitializationError::LoggingInitFailed {
                details: format!("Failed to create EnvFilter with '{filter_string}'"),
                source: Box::new(e),
            })?;

        let subscriber = tracing_subscriber::registry().with(env_filter).with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_level(true)
                .with_writer(std::io::stderr)
                .compact(),
        );

        tracing::subscriber::set_global_default(subscriber).map_err(|e| {
            InitializationError::LoggingInitFailed {
                details: "Failed to set global tracing subscriber".to_string(),
                source: Box::new(e),
            }
        })
    }

    pub fn directive_count(&self) -> usize {
        self.directives.len()
    }
}

impl Default for LoggingSystem {
    fn default() -> Self {
        Self::new()
    }
}

/// Installs logging once for the process.
///
/// `RUST_LOG`-style extra directives can be passed through `LOG_DIRECTIVES`
/// as a comma-separated list.
pub fn setup_logging(level: LogLevel) -> Result<(), InitializationError> {
    let mut logging_system = LoggingSystem::new();
    logging_system.add_default_directives();

    if let Ok(extra) = std::env::var("LOG_DIRECTIVES") {
        for directive in extra.split(',').filter(|d| !d.trim().is_empty()) {
            logging_system.add_directive(directive)?;
        }
    }

    logging_system.initialize_tracing(level)
}
