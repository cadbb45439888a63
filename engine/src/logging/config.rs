use std::collections::HashMap;
use tracing::Level;

/// Environment variable read by the climbing runtimes when no other name is given.
pub const DEFAULT_LOG_ENV: &str = "CLIMB_LOG";

#[derive(Debug, Clone)]
pub struct LogConfig {
    global_level: Level,
    scope_levels: HashMap<String, Level>,
}

impl LogConfig {
    pub fn new() -> Self {
        Self {
            global_level: Level::WARN,
            scope_levels: HashMap::new(),
        }
    }

    pub fn from_env(env_var_name: &str) -> Self {
        let mut config = Self::new();

        if let Ok(log_config) = std::env::var(env_var_name) {
            config.parse_config_string(&log_config);
        }

        config
    }

    /// Parse a `warn,locomotion=debug,physics=trace` style string.
    /// Unknown levels are ignored.
    pub fn parse(config_str: &str) -> Self {
        let mut config = Self::new();
        config.parse_config_string(config_str);
        config
    }

    fn parse_config_string(&mut self, config_str: &str) {
        for part in config_str.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }

            match part.split_once('=') {
                Some((scope, level)) => {
                    if let Some(level) = parse_level(level.trim()) {
                        self.scope_levels.insert(scope.trim().to_string(), level);
                    }
                }
                None => {
                    if let Some(level) = parse_level(part) {
                        self.global_level = level;
                    }
                }
            }
        }
    }

    pub fn should_log(&self, scope: &str, level: Level) -> bool {
        let target_level = self.scope_levels.get(scope).unwrap_or(&self.global_level);
        level <= *target_level
    }

    pub fn global_level(&self) -> Level {
        self.global_level
    }

    pub fn set_global_level(&mut self, level: Level) {
        self.global_level = level;
    }

    pub fn set_scope_level(&mut self, scope: String, level: Level) {
        self.scope_levels.insert(scope, level);
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_level(level_str: &str) -> Option<Level> {
    match level_str.to_lowercase().as_str() {
        "error" => Some(Level::ERROR),
        "warn" => Some(Level::WARN),
        "info" => Some(Level::INFO),
        "debug" => Some(Level::DEBUG),
        "trace" => Some(Level::TRACE),
        _ => None,
    }
}

/// Initialize logging with the specified environment variable name.
/// Each runtime picks its own variable, e.g. `init_logging("CLIMB_LOG")`.
/// The scoped config is installed once; later calls return the parsed
/// config without replacing the active one.
pub fn init_logging(env_var_name: &str) -> LogConfig {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("trace")),
        )
        .try_init();

    let config = LogConfig::from_env(env_var_name);
    super::set_log_config(config.clone());
    config
}
