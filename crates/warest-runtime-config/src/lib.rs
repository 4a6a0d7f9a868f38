use serde::{Deserialize, Serialize};

pub const RUNTIME_CONFIG_SCHEMA_VERSION: u32 = 1;
pub const MAX_ATTEMPTS_CEILING: u32 = 10;

fn default_schema_version() -> u32 {
    RUNTIME_CONFIG_SCHEMA_VERSION
}

/// Host-supplied knobs shared by the action and trigger components.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RuntimeConfig {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub execution: ExecutionConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            schema_version: RUNTIME_CONFIG_SCHEMA_VERSION,
            network: NetworkConfig::default(),
            execution: ExecutionConfig::default(),
        }
    }
}

impl RuntimeConfig {
    pub fn validate(&self) -> Result<(), RuntimeConfigError> {
        if self.schema_version != RUNTIME_CONFIG_SCHEMA_VERSION {
            return Err(RuntimeConfigError::UnsupportedSchemaVersion {
                expected: RUNTIME_CONFIG_SCHEMA_VERSION,
                got: self.schema_version,
            });
        }
        if self.network.timeout_ms == Some(0) {
            return Err(RuntimeConfigError::ZeroTimeout);
        }
        Ok(())
    }

    /// Parse a JSON document; blank input yields the defaults.
    pub fn from_json(config_json: &str) -> Result<Self, RuntimeConfigError> {
        if config_json.trim().is_empty() {
            return Ok(Self::default());
        }
        let cfg: RuntimeConfig = serde_json::from_str(config_json)
            .map_err(|e| RuntimeConfigError::Parse(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct NetworkConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

fn default_max_attempts() -> u32 {
    1
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            timeout_ms: None,
        }
    }
}

impl NetworkConfig {
    pub fn attempts(&self) -> u32 {
        self.max_attempts.clamp(1, MAX_ATTEMPTS_CEILING)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ExecutionConfig {
    /// Capture per-item failures as error items instead of halting the batch.
    #[serde(default)]
    pub continue_on_fail: bool,
}

#[derive(Debug, PartialEq, Eq)]
pub enum RuntimeConfigError {
    UnsupportedSchemaVersion { expected: u32, got: u32 },
    ZeroTimeout,
    Parse(String),
}

impl std::fmt::Display for RuntimeConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuntimeConfigError::UnsupportedSchemaVersion { expected, got } => write!(
                f,
                "unsupported schema version: expected {expected}, got {got}"
            ),
            RuntimeConfigError::ZeroTimeout => write!(f, "network.timeout_ms must be positive"),
            RuntimeConfigError::Parse(msg) => write!(f, "invalid runtime config: {msg}"),
        }
    }
}

impl std::error::Error for RuntimeConfigError {}
