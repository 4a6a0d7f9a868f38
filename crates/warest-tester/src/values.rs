use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use warest_action::BinaryData;
use warest_common::Credentials;
use warest_runtime_config::RuntimeConfig;

/// Inputs for one action invocation, read from a JSON file.
#[derive(Debug, Deserialize, Clone, Serialize)]
pub struct Values {
    #[serde(default)]
    pub credentials: Option<Credentials>,
    #[serde(default)]
    pub params: Map<String, Value>,
    #[serde(default)]
    pub binary: BTreeMap<String, BinaryInput>,
    #[serde(default)]
    pub runtime: Option<RuntimeConfig>,
}

#[derive(Debug, Deserialize, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BinaryInput {
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
    pub base64: String,
}

impl Values {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = fs::read(&path)
            .with_context(|| format!("failed to read values file {}", path.as_ref().display()))?;
        let values: Values = serde_json::from_slice(&bytes)
            .with_context(|| format!("failed to parse {}", path.as_ref().display()))?;
        Ok(values)
    }

    /// Credentials for commands that compile or send; a placeholder is used
    /// when only compiling.
    pub fn credentials_or_placeholder(&self) -> Credentials {
        self.credentials
            .clone()
            .unwrap_or_else(|| Credentials::new("http://localhost:3000", "placeholder"))
    }

    pub fn runtime(&self) -> RuntimeConfig {
        self.runtime.clone().unwrap_or_default()
    }

    pub fn binary_data(&self) -> Result<BTreeMap<String, BinaryData>> {
        self.binary
            .iter()
            .map(|(name, input)| {
                let data = STANDARD
                    .decode(input.base64.trim())
                    .with_context(|| format!("binary property {name} is not valid base64"))?;
                Ok((
                    name.clone(),
                    BinaryData {
                        mime_type: input.mime_type.clone(),
                        file_name: input.file_name.clone(),
                        data,
                    },
                ))
            })
            .collect()
    }
}
