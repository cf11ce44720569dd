use serde::de::DeserializeOwned;

use crate::config::ResilienceConfig;
use crate::error::{ConfigError, ParseError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Yaml,
    Auto,
}

/// Parse and validate a configuration document.
pub fn parse_config_str(
    input: &str,
    format: ConfigFormat,
) -> Result<ResilienceConfig, ConfigError> {
    let config = match format {
        ConfigFormat::Json => {
            serde_json::from_str::<ResilienceConfig>(input).map_err(ParseError::from)?
        }
        ConfigFormat::Yaml => {
            serde_yaml::from_str::<ResilienceConfig>(input).map_err(ParseError::from)?
        }
        ConfigFormat::Auto => parse_auto(input)?,
    };
    config.validate()?;
    Ok(config)
}

fn parse_auto(input: &str) -> Result<ResilienceConfig, ParseError> {
    // An empty document means "all defaults".
    if input.trim().is_empty() {
        return Ok(ResilienceConfig::default());
    }
    parse_document_str(input)
}

/// Deserialize a JSON or YAML document, detecting which one it is.
pub fn parse_document_str<T: DeserializeOwned>(input: &str) -> Result<T, ParseError> {
    // Heuristic: JSON always starts with `{` or `[` after trimming.
    let trimmed = input.trim_start();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        match serde_json::from_str(input) {
            Ok(doc) => return Ok(doc),
            Err(json_err) => {
                return serde_yaml::from_str(input).map_err(|_| ParseError::Json(json_err));
            }
        }
    }

    match serde_yaml::from_str(input) {
        Ok(doc) => Ok(doc),
        Err(yaml_err) => match serde_json::from_str(input) {
            Ok(doc) => Ok(doc),
            Err(_) => Err(ParseError::Yaml(yaml_err)),
        },
    }
}
