#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

use std::path;
use std::time::Duration;

use anyhow::bail;
use anyhow::Result;
use clap::ArgMatches;
use clap::Command;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use strum::EnumIter;
use strum::EnumVariantNames;
use strum::IntoEnumIterator;
use tokio::fs;

use crate::domain::models::ProtocolGeneration;

static CONFIG: Lazy<DashMap<String, String>> = Lazy::new(DashMap::new);

#[derive(Clone, Copy, Debug, Eq, PartialEq, EnumIter, EnumVariantNames, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum ConfigKey {
    BackendURL,
    ConfigFile,
    ContextWindow,
    ExternalLlm,
    Protocol,
    ReadinessAttempts,
    ReadinessInterval,
}

pub struct Config {}

impl Config {
    pub fn get(key: ConfigKey) -> String {
        if let Some(val) = CONFIG.get(&key.to_string()) {
            return val.to_string();
        }

        return "".to_string();
    }

    pub fn set(key: ConfigKey, value: &str) {
        CONFIG.insert(key.to_string(), value.to_string());
    }

    pub fn default(key: ConfigKey) -> String {
        let default_protocol = ProtocolGeneration::V2.to_string();

        #[cfg(not(target_os = "macos"))]
        let config_path = dirs::config_dir()
            .unwrap_or_else(|| return path::PathBuf::from("."))
            .join("timothy/config.toml");
        #[cfg(target_os = "macos")]
        let config_path = dirs::home_dir()
            .unwrap_or_else(|| return path::PathBuf::from("."))
            .join(".config/timothy/config.toml");

        let res: &str = match key {
            ConfigKey::BackendURL => "http://localhost:8000",
            ConfigKey::ContextWindow => "",
            ConfigKey::ExternalLlm => "false",
            ConfigKey::Protocol => &default_protocol,
            ConfigKey::ReadinessAttempts => "10",
            ConfigKey::ReadinessInterval => "1000",

            // Special
            ConfigKey::ConfigFile => return config_path.to_string_lossy().to_string(),
        };

        return res.to_string();
    }

    pub fn protocol() -> Result<ProtocolGeneration> {
        let val = Config::get(ConfigKey::Protocol);
        if let Some(protocol) = ProtocolGeneration::parse(val.to_string()) {
            return Ok(protocol);
        }

        bail!(format!("Unknown protocol generation '{val}'"));
    }

    /// Configured context window, falling back to the protocol generation's
    /// own size when unset.
    pub fn context_window() -> Result<usize> {
        let val = Config::get(ConfigKey::ContextWindow);
        if val.is_empty() {
            return Ok(Config::protocol()?.default_context_window());
        }

        return Ok(val.parse::<usize>()?);
    }

    pub fn external_llm() -> Result<bool> {
        return Ok(Config::get(ConfigKey::ExternalLlm).parse::<bool>()?);
    }

    pub fn readiness_attempts() -> Result<u32> {
        let attempts = Config::get(ConfigKey::ReadinessAttempts).parse::<u32>()?;
        if attempts == 0 {
            bail!("readiness-attempts must be at least 1");
        }

        return Ok(attempts);
    }

    pub fn readiness_interval() -> Result<Duration> {
        let millis = Config::get(ConfigKey::ReadinessInterval).parse::<u64>()?;
        return Ok(Duration::from_millis(millis));
    }

    pub async fn load(cmd: Command, clap_arg_matches: Vec<&ArgMatches>) -> Result<()> {
        for key in ConfigKey::iter() {
            Config::set(key, &Config::default(key))
        }

        let mut config_file = Config::default(ConfigKey::ConfigFile);
        for matches in clap_arg_matches.as_slice() {
            if let Some(arg_config_file) =
                matches.get_one::<String>(&ConfigKey::ConfigFile.to_string())
            {
                config_file = arg_config_file.to_string();
            }
        }

        let config_path = path::PathBuf::from(config_file);
        if config_path.exists() {
            let toml_str = fs::read_to_string(config_path).await?;
            let doc = toml_str.parse::<toml_edit::Document>()?;

            for key in ConfigKey::iter() {
                if let Some(val) = doc.get(&key.to_string()) {
                    // Use clap value parsers to do validation.
                    let mut possible_values = vec![];
                    if let Some(arg) = cmd
                        .get_arguments()
                        .find(|e| return e.get_long() == Some(key.to_string().as_str()))
                    {
                        possible_values = arg
                            .get_possible_values()
                            .iter()
                            .map(|e| return e.get_name().to_string())
                            .collect::<Vec<String>>();
                    }

                    if let Some(val_int) = val.as_integer() {
                        Config::set(key, &val_int.to_string());
                    } else if let Some(val_bool) = val.as_bool() {
                        Config::set(key, &val_bool.to_string());
                    } else if let Some(val_str) = val.as_str() {
                        if val_str.is_empty() {
                            continue;
                        }
                        if !possible_values.is_empty()
                            && !possible_values.contains(&val_str.to_string())
                        {
                            bail!(format!("config.toml has an invalid value for key '{key}': {val_str}\nPossible values are: {}", possible_values.join(", ")));
                        }
                        Config::set(key, val_str);
                    }
                }
            }
        }

        for key in ConfigKey::iter() {
            for matches in clap_arg_matches.as_slice() {
                if let Ok(Some(val)) = matches.try_get_one::<String>(&key.to_string()) {
                    if val.is_empty() {
                        continue;
                    }
                    Config::set(key, val)
                }
            }
        }

        Config::protocol()?;
        Config::context_window()?;
        Config::external_llm()?;
        Config::readiness_attempts()?;
        Config::readiness_interval()?;

        tracing::debug!(
            backend_url = Config::get(ConfigKey::BackendURL),
            protocol = Config::get(ConfigKey::Protocol),
            context_window = Config::get(ConfigKey::ContextWindow),
            external_llm = Config::get(ConfigKey::ExternalLlm),
            readiness_attempts = Config::get(ConfigKey::ReadinessAttempts),
            readiness_interval = Config::get(ConfigKey::ReadinessInterval),
            "config"
        );

        return Ok(());
    }

    pub fn serialize_default(cmd: Command) -> String {
        let toml_str = ConfigKey::iter()
            .filter_map(|key| {
                if key == ConfigKey::ConfigFile {
                    return None;
                }

                let arg = cmd
                    .get_arguments()
                    .find(|e| return e.get_long() == Some(key.to_string().as_str()))?;

                let mut description = arg.get_help()?.to_string();

                description = description
                    .split("[default:")
                    .next()
                    .unwrap_or_default()
                    .trim()
                    .to_string();

                if !arg.get_possible_values().is_empty() {
                    let possible_values = arg
                        .get_possible_values()
                        .iter()
                        .map(|e| return e.get_name())
                        .collect::<Vec<_>>()
                        .join(", ");
                    description = format!("{description} [possible values: {}]", possible_values);
                }

                let mut val = Config::default(key);
                if val.is_empty() {
                    val = format!("# {key} = \"\"");
                } else if val.parse::<i64>().is_ok() || val.parse::<bool>().is_ok() {
                    val = format!("{key} = {val}");
                } else {
                    val = format!("{key} = \"{val}\"");
                }

                return Some(format!("# {description}\n{val}"));
            })
            .collect::<Vec<String>>()
            .join("\n\n");

        return toml_str;
    }
}
