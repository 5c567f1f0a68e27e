use crate::{
    cache::{CacheStore, DEFAULT_CACHE_TTL},
    context::DEFAULT_CONTEXT_WINDOW,
    params::DEFAULT_MODEL_TIMEOUT,
    CritiquePipeline,
};
use proofit_sdk::{
    openai::{OpenAIChatModel, OpenAIChatModelOptions},
    LanguageModel,
};
use std::{fmt, str::FromStr, sync::Arc, time::Duration};
use thiserror::Error;

const DEFAULT_MODEL: &str = "gpt-4o";
const DEFAULT_PORT: u16 = 4000;
const DEFAULT_APP_URL: &str = "http://localhost:5173";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{key} has an invalid value '{value}'")]
    Invalid { key: &'static str, value: String },
}

/// Settings for the `proofit-server` binary.
#[derive(Clone)]
pub struct ServerConfig {
    pub openai_api_key: String,
    pub openai_base_url: Option<String>,
    pub model: String,
    pub classifier_model: Option<String>,
    pub model_timeout: Duration,
    pub cache_ttl: Duration,
    pub context_window: usize,
    pub port: u16,
    /// Origin allowed by CORS.
    pub app_url: String,
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("openai_api_key", &"<redacted>")
            .field("openai_base_url", &self.openai_base_url)
            .field("model", &self.model)
            .field("classifier_model", &self.classifier_model)
            .field("model_timeout", &self.model_timeout)
            .field("cache_ttl", &self.cache_ttl)
            .field("context_window", &self.context_window)
            .field("port", &self.port)
            .field("app_url", &self.app_url)
            .finish()
    }
}

impl ServerConfig {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup`. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let parse = |key: &'static str| get(key).map(|value| (key, value));

        let openai_api_key =
            get("OPENAI_API_KEY").ok_or(ConfigError::Missing("OPENAI_API_KEY"))?;
        let model_timeout = parse_or(
            parse("PROOFIT_MODEL_TIMEOUT_SECS"),
            DEFAULT_MODEL_TIMEOUT.as_secs(),
        )?;
        let cache_ttl = parse_or(parse("PROOFIT_CACHE_TTL_SECS"), DEFAULT_CACHE_TTL.as_secs())?;
        let context_window = parse_or(parse("PROOFIT_CONTEXT_WINDOW"), DEFAULT_CONTEXT_WINDOW)?;

        if model_timeout == 0 {
            return Err(ConfigError::Invalid {
                key: "PROOFIT_MODEL_TIMEOUT_SECS",
                value: "0".to_string(),
            });
        }
        if context_window == 0 {
            return Err(ConfigError::Invalid {
                key: "PROOFIT_CONTEXT_WINDOW",
                value: "0".to_string(),
            });
        }

        Ok(Self {
            openai_api_key,
            openai_base_url: get("OPENAI_BASE_URL"),
            model: get("PROOFIT_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            classifier_model: get("PROOFIT_CLASSIFIER_MODEL"),
            model_timeout: Duration::from_secs(model_timeout),
            cache_ttl: Duration::from_secs(cache_ttl),
            context_window,
            port: parse_or(parse("PORT"), DEFAULT_PORT)?,
            app_url: get("APP_URL").unwrap_or_else(|| DEFAULT_APP_URL.to_string()),
        })
    }

    fn openai_model(&self, model_id: &str) -> Arc<dyn LanguageModel> {
        Arc::new(OpenAIChatModel::new(
            model_id,
            OpenAIChatModelOptions {
                base_url: self.openai_base_url.clone(),
                api_key: self.openai_api_key.clone(),
                ..Default::default()
            },
        ))
    }

    /// Assemble the pipeline these settings describe around `cache_store`.
    #[must_use]
    pub fn build_pipeline(&self, cache_store: Arc<dyn CacheStore>) -> CritiquePipeline {
        let mut params = CritiquePipeline::builder(self.openai_model(&self.model))
            .cache_store(cache_store)
            .cache_ttl(self.cache_ttl)
            .model_timeout(self.model_timeout)
            .context_window(self.context_window);
        if let Some(classifier_model) = &self.classifier_model {
            params = params.classifier_model(self.openai_model(classifier_model));
        }
        params.build()
    }
}

fn parse_or<T: FromStr>(
    setting: Option<(&'static str, String)>,
    default: T,
) -> Result<T, ConfigError> {
    match setting {
        Some((key, value)) => value
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn applies_defaults() {
        let config = ServerConfig::from_lookup(lookup(&[("OPENAI_API_KEY", "sk-test")])).unwrap();
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.classifier_model, None);
        assert_eq!(config.model_timeout, Duration::from_secs(60));
        assert_eq!(config.cache_ttl, Duration::from_secs(3600));
        assert_eq!(config.context_window, 10);
        assert_eq!(config.port, 4000);
        assert_eq!(config.app_url, "http://localhost:5173");
    }

    #[test]
    fn reads_overrides() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_BASE_URL", "http://localhost:8080/v1"),
            ("PROOFIT_MODEL", "gpt-4.1"),
            ("PROOFIT_CLASSIFIER_MODEL", "gpt-4.1-mini"),
            ("PROOFIT_MODEL_TIMEOUT_SECS", "15"),
            ("PROOFIT_CACHE_TTL_SECS", "120"),
            ("PROOFIT_CONTEXT_WINDOW", "4"),
            ("PORT", "8081"),
        ]))
        .unwrap();
        assert_eq!(config.openai_base_url.as_deref(), Some("http://localhost:8080/v1"));
        assert_eq!(config.model, "gpt-4.1");
        assert_eq!(config.classifier_model.as_deref(), Some("gpt-4.1-mini"));
        assert_eq!(config.model_timeout, Duration::from_secs(15));
        assert_eq!(config.cache_ttl, Duration::from_secs(120));
        assert_eq!(config.context_window, 4);
        assert_eq!(config.port, 8081);
    }

    #[test]
    fn rejects_missing_key_and_bad_numbers() {
        assert!(matches!(
            ServerConfig::from_lookup(lookup(&[("OPENAI_API_KEY", "  ")])),
            Err(ConfigError::Missing("OPENAI_API_KEY"))
        ));
        assert!(matches!(
            ServerConfig::from_lookup(lookup(&[("OPENAI_API_KEY", "sk"), ("PORT", "http")])),
            Err(ConfigError::Invalid { key: "PORT", .. })
        ));
        assert!(matches!(
            ServerConfig::from_lookup(lookup(&[
                ("OPENAI_API_KEY", "sk"),
                ("PROOFIT_CONTEXT_WINDOW", "0")
            ])),
            Err(ConfigError::Invalid { key: "PROOFIT_CONTEXT_WINDOW", .. })
        ));
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = ServerConfig::from_lookup(lookup(&[("OPENAI_API_KEY", "sk-secret")])).unwrap();
        assert!(!format!("{config:?}").contains("sk-secret"));
    }
}
