use anyhow::{Result, bail};
use std::env;
use std::path::PathBuf;

const DEFAULT_API_BASE_URL: &str = "https://api.anthropic.com";
const DEFAULT_API_VERSION: &str = "2023-06-01";
const DEFAULT_MODEL_TIMEOUT_SECS: u64 = 120;
const DEFAULT_HISTORY_DIR: &str = "history";
const DEFAULT_LIGHT_MODEL: &str = "claude-3-5-haiku-20241022";
const DEFAULT_CAPABLE_MODEL: &str = "claude-sonnet-4-20250514";
const DEFAULT_SHORT_PROMPT_WORDS: usize = 20;
const DEFAULT_SHORT_RESPONSE_CHARS: usize = 600;

pub const API_KEY_VAR: &str = "ANTHROPIC_API_KEY";

/// Model ids the selector resolves its tiers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelTiers {
    pub light: String,
    pub capable: String,
}

impl Default for ModelTiers {
    fn default() -> Self {
        Self {
            light: DEFAULT_LIGHT_MODEL.to_string(),
            capable: DEFAULT_CAPABLE_MODEL.to_string(),
        }
    }
}

/// Tunable heuristics. The values carry no meaning beyond "worked well enough".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    /// Prompts with fewer words than this go to the light tier.
    pub short_prompt_words: usize,
    /// Char ceiling applied to responses in short mode.
    pub short_response_chars: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            short_prompt_words: DEFAULT_SHORT_PROMPT_WORDS,
            short_response_chars: DEFAULT_SHORT_RESPONSE_CHARS,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub api_base_url: String,
    pub api_version: String,
    pub model_timeout_secs: u64,
    pub system_prompt: Option<String>,
    pub history_dir: PathBuf,
    pub models: ModelTiers,
    pub thresholds: Thresholds,
    pub no_color: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_env_with(|key| env::var(key).ok())
    }

    fn from_env_with(mut get_var: impl FnMut(&str) -> Option<String>) -> Result<Self> {
        let Some(api_key) = non_empty(get_var(API_KEY_VAR)) else {
            bail!(
                "{} environment variable not set. Set it with: export {}='your-api-key'",
                API_KEY_VAR,
                API_KEY_VAR
            );
        };

        let models = ModelTiers {
            light: non_empty(get_var("QUIP_LIGHT_MODEL"))
                .unwrap_or_else(|| DEFAULT_LIGHT_MODEL.to_string()),
            capable: non_empty(get_var("QUIP_CAPABLE_MODEL"))
                .unwrap_or_else(|| DEFAULT_CAPABLE_MODEL.to_string()),
        };
        let thresholds = Thresholds {
            short_prompt_words: parse_positive_usize(
                get_var("QUIP_SHORT_PROMPT_WORDS").as_deref(),
                DEFAULT_SHORT_PROMPT_WORDS,
            ),
            short_response_chars: parse_positive_usize(
                get_var("QUIP_SHORT_RESPONSE_CHARS").as_deref(),
                DEFAULT_SHORT_RESPONSE_CHARS,
            ),
        };

        Ok(Self {
            api_key,
            api_base_url: non_empty(get_var("ANTHROPIC_BASE_URL"))
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
            api_version: non_empty(get_var("ANTHROPIC_VERSION"))
                .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
            model_timeout_secs: parse_model_timeout_secs(get_var("MODEL_TIMEOUT_SECS").as_deref()),
            system_prompt: non_empty(get_var("SYSTEM_PROMPT")),
            history_dir: non_empty(get_var("HISTORY_DIR"))
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_HISTORY_DIR)),
            models,
            thresholds,
            no_color: get_var("NO_COLOR").is_some_and(|value| !value.is_empty()),
        })
    }
}

fn non_empty(raw: Option<String>) -> Option<String> {
    raw.map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_positive_u64(raw: Option<&str>, default: u64) -> u64 {
    raw.and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(default)
}

fn parse_positive_usize(raw: Option<&str>, default: usize) -> usize {
    raw.and_then(|value| value.trim().parse::<usize>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(default)
}

fn parse_model_timeout_secs(raw: Option<&str>) -> u64 {
    parse_positive_u64(raw, DEFAULT_MODEL_TIMEOUT_SECS)
}

#[cfg(test)]
pub(crate) fn test_config(history_dir: impl Into<PathBuf>) -> Config {
    Config {
        api_key: "test-key".to_string(),
        api_base_url: "http://127.0.0.1:9".to_string(),
        api_version: DEFAULT_API_VERSION.to_string(),
        model_timeout_secs: 5,
        system_prompt: None,
        history_dir: history_dir.into(),
        models: ModelTiers::default(),
        thresholds: Thresholds::default(),
        no_color: true,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::path::PathBuf;

    use super::{
        Config, DEFAULT_API_BASE_URL, DEFAULT_API_VERSION, DEFAULT_CAPABLE_MODEL,
        DEFAULT_HISTORY_DIR, DEFAULT_LIGHT_MODEL, DEFAULT_MODEL_TIMEOUT_SECS,
        DEFAULT_SHORT_PROMPT_WORDS, DEFAULT_SHORT_RESPONSE_CHARS, ModelTiers, Thresholds,
        parse_model_timeout_secs, parse_positive_usize,
    };

    fn config_from_pairs(pairs: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect();
        Config::from_env_with(|key| vars.get(key).cloned())
    }

    #[test]
    fn from_env_requires_api_key() {
        let err = config_from_pairs(&[]).expect_err("missing key should fail");
        let msg = format!("{err:#}");
        assert!(msg.contains("ANTHROPIC_API_KEY"), "unexpected message: {msg}");
    }

    #[test]
    fn from_env_treats_blank_api_key_as_missing() {
        assert!(config_from_pairs(&[("ANTHROPIC_API_KEY", "   ")]).is_err());
    }

    #[test]
    fn from_env_uses_defaults_when_optional_vars_are_missing() {
        let cfg = config_from_pairs(&[("ANTHROPIC_API_KEY", "sk-test")])
            .expect("config should load");
        assert_eq!(cfg.api_key, "sk-test");
        assert_eq!(cfg.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(cfg.api_version, DEFAULT_API_VERSION);
        assert_eq!(cfg.model_timeout_secs, DEFAULT_MODEL_TIMEOUT_SECS);
        assert_eq!(cfg.system_prompt, None);
        assert_eq!(cfg.history_dir, PathBuf::from(DEFAULT_HISTORY_DIR));
        assert_eq!(cfg.models, ModelTiers::default());
        assert_eq!(cfg.models.light, DEFAULT_LIGHT_MODEL);
        assert_eq!(cfg.models.capable, DEFAULT_CAPABLE_MODEL);
        assert_eq!(cfg.thresholds, Thresholds::default());
        assert!(!cfg.no_color);
    }

    #[test]
    fn from_env_reads_configured_values() {
        let cfg = config_from_pairs(&[
            ("ANTHROPIC_API_KEY", "sk-test"),
            ("ANTHROPIC_BASE_URL", "http://localhost:9999"),
            ("ANTHROPIC_VERSION", "2024-01-01"),
            ("MODEL_TIMEOUT_SECS", "15"),
            ("SYSTEM_PROMPT", "Be brief."),
            ("HISTORY_DIR", "/tmp/quip-history"),
            ("QUIP_LIGHT_MODEL", "light-1"),
            ("QUIP_CAPABLE_MODEL", "capable-1"),
            ("QUIP_SHORT_PROMPT_WORDS", "8"),
            ("QUIP_SHORT_RESPONSE_CHARS", "120"),
            ("NO_COLOR", "1"),
        ])
        .expect("config should load");

        assert_eq!(cfg.api_base_url, "http://localhost:9999");
        assert_eq!(cfg.api_version, "2024-01-01");
        assert_eq!(cfg.model_timeout_secs, 15);
        assert_eq!(cfg.system_prompt.as_deref(), Some("Be brief."));
        assert_eq!(cfg.history_dir, PathBuf::from("/tmp/quip-history"));
        assert_eq!(
            cfg.models,
            ModelTiers {
                light: "light-1".to_string(),
                capable: "capable-1".to_string(),
            }
        );
        assert_eq!(
            cfg.thresholds,
            Thresholds {
                short_prompt_words: 8,
                short_response_chars: 120,
            }
        );
        assert!(cfg.no_color);
    }

    #[test]
    fn from_env_uses_defaults_for_invalid_thresholds() {
        let cfg = config_from_pairs(&[
            ("ANTHROPIC_API_KEY", "sk-test"),
            ("QUIP_SHORT_PROMPT_WORDS", "0"),
            ("QUIP_SHORT_RESPONSE_CHARS", "lots"),
            ("MODEL_TIMEOUT_SECS", "-3"),
        ])
        .expect("config should load");

        assert_eq!(cfg.thresholds.short_prompt_words, DEFAULT_SHORT_PROMPT_WORDS);
        assert_eq!(
            cfg.thresholds.short_response_chars,
            DEFAULT_SHORT_RESPONSE_CHARS
        );
        assert_eq!(cfg.model_timeout_secs, DEFAULT_MODEL_TIMEOUT_SECS);
    }

    #[test]
    fn empty_no_color_does_not_disable_color() {
        let cfg = config_from_pairs(&[("ANTHROPIC_API_KEY", "sk-test"), ("NO_COLOR", "")])
            .expect("config should load");
        assert!(!cfg.no_color);
    }

    #[test]
    fn parse_model_timeout_secs_uses_default_for_missing_or_invalid_values() {
        assert_eq!(parse_model_timeout_secs(None), DEFAULT_MODEL_TIMEOUT_SECS);
        assert_eq!(
            parse_model_timeout_secs(Some("not-a-number")),
            DEFAULT_MODEL_TIMEOUT_SECS
        );
        assert_eq!(
            parse_model_timeout_secs(Some("0")),
            DEFAULT_MODEL_TIMEOUT_SECS
        );
        assert_eq!(parse_model_timeout_secs(Some("  90  ")), 90);
    }

    #[test]
    fn parse_positive_usize_accepts_positive_integer() {
        assert_eq!(parse_positive_usize(Some("11"), 3), 11);
        assert_eq!(parse_positive_usize(Some(""), 3), 3);
    }
}
