//! Global tunables loaded from TOML.
//!
//! - `init_custom(toml_content)` sets a custom TOML before first `settings()` call
//! - `settings()` returns `&'static Settings` (lazy-init singleton)
//! - Default values are embedded via `include_str!("default_settings.toml")`

use std::sync::OnceLock;

use serde::Deserialize;

pub const DEFAULT_SETTINGS_TOML: &str = include_str!("default_settings.toml");

static CUSTOM_TOML: OnceLock<String> = OnceLock::new();

/// Set custom TOML before first `settings()` call.
pub fn init_custom(toml_content: String) -> Result<(), SettingsError> {
    parse_settings_toml(&toml_content)?;
    CUSTOM_TOML
        .set(toml_content)
        .map_err(|_| SettingsError::AlreadyInitialized)
}

/// Get or initialize the global settings singleton.
pub fn settings() -> &'static Settings {
    static INSTANCE: OnceLock<Settings> = OnceLock::new();
    INSTANCE.get_or_init(|| {
        let toml_str = CUSTOM_TOML
            .get()
            .map(|s| s.as_str())
            .unwrap_or(DEFAULT_SETTINGS_TOML);
        parse_settings_toml(toml_str).expect("settings TOML must be valid")
    })
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("TOML parse error: {0}")]
    Parse(String),
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
    #[error("settings already initialized")]
    AlreadyInitialized,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub predict: PredictSettings,
    pub debounce: DebounceSettings,
    pub context: ContextSettings,
    pub candidates: CandidateSettings,
    pub transport: TransportSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PredictSettings {
    pub max_tokens: u32,
    pub latency_budget_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DebounceSettings {
    pub interval_ms: u64,
    pub min_confidence: f32,
    pub max_len: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContextSettings {
    pub prefix_chars: usize,
    pub suffix_chars: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CandidateSettings {
    pub page_size: usize,
    pub max_merged: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransportSettings {
    pub poll_interval_ms: u64,
    pub reconnect_chunk_ms: u64,
    pub reconnect_budget_ms: u64,
}

pub fn parse_settings_toml(toml_str: &str) -> Result<Settings, SettingsError> {
    let s: Settings = toml::from_str(toml_str).map_err(|e| SettingsError::Parse(e.to_string()))?;
    validate(&s)?;
    Ok(s)
}

fn validate(s: &Settings) -> Result<(), SettingsError> {
    macro_rules! check_positive {
        ($section:ident . $field:ident) => {
            if s.$section.$field == 0 {
                return Err(SettingsError::InvalidValue {
                    field: concat!(stringify!($section), ".", stringify!($field)).to_string(),
                    reason: "must be positive".to_string(),
                });
            }
        };
    }

    check_positive!(predict.max_tokens);
    check_positive!(predict.latency_budget_ms);

    check_positive!(debounce.interval_ms);
    check_positive!(debounce.max_len);
    if !(0.0..=1.0).contains(&s.debounce.min_confidence) {
        return Err(SettingsError::InvalidValue {
            field: "debounce.min_confidence".to_string(),
            reason: "must be within [0, 1]".to_string(),
        });
    }

    check_positive!(context.prefix_chars);
    check_positive!(context.suffix_chars);

    check_positive!(candidates.page_size);
    check_positive!(candidates.max_merged);

    check_positive!(transport.poll_interval_ms);
    check_positive!(transport.reconnect_chunk_ms);
    check_positive!(transport.reconnect_budget_ms);
    if s.transport.reconnect_chunk_ms > s.transport.reconnect_budget_ms {
        return Err(SettingsError::InvalidValue {
            field: "transport.reconnect_chunk_ms".to_string(),
            reason: "must not exceed reconnect_budget_ms".to_string(),
        });
    }

    Ok(())
}
