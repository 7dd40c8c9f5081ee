//! Line-delimited JSON wire protocol between front-ends and the prediction
//! daemon.
//!
//! Two frame vocabularies coexist on the same newline framing:
//!
//! - the `predict`/`ping` vocabulary spoken by the input-method addon
//!   against the daemon's unix socket, and
//! - the `suggest`/`cancel`/`suggestion` vocabulary spoken by the text
//!   service against the engine's TCP endpoint.
//!
//! Decoding is tolerant: optional fields default to empty/zero, a frame
//! whose `type` is missing or unknown is [`WireError::Malformed`].

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum WireError {
    #[error("malformed frame: {0}")]
    Malformed(String),

    #[error("encode error: {0}")]
    Encode(String),
}

/// Serialize a frame and append the newline terminator.
pub fn encode_line<T: Serialize>(frame: &T) -> Result<String, WireError> {
    let mut line =
        serde_json::to_string(frame).map_err(|error| WireError::Encode(error.to_string()))?;
    line.push('\n');
    Ok(line)
}

/// Decode one daemon response line (without the trailing newline).
pub fn decode_response(line: &str) -> Result<DaemonResponse, WireError> {
    serde_json::from_str(line).map_err(|error| WireError::Malformed(error.to_string()))
}

/// Decode one daemon request line. Used by loopback test servers.
pub fn decode_request(line: &str) -> Result<DaemonRequest, WireError> {
    serde_json::from_str(line).map_err(|error| WireError::Malformed(error.to_string()))
}

/// Decode one engine request line. Used by loopback test servers.
pub fn decode_engine_request(line: &str) -> Result<EngineRequest, WireError> {
    serde_json::from_str(line).map_err(|error| WireError::Malformed(error.to_string()))
}

/// Decode one engine response line.
pub fn decode_engine_response(line: &str) -> Result<EngineResponse, WireError> {
    serde_json::from_str(line).map_err(|error| WireError::Malformed(error.to_string()))
}

// ---------------------------------------------------------------------------
// Daemon vocabulary: predict / ping
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaemonRequest {
    #[serde(default)]
    pub id: String,
    #[serde(flatten)]
    pub body: RequestBody,
}

impl DaemonRequest {
    pub fn ping() -> Self {
        Self {
            id: "ping".to_string(),
            body: RequestBody::Ping,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RequestBody {
    Predict(PredictRequest),
    Ping,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaemonResponse {
    #[serde(default)]
    pub id: String,
    #[serde(flatten)]
    pub body: ResponseBody,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseBody {
    Predict(PredictResult),
    Pong,
    Error(ErrorFrame),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorFrame {
    #[serde(default)]
    pub code: ErrorCode,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    InvalidRequest,
    Timeout,
    #[default]
    Internal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictRequest {
    pub prefix: String,
    #[serde(default)]
    pub suffix: String,
    #[serde(default)]
    pub language: Language,
    #[serde(default)]
    pub mode: PredictMode,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_latency_budget_ms")]
    pub latency_budget_ms: u64,
}

impl PredictRequest {
    /// Replace zero limits with the protocol defaults.
    pub fn normalized(mut self) -> Self {
        if self.max_tokens == 0 {
            self.max_tokens = default_max_tokens();
        }
        if self.latency_budget_ms == 0 {
            self.latency_budget_ms = default_latency_budget_ms();
        }
        self
    }
}

fn default_max_tokens() -> u32 {
    12
}

fn default_latency_budget_ms() -> u64 {
    90
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Zh,
    En,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PredictMode {
    Next,
    #[default]
    Fim,
}

/// Prediction payload. Every field tolerates absence so partial daemon
/// builds still interoperate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictResult {
    #[serde(default)]
    pub ghost_text: String,
    #[serde(default)]
    pub candidates: Vec<String>,
    #[serde(default)]
    pub confidence: f32,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub elapsed_ms: u64,
}

// ---------------------------------------------------------------------------
// Engine vocabulary: suggest / cancel / suggestion
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineRequest {
    Suggest(SuggestRequest),
    Cancel(CancelRequest),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestRequest {
    pub request_id: String,
    pub context: String,
    #[serde(default)]
    pub cursor: u32,
    #[serde(default)]
    pub language_hint: LanguageHint,
    #[serde(default = "default_max_len")]
    pub max_len: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CancelRequest {
    pub request_id: String,
}

fn default_max_len() -> u32 {
    32
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageHint {
    #[default]
    Auto,
    En,
    Zh,
    Mixed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineResponse {
    Suggestion(SuggestionResponse),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SuggestionResponse {
    #[serde(default)]
    pub request_id: String,
    #[serde(default)]
    pub suggestion: String,
    #[serde(default)]
    pub confidence: f32,
    /// UTF-16 range the suggestion would replace. Decoded and carried
    /// through, but applied as an insertion at the caret.
    #[serde(default)]
    pub replace_range: [u32; 2],
}
