//! Endpoint resolution from the environment.
//!
//! The addon front-end talks to the daemon over a unix socket
//! (`AETHERIME_SOCKET`); the text service talks to the engine over TCP
//! (`SHURUFA_ENGINE_HOST` / `SHURUFA_ENGINE_PORT`). Unset or invalid
//! variables fall back to the shipped defaults.

use std::env;
use std::path::PathBuf;

use crate::transport::DaemonEndpoint;

pub const SOCKET_ENV: &str = "AETHERIME_SOCKET";
pub const DICT_ENV: &str = "AETHERIME_LIBIME_DICT";
pub const LM_ENV: &str = "AETHERIME_LIBIME_LM";
pub const ENGINE_HOST_ENV: &str = "SHURUFA_ENGINE_HOST";
pub const ENGINE_PORT_ENV: &str = "SHURUFA_ENGINE_PORT";

pub const DEFAULT_SOCKET_PATH: &str = "/tmp/aetherime.sock";
pub const DEFAULT_ENGINE_HOST: &str = "127.0.0.1";
pub const DEFAULT_ENGINE_PORT: u16 = 48080;

/// Daemon endpoint for the addon front-end.
pub fn daemon_endpoint_from_env() -> DaemonEndpoint {
    DaemonEndpoint::Unix(PathBuf::from(env_string_or(SOCKET_ENV, DEFAULT_SOCKET_PATH)))
}

/// Engine endpoint for the text-service front-end.
pub fn engine_endpoint_from_env() -> DaemonEndpoint {
    let host = env_string_or(ENGINE_HOST_ENV, DEFAULT_ENGINE_HOST);
    let port = env::var(ENGINE_PORT_ENV)
        .ok()
        .and_then(|value| parse_port(&value))
        .unwrap_or(DEFAULT_ENGINE_PORT);
    DaemonEndpoint::Tcp(host, port)
}

fn env_string_or(name: &str, fallback: &str) -> String {
    match env::var(name) {
        Ok(value) if !value.is_empty() => value,
        _ => fallback.to_string(),
    }
}

pub(crate) fn parse_port(value: &str) -> Option<u16> {
    match value.trim().parse::<u32>() {
        Ok(port) if (1..=65535).contains(&port) => Some(port as u16),
        _ => None,
    }
}
