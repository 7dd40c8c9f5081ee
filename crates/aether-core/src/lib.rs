//! Shared core for the AetherIME front-ends: the line-delimited JSON wire
//! protocol, the daemon transport, the background prediction worker, and the
//! lexical backend adapter.
//!
//! Host integration (candidate panels, edit sessions, key plumbing) lives in
//! the front-end crates; everything here is host-agnostic.

pub mod config;
pub mod lexicon;
pub mod protocol;
pub mod settings;
pub mod trace_init;
pub mod transport;
pub mod worker;
