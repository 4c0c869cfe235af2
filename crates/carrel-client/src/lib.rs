//! Streaming chat client for the notebook assistant.
//!
//! Layers, bottom to top:
//! - [`frame`]: newline-delimited frame decoding over raw byte chunks
//! - [`api`]: typed HTTP client for the notebook API
//! - [`controller`]: session controller driving one streaming turn at a time
//! - [`config`] / [`logging`]: client configuration and tracing setup

pub mod api;
pub mod config;
pub mod controller;
pub mod frame;
pub mod logging;

pub use api::{ApiClient, ClientError, FeedbackKind};
pub use config::ClientConfig;
pub use controller::{ChatController, TurnHook};
pub use frame::FrameDecoder;
pub use logging::{LogConfig, LogFormat, LogPreset};
