//! # Telebot Transport
//!
//! Network implementations of the [`Transport`](telebot_core::Transport)
//! seam defined in `telebot-core`.
//!
//! ## Features
//!
//! - `http-client` (default): [`HttpTransport`] over reqwest
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────┐
//! │  telebot-runtime     │  (polling loop, handlers)
//! ├──────────────────────┤
//! │  telebot-core        │  (Transport trait, Api)
//! ├──────────────────────┤
//! │  telebot-transport   │  <- This crate (implementations)
//! ├──────────────────────┤
//! │  Network (HTTPS)     │
//! └──────────────────────┘
//! ```
//!
//! Transports never fail with an error value. Whatever goes wrong on the
//! wire is folded into the `{ ok: false, error }` envelope, so callers only
//! ever inspect the `ok` flag.
//!
//! ```rust,ignore
//! use telebot_core::Api;
//! use telebot_transport::{HttpTransport, HttpTransportConfig};
//!
//! let transport = HttpTransport::new(HttpTransportConfig::new("123:abc"))?;
//! let api = Api::from_transport(transport);
//! let me = api.get_me().await;
//! ```

pub mod error;

#[cfg(feature = "http-client")]
pub mod http;

pub use error::{TransportError, TransportResult};

#[cfg(feature = "http-client")]
pub use http::{HttpTransport, HttpTransportConfig};

/// Base URL of the public Bot API.
pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";
