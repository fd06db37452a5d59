//! Piccache Core
//!
//! Shared vocabulary for the media-caching proxy: error handling, the
//! configuration document, fetch/serve outcomes, captured response headers,
//! media-type tables and the outbound HTTP port trait. Kept free of any
//! network or filesystem machinery so every other crate can depend on it.

pub mod config;
pub mod error;
pub mod http;
pub mod media;
pub mod outcome;
pub mod ports;

pub use config::Config;
pub use error::{Error, Result};
pub use http::{FetchedResponse, ResponseHeaders};
pub use outcome::{FetchOutcome, ServeOutcome};
pub use ports::MediaClient;
