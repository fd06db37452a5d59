//! Fetching side of piccache.
//!
//! - [`client`]: reqwest-backed [`MediaClient`](piccache_core::MediaClient)
//! - [`resolver`]: per-platform strategies that turn a requested URL into a
//!   byte-fetchable one
//! - [`classifier`]: picks the storage extension
//! - [`engine`]: the idempotent ensure-cached operation

pub mod classifier;
pub mod client;
pub mod engine;
pub mod resolver;

pub use classifier::Classifier;
pub use client::ReqwestClient;
pub use engine::Engine;
pub use resolver::{Resolver, ResolverRegistry};
