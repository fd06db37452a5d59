//! Port traits.
//!
//! The engine and resolvers reach the network only through [`MediaClient`],
//! so they can be driven by an in-memory client in tests.

use crate::Result;
use crate::http::FetchedResponse;
use async_trait::async_trait;

/// Outbound HTTP access.
///
/// Implementations return `Ok` whenever a status line was received, whatever
/// the status; `Err` is reserved for transport failures and timeouts.
#[async_trait]
pub trait MediaClient: Send + Sync {
    /// GET a URL with extra request headers, capturing headers and body.
    async fn get(&self, url: &str, headers: &[(String, String)]) -> Result<FetchedResponse>;

    /// Metadata-only request; the returned body is empty.
    async fn head(&self, url: &str) -> Result<FetchedResponse>;
}
