//! Integration test infrastructure for piccache.
//!
//! Starts the real router on a loopback port with a temporary cache root.
//! Origins are `wiremock` servers; platform endpoints can be pointed at
//! them through the configuration.
//!
//! # Usage
//!
//! ```ignore
//! use piccache_tests::TestContext;
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let ctx = TestContext::new().await.unwrap();
//!     let resp = ctx.api.get_url("https://i.redd.it/abc.jpg").await.unwrap();
//! }
//! ```

pub mod context;
pub mod fixtures;
pub mod helpers;

pub use context::TestContext;
pub use fixtures::*;
pub use helpers::*;

/// Initialize test logging (call once per test binary).
pub fn init_test_logging() {
    use tracing_subscriber::{EnvFilter, fmt};

    let _ = fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,piccache_fetch=debug,piccache_api=debug")),
        )
        .with_test_writer()
        .try_init();
}
