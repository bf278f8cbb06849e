//! Tool catalog composition and the protocol engine.
//!
//! Building a server is two steps:
//!
//! 1. [`compose`] the catalog from an ordered list of [`ToolProvider`]s.
//!    Providers that fail to initialize are excluded and reported, not fatal.
//! 2. Wrap the catalog in a [`Server`] and hand it to a transport binding.
//!
//! ```rust
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use medusa_mcp_core::{ServerInfo, ToolOutput};
//! use medusa_mcp_server::{Server, ToolDescriptor, ToolProvider, compose};
//!
//! struct Hello;
//!
//! #[async_trait]
//! impl ToolProvider for Hello {
//!     fn name(&self) -> &str {
//!         "hello"
//!     }
//!
//!     fn tools(&self) -> Vec<ToolDescriptor> {
//!         vec![ToolDescriptor::new("hello", "Say hello", |_: serde_json::Map<String, serde_json::Value>| async {
//!             Ok(ToolOutput::text("hello"))
//!         })]
//!     }
//! }
//!
//! # tokio_test_block_on(async {
//! let providers: Vec<Arc<dyn ToolProvider>> = vec![Arc::new(Hello)];
//! let server = Server::new(ServerInfo::new("demo", "0.1.0"), compose(&providers).await);
//! assert_eq!(server.list_tools().len(), 1);
//! # });
//! # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```

#![warn(clippy::unwrap_used)]

pub mod catalog;
pub mod compose;
pub mod server;

pub use catalog::{Catalog, ToolDescriptor};
pub use compose::{ProviderReport, ToolProvider, compose};
pub use server::{Server, methods};
