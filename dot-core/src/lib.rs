//! # dot-core
//!
//! Core library for dot - LLM-generated dashboards over live application data.
//!
//! This library provides:
//! - A host value model for arbitrary, possibly cyclic, application state
//! - Sanitization, row/byte budgets and statistical profiles for snapshots
//! - Prompt assembly and backend adapters (Ollama, Claude, OpenAI, Gemini, custom)
//! - Strict parsing and validation of versioned dashboard specs
//! - A retrying generation session and a debounced live-data mirror
//! - Configuration management and logging infrastructure
//!
//! ## Pipeline
//!
//! Data flows leaf-first:
//! - **Sanitize:** [`HostValue`] → JSON tree, cycles replaced by `"[Circular]"`
//! - **Guard:** long sequences sampled, oversized snapshots replaced by a [`DataProfile`]
//! - **Prompt:** system instructions + history + data (or profile)
//! - **Validate:** backend text → [`DashboardSpec`], all or nothing
//!
//! ## Example
//!
//! ```rust,no_run
//! use dot_core::{create_client, Config, DotContext, DotSession, HostValue};
//! use std::sync::Arc;
//!
//! # async fn run() -> dot_core::Result<()> {
//! let config = Config::load()?;
//! let mut context = DotContext::new(config.app.description.clone())
//!     .with_options(config.dot_options());
//! if let Some(llm) = &config.llm {
//!     context = context.with_client(create_client(llm)?);
//! }
//!
//! let mut session = DotSession::new(Arc::new(context), || {
//!     HostValue::object([("revenue", HostValue::array([HostValue::from(1.0), HostValue::from(2.5)]))])
//! });
//! let spec = session.generate("Show revenue over time").await?;
//! println!("{} widgets", spec.widgets.len());
//! # Ok(())
//! # }
//! ```

// Re-export commonly used items at the crate root
pub use config::Config;
pub use error::{Error, Result};
pub use host::{HostValue, Selector};
pub use llm::{create_client, CustomClient, ModelClient};
pub use profile::DataProfile;
pub use refresh::LiveData;
pub use sanitize::{sanitize, sanitize_data};
pub use session::{DotContext, DotOptions, DotSession, GenerationState};
pub use size_guard::{size_guard, SizeGuardOptions, SizeGuardResult};
pub use spec::{parse_spec, DashboardSpec, WidgetSpec};
pub use types::*;

// Public modules
pub mod config;
pub mod error;
pub mod host;
pub mod llm;
pub mod logging;
pub mod profile;
pub mod prompt;
pub mod refresh;
pub mod sanitize;
pub mod session;
pub mod size_guard;
pub mod spec;
pub mod types;
