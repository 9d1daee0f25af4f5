pub mod client;
pub mod compat;
pub mod config;
pub mod filter;
pub mod filters;
pub mod http;
pub mod router;
pub mod rules;

pub use client::{ClientProvider, HttpClientProvider, RegistryClient, RegistryError};
pub use config::{RouterConfig, RuleConfig, UseDirective};
pub use filter::{FilterBinding, FilterFactory, FilterVerdict, RouterFilter};
pub use filters::default_filter_factories;
pub use http::HttpRegistryClient;
pub use router::RouterClient;
pub use rules::{ConfigError, ParsedRule};

/// User agent string sent with registry requests
pub const USER_AGENT: &str = concat!("ovsx-core/", env!("CARGO_PKG_VERSION"));
