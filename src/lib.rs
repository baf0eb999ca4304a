//! crossenv: cross-compilation toolchain manager.
//!
//! Installs SDKs under a shared root ([`sdk`]), composes named build
//! configurations on top of them ([`configs`]) and runs built artifacts with
//! the backend a configuration names ([`runner`]). Plugins ([`plugin`]) wire
//! the three together; the [`host`] owns them for one invocation.

pub mod cli;
pub mod config;
pub mod configs;
pub mod error;
pub mod host;
pub mod platform;
pub mod plugin;
pub mod probe;
pub mod project_config;
pub mod runner;
pub mod sdk;
pub mod services;

pub use error::{CrossenvError, Result};
