//! # Bootkit
//!
//! A modular application bootstrap kernel for Rust.
//!
//! An application is a graph of modules. Each module declares, while it is
//! constructed, which other modules it depends on. The kernel resolves that
//! graph from a root module, rejects cycles, orders modules so dependencies
//! always come first, and then drives every module through a fixed sequence
//! of async lifecycle phases that build up a shared service container.
//!
//! ## Features
//!
//! - **Explicit dependencies**: `#[module(depends_on = [...])]` or a hand-written
//!   [`ModuleType::create`], no runtime scanning
//! - **Deterministic order**: depth-first resolution, diamonds load once
//! - **Phased lifecycle**: configure and initialize families, each with
//!   pre/main/post full passes
//! - **Fail fast**: the first failing hook aborts bootstrap with the phase,
//!   the module and the original error
//! - **Host pipeline**: host-capable modules add axum routes in three extra phases
//! - **Cooperative cancellation**: checked between modules, wired to SIGINT/SIGTERM
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use bootkit::prelude::*;
//!
//! #[derive(Default)]
//! #[module]
//! pub struct DatabaseModule;
//!
//! #[async_trait]
//! impl Module for DatabaseModule {
//!     async fn configure(
//!         &mut self,
//!         ctx: &mut ConfigurationContext<'_>,
//!         _cancel: &CancellationToken,
//!     ) -> anyhow::Result<()> {
//!         let url = ctx.configuration().get_or("DATABASE_URL", "sqlite::memory:");
//!         ctx.services_mut().register(Database::new(url));
//!         Ok(())
//!     }
//! }
//!
//! #[derive(Default)]
//! #[module(depends_on = [DatabaseModule])]
//! pub struct AppModule;
//!
//! #[async_trait]
//! impl Module for AppModule {}
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut kernel = ModuleKernel::new::<AppModule>()?;
//!     kernel.configure_modules().await?;
//!     kernel.initialize_modules().await?;
//!     Ok(())
//! }
//! ```

// Lets `#[module]` expand to `::bootkit::...` inside this crate too.
extern crate self as bootkit;

pub mod config;
pub mod di;
pub mod error;
pub mod lifecycle;
pub mod module;

// Re-export core types
pub use config::ConfigService;
pub use di::{AppState, HasContainer, Inject, ServiceContainer};
pub use error::{BootstrapError, Result};
pub use lifecycle::{
    ApplicationContext, BootstrapState, ConfigurationContext, HostKernel, InitializationContext,
    LifecyclePhase, ModuleKernel, ModuleKernelBuilder,
};
pub use module::{
    ApplicationModule, DependencyResolver, DependsOn, Module, ModuleGraph, ModuleId, ModuleInfo,
    ModuleNode, ModuleRegistry, ModuleType, validate_module_type,
};

// Re-export macros
pub use bootkit_macro::module;

// Re-export commonly used types from dependencies
pub use async_trait::async_trait;
pub use axum;
pub use tokio_util::sync::CancellationToken;

/// Prelude module for convenient imports
///
/// ```
/// use bootkit::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::ConfigService;
    pub use crate::di::{AppState, HasContainer, Inject, ServiceContainer};
    pub use crate::error::{BootstrapError, Result};
    pub use crate::lifecycle::{
        ApplicationContext, BootstrapState, ConfigurationContext, HostKernel,
        InitializationContext, LifecyclePhase, ModuleKernel, cancel_on_shutdown, shutdown_signal,
    };
    pub use crate::module;
    pub use crate::module::{
        ApplicationModule, DependsOn, Module, ModuleGraph, ModuleId, ModuleType,
    };
    pub use async_trait::async_trait;
    pub use axum::{
        Json, Router,
        extract::{Path, Query, State},
        http::StatusCode,
        response::{IntoResponse, Response},
        routing::{get, post},
    };
    pub use std::sync::Arc;
    pub use tokio_util::sync::CancellationToken;
}
