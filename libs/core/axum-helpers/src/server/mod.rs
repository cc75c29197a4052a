//! Server start-up, health endpoint and graceful shutdown.
//!
//! ```ignore
//! use axum_helpers::server::{create_app, health_router};
//! use core_config::{app_info, server::ServerConfig};
//!
//! let app = routes.merge(health_router(app_info!()));
//! create_app(app, &ServerConfig::default()).await?;
//! ```

pub mod app;
pub mod health;
pub mod shutdown;

pub use app::create_app;
pub use health::{HealthResponse, health_router};
pub use shutdown::shutdown_signal;
