//! HTTP API for the presence check-in engine.
//!
//! Provides endpoints for:
//! - Partial checks (rotating code, location, receipt), side-effect free
//! - Committing a check-in
//! - Check-in status for the calling user
//! - Health and Prometheus metrics
//!
//! Caller identity is established upstream by the session gateway and
//! forwarded in the `x-user-id` / `x-user-role` headers.

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod server;

pub use config::{SeedVenue, ServiceConfig};
pub use error::{ErrorCode, RpcError};
pub use metrics::RpcMetrics;
pub use server::{build_router, cors_layer, AppState, RpcServer};
