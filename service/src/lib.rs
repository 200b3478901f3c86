//! # Grade Service
//!
//! Review and rating microservice. Guests review hosts and accommodations
//! they stayed with; every change recomputes the subject's average rating and
//! publishes it, and every new review notifies the reviewed party.
//!
//! # Architecture
//!
//! ```text
//!            HTTP (axum)
//!                │
//!                ▼
//!        ┌───────────────┐   eligibility    ┌─────────────────┐
//!        │ ReviewService │ ───────────────▶ │ Booking service │
//!        └───────────────┘                  └─────────────────┘
//!          │           │
//!   reviews│           │rating-changed / review-created
//!          ▼           ▼
//!     ┌──────────┐  ┌──────────┐
//!     │ Postgres │  │ Redpanda │
//!     └──────────┘  └──────────┘
//! ```
//!
//! - [`service`]: the review workflow (create, update, delete, report)
//! - [`booking`]: HTTP client for the booking service eligibility checks
//! - [`api`]: request/response shapes and handlers
//! - [`server`]: router and shared state
//! - [`config`]: environment-driven configuration
//! - [`bootstrap`]: wiring production resources from configuration
//! - [`seed`]: demo data

pub mod api;
pub mod booking;
pub mod bootstrap;
pub mod config;
pub mod seed;
pub mod server;
pub mod service;

pub use booking::BookingClient;
pub use config::Config;
pub use server::{AppState, build_router};
pub use service::{AggregateReport, ReviewService, ReviewServiceError};
