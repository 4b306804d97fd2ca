//! # Venue Booking
//!
//! HTTP API for reserving venues by the hour.
//!
//! Users register, log in for an opaque bearer token, browse active venues
//! and book time slots. A slot is accepted only if no pending or confirmed
//! booking on the same venue overlaps it; the cost is the venue's hourly
//! rate times the started hours. Administrators manage the venue catalogue,
//! confirm bookings and manage accounts.
//!
//! # Layout
//!
//! ```text
//! ┌──────────────────────────────────────┐
//! │  api/        Axum handlers           │  ← extract, call, wrap
//! │  auth/       tokens, passwords,      │
//! │              SessionUser/RequireAdmin│
//! ├──────────────────────────────────────┤
//! │  app/        VenueService,           │  ← access checks, pricing,
//! │              BookingService,         │    lifecycle, metrics
//! │              UserService             │
//! ├──────────────────────────────────────┤
//! │  Repositories (venue-booking-core)   │  ← Postgres or in-memory
//! └──────────────────────────────────────┘
//! ```
//!
//! The `server` binary wires [`bootstrap::bootstrap`] and
//! [`server::build_router`] together from [`config::Config`].

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod api;
pub mod app;
pub mod auth;
pub mod bootstrap;
pub mod config;
pub mod metrics;
pub mod server;

pub use config::{Config, ConfigError};
pub use server::{AppState, Repositories, build_router};
