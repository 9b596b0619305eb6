// SPDX-FileCopyrightText: 2026 Activator Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for the Activator.
//!
//! Exposes the cascade router at `POST /v1/route`, the tier snapshot at
//! `GET /v1/tiers`, and unauthenticated `/health` and `/metrics` endpoints.

pub mod auth;
pub mod handlers;
pub mod server;

pub use auth::AuthConfig;
pub use server::{GatewayState, HealthState, app, start_server};
