// SPDX-FileCopyrightText: 2026 Activator Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inference adapter trait for the classifier and reasoning tiers.

use async_trait::async_trait;

use crate::error::ActivatorError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{InferenceRequest, RouteSuggestion};

/// Opaque `(text, context) -> (result, confidence)` capability.
///
/// The lightweight classifier and the full reasoning engine both implement
/// this; the router only distinguishes them by the tier they run on.
#[async_trait]
pub trait InferenceAdapter: PluginAdapter {
    /// Proposes a target tier and tool for the request.
    async fn infer(&self, request: InferenceRequest) -> Result<RouteSuggestion, ActivatorError>;
}
