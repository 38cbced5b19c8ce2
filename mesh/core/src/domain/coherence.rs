// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Field coherence aggregation.
//!
//! The mesh-wide field coherence is the arithmetic mean of every registered
//! agent's coherence. Malformed inputs are clamped rather than rejected, and
//! values are summed in sorted order so the aggregate is bit-for-bit
//! reproducible regardless of agent iteration order.

/// Clamp a coherence value into `[0, 1]`. `NaN` becomes `0`.
pub fn sanitize(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Mean coherence of `values`; `0.0` for an empty mesh.
pub fn field_coherence<I>(values: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    let mut values: Vec<f64> = values.into_iter().map(sanitize).collect();
    if values.is_empty() {
        return 0.0;
    }

    values.sort_by(f64::total_cmp);
    let sum: f64 = values.iter().sum();
    sanitize(sum / values.len() as f64)
}
