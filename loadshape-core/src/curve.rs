//! Rate curve preview and pacing helpers.
//!
//! `RateCurve` samples a resolved strategy at a fixed step over a run and
//! integrates the expected request count with the trapezoid rule. Sampling
//! calls `get_rate` in time order, so a Poisson curve consumes its
//! generator exactly like a dispatcher would.

use serde::Serialize;
use std::time::Duration;

use crate::distribution::Distribution;

/// Most points one curve will hold; longer spans widen the step.
pub const MAX_POINTS: usize = 100_000;

/// One sampled point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RatePoint {
    pub time: f64,
    pub rate: f64,
}

/// A sampled rate curve.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RateCurve {
    pub points: Vec<RatePoint>,
}

impl RateCurve {
    /// Sample `distribution` on `[0, duration]` every `step` seconds.
    ///
    /// The last point is always at `duration`, even when `step` does not
    /// divide it. A non-positive or non-finite `step` or `duration` yields
    /// a single point at 0. When `duration / step` exceeds `MAX_POINTS` the
    /// step widens to `duration / MAX_POINTS`.
    pub fn sample(
        distribution: &dyn Distribution,
        target_rps: f64,
        duration: f64,
        step: f64,
    ) -> Self {
        let valid = step.is_finite() && step > 0.0 && duration.is_finite() && duration > 0.0;
        if !valid {
            return Self {
                points: vec![RatePoint {
                    time: 0.0,
                    rate: distribution.get_rate(0.0, target_rps),
                }],
            };
        }

        let limit = MAX_POINTS as f64;
        let step = if duration / step > limit {
            let widened = duration / limit;
            tracing::debug!(requested = step, widened, "sampling step widened");
            widened
        } else {
            step
        };
        let steps = ((duration / step).floor() as usize).min(MAX_POINTS);
        let mut points = Vec::with_capacity(steps.saturating_add(2));
        for i in 0..=steps {
            let time = (i as f64 * step).min(duration);
            points.push(RatePoint {
                time,
                rate: distribution.get_rate(time, target_rps),
            });
        }
        if points.last().map_or(true, |p| p.time < duration) {
            points.push(RatePoint {
                time: duration,
                rate: distribution.get_rate(duration, target_rps),
            });
        }
        Self { points }
    }

    /// Expected number of requests over the sampled span (trapezoid rule).
    pub fn expected_requests(&self) -> f64 {
        self.points
            .windows(2)
            .map(|w| 0.5 * (w[0].rate + w[1].rate) * (w[1].time - w[0].time))
            .sum()
    }

    pub fn peak(&self) -> f64 {
        self.points.iter().map(|p| p.rate).fold(0.0, f64::max)
    }

    pub fn mean(&self) -> f64 {
        let span = self.points.last().map_or(0.0, |p| p.time);
        if span > 0.0 {
            self.expected_requests() / span
        } else {
            self.points.first().map_or(0.0, |p| p.rate)
        }
    }
}

/// Gap between requests at `rate`; `None` when nothing should be sent.
pub fn inter_arrival(rate: f64) -> Option<Duration> {
    if rate.is_finite() && rate > 0.0 {
        Duration::try_from_secs_f64(1.0 / rate).ok()
    } else {
        None
    }
}
