use anyhow::{Result, bail};
use serde::Serialize;
use tracing::warn;

use crate::model::{CtrRow, EventCount};

/// Two-sided ~95% normal quantile.
pub const DEFAULT_Z: f64 = 1.96;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConfidenceEstimate {
    pub point: f64,
    pub lower: f64,
    pub upper: f64,
}

impl ConfidenceEstimate {
    pub const EMPTY: Self = Self {
        point: 0.0,
        lower: 0.0,
        upper: 0.0,
    };
}

pub fn validate_z(z: f64) -> Result<f64> {
    if !z.is_finite() || z <= 0.0 {
        bail!("z must be a finite positive number, got {z}");
    }
    Ok(z)
}

/// Wilson score interval for `clicks` successes out of `impressions` trials.
///
/// Zero impressions collapse to [`ConfidenceEstimate::EMPTY`]. Clicks beyond
/// impressions are clamped before the proportion is formed, so the result
/// always satisfies `0 <= lower <= point <= upper <= 1`.
pub fn wilson_interval(clicks: u64, impressions: u64, z: f64) -> ConfidenceEstimate {
    if impressions == 0 {
        return ConfidenceEstimate::EMPTY;
    }

    let n = impressions as f64;
    let phat = clicks.min(impressions) as f64 / n;
    let z2 = z * z;

    let denom = 1.0 + z2 / n;
    let center = (phat + z2 / (2.0 * n)) / denom;
    let half = z * ((phat * (1.0 - phat) + z2 / (4.0 * n)) / n).sqrt() / denom;

    // rounding can push a bound past phat at 0% and 100%
    let lower = (center - half).max(0.0).min(phat);
    let upper = (center + half).min(1.0).max(phat);

    ConfidenceEstimate {
        point: phat,
        lower,
        upper,
    }
}

/// Apply the estimator to every group and order rows by
/// (variant, placement, creative).
pub fn summarize(counts: Vec<EventCount>, z: f64) -> Vec<CtrRow> {
    let mut rows: Vec<CtrRow> = counts
        .into_iter()
        .map(|count| {
            if count.clicks > count.impressions {
                warn!(
                    variant = %count.variant,
                    placement = %count.placement,
                    creative_id = %count.creative_id,
                    impressions = count.impressions,
                    clicks = count.clicks,
                    "clicks exceed impressions; clamping for the estimate"
                );
            }
            let estimate = wilson_interval(count.clicks, count.impressions, z);
            CtrRow::from_count(count, estimate)
        })
        .collect();

    rows.sort_by(|a, b| {
        a.variant
            .cmp(&b.variant)
            .then_with(|| a.placement.cmp(&b.placement))
            .then_with(|| a.creative_id.cmp(&b.creative_id))
    });

    rows
}
