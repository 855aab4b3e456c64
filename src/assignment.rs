use std::collections::HashSet;
use std::fmt;

use anyhow::{Result, anyhow, bail};
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub const DEFAULT_VARIANTS: [&str; 3] = ["A", "B", "C"];
pub const DEFAULT_PLACEMENTS: [&str; 3] = ["P1", "P2", "P3"];

/// A (variant, placement) pair. Borrowed from the configuration that produced it;
/// cells are recomputed on every call and never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ExperimentCell<'a> {
    pub variant: &'a str,
    pub placement: &'a str,
}

/// Process-wide experiment settings, bound once at startup.
///
/// The keyed MAC is prepared here so that [`ExperimentConfig::assign`] is
/// infallible and only clones the keyed state per call.
#[derive(Clone)]
pub struct ExperimentConfig {
    mac: HmacSha256,
    variants: Vec<String>,
    placements: Vec<String>,
}

impl ExperimentConfig {
    pub fn new(secret_key: &[u8], variants: Vec<String>, placements: Vec<String>) -> Result<Self> {
        if secret_key.is_empty() {
            bail!("experiment secret key must not be empty");
        }
        validate_options("variant", &variants)?;
        validate_options("placement", &placements)?;

        let mac = HmacSha256::new_from_slice(secret_key)
            .map_err(|err| anyhow!("failed to key HMAC-SHA256 with the experiment secret: {err}"))?;

        Ok(Self {
            mac,
            variants,
            placements,
        })
    }

    pub fn variants(&self) -> &[String] {
        &self.variants
    }

    pub fn placements(&self) -> &[String] {
        &self.placements
    }

    /// Map an identifier to its experiment cell.
    ///
    /// Callers reject empty identifiers before getting here. The first two
    /// big-endian 32-bit words of `HMAC-SHA256(secret, identifier)` drive the
    /// variant and placement buckets independently.
    pub fn assign(&self, identifier: &str) -> ExperimentCell<'_> {
        let mut mac = self.mac.clone();
        mac.update(identifier.as_bytes());
        let digest = mac.finalize().into_bytes();

        let variant_bucket = unit_bucket([digest[0], digest[1], digest[2], digest[3]]);
        let placement_bucket = unit_bucket([digest[4], digest[5], digest[6], digest[7]]);

        ExperimentCell {
            variant: pick(&self.variants, variant_bucket),
            placement: pick(&self.placements, placement_bucket),
        }
    }
}

impl fmt::Debug for ExperimentConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExperimentConfig")
            .field("secret", &"<redacted>")
            .field("variants", &self.variants)
            .field("placements", &self.placements)
            .finish()
    }
}

fn validate_options(kind: &str, options: &[String]) -> Result<()> {
    if options.is_empty() {
        bail!("at least one {kind} must be configured");
    }

    let mut seen = HashSet::with_capacity(options.len());
    for option in options {
        if option.trim().is_empty() {
            bail!("{kind} names must not be blank");
        }
        if !seen.insert(option.as_str()) {
            bail!("duplicate {kind} configured: {option}");
        }
    }

    Ok(())
}

/// Normalize a 32-bit word into [0, 1]. `u32::MAX` maps to exactly 1.0.
fn unit_bucket(word: [u8; 4]) -> f64 {
    f64::from(u32::from_be_bytes(word)) / f64::from(u32::MAX)
}

fn pick(options: &[String], bucket: f64) -> &str {
    // bucket == 1.0 lands on len, which wraps to the first option
    let index = (bucket * options.len() as f64) as usize % options.len();
    &options[index]
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn owned(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    fn default_config(secret: &[u8]) -> ExperimentConfig {
        ExperimentConfig::new(secret, owned(&DEFAULT_VARIANTS), owned(&DEFAULT_PLACEMENTS))
            .expect("default config should be valid")
    }

    #[test]
    fn assign_is_stable_across_calls_and_config_instances() {
        let first = default_config(b"changeme");
        let second = default_config(b"changeme");

        let cell = first.assign("user-42");
        for _ in 0..100 {
            assert_eq!(first.assign("user-42"), cell);
        }
        assert_eq!(second.assign("user-42"), cell);
    }

    #[test]
    fn assign_matches_reference_buckets() {
        let config = default_config(b"changeme");

        let cell = config.assign("user-42");
        assert_eq!((cell.variant, cell.placement), ("C", "P1"));

        let cell = config.assign("alice");
        assert_eq!((cell.variant, cell.placement), ("A", "P3"));

        let cell = config.assign("bob");
        assert_eq!((cell.variant, cell.placement), ("C", "P3"));
    }

    #[test]
    fn every_cell_is_reachable_with_a_roughly_even_split() {
        let config = default_config(b"changeme");
        let mut counts: HashMap<(String, String), usize> = HashMap::new();

        for index in 0..9_000 {
            let cell = config.assign(&format!("visitor-{index}"));
            *counts
                .entry((cell.variant.to_string(), cell.placement.to_string()))
                .or_default() += 1;
        }

        assert_eq!(counts.len(), 9);
        for (cell, count) in counts {
            assert!(
                (700..=1_300).contains(&count),
                "cell {cell:?} received {count} of 9000 identifiers"
            );
        }
    }

    #[test]
    fn changing_the_secret_changes_the_mapping() {
        let original = default_config(b"changeme");
        let rotated = default_config(b"rotated-secret");

        let moved = (0..500)
            .map(|index| format!("visitor-{index}"))
            .filter(|id| original.assign(id) != rotated.assign(id))
            .count();

        assert!(moved > 100, "only {moved} of 500 identifiers moved");
    }

    #[test]
    fn custom_option_lists_are_respected() {
        let config = ExperimentConfig::new(
            b"changeme",
            owned(&["control", "treatment"]),
            owned(&["top"]),
        )
        .expect("config should be valid");

        let mut variants = HashSet::new();
        for index in 0..200 {
            let cell = config.assign(&format!("visitor-{index}"));
            assert_eq!(cell.placement, "top");
            variants.insert(cell.variant);
        }
        assert_eq!(variants.len(), 2);
    }

    #[test]
    fn config_rejects_empty_or_duplicate_options() {
        assert!(ExperimentConfig::new(b"k", Vec::new(), owned(&["P1"])).is_err());
        assert!(ExperimentConfig::new(b"k", owned(&["A"]), Vec::new()).is_err());
        assert!(ExperimentConfig::new(b"k", owned(&["A", "A"]), owned(&["P1"])).is_err());
        assert!(ExperimentConfig::new(b"k", owned(&["A", " "]), owned(&["P1"])).is_err());
        assert!(ExperimentConfig::new(b"", owned(&["A"]), owned(&["P1"])).is_err());
    }

    #[test]
    fn top_of_range_bucket_wraps_to_first_option() {
        let options = owned(&["A", "B", "C"]);
        assert_eq!(unit_bucket([0xFF; 4]), 1.0);
        assert_eq!(pick(&options, 1.0), "A");
        assert_eq!(pick(&options, 0.0), "A");
        assert_eq!(pick(&options, 0.5), "B");
        assert_eq!(pick(&options, 0.99), "C");
    }

    #[test]
    fn debug_output_hides_the_secret() {
        let rendered = format!("{:?}", default_config(b"super-secret"));
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
