//! Behavior-sketch hashing: `hid_behav`.
//!
//! A canary's output series is summarized into a cheap, order-sensitive
//! sketch -- five quantiles over its finite values, plus a sign-bit trace
//! over its first 256 raw (unfiltered) elements -- and hashed. Two canary
//! runs that actually behave the same way land on the same `hid_behav` even
//! if the underlying float bytes differ in the last bit; two runs that
//! behave differently (different sign pattern, different spread) don't.

use sha2::{Digest, Sha256};

const QUANTILES: [f64; 5] = [0.0, 0.1, 0.5, 0.9, 1.0];
const MAX_SIGN_BYTES: usize = 256;

/// Compute `hid_behav` for a canary's raw output series.
///
/// `series` is the unfiltered output, possibly containing `NaN`/`Inf`.
#[must_use]
pub fn sketch_hash(series: &[f64]) -> String {
    let finite: Vec<f64> = series.iter().copied().filter(|v| v.is_finite()).collect();

    if finite.is_empty() {
        return sha256_hex(b"empty");
    }

    let qs = quantiles(&finite, &QUANTILES);
    let qstr = qs
        .iter()
        .map(|v| format_g(*v, 6))
        .collect::<Vec<_>>()
        .join(",");

    // Sign bits are taken over the RAW series (not the finite-only subset),
    // one full byte (0 or 1) per element, over at most the first 256
    // elements -- matching the behavior a caller observes at the memory
    // boundary, not a post-filtered view of it.
    let sign_bytes: Vec<u8> = series
        .iter()
        .take(MAX_SIGN_BYTES)
        .map(|v| u8::from(*v > 0.0))
        .collect();
    let sign_hex = hex::encode(&sign_bytes);

    let payload = format!("{qstr}|{sign_hex}");
    sha256_hex(payload.as_bytes())
}

fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Linear-interpolation quantiles over an unsorted slice (sorted internally).
fn quantiles(values: &[f64], qs: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).expect("finite values are totally ordered"));

    let n = sorted.len();
    qs.iter()
        .map(|&q| {
            if n == 1 {
                return sorted[0];
            }
            let idx = q * (n - 1) as f64;
            let lo = idx.floor() as usize;
            let hi = idx.ceil() as usize;
            if lo == hi {
                sorted[lo]
            } else {
                let frac = idx - lo as f64;
                sorted[lo] + (sorted[hi] - sorted[lo]) * frac
            }
        })
        .collect()
}

/// Render `v` with `sig` significant digits, `%g`-style: fixed-point for
/// moderate magnitudes, scientific notation (two-digit signed exponent) for
/// very small or very large values, trailing zeros trimmed either way.
fn format_g(v: f64, sig: usize) -> String {
    if v == 0.0 {
        return "0".to_string();
    }

    let magnitude = v.abs().log10().floor() as i32;
    if magnitude < -4 || magnitude >= sig as i32 {
        let mantissa_digits = sig.saturating_sub(1);
        let raw = format!("{v:.mantissa_digits$e}");
        normalize_scientific(&raw)
    } else {
        let decimals = (sig as i32 - 1 - magnitude).max(0) as usize;
        let raw = format!("{v:.decimals$}");
        trim_trailing_zeros(&raw)
    }
}

fn trim_trailing_zeros(s: &str) -> String {
    if !s.contains('.') {
        return s.to_string();
    }
    let trimmed = s.trim_end_matches('0');
    trimmed.trim_end_matches('.').to_string()
}

fn normalize_scientific(s: &str) -> String {
    let Some((mantissa, exponent)) = s.split_once('e') else {
        return s.to_string();
    };
    let mantissa = trim_trailing_zeros(mantissa);
    let exp_value: i32 = exponent.parse().unwrap_or(0);
    let sign = if exp_value < 0 { '-' } else { '+' };
    format!("{mantissa}e{sign}{:02}", exp_value.abs())
}
