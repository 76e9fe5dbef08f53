//! Physical Dimension Signature (PDS) algebra.
//!
//! A PDS is a sparse map from a base-dimension symbol (`"L"`, `"M"`, `"T"`,
//! `"USD"`, ...) to an integer exponent. Under multiplication (exponents
//! add) and division (exponents subtract) the non-zero signatures form a
//! free abelian group; the dimensionless signature `{}` is its identity.
//!
//! The seven SI bases are privileged only for display ordering in
//! [`Pds::canonical_string`]; any other symbol (e.g. `"USD"`) is an equally
//! first-class base for every other purpose.

use std::collections::BTreeMap;
use std::fmt;

/// SI base dimensions in their canonical display order. Any base symbol not
/// in this list sorts after all of these, alphabetically among itself.
const SI_BASE_ORDER: [&str; 7] = ["L", "M", "T", "I", "Theta", "N", "J"];

/// A parse failure for a PDS signature string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdsParseError {
    pub input: String,
    pub reason: String,
}

impl fmt::Display for PdsParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot parse PDS {:?}: {}", self.input, self.reason)
    }
}

impl std::error::Error for PdsParseError {}

/// A Physical Dimension Signature: base symbol -> non-zero integer exponent.
///
/// Exponent `0` is never stored; [`Pds::dimensionless`] is the only
/// representation of the identity element.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Pds {
    exponents: BTreeMap<String, i32>,
}

impl Pds {
    /// The dimensionless signature (the group identity).
    #[must_use]
    pub fn dimensionless() -> Self {
        Self::default()
    }

    /// Build directly from an exponent map, dropping zero entries.
    #[must_use]
    pub fn from_exponents(exponents: impl IntoIterator<Item = (String, i32)>) -> Self {
        let mut map = BTreeMap::new();
        for (base, exp) in exponents {
            if exp != 0 {
                map.insert(base, exp);
            }
        }
        Self { exponents: map }
    }

    #[must_use]
    pub fn is_dimensionless(&self) -> bool {
        self.exponents.is_empty()
    }

    #[must_use]
    pub fn exponents(&self) -> &BTreeMap<String, i32> {
        &self.exponents
    }

    /// Parse a signature string.
    ///
    /// Accepted forms:
    /// - `""`, `"1"`, or `"dimensionless"` -> dimensionless
    /// - a single bare identifier (`"USD"`) -> that base to the power 1
    /// - a `*`- or whitespace-separated list of `BASE` or `BASE^EXP` terms,
    ///   whose per-base exponents are summed (duplicate bases allowed)
    ///
    /// # Errors
    ///
    /// Returns [`PdsParseError`] if a term is malformed (empty base, or a
    /// non-integer/unparsable exponent after `^`).
    pub fn parse(text: &str) -> Result<Self, PdsParseError> {
        let trimmed = text.trim();
        if trimmed.is_empty() || trimmed == "1" || trimmed.eq_ignore_ascii_case("dimensionless") {
            return Ok(Self::dimensionless());
        }

        if is_bare_identifier(trimmed) {
            let mut map = BTreeMap::new();
            map.insert(trimmed.to_string(), 1);
            return Ok(Self { exponents: map });
        }

        let terms = trimmed
            .split(|c: char| c == '*' || c.is_whitespace())
            .filter(|t| !t.is_empty());

        let mut sum: BTreeMap<String, i32> = BTreeMap::new();
        let mut saw_term = false;
        for term in terms {
            saw_term = true;
            let (base, exp) = match term.split_once('^') {
                Some((base, exp_str)) => {
                    let exp: i32 = exp_str.parse().map_err(|_| PdsParseError {
                        input: text.to_string(),
                        reason: format!("invalid exponent {exp_str:?} in term {term:?}"),
                    })?;
                    (base, exp)
                }
                None => (term, 1),
            };
            if base.is_empty() {
                return Err(PdsParseError {
                    input: text.to_string(),
                    reason: format!("empty base in term {term:?}"),
                });
            }
            *sum.entry(base.to_string()).or_insert(0) += exp;
        }

        if !saw_term {
            return Err(PdsParseError {
                input: text.to_string(),
                reason: "no terms found".to_string(),
            });
        }

        sum.retain(|_, exp| *exp != 0);
        Ok(Self { exponents: sum })
    }

    /// Multiply two signatures: exponents add, zero results drop.
    #[must_use]
    pub fn multiply(&self, other: &Self) -> Self {
        let mut result = self.exponents.clone();
        for (base, exp) in &other.exponents {
            *result.entry(base.clone()).or_insert(0) += exp;
        }
        result.retain(|_, exp| *exp != 0);
        Self { exponents: result }
    }

    /// Divide one signature by another: exponents subtract, zero results drop.
    #[must_use]
    pub fn divide(&self, other: &Self) -> Self {
        let mut result = self.exponents.clone();
        for (base, exp) in &other.exponents {
            *result.entry(base.clone()).or_insert(0) -= exp;
        }
        result.retain(|_, exp| *exp != 0);
        Self { exponents: result }
    }

    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        self.exponents == other.exponents
    }

    /// Render in canonical display order: SI bases first (in their fixed
    /// order), then any other bases sorted alphabetically. `"1"` when
    /// dimensionless.
    #[must_use]
    pub fn canonical_string(&self) -> String {
        if self.exponents.is_empty() {
            return "1".to_string();
        }

        let mut si_terms = Vec::new();
        for base in SI_BASE_ORDER {
            if let Some(exp) = self.exponents.get(base) {
                si_terms.push(format_term(base, *exp));
            }
        }

        let mut other_bases: Vec<&String> = self
            .exponents
            .keys()
            .filter(|b| !SI_BASE_ORDER.contains(&b.as_str()))
            .collect();
        other_bases.sort();
        let other_terms: Vec<String> = other_bases
            .into_iter()
            .map(|base| format_term(base, self.exponents[base]))
            .collect();

        si_terms.extend(other_terms);
        si_terms.join("*")
    }
}

impl fmt::Display for Pds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical_string())
    }
}

fn format_term(base: &str, exp: i32) -> String {
    format!("{base}^{exp}")
}

fn is_bare_identifier(text: &str) -> bool {
    !text.is_empty()
        && text
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        && !text.contains('^')
        && !text.contains('*')
        && !text.chars().any(char::is_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimensionless_parses_from_empty_and_one() {
        assert_eq!(Pds::parse("").unwrap(), Pds::dimensionless());
        assert_eq!(Pds::parse("1").unwrap(), Pds::dimensionless());
        assert_eq!(Pds::parse("dimensionless").unwrap(), Pds::dimensionless());
    }

    #[test]
    fn bare_identifier_is_power_one() {
        let pds = Pds::parse("USD").unwrap();
        assert_eq!(pds.exponents().get("USD"), Some(&1));
    }

    #[test]
    fn parses_powers_and_products() {
        let pds = Pds::parse("L*T^-2").unwrap();
        assert_eq!(pds.exponents().get("L"), Some(&1));
        assert_eq!(pds.exponents().get("T"), Some(&-2));
    }

    #[test]
    fn duplicate_bases_sum_exponents() {
        let pds = Pds::parse("L*L").unwrap();
        assert_eq!(pds.exponents().get("L"), Some(&2));
    }

    #[test]
    fn whitespace_separated_terms_parse() {
        let pds = Pds::parse("L M^-1").unwrap();
        assert_eq!(pds.exponents().get("L"), Some(&1));
        assert_eq!(pds.exponents().get("M"), Some(&-1));
    }

    #[test]
    fn malformed_exponent_is_an_error() {
        let err = Pds::parse("L^x").unwrap_err();
        assert!(err.reason.contains("invalid exponent"));
    }

    #[test]
    fn multiply_is_commutative_and_cancels() {
        let velocity = Pds::parse("L*T^-1").unwrap();
        let time = Pds::parse("T").unwrap();
        let product = velocity.multiply(&time);
        assert_eq!(product, Pds::parse("L").unwrap());
    }

    #[test]
    fn divide_by_self_is_dimensionless() {
        let area = Pds::parse("L^2").unwrap();
        assert_eq!(area.divide(&area), Pds::dimensionless());
    }

    #[test]
    fn multiply_then_divide_is_identity() {
        let a = Pds::parse("USD^2*T^-3").unwrap();
        let b = Pds::parse("M").unwrap();
        let roundtrip = a.multiply(&b).divide(&b);
        assert_eq!(roundtrip, a);
    }

    #[test]
    fn canonical_string_orders_si_bases_first() {
        let pds = Pds::from_exponents([
            ("USD".to_string(), 1),
            ("T".to_string(), -2),
            ("L".to_string(), 1),
        ]);
        assert_eq!(pds.canonical_string(), "L^1*T^-2*USD^1");
    }

    #[test]
    fn canonical_string_sorts_non_si_bases_alphabetically() {
        let pds = Pds::from_exponents([("USD".to_string(), 1), ("EUR".to_string(), 1)]);
        assert_eq!(pds.canonical_string(), "EUR^1*USD^1");
    }

    #[test]
    fn canonical_string_dimensionless_is_one() {
        assert_eq!(Pds::dimensionless().canonical_string(), "1");
    }

    #[test]
    fn same_as_ignores_insertion_order() {
        let a = Pds::parse("L*T^-1").unwrap();
        let b = Pds::parse("T^-1*L").unwrap();
        assert!(a.same_as(&b));
    }

    #[test]
    fn from_exponents_drops_zero_entries() {
        let pds = Pds::from_exponents([("L".to_string(), 0), ("M".to_string(), 1)]);
        assert!(!pds.exponents().contains_key("L"));
        assert_eq!(pds.exponents().get("M"), Some(&1));
    }
}
