//! Lenient numeric deserialization for provider payloads.
//!
//! Keyword providers are inconsistent about numbers: volumes arrive as JSON
//! numbers, micro-currency bids as strings (64-bit integers do not survive
//! JavaScript), and CPC as a decimal string such as `"1.20"`, sometimes
//! wrapped in `{"currency": "$", "value": "1.20"}`.

use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(f64),
    Text(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MoneyField {
    Wrapped { value: Option<NumberOrString> },
    Bare(NumberOrString),
}

/// Parses a decimal string, tolerating surrounding whitespace, thousands
/// separators and a leading currency symbol. Blank strings are zero.
pub(crate) fn parse_decimal_str(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .trim_start_matches(['$', '€', '£'])
        .chars()
        .filter(|c| *c != ',')
        .collect();
    if cleaned.is_empty() {
        return Some(0.0);
    }
    Decimal::from_str(&cleaned)
        .ok()
        .and_then(|d| d.to_f64())
        .or_else(|| cleaned.parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

fn resolve<E: serde::de::Error>(value: Option<NumberOrString>) -> Result<f64, E> {
    match value {
        None => Ok(0.0),
        Some(NumberOrString::Number(n)) => Ok(n),
        Some(NumberOrString::Text(s)) => parse_decimal_str(&s)
            .ok_or_else(|| E::custom(format!("expected a numeric string, got {s:?}"))),
    }
}

/// A number, a numeric string, or `null` (read as `0.0`).
pub(crate) fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    resolve(Option::<NumberOrString>::deserialize(deserializer)?)
}

/// Like [`lenient_f64`] but keeps `null` as `None`.
pub(crate) fn lenient_opt_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<NumberOrString>::deserialize(deserializer)? {
        None => Ok(None),
        some => resolve(some).map(Some),
    }
}

/// A money amount, either bare or wrapped in an object with a `value` field.
pub(crate) fn money_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<MoneyField>::deserialize(deserializer)? {
        None => Ok(0.0),
        Some(MoneyField::Wrapped { value }) => resolve(value),
        Some(MoneyField::Bare(v)) => resolve(Some(v)),
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Deserialize)]
    struct Row {
        #[serde(default, deserialize_with = "lenient_f64")]
        vol: f64,
        #[serde(default, deserialize_with = "money_f64")]
        cpc: f64,
        #[serde(default, deserialize_with = "lenient_opt_f64")]
        credits: Option<f64>,
    }

    fn row(json: &str) -> Row {
        serde_json::from_str(json).expect("row should parse")
    }

    #[test]
    fn accepts_numbers_and_strings() {
        let r = row(r#"{"vol": 500, "cpc": "1.20", "credits": "42"}"#);
        assert!((r.vol - 500.0).abs() < f64::EPSILON);
        assert!((r.cpc - 1.2).abs() < 1e-9);
        assert_eq!(r.credits, Some(42.0));
    }

    #[test]
    fn unwraps_currency_object() {
        let r = row(r#"{"cpc": {"currency": "$", "value": "0.85"}}"#);
        assert!((r.cpc - 0.85).abs() < 1e-9);
    }

    #[test]
    fn null_and_missing_are_zero() {
        let r = row(r#"{"vol": null, "cpc": {"currency": "$", "value": null}}"#);
        assert!(r.vol.abs() < f64::EPSILON);
        assert!(r.cpc.abs() < f64::EPSILON);
        assert_eq!(r.credits, None);
    }

    #[test]
    fn strips_separators_and_symbols() {
        assert_eq!(parse_decimal_str("1,200"), Some(1200.0));
        assert_eq!(parse_decimal_str(" $3.50 "), Some(3.5));
        assert_eq!(parse_decimal_str(""), Some(0.0));
    }

    #[test]
    fn rejects_garbage_strings() {
        let result = serde_json::from_str::<Row>(r#"{"vol": "lots"}"#);
        assert!(result.is_err());
    }
}
