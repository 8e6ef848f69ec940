//! Normalization of node-encoded quantities, addresses and hashes.
//!
//! The node is inconsistent about integer encoding: heights in blocks are bare
//! numbers, everything in receipts is `0x` hex, and legacy transactions carry
//! decimal strings. All of them go through [`parse_quantity`].

use serde::de::{self, Deserialize, Deserializer};
use serde_json::Value;
use thiserror::Error;

/// Errors produced while decoding a quantity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuantityError {
    /// The value is neither a hex string, a decimal string nor a number.
    #[error("invalid quantity: {0}")]
    Invalid(String),

    /// The value does not fit the target integer type.
    #[error("quantity out of range: {0}")]
    OutOfRange(String),
}

/// Parse a quantity string: `0x`-prefixed hex or plain decimal.
pub fn parse_quantity_str(input: &str) -> Result<u128, QuantityError> {
    let trimmed = input.trim();
    let parsed = match trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        Some("") => return Err(QuantityError::Invalid(input.to_string())),
        Some(hex) => u128::from_str_radix(hex, 16),
        None => trimmed.parse::<u128>(),
    };
    parsed.map_err(|e| match e.kind() {
        std::num::IntErrorKind::PosOverflow => QuantityError::OutOfRange(input.to_string()),
        _ => QuantityError::Invalid(input.to_string()),
    })
}

/// Parse a JSON value holding a quantity.
pub fn parse_quantity(value: &Value) -> Result<u128, QuantityError> {
    match value {
        Value::String(s) => parse_quantity_str(s),
        Value::Number(n) => n
            .as_u64()
            .map(u128::from)
            .ok_or_else(|| QuantityError::Invalid(n.to_string())),
        other => Err(QuantityError::Invalid(other.to_string())),
    }
}

/// Lowercase an address so the same account always compares equal.
pub fn normalize_address(address: &str) -> String {
    address.to_lowercase()
}

/// Ensure a transaction hash carries the `0x` prefix.
///
/// Legacy (v2) transactions report their hash without it, while receipts
/// always include it; joins on the hash need both sides in one form.
pub fn fix_tx_hash(hash: &str) -> String {
    if hash.starts_with("0x") {
        hash.to_string()
    } else {
        format!("0x{hash}")
    }
}

fn deserialize_opt_quantity<'de, D>(deserializer: D) -> Result<Option<u128>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(value) => parse_quantity(&value).map(Some).map_err(de::Error::custom),
    }
}

/// Serde adapter for optional `u128` quantities.
pub fn opt_u128<'de, D>(deserializer: D) -> Result<Option<u128>, D::Error>
where
    D: Deserializer<'de>,
{
    deserialize_opt_quantity(deserializer)
}

/// Serde adapter for optional `u64` quantities.
pub fn opt_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    deserialize_opt_quantity(deserializer)?
        .map(|v| {
            u64::try_from(v).map_err(|_| de::Error::custom(QuantityError::OutOfRange(v.to_string())))
        })
        .transpose()
}

/// Serde adapter for optional `i64` quantities (timestamps).
pub fn opt_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    deserialize_opt_quantity(deserializer)?
        .map(|v| {
            i64::try_from(v).map_err(|_| de::Error::custom(QuantityError::OutOfRange(v.to_string())))
        })
        .transpose()
}

/// Serde adapter for a required `u64` quantity.
pub fn u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    opt_u64(deserializer)?.ok_or_else(|| de::Error::custom("missing quantity"))
}

/// Serde adapter for an optional address, lowercased on the way in.
pub fn opt_address<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.map(|a| normalize_address(&a)))
}
