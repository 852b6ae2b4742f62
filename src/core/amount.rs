use serde::{Serialize, Serializer};
use serde_json::Value;

/// Largest amount accepted from user input. Anything above is
/// most likely a typo.
pub const MAX_AMOUNT: f64 = 1_000_000.0;

/// A monetary value rounded to whole cents.
#[derive(Clone, Copy, PartialEq, PartialOrd, Debug, Default)]
pub struct Amount(f64);

impl Amount {
    /// Rounds a finite value to cents. Returns `None` for NaN and infinities.
    pub fn from_f64(value: f64) -> Option<Amount> {
        if !value.is_finite() {
            return None;
        }
        Some(Amount(round_to_cents(value)))
    }

    /// Coerces a loosely typed JSON value (a number, or text using either
    /// a comma or a dot as decimal separator) into a rounded amount.
    pub fn coerce(value: &Value) -> Option<Amount> {
        coerce_number(value).and_then(Amount::from_f64)
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0.0
    }
}

impl std::ops::Add for Amount {
    type Output = Amount;

    fn add(self, other: Amount) -> Amount {
        Amount(round_to_cents(self.0 + other.0))
    }
}

impl std::iter::Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Amount {
        iter.fold(Amount::default(), |acc, amount| acc + amount)
    }
}

impl std::fmt::Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.0)
    }
}

pub fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Reads a finite number out of a JSON value. Text is trimmed and its
/// first comma is taken as the decimal separator.
pub fn coerce_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(number) => number.as_f64()?,
        Value::String(text) => text.trim().replacen(',', ".", 1).parse::<f64>().ok()?,
        _ => return None,
    };
    number.is_finite().then_some(number)
}
