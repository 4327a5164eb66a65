use std::fmt;

use serde_json::Value;

/// Canonical form of an indexed property value.
///
/// Values are keyed by their compact JSON text, so `5` and `"5"` land in
/// different buckets, exactly as they compare in the resource data. A
/// top-level integral float is keyed as the integer it equals, so `5.0`
/// finds `5`; numbers nested in arrays or objects are not normalized.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IndexKey(String);

/// Largest magnitude at which every integer is exactly representable in f64.
const MAX_EXACT_F64: f64 = 9_007_199_254_740_992.0;

impl IndexKey {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Number(n) => match n.as_f64() {
                Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() <= MAX_EXACT_F64 => {
                    Self((f as i64).to_string())
                }
                _ => Self(n.to_string()),
            },
            _ => Self(value.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&Value> for IndexKey {
    fn from(value: &Value) -> Self {
        Self::of(value)
    }
}

impl fmt::Debug for IndexKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IndexKey({})", self.0)
    }
}
