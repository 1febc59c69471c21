use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

/// Field deserializer for option groups which never fails on malformed input.
pub(super) fn repair<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Serialize + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(repair_value(&value))
}

/// Decodes `value` as `T`. Keys whose value doesn't fit are reset to the default of `T`, the
/// remaining keys are kept.
pub(super) fn repair_value<T>(value: &Value) -> T
where
    T: DeserializeOwned + Serialize + Default,
{
    let err = match T::deserialize(value) {
        Ok(v) => return v,
        Err(err) => err,
    };
    let Value::Object(fields) = value else {
        warn!(%err, "malformed option group replaced with defaults");
        return T::default();
    };

    let mut candidate = match serde_json::to_value(T::default()) {
        Ok(v @ Value::Object(_)) => v,
        _ => return T::default(),
    };
    for (key, field) in fields {
        let prev = match candidate.as_object_mut() {
            Some(m) => m.insert(key.clone(), field.clone()),
            None => break,
        };
        if let Err(err) = T::deserialize(&candidate) {
            warn!(option = %key, %err, "malformed option replaced with default");
            if let Some(m) = candidate.as_object_mut() {
                match prev {
                    Some(p) => m.insert(key.clone(), p),
                    None => m.remove(key),
                };
            }
        }
    }

    T::deserialize(&candidate).unwrap_or_default()
}

/// Decodes any JSON number into a `u8`, saturating at the bounds of the type.
pub(super) fn saturating_u8<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let n = f64::deserialize(deserializer)?;
    // Float to int casts saturate
    Ok(n.trunc() as u8)
}
