use serde_json::Value;

/// Deep-merges `source` onto `target`.
///
/// Objects merge key by key, anything else in `source` (scalars, arrays, `null`) replaces the
/// target value. A `source` that isn't an object leaves `target` untouched.
pub fn merge_deep(target: &mut Value, source: &Value) {
    let Value::Object(src) = source else {
        if !source.is_null() {
            tracing::warn!("ignoring options that are not an object");
        }
        return;
    };
    let Value::Object(dst) = target else {
        *target = source.clone();
        return;
    };

    for (key, value) in src {
        if value.is_object() {
            if let Some(existing @ Value::Object(_)) = dst.get_mut(key) {
                merge_deep(existing, value);
                continue;
            }
        }
        dst.insert(key.clone(), value.clone());
    }
}
