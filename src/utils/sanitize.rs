use serde_json::Value;

/// Sanitizes sensitive fields in JSON payloads for logging
pub fn sanitize_json(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            // gateway metadata items: {"Name": "PhoneNumber", "Value": ...}
            let named_sensitive = map
                .get("Name")
                .and_then(Value::as_str)
                .map(is_sensitive_field)
                .unwrap_or(false);

            let mut sanitized = serde_json::Map::new();
            for (key, val) in map {
                let sanitized_val = if named_sensitive && key == "Value" {
                    mask_value(val)
                } else if is_secret_field(key) {
                    Value::String("****".to_string())
                } else if is_sensitive_field(key) {
                    mask_value(val)
                } else {
                    sanitize_json(val)
                };
                sanitized.insert(key.clone(), sanitized_val);
            }
            Value::Object(sanitized)
        }
        Value::Array(arr) => Value::Array(arr.iter().map(sanitize_json).collect()),
        _ => value.clone(),
    }
}

/// Never logged, not even partially.
fn is_secret_field(key: &str) -> bool {
    matches!(
        key.to_lowercase().as_str(),
        "pin" | "password" | "passkey" | "secret" | "consumer_secret" | "access_token" | "token"
            | "authorization"
    )
}

fn is_sensitive_field(key: &str) -> bool {
    matches!(
        key.to_lowercase().as_str(),
        "phonenumber" | "phone_number" | "phone" | "partya" | "msisdn"
    )
}

fn mask_value(value: &Value) -> Value {
    let raw = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => return Value::String("****".to_string()),
    };

    let chars: Vec<char> = raw.chars().collect();
    if chars.len() > 8 {
        let visible: String = chars[..4].iter().collect();
        let end: String = chars[chars.len() - 3..].iter().collect();
        Value::String(format!("{}****{}", visible, end))
    } else {
        Value::String("****".to_string())
    }
}
