use serde_json::Value;

/// Strip markdown code fences from a string.
/// Handles ```json\n...\n```, ```\n...\n```, and bare text.
pub fn strip_code_fences(s: &str) -> String {
    let trimmed = s.trim();
    if let Some(rest) = trimmed.strip_prefix("```") {
        // Skip optional language tag on the first line.
        let rest = match rest.find('\n') {
            Some(after_newline) => &rest[after_newline + 1..],
            None => rest,
        };
        let rest = rest.strip_suffix("```").unwrap_or(rest);
        rest.trim().to_string()
    } else {
        trimmed.to_string()
    }
}

/// Best-effort extraction of the first JSON object in model output.
///
/// Tries the whole (unfenced) text first, then every balanced `{...}`
/// span in order. Returns `None` when nothing parses.
pub fn extract_json(text: &str) -> Option<Value> {
    let cleaned = strip_code_fences(text);
    if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(&cleaned) {
        return Some(value);
    }

    let bytes = cleaned.as_bytes();
    let mut start = 0;
    while let Some(offset) = cleaned[start..].find('{') {
        let open = start + offset;
        if let Some(close) = balanced_end(&bytes[open..]) {
            if let Ok(value) = serde_json::from_str::<Value>(&cleaned[open..=open + close]) {
                return Some(value);
            }
        }
        start = open + 1;
    }
    None
}

/// Index of the brace closing the object that starts at `bytes[0]`.
fn balanced_end(bytes: &[u8]) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate() {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// String field from an extracted object, trimmed and non-empty.
pub fn json_str<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_code_fences_json() {
        let input = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_code_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_code_fences_none() {
        assert_eq!(strip_code_fences("  plain  "), "plain");
    }

    #[test]
    fn test_extract_embedded_object() {
        let text = "Claro, aquí va: {\"summary\": \"En reparto {zona norte}\", \"confidence\": 0.8} espero que sirva";
        let value = extract_json(text).unwrap();
        assert_eq!(json_str(&value, "summary"), Some("En reparto {zona norte}"));
    }

    #[test]
    fn test_extract_skips_unparseable_braces() {
        let text = "{no es json} luego {\"ok\": true}";
        assert_eq!(extract_json(text).unwrap()["ok"], Value::Bool(true));
    }

    #[test]
    fn test_extract_fenced_and_missing() {
        assert!(extract_json("```json\n{\"a\": 1}\n```").is_some());
        assert!(extract_json("sin datos estructurados").is_none());
        assert!(extract_json("{\"abierto\": ").is_none());
    }
}
