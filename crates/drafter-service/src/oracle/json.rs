use serde_json::{Map, Value};

/// Returns the slice of `response` most likely to hold a JSON object.
///
/// Tries, in order: a ```json fence, any other fence whose content starts
/// with `{`, the whole trimmed text, and finally the first balanced `{...}`
/// embedded in prose.
#[must_use]
pub fn locate_json(response: &str) -> Option<&str> {
    if let Some(start) = response.find("```json") {
        let json_start = start + "```json".len();
        if let Some(end) = response[json_start..].find("```") {
            return Some(response[json_start..json_start + end].trim());
        }
    }

    if let Some(start) = response.find("```") {
        let after_fence = start + 3;
        if let Some(nl) = response[after_fence..].find('\n') {
            let body_start = after_fence + nl + 1;
            if let Some(end) = response[body_start..].find("```") {
                let candidate = response[body_start..body_start + end].trim();
                if candidate.starts_with('{') {
                    return Some(candidate);
                }
            }
        }
    }

    let trimmed = response.trim();
    if trimmed.starts_with('{') && trimmed.ends_with('}') {
        return Some(trimmed);
    }

    balanced_object(response)
}

fn balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let candidate = &text[start..];
    let mut depth = 0u32;
    let mut in_string = false;
    let mut escape = false;

    for (i, ch) in candidate.char_indices() {
        if escape {
            escape = false;
            continue;
        }
        match ch {
            '\\' if in_string => escape = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(&candidate[..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Parses the JSON object embedded in `response`, if any.
#[must_use]
pub fn extract_object(response: &str) -> Option<Map<String, Value>> {
    let raw = locate_json(response)?;
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Some(map),
        Ok(_) => None,
        Err(e) => {
            tracing::debug!(error = %e, "Located text is not valid JSON");
            None
        }
    }
}
