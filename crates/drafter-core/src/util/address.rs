//! Email address helpers.
//!
//! ## Summary
//! Syntactic checks only ("local@domain.tld"); no DNS or mailbox validation.

use std::sync::OnceLock;

use regex::Regex;

fn re_address() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9._%+'\-]+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}$")
            .unwrap_or_else(|e| unreachable!("address pattern is valid: {e}"))
    })
}

fn re_embedded() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"[<(]\s*([^\s<>()]+@[^\s<>()]+)\s*[>)]")
            .unwrap_or_else(|e| unreachable!("embedded address pattern is valid: {e}"))
    })
}

/// Returns true when `value` is a bare address such as `jane@example.com`.
#[must_use]
pub fn is_email_address(value: &str) -> bool {
    re_address().is_match(value.trim())
}

/// Derive a display name from an email address (best-effort).
///
/// Example: "sarah.chen@acme.com" -> "Sarah Chen"
#[must_use]
pub fn name_from_email(email: &str) -> String {
    let local = email.split('@').next().unwrap_or(email);
    local
        .split(['.', '_', '-', '+'])
        .filter(|s| !s.is_empty())
        .map(|s| {
            let mut chars = s.chars();
            match chars.next() {
                Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Splits `"Name <addr>"` or `"Name (addr)"` into its name and address.
///
/// Returns `None` when no bracketed address is present or the bracketed text
/// is not a valid address. The name is `None` when nothing but the address
/// was supplied.
#[must_use]
pub fn split_name_and_address(token: &str) -> Option<(Option<String>, String)> {
    let caps = re_embedded().captures(token)?;
    let whole = caps.get(0)?;
    let address = caps.get(1)?.as_str().trim().to_string();
    if !is_email_address(&address) {
        return None;
    }

    let mut name = String::with_capacity(token.len());
    name.push_str(&token[..whole.start()]);
    name.push(' ');
    name.push_str(&token[whole.end()..]);
    let name = name
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_matches(|c: char| c == '"' || c == '\'' || c == ',' || c.is_whitespace())
        .to_string();

    Some(((!name.is_empty()).then_some(name), address))
}

/// Lowercased address used for de-duplication.
#[must_use]
pub fn normalize_address(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}
