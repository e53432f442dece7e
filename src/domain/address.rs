//! Aptos account address helpers

/// Longest hex payload of an account address (32 bytes)
const MAX_HEX_LEN: usize = 64;

/// `0x` followed by 1 to 64 hex digits
pub fn is_valid_address(address: &str) -> bool {
    let Some(payload) = hex_payload(address.trim()) else {
        return false;
    };
    !payload.is_empty()
        && payload.len() <= MAX_HEX_LEN
        && payload.chars().all(|c| c.is_ascii_hexdigit())
}

/// Trimmed, lowercase, `0x`-prefixed form. `None` if not a valid address.
pub fn normalize_address(address: &str) -> Option<String> {
    let trimmed = address.trim();
    if !is_valid_address(trimmed) {
        return None;
    }
    hex_payload(trimmed).map(|payload| format!("0x{}", payload.to_lowercase()))
}

/// Shorten an address for display: `0x1234...abcd`
pub fn truncate_address(address: &str) -> String {
    let value = address.trim();
    if value.chars().count() <= 12 {
        return value.to_string();
    }
    let start: String = value.chars().take(6).collect();
    let end: String = value
        .chars()
        .rev()
        .take(4)
        .collect::<String>()
        .chars()
        .rev()
        .collect();
    format!("{}...{}", start, end)
}

fn hex_payload(value: &str) -> Option<&str> {
    value.strip_prefix("0x").or_else(|| value.strip_prefix("0X"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_validation() {
        assert!(is_valid_address("0x1"));
        assert!(is_valid_address(&format!("0x{}", "a".repeat(64))));
        assert!(!is_valid_address(&format!("0x{}", "a".repeat(65))));
        assert!(!is_valid_address("0x"));
        assert!(!is_valid_address("abcdef"));
        assert!(!is_valid_address("0xnothex"));
        assert!(!is_valid_address(""));
    }

    #[test]
    fn test_normalize_address() {
        assert_eq!(normalize_address(" 0XABcd "), Some("0xabcd".to_string()));
        assert_eq!(normalize_address("bob"), None);
    }

    #[test]
    fn test_truncate_address() {
        assert_eq!(truncate_address("0x1"), "0x1");
        assert_eq!(
            truncate_address("0x1234567890abcdef1234567890abcdef"),
            "0x1234...cdef"
        );
    }
}
