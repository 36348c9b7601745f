use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Wraps sensitive values (card numbers, emails) so `{:?}` and `{}` in
/// tracing macros never print them.
#[derive(Clone, Deserialize, PartialEq, Eq)]
pub struct Masked<T>(pub T);

impl<T> fmt::Debug for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "********")
    }
}

impl<T> fmt::Display for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "********")
    }
}

impl<T: Serialize> Serialize for Masked<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        // API payloads need the real value; masking is for log output only.
        self.0.serialize(serializer)
    }
}

impl<T> Masked<T> {
    pub fn into_inner(self) -> T {
        self.0
    }

    pub fn expose(&self) -> &T {
        &self.0
    }
}

/// `4242 4242 4242 4242` → `**** **** **** 4242`
pub fn mask_card_number(number: &str) -> String {
    let digits: Vec<char> = number.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() < 4 {
        return "****".to_string();
    }
    let last4: String = digits[digits.len() - 4..].iter().collect();
    format!("**** **** **** {}", last4)
}

/// `jane.doe@example.com` → `j***@example.com`
pub fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() => {
            let first = local.chars().next().unwrap_or('*');
            format!("{}***@{}", first, domain)
        }
        _ => "***".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_masked_debug_hides_value() {
        let card = Masked("4242424242424242".to_string());
        assert_eq!(format!("{:?}", card), "********");
        assert_eq!(format!("{}", card), "********");
        assert_eq!(card.expose(), "4242424242424242");
    }

    #[test]
    fn test_mask_card_number() {
        assert_eq!(mask_card_number("4242 4242 4242 4242"), "**** **** **** 4242");
        assert_eq!(mask_card_number("12"), "****");
    }

    #[test]
    fn test_mask_email() {
        assert_eq!(mask_email("jane.doe@example.com"), "j***@example.com");
        assert_eq!(mask_email("nope"), "***");
    }
}
