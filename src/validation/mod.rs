use bigdecimal::BigDecimal;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

pub const COUNTRY_CODE: &str = "254";
/// Digits after the country code.
pub const SUBSCRIBER_NUMBER_LEN: usize = 9;
pub const ACCOUNT_REFERENCE_MIN_LEN: usize = 3;
pub const ACCOUNT_REFERENCE_MAX_LEN: usize = 64;
pub const TRANSACTION_DESC_MAX_LEN: usize = 128;
pub const AMOUNT_INPUT_MAX_LEN: usize = 64;
pub const PIN_LEN: usize = 4;
pub const MIN_AMOUNT: u64 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

pub type ValidationResult = Result<(), ValidationError>;

pub fn sanitize_string(value: &str) -> String {
    value
        .chars()
        .filter(|ch| !ch.is_control())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn validate_required(field: &'static str, value: &str) -> ValidationResult {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, "must not be empty"));
    }

    Ok(())
}

pub fn validate_max_len(field: &'static str, value: &str, max_len: usize) -> ValidationResult {
    if value.chars().count() > max_len {
        return Err(ValidationError::new(
            field,
            format!("must be at most {} characters", max_len),
        ));
    }

    Ok(())
}

pub fn validate_min_len(field: &'static str, value: &str, min_len: usize) -> ValidationResult {
    if value.chars().count() < min_len {
        return Err(ValidationError::new(
            field,
            format!("must be at least {} characters", min_len),
        ));
    }

    Ok(())
}

/// Digits with at most one decimal point. Exponent notation is refused so the
/// scale of a parsed amount stays bounded by the input length.
fn is_plain_decimal(raw: &str) -> bool {
    let mut parts = raw.splitn(2, '.');
    let whole = parts.next().unwrap_or_default();
    let fraction = parts.next().unwrap_or_default();

    !(whole.is_empty() && fraction.is_empty())
        && whole.chars().all(|ch| ch.is_ascii_digit())
        && fraction.chars().all(|ch| ch.is_ascii_digit())
}

/// Parses a raw amount and checks it is at least the minimum transactable unit.
pub fn parse_amount(raw: &str) -> Result<BigDecimal, ValidationError> {
    let raw = raw.trim();
    validate_required("amount", raw)?;
    validate_max_len("amount", raw, AMOUNT_INPUT_MAX_LEN)?;

    if !is_plain_decimal(raw) {
        return Err(ValidationError::new("amount", "must be a number"));
    }

    let amount = BigDecimal::from_str(raw)
        .map_err(|_| ValidationError::new("amount", "must be a number"))?;

    if amount < BigDecimal::from(MIN_AMOUNT) {
        return Err(ValidationError::new(
            "amount",
            format!("must be at least {}", MIN_AMOUNT),
        ));
    }

    Ok(amount)
}

/// Rounds half-up to whole currency units for transmission.
pub fn round_amount(amount: &BigDecimal) -> Option<u64> {
    let half = BigDecimal::from_str("0.5").ok()?;
    (amount + half).with_scale(0).to_string().parse().ok()
}

/// Strips non-digits, rewrites a leading `0` to the country code and prepends
/// the country code when it is missing. Does not validate the result.
pub fn normalize_phone(raw: &str) -> String {
    let digits: String = raw.chars().filter(|ch| ch.is_ascii_digit()).collect();

    if let Some(rest) = digits.strip_prefix('0') {
        format!("{}{}", COUNTRY_CODE, rest)
    } else if digits.starts_with(COUNTRY_CODE) {
        digits
    } else {
        format!("{}{}", COUNTRY_CODE, digits)
    }
}

fn is_subscriber_number(digits: &str) -> bool {
    digits.len() == SUBSCRIBER_NUMBER_LEN
        && digits.chars().all(|ch| ch.is_ascii_digit())
        && matches!(digits.chars().next(), Some('7') | Some('1'))
}

/// `254` followed by a 9-digit subscriber number starting with 7 or 1.
pub fn is_canonical_phone(phone: &str) -> bool {
    phone
        .strip_prefix(COUNTRY_CODE)
        .map(is_subscriber_number)
        .unwrap_or(false)
}

/// Shapes a user may type into the phone field: `07XXXXXXXX`, `2547XXXXXXXX`
/// or `+2547XXXXXXXX`. Normalization happens server-side.
pub fn is_accepted_phone_entry(raw: &str) -> bool {
    let raw = raw.trim();
    let rest = raw
        .strip_prefix('+')
        .and_then(|r| r.strip_prefix(COUNTRY_CODE))
        .or_else(|| raw.strip_prefix(COUNTRY_CODE))
        .or_else(|| raw.strip_prefix('0'));

    rest.map(is_subscriber_number).unwrap_or(false)
}

/// Normalizes and validates a phone number, returning the canonical form.
pub fn validate_phone(raw: &str) -> Result<String, ValidationError> {
    validate_required("phoneNumber", raw)?;
    let normalized = normalize_phone(raw);

    if !is_canonical_phone(&normalized) {
        return Err(ValidationError::new(
            "phoneNumber",
            format!(
                "must be a valid number in the format {}XXXXXXXXX",
                COUNTRY_CODE
            ),
        ));
    }

    Ok(normalized)
}

pub fn validate_account_reference(raw: &str) -> Result<String, ValidationError> {
    let reference = sanitize_string(raw);
    validate_required("accountReference", &reference)?;
    validate_min_len("accountReference", &reference, ACCOUNT_REFERENCE_MIN_LEN)?;
    validate_max_len("accountReference", &reference, ACCOUNT_REFERENCE_MAX_LEN)?;
    Ok(reference)
}

pub fn validate_transaction_desc(raw: &str) -> Result<String, ValidationError> {
    let desc = sanitize_string(raw);
    validate_max_len("transactionDesc", &desc, TRANSACTION_DESC_MAX_LEN)?;
    Ok(desc)
}

pub fn validate_pin(pin: &str) -> ValidationResult {
    if pin.len() != PIN_LEN || !pin.chars().all(|ch| ch.is_ascii_digit()) {
        return Err(ValidationError::new(
            "pin",
            format!("must be exactly {} digits", PIN_LEN),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validates_required_field() {
        assert!(validate_required("field", "value").is_ok());
        assert!(validate_required("field", "   ").is_err());
    }

    #[test]
    fn validates_max_len() {
        assert!(validate_max_len("field", "abc", 3).is_ok());
        assert!(validate_max_len("field", "abcd", 3).is_err());
    }

    #[test]
    fn sanitizes_string() {
        assert_eq!(sanitize_string("  hello\tworld  "), "hello world");
        assert_eq!(sanitize_string(" \n "), "");
        assert_eq!(sanitize_string("ab\u{0000}cd\u{0007}"), "abcd");
    }

    #[test]
    fn parses_amounts() {
        assert_eq!(parse_amount("500").unwrap(), BigDecimal::from(500));
        assert!(parse_amount("1").is_ok());
        assert!(parse_amount(" 10.50 ").is_ok());
        assert!(parse_amount("0").is_err());
        assert!(parse_amount("0.99").is_err());
        assert!(parse_amount("-5").is_err());
        assert!(parse_amount("abc").is_err());
        assert!(parse_amount("").is_err());
        assert!(parse_amount(".").is_err());
        assert!(parse_amount("1.2.3").is_err());
        assert!(parse_amount("+500").is_err());
    }

    #[test]
    fn rounds_half_up() {
        let round = |s: &str| round_amount(&BigDecimal::from_str(s).unwrap());
        assert_eq!(round("10"), Some(10));
        assert_eq!(round("10.49"), Some(10));
        assert_eq!(round("10.5"), Some(11));
        assert_eq!(round("1.01"), Some(1));
    }

    #[test]
    fn normalizes_to_canonical_form() {
        assert_eq!(normalize_phone("0712345678"), "254712345678");
        assert_eq!(normalize_phone("712345678"), "254712345678");
        assert_eq!(normalize_phone("254712345678"), "254712345678");
        assert_eq!(normalize_phone("+254 712-345-678"), "254712345678");
    }

    #[test]
    fn normalization_is_idempotent() {
        for raw in ["0712345678", "712345678", "+254712345678", "0110345678"] {
            let once = normalize_phone(raw);
            assert_eq!(normalize_phone(&once), once);
        }
    }

    #[test]
    fn rejects_malformed_phones() {
        assert!(validate_phone("0712345678").is_ok());
        assert!(validate_phone("071234567").is_err());
        assert!(validate_phone("07123456789").is_err());
        assert!(validate_phone("255712345678").is_err());
        assert!(validate_phone("0812345678").is_err());
        assert!(validate_phone("").is_err());
    }

    #[test]
    fn accepts_typed_phone_shapes() {
        assert!(is_accepted_phone_entry("0712345678"));
        assert!(is_accepted_phone_entry("254712345678"));
        assert!(is_accepted_phone_entry("+254712345678"));
        assert!(!is_accepted_phone_entry("712345678"));
        assert!(!is_accepted_phone_entry("07123"));
        assert!(!is_accepted_phone_entry("+255712345678"));
    }

    #[test]
    fn validates_account_reference() {
        assert_eq!(validate_account_reference(" INV-1 ").unwrap(), "INV-1");
        assert!(validate_account_reference("AB").is_err());
        assert!(validate_account_reference("   ").is_err());
        assert!(validate_account_reference(&"A".repeat(65)).is_err());
    }

    #[test]
    fn validates_pin() {
        assert!(validate_pin("1234").is_ok());
        assert!(validate_pin("123").is_err());
        assert!(validate_pin("12345").is_err());
        assert!(validate_pin("12a4").is_err());
    }

    #[test]
    fn rejects_exponent_notation_without_expanding_it() {
        let started = std::time::Instant::now();
        for raw in ["1e99999999", "1E99999999", "5e2", "1e-99999999", "9.9e99999999"] {
            let err = parse_amount(raw).unwrap_err();
            assert_eq!(err.field, "amount");
            assert_eq!(err.message, "must be a number");
        }
        assert!(started.elapsed() < std::time::Duration::from_secs(1));
    }

    #[test]
    fn longest_accepted_amount_is_out_of_range_not_slow() {
        let raw = "9".repeat(AMOUNT_INPUT_MAX_LEN);
        let amount = parse_amount(&raw).unwrap();
        assert_eq!(round_amount(&amount), None);
    }
}
