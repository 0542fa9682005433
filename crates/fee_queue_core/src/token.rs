//! crates/fee_queue_core/src/token.rs
//!
//! Human-facing identifier generation: queue token numbers handed to students
//! at admission, and receipt numbers stamped on completion.
//!
//! Both keep the original external shape (`TKN` / `REC` + digits). Token
//! numbers are display artifacts; entry identity is the UUID, so a collision
//! degrades display, not correctness.

use chrono::Utc;
use rand::Rng;

/// Generates a queue token number: `TKN` + last 6 digits of the current epoch
/// millis + a zero-padded 3-digit random suffix.
pub fn token_number() -> String {
    let suffix = rand::thread_rng().gen_range(0..1000);
    format_token_number(Utc::now().timestamp_millis(), suffix)
}

/// Generates a receipt number: `REC` + last 8 digits of the current epoch
/// millis.
pub fn receipt_number() -> String {
    format_receipt_number(Utc::now().timestamp_millis())
}

fn format_token_number(epoch_millis: i64, suffix: u32) -> String {
    format!("TKN{}{:03}", last_digits(epoch_millis, 6), suffix)
}

fn format_receipt_number(epoch_millis: i64) -> String {
    format!("REC{}", last_digits(epoch_millis, 8))
}

fn last_digits(epoch_millis: i64, n: usize) -> String {
    let digits = epoch_millis.to_string();
    digits[digits.len().saturating_sub(n)..].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_number_has_original_shape() {
        assert_eq!(format_token_number(1_700_000_123_456, 7), "TKN123456007");
        assert_eq!(format_token_number(1_700_000_123_456, 999), "TKN123456999");
    }

    #[test]
    fn receipt_number_keeps_last_eight_digits() {
        assert_eq!(format_receipt_number(1_700_012_345_678), "REC12345678");
    }

    #[test]
    fn generated_token_is_tkn_plus_nine_digits() {
        let token = token_number();
        assert!(token.starts_with("TKN"));
        assert_eq!(token.len(), 12);
        assert!(token[3..].chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn generated_receipt_is_rec_plus_eight_digits() {
        let receipt = receipt_number();
        assert!(receipt.starts_with("REC"));
        assert_eq!(receipt.len(), 11);
        assert!(receipt[3..].chars().all(|c| c.is_ascii_digit()));
    }
}
