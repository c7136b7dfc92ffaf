//! Order number format validation.
//!
//! Order numbers are strings of 9 to 16 decimal digits (after whitespace is removed) that carry a Luhn check digit.

/// Shortest accepted order number, in digits
pub const MIN_ORDER_NUMBER_LENGTH: usize = 9;
/// Longest accepted order number, in digits
pub const MAX_ORDER_NUMBER_LENGTH: usize = 16;

/// Removes all whitespace from a submitted order number. The result is the canonical form that is stored.
pub fn normalize_order_number(number: &str) -> String {
    number.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Returns true if `number` is an acceptable order number: only ASCII digits (whitespace is ignored), within the
/// length window, and with a valid Luhn checksum.
pub fn is_valid_order_number(number: &str) -> bool {
    let number = normalize_order_number(number);
    let len = number.len();
    if !(MIN_ORDER_NUMBER_LENGTH..=MAX_ORDER_NUMBER_LENGTH).contains(&len) {
        return false;
    }
    if !number.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    luhn_sum(number.as_bytes()) % 10 == 0
}

/// Every second digit, counting from the rightmost, is doubled, with 9 subtracted from results above 9.
fn luhn_sum(digits: &[u8]) -> u32 {
    digits
        .iter()
        .rev()
        .enumerate()
        .map(|(i, b)| {
            let d = u32::from(b - b'0');
            match (i % 2 == 1, d * 2) {
                (true, doubled) if doubled > 9 => doubled - 9,
                (true, doubled) => doubled,
                (false, _) => d,
            }
        })
        .sum()
}

#[cfg(test)]
mod test {
    use super::*;

    fn with_check_digit(payload: &str) -> String {
        (0..10u8)
            .map(|d| format!("{payload}{d}"))
            .find(|n| luhn_sum(n.as_bytes()) % 10 == 0)
            .expect("exactly one check digit is always valid")
    }

    #[test]
    fn known_numbers() {
        assert!(is_valid_order_number("12345678903"));
        assert!(is_valid_order_number("79927398713"));
        assert!(is_valid_order_number("4561261212345467"));
        assert!(is_valid_order_number("123456782"));
        assert!(!is_valid_order_number("12345678904"));
        assert!(!is_valid_order_number("79927398710"));
    }

    #[test]
    fn whitespace_is_ignored() {
        assert!(is_valid_order_number(" 1234 5678 903 "));
        assert!(is_valid_order_number("4561\t2612\n1234 5467"));
        assert_eq!(normalize_order_number(" 1234 5678 903 "), "12345678903");
    }

    #[test]
    fn length_window() {
        // Luhn-valid, but one digit too short
        assert!(!is_valid_order_number("12345674"));
        let seventeen = with_check_digit("4561261212345467");
        assert_eq!(seventeen.len(), 17);
        assert!(!is_valid_order_number(&seventeen));
        for len in MIN_ORDER_NUMBER_LENGTH..=MAX_ORDER_NUMBER_LENGTH {
            let payload = "9".repeat(len - 1);
            assert!(is_valid_order_number(&with_check_digit(&payload)), "length {len}");
        }
    }

    #[test]
    fn garbage_is_rejected_without_panicking() {
        let inputs = [
            "",
            "   ",
            "abcdefghijk",
            "1234567890a",
            "-12345678903",
            "+12345678903",
            "１２３４５６７８９０３",
            "12345.678903",
            "💥💥💥💥💥💥💥💥💥",
        ];
        for s in inputs {
            assert!(!is_valid_order_number(s), "{s}");
        }
    }

    #[test]
    fn every_single_digit_mutation_is_detected() {
        let generated = with_check_digit("9081726354");
        let numbers = ["12345678903", "4561261212345467", "123456782", generated.as_str()];
        for number in numbers {
            assert!(is_valid_order_number(number));
            let digits = number.as_bytes();
            for pos in 0..digits.len() {
                for d in b'0'..=b'9' {
                    if d == digits[pos] {
                        continue;
                    }
                    let mut mutated = digits.to_vec();
                    mutated[pos] = d;
                    let mutated = String::from_utf8(mutated).unwrap();
                    assert!(!is_valid_order_number(&mutated), "{mutated} should fail");
                }
            }
        }
    }
}
