/// Formats `value` in scientific notation with a signed, at least two-digit
/// exponent (`1.026e+03`), which is the form the transport model's Fortran
/// readers and the archived files use.
///
/// # Arguments
///
/// * `value` - The number to format.
/// * `precision` - Digits after the decimal point in the mantissa.
///
/// # Return
///
/// The formatted string. Non-finite values fall back to Rust's own rendering.
pub fn exponential(value: f64, precision: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let rust = format!("{value:.precision$e}");
    match rust.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{mantissa}e{sign}{digits:0>2}")
        }
        None => rust,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exponent_carries_sign_and_two_digits() {
        assert_eq!(exponential(1025.72, 3), "1.026e+03");
        assert_eq!(exponential(0.882, 3), "8.820e-01");
        assert_eq!(exponential(1e9, 4), "1.0000e+09");
        assert_eq!(exponential(-1.0, 1), "-1.0e+00");
    }

    #[test]
    fn large_exponents_are_not_truncated() {
        assert_eq!(exponential(1.5e120, 1), "1.5e+120");
        assert_eq!(exponential(2.0e-105, 2), "2.00e-105");
    }

    #[test]
    fn zero_uses_a_zero_exponent() {
        assert_eq!(exponential(0.0, 2), "0.00e+00");
    }
}
