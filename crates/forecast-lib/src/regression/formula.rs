//! Human-readable formula strings, four decimals per coefficient

/// Format a coefficient as a signed term, e.g. ` + 2.0000x` or ` - 0.5000x^2`
fn signed_term(coefficient: f64, suffix: &str) -> String {
    let magnitude = format!("{:.4}", coefficient.abs());
    let negative = coefficient < 0.0 && magnitude != "0.0000";
    let sign = if negative { '-' } else { '+' };
    format!(" {} {}{}", sign, magnitude, suffix)
}

pub fn linear(a: f64, b: f64) -> String {
    format!("y = {:.4}{}", a, signed_term(b, "x"))
}

pub fn polynomial(coefficients: &[f64]) -> String {
    let mut formula = format!("y = {:.4}", coefficients.first().copied().unwrap_or(0.0));
    for (power, &c) in coefficients.iter().enumerate().skip(1) {
        let suffix = if power == 1 {
            "x".to_string()
        } else {
            format!("x^{}", power)
        };
        formula.push_str(&signed_term(c, &suffix));
    }
    formula
}

pub fn exponential(a: f64, b: f64) -> String {
    format!("y = {:.4} × e^({:.4}x)", a, b)
}

pub fn power(a: f64, b: f64) -> String {
    format!("y = {:.4} × x^{:.4}", a, b)
}

pub fn logarithmic(a: f64, b: f64) -> String {
    format!("y = {:.4}{}", a, signed_term(b, "·ln(x)"))
}

pub fn moving_average(window: usize) -> String {
    if window == 1 {
        "y = previous value".to_string()
    } else {
        format!("y = mean of trailing {} values", window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_formula() {
        assert_eq!(linear(11.97071, 0.0001), "y = 11.9707 + 0.0001x");
        assert_eq!(linear(1.0, -2.0), "y = 1.0000 - 2.0000x");
    }

    #[test]
    fn test_tiny_negative_prints_as_plus_zero() {
        assert_eq!(linear(1.0, -0.00001), "y = 1.0000 + 0.0000x");
    }

    #[test]
    fn test_polynomial_formula() {
        assert_eq!(
            polynomial(&[1.0, -2.0, 0.5]),
            "y = 1.0000 - 2.0000x + 0.5000x^2"
        );
    }

    #[test]
    fn test_transformed_formulas() {
        assert_eq!(exponential(2.0, 0.5), "y = 2.0000 × e^(0.5000x)");
        assert_eq!(power(2.0, 1.5), "y = 2.0000 × x^1.5000");
        assert_eq!(logarithmic(1.0, -2.0), "y = 1.0000 - 2.0000·ln(x)");
        assert_eq!(moving_average(3), "y = mean of trailing 3 values");
    }
}
