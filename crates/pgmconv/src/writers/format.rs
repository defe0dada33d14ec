//! Number rendering shared by the text writers.

/// Render a table value in scientific notation with a two-digit exponent.
///
/// The mantissa is the shortest one that round-trips. An `E+00` exponent is
/// dropped, so `1.0` renders as `1` and `0.5` as `5E-01`.
pub fn scientific(value: f64) -> String {
    let raw = format!("{:E}", value);
    let Some((mantissa, exponent)) = raw.split_once('E') else {
        return raw;
    };
    let (sign, digits) = match exponent.strip_prefix('-') {
        Some(d) => ('-', d),
        None => ('+', exponent),
    };
    let rendered = format!("{}E{}{:0>2}", mantissa, sign, digits);
    rendered.replace("E+00", "")
}

/// Join values with `sep`, each rendered by `render`.
pub fn join_values(values: &[f64], sep: &str, render: impl Fn(f64) -> String) -> String {
    values
        .iter()
        .map(|&v| render(v))
        .collect::<Vec<_>>()
        .join(sep)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scientific() {
        assert_eq!(scientific(0.5), "5E-01");
        assert_eq!(scientific(0.25), "2.5E-01");
        assert_eq!(scientific(1.0), "1");
        assert_eq!(scientific(0.0), "0");
        assert_eq!(scientific(3.5), "3.5");
        assert_eq!(scientific(12.0), "1.2E+01");
        assert_eq!(scientific(1e-120), "1E-120");
    }

    #[test]
    fn test_join_values() {
        assert_eq!(join_values(&[0.5, 1.0], ", ", scientific), "5E-01, 1");
        assert_eq!(join_values(&[], " ", |v| v.to_string()), "");
    }
}
