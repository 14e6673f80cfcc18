//! RDL size strings (`2.5in`, `1cm`, `12pt`)

/// Points per unit. Pixels assume 96 DPI.
const UNITS: &[(&str, f64)] = &[
    ("in", 72.0),
    ("cm", 72.0 / 2.54),
    ("mm", 72.0 / 25.4),
    ("pt", 1.0),
    ("pc", 12.0),
    ("px", 0.75),
];

/// Convert an RDL size to points. A bare number is taken as points.
pub fn parse_size(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    for (suffix, factor) in UNITS {
        if let Some(number) = strip_suffix_ignore_case(text, suffix) {
            return number.trim().parse::<f64>().ok().map(|n| n * factor);
        }
    }
    text.parse::<f64>().ok()
}

fn strip_suffix_ignore_case<'a>(text: &'a str, suffix: &str) -> Option<&'a str> {
    let split = text.len().checked_sub(suffix.len())?;
    let (head, tail) = (text.get(..split)?, text.get(split..)?);
    tail.eq_ignore_ascii_case(suffix).then_some(head)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("1in", 72.0)]
    #[case("2.54cm", 72.0)]
    #[case("25.4mm", 72.0)]
    #[case("12pt", 12.0)]
    #[case("1pc", 12.0)]
    #[case("96px", 72.0)]
    #[case(" 0.5IN ", 36.0)]
    #[case("10", 10.0)]
    fn test_units(#[case] input: &str, #[case] points: f64) {
        let parsed = parse_size(input).unwrap();
        assert!((parsed - points).abs() < 1e-9, "{} -> {}", input, parsed);
    }

    #[rstest]
    #[case("")]
    #[case("wide")]
    #[case("in")]
    fn test_invalid(#[case] input: &str) {
        assert_eq!(parse_size(input), None);
    }
}
