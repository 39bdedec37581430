//! Series generation for the fill handle.
//!
//! A sample of one or more cells is classified as an arithmetic progression,
//! a text with a trailing or leading counter, or an opaque list that is
//! repeated in order. Classification never fails: anything unrecognized
//! falls back to cycling the sample.

const STEP_TOLERANCE: f64 = 1e-4;

/// Direction in which the fill handle was dragged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillDirection {
    Down,
    Up,
    Right,
    Left,
}

impl FillDirection {
    pub fn is_vertical(self) -> bool {
        matches!(self, FillDirection::Down | FillDirection::Up)
    }

    /// Whether the sample has to be read backwards before extrapolating.
    pub fn is_reversed(self) -> bool {
        matches!(self, FillDirection::Up | FillDirection::Left)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Pattern {
    Numeric { step: f64 },
    NumericSuffix { step: i64 },
    NumericPrefix { step: i64 },
    Cycle,
}

/// Generates the `index`-th value (0-based) following `values`.
pub fn generate_series_value(values: &[String], index: usize) -> String {
    let Some(last) = values.last() else {
        return String::new();
    };

    if values.len() == 1 {
        return increment_single(last, index as i64 + 1);
    }

    let ahead = index as i64 + 1;
    match detect_pattern(values) {
        Pattern::Numeric { step } => {
            if let Some(value) = parse_number(last) {
                return format_number(value + step * ahead as f64);
            }
        }
        Pattern::NumericSuffix { step } => {
            if let Some((prefix, digits)) = split_suffix(last) {
                if let Some(next) = parse_digits(digits).and_then(|n| advance(n, step, ahead)) {
                    return format!("{}{}", prefix, pad_number(next, digits.len()));
                }
            }
        }
        Pattern::NumericPrefix { step } => {
            if let Some((digits, suffix)) = split_prefix(last) {
                if let Some(next) = parse_digits(digits).and_then(|n| advance(n, step, ahead)) {
                    return format!("{}{}", pad_number(next, digits.len()), suffix);
                }
            }
        }
        Pattern::Cycle => {}
    }

    values[index % values.len()].clone()
}

/// Extrapolates `count` values away from a rectangular sample.
///
/// `source` is indexed `[row][column]`. Vertical fills return `count` rows
/// of the sample's width; horizontal fills return one row per sample row,
/// each `count` cells long. For `Up` and `Left` the first generated value is
/// the one adjacent to the sample.
pub fn generate_series_data(
    source: &[Vec<String>],
    direction: FillDirection,
    count: usize,
) -> Vec<Vec<String>> {
    let width = source.first().map(|r| r.len()).unwrap_or(0);
    if width == 0 || count == 0 {
        return Vec::new();
    }

    if direction.is_vertical() {
        let samples: Vec<Vec<String>> = (0..width)
            .map(|column| {
                let mut sample: Vec<String> = source
                    .iter()
                    .map(|row| row.get(column).cloned().unwrap_or_default())
                    .collect();
                if direction.is_reversed() {
                    sample.reverse();
                }
                sample
            })
            .collect();

        (0..count)
            .map(|i| samples.iter().map(|s| generate_series_value(s, i)).collect())
            .collect()
    } else {
        source
            .iter()
            .map(|row| {
                let mut sample = row.clone();
                if direction.is_reversed() {
                    sample.reverse();
                }
                (0..count).map(|i| generate_series_value(&sample, i)).collect()
            })
            .collect()
    }
}

fn detect_pattern(values: &[String]) -> Pattern {
    let numbers: Option<Vec<f64>> = values.iter().map(|v| parse_number(v)).collect();
    if let Some(numbers) = numbers {
        if let Some(step) = common_step(&numbers) {
            return Pattern::Numeric { step };
        }
    }

    let suffixes: Option<Vec<(&str, i64)>> = values
        .iter()
        .map(|v| split_suffix(v).and_then(|(p, d)| parse_digits(d).map(|n| (p, n))))
        .collect();
    if let Some(parts) = suffixes {
        if parts.iter().all(|(p, _)| *p == parts[0].0) {
            let numbers: Vec<i64> = parts.iter().map(|(_, n)| *n).collect();
            if let Some(step) = common_int_step(&numbers) {
                return Pattern::NumericSuffix { step };
            }
        }
    }

    let prefixes: Option<Vec<(i64, &str)>> = values
        .iter()
        .map(|v| split_prefix(v).and_then(|(d, s)| parse_digits(d).map(|n| (n, s))))
        .collect();
    if let Some(parts) = prefixes {
        if parts.iter().all(|(_, s)| *s == parts[0].1) {
            let numbers: Vec<i64> = parts.iter().map(|(n, _)| *n).collect();
            if let Some(step) = common_int_step(&numbers) {
                return Pattern::NumericPrefix { step };
            }
        }
    }

    Pattern::Cycle
}

fn common_step(numbers: &[f64]) -> Option<f64> {
    let first = numbers.get(1)? - numbers[0];
    numbers
        .windows(2)
        .all(|w| ((w[1] - w[0]) - first).abs() < STEP_TOLERANCE)
        .then_some(first)
}

fn common_int_step(numbers: &[i64]) -> Option<i64> {
    let first = numbers.get(1)? - numbers[0];
    numbers.windows(2).all(|w| w[1] - w[0] == first).then_some(first)
}

/// `n + step * ahead`, or `None` when the counter leaves the `i64` range.
fn advance(n: i64, step: i64, ahead: i64) -> Option<i64> {
    step.checked_mul(ahead).and_then(|delta| n.checked_add(delta))
}

fn increment_single(value: &str, by: i64) -> String {
    if let Some(number) = parse_number(value) {
        return format_number(number + by as f64);
    }
    if let Some((prefix, digits)) = split_suffix(value) {
        if let Some(n) = parse_digits(digits).and_then(|n| n.checked_add(by)) {
            return format!("{}{}", prefix, pad_number(n, digits.len()));
        }
    }
    if let Some((digits, suffix)) = split_prefix(value) {
        if let Some(n) = parse_digits(digits).and_then(|n| n.checked_add(by)) {
            return format!("{}{}", pad_number(n, digits.len()), suffix);
        }
    }
    value.to_string()
}

fn parse_number(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    // Rust accepts "inf"/"nan" spellings that are not numbers in a cell.
    if trimmed.is_empty() || trimmed.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

fn parse_digits(digits: &str) -> Option<i64> {
    digits.parse::<i64>().ok()
}

/// Splits `item07` into `("item", "07")`.
fn split_suffix(value: &str) -> Option<(&str, &str)> {
    let start = value
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map(|(i, _)| i)?;
    Some((&value[..start], &value[start..]))
}

/// Splits `7th` into `("7", "th")`.
fn split_prefix(value: &str) -> Option<(&str, &str)> {
    let end = value
        .char_indices()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map(|(i, _)| i + 1)?;
    Some((&value[..end], &value[end..]))
}

/// Zero-pads to `width` characters, sign included.
fn pad_number(number: i64, width: usize) -> String {
    let sign = if number < 0 { "-" } else { "" };
    let digits = number.unsigned_abs().to_string();
    let pad = width.saturating_sub(sign.len() + digits.len());
    format!("{}{}{}", sign, "0".repeat(pad), digits)
}

fn format_number(number: f64) -> String {
    if number == 0.0 {
        // avoid "-0"
        return "0".to_string();
    }
    number.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn column(values: &[&str]) -> Vec<Vec<String>> {
        values.iter().map(|v| vec![v.to_string()]).collect()
    }

    #[test]
    fn test_arithmetic_progression_down() {
        let result = generate_series_data(&column(&["1", "2"]), FillDirection::Down, 3);
        assert_eq!(result, column(&["3", "4", "5"]));
    }

    #[test]
    fn test_arithmetic_progression_fractional_step() {
        let values = strings(&["0.5", "1", "1.5"]);
        assert_eq!(generate_series_value(&values, 0), "2");
        assert_eq!(generate_series_value(&values, 1), "2.5");
    }

    #[test]
    fn test_single_numeric_suffix() {
        let result = generate_series_data(&column(&["item01"]), FillDirection::Down, 2);
        assert_eq!(result, column(&["item02", "item03"]));
    }

    #[test]
    fn test_single_number_increments() {
        let values = strings(&["7"]);
        assert_eq!(generate_series_value(&values, 0), "8");
        assert_eq!(generate_series_value(&values, 2), "10");
    }

    #[test]
    fn test_single_numeric_prefix() {
        let values = strings(&["7th"]);
        assert_eq!(generate_series_value(&values, 0), "8th");
    }

    #[test]
    fn test_single_plain_text_repeats() {
        let values = strings(&["apple"]);
        assert_eq!(generate_series_value(&values, 0), "apple");
        assert_eq!(generate_series_value(&values, 5), "apple");
    }

    #[test]
    fn test_numeric_suffix_with_step_keeps_width() {
        let values = strings(&["id008", "id010"]);
        assert_eq!(generate_series_value(&values, 0), "id012");
        assert_eq!(generate_series_value(&values, 1), "id014");
    }

    #[test]
    fn test_numeric_prefix_pattern() {
        let values = strings(&["1st", "2st"]);
        assert_eq!(generate_series_value(&values, 0), "3st");
    }

    #[test]
    fn test_mismatched_prefixes_cycle() {
        let values = strings(&["a1", "b2"]);
        assert_eq!(generate_series_value(&values, 0), "a1");
        assert_eq!(generate_series_value(&values, 1), "b2");
    }

    #[test]
    fn test_cycle_fallback() {
        let result = generate_series_data(&column(&["a", "b", "c"]), FillDirection::Down, 7);
        assert_eq!(result, column(&["a", "b", "c", "a", "b", "c", "a"]));
    }

    #[test]
    fn test_uneven_numbers_cycle() {
        let values = strings(&["1", "2", "4"]);
        assert_eq!(generate_series_value(&values, 0), "1");
        assert_eq!(generate_series_value(&values, 3), "1");
    }

    #[test]
    fn test_fill_up_reverses_sample() {
        let result = generate_series_data(&column(&["3", "4"]), FillDirection::Up, 2);
        assert_eq!(result, column(&["2", "1"]));
    }

    #[test]
    fn test_fill_right_per_row() {
        let source = vec![strings(&["1", "2"]), strings(&["x", "y"])];
        let result = generate_series_data(&source, FillDirection::Right, 2);
        assert_eq!(result, vec![strings(&["3", "4"]), strings(&["x", "y"])]);
    }

    #[test]
    fn test_fill_left_per_row() {
        let source = vec![strings(&["item5", "item6"])];
        let result = generate_series_data(&source, FillDirection::Left, 2);
        assert_eq!(result, vec![strings(&["item4", "item3"])]);
    }

    #[test]
    fn test_vertical_fill_is_per_column() {
        let source = vec![strings(&["1", "a"]), strings(&["3", "b"])];
        let result = generate_series_data(&source, FillDirection::Down, 2);
        assert_eq!(result, vec![strings(&["5", "a"]), strings(&["7", "b"])]);
    }

    #[test]
    fn test_negative_padding_counts_sign() {
        let values = strings(&["x02", "x01"]);
        assert_eq!(generate_series_value(&values, 1), "x-1");
    }

    #[test]
    fn test_counter_overflow_degrades() {
        let values = strings(&["a0", "a5000000000000000000"]);
        assert_eq!(generate_series_value(&values, 0), "a0");
        assert_eq!(generate_series_value(&values, 1), "a5000000000000000000");

        let single = strings(&["id9223372036854775807"]);
        assert_eq!(generate_series_value(&single, 0), "id9223372036854775807");

        let prefixed = strings(&["9223372036854775807th"]);
        assert_eq!(generate_series_value(&prefixed, 2), "9223372036854775807th");
    }

    #[test]
    fn test_words_are_not_numbers() {
        assert_eq!(parse_number("inf"), None);
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number("1e3"), Some(1000.0));
        assert_eq!(parse_number(""), None);
    }

    #[test]
    fn test_empty_inputs() {
        assert!(generate_series_data(&[], FillDirection::Down, 3).is_empty());
        assert!(generate_series_data(&column(&["1"]), FillDirection::Down, 0).is_empty());
        assert_eq!(generate_series_value(&[], 0), "");
    }

    proptest! {
        #[test]
        fn prop_integer_progressions_continue(start in -1000i64..1000, step in -50i64..50, count in 1usize..20) {
            let first = start.to_string();
            let second = (start + step).to_string();
            let sample = column(&[first.as_str(), second.as_str()]);
            let result = generate_series_data(&sample, FillDirection::Down, count);
            prop_assert_eq!(result.len(), count);
            for (i, row) in result.iter().enumerate() {
                let expected = start + step * (i as i64 + 2);
                prop_assert_eq!(&row[0], &expected.to_string());
            }
        }
    }
}
