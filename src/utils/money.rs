//! Parsing of free-text tip values such as `R$ 25,00` or `$1,250.50`.

/// 从展示用字符串中解析金额。
///
/// 同时出现 `,` 和 `.` 时，最后出现的那个是小数点；只出现一种分隔符时，
/// 若它只出现一次且后面跟的不是恰好三位数字，则视为小数点，否则视为千分位。
pub fn parse_tip_amount(raw: &str) -> Option<f64> {
    let kept: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .collect();
    if !kept.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    let last_comma = kept.rfind(',');
    let last_dot = kept.rfind('.');
    let decimal_sep = match (last_comma, last_dot) {
        (Some(c), Some(d)) => Some(if c > d { ',' } else { '.' }),
        (Some(_), None) => single_separator_as_decimal(&kept, ','),
        (None, Some(_)) => single_separator_as_decimal(&kept, '.'),
        (None, None) => None,
    };

    let normalized: String = match decimal_sep {
        Some(sep) => {
            let idx = kept.rfind(sep)?;
            let (int_part, frac_part) = kept.split_at(idx);
            let int_digits: String = int_part.chars().filter(|c| c.is_ascii_digit()).collect();
            let frac_digits: String = frac_part.chars().filter(|c| c.is_ascii_digit()).collect();
            format!(
                "{}.{}",
                if int_digits.is_empty() { "0" } else { &int_digits },
                if frac_digits.is_empty() { "0" } else { &frac_digits }
            )
        }
        None => kept.chars().filter(|c| c.is_ascii_digit()).collect(),
    };

    normalized.parse::<f64>().ok()
}

fn single_separator_as_decimal(s: &str, sep: char) -> Option<char> {
    let occurrences = s.matches(sep).count();
    if occurrences > 1 {
        return None;
    }
    let after = s.rsplit(sep).next().unwrap_or("");
    if after.len() == 3 { None } else { Some(sep) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tip_amount() {
        assert_eq!(parse_tip_amount("R$ 25,00"), Some(25.0));
        assert_eq!(parse_tip_amount("R$ 1.250,50"), Some(1250.5));
        assert_eq!(parse_tip_amount("$1,250.50"), Some(1250.5));
        assert_eq!(parse_tip_amount("50"), Some(50.0));
        assert_eq!(parse_tip_amount("R$ 1.000"), Some(1000.0));
        assert_eq!(parse_tip_amount("12.5"), Some(12.5));
        assert_eq!(parse_tip_amount("grátis"), None);
    }
}
