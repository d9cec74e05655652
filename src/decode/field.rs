use std::str::FromStr;

/// Read one `<key>=<value>` field out of a parsed RTCM line.
///
/// The line is scanned for the literal `"<key>="`; the token following the
/// `=` runs until the field separator and is parsed into `T`. A missing key
/// or an unparsable token yields `None`, so callers keep their
/// zero-initialized defaults for absent fields.
pub fn field<T: FromStr>(line: &str, key: &str) -> Option<T> {
    let token = raw_field(line, key)?;
    token.parse::<T>().ok()
}

/// The unparsed value token for `key`, if present.
pub fn raw_field<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    let mut from = 0;
    while let Some(pos) = line[from..].find(key) {
        let start = from + pos + key.len();
        let rest = line[start..].as_bytes();
        if rest.first() == Some(&b'=') {
            let val = &line[start + 1..];
            let end = val
                .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '+')))
                .unwrap_or(val.len());
            return Some(&val[..end]);
        }
        // key was a prefix of a longer name (e.g. DF009 inside DF009_01)
        from = start;
    }
    None
}

/// Key of a per-satellite or per-cell field, 1-based ("DF400", 7 -> "DF400_07").
pub fn cell_key(name: &str, idx: usize) -> String {
    format!("{}_{:02}", name, idx)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINE: &str =
        "<RTCM(1074, DF002=1074, DF003=0, DF004=159348000, NSat=2, PRN_01=5, PRN_02=13, \
         DF397_01=77, DF398_01=0.000654, DF400_01=-3.1e-07, CELLSIG_01=1C)>";

    #[test]
    fn test_scalar_fields() {
        assert_eq!(field::<u16>(LINE, "DF002"), Some(1074));
        assert_eq!(field::<u32>(LINE, "DF004"), Some(159348000));
        assert_eq!(field::<f64>(LINE, "DF398_01"), Some(0.000654));
    }

    #[test]
    fn test_negative_exponent() {
        assert_eq!(field::<f64>(LINE, "DF400_01"), Some(-3.1e-07));
    }

    #[test]
    fn test_string_token() {
        assert_eq!(raw_field(LINE, "CELLSIG_01"), Some("1C"));
    }

    #[test]
    fn test_missing_key() {
        assert_eq!(field::<f64>(LINE, "DF093"), None);
        assert_eq!(raw_field(LINE, "CELLSIG_02"), None);
    }

    #[test]
    fn test_prefix_key_not_confused() {
        // DF397 must not match inside DF397_01
        assert_eq!(field::<u32>(LINE, "DF397"), None);
        assert_eq!(field::<u32>(LINE, &cell_key("DF397", 1)), Some(77));
    }

    #[test]
    fn test_unparsable_value() {
        assert_eq!(field::<f64>(LINE, "CELLSIG_01"), None);
    }

    #[test]
    fn test_cell_key() {
        assert_eq!(cell_key("DF400", 7), "DF400_07");
        assert_eq!(cell_key("PRN", 12), "PRN_12");
    }
}
