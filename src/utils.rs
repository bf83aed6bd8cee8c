use crate::error::SizeError;

/// Bytes in one sector, the unit of the `s` suffix.
pub const SECTOR_SIZE: u64 = 512;

/// Unit applied to a bare number.
const DEFAULT_UNIT: u64 = 1024;

/// How the suffix multiplication treats results that do not fit in 64 bits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SizeMode {
    /// Wrap around like fixed-width unsigned arithmetic.
    #[default]
    Wrapping,
    /// Report [`SizeError::Overflow`] instead of wrapping.
    Checked,
}

impl SizeMode {
    /// Parse a size specification such as `10`, `512k`, `2G` or `2048s`.
    ///
    /// A bare number counts kibibytes. The suffixes `k`, `m`, `g`, `t`, `p`
    /// and `e` (either case) are powers of 1024 and lowercase `s` counts
    /// 512-byte sectors. Anything following the suffix is ignored.
    pub fn parse(self, s: &str) -> Result<u64, SizeError> {
        let invalid = || SizeError::InvalidFormat(s.to_string());

        let (num, rest) = split_number(s).ok_or_else(invalid)?;

        let multiplier = match rest.chars().next() {
            None => DEFAULT_UNIT,
            Some(suffix) => suffix_multiplier(suffix).ok_or_else(invalid)?,
        };

        match self {
            SizeMode::Wrapping => Ok(num.wrapping_mul(multiplier)),
            SizeMode::Checked => num
                .checked_mul(multiplier)
                .ok_or_else(|| SizeError::Overflow(s.to_string())),
        }
    }
}

/// Parse a size specification with wrapping arithmetic.
pub fn parse_size(s: &str) -> Result<u64, SizeError> {
    SizeMode::Wrapping.parse(s)
}

/// Human readable rendering for log lines.
pub fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}

// Leading whitespace and a '+' sign are accepted before the digits; '-' is not.
fn split_number(s: &str) -> Option<(u64, &str)> {
    let s = s.trim_start_matches(|c: char| c.is_ascii_whitespace());
    let s = s.strip_prefix('+').unwrap_or(s);

    let boundary = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    if boundary == 0 {
        return None;
    }

    let (num_part, rest) = s.split_at(boundary);
    num_part.parse::<u64>().ok().map(|num| (num, rest))
}

fn suffix_multiplier(suffix: char) -> Option<u64> {
    let multiplier = match suffix {
        'k' | 'K' => 1_024,
        'm' | 'M' => 1_024_u64.pow(2),
        'g' | 'G' => 1_024_u64.pow(3),
        't' | 'T' => 1_024_u64.pow(4),
        'p' | 'P' => 1_024_u64.pow(5),
        'e' | 'E' => 1_024_u64.pow(6),
        // Uppercase 'S' is deliberately not a sector suffix.
        's' => SECTOR_SIZE,
        _ => return None,
    };
    Some(multiplier)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_number_is_kibibytes() {
        assert_eq!(parse_size("10").unwrap(), 10 * 1024);
        assert_eq!(parse_size("0").unwrap(), 0);
    }

    #[test]
    fn suffixes_are_powers_of_1024() {
        assert_eq!(parse_size("1K").unwrap(), 1024);
        assert_eq!(parse_size("1k").unwrap(), 1024);
        assert_eq!(parse_size("2M").unwrap(), 2 * 1024 * 1024);
        assert_eq!(parse_size("2m").unwrap(), 2 * 1024 * 1024);
        assert_eq!(parse_size("3g").unwrap(), 3 << 30);
        assert_eq!(parse_size("1T").unwrap(), 1 << 40);
        assert_eq!(parse_size("1p").unwrap(), 1 << 50);
        assert_eq!(parse_size("1E").unwrap(), 1 << 60);
    }

    #[test]
    fn lowercase_s_counts_sectors() {
        assert_eq!(parse_size("1s").unwrap(), 512);
        assert_eq!(parse_size("2048s").unwrap(), 1024 * 1024);
    }

    #[test]
    fn uppercase_s_is_rejected() {
        assert_eq!(
            parse_size("1S"),
            Err(SizeError::InvalidFormat("1S".to_string()))
        );
    }

    #[test]
    fn rejects_garbage() {
        for input in ["abc", "", "   ", "K", "-1", "10 K", "1.5G", "10x"] {
            assert!(
                matches!(parse_size(input), Err(SizeError::InvalidFormat(_))),
                "{input:?} should not parse"
            );
        }
    }

    #[test]
    fn negative_sizes_are_rejected() {
        for input in ["-1", "-1k", " -4096s", "+-1"] {
            assert_eq!(
                parse_size(input),
                Err(SizeError::InvalidFormat(input.to_string()))
            );
        }
    }

    #[test]
    fn digits_beyond_u64_are_rejected() {
        assert!(parse_size("18446744073709551616k").is_err());
    }

    #[test]
    fn leading_whitespace_and_plus_are_accepted() {
        assert_eq!(parse_size("  4k").unwrap(), 4096);
        assert_eq!(parse_size("+4k").unwrap(), 4096);
    }

    #[test]
    fn text_after_suffix_is_ignored() {
        assert_eq!(parse_size("10MB").unwrap(), 10 * 1024 * 1024);
        assert_eq!(parse_size("1Gibberish").unwrap(), 1 << 30);
    }

    #[test]
    fn multiplication_wraps_by_default() {
        // 16 EiB is exactly 2^64.
        assert_eq!(parse_size("16E").unwrap(), 0);
        assert_eq!(parse_size("17E").unwrap(), 1 << 60);
        assert_eq!(parse_size("18446744073709551615").unwrap(), u64::MAX.wrapping_mul(1024));
    }

    #[test]
    fn checked_mode_reports_overflow() {
        assert_eq!(
            SizeMode::Checked.parse("16E"),
            Err(SizeError::Overflow("16E".to_string()))
        );
        assert_eq!(SizeMode::Checked.parse("15E").unwrap(), 15 << 60);
        assert_eq!(
            SizeMode::Checked.parse("abc"),
            Err(SizeError::InvalidFormat("abc".to_string()))
        );
    }

    #[test]
    fn formats_binary_units() {
        assert!(format_size(3 * 1024 * 1024).ends_with("MiB"));
    }
}
