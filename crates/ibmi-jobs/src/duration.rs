use regex::Regex;
use std::sync::OnceLock;
use std::time::Duration;

fn duration_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(-?\d+)([smhdw])?$").unwrap())
}

/// Wait-time grammar used by every time_out/check_interval option:
/// a signed integer with an optional unit suffix (s, m, h, d, w); no
/// suffix means seconds. Returns `None` when the input does not match.
pub fn parse_duration(raw: &str) -> Option<i64> {
    let normalized = raw.trim().to_lowercase();
    let captures = duration_pattern().captures(&normalized)?;
    let magnitude: i64 = captures.get(1)?.as_str().parse().ok()?;
    let multiplier = match captures.get(2).map(|m| m.as_str()) {
        Some("s") | None => 1,
        Some("m") => 60,
        Some("h") => 3_600,
        Some("d") => 86_400,
        Some("w") => 604_800,
        Some(_) => return None,
    };
    magnitude.checked_mul(multiplier)
}

/// Historical variant: several call sites silently treat an unparsable
/// wait time as zero seconds instead of failing the task. Kept distinct
/// so each call site preserves its original fallback.
pub fn parse_duration_or_zero(raw: &str) -> i64 {
    parse_duration(raw).unwrap_or(0)
}

/// Sleep/timeout math has no use for a negative wait; the sign is
/// discarded here by clamping, not by the parser.
pub fn to_wait(seconds: i64) -> Duration {
    Duration::from_secs(seconds.max(0) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suffixes_select_multipliers() {
        assert_eq!(parse_duration("1w"), Some(604_800));
        assert_eq!(parse_duration("2d"), Some(172_800));
        assert_eq!(parse_duration("3h"), Some(10_800));
        assert_eq!(parse_duration("30m"), Some(1_800));
        assert_eq!(parse_duration("45s"), Some(45));
    }

    #[test]
    fn missing_suffix_means_seconds() {
        assert_eq!(parse_duration("45"), Some(45));
    }

    #[test]
    fn sign_is_kept_by_the_parser() {
        assert_eq!(parse_duration("-30s"), Some(-30));
        assert_eq!(parse_duration("-1m"), Some(-60));
    }

    #[test]
    fn uppercase_suffix_is_accepted() {
        assert_eq!(parse_duration("5M"), Some(300));
    }

    #[test]
    fn garbage_fails_to_parse() {
        assert_eq!(parse_duration("abc"), None);
        assert_eq!(parse_duration("1m30s"), None);
        assert_eq!(parse_duration("m"), None);
        assert_eq!(parse_duration(""), None);
    }

    #[test]
    fn zero_fallback_variant() {
        assert_eq!(parse_duration_or_zero("abc"), 0);
        assert_eq!(parse_duration_or_zero("1m"), 60);
    }

    #[test]
    fn negative_waits_clamp_to_zero() {
        assert_eq!(to_wait(-30), Duration::from_secs(0));
        assert_eq!(to_wait(90), Duration::from_secs(90));
    }
}
