use std::fmt::Display;

use crate::totp::remaining_seconds;

/// Seconds before a step boundary at which a code is shown as a warning.
pub const DEFAULT_WARN_SECONDS: u64 = 5;

/// How close the current code is to expiring.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    #[default]
    Normal,
    Warning,
}

impl Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Normal => write!(f, "normal"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

/// Classifies `seconds_since_epoch` with the default warning threshold.
///
/// With a 30 second period this flags seconds 25-29 and 55-59 of every minute.
pub fn classify(seconds_since_epoch: u64, period: u64) -> Severity {
    classify_with_threshold(seconds_since_epoch, period, DEFAULT_WARN_SECONDS)
}

/// Returns [`Severity::Warning`] when at most `threshold` seconds remain
/// before the next step boundary.
pub fn classify_with_threshold(seconds_since_epoch: u64, period: u64, threshold: u64) -> Severity {
    match remaining_seconds(seconds_since_epoch, period) {
        Some(remaining) if remaining <= threshold => Severity::Warning,
        _ => Severity::Normal,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::{classify, classify_with_threshold, Severity};

    #[test]
    fn thirty_second_period_matches_the_minute_windows() {
        for second in 0..60u64 {
            let expected = if (25..30).contains(&second) || second >= 55 {
                Severity::Warning
            } else {
                Severity::Normal
            };

            assert_eq!(expected, classify(second, 30), "second {second}");
            // Only the position inside the window matters
            assert_eq!(expected, classify(1_700_000_040 + second, 30), "second {second}");
        }
    }

    #[rstest]
    #[case(59, Severity::Warning)]
    #[case(10, Severity::Normal)]
    #[case(24, Severity::Normal)]
    #[case(25, Severity::Warning)]
    #[case(30, Severity::Normal)]
    #[case(54, Severity::Normal)]
    #[case(55, Severity::Warning)]
    fn default_policy(#[case] second: u64, #[case] expected: Severity) {
        assert_eq!(expected, classify(second, 30));
    }

    #[rstest]
    #[case(60, 54, Severity::Normal)]
    #[case(60, 55, Severity::Warning)]
    #[case(60, 25, Severity::Normal)]
    #[case(10, 4, Severity::Normal)]
    #[case(10, 5, Severity::Warning)]
    #[case(10, 9, Severity::Warning)]
    fn other_periods(#[case] period: u64, #[case] second: u64, #[case] expected: Severity) {
        assert_eq!(expected, classify(second, period));
    }

    #[test]
    fn custom_threshold() {
        assert_eq!(Severity::Normal, classify_with_threshold(19, 30, 10));
        assert_eq!(Severity::Warning, classify_with_threshold(20, 30, 10));
        assert_eq!(Severity::Normal, classify_with_threshold(29, 30, 0));
    }

    #[test]
    fn threshold_wider_than_the_period_always_warns() {
        for second in 0..30 {
            assert_eq!(Severity::Warning, classify_with_threshold(second, 30, 30));
        }
    }

    #[test]
    fn zero_period_is_normal() {
        assert_eq!(Severity::Normal, classify(59, 0));
    }
}
