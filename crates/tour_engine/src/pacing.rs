use std::time::Duration;

/// Whitespace-delimited word count; blank text counts zero.
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Reading-time approximation used when narration is off: the word count at
/// the configured words-per-minute pace, clamped to the pause bounds.
pub fn silent_read_duration(
    word_count: usize,
    wpm: u32,
    min_pause: Duration,
    max_pause: Duration,
) -> Duration {
    let unclamped = Duration::from_millis(word_count as u64 * 60_000 / u64::from(wpm.max(1)));
    unclamped.clamp(min_pause, max_pause)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIN: Duration = Duration::from_millis(2100);
    const MAX: Duration = Duration::from_millis(7500);

    #[test]
    fn count_words_handles_blank_and_runs() {
        assert_eq!(count_words(""), 0);
        assert_eq!(count_words("   \t\n"), 0);
        assert_eq!(count_words("a  b   c"), 3);
        assert_eq!(count_words("  leading and trailing  "), 3);
    }

    #[test]
    fn duration_stays_within_bounds() {
        for words in [0, 1, 2, 5, 50, 500, 5000] {
            let d = silent_read_duration(words, 7, MIN, MAX);
            assert!(d >= MIN && d <= MAX, "words={words} gave {d:?}");
        }
    }

    #[test]
    fn duration_is_monotone_in_word_count() {
        let mut last = Duration::ZERO;
        for words in 0..100 {
            let d = silent_read_duration(words, 7, MIN, MAX);
            assert!(d >= last, "regressed at words={words}");
            last = d;
        }
    }

    #[test]
    fn zero_words_reads_for_the_minimum() {
        assert_eq!(silent_read_duration(0, 7, MIN, MAX), MIN);
    }

    #[test]
    fn two_words_at_wpm_seven_clamp_to_the_maximum() {
        // 2 / 7 * 60000 = 17142ms, over the ceiling
        assert_eq!(silent_read_duration(2, 7, MIN, MAX), MAX);
    }

    #[test]
    fn unclamped_region_matches_the_wpm_formula() {
        // 25 words at 300wpm = 5000ms, inside [2100, 7500]
        assert_eq!(
            silent_read_duration(25, 300, MIN, MAX),
            Duration::from_millis(5000)
        );
    }
}
