//! Text complexity scoring for project descriptions
//!
//! Maps the free-text description of a quote request to a price multiplier
//! in `[1.0, 1.8]`. Longer, more detailed, more technical descriptions score
//! higher. Pure function, no locale handling beyond lowercasing.

/// Hard cap on the multiplier regardless of accumulated bonuses.
const MAX_MULTIPLIER: f64 = 1.8;

/// Bonus per distinct technical keyword found in the text.
const KEYWORD_BONUS: f64 = 0.08;

/// Matched case-insensitively as substrings; each keyword counts once no
/// matter how often it occurs.
const TECHNICAL_KEYWORDS: &[&str] = &[
    "api",
    "database",
    "dashboard",
    "integration",
    "webhook",
    "payment",
    "automation",
    "analytics",
    "moderation",
    "auth",
    "crm",
    "backend",
    "frontend",
    "hosting",
    "realtime",
    "notification",
];

/// Score a project description.
///
/// Starts at 1.0 and adds: a word-count bonus (only the highest matching
/// band), a character-count bonus (same rule), and a fixed bonus per
/// distinct technical keyword. Empty text scores exactly 1.0.
pub fn score(description: &str) -> f64 {
    let text = description.trim();
    if text.is_empty() {
        return 1.0;
    }

    let words = text.split_whitespace().count();
    let chars = text.chars().count();

    let word_bonus = if words > 100 {
        0.3
    } else if words > 50 {
        0.2
    } else if words > 20 {
        0.1
    } else if words > 10 {
        0.05
    } else {
        0.0
    };

    let char_bonus = if chars > 800 {
        0.15
    } else if chars > 400 {
        0.08
    } else if chars > 200 {
        0.04
    } else {
        0.0
    };

    let lowered = text.to_lowercase();
    let keyword_hits = TECHNICAL_KEYWORDS
        .iter()
        .filter(|kw| lowered.contains(*kw))
        .count();

    let raw = 1.0 + word_bonus + char_bonus + keyword_hits as f64 * KEYWORD_BONUS;
    raw.min(MAX_MULTIPLIER)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn words(n: usize) -> String {
        vec!["word"; n].join(" ")
    }

    #[test]
    fn empty_text_scores_one() {
        assert_eq!(score(""), 1.0);
        assert_eq!(score("   "), 1.0);
    }

    #[test]
    fn short_plain_text_scores_one() {
        assert_eq!(score("simple bot"), 1.0);
    }

    #[test]
    fn only_highest_word_band_applies() {
        // 11 words -> +0.05 only
        assert!((score(&words(11)) - 1.05).abs() < 1e-9);
        // 60 words -> +0.2, plus 60*5-1=299 chars -> +0.04
        assert!((score(&words(60)) - 1.24).abs() < 1e-9);
    }

    #[test]
    fn keywords_count_once_each() {
        let once = score("we need an api");
        let thrice = score("api api api");
        assert!((once - 1.08).abs() < 1e-9);
        assert_eq!(once, thrice);
    }

    #[test]
    fn keyword_match_is_case_insensitive() {
        assert_eq!(score("API access"), score("api access"));
    }

    #[test]
    fn long_description_with_two_keywords() {
        let filler = vec!["go"; 148].join(" ");
        let text = format!("api dashboard {filler}");
        // 150 words -> +0.3, 457 chars -> +0.08, 2 keywords -> +0.16
        assert!((score(&text) - 1.54).abs() < 1e-9);
    }

    #[test]
    fn bonuses_cap_at_max() {
        let every_keyword = TECHNICAL_KEYWORDS.join(" ");
        let text = format!("{} {}", words(200), every_keyword.repeat(5));
        assert_eq!(score(&text), 1.8);
    }

    proptest! {
        #[test]
        fn score_always_in_bounds(text in ".*") {
            let s = score(&text);
            prop_assert!((1.0..=1.8).contains(&s));
        }

        #[test]
        fn appending_text_never_lowers_score(text in "[a-z ]{0,300}") {
            let longer = format!("{text} {text} extra detail here");
            prop_assert!(score(&longer) >= score(&text));
        }
    }
}
