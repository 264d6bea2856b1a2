//! Rule-based sub-scores: education match and experience sufficiency.

/// Character-ratio cutoff for education term pairs.
pub const EDUCATION_TERM_THRESHOLD: f64 = 0.7;

/// Fuzzy-overlap fraction above which education counts as a full match.
pub const EDUCATION_OVERLAP_CUTOFF: f64 = 0.5;

/// Flat bonus added to the experience base when the fuzzy token signal
/// showed strong overall text overlap.
pub const EXPERIENCE_RELEVANCE_BONUS: f64 = 0.3;

/// Weights for combining the two rule sub-scores.
#[derive(Debug, Clone, Copy)]
pub struct RuleWeights {
    pub experience: f64,
    pub education: f64,
}

impl Default for RuleWeights {
    fn default() -> Self {
        Self {
            experience: 0.6,
            education: 0.4,
        }
    }
}

/// Binary education match: 1.0 when the comma-separated degree terms of both
/// sides fuzzily overlap by more than half, 0.5 otherwise. A side with no
/// extracted education gives no evidence either way and lands on 0.5; absent
/// values never enter the text comparison.
pub fn education_score(resume_education: Option<&str>, required_education: Option<&str>) -> f64 {
    let (Some(resume_education), Some(required_education)) =
        (resume_education, required_education)
    else {
        return 0.5;
    };

    let terms_r = education_terms(resume_education);
    let terms_v = education_terms(required_education);
    if terms_r.is_empty() || terms_v.is_empty() {
        return 0.5;
    }

    let matches = terms_r
        .iter()
        .flat_map(|er| terms_v.iter().map(move |ev| (er, ev)))
        .filter(|(er, ev)| strsim::normalized_levenshtein(er, ev) > EDUCATION_TERM_THRESHOLD)
        .count();

    let fraction = matches as f64 / terms_r.len().max(terms_v.len()).max(1) as f64;
    if fraction > EDUCATION_OVERLAP_CUTOFF {
        1.0
    } else {
        0.5
    }
}

fn education_terms(education: &str) -> Vec<String> {
    education
        .split(',')
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Experience sufficiency: `candidate / required` when a requirement exists,
/// full credit otherwise; plus the relevance bonus when `fuzzy_signal`
/// exceeds 0.5 (the rules engine deliberately reads that similarity-engine
/// output); clamped to 1. The base is never negative, so no lower clamp.
pub fn experience_score(candidate_years: f64, required_years: u32, fuzzy_signal: f64) -> f64 {
    let base = if required_years > 0 {
        candidate_years / f64::from(required_years)
    } else {
        1.0
    };
    let bonus = if fuzzy_signal > 0.5 {
        EXPERIENCE_RELEVANCE_BONUS
    } else {
        0.0
    };
    (base + bonus).min(1.0)
}

/// Weighted rules total in [0, 1].
pub fn rules_total(experience: f64, education: f64, weights: &RuleWeights) -> f64 {
    weights.experience * experience + weights.education * education
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_education_exact_match_full_credit() {
        assert_eq!(education_score(Some("master's"), Some("master's")), 1.0);
    }

    #[test]
    fn test_education_close_terms_match() {
        // "bachelor" vs "bachelor's" clears the 0.7 ratio.
        assert_eq!(education_score(Some("bachelor"), Some("bachelor's")), 1.0);
    }

    #[test]
    fn test_education_mismatch_half_credit() {
        assert_eq!(education_score(Some("phd"), Some("bachelor's")), 0.5);
    }

    #[test]
    fn test_education_multi_term_majority_required() {
        // One of three resume terms matches: fraction 1/3 ≤ 0.5.
        assert_eq!(
            education_score(Some("bachelor, master, phd"), Some("doctorate")),
            0.5
        );
    }

    #[test]
    fn test_education_absent_sides_half_credit() {
        // Two absent sides used to compare as identical sentinel text and
        // inflate to 1.0; absence now short-circuits to 0.5.
        assert_eq!(education_score(None, None), 0.5);
        assert_eq!(education_score(Some("master's"), None), 0.5);
        assert_eq!(education_score(None, Some("phd")), 0.5);
    }

    #[test]
    fn test_education_is_binary() {
        let cases = [
            (Some("bachelor's"), Some("bachelor's")),
            (Some("phd"), Some("master's")),
            (None, Some("phd")),
            (Some(""), Some("phd")),
        ];
        for (r, v) in cases {
            let score = education_score(r, v);
            assert!(score == 1.0 || score == 0.5, "score={score} for {r:?}/{v:?}");
        }
    }

    #[test]
    fn test_experience_no_requirement_full_credit() {
        assert_eq!(experience_score(0.0, 0, 0.0), 1.0);
        assert_eq!(experience_score(12.5, 0, 0.0), 1.0);
    }

    #[test]
    fn test_experience_ratio_below_requirement() {
        assert!((experience_score(2.0, 4, 0.0) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_experience_monotonic_up_to_clamp() {
        let mut last = 0.0;
        for tenths in 0..100 {
            let years = f64::from(tenths) / 10.0;
            let score = experience_score(years, 5, 0.0);
            assert!(score >= last, "dropped at {years}");
            last = score;
        }
        assert_eq!(experience_score(10.0, 5, 0.0), 1.0);
    }

    #[test]
    fn test_experience_relevance_bonus_applies_and_clamps() {
        let without = experience_score(1.0, 4, 0.4);
        let with = experience_score(1.0, 4, 0.6);
        assert!((with - without - EXPERIENCE_RELEVANCE_BONUS).abs() < 1e-9);
        // Bonus cannot push past 1.0.
        assert_eq!(experience_score(4.0, 4, 0.9), 1.0);
    }

    #[test]
    fn test_rules_total_weighting() {
        let total = rules_total(1.0, 0.5, &RuleWeights::default());
        assert!((total - 0.8).abs() < 1e-9);
    }
}
