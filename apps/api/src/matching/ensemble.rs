//! Fixed-weight ensemble: fuses the four similarity signals and the rules
//! total into one 0–100 score with a per-signal breakdown.

use crate::matching::normalize::normalize;
use crate::matching::rules::{education_score, experience_score, rules_total, RuleWeights};
use crate::matching::similarity::{
    embedding_similarity, fuzzy_token_overlap, keyword_overlap, tfidf_cosine,
};
use crate::matching::tokenize::split_skills;
use crate::models::record::{JobRecord, ResumeRecord};
use crate::models::score::{round2, ScoreBreakdown, ScoreResult};
use crate::nlp::embedding::{EmbedError, Embedder};
use crate::nlp::vocabulary::SkillVocabulary;

/// Weights over the four skill signals. These sum to 1; a dedicated test
/// keeps them honest when tuned.
#[derive(Debug, Clone, Copy)]
pub struct SignalWeights {
    pub tfidf: f64,
    pub embeddings: f64,
    pub keyword_overlap: f64,
    pub fuzzy: f64,
}

impl Default for SignalWeights {
    fn default() -> Self {
        Self {
            tfidf: 0.2,
            embeddings: 0.5,
            keyword_overlap: 0.15,
            fuzzy: 0.15,
        }
    }
}

/// Split between the skills ensemble and the rules total.
#[derive(Debug, Clone, Copy)]
pub struct MixWeights {
    pub skills: f64,
    pub rules: f64,
}

impl Default for MixWeights {
    fn default() -> Self {
        Self {
            skills: 0.8,
            rules: 0.2,
        }
    }
}

/// Everything the combiner can be tuned on, in one place.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnsembleConfig {
    pub signals: SignalWeights,
    pub mix: MixWeights,
    pub rules: RuleWeights,
}

/// Scores one resume against one job. Deterministic given the records, the
/// vocabulary, and the embedder; no state survives the call.
pub async fn score(
    resume: &ResumeRecord,
    job: &JobRecord,
    vocabulary: &SkillVocabulary,
    embedder: &dyn Embedder,
    config: &EnsembleConfig,
) -> Result<ScoreResult, EmbedError> {
    let skills_r_raw = resume.skills_text();
    let skills_v_raw = job.req_skills_text();

    let norm_r = normalize(skills_r_raw);
    let norm_v = normalize(skills_v_raw);
    let list_r = split_skills(skills_r_raw);
    let list_v = split_skills(skills_v_raw);

    let tfidf = tfidf_cosine(&norm_r, &norm_v);
    let embeddings = embedding_similarity(embedder, &list_r, &list_v).await?;
    let kw_overlap = keyword_overlap(&list_r, &list_v, vocabulary);
    let fuzzy = fuzzy_token_overlap(&norm_r, &norm_v);

    let education = education_score(resume.education.as_deref(), job.req_education.as_deref());
    // The experience bonus deliberately reads the fuzzy similarity signal.
    let experience = experience_score(resume.experience_years, job.req_exp_years, fuzzy);
    let rules = rules_total(experience, education, &config.rules);

    let skills_ensemble = config.signals.tfidf * tfidf
        + config.signals.embeddings * embeddings
        + config.signals.keyword_overlap * kw_overlap
        + config.signals.fuzzy * fuzzy;
    let total = config.mix.skills * skills_ensemble + config.mix.rules * rules;

    Ok(ScoreResult {
        total_percent: round2(total * 100.0).clamp(0.0, 100.0),
        breakdown: ScoreBreakdown {
            tfidf: round2(tfidf * 100.0),
            embeddings: round2(embeddings * 100.0),
            keyword_overlap: round2(kw_overlap * 100.0),
            fuzzy: round2(fuzzy * 100.0),
            rules: round2(rules * 100.0),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nlp::embedding::HashEmbedder;

    fn resume(skills: &str, years: f64, education: Option<&str>) -> ResumeRecord {
        ResumeRecord {
            name: Some("Test Candidate".to_string()),
            email: None,
            phone: None,
            skills: Some(skills.to_string()),
            experience_years: years,
            education: education.map(str::to_string),
        }
    }

    fn job(skills: &str, years: u32, education: Option<&str>) -> JobRecord {
        JobRecord {
            position: Some("Backend Engineer".to_string()),
            req_exp_years: years,
            req_education: education.map(str::to_string),
            req_skills: Some(skills.to_string()),
        }
    }

    fn vocab() -> SkillVocabulary {
        SkillVocabulary::from_skills(["python", "sql", "linux", "docker"])
    }

    #[test]
    fn test_signal_weights_sum_to_one() {
        let w = SignalWeights::default();
        let sum = w.tfidf + w.embeddings + w.keyword_overlap + w.fuzzy;
        assert!((sum - 1.0).abs() < 1e-9, "signal weights sum to {sum}");

        let m = MixWeights::default();
        assert!((m.skills + m.rules - 1.0).abs() < 1e-9);

        let r = RuleWeights::default();
        assert!((r.experience + r.education - 1.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_score_deterministic() {
        let embedder = HashEmbedder::default();
        let r = resume("Python; SQL; Linux", 3.0, Some("master's"));
        let j = job("Python, SQL, Docker", 2, Some("master's"));
        let cfg = EnsembleConfig::default();

        let first = score(&r, &j, &vocab(), &embedder, &cfg).await.unwrap();
        let second = score(&r, &j, &vocab(), &embedder, &cfg).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_end_to_end_scenario_bounds() {
        let embedder = HashEmbedder::default();
        let r = resume("Python; SQL; Linux", 3.0, Some("bachelor"));
        let j = job("Python, SQL, Docker", 2, Some("bachelor's"));
        let cfg = EnsembleConfig::default();

        let result = score(&r, &j, &vocab(), &embedder, &cfg).await.unwrap();
        assert!(
            result.total_percent > 0.0 && result.total_percent < 100.0,
            "total={}",
            result.total_percent
        );
        assert!(result.breakdown.tfidf > 0.0 && result.breakdown.tfidf < 100.0);
        for value in [
            result.breakdown.tfidf,
            result.breakdown.embeddings,
            result.breakdown.keyword_overlap,
            result.breakdown.fuzzy,
            result.breakdown.rules,
        ] {
            assert!((0.0..=100.0).contains(&value), "breakdown value {value}");
            assert!(!value.is_nan());
        }
    }

    #[tokio::test]
    async fn test_identical_skills_max_out_embedding_and_fuzzy() {
        let embedder = HashEmbedder::default();
        let r = resume("Python; SQL; Linux", 0.0, None);
        let j = job("Python; SQL; Linux", 0, None);
        let cfg = EnsembleConfig::default();

        let result = score(&r, &j, &vocab(), &embedder, &cfg).await.unwrap();
        assert_eq!(result.breakdown.embeddings, 100.0);
        assert!(result.breakdown.fuzzy >= 99.0, "fuzzy={}", result.breakdown.fuzzy);
    }

    #[tokio::test]
    async fn test_empty_skills_both_sides_defined() {
        let embedder = HashEmbedder::default();
        let r = ResumeRecord {
            name: None,
            email: None,
            phone: None,
            skills: None,
            experience_years: 0.0,
            education: None,
        };
        let j = JobRecord {
            position: None,
            req_exp_years: 0,
            req_education: None,
            req_skills: None,
        };
        let cfg = EnsembleConfig::default();

        let result = score(&r, &j, &vocab(), &embedder, &cfg).await.unwrap();
        assert_eq!(result.breakdown.embeddings, 0.0);
        assert_eq!(result.breakdown.tfidf, 0.0);
        assert_eq!(result.breakdown.keyword_overlap, 0.0);
        assert_eq!(result.breakdown.fuzzy, 0.0);
        // No requirement ⇒ experience full credit; education absent ⇒ 0.5.
        // rules = 0.6·1.0 + 0.4·0.5 = 0.8.
        assert!((result.breakdown.rules - 80.0).abs() < 1e-9);
        assert!(!result.total_percent.is_nan());
        assert!((0.0..=100.0).contains(&result.total_percent));
    }

    #[tokio::test]
    async fn test_no_experience_requirement_full_credit_regardless_of_years() {
        let embedder = HashEmbedder::default();
        let cfg = EnsembleConfig::default();
        let j = job("Python", 0, None);

        let junior = score(&resume("Python", 0.0, None), &j, &vocab(), &embedder, &cfg)
            .await
            .unwrap();
        let senior = score(&resume("Python", 15.0, None), &j, &vocab(), &embedder, &cfg)
            .await
            .unwrap();
        assert_eq!(junior.breakdown.rules, senior.breakdown.rules);
    }
}
