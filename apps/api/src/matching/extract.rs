//! Field extraction: structured `ResumeRecord` / `JobRecord` out of raw
//! semi-structured text.
//!
//! Every per-field step degrades to absence instead of failing the record.
//! Individual malformed dates inside the experience loop are skipped.

use chrono::{NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::matching::tokenize::bullet_segments;
use crate::models::record::{JobRecord, ResumeRecord};
use crate::nlp::ner::{Annotator, Entity, EntityLabel};

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").unwrap());

static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\+?\d{1,3}[-.\s]?\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{2,4}").unwrap());

// 2–3 capitalized tokens followed by an email, a phone, a dash, a newline or
// end of text. The delimiter is consumed rather than looked ahead at; only
// the captured name and its offset are used.
static NAME_FALLBACK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([A-Z][A-Za-z'-]+(?:\s+[A-Z][A-Za-z'-]+){1,2})\s*(?:[a-z0-9._%+-]+@|\+?\d|[-–—]|\n|$)")
        .unwrap()
});

// A trailing token that reads like the local part of an email address.
static EMAIL_LOCAL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z0-9._%+-]+$").unwrap());

static SKILLS_SECTION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)skills?\s*(.+?)\s*(?:languages?|certificates?|projects?|\z)").unwrap()
});

static WORK_SECTION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)work\s+experience\s*(.+?)\s*(?:skills?|education|\z)").unwrap()
});

static DATE_RANGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)([A-Za-z]{3})\s+(\d{4})\s*[–—-]?\s*([A-Za-z]{3}\s+\d{4}|present)").unwrap()
});

static YEARS_MENTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)\s*(?:years?|yrs?)\s*(?:of\s+)?experience").unwrap());

static POSITION_LABEL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:position|role|job):\s*([^\r\n]+)").unwrap());

static POSITION_TITLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)([^\r\n]{1,80}?(?:engineer|manager|developer|specialist))\b").unwrap()
});

static REQ_SKILLS_SECTION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)(?:required|key)\s*skills?\s*(.+?)\s*(?:experience|\z)").unwrap()
});

const DEGREE_KEYWORDS: &[&str] = &[
    "bachelor",
    "master",
    "bachelor's",
    "master's",
    "phd",
    "doctorate",
];

const REQUIRED_DEGREE_KEYWORDS: &[&str] = &["bachelor's", "master's", "phd"];

/// Place-name tokens that disqualify a capitalized sequence from being a
/// person name. Matched as substrings of the lowercased candidate.
const GEO_BLOCKLIST: &[&str] = &[
    "new york",
    "san francisco",
    "seattle",
    "chicago",
    "washington",
    "los gatos",
    "mountain view",
    "palo alto",
    "almaty",
    "kazakhstan",
    "russia",
    "ca",
    "ny",
    "wa",
    "il",
    "dc",
    "usa",
    "united states",
    "berkeley",
    "evanston",
    "fairfax",
];

/// Extracts a structured resume record. Never fails: fields the heuristics
/// cannot locate come back as `None`.
pub async fn extract_resume(text: &str, annotator: &Annotator) -> ResumeRecord {
    let entities = annotator.entities(text).await;

    ResumeRecord {
        name: extract_name(text, &entities),
        email: EMAIL_RE.find(text).map(|m| m.as_str().to_string()),
        phone: PHONE_RE.find(text).map(|m| m.as_str().to_string()),
        skills: extract_skills(text, &entities),
        experience_years: extract_experience_years(text),
        education: extract_education(text),
    }
}

/// Extracts a structured job record.
pub async fn extract_job(text: &str, annotator: &Annotator) -> JobRecord {
    let entities = annotator.entities(text).await;
    let lower = text.to_lowercase();

    let req_exp_years = YEARS_MENTION_RE
        .captures(&lower)
        .and_then(|c| c[1].parse::<u32>().ok())
        .unwrap_or(0);

    let req_education = REQUIRED_DEGREE_KEYWORDS
        .iter()
        .find(|kw| lower.contains(**kw))
        .map(|kw| (*kw).to_string());

    JobRecord {
        position: extract_position(text),
        req_exp_years,
        req_education,
        req_skills: extract_required_skills(text, &entities),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Name
// ────────────────────────────────────────────────────────────────────────────

fn extract_name(text: &str, entities: &[Entity]) -> Option<String> {
    // Primary: first PERSON entity with at least two tokens, document order.
    let raw = entities
        .iter()
        .filter(|e| e.label == EntityLabel::Person)
        .find(|e| e.text.split_whitespace().count() >= 2)
        .map(|e| e.text.trim().to_string())
        .or_else(|| name_from_layout(text));

    raw.and_then(|name| postprocess_name(&name))
}

/// Fallback: capitalized 2–3 token runs next to an email, phone, dash or
/// line break; geographic candidates are discarded; the earliest survivor
/// wins.
fn name_from_layout(text: &str) -> Option<String> {
    let mut candidates: Vec<(usize, String)> = Vec::new();
    for caps in NAME_FALLBACK_RE.captures_iter(text) {
        let group = caps.get(1).unwrap();
        let candidate = group.as_str().trim();
        if candidate.split_whitespace().count() < 2 {
            continue;
        }
        let lowered = candidate.to_lowercase();
        if GEO_BLOCKLIST.iter().any(|geo| lowered.contains(geo)) {
            continue;
        }
        candidates.push((group.start(), candidate.to_string()));
    }
    candidates.sort_by_key(|(start, _)| *start);
    candidates.into_iter().next().map(|(_, name)| name)
}

/// Shared cleanup for both name paths: strip embedded email addresses, drop
/// a trailing email-local-part token, truncate around geographic tokens.
fn postprocess_name(name: &str) -> Option<String> {
    let name = EMAIL_RE.replace_all(name, "").trim().to_string();

    let mut parts: Vec<&str> = name.split_whitespace().collect();
    if parts.len() > 2 && EMAIL_LOCAL_RE.is_match(parts[parts.len() - 1]) {
        parts.pop();
    }
    if parts.len() > 2
        && parts.iter().any(|p| {
            let lowered = p.to_lowercase();
            GEO_BLOCKLIST.iter().any(|geo| lowered.contains(geo))
        })
    {
        parts.truncate(2);
    }

    let cleaned = parts.join(" ");
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Skills
// ────────────────────────────────────────────────────────────────────────────

fn extract_skills(text: &str, entities: &[Entity]) -> Option<String> {
    let section = SKILLS_SECTION_RE
        .captures(text)
        .map(|c| c[1].to_string())
        .map(|span| bullet_segments(&span).join("; "))
        .filter(|joined| !joined.is_empty());

    let detected = dedup_lowercase(
        entities
            .iter()
            .filter(|e| e.label == EntityLabel::Skill)
            .map(|e| e.text.as_str()),
    );

    match (section, detected.is_empty()) {
        (Some(section), false) => Some(format!("{section} (detected: {})", detected.join(" "))),
        (Some(section), true) => Some(section),
        (None, false) => Some(detected.join(" ")),
        (None, true) => None,
    }
}

/// Lowercased, first occurrence wins. Keeps output deterministic.
fn dedup_lowercase<'a>(items: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for item in items {
        let lowered = item.to_lowercase();
        if seen.insert(lowered.clone()) {
            out.push(lowered);
        }
    }
    out
}

// ────────────────────────────────────────────────────────────────────────────
// Experience
// ────────────────────────────────────────────────────────────────────────────

fn extract_experience_years(text: &str) -> f64 {
    let mut years = 0.0_f64;

    // Date ranges inside the Work Experience section. All ranges are summed;
    // overlapping employment periods double-count by design.
    if let Some(section) = WORK_SECTION_RE.captures(text).map(|c| c[1].to_string()) {
        let today = Utc::now().date_naive();
        for caps in DATE_RANGE_RE.captures_iter(&section) {
            let Some(start) = parse_month_year(&caps[1], &caps[2]) else {
                debug!("Skipping unparseable range start: {}", &caps[0]);
                continue;
            };
            let end = if caps[3].eq_ignore_ascii_case("present") {
                Some(today)
            } else {
                let mut parts = caps[3].split_whitespace();
                match (parts.next(), parts.next()) {
                    (Some(month), Some(year)) => parse_month_year(month, year),
                    _ => None,
                }
            };
            let Some(end) = end else {
                debug!("Skipping unparseable range end: {}", &caps[0]);
                continue;
            };
            years += (end - start).num_days() as f64 / 365.25;
        }
    }

    // Explicit "N years of experience" mentions anywhere in the text are
    // added on top. This can double-count with the date-range sum;
    // documented behavior, not corrected.
    let lower = text.to_lowercase();
    for caps in YEARS_MENTION_RE.captures_iter(&lower) {
        if let Ok(n) = caps[1].parse::<u32>() {
            years += f64::from(n);
        }
    }

    round1(years.max(0.0))
}

fn parse_month_year(month: &str, year: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(&format!("1 {month} {year}"), "%d %b %Y").ok()
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

// ────────────────────────────────────────────────────────────────────────────
// Education
// ────────────────────────────────────────────────────────────────────────────

fn extract_education(text: &str) -> Option<String> {
    let lower = text.to_lowercase();
    let found: Vec<&str> = DEGREE_KEYWORDS
        .iter()
        .copied()
        .filter(|kw| lower.contains(kw))
        .collect();
    if found.is_empty() {
        None
    } else {
        Some(found.join(", "))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Job fields
// ────────────────────────────────────────────────────────────────────────────

fn extract_position(text: &str) -> Option<String> {
    if let Some(caps) = POSITION_LABEL_RE.captures(text) {
        return Some(caps[1].trim().to_string());
    }
    POSITION_TITLE_RE
        .captures(text)
        .map(|caps| caps[1].trim().to_string())
}

fn extract_required_skills(text: &str, entities: &[Entity]) -> Option<String> {
    if let Some(caps) = REQ_SKILLS_SECTION_RE.captures(text) {
        let section = caps[1].trim();
        if !section.is_empty() {
            return Some(section.to_string());
        }
    }

    // Fallback: every entity the annotator labeled as a skill-ish span.
    let mut seen = std::collections::HashSet::new();
    let fallback: Vec<&str> = entities
        .iter()
        .filter(|e| {
            matches!(
                e.label,
                EntityLabel::Skill | EntityLabel::Org | EntityLabel::Product | EntityLabel::Gpe
            )
        })
        .map(|e| e.text.as_str())
        .filter(|t| seen.insert(t.to_lowercase()))
        .collect();

    if fallback.is_empty() {
        None
    } else {
        Some(fallback.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nlp::ner::{EntityRecognizer, NerError, VocabularyRuler};
    use crate::nlp::vocabulary::SkillVocabulary;
    use async_trait::async_trait;
    use std::sync::Arc;

    const RESUME_TEXT: &str = "\
John Smith
john.smith@example.com
+1 555-123-4567

Work Experience
Backend Developer, Acme
Jan 2020 - Jan 2022
Built services in Python with 3 years of experience in SQL tuning.

Skills
• Python
• SQL
• Linux administration

Education
Bachelor's degree in Computer Science
";

    fn ruler() -> VocabularyRuler {
        VocabularyRuler::new(&SkillVocabulary::from_skills(["python", "sql", "linux"]))
    }

    fn annotator() -> Annotator {
        Annotator::new(ruler(), None)
    }

    struct PersonStub {
        name: &'static str,
    }

    #[async_trait]
    impl EntityRecognizer for PersonStub {
        fn name(&self) -> &'static str {
            "stub"
        }

        async fn recognize(&self, _text: &str) -> Result<Vec<Entity>, NerError> {
            Ok(vec![Entity {
                text: self.name.to_string(),
                label: EntityLabel::Person,
                start: 0,
            }])
        }
    }

    fn annotator_with_person(name: &'static str) -> Annotator {
        Annotator::new(ruler(), Some(Arc::new(PersonStub { name })))
    }

    #[tokio::test]
    async fn test_resume_contact_fields() {
        let record = extract_resume(RESUME_TEXT, &annotator()).await;
        assert_eq!(record.name.as_deref(), Some("John Smith"));
        assert_eq!(record.email.as_deref(), Some("john.smith@example.com"));
        assert_eq!(record.phone.as_deref(), Some("+1 555-123-4567"));
    }

    #[tokio::test]
    async fn test_resume_skills_section_with_detected_annotation() {
        let record = extract_resume(RESUME_TEXT, &annotator()).await;
        let skills = record.skills.unwrap();
        assert!(skills.starts_with("Python; SQL; Linux administration"));
        assert!(skills.contains("(detected:"), "skills={skills}");
        assert!(skills.contains("python"));
    }

    #[tokio::test]
    async fn test_resume_experience_sums_ranges_and_mentions() {
        let record = extract_resume(RESUME_TEXT, &annotator()).await;
        // Jan 2020 – Jan 2022 ≈ 2.0 years, plus the explicit "3 years".
        assert!(
            (record.experience_years - 5.0).abs() < 0.11,
            "years={}",
            record.experience_years
        );
    }

    #[tokio::test]
    async fn test_resume_education_keywords() {
        let record = extract_resume(RESUME_TEXT, &annotator()).await;
        let education = record.education.unwrap();
        assert!(education.contains("bachelor"));
        assert!(education.contains("bachelor's"));
    }

    #[tokio::test]
    async fn test_name_prefers_person_entity() {
        let ann = annotator_with_person("Jane Doe");
        let record = extract_resume(RESUME_TEXT, &ann).await;
        assert_eq!(record.name.as_deref(), Some("Jane Doe"));
    }

    #[tokio::test]
    async fn test_single_token_person_entity_falls_back_to_layout() {
        let ann = annotator_with_person("Cher");
        let record = extract_resume(RESUME_TEXT, &ann).await;
        assert_eq!(record.name.as_deref(), Some("John Smith"));
    }

    #[tokio::test]
    async fn test_name_trailing_email_local_dropped() {
        let ann = annotator_with_person("Mia Chen mia.chen.devops");
        let record = extract_resume(RESUME_TEXT, &ann).await;
        assert_eq!(record.name.as_deref(), Some("Mia Chen"));
    }

    #[tokio::test]
    async fn test_name_embedded_email_stripped() {
        let ann = annotator_with_person("Mia Chen mia@example.com");
        let record = extract_resume(RESUME_TEXT, &ann).await;
        assert_eq!(record.name.as_deref(), Some("Mia Chen"));
    }

    #[tokio::test]
    async fn test_name_geo_candidate_discarded() {
        let text = "San Francisco\nJohn Smith\njohn@example.com\n";
        let record = extract_resume(text, &annotator()).await;
        assert_eq!(record.name.as_deref(), Some("John Smith"));
    }

    #[tokio::test]
    async fn test_missing_fields_are_absent() {
        let record = extract_resume("nothing to see here", &annotator()).await;
        assert_eq!(record.name, None);
        assert_eq!(record.email, None);
        assert_eq!(record.phone, None);
        assert_eq!(record.skills, None);
        assert_eq!(record.education, None);
        assert_eq!(record.experience_years, 0.0);
    }

    #[tokio::test]
    async fn test_malformed_dates_skipped_individually() {
        let text = "\
Work Experience
Zzz 2019 - Zzz 2020
Mar 2021 - Mar 2022
Skills
";
        let record = extract_resume(text, &annotator()).await;
        assert!(
            (record.experience_years - 1.0).abs() < 0.11,
            "years={}",
            record.experience_years
        );
    }

    #[tokio::test]
    async fn test_present_range_counts_to_today() {
        let text = "Work Experience\nJun 2024 - present\nSkills\n";
        let record = extract_resume(text, &annotator()).await;
        assert!(record.experience_years >= 1.0, "years={}", record.experience_years);
    }

    const JOB_TEXT: &str = "\
Position: Senior Backend Engineer
We need 4 years of experience with Python services.
A bachelor's degree is required.

Required Skills
Python, SQL, Docker

Experience with cloud platforms is a plus.
";

    #[tokio::test]
    async fn test_job_record_fields() {
        let record = extract_job(JOB_TEXT, &annotator()).await;
        assert_eq!(record.position.as_deref(), Some("Senior Backend Engineer"));
        assert_eq!(record.req_exp_years, 4);
        assert_eq!(record.req_education.as_deref(), Some("bachelor's"));
        assert_eq!(record.req_skills.as_deref(), Some("Python, SQL, Docker"));
    }

    #[tokio::test]
    async fn test_job_position_title_fallback() {
        let record = extract_job("Backend Developer wanted for platform team", &annotator()).await;
        assert_eq!(record.position.as_deref(), Some("Backend Developer"));
    }

    #[tokio::test]
    async fn test_job_skills_entity_fallback() {
        let text = "We use Python and SQL daily. No formal requirements section.";
        let record = extract_job(text, &annotator()).await;
        let skills = record.req_skills.unwrap();
        assert!(skills.contains("Python"));
        assert!(skills.contains("SQL"));
    }

    #[tokio::test]
    async fn test_job_defaults_when_nothing_matches() {
        let record = extract_job("short note", &annotator()).await;
        assert_eq!(record.position, None);
        assert_eq!(record.req_exp_years, 0);
        assert_eq!(record.req_education, None);
        assert_eq!(record.req_skills, None);
    }
}
