use std::collections::HashSet;
use std::path::Path;

use anyhow::{bail, Context, Result};
use tracing::info;

/// The skill vocabulary: an ordered, deduplicated set of lowercase skill
/// strings loaded once at startup and shared read-only across all scoring
/// calls. A missing or unreadable file aborts initialization; extraction
/// and scoring cannot degrade further without it.
#[derive(Debug, Clone)]
pub struct SkillVocabulary {
    skills: Vec<String>,
    index: HashSet<String>,
}

impl SkillVocabulary {
    /// Loads the vocabulary from a CSV file with a `skill` column.
    pub fn load(path: &Path) -> Result<Self> {
        let mut reader = csv::Reader::from_path(path)
            .with_context(|| format!("Cannot open skill vocabulary at {}", path.display()))?;

        let headers = reader.headers().context("Skill vocabulary has no header row")?;
        let skill_col = headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case("skill"))
            .context("Skill vocabulary is missing a 'skill' column")?;

        let mut skills = Vec::new();
        for record in reader.records() {
            let record = record.context("Malformed row in skill vocabulary")?;
            if let Some(raw) = record.get(skill_col) {
                let skill = raw.trim().to_lowercase();
                if !skill.is_empty() {
                    skills.push(skill);
                }
            }
        }

        let vocab = Self::from_skills(skills);
        if vocab.is_empty() {
            bail!("Skill vocabulary at {} contains no skills", path.display());
        }
        info!("Loaded {} skills from {}", vocab.len(), path.display());
        Ok(vocab)
    }

    /// Builds a vocabulary from raw strings: lowercased, trimmed, first
    /// occurrence wins.
    pub fn from_skills<I, S>(raw: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut skills = Vec::new();
        let mut index = HashSet::new();
        for s in raw {
            let skill = s.as_ref().trim().to_lowercase();
            if !skill.is_empty() && index.insert(skill.clone()) {
                skills.push(skill);
            }
        }
        Self { skills, index }
    }

    /// Case-insensitive membership test.
    pub fn contains(&self, skill: &str) -> bool {
        self.index.contains(&skill.trim().to_lowercase())
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.skills.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.skills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }
}
