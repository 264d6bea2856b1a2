use serde::{Deserialize, Serialize};

/// Structured fields pulled out of a resume. Extraction never fails a whole
/// record: a field the extractor could not locate is `None` (serialized as
/// `null`), and scoring branches on absence instead of comparing magic
/// sentinel strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumeRecord {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    /// Free-text skills blob: bullet lines joined with "; ", possibly with a
    /// ` (detected: …)` annotation carrying entity-ruler skill tokens.
    pub skills: Option<String>,
    /// Additive total over all date ranges plus explicit "N years" mentions.
    /// Overlapping employment periods double-count; this is intentional.
    pub experience_years: f64,
    /// Matched degree keywords joined with ", " in fixed pattern order.
    pub education: Option<String>,
}

/// Structured fields pulled out of a job description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub position: Option<String>,
    pub req_exp_years: u32,
    pub req_education: Option<String>,
    pub req_skills: Option<String>,
}

impl ResumeRecord {
    /// Skills blob as text for the similarity signals; absent → empty.
    pub fn skills_text(&self) -> &str {
        self.skills.as_deref().unwrap_or("")
    }
}

impl JobRecord {
    pub fn req_skills_text(&self) -> &str {
        self.req_skills.as_deref().unwrap_or("")
    }
}
