use axum::{
    extract::{Multipart, State},
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::ingest::{self, DocumentFormat};
use crate::matching::ensemble;
use crate::matching::extract::{extract_job, extract_resume};
use crate::models::record::{JobRecord, ResumeRecord};
use crate::models::score::{ScoreBreakdown, ScoreResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ScoreRequest {
    pub resume_text: String,
    pub job_text: String,
}

#[derive(Debug, Serialize)]
pub struct ScoreResponse {
    pub resume: ResumeRecord,
    pub job: JobRecord,
    pub score: ScoreResult,
}

/// POST /api/v1/score
/// Scores one resume text against one job description text.
pub async fn handle_score(
    State(state): State<AppState>,
    Json(req): Json<ScoreRequest>,
) -> Result<Json<ScoreResponse>, AppError> {
    if req.resume_text.trim().is_empty() {
        return Err(AppError::Validation("resume_text must not be empty".to_string()));
    }
    if req.job_text.trim().is_empty() {
        return Err(AppError::Validation("job_text must not be empty".to_string()));
    }

    let resume = extract_resume(&req.resume_text, &state.annotator).await;
    let job = extract_job(&req.job_text, &state.annotator).await;
    let score = ensemble::score(
        &resume,
        &job,
        &state.vocabulary,
        state.embedder.as_ref(),
        &state.ensemble,
    )
    .await?;

    Ok(Json(ScoreResponse { resume, job, score }))
}

#[derive(Debug, Serialize)]
pub struct RankedCandidate {
    pub name: Option<String>,
    pub file_name: String,
    pub match_percent: f64,
    pub breakdown: ScoreBreakdown,
}

#[derive(Debug, Serialize)]
pub struct RankResponse {
    pub job: JobRecord,
    pub candidates: Vec<RankedCandidate>,
}

/// POST /api/v1/rank
/// Multipart: a `job_description` text field plus repeated `resumes` file
/// parts (PDF/DOCX/TXT). The job is extracted once; candidates are scored
/// in parallel and returned ranked by descending match.
pub async fn handle_rank(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<RankResponse>, AppError> {
    let mut job_text: Option<String> = None;
    let mut files: Vec<(String, DocumentFormat, Bytes)> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart payload: {e}")))?
    {
        let field_name = field.name().map(str::to_string);
        match field_name.as_deref() {
            Some("job_description") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Unreadable job_description: {e}")))?;
                job_text = Some(text);
            }
            Some("resumes") => {
                let file_name = field.file_name().unwrap_or("resume").to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Unreadable file {file_name}: {e}")))?;
                match DocumentFormat::detect(content_type.as_deref(), &file_name) {
                    Some(format) => files.push((file_name, format, bytes)),
                    None => warn!("Skipping {file_name}: unsupported document format"),
                }
            }
            _ => {}
        }
    }

    let job_text = job_text
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| AppError::Validation("job_description field is required".to_string()))?;
    if files.is_empty() {
        return Err(AppError::Validation(
            "at least one supported resume file is required".to_string(),
        ));
    }

    let job = extract_job(&job_text, &state.annotator).await;
    let total = files.len();

    // One scoring task per candidate; candidates are independent and share
    // only the read-only state.
    let mut tasks: JoinSet<(usize, Option<RankedCandidate>)> = JoinSet::new();
    for (index, (file_name, format, bytes)) in files.into_iter().enumerate() {
        let state = state.clone();
        let job = job.clone();
        tasks.spawn(async move {
            (index, score_candidate(&state, &job, file_name, format, &bytes).await)
        });
    }

    let mut indexed: Vec<(usize, RankedCandidate)> = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, Some(candidate))) => indexed.push((index, candidate)),
            Ok((_, None)) => {}
            Err(e) => warn!("Scoring task failed: {e}"),
        }
    }

    if indexed.is_empty() {
        return Err(AppError::UnprocessableEntity(
            "none of the uploaded resumes could be processed".to_string(),
        ));
    }

    // Fan in: restore upload order, then stable-sort on descending score so
    // ties keep their original order.
    indexed.sort_by_key(|(index, _)| *index);
    let mut candidates: Vec<RankedCandidate> = indexed.into_iter().map(|(_, c)| c).collect();
    candidates.sort_by(|a, b| {
        b.match_percent
            .partial_cmp(&a.match_percent)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    info!("Ranked {}/{} candidates", candidates.len(), total);
    Ok(Json(RankResponse { job, candidates }))
}

/// Ingests and scores a single uploaded resume. Failures are logged and the
/// candidate is dropped from the ranking; one bad file never fails the batch.
async fn score_candidate(
    state: &AppState,
    job: &JobRecord,
    file_name: String,
    format: DocumentFormat,
    bytes: &[u8],
) -> Option<RankedCandidate> {
    let text = match ingest::extract_text(bytes, format) {
        Ok(text) => text,
        Err(e) => {
            warn!("Skipping {file_name}: {e}");
            return None;
        }
    };

    let resume = extract_resume(&text, &state.annotator).await;
    match ensemble::score(
        &resume,
        job,
        &state.vocabulary,
        state.embedder.as_ref(),
        &state.ensemble,
    )
    .await
    {
        Ok(score) => Some(RankedCandidate {
            name: resume.name,
            file_name,
            match_percent: score.total_percent,
            breakdown: score.breakdown,
        }),
        Err(e) => {
            warn!("Skipping {file_name}: embedding failure: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(file_name: &str, match_percent: f64) -> RankedCandidate {
        RankedCandidate {
            name: None,
            file_name: file_name.to_string(),
            match_percent,
            breakdown: ScoreBreakdown {
                tfidf: 0.0,
                embeddings: 0.0,
                keyword_overlap: 0.0,
                fuzzy: 0.0,
                rules: 0.0,
            },
        }
    }

    #[test]
    fn test_rank_sort_descending_stable_on_ties() {
        let mut candidates = vec![
            candidate("a.pdf", 40.0),
            candidate("b.pdf", 75.5),
            candidate("c.pdf", 40.0),
            candidate("d.pdf", 90.0),
        ];
        candidates.sort_by(|a, b| {
            b.match_percent
                .partial_cmp(&a.match_percent)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let order: Vec<&str> = candidates.iter().map(|c| c.file_name.as_str()).collect();
        assert_eq!(order, vec!["d.pdf", "b.pdf", "a.pdf", "c.pdf"]);
    }
}
