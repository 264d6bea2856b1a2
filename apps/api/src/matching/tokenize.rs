//! Skill tokenizer: turns a skills text blob into discrete skill phrases.

use crate::matching::normalize::word_tokens;

/// Splits a skills blob into an ordered, non-deduplicated list of phrases.
///
/// Primary path: bullet-prefixed segments. A line starting with `•` or `*`
/// opens a segment that runs until the next bullet line or a blank line.
/// Fallback when no bullets exist: alphabetic tokens ≥3 chars, lowercased.
pub fn split_skills(text: &str) -> Vec<String> {
    let bullets = bullet_segments(text);
    if !bullets.is_empty() {
        return bullets;
    }
    word_tokens(&text.to_lowercase(), 3)
}

/// Extracts bullet segments from `text`. Each segment is trimmed; continuation
/// lines (non-bullet, non-blank lines after a bullet) fold into the segment.
pub fn bullet_segments(text: &str) -> Vec<String> {
    let mut segments: Vec<String> = Vec::new();
    let mut current: Option<String> = None;

    for line in text.lines() {
        let trimmed = line.trim();
        if let Some(rest) = trimmed.strip_prefix(['•', '*']) {
            if let Some(seg) = current.take() {
                push_segment(&mut segments, seg);
            }
            current = Some(rest.trim_start().to_string());
        } else if trimmed.is_empty() {
            if let Some(seg) = current.take() {
                push_segment(&mut segments, seg);
            }
        } else if let Some(seg) = current.as_mut() {
            seg.push(' ');
            seg.push_str(trimmed);
        }
    }
    if let Some(seg) = current.take() {
        push_segment(&mut segments, seg);
    }
    segments
}

fn push_segment(segments: &mut Vec<String>, seg: String) {
    let seg = seg.trim().to_string();
    if !seg.is_empty() {
        segments.push(seg);
    }
}
