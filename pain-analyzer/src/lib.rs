use insight_core::FetchResult;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use tracing::warn;

/// Entries at or below this length are noise, not pain points.
const MIN_PAIN_POINT_LEN: usize = 10;

/// Distress and help-seeking vocabulary for the keyword pass.
const PAIN_POINT_KEYWORDS: &[&str] = &[
    "challenge",
    "problem",
    "struggle",
    "difficult",
    "hard",
    "issue",
    "trouble",
    "worry",
    "concerned",
    "frustrating",
    "overwhelmed",
    "anxious",
    "tired",
    "exhausted",
    "help",
    "advice",
    "suggestion",
    "tips",
];

// Simple boundary heuristic, not a full sentence tokenizer. The
// whitespace requirement keeps mid-token periods (version numbers,
// URLs) from ending a sentence.
static SENTENCE_BOUNDARY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]\s+").unwrap());

fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    for boundary in SENTENCE_BOUNDARY_RE.find_iter(text) {
        // keep the terminal punctuation with its sentence
        sentences.push(&text[start..boundary.start() + 1]);
        start = boundary.end();
    }
    if start < text.len() {
        sentences.push(&text[start..]);
    }
    sentences
}

/// Phrase-extraction patterns applied against the whole text, each
/// capturing the trailing clause up to the next terminal punctuation.
static PAIN_POINT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)(?:struggle|struggling) with\s+([^.!?]+)[.!?]",
        r"(?i)(?:difficult|hard) to\s+([^.!?]+)[.!?]",
        r"(?i)(?:problem|issue|challenge) (?:with|is|in)\s+([^.!?]+)[.!?]",
        r"(?i)(?:need|looking for) (?:help|advice|guidance)\s+([^.!?]+)[.!?]",
        r"(?i)how (?:do|can) (?:i|you|we)\s+([^.!?]+)[.!?]",
        r"(?i)any tips for\s+([^.!?]+)[.!?]",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("static pattern must compile"))
    .collect()
});

/// Layered heuristic matcher for phrases expressing a problem or need.
/// Extraction is pure and soft-failing: malformed input yields an
/// empty list with a logged warning, never an error.
#[derive(Debug, Clone, Default)]
pub struct PainPointExtractor;

impl PainPointExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract candidate pain points from one text, in first-occurrence
    /// order: keyword-matched sentences first, then pattern captures.
    /// Deduplicated, entries longer than the minimum length only.
    pub fn extract(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let mut points = Vec::new();

        // Keyword pass over sentences
        for sentence in split_sentences(text) {
            let sentence = sentence.trim();
            let lowered = sentence.to_lowercase();
            if PAIN_POINT_KEYWORDS
                .iter()
                .any(|keyword| lowered.contains(keyword))
            {
                points.push(sentence.to_string());
            }
        }

        // Pattern pass over the whole text
        for pattern in PAIN_POINT_PATTERNS.iter() {
            for captures in pattern.captures_iter(text) {
                if let Some(matched) = captures.get(1) {
                    points.push(matched.as_str().trim().to_string());
                }
            }
        }

        dedup_ordered(points)
    }

    /// Extract across a whole fetch result: title, then body, then
    /// each comment, for every post in listing order. One dedup scope
    /// spans the entire result.
    pub fn extract_from_result(&self, result: &FetchResult) -> Vec<String> {
        if let Some(error) = &result.error {
            warn!("Skipping pain point extraction for errored result: {}", error);
            return Vec::new();
        }

        let mut points = Vec::new();
        for post in &result.posts {
            points.extend(self.extract(&post.title));
            points.extend(self.extract(&post.content));
            for comment in &post.comments {
                points.extend(self.extract(&comment.content));
            }
        }

        dedup_ordered(points)
    }
}

/// First-occurrence dedup with the minimum-length filter. Length is
/// counted in characters so multi-byte text does not slip past the
/// floor.
fn dedup_ordered(points: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    points
        .into_iter()
        .filter(|point| point.chars().count() > MIN_PAIN_POINT_LEN && seen.insert(point.clone()))
        .collect()
}
