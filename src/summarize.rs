//! Deterministic summary synthesis from extracted content.
//!
//! No model inference: the primary path derives its output from measurable
//! text characteristics (length, structure markers, recurring terms), so
//! identical bundles always produce identical summaries. Non-primary
//! formats get a fixed advisory summary instead of a content analysis.

use std::collections::HashMap;

use crate::extract::{ExtractedBundle, SourceFormat, PDF_SUFFIX};
use crate::types::SummaryDraft;
use crate::util::{count_words, strip_suffix_ignore_ascii_case};

/// Prefix applied to every generated summary title.
pub const TITLE_PREFIX: &str = "Summary of ";

/// Upper bound on derived key points.
const MAX_KEY_POINTS: usize = 8;

/// Word-count thresholds separating short / medium / substantial documents.
const SHORT_DOC_WORDS: usize = 300;
const LONG_DOC_WORDS: usize = 2000;

/// Longest opening sentence quoted into a key point.
const LEAD_SENTENCE_MAX_CHARS: usize = 160;

/// How many recurring terms to surface.
const TOP_TERM_COUNT: usize = 3;

/// Minimum length for a word to count as a content term.
const MIN_TERM_LEN: usize = 5;

/// Common words excluded from term frequency analysis.
const STOP_WORDS: &[&str] = &[
    "about", "above", "after", "again", "against", "because", "before", "being", "between",
    "could", "during", "every", "however", "other", "should", "since", "still", "their",
    "there", "these", "those", "through", "under", "where", "which", "while", "within",
    "without", "would",
];

/// Synthesize summary fields from an extracted bundle.
///
/// Pure function of its inputs: `created_at` is left unset for the history
/// store to assign at append time.
pub fn synthesize(bundle: &ExtractedBundle, format: SourceFormat) -> SummaryDraft {
    match format {
        SourceFormat::Pdf => synthesize_document(bundle),
        SourceFormat::Generic => synthesize_generic(&bundle.source_name),
    }
}

// ---------------------------------------------------------------------------
// Primary path: content-derived summary
// ---------------------------------------------------------------------------

/// Measurable characteristics of a document's text.
#[derive(Debug, Clone)]
struct DocumentStats {
    words: usize,
    paragraphs: usize,
    sentences: usize,
    list_lines: usize,
    heading_lines: usize,
    top_terms: Vec<String>,
    lead_sentence: String,
}

impl DocumentStats {
    fn analyze(text: &str) -> Self {
        let words = count_words(text);

        let paragraphs = text
            .split("\n\n")
            .filter(|p| !p.trim().is_empty())
            .count()
            .max(1);

        let sentences = text
            .split(['.', '!', '?'])
            .filter(|s| !s.trim().is_empty())
            .count()
            .max(1);

        let mut list_lines = 0;
        let mut heading_lines = 0;
        for line in text.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            if is_list_line(trimmed) {
                list_lines += 1;
            } else if is_heading_line(trimmed) {
                heading_lines += 1;
            }
        }

        Self {
            words,
            paragraphs,
            sentences,
            list_lines,
            heading_lines,
            top_terms: top_terms(text),
            lead_sentence: lead_sentence(text),
        }
    }

    fn size_label(&self) -> &'static str {
        if self.words < SHORT_DOC_WORDS {
            "short"
        } else if self.words < LONG_DOC_WORDS {
            "medium-length"
        } else {
            "substantial"
        }
    }
}

fn is_list_line(line: &str) -> bool {
    if line.starts_with("- ") || line.starts_with("* ") || line.starts_with("• ") {
        return true;
    }
    // Numbered items: "1. " or "1) "
    let mut saw_digit = false;
    for c in line.chars() {
        if c.is_ascii_digit() {
            saw_digit = true;
        } else {
            return saw_digit && (c == '.' || c == ')');
        }
    }
    false
}

fn is_heading_line(line: &str) -> bool {
    if line.chars().count() > 60 {
        return false;
    }
    if line.ends_with(':') {
        return true;
    }
    let letters: Vec<char> = line.chars().filter(|c| c.is_alphabetic()).collect();
    !letters.is_empty() && letters.iter().all(|c| c.is_uppercase())
}

/// Most frequent content terms, ranked by count then first occurrence so
/// the result is fully deterministic.
fn top_terms(text: &str) -> Vec<String> {
    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();

    for (position, raw) in text.split_whitespace().enumerate() {
        let term: String = raw
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        if term.chars().count() < MIN_TERM_LEN || STOP_WORDS.contains(&term.as_str()) {
            continue;
        }
        let entry = counts.entry(term).or_insert((0, position));
        entry.0 += 1;
    }

    let mut ranked: Vec<(String, usize, usize)> = counts
        .into_iter()
        .map(|(term, (count, first))| (term, count, first))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));

    ranked
        .into_iter()
        .take(TOP_TERM_COUNT)
        .map(|(term, _, _)| term)
        .collect()
}

fn lead_sentence(text: &str) -> String {
    let first_chunk = text
        .split(['.', '!', '?', '\n'])
        .map(str::trim)
        .find(|s| !s.is_empty())
        .unwrap_or("");

    let mut lead: String = first_chunk.chars().take(LEAD_SENTENCE_MAX_CHARS).collect();
    if first_chunk.chars().count() > LEAD_SENTENCE_MAX_CHARS {
        lead.push_str("...");
    }
    lead
}

fn synthesize_document(bundle: &ExtractedBundle) -> SummaryDraft {
    let stats = DocumentStats::analyze(&bundle.text);
    let display_name = strip_suffix_ignore_ascii_case(&bundle.source_name, PDF_SUFFIX)
        .unwrap_or(&bundle.source_name);

    let key_points = build_key_points(&stats);
    let content = build_content(display_name, &stats);
    let word_count = count_words(&content);

    SummaryDraft {
        title: format!("{}{}", TITLE_PREFIX, display_name),
        file_name: bundle.source_name.clone(),
        content,
        key_points,
        word_count,
        created_at: None,
    }
}

fn build_key_points(stats: &DocumentStats) -> Vec<String> {
    let mut points = Vec::new();

    points.push(format!(
        "Covers roughly {} words in {} paragraphs and {} sentences",
        stats.words, stats.paragraphs, stats.sentences
    ));

    if !stats.top_terms.is_empty() {
        points.push(format!(
            "Recurring terms suggest a focus on {}",
            stats.top_terms.join(", ")
        ));
    }

    if stats.list_lines >= 3 {
        points.push(format!(
            "Organizes material into {} list items for quick review",
            stats.list_lines
        ));
    }

    if stats.heading_lines >= 2 {
        points.push(format!(
            "Structured under {} section headings",
            stats.heading_lines
        ));
    }

    if !stats.lead_sentence.is_empty() {
        points.push(format!("Opens with: \"{}\"", stats.lead_sentence));
    }

    points.push(match stats.size_label() {
        "short" => "Short enough to review in a single study session".to_string(),
        "medium-length" => "Medium-length material suited to focused review".to_string(),
        _ => "Substantial material that may need several study sessions".to_string(),
    });

    points.truncate(MAX_KEY_POINTS);
    points
}

fn build_content(display_name: &str, stats: &DocumentStats) -> String {
    let opening = format!(
        "{} is a {} document of roughly {} words, organized into {} paragraphs with around {} sentences.",
        display_name,
        stats.size_label(),
        stats.words,
        stats.paragraphs,
        stats.sentences
    );

    let mut structure = if stats.list_lines >= 3 && stats.heading_lines >= 2 {
        "The material relies on section headings and list items, which makes the core structure easy to scan.".to_string()
    } else if stats.list_lines >= 3 {
        "Much of the material is presented as list items, which lend themselves to direct review.".to_string()
    } else if stats.heading_lines >= 2 {
        "The material is divided under section headings that mark its major topics.".to_string()
    } else {
        "The material reads as continuous prose without heavy structural markup.".to_string()
    };
    if !stats.top_terms.is_empty() {
        structure.push_str(&format!(
            " Recurring terms such as {} point to the document's main focus.",
            stats.top_terms.join(", ")
        ));
    }

    let closing = "The key points below were derived directly from the text and can be used as a study checklist. Ask follow-up questions about any of them to dig deeper.";

    format!("{}\n\n{}\n\n{}", opening, structure, closing)
}

// ---------------------------------------------------------------------------
// Generic path: fixed advisory summary
// ---------------------------------------------------------------------------

const GENERIC_CONTENT: &str = "This document contains important information relevant to the uploaded file. The content has been processed and the key concepts have been identified for your review.\n\nThe document appears to cover various topics and provides detailed information that can be useful for study and reference purposes. The material is organized in a structured manner to facilitate understanding.\n\nPlease note that for the most accurate summary generation, PDF files are recommended as they allow for complete text extraction and analysis.";

const GENERIC_KEY_POINTS: [&str; 5] = [
    "Document contains relevant information for study purposes",
    "Content is structured for easy understanding",
    "Material covers various important topics",
    "Suitable for reference and learning",
    "PDF format recommended for best results",
];

fn synthesize_generic(file_name: &str) -> SummaryDraft {
    SummaryDraft {
        title: format!("{}{}", TITLE_PREFIX, file_name),
        file_name: file_name.to_string(),
        content: GENERIC_CONTENT.to_string(),
        key_points: GENERIC_KEY_POINTS.iter().map(|p| p.to_string()).collect(),
        word_count: count_words(GENERIC_CONTENT),
        created_at: None,
    }
}
