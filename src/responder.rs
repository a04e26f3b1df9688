//! Keyword-driven answer generation grounded in a stored summary.
//!
//! Questions run through an ordered rule cascade; the first matching rule
//! wins, so an earlier rule pre-empts later ones even when both would
//! match. Two rules pick among candidates with the caller-supplied random
//! source, which makes replies exactly reproducible under a seeded
//! generator.

use rand::{Rng, RngExt};

use crate::summarize::TITLE_PREFIX;
use crate::types::SummaryRecord;

/// Answer a question about a summary using the ambient random source.
pub fn respond(question: &str, summary: &SummaryRecord) -> String {
    respond_with(question, summary, &mut rand::rng())
}

/// Answer a question about a summary using the given random source.
pub fn respond_with(question: &str, summary: &SummaryRecord, rng: &mut impl Rng) -> String {
    let q = question.to_lowercase();
    let subject = subject_of(summary);

    // 1. "what is this about" / "what does the summary say"
    if q.contains("what") && (q.contains("about") || q.contains("summary")) {
        let leads: Vec<&str> = summary
            .key_points
            .iter()
            .take(2)
            .map(String::as_str)
            .collect();
        return format!(
            "This summary is about {}. The main content covers: {}.",
            subject,
            leads.join(" and ")
        );
    }

    // 2. key point enumeration
    if q.contains("key point") || q.contains("main point") {
        let listing: Vec<String> = summary
            .key_points
            .iter()
            .enumerate()
            .map(|(index, point)| format!("{}. {}", index + 1, point))
            .collect();
        return format!(
            "The key points from this summary are:\n{}",
            listing.join("\n")
        );
    }

    // 3. elaboration on a randomly chosen key point
    if q.contains("explain") && q.contains("more") && !summary.key_points.is_empty() {
        let point = &summary.key_points[rng.random_range(0..summary.key_points.len())];
        return format!(
            "Let me elaborate on one of the key points: \"{}\". This relates to the main themes discussed in the document and provides important context for understanding the overall content.",
            point
        );
    }

    // 4. length / word count
    if q.contains("how long") || q.contains("word count") {
        return format!(
            "This summary contains {} words and covers {} key points. The original document was processed to extract the most important information.",
            summary.word_count,
            summary.key_points.len()
        );
    }

    // 5. most important aspect
    if q.contains("important") || q.contains("significant") {
        if let Some(first) = summary.key_points.first() {
            return format!(
                "One of the most important aspects highlighted in this summary is: \"{}\". This forms a central part of the document's main message.",
                first
            );
        }
    }

    // 6. study guidance
    if q.contains("help") || q.contains("study") {
        return format!(
            "To study this material effectively, focus on the {} key points I've identified. You can also ask me specific questions about any part of the summary, like \"What does [specific term] mean?\" or \"Explain more about [topic]\".",
            summary.key_points.len()
        );
    }

    // 7. question mentions a word from a key point
    for point in &summary.key_points {
        let mentioned = point
            .to_lowercase()
            .split_whitespace()
            .any(|word| word.len() > 3 && q.contains(word));
        if mentioned {
            return format!(
                "Regarding \"{}\" - this is one of the key concepts in the summary. It relates to the main themes discussed in the document and is important for understanding the overall content.",
                point
            );
        }
    }

    // 8. generic fallback prompts
    let defaults = [
        format!(
            "Based on the summary, I can help explain concepts related to {}. What specific aspect would you like me to clarify?",
            subject
        ),
        "This summary covers several important points. You can ask me to explain any of the key points in more detail, or ask specific questions about the content.".to_string(),
        "I'm here to help you understand the material better. Try asking me about specific topics mentioned in the summary, or ask me to explain any key points in more detail.".to_string(),
        "Feel free to ask me about any specific part of the summary. I can help explain concepts, provide more detail on key points, or clarify anything that might be unclear.".to_string(),
    ];
    defaults[rng.random_range(0..defaults.len())].clone()
}

/// The record's subject: its title with the generation label stripped.
fn subject_of(summary: &SummaryRecord) -> &str {
    summary
        .title
        .strip_prefix(TITLE_PREFIX)
        .unwrap_or(&summary.title)
}
