use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// Paragraph marker: any run of 2+ whitespace characters is collapsed into it
pub const PARAGRAPH_SEPARATOR: &str = "  ";

/// Target segment length in characters
pub const IDEAL_SEGMENT_SIZE: usize = 400;

/// Paragraphs shorter than this are always folded into the current segment
pub const MINIMUM_PARAGRAPH_SIZE: usize = 24;

static WHITESPACE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s{2,}").expect("whitespace pattern is valid"));

/// A contiguous slice of the normalized input sent to the backend in one request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextSegment {
    pub index: usize,
    pub text: String,
}

impl TextSegment {
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            text: text.into(),
        }
    }

    /// Characters billed for this segment
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

/// Collapse every whitespace run of length >= 2 into the paragraph separator
pub fn normalize(text: &str) -> String {
    WHITESPACE_RUN
        .replace_all(text, PARAGRAPH_SEPARATOR)
        .into_owned()
}

/// Split text into segments of roughly `IDEAL_SEGMENT_SIZE` characters along paragraph boundaries.
///
/// Joining the returned texts with `PARAGRAPH_SEPARATOR` yields `normalize(text)`.
pub fn segment(text: &str) -> Vec<TextSegment> {
    let normalized = normalize(text);
    let paragraphs: Vec<&str> = normalized.split(PARAGRAPH_SEPARATOR).collect();

    if paragraphs.len() == 1 {
        return vec![TextSegment::new(0, normalized)];
    }

    let mut texts: Vec<String> = Vec::new();
    let mut acc = String::new();
    let mut acc_len = 0usize;
    let mut started = false;

    for paragraph in paragraphs {
        let next_len = paragraph.chars().count();

        if !started {
            acc.push_str(paragraph);
            acc_len = next_len;
            started = true;
        } else if acc_len + next_len < IDEAL_SEGMENT_SIZE || next_len < MINIMUM_PARAGRAPH_SIZE {
            acc.push_str(PARAGRAPH_SEPARATOR);
            acc.push_str(paragraph);
            acc_len += PARAGRAPH_SEPARATOR.len() + next_len;
        } else {
            texts.push(std::mem::take(&mut acc));
            acc.push_str(paragraph);
            acc_len = next_len;
        }
    }
    texts.push(acc);

    texts
        .into_iter()
        .enumerate()
        .map(|(index, text)| TextSegment::new(index, text))
        .collect()
}
