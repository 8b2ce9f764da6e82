//! Character-ratio language detection

use serde::{Deserialize, Serialize};
use std::fmt;

/// Share of CJK ideographs above which text is treated as Chinese.
const CHINESE_RATIO_THRESHOLD: f64 = 0.3;

/// Languages the prompt templates and parser vocabulary know about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    #[serde(rename = "en")]
    English,
    #[serde(rename = "zh")]
    Chinese,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Self::English => "en",
            Self::Chinese => "zh",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Classify `text` as Chinese when more than 30% of its characters fall in
/// the CJK Unified Ideographs block, English otherwise (including empty text).
pub fn detect(text: &str) -> Language {
    let mut total = 0usize;
    let mut ideographs = 0usize;

    for c in text.chars() {
        total += 1;
        if is_cjk_ideograph(c) {
            ideographs += 1;
        }
    }

    if total == 0 {
        return Language::English;
    }

    if ideographs as f64 / total as f64 > CHINESE_RATIO_THRESHOLD {
        Language::Chinese
    } else {
        Language::English
    }
}

fn is_cjk_ideograph(c: char) -> bool {
    ('\u{4E00}'..='\u{9FFF}').contains(&c)
}
