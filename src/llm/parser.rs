//! Tolerant parsing of free-form model output
//!
//! Local models drift from the requested format: they echo instructions,
//! print banners, mix English and Chinese headers, or number lists
//! inconsistently. The parser walks the output line by line with a small
//! section state machine and keeps whatever looks like content. It never
//! fails; unusable output yields an empty record.

use serde::{Deserialize, Serialize};

use crate::llm::prompts::{CHAT_DELIMITERS, IM_START};
use crate::storage::SummaryRecord;
use crate::text::{detect, Language};

const BULLETS: [char; 3] = ['*', '-', '•'];

/// Header terms for one language
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionHeaders {
    pub language: Language,
    #[serde(default)]
    pub summary: Vec<String>,
    #[serde(default)]
    pub conclusion: Vec<String>,
    #[serde(default)]
    pub action_items: Vec<String>,
}

/// Header terms and noise prefixes the parser recognizes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserVocabulary {
    /// Lines starting with one of these are dropped wherever they appear
    pub noise_prefixes: Vec<String>,

    /// Highest `N.` accepted as a list ordinal
    pub max_ordinal: u32,

    pub headers: Vec<SectionHeaders>,
}

impl Default for ParserVocabulary {
    fn default() -> Self {
        Self {
            noise_prefixes: strings(&["=== Model", "You are", "Please", "IMPORTANT"]),
            max_ordinal: 5,
            headers: vec![
                SectionHeaders {
                    language: Language::English,
                    summary: strings(&["summary:"]),
                    conclusion: strings(&["conclusion:"]),
                    action_items: strings(&["action items:"]),
                },
                SectionHeaders {
                    language: Language::Chinese,
                    summary: strings(&["摘要要點", "摘要要点", "要點", "要点", "摘要"]),
                    conclusion: strings(&["結論", "结论", "總結", "总结"]),
                    action_items: strings(&["行動項目", "行动项目", "行動", "行动"]),
                },
            ],
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    Summary,
    Conclusion,
    ActionItems,
}

/// Turns raw model text into a [`SummaryRecord`]
#[derive(Debug, Clone, Default)]
pub struct ResponseParser {
    vocabulary: ParserVocabulary,
}

impl ResponseParser {
    pub fn new(vocabulary: ParserVocabulary) -> Self {
        Self { vocabulary }
    }

    pub fn parse(&self, raw: &str) -> SummaryRecord {
        let lines = clean_lines(raw);
        let mut record = SummaryRecord::default();

        if lines.is_empty() {
            tracing::warn!("Model output is empty, nothing to parse");
            return record;
        }

        let language = detect(raw);
        let headers = self.headers_for(language);
        tracing::debug!(
            "Parsing {} lines of model output (detected language: {})",
            lines.len(),
            language
        );

        let mut section = Section::None;

        for line in lines.iter().map(String::as_str) {
            if self.is_noise(line) {
                continue;
            }

            if let Some(next) = self.match_header(line, &headers) {
                section = next;
                continue;
            }

            match section {
                Section::None => {}
                Section::Summary => {
                    if let Some(item) = self.list_item(line) {
                        record.summary.push(item);
                    }
                }
                Section::ActionItems => {
                    if let Some(item) = self.list_item(line) {
                        record.action_items.push(item);
                    }
                }
                Section::Conclusion => {
                    if record.conclusion.is_empty() {
                        let text = self.strip_list_marker(line).unwrap_or(line).trim();
                        if !text.is_empty() {
                            record.conclusion = text.to_string();
                        }
                    }
                }
            }
        }

        if record.conclusion.is_empty() {
            if let Some(last) = record.summary.last() {
                record.conclusion = last.clone();
            }
        }

        if record.is_empty() {
            tracing::warn!("No recognizable summary sections in model output");
        } else {
            tracing::debug!(
                "Parsed {} summary points, {} action items",
                record.summary.len(),
                record.action_items.len()
            );
        }

        record
    }

    /// Header sets with the detected language first
    fn headers_for(&self, language: Language) -> Vec<&SectionHeaders> {
        let (mut ordered, rest): (Vec<_>, Vec<_>) = self
            .vocabulary
            .headers
            .iter()
            .partition(|h| h.language == language);
        ordered.extend(rest);
        ordered
    }

    fn is_noise(&self, line: &str) -> bool {
        self.vocabulary
            .noise_prefixes
            .iter()
            .any(|prefix| !prefix.is_empty() && line.starts_with(prefix.as_str()))
    }

    fn match_header(&self, line: &str, headers: &[&SectionHeaders]) -> Option<Section> {
        let unlisted = self.strip_list_marker(line).unwrap_or(line);
        let normalized = unlisted
            .trim()
            .trim_start_matches(|c: char| c == '#' || c == '*' || c.is_whitespace())
            .to_lowercase();
        if normalized.is_empty() {
            return None;
        }
        let bare = normalized
            .trim_end_matches(|c: char| matches!(c, ':' | '：' | '*' | '#') || c.is_whitespace());

        for set in headers {
            for (section, terms) in [
                (Section::Summary, &set.summary),
                (Section::Conclusion, &set.conclusion),
                (Section::ActionItems, &set.action_items),
            ] {
                let hit = terms.iter().any(|term| {
                    let term = term.to_lowercase();
                    let term_bare = term.trim_end_matches([':', '：']);
                    (!term.is_empty() && normalized.starts_with(&term))
                        || (!term_bare.is_empty() && bare == term_bare)
                });
                if hit {
                    return Some(section);
                }
            }
        }

        None
    }

    /// Content of a bullet or numbered line, `None` for anything else
    fn list_item(&self, line: &str) -> Option<String> {
        let item = self.strip_list_marker(line)?.trim();
        if item.is_empty() {
            None
        } else {
            Some(item.to_string())
        }
    }

    /// Remainder of `line` after a leading bullet or `N.` ordinal
    fn strip_list_marker<'a>(&self, line: &'a str) -> Option<&'a str> {
        if line.starts_with(BULLETS) {
            return Some(
                line.trim_start_matches(|c: char| BULLETS.contains(&c) || c.is_whitespace()),
            );
        }

        let digits_end = line
            .char_indices()
            .find(|(_, c)| !c.is_ascii_digit())
            .map(|(i, _)| i)
            .unwrap_or(line.len());
        if digits_end == 0 {
            return None;
        }

        let rest = line[digits_end..].strip_prefix('.')?;
        // "3.14" is a number, not an ordinal
        if rest.starts_with(|c: char| c.is_ascii_digit()) {
            return None;
        }

        let ordinal: u32 = line[..digits_end].parse().ok()?;
        if (1..=self.vocabulary.max_ordinal).contains(&ordinal) {
            Some(rest)
        } else {
            None
        }
    }
}

/// Trimmed, non-empty lines with chat delimiters removed
fn clean_lines(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        // A role line such as "<|im_start|>assistant" carries no content.
        .filter(|line| !line.starts_with(IM_START))
        .map(|line| {
            let mut line = line.to_string();
            for token in CHAT_DELIMITERS {
                line = line.replace(token, "");
            }
            line.trim().to_string()
        })
        .filter(|line| !line.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> SummaryRecord {
        ResponseParser::default().parse(raw)
    }

    #[test]
    fn empty_output_gives_empty_record() {
        let record = parse("");
        assert!(record.summary.is_empty());
        assert_eq!(record.conclusion, "");
        assert!(record.action_items.is_empty());
    }

    #[test]
    fn parses_chinese_sections() {
        let raw = "摘要要點：\n1. 討論 DeepSeek R1 模型\n2. 主持人介紹討論主題\n\n結論：\n這是一個關於最新 AI 模型的討論。\n\n行動項目：\n1. 深入了解 DeepSeek R1 的功能\n2. 評估模型應用可能性";

        let record = parse(raw);

        assert_eq!(record.summary, vec!["討論 DeepSeek R1 模型", "主持人介紹討論主題"]);
        assert_eq!(record.conclusion, "這是一個關於最新 AI 模型的討論。");
        assert_eq!(
            record.action_items,
            vec!["深入了解 DeepSeek R1 的功能", "評估模型應用可能性"]
        );
    }

    #[test]
    fn missing_conclusion_falls_back_to_last_point() {
        let record = parse("摘要要點：\n1. 討論 DeepSeek R1 模型");

        assert_eq!(record.summary, vec!["討論 DeepSeek R1 模型"]);
        assert_eq!(record.conclusion, "討論 DeepSeek R1 模型");
        assert!(record.action_items.is_empty());
    }

    #[test]
    fn english_output_with_banner_and_chinese_preamble() {
        let raw = "=== Model Output ===\n\
重要的是，你是一個來自台灣聯發科的人工智慧助理。我可以用繁體中文回答問題。\n\
\n\
Summary:\n\
1. DeepSeek's recent developments have sparked widespread discussion regarding privacy.\n\
2. The situation has led to increased appreciation for open-source software.\n\
3. The debate explores how open-source technologies can better protect user rights.";

        let record = parse(raw);

        assert_eq!(record.summary.len(), 3);
        assert!(record.summary[0].starts_with("DeepSeek's recent developments"));
        assert_eq!(record.conclusion, record.summary[2]);
        assert!(record.action_items.is_empty());
    }

    #[test]
    fn noise_lines_are_dropped_inside_sections() {
        let raw = "Summary:\n\
- Budget approved\n\
Please note that this is a summary.\n\
IMPORTANT: do not share\n\
- Hiring paused\n\
Conclusion:\n\
You are a helpful assistant.\n\
The quarter looks stable.";

        let record = parse(raw);

        assert_eq!(record.summary, vec!["Budget approved", "Hiring paused"]);
        assert_eq!(record.conclusion, "The quarter looks stable.");
    }

    #[test]
    fn unmarked_lines_are_ignored_in_list_sections() {
        let raw = "Summary:\nThe model rambles here.\n* Real point\nAction Items:\nsomething vague\n• Follow up with legal";

        let record = parse(raw);

        assert_eq!(record.summary, vec!["Real point"]);
        assert_eq!(record.action_items, vec!["Follow up with legal"]);
    }

    #[test]
    fn only_first_conclusion_line_is_kept() {
        let record = parse("Conclusion:\nFirst line.\nSecond line.");
        assert_eq!(record.conclusion, "First line.");
    }

    #[test]
    fn chat_delimiters_never_reach_the_record() {
        let raw = "<|im_start|>assistant\nSummary:\n1. Point one<|im_end|>\nConclusion:\n<|im_end|>\nWrapped up.<|im_end|>";

        let record = parse(raw);

        assert_eq!(record.summary, vec!["Point one"]);
        assert_eq!(record.conclusion, "Wrapped up.");
    }

    #[test]
    fn headers_tolerate_markdown_and_numbering() {
        let raw = "## Summary\n1. Alpha\n**Conclusion:**\nBeta\n3. 行動項目：\n- Gamma";

        let record = parse(raw);

        assert_eq!(record.summary, vec!["Alpha"]);
        assert_eq!(record.conclusion, "Beta");
        assert_eq!(record.action_items, vec!["Gamma"]);
    }

    #[test]
    fn ordinals_beyond_the_limit_are_not_list_items() {
        let raw = "Summary:\n1. one\n5. five\n6. six\n3.14 is not an ordinal";

        let record = parse(raw);
        assert_eq!(record.summary, vec!["one", "five"]);

        let vocabulary = ParserVocabulary {
            max_ordinal: 9,
            ..ParserVocabulary::default()
        };
        let record = ResponseParser::new(vocabulary).parse(raw);
        assert_eq!(record.summary, vec!["one", "five", "six"]);
    }

    #[test]
    fn bare_markers_are_skipped() {
        let raw = "摘要要點：\n1. 重點一\n2.\n-\n結論：\n3.\n最後的結論";

        let record = parse(raw);

        assert_eq!(record.summary, vec!["重點一"]);
        assert_eq!(record.conclusion, "最後的結論");
    }

    #[test]
    fn synthetic_vocabulary_drives_the_same_algorithm() {
        let vocabulary = ParserVocabulary {
            noise_prefixes: vec!["##".to_string()],
            max_ordinal: 3,
            headers: vec![SectionHeaders {
                language: Language::English,
                summary: vec!["tl;dr".to_string()],
                conclusion: vec!["bottom line".to_string()],
                action_items: vec!["todo".to_string()],
            }],
        };
        let raw = "## banner\nTL;DR\n- shipped\nBottom line\nall good\nTODO\n1. celebrate\nSummary:\n- not a header here";

        let record = ResponseParser::new(vocabulary).parse(raw);

        assert_eq!(record.summary, vec!["shipped"]);
        assert_eq!(record.conclusion, "all good");
        assert_eq!(record.action_items, vec!["celebrate", "not a header here"]);
    }

    #[test]
    fn vocabulary_deserializes_with_defaults() {
        let vocabulary: ParserVocabulary = toml::from_str(
            r#"
            max_ordinal = 7

            [[headers]]
            language = "en"
            summary = ["overview:"]
            "#,
        )
        .expect("valid vocabulary");

        assert_eq!(vocabulary.max_ordinal, 7);
        assert_eq!(vocabulary.headers.len(), 1);
        assert!(vocabulary.headers[0].conclusion.is_empty());
        assert_eq!(vocabulary.noise_prefixes, ParserVocabulary::default().noise_prefixes);
    }
}
