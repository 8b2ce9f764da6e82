//! Prompt templates for transcript summaries

use crate::text::{detect, Chunk, Language};

/// ChatML section opener
pub const IM_START: &str = "<|im_start|>";
/// ChatML section terminator
pub const IM_END: &str = "<|im_end|>";

/// Delimiter tokens that must never show up in a parsed summary
pub const CHAT_DELIMITERS: [&str; 2] = [IM_START, IM_END];

const ENGLISH_SYSTEM: &str = "You are a professional assistant that writes structured summaries of meeting and talk transcripts.\n\
Use exactly this format:\n\
Summary:\n\
1. (the 3-5 most important points, one per line)\n\
Conclusion:\n\
(one sentence with the main conclusion)\n\
Action Items:\n\
1. (concrete follow-up actions, one per line)\n\
\n\
Rules:\n\
- Remain objective and neutral.\n\
- Use only information present in the transcript.\n\
- Write in English only.\n\
- Format every list as a clean numbered list.\n\
- Do not use Markdown, bold text or special tokens.";

const CHINESE_SYSTEM: &str = "你是一個專業的會議記錄摘要生成助手。你的任務是根據提供的會議記錄內容，生成結構化的摘要。\n\
請嚴格使用以下格式：\n\
摘要要點：\n\
1. （列出3-5個最重要的討論點，每行一點）\n\
結論：\n\
（用一句話總結主要結論）\n\
行動項目：\n\
1. （列出需要跟進的具體行動項目，每行一項）\n\
\n\
請確保摘要：\n\
- 保持客觀中立\n\
- 只使用會議記錄中的資訊\n\
- 只使用繁體中文\n\
- 每個清單都使用簡潔的編號格式\n\
- 不要使用 Markdown、粗體或任何特殊標記";

/// A rendered prompt ready for the model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptRequest {
    language: Language,
    body: String,
}

impl PromptRequest {
    pub fn language(&self) -> Language {
        self.language
    }

    pub fn body(&self) -> &str {
        &self.body
    }
}

/// Where a chunk sits in the document it was cut from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Segment {
    Whole,
    First,
    Middle,
    Last,
}

impl Segment {
    fn from_flags(is_first: bool, is_last: bool) -> Self {
        match (is_first, is_last) {
            (true, true) => Self::Whole,
            (true, false) => Self::First,
            (false, true) => Self::Last,
            (false, false) => Self::Middle,
        }
    }
}

/// Builds ChatML prompts in the language of the text being summarized
#[derive(Debug, Clone, Default)]
pub struct PromptBuilder;

impl PromptBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Build the prompt for one chunk, picking the template from its language.
    pub fn build_chunk(&self, chunk: &Chunk) -> PromptRequest {
        let language = detect(&chunk.text);
        self.build(&chunk.text, language, chunk.is_first, chunk.is_last)
    }

    /// Build a prompt for `text`.
    ///
    /// `is_first`/`is_last` both true means the text is the whole document;
    /// any other combination tells the model it is reading one segment.
    pub fn build(
        &self,
        text: &str,
        language: Language,
        is_first: bool,
        is_last: bool,
    ) -> PromptRequest {
        let segment = Segment::from_flags(is_first, is_last);
        let (system, user, assistant) = match language {
            Language::English => (
                ENGLISH_SYSTEM,
                english_user(text, segment),
                "Sure, here is the structured summary:",
            ),
            Language::Chinese => (
                CHINESE_SYSTEM,
                chinese_user(text, segment),
                "好的，我將根據提供的會議記錄生成結構化摘要：",
            ),
        };

        let body = format!(
            "{IM_START}system\n{system}\n{IM_END}\n\n\
{IM_START}user\n{user}\n{IM_END}\n\n\
{IM_START}assistant\n{assistant}\n\n"
        );

        PromptRequest { language, body }
    }
}

fn english_user(text: &str, segment: Segment) -> String {
    let note = match segment {
        Segment::Whole => "",
        Segment::First => "This is the first segment of a longer transcript. Summarize only this part; the rest follows separately.\n\n",
        Segment::Middle => "This is a middle segment of a longer transcript. Summarize only this part as a partial summary.\n\n",
        Segment::Last => "This is the last segment of a longer transcript. Summarize only this part and state the conclusion it reaches.\n\n",
    };
    format!("{note}Please summarize the following transcript:\n\n{text}")
}

fn chinese_user(text: &str, segment: Segment) -> String {
    let note = match segment {
        Segment::Whole => "",
        Segment::First => "這是一份較長會議記錄的第一段，請只摘要這一部分，其餘內容會另外提供。\n\n",
        Segment::Middle => "這是一份較長會議記錄的中間段落，請只針對這一部分做局部摘要。\n\n",
        Segment::Last => "這是一份較長會議記錄的最後一段，請只摘要這一部分並說明其結論。\n\n",
    };
    format!("{note}請根據以下會議記錄生成摘要：\n\n{text}")
}
