//! Text-generation assist features.
//!
//! Prompt construction and response parsing for summaries, tag suggestions,
//! glossaries, grammar checks, translation and insights. The generator is an
//! opaque collaborator: prompt in, text out. A response starting with
//! [`AI_UNAVAILABLE`] is a soft failure and is never treated as content.

mod groq;
mod parse;

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::Note;
use crate::util::truncate_chars;

pub use groq::{AssistConfig, GroqClient};
pub use parse::{
    parse_glossary, parse_grammar, parse_tags, strip_code_fences, GlossaryTerm, GrammarIssue,
    ParsedGlossary,
};

/// Prefix of every soft-failure response.
pub const AI_UNAVAILABLE: &str = "AI service unavailable";

const GLOSSARY_MAX_CHARS: usize = 12_000;

#[derive(Debug, Error)]
pub enum AssistError {
    #[error("API key not configured; set GROQ_API_KEY")]
    NotConfigured,
    #[error("Invalid assist configuration: {0}")]
    InvalidConfiguration(&'static str),
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{0}")]
    Api(String),
    /// The generator answered with a soft failure
    #[error("{0}")]
    Unavailable(String),
    #[error("note is empty")]
    EmptyNote,
    #[error("note is encrypted")]
    EncryptedNote,
    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),
    #[error("could not understand the response: {0}")]
    Parse(String),
}

/// Sampling options passed to the generator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationOptions {
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            max_tokens: 1000,
            temperature: 0.7,
        }
    }
}

/// Opaque text generator.
#[async_trait(?Send)]
pub trait TextGenerator {
    /// Generate a response; failures are reported in-band with the
    /// [`AI_UNAVAILABLE`] prefix.
    async fn generate(
        &self,
        prompt: &str,
        system_prompt: &str,
        options: GenerationOptions,
    ) -> String;
}

/// Whether `response` is a soft failure.
pub fn is_soft_failure(response: &str) -> bool {
    response.trim_start().starts_with(AI_UNAVAILABLE)
}

/// Translation target languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    English,
    Hindi,
    Spanish,
    French,
    German,
    Japanese,
    Chinese,
}

impl Language {
    pub const ALL: [Self; 7] = [
        Self::English,
        Self::Hindi,
        Self::Spanish,
        Self::French,
        Self::German,
        Self::Japanese,
        Self::Chinese,
    ];

    pub const fn code(self) -> &'static str {
        match self {
            Self::English => "en",
            Self::Hindi => "hi",
            Self::Spanish => "es",
            Self::French => "fr",
            Self::German => "de",
            Self::Japanese => "ja",
            Self::Chinese => "zh",
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::English => "English",
            Self::Hindi => "Hindi",
            Self::Spanish => "Spanish",
            Self::French => "French",
            Self::German => "German",
            Self::Japanese => "Japanese",
            Self::Chinese => "Chinese",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Language {
    type Err = AssistError;

    /// Accepts a language code (`es`) or name (`Spanish`), case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|language| {
                language.code().eq_ignore_ascii_case(wanted)
                    || language.name().eq_ignore_ascii_case(wanted)
            })
            .ok_or_else(|| AssistError::UnsupportedLanguage(wanted.to_string()))
    }
}

/// Glossary extracted from a note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Glossary {
    pub terms: Vec<GlossaryTerm>,
    /// Only the first part of a long note was analyzed
    pub truncated: bool,
    /// Terms were recovered from free text rather than JSON
    pub approximate: bool,
}

/// Assist features over one generator.
pub struct Assistant<G> {
    generator: G,
}

impl<G: TextGenerator> Assistant<G> {
    pub const fn new(generator: G) -> Self {
        Self { generator }
    }

    pub const fn generator(&self) -> &G {
        &self.generator
    }

    pub async fn summarize(&self, note: &Note) -> Result<String, AssistError> {
        let text = note_text(note)?;
        self.ask(
            &format!("Summarize this note in 1-2 concise sentences:\n\n{text}"),
            "You are a helpful assistant that creates brief, informative summaries.",
            GenerationOptions::default(),
        )
        .await
    }

    pub async fn suggest_tags(&self, note: &Note) -> Result<Vec<String>, AssistError> {
        let text = note_text(note)?;
        let response = self
            .ask(
                &format!(
                    "Suggest 3-5 relevant tags for this note. Return only the tags as a comma-separated list:\n\n{text}"
                ),
                "You are a helpful assistant that suggests relevant tags.",
                GenerationOptions::default(),
            )
            .await?;
        Ok(parse_tags(&response))
    }

    pub async fn glossary(&self, note: &Note) -> Result<Glossary, AssistError> {
        let text = note_text(note)?;
        let (excerpt, truncated) = truncate_chars(&text, GLOSSARY_MAX_CHARS);
        let notice = if truncated {
            "[Note: This is a long document. Analyzing the first portion. Key terms from the beginning are shown.]\n\n"
        } else {
            ""
        };
        let prompt = format!(
            "Analyze the following text and identify 5-8 key terms or important concepts. For each term, provide:\n\
             1. The term name\n\
             2. A brief, clear definition (1-2 sentences)\n\n\
             {notice}Text to analyze:\n\n{excerpt}\n\n\
             IMPORTANT: Return ONLY a valid JSON array in this exact format:\n\
             [\n  {{\"term\": \"Term Name\", \"definition\": \"Definition here\"}},\n  {{\"term\": \"Another Term\", \"definition\": \"Another definition\"}}\n]\n\n\
             Do not include any markdown formatting, code blocks, or explanatory text. Only return the JSON array."
        );

        let response = self
            .ask(
                &prompt,
                "You are a helpful assistant that identifies key terms. You MUST respond with ONLY a valid JSON array, no other text.",
                GenerationOptions {
                    max_tokens: 2000,
                    temperature: 0.5,
                },
            )
            .await?;
        let parsed = parse_glossary(&response)?;
        if parsed.approximate {
            tracing::debug!("Glossary recovered from free-form response");
        }
        Ok(Glossary {
            terms: parsed.terms,
            truncated,
            approximate: parsed.approximate,
        })
    }

    pub async fn grammar(&self, note: &Note) -> Result<Vec<GrammarIssue>, AssistError> {
        let text = note_text(note)?;
        let response = self
            .ask(
                &format!(
                    "Identify grammatical errors in this text. Return as JSON array with {{error, suggestion}}. If no errors, return empty array:\n\n{text}"
                ),
                "You are a grammar checking assistant. Always respond with valid JSON only.",
                GenerationOptions::default(),
            )
            .await?;
        parse_grammar(&response)
    }

    pub async fn translate(&self, note: &Note, language: Language) -> Result<String, AssistError> {
        let text = note_text(note)?;
        self.ask(
            &format!("Translate this text to {}:\n\n{text}", language.name()),
            "You are a translation assistant. Provide only the translation.",
            GenerationOptions::default(),
        )
        .await
    }

    pub async fn insights(&self, note: &Note) -> Result<String, AssistError> {
        let text = note_text(note)?;
        self.ask(
            &format!(
                "Analyze this note and provide insights: key themes, recommendations, and related topics:\n\n{text}"
            ),
            "You are an intelligent assistant that provides deep insights.",
            GenerationOptions::default(),
        )
        .await
    }

    async fn ask(
        &self,
        prompt: &str,
        system_prompt: &str,
        options: GenerationOptions,
    ) -> Result<String, AssistError> {
        let response = self.generator.generate(prompt, system_prompt, options).await;
        if is_soft_failure(&response) {
            return Err(AssistError::Unavailable(response.trim().to_string()));
        }
        let response = response.trim();
        if response.is_empty() {
            return Err(AssistError::Unavailable(format!(
                "{AI_UNAVAILABLE}: empty response"
            )));
        }
        Ok(response.to_string())
    }
}

/// Plain text the assist features work on.
fn note_text(note: &Note) -> Result<String, AssistError> {
    if note.encrypted {
        return Err(AssistError::EncryptedNote);
    }
    let text = note.text().trim().to_string();
    if text.is_empty() {
        Err(AssistError::EmptyNote)
    } else {
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NoteId, NotePatch};
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    #[derive(Default)]
    struct Scripted {
        responses: RefCell<VecDeque<String>>,
        prompts: RefCell<Vec<(String, String, GenerationOptions)>>,
    }

    impl Scripted {
        fn answering(responses: &[&str]) -> Self {
            Self {
                responses: RefCell::new(responses.iter().map(|r| (*r).to_string()).collect()),
                ..Self::default()
            }
        }
    }

    #[async_trait(?Send)]
    impl TextGenerator for Scripted {
        async fn generate(
            &self,
            prompt: &str,
            system_prompt: &str,
            options: GenerationOptions,
        ) -> String {
            self.prompts
                .borrow_mut()
                .push((prompt.to_string(), system_prompt.to_string(), options));
            self.responses.borrow_mut().pop_front().unwrap_or_default()
        }
    }

    fn note(content: &str) -> Note {
        NotePatch::default()
            .with_content(content)
            .into_note(NoteId::from_backend("n"), 0)
    }

    #[tokio::test(flavor = "current_thread")]
    async fn summary_uses_plain_text() {
        let assistant = Assistant::new(Scripted::answering(&["  Short summary. "]));
        let summary = assistant
            .summarize(&note("<p>Meeting <b>notes</b></p>"))
            .await
            .unwrap();
        assert_eq!(summary, "Short summary.");

        let prompts = assistant.generator().prompts.borrow();
        assert!(prompts[0].0.ends_with("Meeting notes"));
        assert_eq!(prompts[0].2, GenerationOptions::default());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn sentinel_response_is_soft_failure() {
        let assistant = Assistant::new(Scripted::answering(&[
            "AI service unavailable: HTTP 503",
        ]));
        let result = assistant.suggest_tags(&note("text")).await;
        match result {
            Err(AssistError::Unavailable(message)) => {
                assert_eq!(message, "AI service unavailable: HTTP 503");
            }
            other => panic!("expected soft failure, got {other:?}"),
        }
    }

    #[tokio::test(flavor = "current_thread")]
    async fn tags_are_split_from_response() {
        let assistant = Assistant::new(Scripted::answering(&["work, planning , q3"]));
        let tags = assistant.suggest_tags(&note("text")).await.unwrap();
        assert_eq!(tags, vec!["work", "planning", "q3"]);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn glossary_truncates_long_notes() {
        let long = "word ".repeat(3_000);
        let assistant = Assistant::new(Scripted::answering(&[
            r#"[{"term": "Word", "definition": "A unit of language."}]"#,
        ]));
        let glossary = assistant.glossary(&note(&long)).await.unwrap();
        assert!(glossary.truncated);
        assert!(!glossary.approximate);
        assert_eq!(glossary.terms.len(), 1);

        let prompts = assistant.generator().prompts.borrow();
        assert!(prompts[0].0.contains("[Note: This is a long document."));
        assert_eq!(
            prompts[0].2,
            GenerationOptions {
                max_tokens: 2000,
                temperature: 0.5,
            }
        );
    }

    #[tokio::test(flavor = "current_thread")]
    async fn glossary_uses_line_fallback() {
        let assistant = Assistant::new(Scripted::answering(&["Cache: Fast storage\nTTL - Expiry time"]));
        let glossary = assistant.glossary(&note("short text")).await.unwrap();
        assert!(glossary.approximate);
        assert!(!glossary.truncated);
        assert_eq!(glossary.terms[1].term, "TTL");
    }

    #[tokio::test(flavor = "current_thread")]
    async fn translate_names_target_language() {
        let assistant = Assistant::new(Scripted::answering(&["Hola"]));
        let translated = assistant
            .translate(&note("Hello"), "es".parse().unwrap())
            .await
            .unwrap();
        assert_eq!(translated, "Hola");
        assert!(assistant.generator().prompts.borrow()[0]
            .0
            .starts_with("Translate this text to Spanish:"));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn encrypted_and_empty_notes_are_rejected() {
        let assistant = Assistant::new(Scripted::default());
        assert!(matches!(
            assistant.insights(&note("  ")).await,
            Err(AssistError::EmptyNote)
        ));

        let mut sealed = note("");
        sealed.encrypted = true;
        sealed.encrypted_content = Some("blob".to_string());
        assert!(matches!(
            assistant.grammar(&sealed).await,
            Err(AssistError::EncryptedNote)
        ));
        assert!(assistant.generator().prompts.borrow().is_empty());
    }

    #[test]
    fn language_parses_codes_and_names() {
        assert_eq!("ZH".parse::<Language>().unwrap(), Language::Chinese);
        assert_eq!("german".parse::<Language>().unwrap(), Language::German);
        assert!("klingon".parse::<Language>().is_err());
    }

    #[test]
    fn soft_failure_detection() {
        assert!(is_soft_failure("AI service unavailable: no key"));
        assert!(is_soft_failure("  AI service unavailable"));
        assert!(!is_soft_failure("The AI service unavailable message"));
    }
}
