use inkpad_core::assist::{AssistConfig, Assistant, Glossary, GrammarIssue, GroqClient, Language};
use inkpad_core::{Note, NoteId, SyncController};

use crate::commands::common::{resolve_note_id, short_id};
use crate::error::CliError;

/// Assistant over the configured endpoint; fails fast when no key is set.
pub fn assistant() -> Result<Assistant<GroqClient>, CliError> {
    let config = AssistConfig::from_env()?;
    if !config.is_enabled() {
        return Err(CliError::AssistNotConfigured);
    }
    Ok(Assistant::new(GroqClient::new(config)?))
}

fn target_note(controller: &SyncController, id: &str) -> Result<(NoteId, Note), CliError> {
    let id = resolve_note_id(controller, id)?;
    let note = controller
        .note(&id)
        .cloned()
        .ok_or_else(|| CliError::NoteNotFound(id.to_string()))?;
    Ok((id, note))
}

pub async fn run_tag(controller: &mut SyncController, id: &str) -> Result<(), CliError> {
    let (id, note) = target_note(controller, id)?;
    let suggested = assistant()?.suggest_tags(&note).await?;
    let applied = controller.apply_tags(&id, suggested).await?;
    if applied.is_empty() {
        println!("No tags suggested for {}", short_id(&id));
    } else {
        println!("{}", applied.join(", "));
    }
    Ok(())
}

pub async fn run_summarize(controller: &SyncController, id: &str) -> Result<(), CliError> {
    let (_, note) = target_note(controller, id)?;
    println!("{}", assistant()?.summarize(&note).await?);
    Ok(())
}

pub async fn run_glossary(controller: &SyncController, id: &str) -> Result<(), CliError> {
    let (_, note) = target_note(controller, id)?;
    let glossary = assistant()?.glossary(&note).await?;
    for line in format_glossary_lines(&glossary) {
        println!("{line}");
    }
    Ok(())
}

pub fn format_glossary_lines(glossary: &Glossary) -> Vec<String> {
    let mut lines = Vec::with_capacity(glossary.terms.len() + 2);
    if glossary.truncated {
        lines.push("(Only the beginning of this long note was analyzed.)".to_string());
    }
    if glossary.approximate {
        lines.push("(Terms were extracted from an unstructured response.)".to_string());
    }
    lines.extend(
        glossary
            .terms
            .iter()
            .map(|term| format!("{}: {}", term.term, term.definition)),
    );
    lines
}

pub async fn run_grammar(controller: &SyncController, id: &str) -> Result<(), CliError> {
    let (_, note) = target_note(controller, id)?;
    let issues = assistant()?.grammar(&note).await?;
    for line in format_grammar_lines(&issues) {
        println!("{line}");
    }
    Ok(())
}

pub fn format_grammar_lines(issues: &[GrammarIssue]) -> Vec<String> {
    if issues.is_empty() {
        return vec!["No issues found.".to_string()];
    }
    issues
        .iter()
        .map(|issue| format!("{} -> {}", issue.error, issue.suggestion))
        .collect()
}

pub async fn run_translate(
    controller: &SyncController,
    id: &str,
    language: &str,
) -> Result<(), CliError> {
    let language = language.parse::<Language>()?;
    let (_, note) = target_note(controller, id)?;
    println!("{}", assistant()?.translate(&note, language).await?);
    Ok(())
}

pub async fn run_insights(controller: &SyncController, id: &str) -> Result<(), CliError> {
    let (_, note) = target_note(controller, id)?;
    println!("{}", assistant()?.insights(&note).await?);
    Ok(())
}
