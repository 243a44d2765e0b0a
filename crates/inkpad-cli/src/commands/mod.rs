pub mod assist;
pub mod common;
pub mod completions;
pub mod export;
pub mod history;
pub mod notes;
pub mod secure;
pub mod share;
pub mod shell;

use inkpad_core::{AutoConfirm, Confirm, SyncController};

use crate::cli::NoteCommand;
use crate::commands::common::TerminalConfirm;
use crate::error::CliError;

/// Where a command was typed, which decides how missing input is gathered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Interaction {
    /// One-shot invocation: prompts, piped stdin and `$EDITOR` are available.
    Terminal,
    /// Interactive shell: stdin belongs to the shell, so nothing is prompted.
    Shell,
}

impl Interaction {
    /// Confirmation for a destructive command. `--yes` always confirms; in
    /// the shell anything else declines.
    pub fn confirm(self, yes: bool) -> &'static dyn Confirm {
        const YES: AutoConfirm = AutoConfirm(true);
        const NO: AutoConfirm = AutoConfirm(false);
        match (yes, self) {
            (true, _) => &YES,
            (false, Self::Terminal) => &TerminalConfirm,
            (false, Self::Shell) => &NO,
        }
    }
}

pub async fn execute(
    controller: &mut SyncController,
    command: NoteCommand,
    interaction: Interaction,
) -> Result<(), CliError> {
    match command {
        NoteCommand::New { title, content } => {
            notes::run_new(controller, title, &content, interaction).await?;
        }
        NoteCommand::List { search, json } => {
            notes::run_list(controller, search.as_deref().unwrap_or(""), json)?;
        }
        NoteCommand::Show { id } => notes::run_show(controller, &id)?,
        NoteCommand::Edit { id, title, content } => {
            notes::run_edit(controller, &id, title, &content, interaction).await?;
        }
        NoteCommand::Pin { id } => notes::run_pin(controller, &id).await?,
        NoteCommand::Delete { id, yes } => {
            notes::run_delete(controller, &id, interaction.confirm(yes)).await?;
        }
        NoteCommand::Encrypt { id, password } => {
            secure::run_encrypt(controller, &id, &password).await?;
        }
        NoteCommand::Decrypt { id, password } => {
            secure::run_decrypt(controller, &id, &password).await?;
        }
        NoteCommand::History { id } => history::run_history(controller, &id)?,
        NoteCommand::Restore { id, index, yes } => {
            history::run_restore(controller, &id, index, interaction.confirm(yes)).await?;
        }
        NoteCommand::Tag { id } => assist::run_tag(controller, &id).await?,
        NoteCommand::Summarize { id } => assist::run_summarize(controller, &id).await?,
        NoteCommand::Glossary { id } => assist::run_glossary(controller, &id).await?,
        NoteCommand::Grammar { id } => assist::run_grammar(controller, &id).await?,
        NoteCommand::Translate { id, lang } => {
            assist::run_translate(controller, &id, &lang).await?;
        }
        NoteCommand::Insights { id } => assist::run_insights(controller, &id).await?,
        NoteCommand::Share { id } => share::run_share(controller, &id).await?,
        NoteCommand::Export { format, output } => {
            export::run_export(controller, format, output.as_deref())?;
        }
    }

    Ok(())
}
