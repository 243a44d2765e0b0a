use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "inkpad")]
#[command(about = "Notes that stay consistent across a live remote store and local storage")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional path to local database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(flatten)]
    Note(NoteCommand),
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Start an interactive session with live sync and debounced history
    Shell {
        /// Use an in-process remote store seeded from the local database
        #[arg(long)]
        memory_remote: bool,
    },
}

/// Commands that operate on the note collection, shared by one-shot
/// invocations and the interactive shell.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum NoteCommand {
    /// Create a new note
    #[command(alias = "add")]
    New {
        /// Note title
        #[arg(long)]
        title: Option<String>,
        /// Note content
        content: Vec<String>,
    },
    /// List notes, pinned first
    List {
        /// Only show notes whose title or text contains this query
        #[arg(short, long)]
        search: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one note
    Show {
        /// Note ID or unique ID prefix
        id: String,
    },
    /// Edit an existing note
    Edit {
        /// Note ID or unique ID prefix
        id: String,
        /// New title
        #[arg(long)]
        title: Option<String>,
        /// New content (opens $EDITOR when omitted)
        content: Vec<String>,
    },
    /// Toggle the pinned flag
    Pin {
        /// Note ID or unique ID prefix
        id: String,
    },
    /// Delete a note
    Delete {
        /// Note ID or unique ID prefix
        id: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Lock a note behind a password
    Encrypt {
        /// Note ID or unique ID prefix
        id: String,
        #[arg(long)]
        password: String,
    },
    /// Unlock an encrypted note
    Decrypt {
        /// Note ID or unique ID prefix
        id: String,
        #[arg(long)]
        password: String,
    },
    /// List saved versions of a note
    History {
        /// Note ID or unique ID prefix
        id: String,
    },
    /// Restore a saved version
    Restore {
        /// Note ID or unique ID prefix
        id: String,
        /// Version index as shown by `history`
        index: usize,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Suggest tags and apply them
    Tag {
        /// Note ID or unique ID prefix
        id: String,
    },
    /// Summarize a note
    Summarize {
        /// Note ID or unique ID prefix
        id: String,
    },
    /// Extract key terms with definitions
    Glossary {
        /// Note ID or unique ID prefix
        id: String,
    },
    /// Check grammar and spelling
    Grammar {
        /// Note ID or unique ID prefix
        id: String,
    },
    /// Translate a note
    Translate {
        /// Note ID or unique ID prefix
        id: String,
        /// Target language code or name (en, hi, es, fr, de, ja, zh)
        #[arg(short, long)]
        lang: String,
    },
    /// Surface insights and follow-up questions
    Insights {
        /// Note ID or unique ID prefix
        id: String,
    },
    /// Share a note and print its link
    Share {
        /// Note ID or unique ID prefix
        id: String,
    },
    /// Export notes
    Export {
        /// Export format
        #[arg(long, value_enum, default_value_t = ExportFormat::Json)]
        format: ExportFormat,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

/// One line typed into the interactive shell.
#[derive(Parser)]
#[command(name = "inkpad", no_binary_name = true, disable_version_flag = true)]
pub struct ShellLine {
    #[command(subcommand)]
    pub command: ShellCommand,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    #[command(flatten)]
    Note(NoteCommand),
    /// Make a note the open note
    Open {
        /// Note ID or unique ID prefix
        id: String,
    },
    /// Close the open note
    Close,
    /// Show backend, subscription and timer state
    Status,
    /// Simulate the remote store (requires --memory-remote)
    Remote {
        #[command(subcommand)]
        action: RemoteAction,
    },
    /// Leave the shell
    #[command(alias = "exit")]
    Quit,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum RemoteAction {
    /// Overwrite a note's content as another device would
    Push {
        /// Note ID or unique ID prefix
        id: String,
        /// New content
        content: Vec<String>,
    },
    /// Delete a note as another device would
    Remove {
        /// Note ID or unique ID prefix
        id: String,
    },
    /// Fail every following remote call with a permission error
    Deny,
    /// Fail the live subscription
    Break,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum ExportFormat {
    Json,
    Markdown,
    Text,
}

impl From<ExportFormat> for inkpad_core::export::ExportFormat {
    fn from(format: ExportFormat) -> Self {
        match format {
            ExportFormat::Json => Self::Json,
            ExportFormat::Markdown => Self::Markdown,
            ExportFormat::Text => Self::Text,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}
