use std::path::PathBuf;
use std::rc::Rc;

use clap::Parser;
use inkpad_core::assist::{Glossary, GlossaryTerm, GrammarIssue};
use inkpad_core::backend::BackendSelector;
use inkpad_core::db::{LocalStore, SqliteNoteStore};
use inkpad_core::{
    AutoConfirm, BackendKind, Confirm, EngineConfig, ManualClock, Note, NoteId, NotePatch,
    SyncController, Version,
};
use pretty_assertions::assert_eq;

use crate::cli::{
    Cli, Commands, CompletionShell, ExportFormat, NoteCommand, ShellCommand, ShellLine,
};
use crate::commands::assist::{format_glossary_lines, format_grammar_lines};
use crate::commands::common::{
    default_editor, format_relative_time, format_timestamp, is_affirmative, normalize_content,
    normalize_note_identifier, note_preview, open_local_controller, open_store, resolve_db_path,
    resolve_note_id,
};
use crate::commands::completions::render_completions;
use crate::commands::export::run_export;
use crate::commands::history::format_version_lines;
use crate::commands::notes::{run_delete, run_edit, run_new};
use crate::commands::shell::{Flow, ShellSession};
use crate::commands::Interaction;
use crate::error::CliError;

fn note(id: &str, title: &str, content: &str, updated_at: i64) -> Note {
    NotePatch::default()
        .with_title(title)
        .with_content(content)
        .into_note(NoteId::from_backend(id), updated_at)
}

fn controller_with(notes: &[Note]) -> SyncController {
    let store = Rc::new(SqliteNoteStore::in_memory().unwrap());
    store.save(notes);
    let mut controller = SyncController::new(
        BackendSelector::local_only(store),
        Rc::new(ManualClock::new(1_000)),
        EngineConfig::default(),
    );
    controller.start();
    controller
}

#[test]
fn normalize_content_trims_and_rejects_empty() {
    assert_eq!(normalize_content("  hello  "), Some("hello".to_string()));
    assert_eq!(normalize_content(" \n\t "), None);
    assert_eq!(
        normalize_content("line 1\nline 2\n"),
        Some("line 1\nline 2".to_string())
    );
}

#[test]
fn normalize_note_identifier_rejects_empty() {
    assert!(matches!(
        normalize_note_identifier("   "),
        Err(CliError::EmptyNoteId)
    ));
    assert_eq!(normalize_note_identifier(" abc ").unwrap(), "abc");
}

#[test]
fn default_editor_is_defined() {
    assert!(!default_editor().is_empty());
}

#[test]
fn affirmative_answers() {
    assert!(is_affirmative("y\n"));
    assert!(is_affirmative(" YES "));
    assert!(!is_affirmative("\n"));
    assert!(!is_affirmative("nope"));
}

#[test]
fn format_relative_time_units() {
    let now = 10_000_000;
    assert_eq!(format_relative_time(now - 30_000, now), "just now");
    assert_eq!(format_relative_time(now - 120_000, now), "2m ago");
    assert_eq!(format_relative_time(now - 2 * 60 * 60_000, now), "2h ago");
}

#[test]
fn format_timestamp_returns_utc_label() {
    assert_eq!(format_timestamp(0), "1970-01-01 00:00:00 UTC");
}

#[test]
fn note_preview_joins_title_and_first_line() {
    let plain = note("n1", "Groceries", "<p>milk and eggs</p>\n<p>bread</p>", 0);
    assert_eq!(note_preview(&plain, 80), "Groceries: milk and eggs");

    let long = note("n2", "Title", "This is a very long sentence that should be shortened", 0);
    assert_eq!(note_preview(&long, 20), "Title: This is a ...");

    let mut sealed = note("n3", "Secret", "", 0);
    sealed.encrypted = true;
    sealed.encrypted_content = Some("blob".to_string());
    assert_eq!(note_preview(&sealed, 80), "Secret");
}

#[test]
fn resolve_db_path_prefers_flag_then_config() {
    let flag = PathBuf::from("/tmp/flag.db");
    let configured = PathBuf::from("/tmp/configured.db");
    assert_eq!(
        resolve_db_path(Some(flag.clone()), Some(configured)).unwrap(),
        flag
    );
}

#[test]
fn resolve_note_id_supports_exact_and_prefix() {
    let controller = controller_with(&[
        note("abc-1", "One", "", 1),
        note("abc-12", "Two", "", 2),
        note("xyz-9", "Three", "", 3),
    ]);

    assert_eq!(
        resolve_note_id(&controller, "abc-1").unwrap(),
        NoteId::from_backend("abc-1")
    );
    assert_eq!(
        resolve_note_id(&controller, "xy").unwrap(),
        NoteId::from_backend("xyz-9")
    );
    assert!(matches!(
        resolve_note_id(&controller, "abc"),
        Err(CliError::AmbiguousNoteId(_))
    ));
    assert!(matches!(
        resolve_note_id(&controller, "missing"),
        Err(CliError::NoteNotFound(_))
    ));
}

#[test]
fn shell_confirmation_requires_yes() {
    assert!(Interaction::Shell.confirm(true).confirm("sure?"));
    assert!(!Interaction::Shell.confirm(false).confirm("sure?"));
    assert!(Interaction::Terminal.confirm(true).confirm("sure?"));
}

#[test]
fn version_lines_are_indexed_plain_text() {
    let versions = vec![
        Version {
            content: "<p>first draft</p>".to_string(),
            timestamp: 0,
        },
        Version {
            content: "x".repeat(70),
            timestamp: 60_000,
        },
    ];

    let lines = format_version_lines(&versions);
    assert_eq!(lines[0], "  0  1970-01-01 00:00:00 UTC  first draft");
    assert!(lines[1].starts_with("  1  1970-01-01 00:01:00 UTC  xxx"));
    assert!(lines[1].ends_with("..."));
}

#[test]
fn glossary_and_grammar_lines() {
    let glossary = Glossary {
        terms: vec![GlossaryTerm {
            term: "Raft".to_string(),
            definition: "A consensus protocol.".to_string(),
        }],
        truncated: true,
        approximate: false,
    };
    let lines = format_glossary_lines(&glossary);
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[1], "Raft: A consensus protocol.");

    assert_eq!(format_grammar_lines(&[]), vec!["No issues found.".to_string()]);
    assert_eq!(
        format_grammar_lines(&[GrammarIssue {
            error: "teh".to_string(),
            suggestion: "the".to_string(),
        }]),
        vec!["teh -> the".to_string()]
    );
}

#[test]
fn cli_parses_note_commands() {
    let cli = Cli::try_parse_from([
        "inkpad", "--db-path", "/tmp/x.db", "new", "--title", "Plan", "buy", "milk",
    ])
    .unwrap();
    assert_eq!(cli.db_path, Some(PathBuf::from("/tmp/x.db")));
    assert!(matches!(
        cli.command,
        Commands::Note(NoteCommand::New { title: Some(ref title), ref content })
            if title == "Plan" && content == &["buy".to_string(), "milk".to_string()]
    ));

    let cli = Cli::try_parse_from(["inkpad", "export", "--format", "text", "-o", "out.txt"]).unwrap();
    assert!(matches!(
        cli.command,
        Commands::Note(NoteCommand::Export {
            format: ExportFormat::Text,
            output: Some(_)
        })
    ));

    let cli = Cli::try_parse_from(["inkpad", "shell", "--memory-remote"]).unwrap();
    assert!(matches!(cli.command, Commands::Shell { memory_remote: true }));
}

#[test]
fn shell_lines_parse_without_binary_name() {
    let line = ShellLine::try_parse_from(["delete", "abc", "--yes"]).unwrap();
    assert_eq!(
        line.command,
        ShellCommand::Note(NoteCommand::Delete {
            id: "abc".to_string(),
            yes: true,
        })
    );
    assert_eq!(
        ShellLine::try_parse_from(["exit"]).unwrap().command,
        ShellCommand::Quit
    );
    assert!(ShellLine::try_parse_from(["completions", "bash"]).is_err());
}

#[test]
fn completions_mention_binary_name() {
    let script = String::from_utf8(render_completions(CompletionShell::Bash)).unwrap();
    assert!(script.contains("inkpad"));
}

#[tokio::test(flavor = "current_thread")]
async fn one_shot_commands_persist_across_controllers() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("notes.db");

    let id = {
        let mut controller = open_local_controller(&db_path, EngineConfig::default()).unwrap();
        let id = run_new(
            &mut controller,
            Some("Plan".to_string()),
            &["first".to_string()],
            Interaction::Shell,
        )
        .await
        .unwrap();
        assert!(!controller.flush_snapshot().await.unwrap());
        controller.shutdown();
        id
    };

    let mut controller = open_local_controller(&db_path, EngineConfig::default()).unwrap();
    assert_eq!(controller.note(&id).unwrap().title, "Plan");
    run_edit(
        &mut controller,
        id.as_str(),
        None,
        &["second".to_string()],
        Interaction::Shell,
    )
    .await
    .unwrap();
    assert!(controller.flush_snapshot().await.unwrap());
    controller.shutdown();

    let stored = open_store(&db_path).unwrap().load();
    let note = stored.iter().find(|note| note.id == id).unwrap();
    assert_eq!(note.content, "second");
    assert_eq!(note.versions.len(), 1);
    assert_eq!(note.versions[0].content, "first");
}

#[tokio::test(flavor = "current_thread")]
async fn shell_edit_without_content_is_rejected() {
    let mut controller = controller_with(&[note("n1", "One", "body", 1)]);
    let result = run_edit(&mut controller, "n1", None, &[], Interaction::Shell).await;
    assert!(matches!(result, Err(CliError::EmptyContent)));
}

#[tokio::test(flavor = "current_thread")]
async fn editing_encrypted_content_is_rejected() {
    let mut sealed = note("n1", "Secret", "", 1);
    sealed.encrypted = true;
    sealed.encrypted_content = Some("blob".to_string());
    let mut controller = controller_with(&[sealed]);

    let result = run_edit(
        &mut controller,
        "n1",
        None,
        &["plain".to_string()],
        Interaction::Shell,
    )
    .await;
    assert!(matches!(result, Err(CliError::EncryptedNote)));

    run_edit(
        &mut controller,
        "n1",
        Some("Renamed".to_string()),
        &[],
        Interaction::Shell,
    )
    .await
    .unwrap();
    assert_eq!(
        controller.note(&NoteId::from_backend("n1")).unwrap().title,
        "Renamed"
    );
}

#[tokio::test(flavor = "current_thread")]
async fn delete_respects_confirmation() {
    let mut controller = controller_with(&[note("n1", "One", "", 1)]);

    run_delete(&mut controller, "n1", &AutoConfirm(false))
        .await
        .unwrap();
    assert_eq!(controller.notes().len(), 1);

    run_delete(&mut controller, "n1", Interaction::Shell.confirm(true))
        .await
        .unwrap();
    assert!(controller.notes().is_empty());
}

#[tokio::test(flavor = "current_thread")]
async fn export_writes_selected_format() {
    let dir = tempfile::tempdir().unwrap();
    let controller = controller_with(&[note("n1", "Groceries", "<p>milk</p>", 1)]);

    let json_path = dir.path().join("notes.json");
    run_export(&controller, ExportFormat::Json, Some(&json_path)).unwrap();
    let json = std::fs::read_to_string(&json_path).unwrap();
    assert!(json.contains("\"title\": \"Groceries\""));

    let text_path = dir.path().join("notes.txt");
    run_export(&controller, ExportFormat::Text, Some(&text_path)).unwrap();
    assert_eq!(
        std::fs::read_to_string(&text_path).unwrap(),
        "Groceries\n\nmilk"
    );
}

#[tokio::test(flavor = "current_thread")]
async fn shell_session_fires_snapshot_on_tick() {
    let clock = ManualClock::new(1_000);
    let store = Rc::new(SqliteNoteStore::in_memory().unwrap());
    let mut session =
        ShellSession::start(store, false, Rc::new(clock.clone()), EngineConfig::default());

    session.handle_line("new --title Plan base").await.unwrap();
    let id = session.controller().notes()[0].id.clone();
    clock.advance(3_000);
    session.tick().await.unwrap();
    assert!(session.controller().note(&id).unwrap().versions.is_empty());

    session
        .handle_line(&format!("edit {id} base two"))
        .await
        .unwrap();
    assert!(session.status_line().contains("snapshot: due in 3000ms"));

    clock.advance(3_000);
    session.tick().await.unwrap();
    let versions = &session.controller().note(&id).unwrap().versions;
    assert_eq!(versions.len(), 1);
    assert_eq!(versions[0].content, "base");
    assert!(session.status_line().contains("snapshot: idle"));
}

#[tokio::test(flavor = "current_thread")]
async fn shell_memory_remote_fails_over_to_local() {
    let store = Rc::new(SqliteNoteStore::in_memory().unwrap());
    let mut session = ShellSession::start(
        store.clone(),
        true,
        Rc::new(ManualClock::new(1_000)),
        EngineConfig::default(),
    );
    assert_eq!(session.controller().backend_kind(), BackendKind::Remote);
    assert!(session.controller().has_live_subscription());

    session.handle_line("new --title Plan draft").await.unwrap();
    let id = session.controller().notes()[0].id.clone();
    assert_eq!(session.remote().unwrap().notes().len(), 1);

    session.handle_line("remote deny").await.unwrap();
    session
        .handle_line(&format!("edit {id} changed"))
        .await
        .unwrap();

    assert_eq!(session.controller().backend_kind(), BackendKind::Local);
    assert!(session.status_line().starts_with("backend: local"));
    let stored = store.load();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].content, "changed");
}

#[tokio::test(flavor = "current_thread")]
async fn shell_control_lines() {
    let store = Rc::new(SqliteNoteStore::in_memory().unwrap());
    let mut session =
        ShellSession::start(store, false, Rc::new(ManualClock::new(0)), EngineConfig::default());

    assert_eq!(session.handle_line("   ").await.unwrap(), Flow::Continue);
    assert_eq!(session.handle_line("frobnicate").await.unwrap(), Flow::Continue);
    assert!(matches!(
        session.handle_line("remote deny").await,
        Err(CliError::NoMemoryRemote)
    ));
    assert_eq!(session.handle_line("quit").await.unwrap(), Flow::Quit);
}
