//! Interactive session.
//!
//! Unlike one-shot commands the shell keeps a single controller alive, so
//! the snapshot timer and the live subscription run between commands. The
//! loop waits on stdin, subscription events and the next snapshot deadline.

use std::io::{self, Write};
use std::path::Path;
use std::rc::Rc;
use std::time::Duration;

use clap::Parser;
use inkpad_core::db::LocalStore;
use inkpad_core::remote::{MemoryRemote, RemoteCollection, RemoteError, RemoteResult};
use inkpad_core::{Clock, EngineConfig, SyncController, SystemClock};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::cli::{RemoteAction, ShellCommand, ShellLine};
use crate::commands::common::{open_store, resolve_note_id, short_id};
use crate::commands::{execute, Interaction};
use crate::error::CliError;

/// Whether the loop keeps reading after a line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct ShellSession {
    controller: SyncController,
    remote: Option<MemoryRemote>,
    clock: Rc<dyn Clock>,
}

impl ShellSession {
    /// Start a session over `local`, optionally fronted by an in-process
    /// remote seeded with the locally stored notes.
    pub fn start(
        local: Rc<dyn LocalStore>,
        memory_remote: bool,
        clock: Rc<dyn Clock>,
        config: EngineConfig,
    ) -> Self {
        let remote = memory_remote.then(|| MemoryRemote::new().with_notes(local.load()));
        let collection: RemoteResult<Rc<dyn RemoteCollection>> = match &remote {
            Some(remote) => Ok(Rc::new(remote.clone())),
            None => Err(RemoteError::unavailable("no remote store configured")),
        };

        let mut controller = SyncController::probe(local, collection, Rc::clone(&clock), config);
        controller.start();
        Self {
            controller,
            remote,
            clock,
        }
    }

    pub const fn controller(&self) -> &SyncController {
        &self.controller
    }

    pub const fn remote(&self) -> Option<&MemoryRemote> {
        self.remote.as_ref()
    }

    /// Parse and run one line of input.
    pub async fn handle_line(&mut self, line: &str) -> Result<Flow, CliError> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.is_empty() {
            return Ok(Flow::Continue);
        }

        let parsed = match ShellLine::try_parse_from(tokens) {
            Ok(parsed) => parsed,
            Err(error) => {
                let _ = error.print();
                return Ok(Flow::Continue);
            }
        };
        self.run(parsed.command).await
    }

    pub async fn run(&mut self, command: ShellCommand) -> Result<Flow, CliError> {
        match command {
            ShellCommand::Note(command) => {
                execute(&mut self.controller, command, Interaction::Shell).await?;
            }
            ShellCommand::Open { id } => {
                let id = resolve_note_id(&self.controller, &id)?;
                let note = self.controller.open_note(&id)?;
                println!("Opened {} ({})", short_id(&id), note.title);
            }
            ShellCommand::Close => self.controller.close_note(),
            ShellCommand::Status => println!("{}", self.status_line()),
            ShellCommand::Remote { action } => self.simulate_remote(action)?,
            ShellCommand::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    /// Backend, subscription, open note and timer state on one line.
    pub fn status_line(&self) -> String {
        let controller = &self.controller;
        let subscription = if controller.has_live_subscription() {
            "live"
        } else {
            "none"
        };
        let open = controller
            .current_id()
            .map_or_else(|| "none".to_string(), short_id);
        let snapshot = controller.next_wakeup().map_or_else(
            || "idle".to_string(),
            |deadline| {
                let remaining = deadline.saturating_sub(self.clock.now_millis()).max(0);
                format!("due in {remaining}ms")
            },
        );
        format!(
            "backend: {} | subscription: {subscription} | open: {open} | snapshot: {snapshot} | notes: {}",
            controller.backend_kind(),
            controller.notes().len()
        )
    }

    fn simulate_remote(&self, action: RemoteAction) -> Result<(), CliError> {
        let remote = self.remote.as_ref().ok_or(CliError::NoMemoryRemote)?;
        match action {
            RemoteAction::Push { id, content } => {
                let id = resolve_note_id(&self.controller, &id)?;
                let mut note = remote
                    .note(&id)
                    .ok_or_else(|| CliError::NoteNotFound(id.to_string()))?;
                note.content = content.join(" ");
                note.updated_at = self.clock.now_millis().max(note.updated_at + 1);
                remote.push_external(note);
            }
            RemoteAction::Remove { id } => {
                let id = resolve_note_id(&self.controller, &id)?;
                remote.remove_external(&id);
            }
            RemoteAction::Deny => {
                remote.fail_always(RemoteError::permission_denied("access revoked from the shell"));
            }
            RemoteAction::Break => {
                remote.break_subscriptions(&RemoteError::permission_denied(
                    "subscription revoked from the shell",
                ));
            }
        }
        Ok(())
    }

    /// Handle queued subscription events and a due snapshot.
    pub async fn tick(&mut self) -> Result<(), CliError> {
        self.controller.pump_events();
        self.controller.fire_due_snapshot().await?;
        Ok(())
    }
}

pub async fn run_shell(
    db_path: &Path,
    config: EngineConfig,
    memory_remote: bool,
) -> Result<(), CliError> {
    let clock: Rc<dyn Clock> = Rc::new(SystemClock);
    let mut session = ShellSession::start(
        open_store(db_path)?,
        memory_remote,
        Rc::clone(&clock),
        config,
    );
    println!(
        "inkpad shell on {} storage. Type `help` for commands, `quit` to leave.",
        session.controller.backend_kind()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    print_prompt();

    loop {
        let timer = wait_until(session.controller.next_wakeup(), clock.now_millis());

        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                match session.handle_line(&line).await {
                    Ok(Flow::Continue) => {}
                    Ok(Flow::Quit) => break,
                    Err(error) => eprintln!("Error: {error}"),
                }
                print_prompt();
            }
            Some(event) = session.controller.recv_event() => {
                session.controller.handle_event(event);
            }
            () = timer => {
                if let Err(error) = session.tick().await {
                    eprintln!("Error: {error}");
                }
            }
        }
    }

    session.controller.flush_snapshot().await?;
    session.controller.shutdown();
    Ok(())
}

/// Sleep until `deadline`, or forever when nothing is scheduled.
async fn wait_until(deadline: Option<i64>, now: i64) {
    match deadline {
        Some(deadline) => {
            let remaining = u64::try_from(deadline.saturating_sub(now)).unwrap_or(0);
            tokio::time::sleep(Duration::from_millis(remaining)).await;
        }
        None => std::future::pending::<()>().await,
    }
}

fn print_prompt() {
    print!("inkpad> ");
    let _ = io::stdout().flush();
}
