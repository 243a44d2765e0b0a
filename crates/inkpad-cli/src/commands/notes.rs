use inkpad_core::{Confirm, NoteId, NotePatch, SyncController};

use crate::commands::common::{
    capture_editor_input_with_initial, content_from_args_or_stdin, format_note_lines,
    format_timestamp, normalize_content, note_to_list_item, render_tags, resolve_note_id, short_id,
    NoteListItem,
};
use crate::commands::Interaction;
use crate::error::CliError;

pub async fn run_new(
    controller: &mut SyncController,
    title: Option<String>,
    content_parts: &[String],
    interaction: Interaction,
) -> Result<NoteId, CliError> {
    let title = title.as_deref().and_then(normalize_content);
    let content = match interaction {
        Interaction::Terminal => match content_from_args_or_stdin(content_parts)? {
            Some(content) => Some(content),
            None if title.is_none() => {
                Some(capture_editor_input_with_initial("")?.ok_or(CliError::EmptyContent)?)
            }
            None => None,
        },
        Interaction::Shell => normalize_content(&content_parts.join(" ")),
    };

    let id = controller.create_note().await?;
    let mut patch = NotePatch::default();
    if let Some(title) = title {
        patch = patch.with_title(title);
    }
    if let Some(content) = content {
        patch = patch.with_content(content);
    }
    if !patch.is_empty() {
        controller.update_note(&id, patch).await?;
    }

    println!("{id}");
    Ok(id)
}

pub fn run_list(controller: &SyncController, search: &str, as_json: bool) -> Result<(), CliError> {
    let notes = controller.visible_notes(search);

    if as_json {
        let json_items = notes
            .iter()
            .map(|&note| note_to_list_item(note))
            .collect::<Vec<NoteListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
    } else {
        for line in format_note_lines(&notes) {
            println!("{line}");
        }
    }

    Ok(())
}

pub fn run_show(controller: &SyncController, id: &str) -> Result<(), CliError> {
    let id = resolve_note_id(controller, id)?;
    let note = controller
        .note(&id)
        .ok_or_else(|| CliError::NoteNotFound(id.to_string()))?;

    println!("{}", note.title);
    println!("id:       {}", note.id);
    println!("updated:  {}", format_timestamp(note.updated_at));
    println!("versions: {}", note.versions.len());
    if note.pinned {
        println!("pinned:   yes");
    }
    let tags = render_tags(note);
    if !tags.is_empty() {
        println!("tags:     {tags}");
    }
    println!();
    if note.encrypted {
        println!("This note is encrypted. Use `inkpad decrypt {}` to read it.", short_id(&id));
    } else {
        println!("{}", note.text());
    }

    Ok(())
}

pub async fn run_edit(
    controller: &mut SyncController,
    id: &str,
    title: Option<String>,
    content_parts: &[String],
    interaction: Interaction,
) -> Result<(), CliError> {
    let id = resolve_note_id(controller, id)?;
    let note = controller.open_note(&id)?;
    let encrypted = note.encrypted;
    let current_content = note.content.clone();

    let title = title.as_deref().and_then(normalize_content);
    let mut content = normalize_content(&content_parts.join(" "));
    if content.is_none() && title.is_none() {
        if encrypted {
            return Err(CliError::EncryptedNote);
        }
        content = match interaction {
            Interaction::Terminal => Some(
                capture_editor_input_with_initial(&current_content)?
                    .ok_or(CliError::EmptyContent)?,
            ),
            Interaction::Shell => return Err(CliError::EmptyContent),
        };
    }
    if encrypted && content.is_some() {
        return Err(CliError::EncryptedNote);
    }

    let mut patch = NotePatch::default();
    if let Some(title) = title {
        patch = patch.with_title(title);
    }
    if let Some(content) = content {
        patch = patch.with_content(content);
    }
    controller.update_note(&id, patch).await?;

    println!("{id}");
    Ok(())
}

pub async fn run_pin(controller: &mut SyncController, id: &str) -> Result<(), CliError> {
    let id = resolve_note_id(controller, id)?;
    let pinned = controller.toggle_pin(&id).await?;
    println!("{} {}", if pinned { "Pinned" } else { "Unpinned" }, short_id(&id));
    Ok(())
}

pub async fn run_delete(
    controller: &mut SyncController,
    id: &str,
    confirm: &dyn Confirm,
) -> Result<(), CliError> {
    let id = resolve_note_id(controller, id)?;
    if controller.delete_note(&id, confirm).await? {
        println!("{id}");
    } else {
        println!("Cancelled. Pass --yes to delete without a prompt.");
    }
    Ok(())
}
