use inkpad_core::util::{strip_markup, truncate_chars};
use inkpad_core::{Confirm, SyncController, Version};

use crate::commands::common::{format_timestamp, resolve_note_id, short_id};
use crate::error::CliError;

const VERSION_PREVIEW_CHARS: usize = 60;

pub fn run_history(controller: &SyncController, id: &str) -> Result<(), CliError> {
    let id = resolve_note_id(controller, id)?;
    let note = controller
        .note(&id)
        .ok_or_else(|| CliError::NoteNotFound(id.to_string()))?;

    if note.versions.is_empty() {
        println!("No saved versions for {}", short_id(&id));
        return Ok(());
    }
    for line in format_version_lines(&note.versions) {
        println!("{line}");
    }
    Ok(())
}

/// One line per version, oldest first, indexed for `restore`.
pub fn format_version_lines(versions: &[Version]) -> Vec<String> {
    versions
        .iter()
        .enumerate()
        .map(|(index, version)| {
            let text = strip_markup(&version.content);
            let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
            let (preview, truncated) = truncate_chars(&collapsed, VERSION_PREVIEW_CHARS);
            let ellipsis = if truncated { "..." } else { "" };
            format!(
                "{index:>3}  {}  {preview}{ellipsis}",
                format_timestamp(version.timestamp)
            )
        })
        .collect()
}

pub async fn run_restore(
    controller: &mut SyncController,
    id: &str,
    index: usize,
    confirm: &dyn Confirm,
) -> Result<(), CliError> {
    let id = resolve_note_id(controller, id)?;
    controller.open_note(&id)?;
    if controller.restore_version(&id, index, confirm).await? {
        println!("Restored version {index} of {}", short_id(&id));
    } else {
        println!("Cancelled. Pass --yes to restore without a prompt.");
    }
    Ok(())
}
