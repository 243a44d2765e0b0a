use inkpad_core::{ShareKind, SyncController};

use crate::commands::common::resolve_note_id;
use crate::error::CliError;

pub async fn run_share(controller: &mut SyncController, id: &str) -> Result<(), CliError> {
    let id = resolve_note_id(controller, id)?;
    let link = controller.share_note(&id).await?;
    if link.kind == ShareKind::Direct {
        tracing::info!("Share was not published; printing a direct link");
    }
    println!("{}", link.url);
    Ok(())
}
