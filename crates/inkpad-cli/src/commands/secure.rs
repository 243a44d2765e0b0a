use inkpad_core::SyncController;

use crate::commands::common::{resolve_note_id, short_id};
use crate::error::CliError;

pub async fn run_encrypt(
    controller: &mut SyncController,
    id: &str,
    password: &str,
) -> Result<(), CliError> {
    let id = resolve_note_id(controller, id)?;
    controller.open_note(&id)?;
    controller.encrypt_note(&id, password).await?;
    println!("Encrypted {}", short_id(&id));
    Ok(())
}

pub async fn run_decrypt(
    controller: &mut SyncController,
    id: &str,
    password: &str,
) -> Result<(), CliError> {
    let id = resolve_note_id(controller, id)?;
    controller.open_note(&id)?;
    controller.decrypt_note(&id, password).await?;
    println!("Decrypted {}", short_id(&id));
    Ok(())
}
