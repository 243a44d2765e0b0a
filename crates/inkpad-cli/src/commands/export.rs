use std::path::Path;

use inkpad_core::export::render_notes_export;
use inkpad_core::SyncController;

use crate::cli::ExportFormat;
use crate::error::CliError;

pub fn run_export(
    controller: &SyncController,
    format: ExportFormat,
    output_path: Option<&Path>,
) -> Result<(), CliError> {
    let notes = controller
        .visible_notes("")
        .into_iter()
        .cloned()
        .collect::<Vec<_>>();
    let rendered = render_notes_export(&notes, format.into())?;

    if let Some(path) = output_path {
        std::fs::write(path, rendered)?;
        println!("{}", path.display());
    } else {
        println!("{rendered}");
    }

    Ok(())
}
