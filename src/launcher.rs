//! Hands files to the editor and preview programs named in the preferences.

use std::path::Path;
use std::process::Command;

use anyhow::Context as _;

use crate::config::Preferences;

/// Builds the command that opens `file` with `program`.
///
/// On macOS the program is an application name passed to `open -a`;
/// elsewhere it is run directly with the file as its only argument.
pub fn open_command(program: &str, file: &Path) -> Command {
    if cfg!(target_os = "macos") {
        let mut cmd = Command::new("open");
        cmd.arg("-a").arg(program).arg(file);
        cmd
    } else {
        let mut cmd = Command::new(program);
        cmd.arg(file);
        cmd
    }
}

/// Opens `file` in the editor and waits for it to exit.
pub fn edit(preferences: &Preferences, file: &Path) -> anyhow::Result<()> {
    tracing::info!(editor = %preferences.editor, file = %file.display(), "open editor");
    let status = open_command(&preferences.editor, file)
        .status()
        .with_context(|| format!("run editor: {}", preferences.editor))?;
    if !status.success() {
        anyhow::bail!("editor failed ({status}): {}", preferences.editor);
    }
    Ok(())
}

/// Starts the preview program on `file` without waiting, if one is configured.
pub fn preview(preferences: &Preferences, file: &Path) -> anyhow::Result<bool> {
    let Some(program) = preferences.preview_program() else {
        tracing::debug!("preview disabled");
        return Ok(false);
    };
    tracing::info!(preview = program, file = %file.display(), "open preview");
    open_command(program, file)
        .spawn()
        .with_context(|| format!("run preview: {program}"))?;
    Ok(true)
}
