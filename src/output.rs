// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Persisting generated files.

use std::io::Write;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::GenerateError;
use crate::generate::GeneratedFile;

/// Separator printed between files in stdout mode.
pub const STDOUT_SEPARATOR: &str = "==================";

/// What happened when a file was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    Written(PathBuf),
    /// Existing content was identical; the file was left alone.
    Unchanged(PathBuf),
}

impl WriteOutcome {
    pub fn path(&self) -> &Path {
        match self {
            Self::Written(path) | Self::Unchanged(path) => path,
        }
    }
}

/// Make sure the output directory exists.
pub async fn setup_dir(dir: &Path) -> Result<(), GenerateError> {
    match tokio::fs::metadata(dir).await {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(GenerateError::NotADirectory(dir.display().to_string())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("Creating output directory {}", dir.display());
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| GenerateError::OutputDirectory {
                    path: dir.display().to_string(),
                    message: e.to_string(),
                })
        }
        Err(e) => Err(GenerateError::OutputDirectory {
            path: dir.display().to_string(),
            message: e.to_string(),
        }),
    }
}

/// Render and write a file into `dir`.
pub async fn write_file(dir: &Path, file: &GeneratedFile) -> Result<WriteOutcome, GenerateError> {
    let path = dir.join(&file.name);
    let content = file.render();

    if let Ok(existing) = tokio::fs::read(&path).await {
        if digest(&existing) == digest(content.as_bytes()) {
            debug!("{} is up to date", path.display());
            return Ok(WriteOutcome::Unchanged(path));
        }
    }

    tokio::fs::write(&path, content)
        .await
        .map_err(|e| GenerateError::write(&path, e))?;
    Ok(WriteOutcome::Written(path))
}

/// Render every file to `out`, separated by [`STDOUT_SEPARATOR`] lines.
pub fn print_files<W: Write>(out: &mut W, files: &[GeneratedFile]) -> std::io::Result<()> {
    for (i, file) in files.iter().enumerate() {
        if i > 0 {
            writeln!(out, "{}", STDOUT_SEPARATOR)?;
        }
        write!(out, "{}", file.render())?;
    }
    Ok(())
}

fn digest(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}
