use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Destination d'un document JSON.
pub trait JsonSink {
    fn write_document<T: Serialize>(&self, path: &Path, document: &T) -> Result<()>;
}

/// Écrit des fichiers JSON indentés (2 espaces, UTF-8 non échappé).
#[derive(Debug, Clone, Copy, Default)]
pub struct FileJsonSink;

impl JsonSink for FileJsonSink {
    fn write_document<T: Serialize>(&self, path: &Path, document: &T) -> Result<()> {
        write_atomically(path, |file| {
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, document)?;
            writer.write_all(b"\n")?;
            writer.flush()?;
            Ok(())
        })
        .with_context(|| format!("Impossible d'écrire {:?}", path))?;
        log::info!("Document écrit : {}", path.display());
        Ok(())
    }
}

/// Écrit dans un fichier temporaire du même répertoire puis le renomme sur `path`.
/// En cas d'échec, le fichier existant n'est pas modifié.
pub fn write_atomically<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut File) -> Result<()>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("Impossible de créer un fichier temporaire dans {:?}", dir))?;
    write(tmp.as_file_mut())?;
    tmp.as_file().sync_all()?;
    tmp.persist(path)
        .with_context(|| format!("Impossible de remplacer {:?}", path))?;
    Ok(())
}
