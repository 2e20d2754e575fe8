//! JSON export of decoded entries
//!
//! Writes the decoded entries of a parse to `<input-stem>_logs.json`, either
//! next to the source file or into a chosen directory. Implements the
//! decoder's [`OutputSink`] collaborator trait.

use logan_decoder::{OutputSink, ParseResult};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Sink that serializes entries as pretty-printed JSON
#[derive(Debug, Clone, Default)]
pub struct JsonExporter {
    /// Destination directory; None writes next to the source file
    output_dir: Option<PathBuf>,
}

impl JsonExporter {
    pub fn new(output_dir: Option<PathBuf>) -> Self {
        Self { output_dir }
    }

    fn output_path(&self, source: &Path) -> PathBuf {
        let stem = source
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("logan");
        let dir = self
            .output_dir
            .clone()
            .or_else(|| source.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."));
        dir.join(format!("{}_logs.json", stem))
    }
}

impl OutputSink for JsonExporter {
    fn write_entries(&self, source: &Path, result: &ParseResult) -> logan_decoder::Result<PathBuf> {
        let path = self.output_path(source);
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(&result.entries)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(&path, json)?;
        log::info!("Wrote {} entries to {:?}", result.entries.len(), path);
        Ok(path)
    }
}
