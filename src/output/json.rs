//! JSON export of the listing map

use crate::listing::PropertyRecord;
use crate::TrawlError;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Writes the listings as one pretty-printed JSON object keyed by id
///
/// Missing parent directories are created. An existing file is replaced.
pub fn write_json(
    listings: &BTreeMap<String, PropertyRecord>,
    path: &Path,
) -> Result<(), TrawlError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, listings)?;
    writer.write_all(b"\n")?;
    writer.flush()?;

    tracing::info!("Wrote {} listings to {}", listings.len(), path.display());
    Ok(())
}
