use dircmp_common::{InspectOp, InspectionError, MetadataSnapshot, ReadMode};
use std::fs;
use std::path::Path;

/// Read the metadata snapshot of `path`, following links or not per `mode`
pub fn read_snapshot(path: &Path, mode: ReadMode) -> Result<MetadataSnapshot, InspectionError> {
    let meta = match mode {
        ReadMode::Follow => fs::metadata(path),
        ReadMode::NoFollow => fs::symlink_metadata(path),
    }
    .map_err(|e| InspectionError::new(path, InspectOp::Stat, e))?;

    Ok(MetadataSnapshot::from_metadata(&meta))
}
