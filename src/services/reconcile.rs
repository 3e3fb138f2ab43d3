//! Reconcile sweeps repairing drift between the image store, the vehicles
//! table and the upload directory.

use std::collections::HashSet;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::time::{Duration, SystemTime};

use crate::domain::types::VehicleId;
use crate::repository::{VehicleImageReader, VehicleImageWriter};
use crate::storage::{StorageLayout, remove_if_present};

use super::{ServiceError, ServiceResult};

/// Minimum age of an unreferenced file before a sweep without the vehicle
/// lock may remove it.
pub const UNREFERENCED_FILE_GRACE: Duration = Duration::from_secs(60 * 60);

/// Remove the directory and every image row of each vehicle that has image
/// rows but no vehicle row.
///
/// Returns the number of directories removed. A missing directory is not an
/// error, so a second run right after the first returns 0. When a directory
/// cannot be removed the rows are kept and the next run retries.
pub fn cleanup_orphaned_images<R>(repo: &R, layout: &StorageLayout) -> ServiceResult<usize>
where
    R: VehicleImageReader + VehicleImageWriter,
{
    let orphans = repo.list_orphan_vehicle_ids()?;
    if orphans.is_empty() {
        log::info!("No orphaned vehicle images found");
        return Ok(0);
    }

    let mut cleaned = 0;
    for vehicle_id in &orphans {
        let dir = layout.vehicle_directory(*vehicle_id);
        match fs::remove_dir_all(&dir) {
            Ok(()) => {
                log::info!("Cleaned up orphaned images for vehicle {vehicle_id}");
                cleaned += 1;
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                log::error!("Failed to remove {}: {e}", dir.display());
                return Err(ServiceError::filesystem(dir, e));
            }
        }
    }

    let rows = repo.delete_images_by_vehicle_ids(&orphans)?;
    log::info!(
        "Cleaned up {cleaned} orphaned image directories and {rows} image rows for {} vehicles",
        orphans.len()
    );
    Ok(cleaned)
}

/// Remove files in the directory of `vehicle_id` that no image row refers
/// to, including temporary files of interrupted writes.
///
/// Files modified less than `min_age` ago are kept. Returns the number of
/// files removed.
pub fn cleanup_unreferenced_files<R>(
    repo: &R,
    layout: &StorageLayout,
    vehicle_id: VehicleId,
    min_age: Duration,
) -> ServiceResult<usize>
where
    R: VehicleImageReader,
{
    let referenced: HashSet<OsString> = repo
        .list_vehicle_images(vehicle_id)?
        .iter()
        .flat_map(|image| layout.artifact_paths(vehicle_id, &image.filename))
        .filter_map(|path| path.file_name().map(OsString::from))
        .collect();

    let dir = layout.vehicle_directory(vehicle_id);
    let entries = match fs::read_dir(&dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(ServiceError::filesystem(dir, e)),
    };

    let now = SystemTime::now();
    let mut removed = 0;
    for entry in entries {
        let entry = entry.map_err(|e| ServiceError::filesystem(&dir, e))?;
        if referenced.contains(&entry.file_name()) {
            continue;
        }
        let metadata = match entry.metadata() {
            Ok(metadata) if metadata.is_file() => metadata,
            Ok(_) => continue,
            Err(e) => {
                log::warn!("Failed to inspect {}: {e}", entry.path().display());
                continue;
            }
        };
        let age = metadata
            .modified()
            .ok()
            .and_then(|modified| now.duration_since(modified).ok())
            .unwrap_or_default();
        if age < min_age {
            continue;
        }

        let path = entry.path();
        match remove_if_present(&path) {
            Ok(true) => {
                log::debug!("Removed unreferenced file {}", path.display());
                removed += 1;
            }
            Ok(false) => {}
            Err(e) => log::warn!("Failed to remove {}: {e}", path.display()),
        }
    }

    if removed > 0 {
        log::info!("Removed {removed} unreferenced files for vehicle {vehicle_id}");
    }
    Ok(removed)
}
