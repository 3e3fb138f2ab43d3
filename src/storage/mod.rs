//! On-disk layout of vehicle image artifacts.
//!
//! Every vehicle owns `{upload_root}/vehicles/{vehicle_id}/`. An upload is
//! stored as three sibling files sharing one stem:
//!
//! | Variant | File name |
//! |---|---|
//! | full | `image_{timestamp}_{index}.{ext}` |
//! | medium | `image_{timestamp}_{index}_medium.jpg` |
//! | thumbnail | `image_{timestamp}_{index}_thumb.jpg` |
//!
//! All three are JPEG-encoded regardless of the original extension.

mod files;

pub use files::{TEMP_FILE_PREFIX, remove_if_present, write_atomic};

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::domain::types::{ImageFilename, VehicleId};

const VEHICLES_DIR: &str = "vehicles";
const PUBLIC_PREFIX: &str = "/images/vehicles";

/// One of the three renditions derived from an uploaded photograph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    Full,
    Medium,
    Thumbnail,
}

impl Variant {
    pub const ALL: [Variant; 3] = [Variant::Full, Variant::Medium, Variant::Thumbnail];

    /// Suffix replacing the extension of the full-size file name.
    pub fn suffix(self) -> Option<&'static str> {
        match self {
            Variant::Full => None,
            Variant::Medium => Some("_medium.jpg"),
            Variant::Thumbnail => Some("_thumb.jpg"),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Variant::Full => "full",
            Variant::Medium => "medium",
            Variant::Thumbnail => "thumbnail",
        }
    }
}

/// Maps vehicles to their directories under a fixed upload root.
#[derive(Debug, Clone)]
pub struct StorageLayout {
    upload_root: PathBuf,
}

impl StorageLayout {
    pub fn new(upload_root: impl Into<PathBuf>) -> Self {
        Self {
            upload_root: upload_root.into(),
        }
    }

    /// Parent directory of all vehicle directories.
    pub fn vehicles_root(&self) -> PathBuf {
        self.upload_root.join(VEHICLES_DIR)
    }

    /// Directory of `vehicle_id`; no I/O.
    pub fn vehicle_directory(&self, vehicle_id: VehicleId) -> PathBuf {
        self.vehicles_root().join(vehicle_id.to_string())
    }

    /// Directory of `vehicle_id`, created with its ancestors when absent.
    pub fn resolve_vehicle_directory(&self, vehicle_id: VehicleId) -> io::Result<PathBuf> {
        let dir = self.vehicle_directory(vehicle_id);
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Path of every artifact stored for `filename`, full-size first.
    pub fn artifact_paths(&self, vehicle_id: VehicleId, filename: &ImageFilename) -> [PathBuf; 3] {
        let base = self.vehicle_directory(vehicle_id).join(filename.as_str());
        Variant::ALL.map(|variant| derivative_path(&base, variant))
    }

    /// Web-servable path recorded as `local_path`.
    pub fn public_path(&self, vehicle_id: VehicleId, filename: &ImageFilename) -> String {
        format!("{PUBLIC_PREFIX}/{vehicle_id}/{filename}")
    }

    /// Vehicles that currently have a directory on disk.
    ///
    /// Entries whose name is not a positive integer are ignored.
    pub fn list_vehicle_directories(&self) -> io::Result<Vec<VehicleId>> {
        let entries = match fs::read_dir(self.vehicles_root()) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let mut ids = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let parsed = entry
                .file_name()
                .to_str()
                .and_then(|name| name.parse::<i32>().ok())
                .and_then(|raw| VehicleId::new(raw).ok());
            if let Some(vehicle_id) = parsed {
                ids.push(vehicle_id);
            }
        }
        ids.sort();
        Ok(ids)
    }
}

/// File name `image_{timestamp}_{index}{ext}` where `ext` is the lower-cased
/// extension of `original_name` (including the dot), or empty when it has none.
pub fn derive_filename(original_name: &str, index: usize, timestamp: i64) -> String {
    let extension = Path::new(original_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
        .unwrap_or_default();
    format!("image_{timestamp}_{index}{extension}")
}

/// Path of `variant` for the full-size artifact at `base_path`.
///
/// The full-size variant is `base_path` itself; the others replace its
/// extension with the variant suffix.
pub fn derivative_path(base_path: &Path, variant: Variant) -> PathBuf {
    let Some(suffix) = variant.suffix() else {
        return base_path.to_path_buf();
    };
    let stem = base_path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    base_path.with_file_name(format!("{stem}{suffix}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn vehicle(id: i32) -> VehicleId {
        VehicleId::new(id).unwrap()
    }

    #[test]
    fn derive_filename_lower_cases_extension() {
        assert_eq!(
            derive_filename("Front View.JPG", 2, 1_717_000_000_123),
            "image_1717000000123_2.jpg"
        );
        assert_eq!(derive_filename("scan", 0, 5), "image_5_0");
    }

    #[test]
    fn derivative_paths_share_the_stem() {
        let base = Path::new("/srv/vehicles/42/image_1_0.png");
        assert_eq!(derivative_path(base, Variant::Full), base);
        assert_eq!(
            derivative_path(base, Variant::Medium),
            Path::new("/srv/vehicles/42/image_1_0_medium.jpg")
        );
        assert_eq!(
            derivative_path(base, Variant::Thumbnail),
            Path::new("/srv/vehicles/42/image_1_0_thumb.jpg")
        );
    }

    #[test]
    fn public_path_uses_web_prefix() {
        let layout = StorageLayout::new("/srv/public/images");
        let filename = ImageFilename::new("image_1_0.jpg").unwrap();
        assert_eq!(
            layout.public_path(vehicle(42), &filename),
            "/images/vehicles/42/image_1_0.jpg"
        );
        assert_eq!(
            layout.artifact_paths(vehicle(42), &filename)[2],
            Path::new("/srv/public/images/vehicles/42/image_1_0_thumb.jpg")
        );
    }

    #[test]
    fn resolve_vehicle_directory_is_idempotent() {
        let root = TempDir::new().expect("tempdir");
        let layout = StorageLayout::new(root.path().join("nested/uploads"));

        let first = layout.resolve_vehicle_directory(vehicle(7)).expect("create");
        let second = layout.resolve_vehicle_directory(vehicle(7)).expect("reuse");

        assert_eq!(first, second);
        assert!(first.is_dir());
        assert!(first.ends_with("vehicles/7"));
    }

    #[test]
    fn lists_only_numeric_vehicle_directories() {
        let root = TempDir::new().expect("tempdir");
        let layout = StorageLayout::new(root.path());
        assert!(layout.list_vehicle_directories().expect("missing root").is_empty());

        layout.resolve_vehicle_directory(vehicle(12)).unwrap();
        layout.resolve_vehicle_directory(vehicle(3)).unwrap();
        fs::create_dir_all(layout.vehicles_root().join("tmp")).unwrap();
        fs::write(layout.vehicles_root().join("99"), b"not a dir").unwrap();

        assert_eq!(
            layout.list_vehicle_directories().unwrap(),
            vec![vehicle(3), vehicle(12)]
        );
    }
}
