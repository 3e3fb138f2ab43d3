//! The asset pipeline: uploads, primary selection, ordering and deletion of
//! vehicle images across the filesystem and the image store.
//!
//! Files are always written before their metadata row is inserted, and a row
//! is always read before its files are removed. A crash between the two steps
//! leaves unreferenced files at worst, which [`ImagePipeline::cleanup_unreferenced_files`]
//! and the reconcile sweep remove later.

use std::time::Duration;

use chrono::Utc;

use crate::domain::types::{AltText, ImageFilename, ImageId, ImageOrder, VehicleId};
use crate::domain::upload::UploadedFile;
use crate::domain::vehicle_image::{
    ImageOrderUpdate, NewVehicleImage, VehicleImage, default_alt_text,
};
use crate::imaging::{RenderPolicy, render};
use crate::models::config::ImagePipelineConfig;
use crate::repository::{MissingTarget, VehicleImageReader, VehicleImageWriter};
use crate::services::locks::VehicleLocks;
use crate::services::reconcile::{self, UNREFERENCED_FILE_GRACE};
use crate::storage::{StorageLayout, derive_filename, remove_if_present};

use super::{ServiceError, ServiceResult};

/// Where the numbering and the primary flag of a new batch start from.
struct BatchStart {
    first_order: ImageOrder,
    claim_primary: bool,
}

/// Orchestrates the storage layout, the renderer and the image store.
pub struct ImagePipeline<R> {
    repo: R,
    layout: StorageLayout,
    policy: RenderPolicy,
    max_files_per_batch: usize,
    legacy_compat: bool,
    locks: VehicleLocks,
}

impl<R> ImagePipeline<R>
where
    R: VehicleImageReader + VehicleImageWriter,
{
    pub fn new(repo: R, config: &ImagePipelineConfig) -> Self {
        Self {
            repo,
            layout: StorageLayout::new(config.upload_root.clone()),
            policy: RenderPolicy::from_config(config),
            max_files_per_batch: config.max_files_per_batch,
            legacy_compat: config.legacy_compat,
            locks: VehicleLocks::new(),
        }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn layout(&self) -> &StorageLayout {
        &self.layout
    }

    /// Run `f` under the vehicle's lock, or directly in legacy mode.
    fn exclusive<T>(&self, vehicle_id: VehicleId, f: impl FnOnce() -> T) -> T {
        if self.legacy_compat {
            f()
        } else {
            self.locks.serialize(vehicle_id, f)
        }
    }

    /// Store a batch of uploads for `vehicle_id`.
    ///
    /// Files that fail validation or rendering are logged and skipped; the
    /// returned rows are the accepted files in input order. Order values are
    /// contiguous over the accepted files. Fails only when the vehicle
    /// directory cannot be created or the store rejects an insert.
    pub fn add_images(
        &self,
        vehicle_id: VehicleId,
        files: &[UploadedFile],
    ) -> ServiceResult<Vec<VehicleImage>> {
        self.exclusive(vehicle_id, || self.add_images_unlocked(vehicle_id, files))
    }

    fn add_images_unlocked(
        &self,
        vehicle_id: VehicleId,
        files: &[UploadedFile],
    ) -> ServiceResult<Vec<VehicleImage>> {
        if files.is_empty() {
            return Ok(Vec::new());
        }

        let dir = self
            .layout
            .resolve_vehicle_directory(vehicle_id)
            .map_err(|e| {
                let dir = self.layout.vehicle_directory(vehicle_id);
                log::error!("Failed to create {}: {e}", dir.display());
                ServiceError::filesystem(dir, e)
            })?;

        let start = self.batch_start(vehicle_id)?;

        if files.len() > self.max_files_per_batch {
            log::warn!(
                "Batch for vehicle {vehicle_id} has {} files; ignoring all after the first {}",
                files.len(),
                self.max_files_per_batch
            );
        }

        let timestamp = Utc::now().timestamp_millis();
        let mut stored: Vec<VehicleImage> = Vec::new();

        for (position, file) in files.iter().take(self.max_files_per_batch).enumerate() {
            if let Err(e) = self.policy.validate(file) {
                log::warn!("Skipping upload for vehicle {vehicle_id}: {e}");
                continue;
            }

            let rendered = match render(&file.original_name, &file.bytes) {
                Ok(rendered) => rendered,
                Err(e) => {
                    log::warn!("Skipping upload for vehicle {vehicle_id}: {e}");
                    continue;
                }
            };

            let order = start.first_order.offset(stored.len());
            let index = if self.legacy_compat {
                position
            } else {
                order.get() as usize
            };
            let filename =
                ImageFilename::new(derive_filename(&file.original_name, index, timestamp))?;

            if let Err(e) = rendered.write_to(&file.original_name, &dir.join(filename.as_str())) {
                log::warn!("Skipping upload for vehicle {vehicle_id}: {e}");
                continue;
            }

            let new_image = NewVehicleImage {
                vehicle_id,
                local_path: self.layout.public_path(vehicle_id, &filename),
                filename,
                is_primary: start.claim_primary && stored.is_empty(),
                order,
                file_size: i64::try_from(file.size).unwrap_or(i64::MAX),
                alt_text: AltText::new(default_alt_text(order))?,
                created_at: Utc::now().naive_utc(),
            };

            match self.repo.create_vehicle_image(&new_image) {
                Ok(image) => stored.push(image),
                Err(e) => {
                    log::error!(
                        "Failed to record {} for vehicle {vehicle_id}: {e}",
                        new_image.filename
                    );
                    return Err(e.into());
                }
            }
        }

        log::info!(
            "Stored {} of {} uploaded images for vehicle {vehicle_id}",
            stored.len(),
            files.len()
        );
        Ok(stored)
    }

    fn batch_start(&self, vehicle_id: VehicleId) -> ServiceResult<BatchStart> {
        if self.legacy_compat {
            return Ok(BatchStart {
                first_order: ImageOrder::FIRST,
                claim_primary: true,
            });
        }

        let existing = self.repo.list_vehicle_images(vehicle_id)?;
        let first_order = existing
            .iter()
            .map(|image| image.order)
            .max()
            .map_or(ImageOrder::FIRST, ImageOrder::next);
        Ok(BatchStart {
            first_order,
            claim_primary: !existing.iter().any(|image| image.is_primary),
        })
    }

    /// Make `image_id` the primary image of `vehicle_id`.
    ///
    /// Returns `false` when the image does not belong to the vehicle. In
    /// legacy mode the vehicle is left without a primary in that case.
    pub fn set_primary(&self, image_id: ImageId, vehicle_id: VehicleId) -> ServiceResult<bool> {
        let on_missing = if self.legacy_compat {
            MissingTarget::ClearAnyway
        } else {
            MissingTarget::KeepCurrent
        };

        let updated = self.exclusive(vehicle_id, || {
            self.repo.set_primary_image(vehicle_id, image_id, on_missing)
        });
        match updated {
            Ok(0) => {
                log::warn!("Image {image_id} not found for vehicle {vehicle_id}");
                Ok(false)
            }
            Ok(_) => {
                log::info!("Set image {image_id} as primary for vehicle {vehicle_id}");
                Ok(true)
            }
            Err(e) => {
                log::error!("Failed to set primary image for vehicle {vehicle_id}: {e}");
                Err(e.into())
            }
        }
    }

    /// Remove an image's files and its metadata row.
    ///
    /// Missing files are ignored. Returns whether a row was deleted, so a
    /// second call for the same id returns `false`.
    pub fn delete_image(&self, image_id: ImageId) -> ServiceResult<bool> {
        let Some(image) = self.repo.get_vehicle_image_by_id(image_id)? else {
            return Ok(false);
        };

        self.exclusive(image.vehicle_id, || -> ServiceResult<bool> {
            for path in self.layout.artifact_paths(image.vehicle_id, &image.filename) {
                if let Err(e) = remove_if_present(&path) {
                    log::warn!("Failed to remove {}: {e}", path.display());
                }
            }

            let deleted = match self
                .repo
                .delete_vehicle_image(image_id, !self.legacy_compat)
            {
                Ok(deleted) => deleted,
                Err(e) => {
                    log::error!("Failed to delete image {image_id}: {e}");
                    return Err(e.into());
                }
            };
            if deleted == 0 {
                return Ok(false);
            }
            log::info!("Deleted image {image_id} of vehicle {}", image.vehicle_id);
            Ok(true)
        })
    }

    /// Apply new order values in one transaction.
    ///
    /// Ids that belong to another vehicle are ignored.
    pub fn reorder_images(
        &self,
        vehicle_id: VehicleId,
        orders: &[ImageOrderUpdate],
    ) -> ServiceResult<bool> {
        let updated = self.exclusive(vehicle_id, || {
            self.repo.update_image_orders(vehicle_id, orders)
        });
        match updated {
            Ok(updated) => {
                log::info!("Reordered {updated} images for vehicle {vehicle_id}");
                Ok(true)
            }
            Err(e) => {
                log::error!("Failed to reorder images for vehicle {vehicle_id}: {e}");
                Err(e.into())
            }
        }
    }

    /// Images of `vehicle_id`, primary first, then by order.
    pub fn get_vehicle_images(&self, vehicle_id: VehicleId) -> ServiceResult<Vec<VehicleImage>> {
        Ok(self.repo.list_vehicle_images(vehicle_id)?)
    }

    /// Remove directories and rows of vehicles that no longer exist.
    pub fn cleanup_orphaned_images(&self) -> ServiceResult<usize> {
        reconcile::cleanup_orphaned_images(&self.repo, &self.layout)
    }

    /// Remove files in the vehicle directory that no row references.
    ///
    /// Runs under the vehicle's lock, so any file not referenced yet is
    /// unreferenced for good. Legacy mode takes no lock and only removes files
    /// older than [`UNREFERENCED_FILE_GRACE`].
    pub fn cleanup_unreferenced_files(&self, vehicle_id: VehicleId) -> ServiceResult<usize> {
        let min_age = if self.legacy_compat {
            UNREFERENCED_FILE_GRACE
        } else {
            Duration::ZERO
        };
        self.exclusive(vehicle_id, || {
            reconcile::cleanup_unreferenced_files(&self.repo, &self.layout, vehicle_id, min_age)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::errors::RepositoryError;
    use crate::repository::test::TestRepository;
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use std::collections::BTreeSet;
    use std::io::Cursor;
    use std::thread;
    use tempfile::TempDir;

    fn vehicle(id: i32) -> VehicleId {
        VehicleId::new(id).unwrap()
    }

    fn jpeg(name: &str, width: u32, height: u32) -> UploadedFile {
        let img = RgbImage::from_pixel(width, height, Rgb([200, 40, 40]));
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut buf, ImageFormat::Jpeg)
            .expect("encode jpeg");
        UploadedFile::new(name, buf.into_inner())
    }

    fn pipeline_with(dir: &TempDir, legacy_compat: bool) -> ImagePipeline<TestRepository> {
        let config = ImagePipelineConfig {
            legacy_compat,
            ..ImagePipelineConfig::with_upload_root(dir.path())
        };
        ImagePipeline::new(TestRepository::new(vec![vehicle(42)]), &config)
    }

    fn pipeline(dir: &TempDir) -> ImagePipeline<TestRepository> {
        pipeline_with(dir, false)
    }

    fn orders(images: &[VehicleImage]) -> Vec<i32> {
        images.iter().map(|image| image.order.get()).collect()
    }

    fn primaries(pipeline: &ImagePipeline<TestRepository>, vehicle_id: VehicleId) -> usize {
        pipeline
            .get_vehicle_images(vehicle_id)
            .unwrap()
            .iter()
            .filter(|image| image.is_primary)
            .count()
    }

    #[test]
    fn upload_set_primary_delete_scenario() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline(&dir);

        let stored = pipeline
            .add_images(vehicle(42), &[jpeg("front.jpg", 64, 48), jpeg("rear.jpg", 64, 48)])
            .unwrap();
        assert_eq!(stored.len(), 2);
        assert!(stored[0].is_primary);
        assert!(!stored[1].is_primary);
        assert_eq!(orders(&stored), vec![0, 1]);
        for image in &stored {
            assert!(image.local_path.starts_with("/images/vehicles/42/"));
            for path in pipeline.layout().artifact_paths(vehicle(42), &image.filename) {
                assert!(path.is_file(), "{} should exist", path.display());
            }
        }

        assert!(pipeline.set_primary(stored[1].id, vehicle(42)).unwrap());
        let images = pipeline.get_vehicle_images(vehicle(42)).unwrap();
        assert_eq!(images[0].id, stored[1].id);
        assert!(images[0].is_primary);
        assert!(!images[1].is_primary);

        assert!(pipeline.delete_image(stored[0].id).unwrap());
        let images = pipeline.get_vehicle_images(vehicle(42)).unwrap();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].id, stored[1].id);
        assert!(images[0].is_primary);
    }

    #[test]
    fn invalid_file_is_skipped_and_orders_stay_contiguous() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline(&dir);
        let files = [
            jpeg("a.jpg", 32, 32),
            UploadedFile::new("notes.txt", b"plain text".to_vec()),
            jpeg("c.jpeg", 32, 32),
        ];

        let stored = pipeline.add_images(vehicle(42), &files).unwrap();

        assert_eq!(stored.len(), 2);
        assert_eq!(orders(&stored), vec![0, 1]);
        assert_eq!(stored[1].alt_text, "Vehicle image 2");
    }

    #[test]
    fn corrupt_and_oversized_files_yield_empty_result() {
        let dir = TempDir::new().unwrap();
        let config = ImagePipelineConfig {
            max_file_size_bytes: 64,
            ..ImagePipelineConfig::with_upload_root(dir.path())
        };
        let pipeline = ImagePipeline::new(TestRepository::new(vec![vehicle(42)]), &config);
        let files = [
            UploadedFile::new("broken.jpg", vec![0xFF; 16]),
            jpeg("large.jpg", 256, 256),
        ];

        let stored = pipeline.add_images(vehicle(42), &files).unwrap();

        assert!(stored.is_empty());
        assert!(pipeline.repository().all_images().is_empty());
    }

    #[test]
    fn empty_batch_creates_nothing() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline(&dir);
        assert!(pipeline.add_images(vehicle(42), &[]).unwrap().is_empty());
        assert!(!pipeline.layout().vehicle_directory(vehicle(42)).exists());
    }

    #[test]
    fn files_beyond_batch_cap_are_ignored() {
        let dir = TempDir::new().unwrap();
        let config = ImagePipelineConfig {
            max_files_per_batch: 2,
            ..ImagePipelineConfig::with_upload_root(dir.path())
        };
        let pipeline = ImagePipeline::new(TestRepository::new(vec![vehicle(42)]), &config);
        let files: Vec<_> = (0..3).map(|i| jpeg(&format!("{i}.jpg"), 16, 16)).collect();

        let stored = pipeline.add_images(vehicle(42), &files).unwrap();
        assert_eq!(stored.len(), 2);
    }

    #[test]
    fn second_batch_continues_numbering_and_keeps_primary() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline(&dir);

        let first = pipeline
            .add_images(vehicle(42), &[jpeg("a.jpg", 16, 16), jpeg("b.jpg", 16, 16)])
            .unwrap();
        let second = pipeline
            .add_images(vehicle(42), &[jpeg("c.jpg", 16, 16), jpeg("d.jpg", 16, 16)])
            .unwrap();

        assert_eq!(orders(&second), vec![2, 3]);
        assert!(second.iter().all(|image| !image.is_primary));
        assert!(second[0].filename.as_str().ends_with("_2.jpg"));
        let images = pipeline.get_vehicle_images(vehicle(42)).unwrap();
        assert_eq!(images[0].id, first[0].id);
        assert_eq!(primaries(&pipeline, vehicle(42)), 1);
    }

    #[test]
    fn legacy_batches_restart_numbering_and_override_primary() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline_with(&dir, true);

        pipeline
            .add_images(vehicle(42), &[jpeg("a.jpg", 16, 16), jpeg("b.jpg", 16, 16)])
            .unwrap();
        let second = pipeline
            .add_images(vehicle(42), &[jpeg("c.jpg", 16, 16)])
            .unwrap();

        assert_eq!(orders(&second), vec![0]);
        assert!(second[0].is_primary);
        let images = pipeline.get_vehicle_images(vehicle(42)).unwrap();
        assert_eq!(images[0].id, second[0].id);
        assert_eq!(primaries(&pipeline, vehicle(42)), 1);
    }

    #[test]
    fn legacy_filenames_use_input_position() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline_with(&dir, true);
        let files = [
            UploadedFile::new("skip.gif", vec![1, 2, 3]),
            jpeg("kept.JPG", 16, 16),
        ];

        let stored = pipeline.add_images(vehicle(42), &files).unwrap();

        assert_eq!(orders(&stored), vec![0]);
        assert!(stored[0].filename.as_str().ends_with("_1.jpg"));
    }

    #[test]
    fn store_failure_surfaces_as_error() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline(&dir);
        pipeline.repository().fail_writes(true);

        let err = pipeline
            .add_images(vehicle(42), &[jpeg("a.jpg", 16, 16)])
            .unwrap_err();

        assert!(matches!(
            err,
            ServiceError::Store(RepositoryError::Database(_))
        ));
    }

    #[test]
    fn unwritable_upload_root_fails_the_request() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("not-a-dir");
        std::fs::write(&root, b"file").unwrap();
        let pipeline = ImagePipeline::new(
            TestRepository::new(vec![vehicle(42)]),
            &ImagePipelineConfig::with_upload_root(root),
        );

        let err = pipeline
            .add_images(vehicle(42), &[jpeg("a.jpg", 16, 16)])
            .unwrap_err();
        assert!(matches!(err, ServiceError::Filesystem { .. }));
    }

    #[test]
    fn set_primary_on_missing_image_keeps_current_primary() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline(&dir);
        let stored = pipeline
            .add_images(vehicle(42), &[jpeg("a.jpg", 16, 16)])
            .unwrap();

        let missing = ImageId::new(9999).unwrap();
        assert!(!pipeline.set_primary(missing, vehicle(42)).unwrap());
        assert!(!pipeline.set_primary(stored[0].id, vehicle(7)).unwrap());
        assert_eq!(primaries(&pipeline, vehicle(42)), 1);
    }

    #[test]
    fn legacy_set_primary_on_missing_image_clears_primary() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline_with(&dir, true);
        pipeline
            .add_images(vehicle(42), &[jpeg("a.jpg", 16, 16)])
            .unwrap();

        let missing = ImageId::new(9999).unwrap();
        assert!(!pipeline.set_primary(missing, vehicle(42)).unwrap());
        assert_eq!(primaries(&pipeline, vehicle(42)), 0);
    }

    #[test]
    fn delete_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline(&dir);
        let stored = pipeline
            .add_images(vehicle(42), &[jpeg("a.jpg", 16, 16)])
            .unwrap();
        let paths = pipeline
            .layout()
            .artifact_paths(vehicle(42), &stored[0].filename);

        assert!(pipeline.delete_image(stored[0].id).unwrap());
        assert!(!pipeline.delete_image(stored[0].id).unwrap());
        assert!(paths.iter().all(|path| !path.exists()));
        assert!(pipeline.layout().vehicle_directory(vehicle(42)).is_dir());
    }

    #[test]
    fn delete_succeeds_when_files_are_already_gone() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline(&dir);
        let stored = pipeline
            .add_images(vehicle(42), &[jpeg("a.jpg", 16, 16)])
            .unwrap();
        std::fs::remove_dir_all(pipeline.layout().vehicle_directory(vehicle(42))).unwrap();

        assert!(pipeline.delete_image(stored[0].id).unwrap());
        assert!(pipeline.get_vehicle_images(vehicle(42)).unwrap().is_empty());
    }

    #[test]
    fn deleting_primary_promotes_lowest_order() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline(&dir);
        let files: Vec<_> = (0..3).map(|i| jpeg(&format!("{i}.jpg"), 16, 16)).collect();
        let stored = pipeline.add_images(vehicle(42), &files).unwrap();

        assert!(pipeline.delete_image(stored[0].id).unwrap());

        let images = pipeline.get_vehicle_images(vehicle(42)).unwrap();
        assert_eq!(images[0].id, stored[1].id);
        assert!(images[0].is_primary);
        assert_eq!(primaries(&pipeline, vehicle(42)), 1);
    }

    #[test]
    fn failed_promotion_keeps_the_deleted_primary() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline(&dir);
        let stored = pipeline
            .add_images(vehicle(42), &[jpeg("a.jpg", 16, 16), jpeg("b.jpg", 16, 16)])
            .unwrap();
        pipeline.repository().fail_promotions(true);

        let result = pipeline.delete_image(stored[0].id);

        assert!(matches!(result, Err(ServiceError::Store(_))));
        let images = pipeline.get_vehicle_images(vehicle(42)).unwrap();
        assert_eq!(images.len(), 2);
        assert_eq!(images[0].id, stored[0].id);
        assert_eq!(primaries(&pipeline, vehicle(42)), 1);

        pipeline.repository().fail_promotions(false);
        assert!(pipeline.delete_image(stored[0].id).unwrap());
        let images = pipeline.get_vehicle_images(vehicle(42)).unwrap();
        assert_eq!(images[0].id, stored[1].id);
        assert!(images[0].is_primary);
    }

    #[test]
    fn legacy_delete_of_primary_leaves_none() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline_with(&dir, true);
        let stored = pipeline
            .add_images(vehicle(42), &[jpeg("a.jpg", 16, 16), jpeg("b.jpg", 16, 16)])
            .unwrap();
        pipeline.repository().fail_promotions(true);

        assert!(pipeline.delete_image(stored[0].id).unwrap());
        assert_eq!(primaries(&pipeline, vehicle(42)), 0);
    }

    #[test]
    fn reorder_is_scoped_to_the_vehicle() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline(&dir);
        let ours = pipeline
            .add_images(vehicle(42), &[jpeg("a.jpg", 16, 16), jpeg("b.jpg", 16, 16)])
            .unwrap();
        let theirs = pipeline
            .add_images(vehicle(7), &[jpeg("c.jpg", 16, 16)])
            .unwrap();

        let updates = [
            ImageOrderUpdate {
                id: ours[0].id,
                order: ImageOrder::new(5).unwrap(),
            },
            ImageOrderUpdate {
                id: theirs[0].id,
                order: ImageOrder::new(9).unwrap(),
            },
        ];
        assert!(pipeline.reorder_images(vehicle(42), &updates).unwrap());

        let ours_now = pipeline.get_vehicle_images(vehicle(42)).unwrap();
        assert_eq!(ours_now.iter().find(|i| i.id == ours[0].id).unwrap().order, 5);
        let theirs_now = pipeline.get_vehicle_images(vehicle(7)).unwrap();
        assert_eq!(theirs_now[0].order, 0);
    }

    #[test]
    fn reorder_failure_surfaces_as_error() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline(&dir);
        pipeline.repository().fail_writes(true);
        assert!(pipeline.reorder_images(vehicle(42), &[]).is_err());
    }

    #[test]
    fn concurrent_batches_for_one_vehicle_do_not_collide() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline(&dir);

        thread::scope(|s| {
            for batch in 0..3 {
                let pipeline = &pipeline;
                s.spawn(move || {
                    let files = [
                        jpeg(&format!("{batch}-a.jpg"), 16, 16),
                        jpeg(&format!("{batch}-b.jpg"), 16, 16),
                    ];
                    pipeline.add_images(vehicle(42), &files).unwrap();
                });
            }
        });

        let images = pipeline.get_vehicle_images(vehicle(42)).unwrap();
        assert_eq!(images.len(), 6);
        let distinct: BTreeSet<i32> = images.iter().map(|image| image.order.get()).collect();
        assert_eq!(distinct, (0..6).collect());
        let names: BTreeSet<&str> = images.iter().map(|image| image.filename.as_str()).collect();
        assert_eq!(names.len(), 6);
        assert_eq!(primaries(&pipeline, vehicle(42)), 1);
    }

    #[test]
    fn unreferenced_files_are_removed() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline(&dir);
        let stored = pipeline
            .add_images(vehicle(42), &[jpeg("a.jpg", 16, 16)])
            .unwrap();
        let vehicle_dir = pipeline.layout().vehicle_directory(vehicle(42));
        std::fs::write(vehicle_dir.join("image_1_9.jpg"), b"stray").unwrap();
        std::fs::write(vehicle_dir.join("image_1_9_thumb.jpg"), b"stray").unwrap();

        assert_eq!(pipeline.cleanup_unreferenced_files(vehicle(42)).unwrap(), 2);
        for path in pipeline.layout().artifact_paths(vehicle(42), &stored[0].filename) {
            assert!(path.is_file());
        }
        assert_eq!(pipeline.cleanup_unreferenced_files(vehicle(42)).unwrap(), 0);
    }
}
