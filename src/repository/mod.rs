use crate::db::{DbConnection, DbPool};
use crate::domain::types::{ImageId, VehicleId};
use crate::domain::vehicle_image::{ImageOrderUpdate, NewVehicleImage, VehicleImage};

pub mod errors;
pub mod vehicle_image;

use errors::RepositoryResult;

/// Repository implementation backed by Diesel and SQLite.
///
/// The underlying `r2d2::Pool` is cheap to clone, allowing the repository to
/// be shared between request handlers.
#[derive(Clone)]
pub struct DieselRepository {
    pool: DbPool, // r2d2::Pool is cheap to clone
}

impl DieselRepository {
    /// Create a new repository from an established database pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get a pooled database connection.
    fn conn(&self) -> RepositoryResult<DbConnection> {
        Ok(self.pool.get()?)
    }
}

/// What [`VehicleImageWriter::set_primary_image`] does when the target row
/// does not exist for the vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingTarget {
    /// Commit the cleared flags even though no image became primary.
    ClearAnyway,
    /// Roll back so the current primary stays in place.
    KeepCurrent,
}

/// Read-only operations for vehicle images.
pub trait VehicleImageReader {
    /// List a vehicle's images, primary first, then by ascending order and id.
    fn list_vehicle_images(&self, vehicle_id: VehicleId) -> RepositoryResult<Vec<VehicleImage>>;
    /// Retrieve an image by its identifier.
    fn get_vehicle_image_by_id(&self, id: ImageId) -> RepositoryResult<Option<VehicleImage>>;
    /// Distinct vehicle ids referenced by image rows without a vehicle row.
    fn list_orphan_vehicle_ids(&self) -> RepositoryResult<Vec<VehicleId>>;
}

/// Write operations for vehicle images.
pub trait VehicleImageWriter {
    /// Insert an image row and return it with its assigned id.
    ///
    /// Inserting a primary image clears the vehicle's other primaries in the
    /// same transaction.
    fn create_vehicle_image(&self, image: &NewVehicleImage) -> RepositoryResult<VehicleImage>;
    /// Clear every primary flag of the vehicle, then flag `image_id`.
    ///
    /// Returns the number of rows flagged (0 or 1).
    fn set_primary_image(
        &self,
        vehicle_id: VehicleId,
        image_id: ImageId,
        on_missing: MissingTarget,
    ) -> RepositoryResult<usize>;
    /// Rewrite order values in one transaction; ids of other vehicles are ignored.
    ///
    /// Returns the number of rows updated.
    fn update_image_orders(
        &self,
        vehicle_id: VehicleId,
        orders: &[ImageOrderUpdate],
    ) -> RepositoryResult<usize>;
    /// Delete one image row.
    ///
    /// With `promote_next`, deleting a primary flags the remaining image with
    /// the lowest `(order, id)` in the same transaction.
    fn delete_vehicle_image(&self, id: ImageId, promote_next: bool) -> RepositoryResult<usize>;
    /// Delete every image row of the given vehicles.
    fn delete_images_by_vehicle_ids(&self, vehicle_ids: &[VehicleId]) -> RepositoryResult<usize>;
}
