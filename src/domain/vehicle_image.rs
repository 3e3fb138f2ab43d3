use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::types::{AltText, ImageFilename, ImageId, ImageOrder, VehicleId};

/// One stored photograph of a vehicle.
///
/// The three on-disk derivatives (full, medium, thumbnail) are addressed by
/// `vehicle_id` and `filename`; `local_path` is the web-servable path to the
/// full-size artifact.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VehicleImage {
    pub id: ImageId,
    pub vehicle_id: VehicleId,
    pub filename: ImageFilename,
    pub local_path: String,
    pub is_primary: bool,
    pub order: ImageOrder,
    /// Size in bytes of the uploaded source file.
    pub file_size: i64,
    pub alt_text: AltText,
    pub created_at: NaiveDateTime,
}

/// Information required to insert a new [`VehicleImage`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewVehicleImage {
    pub vehicle_id: VehicleId,
    pub filename: ImageFilename,
    pub local_path: String,
    pub is_primary: bool,
    pub order: ImageOrder,
    pub file_size: i64,
    pub alt_text: AltText,
    pub created_at: NaiveDateTime,
}

/// New display position for one image.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageOrderUpdate {
    pub id: ImageId,
    pub order: ImageOrder,
}

/// Default alt text for the image shown at `order`.
pub fn default_alt_text(order: ImageOrder) -> String {
    format!("Vehicle image {}", i64::from(order.get()) + 1)
}
