use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::types::{AltText, ImageFilename, ImageOrder, TypeConstraintError};
use crate::domain::vehicle_image::{
    NewVehicleImage as DomainNewVehicleImage, VehicleImage as DomainVehicleImage,
};

/// Diesel model representing the `vehicle_images` table.
#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::vehicle_images)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct VehicleImage {
    pub id: i32,
    pub vehicle_id: i32,
    pub local_path: String,
    pub filename: String,
    pub is_primary: bool,
    pub file_size: i64,
    pub image_order: i32,
    pub alt_text: String,
    pub created_at: NaiveDateTime,
}

/// Insertable form of [`VehicleImage`].
#[derive(Debug, Insertable)]
#[diesel(table_name = crate::schema::vehicle_images)]
pub struct NewVehicleImage {
    pub vehicle_id: i32,
    pub local_path: String,
    pub filename: String,
    pub is_primary: bool,
    pub file_size: i64,
    pub image_order: i32,
    pub alt_text: String,
    pub created_at: NaiveDateTime,
}

impl TryFrom<VehicleImage> for DomainVehicleImage {
    type Error = TypeConstraintError;

    fn try_from(image: VehicleImage) -> Result<Self, Self::Error> {
        Ok(Self {
            id: image.id.try_into()?,
            vehicle_id: image.vehicle_id.try_into()?,
            filename: ImageFilename::new(image.filename)?,
            local_path: image.local_path,
            is_primary: image.is_primary,
            order: ImageOrder::new(image.image_order)?,
            file_size: image.file_size,
            alt_text: AltText::new(image.alt_text)?,
            created_at: image.created_at,
        })
    }
}

impl From<&DomainNewVehicleImage> for NewVehicleImage {
    fn from(image: &DomainNewVehicleImage) -> Self {
        Self {
            vehicle_id: image.vehicle_id.get(),
            local_path: image.local_path.clone(),
            filename: image.filename.as_str().to_string(),
            is_primary: image.is_primary,
            file_size: image.file_size,
            image_order: image.order.get(),
            alt_text: image.alt_text.as_str().to_string(),
            created_at: image.created_at,
        }
    }
}
