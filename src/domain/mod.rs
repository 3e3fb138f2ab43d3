//! Domain entities and value objects of the vehicle image pipeline.

pub mod types;
pub mod upload;
pub mod vehicle_image;
