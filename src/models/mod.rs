#[cfg(feature = "server")]
pub mod config;
pub mod vehicle_image;
