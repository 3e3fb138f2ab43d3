pub mod errors;
pub mod images;
pub mod locks;
pub mod reconcile;

pub use errors::{ServiceError, ServiceResult};
pub use images::ImagePipeline;
