//! Reconcile job: removes images of deleted vehicles and files no image row
//! refers to. Intended to run periodically from cron.

use std::path::Path;
use std::process::ExitCode;

use pushkind_vehicles::db::establish_connection_pool;
use pushkind_vehicles::models::config::ServerConfig;
use pushkind_vehicles::repository::DieselRepository;
use pushkind_vehicles::services::reconcile::{UNREFERENCED_FILE_GRACE, cleanup_unreferenced_files};
use pushkind_vehicles::services::{ImagePipeline, ServiceError, ServiceResult};

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("Reconcile failed: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> ServiceResult<()> {
    let server_config = ServerConfig::load(Path::new("config"))?;
    let pool = establish_connection_pool(&server_config.database_url)?;
    let pipeline = ImagePipeline::new(DieselRepository::new(pool), &server_config.images);

    let directories = pipeline.cleanup_orphaned_images()?;

    // This process shares no lock with the upload handlers, so only files
    // past the grace period are considered abandoned.
    let layout = pipeline.layout();
    let vehicles = layout
        .list_vehicle_directories()
        .map_err(|e| ServiceError::filesystem(layout.vehicles_root(), e))?;
    let mut files = 0;
    for vehicle_id in vehicles {
        files += cleanup_unreferenced_files(
            pipeline.repository(),
            layout,
            vehicle_id,
            UNREFERENCED_FILE_GRACE,
        )?;
    }

    log::info!("Reconcile finished: {directories} orphaned directories, {files} unreferenced files");
    Ok(())
}
