//! Helpers for integration tests.
#![allow(dead_code)]

use std::io::Cursor;

use diesel::prelude::*;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use pushkind_vehicles::db::{DbPool, establish_connection_pool};
use pushkind_vehicles::domain::types::VehicleId;
use pushkind_vehicles::domain::upload::UploadedFile;
use pushkind_vehicles::schema::vehicles;
use tempfile::NamedTempFile;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!(); // assumes migrations/ exists

/// Temporary database used in integration tests.
pub struct TestDb {
    _tempfile: NamedTempFile,
    pool: DbPool,
}

impl TestDb {
    pub fn new() -> Self {
        let tempfile = NamedTempFile::new().expect("Failed to create temp file");
        let pool = establish_connection_pool(tempfile.path().to_str().unwrap())
            .expect("Failed to establish SQLite connection.");
        let mut conn = pool
            .get()
            .expect("Failed to get SQLite connection from pool.");
        conn.run_pending_migrations(MIGRATIONS)
            .expect("Migrations failed");
        TestDb {
            _tempfile: tempfile,
            pool,
        }
    }

    pub fn pool(&self) -> DbPool {
        self.pool.clone()
    }

    /// Insert a vehicle row with an explicit id.
    pub fn insert_vehicle(&self, id: i32) -> VehicleId {
        let mut conn = self.pool.get().expect("should acquire DB connection");
        diesel::insert_into(vehicles::table)
            .values((vehicles::id.eq(id), vehicles::title.eq(format!("Vehicle {id}"))))
            .execute(&mut conn)
            .expect("should insert vehicle");
        VehicleId::new(id).expect("valid vehicle id")
    }

    /// Run raw SQL against the test database.
    pub fn execute_sql(&self, sql: &str) {
        let mut conn = self.pool.get().expect("should acquire DB connection");
        diesel::sql_query(sql)
            .execute(&mut conn)
            .expect("should execute SQL");
    }

    /// Delete a vehicle row behind the pipeline's back.
    pub fn delete_vehicle(&self, id: VehicleId) {
        let mut conn = self.pool.get().expect("should acquire DB connection");
        diesel::delete(vehicles::table.filter(vehicles::id.eq(id.get())))
            .execute(&mut conn)
            .expect("should delete vehicle");
    }
}

/// A small JPEG upload with a solid colour.
pub fn jpeg_upload(name: &str, width: u32, height: u32) -> UploadedFile {
    let img = RgbImage::from_pixel(width, height, Rgb([20, 120, 200]));
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, ImageFormat::Jpeg)
        .expect("encode jpeg");
    UploadedFile::new(name, buf.into_inner())
}
