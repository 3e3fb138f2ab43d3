use diesel::dsl::not;
use diesel::prelude::*;

use crate::domain::types::{ImageId, VehicleId};
use crate::domain::vehicle_image::{ImageOrderUpdate, NewVehicleImage, VehicleImage};
use crate::models::vehicle_image::{
    NewVehicleImage as DbNewVehicleImage, VehicleImage as DbVehicleImage,
};
use crate::repository::errors::RepositoryResult;
use crate::repository::{DieselRepository, MissingTarget, VehicleImageReader, VehicleImageWriter};

impl VehicleImageReader for DieselRepository {
    fn list_vehicle_images(&self, vehicle_id: VehicleId) -> RepositoryResult<Vec<VehicleImage>> {
        use crate::schema::vehicle_images;

        let mut conn = self.conn()?;

        let images = vehicle_images::table
            .filter(vehicle_images::vehicle_id.eq(vehicle_id.get()))
            .order((
                vehicle_images::is_primary.desc(),
                vehicle_images::image_order.asc(),
                vehicle_images::id.asc(),
            ))
            .load::<DbVehicleImage>(&mut conn)?
            .into_iter()
            .map(TryInto::try_into)
            .collect::<Result<Vec<VehicleImage>, _>>()?;

        Ok(images)
    }

    fn get_vehicle_image_by_id(&self, id: ImageId) -> RepositoryResult<Option<VehicleImage>> {
        use crate::schema::vehicle_images;

        let mut conn = self.conn()?;

        let image = vehicle_images::table
            .filter(vehicle_images::id.eq(id.get()))
            .first::<DbVehicleImage>(&mut conn)
            .optional()?;

        let image = image.map(TryInto::try_into).transpose()?;
        Ok(image)
    }

    fn list_orphan_vehicle_ids(&self) -> RepositoryResult<Vec<VehicleId>> {
        use crate::schema::{vehicle_images, vehicles};

        let mut conn = self.conn()?;

        let ids = vehicle_images::table
            .filter(not(
                vehicle_images::vehicle_id.eq_any(vehicles::table.select(vehicles::id))
            ))
            .select(vehicle_images::vehicle_id)
            .distinct()
            .order(vehicle_images::vehicle_id.asc())
            .load::<i32>(&mut conn)?
            .into_iter()
            .map(VehicleId::new)
            .collect::<Result<Vec<VehicleId>, _>>()?;

        Ok(ids)
    }
}

impl VehicleImageWriter for DieselRepository {
    fn create_vehicle_image(&self, image: &NewVehicleImage) -> RepositoryResult<VehicleImage> {
        use crate::schema::vehicle_images;

        let mut conn = self.conn()?;
        let db_image: DbNewVehicleImage = image.into();

        let created = conn.immediate_transaction(|conn| -> QueryResult<DbVehicleImage> {
            if db_image.is_primary {
                diesel::update(
                    vehicle_images::table
                        .filter(vehicle_images::vehicle_id.eq(db_image.vehicle_id))
                        .filter(vehicle_images::is_primary.eq(true)),
                )
                .set(vehicle_images::is_primary.eq(false))
                .execute(conn)?;
            }

            diesel::insert_into(vehicle_images::table)
                .values(&db_image)
                .get_result::<DbVehicleImage>(conn)
        })?;

        Ok(created.try_into()?)
    }

    fn set_primary_image(
        &self,
        vehicle_id: VehicleId,
        image_id: ImageId,
        on_missing: MissingTarget,
    ) -> RepositoryResult<usize> {
        use crate::schema::vehicle_images;

        let mut conn = self.conn()?;

        let result = conn.immediate_transaction(|conn| -> QueryResult<usize> {
            diesel::update(
                vehicle_images::table.filter(vehicle_images::vehicle_id.eq(vehicle_id.get())),
            )
            .set(vehicle_images::is_primary.eq(false))
            .execute(conn)?;

            let flagged = diesel::update(
                vehicle_images::table
                    .filter(vehicle_images::id.eq(image_id.get()))
                    .filter(vehicle_images::vehicle_id.eq(vehicle_id.get())),
            )
            .set(vehicle_images::is_primary.eq(true))
            .execute(conn)?;

            if flagged == 0 && on_missing == MissingTarget::KeepCurrent {
                return Err(diesel::result::Error::RollbackTransaction);
            }
            Ok(flagged)
        });

        match result {
            Ok(flagged) => Ok(flagged),
            Err(diesel::result::Error::RollbackTransaction) => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    fn update_image_orders(
        &self,
        vehicle_id: VehicleId,
        orders: &[ImageOrderUpdate],
    ) -> RepositoryResult<usize> {
        use crate::schema::vehicle_images;

        let mut conn = self.conn()?;

        let affected = conn.immediate_transaction(|conn| -> QueryResult<usize> {
            let mut affected = 0;
            for update in orders {
                affected += diesel::update(
                    vehicle_images::table
                        .filter(vehicle_images::id.eq(update.id.get()))
                        .filter(vehicle_images::vehicle_id.eq(vehicle_id.get())),
                )
                .set(vehicle_images::image_order.eq(update.order.get()))
                .execute(conn)?;
            }
            Ok(affected)
        })?;

        Ok(affected)
    }

    fn delete_vehicle_image(&self, id: ImageId, promote_next: bool) -> RepositoryResult<usize> {
        use crate::schema::vehicle_images;

        let mut conn = self.conn()?;

        let deleted = conn.immediate_transaction(|conn| -> QueryResult<usize> {
            let Some((owner, was_primary)) = vehicle_images::table
                .filter(vehicle_images::id.eq(id.get()))
                .select((vehicle_images::vehicle_id, vehicle_images::is_primary))
                .first::<(i32, bool)>(conn)
                .optional()?
            else {
                return Ok(0);
            };

            let deleted =
                diesel::delete(vehicle_images::table.filter(vehicle_images::id.eq(id.get())))
                    .execute(conn)?;

            if promote_next && was_primary {
                let next = vehicle_images::table
                    .filter(vehicle_images::vehicle_id.eq(owner))
                    .order((vehicle_images::image_order.asc(), vehicle_images::id.asc()))
                    .select(vehicle_images::id)
                    .first::<i32>(conn)
                    .optional()?;
                if let Some(next) = next {
                    diesel::update(vehicle_images::table.filter(vehicle_images::id.eq(next)))
                        .set(vehicle_images::is_primary.eq(true))
                        .execute(conn)?;
                }
            }
            Ok(deleted)
        })?;

        Ok(deleted)
    }

    fn delete_images_by_vehicle_ids(&self, vehicle_ids: &[VehicleId]) -> RepositoryResult<usize> {
        use crate::schema::vehicle_images;

        if vehicle_ids.is_empty() {
            return Ok(0);
        }

        let mut conn = self.conn()?;
        let raw_ids: Vec<i32> = vehicle_ids.iter().map(|id| id.get()).collect();

        let affected =
            diesel::delete(vehicle_images::table.filter(vehicle_images::vehicle_id.eq_any(raw_ids)))
                .execute(&mut conn)?;

        Ok(affected)
    }
}
