//! PostgreSQL-backed `AddressRepository` implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{AddressRepository, AddressRepositoryError};
use crate::domain::{Address, AddressKey, Coordinates};

use super::error_mapping::{map_basic_diesel_error, map_pool_error};
use super::models::{AddressRow, NewAddressRow};
use super::pool::DbPool;
use super::schema::addresses;

/// Diesel-backed implementation of the `AddressRepository` port.
#[derive(Clone)]
pub struct DieselAddressRepository {
    pool: DbPool,
}

impl DieselAddressRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_diesel_error(error: diesel::result::Error) -> AddressRepositoryError {
    map_basic_diesel_error(
        error,
        AddressRepositoryError::query,
        AddressRepositoryError::connection,
    )
}

pub(super) fn row_to_address(row: AddressRow) -> Address {
    Address {
        id: row.id,
        key: AddressKey::new(
            &row.street,
            &row.city,
            &row.state,
            &row.postal_code,
            &row.country,
        ),
        coordinates: Coordinates::new(row.latitude, row.longitude),
        updated_at: row.updated_at,
    }
}

#[async_trait]
impl AddressRepository for DieselAddressRepository {
    async fn find_by_key(&self, key: &AddressKey) -> Result<Option<Address>, AddressRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, AddressRepositoryError::connection))?;

        let row = addresses::table
            .filter(addresses::street.eq(key.street()))
            .filter(addresses::city.eq(key.city()))
            .filter(addresses::state.eq(key.state()))
            .filter(addresses::postal_code.eq(key.postal_code()))
            .filter(addresses::country.eq(key.country()))
            .select(AddressRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(row.map(row_to_address))
    }

    async fn upsert_coordinates(
        &self,
        key: &AddressKey,
        coordinates: Coordinates,
        updated_at: DateTime<Utc>,
    ) -> Result<Address, AddressRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, AddressRepositoryError::connection))?;

        let new_row = NewAddressRow {
            street: key.street(),
            city: key.city(),
            state: key.state(),
            postal_code: key.postal_code(),
            country: key.country(),
            latitude: coordinates.latitude,
            longitude: coordinates.longitude,
            updated_at,
        };

        let row = diesel::insert_into(addresses::table)
            .values(&new_row)
            .on_conflict((
                addresses::street,
                addresses::city,
                addresses::state,
                addresses::postal_code,
                addresses::country,
            ))
            .do_update()
            .set((
                addresses::latitude.eq(excluded(addresses::latitude)),
                addresses::longitude.eq(excluded(addresses::longitude)),
                addresses::updated_at.eq(excluded(addresses::updated_at)),
            ))
            .returning(AddressRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(row_to_address(row))
    }
}
