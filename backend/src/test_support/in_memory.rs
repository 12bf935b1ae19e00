//! In-memory implementations of the persistence ports.
//!
//! They honour the same uniqueness and cascade rules as the Diesel adapters
//! so domain behaviour can be exercised without PostgreSQL.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::ports::{
    AddressRepository, AddressRepositoryError, ApiConfigRepository, ApiConfigRepositoryError,
    ApiRequestRepository, ApiRequestRepositoryError, RouteRepository, RouteRepositoryError,
};
use crate::domain::{
    Address, AddressConnection, AddressConnectionId, AddressId, AddressKey, ApiConfig,
    ApiRequestId, ApiRequestRecord, ApiRequestStatus, AvoidFlags, Coordinates,
    NewAddressConnection, Route, RouteDetails, RouteKey, RouteStep,
};

use super::lock;

/// API configuration rows keyed by name.
#[derive(Default)]
pub struct InMemoryApiConfigRepository(Mutex<BTreeMap<String, ApiConfig>>);

impl InMemoryApiConfigRepository {
    /// Repository pre-populated with `apis`.
    pub fn with_apis(apis: impl IntoIterator<Item = ApiConfig>) -> Self {
        let rows = apis.into_iter().map(|api| (api.name.clone(), api)).collect();
        Self(Mutex::new(rows))
    }

    /// Insert or replace a row.
    pub fn upsert(&self, api: ApiConfig) {
        lock(&self.0).insert(api.name.clone(), api);
    }

    /// Every stored row, ordered by name.
    pub fn all(&self) -> Vec<ApiConfig> {
        lock(&self.0).values().cloned().collect()
    }
}

#[async_trait]
impl ApiConfigRepository for InMemoryApiConfigRepository {
    async fn find_by_name(&self, name: &str) -> Result<Option<ApiConfig>, ApiConfigRepositoryError> {
        Ok(lock(&self.0).get(name).cloned())
    }

    async fn ensure_defaults(
        &self,
        defaults: &[ApiConfig],
    ) -> Result<usize, ApiConfigRepositoryError> {
        let mut rows = lock(&self.0);
        let mut inserted = 0;
        for api in defaults {
            if !rows.contains_key(&api.name) {
                rows.insert(api.name.clone(), api.clone());
                inserted += 1;
            }
        }
        Ok(inserted)
    }
}

/// Request records in registration order, with their admission stamps.
#[derive(Default)]
pub struct InMemoryApiRequestRepository {
    records: Mutex<Vec<ApiRequestRecord>>,
    admissions: Mutex<BTreeMap<ApiRequestId, (String, DateTime<Utc>)>>,
}

impl InMemoryApiRequestRepository {
    /// Append a record with an explicit status, as a previous process might
    /// have left it.
    pub fn seed(&self, api_name: &str, status: ApiRequestStatus) -> ApiRequestRecord {
        let mut records = lock(&self.records);
        let record = ApiRequestRecord {
            id: next_id(records.len()),
            api_name: api_name.to_owned(),
            requested_at: DateTime::<Utc>::UNIX_EPOCH,
            status,
        };
        records.push(record.clone());
        record
    }

    /// Stamp `record` as admitted at `at`, as a previous call might have.
    pub fn seed_admission(&self, record: &ApiRequestRecord, at: DateTime<Utc>) {
        lock(&self.admissions).insert(record.id, (record.api_name.clone(), at));
    }

    /// Admission time recorded for `id`, if any.
    pub fn admitted_at(&self, id: ApiRequestId) -> Option<DateTime<Utc>> {
        lock(&self.admissions).get(&id).map(|(_, at)| *at)
    }

    /// Snapshot of every record.
    pub fn records(&self) -> Vec<ApiRequestRecord> {
        lock(&self.records).clone()
    }

    /// Number of records currently `waiting`.
    pub fn waiting_count(&self) -> usize {
        lock(&self.records)
            .iter()
            .filter(|record| record.status == ApiRequestStatus::Waiting)
            .count()
    }
}

#[async_trait]
impl ApiRequestRepository for InMemoryApiRequestRepository {
    async fn create_waiting(
        &self,
        api_name: &str,
        requested_at: DateTime<Utc>,
    ) -> Result<ApiRequestRecord, ApiRequestRepositoryError> {
        let mut records = lock(&self.records);
        let record = ApiRequestRecord {
            id: next_id(records.len()),
            api_name: api_name.to_owned(),
            requested_at,
            status: ApiRequestStatus::Waiting,
        };
        records.push(record.clone());
        Ok(record)
    }

    async fn oldest_waiting(
        &self,
        api_name: &str,
    ) -> Result<Option<ApiRequestRecord>, ApiRequestRepositoryError> {
        Ok(lock(&self.records)
            .iter()
            .filter(|record| record.api_name == api_name)
            .filter(|record| record.status == ApiRequestStatus::Waiting)
            .min_by_key(|record| record.id)
            .cloned())
    }

    async fn set_status(
        &self,
        id: ApiRequestId,
        status: ApiRequestStatus,
    ) -> Result<bool, ApiRequestRepositoryError> {
        let mut records = lock(&self.records);
        match records
            .iter_mut()
            .find(|record| record.id == id && record.status == ApiRequestStatus::Waiting)
        {
            Some(record) => {
                record.status = status;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn mark_admitted(
        &self,
        id: ApiRequestId,
        admitted_at: DateTime<Utc>,
    ) -> Result<(), ApiRequestRepositoryError> {
        let api_name = lock(&self.records)
            .iter()
            .find(|record| record.id == id)
            .map(|record| record.api_name.clone())
            .ok_or_else(|| ApiRequestRepositoryError::query(format!("no request record {id}")))?;
        lock(&self.admissions).insert(id, (api_name, admitted_at));
        Ok(())
    }

    async fn last_admitted_at(
        &self,
        api_name: &str,
    ) -> Result<Option<DateTime<Utc>>, ApiRequestRepositoryError> {
        Ok(lock(&self.admissions)
            .values()
            .filter(|(name, _)| name == api_name)
            .map(|(_, at)| *at)
            .max())
    }

    async fn find(
        &self,
        id: ApiRequestId,
    ) -> Result<Option<ApiRequestRecord>, ApiRequestRepositoryError> {
        Ok(lock(&self.records).iter().find(|record| record.id == id).cloned())
    }

    async fn fail_all_waiting(&self) -> Result<u64, ApiRequestRepositoryError> {
        let mut changed = 0;
        for record in lock(&self.records).iter_mut() {
            if record.status == ApiRequestStatus::Waiting {
                record.status = ApiRequestStatus::Error;
                changed += 1;
            }
        }
        Ok(changed)
    }
}

/// Addresses unique on their normalised key.
#[derive(Default)]
pub struct InMemoryAddressRepository(Mutex<Vec<Address>>);

impl InMemoryAddressRepository {
    /// Store an address directly, bypassing geocoding.
    pub fn insert(
        &self,
        key: AddressKey,
        coordinates: Coordinates,
        updated_at: DateTime<Utc>,
    ) -> Address {
        let mut rows = lock(&self.0);
        let address = Address {
            id: next_id(rows.len()),
            key,
            coordinates,
            updated_at,
        };
        rows.push(address.clone());
        address
    }

    /// Fetch an address by identifier.
    pub fn get(&self, id: AddressId) -> Option<Address> {
        lock(&self.0).iter().find(|address| address.id == id).cloned()
    }

    /// Number of stored addresses.
    pub fn len(&self) -> usize {
        lock(&self.0).len()
    }

    /// Whether no address is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl AddressRepository for InMemoryAddressRepository {
    async fn find_by_key(&self, key: &AddressKey) -> Result<Option<Address>, AddressRepositoryError> {
        Ok(lock(&self.0).iter().find(|address| &address.key == key).cloned())
    }

    async fn upsert_coordinates(
        &self,
        key: &AddressKey,
        coordinates: Coordinates,
        updated_at: DateTime<Utc>,
    ) -> Result<Address, AddressRepositoryError> {
        let mut rows = lock(&self.0);
        if let Some(existing) = rows.iter_mut().find(|address| &address.key == key) {
            existing.coordinates = coordinates;
            existing.updated_at = updated_at;
            return Ok(existing.clone());
        }
        let address = Address {
            id: next_id(rows.len()),
            key: key.clone(),
            coordinates,
            updated_at,
        };
        rows.push(address.clone());
        Ok(address)
    }
}

#[derive(Default)]
struct RouteState {
    connections: Vec<AddressConnection>,
    routes: Vec<Route>,
    next_route_id: i64,
    pending_failure: Option<RouteRepositoryError>,
}

/// Address connections and routes, joined against an
/// [`InMemoryAddressRepository`] for reads.
pub struct InMemoryRouteRepository {
    addresses: Arc<InMemoryAddressRepository>,
    state: Mutex<RouteState>,
}

impl InMemoryRouteRepository {
    /// Repository reading addresses from `addresses`.
    pub fn new(addresses: Arc<InMemoryAddressRepository>) -> Self {
        Self {
            addresses,
            state: Mutex::new(RouteState::default()),
        }
    }

    /// Make the next `create_route` call fail with `error` without writing.
    pub fn fail_next_create(&self, error: RouteRepositoryError) {
        lock(&self.state).pending_failure = Some(error);
    }

    /// Snapshot of every stored connection.
    pub fn connections(&self) -> Vec<AddressConnection> {
        lock(&self.state).connections.clone()
    }

    /// Snapshot of every stored route.
    pub fn routes(&self) -> Vec<Route> {
        lock(&self.state).routes.clone()
    }

    fn details(&self, route: &Route, state: &RouteState) -> Result<RouteDetails, RouteRepositoryError> {
        let mut steps = Vec::with_capacity(route.connection_ids.len());
        for (order, connection_id) in route.connection_ids.iter().enumerate() {
            let connection = state
                .connections
                .iter()
                .find(|connection| connection.id == *connection_id)
                .ok_or_else(|| RouteRepositoryError::query("dangling route connection"))?;
            let from = self
                .addresses
                .get(connection.from_address)
                .ok_or_else(|| RouteRepositoryError::query("dangling from address"))?;
            let to = self
                .addresses
                .get(connection.to_address)
                .ok_or_else(|| RouteRepositoryError::query("dangling to address"))?;
            steps.push(RouteStep {
                order: u32::try_from(order)
                    .map_err(|err| RouteRepositoryError::query(err.to_string()))?,
                from,
                to,
                distance_meters: connection.distance_meters,
                travel_seconds: connection.travel_seconds,
            });
        }
        let avoid = route
            .connection_ids
            .first()
            .and_then(|id| state.connections.iter().find(|connection| connection.id == *id))
            .map_or_else(AvoidFlags::default, |connection| connection.avoid);
        Ok(RouteDetails {
            key: route.key.clone(),
            created_at: route.created_at,
            avoid,
            steps,
        })
    }
}

#[async_trait]
impl RouteRepository for InMemoryRouteRepository {
    async fn upsert_connection(
        &self,
        connection: &NewAddressConnection,
    ) -> Result<AddressConnection, RouteRepositoryError> {
        let mut state = lock(&self.state);
        if let Some(existing) = state.connections.iter_mut().find(|stored| {
            stored.from_address == connection.from_address
                && stored.to_address == connection.to_address
                && stored.avoid == connection.avoid
        }) {
            existing.distance_meters = connection.distance_meters;
            existing.travel_seconds = connection.travel_seconds;
            return Ok(*existing);
        }
        let stored = AddressConnection {
            id: next_id(state.connections.len()),
            from_address: connection.from_address,
            to_address: connection.to_address,
            avoid: connection.avoid,
            distance_meters: connection.distance_meters,
            travel_seconds: connection.travel_seconds,
        };
        state.connections.push(stored);
        Ok(stored)
    }

    async fn create_route(
        &self,
        key: &RouteKey,
        connection_ids: &[AddressConnectionId],
        created_at: DateTime<Utc>,
    ) -> Result<Route, RouteRepositoryError> {
        let mut state = lock(&self.state);
        if let Some(error) = state.pending_failure.take() {
            return Err(error);
        }
        if state.routes.iter().any(|route| &route.key == key) {
            return Err(RouteRepositoryError::duplicate_key(key.to_string()));
        }
        let known = |id: &AddressConnectionId| state.connections.iter().any(|c| c.id == *id);
        if !connection_ids.iter().all(known) {
            return Err(RouteRepositoryError::query(
                "route references an unknown address connection",
            ));
        }
        state.next_route_id += 1;
        let route = Route {
            id: state.next_route_id,
            key: key.clone(),
            created_at,
            connection_ids: connection_ids.to_vec(),
        };
        state.routes.push(route.clone());
        Ok(route)
    }

    async fn find_by_key(
        &self,
        key: &RouteKey,
    ) -> Result<Option<RouteDetails>, RouteRepositoryError> {
        let state = lock(&self.state);
        state
            .routes
            .iter()
            .find(|route| &route.key == key)
            .map(|route| self.details(route, &state))
            .transpose()
    }

    async fn delete_route(&self, key: &RouteKey) -> Result<bool, RouteRepositoryError> {
        let mut state = lock(&self.state);
        let before = state.routes.len();
        state.routes.retain(|route| &route.key != key);
        Ok(state.routes.len() != before)
    }

    async fn delete_route_step(
        &self,
        key: &RouteKey,
        order: u32,
    ) -> Result<bool, RouteRepositoryError> {
        let mut state = lock(&self.state);
        let has_step = state.routes.iter().any(|route| {
            &route.key == key
                && usize::try_from(order).is_ok_and(|index| index < route.connection_ids.len())
        });
        if has_step {
            state.routes.retain(|route| &route.key != key);
        }
        Ok(has_step)
    }
}

fn next_id(len: usize) -> i64 {
    i64::try_from(len).map_or(i64::MAX, |len| len + 1)
}
