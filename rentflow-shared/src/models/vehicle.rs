/// Vehicle model and database operations
///
/// # Schema
///
/// ```sql
/// CREATE TYPE vehicle_type AS ENUM ('car', 'bike', 'van', 'SUV');
/// CREATE TYPE availability_status AS ENUM ('available', 'booked');
///
/// CREATE TABLE vehicles (
///     id SERIAL PRIMARY KEY,
///     vehicle_name VARCHAR(255) NOT NULL,
///     type vehicle_type NOT NULL,
///     registration_number VARCHAR(64) NOT NULL UNIQUE,
///     daily_rent_price NUMERIC(10, 2) NOT NULL CHECK (daily_rent_price > 0),
///     availability_status availability_status NOT NULL DEFAULT 'available'
/// );
/// ```
///
/// Availability is owned by the booking ledger. Vehicles are always inserted
/// `available`, and [`VehiclePatch`] has no status field, so the only writers
/// of `availability_status` are [`Vehicle::set_availability`] calls made inside
/// ledger transactions.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};

/// Largest daily price the `NUMERIC(10, 2)` column holds
pub const MAX_DAILY_RENT_PRICE: Decimal = Decimal::from_parts(1_410_065_407, 2, 0, false, 2);

/// Kind of vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "vehicle_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum VehicleType {
    Car,
    Bike,
    Van,
    #[sqlx(rename = "SUV")]
    #[serde(rename = "SUV")]
    Suv,
}

/// Whether a vehicle can be booked right now
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "availability_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AvailabilityStatus {
    /// No active booking holds the vehicle
    Available,

    /// Held by exactly one active booking
    Booked,
}

impl AvailabilityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AvailabilityStatus::Available => "available",
            AvailabilityStatus::Booked => "booked",
        }
    }
}

/// A rentable vehicle
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Vehicle {
    pub id: i32,

    pub vehicle_name: String,

    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub vehicle_type: VehicleType,

    /// Unique across the fleet
    pub registration_number: String,

    /// Price per 24 hours of rental
    pub daily_rent_price: Decimal,

    pub availability_status: AvailabilityStatus,
}

/// Input for creating a vehicle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateVehicle {
    pub vehicle_name: String,
    pub vehicle_type: VehicleType,
    pub registration_number: String,
    pub daily_rent_price: Decimal,
}

/// Partial update of a vehicle
///
/// Only the fields listed here can be changed; `None` leaves the column alone.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VehiclePatch {
    pub vehicle_name: Option<String>,
    pub vehicle_type: Option<VehicleType>,
    pub registration_number: Option<String>,
    pub daily_rent_price: Option<Decimal>,
}

impl VehiclePatch {
    /// True when no column would change
    pub fn is_empty(&self) -> bool {
        self.vehicle_name.is_none()
            && self.vehicle_type.is_none()
            && self.registration_number.is_none()
            && self.daily_rent_price.is_none()
    }

    /// Column assignments in bind order, starting at `$2` (`$1` is the id)
    fn assignments(&self) -> Vec<String> {
        let columns = [
            ("vehicle_name", self.vehicle_name.is_some()),
            ("type", self.vehicle_type.is_some()),
            ("registration_number", self.registration_number.is_some()),
            ("daily_rent_price", self.daily_rent_price.is_some()),
        ];

        columns
            .iter()
            .filter(|(_, present)| *present)
            .enumerate()
            .map(|(i, (column, _))| format!("{} = ${}", column, i + 2))
            .collect()
    }
}

const VEHICLE_COLUMNS: &str =
    "id, vehicle_name, type, registration_number, daily_rent_price, availability_status";

impl Vehicle {
    /// Inserts a new vehicle in `available` state
    ///
    /// # Errors
    ///
    /// Fails with a unique violation if the registration number is taken.
    pub async fn create(pool: &PgPool, data: CreateVehicle) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO vehicles (vehicle_name, type, registration_number, daily_rent_price) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {VEHICLE_COLUMNS}"
        );

        sqlx::query_as::<_, Vehicle>(&query)
            .bind(data.vehicle_name)
            .bind(data.vehicle_type)
            .bind(data.registration_number)
            .bind(data.daily_rent_price)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: i32) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {VEHICLE_COLUMNS} FROM vehicles WHERE id = $1");

        sqlx::query_as::<_, Vehicle>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Lists the whole fleet ordered by id
    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!("SELECT {VEHICLE_COLUMNS} FROM vehicles ORDER BY id");

        sqlx::query_as::<_, Vehicle>(&query).fetch_all(pool).await
    }

    /// Applies a patch and returns the updated row, or None if the vehicle
    /// doesn't exist. An empty patch is a no-op read.
    pub async fn update(
        pool: &PgPool,
        id: i32,
        patch: VehiclePatch,
    ) -> Result<Option<Self>, sqlx::Error> {
        if patch.is_empty() {
            return Self::find_by_id(pool, id).await;
        }

        let query = format!(
            "UPDATE vehicles SET {} WHERE id = $1 RETURNING {VEHICLE_COLUMNS}",
            patch.assignments().join(", ")
        );

        let mut q = sqlx::query_as::<_, Vehicle>(&query).bind(id);

        if let Some(name) = patch.vehicle_name {
            q = q.bind(name);
        }
        if let Some(vehicle_type) = patch.vehicle_type {
            q = q.bind(vehicle_type);
        }
        if let Some(registration) = patch.registration_number {
            q = q.bind(registration);
        }
        if let Some(price) = patch.daily_rent_price {
            q = q.bind(price);
        }

        q.fetch_optional(pool).await
    }

    /// Deletes a vehicle; returns false if it didn't exist
    ///
    /// Callers must check [`crate::models::booking::Booking::vehicle_has_active`]
    /// first. Vehicles with booking history are protected by a foreign key and
    /// fail with a constraint violation.
    pub async fn delete(pool: &PgPool, id: i32) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM vehicles WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Reads a vehicle and takes a row lock until the surrounding transaction
    /// ends
    ///
    /// A second transaction locking the same vehicle waits here, then sees the
    /// committed state of the first.
    pub async fn lock_for_update(
        conn: &mut PgConnection,
        id: i32,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {VEHICLE_COLUMNS} FROM vehicles WHERE id = $1 FOR UPDATE");

        sqlx::query_as::<_, Vehicle>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Flips the availability flag; returns false if the vehicle is gone
    pub async fn set_availability(
        conn: &mut PgConnection,
        id: i32,
        status: AvailabilityStatus,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE vehicles SET availability_status = $2 WHERE id = $1")
            .bind(id)
            .bind(status)
            .execute(conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_vehicle_type_wire_names() {
        assert_eq!(serde_json::to_value(VehicleType::Suv).unwrap(), json!("SUV"));
        assert_eq!(serde_json::to_value(VehicleType::Bike).unwrap(), json!("bike"));

        let parsed: VehicleType = serde_json::from_value(json!("van")).unwrap();
        assert_eq!(parsed, VehicleType::Van);
        assert!(serde_json::from_value::<VehicleType>(json!("suv")).is_err());
    }

    #[test]
    fn test_max_daily_rent_price() {
        assert_eq!(MAX_DAILY_RENT_PRICE.to_string(), "99999999.99");
    }

    #[test]
    fn test_vehicle_serializes_type_field() {
        let vehicle = Vehicle {
            id: 1,
            vehicle_name: "Corolla".to_string(),
            vehicle_type: VehicleType::Car,
            registration_number: "ABC-123".to_string(),
            daily_rent_price: Decimal::new(5000, 2),
            availability_status: AvailabilityStatus::Available,
        };

        let value = serde_json::to_value(&vehicle).unwrap();
        assert_eq!(value["type"], "car");
        assert_eq!(value["availability_status"], "available");
        assert!(value.get("vehicle_type").is_none());
    }

    #[test]
    fn test_patch_assignments_follow_bind_order() {
        let patch = VehiclePatch {
            vehicle_name: None,
            vehicle_type: Some(VehicleType::Van),
            registration_number: None,
            daily_rent_price: Some(Decimal::new(7500, 2)),
        };

        assert_eq!(
            patch.assignments(),
            vec!["type = $2".to_string(), "daily_rent_price = $3".to_string()]
        );
    }

    #[test]
    fn test_empty_patch() {
        assert!(VehiclePatch::default().is_empty());
        assert!(VehiclePatch::default().assignments().is_empty());
    }
}
