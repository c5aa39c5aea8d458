//! Postgres-backed conference booking store.
//!
//! Writes that can take the room run in a SERIALIZABLE transaction that
//! repeats the overlap check, so two racing submissions cannot both hold
//! the same slot.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::StoreError;

use super::availability::ExistingBooking;
use super::models::{BookedSlotRow, BookingStatus, BookingUpdate, ConferenceBooking, ConferenceBookingRow, NewConferenceBooking};
use super::store::ConferenceBookingStore;

const BOOKING_COLUMNS: &str = r#"
    id, booking_reference, organization, contact_name, contact_email,
    contact_phone, event_type, booking_date, start_time, end_time,
    expected_attendees, package_type, requires_catering, equipment,
    special_requirements, duration_hours, base_price, catering_cost,
    equipment_cost, total_amount, currency, status, created_at, updated_at
"#;

/// SQLSTATE for a serialization failure between concurrent transactions
const SERIALIZATION_FAILURE: &str = "40001";

pub struct PgConferenceBookingStore {
    pool: PgPool,
}

impl PgConferenceBookingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the bookings table if it does not exist yet
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS conference_bookings (
                id UUID PRIMARY KEY,
                booking_reference TEXT NOT NULL UNIQUE,
                organization TEXT NOT NULL,
                contact_name TEXT NOT NULL,
                contact_email TEXT NOT NULL,
                contact_phone TEXT NOT NULL,
                event_type TEXT NOT NULL,
                booking_date DATE NOT NULL,
                start_time TIME NOT NULL,
                end_time TIME NOT NULL CHECK (end_time > start_time),
                expected_attendees INTEGER NOT NULL CHECK (expected_attendees > 0),
                package_type TEXT NOT NULL,
                requires_catering BOOLEAN NOT NULL,
                equipment TEXT[] NOT NULL DEFAULT '{}',
                special_requirements TEXT,
                duration_hours NUMERIC(10, 2) NOT NULL,
                base_price NUMERIC(12, 2) NOT NULL,
                catering_cost NUMERIC(12, 2) NOT NULL,
                equipment_cost NUMERIC(12, 2) NOT NULL,
                total_amount NUMERIC(12, 2) NOT NULL,
                currency TEXT NOT NULL,
                status TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS conference_bookings_date_idx
                ON conference_bookings (booking_date, start_time)
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn begin_serializable(&self) -> Result<Transaction<'static, Postgres>, StoreError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
            .execute(&mut *tx)
            .await?;
        Ok(tx)
    }
}

/// Map serialization failures to a lost race for the slot
fn map_write_error(err: sqlx::Error) -> StoreError {
    let lost_race = err
        .as_database_error()
        .and_then(|db| db.code())
        .map_or(false, |code| code == SERIALIZATION_FAILURE);
    if lost_race {
        StoreError::SlotTaken
    } else {
        StoreError::Database(err)
    }
}

/// Whether a blocking booking other than `ignore` overlaps the slot
async fn slot_is_held(
    tx: &mut Transaction<'static, Postgres>,
    date: NaiveDate,
    start: NaiveTime,
    end: NaiveTime,
    ignore: Option<Uuid>,
) -> Result<bool, StoreError> {
    let held: Option<(Uuid,)> = sqlx::query_as(
        r#"
        SELECT id
        FROM conference_bookings
        WHERE booking_date = $1
          AND status IN ('confirmed', 'completed')
          AND start_time < $3
          AND end_time > $2
          AND ($4::uuid IS NULL OR id <> $4)
        LIMIT 1
        "#,
    )
    .bind(date)
    .bind(start)
    .bind(end)
    .bind(ignore)
    .fetch_optional(&mut **tx)
    .await
    .map_err(map_write_error)?;

    Ok(held.is_some())
}

#[async_trait]
impl ConferenceBookingStore for PgConferenceBookingStore {
    async fn bookings_on(&self, date: NaiveDate) -> Result<Vec<ExistingBooking>, StoreError> {
        let rows = sqlx::query_as::<_, BookedSlotRow>(
            r#"
            SELECT id, booking_date, start_time, end_time, status
            FROM conference_bookings
            WHERE booking_date = $1
            ORDER BY start_time
            "#,
        )
        .bind(date)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(ExistingBooking {
                    booking_id: row.id,
                    date: row.booking_date,
                    start: row.start_time,
                    end: row.end_time,
                    status: row.status.parse().map_err(StoreError::Corrupt)?,
                })
            })
            .collect()
    }

    async fn create(&self, booking: NewConferenceBooking) -> Result<ConferenceBooking, StoreError> {
        let mut tx = self.begin_serializable().await?;

        if slot_is_held(&mut tx, booking.request.event_date, booking.start, booking.end, None).await? {
            return Err(StoreError::SlotTaken);
        }

        let request = &booking.request;
        let equipment: Vec<String> = request
            .equipment_needed
            .iter()
            .map(|e| e.label().to_string())
            .collect();
        let attendees = i32::try_from(request.attendee_count)
            .map_err(|_| StoreError::Corrupt("attendee count out of range".to_string()))?;

        let sql = format!(
            r#"
            INSERT INTO conference_bookings ({columns})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
                    $15, $16, $17, $18, $19, $20, $21, $22, $23, $23)
            RETURNING {columns}
            "#,
            columns = BOOKING_COLUMNS
        );
        let row = sqlx::query_as::<_, ConferenceBookingRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(&booking.booking_reference)
            .bind(&request.organization_name)
            .bind(&request.contact_person)
            .bind(&request.email)
            .bind(&request.phone)
            .bind(request.event_type.label())
            .bind(request.event_date)
            .bind(booking.start)
            .bind(booking.end)
            .bind(attendees)
            .bind(request.package_type.as_str())
            .bind(request.catering_needed)
            .bind(&equipment)
            .bind(&request.special_requests)
            .bind(booking.quote.duration_hours)
            .bind(booking.quote.room_cost)
            .bind(booking.quote.catering_cost)
            .bind(booking.quote.equipment_cost)
            .bind(booking.quote.total)
            .bind(&booking.quote.currency)
            .bind(booking.status.as_str())
            .bind(booking.created_at)
            .fetch_one(&mut *tx)
            .await
            .map_err(map_write_error)?;

        tx.commit().await.map_err(map_write_error)?;

        row.into_booking()
    }

    async fn list(&self, contact_email: Option<&str>) -> Result<Vec<ConferenceBooking>, StoreError> {
        let rows = match contact_email {
            Some(email) => {
                let sql = format!(
                    "SELECT {} FROM conference_bookings \
                     WHERE lower(contact_email) = lower($1) \
                     ORDER BY booking_date, start_time",
                    BOOKING_COLUMNS
                );
                sqlx::query_as::<_, ConferenceBookingRow>(&sql)
                    .bind(email)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let sql = format!(
                    "SELECT {} FROM conference_bookings ORDER BY booking_date, start_time",
                    BOOKING_COLUMNS
                );
                sqlx::query_as::<_, ConferenceBookingRow>(&sql)
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        rows.into_iter().map(ConferenceBookingRow::into_booking).collect()
    }

    async fn get(&self, id: Uuid) -> Result<Option<ConferenceBooking>, StoreError> {
        let sql = format!("SELECT {} FROM conference_bookings WHERE id = $1", BOOKING_COLUMNS);
        let row = sqlx::query_as::<_, ConferenceBookingRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(ConferenceBookingRow::into_booking).transpose()
    }

    async fn update(&self, id: Uuid, update: &BookingUpdate) -> Result<ConferenceBooking, StoreError> {
        let mut tx = self.begin_serializable().await?;

        let current: Option<(String, NaiveDate, NaiveTime, NaiveTime)> = sqlx::query_as(
            r#"
            SELECT status, booking_date, start_time, end_time
            FROM conference_bookings
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_write_error)?;

        let (status, date, start, end) = current.ok_or(StoreError::NotFound)?;
        let actual: BookingStatus = status.parse().map_err(StoreError::Corrupt)?;

        let next_status = match update.status {
            Some(change) => {
                if actual != change.from {
                    return Err(StoreError::StatusChanged { actual });
                }
                if change.to.blocks_slot() && slot_is_held(&mut tx, date, start, end, Some(id)).await? {
                    return Err(StoreError::SlotTaken);
                }
                change.to
            }
            None => actual,
        };

        let sql = format!(
            r#"
            UPDATE conference_bookings
            SET status = $2,
                special_requirements = CASE WHEN $3::bool THEN $4::text ELSE special_requirements END,
                updated_at = $5
            WHERE id = $1 AND status = $6
            RETURNING {}
            "#,
            BOOKING_COLUMNS
        );
        let row = sqlx::query_as::<_, ConferenceBookingRow>(&sql)
            .bind(id)
            .bind(next_status.as_str())
            .bind(update.special_requests.is_some())
            .bind(update.special_requests.clone().flatten())
            .bind(Utc::now())
            .bind(actual.as_str())
            .fetch_optional(&mut *tx)
            .await
            .map_err(map_write_error)?
            .ok_or(StoreError::StatusChanged { actual })?;

        tx.commit().await.map_err(map_write_error)?;

        row.into_booking()
    }
}
