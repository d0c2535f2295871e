use async_trait::async_trait;
use chrono::NaiveDate;
use common::{BookingId, DateRange, RequestId, RoomId};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::booking::{Booking, NewBooking};
use crate::error::{BookingError, Result};
use crate::status::BookingStatus;
use crate::store::BookingStore;

const UNIQUE_REQUEST_ID: &str = "uk_booking_request_id";

/// PostgreSQL-backed booking store.
#[derive(Clone)]
pub struct PostgresBookingStore {
    pool: PgPool,
}

impl PostgresBookingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the booking schema migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations/booking")
            .run(&self.pool)
            .await?;
        Ok(())
    }

    fn row_to_booking(row: PgRow) -> Result<Booking> {
        let status: String = row.try_get("status")?;
        let dates = DateRange::new(
            row.try_get::<NaiveDate, _>("start_date")?,
            row.try_get::<NaiveDate, _>("end_date")?,
        )
        .map_err(|e| BookingError::CorruptRecord(e.to_string()))?;

        Ok(Booking {
            id: BookingId::new(row.try_get("id")?),
            username: row.try_get("username")?,
            room_id: RoomId::new(row.try_get("room_id")?),
            dates,
            status: status.parse()?,
            request_id: RequestId::from_uuid(row.try_get::<Uuid, _>("request_id")?),
            failure_reason: row.try_get("failure_reason")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[async_trait]
impl BookingStore for PostgresBookingStore {
    async fn insert(&self, booking: NewBooking) -> Result<Booking> {
        let result = sqlx::query(
            r#"
            INSERT INTO bookings (username, room_id, start_date, end_date, status, request_id)
            VALUES ($1, $2, $3, $4, 'PENDING', $5)
            RETURNING id, username, room_id, start_date, end_date, status, request_id,
                      failure_reason, created_at, updated_at
            "#,
        )
        .bind(&booking.username)
        .bind(booking.room_id.as_i64())
        .bind(booking.dates.start_date())
        .bind(booking.dates.end_date())
        .bind(booking.request_id.as_uuid())
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => Self::row_to_booking(row),
            Err(sqlx::Error::Database(db_err))
                if db_err.constraint() == Some(UNIQUE_REQUEST_ID) =>
            {
                Err(BookingError::DuplicateRequest(booking.request_id))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get(&self, id: BookingId) -> Result<Option<Booking>> {
        sqlx::query(
            r#"
            SELECT id, username, room_id, start_date, end_date, status, request_id,
                   failure_reason, created_at, updated_at
            FROM bookings
            WHERE id = $1
            "#,
        )
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await?
        .map(Self::row_to_booking)
        .transpose()
    }

    async fn find_by_request_id(&self, request_id: RequestId) -> Result<Option<Booking>> {
        sqlx::query(
            r#"
            SELECT id, username, room_id, start_date, end_date, status, request_id,
                   failure_reason, created_at, updated_at
            FROM bookings
            WHERE request_id = $1
            "#,
        )
        .bind(request_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?
        .map(Self::row_to_booking)
        .transpose()
    }

    async fn update(&self, booking: &Booking, expected: BookingStatus) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE bookings
            SET status = $2, failure_reason = $3, updated_at = $4
            WHERE id = $1 AND status = $5
            "#,
        )
        .bind(booking.id.as_i64())
        .bind(booking.status.as_str())
        .bind(booking.failure_reason.as_deref())
        .bind(booking.updated_at)
        .bind(expected.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return match self.get(booking.id).await? {
                Some(_) => Err(BookingError::StatusChanged {
                    id: booking.id,
                    expected,
                }),
                None => Err(BookingError::BookingNotFound(booking.id)),
            };
        }
        Ok(())
    }

    async fn list_for_user(&self, username: &str) -> Result<Vec<Booking>> {
        let rows = sqlx::query(
            r#"
            SELECT id, username, room_id, start_date, end_date, status, request_id,
                   failure_reason, created_at, updated_at
            FROM bookings
            WHERE username = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(username)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_booking).collect()
    }
}
