use async_trait::async_trait;
use chrono::NaiveDate;
use common::{BookingId, DateRange, RequestId, ReservationId, ResourceGroupId, RoomId};
use sqlx::{PgConnection, PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{
    HotelError, Result,
    decision::{ConfirmPlan, ReleasePlan, plan_confirm, plan_release},
    reservation::{ReservationRequest, ReservationStatus, RoomReservation},
    room::{NewRoom, Room},
    store::{ConfirmOutcome, HotelStore, ReleaseOutcome},
};

const UNIQUE_REQUEST_ID: &str = "uk_reservation_request_id";
const UNIQUE_ROOM_NUMBER: &str = "uk_hotel_room_number";

/// PostgreSQL-backed hotel store.
///
/// A confirm runs in one transaction that first takes `FOR UPDATE` on the
/// room row, so concurrent confirms for the same room queue behind each
/// other before the overlap query runs.
#[derive(Clone)]
pub struct PostgresHotelStore {
    pool: PgPool,
}

impl PostgresHotelStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the hotel schema migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations/hotel")
            .run(&self.pool)
            .await?;
        Ok(())
    }

    fn row_to_room(row: PgRow) -> Result<Room> {
        Ok(Room {
            id: RoomId::new(row.try_get("id")?),
            hotel_id: ResourceGroupId::new(row.try_get("hotel_id")?),
            number: row.try_get("number")?,
            available: row.try_get("available")?,
            times_booked: row.try_get("times_booked")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_reservation(row: PgRow) -> Result<RoomReservation> {
        let status: String = row.try_get("status")?;
        Ok(RoomReservation {
            id: ReservationId::new(row.try_get("id")?),
            room_id: RoomId::new(row.try_get("room_id")?),
            booking_id: BookingId::new(row.try_get("booking_id")?),
            request_id: RequestId::from_uuid(row.try_get::<Uuid, _>("request_id")?),
            dates: DateRange::new(
                row.try_get::<NaiveDate, _>("start_date")?,
                row.try_get::<NaiveDate, _>("end_date")?,
            )?,
            status: status.parse()?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    async fn insert_reservation(
        conn: &mut PgConnection,
        room_id: RoomId,
        request: &ReservationRequest,
        status: ReservationStatus,
    ) -> Result<RoomReservation> {
        let row = sqlx::query(
            r#"
            INSERT INTO room_reservations (room_id, booking_id, request_id, start_date, end_date, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, room_id, booking_id, request_id, start_date, end_date, status, created_at, updated_at
            "#,
        )
        .bind(room_id.as_i64())
        .bind(request.booking_id.as_i64())
        .bind(request.request_id.as_uuid())
        .bind(request.dates.start_date())
        .bind(request.dates.end_date())
        .bind(status.as_str())
        .fetch_one(&mut *conn)
        .await?;

        Self::row_to_reservation(row)
    }

    /// Answers from the row a concurrent attempt recorded under the same key.
    async fn replay(&self, request_id: RequestId) -> Result<ConfirmOutcome> {
        self.find_by_request_id(request_id)
            .await?
            .map(ConfirmOutcome::Replayed)
            .ok_or_else(|| {
                HotelError::CorruptRecord(format!(
                    "request {request_id} violated uniqueness but has no row"
                ))
            })
    }
}

fn violates(err: &HotelError, constraint: &str) -> bool {
    matches!(
        err,
        HotelError::Database(sqlx::Error::Database(db_err)) if db_err.constraint() == Some(constraint)
    )
}

#[async_trait]
impl HotelStore for PostgresHotelStore {
    async fn insert_room(&self, room: NewRoom) -> Result<Room> {
        let result = sqlx::query(
            r#"
            INSERT INTO rooms (hotel_id, number, available, times_booked)
            VALUES ($1, $2, $3, $4)
            RETURNING id, hotel_id, number, available, times_booked, created_at
            "#,
        )
        .bind(room.hotel_id.as_i64())
        .bind(&room.number)
        .bind(room.available)
        .bind(room.times_booked)
        .fetch_one(&self.pool)
        .await
        .map_err(HotelError::from);

        match result {
            Ok(row) => Self::row_to_room(row),
            Err(e) if violates(&e, UNIQUE_ROOM_NUMBER) => Err(HotelError::DuplicateRoomNumber {
                hotel_id: room.hotel_id,
                number: room.number,
            }),
            Err(e) => Err(e),
        }
    }

    async fn get_room(&self, room_id: RoomId) -> Result<Option<Room>> {
        sqlx::query(
            r#"
            SELECT id, hotel_id, number, available, times_booked, created_at
            FROM rooms
            WHERE id = $1
            "#,
        )
        .bind(room_id.as_i64())
        .fetch_optional(&self.pool)
        .await?
        .map(Self::row_to_room)
        .transpose()
    }

    async fn set_room_available(&self, room_id: RoomId, available: bool) -> Result<Room> {
        let row = sqlx::query(
            r#"
            UPDATE rooms SET available = $2
            WHERE id = $1
            RETURNING id, hotel_id, number, available, times_booked, created_at
            "#,
        )
        .bind(room_id.as_i64())
        .bind(available)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(HotelError::RoomNotFound(room_id))?;

        Self::row_to_room(row)
    }

    async fn find_by_request_id(&self, request_id: RequestId) -> Result<Option<RoomReservation>> {
        sqlx::query(
            r#"
            SELECT id, room_id, booking_id, request_id, start_date, end_date, status, created_at, updated_at
            FROM room_reservations
            WHERE request_id = $1
            "#,
        )
        .bind(request_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?
        .map(Self::row_to_reservation)
        .transpose()
    }

    async fn find_by_booking_id(&self, booking_id: BookingId) -> Result<Option<RoomReservation>> {
        sqlx::query(
            r#"
            SELECT id, room_id, booking_id, request_id, start_date, end_date, status, created_at, updated_at
            FROM room_reservations
            WHERE booking_id = $1
            ORDER BY id DESC
            LIMIT 1
            "#,
        )
        .bind(booking_id.as_i64())
        .fetch_optional(&self.pool)
        .await?
        .map(Self::row_to_reservation)
        .transpose()
    }

    async fn reservations_for_room(&self, room_id: RoomId) -> Result<Vec<RoomReservation>> {
        let rows = sqlx::query(
            r#"
            SELECT id, room_id, booking_id, request_id, start_date, end_date, status, created_at, updated_at
            FROM room_reservations
            WHERE room_id = $1
            ORDER BY id ASC
            "#,
        )
        .bind(room_id.as_i64())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_reservation).collect()
    }

    async fn confirm(
        &self,
        room_id: RoomId,
        request: ReservationRequest,
    ) -> Result<ConfirmOutcome> {
        let mut tx = self.pool.begin().await?;

        let room = sqlx::query(
            r#"
            SELECT id, hotel_id, number, available, times_booked, created_at
            FROM rooms
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(room_id.as_i64())
        .fetch_optional(&mut *tx)
        .await?
        .map(Self::row_to_room)
        .transpose()?;

        let existing = sqlx::query(
            r#"
            SELECT id, room_id, booking_id, request_id, start_date, end_date, status, created_at, updated_at
            FROM room_reservations
            WHERE request_id = $1
            "#,
        )
        .bind(request.request_id.as_uuid())
        .fetch_optional(&mut *tx)
        .await?
        .map(Self::row_to_reservation)
        .transpose()?;

        let overlapping = sqlx::query(
            r#"
            SELECT id, room_id, booking_id, request_id, start_date, end_date, status, created_at, updated_at
            FROM room_reservations
            WHERE room_id = $1
              AND status <> 'RELEASED'
              AND start_date <= $3
              AND end_date >= $2
            "#,
        )
        .bind(room_id.as_i64())
        .bind(request.dates.start_date())
        .bind(request.dates.end_date())
        .fetch_all(&mut *tx)
        .await?
        .into_iter()
        .map(Self::row_to_reservation)
        .collect::<Result<Vec<_>>>()?;

        let plan = plan_confirm(
            existing,
            room_id,
            room.as_ref(),
            overlapping.iter(),
            &request.dates,
        )?;

        let status = match plan {
            ConfirmPlan::Replay(existing) => {
                tx.commit().await?;
                return Ok(ConfirmOutcome::Replayed(existing));
            }
            ConfirmPlan::Tombstone => ReservationStatus::Released,
            ConfirmPlan::Confirm => ReservationStatus::Confirmed,
        };

        let reservation = match Self::insert_reservation(&mut tx, room_id, &request, status).await
        {
            Err(e) if violates(&e, UNIQUE_REQUEST_ID) => {
                tx.rollback().await?;
                return self.replay(request.request_id).await;
            }
            other => other?,
        };

        if status == ReservationStatus::Released {
            tx.commit().await?;
            return Ok(ConfirmOutcome::Rejected(reservation));
        }

        let row = sqlx::query(
            r#"
            UPDATE rooms SET times_booked = times_booked + 1
            WHERE id = $1
            RETURNING id, hotel_id, number, available, times_booked, created_at
            "#,
        )
        .bind(room_id.as_i64())
        .fetch_one(&mut *tx)
        .await?;
        let room = Self::row_to_room(row)?;

        tx.commit().await?;
        Ok(ConfirmOutcome::Confirmed { reservation, room })
    }

    async fn release(&self, booking_id: BookingId) -> Result<ReleaseOutcome> {
        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query(
            r#"
            SELECT id, room_id, booking_id, request_id, start_date, end_date, status, created_at, updated_at
            FROM room_reservations
            WHERE booking_id = $1
            ORDER BY id DESC
            LIMIT 1
            FOR UPDATE
            "#,
        )
        .bind(booking_id.as_i64())
        .fetch_optional(&mut *tx)
        .await?
        .map(Self::row_to_reservation)
        .transpose()?;

        let outcome = match (plan_release(existing.as_ref()), existing) {
            (ReleasePlan::Release, Some(reservation)) => {
                let row = sqlx::query(
                    r#"
                    UPDATE room_reservations SET status = 'RELEASED', updated_at = NOW()
                    WHERE id = $1
                    RETURNING id, room_id, booking_id, request_id, start_date, end_date, status, created_at, updated_at
                    "#,
                )
                .bind(reservation.id.as_i64())
                .fetch_one(&mut *tx)
                .await?;
                ReleaseOutcome::Released(Self::row_to_reservation(row)?)
            }
            (ReleasePlan::AlreadyReleased, Some(reservation)) => {
                ReleaseOutcome::AlreadyReleased(reservation)
            }
            _ => ReleaseOutcome::NotFound,
        };

        tx.commit().await?;
        Ok(outcome)
    }

    async fn free_rooms(
        &self,
        hotel_id: Option<ResourceGroupId>,
        dates: DateRange,
    ) -> Result<Vec<Room>> {
        let rows = sqlx::query(
            r#"
            SELECT r.id, r.hotel_id, r.number, r.available, r.times_booked, r.created_at
            FROM rooms r
            WHERE r.available = TRUE
              AND ($1::BIGINT IS NULL OR r.hotel_id = $1)
              AND NOT EXISTS (
                  SELECT 1 FROM room_reservations rr
                  WHERE rr.room_id = r.id
                    AND rr.status <> 'RELEASED'
                    AND rr.start_date <= $3
                    AND rr.end_date >= $2
              )
            ORDER BY r.times_booked ASC, r.id ASC
            "#,
        )
        .bind(hotel_id.map(|id| id.as_i64()))
        .bind(dates.start_date())
        .bind(dates.end_date())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_room).collect()
    }
}
