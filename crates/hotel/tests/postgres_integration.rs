//! PostgreSQL integration tests
//!
//! These tests use a shared PostgreSQL container for efficiency.
//! Run with:
//!
//! ```bash
//! cargo test -p hotel --test postgres_integration
//! ```

use std::sync::Arc;

use chrono::NaiveDate;
use common::{BookingId, DateRange, RequestId, ResourceGroupId, RoomId};
use futures_util::future::join_all;
use hotel::{
    ConfirmOutcome, HotelError, HotelStore, NewRoom, PostgresHotelStore, ReleaseOutcome,
    ReservationRequest, ReservationStatus,
};
use serial_test::serial;
use sqlx::PgPool;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let temp_pool = PgPool::connect(&connection_string).await.unwrap();
            sqlx::raw_sql(include_str!(
                "../../../migrations/hotel/001_create_hotel_tables.sql"
            ))
            .execute(&temp_pool)
            .await
            .unwrap();
            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh store with its own pool and cleared tables
async fn get_test_store() -> PostgresHotelStore {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(10)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query("TRUNCATE TABLE room_reservations, rooms RESTART IDENTITY")
        .execute(&pool)
        .await
        .unwrap();

    PostgresHotelStore::new(pool)
}

fn dates(start: u32, end: u32) -> DateRange {
    DateRange::new(
        NaiveDate::from_ymd_opt(2025, 1, start).unwrap(),
        NaiveDate::from_ymd_opt(2025, 1, end).unwrap(),
    )
    .unwrap()
}

fn attempt(booking_id: i64, range: DateRange) -> ReservationRequest {
    ReservationRequest {
        request_id: RequestId::new(),
        booking_id: BookingId::new(booking_id),
        dates: range,
    }
}

#[tokio::test]
#[serial]
async fn insert_and_fetch_room() {
    let store = get_test_store().await;
    let room = store
        .insert_room(NewRoom::new(ResourceGroupId::new(1), "101").with_times_booked(4))
        .await
        .unwrap();

    let fetched = store.get_room(room.id).await.unwrap().unwrap();
    assert_eq!(fetched.number, "101");
    assert_eq!(fetched.times_booked, 4);
    assert!(fetched.available);

    assert!(store.get_room(RoomId::new(999)).await.unwrap().is_none());
}

#[tokio::test]
#[serial]
async fn duplicate_room_number_maps_to_domain_error() {
    let store = get_test_store().await;
    store
        .insert_room(NewRoom::new(ResourceGroupId::new(1), "101"))
        .await
        .unwrap();
    let err = store
        .insert_room(NewRoom::new(ResourceGroupId::new(1), "101"))
        .await
        .unwrap_err();
    assert!(matches!(err, HotelError::DuplicateRoomNumber { .. }));
}

#[tokio::test]
#[serial]
async fn confirm_replay_and_tombstone() {
    let store = get_test_store().await;
    let room = store
        .insert_room(NewRoom::new(ResourceGroupId::new(1), "101"))
        .await
        .unwrap();

    let request = attempt(1, dates(5, 7));
    let first = store.confirm(room.id, request).await.unwrap();
    let ConfirmOutcome::Confirmed { reservation, room: updated } = first else {
        panic!("expected confirmation, got {first:?}");
    };
    assert_eq!(reservation.status, ReservationStatus::Confirmed);
    assert_eq!(updated.times_booked, 1);

    let replay = store.confirm(room.id, request).await.unwrap();
    assert_eq!(replay, ConfirmOutcome::Replayed(reservation));

    let refused = store.confirm(room.id, attempt(2, dates(7, 10))).await.unwrap();
    assert!(matches!(
        refused,
        ConfirmOutcome::Rejected(ref r) if r.status == ReservationStatus::Released
    ));

    let rows = store.reservations_for_room(room.id).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(
        store.get_room(room.id).await.unwrap().unwrap().times_booked,
        1
    );
}

#[tokio::test]
#[serial]
async fn out_of_service_room_is_refused() {
    let store = get_test_store().await;
    let room = store
        .insert_room(NewRoom::new(ResourceGroupId::new(1), "101"))
        .await
        .unwrap();
    store.set_room_available(room.id, false).await.unwrap();

    let err = store
        .confirm(room.id, attempt(1, dates(5, 7)))
        .await
        .unwrap_err();
    assert!(matches!(err, HotelError::RoomNotOperational(_)));
}

#[tokio::test]
#[serial]
async fn concurrent_confirms_never_double_book() {
    let store = get_test_store().await;
    let room = store
        .insert_room(NewRoom::new(ResourceGroupId::new(1), "101"))
        .await
        .unwrap();

    let room_id = room.id;
    let attempts = (1..=8).map(|booking| {
        let store = store.clone();
        async move { store.confirm(room_id, attempt(booking, dates(10, 14))).await }
    });
    let outcomes = join_all(attempts).await;

    let confirmed = outcomes
        .iter()
        .filter(|o| matches!(o, Ok(ConfirmOutcome::Confirmed { .. })))
        .count();
    assert_eq!(confirmed, 1);

    let active = store
        .reservations_for_room(room.id)
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.is_active())
        .count();
    assert_eq!(active, 1);
}

#[tokio::test]
#[serial]
async fn release_latest_and_rank_free_rooms() {
    let store = get_test_store().await;
    let hotel = ResourceGroupId::new(1);
    let busy = store
        .insert_room(NewRoom::new(hotel, "101").with_times_booked(5))
        .await
        .unwrap();
    let quiet = store
        .insert_room(NewRoom::new(hotel, "102").with_times_booked(2))
        .await
        .unwrap();
    let also_busy = store
        .insert_room(NewRoom::new(hotel, "103").with_times_booked(5))
        .await
        .unwrap();

    let ranked = store.free_rooms(Some(hotel), dates(1, 3)).await.unwrap();
    let ids: Vec<_> = ranked.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![quiet.id, busy.id, also_busy.id]);

    store.confirm(quiet.id, attempt(7, dates(1, 3))).await.unwrap();
    let ranked = store.free_rooms(Some(hotel), dates(2, 4)).await.unwrap();
    assert!(ranked.iter().all(|r| r.id != quiet.id));

    let released = store.release(BookingId::new(7)).await.unwrap();
    assert!(matches!(released, ReleaseOutcome::Released(_)));
    assert!(matches!(
        store.release(BookingId::new(7)).await.unwrap(),
        ReleaseOutcome::AlreadyReleased(_)
    ));
    assert_eq!(
        store.release(BookingId::new(8)).await.unwrap(),
        ReleaseOutcome::NotFound
    );

    let ranked = store.free_rooms(None, dates(2, 4)).await.unwrap();
    assert_eq!(ranked.len(), 3);
}
