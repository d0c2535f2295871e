use common::{DateRangeError, ResourceGroupId, RoomId};
use thiserror::Error;

/// Errors that can occur on the hotel side.
#[derive(Debug, Error)]
pub enum HotelError {
    /// No room exists with this ID.
    #[error("Room not found with ID: {0}")]
    RoomNotFound(RoomId),

    /// The room is out of service and can never be booked.
    #[error("Room is not available: {0}")]
    RoomNotOperational(RoomId),

    /// The requested stay is malformed.
    #[error("{0}")]
    InvalidDateRange(#[from] DateRangeError),

    /// A room with this number already exists in the group.
    #[error("Room with number '{number}' already exists in hotel with ID {hotel_id}")]
    DuplicateRoomNumber {
        hotel_id: ResourceGroupId,
        number: String,
    },

    /// A stored value could not be interpreted.
    #[error("Corrupt record: {0}")]
    CorruptRecord(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for hotel operations.
pub type Result<T> = std::result::Result<T, HotelError>;
