pub mod flags;
pub mod models;

pub use models::{
    Channel, MediaCoordinates, MediaItem, MediaKind, MediaPayload, Message, Timestamp,
};
