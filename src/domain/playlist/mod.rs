pub mod error;
pub mod service;

pub use error::PlaylistServiceError;
pub use service::{PlaylistEntry, PlaylistService};
