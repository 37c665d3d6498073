use crate::error::AppError;

#[derive(Debug, thiserror::Error)]
pub enum PlaylistServiceError {
    #[error("playlist entry not found")]
    NotFound,

    #[error("playlist entry already removed")]
    AlreadyRemoved,
}

impl From<PlaylistServiceError> for AppError {
    fn from(err: PlaylistServiceError) -> Self {
        match err {
            PlaylistServiceError::NotFound => AppError::NotFound("playlist entry".to_string()),
            PlaylistServiceError::AlreadyRemoved => {
                AppError::Conflict("playlist entry already removed".to_string())
            }
        }
    }
}
