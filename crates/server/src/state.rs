use sea_orm::DatabaseConnection;
use storage::Uploader;

/// Handles shared by every request
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub uploader: Uploader,
}
