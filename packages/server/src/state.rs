use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::vault::Vault;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: AppConfig,
    pub vault: Vault,
}
