use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::share::{self, TargetType, Visibility};
use crate::error::AppError;
use crate::vault::ShareRequest;

/// Request body for sharing a file or folder.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct ShareBody {
    /// `PUBLIC` lists the target in the public gallery; `PRIVATE` only
    /// makes it reachable through the token.
    pub visibility: Visibility,
    /// Optional expiry. Must lie in the future. Defaults to the server's
    /// share TTL, or no expiry when that is zero.
    pub expires_at: Option<DateTime<Utc>>,
}

impl ShareBody {
    pub fn into_request(self, now: DateTime<Utc>) -> Result<ShareRequest, AppError> {
        if let Some(expires_at) = self.expires_at
            && expires_at <= now
        {
            return Err(AppError::Validation(
                "expires_at must be in the future".into(),
            ));
        }
        Ok(ShareRequest {
            visibility: self.visibility,
            expires_at: self.expires_at,
        })
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ShareResponse {
    pub target_type: TargetType,
    pub target_id: String,
    pub visibility: Visibility,
    /// Bearer token for the unauthenticated download link.
    #[schema(example = "Qm3v8ZkT0pL2xR7aN5cW1yH4sJ6dE9fB")]
    pub token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    /// Whether the share has already lapsed.
    pub expired: bool,
}

impl From<share::Model> for ShareResponse {
    fn from(m: share::Model) -> Self {
        let expired = m.is_expired_at(Utc::now());
        Self {
            target_type: m.target_type,
            target_id: m.target_id.to_string(),
            visibility: m.visibility,
            token: m.token,
            expires_at: m.expires_at,
            created_at: m.created_at,
            expired,
        }
    }
}
