use axum::{
    extract::{Path, State},
    Json,
};

use crabbit_shared::UserProfile;

use crate::error::ApiError;
use crate::{store, AppState};

/// GET /api/users/{username}. Public profile, looked up case-insensitively.
pub async fn get_profile(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<UserProfile>, ApiError> {
    let profile = store::with_conn(state.db.clone(), move |conn| {
        let user = store::find_user_by_username(conn, &username)?
            .ok_or_else(ApiError::user_not_found)?;
        Ok(UserProfile {
            id: user.id,
            username: user.username,
            karma_points: user.karma_points,
            total_comments: user.total_comments,
            post_count: user.posts.len(),
            created_at: user.created_at,
        })
    })
    .await?;
    Ok(Json(profile))
}
