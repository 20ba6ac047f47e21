use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use rusqlite::Connection;

use crabbit_shared::{
    CreateSubreddit, Subreddit, SubredditInfo, SubredditView, SubscriptionState, UserInfo,
};

use crate::error::ApiError;
use crate::{auth, store, views, AppState};

fn valid_subreddit_name(name: &str) -> bool {
    (3..=21).contains(&name.len())
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn subreddit_view(conn: &Connection, sub: &Subreddit) -> Result<SubredditView, ApiError> {
    let admin_name = store::find_user(conn, &sub.admin)?.map(|u| u.username);
    let mut posts = Vec::with_capacity(sub.posts.len());
    for post_id in &sub.posts {
        if let Some(post) = store::find_post(conn, post_id)? {
            posts.push(views::post_view(conn, &post)?);
        }
    }
    Ok(SubredditView {
        id: sub.id.clone(),
        subreddit_name: sub.subreddit_name.clone(),
        description: sub.description.clone(),
        admin: UserInfo {
            id: sub.admin.clone(),
            username: admin_name.unwrap_or_else(|| "[deleted]".into()),
        },
        subscriber_count: sub.subscribed_by.len(),
        posts,
        created_at: sub.created_at,
    })
}

// ── Core operations ──

pub fn create_subreddit(
    conn: &mut Connection,
    creator_id: &str,
    payload: CreateSubreddit,
) -> Result<Subreddit, ApiError> {
    let name = payload.subreddit_name.trim();
    if !valid_subreddit_name(name) {
        return Err(ApiError::Validation(
            "Invalid subreddit name. Only 3-21 letters, numbers, and underscores are allowed."
                .into(),
        ));
    }
    let description = ammonia::clean(payload.description.trim());
    if description.is_empty() {
        return Err(ApiError::Validation("Description is required.".into()));
    }

    let tx = store::begin(conn)?;
    let mut creator =
        store::find_user(&tx, creator_id)?.ok_or_else(ApiError::user_not_found)?;

    let mut sub = Subreddit::new(name.to_string(), description, creator.id.clone());
    // The creator starts out subscribed to their own community.
    sub.toggle_subscription(&creator.id);
    creator.subscribed_subs.push(sub.id.clone());

    store::insert_subreddit(&tx, &sub)?;
    store::save_user(&tx, &creator)?;
    tx.commit()?;
    Ok(sub)
}

/// Flips the requester's subscription on both the subreddit's and the
/// user's side, returning whether they are now subscribed.
pub fn toggle_subscription(
    conn: &mut Connection,
    subreddit_id: &str,
    user_id: &str,
) -> Result<bool, ApiError> {
    let tx = store::begin(conn)?;

    let mut sub = store::find_subreddit(&tx, subreddit_id)?
        .ok_or_else(|| ApiError::subreddit_not_found(subreddit_id))?;
    let mut user = store::find_user(&tx, user_id)?.ok_or_else(ApiError::user_not_found)?;

    let subscribed = sub.toggle_subscription(&user.id);
    if subscribed {
        user.subscribed_subs.push(sub.id.clone());
    } else {
        user.subscribed_subs.retain(|id| id != &sub.id);
    }

    store::save_subreddit(&tx, &sub)?;
    store::save_user(&tx, &user)?;
    tx.commit()?;
    Ok(subscribed)
}

// ── Handlers ──

/// GET /api/subreddits
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<SubredditInfo>>, ApiError> {
    let subs = store::with_conn(state.db.clone(), |conn| store::list_subreddits(conn)).await?;
    Ok(Json(subs))
}

/// POST /api/subreddits
pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CreateSubreddit>,
) -> Result<(StatusCode, Json<SubredditView>), ApiError> {
    let creator = auth::extract_user_id(&headers, &state.jwt_secret)?;

    let view = store::with_conn(state.db.clone(), move |conn| {
        let sub = create_subreddit(conn, &creator, payload)?;
        subreddit_view(conn, &sub)
    })
    .await?;

    tracing::info!(subreddit = %view.subreddit_name, "subreddit created");
    Ok((StatusCode::CREATED, Json(view)))
}

/// GET /api/subreddits/r/{name}
pub async fn get_by_name(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<SubredditView>, ApiError> {
    let view = store::with_conn(state.db.clone(), move |conn| {
        let sub = store::find_subreddit_by_name(conn, &name)?.ok_or_else(|| {
            ApiError::NotFound(format!(
                "Subreddit with name: '{name}' does not exist in database."
            ))
        })?;
        subreddit_view(conn, &sub)
    })
    .await?;
    Ok(Json(view))
}

/// POST /api/subreddits/{id}/subscribe
pub async fn subscribe(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<SubscriptionState>, ApiError> {
    let user = auth::extract_user_id(&headers, &state.jwt_secret)?;

    let subscribed = store::with_conn(state.db.clone(), move |conn| {
        toggle_subscription(conn, &id, &user)
    })
    .await?;

    Ok(Json(SubscriptionState { subscribed }))
}
