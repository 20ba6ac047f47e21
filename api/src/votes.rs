use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
};
use rusqlite::Connection;

use crabbit_shared::VoteDirection;

use crate::error::ApiError;
use crate::{auth, store, AppState};

// ── Core operations ──
//
// Each vote resolves its entity chain in a fixed order (post, voter, then
// comment/reply, then the content owner), toggles the voter's membership,
// applies the ±1 karma delta to the owner, and saves the post aggregate and
// the owner in one transaction. Posts additionally rerun the ranking scorer.

pub fn vote_post(
    conn: &mut Connection,
    post_id: &str,
    voter_id: &str,
    direction: VoteDirection,
) -> Result<(), ApiError> {
    let tx = store::begin(conn)?;

    let mut post =
        store::find_post(&tx, post_id)?.ok_or_else(|| ApiError::post_not_found(post_id))?;
    if store::find_user(&tx, voter_id)?.is_none() {
        return Err(ApiError::user_not_found());
    }
    let mut owner = store::find_user(&tx, &post.author)?.ok_or_else(ApiError::author_not_found)?;

    let delta = post.votes.toggle(direction, voter_id);
    owner.karma_points.post_karma += delta;
    post.rescore();

    store::save_post(&tx, &post)?;
    store::save_user(&tx, &owner)?;
    tx.commit()?;
    Ok(())
}

pub fn vote_comment(
    conn: &mut Connection,
    post_id: &str,
    comment_id: &str,
    voter_id: &str,
    direction: VoteDirection,
) -> Result<(), ApiError> {
    let tx = store::begin(conn)?;

    let mut post =
        store::find_post(&tx, post_id)?.ok_or_else(|| ApiError::post_not_found(post_id))?;
    if store::find_user(&tx, voter_id)?.is_none() {
        return Err(ApiError::user_not_found());
    }
    let comment = post
        .comment_mut(comment_id)
        .ok_or_else(|| ApiError::comment_not_found(comment_id))?;
    let mut owner = store::find_user(&tx, &comment.commented_by.clone())?
        .ok_or_else(ApiError::comment_author_not_found)?;

    let delta = comment.votes.toggle(direction, voter_id);
    comment.points_count = comment.votes.points_count();
    owner.karma_points.comment_karma += delta;

    store::save_post(&tx, &post)?;
    store::save_user(&tx, &owner)?;
    tx.commit()?;
    Ok(())
}

pub fn vote_reply(
    conn: &mut Connection,
    post_id: &str,
    comment_id: &str,
    reply_id: &str,
    voter_id: &str,
    direction: VoteDirection,
) -> Result<(), ApiError> {
    let tx = store::begin(conn)?;

    let mut post =
        store::find_post(&tx, post_id)?.ok_or_else(|| ApiError::post_not_found(post_id))?;
    if store::find_user(&tx, voter_id)?.is_none() {
        return Err(ApiError::user_not_found());
    }
    let comment = post
        .comment_mut(comment_id)
        .ok_or_else(|| ApiError::comment_not_found(comment_id))?;
    let reply = comment
        .reply_mut(reply_id)
        .ok_or_else(|| ApiError::reply_not_found(reply_id))?;
    let mut owner = store::find_user(&tx, &reply.replied_by.clone())?
        .ok_or_else(ApiError::reply_author_not_found)?;

    let delta = reply.votes.toggle(direction, voter_id);
    reply.points_count = reply.votes.points_count();
    owner.karma_points.comment_karma += delta;

    store::save_post(&tx, &post)?;
    store::save_user(&tx, &owner)?;
    tx.commit()?;
    Ok(())
}

// ── Handlers ──

async fn post_vote_handler(
    state: AppState,
    headers: HeaderMap,
    post_id: String,
    direction: VoteDirection,
) -> Result<StatusCode, ApiError> {
    let voter = auth::extract_user_id(&headers, &state.jwt_secret)?;
    store::with_conn(state.db.clone(), move |conn| {
        vote_post(conn, &post_id, &voter, direction)
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/posts/{id}/upvote
pub async fn upvote_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    post_vote_handler(state, headers, id, VoteDirection::Up).await
}

/// POST /api/posts/{id}/downvote
pub async fn downvote_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    post_vote_handler(state, headers, id, VoteDirection::Down).await
}

async fn comment_vote_handler(
    state: AppState,
    headers: HeaderMap,
    post_id: String,
    comment_id: String,
    direction: VoteDirection,
) -> Result<StatusCode, ApiError> {
    let voter = auth::extract_user_id(&headers, &state.jwt_secret)?;
    store::with_conn(state.db.clone(), move |conn| {
        vote_comment(conn, &post_id, &comment_id, &voter, direction)
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/posts/{id}/comment/{commentId}/upvote
pub async fn upvote_comment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((id, comment_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    comment_vote_handler(state, headers, id, comment_id, VoteDirection::Up).await
}

/// POST /api/posts/{id}/comment/{commentId}/downvote
pub async fn downvote_comment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((id, comment_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    comment_vote_handler(state, headers, id, comment_id, VoteDirection::Down).await
}

async fn reply_vote_handler(
    state: AppState,
    headers: HeaderMap,
    post_id: String,
    comment_id: String,
    reply_id: String,
    direction: VoteDirection,
) -> Result<StatusCode, ApiError> {
    let voter = auth::extract_user_id(&headers, &state.jwt_secret)?;
    store::with_conn(state.db.clone(), move |conn| {
        vote_reply(conn, &post_id, &comment_id, &reply_id, &voter, direction)
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/posts/{id}/comment/{commentId}/reply/{replyId}/upvote
pub async fn upvote_reply(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((id, comment_id, reply_id)): Path<(String, String, String)>,
) -> Result<StatusCode, ApiError> {
    reply_vote_handler(state, headers, id, comment_id, reply_id, VoteDirection::Up).await
}

/// POST /api/posts/{id}/comment/{commentId}/reply/{replyId}/downvote
pub async fn downvote_reply(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((id, comment_id, reply_id)): Path<(String, String, String)>,
) -> Result<StatusCode, ApiError> {
    reply_vote_handler(state, headers, id, comment_id, reply_id, VoteDirection::Down).await
}
