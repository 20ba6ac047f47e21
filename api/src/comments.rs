use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::Utc;
use rusqlite::Connection;

use crabbit_shared::{CommentView, CreateComment, CreateReply, Post};

use crate::error::ApiError;
use crate::{auth, store, views, AppState};

fn clean_body(raw: &str, empty_message: &str) -> Result<String, ApiError> {
    let body = ammonia::clean(raw.trim());
    if body.trim().is_empty() {
        return Err(ApiError::Validation(empty_message.into()));
    }
    Ok(body)
}

// ── Core operations ──
//
// The body is validated before any lookup; after that the entity chain
// resolves in order (post, user, comment, reply) and short-circuits with a
// NotFound naming whichever link is missing. Mutations write the post
// aggregate (and the author for creations) in one transaction.

pub fn add_comment(
    conn: &mut Connection,
    post_id: &str,
    author_id: &str,
    body: &str,
) -> Result<Post, ApiError> {
    let body = clean_body(body, "Comment body needed.")?;
    let tx = store::begin(conn)?;

    let mut post =
        store::find_post(&tx, post_id)?.ok_or_else(|| ApiError::post_not_found(post_id))?;
    let mut user = store::find_user(&tx, author_id)?.ok_or_else(ApiError::user_not_found)?;

    post.add_comment(&user.id, body);
    // Commenting earns a karma point (the self-upvote) and counts toward
    // the author's lifetime total.
    user.karma_points.comment_karma += 1;
    user.total_comments += 1;

    store::save_post(&tx, &post)?;
    store::save_user(&tx, &user)?;
    tx.commit()?;
    Ok(post)
}

pub fn update_comment(
    conn: &mut Connection,
    post_id: &str,
    comment_id: &str,
    requester_id: &str,
    body: &str,
) -> Result<Post, ApiError> {
    let body = clean_body(body, "Comment body needed.")?;
    let tx = store::begin(conn)?;

    let mut post =
        store::find_post(&tx, post_id)?.ok_or_else(|| ApiError::post_not_found(post_id))?;
    let user = store::find_user(&tx, requester_id)?.ok_or_else(ApiError::user_not_found)?;
    let comment = post
        .comment_mut(comment_id)
        .ok_or_else(|| ApiError::comment_not_found(comment_id))?;
    if comment.commented_by != user.id {
        return Err(ApiError::access_denied());
    }

    comment.comment_body = body;
    comment.updated_at = Utc::now();

    store::save_post(&tx, &post)?;
    tx.commit()?;
    Ok(post)
}

pub fn delete_comment(
    conn: &mut Connection,
    post_id: &str,
    comment_id: &str,
    requester_id: &str,
) -> Result<(), ApiError> {
    let tx = store::begin(conn)?;

    let mut post =
        store::find_post(&tx, post_id)?.ok_or_else(|| ApiError::post_not_found(post_id))?;
    let user = store::find_user(&tx, requester_id)?.ok_or_else(ApiError::user_not_found)?;
    let comment = post
        .comment(comment_id)
        .ok_or_else(|| ApiError::comment_not_found(comment_id))?;
    if comment.commented_by != user.id {
        return Err(ApiError::access_denied());
    }

    post.remove_comment(comment_id);
    store::save_post(&tx, &post)?;
    tx.commit()?;
    Ok(())
}

pub fn add_reply(
    conn: &mut Connection,
    post_id: &str,
    comment_id: &str,
    author_id: &str,
    body: &str,
) -> Result<Post, ApiError> {
    let body = clean_body(body, "Reply body needed.")?;
    let tx = store::begin(conn)?;

    let mut post =
        store::find_post(&tx, post_id)?.ok_or_else(|| ApiError::post_not_found(post_id))?;
    let mut user = store::find_user(&tx, author_id)?.ok_or_else(ApiError::user_not_found)?;

    post.add_reply(comment_id, &user.id, body)
        .ok_or_else(|| ApiError::comment_not_found(comment_id))?;
    user.karma_points.comment_karma += 1;
    user.total_comments += 1;

    store::save_post(&tx, &post)?;
    store::save_user(&tx, &user)?;
    tx.commit()?;
    Ok(post)
}

pub fn update_reply(
    conn: &mut Connection,
    post_id: &str,
    comment_id: &str,
    reply_id: &str,
    requester_id: &str,
    body: &str,
) -> Result<Post, ApiError> {
    let body = clean_body(body, "Reply body needed.")?;
    let tx = store::begin(conn)?;

    let mut post =
        store::find_post(&tx, post_id)?.ok_or_else(|| ApiError::post_not_found(post_id))?;
    let user = store::find_user(&tx, requester_id)?.ok_or_else(ApiError::user_not_found)?;
    let comment = post
        .comment_mut(comment_id)
        .ok_or_else(|| ApiError::comment_not_found(comment_id))?;
    let reply = comment
        .reply_mut(reply_id)
        .ok_or_else(|| ApiError::reply_not_found(reply_id))?;
    // Authorization is against the reply's author, not the parent comment's.
    if reply.replied_by != user.id {
        return Err(ApiError::access_denied());
    }

    reply.reply_body = body;
    reply.updated_at = Utc::now();

    store::save_post(&tx, &post)?;
    tx.commit()?;
    Ok(post)
}

pub fn delete_reply(
    conn: &mut Connection,
    post_id: &str,
    comment_id: &str,
    reply_id: &str,
    requester_id: &str,
) -> Result<(), ApiError> {
    let tx = store::begin(conn)?;

    let mut post =
        store::find_post(&tx, post_id)?.ok_or_else(|| ApiError::post_not_found(post_id))?;
    let user = store::find_user(&tx, requester_id)?.ok_or_else(ApiError::user_not_found)?;
    let comment = post
        .comment(comment_id)
        .ok_or_else(|| ApiError::comment_not_found(comment_id))?;
    let reply = comment
        .reply(reply_id)
        .ok_or_else(|| ApiError::reply_not_found(reply_id))?;
    if reply.replied_by != user.id {
        return Err(ApiError::access_denied());
    }

    post.remove_reply(comment_id, reply_id);
    store::save_post(&tx, &post)?;
    tx.commit()?;
    Ok(())
}

// ── Handlers ──

/// POST /api/posts/{id}/comment. Returns the updated comment list with
/// author identity populated.
pub async fn create_comment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(payload): Json<CreateComment>,
) -> Result<(StatusCode, Json<Vec<CommentView>>), ApiError> {
    let author = auth::extract_user_id(&headers, &state.jwt_secret)?;

    let comments = store::with_conn(state.db.clone(), move |conn| {
        let post = add_comment(conn, &id, &author, &payload.comment)?;
        views::comment_views(conn, &post.comments)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(comments)))
}

/// PATCH /api/posts/{id}/comment/{commentId}
pub async fn edit_comment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((id, comment_id)): Path<(String, String)>,
    Json(payload): Json<CreateComment>,
) -> Result<Json<Vec<CommentView>>, ApiError> {
    let requester = auth::extract_user_id(&headers, &state.jwt_secret)?;

    let comments = store::with_conn(state.db.clone(), move |conn| {
        let post = update_comment(conn, &id, &comment_id, &requester, &payload.comment)?;
        views::comment_views(conn, &post.comments)
    })
    .await?;

    Ok(Json(comments))
}

/// DELETE /api/posts/{id}/comment/{commentId}
pub async fn remove_comment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((id, comment_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let requester = auth::extract_user_id(&headers, &state.jwt_secret)?;

    store::with_conn(state.db.clone(), move |conn| {
        delete_comment(conn, &id, &comment_id, &requester)
    })
    .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/posts/{id}/comment/{commentId}/reply
pub async fn create_reply(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((id, comment_id)): Path<(String, String)>,
    Json(payload): Json<CreateReply>,
) -> Result<(StatusCode, Json<Vec<CommentView>>), ApiError> {
    let author = auth::extract_user_id(&headers, &state.jwt_secret)?;

    let comments = store::with_conn(state.db.clone(), move |conn| {
        let post = add_reply(conn, &id, &comment_id, &author, &payload.reply)?;
        views::comment_views(conn, &post.comments)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(comments)))
}

/// PATCH /api/posts/{id}/comment/{commentId}/reply/{replyId}
pub async fn edit_reply(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((id, comment_id, reply_id)): Path<(String, String, String)>,
    Json(payload): Json<CreateReply>,
) -> Result<Json<Vec<CommentView>>, ApiError> {
    let requester = auth::extract_user_id(&headers, &state.jwt_secret)?;

    let comments = store::with_conn(state.db.clone(), move |conn| {
        let post = update_reply(conn, &id, &comment_id, &reply_id, &requester, &payload.reply)?;
        views::comment_views(conn, &post.comments)
    })
    .await?;

    Ok(Json(comments))
}

/// DELETE /api/posts/{id}/comment/{commentId}/reply/{replyId}
pub async fn remove_reply(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((id, comment_id, reply_id)): Path<(String, String, String)>,
) -> Result<StatusCode, ApiError> {
    let requester = auth::extract_user_id(&headers, &state.jwt_secret)?;

    store::with_conn(state.db.clone(), move |conn| {
        delete_reply(conn, &id, &comment_id, &reply_id, &requester)
    })
    .await?;

    Ok(StatusCode::NO_CONTENT)
}
