use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::Utc;
use rusqlite::Connection;
use serde::Deserialize;

use crabbit_shared::{CreatePost, EditPost, Paginated, Post, PostView, Submission};

use crate::error::ApiError;
use crate::{auth, store, views, AppState};

pub const TITLE_MAX: usize = 100;
pub const TEXT_SUBMISSION_MAX: usize = 40_000;

// ── Validation ──

fn is_valid_url(candidate: &str) -> bool {
    url::Url::parse(candidate)
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false)
}

/// Checks the submission payload against the declared post type and returns
/// the typed submission. The oversized-text case is its own error class,
/// distinct from plain validation.
fn validate_submission(payload: &CreatePost) -> Result<Submission, ApiError> {
    match payload.post_type.as_str() {
        "Text" => {
            let text = payload
                .text_submission
                .as_deref()
                .map(str::trim)
                .unwrap_or("");
            if text.is_empty() {
                return Err(ApiError::Validation(
                    "Text body needed for post type 'Text'.".into(),
                ));
            }
            if text.len() > TEXT_SUBMISSION_MAX {
                return Err(ApiError::PayloadTooLarge("Text submission too long".into()));
            }
            Ok(Submission::Text {
                text_submission: ammonia::clean(text),
            })
        }
        "Link" => {
            let link = payload
                .link_submission
                .as_deref()
                .map(str::trim)
                .unwrap_or("");
            if !is_valid_url(link) {
                return Err(ApiError::Validation(
                    "Valid URL needed for post type 'Link'.".into(),
                ));
            }
            Ok(Submission::Link {
                link_submission: link.to_string(),
            })
        }
        "Image" => {
            let image = payload
                .image_submission
                .as_deref()
                .map(str::trim)
                .unwrap_or("");
            if image.is_empty() {
                return Err(ApiError::Validation(
                    "Image is needed for type 'Image'.".into(),
                ));
            }
            Ok(Submission::Image {
                image_submission: image.to_string(),
            })
        }
        other => Err(ApiError::Validation(format!("Invalid post type '{other}'."))),
    }
}

fn validate_title(raw: &str) -> Result<String, ApiError> {
    let title = ammonia::clean(raw).trim().to_string();
    if title.is_empty() {
        return Err(ApiError::Validation("Title is required.".into()));
    }
    if title.len() > TITLE_MAX {
        return Err(ApiError::Validation(format!(
            "Title must be no longer than {TITLE_MAX} characters."
        )));
    }
    Ok(title)
}

// ── Core operations ──

/// Creates a post: resolves author and subreddit, validates the submission,
/// and writes all three aggregates in one transaction. The author starts
/// upvoting their own post and earns one point of post karma for it.
pub fn create_post(
    conn: &mut Connection,
    author_id: &str,
    payload: CreatePost,
) -> Result<Post, ApiError> {
    let tx = store::begin(conn)?;

    let mut author = store::find_user(&tx, author_id)?.ok_or_else(ApiError::user_not_found)?;
    let mut sub = store::find_subreddit(&tx, &payload.subreddit)?
        .ok_or_else(|| ApiError::subreddit_not_found(&payload.subreddit))?;

    let title = validate_title(&payload.title)?;
    let submission = validate_submission(&payload)?;

    let post = Post::new(title, submission, &author.id, &sub.id);
    author.posts.push(post.id.clone());
    author.karma_points.post_karma += 1;
    sub.posts.push(post.id.clone());

    store::save_post(&tx, &post)?;
    store::save_user(&tx, &author)?;
    store::save_subreddit(&tx, &sub)?;
    tx.commit()?;
    Ok(post)
}

/// Edits a text post's body. Author-only; link and image posts cannot be
/// edited.
pub fn edit_post(
    conn: &mut Connection,
    post_id: &str,
    requester_id: &str,
    new_text: &str,
) -> Result<Post, ApiError> {
    let tx = store::begin(conn)?;

    let mut post =
        store::find_post(&tx, post_id)?.ok_or_else(|| ApiError::post_not_found(post_id))?;
    let user = store::find_user(&tx, requester_id)?.ok_or_else(ApiError::user_not_found)?;
    if post.author != user.id {
        return Err(ApiError::access_denied());
    }

    let text = ammonia::clean(new_text.trim());
    if text.trim().is_empty() {
        return Err(ApiError::Validation(
            "Text body needed for post type 'Text'.".into(),
        ));
    }
    if text.len() > TEXT_SUBMISSION_MAX {
        return Err(ApiError::PayloadTooLarge("Text submission too long".into()));
    }

    match &mut post.submission {
        Submission::Text { text_submission } => *text_submission = text,
        _ => {
            return Err(ApiError::Validation(
                "Only text posts can be edited.".into(),
            ))
        }
    }
    post.updated_at = Utc::now();

    store::save_post(&tx, &post)?;
    tx.commit()?;
    Ok(post)
}

/// Deletes a post and cascades the reference removal to the author's and
/// subreddit's post lists. Karma earned from the post is deliberately left
/// in place.
pub fn delete_post(conn: &mut Connection, post_id: &str, requester_id: &str) -> Result<(), ApiError> {
    let tx = store::begin(conn)?;

    let post = store::find_post(&tx, post_id)?.ok_or_else(|| ApiError::post_not_found(post_id))?;
    let mut user = store::find_user(&tx, requester_id)?.ok_or_else(ApiError::user_not_found)?;
    if post.author != user.id {
        return Err(ApiError::access_denied());
    }

    user.posts.retain(|id| id != post_id);
    store::save_user(&tx, &user)?;

    if let Some(mut sub) = store::find_subreddit(&tx, &post.subreddit)? {
        sub.posts.retain(|id| id != post_id);
        store::save_subreddit(&tx, &sub)?;
    }

    store::delete_post(&tx, post_id)?;
    tx.commit()?;
    Ok(())
}

// ── Handlers ──

#[derive(Deserialize)]
pub struct ListParams {
    sortby: Option<String>,
    page: Option<i64>,
    limit: Option<i64>,
}

/// GET /api/posts?sortby=hot&page=1&limit=25
pub async fn list_posts(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Paginated<PostView>>, ApiError> {
    let sortby = params.sortby.unwrap_or_else(|| "hot".to_string());
    let page = params.page.unwrap_or(1);
    let limit = params.limit.unwrap_or(25);
    if page < 1 || limit < 1 || limit > 100 {
        return Err(ApiError::Validation(
            "Invalid page or limit query parameters.".into(),
        ));
    }

    let result = store::with_conn(state.db.clone(), move |conn| {
        let (posts, total) = store::list_posts(conn, &sortby, page, limit)?;
        let items = posts
            .iter()
            .map(|p| views::post_view(conn, p))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Paginated {
            items,
            total,
            page,
            per_page: limit,
        })
    })
    .await?;

    Ok(Json(result))
}

/// GET /api/posts/{id}
pub async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PostView>, ApiError> {
    let view = store::with_conn(state.db.clone(), move |conn| {
        let post = store::find_post(conn, &id)?.ok_or_else(|| ApiError::post_not_found(&id))?;
        views::post_view(conn, &post)
    })
    .await?;
    Ok(Json(view))
}

/// POST /api/posts
pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CreatePost>,
) -> Result<(StatusCode, Json<PostView>), ApiError> {
    let author_id = auth::extract_user_id(&headers, &state.jwt_secret)?;

    let view = store::with_conn(state.db.clone(), move |conn| {
        let post = create_post(conn, &author_id, payload)?;
        views::post_view(conn, &post)
    })
    .await?;

    tracing::info!(post = %view.id, "post created");
    Ok((StatusCode::CREATED, Json(view)))
}

/// PATCH /api/posts/{id}
pub async fn edit(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(payload): Json<EditPost>,
) -> Result<Json<PostView>, ApiError> {
    let requester = auth::extract_user_id(&headers, &state.jwt_secret)?;

    let view = store::with_conn(state.db.clone(), move |conn| {
        let post = edit_post(conn, &id, &requester, &payload.text_submission)?;
        views::post_view(conn, &post)
    })
    .await?;
    Ok(Json(view))
}

/// DELETE /api/posts/{id}
pub async fn delete(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let requester = auth::extract_user_id(&headers, &state.jwt_secret)?;

    store::with_conn(state.db.clone(), move |conn| {
        delete_post(conn, &id, &requester)
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}
