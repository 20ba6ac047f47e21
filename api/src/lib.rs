pub mod auth;
pub mod comments;
pub mod db;
pub mod error;
pub mod posts;
pub mod store;
pub mod subreddits;
pub mod users;
pub mod views;
pub mod votes;

use axum::{
    routing::{get, patch, post},
    Router,
};

pub type DbPool = r2d2::Pool<r2d2_sqlite::SqliteConnectionManager>;

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub jwt_secret: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(|| async { "ok" }))
        // Auth
        .route("/api/auth/signup", post(auth::signup))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/me", get(auth::me))
        // Users
        .route("/api/users/{username}", get(users::get_profile))
        // Subreddits
        .route(
            "/api/subreddits",
            get(subreddits::list).post(subreddits::create),
        )
        .route("/api/subreddits/r/{name}", get(subreddits::get_by_name))
        .route("/api/subreddits/{id}/subscribe", post(subreddits::subscribe))
        // Posts
        .route("/api/posts", get(posts::list_posts).post(posts::create))
        .route(
            "/api/posts/{id}",
            get(posts::get_post)
                .patch(posts::edit)
                .delete(posts::delete),
        )
        .route("/api/posts/{id}/upvote", post(votes::upvote_post))
        .route("/api/posts/{id}/downvote", post(votes::downvote_post))
        // Comments
        .route("/api/posts/{id}/comment", post(comments::create_comment))
        .route(
            "/api/posts/{id}/comment/{commentId}",
            patch(comments::edit_comment).delete(comments::remove_comment),
        )
        .route(
            "/api/posts/{id}/comment/{commentId}/upvote",
            post(votes::upvote_comment),
        )
        .route(
            "/api/posts/{id}/comment/{commentId}/downvote",
            post(votes::downvote_comment),
        )
        // Replies
        .route(
            "/api/posts/{id}/comment/{commentId}/reply",
            post(comments::create_reply),
        )
        .route(
            "/api/posts/{id}/comment/{commentId}/reply/{replyId}",
            patch(comments::edit_reply).delete(comments::remove_reply),
        )
        .route(
            "/api/posts/{id}/comment/{commentId}/reply/{replyId}/upvote",
            post(votes::upvote_reply),
        )
        .route(
            "/api/posts/{id}/comment/{commentId}/reply/{replyId}/downvote",
            post(votes::downvote_reply),
        )
        .with_state(state)
}
