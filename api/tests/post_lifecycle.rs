mod common;

use common::*;
use crabbit_api::error::ApiError;
use crabbit_api::posts::{create_post, delete_post, edit_post};
use crabbit_api::store;
use crabbit_shared::{CreatePost, Submission};

fn link_post_payload(sub_id: &str, url: &str) -> CreatePost {
    CreatePost {
        title: "A link".to_string(),
        subreddit: sub_id.to_string(),
        post_type: "Link".to_string(),
        text_submission: None,
        link_submission: Some(url.to_string()),
        image_submission: None,
    }
}

#[test]
fn fresh_post_matches_the_creation_contract() {
    let pool = memory_pool();
    let mut conn = pool.get().unwrap();

    let author = seed_user(&conn, "author");
    let sub = seed_subreddit(&conn, "rustaceans", &author);
    let post = create_post(&mut conn, &author.id, text_post_payload(&sub.id, "Hello")).unwrap();

    assert_eq!(post.title, "Hello");
    assert_eq!(post.author, author.id);
    assert_eq!(post.subreddit, sub.id);
    assert_eq!(post.points_count, 1);
    assert!(post.votes.has_upvoted(&author.id));
    assert_eq!(post.vote_ratio, 0.0);
    assert_eq!(post.controversial_algo, 0.0);
    assert_eq!(post.hot_algo, post.created_at.timestamp_millis() as f64);
    assert_eq!(post.comment_count, 0);

    // The author and subreddit both pick up the reference, and the author
    // earns one point of post karma for the self-upvote.
    let author = reload_user(&conn, &author.id);
    assert_eq!(author.posts, vec![post.id.clone()]);
    assert_eq!(author.karma_points.post_karma, 1);
    let sub = store::find_subreddit(&conn, &sub.id).unwrap().unwrap();
    assert_eq!(sub.posts, vec![post.id]);
}

#[test]
fn link_posts_require_an_http_url() {
    let pool = memory_pool();
    let mut conn = pool.get().unwrap();

    let author = seed_user(&conn, "author");
    let sub = seed_subreddit(&conn, "rustaceans", &author);

    for bad in ["", "not a url", "ftp://files.example.com", "example.com"] {
        let err = create_post(&mut conn, &author.id, link_post_payload(&sub.id, bad)).unwrap_err();
        assert_eq!(err.to_string(), "Valid URL needed for post type 'Link'.");
    }

    let post = create_post(
        &mut conn,
        &author.id,
        link_post_payload(&sub.id, "https://example.com/article"),
    )
    .unwrap();
    assert!(matches!(post.submission, Submission::Link { .. }));
}

#[test]
fn text_posts_require_a_body() {
    let pool = memory_pool();
    let mut conn = pool.get().unwrap();

    let author = seed_user(&conn, "author");
    let sub = seed_subreddit(&conn, "rustaceans", &author);

    let mut payload = text_post_payload(&sub.id, "Empty");
    payload.text_submission = Some("   ".to_string());
    let err = create_post(&mut conn, &author.id, payload).unwrap_err();
    assert_eq!(err.to_string(), "Text body needed for post type 'Text'.");

    let mut payload = text_post_payload(&sub.id, "Image");
    payload.post_type = "Image".to_string();
    payload.text_submission = None;
    let err = create_post(&mut conn, &author.id, payload).unwrap_err();
    assert_eq!(err.to_string(), "Image is needed for type 'Image'.");
}

#[test]
fn oversized_text_is_payload_too_large_and_writes_nothing() {
    let pool = memory_pool();
    let mut conn = pool.get().unwrap();

    let author = seed_user(&conn, "author");
    let sub = seed_subreddit(&conn, "rustaceans", &author);

    let mut payload = text_post_payload(&sub.id, "Wall of text");
    payload.text_submission = Some("a".repeat(40_001));
    let err = create_post(&mut conn, &author.id, payload).unwrap_err();
    assert!(matches!(err, ApiError::PayloadTooLarge(_)));
    assert_eq!(err.to_string(), "Text submission too long");

    assert_eq!(store::count_posts(&conn).unwrap(), 0);
    let author = reload_user(&conn, &author.id);
    assert!(author.posts.is_empty());
    assert_eq!(author.karma_points.post_karma, 0);

    // Exactly at the limit is fine.
    let mut payload = text_post_payload(&sub.id, "Wall of text");
    payload.text_submission = Some("a".repeat(40_000));
    create_post(&mut conn, &author.id, payload).unwrap();
}

#[test]
fn titles_are_capped_at_one_hundred_characters() {
    let pool = memory_pool();
    let mut conn = pool.get().unwrap();

    let author = seed_user(&conn, "author");
    let sub = seed_subreddit(&conn, "rustaceans", &author);

    let err = create_post(
        &mut conn,
        &author.id,
        text_post_payload(&sub.id, &"t".repeat(101)),
    )
    .unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));

    create_post(
        &mut conn,
        &author.id,
        text_post_payload(&sub.id, &"t".repeat(100)),
    )
    .unwrap();
}

#[test]
fn creation_resolves_author_then_subreddit() {
    let pool = memory_pool();
    let mut conn = pool.get().unwrap();

    let author = seed_user(&conn, "author");
    let sub = seed_subreddit(&conn, "rustaceans", &author);

    let err = create_post(&mut conn, "ghost", text_post_payload(&sub.id, "x")).unwrap_err();
    assert_eq!(err.to_string(), "User does not exist in database.");

    let err = create_post(&mut conn, &author.id, text_post_payload("s404", "x")).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Subreddit with ID: 's404' does not exist in database."
    );
}

#[test]
fn only_text_posts_can_be_edited() {
    let pool = memory_pool();
    let mut conn = pool.get().unwrap();

    let author = seed_user(&conn, "author");
    let sub = seed_subreddit(&conn, "rustaceans", &author);

    let text_post = seed_post(&mut conn, &author, &sub);
    let edited = edit_post(&mut conn, &text_post.id, &author.id, "revised body").unwrap();
    match &edited.submission {
        Submission::Text { text_submission } => assert_eq!(text_submission, "revised body"),
        other => panic!("expected text submission, got {other:?}"),
    }

    let link_post = create_post(
        &mut conn,
        &author.id,
        link_post_payload(&sub.id, "https://example.com"),
    )
    .unwrap();
    let err = edit_post(&mut conn, &link_post.id, &author.id, "nope").unwrap_err();
    assert_eq!(err.to_string(), "Only text posts can be edited.");
}

#[test]
fn editing_someone_elses_post_is_denied() {
    let pool = memory_pool();
    let mut conn = pool.get().unwrap();

    let author = seed_user(&conn, "author");
    let intruder = seed_user(&conn, "intruder");
    let sub = seed_subreddit(&conn, "rustaceans", &author);
    let post = seed_post(&mut conn, &author, &sub);

    let err = edit_post(&mut conn, &post.id, &intruder.id, "hijacked").unwrap_err();
    assert_eq!(err.to_string(), "Access is denied.");

    let err = delete_post(&mut conn, &post.id, &intruder.id).unwrap_err();
    assert_eq!(err.to_string(), "Access is denied.");
    assert_eq!(store::count_posts(&conn).unwrap(), 1);
}

#[test]
fn deletion_cascades_references_but_keeps_karma() {
    let pool = memory_pool();
    let mut conn = pool.get().unwrap();

    let author = seed_user(&conn, "author");
    let voter = seed_user(&conn, "voter");
    let sub = seed_subreddit(&conn, "rustaceans", &author);
    let post = seed_post(&mut conn, &author, &sub);

    crabbit_api::votes::vote_post(
        &mut conn,
        &post.id,
        &voter.id,
        crabbit_shared::VoteDirection::Up,
    )
    .unwrap();
    assert_eq!(reload_user(&conn, &author.id).karma_points.post_karma, 2);

    delete_post(&mut conn, &post.id, &author.id).unwrap();

    assert_eq!(store::count_posts(&conn).unwrap(), 0);
    let author = reload_user(&conn, &author.id);
    assert!(author.posts.is_empty());
    // Earned karma survives the post.
    assert_eq!(author.karma_points.post_karma, 2);
    let sub = store::find_subreddit(&conn, &sub.id).unwrap().unwrap();
    assert!(sub.posts.is_empty());
}

#[test]
fn deleting_a_missing_post_names_its_id() {
    let pool = memory_pool();
    let mut conn = pool.get().unwrap();
    let author = seed_user(&conn, "author");

    let err = delete_post(&mut conn, "p404", &author.id).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Post with ID: p404 does not exist in database."
    );
}
