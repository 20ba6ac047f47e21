use std::collections::{HashMap, HashSet};

use rusqlite::Connection;

use crabbit_shared::{
    Comment, CommentView, Post, PostView, Reply, ReplyView, SubredditInfo, UserInfo,
};

use crate::error::ApiError;
use crate::store;

fn user_info(map: &HashMap<String, String>, id: &str) -> UserInfo {
    UserInfo {
        id: id.to_string(),
        username: map.get(id).cloned().unwrap_or_else(|| "[deleted]".into()),
    }
}

fn reply_view(reply: &Reply, names: &HashMap<String, String>) -> ReplyView {
    ReplyView {
        id: reply.id.clone(),
        replied_by: user_info(names, &reply.replied_by),
        reply_body: reply.reply_body.clone(),
        upvoted_by: reply.votes.upvoted_by().to_vec(),
        downvoted_by: reply.votes.downvoted_by().to_vec(),
        points_count: reply.points_count,
        created_at: reply.created_at,
        updated_at: reply.updated_at,
    }
}

fn comment_view(comment: &Comment, names: &HashMap<String, String>) -> CommentView {
    CommentView {
        id: comment.id.clone(),
        commented_by: user_info(names, &comment.commented_by),
        comment_body: comment.comment_body.clone(),
        upvoted_by: comment.votes.upvoted_by().to_vec(),
        downvoted_by: comment.votes.downvoted_by().to_vec(),
        points_count: comment.points_count,
        replies: comment.replies.iter().map(|r| reply_view(r, names)).collect(),
        created_at: comment.created_at,
        updated_at: comment.updated_at,
    }
}

/// The comment list with author identity populated, as comment and reply
/// mutations return it.
pub fn comment_views(conn: &Connection, comments: &[Comment]) -> Result<Vec<CommentView>, ApiError> {
    let mut ids: HashSet<&str> = HashSet::new();
    for comment in comments {
        ids.insert(&comment.commented_by);
        for reply in &comment.replies {
            ids.insert(&reply.replied_by);
        }
    }
    let names = store::usernames(conn, &ids)?;
    Ok(comments.iter().map(|c| comment_view(c, &names)).collect())
}

/// A post with author and subreddit identity populated.
pub fn post_view(conn: &Connection, post: &Post) -> Result<PostView, ApiError> {
    let author_name = store::find_user(conn, &post.author)?.map(|u| u.username);
    let subreddit = store::find_subreddit(conn, &post.subreddit)?
        .map(|s| SubredditInfo {
            id: s.id,
            subreddit_name: s.subreddit_name,
        })
        .unwrap_or_else(|| SubredditInfo {
            id: post.subreddit.clone(),
            subreddit_name: "[deleted]".into(),
        });

    Ok(PostView {
        id: post.id.clone(),
        title: post.title.clone(),
        submission: post.submission.clone(),
        author: UserInfo {
            id: post.author.clone(),
            username: author_name.unwrap_or_else(|| "[deleted]".into()),
        },
        subreddit,
        upvoted_by: post.votes.upvoted_by().to_vec(),
        downvoted_by: post.votes.downvoted_by().to_vec(),
        points_count: post.points_count,
        vote_ratio: post.vote_ratio,
        comment_count: post.comment_count,
        comments: comment_views(conn, &post.comments)?,
        created_at: post.created_at,
        updated_at: post.updated_at,
    })
}
