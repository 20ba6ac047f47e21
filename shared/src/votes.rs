use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteDirection {
    Up,
    Down,
}

impl VoteDirection {
    pub fn sign(self) -> i64 {
        match self {
            VoteDirection::Up => 1,
            VoteDirection::Down => -1,
        }
    }
}

/// Upvoter/downvoter membership for a post, comment, or reply.
///
/// The fields are private on purpose: `toggle` is the only mutator, so a
/// voter can never end up in both sets at once. A voter moves through
/// {no vote, upvoted, downvoted}; re-casting the same vote removes it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteSets {
    upvoted_by: Vec<String>,
    downvoted_by: Vec<String>,
}

impl VoteSets {
    /// Applies one vote action and returns the karma delta (±1) to apply to
    /// the content owner's counter. Toggling a vote off yields the opposite
    /// sign of casting it.
    pub fn toggle(&mut self, direction: VoteDirection, voter: &str) -> i64 {
        let (same, opposite) = match direction {
            VoteDirection::Up => (&mut self.upvoted_by, &mut self.downvoted_by),
            VoteDirection::Down => (&mut self.downvoted_by, &mut self.upvoted_by),
        };

        if let Some(pos) = same.iter().position(|id| id == voter) {
            // Same vote again: remove it. Nothing else changes.
            same.remove(pos);
            -direction.sign()
        } else {
            if let Some(pos) = opposite.iter().position(|id| id == voter) {
                opposite.remove(pos);
            }
            same.push(voter.to_string());
            direction.sign()
        }
    }

    pub fn points_count(&self) -> i64 {
        self.upvoted_by.len() as i64 - self.downvoted_by.len() as i64
    }

    pub fn counts(&self) -> (usize, usize) {
        (self.upvoted_by.len(), self.downvoted_by.len())
    }

    pub fn upvoted_by(&self) -> &[String] {
        &self.upvoted_by
    }

    pub fn downvoted_by(&self) -> &[String] {
        &self.downvoted_by
    }

    pub fn has_upvoted(&self, voter: &str) -> bool {
        self.upvoted_by.iter().any(|id| id == voter)
    }

    pub fn has_downvoted(&self, voter: &str) -> bool {
        self.downvoted_by.iter().any(|id| id == voter)
    }
}
