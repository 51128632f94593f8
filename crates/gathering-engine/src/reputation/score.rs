use uuid::Uuid;

use gathering_types::models::{ReputationScore, Vote, VoteKind};

/// Folds the active votes about `subject_id` into a fresh score.
///
/// Inactive votes and votes about anyone else are skipped. The fold only adds,
/// so the result does not depend on the order of `votes`.
pub fn tally<'a, I>(subject_id: Uuid, votes: I) -> ReputationScore
where
    I: IntoIterator<Item = &'a Vote>,
{
    let mut score = ReputationScore::empty(subject_id);

    for vote in votes {
        if !vote.active || vote.recipient_id != subject_id {
            continue;
        }
        match vote.kind {
            VoteKind::Positive => score.total_score += 1,
            VoteKind::Negative => score.total_score -= 1,
            VoteKind::Keyword(keyword) => *score.keyword_counts.entry(keyword).or_default() += 1,
        }
    }

    score
}
