use anyhow::Result;
use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use gathering_types::events::NotificationEvent;
use gathering_types::models::{Activity, ReputationScore, RoleAssignment, Vote, VoteKind, VoteScope};

/// Read access to activities and their confirmed roster.
pub trait ActivityDirectory: Send + Sync {
    fn activity(&self, activity_id: Uuid) -> Result<Option<Activity>>;

    /// Users whose participation is confirmed. May or may not include the owner.
    fn confirmed_participants(&self, activity_id: Uuid) -> Result<Vec<Uuid>>;

    /// Owner or confirmed participant.
    fn is_member(&self, activity: &Activity, user_id: Uuid) -> Result<bool> {
        if activity.owner_id == user_id {
            return Ok(true);
        }
        Ok(self.confirmed_participants(activity.id)?.contains(&user_id))
    }

    /// Owner first, then confirmed participants, without duplicates.
    fn roster(&self, activity: &Activity) -> Result<Vec<Uuid>> {
        let mut roster = vec![activity.owner_id];
        for user_id in self.confirmed_participants(activity.id)? {
            if !roster.contains(&user_id) {
                roster.push(user_id);
            }
        }
        Ok(roster)
    }
}

pub trait AssignmentStore: Send + Sync {
    fn assignments(&self, activity_id: Uuid) -> Result<Vec<RoleAssignment>>;

    /// Removes every assignment of the activity. Returns how many rows went away.
    fn delete_assignments(&self, activity_id: Uuid) -> Result<usize>;

    fn insert_assignments(&self, rows: &[RoleAssignment]) -> Result<()>;
}

/// What [`VoteStore::insert_evaluation`] did.
#[derive(Debug)]
pub enum EvaluationWrite {
    /// The rater already voted in the activity. Nothing was written.
    AlreadyEvaluated,
    /// One result per vote, in input order. A failed row does not stop the others.
    Written(Vec<Result<()>>),
}

pub trait VoteStore: Send + Sync {
    /// The row matching (rater, recipient, kind) within `scope`, active or not.
    fn find_vote(
        &self,
        rater_id: Uuid,
        recipient_id: Uuid,
        kind: VoteKind,
        scope: VoteScope,
    ) -> Result<Option<Vote>>;

    fn insert_vote(&self, vote: &Vote) -> Result<()>;

    /// Claims the (rater, recipient, day) limiter slot and writes `vote` as one unit.
    /// Returns `false` without writing anything when the slot is already taken.
    fn insert_free_vote(&self, vote: &Vote, day: NaiveDate) -> Result<bool>;

    /// Writes a rater's evaluation of an activity, unless the rater already has a vote
    /// there. The check and the writes happen under one lock.
    fn insert_evaluation(
        &self,
        rater_id: Uuid,
        activity_id: Uuid,
        votes: &[Vote],
    ) -> Result<EvaluationWrite>;

    fn set_vote_active(&self, vote_id: Uuid, active: bool) -> Result<()>;

    fn active_votes_for(&self, subject_id: Uuid) -> Result<Vec<Vote>>;

    fn upsert_score(&self, score: &ReputationScore) -> Result<()>;

    fn score(&self, subject_id: Uuid) -> Result<Option<ReputationScore>>;
}

pub trait PrivilegeCheck: Send + Sync {
    fn is_elevated(&self, user_id: Uuid) -> Result<bool>;
}

/// Fire-and-forget delivery. Callers log failures and carry on.
pub trait Notifier: Send + Sync {
    fn notify(&self, event: &NotificationEvent) -> Result<()>;
}

pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// UTC calendar day of the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }
}

/// A fixed day, for tests and replays.
impl Clock for NaiveDate {
    fn today(&self) -> NaiveDate {
        *self
    }
}
