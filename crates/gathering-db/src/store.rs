//! The engine's collaborator traits, backed by SQLite.

use std::collections::BTreeMap;

use anyhow::{Result, anyhow};
use chrono::NaiveDate;
use uuid::Uuid;

use gathering_engine::store::{
    ActivityDirectory, AssignmentStore, EvaluationWrite, Notifier, PrivilegeCheck, VoteStore,
};
use gathering_types::events::NotificationEvent;
use gathering_types::models::{
    Activity, Keyword, ReputationScore, RoleAssignment, Vote, VoteKind, VoteScope,
};

use crate::Database;
use crate::models::parse_id;

impl ActivityDirectory for Database {
    fn activity(&self, activity_id: Uuid) -> Result<Option<Activity>> {
        self.get_activity(&activity_id.to_string())?
            .map(Activity::try_from)
            .transpose()
    }

    fn confirmed_participants(&self, activity_id: Uuid) -> Result<Vec<Uuid>> {
        self.get_confirmed_user_ids(&activity_id.to_string())?
            .iter()
            .map(|id| parse_id(id, "user_id"))
            .collect()
    }
}

impl AssignmentStore for Database {
    fn assignments(&self, activity_id: Uuid) -> Result<Vec<RoleAssignment>> {
        self.get_assignments(&activity_id.to_string())?
            .into_iter()
            .map(RoleAssignment::try_from)
            .collect()
    }

    fn delete_assignments(&self, activity_id: Uuid) -> Result<usize> {
        self.delete_assignments_for(&activity_id.to_string())
    }

    fn insert_assignments(&self, rows: &[RoleAssignment]) -> Result<()> {
        self.insert_assignment_rows(rows)
    }
}

impl VoteStore for Database {
    fn find_vote(
        &self,
        rater_id: Uuid,
        recipient_id: Uuid,
        kind: VoteKind,
        scope: VoteScope,
    ) -> Result<Option<Vote>> {
        let activity_id = scope.activity_id().map(|id| id.to_string());
        self.find_vote_row(
            &rater_id.to_string(),
            &recipient_id.to_string(),
            &kind.to_string(),
            activity_id.as_deref(),
        )?
        .map(Vote::try_from)
        .transpose()
    }

    fn insert_vote(&self, vote: &Vote) -> Result<()> {
        self.insert_vote_row(vote)
    }

    fn insert_free_vote(&self, vote: &Vote, day: NaiveDate) -> Result<bool> {
        self.insert_free_vote_row(vote, day)
    }

    fn insert_evaluation(
        &self,
        rater_id: Uuid,
        activity_id: Uuid,
        votes: &[Vote],
    ) -> Result<EvaluationWrite> {
        let written =
            self.insert_evaluation_rows(&rater_id.to_string(), &activity_id.to_string(), votes)?;
        Ok(match written {
            Some(results) => EvaluationWrite::Written(results),
            None => EvaluationWrite::AlreadyEvaluated,
        })
    }

    fn set_vote_active(&self, vote_id: Uuid, active: bool) -> Result<()> {
        if !self.update_vote_active(&vote_id.to_string(), active)? {
            return Err(anyhow!("vote {} not found", vote_id));
        }
        Ok(())
    }

    fn active_votes_for(&self, subject_id: Uuid) -> Result<Vec<Vote>> {
        self.get_active_votes_for(&subject_id.to_string())?
            .into_iter()
            .map(Vote::try_from)
            .collect()
    }

    fn upsert_score(&self, score: &ReputationScore) -> Result<()> {
        self.upsert_score_row(score)
    }

    fn score(&self, subject_id: Uuid) -> Result<Option<ReputationScore>> {
        let Some((total_score, counts)) = self.get_score_row(&subject_id.to_string())? else {
            return Ok(None);
        };
        let keyword_counts: BTreeMap<Keyword, u32> = serde_json::from_str(&counts)?;
        Ok(Some(ReputationScore {
            subject_id,
            total_score,
            keyword_counts,
        }))
    }
}

impl PrivilegeCheck for Database {
    fn is_elevated(&self, user_id: Uuid) -> Result<bool> {
        Ok(self
            .get_user_by_id(&user_id.to_string())?
            .is_some_and(|user| user.elevated))
    }
}

/// Stores notifications for clients to poll.
impl Notifier for Database {
    fn notify(&self, event: &NotificationEvent) -> Result<()> {
        let payload = serde_json::to_string(event)?;
        self.insert_notification(
            &Uuid::new_v4().to_string(),
            &event.recipient().to_string(),
            event.kind(),
            &payload,
        )
    }
}
