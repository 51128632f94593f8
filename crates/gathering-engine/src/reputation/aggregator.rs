use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use gathering_types::events::NotificationEvent;
use gathering_types::models::{Activity, ReputationScore, Vote, VoteKind, VoteScope};

use super::score;
use crate::error::{
    AuthorizationError, ConflictError, EngineError, EngineResult, ValidationError,
};
use crate::store::{
    ActivityDirectory, Clock, EvaluationWrite, Notifier, PrivilegeCheck, VoteStore,
};

/// Where the single free-scope row for (rater, recipient, kind) currently stands.
///
/// Outside activities there is at most one row per (rater, recipient, kind); it is
/// created once and afterwards only flips between active and inactive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FreeVoteState {
    Absent,
    Active(Uuid),
    Inactive(Uuid),
}

impl FreeVoteState {
    pub fn of(row: Option<&Vote>) -> Self {
        match row {
            None => Self::Absent,
            Some(v) if v.active => Self::Active(v.id),
            Some(v) => Self::Inactive(v.id),
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active(_))
    }
}

/// What a cast did to the stored vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteTransition {
    /// A new active row was written.
    Inserted,
    /// An inactive row became active again.
    Activated,
    /// An active row was withdrawn.
    Deactivated,
    /// The row already had the requested state.
    Unchanged,
}

impl VoteTransition {
    /// Only becoming active (new or re-activated) notifies the recipient.
    pub fn notifies(&self) -> bool {
        matches!(self, Self::Inserted | Self::Activated)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CastOutcome {
    pub transition: VoteTransition,
    pub score: ReputationScore,
}

/// One vote inside a batch evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ballot {
    pub recipient_id: Uuid,
    pub kind: VoteKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowError {
    pub index: usize,
    pub recipient_id: Uuid,
    pub kind: VoteKind,
    pub message: String,
}

/// Result of a best-effort batch: rows that failed are listed, the rest were kept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub success: bool,
    pub inserted: usize,
    pub row_errors: Vec<RowError>,
    pub scores: Vec<ReputationScore>,
}

pub struct ReputationAggregator<'a, S, P, N, C> {
    store: &'a S,
    privileges: &'a P,
    notifier: &'a N,
    clock: &'a C,
}

impl<'a, S, P, N, C> ReputationAggregator<'a, S, P, N, C>
where
    S: ActivityDirectory + VoteStore,
    P: PrivilegeCheck,
    N: Notifier,
    C: Clock,
{
    pub fn new(store: &'a S, privileges: &'a P, notifier: &'a N, clock: &'a C) -> Self {
        Self {
            store,
            privileges,
            notifier,
            clock,
        }
    }

    /// Casts a single vote. Free-scope casts toggle an existing row.
    pub fn cast_vote(
        &self,
        rater_id: Uuid,
        recipient_id: Uuid,
        kind: VoteKind,
        scope: VoteScope,
    ) -> EngineResult<CastOutcome> {
        if rater_id == recipient_id {
            return Err(ValidationError::SelfVote.into());
        }
        match scope {
            VoteScope::Activity { activity_id } => {
                self.cast_activity_vote(rater_id, recipient_id, kind, activity_id)
            }
            VoteScope::Free => self.cast_free_vote(rater_id, recipient_id, kind, None),
        }
    }

    /// Free-scope cast with an explicit target state instead of a toggle.
    pub fn set_free_vote(
        &self,
        rater_id: Uuid,
        recipient_id: Uuid,
        kind: VoteKind,
        active: bool,
    ) -> EngineResult<CastOutcome> {
        if rater_id == recipient_id {
            return Err(ValidationError::SelfVote.into());
        }
        self.cast_free_vote(rater_id, recipient_id, kind, Some(active))
    }

    /// Rebuilds the subject's score from every active vote and stores it.
    pub fn recompute_score(&self, subject_id: Uuid) -> EngineResult<ReputationScore> {
        let votes = self.store.active_votes_for(subject_id)?;
        let score = score::tally(subject_id, &votes);
        self.store.upsert_score(&score)?;
        debug!(
            "Recomputed score for {}: {} from {} votes",
            subject_id,
            score.total_score,
            votes.len()
        );
        Ok(score)
    }

    /// The stored score, or a fresh recompute when none has been stored yet.
    pub fn score(&self, subject_id: Uuid) -> EngineResult<ReputationScore> {
        match self.store.score(subject_id)? {
            Some(score) => Ok(score),
            None => self.recompute_score(subject_id),
        }
    }

    /// Records a rater's whole evaluation of an activity in one go.
    ///
    /// Rejected up front if the rater already voted in this activity. Individual rows
    /// that fail are reported in `row_errors`; the remaining rows are still written.
    /// Only recipients with at least one written row are rescored.
    pub fn batch_cast_and_recompute(
        &self,
        rater_id: Uuid,
        activity_id: Uuid,
        ballots: &[Ballot],
    ) -> EngineResult<BatchOutcome> {
        if ballots.is_empty() {
            return Err(ValidationError::EmptyBatch.into());
        }

        let activity = self.completed_activity(activity_id)?;
        let roster = self.store.roster(&activity)?;
        if !roster.contains(&rater_id) {
            return Err(AuthorizationError::RaterNotMember {
                user_id: rater_id,
                activity_id,
            }
            .into());
        }

        let scope = VoteScope::Activity { activity_id };
        let mut rejected: Vec<(usize, EngineError)> = Vec::new();
        let mut indexes = Vec::with_capacity(ballots.len());
        let mut votes = Vec::with_capacity(ballots.len());

        for (index, ballot) in ballots.iter().enumerate() {
            if ballot.recipient_id == rater_id {
                rejected.push((index, ValidationError::SelfVote.into()));
            } else if !roster.contains(&ballot.recipient_id) {
                rejected.push((
                    index,
                    AuthorizationError::RecipientNotMember {
                        user_id: ballot.recipient_id,
                        activity_id,
                    }
                    .into(),
                ));
            } else {
                indexes.push(index);
                votes.push(Vote::new(rater_id, ballot.recipient_id, ballot.kind, scope));
            }
        }

        let results = match self.store.insert_evaluation(rater_id, activity_id, &votes)? {
            EvaluationWrite::AlreadyEvaluated => {
                return Err(ConflictError::AlreadyEvaluated { activity_id }.into());
            }
            EvaluationWrite::Written(results) => results,
        };

        let mut inserted = 0;
        // (recipient, first written row) in ballot order
        let mut rescore: Vec<(Uuid, usize)> = Vec::new();
        for ((index, vote), result) in indexes.into_iter().zip(&votes).zip(results) {
            match result {
                Ok(()) => {
                    inserted += 1;
                    self.notify_vote(rater_id, vote.recipient_id, vote.kind, Some(activity_id));
                    if !rescore.iter().any(|(id, _)| *id == vote.recipient_id) {
                        rescore.push((vote.recipient_id, index));
                    }
                }
                Err(e) => rejected.push((index, e.into())),
            }
        }

        let mut scores = Vec::with_capacity(rescore.len());
        for (recipient_id, index) in rescore {
            match self.recompute_score(recipient_id) {
                Ok(score) => scores.push(score),
                Err(e) => rejected.push((index, e)),
            }
        }

        rejected.sort_by_key(|(index, _)| *index);
        let row_errors: Vec<RowError> = rejected
            .into_iter()
            .map(|(index, e)| {
                let ballot = &ballots[index];
                warn!(
                    "Evaluation row {} ({} -> {}, {}) failed: {}",
                    index, rater_id, ballot.recipient_id, ballot.kind, e
                );
                RowError {
                    index,
                    recipient_id: ballot.recipient_id,
                    kind: ballot.kind,
                    message: e.to_string(),
                }
            })
            .collect();

        info!(
            "Rater {} evaluated activity {}: {} rows written, {} failed",
            rater_id,
            activity_id,
            inserted,
            row_errors.len()
        );

        Ok(BatchOutcome {
            success: true,
            inserted,
            row_errors,
            scores,
        })
    }

    fn cast_activity_vote(
        &self,
        rater_id: Uuid,
        recipient_id: Uuid,
        kind: VoteKind,
        activity_id: Uuid,
    ) -> EngineResult<CastOutcome> {
        let activity = self.completed_activity(activity_id)?;

        if !self.store.is_member(&activity, rater_id)? {
            return Err(AuthorizationError::RaterNotMember {
                user_id: rater_id,
                activity_id,
            }
            .into());
        }
        if !self.store.is_member(&activity, recipient_id)? {
            return Err(AuthorizationError::RecipientNotMember {
                user_id: recipient_id,
                activity_id,
            }
            .into());
        }

        let scope = VoteScope::Activity { activity_id };
        if self
            .store
            .find_vote(rater_id, recipient_id, kind, scope)?
            .is_some()
        {
            return Err(ConflictError::DuplicateVote {
                recipient_id,
                kind,
                activity_id,
            }
            .into());
        }

        self.store
            .insert_vote(&Vote::new(rater_id, recipient_id, kind, scope))?;
        info!(
            "{} voted {} for {} in activity {}",
            rater_id, kind, recipient_id, activity_id
        );
        self.notify_vote(rater_id, recipient_id, kind, Some(activity_id));

        Ok(CastOutcome {
            transition: VoteTransition::Inserted,
            score: self.recompute_score(recipient_id)?,
        })
    }

    /// `desired = None` toggles; `Some(state)` moves to that state.
    fn cast_free_vote(
        &self,
        rater_id: Uuid,
        recipient_id: Uuid,
        kind: VoteKind,
        desired: Option<bool>,
    ) -> EngineResult<CastOutcome> {
        if !self.privileges.is_elevated(rater_id)? {
            return Err(AuthorizationError::PrivilegeRequired.into());
        }

        let row = self
            .store
            .find_vote(rater_id, recipient_id, kind, VoteScope::Free)?;
        let state = FreeVoteState::of(row.as_ref());
        let want_active = desired.unwrap_or(!state.is_active());

        let transition = match (state, want_active) {
            (FreeVoteState::Active(id), false) => {
                self.store.set_vote_active(id, false)?;
                VoteTransition::Deactivated
            }
            (FreeVoteState::Inactive(id), true) => {
                self.store.set_vote_active(id, true)?;
                VoteTransition::Activated
            }
            (FreeVoteState::Absent, true) => {
                let day = self.clock.today();
                let vote = Vote::new(rater_id, recipient_id, kind, VoteScope::Free);
                if !self.store.insert_free_vote(&vote, day)? {
                    return Err(EngineError::RateLimited { recipient_id, day });
                }
                VoteTransition::Inserted
            }
            _ => VoteTransition::Unchanged,
        };

        info!(
            "Free vote {} -> {} ({}): {:?}",
            rater_id, recipient_id, kind, transition
        );
        if transition.notifies() {
            self.notify_vote(rater_id, recipient_id, kind, None);
        }

        Ok(CastOutcome {
            transition,
            score: self.recompute_score(recipient_id)?,
        })
    }

    fn completed_activity(&self, activity_id: Uuid) -> EngineResult<Activity> {
        let activity = self
            .store
            .activity(activity_id)?
            .ok_or_else(|| EngineError::activity_not_found(activity_id))?;
        if !activity.is_completed() {
            return Err(ValidationError::ActivityNotCompleted(activity_id).into());
        }
        Ok(activity)
    }

    fn notify_vote(&self, rater_id: Uuid, recipient_id: Uuid, kind: VoteKind, activity_id: Option<Uuid>) {
        let event = NotificationEvent::VoteReceived {
            recipient_id,
            rater_id,
            kind,
            activity_id,
        };
        if let Err(e) = self.notifier.notify(&event) {
            warn!("Failed to notify {} of a vote: {}", recipient_id, e);
        }
    }
}
