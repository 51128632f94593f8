//! In-memory implementation of every collaborator trait, used by the unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use anyhow::{Result, anyhow, bail};
use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use gathering_types::events::NotificationEvent;
use gathering_types::models::{
    Activity, ActivityStatus, Participant, ParticipantStatus, ReputationScore, RoleAssignment,
    Vote, VoteKind, VoteScope,
};

use crate::store::{
    ActivityDirectory, AssignmentStore, EvaluationWrite, Notifier, PrivilegeCheck, VoteStore,
};

#[derive(Default)]
struct State {
    activities: HashMap<Uuid, Activity>,
    participants: Vec<Participant>,
    assignments: HashMap<Uuid, Vec<RoleAssignment>>,
    /// Highest number of assignment rows ever visible per activity.
    assignment_high_water: HashMap<Uuid, usize>,
    votes: Vec<Vote>,
    daily_casts: HashSet<(Uuid, Uuid, NaiveDate)>,
    scores: HashMap<Uuid, ReputationScore>,
    elevated: HashSet<Uuid>,
    notifications: Vec<NotificationEvent>,
    failing_recipients: HashSet<Uuid>,
    notifications_down: bool,
    scores_down: bool,
}

impl State {
    fn push_vote(&mut self, vote: &Vote) -> Result<()> {
        if self.failing_recipients.contains(&vote.recipient_id) {
            bail!("insert rejected for recipient {}", vote.recipient_id);
        }
        let duplicate = self.votes.iter().any(|v| {
            v.rater_id == vote.rater_id
                && v.recipient_id == vote.recipient_id
                && v.kind == vote.kind
                && v.activity_id == vote.activity_id
        });
        if duplicate {
            bail!("UNIQUE constraint failed: votes");
        }
        self.votes.push(vote.clone());
        Ok(())
    }
}

/// Enforces the same uniqueness rules as the SQL schema.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|e| anyhow!("memory store lock poisoned: {}", e))
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut State) -> T) -> T {
        let mut guard = self.state.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut guard)
    }

    // -- Fixtures --

    pub fn add_activity(&self, owner_id: Uuid, completed: bool) -> Uuid {
        let id = Uuid::new_v4();
        let status = if completed {
            ActivityStatus::Completed
        } else {
            ActivityStatus::Open
        };
        self.with_state(|s| {
            s.activities.insert(
                id,
                Activity {
                    id,
                    owner_id,
                    title: "test activity".into(),
                    status,
                    created_at: Utc::now(),
                },
            )
        });
        id
    }

    pub fn set_activity_status(&self, activity_id: Uuid, status: ActivityStatus) {
        self.with_state(|s| {
            if let Some(a) = s.activities.get_mut(&activity_id) {
                a.status = status;
            }
        });
    }

    pub fn add_participant(&self, activity_id: Uuid, user_id: Uuid, status: ParticipantStatus) {
        self.with_state(|s| {
            s.participants
                .retain(|p| !(p.activity_id == activity_id && p.user_id == user_id));
            s.participants.push(Participant {
                activity_id,
                user_id,
                status,
            });
        });
    }

    pub fn set_elevated(&self, user_id: Uuid, elevated: bool) {
        self.with_state(|s| {
            if elevated {
                s.elevated.insert(user_id);
            } else {
                s.elevated.remove(&user_id);
            }
        });
    }

    /// Makes every vote insert addressed to `recipient_id` fail.
    pub fn fail_inserts_for(&self, recipient_id: Uuid) {
        self.with_state(|s| s.failing_recipients.insert(recipient_id));
    }

    /// Makes every notification attempt fail.
    pub fn break_notifications(&self) {
        self.with_state(|s| s.notifications_down = true);
    }

    /// Makes every score write fail.
    pub fn break_score_writes(&self) {
        self.with_state(|s| s.scores_down = true);
    }

    // -- Inspection --

    pub fn notifications(&self) -> Vec<NotificationEvent> {
        self.with_state(|s| s.notifications.clone())
    }

    pub fn votes(&self) -> Vec<Vote> {
        self.with_state(|s| s.votes.clone())
    }

    pub fn max_assignment_rows_seen(&self, activity_id: Uuid) -> usize {
        self.with_state(|s| {
            s.assignment_high_water
                .get(&activity_id)
                .copied()
                .unwrap_or(0)
        })
    }
}

impl ActivityDirectory for MemoryStore {
    fn activity(&self, activity_id: Uuid) -> Result<Option<Activity>> {
        Ok(self.lock()?.activities.get(&activity_id).cloned())
    }

    fn confirmed_participants(&self, activity_id: Uuid) -> Result<Vec<Uuid>> {
        Ok(self
            .lock()?
            .participants
            .iter()
            .filter(|p| p.activity_id == activity_id && p.status == ParticipantStatus::Confirmed)
            .map(|p| p.user_id)
            .collect())
    }
}

impl AssignmentStore for MemoryStore {
    fn assignments(&self, activity_id: Uuid) -> Result<Vec<RoleAssignment>> {
        Ok(self
            .lock()?
            .assignments
            .get(&activity_id)
            .cloned()
            .unwrap_or_default())
    }

    fn delete_assignments(&self, activity_id: Uuid) -> Result<usize> {
        Ok(self
            .lock()?
            .assignments
            .remove(&activity_id)
            .map_or(0, |rows| rows.len()))
    }

    fn insert_assignments(&self, rows: &[RoleAssignment]) -> Result<()> {
        let mut guard = self.lock()?;
        let state = &mut *guard;
        for row in rows {
            let existing = state.assignments.entry(row.activity_id).or_default();
            if existing
                .iter()
                .any(|r| r.participant_id == row.participant_id)
            {
                bail!(
                    "participant {} already has a role in activity {}",
                    row.participant_id,
                    row.activity_id
                );
            }
            existing.push(row.clone());
            let len = existing.len();
            let high = state.assignment_high_water.entry(row.activity_id).or_default();
            *high = (*high).max(len);
        }
        Ok(())
    }
}

impl VoteStore for MemoryStore {
    fn find_vote(
        &self,
        rater_id: Uuid,
        recipient_id: Uuid,
        kind: VoteKind,
        scope: VoteScope,
    ) -> Result<Option<Vote>> {
        Ok(self
            .lock()?
            .votes
            .iter()
            .find(|v| {
                v.rater_id == rater_id
                    && v.recipient_id == recipient_id
                    && v.kind == kind
                    && v.scope() == scope
            })
            .cloned())
    }

    fn insert_vote(&self, vote: &Vote) -> Result<()> {
        self.lock()?.push_vote(vote)
    }

    fn insert_free_vote(&self, vote: &Vote, day: NaiveDate) -> Result<bool> {
        let mut state = self.lock()?;
        let slot = (vote.rater_id, vote.recipient_id, day);
        if state.daily_casts.contains(&slot) {
            return Ok(false);
        }
        state.push_vote(vote)?;
        state.daily_casts.insert(slot);
        Ok(true)
    }

    fn insert_evaluation(
        &self,
        rater_id: Uuid,
        activity_id: Uuid,
        votes: &[Vote],
    ) -> Result<EvaluationWrite> {
        let mut state = self.lock()?;
        if state
            .votes
            .iter()
            .any(|v| v.rater_id == rater_id && v.activity_id == Some(activity_id))
        {
            return Ok(EvaluationWrite::AlreadyEvaluated);
        }
        Ok(EvaluationWrite::Written(
            votes.iter().map(|vote| state.push_vote(vote)).collect(),
        ))
    }

    fn set_vote_active(&self, vote_id: Uuid, active: bool) -> Result<()> {
        let mut state = self.lock()?;
        let vote = state
            .votes
            .iter_mut()
            .find(|v| v.id == vote_id)
            .ok_or_else(|| anyhow!("vote {} not found", vote_id))?;
        vote.active = active;
        Ok(())
    }

    fn active_votes_for(&self, subject_id: Uuid) -> Result<Vec<Vote>> {
        Ok(self
            .lock()?
            .votes
            .iter()
            .filter(|v| v.active && v.recipient_id == subject_id)
            .cloned()
            .collect())
    }

    fn upsert_score(&self, score: &ReputationScore) -> Result<()> {
        let mut state = self.lock()?;
        if state.scores_down {
            bail!("score table unavailable");
        }
        state.scores.insert(score.subject_id, score.clone());
        Ok(())
    }

    fn score(&self, subject_id: Uuid) -> Result<Option<ReputationScore>> {
        Ok(self.lock()?.scores.get(&subject_id).cloned())
    }
}

impl PrivilegeCheck for MemoryStore {
    fn is_elevated(&self, user_id: Uuid) -> Result<bool> {
        Ok(self.lock()?.elevated.contains(&user_id))
    }
}

impl Notifier for MemoryStore {
    fn notify(&self, event: &NotificationEvent) -> Result<()> {
        let mut state = self.lock()?;
        if state.notifications_down {
            bail!("notification service unavailable");
        }
        state.notifications.push(event.clone());
        Ok(())
    }
}
