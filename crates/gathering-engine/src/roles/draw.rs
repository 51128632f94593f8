use tracing::{info, warn};
use uuid::Uuid;

use gathering_types::events::NotificationEvent;
use gathering_types::models::{Activity, RoleAssignment, RoleSlot};

use crate::config::EngineConfig;
use crate::error::{AuthorizationError, EngineError, EngineResult};
use crate::store::{ActivityDirectory, AssignmentStore, Notifier};

/// Commits role drawings for an activity.
///
/// A drawing always replaces the previous one wholesale: the old rows are
/// deleted and that call returns before the new rows are inserted.
pub struct RoleDrawService<'a, S, N> {
    store: &'a S,
    notifier: &'a N,
    config: EngineConfig,
}

impl<'a, S, N> RoleDrawService<'a, S, N>
where
    S: ActivityDirectory + AssignmentStore,
    N: Notifier,
{
    pub fn new(store: &'a S, notifier: &'a N, config: EngineConfig) -> Self {
        Self {
            store,
            notifier,
            config,
        }
    }

    pub fn draw(
        &self,
        requester: Uuid,
        activity_id: Uuid,
        slots: &[RoleSlot],
    ) -> EngineResult<Vec<RoleAssignment>> {
        let activity = self.owned_activity(requester, activity_id)?;

        // Re-read the roster here: membership may have moved since the slots were chosen.
        let roster = self.store.roster(&activity)?;
        let rows = super::assign(activity_id, &roster, slots, self.config.max_role_slots)?;

        let removed = self.store.delete_assignments(activity_id)?;
        self.store.insert_assignments(&rows)?;

        info!(
            "Drew {} roles for activity {} (replaced {})",
            rows.len(),
            activity_id,
            removed
        );

        for row in &rows {
            let event = NotificationEvent::RolesDrawn {
                activity_id,
                participant_id: row.participant_id,
                role_name: row.role_name.clone(),
                color_tag: row.color_tag.clone(),
            };
            if let Err(e) = self.notifier.notify(&event) {
                warn!("Failed to notify {} of their role: {}", row.participant_id, e);
            }
        }

        Ok(rows)
    }

    /// Wipes every assignment of the activity. Returns the number of rows removed.
    pub fn reset(&self, requester: Uuid, activity_id: Uuid) -> EngineResult<usize> {
        self.owned_activity(requester, activity_id)?;
        let removed = self.store.delete_assignments(activity_id)?;
        info!("Reset {} role assignments for activity {}", removed, activity_id);
        Ok(removed)
    }

    pub fn assignments(&self, activity_id: Uuid) -> EngineResult<Vec<RoleAssignment>> {
        Ok(self.store.assignments(activity_id)?)
    }

    fn owned_activity(&self, requester: Uuid, activity_id: Uuid) -> EngineResult<Activity> {
        let activity = self
            .store
            .activity(activity_id)?
            .ok_or_else(|| EngineError::activity_not_found(activity_id))?;

        if activity.owner_id != requester {
            return Err(AuthorizationError::NotOwner { activity_id }.into());
        }
        Ok(activity)
    }
}
