use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::VoteKind;

/// Events handed to the notification collaborator. Delivery is best effort.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum NotificationEvent {
    /// Someone rated the recipient
    VoteReceived {
        recipient_id: Uuid,
        rater_id: Uuid,
        kind: VoteKind,
        activity_id: Option<Uuid>,
    },

    /// A participant was handed a role in an activity's drawing
    RolesDrawn {
        activity_id: Uuid,
        participant_id: Uuid,
        role_name: String,
        color_tag: String,
    },
}

impl NotificationEvent {
    /// The user this notification is addressed to.
    pub fn recipient(&self) -> Uuid {
        match self {
            Self::VoteReceived { recipient_id, .. } => *recipient_id,
            Self::RolesDrawn { participant_id, .. } => *participant_id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::VoteReceived { .. } => "vote_received",
            Self::RolesDrawn { .. } => "roles_drawn",
        }
    }
}
