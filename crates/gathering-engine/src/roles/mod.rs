pub mod draw;
pub mod presets;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use uuid::Uuid;

use gathering_types::models::{RoleAssignment, RoleSlot, RoleToken};

use crate::error::{EngineResult, ValidationError};

pub use draw::RoleDrawService;

/// Checks a slot configuration against the number of participants.
///
/// Runs before any randomness is drawn, and again at commit time since the
/// roster may have changed since the slots were configured.
pub fn validate_slots(
    participant_count: usize,
    slots: &[RoleSlot],
    max_slots: usize,
) -> Result<(), ValidationError> {
    if slots.is_empty() {
        return Err(ValidationError::NoSlots);
    }
    if slots.len() > max_slots {
        return Err(ValidationError::TooManySlots {
            count: slots.len(),
            max: max_slots,
        });
    }

    for (index, slot) in slots.iter().enumerate() {
        if slot.name.trim().is_empty() {
            return Err(ValidationError::BlankRoleName { index });
        }
        if slot.quota == 0 {
            return Err(ValidationError::ZeroQuota {
                name: slot.name.clone(),
            });
        }
    }

    let total: usize = slots.iter().map(|s| s.quota as usize).sum();
    if total != participant_count {
        return Err(ValidationError::QuotaMismatch {
            expected: participant_count,
            actual: total,
        });
    }

    Ok(())
}

/// Expands each slot into `quota` tokens, in slot order.
pub fn build_pool(slots: &[RoleSlot]) -> Vec<RoleToken> {
    slots
        .iter()
        .flat_map(|slot| {
            std::iter::repeat_n(
                RoleToken {
                    role_name: slot.name.clone(),
                    color_tag: slot.color_tag.clone(),
                },
                slot.quota as usize,
            )
        })
        .collect()
}

/// In-place Fisher–Yates (Knuth) shuffle. Every permutation is equally likely.
pub fn fisher_yates<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.random_range(0..=i);
        items.swap(i, j);
    }
}

/// Draws roles with a freshly OS-seeded generator.
pub fn assign(
    activity_id: Uuid,
    participants: &[Uuid],
    slots: &[RoleSlot],
    max_slots: usize,
) -> EngineResult<Vec<RoleAssignment>> {
    let mut rng = StdRng::from_os_rng();
    assign_with_rng(activity_id, participants, slots, max_slots, &mut rng)
}

/// Validates, shuffles the token pool and zips it with `participants` by position.
pub fn assign_with_rng<R: Rng + ?Sized>(
    activity_id: Uuid,
    participants: &[Uuid],
    slots: &[RoleSlot],
    max_slots: usize,
    rng: &mut R,
) -> EngineResult<Vec<RoleAssignment>> {
    validate_slots(participants.len(), slots, max_slots)?;

    let mut pool = build_pool(slots);
    fisher_yates(&mut pool, rng);

    Ok(participants
        .iter()
        .zip(pool)
        .map(|(&participant_id, token)| RoleAssignment {
            activity_id,
            participant_id,
            role_name: token.role_name,
            color_tag: token.color_tag,
        })
        .collect())
}
