//! Built-in slot layouts. Deterministic in `total`; randomness only enters at draw time.

use std::fmt;
use std::str::FromStr;

use gathering_types::models::RoleSlot;

use crate::error::ValidationError;

const TEAM_COLORS: [&str; 5] = ["red", "blue", "green", "yellow", "purple"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    Mafia,
    OddOneOut,
    TwoTeams,
    ThreeTeams,
}

impl Preset {
    pub fn slots(&self, total: u32) -> Vec<RoleSlot> {
        match self {
            Preset::Mafia => mafia(total),
            Preset::OddOneOut => odd_one_out(total),
            Preset::TwoTeams => even_split(total, 2),
            Preset::ThreeTeams => even_split(total, 3),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Preset::Mafia => "mafia",
            Preset::OddOneOut => "odd_one_out",
            Preset::TwoTeams => "two_teams",
            Preset::ThreeTeams => "three_teams",
        }
    }
}

impl FromStr for Preset {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mafia" => Ok(Preset::Mafia),
            "odd_one_out" => Ok(Preset::OddOneOut),
            "two_teams" => Ok(Preset::TwoTeams),
            "three_teams" => Ok(Preset::ThreeTeams),
            other => Err(ValidationError::UnknownPreset(other.to_string())),
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Appends a slot only when it has anyone in it.
fn push_slot(slots: &mut Vec<RoleSlot>, name: &str, quota: u32, color: &str) {
    if quota > 0 {
        slots.push(RoleSlot::new(name, quota, color));
    }
}

/// mafia `max(2, total/4)`, one police, one doctor, citizens for the rest.
/// Each count is clamped to what is left, so small tables lose citizens first,
/// then the doctor, then the police.
pub fn mafia(total: u32) -> Vec<RoleSlot> {
    let mut left = total;
    let mut take = |want: u32| {
        let n = want.min(left);
        left -= n;
        n
    };

    let mafia = take((total / 4).max(2));
    let police = take(1);
    let doctor = take(1);
    let citizens = take(u32::MAX);

    let mut slots = Vec::with_capacity(4);
    push_slot(&mut slots, "mafia", mafia, "red");
    push_slot(&mut slots, "police", police, "blue");
    push_slot(&mut slots, "doctor", doctor, "green");
    push_slot(&mut slots, "citizen", citizens, "gray");
    slots
}

/// One player against everyone else.
pub fn odd_one_out(total: u32) -> Vec<RoleSlot> {
    let mut slots = Vec::with_capacity(2);
    push_slot(&mut slots, "odd one out", total.min(1), "red");
    push_slot(&mut slots, "everyone else", total.saturating_sub(1), "gray");
    slots
}

/// `teams` groups whose sizes differ by at most one; earlier teams absorb the remainder.
pub fn even_split(total: u32, teams: u32) -> Vec<RoleSlot> {
    if teams == 0 {
        return Vec::new();
    }
    let base = total / teams;
    let extra = total % teams;

    let mut slots = Vec::with_capacity(teams as usize);
    for i in 0..teams {
        let quota = base + u32::from(i < extra);
        let color = TEAM_COLORS[i as usize % TEAM_COLORS.len()];
        push_slot(&mut slots, &format!("Team {}", i + 1), quota, color);
    }
    slots
}
