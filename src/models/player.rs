//! Player, enrollment status and the per-phase badges a player can carry.

use crate::models::group::Phase;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a player (used in matches, groups and tiebreak records).
pub type PlayerId = Uuid;

/// Where a player currently stands in the competition.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerStatus {
    /// On the waiting list, not yet placed in a group.
    #[default]
    Waiting,
    Enrolled,
    Eliminated,
}

/// How a player earned their place in the next phase.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualificationType {
    Direct,
    Repechage,
}

/// How a tie was broken (inside a group or across groups).
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TiebreakMethod {
    Manual,
    Random,
    /// A one-on-one playoff match decided it.
    Singles,
}

/// A player in one category of the tournament.
///
/// Groups keep their own copy of each player, so the badge fields below describe the
/// player as seen from that group's phase only.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub category: String,
    pub is_seed: bool,
    pub status: PlayerStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eliminated_in_phase: Option<Phase>,
    /// Only set on copies living in a completed (read-only) phase.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qualification_type: Option<QualificationType>,
    /// Position inside a resolved tie, 1 = best.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tiebreak_order: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tiebreak_method: Option<TiebreakMethod>,
}

impl Player {
    /// Create a waiting, unseeded player in the given category.
    pub fn new(name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            category: category.into(),
            is_seed: false,
            status: PlayerStatus::Waiting,
            eliminated_in_phase: None,
            qualification_type: None,
            tiebreak_order: None,
            tiebreak_method: None,
        }
    }

    /// Builder-style seed flag.
    pub fn seeded(mut self, is_seed: bool) -> Self {
        self.is_seed = is_seed;
        self
    }

    pub fn clear_tiebreak(&mut self) {
        self.tiebreak_order = None;
        self.tiebreak_method = None;
    }

    /// Drop every badge earned in a previous phase (tiebreak, qualification, elimination).
    pub fn clear_phase_badges(&mut self) {
        self.clear_tiebreak();
        self.eliminated_in_phase = None;
        self.qualification_type = None;
    }

    /// Copy of this player as placed in a freshly built group.
    pub fn placed(&self) -> Self {
        let mut p = self.clone();
        p.clear_phase_badges();
        p.status = PlayerStatus::Enrolled;
        p
    }

    /// Back to the waiting list with every phase marker reset. Seed flag is kept.
    pub fn reset_to_waiting(&mut self) {
        self.clear_phase_badges();
        self.status = PlayerStatus::Waiting;
    }

    /// Mark the player as eliminated in the given phase.
    pub fn eliminate(&mut self, phase: Phase) {
        self.status = PlayerStatus::Eliminated;
        self.eliminated_in_phase = Some(phase);
        self.qualification_type = None;
    }

    pub fn qualify(&mut self, qualification: QualificationType) {
        self.qualification_type = Some(qualification);
    }
}
