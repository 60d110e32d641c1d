//! Group, Phase and GroupKind.

use crate::models::game::{Match, MatchId};
use crate::models::player::{Player, PlayerId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a group.
pub type GroupId = Uuid;

/// One of the three fixed stages of a category.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    One,
    Two,
    /// The final group.
    Three,
}

impl Phase {
    pub fn number(self) -> u8 {
        match self {
            Phase::One => 1,
            Phase::Two => 2,
            Phase::Three => 3,
        }
    }

    pub fn next(self) -> Option<Phase> {
        match self {
            Phase::One => Some(Phase::Two),
            Phase::Two => Some(Phase::Three),
            Phase::Three => None,
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "phase {}", self.number())
    }
}

/// Regular round-robin group, or the synthetic group hosting cross-group playoffs.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupKind {
    #[default]
    Regular,
    Tiebreak,
}

/// A group of players in one category and phase, with its matches.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    /// Letter by creation order within category + phase ("A", "B", ...).
    pub name: String,
    pub category: String,
    pub phase: Phase,
    #[serde(default)]
    pub kind: GroupKind,
    pub players: Vec<Player>,
    pub matches: Vec<Match>,
}

impl Group {
    /// A regular group with no matches yet.
    pub fn new(name: impl Into<String>, category: impl Into<String>, phase: Phase, players: Vec<Player>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            category: category.into(),
            phase,
            kind: GroupKind::Regular,
            players,
            matches: Vec::new(),
        }
    }

    /// Empty playoff group for cross-group ties of `category` in `phase`.
    pub fn tiebreak(category: &str, phase: Phase) -> Self {
        Self {
            kind: GroupKind::Tiebreak,
            ..Self::new(tiebreak_group_name(category, phase), category, phase, Vec::new())
        }
    }

    pub fn is_regular(&self) -> bool {
        self.kind == GroupKind::Regular
    }

    pub fn belongs_to(&self, category: &str, phase: Phase) -> bool {
        self.category == category && self.phase == phase
    }

    /// Every match (tie playoffs included) has a result. A group with no matches is not complete.
    pub fn is_complete(&self) -> bool {
        !self.matches.is_empty() && self.matches.iter().all(|m| m.is_finished)
    }

    pub fn has_finished_match(&self) -> bool {
        self.matches.iter().any(|m| m.is_finished)
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    pub fn contains(&self, id: PlayerId) -> bool {
        self.player(id).is_some()
    }

    pub fn find_match(&self, id: MatchId) -> Option<&Match> {
        self.matches.iter().find(|m| m.id == id)
    }

    pub fn next_round(&self) -> u32 {
        self.matches.iter().map(|m| m.round).max().unwrap_or(0) + 1
    }
}

/// Group letter for the n-th group (0 → "A", 25 → "Z", 26 → "AA").
pub fn group_letter(index: usize) -> String {
    let mut n = index;
    let mut out = Vec::new();
    loop {
        out.push(b'A' + (n % 26) as u8);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}

/// Deterministic name of the synthetic playoff group for a category and phase.
pub fn tiebreak_group_name(category: &str, phase: Phase) -> String {
    format!("Tiebreak {} P{}", category, phase.number())
}
