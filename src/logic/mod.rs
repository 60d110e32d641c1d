//! Tournament business logic: scheduling, standings, ties, group draws and phase advancement.

mod advancement;
mod cross_group;
mod enrollment;
mod formation;
mod ranking;
mod rng;
mod scheduler;
mod scoring;
mod ties;
mod validation;

pub use advancement::{
    advance_phase, champion, check_advance, is_phase_complete, qualifiers, AdvanceCheck,
    AdvanceOutcome, Qualification,
};
pub use cross_group::{
    cross_group_ranking, cross_group_requirements, detect_cross_group_tie,
    pending_cross_group_ties, resolve_cross_group_tie_manual, resolve_cross_group_tie_random,
    resolve_cross_group_tie_singles, undo_cross_group_tiebreak, CrossGroupCandidate,
    CrossGroupRequirement, CrossGroupTie,
};
pub use enrollment::{
    add_category, add_player, clear_category, import_players_csv, remove_player, set_player_seed,
};
pub use formation::{form_groups, redraw_phase_one};
pub use ranking::{calculate_ranking, compare_entries, RankingEntry};
pub use rng::{RandomSource, SeededRng, SystemRng};
pub use scheduler::schedule_matches;
pub use scoring::{record_match_result, reopen_match};
pub use ties::{
    detect_ties, open_group_ties, resolve_group_tie_manual, resolve_group_tie_random,
    resolve_group_tie_singles, undo_group_tiebreak, TieGroup,
};
pub use validation::{
    plan_bracket, repechage_size, validate_match_score, BracketPlan, PhasePlanStep, GROUP_SIZE,
    MIN_PLAYERS,
};
