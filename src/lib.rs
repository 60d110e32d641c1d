//! Beach Tennis tournament engine: three-phase group-then-final brackets with
//! round-robin doubles groups, standings, tie resolution and phase advancement.

pub mod logic;
pub mod models;

pub use logic::{
    add_category, add_player, advance_phase, calculate_ranking, champion, check_advance,
    clear_category, cross_group_ranking, cross_group_requirements, detect_cross_group_tie,
    detect_ties, form_groups, import_players_csv, is_phase_complete, open_group_ties,
    pending_cross_group_ties, plan_bracket, qualifiers, record_match_result, redraw_phase_one,
    remove_player, reopen_match, resolve_cross_group_tie_manual, resolve_cross_group_tie_random,
    resolve_cross_group_tie_singles, resolve_group_tie_manual, resolve_group_tie_random,
    resolve_group_tie_singles, schedule_matches, set_player_seed, undo_cross_group_tiebreak,
    undo_group_tiebreak, validate_match_score, AdvanceCheck, AdvanceOutcome, BracketPlan,
    CrossGroupCandidate, CrossGroupTie, Qualification, RandomSource, RankingEntry, SeededRng,
    SystemRng, TieGroup,
};
pub use models::{
    CrossGroupTiebreak, GameConfig, Group, GroupId, GroupKind, Match, MatchId, MatchType, Phase,
    Player, PlayerId, PlayerStatus, QualificationType, ScoreError, SetScore, Side, TiebreakId,
    TiebreakMethod, Tournament, TournamentError, TournamentId,
};
