//! Categories and the waiting list: adding, importing, removing and resetting players.

use crate::models::{Player, PlayerId, Tournament, TournamentError};
use serde::Deserialize;
use std::io::Read;

/// Declare a new category (bracket).
pub fn add_category(tournament: &mut Tournament, name: &str) -> Result<(), TournamentError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(TournamentError::EmptyName);
    }
    if tournament
        .categories
        .iter()
        .any(|c| c.eq_ignore_ascii_case(name))
    {
        return Err(TournamentError::DuplicateCategory(name.to_string()));
    }
    tournament.categories.push(name.to_string());
    Ok(())
}

fn name_taken(tournament: &Tournament, category: &str, name: &str) -> bool {
    tournament
        .known_players_in(category)
        .any(|p| p.name.eq_ignore_ascii_case(name))
}

/// Put a new player on the category's waiting list. Names are unique per category
/// (case-insensitive), across the waiting list and every group.
pub fn add_player(
    tournament: &mut Tournament,
    name: &str,
    category: &str,
    is_seed: bool,
) -> Result<PlayerId, TournamentError> {
    tournament.require_category(category)?;
    if tournament.is_category_completed(category) {
        return Err(TournamentError::CategoryCompleted(category.to_string()));
    }
    let name = name.trim();
    if name.is_empty() {
        return Err(TournamentError::EmptyName);
    }
    if name_taken(tournament, category, name) {
        return Err(TournamentError::DuplicatePlayerName(name.to_string()));
    }
    let player = Player::new(name, category).seeded(is_seed);
    let id = player.id;
    tournament.waiting_list.push(player);
    Ok(id)
}

/// Remove a player from the waiting list. Players already placed in a group stay.
pub fn remove_player(tournament: &mut Tournament, player_id: PlayerId) -> Result<(), TournamentError> {
    let idx = tournament
        .waiting_list
        .iter()
        .position(|p| p.id == player_id)
        .ok_or(TournamentError::PlayerNotFound(player_id))?;
    tournament.waiting_list.remove(idx);
    Ok(())
}

/// Toggle the seed flag of a waiting player.
pub fn set_player_seed(tournament: &mut Tournament, player_id: PlayerId, is_seed: bool) -> Result<(), TournamentError> {
    let p = tournament
        .waiting_list
        .iter_mut()
        .find(|p| p.id == player_id)
        .ok_or(TournamentError::PlayerNotFound(player_id))?;
    p.is_seed = is_seed;
    Ok(())
}

#[derive(Debug, Deserialize)]
struct RosterRow {
    name: String,
    #[serde(default)]
    seed: Option<String>,
}

fn parse_seed(value: Option<&str>) -> bool {
    matches!(
        value.map(|v| v.trim().to_ascii_lowercase()).as_deref(),
        Some("1" | "true" | "yes" | "y" | "x" | "seed")
    )
}

/// Import a roster from CSV with a `name` column and an optional `seed` column
/// (`1`, `true`, `yes`, `y`, `x` mark a seed). All rows are checked before any player is
/// added: one bad row rejects the whole file.
pub fn import_players_csv<R: Read>(
    tournament: &mut Tournament,
    category: &str,
    reader: R,
) -> Result<Vec<PlayerId>, TournamentError> {
    tournament.require_category(category)?;
    if tournament.is_category_completed(category) {
        return Err(TournamentError::CategoryCompleted(category.to_string()));
    }
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let mut incoming: Vec<Player> = Vec::new();
    for row in rdr.deserialize::<RosterRow>() {
        let row = row.map_err(|e| TournamentError::Csv(e.to_string()))?;
        let name = row.name.trim();
        if name.is_empty() {
            return Err(TournamentError::EmptyName);
        }
        let repeated = incoming.iter().any(|p| p.name.eq_ignore_ascii_case(name));
        if repeated || name_taken(tournament, category, name) {
            return Err(TournamentError::DuplicatePlayerName(name.to_string()));
        }
        incoming.push(Player::new(name, category).seeded(parse_seed(row.seed.as_deref())));
    }

    let ids = incoming.iter().map(|p| p.id).collect();
    log::info!("Imported {} player(s) into category {}", incoming.len(), category);
    tournament.waiting_list.extend(incoming);
    Ok(ids)
}

/// Wipe a category's bracket: every player placed in any of its groups goes back to the
/// waiting list with phase markers reset, and its groups, tiebreak records and completed
/// flag are removed. Returns how many players went back to the waiting list.
pub fn clear_category(tournament: &mut Tournament, category: &str) -> Result<usize, TournamentError> {
    tournament.require_category(category)?;

    let mut returning: Vec<Player> = Vec::new();
    for p in tournament
        .groups
        .iter()
        .filter(|g| g.is_regular() && g.category == category)
        .flat_map(|g| g.players.iter())
    {
        let already = returning.iter().any(|r| r.id == p.id)
            || tournament.waiting_list.iter().any(|w| w.id == p.id);
        if !already {
            let mut back = p.clone();
            back.reset_to_waiting();
            returning.push(back);
        }
    }

    tournament.groups.retain(|g| g.category != category);
    tournament
        .cross_group_tiebreaks
        .retain(|tb| tb.category != category);
    tournament.completed_categories.retain(|c| c != category);
    let count = returning.len();
    tournament.waiting_list.extend(returning);
    log::info!("Cleared category {}: {} player(s) back on the waiting list", category, count);
    Ok(count)
}
