//! Single binary web server exposing the tournament engine as a JSON API.
//! Run with: cargo run --bin web
//! Listens on 0.0.0.0:8080 by default.
//! Override with env: HOST (e.g. 0.0.0.0), PORT (e.g. 8080), SNAPSHOT_TTL_HOURS (e.g. 12).

use actix_web::{
    delete, get, post, put,
    web::{Data, Json, Path},
    App, HttpResponse, HttpServer, Responder,
};
use beach_tennis_tournament::{
    add_category, add_player, advance_phase, calculate_ranking, champion, check_advance,
    clear_category, cross_group_ranking, form_groups, import_players_csv, open_group_ties,
    pending_cross_group_ties, plan_bracket, record_match_result, redraw_phase_one,
    remove_player, reopen_match, resolve_cross_group_tie_manual, resolve_cross_group_tie_random,
    resolve_cross_group_tie_singles, resolve_group_tie_manual, resolve_group_tie_random,
    resolve_group_tie_singles, set_player_seed, undo_cross_group_tiebreak, undo_group_tiebreak,
    GameConfig, GroupId, MatchId, Phase, PlayerId, SetScore, SystemRng, TiebreakId, Tournament,
    TournamentError, TournamentId,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::RwLock;
use std::time::{Duration, Instant};

/// Per-tournament entry: the snapshot plus last activity time (for auto-cleanup).
struct TournamentEntry {
    tournament: Tournament,
    last_activity: Instant,
}

type AppState = Data<RwLock<HashMap<TournamentId, TournamentEntry>>>;

/// How long an untouched tournament is kept.
#[derive(Clone, Copy)]
struct SnapshotTtl(Duration);

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    service: &'static str,
}

#[derive(Deserialize)]
struct CreateTournamentBody {
    name: String,
    #[serde(default)]
    categories: Vec<String>,
}

#[derive(Deserialize)]
struct CategoryBody {
    name: String,
}

#[derive(Deserialize)]
struct AddPlayerBody {
    name: String,
    #[serde(default)]
    is_seed: bool,
}

#[derive(Deserialize)]
struct SeedBody {
    is_seed: bool,
}

#[derive(Deserialize)]
struct MatchResultBody {
    sets: Vec<SetScore>,
}

/// How a tie should be broken.
#[derive(Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
enum GroupTieResolution {
    /// Caller gives the final order, best first.
    Manual { ordered_ids: Vec<PlayerId> },
    Random { player_ids: Vec<PlayerId> },
    Singles { player_ids: Vec<PlayerId> },
}

#[derive(Deserialize)]
struct UndoGroupTieBody {
    player_ids: Vec<PlayerId>,
}

#[derive(Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
enum CrossTieResolution {
    Manual { winner_id: PlayerId },
    Random,
    Singles,
}

#[derive(Deserialize)]
struct TournamentPath {
    id: TournamentId,
}

#[derive(Deserialize)]
struct CategoryPath {
    id: TournamentId,
    category: String,
}

#[derive(Deserialize)]
struct PhasePath {
    id: TournamentId,
    category: String,
    phase: Phase,
}

#[derive(Deserialize)]
struct CrossTiePath {
    id: TournamentId,
    category: String,
    phase: Phase,
    position: usize,
}

#[derive(Deserialize)]
struct PlayerPath {
    id: TournamentId,
    player_id: PlayerId,
}

#[derive(Deserialize)]
struct GroupPath {
    id: TournamentId,
    group_id: GroupId,
}

#[derive(Deserialize)]
struct MatchPath {
    id: TournamentId,
    match_id: MatchId,
}

#[derive(Deserialize)]
struct TiebreakPath {
    id: TournamentId,
    tiebreak_id: TiebreakId,
}

fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(serde_json::json!({ "error": "No tournament" }))
}

fn lock_error() -> HttpResponse {
    HttpResponse::InternalServerError().body("lock error")
}

fn bad_request(e: TournamentError) -> HttpResponse {
    HttpResponse::BadRequest().json(serde_json::json!({ "error": e.to_string() }))
}

/// Run an engine operation on a copy of the snapshot; the copy replaces the stored
/// snapshot only when the operation succeeds. Responds with the operation's output and
/// the resulting tournament.
fn apply<T, F>(state: &AppState, id: TournamentId, op: F) -> HttpResponse
where
    T: Serialize,
    F: FnOnce(&mut Tournament) -> Result<T, TournamentError>,
{
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    let entry = match g.get_mut(&id) {
        Some(e) => e,
        None => return not_found(),
    };
    entry.last_activity = Instant::now();
    let mut draft = entry.tournament.clone();
    match op(&mut draft) {
        Ok(result) => {
            entry.tournament = draft;
            HttpResponse::Ok().json(serde_json::json!({
                "result": result,
                "tournament": &entry.tournament,
            }))
        }
        Err(e) => bad_request(e),
    }
}

/// Read-only query against a snapshot. Still refreshes last_activity.
fn view<T, F>(state: &AppState, id: TournamentId, query: F) -> HttpResponse
where
    T: Serialize,
    F: FnOnce(&Tournament) -> Result<T, TournamentError>,
{
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    let entry = match g.get_mut(&id) {
        Some(e) => e,
        None => return not_found(),
    };
    entry.last_activity = Instant::now();
    match query(&entry.tournament) {
        Ok(out) => HttpResponse::Ok().json(out),
        Err(e) => bad_request(e),
    }
}

#[get("/api/health")]
async fn api_health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        ok: true,
        service: "beach-tennis-tournament",
    })
}

#[get("/favicon.ico")]
async fn favicon() -> HttpResponse {
    HttpResponse::NoContent().finish()
}

/// Create a tournament (returns it with id; the client keeps the id for later requests).
#[post("/api/tournaments")]
async fn api_create_tournament(state: AppState, body: Json<CreateTournamentBody>) -> HttpResponse {
    let mut tournament = Tournament::new(body.name.trim());
    if tournament.name.is_empty() {
        return bad_request(TournamentError::EmptyName);
    }
    for category in &body.categories {
        if let Err(e) = add_category(&mut tournament, category) {
            return bad_request(e);
        }
    }
    let id = tournament.id;
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    log::info!("Created tournament {} ({})", tournament.name, id);
    let response = HttpResponse::Ok().json(&tournament);
    g.insert(
        id,
        TournamentEntry {
            tournament,
            last_activity: Instant::now(),
        },
    );
    response
}

#[get("/api/tournaments/{id}")]
async fn api_get_tournament(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    view(&state, path.id, |t| Ok(t.clone()))
}

#[delete("/api/tournaments/{id}")]
async fn api_delete_tournament(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    match g.remove(&path.id) {
        Some(_) => HttpResponse::NoContent().finish(),
        None => not_found(),
    }
}

#[post("/api/tournaments/{id}/categories")]
async fn api_add_category(state: AppState, path: Path<TournamentPath>, body: Json<CategoryBody>) -> HttpResponse {
    apply(&state, path.id, |t| add_category(t, &body.name))
}

/// Replace scoring rules; refused once any match has a result.
#[put("/api/tournaments/{id}/game-config")]
async fn api_set_game_config(state: AppState, path: Path<TournamentPath>, body: Json<GameConfig>) -> HttpResponse {
    let config = body.into_inner();
    apply(&state, path.id, move |t| t.set_game_config(config))
}

#[post("/api/tournaments/{id}/categories/{category}/players")]
async fn api_add_player(state: AppState, path: Path<CategoryPath>, body: Json<AddPlayerBody>) -> HttpResponse {
    apply(&state, path.id, |t| add_player(t, &body.name, &path.category, body.is_seed))
}

/// Roster upload: raw CSV body with a `name` column and optional `seed` column.
#[post("/api/tournaments/{id}/categories/{category}/players/import")]
async fn api_import_players(state: AppState, path: Path<CategoryPath>, body: String) -> HttpResponse {
    apply(&state, path.id, |t| import_players_csv(t, &path.category, body.as_bytes()))
}

#[delete("/api/tournaments/{id}/players/{player_id}")]
async fn api_remove_player(state: AppState, path: Path<PlayerPath>) -> HttpResponse {
    apply(&state, path.id, |t| remove_player(t, path.player_id))
}

#[put("/api/tournaments/{id}/players/{player_id}/seed")]
async fn api_set_seed(state: AppState, path: Path<PlayerPath>, body: Json<SeedBody>) -> HttpResponse {
    apply(&state, path.id, |t| set_player_seed(t, path.player_id, body.is_seed))
}

/// Bracket preview for the category's current waiting list plus already placed players.
#[get("/api/tournaments/{id}/categories/{category}/plan")]
async fn api_plan(state: AppState, path: Path<CategoryPath>) -> HttpResponse {
    view(&state, path.id, |t| {
        t.require_category(&path.category)?;
        let distinct: HashSet<PlayerId> = t.known_players_in(&path.category).map(|p| p.id).collect();
        Ok(plan_bracket(distinct.len()))
    })
}

#[post("/api/tournaments/{id}/categories/{category}/groups")]
async fn api_form_groups(state: AppState, path: Path<CategoryPath>) -> HttpResponse {
    apply(&state, path.id, |t| form_groups(t, &path.category, &mut SystemRng))
}

#[post("/api/tournaments/{id}/categories/{category}/redraw")]
async fn api_redraw(state: AppState, path: Path<CategoryPath>) -> HttpResponse {
    apply(&state, path.id, |t| redraw_phase_one(t, &path.category, &mut SystemRng))
}

#[post("/api/tournaments/{id}/categories/{category}/clear")]
async fn api_clear_category(state: AppState, path: Path<CategoryPath>) -> HttpResponse {
    apply(&state, path.id, |t| clear_category(t, &path.category))
}

/// Standings of a group plus its open ties.
#[get("/api/tournaments/{id}/groups/{group_id}/ranking")]
async fn api_group_ranking(state: AppState, path: Path<GroupPath>) -> HttpResponse {
    view(&state, path.id, |t| {
        let group = t.group(path.group_id)?;
        Ok(serde_json::json!({
            "ranking": calculate_ranking(group),
            "ties": open_group_ties(group),
        }))
    })
}

#[post("/api/tournaments/{id}/groups/{group_id}/ties")]
async fn api_resolve_group_tie(
    state: AppState,
    path: Path<GroupPath>,
    body: Json<GroupTieResolution>,
) -> HttpResponse {
    let group_id = path.group_id;
    apply(&state, path.id, |t| match &*body {
        GroupTieResolution::Manual { ordered_ids } => {
            resolve_group_tie_manual(t, group_id, ordered_ids).map(|()| serde_json::Value::Null)
        }
        GroupTieResolution::Random { player_ids } => {
            resolve_group_tie_random(t, group_id, player_ids, &mut SystemRng)
                .map(|order| serde_json::json!({ "order": order }))
        }
        GroupTieResolution::Singles { player_ids } => resolve_group_tie_singles(t, group_id, player_ids)
            .map(|match_id| serde_json::json!({ "match_id": match_id })),
    })
}

#[post("/api/tournaments/{id}/groups/{group_id}/ties/undo")]
async fn api_undo_group_tie(state: AppState, path: Path<GroupPath>, body: Json<UndoGroupTieBody>) -> HttpResponse {
    apply(&state, path.id, |t| undo_group_tiebreak(t, path.group_id, &body.player_ids))
}

#[put("/api/tournaments/{id}/matches/{match_id}")]
async fn api_record_result(state: AppState, path: Path<MatchPath>, body: Json<MatchResultBody>) -> HttpResponse {
    let (id, match_id) = (path.id, path.match_id);
    let sets = body.into_inner().sets;
    apply(&state, id, move |t| record_match_result(t, match_id, sets))
}

#[post("/api/tournaments/{id}/matches/{match_id}/reopen")]
async fn api_reopen_match(state: AppState, path: Path<MatchPath>) -> HttpResponse {
    apply(&state, path.id, |t| reopen_match(t, path.match_id))
}

/// Open cross-group ties of the category's current phase.
#[get("/api/tournaments/{id}/categories/{category}/cross-ties")]
async fn api_cross_ties(state: AppState, path: Path<CategoryPath>) -> HttpResponse {
    view(&state, path.id, |t| {
        t.require_category(&path.category)?;
        Ok(pending_cross_group_ties(t, &path.category))
    })
}

#[get("/api/tournaments/{id}/categories/{category}/phases/{phase}/cross-ranking/{position}")]
async fn api_cross_ranking(state: AppState, path: Path<CrossTiePath>) -> HttpResponse {
    view(&state, path.id, |t| {
        t.require_category(&path.category)?;
        Ok(cross_group_ranking(t, &path.category, path.phase, path.position))
    })
}

#[post("/api/tournaments/{id}/categories/{category}/phases/{phase}/cross-ties/{position}")]
async fn api_resolve_cross_tie(
    state: AppState,
    path: Path<CrossTiePath>,
    body: Json<CrossTieResolution>,
) -> HttpResponse {
    let (category, phase, position) = (path.category.as_str(), path.phase, path.position);
    apply(&state, path.id, |t| match &*body {
        CrossTieResolution::Manual { winner_id } => {
            resolve_cross_group_tie_manual(t, category, phase, position, *winner_id)
                .map(|tiebreak_id| serde_json::json!({ "tiebreak_id": tiebreak_id }))
        }
        CrossTieResolution::Random => {
            resolve_cross_group_tie_random(t, category, phase, position, &mut SystemRng)
                .map(|winner_id| serde_json::json!({ "winner_id": winner_id }))
        }
        CrossTieResolution::Singles => resolve_cross_group_tie_singles(t, category, phase, position)
            .map(|match_id| serde_json::json!({ "match_id": match_id })),
    })
}

#[delete("/api/tournaments/{id}/cross-tiebreaks/{tiebreak_id}")]
async fn api_undo_cross_tie(state: AppState, path: Path<TiebreakPath>) -> HttpResponse {
    apply(&state, path.id, |t| undo_cross_group_tiebreak(t, path.tiebreak_id))
}

#[get("/api/tournaments/{id}/categories/{category}/advance")]
async fn api_check_advance(state: AppState, path: Path<CategoryPath>) -> HttpResponse {
    view(&state, path.id, |t| Ok(check_advance(t, &path.category)))
}

#[post("/api/tournaments/{id}/categories/{category}/advance")]
async fn api_advance(state: AppState, path: Path<CategoryPath>) -> HttpResponse {
    apply(&state, path.id, |t| advance_phase(t, &path.category, &mut SystemRng))
}

#[get("/api/tournaments/{id}/categories/{category}/champion")]
async fn api_champion(state: AppState, path: Path<CategoryPath>) -> HttpResponse {
    view(&state, path.id, |t| {
        t.require_category(&path.category)?;
        Ok(champion(t, &path.category).cloned())
    })
}

/// Regular groups of one phase, with their matches.
#[get("/api/tournaments/{id}/categories/{category}/phases/{phase}/groups")]
async fn api_phase_groups(state: AppState, path: Path<PhasePath>) -> HttpResponse {
    view(&state, path.id, |t| {
        t.require_category(&path.category)?;
        Ok(t.groups_in(&path.category, path.phase).cloned().collect::<Vec<_>>())
    })
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_ttl_hours() -> u64 {
    12
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let host = std::env::var("HOST").unwrap_or_else(|_| default_host());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or_else(default_port);
    let ttl_hours: u64 = std::env::var("SNAPSHOT_TTL_HOURS")
        .ok()
        .and_then(|h| h.parse().ok())
        .unwrap_or_else(default_ttl_hours);
    let ttl = SnapshotTtl(Duration::from_secs(ttl_hours * 3600));
    let bind = (host.as_str(), port);
    log::info!("Starting server at http://{}:{}", bind.0, bind.1);

    let state = Data::new(RwLock::new(HashMap::<TournamentId, TournamentEntry>::new()));

    // Every 30 minutes, drop tournaments untouched for longer than the TTL
    let state_cleanup = state.clone();
    actix_web::rt::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(30 * 60));
        loop {
            interval.tick().await;
            let mut g = match state_cleanup.write() {
                Ok(guard) => guard,
                Err(_) => continue,
            };
            let before = g.len();
            g.retain(|_, entry| entry.last_activity.elapsed() < ttl.0);
            let removed = before - g.len();
            if removed > 0 {
                log::info!("Cleaned up {} inactive tournament(s) (no activity for {}h)", removed, ttl_hours);
            }
        }
    });

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .service(api_health)
            .service(favicon)
            .service(api_create_tournament)
            .service(api_get_tournament)
            .service(api_delete_tournament)
            .service(api_add_category)
            .service(api_set_game_config)
            .service(api_import_players)
            .service(api_add_player)
            .service(api_remove_player)
            .service(api_set_seed)
            .service(api_plan)
            .service(api_form_groups)
            .service(api_redraw)
            .service(api_clear_category)
            .service(api_group_ranking)
            .service(api_undo_group_tie)
            .service(api_resolve_group_tie)
            .service(api_record_result)
            .service(api_reopen_match)
            .service(api_cross_ties)
            .service(api_cross_ranking)
            .service(api_resolve_cross_tie)
            .service(api_undo_cross_tie)
            .service(api_check_advance)
            .service(api_advance)
            .service(api_champion)
            .service(api_phase_groups)
    })
    .bind(bind)?
    .run()
    .await
}
