use crate::bracket::{derive_podium, pair_queue, partition_games, BracketGames, Pairing, Podium};
use crate::error::DeriveError;
use crate::outcome::{classify_game, GameView, StageContext};
use crate::snapshot::{CompetitionSnapshot, DoubleEliminationInfo, Robot, SwissSystemInfo};
use crate::swiss::{rank_scoreboard, rounds_most_recent_first, RankedRobot, SwissRound};
use serde::Serialize;

// ── View model ─────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetitionView {
    pub name: String,
    pub double_elimination: Option<DoubleEliminationView>,
    pub swiss_system: Option<SwissView>,
    /// Sections left out because their data breaks the scoring rules.
    pub errors: Vec<SectionError>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ViewSection {
    DoubleElimination,
    SwissSystem,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionError {
    pub section: ViewSection,
    pub error: DeriveError,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PairingView {
    pub label: String,
    #[serde(flatten)]
    pub pairing: Pairing,
}

impl From<Pairing> for PairingView {
    fn from(pairing: Pairing) -> Self {
        PairingView { label: pairing.label(), pairing }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DoubleEliminationView {
    pub games: BracketGames,
    pub no_loss_pairings: Vec<PairingView>,
    pub one_loss_pairings: Vec<PairingView>,
    pub podium: Option<Podium>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwissRoundView {
    pub number: usize,
    pub title: String,
    pub games: Vec<GameView>,
    pub bye: Option<Robot>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwissView {
    pub round_count: usize,
    /// Most recent round first.
    pub rounds: Vec<SwissRoundView>,
    pub scoreboard: Vec<RankedRobot>,
}

// ── Derivation ─────────────────────────────────────────────────────────

/// Builds the full view for a snapshot. `None` means no competition has
/// been configured yet and nothing should be rendered. A section whose games
/// break the scoring rules is left out and reported in `errors`; the other
/// section still renders.
pub fn derive_view(snapshot: &CompetitionSnapshot) -> Option<CompetitionView> {
    let name = snapshot.name.as_ref()?;
    let mut errors = Vec::new();
    let double_elimination = snapshot
        .double_elimination_tournament
        .as_ref()
        .and_then(|info| section(derive_double_elimination(info), ViewSection::DoubleElimination, &mut errors));
    let swiss_system = snapshot
        .swiss_system_tournament
        .as_ref()
        .and_then(|info| section(derive_swiss(info), ViewSection::SwissSystem, &mut errors));
    Some(CompetitionView {
        name: name.clone(),
        double_elimination,
        swiss_system,
        errors,
    })
}

fn section<T>(result: Result<T, DeriveError>, section: ViewSection, errors: &mut Vec<SectionError>) -> Option<T> {
    result
        .map_err(|error| errors.push(SectionError { section, error }))
        .ok()
}

pub fn derive_double_elimination(info: &DoubleEliminationInfo) -> Result<DoubleEliminationView, DeriveError> {
    Ok(DoubleEliminationView {
        games: partition_games(info)?,
        no_loss_pairings: pairing_views(&info.no_loss_queue),
        one_loss_pairings: pairing_views(&info.one_loss_queue),
        podium: derive_podium(info),
    })
}

fn pairing_views(queue: &[Robot]) -> Vec<PairingView> {
    pair_queue(queue).into_iter().map(PairingView::from).collect()
}

pub fn derive_swiss(info: &SwissSystemInfo) -> Result<SwissView, DeriveError> {
    let grouped = rounds_most_recent_first(info);
    // Extra rounds opened by overflowing games count toward the total.
    let total = grouped.len();
    let rounds = grouped
        .iter()
        .map(|round| swiss_round_view(round, total))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(SwissView {
        round_count: info.round_count,
        rounds,
        scoreboard: rank_scoreboard(&info.robot_scores),
    })
}

fn swiss_round_view(round: &SwissRound<'_>, total: usize) -> Result<SwissRoundView, DeriveError> {
    let games = round
        .games
        .iter()
        .map(|game| classify_game(game, StageContext::Scored))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(SwissRoundView {
        number: round.number(),
        title: format!("Round {} of {}", round.number(), total),
        games,
        bye: round.bye.cloned(),
    })
}
