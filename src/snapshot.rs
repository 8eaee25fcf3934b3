use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::{collections::HashMap, fmt};

// ── Identifiers ────────────────────────────────────────────────────────

/// Robot ids arrive as either JSON strings or numbers; both normalise to text.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RobotId(#[serde(deserialize_with = "deserialize_id")] pub String);

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameId(#[serde(deserialize_with = "deserialize_id")] pub String);

impl fmt::Display for RobotId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl fmt::Display for GameId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<&str> for RobotId {
  fn from(raw: &str) -> Self {
    RobotId(raw.to_string())
  }
}

impl From<&str> for GameId {
  fn from(raw: &str) -> Self {
    GameId(raw.to_string())
  }
}

fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
  D: Deserializer<'de>,
{
  let value = Value::deserialize(deserializer)?;
  value_to_id(&value)
    .ok_or_else(|| serde::de::Error::custom(format!("expected a string or number id, got {value}")))
}

pub fn value_to_id(value: &Value) -> Option<String> {
  match value {
    Value::String(raw) => Some(raw.clone()),
    Value::Number(num) => Some(num.to_string()),
    _ => None,
  }
}

// ── Robots and scores ──────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Robot {
  pub id: RobotId,
  pub name: String,
}

/// A single reported score. Invalid readings never count toward a side's total.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Score {
  #[serde(default)]
  pub value: f64,
  #[serde(default)]
  pub is_valid: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Round {
  /// One score list per side, in the same order as `Game::robots`.
  #[serde(default)]
  pub scores: Vec<Vec<Score>>,
  #[serde(default)]
  pub has_ended: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FreeThrows {
  /// Raw scores, one per side, shown as reported.
  pub scores: [f64; 2],
}

// ── Games ──────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GameResult {
  Won,
  Tied,
  #[default]
  Unknown,
}

/// Round tallies are counted from the winner's side when the game was won.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStatus {
  #[serde(default)]
  pub result: GameResult,
  #[serde(default)]
  pub winner: Option<Robot>,
  #[serde(default)]
  pub round_win_count: u32,
  #[serde(default)]
  pub round_tie_count: u32,
  #[serde(default)]
  pub round_loss_count: u32,
}

impl GameStatus {
  /// Total rounds in the tally; `None` when the counts cannot describe a real game.
  pub fn rounds_tallied(&self) -> Option<u32> {
    self
      .round_win_count
      .checked_add(self.round_tie_count)?
      .checked_add(self.round_loss_count)
  }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
  pub id: GameId,
  pub robots: [Robot; 2],
  #[serde(default)]
  pub rounds: Vec<Round>,
  #[serde(default)]
  pub free_throws: Option<FreeThrows>,
  #[serde(default)]
  pub status: GameStatus,
}

// ── Double elimination ─────────────────────────────────────────────────

/// Bracket stage of a double-elimination game. Every tag ending in `Final`
/// collapses into `Final`, keeping the specific tag for display.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum GameStage {
  NoLoss,
  OneLoss,
  Final(String),
}

impl TryFrom<String> for GameStage {
  type Error = String;

  fn try_from(tag: String) -> Result<Self, Self::Error> {
    match tag.as_str() {
      "noLoss" => Ok(GameStage::NoLoss),
      "oneLoss" => Ok(GameStage::OneLoss),
      _ if tag.ends_with("Final") => Ok(GameStage::Final(tag)),
      _ => Err(format!("Unknown game stage tag: {tag}")),
    }
  }
}

impl From<GameStage> for String {
  fn from(stage: GameStage) -> Self {
    match stage {
      GameStage::NoLoss => "noLoss".to_string(),
      GameStage::OneLoss => "oneLoss".to_string(),
      GameStage::Final(tag) => tag,
    }
  }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoubleEliminationInfo {
  #[serde(default)]
  pub robots: Vec<Robot>,
  #[serde(default)]
  pub games: Vec<Game>,
  #[serde(default)]
  pub game_types: HashMap<GameId, GameStage>,
  /// Robots waiting for their next match with no losses, in pairing order.
  #[serde(default)]
  pub no_loss_queue: Vec<Robot>,
  /// Robots waiting for their next match with one loss, in pairing order.
  #[serde(default)]
  pub one_loss_queue: Vec<Robot>,
  /// Elimination order, earliest first. Once the bracket is decided the
  /// last entries are 3rd and 2nd place.
  #[serde(default)]
  pub eliminated_robots: Vec<Robot>,
}

// ── Swiss system ───────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RobotScore {
  pub robot: Robot,
  #[serde(default)]
  pub score: f64,
  #[serde(default)]
  pub tie_break_score: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwissSystemInfo {
  #[serde(default)]
  pub robots: Vec<Robot>,
  #[serde(default)]
  pub round_count: usize,
  /// Chronological, `robots.len() / 2` games per round.
  #[serde(default)]
  pub games: Vec<Game>,
  /// Indexed by round; `None` when nobody sits out.
  #[serde(default)]
  pub byes: Vec<Option<RobotId>>,
  #[serde(default)]
  pub robot_scores: Vec<RobotScore>,
}

impl SwissSystemInfo {
  pub fn robot(&self, id: &RobotId) -> Option<&Robot> {
    self.robots.iter().find(|robot| &robot.id == id)
  }
}

// ── Snapshot ───────────────────────────────────────────────────────────

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetitionSnapshot {
  /// Absent until a competition has been configured.
  #[serde(default)]
  pub name: Option<String>,
  #[serde(default)]
  pub double_elimination_tournament: Option<DoubleEliminationInfo>,
  #[serde(default)]
  pub swiss_system_tournament: Option<SwissSystemInfo>,
  #[serde(default)]
  pub robots: Vec<Robot>,
}


#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn ids_accept_strings_and_numbers() {
    let robot: Robot = serde_json::from_str(r#"{"id": 7, "name": "Crusher"}"#).unwrap();
    assert_eq!(robot.id, RobotId::from("7"));
    let robot: Robot = serde_json::from_str(r#"{"id": "r-7", "name": "Crusher"}"#).unwrap();
    assert_eq!(robot.id, RobotId::from("r-7"));
    assert!(serde_json::from_str::<Robot>(r#"{"id": true, "name": "Crusher"}"#).is_err());
  }

  #[test]
  fn stage_tags_parse_into_closed_set() {
    let stages: Vec<GameStage> =
      serde_json::from_str(r#"["noLoss", "oneLoss", "grandFinal", "smallFinal"]"#).unwrap();
    assert_eq!(
      stages,
      vec![
        GameStage::NoLoss,
        GameStage::OneLoss,
        GameStage::Final("grandFinal".to_string()),
        GameStage::Final("smallFinal".to_string()),
      ]
    );
    assert!(serde_json::from_str::<GameStage>(r#""semi""#).is_err());
  }

  #[test]
  fn empty_object_is_unconfigured_snapshot() {
    let snapshot: CompetitionSnapshot = serde_json::from_str("{}").unwrap();
    assert_eq!(snapshot, CompetitionSnapshot::default());
    assert!(snapshot.name.is_none());
  }

  #[test]
  fn sample_snapshot_parses() {
    let snapshot: CompetitionSnapshot =
      serde_json::from_str(include_str!("../test_snapshots/sample_competition.json")).unwrap();
    assert_eq!(snapshot.name.as_deref(), Some("Spring Robot Cup"));
    let bracket = snapshot.double_elimination_tournament.unwrap();
    assert_eq!(bracket.robots.len(), 4);
    assert_eq!(bracket.game_types.len(), bracket.games.len());
    let swiss = snapshot.swiss_system_tournament.unwrap();
    assert_eq!(swiss.round_count, 3);
    assert_eq!(swiss.byes[1], Some(RobotId::from("5")));
  }

  #[test]
  fn free_throws_take_any_reported_number() {
    let free_throws: FreeThrows = serde_json::from_str(r#"{"scores": [2.5, -1]}"#).unwrap();
    assert_eq!(free_throws.scores, [2.5, -1.0]);
  }

  #[test]
  fn overflowing_tally_has_no_total() {
    let status: GameStatus =
      serde_json::from_str(r#"{"result": "won", "roundWinCount": 4294967295, "roundTieCount": 1}"#).unwrap();
    assert_eq!(status.rounds_tallied(), None);
    let status = GameStatus { round_win_count: 1, round_tie_count: 1, ..GameStatus::default() };
    assert_eq!(status.rounds_tallied(), Some(2));
  }
}
