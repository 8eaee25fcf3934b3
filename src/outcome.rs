use crate::error::DeriveError;
use crate::scores::score_history;
use crate::snapshot::{Game, GameId, GameResult, GameStatus, Robot};
use serde::{Serialize, Serializer};
use std::fmt;

/// Whether a game's result carries a fractional point annotation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StageContext {
  Scored,
  Final,
}

/// Point value held in tenths so the rule table stays exact.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Points(u8);

impl Points {
  pub const FULL: Points = Points(10);

  pub fn tenths(self) -> u8 {
    self.0
  }

  pub fn as_f64(self) -> f64 {
    f64::from(self.0) / 10.0
  }

  fn remainder(self) -> Points {
    Points(Self::FULL.0.saturating_sub(self.0))
  }
}

impl fmt::Display for Points {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.0 % 10 == 0 {
      write!(f, "{}", self.0 / 10)
    } else {
      write!(f, "{}.{}", self.0 / 10, self.0 % 10)
    }
  }
}

impl Serialize for Points {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(self.as_f64())
  }
}

/// Points per robot, in the game's robot order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PointSplit {
  pub robots: [Points; 2],
}

impl fmt::Display for PointSplit {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} - {}", self.robots[0], self.robots[1])
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum GameProgress {
  NotStarted,
  InProgress,
  Decided,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Outcome {
  pub text: String,
  /// Wins are highlighted; ties are shown plainly.
  pub emphasized: bool,
  pub winner: Option<Robot>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameView {
  pub id: GameId,
  pub label: String,
  pub progress: GameProgress,
  pub score_history: Option<String>,
  pub outcome: Option<Outcome>,
  pub points: Option<PointSplit>,
  pub points_text: Option<String>,
}

pub fn game_label(game: &Game) -> String {
  format!("{} vs {}", game.robots[0].name, game.robots[1].name)
}

pub fn game_progress(game: &Game) -> GameProgress {
  if game.status.result != GameResult::Unknown {
    return GameProgress::Decided;
  }
  match game.rounds.first() {
    Some(first) if first.has_ended => GameProgress::InProgress,
    _ => GameProgress::NotStarted,
  }
}

pub fn classify_game(game: &Game, context: StageContext) -> Result<GameView, DeriveError> {
  let label = game_label(game);
  let progress = game_progress(game);
  let mut view = GameView {
    id: game.id.clone(),
    label,
    progress,
    score_history: None,
    outcome: None,
    points: None,
    points_text: None,
  };
  if progress == GameProgress::NotStarted {
    return Ok(view);
  }
  view.score_history = Some(score_history(game));
  if progress == GameProgress::InProgress {
    return Ok(view);
  }

  view.outcome = Some(game_outcome(game)?);
  if context == StageContext::Scored {
    let split = point_split(game)?;
    view.points_text = Some(split.to_string());
    view.points = Some(split);
  }
  Ok(view)
}

fn game_outcome(game: &Game) -> Result<Outcome, DeriveError> {
  match game.status.result {
    GameResult::Won => {
      let winner = game.robots[winner_index(game)?].clone();
      Ok(Outcome {
        text: format!("{} won", winner.name),
        emphasized: true,
        winner: Some(winner),
      })
    }
    GameResult::Tied => Ok(Outcome {
      text: "tied".to_string(),
      emphasized: false,
      winner: None,
    }),
    GameResult::Unknown => Err(DeriveError::MissingWinner { game_id: game.id.clone() }),
  }
}

/// Index of the winning robot within `game.robots`.
pub fn winner_index(game: &Game) -> Result<usize, DeriveError> {
  let winner = game
    .status
    .winner
    .as_ref()
    .ok_or_else(|| DeriveError::MissingWinner { game_id: game.id.clone() })?;
  game
    .robots
    .iter()
    .position(|robot| robot.id == winner.id)
    .ok_or_else(|| DeriveError::UnknownWinner {
      game_id: game.id.clone(),
      winner_id: winner.id.clone(),
    })
}

/// Points for a decided game, in robot order.
pub fn point_split(game: &Game) -> Result<PointSplit, DeriveError> {
  match game.status.result {
    GameResult::Tied => Ok(PointSplit { robots: [Points(5), Points(5)] }),
    GameResult::Won => {
      let winner_points = winner_points(&game.id, &game.status)?;
      let mut robots = [winner_points.remainder(); 2];
      robots[winner_index(game)?] = winner_points;
      Ok(PointSplit { robots })
    }
    GameResult::Unknown => Err(DeriveError::MissingWinner { game_id: game.id.clone() }),
  }
}

/// Winner's share from the winner's round tally. A straight two-round game
/// is worth the full point; three-round decisions give up a tenth for each
/// round the loser kept level or took.
pub fn winner_points(game_id: &GameId, status: &GameStatus) -> Result<Points, DeriveError> {
  if status.rounds_tallied() == Some(2) {
    return Ok(Points::FULL);
  }
  match (status.round_win_count, status.round_tie_count, status.round_loss_count) {
    (2, 1, 0) => Ok(Points(9)),
    (2, 0, 1) => Ok(Points(8)),
    (1, 2, 0) => Ok(Points(7)),
    (wins, ties, losses) => Err(DeriveError::InconsistentRoundTally {
      game_id: game_id.clone(),
      wins,
      ties,
      losses,
    }),
  }
}
