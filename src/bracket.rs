use crate::error::DeriveError;
use crate::outcome::{classify_game, GameView, StageContext};
use crate::snapshot::{DoubleEliminationInfo, GameStage, Robot};
use serde::Serialize;

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BracketGames {
  pub no_loss: Vec<GameView>,
  pub one_loss: Vec<GameView>,
  /// Every `*Final` stage lands here, without point annotations.
  pub finals: Vec<GameView>,
}

/// Sorts bracket games by stage, keeping the order they were played in.
pub fn partition_games(info: &DoubleEliminationInfo) -> Result<BracketGames, DeriveError> {
  let mut out = BracketGames::default();
  for game in &info.games {
    let stage = info
      .game_types
      .get(&game.id)
      .ok_or_else(|| DeriveError::UnclassifiedGame { game_id: game.id.clone() })?;
    match stage {
      GameStage::NoLoss => out.no_loss.push(classify_game(game, StageContext::Scored)?),
      GameStage::OneLoss => out.one_loss.push(classify_game(game, StageContext::Scored)?),
      GameStage::Final(_) => out.finals.push(classify_game(game, StageContext::Final)?),
    }
  }
  Ok(out)
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum Pairing {
  Match { robots: [Robot; 2] },
  AwaitingOpponent { robot: Robot },
}

impl Pairing {
  pub fn label(&self) -> String {
    match self {
      Pairing::Match { robots } => format!("{} vs {}", robots[0].name, robots[1].name),
      Pairing::AwaitingOpponent { robot } => format!("{} awaits an opponent", robot.name),
    }
  }
}

/// Pairs queued robots two at a time in queue order. An odd robot out waits
/// for an opponent.
pub fn pair_queue(queue: &[Robot]) -> Vec<Pairing> {
  queue
    .chunks(2)
    .filter_map(|chunk| match chunk {
      [first, second] => Some(Pairing::Match { robots: [first.clone(), second.clone()] }),
      [single] => Some(Pairing::AwaitingOpponent { robot: single.clone() }),
      _ => None,
    })
    .collect()
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Podium {
  pub first: Option<Robot>,
  pub second: Option<Robot>,
  pub third: Robot,
}

/// Champion is known once a single robot is left in the queues. Second and
/// third come from the tail of the elimination order. Without a third place
/// the podium is not final and nothing is returned.
pub fn derive_podium(info: &DoubleEliminationInfo) -> Option<Podium> {
  let robot_count = info.robots.len();
  let eliminated_at = |from_end: usize| {
    robot_count
      .checked_sub(from_end)
      .and_then(|index| info.eliminated_robots.get(index))
      .cloned()
  };
  let third = eliminated_at(3)?;
  let second = eliminated_at(2);
  let first = if info.no_loss_queue.len() + info.one_loss_queue.len() == 1 {
    info.no_loss_queue.iter().chain(&info.one_loss_queue).next().cloned()
  } else {
    None
  };
  Some(Podium { first, second, third })
}
