use crate::snapshot::{Game, Robot, RobotScore, SwissSystemInfo};
use serde::Serialize;
use std::cmp::Ordering;

/// One Swiss round. `index` is the stored, zero-based round index used for
/// bye lookup; it does not change with display order.
#[derive(Clone, Debug, PartialEq)]
pub struct SwissRound<'a> {
  pub index: usize,
  pub games: &'a [Game],
  pub bye: Option<&'a Robot>,
}

impl SwissRound<'_> {
  pub fn number(&self) -> usize {
    self.index + 1
  }
}

pub fn games_per_round(robot_count: usize) -> usize {
  robot_count / 2
}

/// Splits the flat game list into rounds in stored order. At least
/// `round_count` rounds are returned so rounds holding only a bye still show
/// up; games beyond the planned rounds open further rounds.
pub fn group_rounds(info: &SwissSystemInfo) -> Vec<SwissRound<'_>> {
  // With fewer than two robots no pairing is possible; keep every game anyway.
  let per_round = games_per_round(info.robots.len()).max(1);
  let chunks: Vec<&[Game]> = info.games.chunks(per_round).collect();
  let total = info.round_count.max(chunks.len());
  (0..total)
    .map(|index| SwissRound {
      index,
      games: chunks.get(index).copied().unwrap_or(&[]),
      bye: info
        .byes
        .get(index)
        .and_then(|bye| bye.as_ref())
        .and_then(|id| info.robot(id)),
    })
    .collect()
}

pub fn rounds_most_recent_first(info: &SwissSystemInfo) -> Vec<SwissRound<'_>> {
  let mut rounds = group_rounds(info);
  rounds.reverse();
  rounds
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedRobot {
  pub rank: usize,
  pub robot: Robot,
  pub score: f64,
  pub tie_break_score: f64,
}

fn compare_standing(a: &RobotScore, b: &RobotScore) -> Ordering {
  b.score
    .total_cmp(&a.score)
    .then_with(|| b.tie_break_score.total_cmp(&a.tie_break_score))
}

/// Score descending, then tie-break score descending. Entries equal on both
/// keep their input order.
pub fn rank_scoreboard(robot_scores: &[RobotScore]) -> Vec<RankedRobot> {
  let mut sorted: Vec<&RobotScore> = robot_scores.iter().collect();
  sorted.sort_by(|a, b| compare_standing(a, b));
  sorted
    .into_iter()
    .enumerate()
    .map(|(position, entry)| RankedRobot {
      rank: position + 1,
      robot: entry.robot.clone(),
      score: entry.score,
      tie_break_score: entry.tie_break_score,
    })
    .collect()
}
