use crate::snapshot::{Game, Round, Score};

/// Number of valid scores on each side of a round, in side order.
pub fn count_valid_scores(round: &Round) -> [usize; 2] {
  [side_valid_count(round, 0), side_valid_count(round, 1)]
}

fn side_valid_count(round: &Round, side: usize) -> usize {
  round
    .scores
    .get(side)
    .map(|scores| count_valid(scores))
    .unwrap_or(0)
}

pub fn count_valid(scores: &[Score]) -> usize {
  scores.iter().filter(|score| score.is_valid).count()
}

/// Running score record for a game: one ` (a - b)` group per ended round,
/// followed by the free throws when the game needed them.
pub fn score_history(game: &Game) -> String {
  let mut out = String::new();
  for round in game.rounds.iter().filter(|round| round.has_ended) {
    let [side_0, side_1] = count_valid_scores(round);
    out.push_str(&format!(" ({side_0} - {side_1})"));
  }
  if let Some(free_throws) = &game.free_throws {
    let [side_0, side_1] = free_throws.scores;
    out.push_str(&format!(" ({side_0} - {side_1})"));
  }
  out
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::snapshot::fixtures::*;
  use crate::snapshot::FreeThrows;

  #[test]
  fn counts_only_valid_scores_per_side() {
    let round = Round { scores: vec![scores(2, 3), scores(0, 1)], has_ended: true };
    assert_eq!(count_valid_scores(&round), [2, 0]);
  }

  #[test]
  fn missing_sides_count_zero() {
    assert_eq!(count_valid_scores(&Round::default()), [0, 0]);
    let one_side = Round { scores: vec![scores(4, 0)], has_ended: true };
    assert_eq!(count_valid_scores(&one_side), [4, 0]);
  }

  #[test]
  fn valid_count_never_exceeds_list_length() {
    for (valid, invalid) in [(0, 0), (0, 5), (3, 0), (2, 2)] {
      let list = scores(valid, invalid);
      assert!(count_valid(&list) <= list.len());
      assert_eq!(count_valid(&list), valid);
    }
  }

  #[test]
  fn history_skips_rounds_still_running() {
    let a = robot("1", "Axel");
    let b = robot("2", "Bolt");
    let mut g = game("g", &a, &b);
    g.rounds = vec![
      ended_round(2, 1),
      Round { scores: vec![scores(5, 0), scores(5, 0)], has_ended: false },
      ended_round(0, 3),
    ];
    assert_eq!(score_history(&g), " (2 - 1) (0 - 3)");
  }

  #[test]
  fn history_appends_free_throws() {
    let a = robot("1", "Axel");
    let b = robot("2", "Bolt");
    let mut g = game("g", &a, &b);
    g.rounds = vec![ended_round(1, 1)];
    g.free_throws = Some(FreeThrows { scores: [4.0, 2.0] });
    assert_eq!(score_history(&g), " (1 - 1) (4 - 2)");
    g.free_throws = Some(FreeThrows { scores: [2.5, 3.0] });
    assert_eq!(score_history(&g), " (1 - 1) (2.5 - 3)");
  }

  #[test]
  fn history_of_unplayed_game_is_empty() {
    let g = game("g", &robot("1", "Axel"), &robot("2", "Bolt"));
    assert_eq!(score_history(&g), "");
  }
}
