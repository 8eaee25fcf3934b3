use crate::snapshot::{GameId, RobotId};
use serde::{Serialize, Serializer};

/// Snapshot data that contradicts the scoring rules. Distinct from a game
/// that simply has not been decided yet.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeriveError {
    #[error("game {game_id}: round tally of {wins} won, {ties} tied, {losses} lost matches no scoring outcome")]
    InconsistentRoundTally {
        game_id: GameId,
        wins: u32,
        ties: u32,
        losses: u32,
    },
    #[error("game {game_id} is marked as won but has no winner")]
    MissingWinner { game_id: GameId },
    #[error("game {game_id}: winner {winner_id} is not one of its robots")]
    UnknownWinner { game_id: GameId, winner_id: RobotId },
    #[error("game {game_id} has no bracket stage")]
    UnclassifiedGame { game_id: GameId },
}

impl Serialize for DeriveError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
