use crate::domain::event::{PlayerScore, Position, RoundScoreOrStatus, StatusToken};

/// Replace unscored rounds of players who left the field with their status token.
///
/// A cut player who nevertheless has a third round made the cut and then missed the
/// secondary one, so they become `MDF`. Every other status carries over to all rounds
/// without a stroke count.
pub fn fix_empty_round_score(player: &mut PlayerScore) {
    let token = match player.pos.status() {
        None => return,
        Some(StatusToken::Cut) if player.round_3.is_scored() => StatusToken::Mdf,
        Some(StatusToken::Cut) => {
            player.round_3 = RoundScoreOrStatus::Status(StatusToken::Cut);
            player.round_4 = RoundScoreOrStatus::Status(StatusToken::Cut);
            StatusToken::Cut
        }
        Some(token) => token,
    };

    player.pos = Position::Status(token);
    for round in player.rounds_mut() {
        if !round.is_scored() {
            *round = RoundScoreOrStatus::Status(token);
        }
    }
}
