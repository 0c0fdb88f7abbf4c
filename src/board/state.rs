//! The turn state machine's states.
//!
//! `State` is a closed enum; every transition in the move engine is an
//! exhaustive match over it. The one stack that may be turned over for
//! inspection lives in the `Flipped` payload, so there is never more than one.

use serde::{Deserialize, Serialize};

use crate::pieces::{PieceId, StackId};

/// The piece a player turned over and the stack it tops.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FlipMark {
    pub stack: StackId,
    pub piece: PieceId,
}

/// Turn states.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum State {
    /// Free editing; anything may be moved anywhere.
    Puzzle,
    /// The mover has resigned and must confirm.
    Resign,
    GameOver,
    /// Opening: place a two-piece stack on an edge cell.
    Onboard2,
    /// Normal turn start.
    Play,
    /// A board piece has been turned over.
    Flipped(FlipMark),
    /// Responding to an exchange offer with an unacceptable counter-offer.
    Exchange,
    /// Arranging captives into an offer.
    CaptiveShuffle,
    /// Carrying a board stack.
    PlayDrop,
    /// A board move is complete.
    PlayDone,
    /// A board move is complete and will capture.
    PlayCapture,
    /// A board move was dropped where it cannot end.
    PlayUndone,
    /// Carrying several rack pieces during Play.
    RackDrop,
    /// Carrying rack pieces that do not form an opening pair.
    Rack2Drop,
    /// Carrying one rack piece toward the board.
    OnboardDrop,
    /// Carrying the opening pair toward the board.
    Onboard2Drop,
    Onboard2Done,
    OnboardDone,
    /// The response to an exchange offer is acceptable.
    ExchangeDone,
    Draw,
}

impl State {
    /// Stable ordinal, used by the digest.
    #[must_use]
    pub const fn ordinal(self) -> u64 {
        match self {
            State::Puzzle => 0,
            State::Resign => 1,
            State::GameOver => 2,
            State::Onboard2 => 3,
            State::Play => 4,
            State::Flipped(_) => 5,
            State::Exchange => 6,
            State::CaptiveShuffle => 7,
            State::PlayDrop => 8,
            State::PlayDone => 9,
            State::PlayCapture => 10,
            State::PlayUndone => 11,
            State::RackDrop => 12,
            State::Rack2Drop => 13,
            State::OnboardDrop => 14,
            State::Onboard2Drop => 15,
            State::Onboard2Done => 16,
            State::OnboardDone => 17,
            State::ExchangeDone => 18,
            State::Draw => 19,
        }
    }

    /// States that end a turn and are worth recording for repetition checks.
    #[must_use]
    pub const fn is_digest_state(self) -> bool {
        matches!(
            self,
            State::Resign
                | State::Onboard2Done
                | State::OnboardDone
                | State::PlayDone
                | State::PlayCapture
                | State::Draw
        )
    }

    /// States in which `Done` may be played.
    #[must_use]
    pub const fn is_done_state(self) -> bool {
        self.is_digest_state() || matches!(self, State::ExchangeDone | State::CaptiveShuffle)
    }

    #[must_use]
    pub const fn is_game_over(self) -> bool {
        matches!(self, State::GameOver)
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            State::Puzzle => "Puzzle",
            State::Resign => "Resign",
            State::GameOver => "GameOver",
            State::Onboard2 => "Onboard2",
            State::Play => "Play",
            State::Flipped(_) => "Flipped",
            State::Exchange => "Exchange",
            State::CaptiveShuffle => "CaptiveShuffle",
            State::PlayDrop => "PlayDrop",
            State::PlayDone => "PlayDone",
            State::PlayCapture => "PlayCapture",
            State::PlayUndone => "PlayUndone",
            State::RackDrop => "RackDrop",
            State::Rack2Drop => "Rack2Drop",
            State::OnboardDrop => "OnboardDrop",
            State::Onboard2Drop => "Onboard2Drop",
            State::Onboard2Done => "Onboard2Done",
            State::OnboardDone => "OnboardDone",
            State::ExchangeDone => "ExchangeDone",
            State::Draw => "Draw",
        }
    }
}

impl std::fmt::Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_done_states() {
        assert!(State::PlayCapture.is_done_state());
        assert!(State::CaptiveShuffle.is_done_state());
        assert!(!State::CaptiveShuffle.is_digest_state());
        assert!(!State::PlayUndone.is_done_state());
        assert!(!State::Exchange.is_done_state());
    }

    #[test]
    fn test_flipped_ordinal_ignores_payload() {
        let a = State::Flipped(FlipMark { stack: StackId(1), piece: PieceId(2) });
        let b = State::Flipped(FlipMark { stack: StackId(3), piece: PieceId(4) });
        assert_eq!(a.ordinal(), b.ordinal());
        assert_ne!(a, b);
        assert_eq!(a.to_string(), "Flipped");
    }
}
