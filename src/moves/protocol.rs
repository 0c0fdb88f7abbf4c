//! The textual move protocol.
//!
//! Moves are whitespace-separated tokens. The player is not part of the
//! text; it comes from the sequencing of the game.
//!
//! ```text
//! Onboard <cell> <level> <colors> <pieceIds>
//! Pick <pieceId> [<locus> <level>]
//! Drop <stackId> <level> [<locus>]
//! FromTo <cell> <height> <colors> <cell>
//! Flip <pieceId> <locus> <color>
//! Exchange [<pieceIds>]
//! Done | Resign | Start P<n> | Edit | Pass | GameOverOnTime
//! ```
//!
//! Piece-id lists are comma-separated and colour strings carry two letters
//! (top, bottom) per piece; both list the top piece first. A stack id of
//! `-1` in `Drop` means "back where it came from".

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::str::FromStr;

use crate::core::{Cell, Locus, ParseError, PlayerId};
use crate::pieces::{Face, PieceId, StackId};

/// Where a dropped stack goes within its target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Level {
    /// On top. Dropping back on the take-off cell may stomp.
    Top,
    /// On top. Dropping back on the take-off cell always cancels.
    Settle,
    /// Back to the origin, turning a flipped piece back over.
    Return,
    /// Inserted so the bottom moved piece lands at this index.
    At(usize),
}

impl Level {
    /// Numeric form used in tokens and placement encodings.
    #[must_use]
    pub fn code(self) -> i32 {
        match self {
            Level::Top => 100,
            Level::Settle => 99,
            Level::Return => -1,
            Level::At(n) => n as i32,
        }
    }

    /// True for levels that place the stack on top of the target.
    #[must_use]
    pub fn is_on_top(self) -> bool {
        !matches!(self, Level::At(_))
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Level {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.parse::<i32>() {
            Ok(100) => Ok(Level::Top),
            Ok(99) => Ok(Level::Settle),
            Ok(-1) => Ok(Level::Return),
            Ok(n) if n >= 0 => Ok(Level::At(n as usize)),
            _ => Err(ParseError::BadNumber(s.to_string())),
        }
    }
}

/// Face pairs of several pieces, top piece first.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Colors(pub SmallVec<[(Face, Face); 4]>);

impl Colors {
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(Face, Face)> {
        self.0.iter()
    }
}

impl std::fmt::Display for Colors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (top, bottom) in &self.0 {
            write!(f, "{}{}", top.letter(), bottom.letter())?;
        }
        Ok(())
    }
}

impl FromStr for Colors {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let letters: Vec<char> = s.chars().collect();
        if letters.is_empty() || letters.len() % 2 != 0 {
            return Err(ParseError::BadColor(s.to_string()));
        }
        letters
            .chunks(2)
            .map(|pair| Ok((Face::from_letter(pair[0])?, Face::from_letter(pair[1])?)))
            .collect::<Result<SmallVec<_>, ParseError>>()
            .map(Colors)
    }
}

/// Comma-separated piece ids.
pub type PieceIds = SmallVec<[PieceId; 4]>;

/// A decoded move operation.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoveOp {
    /// Take pieces from the rack and place them as one stack.
    Onboard {
        to: Cell,
        level: Level,
        colors: Colors,
        pieces: PieceIds,
    },
    /// Lift a piece and everything above it.
    Pick {
        piece: PieceId,
        at: Option<(Locus, Level)>,
    },
    /// Put down what is in hand. `stack: None` means the take-off stack.
    Drop {
        stack: Option<StackId>,
        level: Level,
        locus: Option<Locus>,
    },
    /// Lift `height` pieces off `from` and drop them on top of `to`.
    FromTo {
        from: Cell,
        height: usize,
        colors: Colors,
        to: Cell,
    },
    /// Turn a piece over; `color` is the face that ends up on top.
    Flip {
        piece: PieceId,
        locus: Locus,
        color: Face,
    },
    /// Set the mover's trade offer to exactly these captives.
    Exchange { pieces: PieceIds },
    Done,
    Resign,
    Start(PlayerId),
    Edit,
    Pass,
    GameOverOnTime,
}

impl MoveOp {
    /// Operation keyword.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            MoveOp::Onboard { .. } => "Onboard",
            MoveOp::Pick { .. } => "Pick",
            MoveOp::Drop { .. } => "Drop",
            MoveOp::FromTo { .. } => "FromTo",
            MoveOp::Flip { .. } => "Flip",
            MoveOp::Exchange { .. } => "Exchange",
            MoveOp::Done => "Done",
            MoveOp::Resign => "Resign",
            MoveOp::Start(_) => "Start",
            MoveOp::Edit => "Edit",
            MoveOp::Pass => "Pass",
            MoveOp::GameOverOnTime => "GameOverOnTime",
        }
    }
}

/// A move by a player.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    pub player: PlayerId,
    pub op: MoveOp,
}

impl Move {
    #[must_use]
    pub fn new(player: PlayerId, op: MoveOp) -> Self {
        Self { player, op }
    }

    /// Decode a move token string played by `player`.
    pub fn parse(text: &str, player: PlayerId) -> Result<Self, ParseError> {
        let mut tokens = Tokens::new(text);
        let keyword = tokens.next("operation")?;
        let op = match keyword.to_ascii_lowercase().as_str() {
            "onboard" => MoveOp::Onboard {
                to: tokens.parse("cell")?,
                level: tokens.parse("level")?,
                colors: tokens.parse("colors")?,
                pieces: parse_ids(tokens.next("piece ids")?)?,
            },
            "pick" => {
                let piece = PieceId(tokens.parse("piece id")?);
                let at = match tokens.peek() {
                    Some(_) => Some((tokens.parse("locus")?, tokens.parse("level")?)),
                    None => None,
                };
                MoveOp::Pick { piece, at }
            }
            "drop" => {
                let raw: i32 = tokens.parse("stack id")?;
                let stack = match raw {
                    -1 => None,
                    n => Some(
                        u16::try_from(n)
                            .map(StackId)
                            .map_err(|_| ParseError::BadNumber(raw.to_string()))?,
                    ),
                };
                let level = tokens.parse("level")?;
                let locus = match tokens.peek() {
                    Some(_) => Some(tokens.parse("locus")?),
                    None => None,
                };
                MoveOp::Drop { stack, level, locus }
            }
            "fromto" => MoveOp::FromTo {
                from: tokens.parse("cell")?,
                height: tokens.parse("height")?,
                colors: tokens.parse("colors")?,
                to: tokens.parse("destination")?,
            },
            "flip" => {
                let piece = PieceId(tokens.parse("piece id")?);
                let locus = tokens.parse("locus")?;
                let color = tokens.next("color")?;
                let mut letters = color.chars();
                let face = match (letters.next(), letters.next()) {
                    (Some(c), None) => Face::from_letter(c)?,
                    _ => return Err(ParseError::BadColor(color.to_string())),
                };
                MoveOp::Flip { piece, locus, color: face }
            }
            "exchange" => MoveOp::Exchange {
                pieces: match tokens.peek() {
                    Some(list) => {
                        let ids = parse_ids(list)?;
                        tokens.next("piece ids")?;
                        ids
                    }
                    None => PieceIds::new(),
                },
            },
            "done" => MoveOp::Done,
            "resign" => MoveOp::Resign,
            "start" => MoveOp::Start(tokens.parse("player")?),
            "edit" => MoveOp::Edit,
            "pass" => MoveOp::Pass,
            "gameoverontime" => MoveOp::GameOverOnTime,
            _ => return Err(ParseError::UnknownOperation(keyword.to_string())),
        };
        if let Some(extra) = tokens.peek() {
            return Err(ParseError::TrailingToken {
                text: text.to_string(),
                token: extra.to_string(),
            });
        }
        Ok(Move { player, op })
    }
}

impl std::fmt::Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = self.op.name();
        match &self.op {
            MoveOp::Onboard { to, level, colors, pieces } => {
                write!(f, "{name} {to} {level} {colors} {}", join_ids(pieces))
            }
            MoveOp::Pick { piece, at: Some((locus, level)) } => {
                write!(f, "{name} {piece} {locus} {level}")
            }
            MoveOp::Pick { piece, at: None } => write!(f, "{name} {piece}"),
            MoveOp::Drop { stack, level, locus } => {
                match stack {
                    Some(s) => write!(f, "{name} {s} {level}")?,
                    None => write!(f, "{name} -1 {level}")?,
                }
                match locus {
                    Some(l) => write!(f, " {l}"),
                    None => Ok(()),
                }
            }
            MoveOp::FromTo { from, height, colors, to } => {
                write!(f, "{name} {from} {height} {colors} {to}")
            }
            MoveOp::Flip { piece, locus, color } => write!(f, "{name} {piece} {locus} {color}"),
            MoveOp::Exchange { pieces } if pieces.is_empty() => f.write_str(name),
            MoveOp::Exchange { pieces } => write!(f, "{name} {}", join_ids(pieces)),
            MoveOp::Start(player) => write!(f, "{name} {player}"),
            MoveOp::Done | MoveOp::Resign | MoveOp::Edit | MoveOp::Pass | MoveOp::GameOverOnTime => {
                f.write_str(name)
            }
        }
    }
}

fn join_ids(ids: &[PieceId]) -> String {
    ids.iter().map(|p| p.0.to_string()).collect::<Vec<_>>().join(",")
}

fn parse_ids(text: &str) -> Result<PieceIds, ParseError> {
    text.split(',')
        .map(|t| {
            t.parse::<u16>()
                .map(PieceId)
                .map_err(|_| ParseError::BadNumber(t.to_string()))
        })
        .collect()
}

/// Cursor over the tokens of one move.
struct Tokens<'a> {
    text: &'a str,
    iter: std::iter::Peekable<std::str::SplitWhitespace<'a>>,
}

impl<'a> Tokens<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            iter: text.split_whitespace().peekable(),
        }
    }

    fn peek(&mut self) -> Option<&'a str> {
        self.iter.peek().copied()
    }

    fn next(&mut self, operand: &'static str) -> Result<&'a str, ParseError> {
        self.iter.next().ok_or_else(|| ParseError::MissingOperand {
            text: self.text.to_string(),
            operand,
        })
    }

    fn parse<T>(&mut self, operand: &'static str) -> Result<T, ParseError>
    where
        T: FromStr,
        ParseError: From<<T as FromStr>::Err>,
    {
        let token = self.next(operand)?;
        token.parse::<T>().map_err(|e| match ParseError::from(e) {
            ParseError::BadNumber(_) => ParseError::BadNumber(token.to_string()),
            other => other,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Move {
        Move::parse(text, PlayerId::FIRST).unwrap()
    }

    #[test]
    fn test_parse_onboard() {
        let m = parse("Onboard A1 100 RXBX 3,7");
        match &m.op {
            MoveOp::Onboard { to, level, colors, pieces } => {
                assert_eq!(*to, Cell::new(0, 0));
                assert_eq!(*level, Level::Top);
                assert_eq!(colors.0[0], (Face::Red, Face::Blank));
                assert_eq!(pieces.as_slice(), &[PieceId(3), PieceId(7)]);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(m.to_string(), "Onboard A1 100 RXBX 3,7");
    }

    #[test]
    fn test_parse_drop_origin() {
        let m = parse("Drop -1 0");
        assert_eq!(
            m.op,
            MoveOp::Drop { stack: None, level: Level::At(0), locus: None }
        );
        assert_eq!(parse("Drop 5 -1 B2").to_string(), "Drop 5 -1 B2");
    }

    #[test]
    fn test_parse_misc() {
        assert_eq!(parse("start P1").op, MoveOp::Start(PlayerId::SECOND));
        assert_eq!(parse("Exchange").op, MoveOp::Exchange { pieces: PieceIds::new() });
        assert_eq!(parse("Flip 4 C2 B").to_string(), "Flip 4 C2 B");
        assert_eq!(parse("Pick 9 R 3").to_string(), "Pick 9 R 3");
        assert_eq!(parse("FromTo B2 2 RXXX D4").to_string(), "FromTo B2 2 RXXX D4");
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            Move::parse("Jump A1", PlayerId::FIRST),
            Err(ParseError::UnknownOperation(_))
        ));
        assert!(matches!(
            Move::parse("Onboard Z 100 RX 1", PlayerId::FIRST),
            Err(ParseError::BadLocus(_))
        ));
        assert!(matches!(
            Move::parse("Pick", PlayerId::FIRST),
            Err(ParseError::MissingOperand { .. })
        ));
        assert!(matches!(
            Move::parse("Flip 1 A1 RR", PlayerId::FIRST),
            Err(ParseError::BadColor(_))
        ));
        assert!(Move::parse("Onboard A1 100 RXB 1", PlayerId::FIRST).is_err());
    }
}
