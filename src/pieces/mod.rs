//! The piece and stack model.
//!
//! - `face`: colours, the seven kinds, and kind sets
//! - `knowledge`: what an opponent has seen of a piece
//! - `piece`: a single token and its face operations
//! - `stack`: ordered piece handles and the order-sensitive predicates
//! - `arena`: handle-indexed persistent storage for both

pub mod arena;
pub mod face;
pub mod knowledge;
pub mod piece;
pub mod stack;

pub use arena::{Arena, Handle, Pieces, Stacks};
pub use face::{Face, KindSet, PieceKind, Side, KIND_COUNT};
pub use knowledge::Knowledge;
pub use piece::{Piece, PieceId};
pub use stack::{Origin, PieceList, Stack, StackId};
