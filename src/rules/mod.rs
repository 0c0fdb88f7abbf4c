//! Legality rules.
//!
//! - `oracle`: [`Board::legal_move`](crate::board::Board::legal_move) and the
//!   pick, drop, and geometry predicates it is built from
//! - `exchange`: prisoner-exchange arithmetic
//!
//! Both extend `Board` directly; nothing here mutates a board.

pub mod exchange;
pub mod oracle;

pub use exchange::largest_subset_below;
