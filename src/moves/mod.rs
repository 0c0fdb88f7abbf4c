//! Moves and their histories.
//!
//! - `protocol`: the textual move tokens and their decoded form
//! - `history`: the per-game move log and its compaction
//! - `record`: serializable game records and replay

pub mod history;
pub mod protocol;
pub mod record;

pub use history::{LogEntry, MoveLog};
pub use protocol::{Colors, Level, Move, MoveOp, PieceIds};
pub use record::{GameRecord, RecordedMove};
