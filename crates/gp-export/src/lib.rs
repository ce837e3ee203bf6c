/// Sortie de glyphpack : écriture ordonnée des enregistrements de trames.
///
/// The output file is a plain concatenation of records with no header, so
/// write order must equal input order; `ReorderBuffer` restores it when
/// frames are encoded in parallel.

pub mod reorder;
pub mod size;
pub mod writer;

pub use reorder::{ReorderBuffer, ReorderError};
pub use size::format_size;
pub use writer::RecordWriter;
