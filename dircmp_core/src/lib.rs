pub mod comparison;
pub mod digest;
pub mod entries;
pub mod snapshot;

pub use comparison::ComparisonEngine;
pub use digest::{Blake3Digester, ContentDigester};
pub use entries::check_entries;
pub use snapshot::read_snapshot;
