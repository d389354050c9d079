pub mod bootstrap;
pub mod records;

pub use bootstrap::ensure_super_admin;
pub use records::{present, RecordError, RecordService};
