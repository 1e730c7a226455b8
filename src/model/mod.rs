pub mod election;
pub mod zone;

pub use election::{ImportStatus, PublicationStatus};
pub use zone::{ZoneSelector, ZoneType};
