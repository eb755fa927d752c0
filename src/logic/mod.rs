pub mod achievement_ops;
pub mod catalog_ops;
pub mod delivery_ops;
pub mod error;
pub mod identity;
pub mod map_point_ops;
pub mod patch;
pub mod person_ops;
pub mod query;
pub mod sync;

pub use achievement_ops::*;
pub use catalog_ops::*;
pub use delivery_ops::*;
pub use error::*;
pub use map_point_ops::*;
pub use person_ops::*;
pub use sync::{SyncOutcome, sync_user_achievements};
