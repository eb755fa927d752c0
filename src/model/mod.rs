pub mod achievement;
pub mod catalog;
pub mod common;
pub mod delivery;
pub mod lookup;
pub mod map_point;
pub mod person;
pub mod user_context;

pub use achievement::*;
pub use catalog::*;
pub use common::*;
pub use delivery::*;
pub use lookup::*;
pub use map_point::*;
pub use person::*;
pub use user_context::*;
