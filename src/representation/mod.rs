//! Conversion between persisted entities and JSON wire records, plus inbound
//! validation. All field errors surface here, before any write.

pub mod achievement;
pub mod cat;
pub mod fields;
pub mod owner;

pub use achievement::{AchievementInput, AchievementRecord};
pub use cat::{AchievementsInput, CatInput, CatRecord};
pub use owner::OwnerRecord;
