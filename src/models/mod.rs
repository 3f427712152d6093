//! Persisted entities: owners, cats, achievements and the cat/achievement link.

mod color;

pub use color::{hex_to_name, CatColor, ColorError, HexColor, NO_COLOR_NAME};

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Owner {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOwner {
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Cat {
    pub id: i64,
    pub name: String,
    pub color: CatColor,
    pub birth_year: i32,
    pub owner_id: i64,
}

impl fmt::Display for Cat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Column values for a cat insert. Carries no nested achievements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCat {
    pub name: String,
    pub color: CatColor,
    pub birth_year: i32,
    pub owner_id: i64,
}

/// Partial cat update; `None` leaves the column unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatChanges {
    pub name: Option<String>,
    pub color: Option<CatColor>,
    pub birth_year: Option<i32>,
    pub owner_id: Option<i64>,
}

impl CatChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.color.is_none() && self.birth_year.is_none() && self.owner_id.is_none()
    }

    pub fn apply(&self, cat: &mut Cat) {
        if let Some(ref name) = self.name {
            cat.name = name.clone();
        }
        if let Some(color) = self.color {
            cat.color = color;
        }
        if let Some(year) = self.birth_year {
            cat.birth_year = year;
        }
        if let Some(owner_id) = self.owner_id {
            cat.owner_id = owner_id;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Achievement {
    pub id: i64,
    pub name: String,
}

impl fmt::Display for Achievement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Join row between one achievement and one cat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct AchievementCat {
    pub id: i64,
    pub achievement_id: i64,
    pub cat_id: i64,
}

/// A cat loaded together with its linked achievements, in link order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatDetail {
    pub cat: Cat,
    pub achievements: Vec<Achievement>,
}

/// An owner loaded together with its cats, ordered by cat id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerDetail {
    pub owner: Owner,
    pub cats: Vec<Cat>,
}

/// Column length limits shared by validation and DDL.
pub mod limits {
    pub const CAT_NAME: usize = 16;
    pub const CAT_COLOR: usize = 16;
    pub const OWNER_NAME: usize = 128;
    pub const ACHIEVEMENT_NAME: usize = 64;
    pub const BIRTH_YEAR: std::ops::RangeInclusive<i32> = 1..=9999;
}
