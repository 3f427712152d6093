//! Owner wire record. `cats` carries each cat's display string and is read-only.

use crate::models::OwnerDetail;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OwnerRecord {
    pub first_name: String,
    pub last_name: String,
    pub cats: Vec<String>,
}

impl From<&OwnerDetail> for OwnerRecord {
    fn from(detail: &OwnerDetail) -> Self {
        OwnerRecord {
            first_name: detail.owner.first_name.clone(),
            last_name: detail.owner.last_name.clone(),
            cats: detail.cats.iter().map(ToString::to_string).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Cat, CatColor, Owner};
    use serde_json::json;

    fn owner_with(names: &[&str]) -> OwnerDetail {
        OwnerDetail {
            owner: Owner { id: 1, first_name: "Anna".into(), last_name: "Ivanova".into() },
            cats: names
                .iter()
                .enumerate()
                .map(|(i, n)| Cat {
                    id: i as i64 + 10,
                    name: n.to_string(),
                    color: CatColor::Mixed,
                    birth_year: 2018,
                    owner_id: 1,
                })
                .collect(),
        }
    }

    #[test]
    fn cats_are_display_strings() {
        for names in [&[][..], &["Barsik"][..], &["Barsik", "Murka", "Pushok"][..]] {
            let v = serde_json::to_value(OwnerRecord::from(&owner_with(names))).unwrap();
            assert_eq!(v["cats"], json!(names));
            assert!(v["cats"].as_array().unwrap().iter().all(|c| c.is_string()));
        }
    }

    #[test]
    fn names_pass_through() {
        let record = OwnerRecord::from(&owner_with(&[]));
        assert_eq!(record.first_name, "Anna");
        assert_eq!(record.last_name, "Ivanova");
        assert!(record.cats.is_empty());
    }
}
