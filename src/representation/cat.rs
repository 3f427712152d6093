//! Cat representation: outbound records with a derived age, and the inbound
//! create/update paths including nested achievement creation.

use super::achievement::{AchievementInput, AchievementRecord};
use super::fields::{self, bounded_integer_field, char_field, choice_field, primary_key_field};
use crate::error::{AppError, FieldErrors};
use crate::models::{limits, Cat, CatChanges, CatColor, CatDetail, NewCat};
use crate::store::{CatRepository, UnitOfWork};
use chrono::Datelike;
use serde::Serialize;
use serde_json::{Map, Value};

pub const ACHIEVEMENTS_FIELD: &str = "achievements";
pub const NESTED_UPDATE: &str = "Nested achievements cannot be changed by an update.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatRecord {
    pub id: i64,
    pub name: String,
    pub color: CatColor,
    pub birth_year: i32,
    pub owner: i64,
    pub achievements: Vec<AchievementRecord>,
    pub age: i64,
}

/// Current calendar year in local time.
pub fn current_year() -> i32 {
    chrono::Local::now().year()
}

/// `current_year - birth_year`, exact for any pair of years.
pub fn age(birth_year: i32, current_year: i32) -> i64 {
    i64::from(current_year) - i64::from(birth_year)
}

impl CatRecord {
    pub fn from_detail(detail: &CatDetail, current_year: i32) -> Self {
        let cat = &detail.cat;
        CatRecord {
            id: cat.id,
            name: cat.name.clone(),
            color: cat.color,
            birth_year: cat.birth_year,
            owner: cat.owner_id,
            achievements: detail.achievements.iter().map(AchievementRecord::from).collect(),
            age: age(cat.birth_year, current_year),
        }
    }

    /// Age computed against today's year; never cached.
    pub fn now(detail: &CatDetail) -> Self {
        Self::from_detail(detail, current_year())
    }
}

/// Whether the raw payload carried `achievements`, and with what.
/// Absent and empty are distinct: only a present key opens the linking unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AchievementsInput {
    Absent,
    Empty,
    Provided(Vec<AchievementInput>),
}

impl AchievementsInput {
    pub fn from_body(body: &Map<String, Value>, errors: &mut FieldErrors) -> Self {
        let Some(raw) = body.get(ACHIEVEMENTS_FIELD) else {
            return AchievementsInput::Absent;
        };
        match raw {
            Value::Null => {
                errors.add(ACHIEVEMENTS_FIELD, fields::NULL);
                AchievementsInput::Absent
            }
            Value::Array(items) if items.is_empty() => AchievementsInput::Empty,
            Value::Array(items) => {
                let parsed: Vec<AchievementInput> = items
                    .iter()
                    .enumerate()
                    .filter_map(|(i, item)| {
                        AchievementInput::from_wire(item, &format!("{}[{}]", ACHIEVEMENTS_FIELD, i), errors)
                    })
                    .collect();
                AchievementsInput::Provided(parsed)
            }
            other => {
                errors.add(
                    ACHIEVEMENTS_FIELD,
                    format!("Expected a list of items but got type \"{}\".", fields::type_name(other)),
                );
                AchievementsInput::Absent
            }
        }
    }

    pub fn is_present(&self) -> bool {
        !matches!(self, AchievementsInput::Absent)
    }

    pub fn items(&self) -> &[AchievementInput] {
        match self {
            AchievementsInput::Provided(items) => items,
            AchievementsInput::Absent | AchievementsInput::Empty => &[],
        }
    }
}

/// Validated create payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatInput {
    pub cat: NewCat,
    pub achievements: AchievementsInput,
}

struct Draft {
    name: Option<String>,
    color: Option<CatColor>,
    birth_year: Option<i32>,
    owner_id: Option<i64>,
}

fn as_object(body: &Value) -> Result<&Map<String, Value>, AppError> {
    match body {
        Value::Object(map) => Ok(map),
        other => Err(AppError::Invalid(FieldErrors::single(
            "non_field_errors",
            format!("Invalid data. Expected a dictionary, but got {}.", fields::type_name(other)),
        ))),
    }
}

fn parse_columns(body: &Map<String, Value>, required: bool, errors: &mut FieldErrors) -> Draft {
    Draft {
        name: char_field(body, "name", "name", limits::CAT_NAME, required, errors),
        color: choice_field::<CatColor>(body, "color", required, errors),
        birth_year: bounded_integer_field(body, "birth_year", limits::BIRTH_YEAR, required, errors),
        owner_id: primary_key_field(body, "owner", required, errors),
    }
}

async fn check_owner<R>(store: &R, owner_id: Option<i64>, errors: &mut FieldErrors) -> Result<(), AppError>
where
    R: CatRepository + ?Sized,
{
    if let Some(id) = owner_id {
        if !store.owner_exists(id).await? {
            errors.add("owner", fields::missing_related(id));
        }
    }
    Ok(())
}

impl CatInput {
    /// Validate a create payload. Reports every field error at once; nothing is written.
    pub async fn validate<R>(store: &R, body: &Value) -> Result<Self, AppError>
    where
        R: CatRepository + ?Sized,
    {
        let body = as_object(body)?;
        let mut errors = FieldErrors::new();
        let draft = parse_columns(body, true, &mut errors);
        let achievements = AchievementsInput::from_body(body, &mut errors);
        check_owner(store, draft.owner_id, &mut errors).await?;
        errors.into_result()?;
        match draft {
            Draft {
                name: Some(name),
                color: Some(color),
                birth_year: Some(birth_year),
                owner_id: Some(owner_id),
            } => Ok(CatInput {
                cat: NewCat {
                    name,
                    color,
                    birth_year,
                    owner_id,
                },
                achievements,
            }),
            _ => Err(AppError::BadRequest("incomplete cat payload".into())),
        }
    }

    /// Persist the cat. Without an `achievements` key the cat is inserted on its
    /// own; otherwise cat, achievements and links are written in one unit of work,
    /// one get-or-create and one link per list item, in input order.
    pub async fn save<R>(self, store: &R) -> Result<Cat, AppError>
    where
        R: CatRepository + ?Sized,
    {
        let CatInput { cat, achievements } = self;
        if !achievements.is_present() {
            let cat = store.insert_cat(cat).await?;
            tracing::info!(cat_id = cat.id, "cat created without achievements");
            return Ok(cat);
        }

        let mut tx = store.begin().await?;
        let cat = tx.insert_cat(cat).await?;
        for item in achievements.items() {
            let (achievement, created) = tx.get_or_create_achievement(&item.name).await?;
            if created {
                tracing::debug!(achievement_id = achievement.id, name = %achievement.name, "achievement created");
            }
            tx.link_achievement(achievement.id, cat.id).await?;
        }
        tx.commit().await?;
        tracing::info!(cat_id = cat.id, links = achievements.items().len(), "cat created with achievements");
        Ok(cat)
    }
}

/// Validate and persist a new cat.
pub async fn create<R>(store: &R, body: &Value) -> Result<Cat, AppError>
where
    R: CatRepository + ?Sized,
{
    CatInput::validate(store, body).await?.save(store).await
}

/// Validated update payload. `partial` accepts any subset of the writable fields.
pub async fn validate_update<R>(store: &R, body: &Value, partial: bool) -> Result<CatChanges, AppError>
where
    R: CatRepository + ?Sized,
{
    let body = as_object(body)?;
    let mut errors = FieldErrors::new();
    let draft = parse_columns(body, !partial, &mut errors);
    if body.contains_key(ACHIEVEMENTS_FIELD) {
        errors.add(ACHIEVEMENTS_FIELD, NESTED_UPDATE);
    }
    check_owner(store, draft.owner_id, &mut errors).await?;
    errors.into_result()?;
    Ok(CatChanges {
        name: draft.name,
        color: draft.color,
        birth_year: draft.birth_year,
        owner_id: draft.owner_id,
    })
}

/// Validate and apply an update. `None` when the cat does not exist.
pub async fn update<R>(store: &R, id: i64, body: &Value, partial: bool) -> Result<Option<Cat>, AppError>
where
    R: CatRepository + ?Sized,
{
    let changes = validate_update(store, body, partial).await?;
    let cat = store.update_cat(id, changes).await?;
    if let Some(ref c) = cat {
        tracing::info!(cat_id = c.id, partial, "cat updated");
    }
    Ok(cat)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewOwner;
    use crate::store::{InMemoryStore, Page};
    use serde_json::json;

    async fn setup() -> (InMemoryStore, i64) {
        let store = InMemoryStore::new();
        let owner = store
            .create_owner(NewOwner { first_name: "Ivan".into(), last_name: "Petrov".into() })
            .await
            .unwrap();
        (store, owner.id)
    }

    fn payload(owner: i64) -> Value {
        json!({ "name": "Barsik", "color": "black", "birth_year": 2020, "owner": owner })
    }

    #[tokio::test]
    async fn age_is_derived_from_current_year() {
        let (store, owner) = setup().await;
        let year = current_year();
        let mut body = payload(owner);
        body["birth_year"] = json!(year - 5);
        let cat = create(&store, &body).await.unwrap();
        let detail = store.get_cat(cat.id).await.unwrap().unwrap();
        assert_eq!(CatRecord::now(&detail).age, 5);
        assert_eq!(CatRecord::from_detail(&detail, year + 1).age, 6);
    }

    #[test]
    fn age_never_overflows() {
        assert_eq!(age(i32::MIN, 2026), 2026 - i64::from(i32::MIN));
        assert_eq!(age(i32::MAX, i32::MIN), i64::from(i32::MIN) - i64::from(i32::MAX));
        assert_eq!(age(2030, 2026), -4);
    }

    #[tokio::test]
    async fn birth_year_out_of_range_is_rejected_before_write() {
        let (store, owner) = setup().await;
        for year in [json!(i32::MIN), json!(0), json!(10_000)] {
            let mut body = payload(owner);
            body["birth_year"] = year;
            let Err(AppError::Invalid(errors)) = create(&store, &body).await else {
                panic!("expected validation error");
            };
            assert!(errors.contains("birth_year"));
        }
        assert!(store.list_cats(Page::default()).await.unwrap().is_empty());

        let cat = create(&store, &payload(owner)).await.unwrap();
        let Err(AppError::Invalid(errors)) = update(&store, cat.id, &json!({ "birth_year": i32::MIN }), true).await
        else {
            panic!("expected validation error");
        };
        assert!(errors.contains("birth_year"));
        let detail = store.get_cat(cat.id).await.unwrap().unwrap();
        assert_eq!(detail.cat.birth_year, 2020);
    }

    #[tokio::test]
    async fn color_outside_choices_creates_nothing() {
        let (store, owner) = setup().await;
        assert!(create(&store, &payload(owner)).await.is_ok());

        let mut body = payload(owner);
        body["color"] = json!("ultraviolet");
        match create(&store, &body).await {
            Err(AppError::Invalid(errors)) => {
                assert_eq!(errors.get("color"), Some(&["\"ultraviolet\" is not a valid choice.".to_string()][..]));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
        assert_eq!(store.list_cats(Page::default()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn omitted_achievements_skip_linking() {
        let (store, owner) = setup().await;
        let input = CatInput::validate(&store, &payload(owner)).await.unwrap();
        assert_eq!(input.achievements, AchievementsInput::Absent);
        let cat = input.save(&store).await.unwrap();

        let detail = store.get_cat(cat.id).await.unwrap().unwrap();
        assert!(detail.achievements.is_empty());
        assert_eq!(store.stats().achievement_lookups(), 0);
        assert_eq!(store.stats().units_begun(), 0);
    }

    #[tokio::test]
    async fn empty_achievements_take_the_linking_branch() {
        let (store, owner) = setup().await;
        let mut body = payload(owner);
        body["achievements"] = json!([]);
        let input = CatInput::validate(&store, &body).await.unwrap();
        assert_eq!(input.achievements, AchievementsInput::Empty);
        let cat = input.save(&store).await.unwrap();

        let detail = store.get_cat(cat.id).await.unwrap().unwrap();
        assert!(detail.achievements.is_empty());
        assert_eq!(store.stats().achievement_lookups(), 0);
        assert_eq!(store.stats().units_begun(), 1);
    }

    #[tokio::test]
    async fn shared_achievement_is_reused_across_cats() {
        let (store, owner) = setup().await;
        for name in ["Barsik", "Murzik"] {
            let mut body = payload(owner);
            body["name"] = json!(name);
            body["achievements"] = json!([{ "achievement_name": "Genius" }]);
            create(&store, &body).await.unwrap();
        }
        assert_eq!(store.achievements_named("Genius").await.len(), 1);
        assert_eq!(store.achievement_count().await, 1);
        assert_eq!(store.link_count().await, 2);

        let cats = store.list_cats(Page::default()).await.unwrap();
        for detail in &cats {
            let record = CatRecord::now(detail);
            assert_eq!(record.achievements.len(), 1);
            assert_eq!(record.achievements[0].achievement_name, "Genius");
        }
    }

    #[tokio::test]
    async fn repeated_names_in_one_request_link_each_occurrence() {
        let (store, owner) = setup().await;
        let mut body = payload(owner);
        body["achievements"] = json!([
            { "achievement_name": "Hunter" },
            { "achievement_name": "Sleeper" },
            { "achievement_name": "Hunter" }
        ]);
        let cat = create(&store, &body).await.unwrap();
        let detail = store.get_cat(cat.id).await.unwrap().unwrap();
        let names: Vec<&str> = detail.achievements.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["Hunter", "Sleeper", "Hunter"]);
        assert_eq!(store.achievement_count().await, 2);
        assert_eq!(store.stats().achievement_lookups(), 3);
        assert_eq!(store.stats().links_created(), 3);
    }

    #[tokio::test]
    async fn all_field_errors_reported_together() {
        let (store, _) = setup().await;
        let body = json!({
            "name": "",
            "color": "ultraviolet",
            "birth_year": "soon",
            "owner": 999,
            "achievements": [{ "achievement_name": "" }, 5]
        });
        let Err(AppError::Invalid(errors)) = create(&store, &body).await else {
            panic!("expected validation error");
        };
        for field in ["name", "color", "birth_year", "owner", "achievements[0].achievement_name", "achievements[1]"] {
            assert!(errors.contains(field), "missing error for {}", field);
        }
        assert_eq!(errors.get("owner"), Some(&["Invalid pk \"999\" - object does not exist.".to_string()][..]));
        assert!(store.list_cats(Page::default()).await.unwrap().is_empty());
        assert_eq!(store.stats().units_begun(), 0);
    }

    #[tokio::test]
    async fn achievements_must_be_a_list() {
        let (store, owner) = setup().await;
        for (raw, expected) in [
            (json!(null), fields::NULL.to_string()),
            (json!("Genius"), "Expected a list of items but got type \"str\".".to_string()),
        ] {
            let mut body = payload(owner);
            body["achievements"] = raw;
            let Err(AppError::Invalid(errors)) = create(&store, &body).await else {
                panic!("expected validation error");
            };
            assert_eq!(errors.get("achievements"), Some(&[expected][..]));
        }
    }

    #[tokio::test]
    async fn non_object_body_is_rejected() {
        let (store, _) = setup().await;
        let Err(AppError::Invalid(errors)) = create(&store, &json!([1, 2])).await else {
            panic!("expected validation error");
        };
        assert!(errors.contains("non_field_errors"));
    }

    #[tokio::test]
    async fn partial_update_changes_only_given_fields() {
        let (store, owner) = setup().await;
        let cat = create(&store, &payload(owner)).await.unwrap();
        let updated = update(&store, cat.id, &json!({ "color": "ginger" }), true)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.color, CatColor::Ginger);
        assert_eq!(updated.name, "Barsik");

        let missing = update(&store, cat.id + 100, &json!({ "color": "white" }), true).await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn full_update_requires_every_field_and_rejects_achievements() {
        let (store, owner) = setup().await;
        let cat = create(&store, &payload(owner)).await.unwrap();
        let Err(AppError::Invalid(errors)) = update(&store, cat.id, &json!({ "name": "Tom" }), false).await else {
            panic!("expected validation error");
        };
        assert!(errors.contains("color") && errors.contains("birth_year") && errors.contains("owner"));

        let mut body = payload(owner);
        body["achievements"] = json!([]);
        let Err(AppError::Invalid(errors)) = update(&store, cat.id, &body, false).await else {
            panic!("expected validation error");
        };
        assert_eq!(errors.get("achievements"), Some(&[NESTED_UPDATE.to_string()][..]));
    }

    #[test]
    fn record_shape() {
        let detail = CatDetail {
            cat: Cat { id: 1, name: "Barsik".into(), color: CatColor::Gray, birth_year: 2020, owner_id: 7 },
            achievements: vec![crate::models::Achievement { id: 3, name: "Genius".into() }],
        };
        let v = serde_json::to_value(CatRecord::from_detail(&detail, 2026)).unwrap();
        assert_eq!(
            v,
            json!({
                "id": 1,
                "name": "Barsik",
                "color": "gray",
                "birth_year": 2020,
                "owner": 7,
                "achievements": [{ "id": 3, "achievement_name": "Genius" }],
                "age": 6
            })
        );
    }
}
