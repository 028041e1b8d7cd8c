use chrono::NaiveDate;
use serde_json::Value;

use crate::{AppState, ImportError, migrate};

/// A backup ready to be handed to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Export {
    pub file_name: String,
    pub contents: String,
}

pub fn export(state: &AppState, today: NaiveDate) -> Result<Export, serde_json::Error> {
    Ok(Export {
        file_name: format!("meu-dia-de-treino-backup-{}.json", today.format("%Y-%m-%d")),
        contents: serde_json::to_string_pretty(state)?,
    })
}

/// Parses and migrates a backup. Only checks that the catalog is present;
/// everything else is up to the migration.
pub fn import(text: &str) -> Result<AppState, ImportError> {
    let document = serde_json::from_str::<Value>(text)?;
    for field in ["categories", "exercises"] {
        match document.get(field) {
            Some(Value::Array(values)) if !values.is_empty() => {}
            _ => return Err(ImportError::MissingField(field)),
        }
    }
    Ok(migrate(document)?)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    use crate::{Category, CategoryID, GroupLetter, MigrationError};

    use super::*;

    fn state() -> AppState {
        AppState {
            categories: vec![Category::new("c1".into(), "Peito", GroupLetter::A)],
            exercises: migrate(json!({
                "exercises": [{"id": "e1", "name": "Supino", "categoryIds": ["c1"]}]
            }))
            .unwrap()
            .exercises,
            ..AppState::default()
        }
    }

    #[test]
    fn test_export() {
        let export = export(&state(), NaiveDate::from_ymd_opt(2024, 9, 1).unwrap()).unwrap();

        assert_eq!(export.file_name, "meu-dia-de-treino-backup-2024-09-01.json");
        assert!(export.contents.contains("\n  \"categories\": ["));
        assert_eq!(import(&export.contents).unwrap(), state());
    }

    #[rstest]
    #[case("{}", "categories")]
    #[case(r#"{"categories": [], "exercises": [{}]}"#, "categories")]
    #[case(r#"{"categories": [{}], "exercises": []}"#, "exercises")]
    #[case(r#"{"categories": [{}], "exercises": {"e1": {}}}"#, "exercises")]
    fn test_import_missing_field(#[case] text: &str, #[case] field: &str) {
        assert!(matches!(import(text), Err(ImportError::MissingField(f)) if f == field));
    }

    #[rstest]
    #[case("")]
    #[case("{\"categories\": [")]
    #[case("not json")]
    fn test_import_invalid_json(#[case] text: &str) {
        assert!(matches!(import(text), Err(ImportError::Parse(_))));
    }

    #[test]
    fn test_import_rejects_malformed_collections() {
        assert!(matches!(
            import(r#"{"categories": [{}], "exercises": [{}], "sessions": "none"}"#),
            Err(ImportError::Migration(MigrationError::NotAList("sessions")))
        ));
    }

    #[test]
    fn test_import_migrates_legacy_backup() {
        let state = import(
            r#"{
                "categories": [{"id": "c1", "name": "Peito", "group": "B"}],
                "exercises": [{"id": "e1", "name": "Supino", "categoryId": "c1"}],
                "schedule": {"2": "B"}
            }"#,
        )
        .unwrap();

        assert_eq!(state.categories[0].group_letter, GroupLetter::B);
        assert_eq!(state.exercises[0].category_ids, vec![CategoryID::from("c1")]);
        assert_eq!(
            state.schedule.groups_scheduled_for(chrono::Weekday::Tue),
            &[GroupLetter::B]
        );
    }
}
