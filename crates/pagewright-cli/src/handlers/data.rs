//! `render` and `read`: placeholder expansion over test-data files

use crate::{CliError, CliResult, ReadArgs, RenderArgs};
use chrono::{NaiveDate, NaiveDateTime};
use pagewright::test_data::{
    DirectoryStore, EmbeddedStore, FixedClock, JsonTestDataReader, PlaceholderEngine,
};
use serde_json::Value;
use std::fs;
use tracing::info;

/// Resource name the rendered file is registered under
const RENDER_RESOURCE: &str = "render";

/// Parse `--now` as a date or a date-time
pub fn parse_now(text: &str) -> CliResult<NaiveDateTime> {
    if let Ok(at) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S") {
        return Ok(at);
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .ok_or_else(|| {
            CliError::invalid_argument(format!(
                "'{text}' is neither YYYY-MM-DD nor YYYY-MM-DDTHH:MM:SS"
            ))
        })
}

fn engine(seed: Option<u64>, now: Option<NaiveDateTime>) -> PlaceholderEngine {
    let mut engine = PlaceholderEngine::new();
    if let Some(now) = now {
        engine = engine.with_clock(FixedClock::new(now));
    }
    if let Some(seed) = seed {
        engine = engine.with_seed(seed);
    }
    engine
}

fn to_json(value: &Value, compact: bool) -> CliResult<String> {
    let text = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    Ok(text)
}

/// One record stays an object, several become an array
fn records_to_json(mut records: Vec<Value>, compact: bool) -> CliResult<String> {
    if records.len() == 1 {
        let record = records.remove(0);
        return to_json(&record, compact);
    }
    to_json(&Value::Array(records), compact)
}

/// Expand a file; JSON output is re-formatted, anything else is returned as
/// text. With ids, the matching records are printed as an array.
pub fn execute_render(args: &RenderArgs) -> CliResult<String> {
    let now = args.now.as_deref().map(parse_now).transpose()?;
    let engine = engine(args.seed, now);
    let text = fs::read_to_string(&args.file)?;
    info!(file = %args.file.display(), ids = args.ids.len(), "Rendering test data");

    if args.ids.is_empty() {
        let expanded = engine.replace_tokens(&text);
        return match serde_json::from_str::<Value>(&expanded) {
            Ok(value) => to_json(&value, args.compact),
            Err(_) => Ok(expanded),
        };
    }

    let mut store = EmbeddedStore::new();
    store.insert(
        JsonTestDataReader::<EmbeddedStore>::resource_name(RENDER_RESOURCE),
        text.into_bytes(),
    );
    let reader = JsonTestDataReader::new(store).with_engine(engine);
    let ids: Vec<&str> = args.ids.iter().map(String::as_str).collect();
    let records: Vec<Value> = reader.read_many(RENDER_RESOURCE, &ids)?;
    if records.is_empty() {
        return Err(CliError::invalid_argument(format!(
            "no records with TestDataId {} in {}",
            args.ids.join(", "),
            args.file.display()
        )));
    }
    to_json(&Value::Array(records), args.compact)
}

/// Read records through the directory layout tests use at runtime
pub fn execute_read(args: &ReadArgs) -> CliResult<String> {
    let reader = JsonTestDataReader::new(DirectoryStore::new(&args.data_dir))
        .with_engine(engine(args.seed, None));
    info!(dir = %args.data_dir.display(), name = %args.name, "Reading test data");

    let records = args
        .ids
        .iter()
        .map(|id| reader.read::<Value>(&args.name, id))
        .collect::<Result<Vec<_>, _>>()?;
    records_to_json(records, args.compact)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const USERS: &str = r#"{"users":[
        {"TestDataId":"admin","login":"admin-<NumericString(4)>","since":"<DateTime.Now(yyyy-MM-dd) - 1 day>"},
        {"TestDataId":"guest","login":"guest","since":"<DateTime.Now(yyyy-MM-dd)>"}
    ]}"#;

    fn render_args(file: PathBuf, ids: &[&str]) -> RenderArgs {
        RenderArgs {
            file,
            ids: ids.iter().map(ToString::to_string).collect(),
            seed: Some(3),
            now: Some("2024-03-01".into()),
            compact: true,
        }
    }

    mod parse_now_tests {
        use super::*;

        #[test]
        fn test_date_only() {
            let at = parse_now("2024-02-29").unwrap();
            assert_eq!(at.to_string(), "2024-02-29 00:00:00");
        }

        #[test]
        fn test_date_time() {
            let at = parse_now("2024-02-29T13:45:00").unwrap();
            assert_eq!(at.to_string(), "2024-02-29 13:45:00");
        }

        #[test]
        fn test_garbage() {
            assert!(matches!(
                parse_now("yesterday"),
                Err(CliError::InvalidArgument { .. })
            ));
        }
    }

    mod render_tests {
        use super::*;

        #[test]
        fn test_render_whole_document() {
            let dir = tempfile::tempdir().unwrap();
            let file = dir.path().join("users.json");
            fs::write(&file, USERS).unwrap();

            let out = execute_render(&render_args(file, &[])).unwrap();
            let value: Value = serde_json::from_str(&out).unwrap();
            assert_eq!(value["users"][0]["since"], "2024-02-29");
            assert_eq!(value["users"][1]["since"], "2024-03-01");
        }

        #[test]
        fn test_render_selected_record() {
            let dir = tempfile::tempdir().unwrap();
            let file = dir.path().join("users.json");
            fs::write(&file, USERS).unwrap();

            let out = execute_render(&render_args(file.clone(), &["admin"])).unwrap();
            let value: Value = serde_json::from_str(&out).unwrap();
            assert_eq!(value.as_array().unwrap().len(), 1);
            let login = value[0]["login"].as_str().unwrap();
            assert_eq!(login.len(), "admin-".len() + 4);

            let out = execute_render(&render_args(file, &["admin", "guest"])).unwrap();
            let value: Value = serde_json::from_str(&out).unwrap();
            assert_eq!(value.as_array().unwrap().len(), 2);
        }

        #[test]
        fn test_render_plain_text() {
            let dir = tempfile::tempdir().unwrap();
            let file = dir.path().join("note.txt");
            fs::write(&file, "id <GuidEmpty>").unwrap();

            let out = execute_render(&render_args(file, &[])).unwrap();
            assert_eq!(out, format!("id {}", "0".repeat(32)));
        }

        #[test]
        fn test_render_unknown_id() {
            let dir = tempfile::tempdir().unwrap();
            let file = dir.path().join("users.json");
            fs::write(&file, USERS).unwrap();
            assert!(execute_render(&render_args(file, &["nobody"])).is_err());
        }
    }

    mod read_tests {
        use super::*;

        #[test]
        fn test_read_from_directory() {
            let dir = tempfile::tempdir().unwrap();
            fs::create_dir_all(dir.path().join("TestData")).unwrap();
            fs::write(dir.path().join("TestData").join("Users.json"), USERS).unwrap();

            let args = ReadArgs {
                data_dir: dir.path().to_path_buf(),
                name: "Users".into(),
                ids: vec!["guest".into()],
                seed: None,
                compact: true,
            };
            let value: Value = serde_json::from_str(&execute_read(&args).unwrap()).unwrap();
            assert_eq!(value["login"], "guest");
        }

        #[test]
        fn test_read_missing_resource() {
            let dir = tempfile::tempdir().unwrap();
            let args = ReadArgs {
                data_dir: dir.path().to_path_buf(),
                name: "Users".into(),
                ids: vec!["guest".into()],
                seed: None,
                compact: false,
            };
            let err = execute_read(&args).unwrap_err();
            assert!(err.to_string().contains("doesn't exist"));
        }
    }
}
