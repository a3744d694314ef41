//! Wire documents accepted on the write paths, and their validation into
//! model inputs.
//!
//! Every field is captured undecoded so that a missing field, an explicit
//! `null`, and a value of the wrong type each produce their own message.
//! `grid` and `solutionWords` keep their exact source text. Read-only (`id`,
//! `createdAt`) and unknown fields are ignored.

use serde::{de::DeserializeOwned, Deserialize, Deserializer};
use serde_json::{value::RawValue, Value};
use uuid::Uuid;

use crate::error::{AppError, FieldErrors};
use crate::models::{Document, GameChanges, LeaderboardChanges, NewGame, NewLeaderboardEntry};

pub const NAME_MAX_LENGTH: usize = 100;
pub const PLAYER_NAME_MAX_LENGTH: usize = 100;

const REQUIRED: &str = "This field is required.";
const NOT_NULL: &str = "This field may not be null.";
const NOT_BLANK: &str = "This field may not be blank.";
const NOT_A_STRING: &str = "Not a valid string.";
const NOT_AN_INTEGER: &str = "A valid integer is required.";

/// PUT requires every required field; PATCH validates only what is present
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    Full,
    Partial,
}

/// Wraps any present value, `null` included, in `Some`
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Rejects bodies that are not JSON objects before field extraction
pub fn from_body<T: DeserializeOwned>(body: Box<RawValue>) -> Result<T, AppError> {
    let text = body.get().trim_start();
    if !text.starts_with('{') {
        return Err(AppError::BadRequest(format!(
            "expected a JSON object, received {}",
            kind_of_text(text)
        )));
    }
    serde_json::from_str(text).map_err(|e| AppError::BadRequest(e.to_string()))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GamePayload {
    #[serde(default, deserialize_with = "present")]
    pub name: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub grid: Option<Document>,
    #[serde(default, deserialize_with = "present", alias = "solution_words")]
    pub solution_words: Option<Document>,
}

impl GamePayload {
    pub fn into_new_game(self) -> Result<NewGame, AppError> {
        match self.validate(WriteMode::Full)? {
            GameChanges {
                name,
                grid: Some(grid),
                solution_words: Some(solution_words),
            } => Ok(NewGame {
                name: name.flatten(),
                grid,
                solution_words,
            }),
            changes => Err(AppError::Validation(missing_fields([
                ("grid", changes.grid.is_none()),
                ("solutionWords", changes.solution_words.is_none()),
            ]))),
        }
    }

    pub fn validate(self, mode: WriteMode) -> Result<GameChanges, AppError> {
        let mut errors = FieldErrors::default();

        let name = check(&mut errors, "name", self.name, None, |v| {
            text(v, NAME_MAX_LENGTH, true)
        });
        let grid = check(&mut errors, "grid", self.grid, required(mode), document);
        let solution_words = check(
            &mut errors,
            "solutionWords",
            self.solution_words,
            required(mode),
            document,
        );

        errors.into_result(GameChanges {
            name,
            grid,
            solution_words,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardPayload {
    #[serde(default, deserialize_with = "present", alias = "player_name")]
    pub player_name: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub score: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub game: Option<Value>,
}

impl LeaderboardPayload {
    pub fn into_new_entry(self) -> Result<NewLeaderboardEntry, AppError> {
        match self.validate(WriteMode::Full)? {
            LeaderboardChanges {
                player_name: Some(player_name),
                score: Some(score),
                game_id: Some(game_id),
            } => Ok(NewLeaderboardEntry {
                player_name,
                score,
                game_id,
            }),
            changes => Err(AppError::Validation(missing_fields([
                ("playerName", changes.player_name.is_none()),
                ("score", changes.score.is_none()),
                ("game", changes.game_id.is_none()),
            ]))),
        }
    }

    pub fn validate(self, mode: WriteMode) -> Result<LeaderboardChanges, AppError> {
        let mut errors = FieldErrors::default();

        let player_name = check(
            &mut errors,
            "playerName",
            self.player_name,
            required(mode),
            |v| text(v, PLAYER_NAME_MAX_LENGTH, false)?.ok_or_else(|| NOT_NULL.to_string()),
        );
        let score = check(&mut errors, "score", self.score, required(mode), integer);
        let game_id = check(&mut errors, "game", self.game, required(mode), game_ref);

        errors.into_result(LeaderboardChanges {
            player_name,
            score,
            game_id,
        })
    }
}

/// Message for an absent field, if the field is required under `mode`
fn required(mode: WriteMode) -> Option<&'static str> {
    match mode {
        WriteMode::Full => Some(REQUIRED),
        WriteMode::Partial => None,
    }
}

fn check<R, T>(
    errors: &mut FieldErrors,
    field: &str,
    raw: Option<R>,
    when_missing: Option<&str>,
    parse: impl FnOnce(R) -> Result<T, String>,
) -> Option<T> {
    match raw {
        None => {
            if let Some(message) = when_missing {
                errors.add(field, message);
            }
            None
        }
        Some(value) => match parse(value) {
            Ok(parsed) => Some(parsed),
            Err(message) => {
                errors.add(field, message);
                None
            }
        },
    }
}

fn missing_fields<const N: usize>(fields: [(&str, bool); N]) -> FieldErrors {
    let mut errors = FieldErrors::default();
    for (field, missing) in fields {
        if missing {
            errors.add(field, REQUIRED);
        }
    }
    errors
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}

/// Same names as [`kind_of`], read from the first character of a JSON text
fn kind_of_text(text: &str) -> &'static str {
    match text.chars().next() {
        Some('{') => "dict",
        Some('[') => "list",
        Some('"') => "str",
        Some('t') | Some('f') => "bool",
        Some('n') => "null",
        _ => "number",
    }
}

/// Short text, surrounding whitespace trimmed. `null` maps to `None`.
fn text(value: Value, max_length: usize, allow_blank: bool) -> Result<Option<String>, String> {
    let raw = match value {
        Value::Null => return Ok(None),
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        _ => return Err(NOT_A_STRING.to_string()),
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() && !allow_blank {
        return Err(NOT_BLANK.to_string());
    }
    if trimmed.chars().count() > max_length {
        return Err(format!(
            "Ensure this field has no more than {} characters.",
            max_length
        ));
    }
    Ok(Some(trimmed.to_string()))
}

/// Opaque JSON document; anything but `null`
fn document(document: Document) -> Result<Document, String> {
    if document.is_null() {
        Err(NOT_NULL.to_string())
    } else {
        Ok(document)
    }
}

/// Whole-number floats such as `42.0` count as integers
fn whole_number(number: f64) -> Result<i64, String> {
    if number.is_finite() && number.fract() == 0.0 {
        // Saturates, so out-of-range values still fail the range check below
        Ok(number as i64)
    } else {
        Err(NOT_AN_INTEGER.to_string())
    }
}

fn integer(value: Value) -> Result<i32, String> {
    let wide = match &value {
        Value::Null => return Err(NOT_NULL.to_string()),
        Value::Number(n) => match n.as_i64() {
            Some(wide) => wide,
            None => whole_number(n.as_f64().ok_or_else(|| NOT_AN_INTEGER.to_string())?)?,
        },
        Value::String(s) => {
            let trimmed = s.trim();
            // "42.0" and "42." parse like "42"
            let digits = match trimmed.split_once('.') {
                Some((whole, fraction)) if fraction.chars().all(|c| c == '0') => whole,
                _ => trimmed,
            };
            digits
                .parse::<i64>()
                .map_err(|_| NOT_AN_INTEGER.to_string())?
        }
        _ => return Err(NOT_AN_INTEGER.to_string()),
    };

    if wide > i64::from(i32::MAX) {
        Err(format!(
            "Ensure this value is less than or equal to {}.",
            i32::MAX
        ))
    } else if wide < i64::from(i32::MIN) {
        Err(format!(
            "Ensure this value is greater than or equal to {}.",
            i32::MIN
        ))
    } else {
        Ok(wide as i32)
    }
}

/// Game identifier; existence is checked by the store at write time
fn game_ref(value: Value) -> Result<Uuid, String> {
    match value {
        Value::Null => Err(NOT_NULL.to_string()),
        Value::String(s) => Uuid::parse_str(s.trim())
            .map_err(|_| format!("Invalid pk \"{}\" - object does not exist.", s)),
        other => Err(format!(
            "Incorrect type. Expected pk value, received {}.",
            kind_of(&other)
        )),
    }
}
