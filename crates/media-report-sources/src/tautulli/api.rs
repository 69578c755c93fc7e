//! Wire format of the Tautulli `/api/v2` commands used by the report.
//!
//! Every response is wrapped as `{"response": {"result", "message", "data"}}`.
//! Numeric fields arrive as numbers or numeric strings depending on the
//! command, so they go through the lenient helpers below.

use crate::error::SourceError;
use media_report_models::{LibraryItem, LibraryRef, MediaKind, MediaMetadata, RatingKey};
use serde::de::{self, DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::{Map, Value};

pub const CMD_LIBRARIES_TABLE: &str = "get_libraries_table";
pub const CMD_LIBRARY_MEDIA_INFO: &str = "get_library_media_info";
pub const CMD_NEW_RATING_KEYS: &str = "get_new_rating_keys";
pub const CMD_METADATA: &str = "get_metadata";

#[derive(Debug, Deserialize)]
struct Envelope {
    response: ResponseBody,
}

#[derive(Debug, Deserialize)]
struct ResponseBody {
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Value,
}

/// Table wrapper used by the listing commands: `data.data` holds the rows.
#[derive(Debug, Deserialize)]
struct TableData<T> {
    data: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct LibraryRow {
    #[serde(deserialize_with = "de_string")]
    section_id: String,
    section_name: String,
}

#[derive(Debug, Deserialize)]
struct MediaInfoRow {
    #[serde(deserialize_with = "de_i64")]
    added_at: i64,
    #[serde(default, deserialize_with = "de_opt_u64")]
    parent_rating_key: Option<u64>,
    #[serde(default, deserialize_with = "de_opt_u64")]
    play_count: Option<u64>,
    #[serde(default)]
    title: String,
    #[serde(deserialize_with = "de_u64")]
    rating_key: u64,
    media_type: String,
}

#[derive(Debug, Deserialize)]
struct KeyNode {
    #[serde(default, deserialize_with = "de_opt_u64")]
    rating_key: Option<u64>,
    #[serde(default)]
    children: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct MetadataRow {
    #[serde(deserialize_with = "de_i64")]
    added_at: i64,
    #[serde(default, deserialize_with = "de_opt_u64")]
    parent_rating_key: Option<u64>,
    #[serde(default)]
    title: String,
    #[serde(deserialize_with = "de_u64")]
    rating_key: u64,
    media_type: String,
    #[serde(default)]
    grandparent_title: String,
    #[serde(default)]
    media_info: Vec<MediaInfo>,
}

#[derive(Debug, Deserialize)]
struct MediaInfo {
    #[serde(default)]
    parts: Vec<MediaPart>,
}

#[derive(Debug, Deserialize)]
struct MediaPart {
    file: String,
    #[serde(default, deserialize_with = "de_opt_u64")]
    file_size: Option<u64>,
}

/// Parse a raw response body and return its `data` member.
pub fn unwrap_envelope(command: &'static str, body: &str) -> Result<Value, SourceError> {
    let envelope: Envelope = serde_json::from_str(body)
        .map_err(|e| SourceError::malformed(command, format!("invalid response envelope: {}", e)))?;

    let response = envelope.response;
    if let Some(result) = response.result.as_deref() {
        if !result.eq_ignore_ascii_case("success") {
            return Err(SourceError::Api {
                command,
                message: response.message.unwrap_or_else(|| result.to_string()),
            });
        }
    }

    Ok(response.data)
}

fn decode<T: DeserializeOwned>(command: &'static str, value: Value) -> Result<T, SourceError> {
    serde_json::from_value(value).map_err(|e| SourceError::malformed(command, e.to_string()))
}

pub fn parse_libraries_table(data: Value) -> Result<Vec<LibraryRef>, SourceError> {
    let table: TableData<LibraryRow> = decode(CMD_LIBRARIES_TABLE, data)?;
    Ok(table
        .data
        .into_iter()
        .map(|row| LibraryRef {
            section_id: row.section_id,
            section_name: row.section_name,
        })
        .collect())
}

pub fn parse_library_media_info(data: Value) -> Result<Vec<LibraryItem>, SourceError> {
    let table: TableData<MediaInfoRow> = decode(CMD_LIBRARY_MEDIA_INFO, data)?;
    Ok(table
        .data
        .into_iter()
        .map(|row| LibraryItem {
            added_at: row.added_at,
            parent_rating_key: row.parent_rating_key.map(RatingKey),
            play_count: row.play_count,
            title: row.title,
            rating_key: RatingKey(row.rating_key),
            media_type: MediaKind::from(row.media_type),
        })
        .collect())
}

/// Flatten `data["0"].children[season].children[episode].rating_key`.
pub fn parse_new_rating_keys(data: Value) -> Result<Vec<RatingKey>, SourceError> {
    let command = CMD_NEW_RATING_KEYS;
    let mut root = match data {
        Value::Object(map) => map,
        Value::Null => return Err(SourceError::EmptyResult { command }),
        other => return Err(SourceError::malformed(command, format!("expected object, got {}", other))),
    };

    let show_value = root
        .remove("0")
        .ok_or_else(|| SourceError::malformed(command, "missing top-level entry \"0\""))?;
    let show: KeyNode = decode(command, show_value)?;

    let mut keys = Vec::new();
    for (season_index, season_value) in show.children {
        let season: KeyNode = decode(command, season_value)?;
        for (episode_index, episode_value) in season.children {
            let episode: KeyNode = decode(command, episode_value)?;
            let key = episode.rating_key.ok_or_else(|| {
                SourceError::malformed(
                    command,
                    format!("season {} episode {} has no rating_key", season_index, episode_index),
                )
            })?;
            keys.push(RatingKey(key));
        }
    }

    Ok(keys)
}

pub fn parse_metadata(data: Value) -> Result<MediaMetadata, SourceError> {
    let command = CMD_METADATA;
    match &data {
        Value::Null => return Err(SourceError::EmptyResult { command }),
        Value::Object(map) if map.is_empty() => return Err(SourceError::EmptyResult { command }),
        _ => {}
    }

    let row: MetadataRow = decode(command, data)?;
    let part = row
        .media_info
        .into_iter()
        .next()
        .ok_or_else(|| SourceError::malformed(command, "media_info is empty"))?
        .parts
        .into_iter()
        .next()
        .ok_or_else(|| SourceError::malformed(command, "parts is empty"))?;

    Ok(MediaMetadata {
        added_at: row.added_at,
        parent_rating_key: row.parent_rating_key.map(RatingKey),
        title: row.title,
        rating_key: RatingKey(row.rating_key),
        media_type: MediaKind::from(row.media_type),
        grandparent_title: row.grandparent_title,
        file: part.file,
        file_size: part.file_size,
    })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Int(i64),
    Float(f64),
    Str(String),
}

fn de_i64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Int(i) => Ok(i),
        NumberOrString::Float(f) => Ok(f as i64),
        NumberOrString::Str(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| de::Error::custom(format!("expected integer, got {:?}", s))),
    }
}

fn de_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let value = de_i64(deserializer)?;
    u64::try_from(value).map_err(|_| de::Error::custom(format!("expected non-negative integer, got {}", value)))
}

/// Null, missing and `""` all mean "no value".
fn de_opt_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
    match Option::<NumberOrString>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrString::Str(s)) if s.trim().is_empty() => Ok(None),
        Some(NumberOrString::Str(s)) => s
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|_| de::Error::custom(format!("expected integer, got {:?}", s))),
        Some(NumberOrString::Int(i)) => u64::try_from(i)
            .map(Some)
            .map_err(|_| de::Error::custom(format!("expected non-negative integer, got {}", i))),
        Some(NumberOrString::Float(f)) if f >= 0.0 => Ok(Some(f as u64)),
        Some(NumberOrString::Float(f)) => Err(de::Error::custom(format!("expected non-negative integer, got {}", f))),
    }
}

fn de_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Int(i) => i.to_string(),
        NumberOrString::Float(f) => f.to_string(),
        NumberOrString::Str(s) => s,
    })
}
