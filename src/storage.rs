use crate::model::{JournalEntry, Source};
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Single store slot; the file name doubles as the schema version tag.
const LOCAL_STORE_FILE: &str = "local-events-v1.json";

pub const DEFAULT_FEED_URL: &str = "http://127.0.0.1:8080/journal.json";

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

pub fn local_store_path() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("", "", "lookback").context("locating data directory")?;
    Ok(dirs.data_dir().join(LOCAL_STORE_FILE))
}

/// Loads the locally authored entry set. Missing file or parse failure
/// degrades to an empty set. Every loaded record is re-tagged as local so a
/// corrupted store cannot impersonate remote entries.
pub fn load_local_events(path: &Path) -> Vec<JournalEntry> {
    let data = match fs::read_to_string(path) {
        Ok(data) => data,
        Err(_) => return Vec::new(),
    };
    match serde_json::from_str::<Vec<JournalEntry>>(&data) {
        Ok(mut entries) => {
            for entry in &mut entries {
                entry.source = Source::Local;
            }
            entries
        }
        Err(err) => {
            log::debug!("discarding unreadable local store {}: {err}", path.display());
            Vec::new()
        }
    }
}

/// Full overwrite of the store slot with the local subset of `events`.
pub fn save_local_events(path: &Path, events: &[JournalEntry]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("creating {:?}", parent))?;
    }
    let local: Vec<&JournalEntry> = events.iter().filter(|e| e.source == Source::Local).collect();
    let serialized = serde_json::to_string(&local).context("serializing local entries")?;
    fs::write(path, serialized).with_context(|| format!("writing {:?}", path))?;
    Ok(())
}

/// Raw feed record before normalization. Ratings and categories arrive as
/// loose JSON; anything off-shape is dropped rather than rejected.
#[derive(Debug, Deserialize)]
struct RawRemoteEntry {
    #[serde(default)]
    id: Option<String>,
    date: String,
    #[serde(default, rename = "imageUrl")]
    image_url: Option<String>,
    #[serde(default)]
    rating: Value,
    #[serde(default)]
    categories: Value,
    #[serde(default)]
    description: Option<String>,
}

/// Fetches the remote journal feed. Never fails: any network, status, or
/// parse problem is logged and yields an empty set.
pub fn fetch_remote_journal(url: &str) -> Vec<JournalEntry> {
    match fetch_raw(url) {
        Ok(raw) => raw
            .into_iter()
            .enumerate()
            .map(|(i, e)| normalize_remote(i, e))
            .collect(),
        Err(err) => {
            log::warn!("remote journal fetch from {url} failed: {err}");
            Vec::new()
        }
    }
}

fn fetch_raw(url: &str) -> Result<Vec<RawRemoteEntry>> {
    let client = reqwest::blocking::Client::builder()
        .timeout(FETCH_TIMEOUT)
        .build()
        .context("building http client")?;
    let raw = client
        .get(url)
        .header(reqwest::header::CACHE_CONTROL, "no-cache")
        .send()
        .context("requesting feed")?
        .error_for_status()
        .context("feed status")?
        .json::<Vec<RawRemoteEntry>>()
        .context("parsing feed body")?;
    Ok(raw)
}

fn normalize_remote(index: usize, raw: RawRemoteEntry) -> JournalEntry {
    let id = match raw.id {
        Some(id) if !id.is_empty() => id,
        _ => format!("remote-{}-{}", index, raw.date),
    };
    let rating = raw
        .rating
        .as_u64()
        .and_then(|n| u8::try_from(n).ok())
        .filter(|n| *n > 0);
    let categories = match raw.categories {
        Value::Array(values) => values
            .into_iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    };
    JournalEntry {
        id,
        date: raw.date,
        image_url: raw.image_url.filter(|u| !u.is_empty()),
        rating,
        categories,
        description: raw.description.unwrap_or_default(),
        source: Source::Remote,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn scratch_path(tag: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("lookback-test-{tag}-{nanos}.json"))
    }

    fn local_entry(id: &str, date: &str) -> JournalEntry {
        JournalEntry {
            id: id.to_string(),
            date: date.to_string(),
            image_url: None,
            rating: Some(4),
            categories: vec!["travel".to_string()],
            description: "a note".to_string(),
            source: Source::Local,
        }
    }

    #[test]
    fn load_missing_store_is_empty() {
        assert!(load_local_events(Path::new("/nonexistent/lookback.json")).is_empty());
    }

    #[test]
    fn load_garbage_store_is_empty() {
        let path = scratch_path("garbage");
        fs::write(&path, "{not json").unwrap();
        assert!(load_local_events(&path).is_empty());
        fs::remove_file(&path).ok();
    }

    #[test]
    fn save_drops_remote_entries() {
        let path = scratch_path("drop-remote");
        let mut remote = local_entry("r1", "2024-01-01");
        remote.source = Source::Remote;
        save_local_events(&path, &[remote, local_entry("local-1", "2024-01-02")]).unwrap();

        let loaded = load_local_events(&path);
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, "local-1");
        fs::remove_file(&path).ok();
    }

    #[test]
    fn load_retags_spoofed_source_as_local() {
        let path = scratch_path("retag");
        fs::write(
            &path,
            r#"[{"id":"x","date":"2024-01-01","categories":[],"description":"","source":"remote"}]"#,
        )
        .unwrap();
        let loaded = load_local_events(&path);
        assert_eq!(loaded[0].source, Source::Local);
        fs::remove_file(&path).ok();
    }

    #[test]
    fn save_load_save_is_byte_stable_for_local_only_set() {
        let path = scratch_path("round-trip");
        let events = vec![local_entry("local-1", "2024-01-02"), local_entry("local-2", "2024-01-03")];
        save_local_events(&path, &events).unwrap();
        let first = fs::read(&path).unwrap();

        let loaded = load_local_events(&path);
        save_local_events(&path, &loaded).unwrap();
        let second = fs::read(&path).unwrap();
        assert_eq!(first, second);
        fs::remove_file(&path).ok();
    }

    #[test]
    fn normalize_fills_missing_fields() {
        let raw: Vec<RawRemoteEntry> = serde_json::from_str(
            r#"[
                {"date":"2024-01-05"},
                {"id":"given","date":"2024-01-06","rating":4,"categories":["travel"],"description":"d","imageUrl":"http://x/y.jpg"},
                {"date":"2024-01-07","rating":"high","categories":"oops"}
            ]"#,
        )
        .unwrap();
        let entries: Vec<JournalEntry> = raw
            .into_iter()
            .enumerate()
            .map(|(i, e)| normalize_remote(i, e))
            .collect();

        assert_eq!(entries[0].id, "remote-0-2024-01-05");
        assert_eq!(entries[0].description, "");
        assert!(entries[0].categories.is_empty());
        assert_eq!(entries[0].source, Source::Remote);

        assert_eq!(entries[1].id, "given");
        assert_eq!(entries[1].rating, Some(4));
        assert_eq!(entries[1].categories, vec!["travel"]);
        assert_eq!(entries[1].image_url.as_deref(), Some("http://x/y.jpg"));

        // Off-shape rating and categories are dropped, not fatal.
        assert_eq!(entries[2].rating, None);
        assert!(entries[2].categories.is_empty());
    }

    #[test]
    fn fetch_failure_degrades_to_empty() {
        // Nothing listens on this port.
        assert!(fetch_remote_journal("http://127.0.0.1:9/none.json").is_empty());
    }
}
