use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Where an entry came from. Remote entries are read-only; only local entries
/// are ever written back to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Remote,
    Local,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntry {
    pub id: String,
    /// ISO calendar date, `YYYY-MM-DD`.
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub description: String,
    pub source: Source,
}

/// Field values collected by the entry form or the CLI before an id exists.
#[derive(Debug, Clone, Default)]
pub struct EntryDraft {
    pub date: String,
    pub image_url: Option<String>,
    pub rating: Option<u8>,
    pub categories: Vec<String>,
    pub description: String,
}

#[derive(thiserror::Error, Debug)]
pub enum JournalError {
    #[error("entry not found: {0}")]
    NotFound(String),
    #[error("entry {0} is remote and cannot be modified")]
    ReadOnly(String),
}

/// Transient view filters. Never persisted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterState {
    pub text: String,
    pub category: String,
    pub min_rating: Option<u8>,
}

impl FilterState {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.category.is_empty() && self.min_rating.is_none()
    }

    pub fn clear(&mut self) {
        *self = FilterState::default();
    }

    pub fn matches(&self, entry: &JournalEntry) -> bool {
        if !self.category.is_empty() && !entry.categories.iter().any(|c| c == &self.category) {
            return false;
        }
        if let Some(min) = self.min_rating {
            let rating = entry.rating.map(i16::from).unwrap_or(-1);
            if rating < i16::from(min) {
                return false;
            }
        }
        if !self.text.is_empty() {
            let needle = self.text.to_lowercase();
            let blob =
                format!("{} {}", entry.description, entry.categories.join(" ")).to_lowercase();
            if !blob.contains(&needle) {
                return false;
            }
        }
        true
    }
}

/// The merged entry set: a read-only remote half and an editable local half.
#[derive(Debug, Default)]
pub struct Journal {
    pub remote: Vec<JournalEntry>,
    pub local: Vec<JournalEntry>,
}

impl Journal {
    pub fn new(remote: Vec<JournalEntry>, local: Vec<JournalEntry>) -> Self {
        Journal { remote, local }
    }

    /// Full replacement, called once when the feed fetch completes.
    pub fn set_remote(&mut self, entries: Vec<JournalEntry>) {
        self.remote = entries;
    }

    /// Mints a fresh local entry from a draft and returns its id.
    pub fn create_local(&mut self, draft: EntryDraft) -> String {
        let id = generate_local_id();
        self.local.push(JournalEntry {
            id: id.clone(),
            date: draft.date,
            image_url: draft.image_url.filter(|u| !u.is_empty()),
            rating: draft.rating,
            categories: draft.categories,
            description: draft.description,
            source: Source::Local,
        });
        id
    }

    /// Applies `f` to the local entry with the given id.
    pub fn update_local<F>(&mut self, id: &str, f: F) -> Result<(), JournalError>
    where
        F: FnOnce(&mut JournalEntry),
    {
        if self.remote.iter().any(|e| e.id == id) {
            return Err(JournalError::ReadOnly(id.to_string()));
        }
        let entry = self
            .local
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| JournalError::NotFound(id.to_string()))?;
        f(entry);
        entry.source = Source::Local;
        Ok(())
    }

    pub fn delete_local(&mut self, id: &str) -> Result<(), JournalError> {
        if self.remote.iter().any(|e| e.id == id) {
            return Err(JournalError::ReadOnly(id.to_string()));
        }
        let before = self.local.len();
        self.local.retain(|e| e.id != id);
        if self.local.len() == before {
            return Err(JournalError::NotFound(id.to_string()));
        }
        Ok(())
    }

    pub fn find(&self, id: &str) -> Option<&JournalEntry> {
        self.remote
            .iter()
            .chain(self.local.iter())
            .find(|e| e.id == id)
    }

    /// Remote entries first, then local.
    pub fn merged(&self) -> Vec<JournalEntry> {
        let mut combined = Vec::with_capacity(self.remote.len() + self.local.len());
        combined.extend(self.remote.iter().cloned());
        combined.extend(self.local.iter().cloned());
        combined
    }

    pub fn filtered(&self, filters: &FilterState) -> Vec<JournalEntry> {
        let combined = self.merged();
        // All-default filters skip the predicate; output must match the
        // vacuously true predicate.
        if filters.is_empty() {
            return combined;
        }
        combined.into_iter().filter(|e| filters.matches(e)).collect()
    }

    /// Filtered entries grouped by calendar day, each day sorted by id.
    pub fn by_day(&self, filters: &FilterState) -> BTreeMap<String, Vec<JournalEntry>> {
        let mut map: BTreeMap<String, Vec<JournalEntry>> = BTreeMap::new();
        for entry in self.filtered(filters) {
            map.entry(entry.date.clone()).or_default().push(entry);
        }
        for entries in map.values_mut() {
            entries.sort_by(|a, b| a.id.cmp(&b.id));
        }
        map
    }
}

/// Time-based token, unique for the lifetime of the store. Never reused.
pub fn generate_local_id() -> String {
    format!("local-{}", Utc::now().timestamp_millis())
}

pub fn clamp_rating(n: i64) -> u8 {
    n.clamp(1, 5) as u8
}

/// Comma-separated category input, trimmed, empties dropped.
pub fn parse_categories(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote_entry(id: &str, date: &str, rating: Option<u8>, categories: &[&str]) -> JournalEntry {
        JournalEntry {
            id: id.to_string(),
            date: date.to_string(),
            image_url: None,
            rating,
            categories: categories.iter().map(|c| c.to_string()).collect(),
            description: String::new(),
            source: Source::Remote,
        }
    }

    #[test]
    fn category_and_rating_filters_combine() {
        let journal = Journal::new(
            vec![remote_entry("r1", "2024-01-05", Some(4), &["travel"])],
            Vec::new(),
        );
        let filters = FilterState {
            text: String::new(),
            category: "travel".to_string(),
            min_rating: Some(5),
        };
        assert!(journal.filtered(&filters).is_empty());

        let relaxed = FilterState {
            min_rating: Some(4),
            ..filters
        };
        assert_eq!(journal.filtered(&relaxed).len(), 1);
    }

    #[test]
    fn missing_rating_counts_as_minus_one() {
        let journal = Journal::new(vec![remote_entry("r1", "2024-01-05", None, &[])], Vec::new());
        let filters = FilterState {
            min_rating: Some(1),
            ..FilterState::default()
        };
        assert!(journal.filtered(&filters).is_empty());
    }

    #[test]
    fn text_filter_searches_description_and_categories() {
        let mut entry = remote_entry("r1", "2024-01-05", None, &["Hiking"]);
        entry.description = "Sunrise at the ridge".to_string();
        let journal = Journal::new(vec![entry], Vec::new());

        for needle in ["sunrise", "RIDGE", "hiking"] {
            let filters = FilterState {
                text: needle.to_string(),
                ..FilterState::default()
            };
            assert_eq!(journal.filtered(&filters).len(), 1, "needle {needle}");
        }
        let filters = FilterState {
            text: "ocean".to_string(),
            ..FilterState::default()
        };
        assert!(journal.filtered(&filters).is_empty());
    }

    #[test]
    fn empty_filters_shortcut_matches_vacuous_predicate() {
        let journal = Journal::new(
            vec![
                remote_entry("r1", "2024-01-05", Some(3), &["a"]),
                remote_entry("r2", "2024-01-06", None, &[]),
            ],
            Vec::new(),
        );
        let empty = FilterState::default();
        let skipped = journal.filtered(&empty);
        let applied: Vec<JournalEntry> = journal
            .merged()
            .into_iter()
            .filter(|e| empty.matches(e))
            .collect();
        assert_eq!(skipped, applied);
    }

    #[test]
    fn filtering_is_idempotent() {
        let journal = Journal::new(
            vec![
                remote_entry("r1", "2024-01-05", Some(3), &["travel"]),
                remote_entry("r2", "2024-01-06", Some(5), &["food"]),
            ],
            Vec::new(),
        );
        let filters = FilterState {
            min_rating: Some(4),
            ..FilterState::default()
        };
        let once = journal.filtered(&filters);
        let twice: Vec<JournalEntry> = once
            .iter()
            .cloned()
            .filter(|e| filters.matches(e))
            .collect();
        assert_eq!(once, twice);
    }

    #[test]
    fn by_day_sorts_within_day_by_id() {
        let journal = Journal::new(
            vec![
                remote_entry("r2", "2024-01-05", None, &[]),
                remote_entry("r1", "2024-01-05", None, &[]),
            ],
            Vec::new(),
        );
        let days = journal.by_day(&FilterState::default());
        let ids: Vec<&str> = days["2024-01-05"].iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["r1", "r2"]);
    }

    #[test]
    fn create_local_mints_prefixed_id_and_groups_by_day() {
        let mut journal = Journal::default();
        let id = journal.create_local(EntryDraft {
            date: "2024-03-10".to_string(),
            ..EntryDraft::default()
        });
        assert!(id.starts_with("local-"));
        let entry = journal.find(&id).unwrap();
        assert_eq!(entry.source, Source::Local);

        let days = journal.by_day(&FilterState::default());
        assert!(days["2024-03-10"].iter().any(|e| e.id == id));
    }

    #[test]
    fn update_and_delete_local() {
        let mut journal = Journal::default();
        let id = journal.create_local(EntryDraft {
            date: "2024-03-10".to_string(),
            ..EntryDraft::default()
        });

        journal
            .update_local(&id, |e| e.description = "edited".to_string())
            .unwrap();
        assert_eq!(journal.find(&id).unwrap().description, "edited");

        journal.delete_local(&id).unwrap();
        assert!(journal.find(&id).is_none());
        assert!(matches!(
            journal.delete_local(&id),
            Err(JournalError::NotFound(_))
        ));
    }

    #[test]
    fn remote_entries_are_read_only() {
        let mut journal =
            Journal::new(vec![remote_entry("r1", "2024-01-05", None, &[])], Vec::new());
        assert!(matches!(
            journal.update_local("r1", |_| {}),
            Err(JournalError::ReadOnly(_))
        ));
        assert!(matches!(
            journal.delete_local("r1"),
            Err(JournalError::ReadOnly(_))
        ));
    }

    #[test]
    fn category_parsing_trims_and_drops_empties() {
        assert_eq!(
            parse_categories(" travel , food,, hiking "),
            vec!["travel", "food", "hiking"]
        );
        assert!(parse_categories("  ,  ").is_empty());
    }

    #[test]
    fn rating_clamp() {
        assert_eq!(clamp_rating(0), 1);
        assert_eq!(clamp_rating(3), 3);
        assert_eq!(clamp_rating(9), 5);
    }
}
