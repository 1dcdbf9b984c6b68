/// Birthday store modules organized by feature
mod birthday;
mod pending;
mod settings;

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use poise::serenity_prelude::{ChannelId, GuildId, RoleId, UserId};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::utils::datetime::calculate_age;
use crate::utils::timezone::local_date;

pub use birthday::{DueCelebration, UpcomingBirthday};
pub use pending::DueRoleRemoval;
pub use settings::GuildConfigSummary;

/// Store shared between the command handlers and the celebration engine
pub type SharedStore = Arc<Mutex<BirthdayStore>>;

/// Failure reading or writing the backing file
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// A user's birthday within one guild
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BirthdayRecord {
    pub month: u32,
    pub day: u32,
    #[serde(default)]
    pub year: Option<i32>,
    /// Day key ("YYYY-M-D") of the last celebration
    #[serde(default)]
    pub last_celebrated: Option<String>,
}

impl BirthdayRecord {
    pub fn new(month: u32, day: u32, year: Option<i32>) -> Self {
        Self {
            month,
            day,
            year,
            last_celebrated: None,
        }
    }

    /// Age reached in `year`, if the birth year is known
    pub fn age_in(&self, year: i32) -> Option<i32> {
        self.year.map(|birth_year| calculate_age(birth_year, year))
    }
}

/// Birthday role that must be taken back once `expires_at` has passed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingRoleRemoval {
    pub role: RoleId,
    pub expires_at: DateTime<Utc>,
}

/// Per-guild birthday configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuildBirthdayConfig {
    #[serde(default)]
    pub announcement_channel: Option<ChannelId>,
    #[serde(default)]
    pub role: Option<RoleId>,
    #[serde(default)]
    pub users: BTreeMap<UserId, BirthdayRecord>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub pending_role_removals: BTreeMap<UserId, PendingRoleRemoval>,
}

/// In-memory birthday data, written back to a JSON file on every mutation
#[derive(Debug)]
pub struct BirthdayStore {
    path: PathBuf,
    timezone: Tz,
    guilds: BTreeMap<GuildId, GuildBirthdayConfig>,
}

impl BirthdayStore {
    /// Create an empty store backed by `path` without touching the file
    pub fn new(path: impl Into<PathBuf>, timezone: Tz) -> Self {
        Self {
            path: path.into(),
            timezone,
            guilds: BTreeMap::new(),
        }
    }

    /// Create a store and load its contents from `path`
    pub fn open(path: impl Into<PathBuf>, timezone: Tz) -> Self {
        let mut store = Self::new(path, timezone);
        store.load();
        store
    }

    /// Wrap the store for sharing across tasks
    pub fn into_shared(self) -> SharedStore {
        Arc::new(Mutex::new(self))
    }

    #[cfg(test)]
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Today's date in the store's timezone
    pub fn today(&self) -> NaiveDate {
        local_date(Utc::now(), &self.timezone)
    }

    /// Replace the in-memory state with the backing file's contents.
    ///
    /// A missing file is created empty. An unreadable or malformed file is
    /// logged and the state is reset to empty.
    pub fn load(&mut self) {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(guilds) => {
                    self.guilds = guilds;
                    info!(
                        "Loaded birthday data for {} guild(s) from {}",
                        self.guilds.len(),
                        self.path.display()
                    );
                }
                Err(e) => {
                    error!(
                        "Failed to parse birthday data in {}, starting empty: {}",
                        self.path.display(),
                        e
                    );
                    self.guilds = BTreeMap::new();
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(
                    "No birthday data found at {}, creating an empty file",
                    self.path.display()
                );
                self.guilds = BTreeMap::new();
                self.persist();
            }
            Err(e) => {
                error!(
                    "Failed to read birthday data from {}, starting empty: {}",
                    self.path.display(),
                    e
                );
                self.guilds = BTreeMap::new();
            }
        }
    }

    /// Write the full state to the backing file through a temp file and rename
    pub fn save(&self) -> Result<(), PersistenceError> {
        let data = serde_json::to_vec_pretty(&self.guilds)?;
        atomic_write(&self.path, &data)
    }

    /// Save, logging instead of failing; memory stays the source of truth
    fn persist(&self) {
        if let Err(e) = self.save() {
            warn!(
                "Failed to save birthday data to {}: {}",
                self.path.display(),
                e
            );
        }
    }

    fn guild(&self, guild_id: GuildId) -> Option<&GuildBirthdayConfig> {
        self.guilds.get(&guild_id)
    }

    /// Guild entry, created with no channel and no role on first write
    fn guild_mut(&mut self, guild_id: GuildId) -> &mut GuildBirthdayConfig {
        self.guilds.entry(guild_id).or_default()
    }
}

/// Atomically write `data` to `path` using a tempfile in the same directory
fn atomic_write(path: &Path, data: &[u8]) -> Result<(), PersistenceError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_path(dir: &TempDir) -> PathBuf {
        dir.path().join("birthdays.json")
    }

    #[test]
    fn test_missing_file_is_created_empty() {
        let dir = TempDir::new().unwrap();
        let path = store_path(&dir);

        let store = BirthdayStore::open(&path, Tz::UTC);

        assert!(store.guilds.is_empty());
        assert_eq!(std::fs::read_to_string(&path).unwrap().trim(), "{}");
    }

    #[test]
    fn test_missing_parent_directories_are_created() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/data/birthdays.json");

        BirthdayStore::open(&path, Tz::UTC);

        assert!(path.exists());
    }

    #[test]
    fn test_malformed_file_resets_to_empty() {
        let dir = TempDir::new().unwrap();
        let path = store_path(&dir);
        std::fs::write(&path, "{ not json").unwrap();

        let store = BirthdayStore::open(&path, Tz::UTC);

        assert!(store.guilds.is_empty());
        // The broken file is left alone until the next mutation
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ not json");
    }

    #[test]
    fn test_reads_documented_layout() {
        let dir = TempDir::new().unwrap();
        let path = store_path(&dir);
        std::fs::write(
            &path,
            r#"{
                "100": {
                    "announcementChannel": "200",
                    "role": null,
                    "users": {
                        "300": { "month": 5, "day": 17, "year": 1990, "lastCelebrated": "2024-5-17" },
                        "301": { "month": 1, "day": 2, "year": null, "lastCelebrated": null }
                    }
                }
            }"#,
        )
        .unwrap();

        let store = BirthdayStore::open(&path, Tz::UTC);
        let guild = store.guild(GuildId::new(100)).unwrap();

        assert_eq!(guild.announcement_channel, Some(ChannelId::new(200)));
        assert_eq!(guild.role, None);
        assert!(guild.pending_role_removals.is_empty());
        let record = &guild.users[&UserId::new(300)];
        assert_eq!(record.year, Some(1990));
        assert_eq!(record.last_celebrated.as_deref(), Some("2024-5-17"));
        assert_eq!(guild.users[&UserId::new(301)].year, None);
    }

    #[test]
    fn test_save_round_trips_through_file() {
        let dir = TempDir::new().unwrap();
        let path = store_path(&dir);

        let mut store = BirthdayStore::new(&path, Tz::UTC);
        let guild = store.guild_mut(GuildId::new(1));
        guild.announcement_channel = Some(ChannelId::new(2));
        guild.users.insert(UserId::new(3), BirthdayRecord::new(7, 4, None));
        store.save().unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"announcementChannel\": \"2\""));
        assert!(raw.contains("\"lastCelebrated\": null"));
        assert!(!raw.contains("pendingRoleRemovals"));

        let reloaded = BirthdayStore::open(&path, Tz::UTC);
        assert_eq!(reloaded.guilds, store.guilds);
    }

    #[test]
    fn test_age_in() {
        assert_eq!(BirthdayRecord::new(5, 15, Some(2000)).age_in(2025), Some(25));
        assert_eq!(BirthdayRecord::new(5, 15, None).age_in(2025), None);
    }
}
