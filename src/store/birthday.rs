use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use poise::serenity_prelude::{ChannelId, GuildId, RoleId, UserId};

use super::{BirthdayRecord, BirthdayStore, PendingRoleRemoval};
use crate::utils::datetime::{date_key, days_until_next, matches_birthday};
use crate::utils::validation::{ValidationError, validate_birthday};

/// A user's next birthday, as listed by `/birthday upcoming`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpcomingBirthday {
    pub user_id: UserId,
    pub record: BirthdayRecord,
    pub days_until: i64,
}

/// A guild that has members to celebrate today
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DueCelebration {
    pub guild_id: GuildId,
    pub channel_id: ChannelId,
    pub role_id: Option<RoleId>,
    pub users: Vec<(UserId, BirthdayRecord)>,
}

impl BirthdayStore {
    /// Save or update a user's birthday
    pub fn set_birthday(
        &mut self,
        guild_id: GuildId,
        user_id: UserId,
        month: u32,
        day: u32,
        year: Option<i32>,
    ) -> Result<(), ValidationError> {
        let today = self.today();
        self.set_birthday_as_of(guild_id, user_id, month, day, year, today)
    }

    /// [`Self::set_birthday`] with an explicit "today" for the year checks
    pub fn set_birthday_as_of(
        &mut self,
        guild_id: GuildId,
        user_id: UserId,
        month: u32,
        day: u32,
        year: Option<i32>,
        today: NaiveDate,
    ) -> Result<(), ValidationError> {
        validate_birthday(month, day, year, today.year())?;

        self.guild_mut(guild_id)
            .users
            .insert(user_id, BirthdayRecord::new(month, day, year));
        self.persist();
        Ok(())
    }

    /// Get a user's birthday
    pub fn get_birthday(&self, guild_id: GuildId, user_id: UserId) -> Option<&BirthdayRecord> {
        self.guild(guild_id)?.users.get(&user_id)
    }

    /// Remove a user's birthday, returning whether one was stored
    pub fn remove_birthday(&mut self, guild_id: GuildId, user_id: UserId) -> bool {
        let removed = self
            .guilds
            .get_mut(&guild_id)
            .and_then(|guild| guild.users.remove(&user_id))
            .is_some();

        if removed {
            self.persist();
        }
        removed
    }

    /// All birthdays registered in a guild
    pub fn get_all_birthdays(&self, guild_id: GuildId) -> Option<&BTreeMap<UserId, BirthdayRecord>> {
        self.guild(guild_id).map(|guild| &guild.users)
    }

    /// The next `limit` birthdays in a guild, soonest first
    pub fn get_upcoming_birthdays(&self, guild_id: GuildId, limit: usize) -> Vec<UpcomingBirthday> {
        self.upcoming_birthdays_as_of(guild_id, limit, self.today())
    }

    /// [`Self::get_upcoming_birthdays`] counted from `today`
    pub fn upcoming_birthdays_as_of(
        &self,
        guild_id: GuildId,
        limit: usize,
        today: NaiveDate,
    ) -> Vec<UpcomingBirthday> {
        let Some(guild) = self.guild(guild_id) else {
            return Vec::new();
        };

        let mut upcoming: Vec<UpcomingBirthday> = guild
            .users
            .iter()
            .filter_map(|(user_id, record)| {
                days_until_next(record.month, record.day, today).map(|days_until| {
                    UpcomingBirthday {
                        user_id: *user_id,
                        record: record.clone(),
                        days_until,
                    }
                })
            })
            .collect();

        // Stable: ties keep the stored order
        upcoming.sort_by_key(|entry| entry.days_until);
        upcoming.truncate(limit);
        upcoming
    }

    /// Forget that a user was celebrated so the next scan celebrates them again
    pub fn clear_last_celebrated(&mut self, guild_id: GuildId, user_id: UserId) -> bool {
        let cleared = self
            .guilds
            .get_mut(&guild_id)
            .and_then(|guild| guild.users.get_mut(&user_id))
            .and_then(|record| record.last_celebrated.take())
            .is_some();

        if cleared {
            self.persist();
        }
        cleared
    }

    /// Guilds with an announcement channel and members whose birthday is
    /// `today` and who have not been celebrated yet today
    pub fn due_celebrations(&self, today: NaiveDate) -> Vec<DueCelebration> {
        let today_key = date_key(today);

        self.guilds
            .iter()
            .filter_map(|(guild_id, guild)| {
                let channel_id = guild.announcement_channel?;

                let users: Vec<(UserId, BirthdayRecord)> = guild
                    .users
                    .iter()
                    .filter(|(_, record)| matches_birthday(record.month, record.day, today))
                    .filter(|(_, record)| record.last_celebrated.as_deref() != Some(today_key.as_str()))
                    .map(|(user_id, record)| (*user_id, record.clone()))
                    .collect();

                if users.is_empty() {
                    return None;
                }

                Some(DueCelebration {
                    guild_id: *guild_id,
                    channel_id,
                    role_id: guild.role,
                    users,
                })
            })
            .collect()
    }

    /// Mark users as celebrated on `today` and record their pending role
    /// removals, saving once for the whole batch
    pub fn commit_celebrations(
        &mut self,
        guild_id: GuildId,
        celebrated: &[UserId],
        today: NaiveDate,
        role_removals: Vec<(UserId, PendingRoleRemoval)>,
    ) {
        let today_key = date_key(today);
        let guild = self.guild_mut(guild_id);

        for user_id in celebrated {
            if let Some(record) = guild.users.get_mut(user_id) {
                record.last_celebrated = Some(today_key.clone());
            }
        }
        guild.pending_role_removals.extend(role_removals);

        self.persist();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use chrono_tz::Tz;
    use tempfile::TempDir;

    fn test_guild() -> GuildId {
        GuildId::new(1)
    }

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn store(dir: &TempDir) -> BirthdayStore {
        BirthdayStore::open(dir.path().join("birthdays.json"), Tz::UTC)
    }

    #[test]
    fn test_set_birthday_validation_boundaries() {
        let dir = TempDir::new().unwrap();
        let mut store = store(&dir);
        let user = UserId::new(10);
        let today = date(2025, 6, 1);

        assert!(store.set_birthday_as_of(test_guild(), user, 0, 1, None, today).is_err());
        assert!(store.set_birthday_as_of(test_guild(), user, 13, 1, None, today).is_err());
        assert!(store.set_birthday_as_of(test_guild(), user, 2, 30, Some(2023), today).is_err());
        assert!(store.set_birthday_as_of(test_guild(), user, 5, 1, Some(1899), today).is_err());
        assert!(store.set_birthday_as_of(test_guild(), user, 5, 1, Some(2026), today).is_err());

        // Nothing was applied by the failed attempts
        assert!(store.get_birthday(test_guild(), user).is_none());
        assert!(store.get_all_birthdays(test_guild()).is_none());

        assert!(store.set_birthday_as_of(test_guild(), user, 2, 29, Some(2024), today).is_ok());
        assert_eq!(
            store.get_birthday(test_guild(), user),
            Some(&BirthdayRecord::new(2, 29, Some(2024)))
        );
    }

    #[test]
    fn test_set_birthday_rejects_future_year_against_clock() {
        let dir = TempDir::new().unwrap();
        let mut store = store(&dir);
        let next_year = store.today().year() + 1;

        let result = store.set_birthday(test_guild(), UserId::new(10), 5, 1, Some(next_year));

        assert!(matches!(result, Err(ValidationError::InvalidYear { .. })));
    }

    #[test]
    fn test_set_birthday_resets_last_celebrated_and_persists() {
        let dir = TempDir::new().unwrap();
        let mut store = store(&dir);
        let user = UserId::new(10);
        let today = date(2025, 6, 1);

        store.set_birthday_as_of(test_guild(), user, 6, 1, None, today).unwrap();
        store.commit_celebrations(test_guild(), &[user], today, Vec::new());
        assert_eq!(
            store.get_birthday(test_guild(), user).unwrap().last_celebrated.as_deref(),
            Some("2025-6-1")
        );

        store.set_birthday_as_of(test_guild(), user, 6, 1, Some(1990), today).unwrap();
        assert_eq!(store.get_birthday(test_guild(), user).unwrap().last_celebrated, None);

        let reloaded = BirthdayStore::open(store.path(), Tz::UTC);
        assert_eq!(
            reloaded.get_birthday(test_guild(), user),
            Some(&BirthdayRecord::new(6, 1, Some(1990)))
        );
    }

    #[test]
    fn test_set_birthday_creates_guild_without_channel_or_role() {
        let dir = TempDir::new().unwrap();
        let mut store = store(&dir);

        store
            .set_birthday_as_of(test_guild(), UserId::new(10), 3, 3, None, date(2025, 1, 1))
            .unwrap();

        let config = store.get_guild_config(test_guild());
        assert_eq!(config.announcement_channel, None);
        assert_eq!(config.role, None);
        assert_eq!(config.user_count, 1);
    }

    #[test]
    fn test_remove_birthday() {
        let dir = TempDir::new().unwrap();
        let mut store = store(&dir);
        let user = UserId::new(10);
        store.set_birthday_as_of(test_guild(), user, 3, 3, None, date(2025, 1, 1)).unwrap();

        assert!(store.remove_birthday(test_guild(), user));
        assert!(!store.remove_birthday(test_guild(), user));
        assert!(!store.remove_birthday(GuildId::new(999), user));

        let reloaded = BirthdayStore::open(store.path(), Tz::UTC);
        assert!(reloaded.get_birthday(test_guild(), user).is_none());
    }

    #[test]
    fn test_upcoming_wraps_into_next_year() {
        let dir = TempDir::new().unwrap();
        let mut store = store(&dir);
        let today = date(2025, 12, 30);
        let new_year = UserId::new(10);
        let new_years_eve = UserId::new(20);

        store.set_birthday_as_of(test_guild(), new_year, 1, 1, None, today).unwrap();
        store.set_birthday_as_of(test_guild(), new_years_eve, 12, 31, None, today).unwrap();

        let upcoming = store.upcoming_birthdays_as_of(test_guild(), 10, today);

        assert_eq!(upcoming.len(), 2);
        assert_eq!(upcoming[0].user_id, new_years_eve);
        assert_eq!(upcoming[0].days_until, 1);
        assert_eq!(upcoming[1].user_id, new_year);
        assert_eq!(upcoming[1].days_until, 2);
    }

    #[test]
    fn test_upcoming_truncates_and_keeps_ties_stable() {
        let dir = TempDir::new().unwrap();
        let mut store = store(&dir);
        let today = date(2025, 3, 1);

        for id in [30, 10, 20] {
            store
                .set_birthday_as_of(test_guild(), UserId::new(id), 3, 5, None, today)
                .unwrap();
        }
        store.set_birthday_as_of(test_guild(), UserId::new(40), 3, 1, None, today).unwrap();

        let upcoming = store.upcoming_birthdays_as_of(test_guild(), 3, today);
        let ids: Vec<u64> = upcoming.iter().map(|entry| entry.user_id.get()).collect();

        assert_eq!(ids, vec![40, 10, 20]);
        assert_eq!(upcoming[0].days_until, 0);
        assert!(store.upcoming_birthdays_as_of(GuildId::new(999), 3, today).is_empty());
    }

    #[test]
    fn test_leap_day_upcoming_agrees_with_due_celebrations() {
        let dir = TempDir::new().unwrap();
        let mut store = store(&dir);
        let user = UserId::new(10);
        let march_first = date(2025, 3, 1);

        store.set_announcement_channel(test_guild(), ChannelId::new(100));
        store
            .set_birthday_as_of(test_guild(), user, 2, 29, Some(2000), march_first)
            .unwrap();

        // Not celebrated on Mar 1 of a common year, so not listed as today either
        assert!(store.due_celebrations(march_first).is_empty());
        let upcoming = store.upcoming_birthdays_as_of(test_guild(), 10, march_first);
        assert_eq!(upcoming[0].days_until, 1095);

        let leap_day = date(2028, 2, 29);
        assert_eq!(store.upcoming_birthdays_as_of(test_guild(), 10, leap_day)[0].days_until, 0);
        assert_eq!(store.due_celebrations(leap_day)[0].users[0].0, user);
    }

    #[test]
    fn test_due_celebrations_skips_already_celebrated_and_unconfigured() {
        let dir = TempDir::new().unwrap();
        let mut store = store(&dir);
        let today = date(2025, 4, 10);
        let other_guild = GuildId::new(2);

        store.set_announcement_channel(test_guild(), ChannelId::new(100));
        for id in [10, 11, 12] {
            store
                .set_birthday_as_of(test_guild(), UserId::new(id), 4, 10, None, today)
                .unwrap();
        }
        store.set_birthday_as_of(test_guild(), UserId::new(13), 4, 11, None, today).unwrap();
        store.commit_celebrations(test_guild(), &[UserId::new(11)], today, Vec::new());
        // No announcement channel in this guild
        store
            .set_birthday_as_of(other_guild, UserId::new(10), 4, 10, None, today)
            .unwrap();

        let due = store.due_celebrations(today);

        assert_eq!(due.len(), 1);
        assert_eq!(due[0].guild_id, test_guild());
        assert_eq!(due[0].channel_id, ChannelId::new(100));
        let users: Vec<u64> = due[0].users.iter().map(|(id, _)| id.get()).collect();
        assert_eq!(users, vec![10, 12]);
    }

    #[test]
    fn test_clear_last_celebrated_makes_user_due_again() {
        let dir = TempDir::new().unwrap();
        let mut store = store(&dir);
        let today = date(2025, 4, 10);
        let user = UserId::new(10);

        store.set_announcement_channel(test_guild(), ChannelId::new(100));
        store.set_birthday_as_of(test_guild(), user, 4, 10, None, today).unwrap();
        store.commit_celebrations(test_guild(), &[user], today, Vec::new());
        assert!(store.due_celebrations(today).is_empty());

        assert!(store.clear_last_celebrated(test_guild(), user));
        assert!(!store.clear_last_celebrated(test_guild(), user));
        assert_eq!(store.due_celebrations(today).len(), 1);
    }

    #[test]
    fn test_commit_celebrations_records_role_removals() {
        let dir = TempDir::new().unwrap();
        let mut store = store(&dir);
        let today = date(2025, 4, 10);
        let user = UserId::new(10);
        let expires_at = Utc.with_ymd_and_hms(2025, 4, 11, 9, 0, 0).unwrap();

        store.set_birthday_as_of(test_guild(), user, 4, 10, None, today).unwrap();
        store.commit_celebrations(
            test_guild(),
            &[user],
            today,
            vec![(
                user,
                PendingRoleRemoval {
                    role: RoleId::new(5),
                    expires_at,
                },
            )],
        );

        let reloaded = BirthdayStore::open(store.path(), Tz::UTC);
        assert_eq!(
            reloaded.pending_role_removal(test_guild(), user),
            Some(&PendingRoleRemoval {
                role: RoleId::new(5),
                expires_at,
            })
        );
        assert_eq!(
            reloaded.get_birthday(test_guild(), user).unwrap().last_celebrated.as_deref(),
            Some("2025-4-10")
        );
    }
}
