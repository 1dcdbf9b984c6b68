use chrono::{DateTime, Utc};
use poise::serenity_prelude::{GuildId, RoleId, UserId};

use super::{BirthdayStore, PendingRoleRemoval};

/// A birthday role whose time is up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DueRoleRemoval {
    pub guild_id: GuildId,
    pub user_id: UserId,
    pub role_id: RoleId,
}

impl BirthdayStore {
    pub fn pending_role_removal(&self, guild_id: GuildId, user_id: UserId) -> Option<&PendingRoleRemoval> {
        self.guild(guild_id)?.pending_role_removals.get(&user_id)
    }

    /// Role removals that expired at or before `now`
    pub fn due_role_removals(&self, now: DateTime<Utc>) -> Vec<DueRoleRemoval> {
        self.guilds
            .iter()
            .flat_map(|(guild_id, guild)| {
                guild
                    .pending_role_removals
                    .iter()
                    .filter(move |(_, pending)| pending.expires_at <= now)
                    .map(move |(user_id, pending)| DueRoleRemoval {
                        guild_id: *guild_id,
                        user_id: *user_id,
                        role_id: pending.role,
                    })
            })
            .collect()
    }

    /// Drop a pending removal once it has been handled
    pub fn complete_role_removal(&mut self, guild_id: GuildId, user_id: UserId) -> bool {
        let removed = self
            .guilds
            .get_mut(&guild_id)
            .and_then(|guild| guild.pending_role_removals.remove(&user_id))
            .is_some();

        if removed {
            self.persist();
        }
        removed
    }
}
