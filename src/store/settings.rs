use poise::serenity_prelude::{ChannelId, GuildId, RoleId};

use super::BirthdayStore;

/// Summary of a guild's birthday settings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GuildConfigSummary {
    pub announcement_channel: Option<ChannelId>,
    pub role: Option<RoleId>,
    pub user_count: usize,
}

impl BirthdayStore {
    /// Set the channel where birthdays are announced
    pub fn set_announcement_channel(&mut self, guild_id: GuildId, channel_id: ChannelId) {
        self.guild_mut(guild_id).announcement_channel = Some(channel_id);
        self.persist();
    }

    /// Stop announcing birthdays in this guild
    pub fn clear_announcement_channel(&mut self, guild_id: GuildId) {
        self.guild_mut(guild_id).announcement_channel = None;
        self.persist();
    }

    /// Set the role given to members on their birthday
    pub fn set_birthday_role(&mut self, guild_id: GuildId, role_id: RoleId) {
        self.guild_mut(guild_id).role = Some(role_id);
        self.persist();
    }

    /// Stop giving a birthday role in this guild
    pub fn clear_birthday_role(&mut self, guild_id: GuildId) {
        self.guild_mut(guild_id).role = None;
        self.persist();
    }

    pub fn get_guild_config(&self, guild_id: GuildId) -> GuildConfigSummary {
        self.guild(guild_id)
            .map(|guild| GuildConfigSummary {
                announcement_channel: guild.announcement_channel,
                role: guild.role,
                user_count: guild.users.len(),
            })
            .unwrap_or_default()
    }
}
