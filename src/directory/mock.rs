//! In-memory [`GuildDirectory`] that records every action.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use poise::serenity_prelude::{ChannelId, GuildId, RoleId, UserId};

use super::{DirectoryError, DirectoryResult, GuildDirectory, GuildInfo, MemberInfo};
use crate::utils::message_formatter::Celebration;

#[derive(Default)]
pub struct MockState {
    pub guilds: HashMap<GuildId, String>,
    pub channels: HashSet<(GuildId, ChannelId)>,
    pub members: HashSet<(GuildId, UserId)>,
    pub roles: HashSet<(GuildId, RoleId)>,

    pub fail_sends: bool,
    pub fail_grants: bool,
    pub fail_dms: bool,
    /// Time each send takes, to hold a scan open
    pub send_delay: Option<Duration>,

    pub sent: Vec<(ChannelId, Celebration)>,
    pub granted: Vec<(GuildId, UserId, RoleId)>,
    pub revoked: Vec<(GuildId, UserId, RoleId)>,
    pub direct_messages: Vec<(UserId, String)>,
}

#[derive(Default)]
pub struct MockDirectory {
    state: Mutex<MockState>,
}

impl MockDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }

    pub fn add_guild(&self, guild_id: GuildId, channel_id: ChannelId) {
        let mut state = self.state();
        state.guilds.insert(guild_id, format!("Guild {}", guild_id));
        state.channels.insert((guild_id, channel_id));
    }

    pub fn add_member(&self, guild_id: GuildId, user_id: UserId) {
        self.state().members.insert((guild_id, user_id));
    }

    pub fn remove_member(&self, guild_id: GuildId, user_id: UserId) {
        self.state().members.remove(&(guild_id, user_id));
    }

    pub fn add_role(&self, guild_id: GuildId, role_id: RoleId) {
        self.state().roles.insert((guild_id, role_id));
    }

    pub fn sent_styles(&self) -> Vec<usize> {
        self.state()
            .sent
            .iter()
            .map(|(_, celebration)| celebration.style_index)
            .collect()
    }
}

#[async_trait]
impl GuildDirectory for MockDirectory {
    async fn resolve_guild(&self, guild_id: GuildId) -> DirectoryResult<GuildInfo> {
        self.state()
            .guilds
            .get(&guild_id)
            .map(|name| GuildInfo { name: name.clone() })
            .ok_or(DirectoryError::GuildNotFound(guild_id))
    }

    async fn resolve_channel(&self, guild_id: GuildId, channel_id: ChannelId) -> DirectoryResult<()> {
        if self.state().channels.contains(&(guild_id, channel_id)) {
            Ok(())
        } else {
            Err(DirectoryError::ChannelNotFound(channel_id))
        }
    }

    async fn resolve_member(&self, guild_id: GuildId, user_id: UserId) -> DirectoryResult<MemberInfo> {
        if self.state().members.contains(&(guild_id, user_id)) {
            Ok(MemberInfo {
                display_name: format!("user{}", user_id),
            })
        } else {
            Err(DirectoryError::MemberNotFound(user_id))
        }
    }

    async fn resolve_role(&self, guild_id: GuildId, role_id: RoleId) -> DirectoryResult<()> {
        if self.state().roles.contains(&(guild_id, role_id)) {
            Ok(())
        } else {
            Err(DirectoryError::RoleNotFound(role_id))
        }
    }

    async fn send_celebration(
        &self,
        channel_id: ChannelId,
        celebration: &Celebration,
    ) -> DirectoryResult<()> {
        let delay = self.state().send_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state();
        if state.fail_sends {
            return Err(DirectoryError::ChannelNotFound(channel_id));
        }
        state.sent.push((channel_id, celebration.clone()));
        Ok(())
    }

    async fn grant_role(&self, guild_id: GuildId, user_id: UserId, role_id: RoleId) -> DirectoryResult<()> {
        let mut state = self.state();
        if state.fail_grants {
            return Err(DirectoryError::RoleNotFound(role_id));
        }
        state.granted.push((guild_id, user_id, role_id));
        Ok(())
    }

    async fn revoke_role(&self, guild_id: GuildId, user_id: UserId, role_id: RoleId) -> DirectoryResult<()> {
        self.state().revoked.push((guild_id, user_id, role_id));
        Ok(())
    }

    async fn direct_message(&self, user_id: UserId, text: &str) -> DirectoryResult<()> {
        let mut state = self.state();
        if state.fail_dms {
            return Err(DirectoryError::MemberNotFound(user_id));
        }
        state.direct_messages.push((user_id, text.to_string()));
        Ok(())
    }
}
