//! Access to guilds, channels, members and roles.
//!
//! The celebration engine only talks to Discord through [`GuildDirectory`],
//! so every lookup or action can fail independently and the caller decides
//! what to skip.

mod discord;
#[cfg(test)]
pub mod mock;

use async_trait::async_trait;
use poise::serenity_prelude::{self as serenity, ChannelId, GuildId, RoleId, UserId};
use thiserror::Error;

use crate::utils::message_formatter::Celebration;

pub use discord::DiscordDirectory;

/// A guild lookup or action could not be completed
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("guild {0} is not available")]
    GuildNotFound(GuildId),

    #[error("channel {0} is not available")]
    ChannelNotFound(ChannelId),

    #[error("member {0} is not in the guild")]
    MemberNotFound(UserId),

    #[error("role {0} does not exist")]
    RoleNotFound(RoleId),

    #[error(transparent)]
    Discord(Box<serenity::Error>),
}

impl From<serenity::Error> for DirectoryError {
    fn from(e: serenity::Error) -> Self {
        DirectoryError::Discord(Box::new(e))
    }
}

pub type DirectoryResult<T> = Result<T, DirectoryError>;

/// The parts of a guild the celebration needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuildInfo {
    pub name: String,
}

/// The parts of a member the celebration needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberInfo {
    pub display_name: String,
}

#[async_trait]
pub trait GuildDirectory: Send + Sync {
    async fn resolve_guild(&self, guild_id: GuildId) -> DirectoryResult<GuildInfo>;

    /// Check that the channel exists and belongs to the guild
    async fn resolve_channel(&self, guild_id: GuildId, channel_id: ChannelId) -> DirectoryResult<()>;

    async fn resolve_member(&self, guild_id: GuildId, user_id: UserId) -> DirectoryResult<MemberInfo>;

    async fn resolve_role(&self, guild_id: GuildId, role_id: RoleId) -> DirectoryResult<()>;

    async fn send_celebration(
        &self,
        channel_id: ChannelId,
        celebration: &Celebration,
    ) -> DirectoryResult<()>;

    async fn grant_role(&self, guild_id: GuildId, user_id: UserId, role_id: RoleId) -> DirectoryResult<()>;

    async fn revoke_role(&self, guild_id: GuildId, user_id: UserId, role_id: RoleId) -> DirectoryResult<()>;

    async fn direct_message(&self, user_id: UserId, text: &str) -> DirectoryResult<()>;
}
