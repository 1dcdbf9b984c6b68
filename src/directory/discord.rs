use async_trait::async_trait;
use poise::serenity_prelude::{
    self as serenity, ChannelId, CreateEmbed, CreateEmbedFooter, CreateMessage, GuildId, RoleId,
    UserId,
};
use std::sync::Arc;

use super::{DirectoryError, DirectoryResult, GuildDirectory, GuildInfo, MemberInfo};
use crate::constants::ROLE_AUDIT_REASON;
use crate::utils::message_formatter::Celebration;

/// [`GuildDirectory`] backed by the Discord HTTP API
pub struct DiscordDirectory {
    http: Arc<serenity::Http>,
}

impl DiscordDirectory {
    pub fn new(http: Arc<serenity::Http>) -> Self {
        Self { http }
    }
}

/// Whether Discord answered 404 for the requested object
fn is_not_found(error: &serenity::Error) -> bool {
    match error {
        serenity::Error::Http(http_error) => http_error
            .status_code()
            .is_some_and(|status| status.as_u16() == 404),
        _ => false,
    }
}

/// Build the embed for a celebration
fn build_embed(celebration: &Celebration) -> CreateEmbed {
    CreateEmbed::new()
        .title(celebration.style.title)
        .description(&celebration.description)
        .colour(celebration.style.colour)
        .thumbnail(celebration.style.image_url)
        .footer(CreateEmbedFooter::new(&celebration.footer))
}

#[async_trait]
impl GuildDirectory for DiscordDirectory {
    async fn resolve_guild(&self, guild_id: GuildId) -> DirectoryResult<GuildInfo> {
        match guild_id.to_partial_guild(&self.http).await {
            Ok(guild) => Ok(GuildInfo { name: guild.name }),
            Err(e) if is_not_found(&e) => Err(DirectoryError::GuildNotFound(guild_id)),
            Err(e) => Err(e.into()),
        }
    }

    async fn resolve_channel(&self, guild_id: GuildId, channel_id: ChannelId) -> DirectoryResult<()> {
        let channel = match channel_id.to_channel(&self.http).await {
            Ok(channel) => channel,
            Err(e) if is_not_found(&e) => return Err(DirectoryError::ChannelNotFound(channel_id)),
            Err(e) => return Err(e.into()),
        };

        match channel.guild() {
            Some(guild_channel) if guild_channel.guild_id == guild_id => Ok(()),
            _ => Err(DirectoryError::ChannelNotFound(channel_id)),
        }
    }

    async fn resolve_member(&self, guild_id: GuildId, user_id: UserId) -> DirectoryResult<MemberInfo> {
        match guild_id.member(&self.http, user_id).await {
            Ok(member) => Ok(MemberInfo {
                display_name: member.display_name().to_string(),
            }),
            Err(e) if is_not_found(&e) => Err(DirectoryError::MemberNotFound(user_id)),
            Err(e) => Err(e.into()),
        }
    }

    async fn resolve_role(&self, guild_id: GuildId, role_id: RoleId) -> DirectoryResult<()> {
        let roles = guild_id.roles(&self.http).await?;
        if roles.contains_key(&role_id) {
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
        let message = CreateMessage::new()
            .content(&celebration.content)
            .embed(build_embed(celebration));

        channel_id.send_message(&self.http, message).await?;
        Ok(())
    }

    async fn grant_role(&self, guild_id: GuildId, user_id: UserId, role_id: RoleId) -> DirectoryResult<()> {
        self.http
            .add_member_role(guild_id, user_id, role_id, Some(ROLE_AUDIT_REASON))
            .await?;
        Ok(())
    }

    async fn revoke_role(&self, guild_id: GuildId, user_id: UserId, role_id: RoleId) -> DirectoryResult<()> {
        self.http
            .remove_member_role(guild_id, user_id, role_id, Some(ROLE_AUDIT_REASON))
            .await?;
        Ok(())
    }

    async fn direct_message(&self, user_id: UserId, text: &str) -> DirectoryResult<()> {
        user_id
            .direct_message(&self.http, CreateMessage::new().content(text))
            .await?;
        Ok(())
    }
}
