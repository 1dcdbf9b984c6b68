use poise::serenity_prelude::{GuildChannel, Role, User};
use tracing::info;

use crate::{
    constants::DEFAULT_UPCOMING_LIMIT,
    models::{Context, Error},
    utils::messages::{
        build_birthday_list, build_birthday_saved, build_birthday_show, build_config_summary,
        build_delete_success, build_upcoming_list, format_error, format_info, format_success,
    },
    utils::validation::require_guild,
};

/// Manage birthdays for this server
#[poise::command(
    slash_command,
    guild_only,
    subcommands(
        "set_birthday",
        "show_birthday",
        "remove_birthday",
        "list_birthdays",
        "upcoming_birthdays",
        "show_config",
        "set_channel",
        "set_role",
        "reset_celebration",
        "check_birthdays"
    ),
    subcommand_required
)]
pub async fn birthday(_ctx: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// Save your birthday
#[poise::command(slash_command, rename = "set")]
pub async fn set_birthday(
    ctx: Context<'_>,
    #[description = "Month (1-12)"]
    #[min = 1]
    #[max = 12]
    month: u32,
    #[description = "Day of the month"]
    #[min = 1]
    #[max = 31]
    day: u32,
    #[description = "Birth year (optional, used to show your age)"] year: Option<i32>,
) -> Result<(), Error> {
    let guild_id = require_guild(ctx.guild_id())?;
    let user_id = ctx.author().id;

    let result = ctx
        .data()
        .store
        .lock()
        .await
        .set_birthday(guild_id, user_id, month, day, year);

    match result {
        Ok(()) => {
            ctx.say(build_birthday_saved(user_id, month, day, year))
                .await?;
            info!("Saved birthday for user {} in guild {}", user_id, guild_id);
        }
        Err(e) => {
            ctx.say(format_error(&e.to_string())).await?;
        }
    }

    Ok(())
}

/// Show your birthday or another member's
#[poise::command(slash_command, rename = "show")]
pub async fn show_birthday(
    ctx: Context<'_>,
    #[description = "Member to look up (defaults to you)"] user: Option<User>,
) -> Result<(), Error> {
    let guild_id = require_guild(ctx.guild_id())?;
    let user_id = user.as_ref().map_or(ctx.author().id, |u| u.id);

    let record = ctx
        .data()
        .store
        .lock()
        .await
        .get_birthday(guild_id, user_id)
        .cloned();

    ctx.say(build_birthday_show(user_id, record.as_ref())).await?;
    Ok(())
}

/// Delete your saved birthday
#[poise::command(slash_command, rename = "remove")]
pub async fn remove_birthday(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = require_guild(ctx.guild_id())?;
    let user_id = ctx.author().id;

    let removed = ctx
        .data()
        .store
        .lock()
        .await
        .remove_birthday(guild_id, user_id);

    if removed {
        ctx.say(build_delete_success("Birthday")).await?;
        info!("Removed birthday for user {} in guild {}", user_id, guild_id);
    } else {
        ctx.say(format_info("You have no saved birthday in this server."))
            .await?;
    }

    Ok(())
}

/// List every birthday saved in this server
#[poise::command(slash_command, rename = "list")]
pub async fn list_birthdays(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = require_guild(ctx.guild_id())?;

    let entries: Vec<_> = ctx
        .data()
        .store
        .lock()
        .await
        .get_all_birthdays(guild_id)
        .map(|users| {
            users
                .iter()
                .map(|(user_id, record)| (*user_id, record.clone()))
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    ctx.say(build_birthday_list(&entries)).await?;
    Ok(())
}

/// Show the next birthdays in this server
#[poise::command(slash_command, rename = "upcoming")]
pub async fn upcoming_birthdays(
    ctx: Context<'_>,
    #[description = "How many birthdays to show"]
    #[min = 1]
    #[max = 25]
    limit: Option<u32>,
) -> Result<(), Error> {
    let guild_id = require_guild(ctx.guild_id())?;
    let limit = limit.map_or(DEFAULT_UPCOMING_LIMIT, |limit| limit as usize);

    let upcoming = ctx
        .data()
        .store
        .lock()
        .await
        .get_upcoming_birthdays(guild_id, limit);

    ctx.say(build_upcoming_list(&upcoming)).await?;
    Ok(())
}

/// Show this server's birthday settings
#[poise::command(slash_command, rename = "config")]
pub async fn show_config(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = require_guild(ctx.guild_id())?;

    let config = ctx.data().store.lock().await.get_guild_config(guild_id);

    ctx.say(build_config_summary(&config)).await?;
    Ok(())
}

/// Set or clear the channel where birthdays are announced
#[poise::command(slash_command, rename = "channel", required_permissions = "MANAGE_GUILD")]
pub async fn set_channel(
    ctx: Context<'_>,
    #[description = "Announcement channel (leave empty to disable announcements)"]
    #[channel_types("Text")]
    channel: Option<GuildChannel>,
) -> Result<(), Error> {
    let guild_id = require_guild(ctx.guild_id())?;

    match channel {
        Some(channel) => {
            ctx.data()
                .store
                .lock()
                .await
                .set_announcement_channel(guild_id, channel.id);

            // Today's birthdays get announced right away instead of at the next tick
            ctx.data().trigger_scan();

            ctx.say(format!(
                "{}\nBirthdays will be announced in <#{}>.",
                format_success("Announcement channel set!"),
                channel.id
            ))
            .await?;
            info!("Set birthday channel {} for guild {}", channel.id, guild_id);
        }
        None => {
            ctx.data()
                .store
                .lock()
                .await
                .clear_announcement_channel(guild_id);

            ctx.say(format_success(
                "Announcement channel cleared. Birthdays will not be announced.",
            ))
            .await?;
            info!("Cleared birthday channel for guild {}", guild_id);
        }
    }

    Ok(())
}

/// Set or clear the role given to members on their birthday
#[poise::command(slash_command, rename = "role", required_permissions = "MANAGE_GUILD")]
pub async fn set_role(
    ctx: Context<'_>,
    #[description = "Birthday role (leave empty to stop granting a role)"] role: Option<Role>,
) -> Result<(), Error> {
    let guild_id = require_guild(ctx.guild_id())?;

    match role {
        Some(role) => {
            ctx.data()
                .store
                .lock()
                .await
                .set_birthday_role(guild_id, role.id);

            ctx.say(format!(
                "{}\nMembers will get <@&{}> for a day on their birthday.",
                format_success("Birthday role set!"),
                role.id
            ))
            .await?;
            info!("Set birthday role {} for guild {}", role.id, guild_id);
        }
        None => {
            ctx.data().store.lock().await.clear_birthday_role(guild_id);

            ctx.say(format_success("Birthday role cleared.")).await?;
            info!("Cleared birthday role for guild {}", guild_id);
        }
    }

    Ok(())
}

/// Allow a member to be celebrated again today
#[poise::command(slash_command, rename = "reset", required_permissions = "MANAGE_GUILD")]
pub async fn reset_celebration(
    ctx: Context<'_>,
    #[description = "Member whose celebration should be reset"] user: User,
) -> Result<(), Error> {
    let guild_id = require_guild(ctx.guild_id())?;

    let reset = ctx
        .data()
        .store
        .lock()
        .await
        .clear_last_celebrated(guild_id, user.id);

    if reset {
        ctx.say(format_success(&format!(
            "<@{}> can be celebrated again. Run `/birthday check` to celebrate now.",
            user.id
        )))
        .await?;
        info!("Reset celebration for user {} in guild {}", user.id, guild_id);
    } else {
        ctx.say(format_info(&format!(
            "<@{}> has no celebration to reset.",
            user.id
        )))
        .await?;
    }

    Ok(())
}

/// Run a birthday check now instead of waiting for the hourly one
#[poise::command(slash_command, rename = "check", required_permissions = "MANAGE_GUILD")]
pub async fn check_birthdays(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = require_guild(ctx.guild_id())?;

    ctx.data().trigger_scan();

    ctx.say(format_success("Birthday check started.")).await?;
    info!("Birthday check requested in guild {}", guild_id);

    Ok(())
}
