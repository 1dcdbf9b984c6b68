/// Pure functions for formatting command replies (Discord-agnostic)
use poise::serenity_prelude::{ChannelId, RoleId, UserId};

use crate::store::{BirthdayRecord, GuildConfigSummary, UpcomingBirthday};
use crate::utils::datetime::{format_date_display, get_month_name};

/// Format a validation error message with emoji
pub fn format_error(message: &str) -> String {
    format!("❌ {}", message)
}

/// Format a success message with emoji
pub fn format_success(message: &str) -> String {
    format!("✅ {}", message)
}

/// Format an info message with emoji
pub fn format_info(message: &str) -> String {
    format!("ℹ️ {}", message)
}

/// Build a success message for saving data
pub fn build_save_success(item_type: &str) -> String {
    format_success(&format!("{} saved successfully!", item_type))
}

/// Build a success message for deleting data
pub fn build_delete_success(item_type: &str) -> String {
    format_success(&format!("{} deleted successfully!", item_type))
}

/// Format a birthday for display, e.g. "15 March 1995" or "15 March"
pub fn format_birthday_display(month: u32, day: u32, year: Option<i32>) -> String {
    match year {
        Some(year) => format!("{} {} {}", day, get_month_name(month), year),
        None => format_date_display(month, day),
    }
}

/// Describe how far away a birthday is
pub fn format_days_until(days: i64) -> String {
    match days {
        0 => "today! 🎉".to_string(),
        1 => "tomorrow".to_string(),
        n => format!("in {} days", n),
    }
}

/// One line of the `/birthday upcoming` listing
pub fn build_upcoming_line(entry: &UpcomingBirthday) -> String {
    format!(
        "• <@{}>: {} ({})",
        entry.user_id,
        format_date_display(entry.record.month, entry.record.day),
        format_days_until(entry.days_until)
    )
}

/// Build the `/birthday upcoming` reply
pub fn build_upcoming_list(entries: &[UpcomingBirthday]) -> String {
    if entries.is_empty() {
        return format_info("No birthdays have been registered in this server yet.");
    }

    let lines = entries
        .iter()
        .map(build_upcoming_line)
        .collect::<Vec<_>>()
        .join("\n");
    format!("🎂 **Upcoming birthdays**\n{}", lines)
}

fn mention_channel(channel: Option<ChannelId>) -> String {
    channel.map_or_else(|| "not set".to_string(), |id| format!("<#{}>", id))
}

fn mention_role(role: Option<RoleId>) -> String {
    role.map_or_else(|| "not set".to_string(), |id| format!("<@&{}>", id))
}

/// Build the `/birthday config` reply
pub fn build_config_summary(config: &GuildConfigSummary) -> String {
    format!(
        "🎂 **Birthday settings**\n\
         📢 Announcement channel: {}\n\
         🎭 Birthday role: {}\n\
         👥 Registered birthdays: {}",
        mention_channel(config.announcement_channel),
        mention_role(config.role),
        config.user_count
    )
}

/// Reply shown after a user's birthday has been saved
pub fn build_birthday_saved(user_id: UserId, month: u32, day: u32, year: Option<i32>) -> String {
    format!(
        "{}\n\n<@{}>'s birthday: {}",
        build_save_success("Birthday"),
        user_id,
        format_birthday_display(month, day, year)
    )
}

/// Build the `/birthday show` reply
pub fn build_birthday_show(user_id: UserId, record: Option<&BirthdayRecord>) -> String {
    match record {
        Some(record) => format!(
            "🎂 <@{}>'s birthday: {}",
            user_id,
            format_birthday_display(record.month, record.day, record.year)
        ),
        None => format_info(&format!("<@{}> has not saved a birthday yet.", user_id)),
    }
}

/// Build the `/birthday list` reply, one line per member
pub fn build_birthday_list(entries: &[(UserId, BirthdayRecord)]) -> String {
    if entries.is_empty() {
        return format_info("No birthdays have been registered in this server yet.");
    }

    let lines = entries
        .iter()
        .map(|(user_id, record)| {
            format!(
                "• <@{}>: {}",
                user_id,
                format_birthday_display(record.month, record.day, record.year)
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    format!("🎂 **Registered birthdays** ({})\n{}", entries.len(), lines)
}
