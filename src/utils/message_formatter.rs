/// Pure functions for birthday celebration formatting (Discord-agnostic)
use chrono::{Datelike, NaiveDate};
use poise::serenity_prelude::UserId;

use crate::utils::datetime::format_date_display;

/// Visual presentation of a celebration message
#[derive(Debug, PartialEq, Eq)]
pub struct CelebrationStyle {
    pub colour: u32,
    pub title: &'static str,
    pub image_url: &'static str,
    pub caption: &'static str,
}

/// Presentation styles, used in order and then repeated
pub static CELEBRATION_STYLES: [CelebrationStyle; 4] = [
    CelebrationStyle {
        colour: 0xFF69B4,
        title: "🎉 Happy Birthday! 🎉",
        image_url: "https://cdn.jsdelivr.net/gh/twitter/twemoji@14.0.2/assets/72x72/1f389.png",
        caption: "Today we celebrate:",
    },
    CelebrationStyle {
        colour: 0xFFD700,
        title: "🎂 It's Birthday Time! 🎂",
        image_url: "https://cdn.jsdelivr.net/gh/twitter/twemoji@14.0.2/assets/72x72/1f382.png",
        caption: "Grab a slice of cake and join the party for:",
    },
    CelebrationStyle {
        colour: 0x1E90FF,
        title: "🎈 Another Trip Around the Sun! 🎈",
        image_url: "https://cdn.jsdelivr.net/gh/twitter/twemoji@14.0.2/assets/72x72/1f388.png",
        caption: "Balloons up! Today is a special day for:",
    },
    CelebrationStyle {
        colour: 0x32CD32,
        title: "🎁 Birthday Wishes! 🎁",
        image_url: "https://cdn.jsdelivr.net/gh/twitter/twemoji@14.0.2/assets/72x72/1f381.png",
        caption: "Send your best wishes to:",
    },
];

/// Round-robin cursor over [`CELEBRATION_STYLES`].
///
/// One step per celebration message, shared by every guild.
#[derive(Debug, Default)]
pub struct StyleRotation {
    cursor: usize,
}

impl StyleRotation {
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Style the next celebration will use
    pub fn current(&self) -> &'static CelebrationStyle {
        &CELEBRATION_STYLES[self.cursor]
    }

    pub fn advance(&mut self) {
        self.cursor = (self.cursor + 1) % CELEBRATION_STYLES.len();
    }
}

/// A member being celebrated in this scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CelebratedUser {
    pub user_id: UserId,
    pub display_name: String,
    pub age: Option<i32>,
}

/// A rendered celebration, ready to be sent to an announcement channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Celebration {
    pub style_index: usize,
    pub style: &'static CelebrationStyle,
    /// Plain-text mentions so celebrated members get pinged
    pub content: String,
    pub description: String,
    pub footer: String,
}

/// Format age information string
pub fn format_age_info(age: Option<i32>) -> String {
    age.map(|age| format!(" (turning {})", age))
        .unwrap_or_default()
}

/// Build a single birthday entry line
pub fn build_birthday_entry(user: &CelebratedUser) -> String {
    format!("• <@{}>{}!", user.user_id, format_age_info(user.age))
}

/// Join multiple birthday entries with newlines
pub fn join_birthday_entries(entries: &[String]) -> String {
    entries.join("\n")
}

/// Build the celebration for `users` using the rotation's current style
pub fn build_celebration(
    rotation: &StyleRotation,
    users: &[CelebratedUser],
    today: NaiveDate,
) -> Celebration {
    let style = rotation.current();
    let entries: Vec<String> = users.iter().map(build_birthday_entry).collect();

    let content = users
        .iter()
        .map(|user| format!("<@{}>", user.user_id))
        .collect::<Vec<_>>()
        .join(" ");

    Celebration {
        style_index: rotation.cursor(),
        style,
        content,
        description: format!("{}\n\n{}", style.caption, join_birthday_entries(&entries)),
        footer: format!("🎂 {}", format_date_display(today.month(), today.day())),
    }
}

/// Direct message sent to a member on their birthday
pub fn build_birthday_dm(guild_name: &str) -> String {
    format!("🎉 Happy birthday from everyone at **{}**! 🎂", guild_name)
}
