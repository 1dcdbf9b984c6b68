use poise::serenity_prelude::GuildId;
use thiserror::Error;

use crate::constants::MIN_BIRTH_YEAR;
use crate::utils::datetime::days_in_month;

/// Validation error types
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("This command must be used in a server")]
    NotInGuild,

    #[error("Month must be between 1 and 12 (got {0})")]
    InvalidMonth(u32),

    #[error("Day {day} does not exist in month {month} of {year}")]
    InvalidDay { month: u32, day: u32, year: i32 },

    #[error("Birth year must be between 1900 and {current_year} (got {year})")]
    InvalidYear { year: i32, current_year: i32 },
}

/// Validate a birthday before it is stored.
///
/// The day is checked against the birth year when one is given, otherwise
/// against `current_year`, so Feb 29 is only accepted when that year is a leap year.
pub fn validate_birthday(
    month: u32,
    day: u32,
    year: Option<i32>,
    current_year: i32,
) -> Result<(), ValidationError> {
    if !(1..=12).contains(&month) {
        return Err(ValidationError::InvalidMonth(month));
    }

    if let Some(year) = year {
        if !(MIN_BIRTH_YEAR..=current_year).contains(&year) {
            return Err(ValidationError::InvalidYear { year, current_year });
        }
    }

    let reference_year = year.unwrap_or(current_year);
    if !(1..=days_in_month(month, reference_year)).contains(&day) {
        return Err(ValidationError::InvalidDay {
            month,
            day,
            year: reference_year,
        });
    }

    Ok(())
}

/// Extract guild ID from context, returning error if not in a guild
pub fn require_guild(guild_id: Option<GuildId>) -> Result<GuildId, ValidationError> {
    guild_id.ok_or(ValidationError::NotInGuild)
}
