use chrono::{DateTime, Datelike, NaiveDate, TimeDelta, Utc};
use poise::serenity_prelude::{ChannelId, GuildId, UserId};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use super::ScanSummary;
use crate::constants::BIRTHDAY_ROLE_HOURS;
use crate::directory::GuildDirectory;
use crate::store::{DueCelebration, DueRoleRemoval, PendingRoleRemoval, SharedStore};
use crate::utils::message_formatter::{
    CelebratedUser, StyleRotation, build_birthday_dm, build_celebration,
};
use crate::utils::timezone::local_date;

/// Finds today's birthdays, announces them and manages the birthday role.
///
/// Every pass holds the rotation lock from start to finish, so passes never
/// overlap and the style cursor moves strictly in message order.
pub struct CelebrationEngine {
    store: SharedStore,
    directory: Arc<dyn GuildDirectory>,
    rotation: Mutex<StyleRotation>,
}

impl CelebrationEngine {
    pub fn new(store: SharedStore, directory: Arc<dyn GuildDirectory>) -> Self {
        Self {
            store,
            directory,
            rotation: Mutex::new(StyleRotation::default()),
        }
    }

    /// Index of the style the next celebration will use
    #[cfg(test)]
    pub async fn rotation_cursor(&self) -> usize {
        self.rotation.lock().await.cursor()
    }

    /// Expire due birthday roles, then celebrate today's birthdays
    pub async fn run_pass(self: &Arc<Self>) -> ScanSummary {
        self.run_pass_at(Utc::now()).await
    }

    pub async fn run_pass_at(self: &Arc<Self>, now: DateTime<Utc>) -> ScanSummary {
        let mut rotation = self.rotation.lock().await;
        let roles_expired = self.expire_due_roles(now).await;
        let summary = self.scan_locked(&mut rotation, now).await;

        ScanSummary {
            roles_expired,
            ..summary
        }
    }

    /// Celebrate the birthdays of the day containing `now`
    #[cfg(test)]
    pub async fn scan_at(self: &Arc<Self>, now: DateTime<Utc>) -> ScanSummary {
        let mut rotation = self.rotation.lock().await;
        self.scan_locked(&mut rotation, now).await
    }

    /// Take back every birthday role whose time is up at `now`
    #[cfg(test)]
    pub async fn process_due_role_removals(&self, now: DateTime<Utc>) -> usize {
        let _rotation = self.rotation.lock().await;
        self.expire_due_roles(now).await
    }

    async fn scan_locked(
        self: &Arc<Self>,
        rotation: &mut StyleRotation,
        now: DateTime<Utc>,
    ) -> ScanSummary {
        let (today, due) = {
            let store = self.store.lock().await;
            let today = local_date(now, &store.timezone());
            (today, store.due_celebrations(today))
        };

        if due.is_empty() {
            debug!("No birthdays to celebrate on {}", today);
            return ScanSummary::default();
        }

        info!("Found {} guild(s) with birthdays on {}", due.len(), today);

        let mut summary = ScanSummary::default();
        for celebration in due {
            let guild = self.celebrate_guild(rotation, celebration, today, now).await;
            summary.guilds_announced += guild.guilds_announced;
            summary.users_celebrated += guild.users_celebrated;
        }
        summary
    }

    /// Celebrate every due member of one guild
    async fn celebrate_guild(
        self: &Arc<Self>,
        rotation: &mut StyleRotation,
        due: DueCelebration,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> ScanSummary {
        let guild_id = due.guild_id;

        let guild = match self.directory.resolve_guild(guild_id).await {
            Ok(guild) => guild,
            Err(e) => {
                warn!("Skipping birthdays in guild {}: {}", guild_id, e);
                return ScanSummary::default();
            }
        };

        if let Err(e) = self.directory.resolve_channel(guild_id, due.channel_id).await {
            warn!(
                "Skipping birthdays in guild {}, announcement channel {} unavailable: {}",
                guild_id, due.channel_id, e
            );
            return ScanSummary::default();
        }

        let role_id = match due.role_id {
            Some(role_id) => match self.directory.resolve_role(guild_id, role_id).await {
                Ok(()) => Some(role_id),
                Err(e) => {
                    warn!("Birthday role {} unavailable in guild {}: {}", role_id, guild_id, e);
                    None
                }
            },
            None => None,
        };

        let mut celebrated = Vec::new();
        let mut role_removals = Vec::new();

        for (user_id, record) in due.users {
            let member = match self.directory.resolve_member(guild_id, user_id).await {
                Ok(member) => member,
                Err(e) => {
                    debug!("Skipping birthday of {} in guild {}: {}", user_id, guild_id, e);
                    continue;
                }
            };

            celebrated.push(CelebratedUser {
                user_id,
                display_name: member.display_name,
                age: record.age_in(today.year()),
            });

            if let Some(role_id) = role_id {
                match self.directory.grant_role(guild_id, user_id, role_id).await {
                    Ok(()) => info!("Added birthday role to user {} in guild {}", user_id, guild_id),
                    Err(e) => error!(
                        "Failed to add birthday role to user {} in guild {}: {}",
                        user_id, guild_id, e
                    ),
                }

                role_removals.push((
                    user_id,
                    PendingRoleRemoval {
                        role: role_id,
                        expires_at: now + TimeDelta::hours(BIRTHDAY_ROLE_HOURS),
                    },
                ));
            }
        }

        if celebrated.is_empty() {
            info!("No birthday members could be found in guild {}", guild_id);
            return ScanSummary::default();
        }

        let user_ids: Vec<UserId> = celebrated.iter().map(|user| user.user_id).collect();
        {
            let mut store = self.store.lock().await;
            store.commit_celebrations(guild_id, &user_ids, today, role_removals.clone());
        }

        for (user_id, removal) in role_removals {
            self.schedule_role_removal(guild_id, user_id, now, removal.expires_at);
        }

        let announced = self
            .send_celebration(rotation, guild_id, due.channel_id, &celebrated, today)
            .await;

        let dm = build_birthday_dm(&guild.name);
        for user in &celebrated {
            if let Err(e) = self.directory.direct_message(user.user_id, &dm).await {
                debug!("Could not send birthday DM to {}: {}", user.user_id, e);
            }
        }

        ScanSummary {
            guilds_announced: usize::from(announced),
            users_celebrated: celebrated.len(),
            roles_expired: 0,
        }
    }

    /// Send one message for all `users`, then move the rotation on.
    /// Returns whether the message went out.
    async fn send_celebration(
        &self,
        rotation: &mut StyleRotation,
        guild_id: GuildId,
        channel_id: ChannelId,
        users: &[CelebratedUser],
        today: NaiveDate,
    ) -> bool {
        let celebration = build_celebration(rotation, users, today);
        let result = self.directory.send_celebration(channel_id, &celebration).await;
        rotation.advance();

        match result {
            Ok(()) => {
                let names: Vec<&str> = users.iter().map(|user| user.display_name.as_str()).collect();
                info!(
                    "Sent birthday notification for {} user(s) in guild {} ({}) with style {}",
                    users.len(),
                    guild_id,
                    names.join(", "),
                    celebration.style_index
                );
                true
            }
            Err(e) => {
                error!(
                    "Failed to send birthday message to channel {} in guild {}: {}",
                    channel_id, guild_id, e
                );
                false
            }
        }
    }

    /// Revoke the role at `expires_at` without waiting for the next pass
    fn schedule_role_removal(
        self: &Arc<Self>,
        guild_id: GuildId,
        user_id: UserId,
        now: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) {
        let engine = Arc::clone(self);
        let wait = (expires_at - now).to_std().unwrap_or_default();
        tokio::spawn(async move {
            tokio::time::sleep(wait).await;
            engine.expire_role_removal(guild_id, user_id, expires_at).await;
        });
    }

    /// Handle one member's removal if it is still pending and due
    async fn expire_role_removal(&self, guild_id: GuildId, user_id: UserId, now: DateTime<Utc>) {
        let _rotation = self.rotation.lock().await;

        let due = {
            let store = self.store.lock().await;
            store
                .pending_role_removal(guild_id, user_id)
                .filter(|pending| pending.expires_at <= now)
                .map(|pending| DueRoleRemoval {
                    guild_id,
                    user_id,
                    role_id: pending.role,
                })
        };

        // Already handled by a pass, or re-granted with a later expiry
        if let Some(removal) = due {
            self.revoke_birthday_role(&removal).await;
        }
    }

    async fn expire_due_roles(&self, now: DateTime<Utc>) -> usize {
        let due = self.store.lock().await.due_role_removals(now);

        for removal in &due {
            self.revoke_birthday_role(removal).await;
        }
        due.len()
    }

    async fn revoke_birthday_role(&self, removal: &DueRoleRemoval) {
        let DueRoleRemoval {
            guild_id,
            user_id,
            role_id,
        } = *removal;

        match self.directory.resolve_member(guild_id, user_id).await {
            Ok(_) => match self.directory.revoke_role(guild_id, user_id, role_id).await {
                Ok(()) => info!("Removed birthday role from user {} in guild {}", user_id, guild_id),
                Err(e) => error!(
                    "Failed to remove birthday role from user {} in guild {}: {}",
                    user_id, guild_id, e
                ),
            },
            Err(e) => debug!(
                "Not removing birthday role from {} in guild {}: {}",
                user_id, guild_id, e
            ),
        }

        self.store
            .lock()
            .await
            .complete_role_removal(guild_id, user_id);
    }
}
