//! Per-session hat state
//!
//! Tracks which hat each user is wearing. Every connection owns its own
//! [`HatSession`]; nothing here is process-wide.

use crate::catalog::HatCatalog;
use crate::command::HatCommand;
use crate::stage::{ActorId, Stage, UserId, Vec3};
use crate::{Result, SessionError};
use scheduler::{AttachmentHost, AutoSync, JoinScheduler};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A hat currently on a user
#[derive(Debug, Clone, PartialEq)]
pub struct WornHat {
    /// Catalog id of the hat
    pub hat_id: String,
    /// Engine actor for the hat
    pub actor: ActorId,
    /// Current local position
    pub position: Vec3,
    /// Current local scale
    pub scale: Vec3,
}

/// What a menu selection did
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    /// A new hat was put on, replacing any previous one
    Wore(ActorId),
    /// The worn hat was moved or resized
    Adjusted,
    /// The worn hat was removed
    Cleared,
    /// A command was chosen but the user wears nothing
    NothingWorn,
}

/// Hat try-on state for one session
pub struct HatSession<S> {
    catalog: HatCatalog,
    stage: Arc<S>,
    auto_sync: AutoSync<S>,
    worn: HashMap<UserId, WornHat>,
}

impl<S> HatSession<S>
where
    S: Stage + AttachmentHost<ObjectId = ActorId, UserId = UserId> + 'static,
{
    /// Start a session, optionally enabling attachment auto-sync
    pub fn new(catalog: HatCatalog, stage: Arc<S>, scheduler: JoinScheduler, auto_sync: bool) -> Self {
        let mut toggle = AutoSync::new(scheduler, Arc::clone(&stage));
        toggle.set_enabled(auto_sync);

        Self {
            catalog,
            stage,
            auto_sync: toggle,
            worn: HashMap::new(),
        }
    }

    /// A user connected; attachments will be resynced after the debounce
    pub fn user_joined(&self, user: UserId) {
        debug!("User {} joined", user);
        self.auto_sync.scheduler().signal_join();
    }

    /// A user left; their hat would otherwise be orphaned
    pub fn user_left(&mut self, user: UserId) -> Result<()> {
        if let Some(hat) = self.worn.remove(&user) {
            debug!("User {} left wearing {}", user, hat.hat_id);
            self.stage.destroy(hat.actor)?;
        }
        Ok(())
    }

    /// Handle a click on a menu entry
    pub fn select(&mut self, user: UserId, entry_id: &str) -> Result<Selection> {
        match HatCommand::parse(entry_id) {
            Some(HatCommand::Clear) => self.clear(user),
            Some(command) => self.adjust(user, command),
            None => self.wear(user, entry_id),
        }
    }

    fn clear(&mut self, user: UserId) -> Result<Selection> {
        match self.worn.remove(&user) {
            Some(hat) => {
                self.stage.destroy(hat.actor)?;
                Ok(Selection::Cleared)
            }
            None => Ok(Selection::NothingWorn),
        }
    }

    fn adjust(&mut self, user: UserId, command: HatCommand) -> Result<Selection> {
        let hat = match self.worn.get_mut(&user) {
            Some(hat) => hat,
            None => return Ok(Selection::NothingWorn),
        };

        command.adjust(&mut hat.position, &mut hat.scale);
        self.stage
            .set_local_transform(hat.actor, hat.position, hat.scale)?;
        Ok(Selection::Adjusted)
    }

    fn wear(&mut self, user: UserId, hat_id: &str) -> Result<Selection> {
        let descriptor = self
            .catalog
            .get(hat_id)
            .ok_or_else(|| SessionError::UnknownEntry(hat_id.to_string()))?;
        let placement = descriptor.worn_placement();

        // Take the old hat off first
        if let Some(old) = self.worn.remove(&user) {
            if let Err(e) = self.stage.destroy(old.actor) {
                warn!("Failed to remove {} from {}: {:#}", old.hat_id, user, e);
            }
        }

        let actor = self.stage.spawn_attached(&placement, user)?;
        info!("User {} now wears {}", user, hat_id);

        self.worn.insert(
            user,
            WornHat {
                hat_id: hat_id.to_string(),
                actor,
                position: placement.position,
                scale: placement.scale,
            },
        );
        Ok(Selection::Wore(actor))
    }

    /// Hat a user is wearing
    pub fn worn(&self, user: UserId) -> Option<&WornHat> {
        self.worn.get(&user)
    }

    /// Number of users wearing a hat
    pub fn wearers(&self) -> usize {
        self.worn.len()
    }

    /// Turn attachment auto-sync on or off
    pub fn set_auto_sync(&mut self, enabled: bool) -> bool {
        self.auto_sync.set_enabled(enabled)
    }

    pub fn auto_sync_enabled(&self) -> bool {
        self.auto_sync.is_enabled()
    }

    pub fn catalog(&self) -> &HatCatalog {
        &self.catalog
    }
}
