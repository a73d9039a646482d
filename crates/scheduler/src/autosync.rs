//! Attachment auto-synchronization
//!
//! Objects attached to an avatar can drift out of sync between a late
//! joiner's view and the host's view. The fix is blunt: detach and reattach
//! every attached object after users join. [`AutoSync`] keeps exactly one
//! such action registered with a [`JoinScheduler`] while enabled.

use crate::debounce::JoinScheduler;
use anyhow::Result;
use std::fmt::Debug;
use std::sync::Arc;
use sync_core::{Action, AttachPoint, Handle};
use tracing::{debug, warn};

/// An object currently attached to a user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment<O, U> {
    /// The attached object
    pub object: O,
    /// The user the object is attached to
    pub target: U,
    /// Where on the user's avatar it is attached
    pub attach_point: AttachPoint,
}

/// Engine-side view of attached objects
///
/// Implemented by the host integration. The scheduler never inspects what
/// an object or user is beyond passing the ids back.
pub trait AttachmentHost: Send + Sync {
    /// Identifier of an attachable object
    type ObjectId: Clone + Debug + Send + Sync;
    /// Identifier of a user that objects attach to
    type UserId: Clone + Debug + Send + Sync;

    /// All objects that currently have an attachment
    fn attached_objects(&self) -> Vec<Attachment<Self::ObjectId, Self::UserId>>;

    /// Detach an object from whatever it is attached to
    fn detach(&self, object: &Self::ObjectId) -> Result<()>;

    /// Attach an object to a user at the given point
    fn attach(
        &self,
        object: &Self::ObjectId,
        target: &Self::UserId,
        attach_point: &AttachPoint,
    ) -> Result<()>;
}

/// Action that detaches and reattaches every attached object
pub struct AttachmentResync<H> {
    host: Arc<H>,
}

impl<H: AttachmentHost> AttachmentResync<H> {
    /// Create a resync action over the given host
    pub fn new(host: Arc<H>) -> Self {
        Self { host }
    }
}

impl<H: AttachmentHost> Action for AttachmentResync<H> {
    fn run(&self) -> Result<()> {
        let attachments = self.host.attached_objects();
        let total = attachments.len();
        let mut failed = 0;

        for attachment in attachments {
            let result = self.host.detach(&attachment.object).and_then(|_| {
                self.host
                    .attach(&attachment.object, &attachment.target, &attachment.attach_point)
            });

            if let Err(e) = result {
                failed += 1;
                warn!("Failed to resync {:?}: {:#}", attachment.object, e);
            }
        }

        debug!("Resynced {} attachments ({} failed)", total - failed, failed);

        if failed > 0 {
            anyhow::bail!("{} of {} attachments failed to resync", failed, total);
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "attachment-resync"
    }
}

/// Toggle for the attachment resync action
///
/// `enable` and `disable` are idempotent: enabling twice still leaves a
/// single registered action.
pub struct AutoSync<H> {
    scheduler: JoinScheduler,
    host: Arc<H>,
    handle: Option<Handle>,
}

impl<H: AttachmentHost + 'static> AutoSync<H> {
    /// Create a disabled toggle
    pub fn new(scheduler: JoinScheduler, host: Arc<H>) -> Self {
        Self {
            scheduler,
            host,
            handle: None,
        }
    }

    /// Register the resync action if it is not registered
    ///
    /// Returns whether the state changed.
    pub fn enable(&mut self) -> bool {
        if self.handle.is_some() {
            return false;
        }
        let action = AttachmentResync::new(Arc::clone(&self.host));
        self.handle = Some(self.scheduler.register(action));
        true
    }

    /// Deregister the resync action if it is registered
    ///
    /// Returns whether the state changed.
    pub fn disable(&mut self) -> bool {
        match self.handle.take() {
            Some(handle) => {
                self.scheduler.deregister(handle);
                true
            }
            None => false,
        }
    }

    /// Enable or disable in one call
    pub fn set_enabled(&mut self, enabled: bool) -> bool {
        if enabled {
            self.enable()
        } else {
            self.disable()
        }
    }

    /// Whether the resync action is registered
    pub fn is_enabled(&self) -> bool {
        self.handle.is_some()
    }

    /// Handle of the registered resync action
    pub fn handle(&self) -> Option<Handle> {
        self.handle
    }

    /// Scheduler this toggle registers with
    pub fn scheduler(&self) -> &JoinScheduler {
        &self.scheduler
    }
}

impl<H> Drop for AutoSync<H> {
    fn drop(&mut self) {
        // An ended session must not leave its resync in a shared scheduler
        if let Some(handle) = self.handle.take() {
            self.scheduler.deregister(handle);
        }
    }
}
