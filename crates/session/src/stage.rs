//! Host engine collaborator for creating and moving actors
//!
//! [`Stage`] is what a session needs from the engine. [`MemoryStage`] keeps
//! everything in memory and also serves as the attachment host for the
//! auto-sync action, which makes it usable for simulations and tests.

use anyhow::Result;
use parking_lot::Mutex;
use scheduler::{Attachment, AttachmentHost};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use sync_core::AttachPoint;
use uuid::Uuid;

/// Three-component vector used for positions, euler rotations and scales
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Same value on every axis
    pub const fn splat(v: f64) -> Self {
        Self::new(v, v, v)
    }
}

/// Identifier of a connected user
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct UserId(Uuid);

impl UserId {
    /// Create a random user id
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of an actor created by the engine
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct ActorId(Uuid);

impl ActorId {
    /// Create a random actor id
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ActorId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a hat is placed relative to its attach point
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    /// Library resource to instantiate, if any
    pub resource_id: Option<String>,
    /// Local position
    pub position: Vec3,
    /// Local rotation as euler angles in degrees
    pub rotation: Vec3,
    /// Local scale
    pub scale: Vec3,
    /// Avatar attach point
    pub attach_point: AttachPoint,
}

/// Engine operations a session relies on
pub trait Stage: Send + Sync {
    /// Create an actor attached to `user`
    fn spawn_attached(&self, placement: &Placement, user: UserId) -> Result<ActorId>;

    /// Destroy an actor
    fn destroy(&self, actor: ActorId) -> Result<()>;

    /// Update an actor's local position and scale
    fn set_local_transform(&self, actor: ActorId, position: Vec3, scale: Vec3) -> Result<()>;
}

/// Actor tracked by [`MemoryStage`]
#[derive(Debug, Clone, PartialEq)]
pub struct StagedActor {
    pub placement: Placement,
    pub position: Vec3,
    pub scale: Vec3,
    pub attached_to: Option<(UserId, AttachPoint)>,
}

/// In-memory stage
#[derive(Default)]
pub struct MemoryStage {
    actors: Mutex<BTreeMap<ActorId, StagedActor>>,
    detaches: AtomicU64,
    attaches: AtomicU64,
}

impl MemoryStage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a live actor
    pub fn actor(&self, id: ActorId) -> Option<StagedActor> {
        self.actors.lock().get(&id).cloned()
    }

    /// Number of live actors
    pub fn actor_count(&self) -> usize {
        self.actors.lock().len()
    }

    /// Total detach and attach calls made through the attachment host
    pub fn resync_counts(&self) -> (u64, u64) {
        (
            self.detaches.load(Ordering::SeqCst),
            self.attaches.load(Ordering::SeqCst),
        )
    }
}

impl Stage for MemoryStage {
    fn spawn_attached(&self, placement: &Placement, user: UserId) -> Result<ActorId> {
        let id = ActorId::new();
        let actor = StagedActor {
            placement: placement.clone(),
            position: placement.position,
            scale: placement.scale,
            attached_to: Some((user, placement.attach_point.clone())),
        };
        self.actors.lock().insert(id, actor);
        Ok(id)
    }

    fn destroy(&self, actor: ActorId) -> Result<()> {
        match self.actors.lock().remove(&actor) {
            Some(_) => Ok(()),
            None => anyhow::bail!("no such actor: {}", actor),
        }
    }

    fn set_local_transform(&self, actor: ActorId, position: Vec3, scale: Vec3) -> Result<()> {
        let mut actors = self.actors.lock();
        let staged = actors
            .get_mut(&actor)
            .ok_or_else(|| anyhow::anyhow!("no such actor: {}", actor))?;
        staged.position = position;
        staged.scale = scale;
        Ok(())
    }
}

impl AttachmentHost for MemoryStage {
    type ObjectId = ActorId;
    type UserId = UserId;

    fn attached_objects(&self) -> Vec<Attachment<ActorId, UserId>> {
        self.actors
            .lock()
            .iter()
            .filter_map(|(id, actor)| {
                actor.attached_to.as_ref().map(|(user, point)| Attachment {
                    object: *id,
                    target: *user,
                    attach_point: point.clone(),
                })
            })
            .collect()
    }

    fn detach(&self, object: &ActorId) -> Result<()> {
        let mut actors = self.actors.lock();
        let staged = actors
            .get_mut(object)
            .ok_or_else(|| anyhow::anyhow!("no such actor: {}", object))?;
        staged.attached_to = None;
        self.detaches.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn attach(&self, object: &ActorId, target: &UserId, attach_point: &AttachPoint) -> Result<()> {
        let mut actors = self.actors.lock();
        let staged = actors
            .get_mut(object)
            .ok_or_else(|| anyhow::anyhow!("no such actor: {}", object))?;
        staged.attached_to = Some((*target, attach_point.clone()));
        self.attaches.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
