use std::collections::{HashMap, VecDeque};

use crate::{
    entity::{entity_id::EntityId, online_entity::OnlineEntity},
    feed::{feed_receiver::FeedReceiver, feed_sender::FeedSender},
    resource::{adapter::ExternalKey, resource_id::ResourceId, resource_state::ResourceState},
    types::PeerId,
};

/// How many departed entities a resource remembers
const DEPARTED_MEMORY: usize = 64;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ResourceStatus {
    Unloaded,
    Activating,
    Active,
    Deactivating,
}

impl ResourceStatus {
    pub fn name(&self) -> &'static str {
        match self {
            ResourceStatus::Unloaded => "unloaded",
            ResourceStatus::Activating => "activating",
            ResourceStatus::Active => "active",
            ResourceStatus::Deactivating => "deactivating",
        }
    }
}

/// A node of the resource tree. Owns the entities that live in it and the
/// feeds replicating them.
pub struct Resource {
    id: ResourceId,
    parent: Option<ResourceId>,
    children: Vec<ResourceId>,
    status: ResourceStatus,
    owner: Option<PeerId>,
    deactivate_on_release: bool,
    binding: Option<ExternalKey>,
    latest_state: Option<ResourceState>,
    entities: HashMap<EntityId, OnlineEntity>,
    // keyed by (subscriber, entity)
    senders: HashMap<(PeerId, EntityId), FeedSender>,
    receivers: HashMap<EntityId, FeedReceiver>,
    // newest last, bounded by DEPARTED_MEMORY
    departed: VecDeque<EntityId>,
}

impl Resource {
    pub(crate) fn new(id: ResourceId, owner: Option<PeerId>, deactivate_on_release: bool) -> Self {
        let parent = id.parent();
        Self {
            id,
            parent,
            children: Vec::new(),
            status: ResourceStatus::Unloaded,
            owner,
            deactivate_on_release,
            binding: None,
            latest_state: None,
            entities: HashMap::new(),
            senders: HashMap::new(),
            receivers: HashMap::new(),
            departed: VecDeque::new(),
        }
    }

    pub fn id(&self) -> &ResourceId {
        &self.id
    }

    pub fn parent(&self) -> Option<&ResourceId> {
        self.parent.as_ref()
    }

    pub fn children(&self) -> &[ResourceId] {
        &self.children
    }

    pub fn status(&self) -> ResourceStatus {
        self.status
    }

    pub fn is_active(&self) -> bool {
        self.status == ResourceStatus::Active
    }

    pub fn owner(&self) -> Option<PeerId> {
        self.owner
    }

    pub fn deactivate_on_release(&self) -> bool {
        self.deactivate_on_release
    }

    pub fn binding(&self) -> Option<ExternalKey> {
        self.binding
    }

    pub fn latest_state(&self) -> Option<&ResourceState> {
        self.latest_state.as_ref()
    }

    pub fn entity(&self, entity: &EntityId) -> Option<&OnlineEntity> {
        self.entities.get(entity)
    }

    pub fn entities(&self) -> impl Iterator<Item = &OnlineEntity> {
        self.entities.values()
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn feed_sender(&self, subscriber: &PeerId, entity: &EntityId) -> Option<&FeedSender> {
        self.senders.get(&(*subscriber, *entity))
    }

    pub fn feed_senders(&self) -> impl Iterator<Item = &FeedSender> {
        self.senders.values()
    }

    pub fn feed_receiver(&self, entity: &EntityId) -> Option<&FeedReceiver> {
        self.receivers.get(entity)
    }

    // Crate-internal mutation, driven by ResourceTree and ReplicationManager

    pub(crate) fn set_status(&mut self, status: ResourceStatus) {
        self.status = status;
    }

    pub(crate) fn set_owner(&mut self, owner: Option<PeerId>) {
        self.owner = owner;
    }

    pub(crate) fn set_binding(&mut self, binding: Option<ExternalKey>) {
        self.binding = binding;
    }

    pub(crate) fn set_latest_state(&mut self, state: ResourceState) {
        self.latest_state = Some(state);
    }

    pub(crate) fn add_child_id(&mut self, child: ResourceId) {
        if !self.children.contains(&child) {
            self.children.push(child);
        }
    }

    pub(crate) fn take_children(&mut self) -> Vec<ResourceId> {
        std::mem::take(&mut self.children)
    }

    pub(crate) fn entity_mut(&mut self, entity: &EntityId) -> Option<&mut OnlineEntity> {
        self.entities.get_mut(entity)
    }

    pub(crate) fn insert_entity(&mut self, entity: OnlineEntity) -> Option<OnlineEntity> {
        let id = entity.id();
        self.departed.retain(|departed| *departed != id);
        self.entities.insert(id, entity)
    }

    /// Removes an entity together with every feed replicating it
    pub(crate) fn remove_entity(&mut self, entity: &EntityId) -> Option<OnlineEntity> {
        self.senders.retain(|(_, sent), _| sent != entity);
        self.receivers.remove(entity);
        let removed = self.entities.remove(entity);
        if removed.is_some() {
            self.remember_departed(*entity);
        }
        removed
    }

    /// Whether `entity` left this resource recently. Late feed messages for
    /// it are expected and carry nothing worth recovering.
    pub fn has_departed(&self, entity: &EntityId) -> bool {
        self.departed.contains(entity)
    }

    fn remember_departed(&mut self, entity: EntityId) {
        self.departed.retain(|departed| *departed != entity);
        self.departed.push_back(entity);
        while self.departed.len() > DEPARTED_MEMORY {
            self.departed.pop_front();
        }
    }

    pub(crate) fn sender_mut_or_insert(
        &mut self,
        subscriber: PeerId,
        entity: EntityId,
    ) -> &mut FeedSender {
        let resource = &self.id;
        self.senders
            .entry((subscriber, entity))
            .or_insert_with(|| FeedSender::new(subscriber, resource.clone(), entity))
    }

    pub(crate) fn sender_mut(
        &mut self,
        subscriber: &PeerId,
        entity: &EntityId,
    ) -> Option<&mut FeedSender> {
        self.senders.get_mut(&(*subscriber, *entity))
    }

    /// Resets every feed this resource sends to `subscriber`, returning how
    /// many feeds matched
    pub(crate) fn reset_senders_of(&mut self, subscriber: &PeerId) -> usize {
        let mut matched = 0;
        for ((peer, _), sender) in self.senders.iter_mut() {
            if peer == subscriber {
                sender.reset_deltas();
                matched += 1;
            }
        }
        matched
    }

    pub(crate) fn remove_senders_of(&mut self, subscriber: &PeerId) -> usize {
        let before = self.senders.len();
        self.senders.retain(|(peer, _), _| peer != subscriber);
        before - self.senders.len()
    }

    pub(crate) fn remove_senders_for(&mut self, entity: &EntityId) {
        self.senders.retain(|(_, sent), _| sent != entity);
    }

    pub(crate) fn receiver_mut(&mut self, entity: &EntityId) -> Option<&mut FeedReceiver> {
        self.receivers.get_mut(entity)
    }

    /// The receiver for `entity`, replaced by a fresh one if it tracks
    /// another authority
    pub(crate) fn receiver_from(&mut self, authority: PeerId, entity: EntityId) -> &mut FeedReceiver {
        let receiver = self
            .receivers
            .entry(entity)
            .or_insert_with(|| FeedReceiver::new(authority, entity));
        if receiver.authority() != authority {
            *receiver = FeedReceiver::new(authority, entity);
        }
        receiver
    }

    pub(crate) fn insert_receiver(&mut self, entity: EntityId, receiver: FeedReceiver) {
        self.receivers.insert(entity, receiver);
    }

    pub(crate) fn remove_receiver(&mut self, entity: &EntityId) -> Option<FeedReceiver> {
        self.receivers.remove(entity)
    }

    /// Forgets every mirrored feed, so the next state from any authority
    /// has to be a full one. Returns how many receivers were dropped.
    pub(crate) fn clear_receivers(&mut self) -> usize {
        let count = self.receivers.len();
        self.receivers.clear();
        count
    }

    pub(crate) fn remove_receivers_from(&mut self, authority: &PeerId) {
        self.receivers
            .retain(|_, receiver| receiver.authority() != *authority);
    }

    /// Drops entities, feeds and cached state, keeping the node itself
    pub(crate) fn clear_contents(&mut self) -> Vec<OnlineEntity> {
        self.senders.clear();
        self.receivers.clear();
        self.departed.clear();
        self.latest_state = None;
        self.entities.drain().map(|(_, entity)| entity).collect()
    }
}
