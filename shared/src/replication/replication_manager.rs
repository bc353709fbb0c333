use log::{debug, info, trace, warn};

use crate::{
    entity::{
        entity_id::EntityId, online_entity::OnlineEntity, serializer::EntityStateSerializer,
    },
    error::SyncError,
    feed::{error::FeedError, feed_receiver::FeedReceiver, feed_sender::FeedPayload},
    messages::{
        entity_messages::{
            AuthorityTransferMessage, DeltaMessage, EntityLeftMessage, FullStateMessage,
            ResetRequest,
        },
        session_message::SessionMessage,
    },
    replication::entity_event::{EntityEvent, ResetOutcome},
    resource::{
        adapter::{ExternalKey, ResourceAdapter},
        error::ResourceError,
        resource::Resource,
        resource_id::ResourceId,
        resource_state::ResourceState,
        resource_tree::{Deactivation, ResourceTree},
    },
    subscription::subscription_registry::SubscriptionRegistry,
    types::{EntityTypeId, PeerId, StateTick},
};

impl From<FeedPayload> for SessionMessage {
    fn from(payload: FeedPayload) -> Self {
        match payload {
            FeedPayload::Full(message) => SessionMessage::FullState(message),
            FeedPayload::Delta(message) => SessionMessage::Delta(message),
        }
    }
}

/// Session-scoped owner of the resource tree and the subscription registry.
///
/// Every operation that has to keep resources, subscriptions, entities and
/// feeds consistent with each other goes through here. Messages for other
/// peers are queued and drained with [`ReplicationManager::take_outgoing`].
pub struct ReplicationManager {
    local: PeerId,
    tree: ResourceTree,
    subscriptions: SubscriptionRegistry,
    outgoing: Vec<(PeerId, SessionMessage)>,
}

impl ReplicationManager {
    pub fn new(local: PeerId) -> Self {
        Self {
            local,
            tree: ResourceTree::new(),
            subscriptions: SubscriptionRegistry::new(),
            outgoing: Vec::new(),
        }
    }

    pub fn local(&self) -> PeerId {
        self.local
    }

    pub fn tree(&self) -> &ResourceTree {
        &self.tree
    }

    pub fn subscriptions(&self) -> &SubscriptionRegistry {
        &self.subscriptions
    }

    pub fn resource(&self, id: &ResourceId) -> Option<&Resource> {
        self.tree.resolve(id)
    }

    pub fn take_outgoing(&mut self) -> Vec<(PeerId, SessionMessage)> {
        std::mem::take(&mut self.outgoing)
    }

    // Resources

    pub fn add_root(&mut self, id: ResourceId, owner: Option<PeerId>) -> Result<(), SyncError> {
        self.tree.add_root(id, owner)?;
        Ok(())
    }

    pub fn activate<A: ResourceAdapter + ?Sized>(
        &mut self,
        id: &ResourceId,
        adapter: &A,
    ) -> Result<Vec<ResourceId>, SyncError> {
        Ok(self.tree.activate(id, adapter)?)
    }

    pub fn deactivate(&mut self, id: &ResourceId) -> Result<Deactivation, SyncError> {
        Ok(self.tree.deactivate(id)?)
    }

    pub fn find_bound(&self, key: ExternalKey) -> Option<&ResourceId> {
        self.tree.find_bound(key)
    }

    pub fn find_or_create_bound(
        &mut self,
        parent: &ResourceId,
        name: &str,
        key: ExternalKey,
    ) -> Result<ResourceId, SyncError> {
        Ok(self.tree.find_or_create_bound(parent, name, key)?)
    }

    /// Makes `owner` the owner of every resource that lost its owner
    pub fn assign_orphaned(&mut self, owner: PeerId) -> Vec<ResourceId> {
        let mut assigned = Vec::new();
        for resource in self.tree.resources_mut() {
            if resource.owner().is_none() {
                resource.set_owner(Some(owner));
                assigned.push(resource.id().clone());
            }
        }
        assigned.sort();
        assigned
    }

    // Subscriptions

    /// Registers `peer`'s interest in `resource`. A new subscription starts
    /// without feeds on either side, so the first capture for it sends full
    /// states and the mirror accepts them whatever it applied before.
    pub fn subscribe(&mut self, peer: PeerId, resource: &ResourceId, tick: StateTick) -> bool {
        if !self.subscriptions.subscribe(peer, resource, tick) {
            return false;
        }
        if let Some(node) = self.tree.resolve_mut(resource) {
            node.remove_senders_of(&peer);
            if peer == self.local {
                node.clear_receivers();
            }
        }
        true
    }

    /// Drops the subscription and every feed sent under it. Returns the
    /// resources released as a consequence.
    pub fn unsubscribe(&mut self, peer: &PeerId, resource: &ResourceId) -> Vec<ResourceId> {
        if self.subscriptions.unsubscribe(peer, resource).is_none() {
            return Vec::new();
        }
        let local = *peer == self.local;
        if let Some(node) = self.tree.resolve_mut(resource) {
            let removed = if local {
                node.clear_receivers()
            } else {
                node.remove_senders_of(peer)
            };
            trace!("dropped {} feeds of {} in {}", removed, peer, resource);
        }
        self.release_if_unused(resource)
    }

    /// Deactivates `resource`, and then its ancestors, while each is
    /// released on last unsubscribe and has neither subscribers nor an
    /// active child
    fn release_if_unused(&mut self, resource: &ResourceId) -> Vec<ResourceId> {
        let mut released = Vec::new();
        let mut current = Some(resource.clone());
        while let Some(id) = current {
            let Some(node) = self.tree.resolve(&id) else {
                break;
            };
            if !node.is_active()
                || !node.deactivate_on_release()
                || self.subscriptions.subscriber_count(&id) > 0
                || self.tree.has_active_child(&id)
            {
                break;
            }
            if self.tree.deactivate(&id).is_err() {
                break;
            }
            info!("released {}", id);
            current = id.parent();
            released.push(id);
        }
        released
    }

    // Local entities

    /// Registers an entity the local peer is authoritative for
    pub fn register_entity(
        &mut self,
        resource: &ResourceId,
        entity: EntityId,
        type_id: EntityTypeId,
    ) -> Result<(), SyncError> {
        let local = self.local;
        let node = self.active_resource_mut(resource)?;
        if let Some(existing) = node.entity(&entity) {
            if !existing.is_owned_by(&local) {
                return Err(FeedError::NotAuthority {
                    entity: entity.to_string(),
                    sender: local.to_u64(),
                }
                .into());
            }
        }
        node.remove_receiver(&entity);
        node.insert_entity(OnlineEntity::new(entity, local, type_id, resource.clone()));
        debug!("registered {} in {}", entity, resource);
        Ok(())
    }

    /// Removes a locally owned entity and tells the subscribers
    pub fn remove_entity(
        &mut self,
        resource: &ResourceId,
        entity: &EntityId,
    ) -> Result<OnlineEntity, SyncError> {
        let local = self.local;
        let node = self.existing_resource_mut(resource)?;
        match node.entity(entity) {
            None => {
                return Err(FeedError::UnknownEntity {
                    entity: entity.to_string(),
                    resource: resource.to_string(),
                }
                .into())
            }
            Some(existing) if !existing.is_owned_by(&local) => {
                return Err(FeedError::NotAuthority {
                    entity: entity.to_string(),
                    sender: local.to_u64(),
                }
                .into())
            }
            Some(_) => {}
        }
        let Some(removed) = node.remove_entity(entity) else {
            return Err(FeedError::UnknownEntity {
                entity: entity.to_string(),
                resource: resource.to_string(),
            }
            .into());
        };

        let message = SessionMessage::EntityLeft(EntityLeftMessage {
            resource: resource.clone(),
            entity: *entity,
        });
        self.queue_for_subscribers(resource, message);
        Ok(removed)
    }

    /// Moves a locally owned entity to another resource. Subscribers of the
    /// destination receive a full state on the next capture.
    pub fn move_entity(
        &mut self,
        from: &ResourceId,
        to: &ResourceId,
        entity: &EntityId,
    ) -> Result<(), SyncError> {
        if !self.tree.is_active(to) {
            return Err(ResourceError::ResourceInactive {
                resource: to.to_string(),
            }
            .into());
        }
        let removed = self.remove_entity(from, entity)?;
        self.register_entity(to, *entity, removed.type_id())
    }

    /// Hands authority over a locally owned entity to `new_owner`. All of
    /// this peer's feeds for the entity are dropped; the new owner restarts
    /// them from full states.
    pub fn transfer_authority(
        &mut self,
        resource: &ResourceId,
        entity: &EntityId,
        new_owner: PeerId,
    ) -> Result<(), SyncError> {
        let local = self.local;
        if new_owner == local {
            return Ok(());
        }
        let node = self.existing_resource_mut(resource)?;
        let Some(online) = node.entity_mut(entity) else {
            return Err(FeedError::UnknownEntity {
                entity: entity.to_string(),
                resource: resource.to_string(),
            }
            .into());
        };
        if !online.is_owned_by(&local) {
            return Err(FeedError::NotAuthority {
                entity: entity.to_string(),
                sender: local.to_u64(),
            }
            .into());
        }
        online.set_owner(new_owner);
        node.remove_senders_for(entity);
        node.insert_receiver(*entity, FeedReceiver::new(new_owner, *entity));
        info!("{} handed {} to {}", local, entity, new_owner);

        let message = SessionMessage::AuthorityTransfer(AuthorityTransferMessage {
            resource: resource.clone(),
            entity: *entity,
            new_owner,
        });
        let mut recipients = self.remote_subscribers(resource);
        if !recipients.contains(&new_owner) {
            recipients.push(new_owner);
        }
        for peer in recipients {
            self.outgoing.push((peer, message.clone()));
        }
        Ok(())
    }

    // Capture

    /// Captures every locally owned entity in `resource` and queues a full
    /// state or delta per subscriber whose feed changed. Returns the number
    /// of queued messages.
    pub fn capture<S: EntityStateSerializer + ?Sized>(
        &mut self,
        resource: &ResourceId,
        serializer: &S,
    ) -> Result<usize, SyncError> {
        let local = self.local;
        let subscribers = self.remote_subscribers(resource);
        let Some(node) = self.tree.resolve_mut(resource) else {
            return Err(ResourceError::UnknownResource {
                resource: resource.to_string(),
            }
            .into());
        };
        if !node.is_active() {
            return Err(ResourceError::ResourceInactive {
                resource: resource.to_string(),
            }
            .into());
        }

        let mut owned: Vec<EntityId> = node
            .entities()
            .filter(|entity| entity.is_owned_by(&local))
            .map(|entity| entity.id())
            .collect();
        owned.sort();

        let mut queued = 0;
        for entity in owned {
            let Some(mut state) = serializer.capture(&entity) else {
                debug!("{} has no simulation state, skipping", entity);
                continue;
            };
            state.set_owner(local);
            for peer in &subscribers {
                let sender = node.sender_mut_or_insert(*peer, entity);
                if let Some(payload) = sender.capture_delta(&state) {
                    self.outgoing.push((*peer, payload.into()));
                    queued += 1;
                }
            }
        }
        Ok(queued)
    }

    /// Captures every active resource
    pub fn capture_all<S: EntityStateSerializer + ?Sized>(&mut self, serializer: &S) -> usize {
        let mut queued = 0;
        for resource in self.tree.active_ids() {
            match self.capture(&resource, serializer) {
                Ok(count) => queued += count,
                Err(error) => warn!("capture of {} failed: {}", resource, error),
            }
        }
        queued
    }

    /// Snapshots every active resource this peer owns and queues the states
    /// for the resources' subscribers
    pub fn make_states(&mut self, tick: StateTick) -> usize {
        let mut queued = 0;
        for resource in self.tree.active_ids() {
            let owned = self
                .tree
                .resolve(&resource)
                .map(|node| node.owner() == Some(self.local))
                .unwrap_or(false);
            if !owned {
                continue;
            }
            let Ok(state) = self.tree.make_state(&resource, tick) else {
                continue;
            };
            for peer in self.remote_subscribers(&resource) {
                self.outgoing
                    .push((peer, SessionMessage::ResourceState(state.clone())));
                queued += 1;
            }
        }
        queued
    }

    // Receive

    pub fn receive_resource_state(
        &mut self,
        from: PeerId,
        state: ResourceState,
    ) -> Result<bool, SyncError> {
        let resource = state.resource().clone();
        let Some(node) = self.tree.resolve(&resource) else {
            return Err(ResourceError::UnknownResource {
                resource: resource.to_string(),
            }
            .into());
        };
        if let Some(owner) = node.owner() {
            if owner != from {
                return Err(ResourceError::NotResourceOwner {
                    resource: resource.to_string(),
                    sender: from.to_u64(),
                }
                .into());
            }
        }
        Ok(self.tree.read_state(&resource, state)?)
    }

    /// Applies a full state from the entity's authority. The first full
    /// state for an unknown entity creates its mirror.
    pub fn receive_full_state<S: EntityStateSerializer + ?Sized>(
        &mut self,
        from: PeerId,
        message: &FullStateMessage,
        serializer: &mut S,
    ) -> Result<Option<EntityEvent>, SyncError> {
        let local = self.local;
        let resource = &message.resource;
        let entity = message.entity;
        let node = self.receiving_resource_mut(resource, &entity)?;

        if message.state.owner() != from {
            return Err(not_authority(&entity, from));
        }
        let joined = match node.entity(&entity) {
            Some(existing) if !existing.is_owned_by(&from) || existing.is_owned_by(&local) => {
                return Err(not_authority(&entity, from));
            }
            Some(_) => false,
            None => {
                node.insert_entity(OnlineEntity::new(
                    entity,
                    from,
                    message.state.type_id(),
                    resource.clone(),
                ));
                true
            }
        };

        let receiver = node.receiver_from(from, entity);
        let Some(state) = receiver.receive_full(message)? else {
            return Ok(None);
        };
        serializer.apply(&entity, state);

        if joined {
            debug!("{} joined {} from {}", entity, resource, from);
            Ok(Some(EntityEvent::Joined {
                resource: resource.clone(),
                entity,
                owner: from,
            }))
        } else {
            Ok(Some(EntityEvent::Updated {
                resource: resource.clone(),
                entity,
            }))
        }
    }

    /// Applies a delta from the entity's authority. A delta this peer cannot
    /// apply queues one reset request for the feed, and later ones are
    /// dropped until a full state arrives. Late deltas for an entity that
    /// already left are dropped without one.
    pub fn receive_delta<S: EntityStateSerializer + ?Sized>(
        &mut self,
        from: PeerId,
        message: &DeltaMessage,
        serializer: &mut S,
    ) -> Result<Option<EntityEvent>, SyncError> {
        let local = self.local;
        let resource = &message.resource;
        let entity = message.entity;
        let node = self.receiving_resource_mut(resource, &entity)?;

        let known = match node.entity(&entity) {
            Some(existing) if !existing.is_owned_by(&from) => {
                return Err(not_authority(&entity, from));
            }
            Some(_) => true,
            None => false,
        };
        if !known {
            if node.has_departed(&entity) {
                trace!("dropping late delta for departed {} in {}", entity, resource);
                return Ok(None);
            }
            // the full state that creates the mirror never arrived; ask for
            // it without keeping feed state for an entity we lack
            let error = FeedError::UnknownEntity {
                entity: entity.to_string(),
                resource: resource.to_string(),
            };
            debug!("{}: requesting reset of {} from {}", error, entity, from);
            self.outgoing.push((
                from,
                SessionMessage::Reset(ResetRequest {
                    sender: local,
                    resource: resource.clone(),
                    entity: Some(entity),
                }),
            ));
            return Err(error.into());
        }

        let receiver = node.receiver_from(from, entity);
        let result = receiver.receive_delta(message).map(|state| state.cloned());

        match result {
            Ok(Some(state)) => {
                serializer.apply(&entity, &state);
                Ok(Some(EntityEvent::Updated {
                    resource: resource.clone(),
                    entity,
                }))
            }
            Ok(None) => Ok(None),
            Err(error) => {
                if !receiver.request_reset() {
                    trace!("dropping delta for {} while awaiting full state", entity);
                    return Ok(None);
                }
                debug!("{}: requesting reset of {} from {}", error, entity, from);
                self.outgoing.push((
                    from,
                    SessionMessage::Reset(ResetRequest {
                        sender: local,
                        resource: resource.clone(),
                        entity: Some(entity),
                    }),
                ));
                Err(error.into())
            }
        }
    }

    pub fn receive_entity_left<S: EntityStateSerializer + ?Sized>(
        &mut self,
        from: PeerId,
        message: &EntityLeftMessage,
        serializer: &mut S,
    ) -> Result<EntityEvent, SyncError> {
        let resource = &message.resource;
        let entity = message.entity;
        let node = self.existing_resource_mut(resource)?;
        match node.entity(&entity) {
            None => {
                return Err(FeedError::UnknownEntity {
                    entity: entity.to_string(),
                    resource: resource.to_string(),
                }
                .into())
            }
            Some(existing) if !existing.is_owned_by(&from) => {
                return Err(not_authority(&entity, from));
            }
            Some(_) => {}
        }
        node.remove_entity(&entity);
        serializer.remove(&entity);
        Ok(EntityEvent::Left {
            resource: resource.clone(),
            entity,
        })
    }

    /// Applies an authority transfer sent by the entity's current owner
    pub fn receive_authority_transfer(
        &mut self,
        from: PeerId,
        message: &AuthorityTransferMessage,
    ) -> Result<EntityEvent, SyncError> {
        let local = self.local;
        let resource = &message.resource;
        let entity = message.entity;
        let new_owner = message.new_owner;
        let node = self.existing_resource_mut(resource)?;
        let Some(online) = node.entity_mut(&entity) else {
            return Err(FeedError::UnknownEntity {
                entity: entity.to_string(),
                resource: resource.to_string(),
            }
            .into());
        };
        if !online.is_owned_by(&from) || from == local {
            return Err(not_authority(&entity, from));
        }
        online.set_owner(new_owner);
        node.remove_senders_for(&entity);

        if new_owner == local {
            node.remove_receiver(&entity);
            info!("gained authority over {}", entity);
            Ok(EntityEvent::AuthorityGained {
                resource: resource.clone(),
                entity,
            })
        } else {
            // the new owner's feeds start from scratch
            node.insert_receiver(entity, FeedReceiver::new(new_owner, entity));
            Ok(EntityEvent::AuthorityChanged {
                resource: resource.clone(),
                entity,
                owner: new_owner,
            })
        }
    }

    /// Restarts the feeds a mirror asked for. A request naming an entity
    /// resets that entity's feed only; a request without one resets the
    /// requester's whole subscription. Nothing else is ever reset.
    pub fn handle_reset_request(&mut self, request: &ResetRequest) -> Result<ResetOutcome, SyncError> {
        let resource = &request.resource;
        let subscribed = self.subscriptions.is_subscribed(&request.sender, resource);
        let node = self.existing_resource_mut(resource)?;

        let outcome = match request.entity {
            Some(entity) if entity.is_none() => {
                return Err(FeedError::MalformedReset {
                    resource: resource.to_string(),
                }
                .into());
            }
            Some(entity) => match node.sender_mut(&request.sender, &entity) {
                Some(sender) => {
                    sender.reset_deltas();
                    ResetOutcome::Feed(entity)
                }
                None => ResetOutcome::NothingMatched,
            },
            None if subscribed => ResetOutcome::Subscription {
                feeds: node.reset_senders_of(&request.sender),
            },
            None => ResetOutcome::NothingMatched,
        };
        debug!(
            "reset request from {} for {}: {:?}",
            request.sender, resource, outcome
        );
        Ok(outcome)
    }

    /// Forgets everything tied to a departed peer: its subscriptions and the
    /// feeds sent to it, the entities it owned, and its resource ownership.
    pub fn remove_peer<S: EntityStateSerializer + ?Sized>(
        &mut self,
        peer: &PeerId,
        serializer: &mut S,
    ) -> Vec<EntityEvent> {
        let subscribed = self.subscriptions.remove_peer(peer);

        let mut events = Vec::new();
        for node in self.tree.resources_mut() {
            node.remove_senders_of(peer);
            node.remove_receivers_from(peer);

            let mut owned: Vec<EntityId> = node
                .entities()
                .filter(|entity| entity.is_owned_by(peer))
                .map(|entity| entity.id())
                .collect();
            owned.sort();
            for entity in owned {
                node.remove_entity(&entity);
                serializer.remove(&entity);
                events.push(EntityEvent::Left {
                    resource: node.id().clone(),
                    entity,
                });
            }

            if node.owner() == Some(*peer) {
                node.set_owner(None);
            }
        }

        for resource in subscribed {
            self.release_if_unused(&resource);
        }
        info!("removed {}: {} entities left", peer, events.len());
        events
    }

    // Helpers

    fn remote_subscribers(&self, resource: &ResourceId) -> Vec<PeerId> {
        self.subscriptions
            .subscribers_of(resource)
            .into_iter()
            .filter(|peer| *peer != self.local)
            .collect()
    }

    fn queue_for_subscribers(&mut self, resource: &ResourceId, message: SessionMessage) {
        for peer in self.remote_subscribers(resource) {
            self.outgoing.push((peer, message.clone()));
        }
    }

    fn existing_resource_mut(&mut self, resource: &ResourceId) -> Result<&mut Resource, SyncError> {
        self.tree.resolve_mut(resource).ok_or_else(|| {
            ResourceError::UnknownResource {
                resource: resource.to_string(),
            }
            .into()
        })
    }

    fn active_resource_mut(&mut self, resource: &ResourceId) -> Result<&mut Resource, SyncError> {
        let node = self.existing_resource_mut(resource)?;
        if !node.is_active() {
            return Err(ResourceError::ResourceInactive {
                resource: resource.to_string(),
            }
            .into());
        }
        Ok(node)
    }

    /// The resource an incoming feed message targets, provided this peer
    /// still mirrors it
    fn receiving_resource_mut(
        &mut self,
        resource: &ResourceId,
        entity: &EntityId,
    ) -> Result<&mut Resource, SyncError> {
        let subscribed = self.subscriptions.is_subscribed(&self.local, resource);
        let Some(node) = self.tree.resolve_mut(resource) else {
            return Err(FeedError::UnknownResource {
                resource: resource.to_string(),
            }
            .into());
        };
        if !subscribed || !node.is_active() {
            return Err(FeedError::FeedInvalidated {
                entity: entity.to_string(),
                resource: resource.to_string(),
            }
            .into());
        }
        Ok(node)
    }
}

fn not_authority(entity: &EntityId, sender: PeerId) -> SyncError {
    FeedError::NotAuthority {
        entity: entity.to_string(),
        sender: sender.to_u64(),
    }
    .into()
}
