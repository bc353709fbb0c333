use std::{cmp::Reverse, collections::BTreeMap, mem};

use log::{debug, info, trace, warn};

use meadow_shared::{
    EntityEvent, EntityId, EntityStateSerializer, EntityTypeId, ExternalKey, MessageError,
    Packet, PeerDirectory, PeerId, ProcedureRegistry, ReplicationManager, ResourceAdapter,
    ResourceError, ResourceId, RpcArg, RpcDispatcher, RpcError, RpcEvent, RpcTarget,
    SessionMessage, StateTick, SyncError,
};

use crate::{
    error::MeadowPeerError,
    events::SessionEvent,
    io::Io,
    mod_sync::{ModEntry, ModListNegotiation},
    transport::{PacketReceiver, PacketSender},
    SessionConfig,
};

/// One peer's view of a Meadow Online session.
///
/// `C` is the simulation integration: it captures and applies entity
/// states, answers resource activation queries and is the context remote
/// procedures run against. Everything happens inside [`Session::tick`] or
/// the calls the integration makes between ticks; nothing runs concurrently
/// except the optional mod-list negotiation worker.
pub struct Session<C> {
    config: SessionConfig,
    name: String,
    io: Io,
    directory: PeerDirectory,
    replication: ReplicationManager,
    rpc: RpcDispatcher<C>,
    tick: StateTick,
    outgoing: Vec<(PeerId, SessionMessage)>,
    events: Vec<SessionEvent>,
    negotiation: Option<ModListNegotiation>,
}

impl<C: EntityStateSerializer + ResourceAdapter> Session<C> {
    /// Create a new Session. The registry is locked from here on.
    pub fn new(
        config: SessionConfig,
        registry: ProcedureRegistry<C>,
        local: PeerId,
        name: &str,
    ) -> Self {
        let rpc = RpcDispatcher::new(local, registry, config.rpc.clone());
        Self {
            config,
            name: name.to_string(),
            io: Io::new(),
            directory: PeerDirectory::new(local),
            replication: ReplicationManager::new(local),
            rpc,
            tick: 0,
            outgoing: Vec::new(),
            events: Vec::new(),
            negotiation: None,
        }
    }

    pub fn io_load(&mut self, sender: Box<dyn PacketSender>, receiver: Box<dyn PacketReceiver>) {
        self.io.load(sender, receiver);
    }

    pub fn is_loaded(&self) -> bool {
        self.io.is_loaded()
    }

    pub fn local(&self) -> PeerId {
        self.directory.local()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn current_tick(&self) -> StateTick {
        self.tick
    }

    pub fn peers(&self) -> Vec<PeerId> {
        self.directory.peers()
    }

    pub fn directory(&self) -> &PeerDirectory {
        &self.directory
    }

    pub fn replication(&self) -> &ReplicationManager {
        &self.replication
    }

    pub fn take_events(&mut self) -> Vec<SessionEvent> {
        mem::take(&mut self.events)
    }

    // Peers

    /// Introduces the local peer to `peer`. The remote side answers with its
    /// own hello and subscriptions.
    pub fn connect(&mut self, peer: PeerId, name: &str) {
        if self.directory.add_peer(peer, name, self.tick) {
            self.events.push(SessionEvent::PeerConnected {
                peer,
                name: name.to_string(),
            });
            self.greet(peer);
        }
    }

    /// Drops everything tied to a peer that left: its subscriptions, the
    /// feeds sent to it, the entities it owned and its resource ownership.
    /// Orphaned resources go to the lowest remaining peer id.
    pub fn peer_disconnected(&mut self, peer: PeerId, sim: &mut C) {
        if self.directory.remove_peer(&peer).is_none() {
            return;
        }
        for event in self.replication.remove_peer(&peer, sim) {
            self.on_entity_event(event);
        }
        self.rpc.remove_peer(&peer);
        self.events.push(SessionEvent::PeerDisconnected(peer));
        self.assign_orphaned();
    }

    fn assign_orphaned(&mut self) {
        let elected = self
            .directory
            .peers()
            .into_iter()
            .chain(Some(self.local()))
            .min()
            .unwrap_or_else(|| self.local());
        for resource in self.replication.assign_orphaned(elected) {
            info!("{} now owned by {}", resource, elected);
            self.events.push(SessionEvent::OwnershipAssigned {
                resource,
                owner: elected,
            });
        }
    }

    fn greet(&mut self, peer: PeerId) {
        self.outgoing
            .push((peer, SessionMessage::Hello(self.name.clone())));
        let local = self.local();
        for resource in self.replication.subscriptions().subscriptions_of(&local) {
            self.outgoing.push((peer, SessionMessage::Subscribe(resource)));
        }
    }

    fn broadcast(&mut self, message: SessionMessage) {
        for peer in self.directory.peers() {
            self.outgoing.push((peer, message.clone()));
        }
    }

    // Resources

    /// Adds the lobby root owned by `owner`, activates it and subscribes
    pub fn open_lobby(
        &mut self,
        lobby: ResourceId,
        owner: PeerId,
        sim: &C,
    ) -> Result<(), MeadowPeerError> {
        self.replication.add_root(lobby.clone(), Some(owner))?;
        self.replication.activate(&lobby, sim)?;
        self.subscribe(&lobby)
    }

    /// The simulation loaded an object (a world, a room) that belongs below
    /// `parent`. Finds or creates the bound resource, activates it and
    /// subscribes the local peer.
    pub fn on_object_loaded(
        &mut self,
        parent: &ResourceId,
        name: &str,
        key: ExternalKey,
        sim: &C,
    ) -> Result<ResourceId, MeadowPeerError> {
        let resource = self.replication.find_or_create_bound(parent, name, key)?;
        self.replication.activate(&resource, sim)?;
        self.subscribe(&resource)?;
        Ok(resource)
    }

    /// The simulation unloaded the object bound to `key`. Locally owned
    /// entities below it leave, local subscriptions to it and its
    /// descendants end, and the resource is deactivated even if other peers
    /// still use it.
    pub fn on_object_unloaded(
        &mut self,
        key: ExternalKey,
        sim: &mut C,
    ) -> Result<(), MeadowPeerError> {
        let Some(resource) = self.replication.find_bound(key).cloned() else {
            debug!("unloaded {} was never bound", key);
            return Ok(());
        };

        let local = self.local();
        let mut owned: Vec<(ResourceId, EntityId)> = self
            .replication
            .tree()
            .resources()
            .filter(|node| *node.id() == resource || resource.is_ancestor_of(node.id()))
            .flat_map(|node| {
                node.entities()
                    .filter(|entity| entity.is_owned_by(&local))
                    .map(|entity| (node.id().clone(), entity.id()))
                    .collect::<Vec<_>>()
            })
            .collect();
        owned.sort();
        for (within, entity) in owned {
            self.replication.remove_entity(&within, &entity)?;
        }

        let mut subscribed: Vec<ResourceId> = self
            .replication
            .subscriptions()
            .subscriptions_of(&local)
            .into_iter()
            .filter(|id| *id == resource || resource.is_ancestor_of(id))
            .collect();
        subscribed.sort_by_key(|id| Reverse(id.depth()));
        for id in subscribed {
            self.unsubscribe(&id);
        }

        let deactivation = self.replication.deactivate(&resource)?;
        for entity in deactivation.entities {
            sim.remove(&entity.id());
            self.on_entity_event(EntityEvent::Left {
                resource: entity.resource().clone(),
                entity: entity.id(),
            });
        }
        Ok(())
    }

    /// Subscribes the local peer to an active resource and tells every peer
    pub fn subscribe(&mut self, resource: &ResourceId) -> Result<(), MeadowPeerError> {
        if !self.replication.tree().contains(resource) {
            return Err(SyncError::from(ResourceError::UnknownResource {
                resource: resource.to_string(),
            })
            .into());
        }
        if !self.replication.tree().is_active(resource) {
            return Err(SyncError::from(ResourceError::ResourceInactive {
                resource: resource.to_string(),
            })
            .into());
        }
        let local = self.local();
        if self.replication.subscribe(local, resource, self.tick) {
            self.broadcast(SessionMessage::Subscribe(resource.clone()));
        }
        Ok(())
    }

    pub fn unsubscribe(&mut self, resource: &ResourceId) {
        let local = self.local();
        if !self.replication.subscriptions().is_subscribed(&local, resource) {
            return;
        }
        for released in self.replication.unsubscribe(&local, resource) {
            self.events.push(SessionEvent::ResourceReleased(released));
        }
        self.broadcast(SessionMessage::Unsubscribe(resource.clone()));
    }

    // Entities

    pub fn register_entity(
        &mut self,
        resource: &ResourceId,
        entity: EntityId,
        type_id: EntityTypeId,
    ) -> Result<(), MeadowPeerError> {
        Ok(self.replication.register_entity(resource, entity, type_id)?)
    }

    pub fn remove_entity(
        &mut self,
        resource: &ResourceId,
        entity: &EntityId,
    ) -> Result<(), MeadowPeerError> {
        self.replication.remove_entity(resource, entity)?;
        Ok(())
    }

    pub fn move_entity(
        &mut self,
        from: &ResourceId,
        to: &ResourceId,
        entity: &EntityId,
    ) -> Result<(), MeadowPeerError> {
        Ok(self.replication.move_entity(from, to, entity)?)
    }

    pub fn transfer_authority(
        &mut self,
        resource: &ResourceId,
        entity: &EntityId,
        new_owner: PeerId,
    ) -> Result<(), MeadowPeerError> {
        self.replication
            .transfer_authority(resource, entity, new_owner)?;
        self.directory.record_authority(&new_owner, *entity);
        Ok(())
    }

    // Remote procedures

    pub fn invoke(
        &mut self,
        target: RpcTarget,
        procedure: &str,
        args: Vec<RpcArg>,
    ) -> Result<(), MeadowPeerError> {
        self.check_target(&target)?;
        let event = self.rpc.invoke(target, procedure, args, self.tick)?;
        self.queue_rpc(event);
        Ok(())
    }

    /// Like [`Session::invoke`], but receivers execute the call at most once
    /// however often the packet carrying it is delivered
    pub fn invoke_once(
        &mut self,
        target: RpcTarget,
        procedure: &str,
        args: Vec<RpcArg>,
    ) -> Result<(), MeadowPeerError> {
        self.check_target(&target)?;
        let event = self.rpc.invoke_once(target, procedure, args, self.tick)?;
        self.queue_rpc(event);
        Ok(())
    }

    fn check_target(&self, target: &RpcTarget) -> Result<(), MeadowPeerError> {
        match target {
            RpcTarget::Peer(peer) if !self.directory.contains(peer) => {
                Err(RpcError::MisroutedEvent {
                    target: target.to_string(),
                    local: self.local().to_u64(),
                }
                .into())
            }
            _ => Ok(()),
        }
    }

    fn queue_rpc(&mut self, event: RpcEvent) {
        match event.target {
            RpcTarget::Peer(peer) => self.outgoing.push((peer, SessionMessage::Rpc(event))),
            RpcTarget::Broadcast => self.broadcast(SessionMessage::Rpc(event)),
        }
    }

    // Background work

    /// Starts comparing the installed mods against a lobby's list on a
    /// worker thread. The result arrives as [`SessionEvent::ModsNegotiated`].
    pub fn start_mod_negotiation(
        &mut self,
        installed: Vec<ModEntry>,
        required: Vec<String>,
    ) -> Result<(), MeadowPeerError> {
        self.negotiation = Some(ModListNegotiation::start(installed, required)?);
        Ok(())
    }

    pub fn is_negotiating(&self) -> bool {
        self.negotiation.is_some()
    }

    /// Collects results of background work without blocking
    pub fn poll_background(&mut self) {
        let Some(negotiation) = self.negotiation.as_mut() else {
            return;
        };
        let Some(result) = negotiation.poll() else {
            return;
        };
        self.negotiation = None;
        match result {
            Ok(diff) => self.events.push(SessionEvent::ModsNegotiated(diff)),
            Err(error) => self.events.push(SessionEvent::Error(error)),
        }
    }

    // Tick

    /// Advances the session by one tick: reads every queued packet, drops
    /// silent peers, publishes resource states when due, captures owned
    /// entities and sends one packet per peer.
    pub fn tick(&mut self, sim: &mut C) {
        self.tick += 1;
        self.events.push(SessionEvent::Tick(self.tick));

        self.receive_all_packets(sim);
        self.handle_timeouts(sim);
        self.poll_background();

        let state_interval = self.config.state_interval_ticks;
        if state_interval > 0 && self.tick % state_interval == 0 {
            let queued = self.replication.make_states(self.tick);
            trace!("queued {} resource states", queued);
        }
        self.replication.capture_all(sim);

        self.send_all_packets();
    }

    fn receive_all_packets(&mut self, sim: &mut C) {
        loop {
            match self.io.recv_packet() {
                Ok(Some((peer, packet))) => self.read_packet(peer, packet, sim),
                Ok(None) => break,
                Err(error @ MeadowPeerError::Decode { .. }) => {
                    warn!("{}", error);
                    self.events.push(SessionEvent::Error(error));
                }
                Err(error) => {
                    warn!("{}", error);
                    self.events.push(SessionEvent::Error(error));
                    break;
                }
            }
        }
    }

    fn read_packet(&mut self, peer: PeerId, packet: Packet, sim: &mut C) {
        if packet.sender != peer {
            let error = MeadowPeerError::Decode {
                peer,
                source: MessageError::SenderMismatch {
                    transport: peer.to_u64(),
                    claimed: packet.sender.to_u64(),
                },
            };
            warn!("{}", error);
            self.events.push(SessionEvent::Error(error));
            return;
        }

        for message in packet.messages {
            self.read_message(peer, message, sim);
        }
        self.directory.mark_heard(&peer, self.tick);
    }

    fn read_message(&mut self, peer: PeerId, message: SessionMessage, sim: &mut C) {
        let name = message.name();
        if let SessionMessage::Hello(peer_name) = &message {
            if self.directory.add_peer(peer, peer_name, self.tick) {
                self.events.push(SessionEvent::PeerConnected {
                    peer,
                    name: peer_name.clone(),
                });
                self.greet(peer);
            }
            return;
        }
        if !self.directory.contains(&peer) {
            let error = MeadowPeerError::UnknownPeer { peer, message: name };
            debug!("{}", error);
            self.events.push(SessionEvent::Error(error));
            return;
        }

        match self.apply_message(peer, message, sim) {
            Ok(()) => {}
            Err(MeadowPeerError::Rpc(RpcError::DuplicateOnce { sender, sequence })) => {
                trace!("already ran once-call {} from peer {}", sequence, sender);
            }
            Err(error) => {
                debug!("{} from {} failed: {}", name, peer, error);
                self.events.push(SessionEvent::Error(error));
            }
        }
    }

    fn apply_message(
        &mut self,
        peer: PeerId,
        message: SessionMessage,
        sim: &mut C,
    ) -> Result<(), MeadowPeerError> {
        match message {
            SessionMessage::Hello(_) => {}
            SessionMessage::Subscribe(resource) => {
                self.replication.subscribe(peer, &resource, self.tick);
            }
            SessionMessage::Unsubscribe(resource) => {
                for released in self.replication.unsubscribe(&peer, &resource) {
                    self.events.push(SessionEvent::ResourceReleased(released));
                }
            }
            SessionMessage::ResourceState(state) => {
                self.replication.receive_resource_state(peer, state)?;
            }
            SessionMessage::FullState(full) => {
                if let Some(event) = self.replication.receive_full_state(peer, &full, sim)? {
                    self.on_entity_event(event);
                }
            }
            SessionMessage::Delta(delta) => {
                if let Some(event) = self.replication.receive_delta(peer, &delta, sim)? {
                    self.on_entity_event(event);
                }
            }
            SessionMessage::EntityLeft(left) => {
                let event = self.replication.receive_entity_left(peer, &left, sim)?;
                self.on_entity_event(event);
            }
            SessionMessage::AuthorityTransfer(transfer) => {
                let event = self
                    .replication
                    .receive_authority_transfer(peer, &transfer)?;
                self.on_entity_event(event);
            }
            SessionMessage::Reset(request) => {
                if request.sender != peer {
                    return Err(sender_mismatch(peer, request.sender));
                }
                self.replication.handle_reset_request(&request)?;
            }
            SessionMessage::Rpc(event) => {
                if event.sender != peer {
                    return Err(sender_mismatch(peer, event.sender));
                }
                let follow_ups = self.rpc.dispatch(&event, sim)?;
                self.events.push(SessionEvent::RpcExecuted {
                    procedure: event.procedure.clone(),
                    sender: peer,
                });
                for follow_up in follow_ups {
                    self.queue_rpc(follow_up);
                }
            }
        }
        Ok(())
    }

    fn on_entity_event(&mut self, event: EntityEvent) {
        match &event {
            EntityEvent::Joined { entity, owner, .. }
            | EntityEvent::AuthorityChanged { entity, owner, .. } => {
                self.directory.record_authority(owner, *entity);
            }
            EntityEvent::AuthorityGained { entity, .. } | EntityEvent::Left { entity, .. } => {
                self.directory.release_authority(entity);
            }
            EntityEvent::Updated { .. } => {}
        }
        self.events.push(SessionEvent::Entity(event));
    }

    fn handle_timeouts(&mut self, sim: &mut C) {
        let timeout = self.config.peer_timeout_ticks;
        for peer in self.directory.timed_out(self.tick, timeout) {
            let silent_ticks = self
                .directory
                .get(&peer)
                .map(|record| self.tick.saturating_sub(record.last_heard()))
                .unwrap_or(timeout);
            warn!("{} silent for {} ticks, dropping", peer, silent_ticks);
            self.events
                .push(SessionEvent::Error(MeadowPeerError::PeerConnectionLost {
                    peer,
                    silent_ticks,
                }));
            self.peer_disconnected(peer, sim);
        }
    }

    fn send_all_packets(&mut self) {
        let mut batches: BTreeMap<PeerId, Vec<SessionMessage>> = BTreeMap::new();
        let queued = mem::take(&mut self.outgoing)
            .into_iter()
            .chain(self.replication.take_outgoing());
        for (peer, message) in queued {
            batches.entry(peer).or_default().push(message);
        }

        let heartbeat = self.config.heartbeat_interval_ticks;
        if heartbeat > 0 && self.tick % heartbeat == 0 {
            for peer in self.directory.peers() {
                batches.entry(peer).or_default();
            }
        }

        let local = self.local();
        for (peer, messages) in batches {
            if !self.directory.contains(&peer) {
                trace!("dropping {} messages for {}, not connected", messages.len(), peer);
                continue;
            }
            let packet = Packet::new(local, messages);
            if let Err(error) = self.io.send_packet(&peer, &packet) {
                warn!("{}", error);
                self.events.push(SessionEvent::Error(error));
            }
        }
    }
}

fn sender_mismatch(transport: PeerId, claimed: PeerId) -> MeadowPeerError {
    MeadowPeerError::Decode {
        peer: transport,
        source: MessageError::SenderMismatch {
            transport: transport.to_u64(),
            claimed: claimed.to_u64(),
        },
    }
}
