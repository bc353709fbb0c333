use std::collections::{HashMap, HashSet};

use log::debug;

use crate::{
    resource::resource_id::ResourceId,
    subscription::subscription::Subscription,
    types::{PeerId, StateTick},
};

/// Non-owning (peer, resource) associations, indexed both ways
#[derive(Default)]
pub struct SubscriptionRegistry {
    subscriptions: HashMap<(PeerId, ResourceId), Subscription>,
    subscribers: HashMap<ResourceId, HashSet<PeerId>>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` if the peer was already subscribed
    pub fn subscribe(&mut self, peer: PeerId, resource: &ResourceId, tick: StateTick) -> bool {
        let key = (peer, resource.clone());
        if self.subscriptions.contains_key(&key) {
            return false;
        }
        self.subscriptions
            .insert(key, Subscription::new(peer, resource.clone(), tick));
        self.subscribers
            .entry(resource.clone())
            .or_default()
            .insert(peer);
        debug!("{} subscribed to {}", peer, resource);
        true
    }

    pub fn unsubscribe(&mut self, peer: &PeerId, resource: &ResourceId) -> Option<Subscription> {
        let subscription = self.subscriptions.remove(&(*peer, resource.clone()))?;
        if let Some(peers) = self.subscribers.get_mut(resource) {
            peers.remove(peer);
            if peers.is_empty() {
                self.subscribers.remove(resource);
            }
        }
        debug!("{} unsubscribed from {}", peer, resource);
        Some(subscription)
    }

    pub fn is_subscribed(&self, peer: &PeerId, resource: &ResourceId) -> bool {
        self.subscriptions.contains_key(&(*peer, resource.clone()))
    }

    pub fn subscription(&self, peer: &PeerId, resource: &ResourceId) -> Option<&Subscription> {
        self.subscriptions.get(&(*peer, resource.clone()))
    }

    /// Subscribers of `resource`, sorted
    pub fn subscribers_of(&self, resource: &ResourceId) -> Vec<PeerId> {
        let mut peers: Vec<PeerId> = self
            .subscribers
            .get(resource)
            .map(|peers| peers.iter().copied().collect())
            .unwrap_or_default();
        peers.sort();
        peers
    }

    pub fn subscriber_count(&self, resource: &ResourceId) -> usize {
        self.subscribers
            .get(resource)
            .map(|peers| peers.len())
            .unwrap_or(0)
    }

    /// Resources `peer` is subscribed to, sorted
    pub fn subscriptions_of(&self, peer: &PeerId) -> Vec<ResourceId> {
        let mut resources: Vec<ResourceId> = self
            .subscriptions
            .keys()
            .filter(|(subscriber, _)| subscriber == peer)
            .map(|(_, resource)| resource.clone())
            .collect();
        resources.sort();
        resources
    }

    /// Drops every subscription of `peer`, returning the resources it was
    /// subscribed to
    pub fn remove_peer(&mut self, peer: &PeerId) -> Vec<ResourceId> {
        let resources = self.subscriptions_of(peer);
        for resource in &resources {
            self.unsubscribe(peer, resource);
        }
        resources
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }
}
