use std::collections::HashMap;

use log::{debug, info, warn};

use crate::{
    entity::online_entity::OnlineEntity,
    resource::{
        adapter::{ExternalKey, ResourceAdapter},
        error::{ActivationError, ResourceError},
        resource::{Resource, ResourceStatus},
        resource_id::ResourceId,
        resource_state::{EntityMembership, ResourceState},
    },
    types::{PeerId, StateTick},
};

/// What a deactivation tore down
#[derive(Default, Debug)]
pub struct Deactivation {
    /// Descendants removed from the tree
    pub removed: Vec<ResourceId>,
    /// Entities dropped from the resource and its descendants
    pub entities: Vec<OnlineEntity>,
}

impl Deactivation {
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.entities.is_empty()
    }
}

/// Arena of every resource known to this peer, indexed by id, plus the
/// session-scoped map from simulation objects to the resources bound to them.
#[derive(Default)]
pub struct ResourceTree {
    resources: HashMap<ResourceId, Resource>,
    bindings: HashMap<ExternalKey, ResourceId>,
}

impl ResourceTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_root(&mut self, id: ResourceId, owner: Option<PeerId>) -> Result<(), ResourceError> {
        if id.parent().is_some() {
            return Err(ResourceError::InvalidRoot {
                resource: id.to_string(),
            });
        }
        if self.resources.contains_key(&id) {
            return Err(ResourceError::DuplicateResource {
                resource: id.to_string(),
            });
        }
        self.resources
            .insert(id.clone(), Resource::new(id, owner, false));
        Ok(())
    }

    /// Adds an unloaded child below `parent`. The child inherits the
    /// parent's owner.
    pub fn add_child(
        &mut self,
        parent: &ResourceId,
        child: ResourceId,
        deactivate_on_release: bool,
    ) -> Result<(), ResourceError> {
        if child.parent().as_ref() != Some(parent) {
            return Err(ResourceError::NotAChild {
                parent: parent.to_string(),
                child: child.to_string(),
            });
        }
        if self.resources.contains_key(&child) {
            return Err(ResourceError::DuplicateResource {
                resource: child.to_string(),
            });
        }
        let Some(parent_resource) = self.resources.get_mut(parent) else {
            return Err(ResourceError::UnknownResource {
                resource: parent.to_string(),
            });
        };
        parent_resource.add_child_id(child.clone());
        let owner = parent_resource.owner();

        self.resources.insert(
            child.clone(),
            Resource::new(child, owner, deactivate_on_release),
        );
        Ok(())
    }

    pub fn resolve(&self, id: &ResourceId) -> Option<&Resource> {
        self.resources.get(id)
    }

    pub(crate) fn resolve_mut(&mut self, id: &ResourceId) -> Option<&mut Resource> {
        self.resources.get_mut(id)
    }

    pub fn contains(&self, id: &ResourceId) -> bool {
        self.resources.contains_key(id)
    }

    pub fn is_active(&self, id: &ResourceId) -> bool {
        self.resources
            .get(id)
            .map(|resource| resource.is_active())
            .unwrap_or(false)
    }

    pub fn has_active_child(&self, id: &ResourceId) -> bool {
        self.resources
            .get(id)
            .map(|resource| resource.children().iter().any(|child| self.is_active(child)))
            .unwrap_or(false)
    }

    pub fn resources(&self) -> impl Iterator<Item = &Resource> {
        self.resources.values()
    }

    pub(crate) fn resources_mut(&mut self) -> impl Iterator<Item = &mut Resource> {
        self.resources.values_mut()
    }

    /// Ids of all active resources, parents before children
    pub fn active_ids(&self) -> Vec<ResourceId> {
        let mut ids: Vec<ResourceId> = self
            .resources
            .values()
            .filter(|resource| resource.is_active())
            .map(|resource| resource.id().clone())
            .collect();
        ids.sort();
        ids
    }

    /// Activates `id`, constructing the children the adapter reports.
    /// Returns the ids of newly constructed children. Activating an active
    /// resource is a no-op.
    pub fn activate<A: ResourceAdapter + ?Sized>(
        &mut self,
        id: &ResourceId,
        adapter: &A,
    ) -> Result<Vec<ResourceId>, ActivationError> {
        let Some(resource) = self.resources.get(id) else {
            return Err(ActivationError::UnknownResource {
                resource: id.to_string(),
            });
        };

        match resource.status() {
            ResourceStatus::Active => return Ok(Vec::new()),
            ResourceStatus::Activating | ResourceStatus::Deactivating => {
                return Err(ActivationError::InTransition {
                    resource: id.to_string(),
                    status: resource.status().name(),
                });
            }
            ResourceStatus::Unloaded => {}
        }

        if let Some(parent) = resource.parent() {
            if !self.is_active(parent) {
                return Err(ActivationError::ParentInactive {
                    resource: id.to_string(),
                    parent: parent.to_string(),
                });
            }
        }

        let binding = resource.binding();
        let owner = resource.owner();
        if id.kind().requires_binding() {
            let bound_object_loaded = binding.map(|key| adapter.has_object(key)).unwrap_or(false);
            if !bound_object_loaded {
                warn!("cannot activate {}: no loaded simulation object", id);
                return Err(ActivationError::MissingExternalObject {
                    resource: id.to_string(),
                });
            }
        }

        self.set_status(id, ResourceStatus::Activating);

        let mut created = Vec::new();
        let mut children = Vec::new();
        for name in adapter.children_of(id, binding) {
            let Some(child) = id.try_child(name) else {
                debug!("{} cannot hold children, ignoring adapter output", id);
                break;
            };
            if !self.resources.contains_key(&child) {
                self.resources
                    .insert(child.clone(), Resource::new(child.clone(), owner, true));
                created.push(child.clone());
            }
            children.push(child);
        }

        if let Some(resource) = self.resources.get_mut(id) {
            for child in children {
                resource.add_child_id(child);
            }
            resource.set_status(ResourceStatus::Active);
        }

        info!("activated {} ({} new children)", id, created.len());
        Ok(created)
    }

    /// Deactivates `id`: removes its descendants from the tree, drops their
    /// bindings, entities and feeds, and leaves `id` itself `Unloaded`.
    pub fn deactivate(&mut self, id: &ResourceId) -> Result<Deactivation, ResourceError> {
        let Some(resource) = self.resources.get_mut(id) else {
            return Err(ResourceError::UnknownResource {
                resource: id.to_string(),
            });
        };
        if resource.status() == ResourceStatus::Unloaded {
            return Ok(Deactivation::default());
        }
        resource.set_status(ResourceStatus::Deactivating);

        let mut output = Deactivation::default();
        let mut pending = resource.take_children();
        while let Some(child_id) = pending.pop() {
            let Some(mut child) = self.resources.remove(&child_id) else {
                continue;
            };
            pending.extend(child.take_children());
            if let Some(key) = child.binding() {
                self.bindings.remove(&key);
            }
            output.entities.extend(child.clear_contents());
            output.removed.push(child_id);
        }

        if let Some(resource) = self.resources.get_mut(id) {
            if let Some(key) = resource.binding() {
                self.bindings.remove(&key);
                resource.set_binding(None);
            }
            output.entities.extend(resource.clear_contents());
            resource.set_status(ResourceStatus::Unloaded);
        }

        info!(
            "deactivated {} ({} descendants removed, {} entities dropped)",
            id,
            output.removed.len(),
            output.entities.len()
        );
        Ok(output)
    }

    /// Associates a simulation object with a resource
    pub fn bind(&mut self, key: ExternalKey, id: &ResourceId) -> Result<(), ResourceError> {
        if let Some(bound) = self.bindings.get(&key) {
            if bound == id {
                return Ok(());
            }
            return Err(ResourceError::DuplicateBinding {
                key: key.to_u64(),
                resource: bound.to_string(),
            });
        }
        let Some(resource) = self.resources.get_mut(id) else {
            return Err(ResourceError::UnknownResource {
                resource: id.to_string(),
            });
        };
        if let Some(previous) = resource.binding() {
            self.bindings.remove(&previous);
        }
        resource.set_binding(Some(key));
        self.bindings.insert(key, id.clone());
        Ok(())
    }

    pub fn find_bound(&self, key: ExternalKey) -> Option<&ResourceId> {
        self.bindings.get(&key)
    }

    /// Returns the resource bound to `key`, creating `parent`'s child named
    /// `name` and binding it if no resource is bound yet
    pub fn find_or_create_bound(
        &mut self,
        parent: &ResourceId,
        name: &str,
        key: ExternalKey,
    ) -> Result<ResourceId, ResourceError> {
        if let Some(bound) = self.bindings.get(&key) {
            return Ok(bound.clone());
        }
        let Some(child) = parent.try_child(name) else {
            return Err(ResourceError::NotAChild {
                parent: parent.to_string(),
                child: name.to_string(),
            });
        };
        if !self.resources.contains_key(&child) {
            self.add_child(parent, child.clone(), true)?;
        }
        self.bind(key, &child)?;
        Ok(child)
    }

    /// Produces a snapshot of an active resource. The tick never goes
    /// backwards relative to the last state held.
    pub fn make_state(
        &mut self,
        id: &ResourceId,
        tick: StateTick,
    ) -> Result<ResourceState, ResourceError> {
        let Some(resource) = self.resources.get_mut(id) else {
            return Err(ResourceError::UnknownResource {
                resource: id.to_string(),
            });
        };
        if !resource.is_active() {
            return Err(ResourceError::ResourceInactive {
                resource: id.to_string(),
            });
        }

        let tick = resource
            .latest_state()
            .map(|latest| latest.tick().max(tick))
            .unwrap_or(tick);
        let sub_resources = resource
            .children()
            .iter()
            .map(|child| child.name().to_string())
            .collect();
        let mut entities: Vec<EntityMembership> = resource
            .entities()
            .map(|entity| EntityMembership {
                entity: entity.id(),
                owner: entity.owner(),
            })
            .collect();
        entities.sort_by_key(|membership| membership.entity);

        let state = ResourceState::new(id.clone(), tick, resource.owner(), sub_resources, entities);
        resource.set_latest_state(state.clone());
        Ok(state)
    }

    /// Stores a received snapshot. Returns `false` if it is not newer than
    /// the one already held.
    pub fn read_state(
        &mut self,
        id: &ResourceId,
        state: ResourceState,
    ) -> Result<bool, ResourceError> {
        let Some(resource) = self.resources.get_mut(id) else {
            return Err(ResourceError::UnknownResource {
                resource: id.to_string(),
            });
        };
        if let Some(latest) = resource.latest_state() {
            if state.tick() <= latest.tick() {
                debug!(
                    "ignoring state for {} at tick {}, holding tick {}",
                    id,
                    state.tick(),
                    latest.tick()
                );
                return Ok(false);
            }
        }
        if let Some(owner) = state.owner() {
            resource.set_owner(Some(owner));
        }
        resource.set_latest_state(state);
        Ok(true)
    }

    fn set_status(&mut self, id: &ResourceId, status: ResourceStatus) {
        if let Some(resource) = self.resources.get_mut(id) {
            resource.set_status(status);
        }
    }
}
