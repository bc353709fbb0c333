use meadow_peer::{
    shared::{EntityEvent, PeerId, ProcedureRegistry},
    transport::LocalHub,
    MeadowPeerError, Session, SessionConfig, SessionEvent,
};

use crate::{story::story_procedures, test_world::TestWorld};

/// A session, its simulation and every event it produced so far
pub struct TestPeer {
    pub id: PeerId,
    pub name: String,
    pub session: Session<TestWorld>,
    pub world: TestWorld,
    events: Vec<SessionEvent>,
}

impl TestPeer {
    pub fn new(id: PeerId, name: &str, config: SessionConfig, hub: &LocalHub) -> Self {
        Self::with_procedures(id, name, config, hub, story_procedures())
    }

    pub fn with_procedures(
        id: PeerId,
        name: &str,
        config: SessionConfig,
        hub: &LocalHub,
        registry: ProcedureRegistry<TestWorld>,
    ) -> Self {
        let mut session = Session::new(config, registry, id, name);
        let (sender, receiver) = hub.join(id);
        session.io_load(sender, receiver);
        Self {
            id,
            name: name.to_string(),
            session,
            world: TestWorld::new(),
            events: Vec::new(),
        }
    }

    pub fn tick(&mut self) {
        self.session.tick(&mut self.world);
        self.collect_events();
    }

    /// Pulls events raised between ticks, e.g. by `on_object_unloaded`
    pub fn collect_events(&mut self) {
        self.events.extend(self.session.take_events());
    }

    pub fn events(&self) -> &[SessionEvent] {
        &self.events
    }

    pub fn clear_events(&mut self) {
        self.events.clear();
    }

    pub fn errors(&self) -> Vec<&MeadowPeerError> {
        self.events
            .iter()
            .filter_map(|event| match event {
                SessionEvent::Error(error) => Some(error),
                _ => None,
            })
            .collect()
    }

    pub fn entity_events(&self) -> Vec<&EntityEvent> {
        self.events
            .iter()
            .filter_map(|event| match event {
                SessionEvent::Entity(event) => Some(event),
                _ => None,
            })
            .collect()
    }

    pub fn rpc_executions(&self, procedure: &str) -> usize {
        self.events
            .iter()
            .filter(|event| {
                matches!(event, SessionEvent::RpcExecuted { procedure: executed, .. } if executed == procedure)
            })
            .count()
    }
}
