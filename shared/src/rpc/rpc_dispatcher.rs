use std::collections::HashMap;

use log::{debug, trace};

use crate::{
    resource::resource_id::ResourceId,
    rpc::{
        arg::RpcArg,
        error::RpcError,
        once_window::OnceWindow,
        procedure_registry::ProcedureRegistry,
        rpc_config::RpcConfig,
        rpc_event::{OnceKey, RpcEvent, RpcTarget},
    },
    types::{PeerId, StateTick},
};

/// A follow-up call queued by a handler
#[derive(Clone, PartialEq, Debug)]
pub struct RpcRequest {
    pub target: RpcTarget,
    pub procedure: String,
    pub args: Vec<RpcArg>,
    pub once: bool,
}

/// What a handler sees of the event it is executing
pub struct RpcCall {
    sender: PeerId,
    sent_at: StateTick,
    args: Vec<RpcArg>,
    requests: Vec<RpcRequest>,
}

impl RpcCall {
    pub fn sender(&self) -> PeerId {
        self.sender
    }

    pub fn sent_at(&self) -> StateTick {
        self.sent_at
    }

    pub fn args(&self) -> &[RpcArg] {
        &self.args
    }

    pub fn arg(&self, index: usize) -> Option<&RpcArg> {
        self.args.get(index)
    }

    /// The first resource argument, if the procedure takes one
    pub fn resource(&self) -> Option<&ResourceId> {
        self.args.iter().find_map(RpcArg::as_resource)
    }

    /// Queues a call to be sent once the handler returns
    pub fn invoke(&mut self, target: RpcTarget, procedure: &str, args: Vec<RpcArg>) {
        self.requests.push(RpcRequest {
            target,
            procedure: procedure.to_string(),
            args,
            once: false,
        });
    }

    pub fn invoke_once(&mut self, target: RpcTarget, procedure: &str, args: Vec<RpcArg>) {
        self.requests.push(RpcRequest {
            target,
            procedure: procedure.to_string(),
            args,
            once: true,
        });
    }
}

/// Builds outgoing RPC events and executes incoming ones against a locked
/// [`ProcedureRegistry`]. `C` is the caller-owned context handed to handlers.
pub struct RpcDispatcher<C> {
    local: PeerId,
    registry: ProcedureRegistry<C>,
    // one sequence stream per target, so a receiver only sees its own
    next_once: HashMap<RpcTarget, u16>,
    once_windows: HashMap<(PeerId, RpcTarget), OnceWindow>,
    config: RpcConfig,
}

impl<C> RpcDispatcher<C> {
    /// Takes ownership of the registry and locks it
    pub fn new(local: PeerId, mut registry: ProcedureRegistry<C>, config: RpcConfig) -> Self {
        if !registry.is_locked() {
            registry.lock();
        }
        Self {
            local,
            registry,
            next_once: HashMap::new(),
            once_windows: HashMap::new(),
            config,
        }
    }

    pub fn local(&self) -> PeerId {
        self.local
    }

    pub fn registry(&self) -> &ProcedureRegistry<C> {
        &self.registry
    }

    /// Builds an event for `procedure`, validated against the local schema
    pub fn invoke(
        &mut self,
        target: RpcTarget,
        procedure: &str,
        args: Vec<RpcArg>,
        tick: StateTick,
    ) -> Result<RpcEvent, RpcError> {
        self.build(target, procedure, args, tick, None)
    }

    /// Like [`RpcDispatcher::invoke`], tagged so receivers execute it at most once
    pub fn invoke_once(
        &mut self,
        target: RpcTarget,
        procedure: &str,
        args: Vec<RpcArg>,
        tick: StateTick,
    ) -> Result<RpcEvent, RpcError> {
        let next = self.next_once.entry(target).or_insert(0);
        let key = OnceKey { sequence: *next };
        let event = self.build(target, procedure, args, tick, Some(key))?;
        if let Some(next) = self.next_once.get_mut(&target) {
            *next = next.wrapping_add(1);
        }
        Ok(event)
    }

    /// Executes an incoming event. Returns the events built from any
    /// follow-up calls the handler queued.
    pub fn dispatch(&mut self, event: &RpcEvent, context: &mut C) -> Result<Vec<RpcEvent>, RpcError> {
        if event.sender == self.local || !event.target.includes(&self.local) {
            return Err(RpcError::MisroutedEvent {
                target: event.target.to_string(),
                local: self.local.to_u64(),
            });
        }

        let procedure = self.registry.resolve(&event.procedure, &event.args)?;

        if let Some(key) = event.once {
            let capacity = self.config.once_window;
            let window = self
                .once_windows
                .entry((event.sender, event.target))
                .or_insert_with(|| OnceWindow::new(capacity));
            if !window.insert(key.sequence) {
                debug!(
                    "dropping repeated {} {} from {}",
                    event.procedure, key.sequence, event.sender
                );
                return Err(RpcError::DuplicateOnce {
                    sender: event.sender.to_u64(),
                    sequence: key.sequence,
                });
            }
        }

        trace!("executing {} from {}", event.procedure, event.sender);
        let mut call = RpcCall {
            sender: event.sender,
            sent_at: event.sent_at,
            args: event.args.clone(),
            requests: Vec::new(),
        };
        procedure.call(&mut call, context);

        let mut follow_ups = Vec::new();
        for request in call.requests {
            let built = if request.once {
                self.invoke_once(request.target, &request.procedure, request.args, event.sent_at)
            } else {
                self.invoke(request.target, &request.procedure, request.args, event.sent_at)
            };
            match built {
                Ok(follow_up) => follow_ups.push(follow_up),
                Err(error) => debug!("dropping follow-up from {}: {}", event.procedure, error),
            }
        }
        Ok(follow_ups)
    }

    /// Forgets the invoke-once history of a departed peer, in both
    /// directions
    pub fn remove_peer(&mut self, peer: &PeerId) {
        self.once_windows.retain(|(sender, _), _| sender != peer);
        self.next_once.remove(&RpcTarget::Peer(*peer));
    }

    fn build(
        &self,
        target: RpcTarget,
        procedure: &str,
        args: Vec<RpcArg>,
        tick: StateTick,
        once: Option<OnceKey>,
    ) -> Result<RpcEvent, RpcError> {
        self.registry.resolve(procedure, &args)?;
        Ok(RpcEvent {
            sender: self.local,
            target,
            procedure: procedure.to_string(),
            args,
            sent_at: tick,
            once,
        })
    }
}
