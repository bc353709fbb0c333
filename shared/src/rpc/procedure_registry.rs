use std::collections::HashMap;

use crate::rpc::{
    arg::{ArgKind, RpcArg},
    error::RpcError,
    rpc_dispatcher::RpcCall,
};

pub type ProcedureHandler<C> = Box<dyn Fn(&mut RpcCall, &mut C)>;

pub struct Procedure<C> {
    name: String,
    params: Vec<ArgKind>,
    handler: ProcedureHandler<C>,
}

impl<C> Procedure<C> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[ArgKind] {
        &self.params
    }

    /// Checks arity and argument kinds against the registered schema
    pub fn validate(&self, args: &[RpcArg]) -> Result<(), RpcError> {
        if args.len() != self.params.len() {
            return Err(RpcError::ArgumentCount {
                name: self.name.clone(),
                expected: self.params.len(),
                supplied: args.len(),
            });
        }
        for (index, (arg, param)) in args.iter().zip(self.params.iter()).enumerate() {
            if arg.kind() != *param {
                return Err(RpcError::ArgumentType {
                    name: self.name.clone(),
                    index,
                    expected: param.name(),
                    supplied: arg.kind().name(),
                });
            }
        }
        Ok(())
    }

    pub(crate) fn call(&self, call: &mut RpcCall, context: &mut C) {
        (self.handler)(call, context);
    }
}

/// Table of named procedures with explicit parameter schemas. Built before
/// the session starts, then locked.
pub struct ProcedureRegistry<C> {
    procedures: HashMap<String, Procedure<C>>,
    locked: bool,
}

impl<C> Default for ProcedureRegistry<C> {
    fn default() -> Self {
        Self {
            procedures: HashMap::new(),
            locked: false,
        }
    }
}

impl<C> ProcedureRegistry<C> {
    pub fn builder() -> Self {
        Self::default()
    }

    /// Registers a procedure
    ///
    /// # Panics
    ///
    /// Panics if the registry is locked or the name is already taken.
    /// Use [`ProcedureRegistry::try_register`] for a non-panicking version.
    pub fn register<F>(&mut self, name: &str, params: &[ArgKind], handler: F) -> &mut Self
    where
        F: Fn(&mut RpcCall, &mut C) + 'static,
    {
        self.check_lock();
        if self.procedures.contains_key(name) {
            panic!("Procedure {name:?} is already registered");
        }
        self.insert(name, params, handler);
        self
    }

    pub fn try_register<F>(
        &mut self,
        name: &str,
        params: &[ArgKind],
        handler: F,
    ) -> Result<&mut Self, RpcError>
    where
        F: Fn(&mut RpcCall, &mut C) + 'static,
    {
        self.try_check_lock()?;
        if self.procedures.contains_key(name) {
            return Err(RpcError::DuplicateProcedure {
                name: name.to_string(),
            });
        }
        self.insert(name, params, handler);
        Ok(self)
    }

    pub fn lock(&mut self) {
        self.check_lock();
        self.locked = true;
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn check_lock(&self) {
        if self.locked {
            panic!("Procedure registry already locked!");
        }
    }

    pub fn try_check_lock(&self) -> Result<(), RpcError> {
        if self.locked {
            Err(RpcError::RegistryLocked)
        } else {
            Ok(())
        }
    }

    pub fn get(&self, name: &str) -> Option<&Procedure<C>> {
        self.procedures.get(name)
    }

    /// Looks up `name` and validates `args` against its schema
    pub fn resolve(&self, name: &str, args: &[RpcArg]) -> Result<&Procedure<C>, RpcError> {
        let Some(procedure) = self.procedures.get(name) else {
            return Err(RpcError::ProcedureNotFound {
                name: name.to_string(),
            });
        };
        procedure.validate(args)?;
        Ok(procedure)
    }

    pub fn len(&self) -> usize {
        self.procedures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.procedures.is_empty()
    }

    fn insert<F>(&mut self, name: &str, params: &[ArgKind], handler: F)
    where
        F: Fn(&mut RpcCall, &mut C) + 'static,
    {
        self.procedures.insert(
            name.to_string(),
            Procedure {
                name: name.to_string(),
                params: params.to_vec(),
                handler: Box::new(handler),
            },
        );
    }
}
