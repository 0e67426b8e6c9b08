use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use log::trace;

use crate::error::EngineError;

/// Name to value mapping for one scope. `None` marks a declared but
/// unbound variable.
///
/// Cloning yields another handle onto the same table, so a host can hand
/// one global table to several engines.
#[derive(Debug, Clone, Default)]
pub struct VariableTable(Rc<RefCell<HashMap<String, Option<String>>>>);

impl VariableTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<Option<String>> {
        self.0.borrow().get(name).cloned()
    }

    pub fn set(&self, name: &str, value: Option<String>) {
        self.0.borrow_mut().insert(name.to_string(), value);
    }

    pub fn remove(&self, name: &str) -> Option<Option<String>> {
        self.0.borrow_mut().remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.borrow().contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// Names in the table, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.0.borrow().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn same_table(&self, other: &VariableTable) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

/// Which scope a variable was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Local,
    Global,
}

/// Handle returned by [`crate::Engine::open_block`]; closing must happen in
/// reverse order of opening. Ids are never reused, so a handle whose block
/// is already closed cannot close another one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockId(pub(crate) u64);

impl BlockId {
    const GLOBAL: BlockId = BlockId(0);
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stack of variable tables. The bottom one is global and is never popped;
/// only the top and the bottom are ever searched.
#[derive(Debug, Clone)]
pub struct ScopeStack {
    scopes: Vec<(BlockId, VariableTable)>,
    last_id: u64,
}

impl ScopeStack {
    pub fn new(global: VariableTable) -> Self {
        Self {
            scopes: vec![(BlockId::GLOBAL, global)],
            last_id: 0,
        }
    }

    pub fn push(&mut self) -> BlockId {
        self.last_id += 1;
        let id = BlockId(self.last_id);
        self.scopes.push((id, VariableTable::new()));
        trace!("opened block {}", id);
        id
    }

    pub fn pop(&mut self, id: BlockId) -> Result<(), EngineError> {
        if id == BlockId::GLOBAL {
            return Err(EngineError::GlobalScope);
        }
        let top = self.top_id();
        if id != top {
            return Err(EngineError::BlockOrder {
                expected: top.0,
                found: id.0,
            });
        }
        self.scopes.pop();
        trace!("closed block {}", id);
        Ok(())
    }

    fn top_id(&self) -> BlockId {
        self.scopes.last().map_or(BlockId::GLOBAL, |(id, _)| *id)
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    pub fn current(&self) -> &VariableTable {
        // The global table is never popped, so the stack is never empty.
        &self.scopes[self.scopes.len() - 1].1
    }

    pub fn global(&self) -> &VariableTable {
        &self.scopes[0].1
    }

    fn has_local(&self) -> bool {
        self.scopes.len() > 1
    }

    /// Looks in the current scope, then the global one.
    pub fn lookup(&self, name: &str) -> Option<(Tier, Option<String>)> {
        if self.has_local() {
            if let Some(value) = self.current().get(name) {
                return Some((Tier::Local, value));
            }
        }
        self.global().get(name).map(|value| (Tier::Global, value))
    }

    /// Writes to the tier that already holds `name`, or to global when
    /// neither does.
    pub fn assign(&self, name: &str, value: String) -> Tier {
        match self.lookup(name) {
            Some((Tier::Local, _)) => {
                self.current().set(name, Some(value));
                Tier::Local
            }
            _ => {
                self.global().set(name, Some(value));
                Tier::Global
            }
        }
    }

    /// Binds in the current scope, which is the global one when no block
    /// is open.
    pub fn set_local(&self, name: &str, value: Option<String>) {
        self.current().set(name, value);
    }

    pub fn set_global(&self, name: &str, value: Option<String>) {
        self.global().set(name, value);
    }
}
