use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use log::{debug, warn};

use crate::error::{EngineError, ScriptError};
use crate::function::{FunctionTable, NativeFunction};
use crate::scope::{BlockId, ScopeStack, Tier, VariableTable};

/// Handle of an engine inside a [`Registry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EngineId(pub usize);

impl fmt::Display for EngineId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One interpreter instance: scopes, native functions, the current result
/// and the last error.
pub struct Engine {
    pub(crate) scopes: ScopeStack,
    pub(crate) functions: FunctionTable,
    user_data: Option<Rc<dyn Any>>,
    pub(crate) result: String,
    error: Option<String>,
    /// Current line of each active `evaluate` call, innermost last.
    pub(crate) inputs: Vec<usize>,
    last_line: usize,
}

impl Engine {
    pub fn new() -> Self {
        Self::with_tables(VariableTable::new(), FunctionTable::new())
    }

    /// Uses the given tables as the global scope and function table. Both
    /// may be shared with other engines.
    pub fn with_tables(variables: VariableTable, functions: FunctionTable) -> Self {
        if !variables.contains("null") {
            variables.set("null", None);
        }

        Self {
            scopes: ScopeStack::new(variables),
            functions,
            user_data: None,
            result: String::new(),
            error: None,
            inputs: Vec::new(),
            last_line: 0,
        }
    }

    /// Opens a scope that later evaluations declare into until it is closed.
    pub fn open_block(&mut self) -> BlockId {
        self.scopes.push()
    }

    pub fn close_block(&mut self, id: BlockId) -> Result<(), EngineError> {
        self.scopes.pop(id)
    }

    /// Runs `script` and returns the value of its last value-producing
    /// statement.
    ///
    /// Statements before an error keep their effects. The error is also
    /// kept, formatted with its line, until the next failure replaces it.
    pub fn evaluate(&mut self, script: &str) -> Result<String, ScriptError> {
        debug!(
            "evaluating {} bytes (depth {})",
            script.len(),
            self.inputs.len() + 1
        );

        self.result.clear();
        self.inputs.push(1);
        let outcome = self.run_script(script);
        if let Some(line) = self.inputs.pop() {
            self.last_line = line;
        }

        match outcome {
            Ok(()) => Ok(self.result.clone()),
            Err(error) => {
                debug!("evaluation failed at line {}: {}", error.line(), error);
                self.last_line = error.line();
                self.error = Some(error.diagnostic(script));
                Err(error)
            }
        }
    }

    /// Evaluates inside a scope of its own, discarded afterwards.
    pub fn evaluate_block(&mut self, script: &str) -> Result<String, ScriptError> {
        let block = self.open_block();
        let outcome = self.evaluate(script);
        if let Err(error) = self.close_block(block) {
            warn!("script left scope {} unbalanced: {}", block, error);
        }
        outcome
    }

    pub fn register_function<F>(&mut self, name: &str, function: F)
    where
        F: Fn(&mut Engine, &[String]) -> Result<(), String> + 'static,
    {
        self.functions.register(name, function);
    }

    pub fn unregister_function(&mut self, name: &str) -> bool {
        self.functions.unregister(name)
    }

    pub fn function(&self, name: &str) -> Option<NativeFunction> {
        self.functions.lookup(name)
    }

    /// Looks `name` up in the current scope, then the global one. The
    /// inner `None` is a declared variable with no value.
    pub fn variable(&self, name: &str) -> Option<(Tier, Option<String>)> {
        self.scopes.lookup(name)
    }

    /// Binds `name` in the innermost open scope.
    pub fn set_variable(&mut self, name: &str, value: Option<&str>) {
        self.scopes.set_local(name, value.map(str::to_string));
    }

    pub fn set_local_variable(&mut self, name: &str, value: Option<&str>) {
        self.scopes.set_local(name, value.map(str::to_string));
    }

    pub fn set_global_variable(&mut self, name: &str, value: Option<&str>) {
        self.scopes.set_global(name, value.map(str::to_string));
    }

    pub fn result(&self) -> &str {
        &self.result
    }

    pub fn set_result(&mut self, value: impl Into<String>) {
        self.result = value.into();
    }

    /// Message, line number and line text of the most recent failure.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Line being executed, or where the last evaluation stopped.
    pub fn line_number(&self) -> usize {
        self.inputs.last().copied().unwrap_or(self.last_line)
    }

    pub fn set_user_data<T: Any>(&mut self, data: T) {
        self.user_data = Some(Rc::new(data));
    }

    pub fn user_data(&self) -> Option<Rc<dyn Any>> {
        self.user_data.clone()
    }

    pub fn user_data_as<T: Any>(&self) -> Option<Rc<T>> {
        self.user_data.clone()?.downcast::<T>().ok()
    }

    /// The global variable table.
    pub fn variables(&self) -> VariableTable {
        self.scopes.global().clone()
    }

    pub fn functions(&self) -> FunctionTable {
        self.functions.clone()
    }

    pub fn scope_depth(&self) -> usize {
        self.scopes.depth()
    }

    pub(crate) fn mark_line(&mut self, line: usize) {
        if let Some(current) = self.inputs.last_mut() {
            *current = line;
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Engine")
            .field("scopes", &self.scopes)
            .field("functions", &self.functions)
            .field("result", &self.result)
            .field("error", &self.error)
            .finish()
    }
}

/// Engines addressed by integer handles. Closed handles are reused,
/// lowest first.
#[derive(Default)]
pub struct Registry {
    engines: Vec<Option<Rc<RefCell<Engine>>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self) -> EngineId {
        self.insert(Engine::new())
    }

    pub fn open_with(&mut self, variables: VariableTable, functions: FunctionTable) -> EngineId {
        self.insert(Engine::with_tables(variables, functions))
    }

    fn insert(&mut self, engine: Engine) -> EngineId {
        let engine = Some(Rc::new(RefCell::new(engine)));
        let id = match self.engines.iter().position(Option::is_none) {
            Some(slot) => {
                self.engines[slot] = engine;
                slot
            }
            None => {
                self.engines.push(engine);
                self.engines.len() - 1
            }
        };
        debug!("opened engine {}", id);
        EngineId(id)
    }

    pub fn close(&mut self, id: EngineId) -> Result<(), EngineError> {
        if !matches!(self.engines.get(id.0), Some(Some(_))) {
            return Err(EngineError::BadHandle(id));
        }
        self.engines[id.0] = None;
        while matches!(self.engines.last(), Some(None)) {
            self.engines.pop();
        }
        debug!("closed engine {}", id);
        Ok(())
    }

    pub fn engine(&self, id: EngineId) -> Result<Rc<RefCell<Engine>>, EngineError> {
        self.engines
            .get(id.0)
            .and_then(|slot| slot.clone())
            .ok_or(EngineError::BadHandle(id))
    }

    /// Evaluates against engine `id`. Fails with [`EngineError::Busy`] when
    /// that engine is the one running the current callback.
    pub fn evaluate(&self, id: EngineId, script: &str) -> Result<String, EngineError> {
        let cell = self.engine(id)?;
        let mut engine = cell
            .try_borrow_mut()
            .map_err(|_| EngineError::Busy(id))?;
        Ok(engine.evaluate(script)?)
    }

    /// Number of open engines.
    pub fn len(&self) -> usize {
        self.engines.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
