use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::engine::Engine;
use crate::value;

/// Host callback invoked for a script call.
///
/// It receives the calling engine and the evaluated arguments in order.
/// The value of the call is whatever the callback stores with
/// [`Engine::set_result`]; returning `Err` aborts the evaluation with that
/// message.
pub type NativeFunction = Rc<dyn Fn(&mut Engine, &[String]) -> Result<(), String>>;

/// Typed view over the arguments a [`NativeFunction`] receives.
#[derive(Debug, Clone, Copy)]
pub struct Args<'a>(&'a [String]);

/// One argument converted by [`Args::scan`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgValue<'a> {
    Str(&'a str),
    Int(i64),
}

impl<'a> Args<'a> {
    pub fn new(args: &'a [String]) -> Self {
        Self(args)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn expect_count(&self, count: usize) -> Result<(), String> {
        if self.0.len() == count {
            Ok(())
        } else {
            Err(format!(
                "expected {} argument{}, got {}",
                count,
                if count == 1 { "" } else { "s" },
                self.0.len()
            ))
        }
    }

    pub fn string(&self, index: usize) -> Result<&'a str, String> {
        self.0
            .get(index)
            .map(String::as_str)
            .ok_or_else(|| format!("missing argument {}", index + 1))
    }

    /// Leading digits of the argument as an integer, with an optional
    /// minus sign. Text without leading digits reads as 0.
    pub fn integer(&self, index: usize) -> Result<i64, String> {
        let text = self.string(index)?;
        let (negative, digits) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text),
        };
        let end = digits
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(digits.len());
        let magnitude = value::to_integer(&digits[..end]);
        Ok(if negative {
            magnitude.wrapping_neg()
        } else {
            magnitude
        })
    }

    /// Converts arguments by a format of `%s` (string) and `%d` (integer)
    /// specs, stopping at whichever of the format and the arguments ends
    /// first. The length of the returned list is the number converted.
    pub fn scan(&self, format: &str) -> Result<Vec<ArgValue<'a>>, String> {
        let mut values = Vec::new();
        let mut specs = format.chars();
        while values.len() < self.0.len() {
            match specs.next() {
                None => break,
                Some('%') => {}
                Some(_) => continue,
            }
            let index = values.len();
            match specs.next() {
                Some('s') => values.push(ArgValue::Str(self.string(index)?)),
                Some('d') => values.push(ArgValue::Int(self.integer(index)?)),
                Some(other) => return Err(format!("unsupported argument format '%{}'", other)),
                None => return Err("argument format ends after '%'".to_string()),
            }
        }
        Ok(values)
    }
}

/// Native functions by name, shared by every scope of an engine. Clones
/// share the same table.
#[derive(Clone, Default)]
pub struct FunctionTable(Rc<RefCell<HashMap<String, NativeFunction>>>);

impl FunctionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces `name`.
    pub fn register<F>(&self, name: &str, function: F)
    where
        F: Fn(&mut Engine, &[String]) -> Result<(), String> + 'static,
    {
        self.0
            .borrow_mut()
            .insert(name.to_string(), Rc::new(function));
    }

    pub fn unregister(&self, name: &str) -> bool {
        self.0.borrow_mut().remove(name).is_some()
    }

    /// The callback is cloned out so the table is not borrowed while it runs.
    pub fn lookup(&self, name: &str) -> Option<NativeFunction> {
        self.0.borrow().get(name).cloned()
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

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.0.borrow().keys().cloned().collect();
        names.sort();
        names
    }
}

impl fmt::Debug for FunctionTable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("FunctionTable")
            .field("functions", &self.names())
            .finish()
    }
}
