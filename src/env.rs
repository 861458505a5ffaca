use std::collections::{HashMap, VecDeque};
use std::io::{self, BufRead, Write};
use std::rc::Rc;

use crate::ast::FunctionDef;
use crate::audio::{AudioBackend, NoAudioBackend};
use crate::config::Config;
use crate::error::{Position, RuntimeError};
use crate::fs::{FileSystem, OsFileSystem};
use crate::value::Value;

#[derive(Default)]
struct Scope {
    variables: HashMap<String, Value>,
}

/// One stack frame: the lexical scopes of a single function activation
/// (or of the top level). Name lookup never crosses frames.
pub struct CallContext {
    pub name: String,
    scopes: Vec<Scope>,
}

impl CallContext {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scopes: vec![Scope::default()],
        }
    }

    pub fn enter_scope(&mut self) {
        self.scopes.push(Scope::default());
    }

    pub fn exit_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    fn declare(&mut self, name: &str, value: Value, pos: Position) -> Result<(), RuntimeError> {
        let scope = match self.scopes.last_mut() {
            Some(scope) => scope,
            None => return Ok(()),
        };
        if scope.variables.contains_key(name) {
            return Err(RuntimeError::at(
                format!("Variable '{}' already declared in this scope.", name),
                pos,
            ));
        }
        scope.variables.insert(name.to_string(), value);
        Ok(())
    }

    /// Assigns into the innermost scope holding `name`. Matching scalar
    /// kinds mutate the existing storage in place (so aliases observe
    /// the write); anything else rebinds the name.
    fn assign(&mut self, name: &str, value: &Value) -> bool {
        for scope in self.scopes.iter_mut().rev() {
            let Some(slot) = scope.variables.get_mut(name) else {
                continue;
            };
            match (&*slot, value) {
                (Value::Int(a), Value::Int(b)) => a.set(b.get()),
                (Value::Float(a), Value::Float(b)) => a.set(b.get()),
                (Value::Bool(a), Value::Bool(b)) => a.set(b.get()),
                (Value::Str(a), Value::Str(b)) => *a.borrow_mut() = b.borrow().clone(),
                _ => *slot = value.clone(),
            }
            return true;
        }
        false
    }

    fn get(&self, name: &str) -> Option<Value> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.variables.get(name))
            .cloned()
    }
}

/// Either a builtin or a user-defined function.
pub enum Callable {
    Builtin(&'static crate::builtins::Builtin),
    User(Rc<FunctionDef>),
}

/// The runtime world: call stack, function registry, capabilities, and
/// program I/O.
pub struct Environment {
    call_stack: Vec<CallContext>,
    user_functions: HashMap<String, Rc<FunctionDef>>,
    pub max_func_depth: usize,
    pub fs: Rc<dyn FileSystem>,
    pub audio: Rc<dyn AudioBackend>,
    input_queue: Option<VecDeque<String>>,
    output: Box<dyn Write>,
}

impl Environment {
    pub fn new(config: &Config) -> Self {
        Self::with_capabilities(config, Rc::new(OsFileSystem), Rc::new(NoAudioBackend))
    }

    pub fn with_capabilities(
        config: &Config,
        fs: Rc<dyn FileSystem>,
        audio: Rc<dyn AudioBackend>,
    ) -> Self {
        Self {
            call_stack: vec![CallContext::new("<module>")],
            user_functions: HashMap::new(),
            max_func_depth: config.max_func_depth,
            fs,
            audio,
            input_queue: None,
            output: Box::new(io::stdout()),
        }
    }

    // --- Call stack ---

    pub fn current_context(&mut self) -> &mut CallContext {
        // The global context is never popped.
        let last = self.call_stack.len() - 1;
        &mut self.call_stack[last]
    }

    pub fn push_call_context(&mut self, name: &str, pos: Position) -> Result<(), RuntimeError> {
        if self.call_stack.len() >= self.max_func_depth {
            return Err(RuntimeError::at(
                format!(
                    "Maximum function call depth ({}) exceeded.",
                    self.max_func_depth
                ),
                pos,
            ));
        }
        self.call_stack.push(CallContext::new(name));
        Ok(())
    }

    pub fn pop_call_context(&mut self) {
        if self.call_stack.len() > 1 {
            self.call_stack.pop();
        }
    }

    // --- Variables ---

    pub fn declare_variable(
        &mut self,
        name: &str,
        value: Value,
        pos: Position,
    ) -> Result<(), RuntimeError> {
        self.current_context().declare(name, value, pos)
    }

    pub fn assign_variable(
        &mut self,
        name: &str,
        value: &Value,
        pos: Position,
    ) -> Result<(), RuntimeError> {
        if self.current_context().assign(name, value) {
            Ok(())
        } else {
            Err(RuntimeError::at(
                format!("Undeclared variable '{}' referenced.", name),
                pos,
            ))
        }
    }

    pub fn get_variable(&mut self, name: &str, pos: Position) -> Result<Value, RuntimeError> {
        self.current_context().get(name).ok_or_else(|| {
            RuntimeError::at(format!("Undeclared variable '{}' referenced.", name), pos)
        })
    }

    // --- Functions ---

    pub fn register_function(&mut self, func: &FunctionDef) -> Result<(), RuntimeError> {
        if self.user_functions.contains_key(&func.name)
            || crate::builtins::lookup(&func.name).is_some()
        {
            return Err(RuntimeError::at(
                format!("Function '{}' already defined.", func.name),
                func.span.start,
            ));
        }
        self.user_functions
            .insert(func.name.clone(), Rc::new(func.clone()));
        Ok(())
    }

    pub fn lookup_function(&self, name: &str, pos: Position) -> Result<Callable, RuntimeError> {
        if let Some(builtin) = crate::builtins::lookup(name) {
            return Ok(Callable::Builtin(builtin));
        }
        if let Some(func) = self.user_functions.get(name) {
            return Ok(Callable::User(func.clone()));
        }
        Err(RuntimeError::at(
            format!("Undefined function '{}' called.", name),
            pos,
        ))
    }

    // --- Program I/O ---

    pub fn set_output(&mut self, output: Box<dyn Write>) {
        self.output = output;
    }

    pub fn write_line(&mut self, text: &str) -> Result<(), RuntimeError> {
        writeln!(self.output, "{}", text)
            .map_err(|e| RuntimeError::new(format!("Failed to write output: {}.", e)))
    }

    /// Replaces stdin with a fixed queue of lines; reading past the end
    /// becomes a runtime error.
    pub fn set_input_data(&mut self, lines: Vec<String>) {
        self.input_queue = Some(lines.into());
    }

    pub fn read_line(&mut self) -> Result<String, RuntimeError> {
        if let Some(queue) = &mut self.input_queue {
            return queue
                .pop_front()
                .ok_or_else(|| RuntimeError::new("Attempted to read past end of mock input."));
        }
        let mut line = String::new();
        let read = io::stdin()
            .lock()
            .read_line(&mut line)
            .map_err(|e| RuntimeError::new(format!("Failed to read input: {}.", e)))?;
        if read == 0 {
            return Err(RuntimeError::new("EOF encountered while reading input."));
        }
        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }
        Ok(line)
    }
}
