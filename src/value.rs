use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::objects::{AudioState, FileState, FolderState};
use crate::types::Type;

/// A runtime value. Scalars live in shared cells so that binding a value
/// to a parameter aliases the caller's storage; mutating the parameter
/// mutates the argument. Objects and lists are shared handles.
#[derive(Debug, Clone)]
pub enum Value {
    Int(Rc<Cell<i64>>),
    Float(Rc<Cell<f64>>),
    Bool(Rc<Cell<bool>>),
    Str(Rc<RefCell<String>>),
    Null,
    List(Rc<RefCell<ListValue>>),
    File(Rc<RefCell<FileState>>),
    Folder(Rc<RefCell<FolderState>>),
    Audio(Rc<RefCell<AudioState>>),
}

#[derive(Debug, Clone)]
pub struct ListValue {
    pub element_type: Type,
    pub elements: Vec<Value>,
}

/// Element type tag for a list built from `values`: the first element's
/// type, widened toward any later element whose type accepts it, so a
/// mixed audio/file list carries the `File` tag either way around.
pub fn common_element_type(values: &[Value]) -> Type {
    let mut inferred = match values.first() {
        Some(value) => value.type_of(),
        None => Type::Null,
    };
    for value in values.iter().skip(1) {
        let current = value.type_of();
        if current.accepts(&inferred) && !inferred.accepts(&current) {
            inferred = current;
        }
    }
    inferred
}

impl Value {
    pub fn int(v: i64) -> Self {
        Value::Int(Rc::new(Cell::new(v)))
    }

    pub fn float(v: f64) -> Self {
        Value::Float(Rc::new(Cell::new(v)))
    }

    pub fn bool(v: bool) -> Self {
        Value::Bool(Rc::new(Cell::new(v)))
    }

    pub fn string(v: impl Into<String>) -> Self {
        Value::Str(Rc::new(RefCell::new(v.into())))
    }

    pub fn list(element_type: Type, elements: Vec<Value>) -> Self {
        Value::List(Rc::new(RefCell::new(ListValue {
            element_type,
            elements,
        })))
    }

    pub fn type_of(&self) -> Type {
        match self {
            Value::Int(_) => Type::Int,
            Value::Float(_) => Type::Float,
            Value::Bool(_) => Type::Bool,
            Value::Str(_) => Type::Str,
            Value::Null => Type::Null,
            Value::List(list) => Type::List(Box::new(list.borrow().element_type.clone())),
            Value::File(_) => Type::File,
            Value::Folder(_) => Type::Folder,
            Value::Audio(_) => Type::Audio,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Truthiness for conditions: `false` and `null` are false,
    /// everything else is true.
    pub fn is_true(&self) -> bool {
        match self {
            Value::Bool(b) => b.get(),
            Value::Null => false,
            _ => true,
        }
    }

    /// Fresh storage for scalars, so the result no longer aliases this
    /// value; objects and lists keep sharing their handle.
    pub fn detached(&self) -> Value {
        match self {
            Value::Int(v) => Value::int(v.get()),
            Value::Float(v) => Value::float(v.get()),
            Value::Bool(v) => Value::bool(v.get()),
            Value::Str(v) => Value::string(v.borrow().clone()),
            other => other.clone(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v.get()),
            Value::Float(v) => {
                let x = v.get();
                if x.fract() == 0.0 && x.is_finite() {
                    write!(f, "{:.1}", x)
                } else {
                    write!(f, "{}", x)
                }
            }
            Value::Bool(v) => write!(f, "{}", if v.get() { "true" } else { "false" }),
            Value::Str(v) => write!(f, "{}", v.borrow()),
            Value::Null => write!(f, "null"),
            Value::List(list) => {
                let list = list.borrow();
                write!(f, "[")?;
                for (i, element) in list.elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", element)?;
                }
                write!(f, "]")
            }
            Value::File(file) => write!(f, "File('{}')", file.borrow().path.display()),
            Value::Folder(folder) => write!(f, "Folder('{}')", folder.borrow().path.display()),
            Value::Audio(audio) => {
                let audio = audio.borrow();
                write!(f, "Audio('{}')", audio.file.path.display())
            }
        }
    }
}
