use std::cell::RefCell;
use std::rc::Rc;

use crate::env::Environment;
use crate::error::{Position, RuntimeError};
use crate::objects::{self, FileState};
use crate::types::Type;
use crate::value::Value;

type BuiltinFn = fn(&mut Environment, &[Value], Position) -> Result<Value, RuntimeError>;

/// A builtin free function: signature for runtime revalidation plus the
/// implementation.
pub struct Builtin {
    pub name: &'static str,
    pub params: &'static [Type],
    pub ret: Type,
    func: BuiltinFn,
}

static BUILTINS: &[Builtin] = &[
    Builtin {
        name: "print",
        params: &[Type::Str],
        ret: Type::Void,
        func: builtin_print,
    },
    Builtin {
        name: "input",
        params: &[],
        ret: Type::Str,
        func: builtin_input,
    },
    Builtin {
        name: "stoi",
        params: &[Type::Str],
        ret: Type::Int,
        func: builtin_stoi,
    },
    Builtin {
        name: "itos",
        params: &[Type::Int],
        ret: Type::Str,
        func: builtin_itos,
    },
    Builtin {
        name: "stof",
        params: &[Type::Str],
        ret: Type::Float,
        func: builtin_stof,
    },
    Builtin {
        name: "ftos",
        params: &[Type::Float],
        ret: Type::Str,
        func: builtin_ftos,
    },
    Builtin {
        name: "itof",
        params: &[Type::Int],
        ret: Type::Float,
        func: builtin_itof,
    },
    Builtin {
        name: "ftoi",
        params: &[Type::Float],
        ret: Type::Int,
        func: builtin_ftoi,
    },
    Builtin {
        name: "btos",
        params: &[Type::Bool],
        ret: Type::Str,
        func: builtin_btos,
    },
    Builtin {
        name: "atof",
        params: &[Type::Audio],
        ret: Type::File,
        func: builtin_atof,
    },
    Builtin {
        name: "ftoa",
        params: &[Type::File],
        ret: Type::Audio,
        func: builtin_ftoa,
    },
];

pub fn lookup(name: &str) -> Option<&'static Builtin> {
    BUILTINS.iter().find(|b| b.name == name)
}

impl Builtin {
    /// Revalidates arity and argument types (the checker has already
    /// done this statically for checked programs), then runs the
    /// implementation.
    pub fn call(
        &self,
        env: &mut Environment,
        args: &[Value],
        pos: Position,
    ) -> Result<Value, RuntimeError> {
        if args.len() != self.params.len() {
            return Err(RuntimeError::at(
                format!(
                    "Function '{}' expected {} arguments, got {}.",
                    self.name,
                    self.params.len(),
                    args.len()
                ),
                pos,
            ));
        }
        for (i, (arg, expected)) in args.iter().zip(self.params.iter()).enumerate() {
            let actual = arg.type_of();
            if !expected.accepts(&actual) {
                return Err(RuntimeError::at(
                    format!(
                        "Argument {} for function '{}': expected type '{}', got '{}'.",
                        i + 1,
                        self.name,
                        expected,
                        actual
                    ),
                    pos,
                ));
            }
        }
        (self.func)(env, args, pos).map_err(|e| e.with_pos(pos))
    }
}

fn internal_argument_error(name: &str) -> RuntimeError {
    RuntimeError::new(format!("Internal: unexpected argument for '{}'.", name))
}

fn builtin_print(env: &mut Environment, args: &[Value], _pos: Position) -> Result<Value, RuntimeError> {
    let Value::Str(text) = &args[0] else {
        return Err(internal_argument_error("print"));
    };
    let line = text.borrow().clone();
    env.write_line(&line)?;
    Ok(Value::Null)
}

fn builtin_input(env: &mut Environment, _args: &[Value], _pos: Position) -> Result<Value, RuntimeError> {
    Ok(Value::string(env.read_line()?))
}

fn builtin_stoi(_env: &mut Environment, args: &[Value], _pos: Position) -> Result<Value, RuntimeError> {
    let Value::Str(text) = &args[0] else {
        return Err(internal_argument_error("stoi"));
    };
    let text = text.borrow();
    text.trim()
        .parse::<i64>()
        .map(Value::int)
        .map_err(|_| RuntimeError::new(format!("Cannot convert string '{}' to int.", text)))
}

fn builtin_itos(_env: &mut Environment, args: &[Value], _pos: Position) -> Result<Value, RuntimeError> {
    let Value::Int(v) = &args[0] else {
        return Err(internal_argument_error("itos"));
    };
    Ok(Value::string(v.get().to_string()))
}

fn builtin_stof(_env: &mut Environment, args: &[Value], _pos: Position) -> Result<Value, RuntimeError> {
    let Value::Str(text) = &args[0] else {
        return Err(internal_argument_error("stof"));
    };
    let text = text.borrow();
    text.trim()
        .parse::<f64>()
        .map(Value::float)
        .map_err(|_| RuntimeError::new(format!("Cannot convert string '{}' to float.", text)))
}

fn builtin_ftos(_env: &mut Environment, args: &[Value], _pos: Position) -> Result<Value, RuntimeError> {
    let Value::Float(v) = &args[0] else {
        return Err(internal_argument_error("ftos"));
    };
    let x = v.get();
    // Whole floats keep a trailing ".0" so they read as floats.
    let text = if x.fract() == 0.0 && x.is_finite() {
        format!("{:.1}", x)
    } else {
        format!("{}", x)
    };
    Ok(Value::string(text))
}

fn builtin_itof(_env: &mut Environment, args: &[Value], _pos: Position) -> Result<Value, RuntimeError> {
    let Value::Int(v) = &args[0] else {
        return Err(internal_argument_error("itof"));
    };
    Ok(Value::float(v.get() as f64))
}

fn builtin_ftoi(_env: &mut Environment, args: &[Value], _pos: Position) -> Result<Value, RuntimeError> {
    let Value::Float(v) = &args[0] else {
        return Err(internal_argument_error("ftoi"));
    };
    // Truncation toward zero, like an int cast.
    Ok(Value::int(v.get() as i64))
}

fn builtin_btos(_env: &mut Environment, args: &[Value], _pos: Position) -> Result<Value, RuntimeError> {
    let Value::Bool(v) = &args[0] else {
        return Err(internal_argument_error("btos"));
    };
    Ok(Value::string(if v.get() { "true" } else { "false" }))
}

/// Downcast: views an audio value as a plain file with the same identity.
fn builtin_atof(_env: &mut Environment, args: &[Value], _pos: Position) -> Result<Value, RuntimeError> {
    let Value::Audio(rc) = &args[0] else {
        return Err(internal_argument_error("atof"));
    };
    let state = rc.borrow();
    Ok(Value::File(Rc::new(RefCell::new(FileState {
        path: state.file.path.clone(),
        parent: state.file.parent.clone(),
        deleted: state.file.deleted,
    }))))
}

/// Upcast attempt: decodes the file as audio; yields null when the file
/// is gone or the decode fails.
fn builtin_ftoa(env: &mut Environment, args: &[Value], pos: Position) -> Result<Value, RuntimeError> {
    let (path, parent, deleted) = match &args[0] {
        Value::File(rc) => {
            let state = rc.borrow();
            (state.path.clone(), state.parent.clone(), state.deleted)
        }
        Value::Audio(rc) => {
            let state = rc.borrow();
            (
                state.file.path.clone(),
                state.file.parent.clone(),
                state.file.deleted,
            )
        }
        _ => return Err(internal_argument_error("ftoa")),
    };
    if deleted {
        return Err(RuntimeError::at(
            format!(
                "File '{}' has been deleted.",
                path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default()
            ),
            pos,
        ));
    }
    if !env.fs.is_file(&path) {
        return Ok(Value::Null);
    }
    match env.audio.decode(&path) {
        Ok(clip) => Ok(objects::audio_from_clip(path, parent, &clip)),
        Err(_) => Ok(Value::Null),
    }
}
