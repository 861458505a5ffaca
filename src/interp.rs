use std::io::Write;
use std::rc::Rc;

use crate::ast::{
    BinaryOp, Block, Expr, FunctionDef, LogicalOp, ObjectKind, Program, SimpleType, Stmt, TypeExpr,
};
use crate::audio::AudioBackend;
use crate::config::Config;
use crate::env::{Callable, Environment};
use crate::error::{Position, RuntimeError};
use crate::fs::FileSystem;
use crate::objects;
use crate::value::Value;

/// Result of executing a statement: either fall through to the next one
/// or unwind to the enclosing call with a return value.
#[derive(Debug)]
pub enum Flow {
    Normal,
    Return(Value),
}

pub struct Interpreter {
    env: Environment,
}

impl Interpreter {
    pub fn new(config: &Config) -> Self {
        Self {
            env: Environment::new(config),
        }
    }

    pub fn with_capabilities(
        config: &Config,
        fs: Rc<dyn FileSystem>,
        audio: Rc<dyn AudioBackend>,
    ) -> Self {
        Self {
            env: Environment::with_capabilities(config, fs, audio),
        }
    }

    pub fn set_input_data(&mut self, lines: Vec<String>) {
        self.env.set_input_data(lines);
    }

    pub fn set_output(&mut self, output: Box<dyn Write>) {
        self.env.set_output(output);
    }

    /// Printing wrapper: reports the first runtime error on stdout and
    /// yields `None`.
    pub fn interpret_program(&mut self, program: &Program) -> Option<Value> {
        match self.run_program(program) {
            Ok(value) => Some(value),
            Err(e) => {
                println!("{}", e);
                None
            }
        }
    }

    pub fn run_program(&mut self, program: &Program) -> Result<Value, RuntimeError> {
        for func in &program.functions {
            self.env.register_function(func)?;
        }
        for stmt in &program.statements {
            if let Flow::Return(_) = self.exec_stmt(stmt)? {
                return Err(RuntimeError::at(
                    "Return statement outside of function.",
                    stmt.span().start,
                ));
            }
        }
        Ok(Value::Null)
    }

    // --- Statements ---

    fn exec_block(&mut self, block: &Block) -> Result<Flow, RuntimeError> {
        self.env.current_context().enter_scope();
        let result = self.exec_statements(&block.statements);
        self.env.current_context().exit_scope();
        result
    }

    fn exec_statements(&mut self, statements: &[Stmt]) -> Result<Flow, RuntimeError> {
        for stmt in statements {
            if let Flow::Return(value) = self.exec_stmt(stmt)? {
                return Ok(Flow::Return(value));
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_stmt(&mut self, stmt: &Stmt) -> Result<Flow, RuntimeError> {
        match stmt {
            Stmt::VarDecl { name, value, span, .. } => {
                let value = self.eval(value)?;
                self.env.declare_variable(name, value, span.start)?;
                Ok(Flow::Normal)
            }
            Stmt::Assign { target, value, .. } => {
                let rhs = self.eval(value)?;
                match target {
                    Expr::Identifier { name, span } => {
                        self.env.assign_variable(name, &rhs, span.start)?;
                    }
                    Expr::MemberAccess { object, member, span } => {
                        let receiver = self.eval(object)?;
                        if receiver.is_null() {
                            return Err(RuntimeError::at(
                                format!("Attempted to access member '{}' on null object.", member),
                                object.span().start,
                            ));
                        }
                        objects::set_attribute(&receiver, member, &rhs, span.start)?;
                    }
                    _ => {
                        return Err(RuntimeError::at(
                            "Invalid left-hand side in assignment.",
                            target.span().start,
                        ));
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::If {
                condition,
                then_block,
                else_block,
                ..
            } => {
                if self.eval(condition)?.is_true() {
                    self.exec_block(then_block)
                } else if let Some(block) = else_block {
                    self.exec_block(block)
                } else {
                    Ok(Flow::Normal)
                }
            }
            Stmt::While {
                condition, body, ..
            } => {
                while self.eval(condition)?.is_true() {
                    if let Flow::Return(value) = self.exec_block(body)? {
                        return Ok(Flow::Return(value));
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.eval(expr)?,
                    None => Value::Null,
                };
                Ok(Flow::Return(value))
            }
            Stmt::Call { call, .. } | Stmt::Expression { expr: call, .. } => {
                self.eval(call)?;
                Ok(Flow::Normal)
            }
        }
    }

    // --- Expressions ---

    fn eval(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        match expr {
            Expr::IntLit { value, .. } => Ok(Value::int(*value)),
            Expr::FloatLit { value, .. } => Ok(Value::float(*value)),
            Expr::StringLit { value, .. } => Ok(Value::string(value.clone())),
            Expr::BoolLit { value, .. } => Ok(Value::bool(*value)),
            Expr::NullLit { .. } => Ok(Value::Null),
            Expr::Identifier { name, span } => self.env.get_variable(name, span.start),
            Expr::ListLit { elements, .. } => {
                let mut values = Vec::with_capacity(elements.len());
                for element in elements {
                    values.push(self.eval(element)?);
                }
                let element_type = crate::value::common_element_type(&values);
                Ok(Value::list(element_type, values))
            }
            Expr::Binary {
                op, left, right, span,
            } => {
                let lhs = self.eval(left)?;
                let rhs = self.eval(right)?;
                self.binary_op(*op, &lhs, &rhs, span.start)
            }
            Expr::Logical { op, left, right, .. } => {
                let lhs = self.eval(left)?;
                match op {
                    LogicalOp::And => {
                        if !lhs.is_true() {
                            return Ok(Value::bool(false));
                        }
                        let rhs = self.eval(right)?;
                        Ok(Value::bool(rhs.is_true()))
                    }
                    LogicalOp::Or => {
                        if lhs.is_true() {
                            return Ok(Value::bool(true));
                        }
                        let rhs = self.eval(right)?;
                        Ok(Value::bool(rhs.is_true()))
                    }
                }
            }
            Expr::UnaryMinus { operand, span } => {
                let value = self.eval(operand)?;
                match &value {
                    Value::Int(v) => Ok(Value::int(v.get().wrapping_neg())),
                    Value::Float(v) => Ok(Value::float(-v.get())),
                    other => Err(RuntimeError::at(
                        format!("Unary minus cannot be applied to type '{}'.", other.type_of()),
                        span.start,
                    )),
                }
            }
            Expr::Call { callee, args, span } => self.eval_call(callee, args, span.start),
            Expr::MemberAccess { object, member, span } => {
                let receiver = self.eval(object)?;
                if receiver.is_null() {
                    return Err(RuntimeError::at(
                        format!("Attempted to access member '{}' on null object.", member),
                        object.span().start,
                    ));
                }
                objects::get_attribute(&receiver, member, span.start, &*self.env.fs.clone())
            }
            Expr::Constructor { kind, args, span } => self.eval_constructor(*kind, args, span.start),
        }
    }

    fn eval_constructor(
        &mut self,
        kind: ObjectKind,
        args: &[Expr],
        pos: Position,
    ) -> Result<Value, RuntimeError> {
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.eval(arg)?);
        }
        if values.len() != 1 {
            return Err(RuntimeError::at(
                format!("Constructor '{}' expects 1 argument, got {}.", kind, values.len()),
                pos,
            ));
        }
        let Value::Str(path) = &values[0] else {
            return Err(RuntimeError::at(
                format!(
                    "Constructor '{}' expects a 'string' argument, got '{}'.",
                    kind,
                    values[0].type_of()
                ),
                pos,
            ));
        };
        let path = path.borrow().clone();
        let fs = self.env.fs.clone();
        let audio = self.env.audio.clone();
        match kind {
            ObjectKind::File => objects::construct_file(&path, pos, &*fs),
            ObjectKind::Folder => objects::construct_folder(&path, pos, &*fs),
            ObjectKind::Audio => objects::construct_audio(&path, pos, &*fs, &*audio),
        }
    }

    fn eval_call(
        &mut self,
        callee: &Expr,
        args: &[Expr],
        pos: Position,
    ) -> Result<Value, RuntimeError> {
        // Arguments evaluate before the callee resolves.
        let mut arg_values = Vec::with_capacity(args.len());
        for arg in args {
            arg_values.push(self.eval(arg)?);
        }

        match callee {
            Expr::MemberAccess { object, member, .. } => {
                let receiver = self.eval(object)?;
                if receiver.is_null() {
                    return Err(RuntimeError::at(
                        format!("Attempted to access member '{}' on null object.", member),
                        object.span().start,
                    ));
                }
                let fs = self.env.fs.clone();
                let audio = self.env.audio.clone();
                objects::call_method(&receiver, member, &arg_values, pos, &*fs, &*audio)
            }
            Expr::Identifier { name, span } => {
                match self.env.lookup_function(name, span.start)? {
                    Callable::Builtin(builtin) => builtin.call(&mut self.env, &arg_values, pos),
                    Callable::User(func) => self.call_user_function(&func, arg_values, pos),
                }
            }
            _ => Err(RuntimeError::at(
                "Cannot call this expression. Must be an identifier or member access.",
                callee.span().start,
            )),
        }
    }

    fn call_user_function(
        &mut self,
        func: &FunctionDef,
        args: Vec<Value>,
        pos: Position,
    ) -> Result<Value, RuntimeError> {
        if args.len() != func.params.len() {
            return Err(RuntimeError::at(
                format!(
                    "Function '{}' expected {} arguments, got {}.",
                    func.name,
                    func.params.len(),
                    args.len()
                ),
                pos,
            ));
        }

        self.env.push_call_context(&func.name, pos)?;
        let flow = (|| {
            for (param, arg) in func.params.iter().zip(args) {
                // Binding shares the argument's storage: scalars alias.
                self.env.declare_variable(&param.name, arg, param.span.start)?;
            }
            self.exec_block(&func.body)
        })();
        self.env.pop_call_context();
        let flow = flow?;

        let returns_void = matches!(
            func.return_type,
            TypeExpr::Simple {
                name: SimpleType::Void,
                ..
            }
        );

        match flow {
            Flow::Return(value) if returns_void => {
                if !value.is_null() {
                    return Err(RuntimeError::at(
                        format!("Void function '{}' cannot return a value.", func.name),
                        func.span.start,
                    ));
                }
                Ok(Value::Null)
            }
            Flow::Normal if returns_void => Ok(Value::Null),
            Flow::Normal => Err(RuntimeError::at(
                format!(
                    "Function '{}' must return a '{}'.",
                    func.name,
                    crate::types::Type::from_ast(&func.return_type)
                ),
                func.span.start,
            )),
            // Scalar returns get fresh storage so the caller never
            // aliases the callee's locals; objects return by reference.
            Flow::Return(value) => Ok(value.detached()),
        }
    }

    fn binary_op(
        &mut self,
        op: BinaryOp,
        left: &Value,
        right: &Value,
        pos: Position,
    ) -> Result<Value, RuntimeError> {
        use Value::{Bool, Float, Int, Str};

        if op == BinaryOp::Divide {
            let zero = match right {
                Int(v) => v.get() == 0,
                Float(v) => v.get() == 0.0,
                _ => false,
            };
            if zero {
                return Err(RuntimeError::at("Division by zero.", pos));
            }
        }

        let result = match (op, left, right) {
            (BinaryOp::Add, Int(a), Int(b)) => Some(Value::int(a.get().wrapping_add(b.get()))),
            (BinaryOp::Subtract, Int(a), Int(b)) => Some(Value::int(a.get().wrapping_sub(b.get()))),
            (BinaryOp::Multiply, Int(a), Int(b)) => Some(Value::int(a.get().wrapping_mul(b.get()))),
            (BinaryOp::Divide, Int(a), Int(b)) => Some(Value::int(floor_div(a.get(), b.get()))),

            (BinaryOp::Add, Str(a), Str(b)) => {
                Some(Value::string(format!("{}{}", a.borrow(), b.borrow())))
            }

            (BinaryOp::Equal, Int(a), Int(b)) => Some(Value::bool(a.get() == b.get())),
            (BinaryOp::NotEqual, Int(a), Int(b)) => Some(Value::bool(a.get() != b.get())),
            (BinaryOp::Less, Int(a), Int(b)) => Some(Value::bool(a.get() < b.get())),
            (BinaryOp::LessEqual, Int(a), Int(b)) => Some(Value::bool(a.get() <= b.get())),
            (BinaryOp::Greater, Int(a), Int(b)) => Some(Value::bool(a.get() > b.get())),
            (BinaryOp::GreaterEqual, Int(a), Int(b)) => Some(Value::bool(a.get() >= b.get())),

            (BinaryOp::Equal, Str(a), Str(b)) => Some(Value::bool(*a.borrow() == *b.borrow())),
            (BinaryOp::NotEqual, Str(a), Str(b)) => Some(Value::bool(*a.borrow() != *b.borrow())),

            (BinaryOp::Equal, Bool(a), Bool(b)) => Some(Value::bool(a.get() == b.get())),
            (BinaryOp::NotEqual, Bool(a), Bool(b)) => Some(Value::bool(a.get() != b.get())),

            _ => None,
        };
        if let Some(value) = result {
            return Ok(value);
        }

        // Mixed int/float arithmetic and comparison promote to float.
        if let (Some(a), Some(b)) = (numeric(left), numeric(right)) {
            let value = match op {
                BinaryOp::Add => Value::float(a + b),
                BinaryOp::Subtract => Value::float(a - b),
                BinaryOp::Multiply => Value::float(a * b),
                BinaryOp::Divide => Value::float(a / b),
                BinaryOp::Equal => Value::bool(a == b),
                BinaryOp::NotEqual => Value::bool(a != b),
                BinaryOp::Less => Value::bool(a < b),
                BinaryOp::LessEqual => Value::bool(a <= b),
                BinaryOp::Greater => Value::bool(a > b),
                BinaryOp::GreaterEqual => Value::bool(a >= b),
            };
            return Ok(value);
        }

        // Equality over objects, lists, and null is structural.
        if matches!(op, BinaryOp::Equal | BinaryOp::NotEqual) && (is_object(left) || is_object(right))
        {
            let equal = objects::objects_equal(left, right);
            return Ok(Value::bool(if op == BinaryOp::Equal {
                equal
            } else {
                !equal
            }));
        }

        Err(RuntimeError::at(
            format!(
                "Operator '{}' cannot be applied to types '{}' and '{}'.",
                op.symbol(),
                left.type_of(),
                right.type_of()
            ),
            pos,
        ))
    }
}

fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Int(v) => Some(v.get() as f64),
        Value::Float(v) => Some(v.get()),
        _ => None,
    }
}

fn is_object(value: &Value) -> bool {
    matches!(
        value,
        Value::File(_) | Value::Folder(_) | Value::Audio(_) | Value::List(_) | Value::Null
    )
}

/// Flooring integer division, so `-7 / 2 == -4`.
fn floor_div(a: i64, b: i64) -> i64 {
    let q = a.wrapping_div(b);
    let r = a.wrapping_rem(b);
    if r != 0 && (r < 0) != (b < 0) {
        q - 1
    } else {
        q
    }
}
