use std::collections::HashMap;
use std::fmt;

use crate::ast::{
    BinaryOp, Block, Expr, FunctionDef, LogicalOp, ObjectKind, Program, SimpleType, Stmt, TypeExpr,
};
use crate::error::{Position, TypeError};

/// The closed set of static types. `Null` is the type of the `null`
/// literal; it never appears as a declared type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    Int,
    Float,
    Bool,
    Str,
    Void,
    Null,
    File,
    Folder,
    Audio,
    List(Box<Type>),
}

impl Type {
    pub fn from_ast(ty: &TypeExpr) -> Type {
        match ty {
            TypeExpr::Simple { name, .. } => match name {
                SimpleType::Int => Type::Int,
                SimpleType::Float => Type::Float,
                SimpleType::Bool => Type::Bool,
                SimpleType::Str => Type::Str,
                SimpleType::Void => Type::Void,
                SimpleType::File => Type::File,
                SimpleType::Folder => Type::Folder,
                SimpleType::Audio => Type::Audio,
            },
            TypeExpr::List { element, .. } => Type::List(Box::new(Type::from_ast(element))),
        }
    }

    /// Directional compatibility: can a value of type `other` be used
    /// where `self` is expected?
    ///
    /// - identical types match, lists recursively (so `List<File>`
    ///   accepts `List<Audio>`),
    /// - `File` accepts `Audio`,
    /// - the nullable types (objects, lists, strings) and `void` accept
    ///   `null`.
    pub fn accepts(&self, other: &Type) -> bool {
        match (self, other) {
            (Type::List(a), Type::List(b)) => a.accepts(b),
            _ if self == other => true,
            (Type::File, Type::Audio) => true,
            (Type::Void, Type::Null) => true,
            (Type::File | Type::Folder | Type::Audio | Type::List(_) | Type::Str, Type::Null) => {
                true
            }
            _ => false,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Type::Null)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Type::Int => write!(f, "int"),
            Type::Float => write!(f, "float"),
            Type::Bool => write!(f, "bool"),
            Type::Str => write!(f, "string"),
            Type::Void => write!(f, "void"),
            Type::Null => write!(f, "null"),
            Type::File => write!(f, "File"),
            Type::Folder => write!(f, "Folder"),
            Type::Audio => write!(f, "Audio"),
            Type::List(element) => write!(f, "List<{}>", element),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FnSig {
    pub params: Vec<Type>,
    pub ret: Type,
}

impl FnSig {
    pub fn new(params: Vec<Type>, ret: Type) -> Self {
        Self { params, ret }
    }
}

/// Signatures of the free builtin functions.
pub fn builtin_function_sig(name: &str) -> Option<FnSig> {
    let sig = match name {
        "print" => FnSig::new(vec![Type::Str], Type::Void),
        "input" => FnSig::new(vec![], Type::Str),
        "stoi" => FnSig::new(vec![Type::Str], Type::Int),
        "itos" => FnSig::new(vec![Type::Int], Type::Str),
        "stof" => FnSig::new(vec![Type::Str], Type::Float),
        "ftos" => FnSig::new(vec![Type::Float], Type::Str),
        "itof" => FnSig::new(vec![Type::Int], Type::Float),
        "ftoi" => FnSig::new(vec![Type::Float], Type::Int),
        "btos" => FnSig::new(vec![Type::Bool], Type::Str),
        "atof" => FnSig::new(vec![Type::Audio], Type::File),
        "ftoa" => FnSig::new(vec![Type::File], Type::Audio),
        _ => return None,
    };
    Some(sig)
}

pub const BUILTIN_FUNCTION_NAMES: &[&str] = &[
    "print", "input", "stoi", "itos", "stof", "ftos", "itof", "ftoi", "btos", "atof", "ftoa",
];

/// Static property table for the builtin object types. Audio falls back
/// to the File properties.
pub fn builtin_property_type(object: &Type, name: &str) -> Option<Type> {
    match object {
        Type::File => match name {
            "filename" => Some(Type::Str),
            "parent" => Some(Type::Folder),
            _ => None,
        },
        Type::Folder => match name {
            "is_root" => Some(Type::Bool),
            "files" => Some(Type::List(Box::new(Type::File))),
            "subfolders" => Some(Type::List(Box::new(Type::Folder))),
            _ => None,
        },
        Type::Audio => match name {
            "length" => Some(Type::Int),
            "bitrate" => Some(Type::Int),
            "title" => Some(Type::Str),
            _ => builtin_property_type(&Type::File, name),
        },
        _ => None,
    }
}

/// Static method table for the builtin object types. `List.get` returns
/// the element type of the receiver; Audio falls back to File methods.
pub fn builtin_method_sig(object: &Type, name: &str) -> Option<FnSig> {
    match object {
        Type::List(element) => match name {
            "get" => Some(FnSig::new(vec![Type::Int], (**element).clone())),
            "len" => Some(FnSig::new(vec![], Type::Int)),
            _ => None,
        },
        Type::File => match name {
            "get_filename" => Some(FnSig::new(vec![], Type::Str)),
            "change_filename" => Some(FnSig::new(vec![Type::Str], Type::Void)),
            "move" => Some(FnSig::new(vec![Type::Folder], Type::Void)),
            "delete" => Some(FnSig::new(vec![], Type::Void)),
            _ => None,
        },
        Type::Folder => match name {
            "get_file" => Some(FnSig::new(vec![Type::Str], Type::File)),
            "add_file" => Some(FnSig::new(vec![Type::File], Type::Void)),
            "remove_file" => Some(FnSig::new(vec![Type::Str], Type::Void)),
            "list_files" => Some(FnSig::new(vec![], Type::List(Box::new(Type::File)))),
            "list_subfolders" => Some(FnSig::new(vec![], Type::List(Box::new(Type::Folder)))),
            "list_audio" => Some(FnSig::new(vec![], Type::List(Box::new(Type::Audio)))),
            "get_subfolder" => Some(FnSig::new(vec![Type::Str], Type::Folder)),
            "get_name" => Some(FnSig::new(vec![], Type::Str)),
            _ => None,
        },
        Type::Audio => match name {
            "cut" => Some(FnSig::new(vec![Type::Int, Type::Int], Type::Void)),
            "concat" => Some(FnSig::new(vec![Type::Audio], Type::Void)),
            "change_title" => Some(FnSig::new(vec![Type::Str], Type::Void)),
            "change_format" => Some(FnSig::new(vec![Type::Str], Type::Void)),
            "change_volume" => Some(FnSig::new(vec![Type::Float], Type::Void)),
            _ => builtin_method_sig(&Type::File, name),
        },
        _ => None,
    }
}

/// Static analysis pass. Walks the whole program once; the first
/// mismatch aborts the check.
pub struct TypeChecker {
    scopes: Vec<HashMap<String, Type>>,
    functions: HashMap<String, FnSig>,
    current_return: Option<Type>,
}

impl Default for TypeChecker {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeChecker {
    pub fn new() -> Self {
        let mut functions = HashMap::new();
        for name in BUILTIN_FUNCTION_NAMES {
            if let Some(sig) = builtin_function_sig(name) {
                functions.insert(name.to_string(), sig);
            }
        }
        Self {
            scopes: vec![HashMap::new()],
            functions,
            current_return: None,
        }
    }

    /// Printing wrapper: reports the first error on stdout, if any.
    pub fn check(&mut self, program: &Program) -> bool {
        match self.check_program(program) {
            Ok(()) => true,
            Err(e) => {
                println!("{}", e);
                false
            }
        }
    }

    pub fn check_program(&mut self, program: &Program) -> Result<(), TypeError> {
        for func in &program.functions {
            let sig = FnSig::new(
                func.params
                    .iter()
                    .map(|p| Type::from_ast(&p.param_type))
                    .collect(),
                Type::from_ast(&func.return_type),
            );
            if self.functions.contains_key(&func.name) {
                return Err(TypeError::new(
                    format!("Function '{}' already defined.", func.name),
                    func.span.start,
                ));
            }
            self.functions.insert(func.name.clone(), sig);
        }

        for func in &program.functions {
            self.check_function(func)?;
        }

        for stmt in &program.statements {
            self.check_stmt(stmt)?;
        }
        Ok(())
    }

    fn check_function(&mut self, func: &FunctionDef) -> Result<(), TypeError> {
        let previous_return = self.current_return.take();
        self.current_return = Some(Type::from_ast(&func.return_type));

        self.enter_scope();
        for param in &func.params {
            self.declare(
                &param.name,
                Type::from_ast(&param.param_type),
                param.span.start,
            )?;
        }
        let result = self.check_block(&func.body);
        self.exit_scope();

        self.current_return = previous_return;
        result
    }

    fn check_block(&mut self, block: &Block) -> Result<(), TypeError> {
        self.enter_scope();
        let result = block.statements.iter().try_for_each(|s| self.check_stmt(s));
        self.exit_scope();
        result
    }

    fn check_stmt(&mut self, stmt: &Stmt) -> Result<(), TypeError> {
        match stmt {
            Stmt::VarDecl {
                var_type,
                name,
                value,
                ..
            } => {
                let declared = Type::from_ast(var_type);
                let actual = self.type_of(value)?;
                if !declared.accepts(&actual) {
                    return Err(TypeError::new(
                        format!(
                            "Cannot assign expression of type '{}' to variable '{}' of type '{}'.",
                            actual, name, declared
                        ),
                        value.span().start,
                    ));
                }
                self.declare(name, declared, stmt.span().start)
            }
            Stmt::Assign { target, value, .. } => {
                let target_type = match target {
                    Expr::Identifier { name, span } => self
                        .lookup(name)
                        .ok_or_else(|| {
                            TypeError::new(
                                format!("Undeclared variable '{}' referenced.", name),
                                span.start,
                            )
                        })?
                        .clone(),
                    _ => self.type_of(target)?,
                };
                let actual = self.type_of(value)?;
                if !target_type.accepts(&actual) {
                    return Err(TypeError::new(
                        format!(
                            "Cannot assign expression of type '{}' to target of type '{}'.",
                            actual, target_type
                        ),
                        value.span().start,
                    ));
                }
                Ok(())
            }
            Stmt::If {
                condition,
                then_block,
                else_block,
                ..
            } => {
                let cond = self.type_of(condition)?;
                if !Type::Bool.accepts(&cond) {
                    return Err(TypeError::new(
                        format!(
                            "If statement condition must be of type 'bool', got '{}'.",
                            cond
                        ),
                        condition.span().start,
                    ));
                }
                self.check_block(then_block)?;
                if let Some(block) = else_block {
                    self.check_block(block)?;
                }
                Ok(())
            }
            Stmt::While {
                condition, body, ..
            } => {
                let cond = self.type_of(condition)?;
                if !Type::Bool.accepts(&cond) {
                    return Err(TypeError::new(
                        format!(
                            "While loop condition must be of type 'bool', got '{}'.",
                            cond
                        ),
                        condition.span().start,
                    ));
                }
                self.check_block(body)
            }
            Stmt::Return { value, span } => {
                let Some(expected) = self.current_return.clone() else {
                    return Err(TypeError::new(
                        "Return statement used outside of a function.",
                        span.start,
                    ));
                };
                let actual = match value {
                    Some(expr) => self.type_of(expr)?,
                    None => Type::Void,
                };
                if !expected.accepts(&actual) {
                    return Err(TypeError::new(
                        format!(
                            "Function declared to return '{}', but attempting to return '{}'.",
                            expected, actual
                        ),
                        span.start,
                    ));
                }
                Ok(())
            }
            Stmt::Call { call, .. } => {
                self.type_of(call)?;
                Ok(())
            }
            Stmt::Expression { expr, .. } => {
                self.type_of(expr)?;
                Ok(())
            }
        }
    }

    fn type_of(&mut self, expr: &Expr) -> Result<Type, TypeError> {
        match expr {
            Expr::IntLit { .. } => Ok(Type::Int),
            Expr::FloatLit { .. } => Ok(Type::Float),
            Expr::StringLit { .. } => Ok(Type::Str),
            Expr::BoolLit { .. } => Ok(Type::Bool),
            Expr::NullLit { .. } => Ok(Type::Null),
            Expr::Identifier { name, span } => self.lookup(name).cloned().ok_or_else(|| {
                TypeError::new(format!("Undeclared identifier '{}'.", name), span.start)
            }),
            Expr::ListLit { elements, .. } => self.list_literal_type(elements),
            Expr::Binary {
                op, left, right, ..
            } => self.binary_type(*op, left, right, expr.span().start),
            Expr::Logical {
                op, left, right, ..
            } => self.logical_type(*op, left, right),
            Expr::UnaryMinus { operand, span } => {
                let ty = self.type_of(operand)?;
                match ty {
                    Type::Int => Ok(Type::Int),
                    Type::Float => Ok(Type::Float),
                    _ => Err(TypeError::new(
                        format!("Unary minus cannot be applied to type '{}'.", ty),
                        span.start,
                    )),
                }
            }
            Expr::Call { callee, args, span } => self.call_type(callee, args, span.start),
            Expr::MemberAccess { object, member, span } => {
                let obj_type = self.type_of(object)?;
                if obj_type.is_null() {
                    return Err(TypeError::new(
                        format!("Attempted to access member '{}' on a null object.", member),
                        object.span().start,
                    ));
                }
                builtin_property_type(&obj_type, member).ok_or_else(|| {
                    TypeError::new(
                        format!(
                            "Type '{}' has no accessible property '{}'.",
                            obj_type, member
                        ),
                        span.start,
                    )
                })
            }
            Expr::Constructor { kind, args, span } => {
                if args.len() != 1 {
                    return Err(TypeError::new(
                        format!("Constructor '{}' expects 1 argument, got {}.", kind, args.len()),
                        span.start,
                    ));
                }
                let arg_type = self.type_of(&args[0])?;
                if !Type::Str.accepts(&arg_type) {
                    return Err(TypeError::new(
                        format!(
                            "Constructor '{}' expects a 'string' argument, got '{}'.",
                            kind, arg_type
                        ),
                        args[0].span().start,
                    ));
                }
                Ok(match kind {
                    ObjectKind::File => Type::File,
                    ObjectKind::Folder => Type::Folder,
                    ObjectKind::Audio => Type::Audio,
                })
            }
        }
    }

    /// Element type of a list literal: starts from the first element and
    /// widens toward any later element whose type accepts the current
    /// inference (`[audio, file]` becomes `List<File>`).
    fn list_literal_type(&mut self, elements: &[Expr]) -> Result<Type, TypeError> {
        let Some(first) = elements.first() else {
            return Ok(Type::List(Box::new(Type::Null)));
        };
        let mut inferred = self.type_of(first)?;
        for (i, element) in elements.iter().enumerate().skip(1) {
            let current = self.type_of(element)?;
            if !inferred.accepts(&current) && !current.accepts(&inferred) {
                return Err(TypeError::new(
                    format!(
                        "List literal elements must be of compatible types. \
                         Element {} has type '{}', expected compatible with '{}'.",
                        i + 1,
                        current,
                        inferred
                    ),
                    element.span().start,
                ));
            }
            if current.accepts(&inferred) && !inferred.accepts(&current) {
                inferred = current;
            }
        }
        Ok(Type::List(Box::new(inferred)))
    }

    fn binary_type(
        &mut self,
        op: BinaryOp,
        left: &Expr,
        right: &Expr,
        pos: Position,
    ) -> Result<Type, TypeError> {
        let lt = self.type_of(left)?;
        let rt = self.type_of(right)?;

        match op {
            BinaryOp::Add
            | BinaryOp::Subtract
            | BinaryOp::Multiply
            | BinaryOp::Divide => {
                if lt == Type::Int && rt == Type::Int {
                    return Ok(Type::Int);
                }
                if lt == Type::Float && rt == Type::Float {
                    return Ok(Type::Float);
                }
                if op == BinaryOp::Add && lt == Type::Str && rt == Type::Str {
                    return Ok(Type::Str);
                }
                Err(TypeError::new(
                    format!(
                        "Operator '{}' not defined for types '{}' and '{}'.",
                        op.symbol(),
                        lt,
                        rt
                    ),
                    pos,
                ))
            }
            BinaryOp::Equal
            | BinaryOp::NotEqual
            | BinaryOp::Less
            | BinaryOp::LessEqual
            | BinaryOp::Greater
            | BinaryOp::GreaterEqual => {
                let same_scalar = matches!(
                    (&lt, &rt),
                    (Type::Int, Type::Int)
                        | (Type::Float, Type::Float)
                        | (Type::Str, Type::Str)
                        | (Type::Bool, Type::Bool)
                );
                if same_scalar {
                    return Ok(Type::Bool);
                }
                // Equality may compare any two compatible types, which
                // covers object-with-null and File-with-Audio.
                if matches!(op, BinaryOp::Equal | BinaryOp::NotEqual)
                    && (lt.accepts(&rt) || rt.accepts(&lt))
                {
                    return Ok(Type::Bool);
                }
                Err(TypeError::new(
                    format!(
                        "Operator '{}' not defined for types '{}' and '{}'.",
                        op.symbol(),
                        lt,
                        rt
                    ),
                    pos,
                ))
            }
        }
    }

    fn logical_type(
        &mut self,
        op: LogicalOp,
        left: &Expr,
        right: &Expr,
    ) -> Result<Type, TypeError> {
        let lt = self.type_of(left)?;
        if !Type::Bool.accepts(&lt) {
            return Err(TypeError::new(
                format!(
                    "Left operand of '{}' must be 'bool', got '{}'.",
                    op.symbol(),
                    lt
                ),
                left.span().start,
            ));
        }
        let rt = self.type_of(right)?;
        if !Type::Bool.accepts(&rt) {
            return Err(TypeError::new(
                format!(
                    "Right operand of '{}' must be 'bool', got '{}'.",
                    op.symbol(),
                    rt
                ),
                right.span().start,
            ));
        }
        Ok(Type::Bool)
    }

    fn call_type(
        &mut self,
        callee: &Expr,
        args: &[Expr],
        pos: Position,
    ) -> Result<Type, TypeError> {
        let (sig, name) = match callee {
            Expr::MemberAccess { object, member, span } => {
                let obj_type = self.type_of(object)?;
                if obj_type.is_null() {
                    return Err(TypeError::new(
                        format!("Attempted to call method '{}' on a null object.", member),
                        object.span().start,
                    ));
                }
                let sig = builtin_method_sig(&obj_type, member).ok_or_else(|| {
                    TypeError::new(
                        format!("Type '{}' has no method '{}'.", obj_type, member),
                        span.start,
                    )
                })?;
                (sig, member.clone())
            }
            Expr::Identifier { name, span } => {
                let sig = self.functions.get(name).cloned().ok_or_else(|| {
                    TypeError::new(format!("Undefined function '{}' called.", name), span.start)
                })?;
                (sig, name.clone())
            }
            _ => {
                return Err(TypeError::new(
                    "Cannot call this expression. Must be an identifier or member access.",
                    callee.span().start,
                ));
            }
        };

        if args.len() != sig.params.len() {
            return Err(TypeError::new(
                format!(
                    "Function/method '{}' expected {} arguments, but got {}.",
                    name,
                    sig.params.len(),
                    args.len()
                ),
                pos,
            ));
        }

        for (i, (arg, expected)) in args.iter().zip(sig.params.iter()).enumerate() {
            let actual = self.type_of(arg)?;
            if !expected.accepts(&actual) {
                return Err(TypeError::new(
                    format!(
                        "Argument {} for function/method '{}': expected type '{}', got '{}'.",
                        i + 1,
                        name,
                        expected,
                        actual
                    ),
                    arg.span().start,
                ));
            }
        }

        Ok(sig.ret)
    }

    // --- Scope helpers ---

    fn enter_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    fn exit_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    fn declare(&mut self, name: &str, ty: Type, pos: Position) -> Result<(), TypeError> {
        let scope = match self.scopes.last_mut() {
            Some(scope) => scope,
            None => return Ok(()),
        };
        if scope.contains_key(name) {
            return Err(TypeError::new(
                format!("Variable '{}' already declared in this scope.", name),
                pos,
            ));
        }
        scope.insert(name.to_string(), ty);
        Ok(())
    }

    fn lookup(&self, name: &str) -> Option<&Type> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }
}
