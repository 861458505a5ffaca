use std::fmt;

use crate::error::Span;

#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub functions: Vec<FunctionDef>,
    pub statements: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub return_type: TypeExpr,
    pub name: String,
    pub params: Vec<Param>,
    pub body: Block,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub param_type: TypeExpr,
    pub name: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub statements: Vec<Stmt>,
    pub span: Span,
}

/// A type as written in source, before checking.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpr {
    Simple { name: SimpleType, span: Span },
    List { element: Box<TypeExpr>, span: Span },
}

impl TypeExpr {
    pub fn span(&self) -> Span {
        match self {
            TypeExpr::Simple { span, .. } | TypeExpr::List { span, .. } => *span,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimpleType {
    Int,
    Float,
    Bool,
    Str,
    Void,
    File,
    Folder,
    Audio,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    VarDecl {
        var_type: TypeExpr,
        name: String,
        value: Expr,
        span: Span,
    },
    Assign {
        target: Expr,
        value: Expr,
        span: Span,
    },
    If {
        condition: Expr,
        then_block: Block,
        else_block: Option<Block>,
        span: Span,
    },
    While {
        condition: Expr,
        body: Block,
        span: Span,
    },
    Return {
        value: Option<Expr>,
        span: Span,
    },
    /// A call whose value is discarded, e.g. `f.delete();`
    Call {
        call: Expr,
        span: Span,
    },
    Expression {
        expr: Expr,
        span: Span,
    },
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::VarDecl { span, .. }
            | Stmt::Assign { span, .. }
            | Stmt::If { span, .. }
            | Stmt::While { span, .. }
            | Stmt::Return { span, .. }
            | Stmt::Call { span, .. }
            | Stmt::Expression { span, .. } => *span,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    IntLit {
        value: i64,
        span: Span,
    },
    FloatLit {
        value: f64,
        span: Span,
    },
    StringLit {
        value: String,
        span: Span,
    },
    BoolLit {
        value: bool,
        span: Span,
    },
    NullLit {
        span: Span,
    },
    Identifier {
        name: String,
        span: Span,
    },
    ListLit {
        elements: Vec<Expr>,
        span: Span,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
        span: Span,
    },
    Logical {
        op: LogicalOp,
        left: Box<Expr>,
        right: Box<Expr>,
        span: Span,
    },
    UnaryMinus {
        operand: Box<Expr>,
        span: Span,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
        span: Span,
    },
    MemberAccess {
        object: Box<Expr>,
        member: String,
        span: Span,
    },
    Constructor {
        kind: ObjectKind,
        args: Vec<Expr>,
        span: Span,
    },
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::IntLit { span, .. }
            | Expr::FloatLit { span, .. }
            | Expr::StringLit { span, .. }
            | Expr::BoolLit { span, .. }
            | Expr::NullLit { span }
            | Expr::Identifier { span, .. }
            | Expr::ListLit { span, .. }
            | Expr::Binary { span, .. }
            | Expr::Logical { span, .. }
            | Expr::UnaryMinus { span, .. }
            | Expr::Call { span, .. }
            | Expr::MemberAccess { span, .. }
            | Expr::Constructor { span, .. } => *span,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    File,
    Folder,
    Audio,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            ObjectKind::File => "File",
            ObjectKind::Folder => "Folder",
            ObjectKind::Audio => "Audio",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::Less => "<",
            BinaryOp::LessEqual => "<=",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterEqual => ">=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

impl LogicalOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            LogicalOp::And => "&&",
            LogicalOp::Or => "||",
        }
    }
}

/// Indented textual rendering of a program, used by the parse-only mode.
pub fn pretty_print(program: &Program) -> String {
    let mut out = String::new();
    out.push_str("Program\n");
    for func in &program.functions {
        print_function(func, 1, &mut out);
    }
    for stmt in &program.statements {
        print_stmt(stmt, 1, &mut out);
    }
    out
}

fn indent(depth: usize, out: &mut String) {
    for _ in 0..depth {
        out.push_str("  ");
    }
}

fn type_name(ty: &TypeExpr) -> String {
    match ty {
        TypeExpr::Simple { name, .. } => match name {
            SimpleType::Int => "int".into(),
            SimpleType::Float => "float".into(),
            SimpleType::Bool => "bool".into(),
            SimpleType::Str => "string".into(),
            SimpleType::Void => "void".into(),
            SimpleType::File => "File".into(),
            SimpleType::Folder => "Folder".into(),
            SimpleType::Audio => "Audio".into(),
        },
        TypeExpr::List { element, .. } => format!("List<{}>", type_name(element)),
    }
}

fn print_function(func: &FunctionDef, depth: usize, out: &mut String) {
    indent(depth, out);
    let params: Vec<String> = func
        .params
        .iter()
        .map(|p| format!("{} {}", type_name(&p.param_type), p.name))
        .collect();
    out.push_str(&format!(
        "FunctionDef {} {}({})\n",
        type_name(&func.return_type),
        func.name,
        params.join(", ")
    ));
    for stmt in &func.body.statements {
        print_stmt(stmt, depth + 1, out);
    }
}

fn print_stmt(stmt: &Stmt, depth: usize, out: &mut String) {
    indent(depth, out);
    match stmt {
        Stmt::VarDecl {
            var_type,
            name,
            value,
            ..
        } => {
            out.push_str(&format!("VarDecl {} {}\n", type_name(var_type), name));
            print_expr(value, depth + 1, out);
        }
        Stmt::Assign { target, value, .. } => {
            out.push_str("Assign\n");
            print_expr(target, depth + 1, out);
            print_expr(value, depth + 1, out);
        }
        Stmt::If {
            condition,
            then_block,
            else_block,
            ..
        } => {
            out.push_str("If\n");
            print_expr(condition, depth + 1, out);
            indent(depth + 1, out);
            out.push_str("Then\n");
            for s in &then_block.statements {
                print_stmt(s, depth + 2, out);
            }
            if let Some(block) = else_block {
                indent(depth + 1, out);
                out.push_str("Else\n");
                for s in &block.statements {
                    print_stmt(s, depth + 2, out);
                }
            }
        }
        Stmt::While {
            condition, body, ..
        } => {
            out.push_str("While\n");
            print_expr(condition, depth + 1, out);
            for s in &body.statements {
                print_stmt(s, depth + 1, out);
            }
        }
        Stmt::Return { value, .. } => {
            out.push_str("Return\n");
            if let Some(expr) = value {
                print_expr(expr, depth + 1, out);
            }
        }
        Stmt::Call { call, .. } => {
            out.push_str("CallStatement\n");
            print_expr(call, depth + 1, out);
        }
        Stmt::Expression { expr, .. } => {
            out.push_str("ExpressionStatement\n");
            print_expr(expr, depth + 1, out);
        }
    }
}

fn print_expr(expr: &Expr, depth: usize, out: &mut String) {
    indent(depth, out);
    match expr {
        Expr::IntLit { value, .. } => out.push_str(&format!("Int {}\n", value)),
        Expr::FloatLit { value, .. } => out.push_str(&format!("Float {}\n", value)),
        Expr::StringLit { value, .. } => out.push_str(&format!("String {:?}\n", value)),
        Expr::BoolLit { value, .. } => out.push_str(&format!("Bool {}\n", value)),
        Expr::NullLit { .. } => out.push_str("Null\n"),
        Expr::Identifier { name, .. } => out.push_str(&format!("Identifier {}\n", name)),
        Expr::ListLit { elements, .. } => {
            out.push_str("ListLiteral\n");
            for e in elements {
                print_expr(e, depth + 1, out);
            }
        }
        Expr::Binary {
            op, left, right, ..
        } => {
            out.push_str(&format!("Binary {}\n", op.symbol()));
            print_expr(left, depth + 1, out);
            print_expr(right, depth + 1, out);
        }
        Expr::Logical {
            op, left, right, ..
        } => {
            out.push_str(&format!("Logical {}\n", op.symbol()));
            print_expr(left, depth + 1, out);
            print_expr(right, depth + 1, out);
        }
        Expr::UnaryMinus { operand, .. } => {
            out.push_str("UnaryMinus\n");
            print_expr(operand, depth + 1, out);
        }
        Expr::Call { callee, args, .. } => {
            out.push_str("Call\n");
            print_expr(callee, depth + 1, out);
            for arg in args {
                print_expr(arg, depth + 1, out);
            }
        }
        Expr::MemberAccess { object, member, .. } => {
            out.push_str(&format!("MemberAccess .{}\n", member));
            print_expr(object, depth + 1, out);
        }
        Expr::Constructor { kind, args, .. } => {
            out.push_str(&format!("Constructor {}\n", kind));
            for arg in args {
                print_expr(arg, depth + 1, out);
            }
        }
    }
}
