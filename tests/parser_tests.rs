mod common;

use audiolang::ast::{BinaryOp, Expr, ObjectKind, Stmt, TypeExpr};

use common::parse;

#[test]
fn variable_declaration() {
    let program = parse("int x = 10;").unwrap();
    assert_eq!(program.statements.len(), 1);
    let Stmt::VarDecl { name, value, .. } = &program.statements[0] else {
        panic!("expected a declaration");
    };
    assert_eq!(name, "x");
    assert!(matches!(value, Expr::IntLit { value: 10, .. }));
}

#[test]
fn list_type_declaration() {
    let program = parse("List<List<int>> xs = [];").unwrap();
    let Stmt::VarDecl { var_type, .. } = &program.statements[0] else {
        panic!("expected a declaration");
    };
    let TypeExpr::List { element, .. } = var_type else {
        panic!("expected a list type");
    };
    assert!(matches!(**element, TypeExpr::List { .. }));
}

#[test]
fn constructor_is_not_a_declaration() {
    // A type keyword followed by `(` is a constructor expression.
    let program = parse("File f = File(\"a.txt\");").unwrap();
    let Stmt::VarDecl { value, .. } = &program.statements[0] else {
        panic!("expected a declaration");
    };
    assert!(matches!(
        value,
        Expr::Constructor {
            kind: ObjectKind::File,
            ..
        }
    ));
}

#[test]
fn function_definition_with_params() {
    let program = parse("func int add(int a, int b) { return a + b; }").unwrap();
    assert_eq!(program.functions.len(), 1);
    let func = &program.functions[0];
    assert_eq!(func.name, "add");
    assert_eq!(func.params.len(), 2);
    assert_eq!(func.body.statements.len(), 1);
}

#[test]
fn functions_and_statements_can_interleave() {
    let program = parse("int x = 1; func void f() { } x = 2;").unwrap();
    assert_eq!(program.functions.len(), 1);
    assert_eq!(program.statements.len(), 2);
}

#[test]
fn precedence_multiplication_over_addition() {
    let program = parse("int x = 1 + 2 * 3;").unwrap();
    let Stmt::VarDecl { value, .. } = &program.statements[0] else {
        panic!("expected a declaration");
    };
    let Expr::Binary { op, right, .. } = value else {
        panic!("expected a binary expression");
    };
    assert_eq!(*op, BinaryOp::Add);
    assert!(matches!(
        **right,
        Expr::Binary {
            op: BinaryOp::Multiply,
            ..
        }
    ));
}

#[test]
fn comparisons_do_not_chain() {
    assert!(parse("bool b = 1 < 2 < 3;").is_err());
}

#[test]
fn postfix_chain() {
    let program = parse("folder.get_file(\"a\").delete();").unwrap();
    let Stmt::Call { call, .. } = &program.statements[0] else {
        panic!("expected a call statement");
    };
    let Expr::Call { callee, .. } = call else {
        panic!("expected a call");
    };
    assert!(matches!(**callee, Expr::MemberAccess { .. }));
}

#[test]
fn member_assignment() {
    let program = parse("song.title = \"New\";").unwrap();
    let Stmt::Assign { target, .. } = &program.statements[0] else {
        panic!("expected an assignment");
    };
    assert!(matches!(target, Expr::MemberAccess { .. }));
}

#[test]
fn invalid_assignment_target() {
    let err = parse("1 + 2 = 3;").unwrap_err();
    assert!(err.to_string().contains("Invalid left-hand side"));
}

#[test]
fn missing_semicolon() {
    let err = parse("int x = 1").unwrap_err();
    assert_eq!(err.to_string(), "[1, 9] ERROR Expected ';' but found end of input.");
}

#[test]
fn constructor_requires_arguments() {
    let err = parse("File f = File;").unwrap_err();
    assert!(err.to_string().contains("Expected '('"));
}

#[test]
fn if_else_blocks() {
    let program = parse("if (true) { } else { int y = 1; }").unwrap();
    let Stmt::If { else_block, .. } = &program.statements[0] else {
        panic!("expected an if statement");
    };
    assert_eq!(else_block.as_ref().unwrap().statements.len(), 1);
}

#[test]
fn return_without_value() {
    let program = parse("func void f() { return; }").unwrap();
    let Stmt::Return { value, .. } = &program.functions[0].body.statements[0] else {
        panic!("expected a return");
    };
    assert!(value.is_none());
}

#[test]
fn unary_minus_nests() {
    let program = parse("int x = --1;").unwrap();
    let Stmt::VarDecl { value, .. } = &program.statements[0] else {
        panic!("expected a declaration");
    };
    let Expr::UnaryMinus { operand, .. } = value else {
        panic!("expected unary minus");
    };
    assert!(matches!(**operand, Expr::UnaryMinus { .. }));
}

#[test]
fn bad_factor_start() {
    let err = parse("int x = *;").unwrap_err();
    assert!(err
        .to_string()
        .contains("Unexpected token '*', expecting the start of a factor."));
}

#[test]
fn missing_type_name_in_list() {
    let err = parse("List<walrus> xs = [];").unwrap_err();
    assert!(err.to_string().contains("Expected a type name but found"));
}

#[test]
fn empty_token_stream_parses_to_an_empty_program() {
    // The lexer always terminates a stream with Eof; the parser supplies
    // one itself when handed a bare vector.
    let mut parser = audiolang::parser::Parser::new(Vec::new());
    let program = parser.parse().unwrap();
    assert!(program.functions.is_empty());
    assert!(program.statements.is_empty());
}
