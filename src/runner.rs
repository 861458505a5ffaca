use crate::ast;
use crate::config::Config;
use crate::interp::Interpreter;
use crate::lexer::Lexer;
use crate::parser::Parser;
use crate::types::TypeChecker;

/// How far through the pipeline to go before stopping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Tokens,
    Ast,
    Check,
    Run,
}

/// Runs `source` through the pipeline, stopping at `mode`. Diagnostics go
/// to stdout; with `pretty` they render as annotated source snippets
/// instead of single lines. Returns false on the first error.
pub fn run(source: &str, filename: Option<&str>, config: &Config, mode: Mode, pretty: bool) -> bool {
    let mut lexer = Lexer::new(source, config);
    let tokens = match lexer.tokenize() {
        Ok(tokens) => tokens,
        Err(error) => {
            if pretty {
                error.report(source, filename);
            } else {
                println!("{}", error);
            }
            return false;
        }
    };
    if mode == Mode::Tokens {
        for token in &tokens {
            println!("{:?}", token);
        }
        return true;
    }

    let mut parser = Parser::new(tokens);
    let program = match parser.parse() {
        Ok(program) => program,
        Err(error) => {
            if pretty {
                error.report(source, filename);
            } else {
                println!("{}", error);
            }
            return false;
        }
    };
    if mode == Mode::Ast {
        print!("{}", ast::pretty_print(&program));
        return true;
    }

    let mut checker = TypeChecker::new();
    if let Err(error) = checker.check_program(&program) {
        if pretty {
            error.report(source, filename);
        } else {
            println!("{}", error);
        }
        return false;
    }
    if mode == Mode::Check {
        return true;
    }

    let mut interpreter = Interpreter::new(config);
    if let Err(error) = interpreter.run_program(&program) {
        if pretty {
            error.report(source, filename);
        } else {
            println!("{}", error);
        }
        return false;
    }
    true
}
