use crate::ast::{
    BinaryOp, Block, Expr, FunctionDef, LogicalOp, ObjectKind, Param, Program, SimpleType, Stmt,
    TypeExpr,
};
use crate::error::{ParseError, Position, Span};
use crate::lexer::{Token, TokenKind, TokenValue};

const TYPE_STARTERS: &[TokenKind] = &[
    TokenKind::Int,
    TokenKind::Float,
    TokenKind::Bool,
    TokenKind::Str,
    TokenKind::File,
    TokenKind::Folder,
    TokenKind::Audio,
    TokenKind::List,
];

/// Recursive-descent parser over a buffered token stream. Stops at the
/// first error.
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
}

impl Parser {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        // The token helpers rely on a terminating Eof token.
        if tokens.last().map_or(true, |t| t.kind != TokenKind::Eof) {
            let pos = tokens.last().map(|t| t.pos).unwrap_or_default();
            tokens.push(Token::simple(TokenKind::Eof, pos));
        }
        Self { tokens, current: 0 }
    }

    pub fn parse(&mut self) -> Result<Program, ParseError> {
        let mut functions = Vec::new();
        let mut statements = Vec::new();

        while !self.is_at_end() {
            if let Some(func) = self.try_function_definition()? {
                functions.push(func);
            } else {
                statements.push(self.statement()?);
            }
        }

        Ok(Program {
            functions,
            statements,
        })
    }

    // --- Statements ---

    fn statement(&mut self) -> Result<Stmt, ParseError> {
        if let Some(stmt) = self.try_variable_declaration()? {
            return Ok(stmt);
        }
        if let Some(stmt) = self.try_if_statement()? {
            return Ok(stmt);
        }
        if let Some(stmt) = self.try_while_loop()? {
            return Ok(stmt);
        }
        if let Some(stmt) = self.try_return_statement()? {
            return Ok(stmt);
        }
        self.expression_statement()
    }

    fn try_function_definition(&mut self) -> Result<Option<FunctionDef>, ParseError> {
        if !self.check(TokenKind::Func) {
            return Ok(None);
        }
        let start = self.advance_pos();

        let return_type = self.return_type()?;
        let name = self.consume_identifier()?;
        self.consume(TokenKind::LParen)?;

        let mut params = Vec::new();
        if !self.check(TokenKind::RParen) {
            loop {
                let param_start = self.peek().pos;
                let param_type = self.parse_type()?;
                let param_name = self.consume_identifier()?;
                params.push(Param {
                    param_type,
                    name: param_name,
                    span: Span::new(param_start, self.previous_pos()),
                });
                if !self.matches(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RParen)?;

        let body = self.block()?;
        let span = Span::new(start, self.previous_pos());
        Ok(Some(FunctionDef {
            return_type,
            name,
            params,
            body,
            span,
        }))
    }

    fn try_variable_declaration(&mut self) -> Result<Option<Stmt>, ParseError> {
        let kind = self.peek().kind;
        if !TYPE_STARTERS.contains(&kind) {
            return Ok(None);
        }
        // `File("a.txt")` is a constructor expression, not a declaration.
        if kind != TokenKind::List && !self.check_next(TokenKind::Identifier) {
            return Ok(None);
        }

        let start = self.peek().pos;
        let var_type = self.parse_type()?;
        let name = self.consume_identifier()?;
        self.consume(TokenKind::Assign)?;
        let value = self.expression()?;
        self.consume(TokenKind::Semicolon)?;

        Ok(Some(Stmt::VarDecl {
            var_type,
            name,
            value,
            span: Span::new(start, self.previous_pos()),
        }))
    }

    fn try_if_statement(&mut self) -> Result<Option<Stmt>, ParseError> {
        if !self.check(TokenKind::If) {
            return Ok(None);
        }
        let start = self.advance_pos();

        self.consume(TokenKind::LParen)?;
        let condition = self.expression()?;
        self.consume(TokenKind::RParen)?;
        let then_block = self.block()?;

        let else_block = if self.matches(TokenKind::Else) {
            Some(self.block()?)
        } else {
            None
        };

        Ok(Some(Stmt::If {
            condition,
            then_block,
            else_block,
            span: Span::new(start, self.previous_pos()),
        }))
    }

    fn try_while_loop(&mut self) -> Result<Option<Stmt>, ParseError> {
        if !self.check(TokenKind::While) {
            return Ok(None);
        }
        let start = self.advance_pos();

        self.consume(TokenKind::LParen)?;
        let condition = self.expression()?;
        self.consume(TokenKind::RParen)?;
        let body = self.block()?;

        Ok(Some(Stmt::While {
            condition,
            body,
            span: Span::new(start, self.previous_pos()),
        }))
    }

    fn try_return_statement(&mut self) -> Result<Option<Stmt>, ParseError> {
        if !self.check(TokenKind::Return) {
            return Ok(None);
        }
        let start = self.advance_pos();

        let value = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(self.expression()?)
        };
        self.consume(TokenKind::Semicolon)?;

        Ok(Some(Stmt::Return {
            value,
            span: Span::new(start, self.previous_pos()),
        }))
    }

    /// Catch-all: assignment, call statement, or bare expression.
    fn expression_statement(&mut self) -> Result<Stmt, ParseError> {
        let start = self.peek().pos;
        let expr = self.expression()?;

        if self.matches(TokenKind::Assign) {
            match expr {
                Expr::Identifier { .. } | Expr::MemberAccess { .. } => {}
                _ => {
                    return Err(ParseError::message(
                        "Invalid left-hand side in assignment. Must be an identifier or member access.",
                        expr.span().start,
                    ));
                }
            }
            let value = self.expression()?;
            self.consume(TokenKind::Semicolon)?;
            return Ok(Stmt::Assign {
                target: expr,
                value,
                span: Span::new(start, self.previous_pos()),
            });
        }

        self.consume(TokenKind::Semicolon)?;
        let span = Span::new(start, self.previous_pos());
        if matches!(expr, Expr::Call { .. }) {
            Ok(Stmt::Call { call: expr, span })
        } else {
            Ok(Stmt::Expression { expr, span })
        }
    }

    fn block(&mut self) -> Result<Block, ParseError> {
        let start = self.consume(TokenKind::LBrace)?.pos;
        let mut statements = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            statements.push(self.statement()?);
        }
        self.consume(TokenKind::RBrace)?;
        Ok(Block {
            statements,
            span: Span::new(start, self.previous_pos()),
        })
    }

    // --- Types ---

    fn return_type(&mut self) -> Result<TypeExpr, ParseError> {
        if self.check(TokenKind::Void) {
            let pos = self.advance_pos();
            return Ok(TypeExpr::Simple {
                name: SimpleType::Void,
                span: Span::single(pos),
            });
        }
        self.parse_type()
    }

    fn parse_type(&mut self) -> Result<TypeExpr, ParseError> {
        let token = self.peek().clone();
        let simple = match token.kind {
            TokenKind::Int => Some(SimpleType::Int),
            TokenKind::Float => Some(SimpleType::Float),
            TokenKind::Bool => Some(SimpleType::Bool),
            TokenKind::Str => Some(SimpleType::Str),
            TokenKind::File => Some(SimpleType::File),
            TokenKind::Folder => Some(SimpleType::Folder),
            TokenKind::Audio => Some(SimpleType::Audio),
            _ => None,
        };

        if let Some(name) = simple {
            let pos = self.advance_pos();
            return Ok(TypeExpr::Simple {
                name,
                span: Span::single(pos),
            });
        }

        if token.kind == TokenKind::List {
            let start = self.advance_pos();
            self.consume(TokenKind::Less)?;
            let element = self.parse_type()?;
            self.consume(TokenKind::Greater)?;
            return Ok(TypeExpr::List {
                element: Box::new(element),
                span: Span::new(start, self.previous_pos()),
            });
        }

        Err(ParseError::message(
            format!("Expected a type name but found {}.", token.kind),
            token.pos,
        ))
    }

    // --- Expressions ---

    fn expression(&mut self) -> Result<Expr, ParseError> {
        self.logical_or()
    }

    fn logical_or(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.logical_and()?;
        while self.matches(TokenKind::OrOr) {
            let right = self.logical_and()?;
            let span = Span::new(expr.span().start, right.span().end);
            expr = Expr::Logical {
                op: LogicalOp::Or,
                left: Box::new(expr),
                right: Box::new(right),
                span,
            };
        }
        Ok(expr)
    }

    fn logical_and(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.comparison()?;
        while self.matches(TokenKind::AndAnd) {
            let right = self.comparison()?;
            let span = Span::new(expr.span().start, right.span().end);
            expr = Expr::Logical {
                op: LogicalOp::And,
                left: Box::new(expr),
                right: Box::new(right),
                span,
            };
        }
        Ok(expr)
    }

    /// Comparisons do not chain: `a < b < c` is rejected at the statement
    /// level because the second `<` is left unconsumed.
    fn comparison(&mut self) -> Result<Expr, ParseError> {
        let left = self.additive()?;
        let op = match self.peek().kind {
            TokenKind::EqEq => BinaryOp::Equal,
            TokenKind::NotEq => BinaryOp::NotEqual,
            TokenKind::Less => BinaryOp::Less,
            TokenKind::LessEq => BinaryOp::LessEqual,
            TokenKind::Greater => BinaryOp::Greater,
            TokenKind::GreaterEq => BinaryOp::GreaterEqual,
            _ => return Ok(left),
        };
        self.advance();
        let right = self.additive()?;
        let span = Span::new(left.span().start, right.span().end);
        Ok(Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
            span,
        })
    }

    fn additive(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.multiplicative()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Subtract,
                _ => return Ok(expr),
            };
            self.advance();
            let right = self.multiplicative()?;
            let span = Span::new(expr.span().start, right.span().end);
            expr = Expr::Binary {
                op,
                left: Box::new(expr),
                right: Box::new(right),
                span,
            };
        }
    }

    fn multiplicative(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.unary()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Star => BinaryOp::Multiply,
                TokenKind::Slash => BinaryOp::Divide,
                _ => return Ok(expr),
            };
            self.advance();
            let right = self.unary()?;
            let span = Span::new(expr.span().start, right.span().end);
            expr = Expr::Binary {
                op,
                left: Box::new(expr),
                right: Box::new(right),
                span,
            };
        }
    }

    fn unary(&mut self) -> Result<Expr, ParseError> {
        if self.check(TokenKind::Minus) {
            let start = self.advance_pos();
            let operand = self.unary()?;
            let span = Span::new(start, operand.span().end);
            return Ok(Expr::UnaryMinus {
                operand: Box::new(operand),
                span,
            });
        }
        self.postfix()
    }

    /// Postfix chaining: member access and calls bind tighter than any
    /// operator and may alternate, e.g. `folder.get_file("a").delete()`.
    fn postfix(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.factor()?;
        loop {
            if self.matches(TokenKind::Dot) {
                let member = self.consume_identifier()?;
                let span = Span::new(expr.span().start, self.previous_pos());
                expr = Expr::MemberAccess {
                    object: Box::new(expr),
                    member,
                    span,
                };
            } else if self.matches(TokenKind::LParen) {
                let args = self.arguments()?;
                let span = Span::new(expr.span().start, self.previous_pos());
                expr = Expr::Call {
                    callee: Box::new(expr),
                    args,
                    span,
                };
            } else {
                return Ok(expr);
            }
        }
    }

    fn factor(&mut self) -> Result<Expr, ParseError> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::IntLiteral => {
                self.advance();
                let value = match token.value {
                    TokenValue::Int(v) => v,
                    _ => 0,
                };
                Ok(Expr::IntLit {
                    value,
                    span: Span::single(token.pos),
                })
            }
            TokenKind::FloatLiteral => {
                self.advance();
                let value = match token.value {
                    TokenValue::Float(v) => v,
                    _ => 0.0,
                };
                Ok(Expr::FloatLit {
                    value,
                    span: Span::single(token.pos),
                })
            }
            TokenKind::StringLiteral => {
                self.advance();
                Ok(Expr::StringLit {
                    value: token.text().to_string(),
                    span: Span::single(token.pos),
                })
            }
            TokenKind::True | TokenKind::False => {
                self.advance();
                Ok(Expr::BoolLit {
                    value: token.kind == TokenKind::True,
                    span: Span::single(token.pos),
                })
            }
            TokenKind::Null => {
                self.advance();
                Ok(Expr::NullLit {
                    span: Span::single(token.pos),
                })
            }
            TokenKind::Identifier => {
                self.advance();
                Ok(Expr::Identifier {
                    name: token.text().to_string(),
                    span: Span::single(token.pos),
                })
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.expression()?;
                self.consume(TokenKind::RParen)?;
                Ok(expr)
            }
            TokenKind::LBracket => {
                let start = self.advance_pos();
                let mut elements = Vec::new();
                if !self.check(TokenKind::RBracket) {
                    loop {
                        elements.push(self.expression()?);
                        if !self.matches(TokenKind::Comma) {
                            break;
                        }
                    }
                }
                self.consume(TokenKind::RBracket)?;
                Ok(Expr::ListLit {
                    elements,
                    span: Span::new(start, self.previous_pos()),
                })
            }
            TokenKind::File | TokenKind::Folder | TokenKind::Audio => {
                let kind = match token.kind {
                    TokenKind::File => ObjectKind::File,
                    TokenKind::Folder => ObjectKind::Folder,
                    _ => ObjectKind::Audio,
                };
                let start = self.advance_pos();
                self.consume(TokenKind::LParen)?;
                let args = self.arguments()?;
                Ok(Expr::Constructor {
                    kind,
                    args,
                    span: Span::new(start, self.previous_pos()),
                })
            }
            _ => Err(ParseError::message(
                format!(
                    "Unexpected token {}, expecting the start of a factor.",
                    token.kind
                ),
                token.pos,
            )),
        }
    }

    /// Comma-separated argument list; the opening `(` must already be
    /// consumed. Consumes the closing `)`.
    fn arguments(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut args = Vec::new();
        if !self.check(TokenKind::RParen) {
            loop {
                args.push(self.expression()?);
                if !self.matches(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RParen)?;
        Ok(args)
    }

    // --- Token helpers ---

    fn peek(&self) -> &Token {
        &self.tokens[self.current.min(self.tokens.len() - 1)]
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn check_next(&self, kind: TokenKind) -> bool {
        self.tokens
            .get(self.current + 1)
            .is_some_and(|t| t.kind == kind)
    }

    fn is_at_end(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn advance_pos(&mut self) -> Position {
        self.advance().pos
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current.saturating_sub(1)]
    }

    fn previous_pos(&self) -> Position {
        self.previous().pos
    }

    fn matches(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn consume(&mut self, kind: TokenKind) -> Result<&Token, ParseError> {
        if self.check(kind) {
            return Ok(self.advance());
        }
        let found = self.peek();
        Err(ParseError::UnexpectedToken {
            expected: kind,
            found: found.kind,
            pos: found.pos,
        })
    }

    fn consume_identifier(&mut self) -> Result<String, ParseError> {
        let token = self.consume(TokenKind::Identifier)?;
        Ok(token.text().to_string())
    }
}
