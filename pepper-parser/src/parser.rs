// pepper-parser - Parser for Pepper
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Pratt parser for Pepper source code.
//!
//! Converts tokens into the [`crate::ast`] node types. Errors are
//! accumulated rather than aborting the parse: after an error the parser
//! skips to the next statement boundary and continues, so one submission
//! reports as many problems as possible.

use std::fmt;

use crate::ast::{
    BlockStatement, Expression, InfixOperator, PrefixOperator, Program, Statement,
};
use crate::lexer::{Lexer, Token, TokenKind};

/// Parser error with position information.
#[derive(Debug, Clone)]
pub struct ParseError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Parse error at {}:{}: {}",
            self.line, self.column, self.message
        )
    }
}

impl std::error::Error for ParseError {}

/// Operator precedence, lowest to highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
    Lowest,
    Assign,      // =
    Or,          // ||
    And,         // &&
    Equals,      // == !=
    LessGreater, // < <= > >=
    Sum,         // + -
    Product,     // * / %
    Prefix,      // -x !x
    Call,        // f(x)
    Index,       // a[i]
}

fn token_precedence(kind: TokenKind) -> Precedence {
    match kind {
        TokenKind::Assign => Precedence::Assign,
        TokenKind::Or => Precedence::Or,
        TokenKind::And => Precedence::And,
        TokenKind::Eq | TokenKind::NotEq => Precedence::Equals,
        TokenKind::Lt | TokenKind::LtEq | TokenKind::Gt | TokenKind::GtEq => {
            Precedence::LessGreater
        }
        TokenKind::Plus | TokenKind::Minus => Precedence::Sum,
        TokenKind::Asterisk | TokenKind::Slash | TokenKind::Percent => Precedence::Product,
        TokenKind::LParen => Precedence::Call,
        TokenKind::LBracket => Precedence::Index,
        _ => Precedence::Lowest,
    }
}

/// The parser converts tokens into an AST [`Program`].
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    cur_token: Token,
    peek_token: Token,
    errors: Vec<ParseError>,
}

impl<'a> Parser<'a> {
    /// Create a new parser for the given source code.
    pub fn new(source: &'a str) -> Self {
        let mut lexer = Lexer::new(source);
        let cur_token = lexer.next_token();
        let peek_token = lexer.next_token();
        Parser {
            lexer,
            cur_token,
            peek_token,
            errors: Vec::new(),
        }
    }

    /// Parse a complete program.
    ///
    /// Returns the program, or every error encountered if any statement
    /// failed to parse.
    pub fn parse_program(mut self) -> Result<Program, Vec<ParseError>> {
        let mut program = Program::default();

        while self.cur_token.kind != TokenKind::Eof {
            match self.parse_statement() {
                Ok(stmt) => program.statements.push(stmt),
                Err(err) => {
                    self.errors.push(err);
                    self.synchronize();
                }
            }
            self.advance();
        }

        if self.errors.is_empty() {
            Ok(program)
        } else {
            Err(self.errors)
        }
    }

    /// Convenience: parse a source string in one call.
    pub fn parse_source(source: &str) -> Result<Program, Vec<ParseError>> {
        Parser::new(source).parse_program()
    }

    // ========================================================================
    // Token plumbing
    // ========================================================================

    fn advance(&mut self) {
        self.cur_token = std::mem::replace(&mut self.peek_token, self.lexer.next_token());
    }

    fn error(&self, token: &Token, message: String) -> ParseError {
        ParseError {
            message,
            line: token.line,
            column: token.column,
        }
    }

    /// Advance iff the peek token matches, else error.
    fn expect_peek(&mut self, expected: TokenKind) -> Result<(), ParseError> {
        if self.peek_token.kind == expected {
            self.advance();
            Ok(())
        } else {
            Err(self.error(
                &self.peek_token,
                format!(
                    "expected '{}', found '{}'",
                    expected,
                    token_text(&self.peek_token)
                ),
            ))
        }
    }

    /// Skip to the next statement boundary after an error.
    fn synchronize(&mut self) {
        while self.cur_token.kind != TokenKind::Eof {
            if matches!(
                self.cur_token.kind,
                TokenKind::Semicolon | TokenKind::RBrace
            ) {
                return;
            }
            self.advance();
        }
    }

    /// Consume a trailing semicolon if present. Semicolons are optional
    /// before `}` and end of input.
    fn skip_semicolon(&mut self) {
        if self.peek_token.kind == TokenKind::Semicolon {
            self.advance();
        }
    }

    // ========================================================================
    // Statements
    // ========================================================================

    fn parse_statement(&mut self) -> Result<Statement, ParseError> {
        match self.cur_token.kind {
            TokenKind::Let => self.parse_let_statement(),
            TokenKind::Return => self.parse_return_statement(),
            TokenKind::While => self.parse_while_statement(),
            TokenKind::For => self.parse_for_statement(),
            TokenKind::Break => {
                self.skip_semicolon();
                Ok(Statement::Break)
            }
            TokenKind::Continue => {
                self.skip_semicolon();
                Ok(Statement::Continue)
            }
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_let_statement(&mut self) -> Result<Statement, ParseError> {
        let stmt = self.parse_let_header()?;
        self.skip_semicolon();
        Ok(stmt)
    }

    /// Parse `let name = value` without the trailing semicolon
    /// (shared with `for` headers).
    fn parse_let_header(&mut self) -> Result<Statement, ParseError> {
        self.expect_peek(TokenKind::Ident)?;
        let name = self.cur_token.literal.clone();
        self.expect_peek(TokenKind::Assign)?;
        self.advance();
        let mut value = self.parse_expression(Precedence::Lowest)?;

        // Give function literals their binding name for self-reference.
        if let Expression::Function {
            name: fn_name @ None,
            ..
        } = &mut value
        {
            *fn_name = Some(name.clone());
        }

        Ok(Statement::Let { name, value })
    }

    fn parse_return_statement(&mut self) -> Result<Statement, ParseError> {
        if matches!(
            self.peek_token.kind,
            TokenKind::Semicolon | TokenKind::RBrace | TokenKind::Eof
        ) {
            self.skip_semicolon();
            return Ok(Statement::Return { value: None });
        }
        self.advance();
        let value = self.parse_expression(Precedence::Lowest)?;
        self.skip_semicolon();
        Ok(Statement::Return { value: Some(value) })
    }

    fn parse_while_statement(&mut self) -> Result<Statement, ParseError> {
        self.expect_peek(TokenKind::LParen)?;
        self.advance();
        let condition = self.parse_expression(Precedence::Lowest)?;
        self.expect_peek(TokenKind::RParen)?;
        self.expect_peek(TokenKind::LBrace)?;
        let body = self.parse_block_statement()?;
        Ok(Statement::While { condition, body })
    }

    fn parse_for_statement(&mut self) -> Result<Statement, ParseError> {
        self.expect_peek(TokenKind::LParen)?;

        // init: empty, `let ...`, or an expression statement
        let init = if self.peek_token.kind == TokenKind::Semicolon {
            self.advance();
            None
        } else {
            self.advance();
            let stmt = match self.cur_token.kind {
                TokenKind::Let => self.parse_let_header()?,
                _ => Statement::Expression {
                    expression: self.parse_expression(Precedence::Lowest)?,
                },
            };
            self.expect_peek(TokenKind::Semicolon)?;
            Some(Box::new(stmt))
        };

        // condition: empty means loop forever
        let condition = if self.peek_token.kind == TokenKind::Semicolon {
            self.advance();
            None
        } else {
            self.advance();
            let cond = self.parse_expression(Precedence::Lowest)?;
            self.expect_peek(TokenKind::Semicolon)?;
            Some(cond)
        };

        // post: empty or an expression statement
        let post = if self.peek_token.kind == TokenKind::RParen {
            None
        } else {
            self.advance();
            let expression = self.parse_expression(Precedence::Lowest)?;
            Some(Box::new(Statement::Expression { expression }))
        };

        self.expect_peek(TokenKind::RParen)?;
        self.expect_peek(TokenKind::LBrace)?;
        let body = self.parse_block_statement()?;

        Ok(Statement::For {
            init,
            condition,
            post,
            body,
        })
    }

    fn parse_expression_statement(&mut self) -> Result<Statement, ParseError> {
        let expression = self.parse_expression(Precedence::Lowest)?;
        self.skip_semicolon();
        Ok(Statement::Expression { expression })
    }

    /// Parse a `{ ... }` block. The current token must be `{`.
    fn parse_block_statement(&mut self) -> Result<BlockStatement, ParseError> {
        let mut block = BlockStatement::default();
        self.advance();
        while !matches!(self.cur_token.kind, TokenKind::RBrace | TokenKind::Eof) {
            block.statements.push(self.parse_statement()?);
            self.advance();
        }
        if self.cur_token.kind != TokenKind::RBrace {
            return Err(self.error(&self.cur_token, "expected '}' to close block".to_string()));
        }
        Ok(block)
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    fn parse_expression(&mut self, precedence: Precedence) -> Result<Expression, ParseError> {
        let mut left = self.parse_prefix()?;

        while self.peek_token.kind != TokenKind::Semicolon
            && precedence < token_precedence(self.peek_token.kind)
        {
            left = match self.peek_token.kind {
                TokenKind::LParen => {
                    self.advance();
                    self.parse_call_expression(left)?
                }
                TokenKind::LBracket => {
                    self.advance();
                    self.parse_index_expression(left)?
                }
                TokenKind::Assign => {
                    self.advance();
                    self.parse_assign_expression(left)?
                }
                kind if infix_operator(kind).is_some() => {
                    self.advance();
                    self.parse_infix_expression(left)?
                }
                _ => return Ok(left),
            };
        }

        Ok(left)
    }

    fn parse_prefix(&mut self) -> Result<Expression, ParseError> {
        match self.cur_token.kind {
            TokenKind::Ident => Ok(Expression::Identifier(self.cur_token.literal.clone())),
            TokenKind::Int => self.parse_integer_literal(),
            TokenKind::String => Ok(Expression::StringLiteral(self.cur_token.literal.clone())),
            TokenKind::True => Ok(Expression::BooleanLiteral(true)),
            TokenKind::False => Ok(Expression::BooleanLiteral(false)),
            TokenKind::Null => Ok(Expression::NullLiteral),
            TokenKind::Bang => self.parse_prefix_expression(PrefixOperator::Bang),
            TokenKind::Minus => self.parse_prefix_expression(PrefixOperator::Minus),
            TokenKind::LParen => self.parse_grouped_expression(),
            TokenKind::If => self.parse_if_expression(),
            TokenKind::Function => self.parse_function_literal(),
            TokenKind::LBracket => self.parse_array_literal(),
            TokenKind::LBrace => self.parse_map_literal(),
            _ => Err(self.error(
                &self.cur_token,
                format!(
                    "unexpected token '{}' in expression",
                    token_text(&self.cur_token)
                ),
            )),
        }
    }

    fn parse_integer_literal(&mut self) -> Result<Expression, ParseError> {
        self.cur_token
            .literal
            .parse::<i64>()
            .map(Expression::IntegerLiteral)
            .map_err(|_| {
                self.error(
                    &self.cur_token,
                    format!("could not parse '{}' as integer", self.cur_token.literal),
                )
            })
    }

    fn parse_prefix_expression(
        &mut self,
        operator: PrefixOperator,
    ) -> Result<Expression, ParseError> {
        self.advance();
        let right = self.parse_expression(Precedence::Prefix)?;
        Ok(Expression::Prefix {
            operator,
            right: Box::new(right),
        })
    }

    fn parse_infix_expression(&mut self, left: Expression) -> Result<Expression, ParseError> {
        let operator = infix_operator(self.cur_token.kind)
            .expect("parse_infix_expression called on a non-operator token");
        let precedence = token_precedence(self.cur_token.kind);
        self.advance();
        let right = self.parse_expression(precedence)?;
        Ok(Expression::Infix {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    fn parse_assign_expression(&mut self, target: Expression) -> Result<Expression, ParseError> {
        // Right-associative: parse the value at the lowest precedence so
        // `a = b = c` nests as `a = (b = c)`.
        self.advance();
        let value = self.parse_expression(Precedence::Lowest)?;
        Ok(Expression::Assign {
            target: Box::new(target),
            value: Box::new(value),
        })
    }

    fn parse_grouped_expression(&mut self) -> Result<Expression, ParseError> {
        self.advance();
        let expr = self.parse_expression(Precedence::Lowest)?;
        self.expect_peek(TokenKind::RParen)?;
        Ok(expr)
    }

    fn parse_if_expression(&mut self) -> Result<Expression, ParseError> {
        self.expect_peek(TokenKind::LParen)?;
        self.advance();
        let condition = self.parse_expression(Precedence::Lowest)?;
        self.expect_peek(TokenKind::RParen)?;
        self.expect_peek(TokenKind::LBrace)?;
        let consequence = self.parse_block_statement()?;

        let alternative = if self.peek_token.kind == TokenKind::Else {
            self.advance();
            self.expect_peek(TokenKind::LBrace)?;
            Some(self.parse_block_statement()?)
        } else {
            None
        };

        Ok(Expression::If {
            condition: Box::new(condition),
            consequence,
            alternative,
        })
    }

    fn parse_function_literal(&mut self) -> Result<Expression, ParseError> {
        self.expect_peek(TokenKind::LParen)?;
        let parameters = self.parse_function_parameters()?;
        self.expect_peek(TokenKind::LBrace)?;
        let body = self.parse_block_statement()?;
        Ok(Expression::Function {
            name: None,
            parameters,
            body,
        })
    }

    fn parse_function_parameters(&mut self) -> Result<Vec<String>, ParseError> {
        let mut parameters = Vec::new();

        if self.peek_token.kind == TokenKind::RParen {
            self.advance();
            return Ok(parameters);
        }

        self.expect_peek(TokenKind::Ident)?;
        parameters.push(self.cur_token.literal.clone());

        while self.peek_token.kind == TokenKind::Comma {
            self.advance();
            self.expect_peek(TokenKind::Ident)?;
            parameters.push(self.cur_token.literal.clone());
        }

        self.expect_peek(TokenKind::RParen)?;
        Ok(parameters)
    }

    fn parse_call_expression(&mut self, function: Expression) -> Result<Expression, ParseError> {
        let arguments = self.parse_expression_list(TokenKind::RParen)?;
        Ok(Expression::Call {
            function: Box::new(function),
            arguments,
        })
    }

    fn parse_array_literal(&mut self) -> Result<Expression, ParseError> {
        let elements = self.parse_expression_list(TokenKind::RBracket)?;
        Ok(Expression::Array(elements))
    }

    /// Parse a comma-separated expression list up to the closing token.
    /// The current token is the opening delimiter.
    fn parse_expression_list(&mut self, end: TokenKind) -> Result<Vec<Expression>, ParseError> {
        let mut list = Vec::new();

        if self.peek_token.kind == end {
            self.advance();
            return Ok(list);
        }

        self.advance();
        list.push(self.parse_expression(Precedence::Lowest)?);

        while self.peek_token.kind == TokenKind::Comma {
            self.advance();
            self.advance();
            list.push(self.parse_expression(Precedence::Lowest)?);
        }

        self.expect_peek(end)?;
        Ok(list)
    }

    fn parse_map_literal(&mut self) -> Result<Expression, ParseError> {
        let mut pairs = Vec::new();

        while self.peek_token.kind != TokenKind::RBrace {
            self.advance();
            let key = self.parse_expression(Precedence::Lowest)?;
            self.expect_peek(TokenKind::Colon)?;
            self.advance();
            let value = self.parse_expression(Precedence::Lowest)?;
            pairs.push((key, value));

            if self.peek_token.kind != TokenKind::RBrace {
                self.expect_peek(TokenKind::Comma)?;
            }
        }

        self.expect_peek(TokenKind::RBrace)?;
        Ok(Expression::Map(pairs))
    }

    fn parse_index_expression(&mut self, left: Expression) -> Result<Expression, ParseError> {
        self.advance();
        let index = self.parse_expression(Precedence::Lowest)?;
        self.expect_peek(TokenKind::RBracket)?;
        Ok(Expression::Index {
            left: Box::new(left),
            index: Box::new(index),
        })
    }
}

fn infix_operator(kind: TokenKind) -> Option<InfixOperator> {
    let op = match kind {
        TokenKind::Plus => InfixOperator::Add,
        TokenKind::Minus => InfixOperator::Sub,
        TokenKind::Asterisk => InfixOperator::Mul,
        TokenKind::Slash => InfixOperator::Div,
        TokenKind::Percent => InfixOperator::Mod,
        TokenKind::Eq => InfixOperator::Eq,
        TokenKind::NotEq => InfixOperator::NotEq,
        TokenKind::Lt => InfixOperator::Lt,
        TokenKind::LtEq => InfixOperator::LtEq,
        TokenKind::Gt => InfixOperator::Gt,
        TokenKind::GtEq => InfixOperator::GtEq,
        TokenKind::And => InfixOperator::And,
        TokenKind::Or => InfixOperator::Or,
        _ => return None,
    };
    Some(op)
}

/// The token's literal, or its kind name when the literal is empty (EOF).
/// Used in error messages.
fn token_text(token: &Token) -> String {
    if token.literal.is_empty() {
        token.kind.to_string()
    } else {
        token.literal.clone()
    }
}
