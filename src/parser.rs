//! Pratt (precedence-climbing) expression parser.
//!
//! The parser owns the lexer and keeps a `(cur, peek)` one-token lookahead.
//! Every token kind maps to an optional prefix parselet and an optional infix
//! parselet; `parse_expression` runs the prefix parselet for the current token
//! and then folds infix parselets while the next token binds tighter than the
//! surrounding precedence. Errors abort parsing, there is no recovery.

use thiserror::Error;

use crate::ast::{
    BlockStatement, Expression, InfixOperator, PrefixOperator, Program, Statement,
};
use crate::lexer::Lexer;
use crate::token::{Token, TokenKind};

pub mod ast;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Expected token type {expected:?}, got {got:?} instead")]
    UnexpectedToken {
        expected: &'static str,
        got: &'static str,
    },
    #[error("No prefix expression found for {kind:?} ({literal:?})")]
    NoPrefixParselet { kind: &'static str, literal: String },
    #[error("Expected integer literal, got unparseable {literal:?} instead")]
    InvalidIntegerLiteral { literal: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
    Lowest,
    /// `==` `!=`
    Equals,
    /// `<` `>`
    LessGreater,
    /// `+` `-`
    Sum,
    /// `*` `/` `%`
    Product,
    /// unary `-` `!`
    Prefix,
    /// bitwise `|` `&` `^` `<<` `>>`
    Special,
    /// `foo(x)`
    Call,
    /// `array[index]`
    Index,
}

fn precedence_of(kind: &TokenKind<'_>) -> Precedence {
    match kind {
        TokenKind::Eq | TokenKind::NotEq => Precedence::Equals,
        TokenKind::Lt | TokenKind::Gt => Precedence::LessGreater,
        TokenKind::Plus | TokenKind::Minus => Precedence::Sum,
        TokenKind::Asterisk | TokenKind::Slash | TokenKind::Percent => Precedence::Product,
        TokenKind::Pipe
        | TokenKind::Ampersand
        | TokenKind::Caret
        | TokenKind::Shl
        | TokenKind::Shr => Precedence::Special,
        TokenKind::LParen => Precedence::Call,
        TokenKind::LBracket => Precedence::Index,
        _ => Precedence::Lowest,
    }
}

fn infix_operator_of(kind: &TokenKind<'_>) -> Option<InfixOperator> {
    let operator = match kind {
        TokenKind::Plus => InfixOperator::Plus,
        TokenKind::Minus => InfixOperator::Minus,
        TokenKind::Asterisk => InfixOperator::Asterisk,
        TokenKind::Slash => InfixOperator::Slash,
        TokenKind::Percent => InfixOperator::Percent,
        TokenKind::Pipe => InfixOperator::Pipe,
        TokenKind::Ampersand => InfixOperator::Ampersand,
        TokenKind::Caret => InfixOperator::Caret,
        TokenKind::Shl => InfixOperator::Shl,
        TokenKind::Shr => InfixOperator::Shr,
        TokenKind::Lt => InfixOperator::Lt,
        TokenKind::Gt => InfixOperator::Gt,
        TokenKind::Eq => InfixOperator::Eq,
        TokenKind::NotEq => InfixOperator::NotEq,
        _ => return None,
    };
    Some(operator)
}

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    cur: Token<'a>,
    peek: Token<'a>,
}

impl<'a> Parser<'a> {
    pub fn new(mut lexer: Lexer<'a>) -> Self {
        let cur = lexer.next_token();
        let peek = lexer.next_token();
        Self { lexer, cur, peek }
    }

    pub fn parse_program(mut self) -> Result<Program, ParseError> {
        let mut statements = Vec::new();
        while self.cur.kind != TokenKind::Eof {
            statements.push(self.parse_statement()?);
            self.next_token();
        }
        Ok(Program { statements })
    }

    fn parse_statement(&mut self) -> Result<Statement, ParseError> {
        match self.cur.kind {
            TokenKind::Let => self.parse_let_statement(),
            TokenKind::Return => self.parse_return_statement(),
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_let_statement(&mut self) -> Result<Statement, ParseError> {
        let name = self.expect_peek_ident()?;
        self.expect_peek(TokenKind::Assign)?;
        self.next_token();
        let value = self.parse_expression(Precedence::Lowest)?;
        self.consume_optional_semicolon();
        Ok(Statement::Let { name, value })
    }

    fn parse_return_statement(&mut self) -> Result<Statement, ParseError> {
        self.next_token();
        let value = self.parse_expression(Precedence::Lowest)?;
        self.consume_optional_semicolon();
        Ok(Statement::Return(value))
    }

    fn parse_expression_statement(&mut self) -> Result<Statement, ParseError> {
        let expr = self.parse_expression(Precedence::Lowest)?;
        self.consume_optional_semicolon();
        Ok(Statement::Expression(expr))
    }

    fn parse_block_statement(&mut self) -> Result<BlockStatement, ParseError> {
        // cur is `{` on entry and the closing `}` (or EOF) on exit.
        let mut statements = Vec::new();
        self.next_token();
        while self.cur.kind != TokenKind::RBrace && self.cur.kind != TokenKind::Eof {
            statements.push(self.parse_statement()?);
            self.next_token();
        }
        Ok(BlockStatement { statements })
    }

    fn parse_expression(&mut self, precedence: Precedence) -> Result<Expression, ParseError> {
        let mut left = self.parse_prefix()?;

        while self.peek.kind != TokenKind::Semicolon && precedence < self.peek_precedence() {
            match self.peek.kind {
                TokenKind::LParen => {
                    self.next_token();
                    left = self.parse_call_expression(left)?;
                }
                TokenKind::LBracket => {
                    self.next_token();
                    left = self.parse_index_expression(left)?;
                }
                kind => {
                    let Some(operator) = infix_operator_of(&kind) else {
                        return Ok(left);
                    };
                    self.next_token();
                    left = self.parse_infix_expression(operator, left)?;
                }
            }
        }

        Ok(left)
    }

    fn parse_prefix(&mut self) -> Result<Expression, ParseError> {
        match self.cur.kind {
            TokenKind::Ident(name) => Ok(Expression::Identifier(name.to_string())),
            TokenKind::Int(literal) => literal
                .parse::<i64>()
                .map(Expression::IntegerLiteral)
                .map_err(|_| ParseError::InvalidIntegerLiteral {
                    literal: literal.to_string(),
                }),
            TokenKind::Str(value) => Ok(Expression::StringLiteral(value.to_string())),
            TokenKind::True => Ok(Expression::BooleanLiteral(true)),
            TokenKind::False => Ok(Expression::BooleanLiteral(false)),
            TokenKind::Bang => self.parse_prefix_expression(PrefixOperator::Bang),
            TokenKind::Minus => self.parse_prefix_expression(PrefixOperator::Minus),
            TokenKind::LParen => self.parse_grouped_expression(),
            TokenKind::If => self.parse_if_expression(),
            TokenKind::Function => self.parse_function_literal(),
            TokenKind::LBracket => self.parse_array_literal(),
            TokenKind::LBrace => self.parse_hash_literal(),
            kind => Err(ParseError::NoPrefixParselet {
                kind: kind.type_name(),
                literal: kind.literal().to_string(),
            }),
        }
    }

    fn parse_prefix_expression(
        &mut self,
        operator: PrefixOperator,
    ) -> Result<Expression, ParseError> {
        self.next_token();
        let right = self.parse_expression(Precedence::Prefix)?;
        Ok(Expression::Prefix {
            operator,
            right: Box::new(right),
        })
    }

    fn parse_infix_expression(
        &mut self,
        operator: InfixOperator,
        left: Expression,
    ) -> Result<Expression, ParseError> {
        let precedence = precedence_of(&self.cur.kind);
        self.next_token();
        let right = self.parse_expression(precedence)?;
        Ok(Expression::Infix {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    fn parse_grouped_expression(&mut self) -> Result<Expression, ParseError> {
        self.next_token();
        let expr = self.parse_expression(Precedence::Lowest)?;
        self.expect_peek(TokenKind::RParen)?;
        Ok(expr)
    }

    fn parse_if_expression(&mut self) -> Result<Expression, ParseError> {
        self.expect_peek(TokenKind::LParen)?;
        self.next_token();
        let condition = self.parse_expression(Precedence::Lowest)?;
        self.expect_peek(TokenKind::RParen)?;
        self.expect_peek(TokenKind::LBrace)?;
        let consequence = self.parse_block_statement()?;

        let mut alternative = None;
        if self.peek.kind == TokenKind::Else {
            self.next_token();
            self.expect_peek(TokenKind::LBrace)?;
            alternative = Some(self.parse_block_statement()?);
        }

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
        Ok(Expression::FunctionLiteral { parameters, body })
    }

    fn parse_function_parameters(&mut self) -> Result<Vec<String>, ParseError> {
        let mut parameters = Vec::new();

        if self.peek.kind == TokenKind::RParen {
            self.next_token();
            return Ok(parameters);
        }

        parameters.push(self.expect_peek_ident()?);
        while self.peek.kind == TokenKind::Comma {
            self.next_token();
            parameters.push(self.expect_peek_ident()?);
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
        Ok(Expression::ArrayLiteral(elements))
    }

    fn parse_expression_list(
        &mut self,
        end: TokenKind<'static>,
    ) -> Result<Vec<Expression>, ParseError> {
        let mut list = Vec::new();

        if self.peek.kind == end {
            self.next_token();
            return Ok(list);
        }

        self.next_token();
        list.push(self.parse_expression(Precedence::Lowest)?);
        while self.peek.kind == TokenKind::Comma {
            self.next_token();
            self.next_token();
            list.push(self.parse_expression(Precedence::Lowest)?);
        }
        self.expect_peek(end)?;

        Ok(list)
    }

    fn parse_hash_literal(&mut self) -> Result<Expression, ParseError> {
        let mut pairs = Vec::new();

        while self.peek.kind != TokenKind::RBrace {
            self.next_token();
            let key = self.parse_expression(Precedence::Lowest)?;
            self.expect_peek(TokenKind::Colon)?;
            self.next_token();
            let value = self.parse_expression(Precedence::Lowest)?;
            pairs.push((key, value));

            if self.peek.kind != TokenKind::RBrace {
                self.expect_peek(TokenKind::Comma)?;
            }
        }
        self.expect_peek(TokenKind::RBrace)?;

        Ok(Expression::HashLiteral(pairs))
    }

    fn parse_index_expression(&mut self, left: Expression) -> Result<Expression, ParseError> {
        self.next_token();
        let index = self.parse_expression(Precedence::Lowest)?;
        self.expect_peek(TokenKind::RBracket)?;
        Ok(Expression::Index {
            left: Box::new(left),
            index: Box::new(index),
        })
    }

    fn consume_optional_semicolon(&mut self) {
        if self.peek.kind == TokenKind::Semicolon {
            self.next_token();
        }
    }

    fn expect_peek(&mut self, expected: TokenKind<'static>) -> Result<(), ParseError> {
        if self.peek.kind == expected {
            self.next_token();
            Ok(())
        } else {
            Err(ParseError::UnexpectedToken {
                expected: expected.type_name(),
                got: self.peek.kind.type_name(),
            })
        }
    }

    fn expect_peek_ident(&mut self) -> Result<String, ParseError> {
        if let TokenKind::Ident(name) = self.peek.kind {
            self.next_token();
            Ok(name.to_string())
        } else {
            Err(ParseError::UnexpectedToken {
                expected: "IDENT",
                got: self.peek.kind.type_name(),
            })
        }
    }

    fn peek_precedence(&self) -> Precedence {
        precedence_of(&self.peek.kind)
    }

    fn next_token(&mut self) {
        self.cur = self.peek;
        self.peek = self.lexer.next_token();
    }
}

/// Convenience entry point: lex and parse a full source string.
pub fn parse(source: &str) -> Result<Program, ParseError> {
    Parser::new(Lexer::new(source)).parse_program()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(input: &str) -> Program {
        parse(input).unwrap_or_else(|e| panic!("parse failed for {input:?}: {e}"))
    }

    fn single_expression(input: &str) -> Expression {
        let program = parse_ok(input);
        assert_eq!(program.statements.len(), 1, "source {input:?}");
        match program.statements.into_iter().next() {
            Some(Statement::Expression(expr)) => expr,
            other => panic!("expected expression statement, got {other:?}"),
        }
    }

    fn ident(name: &str) -> Expression {
        Expression::Identifier(name.to_string())
    }

    fn int(value: i64) -> Expression {
        Expression::IntegerLiteral(value)
    }

    fn infix(left: Expression, operator: InfixOperator, right: Expression) -> Expression {
        Expression::Infix {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    #[test]
    fn parses_let_statements() {
        let program = parse_ok("let x = 5; let y = true; let foobar = y;");
        assert_eq!(
            program.statements,
            vec![
                Statement::Let {
                    name: "x".to_string(),
                    value: int(5),
                },
                Statement::Let {
                    name: "y".to_string(),
                    value: Expression::BooleanLiteral(true),
                },
                Statement::Let {
                    name: "foobar".to_string(),
                    value: ident("y"),
                },
            ]
        );
    }

    #[test]
    fn parses_return_statements() {
        let program = parse_ok("return 5; return x + y;");
        assert_eq!(
            program.statements,
            vec![
                Statement::Return(int(5)),
                Statement::Return(infix(ident("x"), InfixOperator::Plus, ident("y"))),
            ]
        );
    }

    #[test]
    fn parses_literal_expressions() {
        assert_eq!(single_expression("foobar;"), ident("foobar"));
        assert_eq!(single_expression("5;"), int(5));
        assert_eq!(
            single_expression("\"hello world\";"),
            Expression::StringLiteral("hello world".to_string())
        );
        assert_eq!(
            single_expression("true;"),
            Expression::BooleanLiteral(true)
        );
    }

    #[test]
    fn parses_prefix_expressions() {
        assert_eq!(
            single_expression("-15;"),
            Expression::Prefix {
                operator: PrefixOperator::Minus,
                right: Box::new(int(15)),
            }
        );
        assert_eq!(
            single_expression("!5;"),
            Expression::Prefix {
                operator: PrefixOperator::Bang,
                right: Box::new(int(5)),
            }
        );
    }

    #[test]
    fn parses_infix_expressions() {
        let cases = vec![
            ("5 + 6;", InfixOperator::Plus),
            ("5 - 6;", InfixOperator::Minus),
            ("5 * 6;", InfixOperator::Asterisk),
            ("5 / 6;", InfixOperator::Slash),
            ("5 % 6;", InfixOperator::Percent),
            ("5 | 6;", InfixOperator::Pipe),
            ("5 & 6;", InfixOperator::Ampersand),
            ("5 ^ 6;", InfixOperator::Caret),
            ("5 << 6;", InfixOperator::Shl),
            ("5 >> 6;", InfixOperator::Shr),
            ("5 < 6;", InfixOperator::Lt),
            ("5 > 6;", InfixOperator::Gt),
            ("5 == 6;", InfixOperator::Eq),
            ("5 != 6;", InfixOperator::NotEq),
        ];
        for (input, operator) in cases {
            assert_eq!(
                single_expression(input),
                infix(int(5), operator, int(6)),
                "source {input:?}"
            );
        }
    }

    #[test]
    fn honors_operator_precedence() {
        let cases = vec![
            ("-a * b", "((-a) * b);"),
            ("!-a", "(!(-a));"),
            ("a + b + c", "((a + b) + c);"),
            ("a + b - c", "((a + b) - c);"),
            ("a * b * c", "((a * b) * c);"),
            ("a * b / c", "((a * b) / c);"),
            ("a + b / c", "(a + (b / c));"),
            ("a % b + c", "((a % b) + c);"),
            ("a + b * c + d / e - f", "(((a + (b * c)) + (d / e)) - f);"),
            ("3 + 4; -5 * 5", "(3 + 4); ((-5) * 5);"),
            ("5 > 4 == 3 < 4", "((5 > 4) == (3 < 4));"),
            ("5 < 4 != 3 > 4", "((5 < 4) != (3 > 4));"),
            ("3 + 4 * 5 == 3 * 1 + 4 * 5", "((3 + (4 * 5)) == ((3 * 1) + (4 * 5)));"),
            ("true", "true;"),
            ("3 > 5 == false", "((3 > 5) == false);"),
            ("1 + (2 + 3) + 4", "((1 + (2 + 3)) + 4);"),
            ("(5 + 5) * 2", "((5 + 5) * 2);"),
            ("2 / (5 + 5)", "(2 / (5 + 5));"),
            ("-(5 + 5)", "(-(5 + 5));"),
            ("1 | 2 + 3", "((1 | 2) + 3);"),
            ("1 + 2 | 3", "(1 + (2 | 3));"),
            ("2 << 3 * 4", "((2 << 3) * 4);"),
            ("1 ^ 2 & 3", "((1 ^ 2) & 3);"),
            ("a + add(b * c) + d", "((a + add((b * c))) + d);"),
            (
                "add(a, b, 1, 2 * 3, 4 + 5, add(6, 7 * 8))",
                "add(a, b, 1, (2 * 3), (4 + 5), add(6, (7 * 8)));",
            ),
            (
                "a * [1, 2, 3, 4][b * c] * d",
                "((a * ([1, 2, 3, 4][(b * c)])) * d);",
            ),
            (
                "add(a * b[2], b[1], 2 * [1, 2][1])",
                "add((a * (b[2])), (b[1]), (2 * ([1, 2][1])));",
            ),
        ];
        for (input, expected) in cases {
            assert_eq!(parse_ok(input).to_string(), expected, "source {input:?}");
        }
    }

    #[test]
    fn parses_if_expression_without_alternative() {
        let expr = single_expression("if (x < y) { x }");
        assert_eq!(
            expr,
            Expression::If {
                condition: Box::new(infix(ident("x"), InfixOperator::Lt, ident("y"))),
                consequence: BlockStatement {
                    statements: vec![Statement::Expression(ident("x"))],
                },
                alternative: None,
            }
        );
    }

    #[test]
    fn parses_if_else_expression() {
        let expr = single_expression("if (x < y) { x } else { y }");
        assert_eq!(
            expr,
            Expression::If {
                condition: Box::new(infix(ident("x"), InfixOperator::Lt, ident("y"))),
                consequence: BlockStatement {
                    statements: vec![Statement::Expression(ident("x"))],
                },
                alternative: Some(BlockStatement {
                    statements: vec![Statement::Expression(ident("y"))],
                }),
            }
        );
    }

    #[test]
    fn parses_function_literal_parameters() {
        let cases = vec![
            ("fn() {};", vec![]),
            ("fn(x) {};", vec!["x"]),
            ("fn(x, y, z) {};", vec!["x", "y", "z"]),
        ];
        for (input, expected) in cases {
            match single_expression(input) {
                Expression::FunctionLiteral { parameters, .. } => {
                    assert_eq!(parameters, expected, "source {input:?}");
                }
                other => panic!("expected function literal, got {other:?}"),
            }
        }
    }

    #[test]
    fn parses_call_expression() {
        let expr = single_expression("add(1, 2 * 3, 4 + 5);");
        assert_eq!(
            expr,
            Expression::Call {
                function: Box::new(ident("add")),
                arguments: vec![
                    int(1),
                    infix(int(2), InfixOperator::Asterisk, int(3)),
                    infix(int(4), InfixOperator::Plus, int(5)),
                ],
            }
        );
    }

    #[test]
    fn parses_call_with_empty_argument_list() {
        assert_eq!(
            single_expression("noop();"),
            Expression::Call {
                function: Box::new(ident("noop")),
                arguments: vec![],
            }
        );
    }

    #[test]
    fn parses_array_literal_and_index() {
        assert_eq!(
            single_expression("[1, 2 * 2, 3 + 3]"),
            Expression::ArrayLiteral(vec![
                int(1),
                infix(int(2), InfixOperator::Asterisk, int(2)),
                infix(int(3), InfixOperator::Plus, int(3)),
            ])
        );
        assert_eq!(single_expression("[]"), Expression::ArrayLiteral(vec![]));
        assert_eq!(
            single_expression("myArray[1 + 1]"),
            Expression::Index {
                left: Box::new(ident("myArray")),
                index: Box::new(infix(int(1), InfixOperator::Plus, int(1))),
            }
        );
    }

    #[test]
    fn parses_hash_literals() {
        assert_eq!(
            single_expression(r#"{"one": 1, "two": 2}"#),
            Expression::HashLiteral(vec![
                (Expression::StringLiteral("one".to_string()), int(1)),
                (Expression::StringLiteral("two".to_string()), int(2)),
            ])
        );
        assert_eq!(single_expression("{}"), Expression::HashLiteral(vec![]));
        assert_eq!(
            single_expression("{true: 1, 2: 3}"),
            Expression::HashLiteral(vec![
                (Expression::BooleanLiteral(true), int(1)),
                (int(2), int(3)),
            ])
        );
        assert_eq!(
            single_expression(r#"{"a": 0 + 1}"#),
            Expression::HashLiteral(vec![(
                Expression::StringLiteral("a".to_string()),
                infix(int(0), InfixOperator::Plus, int(1)),
            )])
        );
    }

    #[test]
    fn reports_missing_expected_token() {
        let err = parse("let x 5;").expect_err("expected parse failure");
        assert_eq!(
            err,
            ParseError::UnexpectedToken {
                expected: "=",
                got: "INT",
            }
        );
        assert_eq!(
            err.to_string(),
            "Expected token type \"=\", got \"INT\" instead"
        );
    }

    #[test]
    fn reports_missing_prefix_parselet_for_illegal_token() {
        let err = parse("1 + @").expect_err("expected parse failure");
        assert_eq!(
            err,
            ParseError::NoPrefixParselet {
                kind: "ILLEGAL",
                literal: "@".to_string(),
            }
        );
    }

    #[test]
    fn unregistered_two_char_operators_fail_to_parse() {
        // `>=` lexes but carries no precedence, so it terminates the first
        // expression and then fails as a statement start.
        let err = parse("1 >= 2").expect_err("expected parse failure");
        assert!(matches!(err, ParseError::NoPrefixParselet { kind: ">=", .. }));
    }

    #[test]
    fn pretty_printed_programs_reparse_to_the_same_tree() {
        let sources = vec![
            "let x = 1 + 2 * 3;",
            "-a * b",
            "!-a",
            "if (x < y) { x } else { y }",
            "let add = fn(a, b) { a + b; }; add(1, 2)",
            "[1, 2 * 2][0]",
            r#"{"a": 1, true: 2, 3: [4, 5]}["a"]"#,
            "fn() { return 1; }()",
            "1 << 2 | 3 ^ 4",
            r#""one" + "two""#,
        ];
        for source in sources {
            let first = parse_ok(source);
            let second = parse_ok(&first.to_string());
            assert_eq!(first, second, "source {source:?}");
        }
    }
}
