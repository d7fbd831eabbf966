//! Character-level tokenizer.
//!
//! Lexing never fails: unrecognized bytes come back as `Illegal` tokens and
//! the parser decides what to do with them. End of input yields a sticky
//! `Eof` token.

use crate::token::{Token, TokenKind};

/// Identifier characters. `?` and `!` are legal so that names like `empty?`
/// and `sort!` lex as single identifiers; a standalone `!` run resolves to
/// the bang operator through the keyword table.
fn is_letter(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '?' || c == '!'
}

fn is_digit(c: char) -> bool {
    c.is_ascii_digit()
}

fn two_char_kind(current: char, peek: char) -> Option<TokenKind<'static>> {
    let kind = match (current, peek) {
        ('=', '=') => TokenKind::Eq,
        ('!', '=') => TokenKind::NotEq,
        ('>', '=') => TokenKind::Ge,
        ('<', '=') => TokenKind::Le,
        ('^', '=') => TokenKind::CaretAssign,
        ('|', '=') => TokenKind::PipeAssign,
        ('&', '=') => TokenKind::AmpersandAssign,
        ('+', '=') => TokenKind::PlusAssign,
        ('-', '=') => TokenKind::MinusAssign,
        ('*', '=') => TokenKind::AsteriskAssign,
        ('/', '=') => TokenKind::SlashAssign,
        ('%', '=') => TokenKind::PercentAssign,
        ('&', '&') => TokenKind::And,
        ('|', '|') => TokenKind::Or,
        ('<', '<') => TokenKind::Shl,
        ('>', '>') => TokenKind::Shr,
        _ => return None,
    };
    Some(kind)
}

fn single_char_kind(c: char) -> Option<TokenKind<'static>> {
    let kind = match c {
        '=' => TokenKind::Assign,
        ';' => TokenKind::Semicolon,
        '(' => TokenKind::LParen,
        ')' => TokenKind::RParen,
        ',' => TokenKind::Comma,
        '+' => TokenKind::Plus,
        '-' => TokenKind::Minus,
        '*' => TokenKind::Asterisk,
        '/' => TokenKind::Slash,
        '{' => TokenKind::LBrace,
        '}' => TokenKind::RBrace,
        '^' => TokenKind::Caret,
        '|' => TokenKind::Pipe,
        '&' => TokenKind::Ampersand,
        '%' => TokenKind::Percent,
        '<' => TokenKind::Lt,
        '>' => TokenKind::Gt,
        '[' => TokenKind::LBracket,
        ']' => TokenKind::RBracket,
        ':' => TokenKind::Colon,
        _ => return None,
    };
    Some(kind)
}

fn keyword_kind(ident: &str) -> Option<TokenKind<'static>> {
    let kind = match ident {
        "fn" => TokenKind::Function,
        "let" => TokenKind::Let,
        "if" => TokenKind::If,
        "else" => TokenKind::Else,
        "return" => TokenKind::Return,
        "true" => TokenKind::True,
        "false" => TokenKind::False,
        // The bang operator lives in the keyword table: `!` is an identifier
        // character, so a lone `!` run comes through here.
        "!" => TokenKind::Bang,
        _ => return None,
    };
    Some(kind)
}

pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    pub fn next_token(&mut self) -> Token<'a> {
        self.skip_whitespace();

        let Some(ch) = self.peek_char() else {
            return Token::new(TokenKind::Eof);
        };

        if let Some(peek) = self.peek_second_char()
            && let Some(kind) = two_char_kind(ch, peek)
        {
            self.consume_char();
            self.consume_char();
            return Token::new(kind);
        }

        if is_letter(ch) {
            return self.read_identifier();
        }
        if is_digit(ch) {
            return self.read_integer();
        }
        if let Some(kind) = single_char_kind(ch) {
            self.consume_char();
            return Token::new(kind);
        }
        if ch == '"' {
            return self.read_string();
        }

        let start = self.pos;
        self.consume_char();
        Token::new(TokenKind::Illegal(&self.input[start..self.pos]))
    }

    fn read_identifier(&mut self) -> Token<'a> {
        let start = self.pos;
        while let Some(c) = self.peek_char() {
            if !is_letter(c) {
                break;
            }
            self.consume_char();
        }
        let ident = &self.input[start..self.pos];
        match keyword_kind(ident) {
            Some(kind) => Token::new(kind),
            None => Token::new(TokenKind::Ident(ident)),
        }
    }

    fn read_integer(&mut self) -> Token<'a> {
        let start = self.pos;
        while let Some(c) = self.peek_char() {
            if !is_digit(c) {
                break;
            }
            self.consume_char();
        }
        Token::new(TokenKind::Int(&self.input[start..self.pos]))
    }

    fn read_string(&mut self) -> Token<'a> {
        self.consume_char(); // opening quote
        let start = self.pos;
        while let Some(c) = self.peek_char() {
            if c == '"' {
                break;
            }
            self.consume_char();
        }
        let content = &self.input[start..self.pos];
        self.consume_char(); // closing quote, if any
        Token::new(TokenKind::Str(content))
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek_char() {
            if c != ' ' && c != '\t' && c != '\n' && c != '\r' {
                break;
            }
            self.consume_char();
        }
    }

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_second_char(&self) -> Option<char> {
        let mut chars = self.input[self.pos..].chars();
        chars.next()?;
        chars.next()
    }

    fn consume_char(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.pos += c.len_utf8();
        Some(c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    fn kinds(input: &str) -> Vec<TokenKind<'_>> {
        let mut lexer = Lexer::new(input);
        let mut out = Vec::new();
        loop {
            let token = lexer.next_token();
            let is_eof = token.kind == TokenKind::Eof;
            out.push(token.kind);
            if is_eof {
                break;
            }
        }
        out
    }

    #[test]
    fn lexes_representative_program() {
        let input = indoc! {r#"
            let five = 5;
            let add = fn(x, y) {
                x + y;
            };
            let result = add(five, 10);
            if (5 < 10) { return true; } else { return false; }
            "hello" << [1, 2][0];
            {"key": 7 % 2}
        "#};

        let expected = vec![
            TokenKind::Let,
            TokenKind::Ident("five"),
            TokenKind::Assign,
            TokenKind::Int("5"),
            TokenKind::Semicolon,
            TokenKind::Let,
            TokenKind::Ident("add"),
            TokenKind::Assign,
            TokenKind::Function,
            TokenKind::LParen,
            TokenKind::Ident("x"),
            TokenKind::Comma,
            TokenKind::Ident("y"),
            TokenKind::RParen,
            TokenKind::LBrace,
            TokenKind::Ident("x"),
            TokenKind::Plus,
            TokenKind::Ident("y"),
            TokenKind::Semicolon,
            TokenKind::RBrace,
            TokenKind::Semicolon,
            TokenKind::Let,
            TokenKind::Ident("result"),
            TokenKind::Assign,
            TokenKind::Ident("add"),
            TokenKind::LParen,
            TokenKind::Ident("five"),
            TokenKind::Comma,
            TokenKind::Int("10"),
            TokenKind::RParen,
            TokenKind::Semicolon,
            TokenKind::If,
            TokenKind::LParen,
            TokenKind::Int("5"),
            TokenKind::Lt,
            TokenKind::Int("10"),
            TokenKind::RParen,
            TokenKind::LBrace,
            TokenKind::Return,
            TokenKind::True,
            TokenKind::Semicolon,
            TokenKind::RBrace,
            TokenKind::Else,
            TokenKind::LBrace,
            TokenKind::Return,
            TokenKind::False,
            TokenKind::Semicolon,
            TokenKind::RBrace,
            TokenKind::Str("hello"),
            TokenKind::Shl,
            TokenKind::LBracket,
            TokenKind::Int("1"),
            TokenKind::Comma,
            TokenKind::Int("2"),
            TokenKind::RBracket,
            TokenKind::LBracket,
            TokenKind::Int("0"),
            TokenKind::RBracket,
            TokenKind::Semicolon,
            TokenKind::LBrace,
            TokenKind::Str("key"),
            TokenKind::Colon,
            TokenKind::Int("7"),
            TokenKind::Percent,
            TokenKind::Int("2"),
            TokenKind::RBrace,
            TokenKind::Eof,
        ];

        assert_eq!(kinds(input), expected);
    }

    #[test]
    fn round_trips_every_fixed_token_kind() {
        let table: Vec<(&str, TokenKind<'_>)> = vec![
            ("=", TokenKind::Assign),
            ("+", TokenKind::Plus),
            ("-", TokenKind::Minus),
            ("/", TokenKind::Slash),
            ("*", TokenKind::Asterisk),
            ("!", TokenKind::Bang),
            ("^", TokenKind::Caret),
            ("|", TokenKind::Pipe),
            ("&", TokenKind::Ampersand),
            ("<", TokenKind::Lt),
            (">", TokenKind::Gt),
            ("%", TokenKind::Percent),
            ("==", TokenKind::Eq),
            ("!=", TokenKind::NotEq),
            (">=", TokenKind::Ge),
            ("<=", TokenKind::Le),
            ("^=", TokenKind::CaretAssign),
            ("|=", TokenKind::PipeAssign),
            ("&=", TokenKind::AmpersandAssign),
            ("+=", TokenKind::PlusAssign),
            ("-=", TokenKind::MinusAssign),
            ("*=", TokenKind::AsteriskAssign),
            ("/=", TokenKind::SlashAssign),
            ("%=", TokenKind::PercentAssign),
            ("&&", TokenKind::And),
            ("||", TokenKind::Or),
            ("<<", TokenKind::Shl),
            (">>", TokenKind::Shr),
            (",", TokenKind::Comma),
            (";", TokenKind::Semicolon),
            (":", TokenKind::Colon),
            ("(", TokenKind::LParen),
            (")", TokenKind::RParen),
            ("{", TokenKind::LBrace),
            ("}", TokenKind::RBrace),
            ("[", TokenKind::LBracket),
            ("]", TokenKind::RBracket),
            ("fn", TokenKind::Function),
            ("let", TokenKind::Let),
            ("true", TokenKind::True),
            ("false", TokenKind::False),
            ("return", TokenKind::Return),
            ("if", TokenKind::If),
            ("else", TokenKind::Else),
        ];

        for (literal, expected) in table {
            assert_eq!(
                kinds(literal),
                vec![expected, TokenKind::Eof],
                "literal {literal:?}"
            );
            assert_eq!(expected.literal(), literal);
        }
    }

    #[test]
    fn question_and_bang_are_identifier_characters() {
        assert_eq!(
            kinds("empty? sort!"),
            vec![
                TokenKind::Ident("empty?"),
                TokenKind::Ident("sort!"),
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn bang_before_digit_is_an_operator() {
        assert_eq!(
            kinds("!5"),
            vec![TokenKind::Bang, TokenKind::Int("5"), TokenKind::Eof]
        );
    }

    #[test]
    fn bang_equals_is_a_single_token() {
        assert_eq!(
            kinds("a != b"),
            vec![
                TokenKind::Ident("a"),
                TokenKind::NotEq,
                TokenKind::Ident("b"),
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn unrecognized_byte_is_illegal() {
        assert_eq!(
            kinds("1 @ 2"),
            vec![
                TokenKind::Int("1"),
                TokenKind::Illegal("@"),
                TokenKind::Int("2"),
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn string_runs_to_closing_quote_without_escapes() {
        assert_eq!(
            kinds(r#""hello world" "a\b""#),
            vec![
                TokenKind::Str("hello world"),
                TokenKind::Str(r"a\b"),
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn unterminated_string_runs_to_end_of_input() {
        assert_eq!(
            kinds(r#""abc"#),
            vec![TokenKind::Str("abc"), TokenKind::Eof]
        );
    }

    #[test]
    fn eof_is_sticky() {
        let mut lexer = Lexer::new("1");
        assert_eq!(lexer.next_token().kind, TokenKind::Int("1"));
        assert_eq!(lexer.next_token().kind, TokenKind::Eof);
        assert_eq!(lexer.next_token().kind, TokenKind::Eof);
    }
}
