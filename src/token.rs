/// Lexical token kinds. Variable-content kinds borrow their text from the
/// source string; fixed kinds carry no payload and derive their literal text
/// from the kind itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind<'a> {
    Illegal(&'a str),
    Eof,

    Ident(&'a str),
    Int(&'a str),
    Str(&'a str),

    // Single-char operators
    Assign,
    Plus,
    Minus,
    Slash,
    Asterisk,
    Bang,
    Caret,
    Pipe,
    Ampersand,
    Lt,
    Gt,
    Percent,

    // Two-char operators
    Eq,
    NotEq,
    Ge,
    Le,
    CaretAssign,
    PipeAssign,
    AmpersandAssign,
    PlusAssign,
    MinusAssign,
    AsteriskAssign,
    SlashAssign,
    PercentAssign,
    And,
    Or,
    Shl,
    Shr,

    // Delimiters
    Comma,
    Semicolon,
    Colon,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,

    // Keywords
    Function,
    Let,
    True,
    False,
    Return,
    If,
    Else,
}

impl<'a> TokenKind<'a> {
    /// Token-type name used in parser diagnostics. Operators and delimiters
    /// name themselves; content-bearing kinds and keywords use uppercase tags.
    pub fn type_name(&self) -> &'static str {
        match self {
            TokenKind::Illegal(_) => "ILLEGAL",
            TokenKind::Eof => "EOF",
            TokenKind::Ident(_) => "IDENT",
            TokenKind::Int(_) => "INT",
            TokenKind::Str(_) => "STRING",
            TokenKind::Assign => "=",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Slash => "/",
            TokenKind::Asterisk => "*",
            TokenKind::Bang => "!",
            TokenKind::Caret => "^",
            TokenKind::Pipe => "|",
            TokenKind::Ampersand => "&",
            TokenKind::Lt => "<",
            TokenKind::Gt => ">",
            TokenKind::Percent => "%",
            TokenKind::Eq => "==",
            TokenKind::NotEq => "!=",
            TokenKind::Ge => ">=",
            TokenKind::Le => "<=",
            TokenKind::CaretAssign => "^=",
            TokenKind::PipeAssign => "|=",
            TokenKind::AmpersandAssign => "&=",
            TokenKind::PlusAssign => "+=",
            TokenKind::MinusAssign => "-=",
            TokenKind::AsteriskAssign => "*=",
            TokenKind::SlashAssign => "/=",
            TokenKind::PercentAssign => "%=",
            TokenKind::And => "&&",
            TokenKind::Or => "||",
            TokenKind::Shl => "<<",
            TokenKind::Shr => ">>",
            TokenKind::Comma => ",",
            TokenKind::Semicolon => ";",
            TokenKind::Colon => ":",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::LBracket => "[",
            TokenKind::RBracket => "]",
            TokenKind::Function => "FUNCTION",
            TokenKind::Let => "LET",
            TokenKind::True => "TRUE",
            TokenKind::False => "FALSE",
            TokenKind::Return => "RETURN",
            TokenKind::If => "IF",
            TokenKind::Else => "ELSE",
        }
    }

    /// The literal source text this token stands for.
    pub fn literal(&self) -> &'a str {
        match *self {
            TokenKind::Illegal(text)
            | TokenKind::Ident(text)
            | TokenKind::Int(text)
            | TokenKind::Str(text) => text,
            TokenKind::Eof => "",
            TokenKind::Function => "fn",
            TokenKind::Let => "let",
            TokenKind::True => "true",
            TokenKind::False => "false",
            TokenKind::Return => "return",
            TokenKind::If => "if",
            TokenKind::Else => "else",
            fixed => fixed.type_name(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind<'a>,
}

impl<'a> Token<'a> {
    pub fn new(kind: TokenKind<'a>) -> Self {
        Self { kind }
    }

    pub fn literal(&self) -> &'a str {
        self.kind.literal()
    }
}
