use crate::location::{Point, Span};
use winnow::{
    combinator::peek,
    error::{EmptyError, ParserError},
    stream::TokenSlice,
    token::{any, literal, take_while},
    Parser, Result,
};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TokenKind {
    LParen,
    RParen,
    Lt,
    Gt,

    Dot,
    Colon,
    Comma,
    Bar,
    Bang,
    Semicolon,

    Identifier,
    Nil,
    New,

    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'i> {
    pub kind: TokenKind,
    pub raw: &'i str,
    pub span: Span,
}

impl PartialEq<TokenKind> for Token<'_> {
    fn eq(&self, other: &TokenKind) -> bool {
        self.kind == *other
    }
}

impl TokenKind {
    pub fn expected(&self) -> &'static str {
        match self {
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::Lt => "<",
            TokenKind::Gt => ">",

            TokenKind::Dot => ".",
            TokenKind::Colon => ":",
            TokenKind::Comma => ",",
            TokenKind::Bar => "|",
            TokenKind::Bang => "!",
            TokenKind::Semicolon => ";",

            TokenKind::Identifier => "identifier",
            TokenKind::Nil => "0",
            TokenKind::New => "new",

            TokenKind::Unknown => "???",
        }
    }
}

impl<'i, E> Parser<Tokens<'i>, &'i Token<'i>, E> for TokenKind
where
    E: ParserError<Tokens<'i>>,
{
    fn parse_next(&mut self, input: &mut Tokens<'i>) -> Result<&'i Token<'i>, E> {
        literal(*self).parse_next(input).map(|t| &t[0])
    }
}

pub type Tokens<'i> = TokenSlice<'i, Token<'i>>;
pub type Input<'a> = Tokens<'a>;

fn is_ident_char(c: char) -> bool {
    matches!(c, 'a'..='z' | 'A'..='Z' | '0'..='9' | '_' | '-')
}

pub fn lex(input: &str) -> Vec<Token<'_>> {
    type Error = EmptyError;
    let source = input;
    let mut input = input;
    let input = &mut input;
    let mut row = 0;
    let mut line_start = 0;
    let mut tokens = Vec::new();

    while let Ok(c) = peek(any::<&str, Error>).parse_next(input) {
        let offset = source.len() - input.len();
        let column = offset - line_start;
        let lexed: Result<Option<(&str, TokenKind)>, Error> = match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' => take_while(1.., is_ident_char)
                .parse_next(input)
                .map(|raw: &str| {
                    let kind = match raw {
                        "0" => TokenKind::Nil,
                        "new" => TokenKind::New,
                        _ if raw.starts_with(|c: char| c.is_ascii_digit()) => TokenKind::Unknown,
                        _ => TokenKind::Identifier,
                    };
                    Some((raw, kind))
                }),
            '\n' => any::<&str, Error>.parse_next(input).map(|_| {
                row += 1;
                line_start = offset + 1;
                None
            }),
            ' ' | '\t' | '\r' => any::<&str, Error>.parse_next(input).map(|_| None),
            _ => any::<&str, Error>.take().parse_next(input).map(|raw: &str| {
                let kind = match c {
                    '(' => TokenKind::LParen,
                    ')' => TokenKind::RParen,
                    '<' => TokenKind::Lt,
                    '>' => TokenKind::Gt,
                    '.' => TokenKind::Dot,
                    ':' => TokenKind::Colon,
                    ',' => TokenKind::Comma,
                    '|' => TokenKind::Bar,
                    '!' => TokenKind::Bang,
                    ';' => TokenKind::Semicolon,
                    _ => TokenKind::Unknown,
                };
                Some((raw, kind))
            }),
        };
        let Ok(lexed) = lexed else {
            break;
        };
        let Some((raw, kind)) = lexed else {
            continue;
        };
        let start = Point {
            offset,
            row,
            column,
        };
        let end = Point {
            offset: offset + raw.len(),
            row,
            column: column + raw.len(),
        };
        tokens.push(Token {
            kind,
            raw,
            span: Span { start, end },
        });
    }
    tokens
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn tok() {
        let tokens = lex("(new a:int)!a<b,c> | a(x).0;");
        assert_eq!(
            tokens.iter().map(|x| x.kind).collect::<Vec<_>>(),
            vec![
                TokenKind::LParen,
                TokenKind::New,
                TokenKind::Identifier,
                TokenKind::Colon,
                TokenKind::Identifier,
                TokenKind::RParen,
                TokenKind::Bang,
                TokenKind::Identifier,
                TokenKind::Lt,
                TokenKind::Identifier,
                TokenKind::Comma,
                TokenKind::Identifier,
                TokenKind::Gt,
                TokenKind::Bar,
                TokenKind::Identifier,
                TokenKind::LParen,
                TokenKind::Identifier,
                TokenKind::RParen,
                TokenKind::Dot,
                TokenKind::Nil,
                TokenKind::Semicolon,
            ]
        );
    }

    #[test]
    fn identifiers() {
        let tokens = lex("a-b_1 new_ 01 new");
        assert_eq!(
            tokens.iter().map(|x| (x.kind, x.raw)).collect::<Vec<_>>(),
            vec![
                (TokenKind::Identifier, "a-b_1"),
                (TokenKind::Identifier, "new_"),
                (TokenKind::Unknown, "01"),
                (TokenKind::New, "new"),
            ]
        );
    }

    #[test]
    fn positions() {
        let tokens = lex("a<>\n  b(x).0");
        let b = &tokens[3];
        assert_eq!(b.raw, "b");
        assert_eq!(
            b.span.start,
            Point {
                offset: 6,
                row: 1,
                column: 2
            }
        );
        assert_eq!(b.span.end.offset, 7);
    }
}
