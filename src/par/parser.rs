use super::{
    lexer::{lex, Input, Token, TokenKind},
    name::Name,
    process::Process,
};
use crate::location::{Span, Spanning};
use miette::{SourceOffset, SourceSpan};
use winnow::{
    combinator::{
        alt, cut_err, eof, opt, preceded, separated, separated_foldl1, terminated, trace,
    },
    error::{ContextError, ErrMode, ModalError, ParserError, StrContext, StrContextValue},
    stream::Stream,
    Parser,
};

pub type Error = ErrMode<ContextError>;
pub type Result<O> = core::result::Result<O, Error>;

/// Token with additional context of expecting the `token` value
fn t<'i>(kind: TokenKind) -> impl Parser<Input<'i>, &'i Token<'i>, Error> {
    kind.context(StrContext::Expected(StrContextValue::StringLiteral(
        kind.expected(),
    )))
}

fn commit_after<Input, Prefix, Output, Error, PrefixParser, ParseNext>(
    prefix: PrefixParser,
    parser: ParseNext,
) -> impl Parser<Input, (Prefix, Output), Error>
where
    Input: Stream,
    Error: ParserError<Input> + ModalError,
    PrefixParser: Parser<Input, Prefix, Error>,
    ParseNext: Parser<Input, Output, Error>,
{
    trace("commit_after", (prefix, cut_err(parser)))
}

fn name(input: &mut Input) -> Result<Name> {
    t(TokenKind::Identifier)
        .map(|tok| Name::new(tok.raw).located(tok.span))
        .context(StrContext::Label("name"))
        .parse_next(input)
}

fn names(input: &mut Input) -> Result<Vec<Name>> {
    separated(0.., name, t(TokenKind::Comma)).parse_next(input)
}

/// `a` or `a:T`, the latter recording `T` as a type hint.
fn binder(input: &mut Input) -> Result<Name> {
    (
        t(TokenKind::Identifier),
        opt(preceded(t(TokenKind::Colon), cut_err(t(TokenKind::Identifier)))),
    )
        .map(|(tok, hint)| {
            let name = match hint {
                Some(hint) => Name::hinted(tok.raw, hint.raw),
                None => Name::new(tok.raw),
            };
            name.located(tok.span)
        })
        .context(StrContext::Label("restricted name"))
        .parse_next(input)
}

fn binders(input: &mut Input) -> Result<Vec<Name>> {
    separated(1.., binder, t(TokenKind::Comma)).parse_next(input)
}

/// One or more atoms separated by `|`, grouped to the left:
/// `P | Q | R` is `(P | Q) | R`.
fn process(input: &mut Input) -> Result<Process> {
    separated_foldl1(atom, t(TokenKind::Bar), |left, _, right| {
        Process::par(left, right)
    })
    .parse_next(input)
}

fn atom(input: &mut Input) -> Result<Process> {
    alt((nil, replicate, restrict, send, receive, grouped))
        .context(StrContext::Label("process"))
        .parse_next(input)
}

fn nil(input: &mut Input) -> Result<Process> {
    t(TokenKind::Nil)
        .map(|_| Process::Inaction)
        .parse_next(input)
}

fn replicate(input: &mut Input) -> Result<Process> {
    commit_after(t(TokenKind::Bang), atom)
        .map(|(_, body)| Process::replicate(body))
        .parse_next(input)
}

fn restrict(input: &mut Input) -> Result<Process> {
    commit_after(
        (t(TokenKind::LParen), t(TokenKind::New)),
        (binders, t(TokenKind::RParen), atom),
    )
    .map(|(_, (names, _, body))| Process::restricts(names, body))
    .context(StrContext::Label("restriction"))
    .parse_next(input)
}

fn send(input: &mut Input) -> Result<Process> {
    commit_after((name, t(TokenKind::Lt)), (names, t(TokenKind::Gt)))
        .map(|((chan, _), (values, _))| Process::send(chan, values))
        .context(StrContext::Label("send"))
        .parse_next(input)
}

fn receive(input: &mut Input) -> Result<Process> {
    commit_after(
        (name, t(TokenKind::LParen)),
        (names, t(TokenKind::RParen), t(TokenKind::Dot), atom),
    )
    .map(|((chan, _), (vars, _, _, cont))| Process::receive(chan, vars, cont))
    .context(StrContext::Label("receive"))
    .parse_next(input)
}

fn grouped(input: &mut Input) -> Result<Process> {
    commit_after(t(TokenKind::LParen), (process, t(TokenKind::RParen)))
        .map(|(_, (proc, _))| proc)
        .parse_next(input)
}

#[derive(Debug, Clone, miette::Diagnostic)]
#[diagnostic(severity(Error))]
pub struct SyntaxError {
    #[label]
    source_span: SourceSpan,
    #[help]
    help: String,

    span: Span,
    message: String,
}

impl SyntaxError {
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The offending source line with a `^` under the failing column.
    pub fn caret_diagnostic(&self, source: &str) -> String {
        self.span.start.caret_diagnostic(source)
    }
}

impl Spanning for SyntaxError {
    fn span(&self) -> Span {
        self.span
    }
}

impl core::fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Syntax error at {}.", self.span.start)
    }
}

impl core::error::Error for SyntaxError {}

pub fn set_miette_hook() {
    _ = miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .color(false)
                .build(),
        )
    }));
}

/// Parses a process written in the calculus syntax.
///
/// The result is unbound: every occurrence of a label is its own [`Name`]
/// until [`bind`](super::bind::bind) runs.
pub fn parse(source: &str) -> core::result::Result<Process, SyntaxError> {
    let tokens = lex(source);
    let mut input = Input::new(&tokens);
    let start = input.checkpoint();
    let error = match terminated(
        process,
        eof.context(StrContext::Expected(StrContextValue::Description(
            "end of input",
        ))),
    )
    .parse_next(&mut input)
    {
        Ok(process) => return Ok(process),
        Err(error) => error,
    };
    let offset = winnow::stream::Offset::offset_from(&input, &start);
    let error = error.into_inner().unwrap_or_else(|_| ContextError::new());

    let span = match tokens.get(offset) {
        Some(tok) => tok.span,
        None => tokens
            .last()
            .map(|tok| tok.span.end.point_span())
            .unwrap_or_default(),
    };
    let source_span = SourceSpan::new(SourceOffset::from(span.start.offset), {
        match span.len() {
            // miette unicode format for 1 length span is a hard-to-notice line, so don't set length to 1.
            1 => 0,
            x => x,
        }
    });
    Err(SyntaxError {
        source_span,
        help: error.to_string(),
        span,
        message: format!("Syntax error at {}.", span.start),
    })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn round_trips() {
        for src in [
            "0",
            "a(b,c).0",
            "!a(b,c).0",
            "!(a(u,v).0 | a<b,c>)",
            "(new a)a(x,y).0",
            "(new a)(a(x,y).0 | a<b,c>)",
            "a<b,c>",
            "a<>",
            "a().b().0",
        ] {
            let p = parse(src).unwrap();
            assert_eq!(p.calculi(), src);
            assert_eq!(parse(&p.calculi()).unwrap().calculi(), src);
        }
    }

    #[test]
    fn whitespace_is_insignificant() {
        let p = parse("  (new a)\n( a( x , y ).0|a< b,c > )").unwrap();
        assert_eq!(p.calculi(), "(new a)(a(x,y).0 | a<b,c>)");
    }

    #[test]
    fn parallel_chains_group_to_the_left() {
        let p = parse("a<> | b<> | c<>").unwrap();
        let Process::Parallel(procs) = &p else {
            panic!("expected parallel, got {}", p);
        };
        assert_eq!(procs.len(), 2);
        assert!(matches!(procs[0], Process::Parallel(_)));
        assert_eq!(p.calculi(), "((a<> | b<>) | c<>)");
        assert_eq!(
            parse("a<> | b<> | c<> | d<>").unwrap().calculi(),
            "(((a<> | b<>) | c<>) | d<>)"
        );

        let q = parse("a<> | (b<> | c<>)").unwrap();
        assert_eq!(q.calculi(), "(a<> | (b<> | c<>))");
    }

    #[test]
    fn prefixes_bind_tighter_than_parallel() {
        let p = parse("!a<> | a().0").unwrap();
        assert_eq!(p.calculi(), "(!a<> | a().0)");
        let q = parse("(new a)a<> | b<>").unwrap();
        assert_eq!(q.calculi(), "((new a)a<> | b<>)");
    }

    #[test]
    fn restriction_sugar_and_hints() {
        let p = parse("(new a:int, b)a<b>").unwrap();
        assert_eq!(p.calculi(), "(new a)(new b)a<b>");
        let Process::Restrict(a, body) = &p else {
            panic!("expected restriction");
        };
        assert_eq!(a.hint().as_deref(), Some("int"));
        assert_eq!(a.typ().to_string(), "int");
        let Process::Restrict(b, _) = &**body else {
            panic!("expected restriction");
        };
        assert!(b.hint().is_none());
        assert!(b.typ().is_untyped());
    }

    #[test]
    fn names_are_located() {
        let p = parse("a<bc>").unwrap();
        let Process::Send(_, values) = &p else {
            panic!("expected send");
        };
        let span = values[0].span().unwrap();
        assert_eq!((span.start.offset, span.end.offset), (2, 4));
    }

    #[test]
    fn empty_input_is_an_error() {
        assert!(parse("").is_err());
        assert!(parse("   \n").is_err());
    }

    #[test]
    fn errors_point_at_offending_token() {
        let src = "a(x) | b<>";
        let error = parse(src).unwrap_err();
        assert_eq!(error.span().start.row, 0);
        assert_eq!(error.span().start.column, 5);
        assert_eq!(error.caret_diagnostic(src), "   1 | a(x) | b<>\n     |      ^\n");

        let error = parse("a<b> & c<>").unwrap_err();
        assert_eq!(error.span().start.column, 5);

        assert!(parse("a<b").is_err());
        assert!(parse("1a<>").is_err());
        assert!(parse("new<>").is_err());
    }
}
