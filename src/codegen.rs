//! Go code emission.
//!
//! Each process becomes a fragment of Go: restricted channels are `make`d,
//! parallel components run in goroutines, replication is an endless loop.

use crate::par::{
    error::Result,
    name::Name,
    process::Process,
    types::{check, Type},
};
use std::fmt::Write;

#[derive(Clone, Copy, Debug, Default)]
pub struct GenOptions {
    /// Wrap the fragment in `package main` and `func main()`.
    pub main: bool,
    /// Prefix the calculus as a comment and mark start and end on stderr.
    pub debug: bool,
}

/// Type-checks `process` and writes it as a Go fragment.
pub fn generate(process: &mut Process, w: &mut impl Write) -> Result<()> {
    check(process)?;
    gen(process, w)?;
    Ok(())
}

pub fn generate_with(process: &mut Process, options: GenOptions, w: &mut impl Write) -> Result<()> {
    let mut program = String::new();
    if options.main {
        writeln!(program, "package main\nfunc main() {{")?;
    }
    if options.debug {
        writeln!(program, "// Process {}", process)?;
        write!(program, r#"fmt.Fprintln(os.Stderr, "--- start ---");"#)?;
    }
    generate(process, &mut program)?;
    if options.debug {
        write!(program, r#"fmt.Fprintln(os.Stderr, "--- end ---");"#)?;
    }
    if options.main {
        write!(program, "\n}}")?;
    }
    w.write_str(&program)?;
    Ok(())
}

fn joined(w: &mut impl Write, names: &[Name], sep: char) -> std::fmt::Result {
    for (i, name) in names.iter().enumerate() {
        if i > 0 {
            w.write_char(sep)?;
        }
        write!(w, "{}", name.ident())?;
    }
    Ok(())
}

fn gen(process: &Process, w: &mut impl Write) -> std::fmt::Result {
    match process {
        Process::Inaction => write!(w, "/* end */"),

        Process::Parallel(procs) => {
            let Some((last, rest)) = procs.split_last() else {
                return Ok(());
            };
            for proc in rest {
                write!(w, "go func(){{ ")?;
                gen(proc, w)?;
                writeln!(w, " }}()")?;
            }
            gen(last, w)
        }

        Process::Replicate(body) => {
            write!(w, "for {{ ")?;
            gen(body, w)?;
            write!(w, " }};")
        }

        Process::Restrict(name, body) => {
            match name.typ().deref() {
                chan @ Type::Chan(_) => write!(w, "{} := make({}); ", name.ident(), chan)?,
                typ => write!(w, "var {} {}; ", name.ident(), typ)?,
            }
            gen(body, w)
        }

        Process::Receive(chan, vars, cont) => {
            match vars.as_slice() {
                [] => write!(w, "<-{};", chan.ident())?,
                [var] => write!(w, "{} := <-{};", var.ident(), chan.ident())?,
                _ => {
                    write!(w, "rcvd := <-{};", chan.ident())?;
                    joined(w, vars, ',')?;
                    write!(w, ":=")?;
                    for i in 0..vars.len() {
                        if i > 0 {
                            write!(w, ",")?;
                        }
                        write!(w, "rcvd.e{}", i)?;
                    }
                    write!(w, ";")?;
                }
            }
            gen(cont, w)
        }

        Process::Send(chan, values) => match values.as_slice() {
            [] => write!(w, "{} <- struct{{}}{{}};", chan.ident()),
            [value] => write!(w, "{} <- {};", chan.ident(), value.ident()),
            _ => {
                write!(w, "{} <- struct {{", chan.ident())?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        write!(w, ";")?;
                    }
                    write!(w, "e{} {}", i, value.typ())?;
                }
                write!(w, "}}{{")?;
                joined(w, values, ',')?;
                write!(w, "}}")
            }
        },
    }
}
