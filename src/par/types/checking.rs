use super::{Type, TypeError};
use crate::par::{bind::bind, error::Result, name::Name, process::Process};
use std::fmt::Write;

/// Element type of a channel carrying `names`: a reference to the single
/// name, or a composite of references.
fn element(names: &[Name]) -> Type {
    let mut elems: Vec<Type> = names
        .iter()
        .map(|name| match name.typ() {
            typ @ Type::Reference(_) => typ,
            _ => name.reference(),
        })
        .collect();
    match elems.len() {
        1 => elems.remove(0),
        _ => Type::Composite(elems),
    }
}

/// Gives every channel a type shaped after the values it carries.
///
/// A send always (re)types its channel; a receive types its channel only
/// when nothing has typed it yet. Element types are references, so they
/// follow whatever [`unify`] later learns about the values.
pub fn infer(process: &Process) -> Result<()> {
    match process {
        Process::Inaction => Ok(()),
        Process::Parallel(procs) => {
            for proc in procs {
                infer(proc)?;
            }
            Ok(())
        }
        Process::Receive(chan, vars, cont) => {
            infer(cont)?;
            if chan.typ().is_untyped() {
                chan.set_type(Type::chan(element(vars)))?;
            }
            Ok(())
        }
        Process::Send(chan, values) => chan.set_type(Type::chan(element(values))),
        Process::Replicate(body) | Process::Restrict(_, body) => infer(body),
    }
}

/// Propagates types between each receive's channel and its variables.
///
/// Run after [`infer`]. Fails on the first conflict.
pub fn unify(process: &Process) -> Result<()> {
    match process {
        Process::Inaction | Process::Send(..) => Ok(()),
        Process::Parallel(procs) => {
            for proc in procs {
                unify(proc)?;
            }
            Ok(())
        }
        Process::Receive(chan, vars, cont) => {
            unify_receive(chan, vars)?;
            unify(cont)
        }
        Process::Replicate(body) | Process::Restrict(_, body) => unify(body),
    }
}

fn unify_receive(chan: &Name, vars: &[Name]) -> Result<()> {
    let elem = match chan.typ().deref() {
        Type::Chan(elem) => *elem,
        found => {
            return Err(TypeError::NotAChannel {
                chan: chan.ident(),
                span: chan.span(),
                found,
            }
            .into())
        }
    };
    if elem.arity() != vars.len() {
        return Err(TypeError::Arity {
            chan: chan.ident(),
            span: chan.span(),
            got: elem.arity(),
            expected: vars.len(),
        }
        .into());
    }
    for (elem, var) in elem.elems().iter().zip(vars) {
        unify_var(chan, elem, var)?;
    }
    Ok(())
}

fn unify_var(chan: &Name, elem: &Type, var: &Name) -> Result<()> {
    let found = var.typ();

    // channel to variable
    if found.is_untyped() {
        if !elem.refers_to(var) {
            var.set_type(elem.clone())?;
        }
        return Ok(());
    }

    // variable to channel
    if elem.deref().is_untyped() {
        if let Some(target) = elem.terminal() {
            if !target.same(var) && !found.refers_to(&target) {
                target.set_type(found)?;
            }
            return Ok(());
        }
    }
    if found.deref().is_untyped() {
        if let Some(target) = found.terminal() {
            if !elem.refers_to(&target) {
                target.set_type(elem.clone())?;
            }
            return Ok(());
        }
    }

    if elem.equals(&found) {
        return Ok(());
    }
    Err(TypeError::Mismatch {
        chan: chan.ident(),
        span: chan.span(),
        expected: elem.deref(),
        found: found.deref(),
    }
    .into())
}

/// Binds, infers and unifies.
pub fn check(process: &mut Process) -> Result<()> {
    bind(process);
    infer(process)?;
    unify(process)
}

/// One-line summary of the channel types used by a process.
pub fn process_types(process: &Process) -> String {
    let mut out = String::new();
    // writing into a String cannot fail
    let _ = write_types(&mut out, process);
    out
}

fn write_types(f: &mut impl Write, process: &Process) -> std::fmt::Result {
    match process {
        Process::Inaction => write!(f, "0"),
        Process::Send(chan, _) => write!(f, "{}!{}", chan.ident(), chan.typ()),
        Process::Receive(chan, _, cont) => {
            write!(f, "{}?{}; ", chan.ident(), chan.typ())?;
            write_types(f, cont)
        }
        Process::Parallel(procs) => {
            for (i, proc) in procs.iter().enumerate() {
                if i > 0 {
                    write!(f, "|")?;
                }
                write_types(f, proc)?;
            }
            Ok(())
        }
        Process::Replicate(body) => {
            write!(f, "*")?;
            write_types(f, body)
        }
        Process::Restrict(name, body) => {
            write!(f, "(ν{}:{}) ", name.ident(), name.typ())?;
            write_types(f, body)
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::par::{error::Error, parser::parse};

    fn bound(src: &str) -> Process {
        let mut p = parse(src).unwrap();
        bind(&mut p);
        p
    }

    /// Types of restricted names, outermost first.
    fn restricted_types(p: &Process) -> Vec<String> {
        p.breadth_first()
            .into_iter()
            .filter_map(|p| match p {
                Process::Restrict(name, _) => Some(name.typ().to_string()),
                _ => None,
            })
            .collect()
    }

    /// Types of the variables of the first receive.
    fn var_types(p: &Process) -> Vec<String> {
        p.breadth_first()
            .into_iter()
            .find_map(|p| match p {
                Process::Receive(_, vars, _) => {
                    Some(vars.iter().map(|v| v.typ().to_string()).collect())
                }
                _ => None,
            })
            .unwrap_or_default()
    }

    #[test]
    fn basic_infer_only() {
        let p = bound("(new a)(new b)(new c:T)(a<b,c>|a(y,z).b<z>)");
        infer(&p).unwrap();
        assert_eq!(
            restricted_types(&p),
            vec!["chan struct{e0 chan interface{};e1 T}", "chan interface{}", "T"]
        );
        assert_eq!(var_types(&p), vec!["interface{}", "interface{}"]);
    }

    #[test]
    fn basic_infer_unify() {
        let p = bound("(new a)(new b)(new c:T)(a<b,c>|a(y,z).b<z>)");
        infer(&p).unwrap();
        unify(&p).unwrap();
        assert_eq!(
            restricted_types(&p),
            vec!["chan struct{e0 chan T;e1 T}", "chan T", "T"]
        );
        assert_eq!(var_types(&p), vec!["chan T", "T"]);
    }

    #[test]
    fn sends_override_hints() {
        let p = bound("(new a:TA)(new b:T)(new c)(a<b,c>|a(x,y).0)");
        infer(&p).unwrap();
        assert_eq!(var_types(&p), vec!["interface{}", "interface{}"]);
        unify(&p).unwrap();
        assert_eq!(
            restricted_types(&p),
            vec!["chan struct{e0 T;e1 interface{}}", "T", "interface{}"]
        );
        assert_eq!(var_types(&p), vec!["T", "interface{}"]);
    }

    #[test]
    fn higher_order() {
        let p = bound("(new a)(new b)(a<b>|a(x).x().0)");
        infer(&p).unwrap();
        assert_eq!(restricted_types(&p), vec!["chan interface{}", "interface{}"]);
        assert_eq!(var_types(&p), vec!["chan struct{}"]);
        unify(&p).unwrap();
        assert_eq!(restricted_types(&p), vec!["chan chan struct{}", "chan struct{}"]);
        assert_eq!(var_types(&p), vec!["chan struct{}"]);
    }

    #[test]
    fn nested_and_name_passing() {
        for src in [
            "(new a)(new b)(new c:T)(a<b,c> | a(y,z).b<c,z>)",
            "(new a)(new b)(new c:T)(a<b,c> | a(y,z).y<c,z>)",
        ] {
            let mut p = parse(src).unwrap();
            check(&mut p).unwrap();
            let types = restricted_types(&p);
            assert_eq!(types[0], "chan struct{e0 chan struct{e0 T;e1 T};e1 T}");
            assert_eq!(types[1], "chan struct{e0 T;e1 T}");
        }

        let mut p = parse("(new a)(new b)(new c:T)(a<b,c> | a(y,z).y<z>)").unwrap();
        check(&mut p).unwrap();
        let types = restricted_types(&p);
        assert_eq!(types[0], "chan struct{e0 chan T;e1 T}");
        assert_eq!(types[1], "chan T");
    }

    #[test]
    fn multiple_compatible_senders() {
        let mut p = parse("(new b)a(x).(x<b>|x<z>)").unwrap();
        check(&mut p).unwrap();
    }

    #[test]
    fn arity_mismatch() {
        let mut p = parse("(new a,b)(a(b,c).0 | a<>)").unwrap();
        let error = check(&mut p).unwrap_err();
        assert!(matches!(
            error,
            Error::Type(TypeError::Arity {
                got: 0,
                expected: 2,
                ..
            })
        ));
    }

    #[test]
    fn conflicting_types() {
        let mut p = parse("(new a)(new b:int)(a<b> | a(x).x<>)").unwrap();
        let error = check(&mut p).unwrap_err();
        let Error::Type(error @ TypeError::Mismatch { .. }) = error else {
            panic!("expected a mismatch");
        };
        // bound occurrences carry the span of their binder
        assert_eq!(error.span().map(|s| s.start.offset), Some(5));
        assert!(error.to_string().contains("int"));
    }

    #[test]
    fn receiving_on_a_base_type() {
        let mut p = parse("(new a:int)a(x).0").unwrap();
        let error = check(&mut p).unwrap_err();
        assert!(matches!(error, Error::Type(TypeError::NotAChannel { .. })));
    }

    #[test]
    fn variables_never_reference_themselves() {
        let mut p = parse("a(x).a<x>").unwrap();
        check(&mut p).unwrap();
        let Process::Receive(_, vars, _) = &p else {
            panic!("expected receive");
        };
        assert!(vars[0].typ().is_untyped());
    }

    #[test]
    fn summary() {
        let mut p = parse("(new a)(a<b> | !a(x).0)").unwrap();
        check(&mut p).unwrap();
        assert_eq!(
            process_types(&p),
            "(νa:chan interface{}) a!chan interface{}|*a?chan interface{}; 0"
        );
    }
}
