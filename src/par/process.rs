use super::name::Name;
use std::{
    collections::VecDeque,
    fmt::{self, Display, Write},
};

/// A process of the asynchronous π-calculus.
///
/// Names inside the tree are shared handles: once bound, every occurrence of
/// a bound label refers to the same [`Name`]. Cloning a process clones the
/// tree but keeps the names aliased.
#[derive(Clone, Debug, Default)]
pub enum Process {
    /// `0`
    #[default]
    Inaction,
    /// `u<v1,...,vn>`
    Send(Name, Vec<Name>),
    /// `u(x1,...,xn).P`
    Receive(Name, Vec<Name>, Box<Self>),
    /// `P | Q | ...`
    Parallel(Vec<Self>),
    /// `!P`
    Replicate(Box<Self>),
    /// `(new a)P`
    Restrict(Name, Box<Self>),
}

impl Process {
    pub fn send(chan: Name, values: Vec<Name>) -> Self {
        Self::Send(chan, values)
    }

    pub fn receive(chan: Name, vars: Vec<Name>, cont: Self) -> Self {
        Self::Receive(chan, vars, Box::new(cont))
    }

    pub fn par(left: Self, right: Self) -> Self {
        Self::Parallel(vec![left, right])
    }

    pub fn replicate(body: Self) -> Self {
        Self::Replicate(Box::new(body))
    }

    pub fn restrict(name: Name, body: Self) -> Self {
        Self::Restrict(name, Box::new(body))
    }

    /// `(new a,b,c)P` as nested single restrictions, outermost first.
    pub fn restricts(names: Vec<Name>, body: Self) -> Self {
        names
            .into_iter()
            .rev()
            .fold(body, |body, name| Self::restrict(name, body))
    }

    pub fn free_names(&self) -> Vec<Name> {
        match self {
            Self::Inaction => vec![],
            Self::Send(chan, values) => dedup(
                chan.free_names()
                    .into_iter()
                    .chain(values.iter().flat_map(Name::free_names))
                    .collect(),
            ),
            Self::Receive(chan, _, cont) => {
                dedup(chan.free_names().into_iter().chain(cont.free_names()).collect())
            }
            Self::Parallel(procs) => dedup(procs.iter().flat_map(Self::free_names).collect()),
            Self::Replicate(body) => body.free_names(),
            Self::Restrict(name, body) => {
                let mut names = dedup(body.free_names());
                if let Some(i) = names.iter().position(|n| n.ident() == name.ident()) {
                    names.remove(i);
                }
                names
            }
        }
    }

    pub fn free_vars(&self) -> Vec<Name> {
        match self {
            Self::Inaction => vec![],
            Self::Send(chan, values) => dedup(
                chan.free_vars()
                    .into_iter()
                    .chain(values.iter().flat_map(Name::free_vars))
                    .collect(),
            ),
            Self::Receive(chan, vars, cont) => {
                let bound: Vec<String> = vars.iter().map(Name::ident).collect();
                dedup(
                    cont.free_vars()
                        .into_iter()
                        .filter(|v| !bound.contains(&v.ident()))
                        .chain(chan.free_vars())
                        .collect(),
                )
            }
            Self::Parallel(procs) => dedup(procs.iter().flat_map(Self::free_vars).collect()),
            Self::Replicate(body) => body.free_vars(),
            Self::Restrict(_, body) => body.free_vars(),
        }
    }

    /// Immediate subprocesses, left to right.
    pub fn children(&self) -> Vec<&Self> {
        match self {
            Self::Inaction | Self::Send(..) => vec![],
            Self::Receive(_, _, cont) => vec![cont],
            Self::Parallel(procs) => procs.iter().collect(),
            Self::Replicate(body) | Self::Restrict(_, body) => vec![body],
        }
    }

    /// This process followed by all of its subprocesses, breadth-first.
    pub fn breadth_first(&self) -> Vec<&Self> {
        let mut order = vec![];
        let mut queue = VecDeque::from([self]);
        while let Some(proc) = queue.pop_front() {
            order.push(proc);
            queue.extend(proc.children());
        }
        order
    }

    /// Calculus rendering as a string.
    pub fn calculi(&self) -> String {
        self.to_string()
    }

    /// Indented tree dump with names shown with their sorts and types.
    pub fn pretty(&self, f: &mut impl Write, indent: usize) -> fmt::Result {
        indentation(f, indent)?;
        match self {
            Self::Inaction => write!(f, "0"),
            Self::Send(chan, values) => {
                write!(f, "send {}<", chan)?;
                names(f, values, Name::to_string)?;
                write!(f, ">")
            }
            Self::Receive(chan, vars, cont) => {
                write!(f, "recv {}(", chan)?;
                names(f, vars, Name::to_string)?;
                write!(f, ").")?;
                cont.pretty(f, indent + 1)
            }
            Self::Parallel(procs) => {
                write!(f, "par")?;
                for proc in procs {
                    proc.pretty(f, indent + 1)?;
                }
                Ok(())
            }
            Self::Replicate(body) => {
                write!(f, "repeat")?;
                body.pretty(f, indent + 1)
            }
            Self::Restrict(name, body) => {
                write!(f, "new {}", name)?;
                body.pretty(f, indent + 1)
            }
        }
    }
}

fn dedup(mut names: Vec<Name>) -> Vec<Name> {
    names.sort_by_key(Name::ident);
    names.dedup_by(|a, b| a.ident() == b.ident());
    names
}

fn names(f: &mut impl Write, names: &[Name], show: impl Fn(&Name) -> String) -> fmt::Result {
    for (i, name) in names.iter().enumerate() {
        if i > 0 {
            write!(f, ",")?;
        }
        write!(f, "{}", show(name))?;
    }
    Ok(())
}

fn indentation(f: &mut impl Write, indent: usize) -> fmt::Result {
    if indent > 0 {
        writeln!(f)?;
    }
    for _ in 0..indent {
        write!(f, "  ")?;
    }
    Ok(())
}

impl Display for Process {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inaction => write!(f, "0"),
            Self::Send(chan, values) => {
                write!(f, "{}<", chan.ident())?;
                names(f, values, Name::ident)?;
                write!(f, ">")
            }
            Self::Receive(chan, vars, cont) => {
                write!(f, "{}(", chan.ident())?;
                names(f, vars, Name::ident)?;
                write!(f, ").{}", cont)
            }
            Self::Parallel(procs) => {
                write!(f, "(")?;
                for (i, proc) in procs.iter().enumerate() {
                    if i > 0 {
                        write!(f, " | ")?;
                    }
                    write!(f, "{}", proc)?;
                }
                write!(f, ")")
            }
            Self::Replicate(body) => write!(f, "!{}", body),
            Self::Restrict(name, body) => write!(f, "(new {}){}", name.ident(), body),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::par::name::Sort;

    fn n(ident: &str) -> Name {
        Name::new(ident)
    }

    fn idents(names: Vec<Name>) -> Vec<String> {
        names.iter().map(Name::ident).collect()
    }

    #[test]
    fn renders_calculi() {
        let p = Process::restrict(
            n("a"),
            Process::par(
                Process::receive(n("a"), vec![n("x"), n("y")], Process::Inaction),
                Process::send(n("a"), vec![n("b"), n("c")]),
            ),
        );
        assert_eq!(p.calculi(), "(new a)(a(x,y).0 | a<b,c>)");
        assert_eq!(Process::replicate(Process::send(n("a"), vec![])).calculi(), "!a<>");
        assert_eq!(
            Process::restricts(vec![n("a"), n("b")], Process::Inaction).calculi(),
            "(new a)(new b)0"
        );
    }

    #[test]
    fn free_names_are_sorted_and_deduplicated() {
        let p = Process::Parallel(vec![
            Process::send(n("c"), vec![n("b")]),
            Process::send(n("a"), vec![n("b"), n("a")]),
        ]);
        assert_eq!(idents(p.free_names()), vec!["a", "b", "c"]);
        assert!(p.free_vars().is_empty());
    }

    #[test]
    fn restriction_removes_one_free_name() {
        let body = Process::par(
            Process::send(n("a"), vec![n("b")]),
            Process::send(n("a"), vec![n("c")]),
        );
        assert_eq!(body.free_names().len(), 3);
        let p = Process::restrict(n("a"), body);
        assert_eq!(idents(p.free_names()), vec!["b", "c"]);

        let q = Process::restrict(n("z"), Process::send(n("a"), vec![]));
        assert_eq!(idents(q.free_names()), vec!["a"]);
    }

    #[test]
    fn receive_subtracts_vars_by_label() {
        let x = n("x");
        x.set_sort(Sort::Var).unwrap();
        let inner_x = n("x");
        inner_x.set_sort(Sort::Var).unwrap();
        let y = n("y");
        y.set_sort(Sort::Var).unwrap();
        let p = Process::receive(
            n("a"),
            vec![x],
            Process::send(n("b"), vec![inner_x, y]),
        );
        assert_eq!(idents(p.free_vars()), vec!["y"]);
        assert_eq!(idents(p.free_names()), vec!["a", "b"]);
    }

    #[test]
    fn breadth_first_order() {
        let p = Process::par(
            Process::receive(n("a"), vec![], Process::send(n("c"), vec![])),
            Process::send(n("b"), vec![]),
        );
        let order: Vec<String> = p.breadth_first().iter().map(|p| p.calculi()).collect();
        assert_eq!(order, vec!["(a().c<> | b<>)", "a().c<>", "b<>", "c<>"]);
    }

    #[test]
    fn pretty_shows_sorts() {
        let x = n("x");
        x.set_sort(Sort::Var).unwrap();
        let p = Process::receive(n("a"), vec![x.clone()], Process::send(x, vec![]));
        let mut out = String::new();
        p.pretty(&mut out, 0).unwrap();
        assert_eq!(out, "recv a(_x).\n  send _x<>");
    }
}
