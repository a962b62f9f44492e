use super::{
    error::Result,
    name::{Name, Sort},
    names::{walk, NameVisitor},
    process::Process,
};
use std::collections::HashMap;

/// Classifies names as variables or ordinary names from where they occur.
///
/// Input-bound names are variables, restricted names never are, and a name
/// first met as a sent value becomes a variable unless already classified.
/// Names are visited breadth-first, so run this after
/// [`bind`](super::bind::bind) for every alias to be classified at once.
pub fn identify_sorts(process: &Process) -> Result<()> {
    let mut is_var: HashMap<Name, bool> = HashMap::new();
    for proc in process.breadth_first() {
        match proc {
            Process::Receive(_, vars, _) => {
                for var in vars {
                    is_var.insert(var.clone(), true);
                    var.set_sort(Sort::Var)?;
                }
            }
            Process::Send(_, values) => {
                for value in values {
                    if !is_var.contains_key(value) {
                        is_var.insert(value.clone(), true);
                        value.set_sort(Sort::Var)?;
                    }
                }
            }
            Process::Restrict(name, _) => {
                is_var.insert(name.clone(), false);
            }
            Process::Inaction | Process::Parallel(_) | Process::Replicate(_) => {}
        }
    }
    Ok(())
}

struct PrefixSorter;

impl NameVisitor for PrefixSorter {
    fn visit_name(&mut self, name: &Name) -> Result<()> {
        if !name.is_constant() && name.ident().starts_with(|c: char| ('n'..='z').contains(&c)) {
            name.set_sort(Sort::Var)?;
        }
        Ok(())
    }
}

/// Marks names spelled like variables, labels starting with `n` to `z`, as
/// variables. Other names keep their sort and constant names are skipped.
pub fn infer_sorts_by_prefix(process: &Process) -> Result<()> {
    walk(&mut PrefixSorter, process)
}

struct SortResetter;

impl NameVisitor for SortResetter {
    fn visit_name(&mut self, name: &Name) -> Result<()> {
        if !name.is_constant() {
            name.set_sort(Sort::Name)?;
        }
        Ok(())
    }
}

/// Puts every name back to the ordinary sort. Constant names are left alone.
pub fn reset_sorts(process: &Process) -> Result<()> {
    walk(&mut SortResetter, process)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::par::{bind::bind, parser::parse};

    fn sorted(src: &str) -> Process {
        let mut p = parse(src).unwrap();
        bind(&mut p);
        identify_sorts(&p).unwrap();
        p
    }

    #[test]
    fn usage_decides_sorts() {
        let p = sorted("a(x).x<b>");
        assert_eq!(p.free_names().iter().map(Name::ident).collect::<Vec<_>>(), vec!["a"]);
        assert_eq!(p.free_vars().iter().map(Name::ident).collect::<Vec<_>>(), vec!["b"]);

        let Process::Receive(a, vars, cont) = &p else {
            panic!("expected receive");
        };
        assert_eq!(a.sort(), Sort::Name);
        assert_eq!(vars[0].sort(), Sort::Var);
        let Process::Send(_, values) = &**cont else {
            panic!("expected send");
        };
        assert_eq!(values[0].sort(), Sort::Var);
    }

    #[test]
    fn restricted_names_are_never_variables() {
        let p = sorted("(new b)(a<b> | b<>)");
        let Process::Restrict(b, _) = &p else {
            panic!("expected restriction");
        };
        assert_eq!(b.sort(), Sort::Name);
        assert!(p.free_vars().is_empty());
    }

    #[test]
    fn sent_free_names_become_variables() {
        let p = sorted("a<b>");
        assert_eq!(p.free_names().len(), 1);
        assert_eq!(p.free_vars().len(), 1);
    }

    #[test]
    fn constant_names_are_reported() {
        let p = Process::receive(Name::new("a"), vec![Name::constant("x")], Process::Inaction);
        assert!(identify_sorts(&p).is_err());
        reset_sorts(&p).unwrap();
    }

    #[test]
    fn prefix_sorts_and_reset() {
        let mut p = parse("a(x).m<y>").unwrap();
        bind(&mut p);
        infer_sorts_by_prefix(&p).unwrap();
        assert_eq!(p.free_names().iter().map(Name::ident).collect::<Vec<_>>(), vec!["a", "m"]);
        assert_eq!(p.free_vars().iter().map(Name::ident).collect::<Vec<_>>(), vec!["y"]);

        reset_sorts(&p).unwrap();
        assert_eq!(p.free_names().len(), 3);
        assert!(p.free_vars().is_empty());
    }

    #[test]
    fn prefix_sorting_only_marks_variables() {
        let a = Name::new("a");
        a.set_sort(Sort::Var).unwrap();
        let p = Process::send(Name::constant("x"), vec![a.clone(), Name::new("y")]);
        infer_sorts_by_prefix(&p).unwrap();
        assert_eq!(a.sort(), Sort::Var);
        let Process::Send(x, values) = &p else {
            panic!("expected send");
        };
        assert_eq!(x.sort(), Sort::Name);
        assert_eq!(values[1].sort(), Sort::Var);
    }
}
