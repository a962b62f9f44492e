use super::{error::Result, name::Name, process::Process};
use indexmap::IndexSet;
use std::iter;

/// Called for every name occurrence by [`walk`].
pub trait NameVisitor {
    fn visit_name(&mut self, name: &Name) -> Result<()>;
}

/// Visits names breadth-first: a receive's channel then its variables, a
/// send's channel then its values, a restriction's name. Stops at the first
/// error.
pub fn walk(visitor: &mut impl NameVisitor, process: &Process) -> Result<()> {
    for proc in process.breadth_first() {
        match proc {
            Process::Receive(chan, names, _) | Process::Send(chan, names) => {
                for name in iter::once(chan).chain(names) {
                    visitor.visit_name(name)?;
                }
            }
            Process::Restrict(name, _) => visitor.visit_name(name)?,
            Process::Inaction | Process::Parallel(_) | Process::Replicate(_) => {}
        }
    }
    Ok(())
}

/// Renames each distinct name to `<label>_<n>`.
#[derive(Default)]
pub struct Uniquifier {
    seen: IndexSet<Name>,
}

impl NameVisitor for Uniquifier {
    fn visit_name(&mut self, name: &Name) -> Result<()> {
        if self.seen.contains(name) {
            return Ok(());
        }
        name.set_ident(format!("{}_{}", name.ident(), self.seen.len()))?;
        self.seen.insert(name.clone());
        Ok(())
    }
}

/// Gives every distinct name object a distinct label.
///
/// Aliases made by [`bind`](super::bind::bind) keep sharing one label;
/// unrelated occurrences of the same label are told apart.
pub fn make_names_unique(process: &Process) -> Result<()> {
    walk(&mut Uniquifier::default(), process)
}
