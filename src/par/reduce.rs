use super::{
    bind::bind,
    error::{Error, Result},
    name::{is_free_name, Name},
    process::Process,
};
use indexmap::IndexMap;

/// Renames, inside `process`, every occurrence labelled like one of `vars`
/// to the label of the value at the same position.
///
/// Occurrences are channels, sent values and received variables. Renaming
/// goes through the name handles, so an aliased occurrence is renamed once
/// and seen renamed everywhere. Constant names are skipped.
pub fn subst(process: &Process, values: &[Name], vars: &[Name]) -> Result<()> {
    if values.len() != vars.len() {
        return Err(Error::InvalidArgument {
            values: values.len(),
            vars: vars.len(),
        });
    }
    let mut subst = Subst {
        values: values.iter().map(Name::ident).collect(),
        vars: vars.iter().map(Name::ident).collect(),
        renamed: vec![],
    };
    for proc in process.breadth_first() {
        match proc {
            Process::Receive(chan, names, _) | Process::Send(chan, names) => {
                subst.rename(chan)?;
                for name in names {
                    subst.rename(name)?;
                }
            }
            Process::Inaction
            | Process::Parallel(_)
            | Process::Replicate(_)
            | Process::Restrict(..) => {}
        }
    }
    Ok(())
}

struct Subst {
    values: Vec<String>,
    vars: Vec<String>,
    renamed: Vec<Name>,
}

impl Subst {
    fn rename(&mut self, name: &Name) -> Result<()> {
        if name.is_constant() || self.renamed.iter().any(|done| done.same(name)) {
            return Ok(());
        }
        let ident = name.ident();
        if let Some(i) = self.vars.iter().position(|var| *var == ident) {
            name.set_ident(self.values[i].clone())?;
            self.renamed.push(name.clone());
        }
        Ok(())
    }
}

/// Performs at most one communication.
///
/// Restrictions and replications are looked through. In a parallel
/// composition, the leftmost send is paired with the leftmost receive on the
/// same free channel; the send becomes `0` and the receive its continuation
/// with the sent values substituted. A parallel nested directly inside
/// another is reduced instead of its siblings.
pub fn reduce_once(process: &mut Process) -> Result<bool> {
    match process {
        Process::Inaction | Process::Send(..) | Process::Receive(..) => Ok(false),
        Process::Restrict(_, body) | Process::Replicate(body) => reduce_once(body),
        Process::Parallel(procs) => {
            if let Some(nested) = procs
                .iter_mut()
                .find(|proc| matches!(proc, Process::Parallel(_)))
            {
                return reduce_once(nested);
            }

            let mut sends: IndexMap<String, (usize, Vec<Name>)> = IndexMap::new();
            let mut recvs: IndexMap<String, usize> = IndexMap::new();
            for (i, proc) in procs.iter().enumerate() {
                match proc {
                    Process::Send(chan, values) if is_free_name(chan) => {
                        sends.entry(chan.ident()).or_insert((i, values.clone()));
                    }
                    Process::Receive(chan, ..) if is_free_name(chan) => {
                        recvs.entry(chan.ident()).or_insert(i);
                    }
                    _ => {}
                }
            }

            for (chan, (send, values)) in sends {
                let Some(&recv) = recvs.get(&chan) else {
                    continue;
                };
                if let Process::Receive(_, vars, cont) = &procs[recv] {
                    subst(cont, &values, vars)?;
                }
                if let Process::Receive(_, _, cont) = std::mem::take(&mut procs[recv]) {
                    procs[recv] = *cont;
                }
                procs[send] = Process::Inaction;
                tracing::debug!("communication on `{}`", chan);
                return Ok(true);
            }
            Ok(false)
        }
    }
}

/// Restricted names used nowhere but in their own restriction.
///
/// The process is bound first, so every occurrence in scope of a restriction
/// shares its handle and uses are counted per handle, not per label.
fn find_unused_restrict(process: &mut Process) -> Vec<Name> {
    bind(process);
    let mut uses: IndexMap<Name, usize> = IndexMap::new();
    for proc in process.breadth_first() {
        match proc {
            Process::Restrict(name, _) => {
                *uses.entry(name.clone()).or_default() += 1;
            }
            Process::Receive(chan, names, _) | Process::Send(chan, names) => {
                for name in std::iter::once(chan).chain(names) {
                    if let Some(count) = uses.get_mut(name) {
                        *count += 1;
                    }
                }
            }
            Process::Inaction | Process::Parallel(_) | Process::Replicate(_) => {}
        }
    }
    uses.into_iter()
        .filter(|(_, count)| *count == 1)
        .map(|(name, _)| name)
        .collect()
}

fn filter_restrict(process: Process, unused: &[Name]) -> Process {
    match process {
        Process::Inaction | Process::Send(..) => process,
        Process::Parallel(procs) => Process::Parallel(
            procs
                .into_iter()
                .map(|proc| filter_restrict(proc, unused))
                .collect(),
        ),
        Process::Receive(chan, vars, cont) => {
            Process::receive(chan, vars, filter_restrict(*cont, unused))
        }
        Process::Replicate(body) => Process::replicate(filter_restrict(*body, unused)),
        Process::Restrict(name, body) => {
            let body = filter_restrict(*body, unused);
            if unused.iter().any(|n| n.same(&name)) {
                tracing::debug!("dropping unused restriction `{}`", name.ident());
                body
            } else {
                Process::restrict(name, body)
            }
        }
    }
}

fn filter_nil(process: Process) -> Process {
    match process {
        Process::Inaction | Process::Send(..) => process,
        Process::Parallel(procs) => {
            let mut procs: Vec<Process> = procs
                .into_iter()
                .map(filter_nil)
                .filter(|proc| !matches!(proc, Process::Inaction))
                .collect();
            match procs.len() {
                0 => Process::Inaction,
                1 => procs.remove(0),
                _ => Process::Parallel(procs),
            }
        }
        Process::Receive(chan, vars, cont) => Process::receive(chan, vars, filter_nil(*cont)),
        Process::Replicate(body) => match filter_nil(*body) {
            Process::Inaction => Process::Inaction,
            body => Process::replicate(body),
        },
        Process::Restrict(name, body) => match filter_nil(*body) {
            Process::Inaction => Process::Inaction,
            body => Process::restrict(name, body),
        },
    }
}

/// Simplifies by structural congruence: drops restrictions of unused names,
/// then removes `0` from parallel compositions and collapses `!0` and
/// `(new a)0` to `0`.
pub fn simplify_by_sc(mut process: Process) -> Process {
    let unused = find_unused_restrict(&mut process);
    filter_nil(filter_restrict(process, &unused))
}

/// Reduces and simplifies until nothing changes or `max_steps` steps were
/// taken. Returns the number of steps taken.
pub fn reduce(process: &mut Process, max_steps: usize) -> Result<usize> {
    let mut steps = 0;
    while steps < max_steps && reduce_once(process)? {
        *process = simplify_by_sc(std::mem::take(process));
        steps += 1;
        tracing::debug!(step = steps, "reduced to {}", process);
    }
    Ok(steps)
}
