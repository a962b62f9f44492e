use super::{
    name::{is_same_name, Name},
    process::Process,
};

/// Resolves every bound occurrence to the name introduced by its binder.
///
/// Restrictions and input prefixes introduce names; any occurrence inside
/// their scope with the same label is replaced by a clone of the binder's
/// handle, so later passes mutating one occurrence affect all of them.
/// Running it again on a bound tree changes nothing.
pub fn bind(process: &mut Process) {
    bind_in(process, &[]);
}

fn lookup<'a>(scope: &'a [Name], name: &Name) -> Option<&'a Name> {
    scope.iter().rev().find(|bound| is_same_name(bound, name))
}

fn bind_in(process: &mut Process, scope: &[Name]) {
    match process {
        Process::Inaction => {}

        Process::Replicate(body) => bind_in(body, scope),

        Process::Restrict(name, body) => {
            let mut scope = scope.to_vec();
            scope.retain(|bound| {
                let shadowed = is_same_name(bound, name) && !bound.same(name);
                if shadowed {
                    tracing::warn!("rebinding `{}` in restriction", name.ident());
                }
                !is_same_name(bound, name)
            });
            scope.push(name.clone());
            bind_in(body, &scope);
        }

        Process::Parallel(procs) => {
            for proc in procs {
                bind_in(proc, scope);
            }
        }

        Process::Receive(chan, vars, cont) => {
            let mut scope = scope.to_vec();
            scope.retain(|bound| {
                let shadowed = vars.iter().any(|var| is_same_name(bound, var));
                if shadowed && !vars.iter().any(|var| var.same(bound)) {
                    tracing::warn!("variable `{}` shadows an outer name", bound.ident());
                }
                !shadowed
            });
            scope.extend(vars.iter().cloned());
            match lookup(&scope, chan) {
                Some(bound) => *chan = bound.clone(),
                None => scope.push(chan.clone()),
            }
            bind_in(cont, &scope);
        }

        Process::Send(chan, values) => {
            for name in std::iter::once(chan).chain(values.iter_mut()) {
                if let Some(bound) = lookup(scope, name) {
                    *name = bound.clone();
                }
            }
        }
    }
}
