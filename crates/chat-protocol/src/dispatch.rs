//! Static command dispatch tables.
//!
//! Each console declares a table of [`CommandSpec`]s: the command name,
//! how many arguments it needs, the usage line shown when they are
//! missing, the state it requires, and a typed action. Resolving a
//! [`Command`] against a table checks, in order, that the name is known,
//! that the precondition holds and that enough arguments were given.
//! Argument *contents* (e.g. whether a port parses) are the action's
//! business.

use crate::commands::Command;
use crate::error::CommandError;

/// A state requirement a command declares.
pub trait Precondition: Copy {
    type State: ?Sized;

    /// `Err` carries the message reported when the state refuses the command.
    fn check(self, state: &Self::State) -> Result<(), &'static str>;
}

/// One row of a dispatch table.
#[derive(Debug, Clone, Copy)]
pub struct CommandSpec<A, P> {
    pub name: &'static str,
    /// Minimum number of arguments.
    pub arity: usize,
    pub usage: &'static str,
    pub precondition: P,
    pub action: A,
}

/// A command that passed every check in its table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Invocation<'c, A> {
    pub action: A,
    pub args: &'c [String],
}

impl<A> Invocation<'_, A> {
    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }
}

/// Maps command names to typed actions.
#[derive(Debug)]
pub struct DispatchTable<A: 'static, P: 'static> {
    specs: &'static [CommandSpec<A, P>],
}

impl<A: 'static, P: 'static> DispatchTable<A, P> {
    pub const fn new(specs: &'static [CommandSpec<A, P>]) -> Self {
        Self { specs }
    }

    pub fn specs(&self) -> &'static [CommandSpec<A, P>] {
        self.specs
    }

    pub fn lookup(&self, name: &str) -> Option<&'static CommandSpec<A, P>> {
        self.specs.iter().find(|spec| spec.name == name)
    }
}

impl<A: Copy + 'static, P: Precondition + 'static> DispatchTable<A, P> {
    /// Validate `command` against the table and the current `state`.
    pub fn resolve<'c>(
        &self,
        command: &'c Command,
        state: &P::State,
    ) -> Result<Invocation<'c, A>, CommandError> {
        let spec = self.lookup(&command.name).ok_or_else(|| CommandError::Unknown {
            name: command.name.clone(),
        })?;

        spec.precondition
            .check(state)
            .map_err(|message| CommandError::Precondition { message })?;

        if command.args.len() < spec.arity {
            return Err(CommandError::Usage { usage: spec.usage });
        }

        Ok(Invocation {
            action: spec.action,
            args: &command.args,
        })
    }
}
