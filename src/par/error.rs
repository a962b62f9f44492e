use super::types::TypeError;

/// Failures of the passes over a process tree.
///
/// Parse failures are reported separately as
/// [`SyntaxError`](super::parser::SyntaxError) since they carry source spans.
#[derive(Debug, Clone)]
pub enum Error {
    /// A pass tried to rename, re-sort or re-type a constant name.
    ImmutableName(String),
    /// Substitution was given lists of different lengths.
    InvalidArgument { values: usize, vars: usize },
    Type(TypeError),
    Format(core::fmt::Error),
}

pub type Result<T, E = Error> = core::result::Result<T, E>;

impl From<TypeError> for Error {
    fn from(error: TypeError) -> Self {
        Self::Type(error)
    }
}

impl From<core::fmt::Error> for Error {
    fn from(error: core::fmt::Error) -> Self {
        Self::Format(error)
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::ImmutableName(ident) => write!(f, "name `{}` is not mutable", ident),
            Self::InvalidArgument { values, vars } => write!(
                f,
                "cannot substitute {} value(s) for {} variable(s)",
                values, vars
            ),
            Self::Type(error) => error.fmt(f),
            Self::Format(error) => error.fmt(f),
        }
    }
}

impl core::error::Error for Error {}
