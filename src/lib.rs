//! The asynchronous π-calculus: parsing, binding, sort and type inference,
//! reduction, and Go code emission.

pub mod codegen;
pub mod location;
pub mod par;

pub use par::{
    bind::bind,
    error::{Error, Result},
    name::{Name, Sort},
    parser::{parse, SyntaxError},
    process::Process,
    reduce::{reduce, reduce_once, simplify_by_sc, subst},
    types::{Type, TypeError},
};
