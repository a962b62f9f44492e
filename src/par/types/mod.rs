mod checking;
mod core;
mod error;

pub use self::checking::{check, infer, process_types, unify};
pub use self::core::Type;
pub use self::error::TypeError;
