pub mod bind;
pub mod error;
pub mod lexer;
pub mod name;
pub mod names;
pub mod parser;
pub mod process;
pub mod reduce;
pub mod sorts;
pub mod types;
