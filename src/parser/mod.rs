// Parser for `key=value` styling options

pub mod lexer;
pub mod value;

// Public API re-exports
pub use value::{parse_option, parse_options, parse_value};
