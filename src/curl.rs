pub mod body;
mod export;
mod lexer;
mod parser;

pub use export::{shell_quote, to_curl, ExportOptions};
pub use parser::parse_curl;
