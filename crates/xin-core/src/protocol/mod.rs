//! Protocol module containing the command types and the line grammar.

pub mod command;
pub mod layout_name;
pub mod parser;

pub use command::*;
pub use layout_name::{LayoutName, LayoutNameError, MAX_LAYOUT_NAME_LEN};
pub use parser::{parse_line, ParseError};
