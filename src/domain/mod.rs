mod format;
mod parse;
mod types;

pub use format::*;
pub use parse::*;
pub use types::*;
