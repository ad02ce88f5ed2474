mod load;
mod paths;
mod watch;

pub use load::*;
pub use paths::*;
pub use watch::*;
