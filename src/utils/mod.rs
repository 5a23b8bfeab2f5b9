mod file;
mod hash;
mod template;

pub use file::*;
pub use hash::*;
pub use template::*;
