pub mod codebase;
pub mod walker;

pub use codebase::{Codebase, LoadOptions, SourceFile};
pub use walker::{FileWalker, WalkedFile};
