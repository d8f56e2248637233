pub mod check;
pub mod history;
pub mod inspect;
pub mod project;
pub mod util;

pub use check::*;
pub use history::*;
pub use inspect::*;
pub use project::*;
pub use util::*;
