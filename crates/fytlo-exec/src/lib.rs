pub mod contracts;
pub mod photos;
pub mod picker;
pub mod runtime;

pub use contracts::*;
pub use photos::*;
pub use picker::*;
pub use runtime::*;
