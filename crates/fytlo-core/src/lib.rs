pub mod actions;
pub mod config;
pub mod error;
pub mod messages;
pub mod persistence;
pub mod reducer;
pub mod slots;
pub mod state;
pub mod toast;

pub use actions::*;
pub use config::*;
pub use error::*;
pub use reducer::*;
pub use state::*;

pub use persistence::*;
