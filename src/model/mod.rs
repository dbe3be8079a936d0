pub mod collection;
pub mod config;
pub mod hierarchy;
pub mod item;
pub mod scope;

pub use collection::*;
pub use config::*;
pub use hierarchy::*;
pub use item::*;
pub use scope::*;
