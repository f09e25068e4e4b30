//! Core types for Parlor.

pub mod conversation;
pub mod frame;
pub mod message;
pub mod model;
pub mod timestamp;

pub use conversation::*;
pub use frame::*;
pub use message::*;
pub use model::*;
pub use timestamp::*;
