//! Parlor — headless client SDK for the Parlor chat server.
//!
//! Provides the conversation directory, paginated message history, the
//! streaming WebSocket transport, and the stream-to-message reducer that
//! folds incremental deltas into a single rendered assistant message.
//! Rendering is behind trait seams so every state machine is testable
//! without a UI.
//!
//! # Quick Start
//!
//! ```no_run
//! use parlor::prelude::*;
//!
//! # async fn example(chat_view: Box<dyn parlor::view::ChatView>,
//! #                  directory_view: Box<dyn parlor::view::DirectoryView>) {
//! let config = ClientConfig::from_env().expect("config");
//! let mut session = ChatSession::new(config, chat_view, directory_view);
//! session.init().await;
//! session.select_conversation("some-id").await;
//! session.send_message("Hello!");
//! session.run().await;
//! # }
//! ```

pub mod api;
pub mod config;
pub mod directory;
pub mod error;
pub mod history;
pub mod prelude;
pub mod reducer;
pub mod session;
pub mod timefmt;
pub mod transport;
pub mod types;
pub mod view;
