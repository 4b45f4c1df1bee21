pub mod config;
pub mod editor;
pub mod feedback;
pub mod frame;
pub mod geometry;
pub mod http_store;
pub mod init;
pub mod inertia;
pub mod interaction;
pub mod persistence;
pub mod selection;
pub mod viewport;

pub use config::EditorConfig;
pub use editor::FlowEditor;
pub use feedback::{EditorAction, EditorFeedback, Notice, NoticeLevel};
pub use frame::{FrameHandle, FrameScheduler, ManualScheduler};
pub use interaction::{InteractionState, Key, PointerTarget};
pub use persistence::{LoadOutcome, PersistenceAdapter, WebsiteStore};
pub use viewport::Viewport;
