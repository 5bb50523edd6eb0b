mod component;
pub mod ingest;
pub mod layout;
mod render;
mod state;
pub mod tree;
mod types;
pub mod viewport;

pub use component::MindMapCanvas;
pub use types::{MindMap, MindNode, NodeIdx, Position, RawNode};
