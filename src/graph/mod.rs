//! Code graph for analysis
//!
//! Pure Rust implementation using petgraph. One store is built per scan.

pub mod store;
pub mod store_models;

pub use store::{GraphStats, GraphStore, TreeNode};
pub use store_models::{ClassNode, CodeEdge, CodeNode, EdgeKind, FileNode, FunctionNode, ModuleNode, NodeKind};
