#![deny(missing_docs)]
//! Concrete chat sub-agents: `learning`, `productivity`, `utility`.
//!
//! Each is a [`meridian_op_react::ReactOperator`] (the ReAct agent node,
//! C4) carrying its own tool set, adapted to the graph executor's `Node`
//! contract by [`adapter::OperatorNode`]. Grounded on the source
//! repository's Personal Secretary sub-agents.

pub mod adapter;
pub mod classifier;
pub mod nodes;
pub mod tools;

pub use adapter::{HistoryStore, OperatorNode};
pub use classifier::SingleShotClassifier;
pub use nodes::{learning_node, productivity_node, utility_node};
