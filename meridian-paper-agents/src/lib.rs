#![deny(missing_docs)]
//! Concrete paper sub-agents: `literature`, `stats`, `writer`, `compliance`.
//!
//! Each is a [`meridian_op_react::ReactOperator`] (the ReAct agent node,
//! C4) carrying its own tool set, adapted to the graph executor's `Node`
//! contract by [`adapter::OperatorNode`]. Grounded on the source
//! repository's Medical Paper sub-agents.

pub mod adapter;
pub mod nodes;
pub mod tools;

pub use adapter::{HistoryStore, OperatorNode};
pub use nodes::{compliance_node, literature_node, stats_node, writer_node, MIN_REFERENCES};
