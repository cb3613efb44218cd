pub mod account;
pub mod graph;
pub mod node;
pub mod obligation;
pub mod operations;
pub mod prohibition;

pub use account::{Account, AccountStatus, AccountUsers, Asset, StatusTier, SwidReport};
pub use graph::{Graph, GraphSnapshot};
pub use node::{Node, NodeKind};
pub use obligation::{EventPattern, Obligation, Obligations, SubjectMatcher};
pub use operations::{Operations, ALL_OPS};
pub use prohibition::{Prohibition, Prohibitions};
