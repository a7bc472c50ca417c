//! `nodes` crate: Corbee Gestão workflow nodes.
//!
//! Declares the credential schema and the node property schemas, and turns one
//! item's chosen operation into one authenticated HTTP call. Every node
//! implements [`ExecutableNode`]; the engine crate drives it item by item.

pub mod auth;
pub mod catalog;
pub mod client;
pub mod credentials;
pub mod description;
pub mod error;
pub mod gestao;
pub mod mock;
pub mod traits;

pub use catalog::{resolve, NodeKind, Operation, OperationKind, OperationSpec};
pub use client::ClientConfig;
pub use credentials::Credentials;
pub use error::NodeError;
pub use gestao::GestaoNode;
pub use traits::ExecutableNode;
