use dagforge_core::NodeTypeKey;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("node type `{0}` is already registered")]
    DuplicateType(NodeTypeKey),

    #[error("node type `{0}` is not registered")]
    UnknownType(NodeTypeKey),

    #[error("invalid config for node type `{type_}`: {reason}")]
    InvalidConfig { type_: NodeTypeKey, reason: String },
}
