use thiserror::Error;

use crate::engine::NodeKind;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum UtilityError {
    #[error("Utility '{0}' is already registered")]
    DuplicateName(Box<str>),

    #[error("Utility '{0}' not found")]
    UnknownName(Box<str>),

    #[error("Utility '{name}' refers to unknown operand '{operand}'")]
    UnknownOperand { name: Box<str>, operand: Box<str> },

    #[error("Utility '{name}' is a {found} node, expected a {expected} node")]
    WrongNodeKind {
        name: Box<str>,
        expected: NodeKind,
        found: NodeKind,
    },

    #[error("Node reference {0} was not issued by this system")]
    UnknownRef(usize),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Couldn't parse utility configuration.\n{0}")]
    Json(#[from] serde_json::Error),

    #[error("Couldn't assemble utility system.\n{0}")]
    Build(#[from] UtilityError),
}
