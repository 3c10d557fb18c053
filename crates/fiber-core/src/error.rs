use crate::fiber::FiberId;
use crate::NodeId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    Missing { id: NodeId },
    NotAChild { parent: NodeId, child: NodeId },
    Unsupported { op: &'static str },
}

impl std::fmt::Display for HostError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HostError::Missing { id } => write!(f, "host node {id} missing"),
            HostError::NotAChild { parent, child } => {
                write!(f, "host node {child} is not a child of {parent}")
            }
            HostError::Unsupported { op } => write!(f, "host does not support {op}"),
        }
    }
}

impl std::error::Error for HostError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileError {
    MissingHostParent { fiber: FiberId },
    DoubleCommit,
    NestedUpdateLimit { limit: usize },
    Host(HostError),
}

impl std::fmt::Display for ReconcileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReconcileError::MissingHostParent { fiber } => {
                write!(f, "fiber {fiber:?} has no host parent")
            }
            ReconcileError::DoubleCommit => {
                write!(f, "cannot commit the same tree more than once")
            }
            ReconcileError::NestedUpdateLimit { limit } => write!(
                f,
                "maximum update depth exceeded; more than {limit} nested renders in one flush"
            ),
            ReconcileError::Host(err) => write!(f, "host operation failed: {err}"),
        }
    }
}

impl std::error::Error for ReconcileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReconcileError::Host(err) => Some(err),
            _ => None,
        }
    }
}

impl From<HostError> for ReconcileError {
    fn from(err: HostError) -> Self {
        ReconcileError::Host(err)
    }
}
