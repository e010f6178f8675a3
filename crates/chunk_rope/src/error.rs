use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RopeError {
    #[error("index {index} is out of bounds for a rope of length {len}")]
    OutOfBounds { index: usize, len: usize },
    #[error("range {start}..{end} is out of bounds for a rope of length {len}")]
    RangeOutOfBounds { start: usize, end: usize, len: usize },
    #[error("cannot combine ropes with chunk capacities {expected} and {found}")]
    CapacityMismatch { expected: usize, found: usize },
}

pub type Result<T> = std::result::Result<T, RopeError>;
