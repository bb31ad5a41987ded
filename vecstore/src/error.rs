use thiserror::Error;

#[derive(Error, Debug)]
pub enum VecError {
    #[error("vecstore: dimension mismatch: got {got}, want {want}")]
    DimensionMismatch { got: usize, want: usize },

    #[error("vecstore: index is full: {0} vectors")]
    Capacity(usize),
}
