use thiserror::Error;

use tilemesh::MeshError;

#[derive(Debug, Error)]
pub enum TreeError {
    #[error("geometry source error: {0}")]
    Source(String),

    #[error(transparent)]
    Mesh(#[from] MeshError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),
}
