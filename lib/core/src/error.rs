use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid index state: {0}")]
    InvalidState(String),

    #[error("Item not found: {0}")]
    ItemNotFound(String),

    #[error("Invalid method: {0}")]
    InvalidMethod(String),

    #[error("Method already registered: {0}")]
    MethodExists(String),

    #[error("Duplicate item id: {0}")]
    DuplicateItem(String),

    #[error("Corpus error: {0}")]
    Corpus(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
