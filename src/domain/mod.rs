mod chunk;
mod embedding;
mod upload;

pub use chunk::{Chunk, ChunkId, DocumentId};
pub use embedding::Embedding;
pub use upload::Upload;
