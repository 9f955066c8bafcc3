mod local_vector_store;

pub use local_vector_store::{INDEX_FILE_NAME, LocalVectorStore};
