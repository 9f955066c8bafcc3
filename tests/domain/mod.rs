mod chunk_test;
mod embedding_test;
