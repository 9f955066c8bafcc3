use voxrag::domain::{Chunk, ChunkId, DocumentId};

#[test]
fn given_two_chunk_ids_when_generated_then_are_unique() {
    let id1 = ChunkId::new();
    let id2 = ChunkId::new();
    assert_ne!(id1, id2);
}

#[test]
fn given_valid_params_when_creating_chunk_then_assigns_new_id() {
    let doc_id = DocumentId::new();
    let chunk = Chunk::new("test content".to_string(), doc_id, 2);

    assert_eq!(chunk.text, "test content");
    assert_eq!(chunk.document_id, doc_id);
    assert_eq!(chunk.offset, 2);
}

#[test]
fn given_chunk_when_serialized_then_ids_are_plain_uuid_strings() {
    let chunk = Chunk::new("hello".to_string(), DocumentId::new(), 0);

    let json = serde_json::to_value(&chunk).unwrap();

    assert_eq!(json["id"], chunk.id.as_uuid().to_string());
    assert_eq!(json["document_id"], chunk.document_id.as_uuid().to_string());
}
