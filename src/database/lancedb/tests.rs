use super::*;
use std::path::PathBuf;

#[test]
fn record_from_chunk() {
    let chunk = TextChunk {
        content: "Rust has no garbage collector.".to_string(),
        source: PathBuf::from("docs/rust.pdf"),
        page: Some(3),
        chunk_index: 7,
    };

    let record = ChunkRecord::from_chunk(&chunk, vec![0.1, 0.2, 0.3], "2024-01-01T00:00:00Z");

    assert_eq!(record.source, "docs/rust.pdf");
    assert_eq!(record.page, Some(3));
    assert_eq!(record.chunk_index, 7);
    assert_eq!(record.content, chunk.content);
    assert_eq!(record.vector.len(), 3);
    assert_eq!(record.created_at, "2024-01-01T00:00:00Z");
    assert!(Uuid::parse_str(&record.id).is_ok());
}

#[test]
fn record_ids_are_unique() {
    let chunk = TextChunk {
        content: "same".to_string(),
        source: PathBuf::from("a.txt"),
        page: None,
        chunk_index: 0,
    };

    let first = ChunkRecord::from_chunk(&chunk, vec![1.0], "t");
    let second = ChunkRecord::from_chunk(&chunk, vec![1.0], "t");
    assert_ne!(first.id, second.id);
}
