//! Chunking and Merkle data root for format 2 transactions
//!
//! Data is split into chunks of at most [`MAX_CHUNK_SIZE`] bytes. When the
//! remainder after a full chunk would be smaller than [`MIN_CHUNK_SIZE`], the
//! last two chunks are split evenly instead. Each chunk gets an inclusion proof
//! against the data root so it can be posted to `/chunk` independently.

use crate::crypto::sha256;

pub const MAX_CHUNK_SIZE: usize = 256 * 1024;
pub const MIN_CHUNK_SIZE: usize = 32 * 1024;
const NOTE_SIZE: usize = 32;

/// Byte range of one chunk and the hash of its contents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub data_hash: [u8; 32],
    pub min_byte_range: usize,
    pub max_byte_range: usize,
}

/// Inclusion proof for the chunk ending at `offset + 1`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proof {
    pub offset: usize,
    pub proof: Vec<u8>,
}

/// Chunks, proofs and root for a piece of data
#[derive(Debug, Clone)]
pub struct ChunkedData {
    pub data_root: [u8; 32],
    pub chunks: Vec<Chunk>,
    pub proofs: Vec<Proof>,
}

enum Node {
    Leaf {
        id: [u8; 32],
        data_hash: [u8; 32],
        max_byte_range: usize,
    },
    Branch {
        id: [u8; 32],
        byte_range: usize,
        max_byte_range: usize,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    fn id(&self) -> &[u8; 32] {
        match self {
            Node::Leaf { id, .. } | Node::Branch { id, .. } => id,
        }
    }

    fn max_byte_range(&self) -> usize {
        match self {
            Node::Leaf { max_byte_range, .. } | Node::Branch { max_byte_range, .. } => {
                *max_byte_range
            }
        }
    }
}

/// Big-endian offset note, left-padded to 32 bytes
fn note(value: usize) -> [u8; NOTE_SIZE] {
    let mut buffer = [0u8; NOTE_SIZE];
    let bytes = (value as u64).to_be_bytes();
    buffer[NOTE_SIZE - bytes.len()..].copy_from_slice(&bytes);
    buffer
}

/// SHA-256 over the concatenation of the SHA-256 of each part
fn hash_parts(parts: &[&[u8]]) -> [u8; 32] {
    let mut joined = Vec::with_capacity(parts.len() * 32);
    for part in parts {
        joined.extend_from_slice(&sha256(part));
    }
    sha256(&joined)
}

pub fn chunk_data(data: &[u8]) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut rest = data;
    let mut cursor = 0;

    while rest.len() >= MAX_CHUNK_SIZE {
        let mut chunk_size = MAX_CHUNK_SIZE;
        let next_chunk_size = rest.len() - MAX_CHUNK_SIZE;
        if next_chunk_size > 0 && next_chunk_size < MIN_CHUNK_SIZE {
            chunk_size = rest.len().div_ceil(2);
        }

        let (chunk, tail) = rest.split_at(chunk_size);
        chunks.push(Chunk {
            data_hash: sha256(chunk),
            min_byte_range: cursor,
            max_byte_range: cursor + chunk_size,
        });
        cursor += chunk_size;
        rest = tail;
    }

    chunks.push(Chunk {
        data_hash: sha256(rest),
        min_byte_range: cursor,
        max_byte_range: cursor + rest.len(),
    });
    chunks
}

fn leaf(chunk: &Chunk) -> Node {
    Node::Leaf {
        id: hash_parts(&[&chunk.data_hash, &note(chunk.max_byte_range)]),
        data_hash: chunk.data_hash,
        max_byte_range: chunk.max_byte_range,
    }
}

fn branch(left: Node, right: Node) -> Node {
    let byte_range = left.max_byte_range();
    Node::Branch {
        id: hash_parts(&[left.id(), right.id(), &note(byte_range)]),
        byte_range,
        max_byte_range: right.max_byte_range(),
        left: Box::new(left),
        right: Box::new(right),
    }
}

fn build_root(mut nodes: Vec<Node>) -> Option<Node> {
    while nodes.len() > 1 {
        let mut next = Vec::with_capacity(nodes.len().div_ceil(2));
        let mut iter = nodes.into_iter();
        while let Some(left) = iter.next() {
            match iter.next() {
                Some(right) => next.push(branch(left, right)),
                None => next.push(left),
            }
        }
        nodes = next;
    }
    nodes.pop()
}

fn collect_proofs(node: &Node, prefix: Vec<u8>, proofs: &mut Vec<Proof>) {
    match node {
        Node::Leaf {
            data_hash,
            max_byte_range,
            ..
        } => {
            let mut proof = prefix;
            proof.extend_from_slice(data_hash);
            proof.extend_from_slice(&note(*max_byte_range));
            proofs.push(Proof {
                offset: max_byte_range.saturating_sub(1),
                proof,
            });
        }
        Node::Branch {
            byte_range,
            left,
            right,
            ..
        } => {
            let mut partial = prefix;
            partial.extend_from_slice(left.id());
            partial.extend_from_slice(right.id());
            partial.extend_from_slice(&note(*byte_range));
            collect_proofs(left, partial.clone(), proofs);
            collect_proofs(right, partial, proofs);
        }
    }
}

/// Chunk `data`, compute its data root and one proof per chunk.
///
/// A trailing empty chunk (data length a multiple of the chunk size) takes
/// part in the root but is not returned.
pub fn generate_chunks(data: &[u8]) -> ChunkedData {
    let mut chunks = chunk_data(data);
    let leaves = chunks.iter().map(leaf).collect();
    let root = match build_root(leaves) {
        Some(root) => root,
        None => unreachable!("chunk_data always yields at least one chunk"),
    };

    let mut proofs = Vec::with_capacity(chunks.len());
    collect_proofs(&root, Vec::new(), &mut proofs);

    if chunks.len() > 1
        && chunks
            .last()
            .map(|c| c.max_byte_range == c.min_byte_range)
            .unwrap_or(false)
    {
        chunks.pop();
        proofs.pop();
    }

    ChunkedData {
        data_root: *root.id(),
        chunks,
        proofs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_is_big_endian() {
        let n = note(0x0102);
        assert_eq!(n.len(), 32);
        assert_eq!(n[30], 0x01);
        assert_eq!(n[31], 0x02);
        assert!(n[..30].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_small_data_is_single_chunk() {
        let chunked = generate_chunks(&[7u8; 10 * 1024]);
        assert_eq!(chunked.chunks.len(), 1);
        assert_eq!(chunked.proofs.len(), 1);
        assert_eq!(chunked.chunks[0].max_byte_range, 10 * 1024);
        assert_eq!(chunked.proofs[0].offset, 10 * 1024 - 1);
        // data hash + note
        assert_eq!(chunked.proofs[0].proof.len(), 64);
    }

    #[test]
    fn test_single_chunk_root_is_leaf_id() {
        let data = vec![1u8; 1000];
        let chunked = generate_chunks(&data);
        let expected = hash_parts(&[&sha256(&data), &note(1000)]);
        assert_eq!(chunked.data_root, expected);
    }

    #[test]
    fn test_small_tail_is_rebalanced() {
        let len = MAX_CHUNK_SIZE + 1000;
        let chunks = chunk_data(&vec![0u8; len]);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].max_byte_range, len.div_ceil(2));
        assert_eq!(chunks[1].max_byte_range, len);
        assert!(chunks[1].max_byte_range - chunks[1].min_byte_range >= MIN_CHUNK_SIZE);
    }

    #[test]
    fn test_exact_multiple_drops_trailing_empty_chunk() {
        let chunked = generate_chunks(&vec![3u8; MAX_CHUNK_SIZE * 2]);
        assert_eq!(chunked.chunks.len(), 2);
        assert_eq!(chunked.proofs.len(), 2);
        assert_eq!(chunked.chunks[1].max_byte_range, MAX_CHUNK_SIZE * 2);
    }

    #[test]
    fn test_chunks_cover_data_contiguously() {
        let len = 3 * 1024 * 1024;
        let chunked = generate_chunks(&vec![9u8; len]);
        let mut cursor = 0;
        for (chunk, proof) in chunked.chunks.iter().zip(&chunked.proofs) {
            assert_eq!(chunk.min_byte_range, cursor);
            assert_eq!(proof.offset, chunk.max_byte_range - 1);
            cursor = chunk.max_byte_range;
        }
        assert_eq!(cursor, len);
    }

    #[test]
    fn test_root_changes_with_content() {
        let a = generate_chunks(b"first");
        let b = generate_chunks(b"second");
        assert_ne!(a.data_root, b.data_root);
    }
}
