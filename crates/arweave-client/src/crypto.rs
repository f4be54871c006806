//! Encoding and hashing primitives used by Arweave transactions

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use sha2::{Digest, Sha256, Sha384};

pub fn b64url_encode(data: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(data)
}

pub fn b64url_decode(data: &str) -> Result<Vec<u8>, base64::DecodeError> {
    URL_SAFE_NO_PAD.decode(data)
}

pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

fn sha384(data: &[u8]) -> Vec<u8> {
    Sha384::digest(data).to_vec()
}

/// Input to [`deep_hash`]: a byte string or a nested list
#[derive(Debug, Clone)]
pub enum DeepHashItem {
    Blob(Vec<u8>),
    List(Vec<DeepHashItem>),
}

impl DeepHashItem {
    pub fn blob(data: impl Into<Vec<u8>>) -> Self {
        DeepHashItem::Blob(data.into())
    }
}

/// Arweave deep hash (SHA-384 over tagged blobs and lists)
pub fn deep_hash(item: &DeepHashItem) -> Vec<u8> {
    match item {
        DeepHashItem::Blob(data) => {
            let tag = format!("blob{}", data.len());
            let mut tagged = sha384(tag.as_bytes());
            tagged.extend_from_slice(&sha384(data));
            sha384(&tagged)
        }
        DeepHashItem::List(items) => {
            let tag = format!("list{}", items.len());
            items.iter().fold(sha384(tag.as_bytes()), |acc, item| {
                let mut pair = acc;
                pair.extend_from_slice(&deep_hash(item));
                sha384(&pair)
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_b64url_has_no_padding() {
        assert_eq!(b64url_encode(&[0xfb, 0xff]), "-_8");
        assert_eq!(b64url_decode("-_8").unwrap(), vec![0xfb, 0xff]);
    }

    #[test]
    fn test_deep_hash_blob_matches_manual_construction() {
        let data = b"hello".to_vec();
        let mut expected = sha384(b"blob5");
        expected.extend_from_slice(&sha384(b"hello"));

        assert_eq!(
            deep_hash(&DeepHashItem::blob(data)),
            sha384(&expected)
        );
    }

    #[test]
    fn test_deep_hash_empty_list_is_tag_hash() {
        assert_eq!(deep_hash(&DeepHashItem::List(vec![])), sha384(b"list0"));
    }

    #[test]
    fn test_deep_hash_list_is_order_sensitive() {
        let a = DeepHashItem::List(vec![DeepHashItem::blob("a"), DeepHashItem::blob("b")]);
        let b = DeepHashItem::List(vec![DeepHashItem::blob("b"), DeepHashItem::blob("a")]);

        assert_eq!(deep_hash(&a).len(), 48);
        assert_ne!(deep_hash(&a), deep_hash(&b));
    }
}
