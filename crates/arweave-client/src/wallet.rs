//! Arweave wallet keys (RSA JWK)

use crate::crypto::{b64url_decode, b64url_encode, sha256};
use crate::error::{ArweaveError, Result};
use rand::rngs::OsRng;
use rsa::traits::{PrivateKeyParts, PublicKeyParts};
use rsa::{BigUint, Pss, RsaPrivateKey};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::fmt;
use std::path::Path;

/// RSA private key in JSON Web Key form, as written by Arweave wallets
#[derive(Clone, Serialize, Deserialize)]
pub struct Jwk {
    pub kty: String,
    pub n: String,
    pub e: String,
    pub d: String,
    pub p: String,
    pub q: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dq: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qi: Option<String>,
}

fn component(name: &str, value: &str) -> Result<BigUint> {
    let bytes = b64url_decode(value)
        .map_err(|e| ArweaveError::KeyInvalid(format!("field '{}' is not base64url: {}", name, e)))?;
    Ok(BigUint::from_bytes_be(&bytes))
}

fn encode_component(value: &BigUint) -> String {
    b64url_encode(&value.to_bytes_be())
}

/// A loaded wallet: the signing key plus its derived address
pub struct Wallet {
    jwk: Jwk,
    key: RsaPrivateKey,
    address: String,
}

impl Wallet {
    /// Load a wallet from a JWK key file.
    ///
    /// Reads synchronously; this happens once at startup.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ArweaveError::KeyMissing(path.to_path_buf())
            } else {
                ArweaveError::KeyInvalid(format!("unreadable: {}", e))
            }
        })?;

        let jwk: Jwk = serde_json::from_str(&contents)
            .map_err(|e| ArweaveError::KeyInvalid(format!("malformed JSON: {}", e)))?;
        Self::from_jwk(jwk)
    }

    pub fn from_jwk(jwk: Jwk) -> Result<Self> {
        if jwk.kty != "RSA" {
            return Err(ArweaveError::KeyInvalid(format!(
                "unsupported key type '{}'",
                jwk.kty
            )));
        }

        let key = RsaPrivateKey::from_components(
            component("n", &jwk.n)?,
            component("e", &jwk.e)?,
            component("d", &jwk.d)?,
            vec![component("p", &jwk.p)?, component("q", &jwk.q)?],
        )
        .map_err(|e| ArweaveError::KeyInvalid(e.to_string()))?;

        let owner = b64url_decode(&jwk.n)
            .map_err(|e| ArweaveError::KeyInvalid(e.to_string()))?;
        let address = b64url_encode(&sha256(&owner));

        Ok(Self { jwk, key, address })
    }

    /// Generate a fresh wallet, for local development and tests
    pub fn generate(bits: usize) -> Result<Self> {
        let key = RsaPrivateKey::new(&mut OsRng, bits)
            .map_err(|e| ArweaveError::Signing(e.to_string()))?;
        let primes = key.primes();
        if primes.len() < 2 {
            return Err(ArweaveError::Signing(
                "generated key has fewer than two primes".to_string(),
            ));
        }

        let jwk = Jwk {
            kty: "RSA".to_string(),
            n: encode_component(key.n()),
            e: encode_component(key.e()),
            d: encode_component(key.d()),
            p: encode_component(&primes[0]),
            q: encode_component(&primes[1]),
            dp: None,
            dq: None,
            qi: None,
        };
        Self::from_jwk(jwk)
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// The `owner` field of transactions signed by this wallet (base64url modulus)
    pub fn owner(&self) -> &str {
        &self.jwk.n
    }

    pub fn jwk(&self) -> &Jwk {
        &self.jwk
    }

    /// RSA-PSS / SHA-256 signature over `message`
    pub fn sign(&self, message: &[u8]) -> Result<Vec<u8>> {
        let hashed = sha256(message);
        self.key
            .sign_with_rng(&mut OsRng, Pss::new::<Sha256>(), &hashed)
            .map_err(|e| ArweaveError::Signing(e.to_string()))
    }

    #[cfg(test)]
    pub(crate) fn public_key(&self) -> rsa::RsaPublicKey {
        self.key.to_public_key()
    }
}

impl fmt::Debug for Wallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wallet")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_missing_key_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Wallet::load(dir.path().join("key.store")).unwrap_err();
        assert!(matches!(err, ArweaveError::KeyMissing(_)));
    }

    #[test]
    fn test_load_malformed_key_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"{not json").unwrap();

        let err = Wallet::load(file.path()).unwrap_err();
        assert!(matches!(err, ArweaveError::KeyInvalid(_)));
    }

    #[test]
    fn test_load_rejects_non_rsa_key() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(br#"{"kty":"EC","n":"","e":"","d":"","p":"","q":""}"#)
            .unwrap();

        let err = Wallet::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("unsupported key type"));
    }

    #[test]
    fn test_round_trip_through_key_file() {
        let wallet = Wallet::generate(1024).unwrap();
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(serde_json::to_string(wallet.jwk()).unwrap().as_bytes())
            .unwrap();

        let loaded = Wallet::load(file.path()).unwrap();
        assert_eq!(loaded.address(), wallet.address());
        assert_eq!(loaded.address().len(), 43);
    }

    #[test]
    fn test_address_is_hash_of_owner() {
        let wallet = Wallet::generate(1024).unwrap();
        let owner = b64url_decode(wallet.owner()).unwrap();
        assert_eq!(wallet.address(), b64url_encode(&sha256(&owner)));
    }

    #[test]
    fn test_signature_verifies() {
        let wallet = Wallet::generate(1024).unwrap();
        let signature = wallet.sign(b"message").unwrap();

        let hashed = sha256(b"message");
        wallet
            .public_key()
            .verify(Pss::new::<Sha256>(), &hashed, &signature)
            .unwrap();
    }

    #[test]
    fn test_debug_hides_key_material() {
        let wallet = Wallet::generate(1024).unwrap();
        let debug = format!("{:?}", wallet);
        assert!(debug.contains(wallet.address()));
        assert!(!debug.contains(&wallet.jwk().d));
    }
}
