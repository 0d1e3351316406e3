//! Long-term service keys, looked up by principal, realm and key version.

use crate::asn1::constants::EncryptionType;
use crate::asn1::principal_name::PrincipalName;
use crate::crypto::KerberosKey;
use std::collections::BTreeMap;
use tracing::{debug, trace};

pub trait KeyStore: Send + Sync {
    /// Find the key for `principal@realm` of type `etype`. With no `kvno` the
    /// newest version is returned.
    fn resolve(
        &self,
        principal: &PrincipalName,
        realm: &str,
        kvno: Option<u32>,
        etype: EncryptionType,
    ) -> Option<KerberosKey>;
}

/// A keytab held in memory. Principals compare by their components, the name type
/// is only a hint.
#[derive(Debug, Default, Clone)]
pub struct InMemoryKeyStore {
    keys: BTreeMap<(String, String), Vec<KerberosKey>>,
}

impl InMemoryKeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, principal: &PrincipalName, realm: &str, key: KerberosKey) {
        let entry = self
            .keys
            .entry((realm.to_string(), principal.to_string()))
            .or_default();
        // Replace an existing key of the same type and version.
        entry.retain(|k| !(k.etype == key.etype && k.kvno == key.kvno));
        entry.push(key);
    }

    pub fn len(&self) -> usize {
        self.keys.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyStore for InMemoryKeyStore {
    fn resolve(
        &self,
        principal: &PrincipalName,
        realm: &str,
        kvno: Option<u32>,
        etype: EncryptionType,
    ) -> Option<KerberosKey> {
        let candidates = self.keys.get(&(realm.to_string(), principal.to_string()))?;
        trace!(%principal, %realm, count = candidates.len(), "key candidates");

        let found = candidates
            .iter()
            .filter(|k| k.etype == etype)
            .filter(|k| kvno.is_none() || k.kvno == kvno)
            .max_by_key(|k| k.kvno)
            .cloned();

        if found.is_none() {
            debug!(%principal, %realm, ?kvno, ?etype, "No matching service key");
        }
        found
    }
}
