//! Validator configuration, read from TOML.
//!
//! ```toml
//! clock_skew = 300
//! max_restriction_depth = 5
//!
//! [[service_key]]
//! principal = "host/server.example.com"
//! realm = "EXAMPLE.COM"
//! kvno = 2
//! key = "3c4eefa9..."
//!
//! [[service_key]]
//! principal = "HTTP/www.example.com"
//! realm = "EXAMPLE.COM"
//! password = "..."
//! ```

use crate::asn1::constants::{EncryptionType, PrincipalNameType};
use crate::asn1::principal_name::PrincipalName;
use crate::constants::{
    DEFAULT_CLOCK_SKEW, DEFAULT_MAX_RESTRICTION_DEPTH, DEFAULT_REPLAY_PURGE_INTERVAL,
    RFC_PKBDF2_SHA1_ITER,
};
use crate::crypto::{string_to_key_aes256, KerberosKey, KeyUsage};
use crate::error::KrbError;
use crate::keystore::InMemoryKeyStore;
use crate::replay::MemoryReplayCache;
use serde::{Deserialize, Deserializer};
use std::fs;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::error;

fn default_clock_skew() -> u64 {
    DEFAULT_CLOCK_SKEW.as_secs()
}

fn default_max_restriction_depth() -> usize {
    DEFAULT_MAX_RESTRICTION_DEPTH
}

fn default_replay_purge_interval() -> usize {
    DEFAULT_REPLAY_PURGE_INTERVAL
}

fn default_authenticator_usage() -> u32 {
    KeyUsage::AP_REQ_AUTHENTICATOR.value()
}

fn default_kvno() -> u32 {
    1
}

fn default_etype() -> i32 {
    EncryptionType::AES256_CTS_HMAC_SHA1_96.into()
}

fn deserialize_hex_opt<'de, D>(deserializer: D) -> Result<Option<Vec<u8>>, D::Error>
where
    D: Deserializer<'de>,
{
    hex::serde::deserialize(deserializer).map(Some)
}

#[derive(Debug, Deserialize)]
pub struct ServiceKey {
    pub principal: String,
    pub realm: String,
    #[serde(default = "default_kvno")]
    pub kvno: u32,
    #[serde(default = "default_etype")]
    pub etype: i32,
    #[serde(default, deserialize_with = "deserialize_hex_opt")]
    pub key: Option<Vec<u8>>,
    pub password: Option<String>,
}

impl ServiceKey {
    fn principal_name(&self) -> Result<PrincipalName, KrbError> {
        let name_type = if self.principal.contains('/') {
            PrincipalNameType::NT_SRV_INST
        } else {
            PrincipalNameType::NT_PRINCIPAL
        };
        PrincipalName::try_from((i32::from(name_type), self.principal.as_str()))
    }

    fn kerberos_key(&self, principal: &PrincipalName) -> Result<KerberosKey, KrbError> {
        let etype = EncryptionType::try_from(self.etype).map_err(|_| {
            error!(etype = self.etype, principal = %self.principal, "Unknown encryption type");
            KrbError::UnsupportedEncryption
        })?;

        match (&self.key, &self.password) {
            (Some(key), None) => Ok(KerberosKey::new(etype, Some(self.kvno), key.clone())),
            (None, Some(password)) => {
                if etype != EncryptionType::AES256_CTS_HMAC_SHA1_96 {
                    error!(?etype, "Password keys are only derived for aes256");
                    return Err(KrbError::UnsupportedEncryption);
                }
                // Default salt: the realm then every name component, no separators.
                let salt: String = std::iter::once(self.realm.as_str())
                    .chain(principal.components())
                    .collect();
                let mut key = string_to_key_aes256(
                    password.as_bytes(),
                    salt.as_bytes(),
                    RFC_PKBDF2_SHA1_ITER,
                )?;
                key.kvno = Some(self.kvno);
                Ok(key)
            }
            _ => {
                error!(principal = %self.principal, "A service key needs exactly one of key or password");
                Err(KrbError::ConfigParse)
            }
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ValidatorConfig {
    /// Seconds.
    #[serde(default = "default_clock_skew")]
    pub clock_skew: u64,
    #[serde(default = "default_max_restriction_depth")]
    pub max_restriction_depth: usize,
    #[serde(default = "default_replay_purge_interval")]
    pub replay_purge_interval: usize,
    #[serde(default = "default_authenticator_usage")]
    pub authenticator_usage: u32,
    #[serde(default)]
    pub service_key: Vec<ServiceKey>,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        ValidatorConfig {
            clock_skew: default_clock_skew(),
            max_restriction_depth: default_max_restriction_depth(),
            replay_purge_interval: default_replay_purge_interval(),
            authenticator_usage: default_authenticator_usage(),
            service_key: Vec::new(),
        }
    }
}

impl FromStr for ValidatorConfig {
    type Err = KrbError;

    fn from_str(contents: &str) -> Result<Self, Self::Err> {
        toml::from_str(contents).map_err(|err| {
            error!(?err, "toml parse failure");
            KrbError::ConfigParse
        })
    }
}

impl ValidatorConfig {
    pub fn parse<P: AsRef<Path>>(path: P) -> Result<ValidatorConfig, KrbError> {
        let mut contents = String::new();
        let mut f = fs::File::open(&path).map_err(|err| {
            error!(?err, path = %path.as_ref().display(), "Unable to open config");
            KrbError::IoError
        })?;
        f.read_to_string(&mut contents).map_err(|err| {
            error!(?err, "Unable to read config");
            KrbError::IoError
        })?;
        contents.parse()
    }

    pub fn clock_skew(&self) -> Duration {
        Duration::from_secs(self.clock_skew)
    }

    pub fn authenticator_usage(&self) -> KeyUsage {
        KeyUsage::new(self.authenticator_usage)
    }

    pub fn keystore(&self) -> Result<InMemoryKeyStore, KrbError> {
        let mut store = InMemoryKeyStore::new();
        for entry in &self.service_key {
            let principal = entry.principal_name()?;
            let key = entry.kerberos_key(&principal)?;
            store.insert(&principal, &entry.realm, key);
        }
        Ok(store)
    }

    pub fn replay_cache(&self) -> MemoryReplayCache {
        MemoryReplayCache::new(self.replay_purge_interval)
    }
}
