//! VRF configuration documents.
//!
//! A configuration names the VRF an interface is moved into and, optionally,
//! the routing table that VRF is bound to:
//!
//! ```json
//! { "cniVersion": "1.0.0", "name": "net", "type": "vrf", "vrfname": "blue", "table": 0 }
//! ```
//!
//! Unknown keys are ignored. A key repeated inside any object of the document
//! is rejected.

use std::collections::HashSet;
use std::fmt;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use serde::de::{self, DeserializeSeed, MapAccess, SeqAccess, Visitor};

use crate::netlink::{Error, Result};

/// Decoded VRF configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VrfConf {
    #[serde(default)]
    pub cni_version: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub plugin_type: String,
    /// Name of the VRF device.
    #[serde(rename = "vrfname", default)]
    pub vrf_name: String,
    /// Routing table of the VRF; 0 lets the table be allocated.
    #[serde(default)]
    pub table: u32,
}

impl VrfConf {
    pub fn new(vrf_name: impl Into<String>, table: u32) -> Self {
        Self {
            vrf_name: vrf_name.into(),
            table,
            ..Default::default()
        }
    }

    /// Decode and validate a JSON document.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let conf = Self::decode(bytes)?;
        conf.validate()?;
        Ok(conf)
    }

    fn decode(bytes: &[u8]) -> Result<Self> {
        let mut de = serde_json::Deserializer::from_slice(bytes);
        UniqueKeys.deserialize(&mut de)?;
        de.end()?;

        Ok(serde_json::from_slice(bytes)?)
    }

    /// Read a document from a file, or from stdin when `path` is `-`.
    ///
    /// The VRF name is not validated here so that it can still be supplied
    /// through [`with_overrides`](Self::with_overrides).
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = if path == Path::new("-") {
            let mut buf = Vec::new();
            std::io::stdin().read_to_end(&mut buf)?;
            buf
        } else {
            std::fs::read(path)?
        };
        tracing::debug!(path = %path.display(), len = bytes.len(), "loaded configuration");
        Self::decode(&bytes)
    }

    /// Apply command line overrides on top of the document.
    pub fn with_overrides(mut self, vrf_name: Option<String>, table: Option<u32>) -> Self {
        if let Some(name) = vrf_name {
            self.vrf_name = name;
        }
        if let Some(table) = table {
            self.table = table;
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.vrf_name.is_empty() {
            return Err(Error::InvalidConfig(
                "configuration is expected to have a valid vrf name".to_string(),
            ));
        }
        Ok(())
    }
}

/// Walks a JSON value and rejects objects with repeated keys.
///
/// Each object gets its own key set, owned by the `visit_map` call that reads
/// it, so nothing is shared between decodes.
struct UniqueKeys;

impl<'de> DeserializeSeed<'de> for UniqueKeys {
    type Value = ();

    fn deserialize<D>(self, deserializer: D) -> std::result::Result<(), D::Error>
    where
        D: de::Deserializer<'de>,
    {
        deserializer.deserialize_any(self)
    }
}

impl<'de> Visitor<'de> for UniqueKeys {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("any JSON value")
    }

    fn visit_bool<E>(self, _: bool) -> std::result::Result<(), E> {
        Ok(())
    }

    fn visit_i64<E>(self, _: i64) -> std::result::Result<(), E> {
        Ok(())
    }

    fn visit_u64<E>(self, _: u64) -> std::result::Result<(), E> {
        Ok(())
    }

    fn visit_f64<E>(self, _: f64) -> std::result::Result<(), E> {
        Ok(())
    }

    fn visit_str<E>(self, _: &str) -> std::result::Result<(), E> {
        Ok(())
    }

    fn visit_unit<E>(self) -> std::result::Result<(), E> {
        Ok(())
    }

    fn visit_seq<A>(self, mut seq: A) -> std::result::Result<(), A::Error>
    where
        A: SeqAccess<'de>,
    {
        while seq.next_element_seed(UniqueKeys)?.is_some() {}
        Ok(())
    }

    fn visit_map<A>(self, mut map: A) -> std::result::Result<(), A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut seen = HashSet::new();
        while let Some(key) = map.next_key::<String>()? {
            map.next_value_seed(UniqueKeys)?;
            if !seen.insert(key.clone()) {
                return Err(de::Error::custom(format!(
                    "duplicated key \"{}\" is not allowed",
                    key
                )));
            }
        }
        Ok(())
    }
}
