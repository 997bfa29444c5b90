//! Request options for config specs

use serde::ser::{Serialize, SerializeSeq, Serializer};

/// Options of a `get_config_specs` request. Part of the cache key.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct ConfigSpecsOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssr: Option<SsrOptions>,
}

impl ConfigSpecsOptions {
    /// Request `hashed_sdk_keys_to_entities` as well
    pub fn ssr(ssr: SsrOptions) -> Self {
        Self { ssr: Some(ssr) }
    }

    pub fn is_ssr(&self) -> bool {
        self.ssr.is_some()
    }
}

/// Sources to map in `hashed_sdk_keys_to_entities`
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SsrOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_apps: Option<Selection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_keys: Option<Selection>,
}

impl SsrOptions {
    /// Every registered client key and every target app
    pub fn all() -> Self {
        Self {
            target_apps: Some(Selection::All),
            client_keys: Some(Selection::All),
        }
    }

    pub fn target_apps(mut self, selection: Selection) -> Self {
        self.target_apps = Some(selection);
        self
    }

    pub fn client_keys(mut self, selection: Selection) -> Self {
        self.client_keys = Some(selection);
        self
    }
}

/// Either every known source or an explicit list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    All,
    List(Vec<String>),
}

impl Selection {
    pub fn list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Selection::List(items.into_iter().map(Into::into).collect())
    }
}

impl Serialize for Selection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Selection::All => serializer.serialize_str("all"),
            Selection::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
        }
    }
}
