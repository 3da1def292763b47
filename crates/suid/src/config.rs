//! Client configuration and field-by-field merging of updates.

use serde::{Deserialize, Serialize};

use crate::{Error, Result, Suid};

/// Default low-water mark.
pub const DEFAULT_MIN: usize = 3;

/// Default target pool size.
pub const DEFAULT_MAX: usize = 4;

/// The effective configuration of a [`Dispenser`](crate::Dispenser).
///
/// - `server`: the allocator endpoint. Without one no blocks are fetched.
/// - `min`: pool size below which replenishment is triggered.
/// - `max`: pool size replenishment aims for.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Config {
    pub server: Option<String>,
    pub min: usize,
    pub max: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: None,
            min: DEFAULT_MIN,
            max: DEFAULT_MAX,
        }
    }
}

impl Config {
    /// Overwrites every field that `update` sets. The seed is not part of the
    /// configuration and is ignored here.
    pub fn merge(&mut self, update: &ConfigUpdate) {
        if let Some(server) = &update.server {
            self.server = Some(server.clone());
        }
        if let Some(min) = update.min {
            self.min = min;
        }
        if let Some(max) = update.max {
            self.max = max;
        }
    }
}

/// A partial configuration, merged over the current one.
///
/// `seed` carries pre-made block starts that go straight into the pool; it is
/// consumed when the update is applied and never retained.
///
/// ```
/// use suid::{Config, ConfigUpdate};
///
/// let mut config = Config::default();
/// config.merge(&ConfigUpdate::from_options("{'server': '/suid.json', 'min': 2}").unwrap());
/// config.merge(&ConfigUpdate::default().with_max(8));
/// assert_eq!(config.server.as_deref(), Some("/suid.json"));
/// assert_eq!((config.min, config.max), (2, 8));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct ConfigUpdate {
    #[serde(default, alias = "url")]
    pub server: Option<String>,
    #[serde(default)]
    pub min: Option<usize>,
    #[serde(default)]
    pub max: Option<usize>,
    #[serde(default)]
    pub seed: Option<Vec<Suid>>,
}

impl ConfigUpdate {
    #[must_use]
    pub fn with_server(mut self, server: impl Into<String>) -> Self {
        self.server = Some(server.into());
        self
    }

    #[must_use]
    pub fn with_min(mut self, min: usize) -> Self {
        self.min = Some(min);
        self
    }

    #[must_use]
    pub fn with_max(mut self, max: usize) -> Self {
        self.max = Some(max);
        self
    }

    #[must_use]
    pub fn with_seed(mut self, seed: impl IntoIterator<Item = Suid>) -> Self {
        self.seed = Some(seed.into_iter().collect());
        self
    }

    /// Parses a JSON object such as `{"server": "...", "min": 2}`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigParse`] if the text is not a valid update.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| Error::ConfigParse {
            reason: format!("{e} in {text:?}"),
        })
    }

    /// Parses the attribute-friendly option syntax, JSON in which single
    /// quotes stand in for double quotes: `{'min': 2, 'seed': ['14she']}`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigParse`] if the text is not a valid update.
    pub fn from_options(text: &str) -> Result<Self> {
        Self::from_json(&text.replace('\'', "\""))
    }
}
