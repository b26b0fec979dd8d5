//! Build-time environment flags.
//!
//! Values are injected when the crate is compiled through these environment
//! variables:
//!
//! * `FZ3D_MODE`: `development`, `production` or `test`.
//! * `FZ3D_APP_TITLE`: the page title.
//! * `FZ3D_BASE_API`: base path of the backend API, `/api` when unset.
//! * `FZ3D_PUBLIC_PATH`: prefix for public assets, empty when unset.
//!
//! When `FZ3D_MODE` is unset, debug builds report [`NodeEnv::Development`] and
//! release builds [`NodeEnv::Production`].

use crate::error::EnvError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default value of [`BuildEnv::api_base_url`].
pub const DEFAULT_API_BASE_URL: &str = "/api";

/// The runtime mode the crate was built for.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeEnv {
    /// Local development build.
    Development,
    /// Production build.
    Production,
    /// Test build.
    Test,
}

impl NodeEnv {
    /// The lowercase tag of this mode.
    pub fn as_str(self) -> &'static str {
        match self {
            NodeEnv::Development => "development",
            NodeEnv::Production => "production",
            NodeEnv::Test => "test",
        }
    }

    fn from_profile() -> NodeEnv {
        if cfg!(debug_assertions) {
            NodeEnv::Development
        } else {
            NodeEnv::Production
        }
    }
}

impl FromStr for NodeEnv {
    type Err = EnvError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" => Ok(NodeEnv::Development),
            "production" => Ok(NodeEnv::Production),
            "test" => Ok(NodeEnv::Test),
            _ => Err(EnvError::InvalidMode(s.to_string())),
        }
    }
}

impl fmt::Display for NodeEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The environment settings injected at build time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildEnv {
    /// The runtime mode.
    pub mode: NodeEnv,
    /// Title of the hosting page, if any.
    pub page_title: Option<String>,
    /// Base path of the backend API.
    pub api_base_url: String,
    /// Prefix prepended to relative asset URLs.
    pub public_path: String,
}

impl Default for BuildEnv {
    fn default() -> Self {
        Self {
            mode: NodeEnv::from_profile(),
            page_title: None,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            public_path: String::new(),
        }
    }
}

impl BuildEnv {
    /// Reads the settings baked in at compile time.
    ///
    /// An unrecognized `FZ3D_MODE` is logged and replaced with the profile default.
    pub fn from_build() -> BuildEnv {
        Self::from_lookup(|key| {
            let value = match key {
                "FZ3D_MODE" => option_env!("FZ3D_MODE"),
                "FZ3D_APP_TITLE" => option_env!("FZ3D_APP_TITLE"),
                "FZ3D_BASE_API" => option_env!("FZ3D_BASE_API"),
                "FZ3D_PUBLIC_PATH" => option_env!("FZ3D_PUBLIC_PATH"),
                _ => None,
            };
            value.map(str::to_string)
        })
        .unwrap_or_else(|err| {
            log::warn!("{}, falling back to profile defaults", err);
            BuildEnv::default()
        })
    }

    /// Builds the settings from an arbitrary key lookup.
    ///
    /// Empty values count as unset, as they do for the build-time variables.
    pub fn from_lookup<F>(mut lookup: F) -> Result<BuildEnv, EnvError>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut get = |key: &str| lookup(key).filter(|v| !v.is_empty());
        let defaults = BuildEnv::default();

        let mode = match get("FZ3D_MODE") {
            Some(tag) => tag.parse()?,
            None => defaults.mode,
        };

        Ok(BuildEnv {
            mode,
            page_title: get("FZ3D_APP_TITLE"),
            api_base_url: get("FZ3D_BASE_API").unwrap_or(defaults.api_base_url),
            public_path: get("FZ3D_PUBLIC_PATH").unwrap_or(defaults.public_path),
        })
    }

    /// Whether this is a development build.
    pub fn is_dev(&self) -> bool {
        self.mode == NodeEnv::Development
    }

    /// Whether this is a production build.
    pub fn is_prod(&self) -> bool {
        self.mode == NodeEnv::Production
    }

    /// Whether this is a test build.
    pub fn is_test(&self) -> bool {
        self.mode == NodeEnv::Test
    }

    /// Joins `path` onto the API base URL.
    pub fn api_url(&self, path: &str) -> String {
        join_path(&self.api_base_url, path)
    }
}

/// Joins two path segments with exactly one `/` between them.
///
/// An empty `base` leaves `path` untouched.
pub(crate) fn join_path(base: &str, path: &str) -> String {
    if base.is_empty() {
        return path.to_string();
    }

    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
