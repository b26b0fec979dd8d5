use crate::error::LoadError;
use crate::loader::ProgressEvent;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Decoder path used by GLTF/GLB requests that do not name one.
pub const DEFAULT_DRACO_PATH: &str = "draco/";

/// The asset formats the loader can dispatch.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetFormat {
    /// Wavefront OBJ geometry, optionally with an MTL material library.
    Obj,
    /// GLTF scene (JSON flavour).
    Gltf,
    /// GLTF scene (binary flavour).
    Glb,
    /// Autodesk FBX.
    Fbx,
    /// Generic JSON document.
    Json,
}

impl AssetFormat {
    /// Every supported format.
    pub const ALL: [AssetFormat; 5] = [
        AssetFormat::Obj,
        AssetFormat::Gltf,
        AssetFormat::Glb,
        AssetFormat::Fbx,
        AssetFormat::Json,
    ];

    /// The lowercase tag of this format.
    pub fn as_str(self) -> &'static str {
        match self {
            AssetFormat::Obj => "obj",
            AssetFormat::Gltf => "gltf",
            AssetFormat::Glb => "glb",
            AssetFormat::Fbx => "fbx",
            AssetFormat::Json => "json",
        }
    }
}

impl FromStr for AssetFormat {
    type Err = LoadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AssetFormat::ALL
            .iter()
            .copied()
            .find(|format| format.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| LoadError::UnsupportedFormat(s.to_string()))
    }
}

impl fmt::Display for AssetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What to load: the format together with the URLs that format needs.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum AssetSource {
    /// OBJ geometry and its optional material library.
    Obj {
        /// Geometry URL.
        url: String,
        /// Material library URL.
        mtl_url: Option<String>,
    },
    /// GLTF scene.
    Gltf {
        /// Scene URL.
        url: String,
        /// DRACO decoder path, [`DEFAULT_DRACO_PATH`] when unset.
        draco_path: Option<String>,
    },
    /// GLB scene.
    Glb {
        /// Scene URL.
        url: String,
        /// DRACO decoder path, [`DEFAULT_DRACO_PATH`] when unset.
        draco_path: Option<String>,
    },
    /// FBX model.
    Fbx {
        /// Model URL.
        url: String,
    },
    /// JSON document.
    Json {
        /// Document URL.
        url: String,
    },
}

impl AssetSource {
    /// OBJ geometry at `url` with the material library at `mtl_url`.
    pub fn obj(url: impl Into<String>, mtl_url: impl Into<String>) -> Self {
        AssetSource::Obj {
            url: url.into(),
            mtl_url: Some(mtl_url.into()),
        }
    }

    /// GLTF scene at `url`.
    pub fn gltf(url: impl Into<String>) -> Self {
        AssetSource::Gltf {
            url: url.into(),
            draco_path: None,
        }
    }

    /// GLB scene at `url`.
    pub fn glb(url: impl Into<String>) -> Self {
        AssetSource::Glb {
            url: url.into(),
            draco_path: None,
        }
    }

    /// FBX model at `url`.
    pub fn fbx(url: impl Into<String>) -> Self {
        AssetSource::Fbx { url: url.into() }
    }

    /// JSON document at `url`.
    pub fn json(url: impl Into<String>) -> Self {
        AssetSource::Json { url: url.into() }
    }

    /// Sets the DRACO decoder path. No-op for formats other than GLTF/GLB.
    pub fn with_draco_path(mut self, path: impl Into<String>) -> Self {
        match &mut self {
            AssetSource::Gltf { draco_path, .. } | AssetSource::Glb { draco_path, .. } => {
                *draco_path = Some(path.into())
            }
            _ => {}
        }
        self
    }

    /// The format of this source.
    pub fn format(&self) -> AssetFormat {
        match self {
            AssetSource::Obj { .. } => AssetFormat::Obj,
            AssetSource::Gltf { .. } => AssetFormat::Gltf,
            AssetSource::Glb { .. } => AssetFormat::Glb,
            AssetSource::Fbx { .. } => AssetFormat::Fbx,
            AssetSource::Json { .. } => AssetFormat::Json,
        }
    }

    /// The main URL of this source.
    pub fn url(&self) -> &str {
        match self {
            AssetSource::Obj { url, .. }
            | AssetSource::Gltf { url, .. }
            | AssetSource::Glb { url, .. }
            | AssetSource::Fbx { url }
            | AssetSource::Json { url } => url,
        }
    }
}

/// The untyped, serializable description of a load, as found in manifests.
///
/// ```
/// # use fz3d::loader::{AssetSource, LoadSpec};
/// let spec: LoadSpec =
///     serde_json::from_str(r#"{ "type": "glb", "url": "car.glb", "dracoUrl": "libs/draco/" }"#).unwrap();
/// let source = AssetSource::try_from(spec).unwrap();
/// assert_eq!(source, AssetSource::glb("car.glb").with_draco_path("libs/draco/"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadSpec {
    /// The format tag.
    #[serde(rename = "type")]
    pub kind: String,
    /// Main URL.
    pub url: String,
    /// DRACO decoder path for GLTF/GLB.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draco_url: Option<String>,
    /// Material library URL for OBJ.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mtl_url: Option<String>,
}

impl TryFrom<LoadSpec> for AssetSource {
    type Error = LoadError;

    fn try_from(spec: LoadSpec) -> Result<Self, Self::Error> {
        let LoadSpec {
            kind,
            url,
            draco_url,
            mtl_url,
        } = spec;

        Ok(match kind.parse::<AssetFormat>()? {
            AssetFormat::Obj => AssetSource::Obj { url, mtl_url },
            AssetFormat::Gltf => AssetSource::Gltf {
                url,
                draco_path: draco_url,
            },
            AssetFormat::Glb => AssetSource::Glb {
                url,
                draco_path: draco_url,
            },
            AssetFormat::Fbx => AssetSource::Fbx { url },
            AssetFormat::Json => AssetSource::Json { url },
        })
    }
}

/// A loaded asset.
#[derive(Clone, Debug, PartialEq)]
pub enum Asset<M> {
    /// A model produced by a model loader.
    Model(M),
    /// A parsed JSON document.
    Json(serde_json::Value),
}

impl<M> Asset<M> {
    /// The model, if this is one.
    pub fn as_model(&self) -> Option<&M> {
        match self {
            Asset::Model(model) => Some(model),
            Asset::Json(_) => None,
        }
    }

    /// The JSON document, if this is one.
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Asset::Json(value) => Some(value),
            Asset::Model(_) => None,
        }
    }
}

pub(crate) type LoadCallback<M> = Box<dyn FnOnce(&Asset<M>)>;
pub(crate) type ProgressCallback = Box<dyn FnMut(&ProgressEvent, usize)>;
pub(crate) type ErrorCallback = Box<dyn FnOnce(&LoadError)>;

/// A source together with the callbacks to run for it.
///
/// The progress callback receives the index of the request in its queue.
pub struct LoadRequest<M> {
    pub(crate) source: AssetSource,
    pub(crate) on_load: Option<LoadCallback<M>>,
    pub(crate) on_progress: Option<ProgressCallback>,
    pub(crate) on_error: Option<ErrorCallback>,
}

impl<M> LoadRequest<M> {
    /// A request without callbacks.
    pub fn new(source: AssetSource) -> Self {
        LoadRequest {
            source,
            on_load: None,
            on_progress: None,
            on_error: None,
        }
    }

    /// Called with the asset once it is loaded.
    pub fn on_load(mut self, f: impl FnOnce(&Asset<M>) + 'static) -> Self {
        self.on_load = Some(Box::new(f));
        self
    }

    /// Called for every progress event of this request.
    pub fn on_progress(mut self, f: impl FnMut(&ProgressEvent, usize) + 'static) -> Self {
        self.on_progress = Some(Box::new(f));
        self
    }

    /// Called if the request fails for good.
    pub fn on_error(mut self, f: impl FnOnce(&LoadError) + 'static) -> Self {
        self.on_error = Some(Box::new(f));
        self
    }

    /// The source of this request.
    pub fn source(&self) -> &AssetSource {
        &self.source
    }
}

impl<M> From<AssetSource> for LoadRequest<M> {
    fn from(source: AssetSource) -> Self {
        LoadRequest::new(source)
    }
}

impl<M> fmt::Debug for LoadRequest<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadRequest")
            .field("source", &self.source)
            .field("on_load", &self.on_load.is_some())
            .field("on_progress", &self.on_progress.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

/// An ordered list of requests, drained front to back.
///
/// Entries built from a [`LoadSpec`] with an unknown tag are kept in place, so
/// the error surfaces at their position when the queue is drained.
#[derive(Debug)]
pub struct LoadQueue<M> {
    entries: Vec<Result<LoadRequest<M>, LoadError>>,
}

impl<M> Default for LoadQueue<M> {
    fn default() -> Self {
        LoadQueue {
            entries: Vec::new(),
        }
    }
}

impl<M> LoadQueue<M> {
    /// An empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a request.
    pub fn push(&mut self, request: impl Into<LoadRequest<M>>) -> &mut Self {
        self.entries.push(Ok(request.into()));
        self
    }

    /// Appends a request, builder style.
    pub fn with(mut self, request: impl Into<LoadRequest<M>>) -> Self {
        self.push(request);
        self
    }

    /// Appends an untyped request.
    pub fn push_spec(&mut self, spec: LoadSpec) -> &mut Self {
        self.entries
            .push(AssetSource::try_from(spec).map(LoadRequest::new));
        self
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the queue has no entry.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn into_entries(self) -> Vec<Result<LoadRequest<M>, LoadError>> {
        self.entries
    }
}

impl<M> FromIterator<LoadRequest<M>> for LoadQueue<M> {
    fn from_iter<I: IntoIterator<Item = LoadRequest<M>>>(iter: I) -> Self {
        LoadQueue {
            entries: iter.into_iter().map(Ok).collect(),
        }
    }
}

impl<M> FromIterator<LoadSpec> for LoadQueue<M> {
    fn from_iter<I: IntoIterator<Item = LoadSpec>>(iter: I) -> Self {
        let mut queue = LoadQueue::new();
        for spec in iter {
            queue.push_spec(spec);
        }
        queue
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_tags_round_trip() {
        for format in AssetFormat::ALL.iter() {
            assert_eq!(format.as_str().parse::<AssetFormat>().as_ref(), Ok(format));
        }
        assert_eq!("GLB".parse::<AssetFormat>(), Ok(AssetFormat::Glb));
    }

    #[test]
    fn unknown_tag_is_unsupported() {
        assert_eq!(
            "stl".parse::<AssetFormat>(),
            Err(LoadError::UnsupportedFormat("stl".to_string()))
        );
    }

    #[test]
    fn spec_maps_auxiliary_urls() {
        let spec = LoadSpec {
            kind: "obj".to_string(),
            url: "house.obj".to_string(),
            draco_url: Some("ignored/".to_string()),
            mtl_url: Some("house.mtl".to_string()),
        };

        assert_eq!(
            AssetSource::try_from(spec),
            Ok(AssetSource::obj("house.obj", "house.mtl"))
        );
    }

    #[test]
    fn draco_path_only_applies_to_gltf() {
        let fbx = AssetSource::fbx("a.fbx").with_draco_path("d/");
        assert_eq!(fbx, AssetSource::fbx("a.fbx"));

        let gltf = AssetSource::gltf("a.gltf").with_draco_path("d/");
        assert_eq!(
            gltf,
            AssetSource::Gltf {
                url: "a.gltf".to_string(),
                draco_path: Some("d/".to_string())
            }
        );
    }

    #[test]
    fn queue_keeps_rejected_specs_in_place() {
        let queue: LoadQueue<()> = vec![
            LoadSpec {
                kind: "json".to_string(),
                url: "a.json".to_string(),
                draco_url: None,
                mtl_url: None,
            },
            LoadSpec {
                kind: "stl".to_string(),
                url: "b.stl".to_string(),
                draco_url: None,
                mtl_url: None,
            },
        ]
        .into_iter()
        .collect();

        let entries = queue.into_entries();
        assert_eq!(entries.len(), 2);
        assert!(entries[0].is_ok());
        assert!(matches!(entries[1], Err(LoadError::UnsupportedFormat(_))));
    }
}
