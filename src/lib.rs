/*!
# fz3d

A keep-it-simple wrapper that drives an existing 3D engine.

Setting up a canvas-bound 3D view always takes the same steps: find the canvas,
create a scene, a camera and a renderer, add a light and some orbit controls,
load a handful of models, and run a render loop that keeps the drawing buffer
in sync with the canvas size. **fz3d** does these steps and nothing else.
Scene graph internals, GPU rendering and file-format parsing stay in the
engine, which fz3d drives through the [`Engine`](engine::Engine) trait.

## Features

* canvas lookup by id or element, with a typed error when it is not a canvas.
* a perspective camera, auto-rotating orbit controls, an axes helper and lighting.
* a sequential asset loader for OBJ (with MTL), GLTF/GLB (with DRACO), FBX and JSON
  assets, loading one asset at a time and reporting progress.
* a render loop resizing the drawing buffer to the displayed size.
* build-time environment flags.

Loading assets and starting the render loop with the in-process headless engine:

```
use fz3d::backend::headless::{HeadlessCanvas, HeadlessDocument, HeadlessEngine};
use fz3d::prelude::*;

let mut engine = HeadlessEngine::new();
let mut document = HeadlessDocument::new();
document.append(HeadlessCanvas::new().with_id("stage"));

let viewer = Viewer::new(&mut engine, &document, "stage", ViewerOptions::full())
    .unwrap()
    .into_shared();

let queue = LoadQueue::new()
    .with(AssetSource::obj("models/house.obj", "models/house.mtl"))
    .with(AssetSource::glb("models/car.glb"));
let report = pollster::block_on(Viewer::load_all(&viewer, queue, QueueCallbacks::new())).unwrap();
assert_eq!(report.outcome, DrainOutcome::Completed);

Viewer::render(&viewer, |_viewer, _time| {}).unwrap();
assert!(engine.scheduler().fire(16.0));
```

On the web, [`backend::web`] binds the DOM and `requestAnimationFrame`, and
[`Viewer::load_all`](viewer::Viewer::load_all) runs on the browser's event loop.
*/
#![allow(clippy::module_inception)]
#![allow(clippy::type_complexity)]

pub use glamx;

#[cfg(not(target_arch = "wasm32"))]
#[doc(hidden)]
pub use pollster;

#[cfg(target_arch = "wasm32")]
#[doc(hidden)]
pub use wasm_bindgen_futures;

pub use crate::error::{ContainerFault, EnvError, LoadError, ViewerError};

pub mod backend;
pub mod camera;
pub mod color;
pub mod engine;
pub mod environment;
pub mod error;
pub mod light;
pub mod loader;
pub mod scene;
pub mod viewer;
pub mod window;

pub mod prelude {
    pub use crate::camera::*;
    pub use crate::color::*;
    pub use crate::engine::*;
    pub use crate::environment::*;
    pub use crate::error::{ContainerFault, EnvError, LoadError, ViewerError};
    pub use crate::light::*;
    pub use crate::loader::*;
    pub use crate::scene::*;
    pub use crate::viewer::*;
    pub use crate::window::*;
    pub use glamx::{Mat4, Vec2, Vec3};
    pub use std::cell::RefCell;
    pub use std::rc::Rc;
}
