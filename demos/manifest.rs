use fz3d::backend::headless::{HeadlessLoaders, HeadlessModel};
use fz3d::prelude::*;

const MANIFEST: &str = r#"[
    { "type": "obj", "url": "house.obj", "mtlUrl": "house.mtl" },
    { "type": "gltf", "url": "tree.gltf" },
    { "type": "stl", "url": "bracket.stl" },
    { "type": "fbx", "url": "worker.fbx" },
    { "type": "json", "url": "https://cdn.example.com/layout.json" }
]"#;

fn main() {
    env_logger::init();

    let specs: Vec<LoadSpec> = match serde_json::from_str(MANIFEST) {
        Ok(specs) => specs,
        Err(err) => {
            eprintln!("invalid manifest: {}", err);
            return;
        }
    };

    let env = BuildEnv::from_build();
    println!("mode: {}, assets under {:?}", env.mode, env.public_path);

    let registry = LoaderRegistry::new(HeadlessLoaders::new()).with_base_path("/assets");
    let mut loader = SequentialLoader::new(registry).with_policy(ErrorPolicy::Skip);

    let callbacks = QueueCallbacks::new()
        .on_loaded(|index, asset: &Asset<HeadlessModel>| match asset {
            Asset::Model(model) => println!("#{} model from {}", index, model.url),
            Asset::Json(value) => println!("#{} document {}", index, value),
        })
        .on_error(|index, error| println!("#{} skipped: {}", index, error));
    let report = loader.drain_blocking(specs.into_iter().collect(), callbacks);

    println!("{:?} after {:?}", report.outcome, loader.state());
}
