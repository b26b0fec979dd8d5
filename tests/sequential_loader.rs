use std::cell::RefCell;
use std::rc::Rc;

use fz3d::backend::headless::{HeadlessLoaders, HeadlessMaterials, HeadlessModel};
use fz3d::prelude::*;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn loader(loaders: &HeadlessLoaders) -> SequentialLoader<HeadlessLoaders> {
    SequentialLoader::new(LoaderRegistry::new(loaders.clone()))
}

fn model(asset: &Asset<HeadlessModel>) -> &HeadlessModel {
    asset.as_model().expect("expected a model")
}

fn obj(url: &str) -> AssetSource {
    AssetSource::Obj {
        url: url.to_string(),
        mtl_url: None,
    }
}

#[test]
fn results_follow_submission_order() {
    init_logger();
    let loaders = HeadlessLoaders::new();
    let mut loader = loader(&loaders);

    let queue = LoadQueue::new()
        .with(AssetSource::fbx("a.fbx"))
        .with(AssetSource::gltf("b.gltf"))
        .with(AssetSource::json("c.json"))
        .with(AssetSource::obj("d.obj", "d.mtl"))
        .with(AssetSource::glb("e.glb"));

    let report = loader.drain_blocking(queue, QueueCallbacks::new());

    assert_eq!(report.outcome, DrainOutcome::Completed);
    assert_eq!(report.results.len(), 5);
    assert_eq!(model(&report.results[0]).url, "a.fbx");
    assert_eq!(model(&report.results[1]).url, "b.gltf");
    assert_eq!(
        report.results[2].as_json(),
        Some(&serde_json::json!({ "url": "c.json" }))
    );
    assert_eq!(model(&report.results[3]).url, "d.obj");
    assert_eq!(model(&report.results[4]).url, "e.glb");
    assert_eq!(loader.state(), DrainState::Done);
}

#[test]
fn never_two_loads_in_flight() {
    let loaders = HeadlessLoaders::new();
    let mut loader = loader(&loaders);

    let queue: LoadQueue<HeadlessModel> = (0..8)
        .map(|i| LoadRequest::new(AssetSource::obj(format!("{}.obj", i), format!("{}.mtl", i))))
        .collect();
    let report = loader.drain_blocking(queue, QueueCallbacks::new());

    assert!(report.is_complete());
    assert_eq!(loaders.dispatched().len(), 16);
    assert_eq!(loaders.max_in_flight(), 1);
}

#[test]
fn all_load_fires_once_after_the_last_completion() {
    let loaders = HeadlessLoaders::new();
    let mut loader = loader(&loaders);
    let events = Rc::new(RefCell::new(Vec::new()));

    let mut queue = LoadQueue::new();
    for (i, source) in vec![
        AssetSource::obj("a.obj", "a.mtl"),
        AssetSource::gltf("b.gltf"),
        AssetSource::json("c.json"),
    ]
    .into_iter()
    .enumerate()
    {
        let events = events.clone();
        let _ = queue.push(LoadRequest::new(source).on_load(move |_| {
            events.borrow_mut().push(format!("load {}", i))
        }));
    }

    let callbacks = QueueCallbacks::new().on_all_load(|results: &[Asset<HeadlessModel>]| {
        events.borrow_mut().push(format!("all {}", results.len()))
    });
    let report = loader.drain_blocking(queue, callbacks);

    assert_eq!(
        *events.borrow(),
        vec!["load 0", "load 1", "load 2", "all 3"]
    );
    assert_eq!(model(&report.results[0]).loader, "obj");
    assert_eq!(model(&report.results[1]).loader, "gltf");
    assert!(report.results[2].as_json().is_some());
}

#[test]
fn failure_halts_the_queue() {
    init_logger();
    let loaders = HeadlessLoaders::new();
    loaders.fail("a.fbx", "404 Not Found");
    let mut loader = loader(&loaders);

    let request_error = Rc::new(RefCell::new(None));
    let seen = request_error.clone();
    let queue = LoadQueue::new()
        .with(
            LoadRequest::new(AssetSource::fbx("a.fbx"))
                .on_error(move |error| *seen.borrow_mut() = Some(error.clone())),
        )
        .with(AssetSource::fbx("b.fbx"));

    let mut all_load = 0;
    let mut queue_errors = Vec::new();
    let callbacks = QueueCallbacks::new()
        .on_error(|index, error: &LoadError| queue_errors.push((index, error.clone())))
        .on_all_load(|_| all_load += 1);
    let report = loader.drain_blocking(queue, callbacks);

    let expected = LoadError::failure("a.fbx", "404 Not Found");
    assert_eq!(
        report.outcome,
        DrainOutcome::Stalled {
            index: 0,
            error: expected.clone()
        }
    );
    assert!(report.results.is_empty());
    assert_eq!(all_load, 0);
    assert_eq!(queue_errors, vec![(0, expected.clone())]);
    assert_eq!(*request_error.borrow(), Some(expected));
    assert_eq!(loaders.dispatched(), vec![("fbx", "a.fbx".to_string())]);
    assert_eq!(loader.state(), DrainState::Stalled(0));
}

#[test]
fn unsupported_format_is_never_dispatched() {
    let loaders = HeadlessLoaders::new();
    let mut loader = loader(&loaders).with_policy(ErrorPolicy::Retry(3));

    let spec: LoadSpec = serde_json::from_str(r#"{ "type": "stl", "url": "part.stl" }"#).unwrap();
    let queue: LoadQueue<HeadlessModel> = std::iter::once(spec).collect();

    let mut errors = Vec::new();
    let mut all_load = false;
    let callbacks = QueueCallbacks::new()
        .on_error(|index, error: &LoadError| errors.push((index, error.clone())))
        .on_all_load(|_| all_load = true);
    let report = loader.drain_blocking(queue, callbacks);

    let expected = LoadError::UnsupportedFormat("stl".to_string());
    assert_eq!(errors, vec![(0, expected.clone())]);
    assert!(!all_load);
    assert!(loaders.dispatched().is_empty());
    assert_eq!(
        report.outcome,
        DrainOutcome::Stalled {
            index: 0,
            error: expected
        }
    );
}

#[test]
fn skip_policy_continues_past_failures() {
    let loaders = HeadlessLoaders::new();
    loaders.fail("b.json", "parse error");
    let mut loader = loader(&loaders).with_policy(ErrorPolicy::Skip);

    let queue = LoadQueue::new()
        .with(AssetSource::json("a.json"))
        .with(AssetSource::json("b.json"))
        .with(AssetSource::json("c.json"));

    let mut all_load = None;
    let callbacks = QueueCallbacks::new().on_all_load(|results: &[Asset<HeadlessModel>]| {
        all_load = Some(results.len())
    });
    let report = loader.drain_blocking(queue, callbacks);

    assert_eq!(all_load, Some(2));
    assert_eq!(
        report.outcome,
        DrainOutcome::CompletedWithSkips(vec![(1, LoadError::failure("b.json", "parse error"))])
    );
    assert!(report.is_complete());
    assert_eq!(loaders.dispatched().len(), 3);
}

#[test]
fn retry_recovers_transient_failures() {
    let loaders = HeadlessLoaders::new();
    loaders.fail_times("a.glb", "connection reset", 2);
    let mut loader = loader(&loaders).with_policy(ErrorPolicy::Retry(2));

    let queue = LoadQueue::new().with(AssetSource::glb("a.glb"));
    let report = loader.drain_blocking(queue, QueueCallbacks::new());

    assert_eq!(report.outcome, DrainOutcome::Completed);
    assert_eq!(loaders.dispatched().len(), 3);
}

#[test]
fn retry_gives_up_and_halts() {
    let loaders = HeadlessLoaders::new();
    loaders.fail("a.glb", "connection reset");
    let mut loader = loader(&loaders).with_policy(ErrorPolicy::Retry(2));

    let queue = LoadQueue::new()
        .with(AssetSource::glb("a.glb"))
        .with(AssetSource::glb("b.glb"));
    let report = loader.drain_blocking(queue, QueueCallbacks::new());

    assert!(!report.is_complete());
    assert_eq!(
        loaders.dispatched(),
        vec![("gltf", "a.glb".to_string()); 3]
    );
}

#[test]
fn cached_assets_are_not_dispatched_again() {
    let loaders = HeadlessLoaders::new();
    let mut loader = loader(&loaders);

    let queue = LoadQueue::new()
        .with(AssetSource::fbx("a.fbx"))
        .with(AssetSource::fbx("a.fbx"));
    let report = loader.drain_blocking(queue, QueueCallbacks::new());

    assert_eq!(report.results.len(), 2);
    assert_eq!(report.results[0], report.results[1]);
    assert_eq!(loaders.dispatched().len(), 1);
    assert!(loader.registry().is_cached(AssetFormat::Fbx, "a.fbx"));
}

#[test]
fn material_library_is_part_of_the_cache_key() {
    let loaders = HeadlessLoaders::new();
    let mut loader = loader(&loaders);

    let queue = LoadQueue::new()
        .with(AssetSource::obj("chair.obj", "red.mtl"))
        .with(AssetSource::obj("chair.obj", "blue.mtl"))
        .with(AssetSource::obj("chair.obj", "red.mtl"));
    let report = loader.drain_blocking(queue, QueueCallbacks::new());

    let materials: Vec<_> = report
        .results
        .iter()
        .map(|asset| model(asset).materials.as_ref().map(|m| m.url.as_str()))
        .collect();
    assert_eq!(
        materials,
        vec![Some("red.mtl"), Some("blue.mtl"), Some("red.mtl")]
    );
    assert_eq!(report.results[0], report.results[2]);
    assert_eq!(
        loaders.dispatched(),
        vec![
            ("mtl", "red.mtl".to_string()),
            ("obj", "chair.obj".to_string()),
            ("mtl", "blue.mtl".to_string()),
            ("obj", "chair.obj".to_string()),
        ]
    );
    assert_eq!(loader.registry().cached_len(), 2);
    assert!(loader
        .registry()
        .is_source_cached(&AssetSource::obj("chair.obj", "blue.mtl")));
    assert!(!loader.registry().is_source_cached(&obj("chair.obj")));
}

#[test]
fn draco_path_is_part_of_the_cache_key() {
    let loaders = HeadlessLoaders::new();
    let mut loader = loader(&loaders);

    let queue = LoadQueue::new()
        .with(AssetSource::glb("car.glb"))
        .with(AssetSource::glb("car.glb").with_draco_path("libs/draco/"))
        .with(AssetSource::glb("car.glb").with_draco_path("draco/"));
    let report = loader.drain_blocking(queue, QueueCallbacks::new());

    assert_eq!(report.results.len(), 3);
    assert_eq!(loaders.dispatched().len(), 2);
    assert_eq!(report.results[0], report.results[2]);
    assert_ne!(model(&report.results[0]).id, model(&report.results[1]).id);
}

#[test]
fn disabled_cache_dispatches_every_request() {
    let loaders = HeadlessLoaders::new();
    let mut loader = SequentialLoader::new(
        LoaderRegistry::new(loaders.clone()).with_cache_policy(CachePolicy::Disabled),
    );

    let queue = LoadQueue::new()
        .with(AssetSource::fbx("a.fbx"))
        .with(AssetSource::fbx("a.fbx"));
    let report = loader.drain_blocking(queue, QueueCallbacks::new());

    assert_ne!(model(&report.results[0]).id, model(&report.results[1]).id);
    assert_eq!(loaders.dispatched().len(), 2);
}

#[test]
fn sub_loaders_are_created_once_per_format() {
    let loaders = HeadlessLoaders::new();
    let mut loader = loader(&loaders);

    let queue = LoadQueue::new()
        .with(AssetSource::gltf("a.gltf"))
        .with(AssetSource::glb("b.glb"))
        .with(AssetSource::obj("c.obj", "c.mtl"))
        .with(AssetSource::obj("d.obj", "d.mtl"))
        .with(AssetSource::gltf("e.gltf"));
    let _ = loader.drain_blocking(queue, QueueCallbacks::new());

    assert_eq!(loaders.constructed("gltf"), 1);
    assert_eq!(loaders.constructed("draco"), 1);
    assert_eq!(loaders.constructed("obj"), 1);
    assert_eq!(loaders.constructed("mtl"), 1);
    assert_eq!(loaders.constructed("fbx"), 0);
    assert!(loader.registry().has_loader(AssetFormat::Glb));
    assert!(!loader.registry().has_loader(AssetFormat::Json));

    // Later drains reuse them.
    let _ = loader.drain_blocking(
        LoadQueue::new().with(AssetSource::gltf("f.gltf")),
        QueueCallbacks::new(),
    );
    assert_eq!(loaders.constructed("gltf"), 1);
}

#[test]
fn obj_materials_are_loaded_and_preloaded_first() {
    let loaders = HeadlessLoaders::new();
    let mut loader = loader(&loaders);

    let queue = LoadQueue::new()
        .with(AssetSource::obj("house.obj", "house.mtl"))
        .with(obj("shed.obj"));
    let report = loader.drain_blocking(queue, QueueCallbacks::new());

    assert_eq!(
        loaders.dispatched(),
        vec![
            ("mtl", "house.mtl".to_string()),
            ("obj", "house.obj".to_string()),
            ("obj", "shed.obj".to_string()),
        ]
    );
    assert_eq!(
        model(&report.results[0]).materials,
        Some(HeadlessMaterials {
            url: "house.mtl".to_string(),
            preloaded: true,
        })
    );
    assert_eq!(model(&report.results[1]).materials, None);
}

#[test]
fn failing_material_library_fails_the_request() {
    let loaders = HeadlessLoaders::new();
    loaders.fail("house.mtl", "404 Not Found");
    let mut loader = loader(&loaders);

    let queue = LoadQueue::new().with(AssetSource::obj("house.obj", "house.mtl"));
    let report = loader.drain_blocking(queue, QueueCallbacks::new());

    assert_eq!(
        report.outcome,
        DrainOutcome::Stalled {
            index: 0,
            error: LoadError::failure("house.mtl", "404 Not Found")
        }
    );
    assert_eq!(loaders.dispatched().len(), 1);
}

#[test]
fn draco_decoder_follows_the_request_path() {
    let loaders = HeadlessLoaders::new();
    let mut loader = loader(&loaders);

    let queue = LoadQueue::new()
        .with(AssetSource::gltf("a.gltf"))
        .with(AssetSource::glb("b.glb").with_draco_path("libs/draco/"))
        .with(AssetSource::glb("c.glb").with_draco_path("libs/draco/"));
    let report = loader.drain_blocking(queue, QueueCallbacks::new());

    let paths: Vec<_> = report
        .results
        .iter()
        .map(|asset| model(asset).decoder_path.clone())
        .collect();
    assert_eq!(
        paths,
        vec![
            Some(DEFAULT_DRACO_PATH.to_string()),
            Some("libs/draco/".to_string()),
            Some("libs/draco/".to_string()),
        ]
    );
    assert_eq!(loaders.decoder_paths(), vec!["draco/", "libs/draco/"]);
}

#[test]
fn progress_is_forwarded_with_the_request_index() {
    let loaders = HeadlessLoaders::new();
    let mut loader = loader(&loaders);

    let per_request = Rc::new(RefCell::new(Vec::new()));
    let seen = per_request.clone();
    let queue = LoadQueue::new()
        .with(AssetSource::fbx("a.fbx"))
        .with(
            LoadRequest::new(AssetSource::json("b.json"))
                .on_progress(move |event, index| seen.borrow_mut().push((index, event.loaded))),
        );

    let mut per_queue = Vec::new();
    let callbacks = QueueCallbacks::new()
        .on_progress(|event: &ProgressEvent, index| per_queue.push((index, event.percent())));
    let _ = loader.drain_blocking(queue, callbacks);

    assert_eq!(
        per_queue,
        vec![
            (0, Some(0.0)),
            (0, Some(100.0)),
            (1, Some(0.0)),
            (1, Some(100.0)),
        ]
    );
    assert_eq!(*per_request.borrow(), vec![(1, 0), (1, 100)]);
}

#[test]
fn empty_queue_completes_immediately() {
    let loaders = HeadlessLoaders::new();
    let mut loader = loader(&loaders);

    let mut all_load = None;
    let callbacks = QueueCallbacks::new().on_all_load(|results: &[Asset<HeadlessModel>]| {
        all_load = Some(results.len())
    });
    let report = loader.drain_blocking(LoadQueue::new(), callbacks);

    assert_eq!(all_load, Some(0));
    assert_eq!(report.outcome, DrainOutcome::Completed);
    assert_eq!(loader.state(), DrainState::Done);
}

#[test]
fn relative_urls_resolve_against_the_base_path() {
    let loaders = HeadlessLoaders::new();
    loaders.respond_json("/static/scene.json", serde_json::json!({ "models": 2 }));
    let mut loader = SequentialLoader::new(
        LoaderRegistry::new(loaders.clone()).with_base_path("/static/"),
    );

    let queue = LoadQueue::new()
        .with(AssetSource::json("scene.json"))
        .with(AssetSource::json("https://cdn.example.com/a.json"))
        .with(AssetSource::json("/b.json"));
    let report = loader.drain_blocking(queue, QueueCallbacks::new());

    assert_eq!(
        report.results[0].as_json(),
        Some(&serde_json::json!({ "models": 2 }))
    );
    assert_eq!(
        loaders.dispatched(),
        vec![
            ("json", "/static/scene.json".to_string()),
            ("json", "https://cdn.example.com/a.json".to_string()),
            ("json", "/b.json".to_string()),
        ]
    );
}

#[test]
fn manifests_deserialize_into_queues() {
    let specs: Vec<LoadSpec> = serde_json::from_str(
        r#"[
            { "type": "obj", "url": "house.obj", "mtlUrl": "house.mtl" },
            { "type": "GLB", "url": "car.glb", "dracoUrl": "libs/draco/" },
            { "type": "json", "url": "scene.json" }
        ]"#,
    )
    .unwrap();

    assert_eq!(
        AssetSource::try_from(specs[1].clone()),
        Ok(AssetSource::glb("car.glb").with_draco_path("libs/draco/"))
    );

    let loaders = HeadlessLoaders::new();
    let mut loader = loader(&loaders);
    let report = loader.drain_blocking(specs.into_iter().collect(), QueueCallbacks::new());

    assert_eq!(report.outcome, DrainOutcome::Completed);
    assert_eq!(report.results.len(), 3);
}

#[test]
fn cancelling_stops_before_the_next_dispatch() {
    let loaders = HeadlessLoaders::new();
    let mut loader = loader(&loaders);
    let cancel = loader.cancel_handle();
    let all_loaded = RefCell::new(false);

    let queue = LoadQueue::new()
        .with(AssetSource::fbx("a.fbx"))
        .with(AssetSource::fbx("b.fbx"));
    let callbacks = QueueCallbacks::new()
        .on_loaded(|_, _: &Asset<HeadlessModel>| cancel.cancel())
        .on_all_load(|_| *all_loaded.borrow_mut() = true);
    let report = loader.drain_blocking(queue, callbacks);

    assert_eq!(report.outcome, DrainOutcome::Cancelled { index: 1 });
    assert_eq!(report.results.len(), 1);
    assert_eq!(loader.state(), DrainState::Cancelled(1));
    assert_eq!(loaders.dispatched(), vec![("fbx", "a.fbx".to_string())]);
    assert!(!*all_loaded.borrow());

    let report = loader.drain_blocking(
        LoadQueue::new().with(AssetSource::fbx("b.fbx")),
        QueueCallbacks::new(),
    );
    assert_eq!(report.outcome, DrainOutcome::Completed);
    assert!(!cancel.is_cancelled());
}
