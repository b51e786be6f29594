use async_trait::async_trait;
use futures::StreamExt;
use livebundle::{
    DirBundle, FetchOutcome, LiveBundle, LiveBundleConfig, LiveBundleError, Transport,
    UpdateEvent, UpdateOutcome, Url,
};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

struct StaticTransport {
    body: &'static [u8],
    calls: AtomicUsize,
}

#[async_trait]
impl Transport for StaticTransport {
    async fn fetch(
        &self,
        _url: &Url,
        _since: Option<SystemTime>,
        dest: &Path,
    ) -> Result<FetchOutcome, LiveBundleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        async_std::fs::write(dest, self.body).await?;
        Ok(FetchOutcome::Downloaded {
            bytes: self.body.len() as u64,
        })
    }
}

fn transport(body: &'static [u8]) -> Arc<StaticTransport> {
    Arc::new(StaticTransport {
        body,
        calls: AtomicUsize::new(0),
    })
}

fn app_bundle(root: &Path) -> DirBundle {
    let resources = root.join("Example.app/Contents/Resources");
    fs::create_dir_all(&resources).unwrap();
    fs::write(resources.join("example.plist"), b"bundled").unwrap();
    DirBundle::new("com.example.app", resources)
}

fn config(root: &Path, url: Option<&str>) -> LiveBundleConfig {
    LiveBundleConfig {
        url: url.map(String::from),
        cache_root: Some(root.join("Application Support/LiveBundles")),
        ..Default::default()
    }
}

#[async_std::test]
async fn logo_scenario_end_to_end() {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = tempfile::tempdir().unwrap();
    let fetcher = transport(b"B");
    let bundle = LiveBundle::builder(app_bundle(dir.path()))
        .config(config(dir.path(), Some("https://cdn.example.com/assets")))
        .transport(fetcher.clone())
        .build()
        .unwrap();

    let events = Arc::new(Mutex::new(Vec::<UpdateEvent>::new()));
    let sink = events.clone();
    bundle.subscribe(move |e| sink.lock().unwrap().push(e.clone()));

    let first = bundle.resolve_tracked("logo", "png");
    assert!(matches!(first.path, Err(LiveBundleError::ResourceUnavailable(_))));
    let live = bundle.live_path_for_resource("logo", "png");
    assert_eq!(
        first.update.unwrap().outcome().await,
        UpdateOutcome::Updated(live.clone())
    );

    let path = bundle.resolve("logo", "png").unwrap();
    assert_eq!(path, live);
    assert_eq!(fs::read(&path).unwrap(), b"B");

    let events = events.lock().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].resource.file_name(), "logo.png");
    assert_eq!(events[0].live_path, live);
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn settings_file_in_bundle_configures_paths() {
    let dir = tempfile::tempdir().unwrap();
    let main = app_bundle(dir.path());
    let cache = dir.path().join("cache");
    fs::write(
        main.resources_root().join("livebundle.toml"),
        format!(
            "url = \"https://example.com/livebundle\"\ncache_root = {:?}\n",
            cache.to_string_lossy()
        ),
    )
    .unwrap();

    let bundle = LiveBundle::builder(main)
        .config(LiveBundleConfig::load_file(&dir.path().join("Example.app/Contents/Resources")).unwrap())
        .transport(transport(b"unused"))
        .build()
        .unwrap();

    assert_eq!(bundle.live_bundle_path(), cache.join("com.example.app"));
    assert!(bundle.live_bundle_path().is_dir());
    assert_eq!(
        bundle.remote_url_for_resource("example", "plist").unwrap().as_str(),
        "https://example.com/livebundle/example.plist"
    );
    assert_eq!(
        bundle.temp_path_for_resource("example", "plist"),
        cache.join("com.example.app/example.plist.tmp")
    );

    let candidates = bundle.candidate_paths("example", "plist");
    assert_eq!(
        candidates.bundled,
        Some(dir.path().join("Example.app/Contents/Resources/example.plist"))
    );
    assert_eq!(candidates.live, cache.join("com.example.app/example.plist"));
}

#[async_std::test]
async fn invalid_url_disables_updates_but_not_resolution() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = transport(b"never");
    let bundle = LiveBundle::builder(app_bundle(dir.path()))
        .config(config(dir.path(), Some("not a url")))
        .transport(fetcher.clone())
        .build()
        .unwrap();

    assert!(matches!(
        bundle.remote_url_for_resource("example", "plist"),
        Err(LiveBundleError::InvalidConfiguration(_))
    ));

    let resolution = bundle.resolve_tracked("example", "plist");
    assert!(resolution.path.unwrap().ends_with("Resources/example.plist"));
    assert!(matches!(
        resolution.update.unwrap().outcome().await,
        UpdateOutcome::Skipped(_)
    ));
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn framework_resources_resolve_through_the_bundle_set() {
    let dir = tempfile::tempdir().unwrap();
    let kit_root = dir.path().join("Example.app/Contents/Frameworks/Kit.framework/Resources");
    fs::create_dir_all(&kit_root).unwrap();
    fs::write(kit_root.join("theme.json"), b"{}").unwrap();

    let bundle = LiveBundle::builder(app_bundle(dir.path()))
        .framework(DirBundle::new("com.example.kit", &kit_root))
        .config(config(dir.path(), None))
        .transport(transport(b"unused"))
        .build()
        .unwrap();

    assert_eq!(
        bundle.framework_with_resource("theme", "json").map(|b| b.resources_root()),
        Some(kit_root.as_path())
    );
    assert!(bundle.framework_with_resource("example", "plist").is_none());
    assert!(bundle.bundle_with_resource("example", "plist").is_some());
    assert_eq!(bundle.resolve("theme", "json").unwrap(), kit_root.join("theme.json"));
}

#[async_std::test]
async fn channel_subscribers_see_updates() {
    let dir = tempfile::tempdir().unwrap();
    let bundle = LiveBundle::builder(app_bundle(dir.path()))
        .config(config(dir.path(), Some("https://cdn.example.com/assets")))
        .transport(transport(b"fresh"))
        .build()
        .unwrap();

    let mut updates = bundle.subscribe_channel();
    let update = bundle.resolve_tracked("example", "plist").update.unwrap();
    update.outcome().await;

    let event = updates.next().await.unwrap();
    assert_eq!(event.name(), livebundle::RESOURCE_UPDATED);
    assert_eq!(event.live_path, bundle.live_path_for_resource("example", "plist"));
    assert_eq!(
        bundle.resolve("example", "plist").unwrap(),
        bundle.live_path_for_resource("example", "plist")
    );
}
