mod common;

use common::{PageModule, ms, page};
use phragon::{
    LoadView, LoadableOptions, LoadableRegistry, Phase,
    testing::{CountingImporter, StateRecorder},
};
use std::sync::Arc;
use tokio::time::sleep;

#[tokio::test(start_paused = true)]
async fn test_two_consumers_share_one_import() {
    let registry = LoadableRegistry::<PageModule>::new();
    let importer = CountingImporter::new(page("dashboard")).with_delay(ms(200));

    let first = registry.component("dashboard", importer.clone(), LoadableOptions::new());
    let second = registry.component("dashboard", importer.clone(), LoadableOptions::new());

    let a = first.observe();
    let b = second.observe();
    let _sa = a.subscribe(|_| {});
    let _sb = b.subscribe(|_| {});
    assert_eq!(first.entry().subscriber_count(), 2);

    sleep(ms(300)).await;
    assert_eq!(importer.calls(), 1);
    assert_eq!(a.phase(), Phase::Done);
    assert_eq!(b.phase(), Phase::Done);

    let (Some(left), Some(right)) = (a.state().loaded, b.state().loaded) else {
        panic!("both consumers should have the module");
    };
    assert!(Arc::ptr_eq(&left, &right));
    assert_eq!(left.title, "dashboard");
}

#[tokio::test(start_paused = true)]
async fn test_timeout_survives_late_success() {
    let registry = LoadableRegistry::<PageModule>::new();
    let report = registry.component(
        "report",
        CountingImporter::new(page("report")).with_delay(ms(500)),
        LoadableOptions::new().timeout(ms(100)),
    );
    let observer = report.observe();
    let recorder = StateRecorder::new();
    let _sub = observer.subscribe(recorder.callback());

    sleep(ms(120)).await;
    assert_eq!(observer.phase(), Phase::TimedOut);
    assert!(observer.state().error.is_some_and(|e| e.is_timeout()));
    assert!(report.entry().is_loading());

    sleep(ms(400)).await;
    let state = observer.state();
    assert!(report.entry().is_done());
    assert!(state.loaded.is_some());
    assert!(state.past_delay);
    assert!(state.error.is_some_and(|e| e.is_timeout()));
    assert_eq!(
        recorder.phases(),
        vec![Phase::Loading, Phase::TimedOut, Phase::TimedOut, Phase::TimedOut]
    );
    assert!(matches!(
        observer.view(),
        Ok(LoadView::Failed {
            timed_out: true,
            ..
        })
    ));

    observer.retry();
    assert_eq!(observer.phase(), Phase::Done);
}

#[tokio::test(start_paused = true)]
async fn test_error_is_shared_until_reset() {
    let registry = LoadableRegistry::<PageModule>::new();
    let importer = CountingImporter::new(page("settings"))
        .with_delay(ms(10))
        .fail_first(1);
    let settings = registry.component("settings", importer.clone(), LoadableOptions::new());

    let a = settings.observe();
    let _sa = a.subscribe(|_| {});
    sleep(ms(20)).await;
    assert_eq!(a.phase(), Phase::Error);

    let b = settings.observe();
    let _sb = b.subscribe(|_| {});
    sleep(ms(1)).await;
    assert_eq!(b.phase(), Phase::Error);
    assert_eq!(importer.calls(), 1);

    b.retry();
    sleep(ms(20)).await;
    assert_eq!(b.phase(), Phase::Done);
    assert_eq!(a.phase(), Phase::Error);
    assert_eq!(importer.calls(), 2);

    a.retry();
    assert_eq!(a.phase(), Phase::Done);
    assert_eq!(importer.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_remount_starts_a_new_attempt() {
    let registry = LoadableRegistry::<PageModule>::new();
    let profile = registry.component(
        "profile",
        CountingImporter::new(page("profile")).with_delay(ms(100)),
        LoadableOptions::new(),
    );
    let observer = profile.observe();

    let sub = observer.subscribe(|_| {});
    let first = observer.state().id;
    sleep(ms(10)).await;
    drop(sub);
    assert!(!observer.is_mounted());

    sleep(ms(200)).await;
    assert_eq!(observer.phase(), Phase::Loading);

    let _sub = observer.subscribe(|_| {});
    assert!(observer.state().id > first);
    assert_eq!(observer.phase(), Phase::Done);
}

#[tokio::test(start_paused = true)]
async fn test_preload_all_settles_every_entry() {
    let registry = LoadableRegistry::<PageModule>::new();
    registry.register("a", CountingImporter::new(page("a")).with_delay(ms(30)));
    registry.register("b", CountingImporter::new(page("b")).failing("offline"));

    let results = registry.preload_all().await;
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].1.as_ref().unwrap().title, "a");
    assert!(results[1].1.is_err());
    assert_eq!(registry.names(), vec!["a", "b"]);
}
