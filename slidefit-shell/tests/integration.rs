//! End-to-end tests for the presentation shell.
//!
//! These run real tokio tasks for estimates and font events, with a
//! scripted oracle standing in for the host layout.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use futures_util::future::BoxFuture;
use slidefit_core::{
    Begin, EstimateError, Estimator, FitConfig, FitRequest, FixedEstimator, FontsReady,
    MeasureQuery, MeasurementOracle, ResultCache,
};
use slidefit_shell::{FitShell, FixedWidth, YieldClock};
use tokio::sync::{broadcast, watch};
use tokio::time::{timeout, Duration};

/// Overflows above a fit point that tests can move; counts calls and
/// records the sizes and box widths it was asked about.
#[derive(Clone, Default)]
struct Layout {
    fit_bits: Arc<AtomicU32>,
    calls: Arc<AtomicUsize>,
    sizes: Arc<Mutex<Vec<f32>>>,
    widths: Arc<Mutex<Vec<f32>>>,
}

impl Layout {
    fn fitting_up_to(size: f32) -> Self {
        let layout = Self::default();
        layout.set_fit(size);
        layout
    }

    fn set_fit(&self, size: f32) {
        self.fit_bits.store(size.to_bits(), Ordering::SeqCst);
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl MeasurementOracle for Layout {
    fn overflows(&mut self, query: &MeasureQuery<'_>) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.sizes.lock().unwrap().push(query.font_size);
        self.widths.lock().unwrap().push(query.box_width);
        query.font_size > f32::from_bits(self.fit_bits.load(Ordering::SeqCst))
    }
}

/// Never resolves; flags when its future is dropped.
struct Hanging {
    dropped: Arc<AtomicBool>,
}

struct DropFlag(Arc<AtomicBool>);

impl Drop for DropFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

impl Estimator for Hanging {
    fn estimate(&self, _: &FitRequest, _: f32) -> BoxFuture<'static, Result<f32, EstimateError>> {
        let flag = DropFlag(Arc::clone(&self.dropped));
        Box::pin(async move {
            let _flag = flag;
            futures_util::future::pending::<()>().await;
            Ok(0.0)
        })
    }
}

struct Failing;

impl Estimator for Failing {
    fn estimate(&self, _: &FitRequest, _: f32) -> BoxFuture<'static, Result<f32, EstimateError>> {
        Box::pin(async { Err(EstimateError::Failed("shaping backend down".into())) })
    }
}

/// Only knows an estimate for the "Hello World" title.
struct HelloOnly;

impl Estimator for HelloOnly {
    fn estimate(&self, request: &FitRequest, _: f32) -> BoxFuture<'static, Result<f32, EstimateError>> {
        let result = if request.text == "Hello World" {
            Ok(12.0)
        } else {
            Err(EstimateError::Unavailable("unknown title".into()))
        };
        Box::pin(async move { result })
    }
}

fn hello() -> FitRequest {
    FitRequest::new("Hello World", 8.0, 100.0)
        .with_line_height(1.2)
        .with_max_lines(1)
}

fn shell(layout: &Layout, cache: &ResultCache) -> FitShell {
    FitShell::new(FitConfig::for_testing(), cache.clone())
        .with_oracle(layout.clone())
        .with_container(FixedWidth(300.0))
}

#[tokio::test]
async fn test_hello_world_settles_at_forty() {
    let layout = Layout::fitting_up_to(40.0);
    let cache = ResultCache::new(16);
    let mut shell = shell(&layout, &cache);

    shell.start(hello()).unwrap();
    let size = shell.settle(&mut YieldClock).await.unwrap();

    assert_eq!(size, 40.0);
    assert!(!shell.is_converging());
    assert_eq!(shell.opacity(), 1.0);
    assert_eq!(cache.get(&hello().cache_key()), Some(40.0));
    assert!(layout.calls() <= 13);
}

#[tokio::test]
async fn test_estimate_seeds_convergence() {
    let layout = Layout::fitting_up_to(35.0);
    let mut shell = shell(&layout, &ResultCache::new(16)).with_estimator(Arc::new(FixedEstimator(50.0)));

    let Begin::Converging(_) = shell.start(hello()).unwrap() else {
        panic!("expected a fresh session");
    };
    // Let the estimate task deliver before the first step.
    tokio::task::yield_now().await;
    tokio::task::yield_now().await;

    // The first frame measures the estimate (50px) inside [8, 52].
    shell.tick();
    assert_eq!(layout.sizes.lock().unwrap().first(), Some(&50.0));
    assert_eq!(shell.controller().session().unwrap().range.max, 49.0);

    let size = shell.settle(&mut YieldClock).await.unwrap();
    assert_eq!(size, 35.0);
    assert!(layout.calls() <= 13, "{} oracle calls", layout.calls());
}

#[tokio::test]
async fn test_failed_estimate_falls_back_to_full_range() {
    let layout = Layout::fitting_up_to(40.0);
    let mut shell = shell(&layout, &ResultCache::new(16)).with_estimator(Arc::new(Failing));
    shell.start(hello()).unwrap();
    tokio::task::yield_now().await;
    assert_eq!(shell.settle(&mut YieldClock).await.unwrap(), 40.0);
}

#[tokio::test]
async fn test_hanging_estimate_never_blocks_settling() {
    let dropped = Arc::new(AtomicBool::new(false));
    let layout = Layout::fitting_up_to(40.0);
    let mut shell = shell(&layout, &ResultCache::new(16)).with_estimator(Arc::new(Hanging {
        dropped: Arc::clone(&dropped),
    }));

    shell.start(hello()).unwrap();
    let size = timeout(Duration::from_secs(2), shell.settle(&mut YieldClock))
        .await
        .expect("settle should not wait on the estimator")
        .unwrap();
    assert_eq!(size, 40.0);

    // Settling aborts the task that was still waiting.
    timeout(Duration::from_secs(2), async {
        while !dropped.load(Ordering::SeqCst) {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("estimate task should be aborted");
}

#[tokio::test]
async fn test_unmount_aborts_estimator() {
    let dropped = Arc::new(AtomicBool::new(false));
    let layout = Layout::fitting_up_to(40.0);
    let mut shell = shell(&layout, &ResultCache::new(16)).with_estimator(Arc::new(Hanging {
        dropped: Arc::clone(&dropped),
    }));

    shell.start(hello()).unwrap();
    tokio::task::yield_now().await;
    shell.unmount();

    timeout(Duration::from_secs(2), async {
        while !dropped.load(Ordering::SeqCst) {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("unmount should abort the estimate task");
    assert_eq!(shell.state().font_size, None);
    assert_eq!(layout.calls(), 0);
}

#[tokio::test]
async fn test_late_estimate_for_replaced_request_is_ignored() {
    let layout = Layout::fitting_up_to(40.0);
    let mut shell = shell(&layout, &ResultCache::new(16)).with_estimator(Arc::new(HelloOnly));

    shell.start(hello()).unwrap();
    // The estimate (12px) for "Hello World" is delivered but not drained.
    tokio::task::yield_now().await;
    shell.start(FitRequest::new("Replaced title", 8.0, 100.0)).unwrap();

    // Had the stale estimate applied, the range would top out at 14px.
    let size = shell.settle(&mut YieldClock).await.unwrap();
    assert_eq!(size, 40.0);
    assert_eq!(shell.controller().request().unwrap().text, "Replaced title");
}

#[tokio::test]
async fn test_shared_cache_skips_measurement() {
    let cache = ResultCache::new(16);
    let first_layout = Layout::fitting_up_to(40.0);
    let mut first = shell(&first_layout, &cache);
    first.start(hello()).unwrap();
    first.settle(&mut YieldClock).await.unwrap();

    let second_layout = Layout::fitting_up_to(40.0);
    let mut second = shell(&second_layout, &cache);
    assert_eq!(second.start(hello()).unwrap(), Begin::Cached(40.0));
    assert_eq!(second.settle(&mut YieldClock).await.unwrap(), 40.0);
    assert_eq!(second_layout.calls(), 0);
    assert_eq!(second.state().opacity, 1.0);
}

#[tokio::test]
async fn test_fonts_ready_refits_matching_shell() {
    let (fonts_tx, _) = broadcast::channel(4);
    let layout = Layout::fitting_up_to(40.0);
    let cache = ResultCache::new(16);
    let request = hello().with_family("Inter, sans-serif");

    let mut shell = shell(&layout, &cache).with_font_events(fonts_tx.subscribe());
    shell.start(request.clone()).unwrap();
    assert_eq!(shell.settle(&mut YieldClock).await.unwrap(), 40.0);

    // Inter has loaded and is narrower than the fallback was.
    layout.set_fit(36.0);
    fonts_tx.send(FontsReady::new(["Inter"])).unwrap();
    shell.tick();
    assert!(shell.is_converging());
    assert_eq!(cache.get(&request.cache_key()), None);
    // The refit restarts from the top of the full range.
    assert_eq!(layout.sizes.lock().unwrap().last(), Some(&100.0));

    assert_eq!(shell.settle(&mut YieldClock).await.unwrap(), 36.0);
    assert_eq!(cache.get(&request.cache_key()), Some(36.0));
}

#[tokio::test]
async fn test_fonts_ready_for_other_family_is_ignored() {
    let (fonts_tx, _) = broadcast::channel(4);
    let layout = Layout::fitting_up_to(40.0);
    let mut shell = shell(&layout, &ResultCache::new(16)).with_font_events(fonts_tx.subscribe());
    shell.start(hello().with_family("Inter")).unwrap();
    shell.settle(&mut YieldClock).await.unwrap();
    let calls = layout.calls();

    fonts_tx.send(FontsReady::new(["Lato"])).unwrap();
    shell.tick();
    assert!(!shell.is_converging());
    assert_eq!(layout.calls(), calls);
}

#[tokio::test]
async fn test_container_width_follows_resizes() {
    let (width_tx, width_rx) = watch::channel::<Option<f32>>(None);
    let layout = Layout::fitting_up_to(40.0);
    let mut shell = FitShell::new(FitConfig::for_testing(), ResultCache::new(16))
        .with_oracle(layout.clone())
        .with_container(width_rx);

    shell.start(hello()).unwrap();
    shell.tick();
    width_tx.send(Some(640.0)).unwrap();
    // Same identity at a new width keeps the session.
    assert_eq!(shell.start(hello()).unwrap(), Begin::Unchanged);
    shell.tick();

    let widths = layout.widths.lock().unwrap().clone();
    assert_eq!(widths, vec![400.0, 640.0]);
}

#[tokio::test]
async fn test_request_width_used_until_container_measures() {
    let (width_tx, width_rx) = watch::channel::<Option<f32>>(None);
    let layout = Layout::fitting_up_to(40.0);
    let mut shell = FitShell::new(FitConfig::for_testing(), ResultCache::new(16))
        .with_oracle(layout.clone())
        .with_container(width_rx);

    shell.start(hello().with_container_width(300.0)).unwrap();
    shell.tick();
    width_tx.send(Some(512.0)).unwrap();
    shell.tick();

    let widths = layout.widths.lock().unwrap().clone();
    assert_eq!(widths, vec![300.0, 512.0]);
}

#[tokio::test]
async fn test_state_published_on_watch() {
    let layout = Layout::fitting_up_to(40.0);
    let mut shell = shell(&layout, &ResultCache::new(16));
    let mut states = shell.subscribe();

    shell.start(hello()).unwrap();
    assert!(states.has_changed().unwrap());
    let converging = *states.borrow_and_update();
    assert!(converging.is_converging);
    assert!(converging.opacity < 0.1);

    shell.settle(&mut YieldClock).await.unwrap();
    let settled = *states.borrow_and_update();
    assert_eq!(settled.font_size, Some(40.0));
    assert!(!settled.is_converging);
    assert_eq!(settled.opacity, 1.0);
}

#[tokio::test]
async fn test_shell_runs_in_spawned_task() {
    let layout = Layout::fitting_up_to(24.0);
    let mut shell = shell(&layout, &ResultCache::new(16));
    let handle = tokio::spawn(async move {
        shell.start(hello()).unwrap();
        shell.settle(&mut YieldClock).await
    });
    let size = timeout(Duration::from_secs(2), handle).await.unwrap().unwrap().unwrap();
    assert_eq!(size, 24.0);
}
