use modulus::lifecycle::ModuleFailure;
use modulus::prelude::*;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

type Journal = Arc<Mutex<Vec<String>>>;

/// Module whose Init records its name and optionally fails
struct Recorder {
    name: &'static str,
    journal: Journal,
    fail: bool,
}

impl Recorder {
    fn new(name: &'static str, journal: &Journal) -> Arc<Self> {
        Arc::new(Self {
            name,
            journal: journal.clone(),
            fail: false,
        })
    }

    fn failing(name: &'static str, journal: &Journal) -> Arc<Self> {
        Arc::new(Self {
            name,
            journal: journal.clone(),
            fail: true,
        })
    }
}

impl Module for Recorder {
    fn name(&self) -> &str {
        self.name
    }

    fn as_initializer(self: Arc<Self>) -> Option<Arc<dyn Initializer>> {
        Some(self)
    }
}

#[async_trait]
impl Initializer for Recorder {
    async fn init(&self, _app: &Application) -> anyhow::Result<()> {
        self.journal.lock().unwrap().push(self.name.to_string());
        if self.fail {
            anyhow::bail!("{} refused to init", self.name);
        }
        Ok(())
    }
}

/// Starter that either fails with a fixed message or raises a flag
struct Runner {
    name: &'static str,
    outcome: std::result::Result<(), &'static str>,
    ran: AtomicBool,
}

impl Runner {
    fn ok(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            outcome: Ok(()),
            ran: AtomicBool::new(false),
        })
    }

    fn failing(name: &'static str, message: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            outcome: Err(message),
            ran: AtomicBool::new(false),
        })
    }
}

impl Module for Runner {
    fn name(&self) -> &str {
        self.name
    }

    fn as_starter(self: Arc<Self>) -> Option<Arc<dyn Starter>> {
        Some(self)
    }
}

#[async_trait]
impl Starter for Runner {
    async fn start(&self, _app: &Application) -> anyhow::Result<()> {
        tokio::time::sleep(Duration::from_millis(10)).await;
        self.ran.store(true, Ordering::SeqCst);
        self.outcome.map_err(|message| anyhow::anyhow!(message))
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Widget {
    id: u32,
}

#[derive(Default)]
struct WidgetModule {
    starts: AtomicUsize,
}

impl Module for WidgetModule {
    fn name(&self) -> &str {
        "widgets"
    }

    fn as_service_provider(self: Arc<Self>) -> Option<Arc<dyn ServiceProvider>> {
        Some(self)
    }

    fn as_starter(self: Arc<Self>) -> Option<Arc<dyn Starter>> {
        Some(self)
    }
}

impl ServiceProvider for WidgetModule {
    fn provided_services(&self) -> Vec<Provider> {
        vec![Provider::from_fn(|| Widget { id: 7 })]
    }
}

#[async_trait]
impl Starter for WidgetModule {
    async fn start(&self, app: &Application) -> anyhow::Result<()> {
        let widget = app.resolve::<Widget>()?;
        assert_eq!(widget.id, 7);
        self.starts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Config module answering every key with its own name
struct NamedConfig {
    name: &'static str,
    lookups: AtomicUsize,
}

impl NamedConfig {
    fn new(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            lookups: AtomicUsize::new(0),
        })
    }
}

impl Config for NamedConfig {
    fn lookup(&self, _key: &str) -> Option<String> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Some(self.name.to_string())
    }
}

impl Module for NamedConfig {
    fn name(&self) -> &str {
        self.name
    }

    fn as_config(self: Arc<Self>) -> Option<Arc<dyn Config>> {
        Some(self)
    }
}

/// Module whose Start or Stop never returns on its own
struct Stuck;

impl Module for Stuck {
    fn name(&self) -> &str {
        "stuck"
    }

    fn as_starter(self: Arc<Self>) -> Option<Arc<dyn Starter>> {
        Some(self)
    }

    fn as_stopper(self: Arc<Self>) -> Option<Arc<dyn Stopper>> {
        Some(self)
    }
}

#[async_trait]
impl Starter for Stuck {
    async fn start(&self, _app: &Application) -> anyhow::Result<()> {
        std::future::pending().await
    }
}

#[async_trait]
impl Stopper for Stuck {
    async fn stop(&self, _app: &Application) -> anyhow::Result<()> {
        std::future::pending().await
    }
}

fn names(app: &Application) -> Vec<&str> {
    app.modules().iter().map(|m| m.name()).collect()
}

#[tokio::test]
async fn test_init_runs_in_order_and_stops_at_first_failure() {
    let journal = Journal::default();
    let result = Application::new(
        CancellationToken::new(),
        vec![
            Recorder::new("first", &journal),
            Recorder::failing("second", &journal),
            Recorder::new("third", &journal),
        ],
    )
    .await;

    match result.unwrap_err() {
        LifecycleError::Initialization { module, source } => {
            assert_eq!(module, "second");
            assert_eq!(source.to_string(), "second refused to init");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(*journal.lock().unwrap(), vec!["first", "second"]);
}

#[tokio::test]
async fn test_start_aggregates_failures_and_runs_everyone() {
    let mod_a = Runner::failing("ModA", "boom");
    let mod_b = Runner::ok("ModB");
    let app = Application::new(CancellationToken::new(), vec![mod_a.clone(), mod_b.clone()])
        .await
        .unwrap();

    let err = app.start().await.unwrap_err();
    let aggregate = err.aggregate().expect("start errors are aggregated");

    assert_eq!(aggregate.phase(), Phase::Start);
    assert_eq!(aggregate.modules().collect::<Vec<_>>(), vec!["ModA"]);
    assert_eq!(aggregate.failures()[0].error.to_string(), "boom");
    assert!(mod_a.ran.load(Ordering::SeqCst));
    assert!(mod_b.ran.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_start_reports_exactly_the_failing_subset() {
    let runners = vec![
        Runner::ok("m0"),
        Runner::failing("m1", "e1"),
        Runner::ok("m2"),
        Runner::failing("m3", "e3"),
        Runner::ok("m4"),
    ];
    let modules: Vec<Arc<dyn Module>> = runners
        .iter()
        .map(|r| r.clone() as Arc<dyn Module>)
        .collect();
    let app = Application::new(CancellationToken::new(), modules).await.unwrap();

    let failures = match app.start().await.unwrap_err() {
        LifecycleError::Start(aggregate) => aggregate.into_failures(),
        other => panic!("unexpected error: {other}"),
    };
    let reported: Vec<(String, String)> = failures
        .into_iter()
        .map(|ModuleFailure { module, error }| (module, error.to_string()))
        .collect();

    assert_eq!(
        reported,
        vec![
            ("m1".to_string(), "e1".to_string()),
            ("m3".to_string(), "e3".to_string()),
        ]
    );
    assert!(runners.iter().all(|r| r.ran.load(Ordering::SeqCst)));
}

#[tokio::test]
async fn test_provided_service_resolves_and_starter_runs_once() {
    let widgets = Arc::new(WidgetModule::default());
    let app = Application::new(CancellationToken::new(), vec![widgets.clone()])
        .await
        .unwrap();

    assert_eq!(app.resolve::<Widget>().unwrap(), Widget { id: 7 });

    app.start().await.unwrap();
    assert_eq!(widgets.starts.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_duplicate_service_across_modules_fails_construction() {
    let result = Application::new(
        CancellationToken::new(),
        vec![Arc::new(WidgetModule::default()), Arc::new(WidgetModule::default())],
    )
    .await;

    match result.unwrap_err() {
        LifecycleError::ProvideServices { module, source } => {
            assert_eq!(module, "widgets");
            assert!(matches!(source, ModulusError::DuplicateRegistration { .. }));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_registry_is_sealed_after_construction() {
    let app = Application::new(CancellationToken::new(), vec![]).await.unwrap();

    let err = app
        .container()
        .provide(Provider::from_fn(|| Widget { id: 1 }))
        .unwrap_err();
    assert!(matches!(err, ModulusError::RegistrySealed { .. }));
}

#[tokio::test]
async fn test_first_config_module_wins() {
    let first = NamedConfig::new("first");
    let second = NamedConfig::new("second");
    let app = Application::new(CancellationToken::new(), vec![first.clone(), second.clone()])
        .await
        .unwrap();

    assert_eq!(app.config().get_string("ANY").unwrap(), "first");
    assert_eq!(app.config().get_string("OTHER").unwrap(), "first");
    assert_eq!(first.lookups.load(Ordering::SeqCst), 2);
    assert_eq!(second.lookups.load(Ordering::SeqCst), 0);

    // Only the default logger is added; the config module keeps its place.
    assert_eq!(names(&app), vec!["TracingLogger", "first", "second"]);
}

#[tokio::test]
async fn test_default_config_can_be_forced() {
    let supplied = NamedConfig::new("supplied");
    let app = Application::builder()
        .module(supplied.clone())
        .default_config()
        .build()
        .await
        .unwrap();

    assert!(app.config().get_string("MODULUS_SURELY_UNSET_KEY").is_err());
    assert_eq!(supplied.lookups.load(Ordering::SeqCst), 0);
    assert_eq!(names(&app)[0], "EnvConfig");
}

#[tokio::test]
async fn test_config_and_logger_without_modules() {
    let app = Application::new(CancellationToken::new(), vec![]).await.unwrap();

    assert_eq!(names(&app), vec!["EnvConfig", "TracingLogger"]);
    assert!(matches!(
        app.config().get_string("MODULUS_SURELY_UNSET_KEY"),
        Err(modulus::config::ConfigError::KeyMissing { .. })
    ));
    app.logger().info(format_args!("logger is usable"));
    assert!(app.resolve::<Arc<dyn Config>>().is_ok());
    assert!(app.resolve::<Arc<dyn Logger>>().is_ok());
}

#[tokio::test]
async fn test_initializer_reads_supplied_config() {
    struct Greeting {
        seen: Mutex<Option<String>>,
    }

    impl Module for Greeting {
        fn as_initializer(self: Arc<Self>) -> Option<Arc<dyn Initializer>> {
            Some(self)
        }
    }

    #[async_trait]
    impl Initializer for Greeting {
        async fn init(&self, app: &Application) -> anyhow::Result<()> {
            *self.seen.lock().unwrap() = Some(app.config().get_string("GREETING")?);
            Ok(())
        }
    }

    let greeting = Arc::new(Greeting {
        seen: Mutex::new(None),
    });
    Application::new(
        CancellationToken::new(),
        vec![
            Arc::new(EnvConfig::from_map([("GREETING", "hello")])),
            greeting.clone(),
        ],
    )
    .await
    .unwrap();

    assert_eq!(greeting.seen.lock().unwrap().as_deref(), Some("hello"));
}

#[tokio::test]
async fn test_cancellation_releases_hanging_start() {
    let cancel = CancellationToken::new();
    let app = Application::builder()
        .cancellation(cancel.clone())
        .modules([Runner::ok("quick") as Arc<dyn Module>, Arc::new(Stuck)])
        .shutdown_grace(Duration::from_millis(50))
        .build()
        .await
        .unwrap();

    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel.cancel();
    });

    let err = tokio::time::timeout(Duration::from_secs(5), app.start())
        .await
        .expect("start must return once the root token is cancelled")
        .unwrap_err();
    canceller.await.unwrap();

    match err {
        LifecycleError::Cancelled {
            phase,
            pending,
            failures,
        } => {
            assert_eq!(phase, Phase::Start);
            assert_eq!(pending, vec!["stuck"]);
            assert!(failures.is_empty());
        }
        other => panic!("unexpected error: {other}"),
    }
}

/// Starter that watches the root token and needs a moment to drain
#[derive(Default)]
struct Draining {
    drained: AtomicBool,
}

impl Module for Draining {
    fn name(&self) -> &str {
        "draining"
    }

    fn as_starter(self: Arc<Self>) -> Option<Arc<dyn Starter>> {
        Some(self)
    }
}

#[async_trait]
impl Starter for Draining {
    async fn start(&self, app: &Application) -> anyhow::Result<()> {
        app.cancellation_token().cancelled().await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        self.drained.store(true, Ordering::SeqCst);
        Ok(())
    }
}

#[tokio::test]
async fn test_cancelled_starter_finishes_draining() {
    let draining = Arc::new(Draining::default());
    let app = Application::new(CancellationToken::new(), vec![draining.clone()])
        .await
        .unwrap();

    let cancel = app.cancellation_token().clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        cancel.cancel();
    });

    let result = tokio::time::timeout(Duration::from_secs(5), app.start())
        .await
        .unwrap();
    assert!(result.is_ok(), "unexpected start result: {result:?}");
    assert!(draining.drained.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_slow_drain_is_left_running_after_grace() {
    let draining = Arc::new(Draining::default());
    let app = Application::builder()
        .module(draining.clone())
        .shutdown_grace(Duration::from_millis(5))
        .build()
        .await
        .unwrap();

    app.cancellation_token().cancel();
    match app.start().await.unwrap_err() {
        LifecycleError::Cancelled { pending, .. } => assert_eq!(pending, vec!["draining"]),
        other => panic!("unexpected error: {other}"),
    }

    // The task was detached, not aborted, so its cleanup still completes.
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(draining.drained.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_panicking_starter_is_reported() {
    struct Panicky;

    impl Module for Panicky {
        fn name(&self) -> &str {
            "panicky"
        }

        fn as_starter(self: Arc<Self>) -> Option<Arc<dyn Starter>> {
            Some(self)
        }
    }

    #[async_trait]
    impl Starter for Panicky {
        async fn start(&self, _app: &Application) -> anyhow::Result<()> {
            panic!("listener exploded");
        }
    }

    let steady = Runner::ok("steady");
    let app = Application::new(CancellationToken::new(), vec![Arc::new(Panicky), steady.clone()])
        .await
        .unwrap();

    let err = app.start().await.unwrap_err();
    let aggregate = err.aggregate().unwrap();
    assert_eq!(aggregate.modules().collect::<Vec<_>>(), vec!["panicky"]);
    assert!(aggregate.failures()[0].error.to_string().starts_with("task failed"));
    assert!(steady.ran.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_stop_before_start_is_rejected() {
    let app = Application::new(CancellationToken::new(), vec![]).await.unwrap();
    assert!(matches!(app.stop().await, Err(LifecycleError::NotStarted)));
}

#[tokio::test]
async fn test_stop_after_start_calls_every_stopper() {
    let a = Closer::new("a", false);
    let b = Closer::new("b", false);
    let app = Application::new(CancellationToken::new(), vec![a.clone(), b.clone()])
        .await
        .unwrap();

    app.start().await.unwrap();
    app.stop().await.unwrap();
    assert!(a.ran.load(Ordering::SeqCst));
    assert!(b.ran.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_stop_timeout_bounds_hanging_stopper() {
    let app = Application::builder()
        .module(Arc::new(Stuck))
        .stop_timeout(Duration::from_millis(50))
        .shutdown_grace(Duration::from_millis(20))
        .build()
        .await
        .unwrap();

    // Starting would hang, so cancel right away; Stop is still allowed.
    app.cancellation_token().cancel();
    assert!(matches!(
        app.start().await,
        Err(LifecycleError::Cancelled { .. })
    ));

    match app.stop().await.unwrap_err() {
        LifecycleError::Timeout { phase, message } => {
            assert_eq!(phase, Phase::Stop);
            assert!(message.contains("stuck"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_init_timeout() {
    struct Slow;

    impl Module for Slow {
        fn as_initializer(self: Arc<Self>) -> Option<Arc<dyn Initializer>> {
            Some(self)
        }
    }

    #[async_trait]
    impl Initializer for Slow {
        async fn init(&self, _app: &Application) -> anyhow::Result<()> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(())
        }
    }

    let result = Application::builder()
        .module(Arc::new(Slow))
        .init_timeout(Duration::from_millis(20))
        .build()
        .await;

    assert!(matches!(
        result.unwrap_err(),
        LifecycleError::Timeout {
            phase: Phase::Init,
            ..
        }
    ));
}

/// Logger module recording every message it receives
struct NamedLogger {
    name: &'static str,
    records: Mutex<Vec<String>>,
}

impl NamedLogger {
    fn new(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            records: Mutex::new(Vec::new()),
        })
    }

    fn received(&self, message: &str) -> bool {
        self.records.lock().unwrap().iter().any(|m| m == message)
    }
}

impl Logger for NamedLogger {
    fn log(&self, _level: LogLevel, message: std::fmt::Arguments<'_>) {
        self.records.lock().unwrap().push(message.to_string());
    }
}

impl Module for NamedLogger {
    fn name(&self) -> &str {
        self.name
    }

    fn as_logger(self: Arc<Self>) -> Option<Arc<dyn Logger>> {
        Some(self)
    }
}

#[tokio::test]
async fn test_first_logger_module_wins() {
    let first = NamedLogger::new("first");
    let second = NamedLogger::new("second");
    let app = Application::new(CancellationToken::new(), vec![first.clone(), second.clone()])
        .await
        .unwrap();

    app.logger().info(format_args!("hello"));

    assert!(first.received("hello"));
    assert!(second.records.lock().unwrap().is_empty());
    assert_eq!(names(&app), vec!["EnvConfig", "first", "second"]);
}

#[tokio::test]
async fn test_default_logger_can_be_forced() {
    let supplied = NamedLogger::new("supplied");
    let app = Application::builder()
        .module(supplied.clone())
        .default_logger()
        .build()
        .await
        .unwrap();

    app.logger().info(format_args!("hello"));

    assert!(supplied.records.lock().unwrap().is_empty());
    assert_eq!(names(&app), vec!["EnvConfig", "TracingLogger", "supplied"]);
}

/// Stopper that records it ran and optionally fails
struct Closer {
    name: &'static str,
    fail: bool,
    ran: AtomicBool,
}

impl Closer {
    fn new(name: &'static str, fail: bool) -> Arc<Self> {
        Arc::new(Self {
            name,
            fail,
            ran: AtomicBool::new(false),
        })
    }
}

impl Module for Closer {
    fn name(&self) -> &str {
        self.name
    }

    fn as_stopper(self: Arc<Self>) -> Option<Arc<dyn Stopper>> {
        Some(self)
    }
}

#[async_trait]
impl Stopper for Closer {
    async fn stop(&self, _app: &Application) -> anyhow::Result<()> {
        tokio::time::sleep(Duration::from_millis(10)).await;
        self.ran.store(true, Ordering::SeqCst);
        if self.fail {
            anyhow::bail!("{} did not close", self.name);
        }
        Ok(())
    }
}

#[tokio::test]
async fn test_stop_aggregates_every_failure() {
    let closers = vec![
        Closer::new("db", true),
        Closer::new("cache", false),
        Closer::new("queue", true),
    ];
    let modules: Vec<Arc<dyn Module>> = closers
        .iter()
        .map(|c| c.clone() as Arc<dyn Module>)
        .collect();
    let app = Application::new(CancellationToken::new(), modules).await.unwrap();

    app.start().await.unwrap();
    let aggregate = match app.stop().await.unwrap_err() {
        LifecycleError::Stop(aggregate) => aggregate,
        other => panic!("unexpected error: {other}"),
    };

    assert_eq!(aggregate.phase(), Phase::Stop);
    assert_eq!(aggregate.modules().collect::<Vec<_>>(), vec!["db", "queue"]);
    assert_eq!(aggregate.failures()[1].error.to_string(), "queue did not close");
    assert!(closers.iter().all(|c| c.ran.load(Ordering::SeqCst)));
}
