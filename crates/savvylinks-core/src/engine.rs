//! Engine facade
//!
//! `LinksEngine` owns the credential store, cache, refresher and action
//! dispatcher and exposes the operations a host needs: start the scheduler,
//! query, build context menus, run actions, reload, and shut down.
//!
//! ## Usage
//!
//! ```ignore
//! let config = Config::load()?;
//! let mut engine = LinksEngine::new(&config, host)?;
//! engine.start(); // spawns the scheduler and loads the token
//!
//! for item in engine.query("intro") {
//!     println!("{} - {}", item.title, item.record.link);
//! }
//! ```

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::{mpsc, watch};

use crate::actions::{context_menu, ActionDispatcher, ActionItem, Host, LinkAction};
use crate::api::LinksClient;
use crate::cache::{LinkCache, Snapshot};
use crate::config::Config;
use crate::credential::{Credential, CredentialStore};
use crate::models::LinkRecord;
use crate::query::{query_items, FuzzyMatcher, ResultItem, SkimScorer};
use crate::refresh::{spawn_scheduler, RefreshOutcome, Refresher, SchedulerEvent, SchedulerHandle};

/// Cached SavvyCal link lookup with background refresh
pub struct LinksEngine {
    config: Config,
    credentials: Arc<CredentialStore>,
    cache: Arc<LinkCache>,
    refresher: Arc<Refresher>,
    dispatcher: ActionDispatcher,
    matcher: Box<dyn FuzzyMatcher>,
    scheduler: Option<SchedulerHandle>,
}

impl LinksEngine {
    /// Build an engine from configuration
    ///
    /// The credential store starts empty; [`start`](Self::start) loads the
    /// configured token so the first refresh goes through the normal
    /// credential-change path.
    pub fn new(config: &Config, host: Arc<dyn Host>) -> Result<Self> {
        let client = LinksClient::new(&config.api_url, config.request_timeout())
            .context("Failed to build HTTP client")?;
        let credentials = Arc::new(CredentialStore::default());
        let cache = Arc::new(LinkCache::new());
        let refresher = Arc::new(Refresher::new(
            client.clone(),
            credentials.clone(),
            cache.clone(),
            &config.link_base_url,
        ));
        let dispatcher = ActionDispatcher::new(client, credentials.clone(), host);

        Ok(Self {
            config: config.clone(),
            credentials,
            cache,
            refresher,
            dispatcher,
            matcher: Box::new(SkimScorer::new(config.min_match_score)),
            scheduler: None,
        })
    }

    /// Replace the fuzzy matcher (e.g. with the host's own scorer)
    pub fn with_matcher(mut self, matcher: Box<dyn FuzzyMatcher>) -> Self {
        self.matcher = matcher;
        self
    }

    /// Spawn the background scheduler and load the configured token
    ///
    /// Must be called from within a tokio runtime. Calling it twice is a
    /// no-op.
    pub fn start(&mut self) {
        if self.scheduler.is_some() {
            return;
        }
        self.scheduler = Some(spawn_scheduler(
            self.refresher.clone(),
            self.config.refresh_interval(),
        ));
        self.credentials
            .set(Credential::new(self.config.token_or_empty()));
    }

    /// Whether the background scheduler is running
    pub fn is_running(&self) -> bool {
        self.scheduler.is_some()
    }

    /// Take the scheduler event receiver (only once, only after `start`)
    pub fn take_events(&mut self) -> Option<mpsc::Receiver<SchedulerEvent>> {
        self.scheduler.as_mut().and_then(|s| s.take_events())
    }

    /// Search the cached links
    pub fn query(&self, search: &str) -> Vec<ResultItem> {
        query_items(search, &self.cache.snapshot(), self.matcher.as_ref())
    }

    /// Look up a cached link by id
    pub fn find(&self, id: &str) -> Option<LinkRecord> {
        self.cache.snapshot().find(id).cloned()
    }

    /// Actions available for a link
    pub fn context_menu(&self, record: &LinkRecord) -> Vec<ActionItem> {
        context_menu(record)
    }

    /// Run an action on a link
    pub async fn dispatch(&self, action: LinkAction, record: &LinkRecord) -> bool {
        self.dispatcher.dispatch(action, record).await
    }

    /// Replace the API token (triggers a refresh when started)
    pub fn set_token(&self, token: &str) {
        self.credentials.set(Credential::new(token));
    }

    /// Ask the scheduler for a refresh
    ///
    /// Without a running scheduler this does nothing; use
    /// [`refresh_now`](Self::refresh_now) instead.
    pub fn reload(&self) {
        if let Some(ref scheduler) = self.scheduler {
            scheduler.request_refresh();
        }
    }

    /// Run one refresh cycle on the caller's task
    ///
    /// Uses whatever token is currently loaded; call
    /// [`load_token`](Self::load_token) first when not started.
    pub async fn refresh_now(&self) -> RefreshOutcome {
        self.refresher.refresh_once().await
    }

    /// Load the configured token without starting the scheduler
    pub fn load_token(&self) {
        self.credentials
            .set(Credential::new(self.config.token_or_empty()));
    }

    /// Current cache snapshot
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.cache.snapshot()
    }

    /// Watch newly published snapshots
    pub fn subscribe_snapshots(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.cache.subscribe()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Stop the scheduler and detach from the credential store
    pub async fn shutdown(&mut self) {
        if let Some(scheduler) = self.scheduler.take() {
            scheduler.shutdown().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Default)]
    struct QuietHost {
        messages: Mutex<Vec<String>>,
    }

    impl Host for QuietHost {
        fn copy_to_clipboard(&self, _text: &str) {}
        fn open_url(&self, _url: &str) {}
        fn show_message(&self, message: &str) {
            self.messages.lock().unwrap().push(message.to_string());
        }
    }

    fn links_body() -> serde_json::Value {
        serde_json::json!({
            "entries": [
                {
                    "id": "1",
                    "state": "active",
                    "slug": "intro",
                    "name": "Intro Call",
                    "description": "",
                    "scope": {"id": "s", "name": "Acme", "slug": "acme"}
                },
                {
                    "id": "2",
                    "state": "active",
                    "slug": "demo",
                    "name": "Demo",
                    "private_name": "enterprise",
                    "description": "",
                    "scope": {"id": "s", "name": "Acme", "slug": "acme"}
                }
            ],
            "metadata": {"before": null, "after": null, "limit": 100}
        })
    }

    fn named_body(entries: &[(&str, &str)]) -> serde_json::Value {
        let entries: Vec<_> = entries
            .iter()
            .map(|(id, name)| {
                serde_json::json!({
                    "id": id,
                    "slug": id,
                    "name": name,
                    "scope": {"slug": "acme"}
                })
            })
            .collect();
        serde_json::json!({"entries": entries})
    }

    fn config_for(server: &MockServer, token: Option<&str>) -> Config {
        Config {
            token: token.map(str::to_string),
            api_url: server.uri(),
            refresh_interval_secs: 3600,
            ..Config::default()
        }
    }

    async fn wait_for_records(engine: &LinksEngine, count: usize) {
        let mut rx = engine.subscribe_snapshots();
        tokio::time::timeout(Duration::from_secs(5), rx.wait_for(|s| s.len() == count))
            .await
            .expect("timed out waiting for snapshot")
            .unwrap();
    }

    #[tokio::test]
    async fn test_start_loads_token_and_refreshes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/links"))
            .and(header("authorization", "Bearer tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(links_body()))
            .expect(1)
            .mount(&server)
            .await;

        let host = Arc::new(QuietHost::default());
        let mut engine = LinksEngine::new(&config_for(&server, Some("tok")), host).unwrap();
        engine.start();
        assert!(engine.is_running());

        wait_for_records(&engine, 2).await;

        let all = engine.query("");
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].title, "Intro Call");
        assert_eq!(all[1].subtitle, "enterprise");

        let hits = engine.query("intro");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].record.link, "https://savvycal.com/acme/intro");
        assert!(engine.query("zzz").is_empty());

        engine.shutdown().await;
        assert!(!engine.is_running());
    }

    #[tokio::test]
    async fn test_clearing_token_empties_cache() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/links"))
            .respond_with(ResponseTemplate::new(200).set_body_json(links_body()))
            .expect(1)
            .mount(&server)
            .await;

        let host = Arc::new(QuietHost::default());
        let mut engine = LinksEngine::new(&config_for(&server, Some("tok")), host).unwrap();
        engine.start();
        wait_for_records(&engine, 2).await;

        engine.set_token("");
        wait_for_records(&engine, 0).await;
        assert!(engine.query("").is_empty());

        engine.shutdown().await;
    }

    #[tokio::test]
    async fn test_toggle_leaves_cache_untouched() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/links"))
            .respond_with(ResponseTemplate::new(200).set_body_json(links_body()))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/links/1/toggle"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/links/2/toggle"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let host = Arc::new(QuietHost::default());
        let engine = LinksEngine::new(&config_for(&server, Some("tok")), host.clone()).unwrap();
        engine.load_token();
        assert!(engine.refresh_now().await.is_updated());
        let before = engine.snapshot();

        let first = engine.find("1").unwrap();
        let second = engine.find("2").unwrap();
        assert!(engine.dispatch(LinkAction::ToggleAvailability, &first).await);
        assert!(!engine.dispatch(LinkAction::ToggleAvailability, &second).await);

        assert!(Arc::ptr_eq(&before, &engine.snapshot()));
        assert_eq!(
            *host.messages.lock().unwrap(),
            vec![
                "Successfully toggled availability".to_string(),
                "Failed to toggle availability".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_token_change_during_refresh_now_is_applied() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/links"))
            .and(header("authorization", "Bearer old"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(named_body(&[("1", "Old")]))
                    .set_delay(Duration::from_millis(300)),
            )
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/links"))
            .and(header("authorization", "Bearer new"))
            .respond_with(ResponseTemplate::new(200).set_body_json(named_body(&[("1", "New")])))
            .expect(1)
            .mount(&server)
            .await;

        let host = Arc::new(QuietHost::default());
        let mut engine = LinksEngine::new(&config_for(&server, Some("old")), host).unwrap();
        engine.start();
        let mut events = engine.take_events().unwrap();
        let SchedulerEvent::Completed(startup) = events.recv().await.unwrap();
        assert!(startup.is_updated());

        let (outcome, ()) = tokio::join!(engine.refresh_now(), async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            engine.set_token("new");
        });

        assert!(outcome.is_updated());
        assert_eq!(engine.find("1").unwrap().name, "New");

        engine.shutdown().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_query_sees_whole_snapshots_during_refresh() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/links"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(named_body(&[("1", "Intro"), ("2", "Demo")])),
            )
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/links"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(named_body(&[("a", "Intro"), ("b", "Demo"), ("c", "Sync")]))
                    .set_delay(Duration::from_millis(200)),
            )
            .mount(&server)
            .await;

        let host = Arc::new(QuietHost::default());
        let engine = Arc::new(LinksEngine::new(&config_for(&server, Some("tok")), host).unwrap());
        engine.load_token();
        assert!(engine.refresh_now().await.is_updated());

        let refresh = {
            let engine = engine.clone();
            tokio::spawn(async move { engine.refresh_now().await })
        };

        let before = vec!["1", "2"];
        let after = vec!["a", "b", "c"];
        loop {
            let ids: Vec<String> = engine.query("").into_iter().map(|i| i.record.id).collect();
            assert!(ids == before || ids == after, "mixed snapshot: {:?}", ids);
            if ids == after || refresh.is_finished() {
                break;
            }
            tokio::task::yield_now().await;
        }

        assert!(refresh.await.unwrap().is_updated());
        assert_eq!(engine.snapshot().len(), 3);
    }

    #[tokio::test]
    async fn test_reload_without_scheduler_is_noop() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(links_body()))
            .expect(0)
            .mount(&server)
            .await;

        let host = Arc::new(QuietHost::default());
        let engine = LinksEngine::new(&config_for(&server, Some("tok")), host).unwrap();
        engine.reload();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(engine.snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_context_menu_for_result() {
        let server = MockServer::start().await;
        let host = Arc::new(QuietHost::default());
        let engine = LinksEngine::new(&config_for(&server, None), host).unwrap();

        let record = LinkRecord::new("2", "Demo", "enterprise", "https://savvycal.com/acme/demo");
        let menu = engine.context_menu(&record);
        assert_eq!(menu.len(), 3);
        assert_eq!(menu[0].subtitle, "Demo (enterprise)");
    }
}
