//! Public facade: configuration plus fire-and-forget network operations
//!
//! The [`Dispatcher`] owns the configuration slot and the API client. Every
//! network-issuing operation checks the slot, snapshots the values it needs,
//! and spawns an independent unit of work that performs the HTTP call and
//! reports its outcome only through the logger and, where one exists, a
//! completion callback. Units of work are unordered and best-effort: no
//! queue, no retry, no backpressure. Guard-path completions run inline on
//! the caller's stack; spawned completions and outcome logs run on the
//! dispatcher's tokio runtime.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::client::{ApiClient, HEARTBEAT_ENDPOINT, REGISTER_ENDPOINT, TRACK_ENDPOINT};
use crate::config::{ConfigStore, Configuration};
use crate::error::{Error, Result};
use crate::events::{DevicePayload, Event, EventPayload};
use crate::host::{AppInfoProvider, DeviceIdStore};
use crate::logging::{LogCategory, Logger};

/// Callback reporting the outcome of a spawned operation, invoked exactly
/// once per call
pub type Completion = Box<dyn FnOnce(Result<()>) + Send + 'static>;

/// Handle to an in-flight heartbeat check
///
/// Cancellation is checked once, before the HTTP call is issued; a request
/// already on the wire is not aborted. A cancelled-before-start heartbeat
/// produces no log entry and no completion call.
pub struct HeartbeatHandle {
    token: CancellationToken,
}

impl HeartbeatHandle {
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Handle for guard paths where no work was spawned
    fn unattached() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }
}

struct Inner {
    store: ConfigStore,
    client: ApiClient,
    logger: Logger,
    device_ids: Box<dyn DeviceIdStore>,
    app_info: Box<dyn AppInfoProvider>,
    shutdown: CancellationToken,
    in_flight: Mutex<Vec<JoinHandle<()>>>,
}

/// Analytics/telemetry client facade
///
/// Cheap to clone; clones share configuration, base URL, and the in-flight
/// task set. The network-issuing operations spawn onto the ambient tokio
/// runtime and must be called from within one.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<Inner>,
}

impl Dispatcher {
    /// Create a dispatcher with the default `tracing`-backed logger
    pub fn new(
        device_ids: impl DeviceIdStore + 'static,
        app_info: impl AppInfoProvider + 'static,
    ) -> Result<Self> {
        Self::with_logger(device_ids, app_info, Logger::default())
    }

    /// Create a dispatcher with an explicit logger
    pub fn with_logger(
        device_ids: impl DeviceIdStore + 'static,
        app_info: impl AppInfoProvider + 'static,
        logger: Logger,
    ) -> Result<Self> {
        Ok(Self {
            inner: Arc::new(Inner {
                store: ConfigStore::new(),
                client: ApiClient::new()?,
                logger,
                device_ids: Box::new(device_ids),
                app_info: Box::new(app_info),
                shutdown: CancellationToken::new(),
                in_flight: Mutex::new(Vec::new()),
            }),
        })
    }

    /// Resolve host identity and the device identifier, then store the
    /// active configuration. Re-entrant: a later call replaces the earlier
    /// configuration wholesale.
    pub fn configure(&self, api_key: impl Into<String>) {
        let api_key = api_key.into();

        let device_uuid = match self.inner.device_ids.ensure_device_id() {
            Ok(id) => id,
            Err(e) => {
                self.inner.logger.error(
                    LogCategory::Configuration,
                    format!("configure failed: could not resolve device identifier: {}", e),
                );
                return;
            }
        };

        let info = self.inner.app_info.current_app_info();
        let bundle_id = info.bundle_id.clone();
        self.inner.store.set(Configuration {
            api_key,
            bundle_id: info.bundle_id,
            version: info.version,
            build: info.build,
            device_uuid,
        });

        self.inner.logger.success(
            LogCategory::Configuration,
            format!("configured for {}", bundle_id),
        );
    }

    /// Point all subsequent requests at a different API host
    pub fn configure_api(&self, base_url: &str) {
        self.inner.client.set_base_url(base_url);
        self.inner.logger.log(
            LogCategory::Network,
            format!("API base URL set to {}", self.inner.client.base_url()),
        );
    }

    /// Track an analytics event, fire-and-forget
    ///
    /// Accepts a typed [`Event`] or a plain string name. If the client is
    /// not configured the event is dropped with a warning; it is never
    /// queued. There is no completion callback: failures are observable only
    /// through the log.
    pub fn track(
        &self,
        event: impl Into<Event>,
        parameters: HashMap<String, serde_json::Value>,
    ) {
        let event = event.into();

        let Some(config) = self.inner.store.get() else {
            self.inner.logger.warning(
                LogCategory::Analytics,
                format!("dropping event '{}': track called before configure", event.name()),
            );
            return;
        };

        let payload = EventPayload::new(&config, &event, parameters);
        let inner = Arc::clone(&self.inner);
        let cancelled = self.inner.shutdown.clone();

        self.spawn(async move {
            if cancelled.is_cancelled() {
                return;
            }
            match inner.client.post(TRACK_ENDPOINT, &config.api_key, &payload).await {
                Ok(()) => inner.logger.success(
                    LogCategory::Analytics,
                    format!("tracked '{}'", payload.event_name),
                ),
                Err(e) => {
                    let body = serde_json::to_string(&payload).unwrap_or_default();
                    inner.logger.error(
                        LogCategory::Analytics,
                        format!(
                            "failed to track '{}': {} (payload: {})",
                            payload.event_name, e, body
                        ),
                    );
                }
            }
        });
    }

    /// Register this installation with the backend
    ///
    /// `token` is the push token, absent when the platform has not issued
    /// one; registration proceeds either way. The completion callback, when
    /// given, is invoked exactly once with the outcome.
    pub fn register_device(
        &self,
        token: Option<String>,
        production: bool,
        notifications_enabled: bool,
        completion: Option<Completion>,
    ) {
        let Some(config) = self.inner.store.get() else {
            self.inner.logger.warning(
                LogCategory::Device,
                "cannot register device: register_device called before configure",
            );
            if let Some(completion) = completion {
                completion(Err(Error::NotConfigured(
                    "register_device called before configure",
                )));
            }
            return;
        };

        let payload = DevicePayload::new(&config, token, production, notifications_enabled);
        let inner = Arc::clone(&self.inner);
        let cancelled = self.inner.shutdown.clone();

        self.spawn(async move {
            if cancelled.is_cancelled() {
                return;
            }
            let outcome = inner
                .client
                .post(REGISTER_ENDPOINT, &config.api_key, &payload)
                .await;
            match &outcome {
                Ok(()) => inner.logger.success(
                    LogCategory::Device,
                    format!("registered device {}", payload.uuid),
                ),
                Err(e) => inner.logger.error(
                    LogCategory::Device,
                    format!("device registration failed: {}", e),
                ),
            }
            if let Some(completion) = completion {
                completion(outcome);
            }
        });
    }

    /// Check backend connectivity
    ///
    /// The raw response body is logged on success. Returns a handle the
    /// caller may use to cancel the check before it starts.
    pub fn test_heartbeat(&self, completion: Completion) -> HeartbeatHandle {
        let Some(config) = self.inner.store.get() else {
            self.inner.logger.warning(
                LogCategory::Network,
                "cannot run heartbeat: test_heartbeat called before configure",
            );
            completion(Err(Error::NotConfigured(
                "test_heartbeat called before configure",
            )));
            return HeartbeatHandle::unattached();
        };

        let token = self.inner.shutdown.child_token();
        let task_token = token.clone();
        let inner = Arc::clone(&self.inner);

        self.spawn(async move {
            if task_token.is_cancelled() {
                return;
            }
            match inner.client.get(HEARTBEAT_ENDPOINT, &config.api_key).await {
                Ok(body) => {
                    inner
                        .logger
                        .success(LogCategory::Network, format!("heartbeat OK: {}", body));
                    completion(Ok(()));
                }
                Err(e) => {
                    inner
                        .logger
                        .error(LogCategory::Network, format!("heartbeat failed: {}", e));
                    completion(Err(e));
                }
            }
        });

        HeartbeatHandle { token }
    }

    /// Log a snapshot of the active configuration and base URL. No network
    /// call.
    pub fn debug_print_status(&self) {
        let Some(config) = self.inner.store.get() else {
            self.inner.logger.warning(
                LogCategory::Configuration,
                "status: not configured",
            );
            return;
        };

        // Credential stays out of the log; the prefix is enough to tell
        // keys apart.
        let key_prefix: String = config.api_key.chars().take(6).collect();
        self.inner.logger.log(
            LogCategory::Configuration,
            format!(
                "status:\n  bundle id: {}\n  version: {} (build {})\n  device uuid: {}\n  api key: {}...\n  base url: {}",
                config.bundle_id,
                config.version,
                config.build,
                config.device_uuid,
                key_prefix,
                self.inner.client.base_url()
            ),
        );
    }

    /// Forward an inbound push-notification payload as a
    /// `notification_opened` event
    ///
    /// A payload without a `notification_id` string field is a no-op with a
    /// warning, not an error.
    pub fn track_notification_opened(&self, payload: &serde_json::Value) {
        match payload.get("notification_id").and_then(|v| v.as_str()) {
            Some(id) => {
                let mut parameters = HashMap::new();
                parameters.insert(
                    "notification_id".to_string(),
                    serde_json::Value::String(id.to_string()),
                );
                self.track(Event::NotificationOpened, parameters);
            }
            None => self.inner.logger.warning(
                LogCategory::Lifecycle,
                "notification payload has no notification_id field",
            ),
        }
    }

    /// Abort units of work that have not started yet
    ///
    /// Requests already on the wire are not interrupted; not-yet-started
    /// sends return silently with no log and no completion call.
    pub fn shutdown(&self) {
        self.inner.shutdown.cancel();
        self.inner.logger.log(
            LogCategory::Lifecycle,
            "shutdown requested; pending sends will be dropped",
        );
    }

    /// Wait for every spawned unit of work to settle
    ///
    /// Adds no delivery guarantee; failed sends stay failed. Mainly useful
    /// in tests and at process exit.
    pub async fn flush(&self) {
        let handles: Vec<JoinHandle<()>> = {
            let mut in_flight = self
                .inner
                .in_flight
                .lock()
                .unwrap_or_else(|p| p.into_inner());
            in_flight.drain(..).collect()
        };
        for handle in handles {
            let _ = handle.await;
        }
    }

    fn spawn(&self, work: impl Future<Output = ()> + Send + 'static) {
        let mut in_flight = self
            .inner
            .in_flight
            .lock()
            .unwrap_or_else(|p| p.into_inner());
        in_flight.retain(|handle| !handle.is_finished());
        in_flight.push(tokio::spawn(work));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::AppInfo;
    use crate::logging::{LogLevel, MemorySink};

    struct FixedIds(&'static str);

    impl DeviceIdStore for FixedIds {
        fn ensure_device_id(&self) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct FailingIds;

    impl DeviceIdStore for FailingIds {
        fn ensure_device_id(&self) -> Result<String> {
            Err(Error::Config("store unavailable".to_string()))
        }
    }

    fn demo_app_info() -> AppInfo {
        AppInfo {
            bundle_id: "com.example.demo".to_string(),
            version: "1.2.0".to_string(),
            build: "42".to_string(),
        }
    }

    fn make_dispatcher(sink: Arc<MemorySink>) -> Dispatcher {
        Dispatcher::with_logger(FixedIds("device-0001"), demo_app_info(), Logger::new(sink))
            .unwrap()
    }

    #[test]
    fn test_track_before_configure_warns_and_drops() {
        let sink = Arc::new(MemorySink::new());
        let dispatcher = make_dispatcher(sink.clone());

        dispatcher.track("app_open", HashMap::new());

        assert_eq!(sink.count(LogCategory::Analytics, LogLevel::Warning), 1);
    }

    #[test]
    fn test_register_before_configure_completes_inline() {
        let sink = Arc::new(MemorySink::new());
        let dispatcher = make_dispatcher(sink.clone());

        let (tx, rx) = std::sync::mpsc::channel();
        dispatcher.register_device(
            None,
            true,
            false,
            Some(Box::new(move |outcome| {
                tx.send(outcome).ok();
            })),
        );

        // Completion ran on this stack, before any network round-trip
        let outcome = rx.try_recv().unwrap();
        assert!(matches!(outcome, Err(Error::NotConfigured(_))));
        assert!(rx.try_recv().is_err());
        assert_eq!(sink.count(LogCategory::Device, LogLevel::Warning), 1);
    }

    #[test]
    fn test_heartbeat_before_configure_returns_noop_handle() {
        let sink = Arc::new(MemorySink::new());
        let dispatcher = make_dispatcher(sink.clone());

        let (tx, rx) = std::sync::mpsc::channel();
        let handle = dispatcher.test_heartbeat(Box::new(move |outcome| {
            tx.send(outcome).ok();
        }));

        assert!(matches!(rx.try_recv().unwrap(), Err(Error::NotConfigured(_))));
        assert_eq!(sink.count(LogCategory::Network, LogLevel::Warning), 1);

        // Cancelling the no-op handle is harmless
        handle.cancel();
        assert!(handle.is_cancelled());
    }

    #[test]
    fn test_configure_failure_leaves_store_empty() {
        let sink = Arc::new(MemorySink::new());
        let dispatcher =
            Dispatcher::with_logger(FailingIds, demo_app_info(), Logger::new(sink.clone()))
                .unwrap();

        dispatcher.configure("key1");

        assert_eq!(sink.count(LogCategory::Configuration, LogLevel::Error), 1);
        dispatcher.track("app_open", HashMap::new());
        assert_eq!(sink.count(LogCategory::Analytics, LogLevel::Warning), 1);
    }

    #[test]
    fn test_debug_print_status_unconfigured() {
        let sink = Arc::new(MemorySink::new());
        let dispatcher = make_dispatcher(sink.clone());

        dispatcher.debug_print_status();

        assert_eq!(sink.count(LogCategory::Configuration, LogLevel::Warning), 1);
    }

    #[test]
    fn test_debug_print_status_snapshot() {
        let sink = Arc::new(MemorySink::new());
        let dispatcher = make_dispatcher(sink.clone());

        dispatcher.configure("key1-secret-suffix");
        dispatcher.debug_print_status();

        let entries = sink.entries();
        let status = entries
            .iter()
            .find(|e| e.level == LogLevel::Log && e.category == LogCategory::Configuration)
            .unwrap();
        assert!(status.message.contains("com.example.demo"));
        assert!(status.message.contains("device-0001"));
        assert!(status.message.contains("key1-s"));
        assert!(!status.message.contains("key1-secret-suffix"));
    }

    #[test]
    fn test_notification_payload_without_id_warns() {
        let sink = Arc::new(MemorySink::new());
        let dispatcher = make_dispatcher(sink.clone());
        dispatcher.configure("key1");

        dispatcher.track_notification_opened(&serde_json::json!({"other": "field"}));

        assert_eq!(sink.count(LogCategory::Lifecycle, LogLevel::Warning), 1);
    }
}
