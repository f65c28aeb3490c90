use std::time::Duration;

use async_trait::async_trait;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, instrument, warn};
use zbus::fdo::DBusProxy;

use super::MprisError;

/// Source of the names currently registered on the bus.
#[async_trait]
pub trait NameRegistry: Send + Sync {
    /// Every name currently owned on the bus.
    async fn list_names(&self) -> Result<Vec<String>, MprisError>;
}

#[async_trait]
impl<'a> NameRegistry for DBusProxy<'a> {
    async fn list_names(&self) -> Result<Vec<String>, MprisError> {
        let names = DBusProxy::list_names(self)
            .await
            .map_err(|e| MprisError::DbusError(e.into()))?;
        Ok(names.into_iter().map(|name| name.to_string()).collect())
    }
}

/// Wait until `service` is registered on the bus.
///
/// The registry is queried right away and then every `interval`. If the
/// name shows up in the same tick the deadline passes, the call still
/// succeeds. Dropping the returned future stops the polling.
///
/// # Errors
///
/// Returns `MprisError::InvalidOperation` if `interval` is zero, and
/// `MprisError::Timeout` if the name has not appeared after `timeout`.
#[instrument(skip(registry))]
pub async fn await_service(
    registry: &dyn NameRegistry,
    service: &str,
    timeout: Duration,
    interval: Duration,
) -> Result<(), MprisError> {
    if interval.is_zero() {
        return Err(MprisError::invalid(
            "org.freedesktop.DBus",
            "poll interval must be greater than zero",
        ));
    }

    let poll = async {
        let mut ticker = time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            debug!("Looking for D-Bus service");

            match registry.list_names().await {
                Ok(names) if names.iter().any(|name| name == service) => return,
                Ok(_) => {}
                Err(e) => warn!("Listing bus names failed: {e}"),
            }
        }
    };

    match time::timeout(timeout, poll).await {
        Ok(()) => {
            info!("Player service found");
            Ok(())
        }
        Err(_) => {
            warn!("Timed out waiting for player service");
            Err(MprisError::Timeout {
                service: service.to_string(),
                timeout,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use tokio::time::Instant;

    use super::*;

    const SERVICE: &str = "org.mpris.MediaPlayer2.vlc";

    /// Registry that starts listing `SERVICE` after a number of queries.
    struct Registry {
        calls: AtomicUsize,
        appears_after: Option<usize>,
    }

    impl Registry {
        fn new(appears_after: Option<usize>) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                appears_after,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl NameRegistry for Registry {
        async fn list_names(&self) -> Result<Vec<String>, MprisError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            let mut names = vec!["org.freedesktop.DBus".to_string()];
            if self.appears_after.is_some_and(|after| call > after) {
                names.push(SERVICE.to_string());
            }
            Ok(names)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn present_service_is_found_without_waiting() {
        let registry = Registry::new(Some(0));
        let started = Instant::now();

        await_service(
            registry.as_ref(),
            SERVICE,
            Duration::from_secs(30),
            Duration::from_millis(100),
        )
        .await
        .unwrap();

        assert_eq!(registry.calls(), 1);
        assert!(started.elapsed() < Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn service_is_found_on_a_later_tick() {
        let registry = Registry::new(Some(3));
        let started = Instant::now();

        await_service(
            registry.as_ref(),
            SERVICE,
            Duration::from_secs(30),
            Duration::from_millis(100),
        )
        .await
        .unwrap();

        assert_eq!(registry.calls(), 4);
        assert_eq!(started.elapsed(), Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn missing_service_times_out_no_earlier_than_deadline() {
        let registry = Registry::new(None);
        let started = Instant::now();

        let err = await_service(
            registry.as_ref(),
            SERVICE,
            Duration::from_millis(5000),
            Duration::from_millis(100),
        )
        .await
        .unwrap_err();

        let elapsed = started.elapsed();
        assert!(matches!(err, MprisError::Timeout { ref service, .. } if service == SERVICE));
        assert!(elapsed >= Duration::from_millis(5000));
        assert!(elapsed <= Duration::from_millis(5200));
    }

    #[tokio::test(start_paused = true)]
    async fn polling_stops_after_timeout() {
        let registry = Registry::new(None);

        let _ = await_service(
            registry.as_ref(),
            SERVICE,
            Duration::from_millis(1000),
            Duration::from_millis(100),
        )
        .await;
        let calls = registry.calls();

        time::sleep(Duration::from_secs(5)).await;
        assert_eq!(registry.calls(), calls);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_interval_is_rejected_before_polling() {
        let registry = Registry::new(Some(0));

        let err = await_service(
            registry.as_ref(),
            SERVICE,
            Duration::from_secs(30),
            Duration::ZERO,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, MprisError::InvalidOperation { .. }));
        assert_eq!(registry.calls(), 0);
    }
}
