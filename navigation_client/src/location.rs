use std::sync::Mutex;

use async_trait::async_trait;
use navigation_lib::coordinate::Coordinate;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PermissionStatus {
    Unknown,
    Granted,
    Denied,
    /// Denied with no way to ask again; only system settings can fix it.
    Blocked,
}

/// Device geolocation as seen by a navigation session.
///
/// The watch channel is the authoritative origin. `None` means no fix yet,
/// or permission was lost.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    fn current_permission(&self) -> PermissionStatus;

    async fn request_permission(&self) -> bool;

    fn subscribe(&self) -> watch::Receiver<Option<Coordinate>>;

    fn open_system_settings(&self);
}

/// Granted stays granted, blocked is never re-asked, anything else prompts.
pub async fn ensure_permission(provider: &dyn LocationProvider) -> PermissionStatus {
    match provider.current_permission() {
        PermissionStatus::Granted => PermissionStatus::Granted,
        PermissionStatus::Blocked => PermissionStatus::Blocked,
        PermissionStatus::Unknown | PermissionStatus::Denied => {
            if provider.request_permission().await {
                PermissionStatus::Granted
            } else {
                provider.current_permission()
            }
        },
    }
}

/// A provider driven by hand: positions and permission answers are set by the owner.
pub struct ManualLocationProvider {
    position: watch::Sender<Option<Coordinate>>,
    permission: Mutex<PermissionStatus>,
    grant_on_request: bool,
}

impl ManualLocationProvider {
    pub fn new(permission: PermissionStatus, grant_on_request: bool) -> Self {
        let (position, _) = watch::channel(None);
        Self {
            position,
            permission: Mutex::new(permission),
            grant_on_request,
        }
    }

    /// Already granted and sitting at `position`.
    pub fn fixed(position: Coordinate) -> Self {
        let provider = Self::new(PermissionStatus::Granted, true);
        provider.set_position(Some(position));
        provider
    }

    pub fn set_position(&self, position: Option<Coordinate>) {
        self.position.send_replace(position);
    }

    pub fn set_permission(&self, permission: PermissionStatus) {
        if let Ok(mut guard) = self.permission.lock() {
            *guard = permission;
        }
        if permission != PermissionStatus::Granted {
            self.set_position(None);
        }
    }
}

#[async_trait]
impl LocationProvider for ManualLocationProvider {
    fn current_permission(&self) -> PermissionStatus {
        self.permission.lock().map(|guard| *guard).unwrap_or(PermissionStatus::Unknown)
    }

    async fn request_permission(&self) -> bool {
        match self.current_permission() {
            PermissionStatus::Granted => true,
            PermissionStatus::Blocked => false,
            PermissionStatus::Unknown | PermissionStatus::Denied => {
                let answer = if self.grant_on_request {
                    PermissionStatus::Granted
                } else {
                    PermissionStatus::Denied
                };
                self.set_permission(answer);
                self.grant_on_request
            },
        }
    }

    fn subscribe(&self) -> watch::Receiver<Option<Coordinate>> {
        self.position.subscribe()
    }

    fn open_system_settings(&self) {
        tracing::info!("Open the system settings to change location permission");
    }
}
