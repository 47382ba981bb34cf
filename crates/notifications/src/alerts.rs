//! Host alert capabilities: sound, desktop notifications and their permission.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};

/// Desktop-notification permission as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    /// Not asked yet.
    #[default]
    Default,
    Granted,
    Denied,
}

/// Errors from an [`AlertSink`]. Always swallowed by the caller.
#[derive(Debug, thiserror::Error)]
pub enum AlertError {
    #[error("alerts are not supported on this host")]
    Unsupported,

    #[error("notification permission denied")]
    PermissionDenied,

    #[error("sound playback failed: {0}")]
    Playback(String),

    #[error("could not show notification: {0}")]
    Display(String),
}

/// A desktop notification to raise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesktopAlert {
    pub title: String,
    pub body: String,
    pub icon: String,
    /// Stay on screen until dismissed.
    pub require_interaction: bool,
}

/// Where sounds and desktop notifications go.
pub trait AlertSink: Send + Sync {
    fn permission(&self) -> Permission;

    /// Prompts the user. Only called while the permission is `Default`.
    fn request_permission(&self) -> Result<Permission, AlertError>;

    fn play_sound(&self) -> Result<(), AlertError>;

    fn show(&self, alert: &DesktopAlert) -> Result<(), AlertError>;
}

/// Sink for hosts without any alert support.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAlerts;

impl AlertSink for NoopAlerts {
    fn permission(&self) -> Permission {
        Permission::Denied
    }

    fn request_permission(&self) -> Result<Permission, AlertError> {
        Ok(Permission::Denied)
    }

    fn play_sound(&self) -> Result<(), AlertError> {
        Err(AlertError::Unsupported)
    }

    fn show(&self, _alert: &DesktopAlert) -> Result<(), AlertError> {
        Err(AlertError::Unsupported)
    }
}

/// What a [`RecordingAlerts`] sink was asked to do.
#[derive(Debug, Default)]
pub struct AlertLog {
    pub prompts: u32,
    pub sounds: u32,
    pub shown: Vec<DesktopAlert>,
}

/// In-memory sink that records every call. Useful for tests and dry runs.
#[derive(Debug)]
pub struct RecordingAlerts {
    permission: Mutex<Permission>,
    /// Answer given when prompted.
    answer: Permission,
    fail: bool,
    log: Mutex<AlertLog>,
}

impl RecordingAlerts {
    pub fn new(permission: Permission, answer: Permission) -> Self {
        Self {
            permission: Mutex::new(permission),
            answer,
            fail: false,
            log: Mutex::new(AlertLog::default()),
        }
    }

    /// A sink whose sound and display calls always fail.
    pub fn failing(permission: Permission) -> Self {
        Self {
            fail: true,
            ..Self::new(permission, permission)
        }
    }

    /// Runs `f` with the recorded calls.
    pub fn with_log<R>(&self, f: impl FnOnce(&AlertLog) -> R) -> R {
        f(&self.log())
    }

    fn log(&self) -> std::sync::MutexGuard<'_, AlertLog> {
        self.log.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl AlertSink for RecordingAlerts {
    fn permission(&self) -> Permission {
        *self
            .permission
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn request_permission(&self) -> Result<Permission, AlertError> {
        self.log().prompts += 1;
        let mut p = self
            .permission
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        *p = self.answer;
        Ok(*p)
    }

    fn play_sound(&self) -> Result<(), AlertError> {
        self.log().sounds += 1;
        if self.fail {
            return Err(AlertError::Playback("autoplay blocked".into()));
        }
        Ok(())
    }

    fn show(&self, alert: &DesktopAlert) -> Result<(), AlertError> {
        self.log().shown.push(alert.clone());
        if self.fail {
            return Err(AlertError::Display("notification daemon unavailable".into()));
        }
        Ok(())
    }
}
