//! Terminal alert sink: bell for sounds, log lines for desktop notifications.

use std::io::Write;

use rentdesk_notifications::{AlertError, AlertSink, DesktopAlert, Permission};

/// Alerts for a headless terminal session. No prompt is needed, so the
/// permission follows the `desktop` setting.
#[derive(Debug, Clone, Copy)]
pub struct TerminalAlerts {
    desktop: bool,
}

impl TerminalAlerts {
    pub fn new(desktop: bool) -> Self {
        Self { desktop }
    }
}

impl AlertSink for TerminalAlerts {
    fn permission(&self) -> Permission {
        if self.desktop {
            Permission::Granted
        } else {
            Permission::Denied
        }
    }

    fn request_permission(&self) -> Result<Permission, AlertError> {
        Ok(self.permission())
    }

    fn play_sound(&self) -> Result<(), AlertError> {
        let mut err = std::io::stderr();
        err.write_all(b"\x07")
            .and_then(|()| err.flush())
            .map_err(|e| AlertError::Playback(e.to_string()))
    }

    fn show(&self, alert: &DesktopAlert) -> Result<(), AlertError> {
        if !self.desktop {
            return Err(AlertError::PermissionDenied);
        }
        if alert.require_interaction {
            tracing::warn!(title = %alert.title, "{} {}", alert.icon, alert.body);
        } else {
            tracing::info!(title = %alert.title, "{} {}", alert.icon, alert.body);
        }
        Ok(())
    }
}
