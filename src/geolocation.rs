use serde::Serialize;

use crate::route_types::Fix;

/// Error codes reported by the geolocation provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum GeoErrorCode {
    PermissionDenied,
    PositionUnavailable,
    Timeout,
    Unknown,
}

impl GeoErrorCode {
    /// Map a W3C `GeolocationPositionError.code`.
    pub fn from_code(code: u16) -> Self {
        match code {
            1 => Self::PermissionDenied,
            2 => Self::PositionUnavailable,
            3 => Self::Timeout,
            _ => Self::Unknown,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::PermissionDenied => "GPS access denied. Please enable location permissions.",
            Self::PositionUnavailable => "GPS signal unavailable. Try moving to an open area.",
            Self::Timeout => "GPS timeout. Retrying...",
            Self::Unknown => "GPS error occurred. Check your location settings.",
        }
    }
}

/// What the session knows about the device position.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum GpsState {
    /// No fix or error received yet.
    #[default]
    Acquiring,
    Locked(Fix),
    /// The provider reported an error; `last` is the most recent good fix.
    Lost {
        last: Option<Fix>,
        error: GeoErrorCode,
    },
}

impl GpsState {
    /// The fix operations should use, if any.
    pub fn current_fix(&self) -> Option<Fix> {
        match self {
            Self::Acquiring => None,
            Self::Locked(fix) => Some(*fix),
            Self::Lost { last, .. } => *last,
        }
    }

    pub fn on_fix(&mut self, fix: Fix) {
        *self = Self::Locked(fix);
    }

    pub fn on_error(&mut self, error: GeoErrorCode) {
        *self = Self::Lost {
            last: self.current_fix(),
            error,
        };
    }

    /// User-facing status line, `None` while the GPS is healthy.
    pub fn status_message(&self) -> Option<&'static str> {
        match self {
            Self::Acquiring => Some("Acquiring GPS signal..."),
            Self::Locked(_) => None,
            Self::Lost { error, .. } => Some(error.message()),
        }
    }
}
