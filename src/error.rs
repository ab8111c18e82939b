use wasm_bindgen::JsValue;

use crate::route_types::WaypointId;

#[derive(Debug)]
pub enum RallyError {
    /// No current coordinate is available.
    NoFix,
    /// Operation invoked in the wrong section lifecycle state.
    Precondition {
        operation: &'static str,
        reason: &'static str,
    },
    Index {
        index: usize,
        len: usize,
    },
    UnknownWaypoint(WaypointId),
    XmlParse(quick_xml::Error),
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },
    InvalidAttribute {
        element: &'static str,
        attribute: &'static str,
        value: String,
    },
    Json(serde_json::Error),
    /// The draft store rejected a read or write.
    Storage(String),
}

pub type Result<T> = std::result::Result<T, RallyError>;

impl std::fmt::Display for RallyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoFix => write!(
                f,
                "No GPS signal available. Please wait for GPS to be ready."
            ),
            Self::Precondition { operation, reason } => {
                write!(f, "Cannot {operation}: {reason}")
            }
            Self::Index { index, len } => {
                write!(f, "Waypoint index {index} out of range (len {len})")
            }
            Self::UnknownWaypoint(id) => write!(f, "No waypoint with id {id}"),
            Self::XmlParse(e) => write!(f, "XML parse error: {e}"),
            Self::MissingAttribute { element, attribute } => {
                write!(f, "Missing attribute '{attribute}' on <{element}>")
            }
            Self::InvalidAttribute {
                element,
                attribute,
                value,
            } => write!(
                f,
                "Invalid value '{value}' for attribute '{attribute}' on <{element}>"
            ),
            Self::Json(e) => write!(f, "JSON error: {e}"),
            Self::Storage(msg) => write!(f, "Draft storage error: {msg}"),
        }
    }
}

impl std::error::Error for RallyError {}

impl From<quick_xml::Error> for RallyError {
    fn from(e: quick_xml::Error) -> Self {
        Self::XmlParse(e)
    }
}

impl From<serde_json::Error> for RallyError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

impl From<RallyError> for JsValue {
    fn from(e: RallyError) -> Self {
        JsValue::from_str(&e.to_string())
    }
}
