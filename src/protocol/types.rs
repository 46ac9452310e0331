//! Action protocol message types
//!
//! An [`Action`] is what test code asks for, an [`ActionMessage`] is its wire
//! form, and an [`ActionOutcome`] is the app's single reply to it.

use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::common::{Error, Result};

/// Message type tag of every action sent to the app
const ACTION_MESSAGE_TYPE: &str = "ACTION";

/// Kinds of interaction the app under test understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionKind {
    Press,
    LongPress,
    EnterText,
    Call,
    ScrollTo,
    ScrollToEnd,
}

impl ActionKind {
    /// Whether actions of this kind carry a value
    pub fn requires_value(self) -> bool {
        matches!(self, Self::EnterText | Self::Call | Self::ScrollTo)
    }
}

/// Target offset for a scroll, at least one coordinate is set
///
/// Coordinates must be finite. [`ScrollPosition::new`] checks this; the
/// infallible constructors expect the caller to pass finite values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScrollPosition {
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_coordinate"
    )]
    x: Option<f64>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_coordinate"
    )]
    y: Option<f64>,
}

impl ScrollPosition {
    /// Create a position, rejecting one with neither coordinate or with a
    /// NaN or infinite one
    pub fn new(x: Option<f64>, y: Option<f64>) -> Result<Self> {
        if x.is_none() && y.is_none() {
            return Err(Error::InvalidScrollPosition(
                "at least one of x or y is required".to_string(),
            ));
        }
        if let Some(bad) = [x, y].into_iter().flatten().find(|v| !v.is_finite()) {
            return Err(Error::InvalidScrollPosition(format!(
                "coordinate {} is not a finite number",
                bad
            )));
        }
        Ok(Self { x, y })
    }

    /// Horizontal offset only; `x` must be finite
    pub fn x(x: f64) -> Self {
        debug_assert!(x.is_finite());
        Self { x: Some(x), y: None }
    }

    /// Vertical offset only; `y` must be finite
    pub fn y(y: f64) -> Self {
        debug_assert!(y.is_finite());
        Self { x: None, y: Some(y) }
    }

    /// Both offsets, each must be finite
    pub fn xy(x: f64, y: f64) -> Self {
        debug_assert!(x.is_finite() && y.is_finite());
        Self {
            x: Some(x),
            y: Some(y),
        }
    }
}

// Whole offsets go out as integers (`10`, not `10.0`), which is what the app
// side expects from a JavaScript-style number.
fn serialize_coordinate<S: Serializer>(
    value: &Option<f64>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match value {
        Some(v) if v.fract() == 0.0 && v.abs() < i64::MAX as f64 => {
            serializer.serialize_i64(*v as i64)
        }
        Some(v) => serializer.serialize_f64(*v),
        None => serializer.serialize_none(),
    }
}

/// Payload of an action
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ActionValue {
    /// Text to type into an input
    Text(String),
    /// Key of a callback registered by the app
    CallbackKey(String),
    /// Scroll target
    Position(ScrollPosition),
}

/// A single intended interaction with the app under test
///
/// Constructed per call; the value is present exactly when the kind needs one.
#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    kind: ActionKind,
    test_id: String,
    value: Option<ActionValue>,
}

impl Action {
    fn new(kind: ActionKind, test_id: &str, value: Option<ActionValue>) -> Self {
        Self {
            kind,
            test_id: test_id.to_string(),
            value,
        }
    }

    pub fn press(test_id: &str) -> Self {
        Self::new(ActionKind::Press, test_id, None)
    }

    pub fn long_press(test_id: &str) -> Self {
        Self::new(ActionKind::LongPress, test_id, None)
    }

    pub fn enter_text(test_id: &str, text: &str) -> Self {
        Self::new(
            ActionKind::EnterText,
            test_id,
            Some(ActionValue::Text(text.to_string())),
        )
    }

    pub fn call(test_id: &str, callback_key: &str) -> Self {
        Self::new(
            ActionKind::Call,
            test_id,
            Some(ActionValue::CallbackKey(callback_key.to_string())),
        )
    }

    pub fn scroll_to(test_id: &str, position: ScrollPosition) -> Self {
        Self::new(
            ActionKind::ScrollTo,
            test_id,
            Some(ActionValue::Position(position)),
        )
    }

    pub fn scroll_to_end(test_id: &str) -> Self {
        Self::new(ActionKind::ScrollToEnd, test_id, None)
    }

    pub fn kind(&self) -> ActionKind {
        self.kind
    }

    pub fn test_id(&self) -> &str {
        &self.test_id
    }

    pub fn value(&self) -> Option<&ActionValue> {
        self.value.as_ref()
    }

    /// Wire form of this action
    pub fn to_message(&self) -> ActionMessage<'_> {
        ActionMessage {
            message_type: ACTION_MESSAGE_TYPE,
            action: self.kind,
            test_id: &self.test_id,
            value: self.value.as_ref(),
        }
    }
}

/// Wire representation of an [`Action`]
#[derive(Debug, Serialize)]
pub struct ActionMessage<'a> {
    #[serde(rename = "type")]
    pub message_type: &'static str,
    pub action: ActionKind,
    #[serde(rename = "testID")]
    pub test_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<&'a ActionValue>,
}

impl ActionMessage<'_> {
    /// Serialize to the JSON text sent over the channel
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// The app's reply to exactly one [`ActionMessage`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionOutcome {
    /// Raw `type` field; empty when the reply has none
    pub outcome_type: String,
    pub test_id: Option<String>,
}

impl ActionOutcome {
    /// Parse an inbound message
    ///
    /// Only text that is not JSON is malformed. A JSON reply with a missing
    /// or odd `type` still parses and classifies as unrecognized.
    pub fn parse(text: &str) -> Result<Self> {
        let reply: Value =
            serde_json::from_str(text).map_err(|e| Error::MalformedOutcome(e.to_string()))?;

        let outcome_type = match reply.get("type") {
            Some(Value::String(kind)) => kind.clone(),
            None | Some(Value::Null) => String::new(),
            Some(other) => other.to_string(),
        };
        let test_id = reply
            .get("testID")
            .and_then(Value::as_str)
            .map(str::to_string);

        Ok(Self {
            outcome_type,
            test_id,
        })
    }

    /// Classify the outcome of the action sent for `test_id`
    ///
    /// Errors name the test id the app reported, or the requested one when
    /// the reply carries none.
    pub fn into_result(self, test_id: &str) -> Result<()> {
        let reported = self.test_id.unwrap_or_else(|| test_id.to_string());

        match self.outcome_type.as_str() {
            "DONE" => Ok(()),
            "NOT_FOUND" => Err(Error::TargetNotFound { test_id: reported }),
            "ERROR" => Err(Error::ActionFailed { test_id: reported }),
            other => Err(Error::UnrecognizedOutcome(other.to_string())),
        }
    }
}
