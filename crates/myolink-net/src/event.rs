//! The decoded wire payload.

use serde::Deserialize;
use serde_json::{Map, Value};

/// A decoded control event.
///
/// One datagram decodes to one `Event`. The wire shape is a UTF-8 JSON
/// object `{"type": <string>, "data": [<numbers>]}`; additional fields are
/// preserved in [`extra`](Self::extra) so senders can extend the format
/// without breaking the listener.
///
/// Events are transient: the listener passes them to the handler by
/// reference and never retains them.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Event {
    /// The event kind, e.g. `"emgJoystick"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Ordered numeric values carried by the event.
    ///
    /// The listener does not require a minimum length; interpreting the
    /// values (including how many are expected) is the consumer's job.
    #[serde(rename = "data")]
    pub values: Vec<f64>,
    /// Any fields beyond `type` and `data`, kept as-is.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
