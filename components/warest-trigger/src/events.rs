//! Event classification onto the trigger's output channels.

use serde_json::Value;
use warest_common::HeaderList;
use warest_common::helpers::optional_string_from;

pub const EVENT_HEADER: &str = "X-WAREST-Event";
pub const PREFLIGHT: &str = "preflight";

/// Output channels in slot order. Unrecognized events land in slot 0.
pub const CHANNELS: [&str; 13] = [
    "session_status",
    "message_received",
    "message_reaction",
    "message_command",
    "message_edited",
    "message_revoked",
    "group_participants",
    "group_join",
    "group_leave",
    "group_update",
    "presence_update",
    "creds_update",
    "call",
];

const ALIASES: &[(&str, &str)] = &[
    ("connection_update", "session_status"),
    ("session_update", "session_status"),
    ("qr", "session_status"),
    ("message", "message_received"),
    ("messages_upsert", "message_received"),
    ("message_new", "message_received"),
    ("reaction", "message_reaction"),
    ("messages_reaction", "message_reaction"),
    ("command", "message_command"),
    ("message_update", "message_edited"),
    ("message_edit", "message_edited"),
    ("message_delete", "message_revoked"),
    ("message_revoke", "message_revoked"),
    ("group_participants_update", "group_participants"),
    ("groups_update", "group_update"),
    ("presence", "presence_update"),
    ("call_offer", "call"),
];

/// Lower-case with `.` and `-` folded to `_`.
pub fn normalize(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| match c {
            '.' | '-' => '_',
            other => other.to_ascii_lowercase(),
        })
        .collect()
}

/// Event name from the header, else `body.event`, else `body.data.event`.
pub fn event_name(headers: &HeaderList, body: &Value) -> Option<String> {
    headers
        .get_non_empty(EVENT_HEADER)
        .map(str::to_string)
        .or_else(|| optional_string_from(body, "event"))
        .or_else(|| {
            body.get("data")
                .and_then(|data| optional_string_from(data, "event"))
        })
        .map(|name| normalize(&name))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    pub index: usize,
    pub channel: &'static str,
    /// False when the event fell back to slot 0.
    pub matched: bool,
}

pub fn route(normalized: &str) -> Route {
    let target = ALIASES
        .iter()
        .find(|(alias, _)| *alias == normalized)
        .map(|(_, channel)| *channel)
        .unwrap_or(normalized);
    match CHANNELS.iter().position(|channel| *channel == target) {
        Some(index) => Route {
            index,
            channel: CHANNELS[index],
            matched: true,
        },
        None => Route {
            index: 0,
            channel: CHANNELS[0],
            matched: false,
        },
    }
}
