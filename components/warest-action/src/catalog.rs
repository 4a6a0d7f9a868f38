//! Every `resource:operation` pair the action node exposes.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use warest_common::WarestError;

use crate::descriptor::{Builder, FieldTarget, OperationDescriptor as Op, Preprocess};
use crate::options::OptionsLayout;

const SEND: &[&str] = &["sessionId", "to"];
const MESSAGE_OPTION_GROUPS: &[&str] = &["messageOptions", "quoted", "mentions"];

pub static OPERATIONS: &[Op] = &[
    // server
    Op::get("server", "getInfo", "/api/v1/server/info"),
    Op::get("server", "healthz", "/api/v1/server/healthz"),
    Op::get("server", "metrics", "/api/v1/server/metrics"),
    // session
    Op::get("session", "list", "/api/v1/session"),
    Op::post("session", "create", "/api/v1/session").body(&["sessionId"]),
    Op::get("session", "get", "/api/v1/session/{sessionId}").path_params(&["sessionId"]),
    Op::get("session", "getQr", "/api/v1/session/{sessionId}/qr")
        .path_params(&["sessionId"])
        .query(&["format"]),
    Op::post(
        "session",
        "pairCode",
        "/api/v1/session/{sessionId}/pair-code",
    )
    .path_params(&["sessionId"])
    .body(&["phone"]),
    Op::post(
        "session",
        "reconnect",
        "/api/v1/session/{sessionId}/reconnect",
    )
    .path_params(&["sessionId"]),
    Op::post("session", "logout", "/api/v1/session/{sessionId}/logout").path_params(&["sessionId"]),
    Op::delete("session", "delete", "/api/v1/session/{sessionId}").path_params(&["sessionId"]),
    Op::get("session", "getConfig", "/api/v1/session/{sessionId}/config")
        .path_params(&["sessionId"]),
    Op::post(
        "session",
        "updateConfig",
        "/api/v1/session/{sessionId}/config",
    )
    .path_params(&["sessionId"])
    .body(&["webhookUrl", "webhookSecret", "metadata"])
    .preprocess(Preprocess::JsonObject("metadata")),
    // messages
    Op::post("messages", "sendText", "/api/v1/messages/send/text")
        .body(&["sessionId", "to", "message"]),
    Op::post("messages", "sendImage", "/api/v1/messages/send/image")
        .body(&["sessionId", "to", "caption"])
        .media("image", "image/jpeg"),
    Op::post("messages", "sendVideo", "/api/v1/messages/send/video")
        .body(&["sessionId", "to", "caption"])
        .media("video", "video/mp4"),
    Op::post("messages", "sendAudio", "/api/v1/messages/send/audio")
        .body(&["sessionId", "to", "ptt"])
        .media("audio", "audio/mpeg"),
    Op::post("messages", "sendDocument", "/api/v1/messages/send/document")
        .body(&["sessionId", "to", "caption", "fileName"])
        .media_with_file_name("document", "application/octet-stream", "fileName"),
    Op::post("messages", "sendSticker", "/api/v1/messages/send/sticker")
        .body(SEND)
        .media("sticker", "image/webp"),
    Op::post("messages", "sendFiles", "/api/v1/messages/send/files")
        .body(&["sessionId", "to", "caption"])
        .builder(Builder::Files),
    Op::post("messages", "sendLocation", "/api/v1/messages/send/location")
        .body(SEND)
        .builder(Builder::Location),
    Op::post("messages", "sendContact", "/api/v1/messages/send/contact")
        .body(SEND)
        .builder(Builder::Contact),
    Op::post("messages", "sendButton", "/api/v1/messages/send/button")
        .body(&["sessionId", "to", "message", "footer"])
        .builder(Builder::Buttons),
    Op::post("messages", "sendList", "/api/v1/messages/send/list")
        .body(&["sessionId", "to", "message", "footer"])
        .builder(Builder::List),
    Op::post("messages", "sendPoll", "/api/v1/messages/send/poll")
        .body(SEND)
        .builder(Builder::Poll),
    Op::post("messages", "sendPresence", "/api/v1/messages/send/presence")
        .body(&["sessionId", "to", "presence"]),
    // chats
    Op::get("chats", "list", "/api/v1/chats").query(&["sessionId"]),
    Op::get("chats", "get", "/api/v1/chats/{chatId}")
        .path_params(&["chatId"])
        .query(&["sessionId"]),
    Op::get("chats", "messages", "/api/v1/chats/{chatId}/messages")
        .path_params(&["chatId"])
        .query(&["sessionId", "limit", "cursor"]),
    Op::post("chats", "markRead", "/api/v1/chats/{chatId}/read")
        .path_params(&["chatId"])
        .body(&["sessionId"]),
    Op::post("chats", "markUnread", "/api/v1/chats/{chatId}/unread")
        .path_params(&["chatId"])
        .body(&["sessionId"]),
    Op::post("chats", "archive", "/api/v1/chats/{chatId}/archive")
        .path_params(&["chatId"])
        .body(&["sessionId", "archive"]),
    Op::post("chats", "pin", "/api/v1/chats/{chatId}/pin")
        .path_params(&["chatId"])
        .body(&["sessionId", "pin"]),
    Op::post("chats", "mute", "/api/v1/chats/{chatId}/mute")
        .path_params(&["chatId"])
        .body(&["sessionId", "duration"]),
    Op::post("chats", "clear", "/api/v1/chats/{chatId}/clear")
        .path_params(&["chatId"])
        .body(&["sessionId"]),
    Op::delete("chats", "delete", "/api/v1/chats/{chatId}")
        .path_params(&["chatId"])
        .query(&["sessionId"]),
    // message actions
    Op::post(
        "messageActions",
        "react",
        "/api/v1/messages/{messageId}/react",
    )
    .path_params(&["messageId"])
    .body(&["sessionId", "chatId", "emoji"]),
    Op::post(
        "messageActions",
        "edit",
        "/api/v1/messages/{messageId}/edit",
    )
    .path_params(&["messageId"])
    .body(&["sessionId", "chatId", "message"]),
    Op::delete("messageActions", "revoke", "/api/v1/messages/{messageId}")
        .path_params(&["messageId"])
        .query(&["sessionId", "chatId", "forEveryone"]),
    Op::post(
        "messageActions",
        "forward",
        "/api/v1/messages/{messageId}/forward",
    )
    .path_params(&["messageId"])
    .body(&["sessionId", "chatId", "to"]),
    Op::post(
        "messageActions",
        "star",
        "/api/v1/messages/{messageId}/star",
    )
    .path_params(&["messageId"])
    .body(&["sessionId", "chatId", "star"]),
    Op::post("messageActions", "pin", "/api/v1/messages/{messageId}/pin")
        .path_params(&["messageId"])
        .body(&["sessionId", "chatId", "duration"]),
    Op::post(
        "messageActions",
        "markRead",
        "/api/v1/messages/{messageId}/read",
    )
    .path_params(&["messageId"])
    .body(&["sessionId", "chatId"]),
    Op::get(
        "messageActions",
        "downloadMedia",
        "/api/v1/messages/{messageId}/media",
    )
    .path_params(&["messageId"])
    .query(&["sessionId", "chatId"]),
    // groups
    Op::get("groups", "list", "/api/v1/groups").query(&["sessionId"]),
    Op::post("groups", "create", "/api/v1/groups")
        .body(&["sessionId", "subject"])
        .builder(Builder::Participants),
    Op::get("groups", "get", "/api/v1/groups/{groupId}")
        .path_params(&["groupId"])
        .query(&["sessionId"]),
    Op::post(
        "groups",
        "updateSubject",
        "/api/v1/groups/{groupId}/subject",
    )
    .path_params(&["groupId"])
    .body(&["sessionId", "subject"]),
    Op::post(
        "groups",
        "updateDescription",
        "/api/v1/groups/{groupId}/description",
    )
    .path_params(&["groupId"])
    .body(&["sessionId", "description"]),
    Op::post(
        "groups",
        "updateSettings",
        "/api/v1/groups/{groupId}/settings",
    )
    .path_params(&["groupId"])
    .body(&["sessionId", "announce", "locked"])
    .options_to(FieldTarget::Body),
    Op::post(
        "groups",
        "addParticipants",
        "/api/v1/groups/{groupId}/participants/add",
    )
    .path_params(&["groupId"])
    .body(&["sessionId"])
    .builder(Builder::Participants),
    Op::post(
        "groups",
        "removeParticipants",
        "/api/v1/groups/{groupId}/participants/remove",
    )
    .path_params(&["groupId"])
    .body(&["sessionId"])
    .builder(Builder::Participants),
    Op::post(
        "groups",
        "promoteParticipants",
        "/api/v1/groups/{groupId}/participants/promote",
    )
    .path_params(&["groupId"])
    .body(&["sessionId"])
    .builder(Builder::Participants),
    Op::post(
        "groups",
        "demoteParticipants",
        "/api/v1/groups/{groupId}/participants/demote",
    )
    .path_params(&["groupId"])
    .body(&["sessionId"])
    .builder(Builder::Participants),
    Op::get(
        "groups",
        "inviteCode",
        "/api/v1/groups/{groupId}/invite-code",
    )
    .path_params(&["groupId"])
    .query(&["sessionId"]),
    Op::post(
        "groups",
        "revokeInvite",
        "/api/v1/groups/{groupId}/invite-code/revoke",
    )
    .path_params(&["groupId"])
    .body(&["sessionId"]),
    Op::post("groups", "join", "/api/v1/groups/join").body(&["sessionId", "inviteCode"]),
    Op::get("groups", "inviteInfo", "/api/v1/groups/invite/{inviteCode}")
        .path_params(&["inviteCode"])
        .query(&["sessionId"]),
    Op::post("groups", "leave", "/api/v1/groups/{groupId}/leave")
        .path_params(&["groupId"])
        .body(&["sessionId"]),
    Op::post("groups", "setPicture", "/api/v1/groups/{groupId}/picture")
        .path_params(&["groupId"])
        .body(&["sessionId"])
        .media("image", "image/jpeg"),
    Op::get(
        "groups",
        "listRequests",
        "/api/v1/groups/{groupId}/requests",
    )
    .path_params(&["groupId"])
    .query(&["sessionId"]),
    Op::post(
        "groups",
        "approveRequests",
        "/api/v1/groups/{groupId}/requests/approve",
    )
    .path_params(&["groupId"])
    .body(&["sessionId"])
    .builder(Builder::Participants),
    Op::post(
        "groups",
        "rejectRequests",
        "/api/v1/groups/{groupId}/requests/reject",
    )
    .path_params(&["groupId"])
    .body(&["sessionId"])
    .builder(Builder::Participants),
    // profile
    Op::get("profile", "get", "/api/v1/profile").query(&["sessionId"]),
    Op::post("profile", "updateName", "/api/v1/profile/name").body(&["sessionId", "name"]),
    Op::post("profile", "updateStatus", "/api/v1/profile/status").body(&["sessionId", "status"]),
    Op::post("profile", "updatePicture", "/api/v1/profile/picture")
        .body(&["sessionId"])
        .media("image", "image/jpeg"),
    Op::delete("profile", "removePicture", "/api/v1/profile/picture").query(&["sessionId"]),
    Op::get("profile", "getPrivacy", "/api/v1/profile/privacy").query(&["sessionId"]),
    Op::post("profile", "updatePrivacy", "/api/v1/profile/privacy")
        .body(&["sessionId"])
        .options_to(FieldTarget::Body),
    Op::get("profile", "listBlocked", "/api/v1/profile/blocklist").query(&["sessionId"]),
    Op::post("profile", "block", "/api/v1/profile/block").body(&["sessionId", "jid"]),
    Op::post("profile", "unblock", "/api/v1/profile/unblock").body(&["sessionId", "jid"]),
    // misc
    Op::get("misc", "checkNumber", "/api/v1/misc/check-number").query(&["sessionId", "phone"]),
    Op::post("misc", "checkNumbers", "/api/v1/misc/check-numbers")
        .body(&["sessionId", "phones"])
        .preprocess(Preprocess::PhoneList),
    Op::get("misc", "profilePicture", "/api/v1/misc/profile-picture").query(&["sessionId", "jid"]),
    Op::get("misc", "businessProfile", "/api/v1/misc/business-profile")
        .query(&["sessionId", "jid"]),
    Op::post(
        "misc",
        "subscribePresence",
        "/api/v1/misc/presence/subscribe",
    )
    .body(&["sessionId", "jid"]),
    Op::post("misc", "decryptMedia", "/api/v1/misc/media/decrypt")
        .body(&["sessionId", "url", "mediaKey", "mediaType", "outputFormat"])
        .preprocess(Preprocess::DecryptMediaOutput),
];

static INDEX: Lazy<BTreeMap<String, &'static Op>> =
    Lazy::new(|| OPERATIONS.iter().map(|op| (op.key(), op)).collect());

/// Resolve the descriptor for `resource:operation`.
pub fn lookup(resource: &str, operation: &str) -> Result<&'static Op, WarestError> {
    INDEX
        .get(&crate::descriptor::operation_key(resource, operation))
        .copied()
        .ok_or_else(|| WarestError::unsupported(resource, operation))
}

pub fn resources() -> Vec<&'static str> {
    let mut out: Vec<&'static str> = Vec::new();
    for op in OPERATIONS {
        if !out.contains(&op.resource) {
            out.push(op.resource);
        }
    }
    out
}

/// Options bag layout for each resource family.
pub fn options_layout(resource: &str) -> OptionsLayout {
    match resource {
        "session" => OptionsLayout::new("sessionOptions", &["webhook", "behavior"]),
        "messages" => OptionsLayout::new("additionalFields", MESSAGE_OPTION_GROUPS),
        "chats" => OptionsLayout::new("chatOptions", &["pagination", "filters"]),
        "messageActions" => OptionsLayout::new("actionOptions", &["options"]),
        "groups" => OptionsLayout::new("groupOptions", &["settings", "pagination"]),
        "profile" => OptionsLayout::new("profileOptions", &["privacy"]),
        "misc" => OptionsLayout::new("miscOptions", &["options"]),
        _ => OptionsLayout::new("options", &[]),
    }
}
