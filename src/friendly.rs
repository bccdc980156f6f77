//! Turns errors and raw error strings into sentences fit for end users.
//!
//! Lookup order: exact code, exact name, exact message, then a case-insensitive
//! substring scan over a fixed vocabulary. Every table is a closed list compared with
//! `==`, so only the keys written here can ever match.

use crate::error::{CloseKind, CloseReason, Error};

const GENERIC: &str = "Something went wrong";

const BY_CODE: &[(&str, &str)] = &[
    ("ALREADY_CONNECTED", "A session is already running. End it before starting a new one."),
    ("MISSING_API_KEY", "No API key is set. Add your key in settings and try again."),
    ("CONNECTION_FAILED", "Couldn't reach the service. Check your internet connection and try again."),
    ("SETUP_FAILED", "The session couldn't be started. Please try again."),
    ("SOCKET_ERROR", "The connection to the service was interrupted."),
    ("SEND_FAILED", "The connection dropped while sending. Please reconnect."),
    ("CONNECTION_CANCELLED", "The connection was cancelled."),
    ("NOT_CONNECTED", "You're not connected. Start a session first."),
    ("ENCODE_FAILED", "A message couldn't be prepared for sending."),
    ("AUDIO_PERMISSION_DENIED", "Microphone access was denied. Allow microphone access and try again."),
    ("AUDIO_DEVICE_NOT_FOUND", "No microphone was found. Connect one and try again."),
    ("AUDIO_DEVICE_BUSY", "The microphone is being used by another application."),
    ("AUDIO_DEVICE_ERROR", "There was a problem with your audio device."),
    ("SESSION_TIMEOUT", "The session reached its 15 minute limit. Start a new session to continue."),
    ("SESSION_TIMEOUT_VIDEO", "Sessions with video are limited to 2 minutes. Start a new session to continue."),
];

const BY_NAME: &[(&str, &str)] = &[
    ("ConnectionError", "There was a problem connecting to the service."),
    ("AudioDeviceError", "There was a problem with your audio device."),
    ("SessionTimeoutError", "The session timed out. Start a new session to continue."),
    ("ProtocolError", "The service and the app disagreed about the conversation. Please reconnect."),
    ("NotAllowedError", "Microphone access was denied. Allow microphone access and try again."),
    ("NotFoundError", "No microphone was found. Connect one and try again."),
    ("NotReadableError", "The microphone is being used by another application."),
    ("TimeoutError", "The request timed out. Please try again."),
    ("NetworkError", "Couldn't reach the service. Check your internet connection and try again."),
];

const BY_MESSAGE: &[(&str, &str)] = &[
    ("connection lost", "The connection to the service was lost."),
    ("not connected yet", "You're not connected. Start a session first."),
    ("socket is closed", "The connection dropped while sending. Please reconnect."),
    ("already connected", "A session is already running. End it before starting a new one."),
];

/// Lower-case fragments of technical messages, checked in order.
const BY_SUBSTRING: &[(&str, &str)] = &[
    ("api key not valid", "The API key was rejected. Check your key in settings."),
    ("api_key_invalid", "The API key was rejected. Check your key in settings."),
    ("permission", "Permission was denied. Check your account and device permissions."),
    ("quota", "You've reached your usage quota. Wait a while or check your plan."),
    ("resource_exhausted", "You've reached your usage quota. Wait a while or check your plan."),
    ("rate limit", "Too many requests. Wait a moment and try again."),
    ("not found", "The requested model isn't available. Check the model name in settings."),
    ("timed out", "The request timed out. Please try again."),
    ("timeout", "The request timed out. Please try again."),
    ("dns", "Couldn't find the service. Check your internet connection."),
    ("certificate", "A secure connection couldn't be established."),
    ("tls", "A secure connection couldn't be established."),
    ("connection refused", "Couldn't reach the service. Check your internet connection and try again."),
    ("connection reset", "The connection to the service was interrupted."),
    ("network", "Couldn't reach the service. Check your internet connection and try again."),
    ("websocket", "The connection to the service was interrupted."),
];

fn exact(table: &[(&str, &'static str)], key: &str) -> Option<&'static str> {
    table.iter().find(|(k, _)| *k == key).map(|(_, message)| *message)
}

fn contains(raw: &str) -> Option<&'static str> {
    let lower = raw.to_lowercase();
    BY_SUBSTRING
        .iter()
        .find(|(fragment, _)| lower.contains(fragment))
        .map(|(_, message)| *message)
}

fn fallback(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        format!("{GENERIC}.")
    } else {
        format!("{GENERIC}: {raw}")
    }
}

/// Resolves from whichever identifying parts are available.
pub fn resolve(code: Option<&str>, name: Option<&str>, message: &str) -> String {
    code.and_then(|code| exact(BY_CODE, code))
        .or_else(|| name.and_then(|name| exact(BY_NAME, name)))
        .or_else(|| exact(BY_MESSAGE, message))
        .or_else(|| contains(message))
        .map(str::to_string)
        .unwrap_or_else(|| fallback(message))
}

pub fn describe(error: &Error) -> String {
    resolve(Some(error.code()), Some(error.name()), &error.to_string())
}

/// For bare strings: tried as a code, then a name, then a message.
pub fn describe_raw(raw: &str) -> String {
    let key = raw.trim();
    resolve(Some(key), Some(key), key)
}

pub fn describe_close(reason: &CloseReason) -> String {
    match reason.kind {
        CloseKind::Normal => "The session ended.".to_string(),
        CloseKind::GoingAway => "The service ended the session. Start a new one to continue.".to_string(),
        CloseKind::Abnormal => "The connection to the service was lost.".to_string(),
        CloseKind::InvalidPayload => {
            "The service rejected the session settings. Check the model and voice in settings.".to_string()
        }
        CloseKind::PolicyViolation | CloseKind::ServerError | CloseKind::Other => {
            if let Some(message) = contains(&reason.reason) {
                message.to_string()
            } else if reason.reason.trim().is_empty() {
                format!("The connection closed unexpectedly (code {}).", reason.code)
            } else {
                format!("The connection closed: {} (code {})", reason.reason.trim(), reason.code)
            }
        }
    }
}
