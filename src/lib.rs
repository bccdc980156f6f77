mod client;
mod error;
pub mod friendly;
mod observer;
mod transcript;
mod turn;

pub use gemini_live_types as types;
pub use client::{Client, Config, ConfigBuilder, ConnectionStatus, EventRx, Stats};
pub use error::{
    AudioDeviceErrorKind, CloseKind, CloseReason, ConnectionErrorKind, Error, ProtocolErrorKind, Result,
    SessionMedia,
};
pub use observer::{SessionEvent, SessionObserver};
pub use transcript::{TranscriptLog, TranscriptMessage};
pub use turn::{Speaker, TurnProcessor};
