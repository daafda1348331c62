//! # LAN Intercom Mixer
//!
//! Low-latency intercom over LAN. Every participant streams its microphone
//! to one server and hears everyone else, minus itself.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │  Client A    │   │  Client B    │   │  Client C    │
//! │ (mic + spk)  │   │ (mic + spk)  │   │ (mic + spk)  │
//! └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!        │ 0x10/0x11        │ 0x10/0x11        │ 0x10/0x11
//!        ▼  /api/audio      ▼                  ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │                  SERVER (server::WebServer)              │
//! │  ┌───────────────────────────────────────────────────┐  │
//! │  │           Audio sessions (one per lane)           │  │
//! │  │   decode ─► mixer.lane_io ─► encode mix-minus     │  │
//! │  └─────────────────────────┬─────────────────────────┘  │
//! │                            ▼                            │
//! │  ┌───────────────────────────────────────────────────┐  │
//! │  │            AudioMixer (mixer::engine)             │  │
//! │  │  Lane 0   Lane 1   Lane 2  ...  Lane 255          │  │
//! │  │  gain ─► store ─► loudness ─► stale/silence gate  │  │
//! │  └─────────────────────────┬─────────────────────────┘  │
//! │                            │ MixerEvent                 │
//! │                            ▼                            │
//! │  ┌───────────────────────────────────────────────────┐  │
//! │  │       Control session (exclusive, /api/mixer)      │  │
//! │  │   0x30 roster, 0x31-0x33 notices, 0x40 loudness   │  │
//! │  │   ◄─ 0x20 gain changes                            │  │
//! │  └───────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod audio;
pub mod codec;
pub mod config;
pub mod error;
pub mod mixer;
pub mod protocol;
pub mod server;

pub use error::{Error, Result};

/// Application-wide constants
pub mod constants {
    /// Sample rate of every lane
    pub const SAMPLE_RATE: u32 = 44_100;

    /// Frame duration in milliseconds
    pub const FRAME_DURATION_MS: u32 = 100;

    /// Samples per frame (mono)
    pub const FRAME_SAMPLES: usize = (SAMPLE_RATE * FRAME_DURATION_MS / 1000) as usize;

    /// Maximum number of concurrent lanes, one byte of lane id
    pub const MAX_LANES: usize = 256;

    /// Gain range in dB
    pub const MAX_GAIN_DB: f32 = 80.0;
    pub const MIN_GAIN_DB: f32 = -80.0;

    /// Loudness range reported to the control client
    pub const MAX_LOUDNESS_DBFS: f32 = 0.0;
    pub const MIN_LOUDNESS_DBFS: f32 = -80.0;

    /// Lanes without input for this long are left out of mixes
    pub const DEFAULT_STALE_AFTER_MS: u64 = 300;

    /// Frames at or under this loudness are sent as silent packets
    pub const DEFAULT_SILENT_PACKET_THRESHOLD_DBFS: f32 = -20.0;

    /// Default HTTP / WebSocket port
    pub const DEFAULT_PORT: u16 = 8000;

    /// Default loudness report period for the control client
    pub const DEFAULT_LOUDNESS_INTERVAL_MS: u64 = 100;
}
