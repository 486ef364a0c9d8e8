//! Business logic layer.
//!
//! - `egress` - Egress API client (Twirp over HTTP) and its mock
//! - `tracker` - In-memory active recording tracker
//! - `storage` - Recording files on local disk, with byte-range serving

pub mod egress;
pub mod storage;
pub mod tracker;

pub use egress::{
    EgressClient, EgressError, EgressInfo, EncodedFileOutput, HttpEgressClient, MockEgressCall,
    MockEgressClient,
};
pub use storage::{ByteRange, RecordingStorage, StorageError};
pub use tracker::{ActiveRecording, RecordingTracker};
