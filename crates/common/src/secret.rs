//! Secret types for protecting sensitive values from accidental logging.
//!
//! Re-exports from the [`secrecy`] crate. Use `SecretString` for the LiveKit
//! API secret and any minted bearer tokens held in memory: `Debug` output is
//! redacted, so structs that derive `Debug` (configs, request contexts) can be
//! traced without leaking credentials, and the value is zeroized on drop.
//!
//! Reading the actual value requires an explicit [`ExposeSecret::expose_secret`]
//! call, which keeps every use of the raw secret greppable.
//!
//! # Example
//!
//! ```rust
//! use common::secret::{ExposeSecret, SecretString};
//!
//! #[derive(Debug)]
//! struct ApiCredentials {
//!     api_key: String,
//!     api_secret: SecretString,
//! }
//!
//! let creds = ApiCredentials {
//!     api_key: "devkey".to_string(),
//!     api_secret: SecretString::from("devsecret"),
//! };
//!
//! // Safe: the secret renders as [REDACTED]
//! let debug = format!("{:?}", creds);
//! assert!(!debug.contains("devsecret"));
//!
//! // Explicit access for signing
//! let raw: &str = creds.api_secret.expose_secret();
//! assert_eq!(raw, "devsecret");
//! ```

pub use secrecy::{ExposeSecret, SecretBox, SecretString};
