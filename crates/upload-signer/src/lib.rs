//! Signed parameters for direct client-to-CDN image uploads.
//!
//! The browser uploads images straight to the image CDN. To authorize an
//! upload it needs a single-use token, an expiry and a signature over both,
//! computed with the account's private key, which only the backend holds.
//!
//! # Example
//!
//! ```no_run
//! use upload_signer::UploadSigner;
//!
//! # fn main() -> upload_signer::Result<()> {
//! let signer = UploadSigner::from_env()?;
//! let params = signer.authentication_parameters()?;
//! println!("{} {} {}", params.token, params.expire, params.signature);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod signer;

pub use config::UploadSignerConfig;
pub use error::{Result, UploadSignerError};
pub use signer::{AuthenticationParameters, UploadSigner};
