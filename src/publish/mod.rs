//! Social media publishing.
//!
//! Posting a grid is a two-phase provider conversation: upload every
//! tile to the media endpoint, then create one post referencing the
//! returned media ids.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                     GridPublisher                        │
//! │                                                         │
//! │  tiles ──► crop ──► JPEG encode ──► upload_media ──┐    │
//! │    (sequential, row-major, abort on first failure) │    │
//! │                                                    ▼    │
//! │                                   create_post(caption,  │
//! │                                     ordered media ids)  │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! The provider API sits behind the [`PostClient`] trait; [`XApiClient`]
//! is the production implementation and tests substitute mocks.

mod client;
mod publisher;

pub use client::{MediaId, PostClient, PostId, XApiClient, DEFAULT_PROVIDER_TIMEOUT_SECS};
pub use publisher::{GridPublisher, MAX_CAPTION_CHARS, MAX_TILES_PER_POST};
