// SPDX-FileCopyrightText: 2026 Chatline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator traits at the seams of the pipeline.
//!
//! The pipeline runs on a host control thread and one dedicated worker
//! thread, so these traits are synchronous; implementations provide their
//! own internal synchronization.

pub mod host;
pub mod input;
pub mod relay;
pub mod store;
pub mod view;

pub use host::HostClient;
pub use input::ChatInput;
pub use relay::RelaySink;
pub use store::MessageStore;
pub use view::ViewProvider;
