//! Collaborators of the mind map: model settings and calls, outline parsing,
//! local persistence.

pub mod ai;
pub mod outline;
pub mod settings;
pub mod storage;
