//! Domain models for TaskFlow.
//!
//! # Core Concepts
//!
//! - [`Project`]: top-level container identified by a short uppercase key
//!   (e.g. `DEMO`). Owns tasks and sprints.
//! - [`Task`]: a unit of work, partitioned by [`TaskStatus`] on the kanban
//!   board. Belongs to a project, optionally to a sprint and an assignee.
//! - [`Sprint`]: a time-boxed iteration over a subset of a project's tasks.
//!   At most one sprint per project is active at a time.
//! - [`User`]: a person tasks can be assigned to.
//!
//! Foreign keys are plain ids and are not validated at write time: a task may
//! reference a sprint that no longer exists, and every reader tolerates that
//! by filtering dangling references out.

mod project;
mod sprint;
mod task;
mod user;

pub use project::*;
pub use sprint::*;
pub use task::*;
pub use user::*;

use serde::{Deserialize, Deserializer};

/// Deserializer for patch fields that distinguish "absent" from "null".
///
/// With `#[serde(default, deserialize_with = "double_option")]` a missing
/// field stays `None` (leave the value alone) while an explicit `null`
/// becomes `Some(None)` (clear the value).
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}
