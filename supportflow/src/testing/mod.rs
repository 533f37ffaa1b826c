//! Testing utilities for supportflow pipelines.
//!
//! This module provides:
//! - Mock ability handlers
//! - Request and workflow fixtures
//! - Assertions over the trace log

mod assertions;
mod fixtures;
mod mocks;

pub use assertions::{
    assert_ability_not_run, assert_ability_outcome, assert_ability_run, assert_run_bookends,
    assert_stage_order, assert_stage_skipped,
};
pub use fixtures::{
    sample_request, support_workflow, SHIPPED_WORKFLOW_PATH, SUPPORT_WORKFLOW_YAML,
};
pub use mocks::{
    FailingAbility, PanickingAbility, RecordedCall, RecordingAbility, SlowAbility, StaticAbility,
};
