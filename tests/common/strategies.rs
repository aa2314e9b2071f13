use proptest::prelude::*;
use runtime_control::pipeline::StepPoint;
use runtime_control::registry::{Priority, SelectionStrategy};

/// Operator commands against the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlOp {
    Pause,
    Resume,
    SingleStep,
}

/// Outcome reports and admin actions against one circuit breaker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerOp {
    Success,
    Failure,
    ForceOpen,
    IsAvailable,
}

pub fn control_op_strategy() -> impl Strategy<Value = ControlOp> {
    prop_oneof![
        1 => Just(ControlOp::Pause),
        1 => Just(ControlOp::Resume),
        3 => Just(ControlOp::SingleStep),
    ]
}

pub fn control_ops_strategy() -> impl Strategy<Value = Vec<ControlOp>> {
    prop::collection::vec(control_op_strategy(), 0..30)
}

pub fn step_point_strategy() -> impl Strategy<Value = StepPoint> {
    prop::sample::select(StepPoint::ALL.to_vec())
}

pub fn breaker_ops_strategy() -> impl Strategy<Value = Vec<BreakerOp>> {
    prop::collection::vec(
        prop_oneof![
            1 => Just(BreakerOp::Success),
            3 => Just(BreakerOp::Failure),
            1 => Just(BreakerOp::ForceOpen),
            1 => Just(BreakerOp::IsAvailable),
        ],
        0..40,
    )
}

pub fn priority_strategy() -> impl Strategy<Value = Priority> {
    prop::sample::select(Priority::ALL.to_vec())
}

pub fn selection_strategy_strategy() -> impl Strategy<Value = SelectionStrategy> {
    prop_oneof![
        Just(SelectionStrategy::Fallback),
        Just(SelectionStrategy::RoundRobin)
    ]
}

/// Provider names that are unique within the generated set
pub fn provider_names_strategy(max: usize) -> impl Strategy<Value = Vec<String>> {
    prop::collection::hash_set("[a-z][a-z0-9_]{2,12}", 1..=max)
        .prop_map(|names| names.into_iter().collect())
}
