mod common;

use common::*;
use proptest::prelude::*;
use runtime_control::pipeline::{PipelineError, StepPoint};
use runtime_control::registry::{
    PriorityUpdate, ProviderRegistration, SelectionStrategy, ServiceSelectionRegistry, ServiceType,
};
use runtime_control::resilience::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

proptest! {
    /// Property: the round counter moves exactly once per accepted single-step
    /// and a rejected single-step leaves the pipeline untouched
    #[test]
    fn round_counts_accepted_ticks_only(ops in control_ops_strategy()) {
        let rt = runtime();
        let processor = Arc::new(ScriptedStageProcessor::new());
        let controller = controller_with(processor);
        controller.track_thought(thought_at("t1", StepPoint::GatherContext)).unwrap();

        let mut accepted = 0u64;
        for op in ops {
            match op {
                ControlOp::Pause => {
                    controller.pause();
                }
                ControlOp::Resume => {
                    let before = controller.current_round();
                    controller.resume();
                    prop_assert_eq!(controller.current_round(), before);
                }
                ControlOp::SingleStep => {
                    let before = controller.get_current_state();
                    match rt.block_on(controller.single_step()) {
                        Ok(outcome) => {
                            accepted += 1;
                            prop_assert_eq!(outcome.round_number, accepted);
                        }
                        Err(e) => {
                            prop_assert_eq!(e, PipelineError::NotPaused);
                            prop_assert_eq!(controller.get_current_state(), before);
                        }
                    }
                }
            }
            prop_assert_eq!(controller.current_round(), accepted);
        }
    }

    /// Property: a thought only ever moves one step forward, or back to action
    /// selection after a failed conscience check
    #[test]
    fn steps_never_regress(
        start in step_point_strategy(),
        rejects_conscience in any::<bool>(),
        failing_ticks in prop::collection::vec(any::<bool>(), 1..15),
    ) {
        let rt = runtime();
        let processor = Arc::new(ScriptedStageProcessor::new());
        if rejects_conscience {
            processor.reject_conscience("t1");
        }
        let controller = controller_with(processor.clone());
        controller.track_thought(thought_at("t1", start)).unwrap();
        controller.pause();

        let mut current = Some(start);
        for fail in failing_ticks {
            if fail {
                processor.fail_thought("t1");
            } else {
                processor.recover("t1");
            }
            rt.block_on(controller.single_step()).unwrap();

            let state = controller.get_current_state();
            prop_assert!(state.check_invariants().is_ok());
            let next = state.find_thought("t1").map(|t| t.current_step);
            match (current, next) {
                (Some(from), Some(to)) if from != to => {
                    prop_assert!(from.can_transition_to(to), "{} -> {}", from, to);
                }
                (Some(from), None) => prop_assert_eq!(from, StepPoint::ActionComplete),
                (None, Some(_)) => prop_assert!(false, "completed thought reappeared"),
                _ => {}
            }
            current = next;
        }
    }

    /// Property: reset always yields a closed breaker with no consecutive failures
    #[test]
    fn reset_always_closes(threshold in 1u32..6, ops in breaker_ops_strategy()) {
        let breaker = CircuitBreaker::new(
            "prop",
            CircuitBreakerConfig::new(threshold, Duration::from_secs(60)),
        );
        for op in ops {
            match op {
                BreakerOp::Success => breaker.report_success(),
                BreakerOp::Failure => breaker.report_failure(),
                BreakerOp::ForceOpen => breaker.force_open(),
                BreakerOp::IsAvailable => {
                    breaker.is_available();
                }
            }
            if breaker.state() == CircuitState::Open {
                prop_assert!(breaker.opened_at().is_some());
            }
        }
        breaker.reset();
        prop_assert_eq!(breaker.state(), CircuitState::Closed);
        prop_assert_eq!(breaker.consecutive_failures(), 0);
        prop_assert!(breaker.is_available());
    }

    /// Property: round-robin over healthy providers visits each once per cycle
    #[test]
    fn round_robin_is_uniform(names in provider_names_strategy(6), cycles in 1usize..4) {
        let registry = ServiceSelectionRegistry::default();
        for name in &names {
            registry
                .register(
                    ProviderRegistration::new(name.clone(), ServiceType::Tool)
                        .with_strategy(SelectionStrategy::RoundRobin),
                )
                .unwrap();
        }

        for _ in 0..cycles {
            let mut seen: HashMap<String, usize> = HashMap::new();
            for _ in 0..names.len() {
                let provider = registry.select(ServiceType::Tool).into_provider().unwrap();
                *seen.entry(provider.name().to_string()).or_default() += 1;
            }
            prop_assert_eq!(seen.len(), names.len());
            prop_assert!(seen.values().all(|count| *count == 1));
        }
    }

    /// Property: updating an unknown provider changes nothing
    #[test]
    fn unknown_priority_update_is_inert(
        names in provider_names_strategy(4),
        priority in priority_strategy(),
        strategy in selection_strategy_strategy(),
    ) {
        let registry = ServiceSelectionRegistry::default();
        for name in &names {
            registry
                .register(ProviderRegistration::new(name.clone(), ServiceType::Memory))
                .unwrap();
        }
        let before = registry.explain_selection();

        let result = registry.update_priority(
            "not_registered_anywhere",
            PriorityUpdate { priority, priority_group: Some(3), strategy: Some(strategy) },
        );
        prop_assert!(result.is_err());
        prop_assert_eq!(registry.explain_selection(), before);
    }
}
