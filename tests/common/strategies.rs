//! Proptest strategies for random dependency sets and priorities.

use conductor_core::priority::{Priority, PriorityLevel};
use conductor_core::resolver::ComponentSnapshot;
use proptest::prelude::*;

pub const ALL_LEVELS: [PriorityLevel; 10] = [
    PriorityLevel::Critical,
    PriorityLevel::Infrastructure,
    PriorityLevel::Core,
    PriorityLevel::Service,
    PriorityLevel::Feature,
    PriorityLevel::Extension,
    PriorityLevel::Presentation,
    PriorityLevel::Background,
    PriorityLevel::Monitoring,
    PriorityLevel::Development,
];

/// Arbitrary priority, including out-of-range inputs the builders clamp
pub fn priority_strategy() -> impl Strategy<Value = Priority> {
    (
        prop::sample::select(ALL_LEVELS.to_vec()),
        any::<u8>(),
        -1.0f64..4.0,
        -200i32..200,
        prop::option::of(Just("Production".to_string())),
    )
        .prop_map(|(level, sub, weight, adjustment, context)| {
            let mut priority = Priority::new(level)
                .with_sub_priority(sub)
                .with_weight(weight);
            if let Some(context) = context {
                priority = priority.with_context_adjustment(context, adjustment);
            }
            priority
        })
}

/// Random acyclic dependency sets: component `c{i}` may only depend on
/// components with a smaller index, so the set is a DAG by construction.
pub fn acyclic_components_strategy() -> impl Strategy<Value = Vec<ComponentSnapshot>> {
    (2usize..10).prop_flat_map(|count| {
        prop::collection::vec(prop::collection::vec(any::<bool>(), count), count).prop_map(
            move |matrix| {
                (0..count)
                    .map(|i| ComponentSnapshot {
                        id: format!("c{i}"),
                        name: format!("c{i}"),
                        dependencies: (0..i)
                            .filter(|&j| matrix[i][j])
                            .map(|j| format!("c{j}"))
                            .collect(),
                        priority: Priority::default(),
                        tags: Vec::new(),
                    })
                    .collect()
            },
        )
    })
}

/// True when `from` can reach `to` by following dependency edges
pub fn has_dependency_path(components: &[ComponentSnapshot], from: &str, to: &str) -> bool {
    let mut stack = vec![from.to_string()];
    let mut seen = std::collections::HashSet::new();
    while let Some(current) = stack.pop() {
        if current == to {
            return from != to || !seen.is_empty();
        }
        if !seen.insert(current.clone()) {
            continue;
        }
        if let Some(component) = components.iter().find(|c| c.id == current) {
            stack.extend(component.dependencies.iter().cloned());
        }
    }
    false
}
