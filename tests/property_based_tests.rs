mod common;

use common::strategies::*;
use conductor_core::priority::MAX_RANK;
use conductor_core::resolver::DependencyResolver;
use proptest::prelude::*;

proptest! {
    /// Property: effective rank is idempotent and always within [0, 999]
    #[test]
    fn effective_rank_is_clamped_and_stable(priority in priority_strategy(), use_context in any::<bool>()) {
        let context = if use_context { Some("Production") } else { None };
        let first = priority.effective_rank(context);
        let second = priority.effective_rank(context);
        prop_assert_eq!(first, second);
        prop_assert!(first <= MAX_RANK);
    }

    /// Property: for acyclic sets resolution terminates and places every
    /// component after all of its dependencies
    #[test]
    fn resolution_places_dependencies_first(components in acyclic_components_strategy()) {
        let order = DependencyResolver::new().resolve_order(&components).unwrap();
        prop_assert_eq!(order.len(), components.len());

        for component in &components {
            let own = order.iter().position(|id| id == &component.id).unwrap();
            for dependency in &component.dependencies {
                let dep = order.iter().position(|id| id == dependency).unwrap();
                prop_assert!(
                    dep < own,
                    "{} resolved before its dependency {}",
                    component.id,
                    dependency
                );
            }
        }
    }

    /// Property: components sharing a level have no dependency path between
    /// them in either direction
    #[test]
    fn same_level_components_are_independent(components in acyclic_components_strategy()) {
        let levels = DependencyResolver::new().resolve_levels(&components).unwrap();

        for level in &levels {
            for a in level {
                for b in level {
                    if a != b {
                        prop_assert!(
                            !has_dependency_path(&components, a, b),
                            "{a} and {b} share a level but {a} depends on {b}"
                        );
                    }
                }
            }
        }
    }

    /// Property: every component lands on exactly one level, and each
    /// component's level is strictly greater than its dependencies'
    #[test]
    fn levels_partition_and_respect_depth(components in acyclic_components_strategy()) {
        let levels = DependencyResolver::new().resolve_levels(&components).unwrap();

        let total: usize = levels.iter().map(Vec::len).sum();
        prop_assert_eq!(total, components.len());

        let level_of = |id: &str| -> usize {
            levels.iter().position(|level| level.iter().any(|l| l == id)).unwrap()
        };
        for component in &components {
            for dependency in &component.dependencies {
                prop_assert!(level_of(dependency) < level_of(&component.id));
            }
        }
    }

    /// Property: teardown order is exactly the forward order reversed
    #[test]
    fn reverse_order_mirrors_forward_order(components in acyclic_components_strategy()) {
        let order = DependencyResolver::new().resolve_order(&components).unwrap();
        let reversed = DependencyResolver::reverse_order(&order);
        let mut expected = order.clone();
        expected.reverse();
        prop_assert_eq!(reversed, expected);
    }
}
