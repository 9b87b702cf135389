//! Stateful property testing for feed merging.
//!
//! The reference model is a plain `Vec` of ids with explicit dedup. The
//! system under test is a real `FeedView` fed through `FeedMerger`. After
//! every transition the two must agree on:
//!
//! - the id list, in order, with no duplicates
//! - the next page number and the `has_more` flag
//! - every listed id being readable from the cache

mod common;

use std::collections::HashSet;

use common::{MockBackend, page_json, store_with};
use flock_api::FeedPage;
use flock_store::{EntityId, FeedSource, FeedView, MergeOptions, MergeOutcome, Store};
use proptest::prelude::*;
use proptest_state_machine::{ReferenceStateMachine, StateMachineTest, prop_state_machine};

/// Operations a screen can perform on its feed.
#[derive(Debug, Clone)]
pub enum FeedOperation {
    /// Merge a page; ids are drawn from a small pool to force overlap.
    Merge {
        ids: Vec<u8>,
        has_more: bool,
        reset: bool,
    },
    /// Put a freshly published post on top.
    Prepend { id: u8 },
}

/// Reference model for a feed view.
#[derive(Clone, Debug)]
pub struct FeedModel {
    pub ids: Vec<String>,
    pub page: u32,
    pub has_more: bool,
}

impl Default for FeedModel {
    fn default() -> Self {
        Self {
            ids: Vec::new(),
            page: 1,
            has_more: true,
        }
    }
}

fn id_name(n: u8) -> String {
    format!("p{}", n)
}

impl ReferenceStateMachine for FeedModel {
    type State = Self;
    type Transition = FeedOperation;

    fn init_state() -> BoxedStrategy<Self::State> {
        Just(Self::default()).boxed()
    }

    fn transitions(_state: &Self::State) -> BoxedStrategy<Self::Transition> {
        prop_oneof![
            4 => (prop::collection::vec(0u8..40, 0..15), any::<bool>(), prop::bool::weighted(0.2))
                .prop_map(|(ids, has_more, reset)| FeedOperation::Merge { ids, has_more, reset }),
            1 => (40u8..60).prop_map(|id| FeedOperation::Prepend { id }),
        ]
        .boxed()
    }

    fn apply(mut state: Self::State, transition: &Self::Transition) -> Self::State {
        match transition {
            FeedOperation::Merge {
                ids,
                has_more,
                reset,
            } => {
                if *reset {
                    state.ids.clear();
                    state.page = 2;
                } else {
                    state.page += 1;
                }
                for id in ids.iter().copied().map(id_name) {
                    if !state.ids.contains(&id) {
                        state.ids.push(id);
                    }
                }
                state.has_more = *has_more;
            }
            FeedOperation::Prepend { id } => {
                let id = id_name(*id);
                if !state.ids.contains(&id) {
                    state.ids.insert(0, id);
                }
            }
        }
        state
    }
}

/// Test harness wrapping a real store and feed view.
pub struct FeedTestHarness {
    store: Store,
    feed: FeedView,
}

impl FeedTestHarness {
    fn new() -> Self {
        let backend = MockBackend::new();
        Self {
            store: store_with(&backend),
            feed: FeedView::for_source(FeedSource::ForYou),
        }
    }

    fn apply_operation(&self, op: &FeedOperation) {
        match op {
            FeedOperation::Merge {
                ids,
                has_more,
                reset,
            } => {
                let names: Vec<String> = ids.iter().copied().map(id_name).collect();
                let page: FeedPage =
                    serde_json::from_value(page_json(&names, *has_more)).expect("valid page");
                let options = if *reset {
                    MergeOptions::reset()
                } else {
                    MergeOptions::append()
                };
                let outcome = self.store.feeds().merge_page(&self.feed, page, options);
                assert!(matches!(outcome, MergeOutcome::Merged(_)));
            }
            FeedOperation::Prepend { id } => {
                let entity = flock_store::Entity::post(id_name(*id));
                let entity = self.store.cache().upsert(entity);
                self.feed.prepend(entity.id.clone());
            }
        }
    }

    fn verify_invariants(&self, model: &FeedModel) {
        let ids = self.feed.ids();

        // Invariant 1: list matches model, in order
        let expected: Vec<EntityId> = model.ids.iter().cloned().map(EntityId::from).collect();
        assert_eq!(ids, expected, "id list mismatch");

        // Invariant 2: no duplicates
        let unique: HashSet<_> = ids.iter().collect();
        assert_eq!(unique.len(), ids.len(), "duplicate ids in feed");

        // Invariant 3: pagination state matches model
        assert_eq!(self.feed.page(), model.page, "page mismatch");
        assert_eq!(self.feed.has_more(), model.has_more, "has_more mismatch");
        assert!(!self.feed.is_loading(), "feed left loading");

        // Invariant 4: every listed id resolves through the cache
        assert_eq!(self.feed.entities(self.store.cache()).len(), ids.len());
    }
}

impl StateMachineTest for FeedTestHarness {
    type SystemUnderTest = Self;
    type Reference = FeedModel;

    fn init_test(
        _ref_state: &<Self::Reference as ReferenceStateMachine>::State,
    ) -> Self::SystemUnderTest {
        Self::new()
    }

    fn apply(
        state: Self::SystemUnderTest,
        ref_state: &<Self::Reference as ReferenceStateMachine>::State,
        transition: <Self::Reference as ReferenceStateMachine>::Transition,
    ) -> Self::SystemUnderTest {
        state.apply_operation(&transition);
        state.verify_invariants(ref_state);
        state
    }

    fn check_invariants(
        state: &Self::SystemUnderTest,
        ref_state: &<Self::Reference as ReferenceStateMachine>::State,
    ) {
        state.verify_invariants(ref_state);
    }
}

prop_state_machine! {
    #![proptest_config(ProptestConfig {
        cases: 100,
        max_shrink_iters: 10000,
        ..ProptestConfig::default()
    })]

    #[test]
    fn feed_state_machine_test(sequential 1..40 => FeedTestHarness);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn append_is_set_union(
        first in prop::collection::vec(0u8..30, 0..20),
        second in prop::collection::vec(0u8..30, 0..20),
    ) {
        let harness = FeedTestHarness::new();
        for ids in [&first, &second, &second] {
            harness.apply_operation(&FeedOperation::Merge {
                ids: ids.clone(),
                has_more: true,
                reset: false,
            });
        }

        let expected: HashSet<String> = first.iter().chain(second.iter()).copied().map(id_name).collect();
        let actual: HashSet<String> = harness.feed.ids().iter().map(|id| id.to_string()).collect();
        prop_assert_eq!(actual, expected);
        prop_assert_eq!(harness.feed.len(), harness.feed.ids().len());
    }
}
