use std::cell::Cell;
use std::error::Error as _;
use std::collections::BTreeMap;

use ad_select_core::content::AdvertisementContent;
use ad_select_core::selection::AdSelector;
use ad_select_core::store::{
    ContentStore, InMemoryContentStore, InMemoryTargetingStore, StoreError, TargetingStore,
};
use ad_select_core::targeting::{
    EvaluationError, EvaluatorFactory, RequestContext, TargetingEvaluator, TargetingGroup,
    TargetingPredicateResult,
};
use ad_select_core::types::{ContentId, EmptyReason, MarketplaceId, SelectionError};

use TargetingPredicateResult::{False, Indeterminate, True};

fn make_content(id: &str, marketplace: &str, body: &str) -> AdvertisementContent {
    AdvertisementContent::ingest(id, marketplace, body.as_bytes().to_vec()).unwrap()
}

fn make_group(id: &str, content_id: &str, ctr: f64) -> TargetingGroup {
    TargetingGroup::new(id, content_id, ctr, Vec::new())
}

#[derive(Clone, Default)]
struct Scripted(BTreeMap<String, TargetingPredicateResult>);

impl Scripted {
    fn from_pairs(pairs: &[(&str, TargetingPredicateResult)]) -> Self {
        Scripted(pairs.iter().map(|(id, r)| (id.to_string(), *r)).collect())
    }
}

impl TargetingEvaluator for Scripted {
    fn evaluate(&self, group: &TargetingGroup) -> Result<TargetingPredicateResult, EvaluationError> {
        self.0
            .get(group.targeting_group_id.as_str())
            .copied()
            .ok_or_else(|| EvaluationError::Failed {
                group: group.targeting_group_id.to_string(),
                message: "no scripted answer".to_string(),
            })
    }
}

impl EvaluatorFactory for Scripted {
    type Evaluator = Scripted;

    fn bind(&self, _context: RequestContext) -> Scripted {
        self.clone()
    }
}

/// Counts reads so tests can assert which stores were touched.
#[derive(Default)]
struct CountingStore {
    reads: Cell<usize>,
}

impl ContentStore for CountingStore {
    fn get(&self, _marketplace_id: &MarketplaceId) -> Result<Vec<AdvertisementContent>, StoreError> {
        self.reads.set(self.reads.get() + 1);
        Ok(vec![make_content("A1", "US", "a1")])
    }
}

impl TargetingStore for CountingStore {
    fn get(&self, content_id: &ContentId) -> Result<Vec<TargetingGroup>, StoreError> {
        self.reads.set(self.reads.get() + 1);
        Ok(vec![make_group("g1", content_id.as_str(), 0.5)])
    }
}

struct FailingStore;

impl ContentStore for FailingStore {
    fn get(&self, _marketplace_id: &MarketplaceId) -> Result<Vec<AdvertisementContent>, StoreError> {
        Err(StoreError::unavailable("content backend timed out"))
    }
}

impl TargetingStore for FailingStore {
    fn get(&self, _content_id: &ContentId) -> Result<Vec<TargetingGroup>, StoreError> {
        Err(StoreError::unavailable_with(
            "targeting backend timed out",
            std::io::Error::new(std::io::ErrorKind::TimedOut, "read timed out"),
        ))
    }
}

#[test]
fn missing_marketplace_never_touches_stores() {
    let contents = CountingStore::default();
    let targeting = CountingStore::default();
    let selector = AdSelector::with_evaluators(&contents, &targeting, Scripted::default());

    for customer in [None, Some(""), Some("customer-1")] {
        for marketplace in [None, Some("")] {
            let ad = selector.select_advertisement(customer, marketplace).unwrap();
            assert!(ad.is_empty(), "customer {customer:?} / marketplace {marketplace:?}");
        }
    }

    assert_eq!(contents.reads.get(), 0);
    assert_eq!(targeting.reads.get(), 0);
}

#[test]
fn duplicate_content_ids_are_queried_once() {
    let contents: InMemoryContentStore = vec![
        make_content("A1", "US", "first"),
        make_content("A1", "US", "second"),
    ]
    .into_iter()
    .collect();
    let targeting = CountingStore::default();
    let selector =
        AdSelector::with_evaluators(contents, &targeting, Scripted::from_pairs(&[("g1", True)]));

    let report = selector.select_with_report(None, Some("US")).unwrap();

    assert_eq!(targeting.reads.get(), 1);
    assert_eq!(report.selection.contents_considered, 2);
    assert_eq!(report.selection.distinct_content_ids, 1);
    // First match in the candidate list wins
    assert_eq!(report.advertisement.content().unwrap().renderable_content, "first");
}

#[test]
fn chosen_group_has_maximal_ctr_among_true_groups() {
    let ctrs = [0.12, 0.87, 0.33, 0.87, 0.05, 0.64];
    let contents: InMemoryContentStore = (0..ctrs.len())
        .map(|i| make_content(&format!("C{i}"), "US", &format!("body {i}")))
        .collect();
    let targeting: InMemoryTargetingStore = ctrs
        .iter()
        .enumerate()
        .map(|(i, ctr)| make_group(&format!("g{i}"), &format!("C{i}"), *ctr))
        .collect();
    let answers = [True, False, True, Indeterminate, True, True];
    let scripted = Scripted(
        answers
            .iter()
            .enumerate()
            .map(|(i, r)| (format!("g{i}"), *r))
            .collect(),
    );
    let selector = AdSelector::with_evaluators(contents, targeting, scripted);

    let report = selector.select_with_report(Some("c"), Some("US")).unwrap();
    let winning_ctr = report.selection.winning_click_through_rate.unwrap();

    let max_true = ctrs
        .iter()
        .zip(answers)
        .filter(|(_, r)| *r == True)
        .map(|(ctr, _)| *ctr)
        .fold(f64::MIN, f64::max);
    assert_eq!(winning_ctr, max_true);
    assert_eq!(report.advertisement.content_id().unwrap().as_str(), "C5");
    assert_eq!(report.selection.eligible_groups, 4);
}

#[test]
fn non_true_groups_are_never_chosen() {
    let contents: InMemoryContentStore = vec![
        make_content("A1", "US", "a1"),
        make_content("A2", "US", "a2"),
        make_content("A3", "US", "a3"),
    ]
    .into_iter()
    .collect();
    let targeting: InMemoryTargetingStore = vec![
        make_group("false", "A1", 0.99),
        make_group("unknown", "A2", 0.95),
        make_group("true", "A3", 0.01),
    ]
    .into_iter()
    .collect();
    let scripted = Scripted::from_pairs(&[("false", False), ("unknown", Indeterminate), ("true", True)]);
    let selector = AdSelector::with_evaluators(contents, targeting, scripted);

    let ad = selector.select_advertisement(Some("c"), Some("US")).unwrap();

    assert_eq!(ad.content_id().unwrap().as_str(), "A3");
}

#[test]
fn equal_ctr_tie_goes_to_first_retrieved() {
    let contents: InMemoryContentStore = vec![
        make_content("Z9", "US", "z9"),
        make_content("A1", "US", "a1"),
    ]
    .into_iter()
    .collect();
    let targeting: InMemoryTargetingStore = vec![
        make_group("a1-first", "A1", 0.5),
        make_group("z9-only", "Z9", 0.5),
        make_group("a1-second", "A1", 0.5),
    ]
    .into_iter()
    .collect();
    let scripted = Scripted::from_pairs(&[("a1-first", True), ("z9-only", True), ("a1-second", True)]);
    let selector = AdSelector::with_evaluators(contents, targeting, scripted);

    // Content order is Z9 then A1, so Z9's group is encountered first
    for _ in 0..5 {
        let report = selector.select_with_report(Some("c"), Some("US")).unwrap();
        assert_eq!(report.advertisement.content_id().unwrap().as_str(), "Z9");
        assert_eq!(
            report.selection.winning_targeting_group_id.unwrap().as_str(),
            "z9-only"
        );
    }
}

#[test]
fn same_content_tie_follows_store_order() {
    let contents: InMemoryContentStore = vec![make_content("A1", "US", "a1")].into_iter().collect();
    let targeting: InMemoryTargetingStore = vec![
        make_group("second-listed", "A1", 0.2),
        make_group("first-max", "A1", 0.7),
        make_group("later-max", "A1", 0.7),
    ]
    .into_iter()
    .collect();
    let scripted = Scripted::from_pairs(&[
        ("second-listed", True),
        ("first-max", True),
        ("later-max", True),
    ]);
    let selector = AdSelector::with_evaluators(contents, targeting, scripted);

    let report = selector.select_with_report(None, Some("US")).unwrap();

    assert_eq!(
        report.selection.winning_targeting_group_id.unwrap().as_str(),
        "first-max"
    );
}

#[test]
fn repeated_calls_are_idempotent() {
    let contents: InMemoryContentStore = vec![
        make_content("A1", "US", "a1"),
        make_content("A2", "US", "a2"),
    ]
    .into_iter()
    .collect();
    let targeting: InMemoryTargetingStore =
        vec![make_group("g1", "A1", 0.4), make_group("g2", "A2", 0.4)]
            .into_iter()
            .collect();
    let selector = AdSelector::with_evaluators(
        contents,
        targeting,
        Scripted::from_pairs(&[("g1", True), ("g2", True)]),
    );

    let first = selector.select_with_report(Some("c"), Some("US")).unwrap();
    for _ in 0..10 {
        let again = selector.select_with_report(Some("c"), Some("US")).unwrap();
        assert_eq!(again, first);
    }
}

#[test]
fn dangling_winner_yields_empty() {
    let contents: InMemoryContentStore = vec![make_content("A1", "US", "a1")].into_iter().collect();
    // Store returns a group for A1 whose content id points elsewhere
    let targeting = DanglingTargeting;
    let selector =
        AdSelector::with_evaluators(contents, targeting, Scripted::from_pairs(&[("stale", True)]));

    let report = selector.select_with_report(Some("c"), Some("US")).unwrap();

    assert!(report.advertisement.is_empty());
    assert_eq!(report.selection.empty_reason, Some(EmptyReason::DanglingContent));
    assert_eq!(
        report.selection.winning_targeting_group_id.unwrap().as_str(),
        "stale"
    );
}

struct DanglingTargeting;

impl TargetingStore for DanglingTargeting {
    fn get(&self, _content_id: &ContentId) -> Result<Vec<TargetingGroup>, StoreError> {
        Ok(vec![make_group("stale", "REMOVED", 0.9)])
    }
}

#[test]
fn eligible_groups_with_unusable_ctr_are_skipped() {
    let contents: InMemoryContentStore = vec![
        make_content("A1", "US", "a1"),
        make_content("A2", "US", "a2"),
    ]
    .into_iter()
    .collect();
    let targeting: InMemoryTargetingStore = vec![
        make_group("nan", "A1", f64::NAN),
        make_group("inf", "A1", f64::INFINITY),
        make_group("negative", "A1", -1.0),
        make_group("ok", "A2", 0.1),
    ]
    .into_iter()
    .collect();
    let scripted = Scripted::from_pairs(&[
        ("nan", True),
        ("inf", True),
        ("negative", True),
        ("ok", True),
    ]);
    let selector = AdSelector::with_evaluators(contents, targeting, scripted);

    let report = selector.select_with_report(None, Some("US")).unwrap();

    assert_eq!(report.advertisement.content_id().unwrap().as_str(), "A2");
    assert_eq!(report.selection.eligible_groups, 1);
}

#[test]
fn store_failures_propagate() {
    let selector = AdSelector::with_evaluators(FailingStore, InMemoryTargetingStore::new(), Scripted::default());
    let err = selector.select_advertisement(Some("c"), Some("US")).unwrap_err();
    assert!(matches!(err, SelectionError::Store(StoreError::Unavailable { .. })));

    let contents: InMemoryContentStore = vec![make_content("A1", "US", "a1")].into_iter().collect();
    let selector = AdSelector::with_evaluators(contents, FailingStore, Scripted::default());
    let err = selector.select_advertisement(Some("c"), Some("US")).unwrap_err();
    assert!(err.to_string().contains("targeting backend timed out"));
    let store_error = std::error::Error::source(&err).unwrap();
    let source = store_error.source();
    assert_eq!(source.map(|e| e.to_string()), Some("read timed out".to_string()));
}

#[test]
fn evaluator_failures_propagate() {
    let contents: InMemoryContentStore = vec![make_content("A1", "US", "a1")].into_iter().collect();
    let targeting: InMemoryTargetingStore = vec![make_group("unscripted", "A1", 0.5)].into_iter().collect();
    let selector = AdSelector::with_evaluators(contents, targeting, Scripted::default());

    let err = selector.select_advertisement(Some("c"), Some("US")).unwrap_err();

    assert!(matches!(err, SelectionError::Evaluation(EvaluationError::Failed { .. })));
}
