mod common;

use common::{default_penalties, plan};
use planforge::{
    anneal_search, beam_search, best_first_search, dag_search, AnnealConfig, BeamConfig,
    BestFirstConfig, CancelFlag, CostTerm, DagConfig, PlanDocument, SearchContext, SearchProgress,
    SearchReport, SearchStatus,
};

fn keep_going(_: &SearchProgress) -> bool {
    true
}

fn term_cost(report: &SearchReport, term: CostTerm) -> f64 {
    report
        .best
        .cost
        .breakdown
        .iter()
        .filter(|i| i.term == term)
        .map(|i| i.cost)
        .sum()
}

fn run_all_strategies(p: &PlanDocument) -> Vec<(&'static str, SearchReport)> {
    let cancel = CancelFlag::new();
    let ctx = SearchContext::new(&cancel, &keep_going);
    let penalties = default_penalties();

    vec![
        (
            "bestFirst",
            best_first_search(p, &penalties, &BestFirstConfig::default(), &ctx).unwrap(),
        ),
        (
            "beam",
            beam_search(p, &penalties, &BeamConfig::default(), &ctx).unwrap(),
        ),
        (
            "anneal",
            anneal_search(
                p,
                &penalties,
                &AnnealConfig {
                    seed: Some(42),
                    max_iterations: 3_000,
                    ..AnnealConfig::default()
                },
                &ctx,
            )
            .unwrap(),
        ),
        (
            "dag",
            dag_search(p, &penalties, &DagConfig::default(), &ctx).unwrap(),
        ),
    ]
}

// One song needing 8 points, one session offering 8: every strategy should
// land on a single 8-point cell with balanced songs and segments.
#[test]
fn test_single_song_single_session_exact_fit() {
    let p = plan(&[("intro", 8)], &[("mon", 8)]);

    for (name, report) in run_all_strategies(&p) {
        println!(
            "{}: cost={:.2} cells={:?}",
            name, report.best.cost.total_cost, report.best.plan.cells
        );
        let live: Vec<_> = report
            .best
            .plan
            .cells
            .iter()
            .filter(|c| c.points_allocated > 0)
            .collect();
        assert_eq!(live.len(), 1, "{}: expected one allocation", name);
        assert_eq!(live[0].points_allocated, 8, "{}", name);
        assert!(live[0].auto_filled, "{}", name);

        assert_eq!(term_cost(&report, CostTerm::UnderRehearsedSong), 0.0);
        assert_eq!(term_cost(&report, CostTerm::OverRehearsedSong), 0.0);
        assert_eq!(term_cost(&report, CostTerm::UnderAllocatedSegment), 0.0);
        assert_eq!(term_cost(&report, CostTerm::OverAllocatedSegment), 0.0);
        assert!(report.best.is_goal(), "{}: expected a goal state", name);
    }
}

// Two songs wanting 5 each but only 5 points of capacity: demand exceeds
// supply, so someone stays under-rehearsed and the total stays within the
// segment budget.
#[test]
fn test_oversubscribed_segment() {
    let p = plan(&[("alpha", 5), ("beta", 5)], &[("mon", 5)]);

    for (name, report) in run_all_strategies(&p) {
        let total: u32 = report
            .best
            .plan
            .cells
            .iter()
            .map(|c| c.points_allocated)
            .sum();
        assert!(total <= 5, "{}: allocated {} of 5 available", name, total);
        assert!(
            term_cost(&report, CostTerm::UnderRehearsedSong) > 0.0,
            "{}: 10 points of demand cannot fit in 5",
            name
        );
    }
}

#[test]
fn test_best_first_converges_to_goal() {
    let p = plan(&[("intro", 8), ("closer", 5)], &[("mon", 8), ("tue", 5)]);
    let cancel = CancelFlag::new();
    let ctx = SearchContext::new(&cancel, &keep_going);

    let report =
        best_first_search(&p, &default_penalties(), &BestFirstConfig::default(), &ctx).unwrap();
    assert_eq!(report.status, SearchStatus::Converged);
    assert!(report.best.is_goal());
    assert!(report.iterations > 0);
}

// The admission rule: a popped state never costs less than the neighbor it
// admitted, so the best cost can only improve as the queue drains.
#[test]
fn test_best_first_never_worsens() {
    let p = plan(
        &[("intro", 8), ("ballad", 13), ("closer", 5)],
        &[("mon", 10), ("tue", 10), ("wed", 10)],
    );
    let cancel = CancelFlag::new();
    let ctx = SearchContext::new(&cancel, &keep_going);
    let penalties = default_penalties();

    let initial_cost = {
        let stats = planforge::PlanStats::calculate(&p);
        planforge::calculate_cost(&p, &stats, &penalties).total_cost
    };
    let report = best_first_search(&p, &penalties, &BestFirstConfig::default(), &ctx).unwrap();
    assert!(report.best.total_cost() <= initial_cost);
}

#[test]
fn test_best_first_iteration_limit() {
    let p = plan(
        &[("a", 13), ("b", 13), ("c", 13), ("d", 13)],
        &[("s1", 15), ("s2", 15), ("s3", 15), ("s4", 15)],
    );
    let cancel = CancelFlag::new();
    let ctx = SearchContext::new(&cancel, &keep_going);
    let config = BestFirstConfig {
        stop_at_goal: false,
        max_iterations: Some(5),
        ..BestFirstConfig::default()
    };

    let report = best_first_search(&p, &default_penalties(), &config, &ctx).unwrap();
    assert_eq!(report.status, SearchStatus::IterationLimitReached);
    assert_eq!(report.iterations, 6); // limit observed on the iteration after
}

#[test]
fn test_beam_respects_max_depth() {
    let p = plan(
        &[("a", 21), ("b", 21)],
        &[("s1", 8), ("s2", 8), ("s3", 8), ("s4", 8), ("s5", 8)],
    );
    let cancel = CancelFlag::new();
    let ctx = SearchContext::new(&cancel, &keep_going);
    let config = BeamConfig {
        max_depth: Some(3),
        ..BeamConfig::default()
    };

    let report = beam_search(&p, &default_penalties(), &config, &ctx).unwrap();
    assert_eq!(report.status, SearchStatus::IterationLimitReached);
    assert_eq!(report.depth, 3);
}

#[test]
fn test_beam_finds_goal_on_small_plan() {
    let p = plan(&[("intro", 8), ("closer", 5)], &[("mon", 13)]);
    let cancel = CancelFlag::new();
    let ctx = SearchContext::new(&cancel, &keep_going);

    let report = beam_search(&p, &default_penalties(), &BeamConfig::default(), &ctx).unwrap();
    assert_eq!(report.status, SearchStatus::Converged);
    assert!(report.best.is_goal());
}

#[test]
fn test_dag_reconstructs_cheapest_goal() {
    let p = plan(&[("intro", 8)], &[("mon", 8)]);
    let cancel = CancelFlag::new();
    let ctx = SearchContext::new(&cancel, &keep_going);

    let report = dag_search(&p, &default_penalties(), &DagConfig::default(), &ctx).unwrap();
    assert_eq!(report.status, SearchStatus::Converged);
    assert!(report.best.is_goal());
    assert_eq!(report.best.plan.cells.len(), 1);
    assert_eq!(report.best.plan.cells[0].points_allocated, 8);
}

#[test]
fn test_dag_respects_node_budget() {
    let p = plan(
        &[("a", 13), ("b", 13), ("c", 13)],
        &[("s1", 10), ("s2", 10), ("s3", 10)],
    );
    let cancel = CancelFlag::new();
    let ctx = SearchContext::new(&cancel, &keep_going);
    let config = DagConfig {
        max_nodes: 50,
        ..DagConfig::default()
    };

    // Must terminate quickly and still hand back a usable state.
    let report = dag_search(&p, &default_penalties(), &config, &ctx).unwrap();
    assert!(report.best.total_cost().is_finite());
}

#[test]
fn test_degenerate_inputs_terminate_immediately() {
    for p in [
        plan(&[], &[]),
        plan(&[], &[("mon", 10)]),
        plan(&[("intro", 8)], &[]),
    ] {
        for (name, report) in run_all_strategies(&p) {
            assert_eq!(
                report.best.state_id, "",
                "{}: best should be the initial state",
                name
            );
            assert_ne!(report.status, SearchStatus::Cancelled, "{}", name);
        }
    }
}

#[test]
fn test_strategies_do_not_mutate_caller_plan() {
    let p = plan(&[("intro", 8)], &[("mon", 8)]);
    let snapshot = p.clone();
    let _ = run_all_strategies(&p);
    assert_eq!(p, snapshot);
}

#[test]
fn test_malformed_plan_is_a_precondition_failure() {
    let mut p = plan(&[("intro", 8)], &[("mon", 8)]);
    p.cells.push(planforge::Cell {
        row_id: "ghost".to_string(),
        column_id: "mon".to_string(),
        points_allocated: 1,
        auto_filled: false,
    });

    let cancel = CancelFlag::new();
    let ctx = SearchContext::new(&cancel, &keep_going);
    let result = best_first_search(&p, &default_penalties(), &BestFirstConfig::default(), &ctx);
    assert!(matches!(result, Err(planforge::PlanError::Integrity(_))));
}
