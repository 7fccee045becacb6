use rstest::rstest;
use std::collections::BTreeSet;

use staff_assign::{
    AffinityGroup, AssignError, CbcEngine, ConflictPair, DistanceEntry, Employee, Instance,
    Objective, Outcome, Settings, Target, assign,
};

/// Build an instance from a row-per-employee distance table. Employee ids
/// are 1.., target numbers are 10, 20, ...
fn instance(
    table: &[&[f64]],
    required: &[u32],
    conflicts: Vec<ConflictPair>,
    affinities: Vec<AffinityGroup>,
) -> Instance {
    let employees = (1..=table.len() as u32)
        .map(|id| Employee::new(id, format!("e{id}")))
        .collect();
    let targets = required
        .iter()
        .enumerate()
        .map(|(t, &req)| Target::new(target_number(t), req))
        .collect();
    let entries = table.iter().enumerate().flat_map(|(e, row)| {
        row.iter()
            .enumerate()
            .map(move |(t, &d)| DistanceEntry::new(e as u32 + 1, target_number(t), d))
    });
    Instance::from_entries(employees, targets, entries, conflicts, affinities).unwrap()
}

fn target_number(position: usize) -> u32 {
    (position as u32 + 1) * 10
}

fn solve(instance: &Instance, objective: Objective) -> Result<Outcome, AssignError> {
    assign(
        instance,
        &Settings::default().with_objective(objective),
        &CbcEngine::new(),
    )
}

/// A deterministic, tie-free table.
fn table(employees: usize, targets: usize) -> Vec<Vec<f64>> {
    (0..employees)
        .map(|e| {
            (0..targets)
                .map(|t| ((e * 7 + t * 13) % 17) as f64 + 0.01 * e as f64 + 0.001 * t as f64 + 1.0)
                .collect()
        })
        .collect()
}

fn rows(table: &[Vec<f64>]) -> Vec<&[f64]> {
    table.iter().map(Vec::as_slice).collect()
}

/// Every feasible assignment, as a target position (or `None`) per employee.
fn feasible_assignments(
    employees: usize,
    required: &[u32],
    conflicts: &[(usize, usize)],
) -> Vec<Vec<Option<usize>>> {
    let choices = required.len() + 1;
    let mut all = Vec::new();
    for code in 0..choices.pow(employees as u32) {
        let mut rest = code;
        let plan: Vec<Option<usize>> = (0..employees)
            .map(|_| {
                let choice = rest % choices;
                rest /= choices;
                (choice < required.len()).then_some(choice)
            })
            .collect();

        let demand_met = required.iter().enumerate().all(|(t, &req)| {
            plan.iter().filter(|&&p| p == Some(t)).count() == req as usize
        });
        let apart = conflicts
            .iter()
            .all(|&(p, q)| plan[p].is_none() || plan[p] != plan[q]);
        if demand_met && apart {
            all.push(plan);
        }
    }
    all
}

fn check_hard_constraints(instance: &Instance, outcome: &Outcome, conflicts: &[ConflictPair]) {
    for target in instance.targets() {
        assert_eq!(
            outcome.employees_at(target.number).len(),
            target.required as usize,
            "target {} headcount",
            target.number
        );
    }
    let placed: BTreeSet<u32> = outcome.placements.iter().map(|p| p.employee).collect();
    assert_eq!(placed.len(), outcome.placements.len(), "someone placed twice");
    for ConflictPair(p, q) in conflicts {
        if let (Some(a), Some(b)) = (outcome.target_of(*p), outcome.target_of(*q)) {
            assert_ne!(a, b, "conflict pair {p}/{q} shares target {a}");
        }
    }
}

#[test]
fn min_distance_picks_the_two_closest() {
    let instance = instance(&[&[5.0], &[3.0], &[10.0]], &[2], vec![], vec![]);

    let outcome = solve(&instance, Objective::MinDistance).unwrap();

    assert_eq!(outcome.employees_at(10), vec![1, 2]);
    assert_eq!(outcome.target_of(3), None);
    assert_eq!(outcome.total_distance, 8.0);
    assert!((outcome.objective_value - 8.0).abs() < 1e-6);
}

#[rstest]
#[case(4, &[1, 1])]
#[case(5, &[2, 1])]
#[case(5, &[1, 1, 2])]
#[case(6, &[2, 2])]
fn min_distance_is_optimal(#[case] employees: usize, #[case] required: &[u32]) {
    let table = table(employees, required.len());
    let conflicts = vec![ConflictPair(1, 2)];
    let instance = instance(&rows(&table), required, conflicts.clone(), vec![]);

    let outcome = solve(&instance, Objective::MinDistance).unwrap();
    check_hard_constraints(&instance, &outcome, &conflicts);

    let best = feasible_assignments(employees, required, &[(0, 1)])
        .into_iter()
        .map(|plan| {
            plan.iter()
                .enumerate()
                .filter_map(|(e, t)| t.map(|t| table[e][t]))
                .sum::<f64>()
        })
        .fold(f64::INFINITY, f64::min);

    assert!(
        (outcome.total_distance - best).abs() < 1e-6,
        "solver {} vs brute force {best}",
        outcome.total_distance
    );
}

#[rstest]
#[case(4, &[1, 1])]
#[case(5, &[2, 1])]
#[case(6, &[1, 2, 1])]
fn balanced_minimises_squared_deviation(#[case] employees: usize, #[case] required: &[u32]) {
    let table = table(employees, required.len());
    let instance = instance(&rows(&table), required, vec![], vec![]);
    let mean = instance.distances().mean();

    let outcome = solve(&instance, Objective::Balanced).unwrap();
    check_hard_constraints(&instance, &outcome, &[]);

    let best = feasible_assignments(employees, required, &[])
        .into_iter()
        .map(|plan| {
            plan.iter()
                .enumerate()
                .filter_map(|(e, t)| t.map(|t| (table[e][t] - mean).powi(2)))
                .sum::<f64>()
        })
        .fold(f64::INFINITY, f64::min);

    assert!((outcome.squared_deviation() - best).abs() < 1e-6);
    assert!((outcome.objective_value - best).abs() < 1e-6);
}

#[test]
fn balanced_trades_total_distance_for_fewer_outliers() {
    let instance = instance(&[&[1.0], &[5.0], &[12.0]], &[1], vec![], vec![]);

    let shortest = solve(&instance, Objective::MinDistance).unwrap();
    let balanced = solve(&instance, Objective::Balanced).unwrap();

    assert_eq!(shortest.target_of(1), Some(10));
    assert_eq!(balanced.target_of(2), Some(10));
    assert!(balanced.total_distance > shortest.total_distance);
    assert_eq!(balanced.mean_distance, 5.0);
}

#[test]
fn conflicting_pair_that_must_share_is_infeasible() {
    let instance = instance(
        &[&[1.0], &[1.0], &[50.0]],
        &[2],
        vec![ConflictPair(1, 2)],
        vec![],
    );
    let settings = Settings::default()
        .with_objective(Objective::MinDistance)
        .with_max_distance(10.0);

    let result = assign(&instance, &settings, &CbcEngine::new());

    assert!(matches!(result, Err(AssignError::Infeasible)));
}

#[rstest]
#[case(Objective::MinDistance)]
#[case(Objective::Balanced)]
#[case(Objective::Social)]
fn conflicts_hold_under_every_objective(#[case] objective: Objective) {
    let table = table(5, 2);
    let conflicts = vec![ConflictPair(1, 2), ConflictPair(3, 4), ConflictPair(2, 5)];
    let instance = instance(&rows(&table), &[2, 2], conflicts.clone(), vec![]);

    let outcome = solve(&instance, objective).unwrap();

    check_hard_constraints(&instance, &outcome, &conflicts);
}

#[test]
fn friends_end_up_together_when_it_costs_nothing() {
    // employees 1 and 2 are equally far from both targets
    let instance = instance(
        &[&[3.0, 3.0], &[3.0, 3.0], &[1.0, 6.0], &[6.0, 1.0]],
        &[2, 2],
        vec![],
        vec![AffinityGroup::new(1, [2])],
    );

    let outcome = solve(&instance, Objective::Social).unwrap();

    assert_eq!(outcome.target_of(1), outcome.target_of(2));
    assert_eq!(outcome.affinity_pairs, 1);
    let reward = Settings::default().reward;
    assert!((outcome.objective_value - (outcome.total_distance - reward)).abs() < 1e-6);
}

#[test]
fn reward_outweighs_a_small_detour() {
    let table: &[&[f64]] = &[&[1.0, 4.0], &[4.0, 1.0], &[2.0, 2.5], &[2.5, 2.0]];
    let without = solve(&instance(table, &[2, 2], vec![], vec![]), Objective::Social).unwrap();
    let with = solve(
        &instance(table, &[2, 2], vec![], vec![AffinityGroup::new(1, [2])]),
        Objective::Social,
    )
    .unwrap();

    assert_ne!(without.target_of(1), without.target_of(2));
    assert_eq!(with.target_of(1), with.target_of(2));
    assert!(with.total_distance > without.total_distance);
}

#[test]
fn conflict_beats_affinity() {
    let instance = instance(
        &[&[1.0, 1.0], &[1.0, 1.0], &[2.0, 2.0], &[2.0, 2.0]],
        &[2, 2],
        vec![ConflictPair(1, 2)],
        vec![AffinityGroup::new(1, [2])],
    );

    let outcome = solve(&instance, Objective::Social).unwrap();

    assert_ne!(outcome.target_of(1), outcome.target_of(2));
    assert_eq!(outcome.affinity_pairs, 0);
}

#[test]
fn unknown_references_do_not_change_the_result() {
    let table = table(5, 2);
    let plain = instance(&rows(&table), &[2, 2], vec![], vec![]);
    let noisy = instance(
        &rows(&table),
        &[2, 2],
        vec![ConflictPair(1, 99), ConflictPair(77, 78)],
        vec![AffinityGroup::new(99, [1, 2]), AffinityGroup::new(3, [42])],
    );

    let expected = solve(&plain, Objective::Social).unwrap();
    let received = solve(&noisy, Objective::Social).unwrap();

    assert_eq!(expected.assignments, received.assignments);
    assert_eq!(expected.total_distance, received.total_distance);
}

#[rstest]
#[case(Objective::MinDistance)]
#[case(Objective::Balanced)]
#[case(Objective::Social)]
fn solving_twice_gives_the_same_answer(#[case] objective: Objective) {
    let table = table(6, 3);
    let instance = instance(
        &rows(&table),
        &[2, 1, 2],
        vec![ConflictPair(2, 3)],
        vec![AffinityGroup::new(1, [4, 5])],
    );

    let first = solve(&instance, objective).unwrap();
    let second = solve(&instance, objective).unwrap();

    assert_eq!(first, second);
}

#[test]
fn more_people_than_needed_leaves_some_unassigned() {
    let table = table(5, 1);
    let instance = instance(&rows(&table), &[2], vec![], vec![]);

    let outcome = solve(&instance, Objective::MinDistance).unwrap();

    assert_eq!(outcome.assignments.len(), 5);
    assert_eq!(outcome.assignments.values().filter(|t| t.is_none()).count(), 3);
}
