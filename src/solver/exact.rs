use super::Grid;
use good_lp::variable;
use good_lp::{
    Expression, ProblemVariables, Solution, SolverModel, Variable, constraint, default_solver,
};
use itertools::Itertools;
use log::{info, trace};
use std::hash::Hash;
use std::time::{Duration, Instant};

/// Places as many of `pending` as possible with the HiGHS ILP solver.
///
/// x_ac = 1 if assignment a sits in cell c. Maximises the number of placed
/// assignments; a small per-cell penalty makes earlier cells win ties.
/// Returns (assignment, cell) pairs; the caller re-checks each one.
pub(super) fn solve_exact(
    grid: &Grid<'_>,
    pending: &[usize],
    time_budget: Duration,
) -> Result<Vec<(usize, usize)>, String> {
    let start_time = Instant::now();
    let cell_count = grid.cell_count();

    // pre-filter; handles blocked slots implicitly
    let candidates: Vec<(usize, usize)> = pending
        .iter()
        .flat_map(|&a| (0..cell_count).map(move |c| (a, c)))
        .filter(|&(a, c)| !grid.is_blocked(a, c))
        .collect();
    trace!(
        "Generated {} placement variables out of a theoretical maximum of {}.",
        candidates.len(),
        pending.len() * cell_count
    );
    if candidates.is_empty() {
        return Ok(Vec::new());
    }

    let mut problem = ProblemVariables::new();
    let vars = problem.add_vector(variable().binary(), candidates.len());
    let pairs: Vec<((usize, usize), Variable)> =
        candidates.iter().copied().zip(vars.iter().copied()).collect();

    // total tie-break penalty stays below one placement
    let epsilon = 1.0 / ((candidates.len() * cell_count + 1) as f64);
    let objective: Expression = pairs
        .iter()
        .map(|&((_, c), var)| (1.0 - epsilon * c as f64) * var)
        .sum();

    let mut model = problem
        .maximise(objective)
        .using(default_solver)
        .set_option("threads", 1) // limit to 1 thread for reproducibility
        .set_option("random_seed", 1234)
        .set_option("time_limit", time_budget.as_secs_f64().max(0.001))
        .set_option("log_to_console", "false");

    // each assignment at most once
    for (a, vars) in group_sorted(pairs.iter().map(|&((a, _), v)| (a, v))) {
        let placed: Expression = vars.into_iter().sum();
        trace!("Assignment {} is constrained to one cell.", a);
        model.add_constraint(constraint!(placed <= 1));
    }

    // no teacher double-booking
    let by_teacher = pairs
        .iter()
        .map(|&((a, c), v)| ((grid.assignment(a).teacher_id.as_str(), c), v));
    for (_, vars) in group_sorted(by_teacher) {
        let busy: Expression = vars.into_iter().sum();
        model.add_constraint(constraint!(busy <= 1));
    }

    // class capacity per cell
    let by_class = pairs
        .iter()
        .map(|&((a, c), v)| ((grid.assignment(a).class_id.as_str(), c), v));
    for ((class_id, _), vars) in group_sorted(by_class) {
        let load: Expression = vars.into_iter().sum();
        let capacity = grid.class_capacity(class_id) as f64;
        model.add_constraint(constraint!(load <= capacity));
    }

    info!("Starting ILP solver...");
    let solution = model
        .solve()
        .map_err(|e| format!("No solution found. Solver error: {}", e))?;
    info!("ILP solution found in {:.2?}", start_time.elapsed());

    Ok(pairs
        .iter()
        .filter(|(_, var)| solution.value(*var) > 0.9)
        .map(|&(key, _)| key)
        .collect())
}

/// Groups by key and yields the groups in key order, so the model is built
/// the same way on every run.
fn group_sorted<K, V, I>(pairs: I) -> impl Iterator<Item = (K, Vec<V>)>
where
    K: Ord + Hash + Eq,
    I: Iterator<Item = (K, V)>,
{
    pairs.into_group_map().into_iter().sorted_by(|a, b| a.0.cmp(&b.0))
}
