//! The two alternating phases of a growth cycle.
//!
//! 1. [`state_phase`] — every node looks up its next state and division
//!    flag from the rule, using cases computed from one consistent
//!    snapshot of the current states.
//! 2. [`division_phase`] — every flagged node is split into a triangle
//!    via [`Graph::divide`].

use rand::Rng;
use tracing::debug;

use crate::{graph::Graph, rule::Rule, types::NodeId};

/// Updates all node states and fills `dividing` with the rule's division flags.
///
/// Cases are first collected into `cases` for every node, and only then
/// are states written, so no update can leak into another node's case.
/// With `flip_prob > 0` each new state is independently inverted with that
/// probability; with `flip_prob == 0` the generator is never touched.
///
/// ### Parameters
/// - `graph` - The graph whose states are rewritten in place.
/// - `rule` - State and division tables.
/// - `flip_prob` - Per-node mutation probability.
/// - `cases` - Scratch buffer, resized to the node count.
/// - `dividing` - Output flags, resized to the node count.
/// - `rng` - Source for mutation trials.
///
/// ### Returns
/// The number of nodes flagged for division.
pub fn state_phase(
    graph: &mut Graph,
    rule: Rule,
    flip_prob: f64,
    cases: &mut Vec<u8>,
    dividing: &mut Vec<bool>,
    rng: &mut impl Rng,
) -> usize {
    let n = graph.len();

    // Read-only pass over the current generation.
    cases.clear();
    cases.extend((0..n).map(|i| graph.case_of(i) as u8));

    dividing.clear();
    dividing.resize(n, false);

    let mut flagged = 0;
    for (i, &case) in cases.iter().enumerate() {
        let case = case as usize;
        let mut state = rule.next_state(case);
        if flip_prob > 0.0 && rng.random::<f64>() < flip_prob {
            state ^= 1;
        }
        graph.nodes[i].state = state;

        if rule.divides(case) {
            dividing[i] = true;
            flagged += 1;
        }
    }

    debug!(nodes = n, dividing = flagged, "state phase");
    flagged
}

/// Divides every node flagged in `dividing` and clears the flags.
///
/// The caller is responsible for advancing the graph's generation before
/// this runs so that new nodes get the new stamp.
///
/// ### Returns
/// Ids of all nodes created, in creation order.
pub fn division_phase(graph: &mut Graph, dividing: &mut [bool]) -> Vec<NodeId> {
    let mut new_ids = Vec::with_capacity(16);

    for i in 0..dividing.len() {
        if !dividing[i] {
            continue;
        }
        let (j, k) = graph.divide(i);
        new_ids.push(j);
        new_ids.push(k);
        dividing[i] = false;
    }

    debug!(
        generation = graph.generation(),
        created = new_ids.len(),
        nodes = graph.len(),
        "division phase"
    );
    new_ids
}
