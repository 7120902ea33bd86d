//! Connectivity region growing.
//!
//! Pure flood fill over the element graph, ignoring features. Used when the
//! user has cut edges by hand: growth then stops at the cut.

use hashbrown::HashSet;

use crate::error::{GrowError, GrowResult};
use crate::graph::ElementGraph;

/// Grow each seed group to everything reachable from it.
///
/// Groups are filled independently, so two groups on the same connected
/// piece produce the same set.
///
/// # Errors
///
/// Returns [`GrowError::NoSeeds`] if a group is empty, or
/// [`GrowError::SeedOutOfMask`] if a seed is not an element of `graph`.
///
/// # Example
///
/// ```
/// use roi_grow::{ElementGraph, connectivity_grow};
///
/// let mut graph = ElementGraph::from_edges(5, &[(0, 1), (1, 2), (2, 3), (3, 4)]).unwrap();
/// graph.remove_edge(2, 3);
///
/// let grown = connectivity_grow(&[vec![0]], &graph).unwrap();
/// assert_eq!(grown[0].len(), 3);
/// ```
pub fn connectivity_grow(
    seeds: &[Vec<usize>],
    graph: &ElementGraph,
) -> GrowResult<Vec<HashSet<usize>>> {
    seeds
        .iter()
        .map(|group| flood_fill(group, graph))
        .collect()
}

fn flood_fill(group: &[usize], graph: &ElementGraph) -> GrowResult<HashSet<usize>> {
    if group.is_empty() {
        return Err(GrowError::NoSeeds);
    }
    if let Some(&element) = group.iter().find(|&&e| e >= graph.element_count()) {
        return Err(GrowError::SeedOutOfMask { element });
    }

    let mut grown: HashSet<usize> = group.iter().copied().collect();
    let mut frontier: Vec<usize> = grown.iter().copied().collect();

    while !frontier.is_empty() {
        let mut next = Vec::new();
        for element in frontier {
            for &neighbor in graph.neighbors(element) {
                if grown.insert(neighbor) {
                    next.push(neighbor);
                }
            }
        }
        frontier = next;
    }

    Ok(grown)
}
