//! Element adjacency graph.
//!
//! The graph is built by the caller (usually the 1-ring vertex adjacency of a
//! surface or the face/edge connectivity of a voxel grid) and handed to the
//! partition builder and to connectivity growing.

use std::collections::VecDeque;

use hashbrown::HashSet;

use crate::error::{GrowError, GrowResult};

/// Undirected adjacency between elements (vertices or voxels).
///
/// Neighbor lists are kept sorted and free of duplicates and self loops.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementGraph {
    /// For each element, the sorted list of adjacent element indices.
    adjacent: Vec<Vec<usize>>,
}

impl ElementGraph {
    /// Create a graph of `element_count` isolated elements.
    #[must_use]
    pub fn new(element_count: usize) -> Self {
        Self {
            adjacent: vec![Vec::new(); element_count],
        }
    }

    /// Build a graph from per-element neighbor lists.
    ///
    /// Lists are symmetrized, so an edge listed on only one side is still
    /// treated as undirected.
    ///
    /// # Errors
    ///
    /// Returns [`GrowError::TypeInvalid`] if a neighbor index is out of range.
    ///
    /// # Example
    ///
    /// ```
    /// use roi_grow::ElementGraph;
    ///
    /// let graph = ElementGraph::from_neighbor_lists(vec![vec![1], vec![2], vec![]]).unwrap();
    /// assert!(graph.are_adjacent(2, 1));
    /// assert_eq!(graph.edge_count(), 2);
    /// ```
    pub fn from_neighbor_lists(lists: Vec<Vec<usize>>) -> GrowResult<Self> {
        let mut graph = Self::new(lists.len());
        for (element, neighbors) in lists.into_iter().enumerate() {
            for neighbor in neighbors {
                graph.add_edge(element, neighbor)?;
            }
        }
        Ok(graph)
    }

    /// Build a graph from an explicit edge list.
    ///
    /// # Errors
    ///
    /// Returns [`GrowError::TypeInvalid`] if an edge references an element
    /// outside `0..element_count`.
    pub fn from_edges(element_count: usize, edges: &[(usize, usize)]) -> GrowResult<Self> {
        let mut graph = Self::new(element_count);
        for &(a, b) in edges {
            graph.add_edge(a, b)?;
        }
        Ok(graph)
    }

    /// Number of elements.
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.adjacent.len()
    }

    /// Check if the graph has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.adjacent.is_empty()
    }

    /// Neighbors of an element.
    ///
    /// Returns an empty slice if the element index is out of bounds.
    #[must_use]
    pub fn neighbors(&self, element: usize) -> &[usize] {
        self.adjacent.get(element).map_or(&[], Vec::as_slice)
    }

    /// Number of undirected edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.adjacent.iter().map(Vec::len).sum::<usize>() / 2
    }

    /// Check if two elements share an edge.
    #[must_use]
    pub fn are_adjacent(&self, a: usize, b: usize) -> bool {
        self.adjacent
            .get(a)
            .is_some_and(|list| list.binary_search(&b).is_ok())
    }

    /// Add an undirected edge. Self loops are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`GrowError::TypeInvalid`] if either endpoint is out of range.
    pub fn add_edge(&mut self, a: usize, b: usize) -> GrowResult<()> {
        let count = self.adjacent.len();
        if a >= count || b >= count {
            return Err(GrowError::invalid(format!(
                "edge ({a}, {b}) references an element outside 0..{count}"
            )));
        }
        if a == b {
            return Ok(());
        }
        insert_sorted(&mut self.adjacent[a], b);
        insert_sorted(&mut self.adjacent[b], a);
        Ok(())
    }

    /// Sever the edge between two elements.
    ///
    /// This is how a hand-drawn cut bounds connectivity growing. Returns
    /// `true` if the edge existed.
    pub fn remove_edge(&mut self, a: usize, b: usize) -> bool {
        let removed_ab = self
            .adjacent
            .get_mut(a)
            .is_some_and(|list| remove_sorted(list, b));
        let removed_ba = self
            .adjacent
            .get_mut(b)
            .is_some_and(|list| remove_sorted(list, a));
        removed_ab || removed_ba
    }

    /// Expand the 1-ring adjacency to an n-ring adjacency.
    ///
    /// Each element becomes adjacent to every element reachable within `n`
    /// hops. `n == 1` returns an identical graph and `n == 0` returns
    /// isolated elements.
    #[must_use]
    pub fn n_ring(&self, n: usize) -> Self {
        if n == 1 {
            return self.clone();
        }
        let mut ring = Self::new(self.element_count());
        if n == 0 {
            return ring;
        }

        for start in 0..self.element_count() {
            let mut seen: HashSet<usize> = HashSet::new();
            seen.insert(start);
            let mut queue = VecDeque::from([(start, 0usize)]);

            while let Some((element, depth)) = queue.pop_front() {
                if depth == n {
                    continue;
                }
                for &next in self.neighbors(element) {
                    if seen.insert(next) {
                        queue.push_back((next, depth + 1));
                    }
                }
            }

            seen.remove(&start);
            let mut reached: Vec<usize> = seen.into_iter().collect();
            reached.sort_unstable();
            ring.adjacent[start] = reached;
        }

        ring
    }

    /// Drop every edge that touches a masked-out element.
    ///
    /// # Errors
    ///
    /// Returns [`GrowError::TypeInvalid`] if the mask length differs from the
    /// element count.
    pub fn restrict(&self, mask: &[bool]) -> GrowResult<Self> {
        if mask.len() != self.element_count() {
            return Err(GrowError::invalid(format!(
                "mask has {} entries but the graph has {} elements",
                mask.len(),
                self.element_count()
            )));
        }

        let adjacent = self
            .adjacent
            .iter()
            .enumerate()
            .map(|(element, list)| {
                if mask[element] {
                    list.iter().copied().filter(|&n| mask[n]).collect()
                } else {
                    Vec::new()
                }
            })
            .collect();

        Ok(Self { adjacent })
    }
}

fn insert_sorted(list: &mut Vec<usize>, value: usize) {
    if let Err(pos) = list.binary_search(&value) {
        list.insert(pos, value);
    }
}

fn remove_sorted(list: &mut Vec<usize>, value: usize) -> bool {
    match list.binary_search(&value) {
        Ok(pos) => {
            list.remove(pos);
            true
        }
        Err(_) => false,
    }
}
