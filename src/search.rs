use std::collections::HashSet;

use log::debug;
use rayon::prelude::*;

use crate::{graph::HikeGraph, map::Position, Error};

/// One longest simple path found in a [`HikeGraph`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hike {
    length: usize,
    vertices: Vec<Position>,
}

impl Hike {
    pub fn length(&self) -> usize {
        self.length
    }

    /// Vertices in walking order, both ends included.
    pub fn vertices(&self) -> &[Position] {
        &self.vertices
    }
}

// Depth-first walk over all simple paths. `visited` and `path` always hold
// exactly the vertices from the start to the current one.
struct HikeSearch<'a> {
    graph: &'a HikeGraph,
    to: Position,
    visited: HashSet<Position>,
    path: Vec<Position>,
    best: Option<Hike>,
    reached_n: usize,
}

impl<'a> HikeSearch<'a> {
    fn new(graph: &'a HikeGraph, to: Position, path: &[Position]) -> Self {
        Self {
            graph,
            to,
            visited: path.iter().copied().collect(),
            path: path.to_vec(),
            best: None,
            reached_n: 0,
        }
    }

    fn walk(&mut self, cur_pos: Position, length: usize) {
        if cur_pos == self.to {
            self.reached_n += 1;
            if self.best.as_ref().map_or(true, |best| length > best.length) {
                self.best = Some(Hike {
                    length,
                    vertices: self.path.clone(),
                });
            }
            return;
        }

        let graph = self.graph;
        let Some(targets) = graph.edges(&cur_pos) else {
            return;
        };
        for (next_pos, weight) in targets {
            if !self.visited.insert(*next_pos) {
                continue;
            }

            self.path.push(*next_pos);
            self.walk(*next_pos, length + weight);
            self.path.pop();
            self.visited.remove(next_pos);
        }
    }
}

// Stop splitting the search once there are this many branches per thread,
// or after this many edges from the start.
const BRANCHES_PER_THREAD: usize = 4;
const MAX_SPLIT_DEPTH: usize = 8;

impl HikeGraph {
    /// Longest simple path from `from` to `to`, found by exhaustive search.
    ///
    /// Edges are tried in position order, so among equally long hikes the
    /// first one found is returned on every run.
    pub fn longest_hike(&self, from: Position, to: Position) -> Result<Hike, Error> {
        self.check_ends(from, to)?;

        let mut search = HikeSearch::new(self, to, &[from]);
        search.walk(from, 0);
        debug!(
            "Searched {} path(s) from {} to {} under rule {:?}.",
            search.reached_n,
            from,
            to,
            self.rule()
        );

        search.best.ok_or(Error::Unreachable { from, to })
    }

    /// Same length as [`HikeGraph::longest_hike`]. The search is split into
    /// simple path prefixes starting at `from`, each prefix is finished on its
    /// own rayon task with its own visited set. Among equally long hikes the
    /// returned one may differ from the sequential search.
    pub fn longest_hike_par(&self, from: Position, to: Position) -> Result<Hike, Error> {
        self.check_ends(from, to)?;

        let prefixes = self.hike_prefixes(
            from,
            to,
            rayon::current_num_threads() * BRANCHES_PER_THREAD,
        );
        debug!(
            "Split search from {} to {} into {} branch(es).",
            from,
            to,
            prefixes.len()
        );

        prefixes
            .into_par_iter()
            .filter_map(|(path, length)| {
                let last_pos = *path.last()?;
                let mut search = HikeSearch::new(self, to, &path);
                search.walk(last_pos, length);
                search.best
            })
            .max_by_key(|hike| hike.length)
            .ok_or(Error::Unreachable { from, to })
    }

    // Simple paths from `from` with their lengths, extended edge by edge until
    // there are at least `min_branch_n` of them. Paths already at `to` are kept
    // as they are, paths which can't be extended are dropped.
    fn hike_prefixes(
        &self,
        from: Position,
        to: Position,
        min_branch_n: usize,
    ) -> Vec<(Vec<Position>, usize)> {
        let mut prefixes = vec![(vec![from], 0)];
        for _ in 0..MAX_SPLIT_DEPTH {
            if prefixes.len() >= min_branch_n {
                break;
            }

            let mut extended = false;
            let mut next_prefixes = Vec::new();
            for (path, length) in prefixes {
                let Some(&last_pos) = path.last() else {
                    continue;
                };
                if last_pos == to {
                    next_prefixes.push((path, length));
                    continue;
                }

                for (next_pos, weight) in self.edges(&last_pos).into_iter().flatten() {
                    if path.contains(next_pos) {
                        continue;
                    }

                    let mut next_path = path.clone();
                    next_path.push(*next_pos);
                    next_prefixes.push((next_path, length + weight));
                    extended = true;
                }
            }

            prefixes = next_prefixes;
            if !extended {
                break;
            }
        }

        prefixes
    }

    fn check_ends(&self, from: Position, to: Position) -> Result<(), Error> {
        for pos in [from, to] {
            if !self.contains(&pos) {
                return Err(Error::UnknownVertex(pos));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
use crate::{graph::TraversalRule, map::Map};

#[cfg(test)]
fn hike_on(text: &str, rule: TraversalRule) -> Result<Hike, Error> {
    let map = text.parse::<Map>().unwrap();
    let graph = HikeGraph::compress(&map, &map.vertex_set(), rule);
    graph.longest_hike(map.entrance(), map.exit())
}

#[test]
fn test_straight_corridor() {
    let text = "#.#\n#.#\n#.#\n";
    let map = text.parse::<Map>().unwrap();
    let dist = map.entrance().manhattan_dist(&map.exit());
    for rule in [TraversalRule::OneWay, TraversalRule::TwoWay] {
        let hike = hike_on(text, rule).unwrap();
        assert_eq!(hike.length(), dist);
        assert_eq!(hike.vertices(), &[map.entrance(), map.exit()]);
    }
}

#[test]
fn test_junction_between_ends() {
    let text = ".#.\n...\n.#.\n";
    assert_eq!(hike_on(text, TraversalRule::OneWay).unwrap().length(), 2);
    assert_eq!(hike_on(text, TraversalRule::TwoWay).unwrap().length(), 2);
}

#[test]
fn test_longest_loop_is_taken() {
    let text = "\
#.#####
#.....#
#.###.#
#.....#
#.#.###
#...#.#
###...#
#####.#
";
    // The long way round the top ring beats the short cut through the middle.
    let hike = hike_on(text, TraversalRule::TwoWay).unwrap();
    assert_eq!(hike.length(), 19);
}

#[test]
fn test_unreachable_exit() {
    let text = "#.#\n#^#\n#.#\n";
    assert!(matches!(
        hike_on(text, TraversalRule::OneWay),
        Err(Error::Unreachable { .. })
    ));
    assert_eq!(hike_on(text, TraversalRule::TwoWay).unwrap().length(), 2);
}

#[test]
fn test_zero_length_hike() {
    let map = "#.#\n#.#\n#.#\n".parse::<Map>().unwrap();
    let graph = HikeGraph::compress(&map, &map.vertex_set(), TraversalRule::TwoWay);
    let entrance = map.entrance();
    for hike in [
        graph.longest_hike(entrance, entrance).unwrap(),
        graph.longest_hike_par(entrance, entrance).unwrap(),
    ] {
        assert_eq!(hike.length(), 0);
        assert_eq!(hike.vertices(), &[entrance]);
    }
}

#[test]
fn test_longer_of_two_corridors() {
    let text = "\
#.#######
#.......#
#.#####.#
#.#####.#
#.......#
####.####
";
    assert_eq!(hike_on(text, TraversalRule::TwoWay).unwrap().length(), 14);
}

#[test]
fn test_search_splits_into_branches() {
    let map = crate::EXAMPLE_MAP_TEXT.parse::<Map>().unwrap();
    let vertices = map.vertex_set();
    for rule in [TraversalRule::OneWay, TraversalRule::TwoWay] {
        let graph = HikeGraph::compress(&map, &vertices, rule);
        let prefixes = graph.hike_prefixes(map.entrance(), map.exit(), 4);
        assert!(prefixes.len() > 1, "{:?} gives {} branch(es)", rule, prefixes.len());
        for (path, length) in &prefixes {
            assert_eq!(path.first(), Some(&map.entrance()));
            assert_eq!(path.iter().collect::<HashSet<_>>().len(), path.len());
            let weight_sum = path
                .windows(2)
                .map(|pair| graph.weight(&pair[0], &pair[1]).unwrap())
                .sum::<usize>();
            assert_eq!(weight_sum, *length);
        }
    }
}

#[test]
fn test_same_hike_on_every_search() {
    let map = crate::EXAMPLE_MAP_TEXT.parse::<Map>().unwrap();
    let hikes = (0..4)
        .map(|_| {
            let graph = HikeGraph::compress(&map, &map.vertex_set(), TraversalRule::TwoWay);
            graph.longest_hike(map.entrance(), map.exit()).unwrap()
        })
        .collect::<Vec<_>>();
    assert!(hikes.windows(2).all(|pair| pair[0] == pair[1]));
}

#[test]
fn test_unknown_vertex() {
    let map = "#.#\n#.#\n#.#\n".parse::<Map>().unwrap();
    let graph = HikeGraph::compress(&map, &map.vertex_set(), TraversalRule::TwoWay);
    let middle = Position::new(1, 1);
    assert!(matches!(
        graph.longest_hike(middle, map.exit()),
        Err(Error::UnknownVertex(pos)) if pos == middle
    ));
}

#[test]
fn test_example_hikes() {
    let map = crate::EXAMPLE_MAP_TEXT.parse::<Map>().unwrap();
    let vertices = map.vertex_set();
    for (rule, expect_length) in [(TraversalRule::OneWay, 94), (TraversalRule::TwoWay, 154)] {
        let graph = HikeGraph::compress(&map, &vertices, rule);
        let hike = graph.longest_hike(map.entrance(), map.exit()).unwrap();
        assert_eq!(hike.length(), expect_length);

        let hike_par = graph.longest_hike_par(map.entrance(), map.exit()).unwrap();
        assert_eq!(hike_par.length(), expect_length);

        for hike in [hike, hike_par] {
            let unique_n = hike.vertices().iter().collect::<HashSet<_>>().len();
            assert_eq!(unique_n, hike.vertices().len());
            assert_eq!(hike.vertices().first(), Some(&map.entrance()));
            assert_eq!(hike.vertices().last(), Some(&map.exit()));
            let weight_sum = hike
                .vertices()
                .windows(2)
                .map(|pair| graph.weight(&pair[0], &pair[1]).unwrap())
                .sum::<usize>();
            assert_eq!(weight_sum, hike.length());
        }
    }
}
