use std::collections::{BTreeMap, HashMap, HashSet};

use log::{debug, trace};

use crate::map::{Direction, Map, Position, Tile};

/// How a hiker may leave a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TraversalRule {
    /// Slopes can only be left downhill, along the direction they point.
    OneWay,
    /// Slopes are treated as plain floor.
    TwoWay,
}

impl TraversalRule {
    pub fn legal_dirs(&self, tile: Tile) -> &'static [Direction] {
        match (self, tile) {
            (_, Tile::Wall) => &[],
            (TraversalRule::OneWay, Tile::Slope(Direction::North)) => &[Direction::North],
            (TraversalRule::OneWay, Tile::Slope(Direction::East)) => &[Direction::East],
            (TraversalRule::OneWay, Tile::Slope(Direction::South)) => &[Direction::South],
            (TraversalRule::OneWay, Tile::Slope(Direction::West)) => &[Direction::West],
            (TraversalRule::OneWay, Tile::Floor) | (TraversalRule::TwoWay, _) => {
                Direction::all_dirs()
            }
        }
    }
}

/// Map collapsed to its decision points, every corridor between two of them
/// becomes one weighted edge.
#[derive(Debug)]
pub struct HikeGraph {
    rule: TraversalRule,
    edges: HashMap<Position, BTreeMap<Position, usize>>,
}

impl HikeGraph {
    pub fn compress(map: &Map, vertices: &HashSet<Position>, rule: TraversalRule) -> Self {
        let edges = vertices
            .iter()
            .map(|vertex| (*vertex, Self::corridors_from(map, vertices, *vertex, rule)))
            .collect::<HashMap<_, _>>();
        let graph = Self { rule, edges };
        debug!(
            "Compressed map into {} vertices and {} edges under rule {:?}.",
            graph.edges.len(),
            graph.edge_n(),
            rule
        );

        graph
    }

    // Walks every corridor leaving `start`, stops at the first vertex on each of them.
    // Vertices are never marked as searched, so every corridor into one is seen and
    // the longest of them is kept.
    fn corridors_from(
        map: &Map,
        vertices: &HashSet<Position>,
        start: Position,
        rule: TraversalRule,
    ) -> BTreeMap<Position, usize> {
        let mut corridors = BTreeMap::new();
        let mut searched_positions = HashSet::from([start]);
        let mut search_states = vec![(start, 0)];
        while let Some((cur_pos, cur_steps_n)) = search_states.pop() {
            let Some(tile) = map.tile(&cur_pos) else {
                continue;
            };
            for next_pos in rule
                .legal_dirs(*tile)
                .iter()
                .filter_map(|dir| cur_pos.neighbor(*dir))
                .filter(|pos| map.is_walkable(pos))
            {
                let next_steps_n = cur_steps_n + 1;
                if vertices.contains(&next_pos) {
                    if next_pos != start {
                        trace!("Edge {} -> {}, {} steps.", start, next_pos, next_steps_n);
                        let steps_n = corridors.entry(next_pos).or_insert(next_steps_n);
                        *steps_n = (*steps_n).max(next_steps_n);
                    }
                } else if searched_positions.insert(next_pos) {
                    search_states.push((next_pos, next_steps_n));
                }
            }
        }

        corridors
    }

    pub fn rule(&self) -> TraversalRule {
        self.rule
    }

    pub fn contains(&self, pos: &Position) -> bool {
        self.edges.contains_key(pos)
    }

    pub fn vertices(&self) -> impl Iterator<Item = &Position> {
        self.edges.keys()
    }

    pub fn edges(&self, from: &Position) -> Option<&BTreeMap<Position, usize>> {
        self.edges.get(from)
    }

    pub fn weight(&self, from: &Position, to: &Position) -> Option<usize> {
        self.edges
            .get(from)
            .and_then(|targets| targets.get(to))
            .copied()
    }

    pub fn edge_n(&self) -> usize {
        self.edges.values().map(|targets| targets.len()).sum()
    }
}

#[cfg(test)]
fn example_graph(rule: TraversalRule) -> HikeGraph {
    let map = crate::EXAMPLE_MAP_TEXT.parse::<Map>().unwrap();
    HikeGraph::compress(&map, &map.vertex_set(), rule)
}

#[test]
fn test_legal_dirs() {
    let slope = Tile::Slope(Direction::West);
    assert_eq!(TraversalRule::OneWay.legal_dirs(slope), &[Direction::West]);
    assert_eq!(TraversalRule::TwoWay.legal_dirs(slope).len(), 4);
    assert_eq!(TraversalRule::OneWay.legal_dirs(Tile::Floor).len(), 4);
    assert!(TraversalRule::TwoWay.legal_dirs(Tile::Wall).is_empty());
}

#[test]
fn test_compress_small_map() {
    let map = "#.###\n#...#\n#.#.#\n#...#\n###.#\n".parse::<Map>().unwrap();
    let graph = HikeGraph::compress(&map, &map.vertex_set(), TraversalRule::TwoWay);
    let junction_a = Position::new(1, 1);
    let junction_b = Position::new(3, 3);
    assert_eq!(graph.vertices().count(), 4);
    assert_eq!(graph.edge_n(), 6);
    assert_eq!(graph.weight(&map.entrance(), &junction_a), Some(1));
    assert_eq!(graph.weight(&junction_a, &junction_b), Some(4));
    assert_eq!(graph.weight(&junction_b, &map.exit()), Some(1));
    assert_eq!(graph.weight(&map.entrance(), &map.exit()), None);
}

#[test]
fn test_two_way_graph_is_symmetric() {
    let graph = example_graph(TraversalRule::TwoWay);
    assert!(graph.edge_n() > 0);
    for from in graph.vertices() {
        for (to, weight) in graph.edges(from).unwrap() {
            assert!(*weight > 0);
            assert_eq!(graph.weight(to, from), Some(*weight), "{} -> {}", to, from);
        }
    }
}

#[test]
fn test_one_way_graph_within_two_way_graph() {
    let one_way = example_graph(TraversalRule::OneWay);
    let two_way = example_graph(TraversalRule::TwoWay);
    assert!(one_way.edge_n() < two_way.edge_n());
    for from in one_way.vertices() {
        for (to, weight) in one_way.edges(from).unwrap() {
            assert_eq!(two_way.weight(from, to), Some(*weight), "{} -> {}", from, to);
        }
    }
}

#[test]
fn test_slope_blocks_uphill() {
    let map = "#.#\n#^#\n#.#\n".parse::<Map>().unwrap();
    let vertices = map.vertex_set();
    let one_way = HikeGraph::compress(&map, &vertices, TraversalRule::OneWay);
    assert_eq!(one_way.weight(&map.entrance(), &map.exit()), None);
    assert_eq!(one_way.weight(&map.exit(), &map.entrance()), Some(2));

    let two_way = HikeGraph::compress(&map, &vertices, TraversalRule::TwoWay);
    assert_eq!(two_way.weight(&map.entrance(), &map.exit()), Some(2));
    assert_eq!(two_way.rule(), TraversalRule::TwoWay);
}

#[test]
fn test_parallel_corridors_keep_longest() {
    let text = "\
#.#######
#.......#
#.#####.#
#.#####.#
#.......#
####.####
";
    let map = text.parse::<Map>().unwrap();
    let graph = HikeGraph::compress(&map, &map.vertex_set(), TraversalRule::TwoWay);
    let junction_a = Position::new(1, 1);
    let junction_b = Position::new(4, 4);
    assert_eq!(graph.weight(&junction_a, &junction_b), Some(12));
    assert_eq!(graph.weight(&junction_b, &junction_a), Some(12));
}
