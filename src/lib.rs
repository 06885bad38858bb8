use std::{
    collections::HashSet,
    error,
    fmt::Display,
    fs::File,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

pub mod graph;
pub mod logging;
pub mod map;
pub mod search;

pub use graph::{HikeGraph, TraversalRule};
pub use map::{Direction, Map, MapBuilder, Position, Tile};
pub use search::Hike;

#[derive(Debug)]
pub enum Error {
    InconsistentRow(usize, usize),
    InvalidCharForMap(char),
    TooFewRows(usize),
    NoEntrance,
    NoExit,
    UnknownVertex(Position),
    Unreachable { from: Position, to: Position },
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::InconsistentRow(expect_col_n, this_col_n) => write!(
                f,
                "Expect {} column(s) in each row, given {}.",
                expect_col_n, this_col_n
            ),
            Error::InvalidCharForMap(c) => write!(f, "Invalid character({}) for map.", c),
            Error::TooFewRows(row_n) => write!(
                f,
                "Expect at least 2 rows in map, given {}.",
                row_n
            ),
            Error::NoEntrance => write!(f, "No walkable tile in the first row of map."),
            Error::NoExit => write!(f, "No walkable tile in the last row of map."),
            Error::UnknownVertex(pos) => {
                write!(f, "Position {} isn't a vertex of the hike graph.", pos)
            }
            Error::Unreachable { from, to } => {
                write!(f, "There's no hike from {} to {}.", from, to)
            }
        }
    }
}

impl error::Error for Error {}

#[derive(Debug, Parser)]
pub struct CLIArgs {
    pub input_path: PathBuf,
    /// Split the search over all threads of the rayon pool.
    #[arg(short, long)]
    pub parallel: bool,
}

/// Longest hike from entrance to exit of `map` under `rule`.
pub fn longest_hike(map: &Map, rule: TraversalRule, parallel: bool) -> Result<Hike, Error> {
    longest_hike_with_vertices(map, &map.vertex_set(), rule, parallel)
}

/// Lengths of the longest hikes under the one-way and two-way rule, the
/// vertices of `map` are detected only once.
pub fn analyze(map: &Map, parallel: bool) -> Result<(usize, usize), Error> {
    let vertices = map.vertex_set();
    let one_way = longest_hike_with_vertices(map, &vertices, TraversalRule::OneWay, parallel)?;
    let two_way = longest_hike_with_vertices(map, &vertices, TraversalRule::TwoWay, parallel)?;

    Ok((one_way.length(), two_way.length()))
}

fn longest_hike_with_vertices(
    map: &Map,
    vertices: &HashSet<Position>,
    rule: TraversalRule,
    parallel: bool,
) -> Result<Hike, Error> {
    let graph = HikeGraph::compress(map, vertices, rule);
    let hike = if parallel {
        graph.longest_hike_par(map.entrance(), map.exit())?
    } else {
        graph.longest_hike(map.entrance(), map.exit())?
    };
    info!(
        "Longest hike under rule {:?} is {} steps through {} vertices.",
        rule,
        hike.length(),
        hike.vertices().len()
    );

    Ok(hike)
}

pub fn read_map<P: AsRef<Path>>(path: P) -> Result<Map> {
    let file = File::open(&path)
        .with_context(|| format!("Failed to open given file({}).", path.as_ref().display()))?;
    let reader = BufReader::new(file);
    let mut builder = MapBuilder::new();
    for (ind, line) in reader.lines().enumerate() {
        let line = line.with_context(|| {
            format!(
                "Failed to read line {} in given file({}).",
                ind + 1,
                path.as_ref().display()
            )
        })?;
        builder
            .add_row(line.as_str())
            .with_context(|| format!("Failed to parse line {} as map row.", ind + 1))?;
    }

    Ok(builder.build()?)
}

#[cfg(test)]
pub(crate) const EXAMPLE_MAP_TEXT: &str = "\
#.#####################
#.......#########...###
#######.#########.#.###
###.....#.>.>.###.#.###
###v#####.#v#.###.#.###
###.>...#.#.#.....#...#
###v###.#.#.#########.#
###...#.#.#.......#...#
#####.#.#.#######.#.###
#.....#.#.#.......#...#
#.#####.#.#.#########v#
#.#...#...#...###...>.#
#.#.#v#######v###.###v#
#...#.>.#...>.>.#.###.#
#####v#.#.###v#.#.###.#
#.....#...#...#.#.#...#
#.#########.###.#.#.###
#...###...#...#...#.###
###.###.#.###v#####v###
#...#...#.#.>.>.#.>.###
#.###.###.#.###.#.#v###
#.....###...###...#...#
#####################.#
";

#[test]
fn test_analyze() {
    let map = EXAMPLE_MAP_TEXT.parse::<Map>().unwrap();
    let (one_way_len, two_way_len) = analyze(&map, false).unwrap();
    assert_eq!((one_way_len, two_way_len), (94, 154));
    assert!(one_way_len <= two_way_len);
    assert_eq!(analyze(&map, true).unwrap(), (94, 154));
}

#[test]
fn test_longest_hike_rules() {
    let map = "#.#\n#v#\n#.#\n".parse::<Map>().unwrap();
    for rule in [TraversalRule::OneWay, TraversalRule::TwoWay] {
        assert_eq!(longest_hike(&map, rule, false).unwrap().length(), 2);
    }

    let map = "#.#\n#^#\n#.#\n".parse::<Map>().unwrap();
    assert!(matches!(
        analyze(&map, false),
        Err(Error::Unreachable { .. })
    ));
    assert!(matches!(
        longest_hike(&map, TraversalRule::OneWay, true),
        Err(Error::Unreachable { .. })
    ));
}
