use std::{collections::HashSet, fmt::Display, str::FromStr};

use log::{debug, warn};

use crate::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    r: usize,
    c: usize,
}

impl Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.r, self.c)
    }
}

impl Position {
    pub fn new(r: usize, c: usize) -> Self {
        Self { r, c }
    }

    pub fn neighbor(&self, dir: Direction) -> Option<Self> {
        match dir {
            Direction::North if self.r > 0 => Some(Self::new(self.r - 1, self.c)),
            Direction::East => Some(Self::new(self.r, self.c + 1)),
            Direction::South => Some(Self::new(self.r + 1, self.c)),
            Direction::West if self.c > 0 => Some(Self::new(self.r, self.c - 1)),
            _ => None,
        }
    }

    #[cfg(test)]
    pub fn manhattan_dist(&self, other: &Position) -> usize {
        self.r.abs_diff(other.r) + self.c.abs_diff(other.c)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    pub fn all_dirs() -> &'static [Direction] {
        static ALL_DIRECTIONS: [Direction; 4] = [
            Direction::North,
            Direction::East,
            Direction::South,
            Direction::West,
        ];

        &ALL_DIRECTIONS
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tile {
    Wall,
    Floor,
    Slope(Direction),
}

impl TryFrom<char> for Tile {
    type Error = Error;

    fn try_from(value: char) -> Result<Self, Self::Error> {
        match value {
            '#' => Ok(Tile::Wall),
            '.' => Ok(Tile::Floor),
            '^' => Ok(Tile::Slope(Direction::North)),
            '>' => Ok(Tile::Slope(Direction::East)),
            'v' => Ok(Tile::Slope(Direction::South)),
            '<' => Ok(Tile::Slope(Direction::West)),
            other => Err(Error::InvalidCharForMap(other)),
        }
    }
}

impl From<Tile> for char {
    fn from(value: Tile) -> Self {
        match value {
            Tile::Wall => '#',
            Tile::Floor => '.',
            Tile::Slope(Direction::North) => '^',
            Tile::Slope(Direction::East) => '>',
            Tile::Slope(Direction::South) => 'v',
            Tile::Slope(Direction::West) => '<',
        }
    }
}

impl Tile {
    pub fn is_walkable(&self) -> bool {
        !matches!(self, Tile::Wall)
    }
}

/// Rectangular hiking map, read-only once built.
#[derive(Debug)]
pub struct Map {
    tiles: Vec<Tile>,
    row_n: usize,
    col_n: usize,
    entrance: Position,
    exit: Position,
}

impl Display for Map {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for row in self.tiles.chunks(self.col_n.max(1)) {
            let text = row.iter().map(|tile| char::from(*tile)).collect::<String>();
            writeln!(f, "{}", text)?;
        }

        Ok(())
    }
}

impl FromStr for Map {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut builder = MapBuilder::new();
        for line in s.lines() {
            builder.add_row(line)?;
        }

        builder.build()
    }
}

impl Map {
    pub fn row_n(&self) -> usize {
        self.row_n
    }

    pub fn col_n(&self) -> usize {
        self.col_n
    }

    pub fn entrance(&self) -> Position {
        self.entrance
    }

    pub fn exit(&self) -> Position {
        self.exit
    }

    pub fn tile(&self, pos: &Position) -> Option<&Tile> {
        if pos.r < self.row_n && pos.c < self.col_n {
            self.tiles.get(pos.r * self.col_n + pos.c)
        } else {
            None
        }
    }

    /// Out of bounds counts as a wall.
    pub fn is_walkable(&self, pos: &Position) -> bool {
        self.tile(pos).is_some_and(|tile| tile.is_walkable())
    }

    /// Orthogonal neighbors of `pos` which lie inside the map.
    pub fn neighbors<'a>(&'a self, pos: &'a Position) -> impl Iterator<Item = Position> + 'a {
        Direction::all_dirs()
            .iter()
            .filter_map(move |dir| pos.neighbor(*dir))
            .filter(move |pos| self.tile(pos).is_some())
    }

    pub fn walkable_neighbors_n(&self, pos: &Position) -> usize {
        self.neighbors(pos)
            .filter(|pos| self.is_walkable(pos))
            .count()
    }

    /// Walkable positions with more than two walkable neighbors, in row-major order.
    pub fn junctions(&self) -> Vec<Position> {
        (0..self.row_n)
            .flat_map(|r| (0..self.col_n).map(move |c| Position::new(r, c)))
            .filter(|pos| self.is_walkable(pos) && self.walkable_neighbors_n(pos) > 2)
            .collect()
    }

    /// Entrance, exit and every junction of this map.
    pub fn vertex_set(&self) -> HashSet<Position> {
        let mut vertices = HashSet::from([self.entrance, self.exit]);
        vertices.extend(self.junctions());
        debug!(
            "Found {} vertices in map({}x{}).",
            vertices.len(),
            self.row_n,
            self.col_n
        );

        vertices
    }
}

#[derive(Debug)]
pub struct MapBuilder {
    tiles: Vec<Tile>,
    row_n: usize,
    col_n: Option<usize>,
}

impl MapBuilder {
    pub fn new() -> Self {
        Self {
            tiles: Vec::new(),
            row_n: 0,
            col_n: None,
        }
    }

    pub fn add_row(&mut self, text: &str) -> Result<(), Error> {
        let this_col_n = text.chars().count();
        let col_n = *self.col_n.get_or_insert(this_col_n);
        if col_n != this_col_n {
            return Err(Error::InconsistentRow(col_n, this_col_n));
        }

        for c in text.chars() {
            self.tiles.push(Tile::try_from(c)?);
        }
        self.row_n += 1;

        Ok(())
    }

    pub fn build(self) -> Result<Map, Error> {
        if self.row_n < 2 {
            return Err(Error::TooFewRows(self.row_n));
        }

        let col_n = self.col_n.unwrap_or(0);
        let entrance = self
            .first_walkable_in_row(0, col_n)
            .ok_or(Error::NoEntrance)?;
        let exit = self
            .first_walkable_in_row(self.row_n - 1, col_n)
            .ok_or(Error::NoExit)?;

        Ok(Map {
            tiles: self.tiles,
            row_n: self.row_n,
            col_n,
            entrance,
            exit,
        })
    }

    fn first_walkable_in_row(&self, r: usize, col_n: usize) -> Option<Position> {
        let row = &self.tiles[(r * col_n)..((r + 1) * col_n)];
        let mut walkable_cols = row
            .iter()
            .enumerate()
            .filter(|(_, tile)| tile.is_walkable())
            .map(|(c, _)| c);
        let first_c = walkable_cols.next()?;
        let extra_n = walkable_cols.count();
        if extra_n > 0 {
            warn!(
                "Row {} has {} more walkable tile(s) besides column {}, use the first one.",
                r, extra_n, first_c
            );
        }

        Some(Position::new(r, first_c))
    }
}

impl Default for MapBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
const SMALL_MAP_TEXT: &str = "\
#.###
#...#
#.#.#
#...#
###.#
";

#[test]
fn test_out_of_bounds_not_walkable() {
    let map = SMALL_MAP_TEXT.parse::<Map>().unwrap();
    for r in 0..(map.row_n() + 2) {
        for c in 0..(map.col_n() + 2) {
            let pos = Position::new(r, c);
            if r >= map.row_n() || c >= map.col_n() {
                assert!(!map.is_walkable(&pos), "{} is out of bounds", pos);
            }
        }
    }
}

#[test]
fn test_neighbors_stay_in_bounds() {
    let map = SMALL_MAP_TEXT.parse::<Map>().unwrap();
    let corner = Position::new(0, 0);
    let mut neighbors = map.neighbors(&corner).collect::<Vec<_>>();
    neighbors.sort();
    assert_eq!(neighbors, vec![Position::new(0, 1), Position::new(1, 0)]);

    let center = Position::new(2, 2);
    assert_eq!(map.neighbors(&center).count(), 4);
    assert_eq!(map.walkable_neighbors_n(&center), 4);
}

#[test]
fn test_entrance_and_exit() {
    let map = SMALL_MAP_TEXT.parse::<Map>().unwrap();
    assert_eq!(map.entrance(), Position::new(0, 1));
    assert_eq!(map.exit(), Position::new(4, 3));
}

#[test]
fn test_junctions() {
    let map = SMALL_MAP_TEXT.parse::<Map>().unwrap();
    assert_eq!(map.junctions(), vec![Position::new(1, 1), Position::new(3, 3)]);

    let vertices = map.vertex_set();
    assert_eq!(vertices.len(), 4);
    assert!(vertices.contains(&map.entrance()));
    assert!(vertices.contains(&map.exit()));
    assert_eq!(vertices, map.vertex_set());
}

#[test]
fn test_slope_tiles() {
    let map = "#.#\n#>#\n#v#\n#.#\n".parse::<Map>().unwrap();
    assert_eq!(
        map.tile(&Position::new(1, 1)),
        Some(&Tile::Slope(Direction::East))
    );
    assert!(map.is_walkable(&Position::new(2, 1)));
    assert_eq!(map.to_string(), "#.#\n#>#\n#v#\n#.#\n");
}

#[test]
fn test_invalid_maps() {
    assert!(matches!(
        "#.#\n#..#\n".parse::<Map>(),
        Err(Error::InconsistentRow(3, 4))
    ));
    assert!(matches!(
        "#.#\n#S#\n#.#\n".parse::<Map>(),
        Err(Error::InvalidCharForMap('S'))
    ));
    assert!(matches!("###\n#.#\n#.#\n".parse::<Map>(), Err(Error::NoEntrance)));
    assert!(matches!("#.#\n#.#\n###\n".parse::<Map>(), Err(Error::NoExit)));
    assert!(matches!("#.#\n".parse::<Map>(), Err(Error::TooFewRows(1))));
    assert!(matches!("".parse::<Map>(), Err(Error::TooFewRows(0))));
}
