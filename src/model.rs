// numeric constants that describe the vector layout of every category
pub const WALL_POINTS: usize = 50;
pub const RING_POINTS: usize = 16;

pub const ISLAND_SLOTS: usize = 8;
pub const GATE_SLOTS: usize = 8;
pub const BOOST_SLOTS: usize = 8;
pub const BOMB_SLOTS: usize = 8;
pub const SPIKE_SLOTS: usize = 16;
pub const PORTAL_SLOTS: usize = 8;
pub const POWERUP_SLOTS: usize = 3;

/// Fractional digits kept when a map vector is persisted.
pub const ROUND_DIGITS: i32 = 4;

/// Maps narrower or shorter than this are never vectorized.
pub const MIN_EXTENT: f64 = 10.0;

/// Value written into position/team fields of empty slots (map center, neutral).
pub const DEFAULT_FIELD: f64 = 0.5;

use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn distance(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    #[inline]
    pub fn midpoint(&self, other: &Point) -> Point {
        Point::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}

/// Team attribute of flags, boosts and gates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Team {
    Red,
    Blue,
    #[default]
    None,
}

impl Team {
    /// Numeric encoding used inside map vectors.
    pub fn encode(self) -> f64 {
        match self {
            Team::Red => 0.0,
            Team::Blue => 1.0,
            Team::None => 0.5,
        }
    }
}

impl FromStr for Team {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "red" => Ok(Team::Red),
            "blue" => Ok(Team::Blue),
            "none" | "neutral" | "" => Ok(Team::None),
            other => Err(format!("unknown team `{other}`")),
        }
    }
}

impl TryFrom<String> for Team {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Team> for String {
    fn from(team: Team) -> String {
        match team {
            Team::Red => "red",
            Team::Blue => "blue",
            Team::None => "none",
        }
        .to_string()
    }
}

/// A single-point element (boost, bomb, flag, ...).
#[derive(Debug, Clone, PartialEq)]
pub struct PointElement {
    pub position: Point,
    pub team: Team,
}

/// A polygonal element exposing an ordered point ring (island, gate, wall).
///
/// `team` is read from gate documents and kept on the ring, but no layout
/// encodes it: GATES slots carry only the existence flag and coordinates.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Ring {
    pub points: Vec<Point>,
    pub team: Team,
}

impl Ring {
    /// Vertex centroid; used as the slot-ordering position of the ring.
    pub fn centroid(&self) -> Point {
        let n = self.points.len().max(1) as f64;
        let (sx, sy) = self
            .points
            .iter()
            .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
        Point::new(sx / n, sy / n)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapExtents {
    pub width: f64,
    pub height: f64,
}

impl MapExtents {
    pub fn center(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }

    /// Scale a raw coordinate into the unit square.
    pub fn normalize(&self, p: &Point) -> Point {
        Point::new(p.x / self.width, p.y / self.height)
    }
}

/// One source map as handed over by the map loader.
///
/// Every element list may be empty; only `outer_wall` is required for
/// any curation that contains `OUTER_WALL`.
#[derive(Debug, Clone)]
pub struct VectorMap {
    pub name: String,
    pub extents: MapExtents,
    pub outer_wall: Ring,
    pub islands: Vec<Ring>,
    pub gates: Vec<Ring>,
    pub boosts: Vec<PointElement>,
    pub bombs: Vec<PointElement>,
    pub spikes: Vec<PointElement>,
    pub portals: Vec<PointElement>,
    pub powerups: Vec<PointElement>,
    pub flags: Vec<PointElement>,
}

impl VectorMap {
    pub fn empty(name: impl Into<String>, width: f64, height: f64) -> Self {
        Self {
            name: name.into(),
            extents: MapExtents { width, height },
            outer_wall: Ring::default(),
            islands: Vec::new(),
            gates: Vec::new(),
            boosts: Vec::new(),
            bombs: Vec::new(),
            spikes: Vec::new(),
            portals: Vec::new(),
            powerups: Vec::new(),
            flags: Vec::new(),
        }
    }
}

/// ─────────────────────────────────────────────────────
/// Element categories and curations
/// ─────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    OuterWall,
    Islands,
    Boosts,
    Bombs,
    Spikes,
    Portals,
    Gates,
    Flags,
    Powerups,
}

impl Category {
    pub const ALL: [Category; 9] = [
        Category::OuterWall,
        Category::Islands,
        Category::Boosts,
        Category::Bombs,
        Category::Spikes,
        Category::Portals,
        Category::Gates,
        Category::Flags,
        Category::Powerups,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Category::OuterWall => "OUTER_WALL",
            Category::Islands => "ISLANDS",
            Category::Boosts => "BOOSTS",
            Category::Bombs => "BOMBS",
            Category::Spikes => "SPIKES",
            Category::Portals => "PORTALS",
            Category::Gates => "GATES",
            Category::Flags => "FLAGS",
            Category::Powerups => "POWERUPS",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Named, ordered selection of categories making up a dataset schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "UPPER")]
pub enum Curation {
    Walls,
    Minimal,
    Extended,
}

impl Curation {
    pub const ALL: [Curation; 3] = [Curation::Walls, Curation::Minimal, Curation::Extended];

    pub fn categories(self) -> &'static [Category] {
        match self {
            Curation::Walls => &[Category::OuterWall],
            Curation::Minimal => &[Category::OuterWall, Category::Flags],
            Curation::Extended => &Category::ALL,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Curation::Walls => "WALLS",
            Curation::Minimal => "MINIMAL",
            Curation::Extended => "EXTENDED",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "UPPER")]
pub enum GameMode {
    /// Capture the flag: primary flag must be red.
    Ctf,
    /// Neutral flag: primary flag must be unowned.
    Nf,
}

impl GameMode {
    pub fn name(self) -> &'static str {
        match self {
            GameMode::Ctf => "CTF",
            GameMode::Nf => "NF",
        }
    }
}

/// ─────────────────────────────────────────────────────
/// Dataset file
/// ─────────────────────────────────────────────────────

/// `[categoryName, dimensionCount]`, serialized as a two-element array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionRange(pub String, pub usize);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetMeta {
    pub dimension_ranges: Vec<DimensionRange>,
}

/// A set of equally long map vectors plus the names of their slices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub meta: DatasetMeta,
    pub data: Vec<Vec<f64>>,
}

impl Dataset {
    pub fn new(dimension_ranges: Vec<DimensionRange>, data: Vec<Vec<f64>>) -> Self {
        Self {
            meta: DatasetMeta { dimension_ranges },
            data,
        }
    }

    /// Sum of the declared range widths; every row must be this long.
    pub fn dimensions(&self) -> usize {
        self.meta.dimension_ranges.iter().map(|r| r.1).sum()
    }
}
