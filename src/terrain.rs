// =============================================================================
// TERRAIN.RS — Terrain kinds and the grid the map renderer reads from
//
// The renderer never owns terrain data. It reads it through the `TerrainGrid`
// trait so that a replay's live map, a test fixture, or a map loaded from
// disk (`GameMap`) can all be prerendered the same way.
// =============================================================================

use std::fmt;
use std::path::Path;

use glam::IVec2;
use serde::{Deserialize, Serialize};

/// Structural category of a map cell.
///
/// Only `Road` and `Void` take part in autotiling. `Land` is plain ground and
/// always renders as background.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TerrainKind {
    #[default]
    Land,
    Road,
    Void,
}

impl TerrainKind {
    /// Whether cells of this kind are joined to matching neighbours.
    #[inline]
    pub fn is_autotiled(self) -> bool {
        matches!(self, TerrainKind::Road | TerrainKind::Void)
    }

    /// Parse the single-character map notation: `.` land, `=` road, `#` void.
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '.' => Some(TerrainKind::Land),
            '=' => Some(TerrainKind::Road),
            '#' => Some(TerrainKind::Void),
            _ => None,
        }
    }

    pub fn to_char(self) -> char {
        match self {
            TerrainKind::Land => '.',
            TerrainKind::Road => '=',
            TerrainKind::Void => '#',
        }
    }
}

// ── TerrainGrid ───────────────────────────────────────────────────────────────

/// Read-only view of a rectangular terrain map.
///
/// `kind` is only called with `0 <= x < width()` and `0 <= y < height()`.
pub trait TerrainGrid {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    /// World-space location of cell `(0, 0)`.
    fn origin(&self) -> IVec2;
    fn kind(&self, x: u32, y: u32) -> TerrainKind;
}

// ── MapError ──────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("failed to read map file: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed map JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("map must be at least 1x1, got {width}x{height}")]
    Empty { width: u32, height: u32 },

    #[error("expected {expected} rows, found {found}")]
    RowCount { expected: u32, found: usize },

    #[error("row {row} has {found} cells, expected {expected}")]
    RowWidth { row: usize, expected: u32, found: usize },

    #[error("unknown terrain character {ch:?} at ({x}, {y})")]
    UnknownTerrain { ch: char, x: u32, y: u32 },
}

// ── GameMap ───────────────────────────────────────────────────────────────────

/// On-disk form of a map: one string per row, top row first.
#[derive(Deserialize, Serialize)]
struct RawMap {
    width: u32,
    height: u32,
    #[serde(default)]
    origin: [i32; 2],
    rows: Vec<String>,
}

/// Concrete terrain grid stored column-major, so `tiles[x * height + y]`
/// matches the `[x][y]` indexing replays use.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameMap {
    width: u32,
    height: u32,
    origin: IVec2,
    tiles: Vec<TerrainKind>,
}

impl GameMap {
    /// Create a `width × height` map filled with `Land`.
    ///
    /// # Panics
    /// Panics if either dimension is zero.
    pub fn new(width: u32, height: u32, origin: IVec2) -> Self {
        assert!(width > 0 && height > 0, "map must be at least 1x1");
        Self {
            width,
            height,
            origin,
            tiles: vec![TerrainKind::Land; (width * height) as usize],
        }
    }

    /// Build a map from rows of map notation (see [`TerrainKind::from_char`]).
    /// The first row is `y = 0`.
    pub fn from_rows<S: AsRef<str>>(rows: &[S], origin: IVec2) -> Result<Self, MapError> {
        let height = rows.len() as u32;
        let width = rows.first().map_or(0, |r| r.as_ref().chars().count()) as u32;
        if width == 0 || height == 0 {
            return Err(MapError::Empty { width, height });
        }

        let mut map = Self::new(width, height, origin);
        for (y, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            let found = row.chars().count();
            if found != width as usize {
                return Err(MapError::RowWidth { row: y, expected: width, found });
            }
            for (x, ch) in row.chars().enumerate() {
                let (x, y) = (x as u32, y as u32);
                let kind = TerrainKind::from_char(ch)
                    .ok_or(MapError::UnknownTerrain { ch, x, y })?;
                map.set(x, y, kind);
            }
        }
        Ok(map)
    }

    /// Parse a map from its JSON form:
    /// `{ "width": 3, "height": 1, "origin": [0, 0], "rows": ["==="] }`.
    pub fn from_json(json: &str) -> Result<Self, MapError> {
        let raw: RawMap = serde_json::from_str(json)?;
        if raw.rows.len() != raw.height as usize {
            return Err(MapError::RowCount { expected: raw.height, found: raw.rows.len() });
        }
        let map = Self::from_rows(&raw.rows, IVec2::from_array(raw.origin))?;
        if map.width != raw.width {
            return Err(MapError::RowWidth { row: 0, expected: raw.width, found: map.width as usize });
        }
        Ok(map)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, MapError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Serialize back to the JSON form accepted by [`GameMap::from_json`].
    pub fn to_json(&self) -> Result<String, MapError> {
        let rows = (0..self.height)
            .map(|y| (0..self.width).map(|x| self.get(x, y).to_char()).collect())
            .collect();
        let raw = RawMap {
            width: self.width,
            height: self.height,
            origin: self.origin.to_array(),
            rows,
        };
        Ok(serde_json::to_string_pretty(&raw)?)
    }

    #[inline]
    fn idx(&self, x: u32, y: u32) -> usize {
        assert!(
            x < self.width && y < self.height,
            "cell ({x}, {y}) outside {}x{} map",
            self.width,
            self.height
        );
        (x * self.height + y) as usize
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> TerrainKind {
        self.tiles[self.idx(x, y)]
    }

    #[inline]
    pub fn set(&mut self, x: u32, y: u32, kind: TerrainKind) {
        let i = self.idx(x, y);
        self.tiles[i] = kind;
    }
}

impl TerrainGrid for GameMap {
    fn width(&self) -> u32 { self.width }
    fn height(&self) -> u32 { self.height }
    fn origin(&self) -> IVec2 { self.origin }
    fn kind(&self, x: u32, y: u32) -> TerrainKind { self.get(x, y) }
}

impl fmt::Display for GameMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in 0..self.height {
            for x in 0..self.width {
                write!(f, "{}", self.get(x, y).to_char())?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
