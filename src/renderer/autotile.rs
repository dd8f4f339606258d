// =============================================================================
// AUTOTILE.RS — Sub-tile selection for continuous roads and walls
//
// Every map cell is drawn as a 4×4 block of fragments. For each ROAD or VOID
// cell we look at its 8 neighbours and pick, per fragment, one of three master
// variants (empty, edge, corner) so that runs of matching cells join into one
// continuous shape:
//
//   (0,0) (1,0) (2,0) (3,0)      corner  bridge  bridge  corner
//   (0,1) (1,1) (2,1) (3,1)      bridge  center  center  bridge
//   (0,2) (1,2) (2,2) (3,2)      bridge  center  center  bridge
//   (0,3) (1,3) (2,3) (3,3)      corner  bridge  bridge  corner
//
// A diagonal neighbour only counts when both orthogonal cells between it and
// us also match, so two cells touching only at a corner never join.
// =============================================================================

use crate::terrain::{TerrainGrid, TerrainKind};

/// Sub-cells per side of a map cell.
pub const SUBTILES: u32 = 4;

/// Master tile variants in each atlas.
pub const VARIANTS: u32 = 3;

const VARIANT_MASK: u8 = 0b011;
const ROAD_BIT: u8 = 0b100;

// ── Variant / TileStyle ───────────────────────────────────────────────────────

/// Which master tile a fragment is cut from. The discriminant is the master's
/// slot in the atlas and the low two bits of a packed sub-tile byte.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Variant {
    #[default]
    Empty = 0,
    Edge = 1,
    Corner = 2,
}

/// Which atlas a fragment is cut from. Bit 2 of a packed sub-tile byte.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum TileStyle {
    #[default]
    Void,
    Road,
}

// ── Subtile ───────────────────────────────────────────────────────────────────

/// Fragment selection for one sub-cell.
///
/// Packed layout:
/// ```text
/// bit  7 6 5 4 3 | 2     | 1 0
///      unused    | atlas | variant
///                  0 = void, 1 = road
///                          0 = empty, 1 = edge, 2 = corner
/// ```
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Subtile {
    pub variant: Variant,
    pub style: TileStyle,
}

impl Subtile {
    pub const fn new(variant: Variant, style: TileStyle) -> Self {
        Self { variant, style }
    }

    #[inline]
    pub fn pack(self) -> u8 {
        let atlas = match self.style {
            TileStyle::Void => 0,
            TileStyle::Road => ROAD_BIT,
        };
        self.variant as u8 | atlas
    }

    /// Decode a packed byte.
    ///
    /// # Panics
    /// Panics on variant bits `0b11`, which the resolver never writes.
    #[inline]
    pub fn unpack(byte: u8) -> Self {
        let variant = match byte & VARIANT_MASK {
            0 => Variant::Empty,
            1 => Variant::Edge,
            2 => Variant::Corner,
            bits => panic!("invalid sub-tile variant bits {bits:#04b} in {byte:#010b}"),
        };
        let style = if byte & ROAD_BIT != 0 { TileStyle::Road } else { TileStyle::Void };
        Self { variant, style }
    }
}

// ── SubtileIndices ────────────────────────────────────────────────────────────

/// Packed sub-tile selections for a whole map, `16 · width · height` bytes.
///
/// Sub-cell `(sx, sy)` of cell `(x, y)` lives at
/// `(x·4 + sx) · height·4 + (y·4 + sy)`, i.e. the buffer is column-major over
/// the map's sub-cell grid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubtileIndices {
    width: u32,
    height: u32,
    bytes: Vec<u8>,
}

impl SubtileIndices {
    /// All sub-cells set to 0 (void atlas, empty variant).
    pub fn new(width: u32, height: u32) -> Self {
        let len = (SUBTILES * SUBTILES * width * height) as usize;
        Self { width, height, bytes: vec![0; len] }
    }

    #[inline]
    pub fn width(&self) -> u32 { self.width }

    #[inline]
    pub fn height(&self) -> u32 { self.height }

    /// Buffer offset of sub-cell `(sx, sy)` in cell `(x, y)`.
    ///
    /// # Panics
    /// Panics on any coordinate outside the map or the 4×4 sub-grid.
    #[inline]
    pub fn offset(&self, x: u32, y: u32, sx: u32, sy: u32) -> usize {
        assert!(
            x < self.width && y < self.height && sx < SUBTILES && sy < SUBTILES,
            "sub-tile ({x}, {y}, {sx}, {sy}) outside {}x{} map",
            self.width,
            self.height
        );
        ((x * SUBTILES + sx) * self.height * SUBTILES + (y * SUBTILES + sy)) as usize
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32, sx: u32, sy: u32) -> Subtile {
        Subtile::unpack(self.bytes[self.offset(x, y, sx, sy)])
    }

    #[inline]
    pub fn set(&mut self, x: u32, y: u32, sx: u32, sy: u32, subtile: Subtile) {
        let i = self.offset(x, y, sx, sy);
        self.bytes[i] = subtile.pack();
    }

    /// Raw packed bytes in storage order.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Write all 16 sub-cells of cell `(x, y)`; `block[sy][sx]`.
    fn set_cell(&mut self, x: u32, y: u32, block: &[[Variant; 4]; 4], style: TileStyle) {
        for (sy, row) in block.iter().enumerate() {
            for (sx, &variant) in row.iter().enumerate() {
                self.set(x, y, sx as u32, sy as u32, Subtile::new(variant, style));
            }
        }
    }
}

// ── Neighbourhood ─────────────────────────────────────────────────────────────

/// Which of a cell's 8 neighbours have the same terrain kind.
///
/// Out-of-bounds neighbours never match. Diagonals only match when both
/// adjoining orthogonals do.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Neighbourhood {
    pub top: bool,
    pub bottom: bool,
    pub left: bool,
    pub right: bool,
    pub top_left: bool,
    pub top_right: bool,
    pub bottom_left: bool,
    pub bottom_right: bool,
}

impl Neighbourhood {
    /// Inspect the neighbours of `(x, y)` in `grid`.
    pub fn of(grid: &impl TerrainGrid, x: u32, y: u32) -> Self {
        let here = grid.kind(x, y);
        let same = |dx: i32, dy: i32| -> bool {
            let nx = x as i64 + dx as i64;
            let ny = y as i64 + dy as i64;
            if nx < 0 || ny < 0 || nx >= grid.width() as i64 || ny >= grid.height() as i64 {
                return false;
            }
            grid.kind(nx as u32, ny as u32) == here
        };

        let top = same(0, -1);
        let bottom = same(0, 1);
        let left = same(-1, 0);
        let right = same(1, 0);

        Self {
            top,
            bottom,
            left,
            right,
            top_left: top && left && same(-1, -1),
            top_right: top && right && same(1, -1),
            bottom_left: bottom && left && same(-1, 1),
            bottom_right: bottom && right && same(1, 1),
        }
    }

    /// Variants for the 4×4 block, indexed `[sy][sx]`.
    pub fn block(&self) -> [[Variant; 4]; 4] {
        use Variant::{Corner, Edge, Empty};

        let bridge = |diagonal: bool, orthogonal: bool| {
            if diagonal {
                Corner
            } else if orthogonal {
                Edge
            } else {
                Empty
            }
        };
        // Centers turn inward when both faced sides are open.
        let center = |a: bool, b: bool| if !a && !b { Corner } else { Edge };
        let corner = |diagonal: bool| if diagonal { Corner } else { Empty };

        let top = bridge(self.top_left || self.top_right, self.top);
        let bottom = bridge(self.bottom_left || self.bottom_right, self.bottom);
        let left = bridge(self.top_left || self.bottom_left, self.left);
        let right = bridge(self.top_right || self.bottom_right, self.right);

        [
            [corner(self.top_left), top, top, corner(self.top_right)],
            [left, center(self.top, self.left), center(self.top, self.right), right],
            [left, center(self.bottom, self.left), center(self.bottom, self.right), right],
            [corner(self.bottom_left), bottom, bottom, corner(self.bottom_right)],
        ]
    }
}

// ── resolve ───────────────────────────────────────────────────────────────────

/// Compute sub-tile selections for every cell of `grid`.
///
/// Cells that are neither ROAD nor VOID are left at 0. The result depends only
/// on the grid contents.
pub fn resolve(grid: &impl TerrainGrid) -> SubtileIndices {
    let (width, height) = (grid.width(), grid.height());
    let mut indices = SubtileIndices::new(width, height);
    let mut autotiled = 0usize;

    for x in 0..width {
        for y in 0..height {
            let kind = grid.kind(x, y);
            if !kind.is_autotiled() {
                continue;
            }
            let style = if kind == TerrainKind::Road { TileStyle::Road } else { TileStyle::Void };
            let block = Neighbourhood::of(grid, x, y).block();
            indices.set_cell(x, y, &block, style);
            autotiled += 1;
        }
    }

    log::debug!("resolved sub-tiles for {width}x{height} map ({autotiled} autotiled cells)");
    indices
}

// ── Tests ─────────────────────────────────────────────────────────────────────
