use battlemap::renderer::autotile::{
    Neighbourhood, SubtileIndices, Subtile, TileStyle, Variant, resolve,
};
use battlemap::{GameMap, TerrainKind};
use glam::IVec2;

fn map(rows: &[&str]) -> GameMap {
    GameMap::from_rows(rows, IVec2::ZERO).unwrap()
}

fn variants(idx: &SubtileIndices, x: u32, y: u32) -> [[Variant; 4]; 4] {
    let mut out = [[Variant::Empty; 4]; 4];
    for sy in 0..4 {
        for sx in 0..4 {
            out[sy as usize][sx as usize] = idx.get(x, y, sx, sy).variant;
        }
    }
    out
}

// ── Sizing ────────────────────────────────────────────────────────────────

#[test]
fn buffer_length_is_sixteen_per_cell() {
    for (w, h) in [(1, 1), (3, 1), (1, 5), (7, 4)] {
        let m = GameMap::new(w, h, IVec2::ZERO);
        assert_eq!(resolve(&m).as_bytes().len(), (16 * w * h) as usize, "{w}x{h}");
    }
}

// ── Island / runs ─────────────────────────────────────────────────────────

#[test]
fn single_road_cell_is_an_island() {
    use Variant::{Corner as C, Empty as E};
    let idx = resolve(&map(&["="]));
    assert_eq!(
        variants(&idx, 0, 0),
        [[E, E, E, E], [E, C, C, E], [E, C, C, E], [E, E, E, E]]
    );
}

#[test]
fn horizontal_run_middle_cell_bridges_left_and_right() {
    let idx = resolve(&map(&["==="]));
    let v = variants(&idx, 1, 0);
    // Left bridge (0,1),(0,2) and right bridge (3,1),(3,2).
    assert_eq!([v[1][0], v[2][0]], [Variant::Edge; 2]);
    assert_eq!([v[1][3], v[2][3]], [Variant::Edge; 2]);
    // No rows above or below: top/bottom bridges and all corners empty.
    assert_eq!([v[0][1], v[0][2], v[3][1], v[3][2]], [Variant::Empty; 4]);
    assert_eq!([v[0][0], v[0][3], v[3][0], v[3][3]], [Variant::Empty; 4]);
}

#[test]
fn run_ends_only_bridge_inward() {
    let idx = resolve(&map(&["==="]));
    let left_end = variants(&idx, 0, 0);
    assert_eq!(left_end[1][0], Variant::Empty);
    assert_eq!(left_end[1][3], Variant::Edge);
    // Left-facing centers see open top+left and bottom+left.
    assert_eq!(left_end[1][1], Variant::Corner);
    assert_eq!(left_end[2][1], Variant::Corner);
    // Right-facing centers have a neighbour to the right.
    assert_eq!(left_end[1][2], Variant::Edge);
    assert_eq!(left_end[2][2], Variant::Edge);
}

#[test]
fn solid_block_interior_cell_uses_corner_bridges() {
    let idx = resolve(&map(&["###", "###", "###"]));
    let v = variants(&idx, 1, 1);
    for (sy, row) in v.iter().enumerate() {
        for (sx, &variant) in row.iter().enumerate() {
            let center = (1..3).contains(&sx) && (1..3).contains(&sy);
            assert_eq!(
                variant,
                if center { Variant::Edge } else { Variant::Corner },
                "({sx}, {sy})"
            );
        }
    }
}

#[test]
fn l_turn_gets_corner_on_inner_side_only() {
    // ==
    // =.
    let idx = resolve(&map(&["==", "=."]));
    let corner = variants(&idx, 0, 0);
    // Right and bottom neighbours match, but the diagonal (1,1) is land.
    assert_eq!(corner[3][3], Variant::Empty);
    assert_eq!(corner[1][3], Variant::Edge);
    assert_eq!(corner[3][1], Variant::Edge);
    assert_eq!(corner[2][2], Variant::Edge);
    assert_eq!(corner[1][1], Variant::Corner);
}

// ── Diagonal guard ────────────────────────────────────────────────────────

#[test]
fn diagonal_only_neighbour_does_not_join() {
    // (0,0) and (1,1) are road; (1,0) and (0,1) are not.
    let m = map(&["=.", ".="]);
    let n = Neighbourhood::of(&m, 0, 0);
    assert!(!n.bottom_right);
    let v = variants(&resolve(&m), 0, 0);
    assert_eq!(v[3][3], Variant::Empty);
    let v = variants(&resolve(&m), 1, 1);
    assert_eq!(v[0][0], Variant::Empty);
}

#[test]
fn diagonal_needs_both_edges_not_just_one() {
    // (0,0),(1,0),(1,1) road, (0,1) land: only one bridging edge for (0,0)→(1,1).
    let m = map(&["==", ".="]);
    let n = Neighbourhood::of(&m, 0, 0);
    assert!(n.right && !n.bottom);
    assert!(!n.bottom_right);
}

#[test]
fn diagonal_joins_when_square_is_filled() {
    let m = map(&["==", "=="]);
    let n = Neighbourhood::of(&m, 0, 0);
    assert!(n.bottom_right);
    assert_eq!(variants(&resolve(&m), 0, 0)[3][3], Variant::Corner);
}

// ── Atlas selector ────────────────────────────────────────────────────────

#[test]
fn atlas_bit_follows_terrain_kind() {
    let m = map(&["=#.", "##=", "=.="]);
    let idx = resolve(&m);
    for x in 0..3 {
        for y in 0..3 {
            for sx in 0..4 {
                for sy in 0..4 {
                    let road_bit = idx.as_bytes()[idx.offset(x, y, sx, sy)] & 0b100 != 0;
                    assert_eq!(road_bit, m.get(x, y) == TerrainKind::Road, "({x},{y},{sx},{sy})");
                }
            }
        }
    }
}

#[test]
fn land_cells_stay_zero_next_to_roads() {
    let m = map(&["=.="]);
    let idx = resolve(&m);
    for sx in 0..4 {
        for sy in 0..4 {
            assert_eq!(idx.get(1, 0, sx, sy), Subtile::default());
        }
    }
}

#[test]
fn road_and_void_do_not_join_each_other() {
    let idx = resolve(&map(&["=#"]));
    let road = variants(&idx, 0, 0);
    let wall = variants(&idx, 1, 0);
    assert_eq!(road[1][3], Variant::Empty);
    assert_eq!(wall[1][0], Variant::Empty);
    assert_eq!(idx.get(1, 0, 1, 1).style, TileStyle::Void);
    assert_eq!(idx.get(0, 0, 1, 1).style, TileStyle::Road);
}

#[test]
fn centers_are_never_empty() {
    let m = map(&["=#=#", "##==", "=.#=", "===="]);
    let idx = resolve(&m);
    for x in 0..4 {
        for y in 0..4 {
            if !m.get(x, y).is_autotiled() {
                continue;
            }
            for (sx, sy) in [(1, 1), (1, 2), (2, 1), (2, 2)] {
                assert_ne!(idx.get(x, y, sx, sy).variant, Variant::Empty, "({x},{y})");
            }
        }
    }
}

// ── Determinism ───────────────────────────────────────────────────────────

#[test]
fn resolving_twice_is_byte_identical() {
    let m = map(&["=#=#", "##==", "=.#=", "===="]);
    assert_eq!(resolve(&m).as_bytes(), resolve(&m).as_bytes());
}

#[test]
#[should_panic]
fn access_outside_map_panics() {
    let idx = resolve(&map(&["=="]));
    idx.get(0, 1, 0, 0);
}
