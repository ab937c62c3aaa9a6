// SPDX-FileCopyrightText: 2026 hexide contributors
// SPDX-License-Identifier: MIT

use rstest::rstest;

use super::{PanelArena, PanelSide, Rect, Viewport, BAR_HEIGHT, PANEL_UNSIZED};

fn arena_with(panels: &[(PanelSide, i32, bool)]) -> PanelArena {
    let mut arena = PanelArena::new();
    for &(side, width, visible) in panels {
        let id = arena.create(side);
        let panel = arena.get_mut(id).unwrap();
        panel.width = width;
        panel.visible = visible;
    }
    arena
}

#[test]
fn aggregate_width_sums_only_sized_visible_panels_on_side() {
    let arena = arena_with(&[
        (PanelSide::Left, 10, true),
        (PanelSide::Left, PANEL_UNSIZED, true),
        (PanelSide::Left, 4, false),
        (PanelSide::Right, 7, true),
        (PanelSide::None, 99, true),
    ]);
    assert_eq!(arena.aggregate_width(PanelSide::Left), 10);
    assert_eq!(arena.aggregate_width(PanelSide::Right), 7);
    assert_eq!(arena.aggregate_width(PanelSide::None), 99);
    assert_eq!(arena.aggregate_width(PanelSide::Top), 0);
}

#[test]
fn panel_ids_are_stable_as_panels_are_added() {
    let mut arena = PanelArena::new();
    let first = arena.create(PanelSide::Left);
    arena.get_mut(first).unwrap().width = 8;
    let second = arena.create(PanelSide::Right);
    assert_ne!(first, second);
    assert_eq!(arena.get(first).unwrap().width, 8);
    assert_eq!(arena.get(second).unwrap().width, PANEL_UNSIZED);
}

#[test]
fn viewport_splits_bar_from_main() {
    let viewport = Viewport::from_terminal(80, 24);
    assert_eq!(viewport.bar(), Rect::new(0, 24 - BAR_HEIGHT, 80, BAR_HEIGHT));
    assert_eq!(viewport.main(), Rect::new(0, 0, 80, 24 - BAR_HEIGHT));
}

#[test]
fn resize_is_idempotent() {
    let mut viewport = Viewport::from_terminal(80, 24);
    let before = viewport;
    viewport.on_resize(80, 24);
    assert_eq!(viewport, before);

    viewport.on_resize(100, 30);
    viewport.on_resize(100, 30);
    assert_eq!(viewport.main(), Rect::new(0, 0, 100, 28));
}

#[test]
fn hex_region_is_offset_and_shrunk_by_panels() {
    let viewport = Viewport::from_terminal(80, 24);
    let arena = arena_with(&[(PanelSide::Left, 10, true), (PanelSide::Right, 16, true)]);
    assert_eq!(viewport.hex_x(&arena), 10);
    assert_eq!(viewport.hex_y(), 0);
    assert_eq!(viewport.hex_width(&arena), 80 - 10 - 16);
    assert_eq!(viewport.hex_height(), 22);
}

#[rstest]
#[case(80, 17)] // (80 - 10) / 4; right panels do not narrow the byte count
#[case(12, 0)] // panels eat the whole width
#[case(11, 0)]
#[case(14, 1)]
fn bytes_per_row_uses_left_aggregate_only(#[case] width: u16, #[case] expected: u64) {
    let viewport = Viewport::from_terminal(width, 24);
    let arena = arena_with(&[(PanelSide::Left, 10, true), (PanelSide::Right, 60, true)]);
    assert_eq!(viewport.bytes_per_row(&arena), expected);
}

#[test]
fn degenerate_terminal_sizes_clamp_to_zero() {
    let viewport = Viewport::from_terminal(0, 1);
    assert_eq!(viewport.main().height, 0);
    assert_eq!(viewport.hex_height(), 0);
    let arena = PanelArena::new();
    assert_eq!(viewport.bytes_per_row(&arena), 0);
    assert_eq!(viewport.hex_width(&arena), 0);
}
