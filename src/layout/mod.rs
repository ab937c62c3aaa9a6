// SPDX-FileCopyrightText: 2026 hexide contributors
// SPDX-License-Identifier: MIT

//! Screen-space geometry: the status bar, the main drawing surface, the
//! derived hex region, and the panel arena.
//!
//! Everything here is pure arithmetic over the current terminal size and the
//! registered panels. Degenerate sizes (a terminal narrower than the panels,
//! or shorter than the bar) clamp to zero instead of failing.

use std::fmt;

/// Columns consumed per rendered byte. The hex pane divides its width by
/// this to get bytes per row; see the offsets/ascii plugins for the
/// rendering convention it assumes.
pub const BYTES_PER_COLUMN: u16 = 4;

/// The status bar is pinned to the bottom two terminal rows.
pub const BAR_HEIGHT: u16 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl Rect {
    pub fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self { x, y, width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelSide {
    None,
    Left,
    Right,
    /// Reserved; top panels take part in no geometry yet.
    Top,
    /// Reserved; bottom panels take part in no geometry yet.
    Bottom,
}

impl PanelSide {
    pub fn from_index(value: i64) -> Option<Self> {
        match value {
            0 => Some(Self::None),
            1 => Some(Self::Right),
            2 => Some(Self::Left),
            3 => Some(Self::Top),
            4 => Some(Self::Bottom),
            _ => None,
        }
    }

    pub fn index(self) -> i64 {
        match self {
            Self::None => 0,
            Self::Right => 1,
            Self::Left => 2,
            Self::Top => 3,
            Self::Bottom => 4,
        }
    }
}

/// Width/height of `-1` means "no explicit size"; unsized panels are skipped
/// when side widths are aggregated.
pub const PANEL_UNSIZED: i32 = -1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Panel {
    pub side: PanelSide,
    pub width: i32,
    pub height: i32,
    /// Offsets relative to the hex region origin.
    pub x: i32,
    pub y: i32,
    pub visible: bool,
}

impl Panel {
    pub fn new(side: PanelSide) -> Self {
        Self {
            side,
            width: PANEL_UNSIZED,
            height: PANEL_UNSIZED,
            x: PANEL_UNSIZED,
            y: PANEL_UNSIZED,
            visible: true,
        }
    }

    fn counts_toward(&self, side: PanelSide) -> bool {
        self.side == side && self.visible && self.width != PANEL_UNSIZED
    }
}

/// Stable handle into the [`PanelArena`]. Ids are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PanelId(usize);

impl PanelId {
    pub fn from_raw(raw: usize) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> usize {
        self.0
    }
}

impl fmt::Display for PanelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "panel#{}", self.0)
    }
}

/// Panels held by stable id. Callbacks attached to panels live in the
/// extension registries, keyed by the same ids, so nothing here aliases the
/// window that composites the panels.
#[derive(Debug, Default)]
pub struct PanelArena {
    panels: Vec<Panel>,
}

impl PanelArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self, side: PanelSide) -> PanelId {
        self.panels.push(Panel::new(side));
        PanelId(self.panels.len() - 1)
    }

    pub fn get(&self, id: PanelId) -> Option<&Panel> {
        self.panels.get(id.0)
    }

    pub fn get_mut(&mut self, id: PanelId) -> Option<&mut Panel> {
        self.panels.get_mut(id.0)
    }

    pub fn ids(&self) -> impl Iterator<Item = PanelId> + '_ {
        (0..self.panels.len()).map(PanelId)
    }

    pub fn len(&self) -> usize {
        self.panels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.panels.is_empty()
    }

    /// Sum of explicit widths of visible panels on `side`. Order has no
    /// effect; negative widths other than the unsized sentinel count as zero.
    pub fn aggregate_width(&self, side: PanelSide) -> u16 {
        self.panels
            .iter()
            .filter(|p| p.counts_toward(side))
            .map(|p| u16::try_from(p.width).unwrap_or(0) as u32)
            .sum::<u32>()
            .min(u32::from(u16::MAX)) as u16
    }
}

/// The screen split: a full-width status bar anchored to the bottom and the
/// main surface above it, from which the hex region is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    main: Rect,
    bar: Rect,
}

impl Viewport {
    pub fn from_terminal(width: u16, height: u16) -> Self {
        let mut viewport = Self { main: Rect::default(), bar: Rect::default() };
        viewport.on_resize(width, height);
        viewport
    }

    /// Recomputes both regions for a new terminal size. Safe to call with an
    /// unchanged size; the result depends only on the arguments.
    pub fn on_resize(&mut self, width: u16, height: u16) {
        self.bar = Rect::new(0, height.saturating_sub(BAR_HEIGHT), width, BAR_HEIGHT);
        self.main = Rect::new(0, 0, width, height.saturating_sub(BAR_HEIGHT));
    }

    pub fn main(&self) -> Rect {
        self.main
    }

    pub fn bar(&self) -> Rect {
        self.bar
    }

    pub fn hex_x(&self, panels: &PanelArena) -> u16 {
        self.main.x.saturating_add(panels.aggregate_width(PanelSide::Left))
    }

    pub fn hex_y(&self) -> u16 {
        self.main.y
    }

    pub fn hex_width(&self, panels: &PanelArena) -> u16 {
        self.main
            .width
            .saturating_sub(panels.aggregate_width(PanelSide::Left))
            .saturating_sub(panels.aggregate_width(PanelSide::Right))
    }

    pub fn hex_height(&self) -> u16 {
        self.main.height
    }

    /// Bytes rendered per hex row. Zero when the panels leave no room; the
    /// cursor controller treats that as "no byte content".
    pub fn bytes_per_row(&self, panels: &PanelArena) -> u64 {
        let usable = self.main.width.saturating_sub(panels.aggregate_width(PanelSide::Left));
        u64::from(usable / BYTES_PER_COLUMN)
    }
}

#[cfg(test)]
mod tests;
