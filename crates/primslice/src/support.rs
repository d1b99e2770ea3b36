//! Support structure generation.
//!
//! Regions are rasterised onto a grid of cells over the model footprint.
//! A cell centre that is printed on one layer but has no material within
//! the overhang allowance on the layer below is an overhang; support
//! columns grow downward from overhang cells.

use primslice_math::{distance_to_segment, Point2};

use crate::path::{Bounds2, Polyline, SliceGeometry};
use crate::settings::{PrinterSettings, SupportType};

/// Grid cells per axis are capped at this.
const MAX_CELLS_PER_AXIS: usize = 2_000;

/// Settings for support generation.
#[derive(Debug, Clone, Copy)]
pub struct SupportSettings {
    /// Where support may stand.
    pub support_type: SupportType,
    /// Overhang angle threshold (degrees from vertical).
    pub overhang_angle: f64,
    /// Support density (0 to 100).
    pub density: f64,
    /// XY distance between support and model (mm).
    pub xy_distance: f64,
    /// Bead width (mm).
    pub line_width: f64,
    /// Layer height (mm).
    pub layer_height: f64,
}

impl SupportSettings {
    /// Support settings from printer settings.
    pub fn from_printer(settings: &PrinterSettings) -> Self {
        Self {
            support_type: settings.support_type,
            overhang_angle: settings.support_overhang_angle,
            density: settings.support_density,
            xy_distance: settings.support_xy_distance,
            line_width: settings.extrusion_width,
            layer_height: settings.layer_height,
        }
    }

    /// Horizontal reach a layer may extend past the one below unsupported.
    pub fn overhang_allowance(&self) -> f64 {
        self.layer_height * self.overhang_angle.to_radians().tan()
    }

    /// Distance between support lines and grid cells (mm).
    pub fn pitch(&self) -> f64 {
        self.line_width / (self.density.clamp(1e-3, 100.0) / 100.0)
    }
}

impl Default for SupportSettings {
    fn default() -> Self {
        Self::from_printer(&PrinterSettings::default())
    }
}

/// Support paths for one layer.
#[derive(Debug, Clone, Default)]
pub struct SupportLayer {
    /// Rows of support, boustrophedon order.
    pub paths: Vec<Polyline>,
    /// Number of supported cells.
    pub cells: usize,
}

impl SupportLayer {
    /// True if the layer has no support.
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// Raster over an XY footprint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SupportGrid {
    origin: Point2,
    pitch: f64,
    cols: usize,
    rows: usize,
}

impl SupportGrid {
    /// Grid of `pitch`-sized cells covering `footprint`.
    pub fn new(footprint: &Bounds2, pitch: f64) -> Option<Self> {
        if pitch.is_nan() || pitch <= 0.0 || footprint.width() < 0.0 || footprint.depth() < 0.0 {
            return None;
        }
        let count = |extent: f64| ((extent / pitch).ceil() as usize).clamp(1, MAX_CELLS_PER_AXIS);
        let cols = count(footprint.width());
        let rows = count(footprint.depth());
        // Centre the raster on the footprint.
        let origin = Point2::new(
            footprint.center().x - cols as f64 * pitch / 2.0,
            footprint.center().y - rows as f64 * pitch / 2.0,
        );
        Some(Self {
            origin,
            pitch,
            cols,
            rows,
        })
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.cols * self.rows
    }

    /// True for a grid without cells.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Centre of cell (`col`, `row`).
    pub fn cell_center(&self, col: usize, row: usize) -> Point2 {
        Point2::new(
            self.origin.x + (col as f64 + 0.5) * self.pitch,
            self.origin.y + (row as f64 + 0.5) * self.pitch,
        )
    }

    fn centers(&self) -> impl Iterator<Item = Point2> + '_ {
        (0..self.rows).flat_map(move |r| (0..self.cols).map(move |c| self.cell_center(c, r)))
    }

    /// Mark cells whose centre lies in `geometry` or within `margin` of it.
    pub fn occupancy(&self, geometry: &SliceGeometry, margin: f64) -> Vec<bool> {
        if geometry.is_empty() {
            return vec![false; self.len()];
        }
        self.centers().map(|p| near_region(geometry, &p, margin)).collect()
    }
}

/// Is `p` inside `geometry` or within `margin` of its boundary?
fn near_region(geometry: &SliceGeometry, p: &Point2, margin: f64) -> bool {
    if geometry.contains(p) {
        return true;
    }
    margin > 0.0
        && geometry.polygons.iter().any(|poly| {
            let n = poly.points.len();
            (0..n).any(|i| distance_to_segment(p, &poly.points[i], &poly.points[(i + 1) % n]) <= margin)
        })
}

/// Overhang cells of `current` relative to the layer below.
///
/// A cell is an overhang when its centre is inside `current` and no part
/// of `prev` lies within the overhang allowance of it.
pub fn detect_overhangs(
    grid: &SupportGrid,
    prev: &SliceGeometry,
    current: &SliceGeometry,
    settings: &SupportSettings,
) -> Vec<bool> {
    let allowance = settings.overhang_allowance();
    grid.centers()
        .map(|p| current.contains(&p) && !near_region(prev, &p, allowance))
        .collect()
}

/// Plan support for every layer of a model.
///
/// `layers` are the model cross-sections bottom to top and `footprint`
/// covers all of them. The result has one entry per layer.
pub fn plan_support(
    layers: &[SliceGeometry],
    footprint: &Bounds2,
    settings: &SupportSettings,
) -> Vec<SupportLayer> {
    let mut result = vec![SupportLayer::default(); layers.len()];
    if settings.support_type == SupportType::None || layers.len() < 2 {
        return result;
    }
    let Some(grid) = SupportGrid::new(footprint, settings.pitch()) else {
        return result;
    };

    let occupied: Vec<Vec<bool>> = layers
        .iter()
        .map(|g| grid.occupancy(g, settings.xy_distance))
        .collect();

    // First layer rests on the bed.
    let mut overhangs: Vec<Vec<bool>> = vec![vec![false; grid.len()]];
    overhangs.extend(
        layers
            .windows(2)
            .map(|pair| detect_overhangs(&grid, &pair[0], &pair[1], settings)),
    );

    // Cells with a clear line of sight down to the bed.
    let mut clear_to_bed: Vec<Vec<bool>> = Vec::with_capacity(layers.len());
    for (j, occ) in occupied.iter().enumerate() {
        let row: Vec<bool> = match j {
            0 => occ.iter().map(|o| !o).collect(),
            _ => clear_to_bed[j - 1].iter().zip(occ).map(|(c, o)| *c && !o).collect(),
        };
        clear_to_bed.push(row);
    }

    let mut needed = vec![false; grid.len()];
    for j in (0..layers.len()).rev() {
        let cells: Vec<bool> = (0..grid.len())
            .map(|i| {
                needed[i]
                    && match settings.support_type {
                        SupportType::TouchingBuildplate => clear_to_bed[j][i],
                        _ => !occupied[j][i],
                    }
            })
            .collect();
        result[j] = support_rows(&grid, &cells, settings.line_width);

        for i in 0..grid.len() {
            if occupied[j][i] {
                needed[i] = false;
            }
            if overhangs[j][i] {
                needed[i] = true;
            }
        }
    }

    result
}

/// Merge contiguous supported cells into rows, alternating direction.
fn support_rows(grid: &SupportGrid, cells: &[bool], line_width: f64) -> SupportLayer {
    let mut layer = SupportLayer {
        paths: Vec::new(),
        cells: cells.iter().filter(|c| **c).count(),
    };
    if layer.cells == 0 {
        return layer;
    }

    let half = line_width / 2.0;
    for row in 0..grid.rows {
        let mut runs: Vec<Polyline> = Vec::new();
        let mut col = 0;
        while col < grid.cols {
            if !cells[row * grid.cols + col] {
                col += 1;
                continue;
            }
            let first = col;
            while col + 1 < grid.cols && cells[row * grid.cols + col + 1] {
                col += 1;
            }
            let a = grid.cell_center(first, row);
            let b = grid.cell_center(col, row);
            runs.push(Polyline::new(vec![
                Point2::new(a.x - half, a.y),
                Point2::new(b.x + half, b.y),
            ]));
            col += 1;
        }
        if layer.paths.len() % 2 == 1 {
            runs.reverse();
            runs.iter_mut().for_each(Polyline::reverse);
        }
        layer.paths.extend(runs);
    }
    layer
}
