//! Cell accumulation for the scanline rasterizer.
//!
//! Edges are walked in 24.8 fixed point. Every pixel an edge touches gets a
//! cell holding the signed height the edge covers in that pixel (`cover`)
//! and twice the covered area (`area`). Sweeping a row left to right and
//! summing `cover` yields the winding at each pixel.

pub(crate) const SUBPIXEL_SHIFT: i32 = 8;
pub(crate) const SUBPIXEL_SCALE: i32 = 1 << SUBPIXEL_SHIFT;
const SUBPIXEL_MASK: i32 = SUBPIXEL_SCALE - 1;

/// Longer horizontal runs are split to keep the products inside `i64`.
const DX_LIMIT: i64 = 16384 << SUBPIXEL_SHIFT;

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub(crate) struct Cell {
    pub x: i32,
    pub y: i32,
    pub cover: i32,
    pub area: i32,
}

#[derive(Debug, Default)]
pub(crate) struct CellBuffer {
    cells: Vec<Cell>,
    cur: Cell,
    sorted: bool,
}

impl CellBuffer {
    pub fn reset(&mut self) {
        self.cells.clear();
        self.cur = Cell::default();
        self.sorted = false;
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty() && self.cur.cover == 0 && self.cur.area == 0
    }

    #[inline]
    fn flush_cur(&mut self) {
        if self.cur.area | self.cur.cover != 0 {
            self.cells.push(self.cur);
        }
    }

    #[inline]
    fn set_cur(&mut self, x: i32, y: i32) {
        if self.cur.x != x || self.cur.y != y {
            self.flush_cur();
            self.cur = Cell { x, y, cover: 0, area: 0 };
        }
    }

    /// Part of an edge inside pixel row `ey`, with sub-row heights `y1`, `y2`.
    fn render_hline(&mut self, ey: i32, x1: i32, y1: i32, x2: i32, y2: i32) {
        let ex1 = x1 >> SUBPIXEL_SHIFT;
        let ex2 = x2 >> SUBPIXEL_SHIFT;
        let fx1 = x1 & SUBPIXEL_MASK;
        let fx2 = x2 & SUBPIXEL_MASK;

        if y1 == y2 {
            self.set_cur(ex2, ey);
            return;
        }

        if ex1 == ex2 {
            let delta = y2 - y1;
            self.cur.cover += delta;
            self.cur.area += (fx1 + fx2) * delta;
            return;
        }

        // Run spans several cells: distribute the height over them.
        let mut p = (SUBPIXEL_SCALE as i64 - fx1 as i64) * (y2 - y1) as i64;
        let mut first = SUBPIXEL_SCALE;
        let mut incr = 1;
        let mut dx = x2 as i64 - x1 as i64;
        if dx < 0 {
            p = fx1 as i64 * (y2 - y1) as i64;
            first = 0;
            incr = -1;
            dx = -dx;
        }

        let mut delta = (p / dx) as i32;
        let mut modulo = p % dx;
        if modulo < 0 {
            delta -= 1;
            modulo += dx;
        }

        self.cur.cover += delta;
        self.cur.area += (fx1 + first) * delta;

        let mut ex = ex1 + incr;
        self.set_cur(ex, ey);
        let mut y = y1 + delta;

        if ex != ex2 {
            let p = SUBPIXEL_SCALE as i64 * (y2 - y + delta) as i64;
            let mut lift = (p / dx) as i32;
            let mut rem = p % dx;
            if rem < 0 {
                lift -= 1;
                rem += dx;
            }
            modulo -= dx;

            while ex != ex2 {
                delta = lift;
                modulo += rem;
                if modulo >= 0 {
                    modulo -= dx;
                    delta += 1;
                }
                self.cur.cover += delta;
                self.cur.area += SUBPIXEL_SCALE * delta;
                y += delta;
                ex += incr;
                self.set_cur(ex, ey);
            }
        }
        delta = y2 - y;
        self.cur.cover += delta;
        self.cur.area += (fx2 + SUBPIXEL_SCALE - first) * delta;
    }

    /// Adds one edge in fixed-point coordinates.
    pub fn line(&mut self, x1: i32, y1: i32, x2: i32, y2: i32) {
        let dx = x2 as i64 - x1 as i64;
        if dx >= DX_LIMIT || dx <= -DX_LIMIT {
            let cx = ((x1 as i64 + x2 as i64) >> 1) as i32;
            let cy = ((y1 as i64 + y2 as i64) >> 1) as i32;
            self.line(x1, y1, cx, cy);
            self.line(cx, cy, x2, y2);
            return;
        }
        self.sorted = false;

        let dy = y2 as i64 - y1 as i64;
        let ex1 = x1 >> SUBPIXEL_SHIFT;
        let mut ey1 = y1 >> SUBPIXEL_SHIFT;
        let ey2 = y2 >> SUBPIXEL_SHIFT;
        let fy1 = y1 & SUBPIXEL_MASK;
        let fy2 = y2 & SUBPIXEL_MASK;

        self.set_cur(ex1, ey1);

        if ey1 == ey2 {
            self.render_hline(ey1, x1, fy1, x2, fy2);
            return;
        }

        let mut incr = 1;

        // Vertical edge: one cell per row, no horizontal walk.
        if dx == 0 {
            let ex = ex1;
            let two_fx = (x1 - (ex << SUBPIXEL_SHIFT)) << 1;
            let mut first = SUBPIXEL_SCALE;
            if dy < 0 {
                first = 0;
                incr = -1;
            }
            let mut delta = first - fy1;
            self.cur.cover += delta;
            self.cur.area += two_fx * delta;
            ey1 += incr;
            self.set_cur(ex, ey1);

            delta = first + first - SUBPIXEL_SCALE;
            let area = two_fx * delta;
            while ey1 != ey2 {
                self.cur.cover = delta;
                self.cur.area = area;
                ey1 += incr;
                self.set_cur(ex, ey1);
            }
            delta = fy2 - SUBPIXEL_SCALE + first;
            self.cur.cover += delta;
            self.cur.area += two_fx * delta;
            return;
        }

        let mut p = (SUBPIXEL_SCALE as i64 - fy1 as i64) * dx;
        let mut first = SUBPIXEL_SCALE;
        let mut dy_abs = dy;
        if dy < 0 {
            p = fy1 as i64 * dx;
            first = 0;
            incr = -1;
            dy_abs = -dy;
        }

        let mut delta = (p / dy_abs) as i32;
        let mut modulo = p % dy_abs;
        if modulo < 0 {
            delta -= 1;
            modulo += dy_abs;
        }

        let mut x_from = x1 + delta;
        self.render_hline(ey1, x1, fy1, x_from, first);
        ey1 += incr;
        self.set_cur(x_from >> SUBPIXEL_SHIFT, ey1);

        if ey1 != ey2 {
            let p = SUBPIXEL_SCALE as i64 * dx;
            let mut lift = (p / dy_abs) as i32;
            let mut rem = p % dy_abs;
            if rem < 0 {
                lift -= 1;
                rem += dy_abs;
            }
            modulo -= dy_abs;

            while ey1 != ey2 {
                delta = lift;
                modulo += rem;
                if modulo >= 0 {
                    modulo -= dy_abs;
                    delta += 1;
                }
                let x_to = x_from + delta;
                self.render_hline(ey1, x_from, SUBPIXEL_SCALE - first, x_to, first);
                x_from = x_to;
                ey1 += incr;
                self.set_cur(x_from >> SUBPIXEL_SHIFT, ey1);
            }
        }
        self.render_hline(ey1, x_from, SUBPIXEL_SCALE - first, x2, fy2);
    }

    /// Finishes accumulation and orders cells by row, then column.
    pub fn sorted_cells(&mut self) -> &[Cell] {
        if !self.sorted {
            self.flush_cur();
            self.cur = Cell { x: i32::MIN, y: i32::MIN, cover: 0, area: 0 };
            self.cells.sort_unstable_by_key(|c| (c.y, c.x));
            self.sorted = true;
        }
        &self.cells
    }
}
