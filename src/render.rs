use crate::types::{Bounds, Container};

const MAX_WIDTH: f64 = 80.0;
const MAX_HEIGHT: f64 = 40.0;

/// ASCII drawing of the container and its rectangles, y axis pointing up.
/// Anything outside the container is clipped.
pub fn render_container(container: &Container) -> String {
    let scale = f64::min(
        MAX_WIDTH / container.width(),
        MAX_HEIGHT / container.height(),
    );
    let grid_w = (container.width() * scale).round() as usize;
    let grid_h = (container.height() * scale).round() as usize;

    if grid_w == 0 || grid_h == 0 {
        return String::new();
    }

    let mut grid = vec![vec![' '; grid_w + 1]; grid_h + 1];

    // Draw container border first
    draw_rect(&mut grid, 0, 0, grid_w, grid_h);

    let origin = container.bounds();
    for rect in container.rectangles() {
        let Some((sx, sy, sw, sh)) = to_cells(&rect.bounds(), &origin, scale, grid_w, grid_h)
        else {
            continue;
        };
        if sw == 0 || sh == 0 {
            continue;
        }

        draw_rect(&mut grid, sx, sy, sw, sh);

        // Label
        let label_chars: Vec<char> = rect.name().chars().collect();
        if sw > 2 && sh > 0 {
            let cx = sx + sw / 2;
            let cy = sy + sh / 2;
            let half = label_chars.len() / 2;
            let start_x = cx.saturating_sub(half);

            for (i, &ch) in label_chars.iter().enumerate() {
                let x = start_x + i;
                if x > sx && x < sx + sw && cy > sy && cy < sy + sh {
                    grid[cy][x] = ch;
                }
            }
        }
    }

    // Row 0 is y = 0, print top row first
    let mut result = String::new();
    for row in grid.iter().rev() {
        let line: String = row.iter().collect();
        result.push_str(line.trim_end());
        result.push('\n');
    }
    result
}

/// Grid cells covered by `bounds`, clipped to the container. `None` if nothing is visible.
fn to_cells(
    bounds: &Bounds,
    origin: &Bounds,
    scale: f64,
    grid_w: usize,
    grid_h: usize,
) -> Option<(usize, usize, usize, usize)> {
    let x0 = ((bounds.x - origin.x) * scale).round().max(0.0);
    let y0 = ((bounds.y - origin.y) * scale).round().max(0.0);
    let x1 = ((bounds.x + bounds.width - origin.x) * scale)
        .round()
        .min(grid_w as f64);
    let y1 = ((bounds.y + bounds.height - origin.y) * scale)
        .round()
        .min(grid_h as f64);

    if x1 <= x0 || y1 <= y0 {
        return None;
    }
    Some((
        x0 as usize,
        y0 as usize,
        (x1 - x0) as usize,
        (y1 - y0) as usize,
    ))
}

#[allow(clippy::needless_range_loop)]
fn draw_rect(grid: &mut [Vec<char>], x: usize, y: usize, w: usize, h: usize) {
    let rows = grid.len();
    let cols = if rows > 0 { grid[0].len() } else { return };

    let horizontal = |c: char| if c == '|' || c == '+' { '+' } else { '-' };
    let vertical = |c: char| if c == '-' || c == '+' { '+' } else { '|' };

    for i in x..=x + w {
        if i < cols {
            if y < rows {
                grid[y][i] = horizontal(grid[y][i]);
            }
            if y + h < rows {
                grid[y + h][i] = horizontal(grid[y + h][i]);
            }
        }
    }

    for j in y..=y + h {
        if j < rows {
            if x < cols {
                grid[j][x] = vertical(grid[j][x]);
            }
            if x + w < cols {
                grid[j][x + w] = vertical(grid[j][x + w]);
            }
        }
    }

    for &cx in &[x, x + w] {
        for &cy in &[y, y + h] {
            if cy < rows && cx < cols {
                grid[cy][cx] = '+';
            }
        }
    }
}
