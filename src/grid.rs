use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A single cell of the occupancy grid.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum Cell {
    #[default]
    Free,
    Blocked,
}

impl Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Cell::Free => " ",
                Cell::Blocked => "X",
            }
        )
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub row: usize,
    pub col: usize,
}

/// A rectangular occupancy grid with designated start and end cells.
///
/// The map starts with every cell free, the start marker in the top-left
/// corner and the end marker in the bottom-right corner. Mutators are
/// permissive: out-of-bounds coordinates are silently ignored rather than
/// reported as errors, and the markers may be moved onto obstacles or onto
/// each other.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridMap {
    rows: usize,
    cols: usize,
    pub(crate) cells: Vec<Vec<Cell>>,
    start: Point,
    end: Point,
}

impl GridMap {
    pub fn new(rows: usize, cols: usize) -> Self {
        assert!(rows > 0 && cols > 0, "grid dimensions must be positive");

        Self {
            rows,
            cols,
            cells: vec![vec![Cell::Free; cols]; rows],
            start: Point { row: 0, col: 0 },
            end: Point {
                row: rows - 1,
                col: cols - 1,
            },
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn start(&self) -> Point {
        self.start
    }

    pub fn end(&self) -> Point {
        self.end
    }

    fn in_bounds(&self, row: usize, col: usize) -> bool {
        row < self.rows && col < self.cols
    }

    /// Flip the occupancy of a cell.
    ///
    /// The cells under the start and end markers cannot be toggled; those
    /// calls, like out-of-bounds ones, leave the map untouched.
    pub fn toggle_obstacle(&mut self, row: usize, col: usize) {
        if !self.in_bounds(row, col) {
            return;
        }
        let p = Point { row, col };
        if p == self.start || p == self.end {
            return;
        }
        self.cells[row][col] = match self.cells[row][col] {
            Cell::Free => Cell::Blocked,
            Cell::Blocked => Cell::Free,
        };
    }

    /// Move the start marker. The marker may land on an obstacle or on the
    /// end marker; out-of-bounds coordinates are ignored.
    pub fn set_start(&mut self, row: usize, col: usize) {
        if self.in_bounds(row, col) {
            self.start = Point { row, col };
        }
    }

    /// Move the end marker, with the same rules as [`GridMap::set_start`].
    pub fn set_end(&mut self, row: usize, col: usize) {
        if self.in_bounds(row, col) {
            self.end = Point { row, col };
        }
    }

    /// Whether the cell exists and is not blocked. Out-of-bounds
    /// coordinates are reported as not free rather than as an error.
    pub fn is_free(&self, row: usize, col: usize) -> bool {
        self.in_bounds(row, col) && self.cells[row][col] == Cell::Free
    }

    /// Re-dimension the map in place, keeping the overlapping region.
    ///
    /// New cells start free; the start and end markers are clamped into
    /// the new bounds.
    pub fn resize(&mut self, rows: usize, cols: usize) {
        assert!(rows > 0 && cols > 0, "grid dimensions must be positive");

        // create container for holding new cells
        let mut new_cells = vec![vec![Cell::default(); cols]; rows];

        // copy old cells into new container, or fill with default if new size is larger (already
        // done above)
        for row in 0..self.rows.min(rows) {
            for col in 0..self.cols.min(cols) {
                new_cells[row][col] = self.cells[row][col];
            }
        }

        self.rows = rows;
        self.cols = cols;
        self.cells = new_cells;
        self.start = Point {
            row: self.start.row.min(rows - 1),
            col: self.start.col.min(cols - 1),
        };
        self.end = Point {
            row: self.end.row.min(rows - 1),
            col: self.end.col.min(cols - 1),
        };
    }

    /// Create a per-cell scratch storage matching the map's dimensions.
    pub fn create_storage<T: Default + Copy + 'static>(&self) -> CellStorage<T> {
        CellStorage(vec![vec![T::default(); self.cols]; self.rows])
    }

    /// Render the map like [`Display`] with a route overlaid as `*`.
    pub fn render_path(&self, path: &[Point]) -> String {
        let mut out = String::with_capacity((self.cols + 1) * self.rows);
        for row in 0..self.rows {
            for col in 0..self.cols {
                let p = Point { row, col };
                out.push(if p == self.start {
                    'S'
                } else if p == self.end {
                    'E'
                } else if path.contains(&p) {
                    '*'
                } else if self.cells[row][col] == Cell::Blocked {
                    'X'
                } else {
                    ' '
                });
            }
            out.push('\n');
        }
        out
    }
}

impl Display for GridMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for row in 0..self.rows {
            for col in 0..self.cols {
                let p = Point { row, col };
                if p == self.start {
                    write!(f, "S")?;
                } else if p == self.end {
                    write!(f, "E")?;
                } else {
                    write!(f, "{}", self.cells[row][col])?;
                }
            }
            write!(f, "\n")?;
        }

        Ok(())
    }
}

impl FromStr for GridMap {
    type Err = anyhow::Error;

    /// Parse the ASCII format produced by [`Display`]: `X` or `#` for
    /// obstacles, space or `.` for free cells, optional `S`/`E` markers.
    /// Lines shorter than the widest one are padded with free cells.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lines: Vec<&str> = s.lines().filter(|line| !line.is_empty()).collect();
        anyhow::ensure!(!lines.is_empty(), "map must have at least one row");

        let rows = lines.len();
        let cols = lines
            .iter()
            .map(|line| line.chars().count())
            .max()
            .unwrap_or(0);
        anyhow::ensure!(cols > 0, "map must have at least one column");

        let mut map = GridMap::new(rows, cols);
        for (row, line) in lines.iter().enumerate() {
            for (col, ch) in line.chars().enumerate() {
                match ch {
                    ' ' | '.' => {}
                    'X' | '#' => map.cells[row][col] = Cell::Blocked,
                    'S' => map.start = Point { row, col },
                    'E' => map.end = Point { row, col },
                    _ => anyhow::bail!("unexpected character {:?} at row {}, column {}", ch, row, col),
                }
            }
        }

        Ok(map)
    }
}

/// A per-cell storage of values of type `T` (a vec in a vec)
#[derive(Debug)]
pub struct CellStorage<T>(Vec<Vec<T>>);

impl<T: Copy + 'static> CellStorage<T> {
    pub fn get(&self, node: Point) -> T {
        self.0[node.row][node.col]
    }

    pub fn get_mut(&mut self, node: Point) -> &mut T {
        &mut self.0[node.row][node.col]
    }
}

impl<T: Display> Display for CellStorage<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for row in &self.0 {
            for cell in row {
                write!(f, "{}", cell)?;
            }
            write!(f, "\n")?;
        }

        Ok(())
    }
}
