pub mod find;
pub mod grid;
pub mod util;

pub use find::{find_path, PathFinder, PathResult, SearchOutcome};
pub use grid::{Cell, CellStorage, GridMap, Point};
