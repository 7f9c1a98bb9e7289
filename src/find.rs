use log::{debug, trace};

use crate::grid::{CellStorage, GridMap, Point};

/// Neighbor offsets in the order they are explored: east, south, west, north.
const DIRECTIONS: [(isize, isize); 4] = [(0, 1), (1, 0), (0, -1), (-1, 0)];

/// A completed route between the map's start and end markers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathResult {
    pub path: Vec<Point>,
    pub start: Point,
    pub goal: Point,
    /// Depth bound at which the route was found, equal to `path.len() - 1`.
    pub depth: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    PathFound(PathResult),
    NoPathFound,
    /// The expansion budget ran out before the search could conclude.
    BudgetExhausted,
}

impl SearchOutcome {
    pub fn into_path(self) -> Option<Vec<Point>> {
        match self {
            SearchOutcome::PathFound(result) => Some(result.path),
            _ => None,
        }
    }
}

/// Outcome of a single depth-limited probe.
enum Probe {
    Found(Vec<Point>),
    /// At least one branch was cut short by the depth bound.
    Cutoff,
    /// Every simple path from the start was enumerated without hitting the
    /// bound, so deeper probes cannot succeed either.
    Exhausted,
    OverBudget,
}

struct Frame {
    node: Point,
    /// Index into [`DIRECTIONS`] of the next neighbor to try.
    dir: usize,
}

/// Iterative deepening depth-first search over a [`GridMap`].
///
/// Runs depth-limited probes from the map's start marker toward its end
/// marker, raising the bound by one until a route is found, the search
/// space is exhausted, or the depth cap is reached. The first route found
/// at the smallest sufficient bound is returned; ties are broken by the
/// fixed east, south, west, north neighbor order, so repeated searches on
/// an unmodified map return identical results.
///
/// The occupancy of the start cell itself is never consulted: a start
/// marker placed on an obstacle still searches outward from it. An end
/// marker on an obstacle is unreachable unless it coincides with the
/// start.
#[derive(Debug, Clone, Default)]
pub struct PathFinder {
    max_depth: Option<usize>,
    max_expansions: Option<u64>,
}

impl PathFinder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the depth cap. Defaults to `rows * cols` of the searched
    /// map, the length of the longest possible simple path.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    /// Give up with [`SearchOutcome::BudgetExhausted`] once this many
    /// nodes have been expanded, counted across all probes. Unlimited by
    /// default; the depth cap alone already guarantees termination.
    pub fn with_max_expansions(mut self, max_expansions: u64) -> Self {
        self.max_expansions = Some(max_expansions);
        self
    }

    pub fn search(&self, map: &GridMap) -> SearchOutcome {
        let start = map.start();
        let goal = map.end();
        let cap = self.max_depth.unwrap_or(map.rows() * map.cols());
        let mut expansions: u64 = 0;

        for limit in 0..=cap {
            match self.probe(map, start, goal, limit, &mut expansions) {
                Probe::Found(path) => {
                    debug!(
                        "found a path of {} steps after {} expansions",
                        path.len() - 1,
                        expansions
                    );
                    return SearchOutcome::PathFound(PathResult {
                        depth: path.len() - 1,
                        path,
                        start,
                        goal,
                    });
                }
                Probe::Cutoff => trace!("no path within depth bound {}, deepening", limit),
                Probe::Exhausted => {
                    debug!("search space exhausted at depth bound {}", limit);
                    return SearchOutcome::NoPathFound;
                }
                Probe::OverBudget => {
                    debug!("expansion budget used up after {} expansions", expansions);
                    return SearchOutcome::BudgetExhausted;
                }
            }
        }

        debug!("no path within the depth cap of {}", cap);
        SearchOutcome::NoPathFound
    }

    /// One depth-limited probe from `start`, backtracking in place.
    ///
    /// The frame stack mirrors the recursion of a plain depth-first
    /// search, so probe depth is bounded by the heap rather than the call
    /// stack. `path` holds the nodes between the start and the current
    /// frame; `on_path` is its per-cell membership mask, which is what
    /// keeps a probe from walking in circles.
    fn probe(
        &self,
        map: &GridMap,
        start: Point,
        goal: Point,
        limit: usize,
        expansions: &mut u64,
    ) -> Probe {
        let mut on_path: CellStorage<bool> = map.create_storage();
        let mut path: Vec<Point> = Vec::with_capacity(limit + 1);
        let mut stack: Vec<Frame> = Vec::with_capacity(limit + 1);
        let mut cutoff = false;

        stack.push(Frame {
            node: start,
            dir: 0,
        });
        path.push(start);
        *on_path.get_mut(start) = true;
        *expansions += 1;

        while !stack.is_empty() {
            let top = stack.len() - 1;
            let node = stack[top].node;

            if stack[top].dir == 0 {
                // the goal counts even on a branch that has used up its
                // whole budget, hence checked before the depth test
                if node == goal {
                    return Probe::Found(path);
                }
                if top == limit {
                    cutoff = true;
                    stack.pop();
                    path.pop();
                    *on_path.get_mut(node) = false;
                    continue;
                }
            }

            let mut advanced = false;
            while stack[top].dir < DIRECTIONS.len() {
                let (dr, dc) = DIRECTIONS[stack[top].dir];
                stack[top].dir += 1;

                let next = match neighbor(node, dr, dc) {
                    Some(next) => next,
                    None => continue,
                };
                if map.is_free(next.row, next.col) && !on_path.get(next) {
                    if let Some(max) = self.max_expansions {
                        if *expansions >= max {
                            return Probe::OverBudget;
                        }
                    }
                    stack.push(Frame { node: next, dir: 0 });
                    path.push(next);
                    *on_path.get_mut(next) = true;
                    *expansions += 1;
                    advanced = true;
                    break;
                }
            }

            if !advanced {
                stack.pop();
                path.pop();
                *on_path.get_mut(node) = false;
            }
        }

        if cutoff {
            Probe::Cutoff
        } else {
            Probe::Exhausted
        }
    }
}

/// Search with the default settings, keeping only the route coordinates.
pub fn find_path(map: &GridMap) -> Option<Vec<Point>> {
    PathFinder::new().search(map).into_path()
}

fn neighbor(node: Point, dr: isize, dc: isize) -> Option<Point> {
    Some(Point {
        row: node.row.checked_add_signed(dr)?,
        col: node.col.checked_add_signed(dc)?,
    })
}

#[cfg(test)]
mod test {

    use super::*;
    use crate::grid::GridMap;

    fn manhattan(a: Point, b: Point) -> usize {
        a.row.abs_diff(b.row) + a.col.abs_diff(b.col)
    }

    fn assert_well_formed(map: &GridMap, path: &[Point]) {
        assert_eq!(path.first().copied(), Some(map.start()));
        assert_eq!(path.last().copied(), Some(map.end()));
        for pair in path.windows(2) {
            assert_eq!(manhattan(pair[0], pair[1]), 1, "non-adjacent step in {:?}", pair);
        }
        for (i, p) in path.iter().enumerate() {
            assert!(!path[i + 1..].contains(p), "duplicate cell {:?}", p);
        }
    }

    #[test]
    fn open_grid_shortest_route() {
        let map = GridMap::new(5, 5);

        let result = match PathFinder::new().search(&map) {
            SearchOutcome::PathFound(result) => result,
            other => panic!("expected a path, got {:?}", other),
        };

        assert_eq!(result.start, map.start());
        assert_eq!(result.goal, map.end());
        assert_eq!(result.depth, 8);
        assert_eq!(result.path.len(), 9);
        assert_well_formed(&map, &result.path);

        // with the east-first exploration order the route runs along the
        // top row, then down the last column
        let expected: Vec<Point> = (0..5)
            .map(|col| Point { row: 0, col })
            .chain((1..5).map(|row| Point { row, col: 4 }))
            .collect();
        assert_eq!(result.path, expected);
    }

    #[test]
    fn start_equals_end() {
        let mut map = GridMap::new(4, 4);
        map.set_end(0, 0);

        assert_eq!(find_path(&map), Some(vec![Point { row: 0, col: 0 }]));
    }

    #[test]
    fn detour_around_wall() {
        let mut map = GridMap::new(5, 5);
        // wall across row 2 with the only gap in the last column
        for col in 0..4 {
            map.toggle_obstacle(2, col);
        }
        map.set_end(4, 0);

        let path = find_path(&map).expect("a detour exists");
        assert_well_formed(&map, &path);
        // east to the gap, down, and all the way back west
        assert_eq!(path.len(), 13);
        for p in &path {
            assert!(map.is_free(p.row, p.col));
        }
    }

    #[test]
    fn enclosed_end_terminates() {
        let mut map = GridMap::new(3, 3);
        // wall off both approaches to the end in the bottom-right corner
        map.toggle_obstacle(2, 1);
        map.toggle_obstacle(1, 2);

        assert_eq!(PathFinder::new().search(&map), SearchOutcome::NoPathFound);
    }

    #[test]
    fn blocked_end_is_unreachable() {
        let mut map = GridMap::new(4, 4);
        map.toggle_obstacle(2, 2);
        map.set_end(2, 2);

        assert_eq!(PathFinder::new().search(&map), SearchOutcome::NoPathFound);
    }

    #[test]
    fn blocked_start_searches_outward() {
        // the start cell's own occupancy is never consulted, matching the
        // permissive marker placement rules
        let mut map = GridMap::new(3, 3);
        map.toggle_obstacle(1, 1);
        map.set_start(1, 1);

        let path = find_path(&map).expect("neighbors of the start are free");
        assert_eq!(
            path,
            vec![
                Point { row: 1, col: 1 },
                Point { row: 1, col: 2 },
                Point { row: 2, col: 2 },
            ]
        );
    }

    #[test]
    fn repeated_searches_are_identical() {
        let mut map = GridMap::new(5, 5);
        map.toggle_obstacle(1, 1);
        map.toggle_obstacle(1, 2);
        map.toggle_obstacle(3, 3);
        map.toggle_obstacle(2, 0);

        let first = PathFinder::new().search(&map);
        let second = PathFinder::new().search(&map);

        assert!(matches!(first, SearchOutcome::PathFound(_)));
        assert_eq!(first, second);
    }

    #[test]
    fn depth_cap_limits_search() {
        let map = GridMap::new(5, 5);

        // the corner-to-corner route needs 8 steps
        let finder = PathFinder::new().with_max_depth(7);
        assert_eq!(finder.search(&map), SearchOutcome::NoPathFound);

        let finder = PathFinder::new().with_max_depth(8);
        assert!(matches!(finder.search(&map), SearchOutcome::PathFound(_)));
    }

    #[test]
    fn expansion_budget_aborts() {
        let map = GridMap::new(6, 6);

        let finder = PathFinder::new().with_max_expansions(10);
        assert_eq!(finder.search(&map), SearchOutcome::BudgetExhausted);
    }
}
