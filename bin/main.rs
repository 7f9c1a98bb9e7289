use gridfind::util::load_map;
use gridfind::{GridMap, PathFinder, SearchOutcome};

const DEMO_MAP: &str = "\
S........
XXXXXXXX.
.........
.XXXXXXXX
.........
XXXXXXXX.
........E
";

fn main() -> Result<(), anyhow::Error> {
    env_logger::init();

    let map: GridMap = match std::env::args().nth(1) {
        Some(path) => load_map(&path)?,
        None => DEMO_MAP.parse()?,
    };

    println!("{}", map);

    match PathFinder::new().search(&map) {
        SearchOutcome::PathFound(result) => {
            println!("{}", map.render_path(&result.path));
            println!("found a path of {} steps", result.depth);
        }
        SearchOutcome::NoPathFound => {
            println!("no path between {:?} and {:?}", map.start(), map.end())
        }
        SearchOutcome::BudgetExhausted => println!("gave up before exhausting the search space"),
    }

    Ok(())
}
