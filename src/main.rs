use box_anneal::annealer::Convergence;
use box_anneal::mover::{DEFAULT_MAX_MOVE_LIMIT, DEFAULT_MIN_MOVE_LIMIT};
use box_anneal::problem::{PackingProblem, RectangleSpec, Settings};
use box_anneal::render;
use box_anneal::types::Size;
use clap::Parser;
use tracing::Level;

#[derive(Parser)]
#[command(
    name = "box_anneal",
    about = "Packs rectangles into a box with simulated annealing"
)]
struct Cli {
    /// Container dimensions (WxH, e.g. 10x8)
    #[arg(long)]
    container: String,

    /// Rectangles as name:WxH (e.g. a:4x3 b:2x5)
    #[arg(long = "rects", num_args = 1..)]
    rects: Vec<String>,

    /// Iteration budget
    #[arg(long, default_value_t = 10_000)]
    iterations: usize,

    /// Starting temperature
    #[arg(long, default_value_t = 1.0)]
    start_temp: f64,

    /// Temperature floor
    #[arg(long, default_value_t = 0.01)]
    end_temp: f64,

    /// Largest move step, used at the start of the run
    #[arg(long, default_value_t = DEFAULT_MAX_MOVE_LIMIT)]
    max_move: f64,

    /// Smallest move step, used near the end of the run
    #[arg(long, default_value_t = DEFAULT_MIN_MOVE_LIMIT)]
    min_move: f64,

    /// Keep iterating after a zero-cost packing is found
    #[arg(long)]
    no_early_stop: bool,

    /// Seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    /// Show ASCII layout of the final packing
    #[arg(long)]
    layout: bool,

    /// Print the full report (placements, histories, run log) as JSON
    #[arg(long)]
    json: bool,

    /// Log progress to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn parse_dimensions(s: &str) -> Result<Size, String> {
    let parts: Vec<&str> = s.split('x').collect();
    if parts.len() != 2 {
        return Err(format!("invalid dimensions '{}', expected WxH", s));
    }
    let width = parts[0]
        .parse::<f64>()
        .map_err(|_| format!("invalid width in '{}'", s))?;
    let height = parts[1]
        .parse::<f64>()
        .map_err(|_| format!("invalid height in '{}'", s))?;
    Ok(Size::new(width, height))
}

fn parse_rect(s: &str) -> Result<RectangleSpec, String> {
    let (name, dims) = s
        .split_once(':')
        .ok_or_else(|| format!("invalid rectangle '{}', expected name:WxH", s))?;
    if name.is_empty() {
        return Err(format!("missing name in '{}'", s));
    }
    let size = parse_dimensions(dims)?;
    Ok(RectangleSpec {
        name: name.to_string(),
        width: size.width,
        height: size.height,
        color: None,
    })
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_max_level(if cli.verbose { Level::INFO } else { Level::WARN })
        .init();

    let container = parse_dimensions(&cli.container).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });

    let rectangles: Vec<RectangleSpec> = cli
        .rects
        .iter()
        .map(|r| parse_rect(r.as_str()))
        .collect::<Result<Vec<_>, _>>()
        .unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        });

    let problem = PackingProblem {
        container,
        rectangles,
        settings: Settings {
            iterations: cli.iterations,
            early_stop: !cli.no_early_stop,
            start_temperature: cli.start_temp,
            end_temperature: cli.end_temp,
            max_move_limit: cli.max_move,
            min_move_limit: cli.min_move,
            seed: cli.seed,
        },
    };

    let solution = problem.solve().unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });
    let report = &solution.report;

    if cli.json {
        match serde_json::to_string_pretty(report) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    for p in &report.placements {
        let rot = if p.rotated { " [rotated]" } else { "" };
        println!(
            "  {} {}x{} @ ({:.3}, {:.3}){}",
            p.name, p.width, p.height, p.x, p.y, rot
        );
    }
    if cli.layout {
        print!("{}", render::render_container(&solution.container));
    }
    println!();

    let outcome = &report.outcome;
    if outcome.early_stopped {
        println!("Early stop at iteration {}.", outcome.iterations_run - 1);
    }
    println!("Final result: {:.3}", outcome.final_cost);
    if outcome.status == Convergence::NotConverged {
        println!("Full optimization not achieved.");
    }
}
