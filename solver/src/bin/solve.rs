use lifecycle::config::ModelConfig;
use lifecycle::constants::CHOICE_NAMES;
use lifecycle::draws::DrawPanel;
use lifecycle::env_config::{init_base_path, init_rayon_threads};
use lifecycle::state_computation::solve;
use lifecycle::state_space::create_state_space_objects;
use lifecycle::storage::{file_exists, save_emax_table, EMAX_FILE_PATH};

fn parse_args() -> (String, String) {
    let args: Vec<String> = std::env::args().collect();
    let mut config: Option<String> = None;
    let mut output = EMAX_FILE_PATH.to_string();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                i += 1;
                if i < args.len() {
                    config = Some(args[i].clone());
                }
            }
            "--output" => {
                i += 1;
                if i < args.len() {
                    output = args[i].clone();
                }
            }
            "--help" | "-h" => {
                println!("Usage: lifecycle-solve --config FILE [--output FILE]");
                println!();
                println!("Options:");
                println!("  --config FILE  JSON model configuration");
                println!("  --output FILE  EMAX table output (default: {})", EMAX_FILE_PATH);
                std::process::exit(0);
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                std::process::exit(1);
            }
        }
        i += 1;
    }
    let config = config.unwrap_or_else(|| {
        eprintln!("Error: --config is required");
        std::process::exit(1);
    });
    (config, output)
}

fn main() {
    let (config_path, output) = parse_args();
    init_base_path();
    init_rayon_threads();

    println!("Lifecycle labor supply solver");

    let config = ModelConfig::from_json_file(&config_path).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });
    let exogenous = config.validate().unwrap_or_else(|e| {
        eprintln!("Invalid configuration: {}", e);
        std::process::exit(1);
    });

    let spec = &config.model;
    let draws =
        DrawPanel::generate(spec.seed_emax, spec.num_periods, spec.num_draws_emax, spec.shock_sd)
            .unwrap_or_else(|e| {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            });

    let ctx = create_state_space_objects(config.model.clone()).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });

    let solution = solve(&ctx, &config.utility, &config.tax, &exogenous, &draws);

    let first = ctx.space.period_range(0);
    if !first.is_empty() {
        let n = first.len() as f64;
        let mean_emax: f64 = first.clone().map(|id| solution.emax.emax(id)).sum::<f64>() / n;
        println!("\nPeriod 0: {} states, mean EMAX {:.6}", first.len(), mean_emax);
        for (choice, name) in CHOICE_NAMES.iter().enumerate() {
            let total: f64 = first.clone().map(|id| solution.emax.continuation(id, choice)).sum();
            let mean = total / n;
            println!("  {:<15} mean continuation {:.6}", name, mean);
        }
    }

    if file_exists(&output) {
        println!("Overwriting existing {}", output);
    }
    if let Err(e) = save_emax_table(&solution.emax, &output) {
        eprintln!("Failed to save {}: {}", output, e);
        std::process::exit(1);
    }

    println!("Solve complete.");
}
