use estimate_tool::{
    AppConfig, CalculationRequest, Catalog, CrewRounding, ElementCatalog, ElementInput,
    EstimateBuilder, EstimateStore, LogNotifier, ProjectEstimate, UnitEstimator,
    load_estimate_from_csv, load_estimate_from_json, logging, notify, save_estimate_to_csv,
    save_estimate_to_json,
};
use std::io::{self, Write};

struct Session {
    catalog: ElementCatalog,
    estimator: Box<dyn UnitEstimator + Send + Sync>,
    store: Box<dyn EstimateStore>,
    request: CalculationRequest,
    rounding: CrewRounding,
    last: Option<ProjectEstimate>,
    committed: Option<i64>,
}

fn print_help() {
    println!(
        "Commands:\n  help                               Show this help\n  catalog                            List catalog elements\n  name <text...>                     Set project name\n  country <text...>                  Set the country the rates apply to\n  frame <days>                       Set project time frame (0 = unconstrained)\n  add <quantity> <crew|-> <element...>\n                                     Add or replace an element line (- uses catalog crew)\n  remove <element...>                Remove an element line\n  clear                              Remove all element lines\n  show                               Show the current request\n  rounding <floor|ceil>              Set crew rounding\n  compute                            Build the estimate\n  commit                             Build and store the estimate, start progress tracking\n  estimates                          List stored estimates\n  progress <days> <element...>       Report elapsed days for an element of the committed estimate\n  status                             Show progress of the committed estimate\n  save <json|csv> <path>             Write the last estimate to disk\n  load <json|csv> <path>             Read an estimate from disk\n  quit|exit                          Exit"
    );
}

fn print_catalog(catalog: &ElementCatalog) {
    println!("{:<24} {:<6} default crew", "element", "unit");
    for entry in catalog.entries() {
        let crew = entry
            .default_crew
            .map(|c| c.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!("{:<24} {:<6} {}", entry.element, entry.unit, crew);
    }
}

fn print_request(request: &CalculationRequest) {
    println!("Project name : {}", request.project_name);
    println!("Country      : {}", request.country);
    println!("Time frame   : {} days", request.time_frame_days);
    if request.elements.is_empty() {
        println!("No elements added.");
        return;
    }
    for input in &request.elements {
        let crew = input
            .crew_size
            .map(|c| c.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!("  {:<24} qty={} crew={}", input.element_id, input.quantity, crew);
    }
}

fn print_estimate(estimate: &ProjectEstimate) {
    match estimate.to_dataframe() {
        Ok(df) => println!("{df}"),
        Err(err) => println!("Could not render breakdown: {err}"),
    }
    println!("{}", estimate.summary().to_cli_summary());
}

impl Session {
    fn compute(&self) -> Result<ProjectEstimate, String> {
        let requests = self
            .request
            .element_requests(&self.catalog)
            .map_err(|err| err.to_string())?;
        EstimateBuilder::new(&self.catalog, self.estimator.as_ref())
            .with_rounding(self.rounding)
            .with_country(self.request.country.as_str())
            .build(
                &self.request.project_name,
                &requests,
                self.request.time_frame_days,
            )
            .map_err(|err| err.to_string())
    }

    fn add(&mut self, args: &[&str]) {
        let [quantity, crew, name @ ..] = args else {
            println!("Usage: add <quantity> <crew|-> <element...>");
            return;
        };
        if name.is_empty() {
            println!("Usage: add <quantity> <crew|-> <element...>");
            return;
        }
        let Ok(quantity) = quantity.parse::<f64>() else {
            println!("Invalid quantity '{quantity}'.");
            return;
        };
        let crew = if *crew == "-" {
            None
        } else {
            match crew.parse::<i64>() {
                Ok(c) => Some(c),
                Err(_) => {
                    println!("Invalid crew size '{crew}'.");
                    return;
                }
            }
        };
        let element = name.join(" ");
        if self.catalog.resolve(&element).is_none() {
            println!("Warning: '{element}' is not in the catalog and will be skipped.");
        }
        self.request.elements.retain(|e| e.element_id != element);
        self.request
            .elements
            .push(ElementInput::new(element.clone(), quantity, crew));
        println!("Added {element}.");
    }

    fn commit(&mut self) {
        let estimate = match self.compute() {
            Ok(estimate) => estimate,
            Err(err) => {
                println!("Error: {err}");
                return;
            }
        };
        if estimate.is_empty() {
            println!("Nothing to commit: no element has a positive quantity.");
            return;
        }
        match self.store.save_estimate(&estimate) {
            Ok(id) => {
                print_estimate(&estimate);
                println!("Committed estimate {id}.");
                self.committed = Some(id);
                self.last = Some(estimate);
            }
            Err(err) => println!("Error: {err}"),
        }
    }

    fn progress(&mut self, args: &[&str]) {
        let Some(id) = self.committed else {
            println!("No committed estimate. Use 'commit' first.");
            return;
        };
        let [days, name @ ..] = args else {
            println!("Usage: progress <days> <element...>");
            return;
        };
        let Ok(days) = days.parse::<f64>() else {
            println!("Invalid days '{days}'.");
            return;
        };
        let element = name.join(" ");
        match self.store.update_progress(id, &element, days) {
            Ok(Some(update)) => {
                println!(
                    "{}: {:.2} of {:.2} allocated days",
                    update.record.element_id,
                    update.record.actual_days,
                    update.record.allocated_days
                );
                if let Some(event) = update.event {
                    println!("{event}");
                    notify::dispatch(&LogNotifier, &[event]);
                }
            }
            Ok(None) => println!("Element '{element}' is not part of estimate {id}."),
            Err(err) => println!("Error: {err}"),
        }
    }

    fn status(&self) {
        let Some(id) = self.committed else {
            println!("No committed estimate. Use 'commit' first.");
            return;
        };
        match self.store.progress_records(id) {
            Ok(records) => {
                for record in records {
                    let flag = if record.deviation_notified { " (overrun)" } else { "" };
                    println!(
                        "  {:<24} {:>8.2} / {:>8.2} days{}",
                        record.element_id, record.actual_days, record.allocated_days, flag
                    );
                }
            }
            Err(err) => println!("Error: {err}"),
        }
    }

    fn save(&self, format: &str, path: &str) {
        let Some(estimate) = &self.last else {
            println!("Nothing to save. Run 'compute' first.");
            return;
        };
        let result = match format {
            "json" => save_estimate_to_json(estimate, path),
            "csv" => save_estimate_to_csv(estimate, path),
            other => {
                println!("Unknown format '{other}' (expected json or csv).");
                return;
            }
        };
        match result {
            Ok(()) => println!("Estimate saved to {path}."),
            Err(err) => println!("Error: {err}"),
        }
    }

    fn load(&mut self, format: &str, path: &str) {
        let result = match format {
            "json" => load_estimate_from_json(path),
            "csv" => load_estimate_from_csv(path),
            other => {
                println!("Unknown format '{other}' (expected json or csv).");
                return;
            }
        };
        match result {
            Ok(estimate) => {
                println!("Estimate loaded from {path}.");
                print_estimate(&estimate);
                self.last = Some(estimate);
            }
            Err(err) => println!("Error: {err}"),
        }
    }
}

fn main() {
    logging::init();
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Configuration error: {err}");
            std::process::exit(2);
        }
    };
    let setup = config.load_catalog().map_err(|e| e.to_string()).and_then(|catalog| {
        let estimator = config.load_estimator().map_err(|e| e.to_string())?;
        let store = config.open_store().map_err(|e| e.to_string())?;
        Ok((catalog, estimator, store))
    });
    let (catalog, estimator, store) = match setup {
        Ok(parts) => parts,
        Err(err) => {
            eprintln!("Startup error: {err}");
            std::process::exit(2);
        }
    };

    let mut session = Session {
        catalog,
        estimator,
        store,
        request: CalculationRequest::default(),
        rounding: config.crew_rounding,
        last: None,
        committed: None,
    };

    println!("Estimate Tool (CLI) - type 'help' for commands\n");

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        let _ = io::stdout().flush();
        line.clear();
        match stdin.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let parts: Vec<&str> = input.split_whitespace().collect();
        let (cmd, args) = (parts[0], &parts[1..]);
        match cmd {
            "help" => print_help(),
            "quit" | "exit" => break,
            "catalog" => print_catalog(&session.catalog),
            "name" => {
                if args.is_empty() {
                    println!("Usage: name <text...>");
                } else {
                    session.request.project_name = args.join(" ");
                    println!("Project name set.");
                }
            }
            "country" => {
                if args.is_empty() {
                    println!("Usage: country <text...>");
                } else {
                    session.request.country = args.join(" ");
                    println!("Country set to {}.", session.request.country);
                }
            }
            "frame" => match args.first().map(|v| v.parse::<f64>()) {
                Some(Ok(days)) if days.is_finite() && days >= 0.0 => {
                    session.request.time_frame_days = days;
                    println!("Time frame set to {days} days.");
                }
                _ => println!("Usage: frame <days> (non-negative number)"),
            },
            "add" => session.add(args),
            "remove" => {
                let element = args.join(" ");
                let before = session.request.elements.len();
                session.request.elements.retain(|e| e.element_id != element);
                if session.request.elements.len() < before {
                    println!("Removed {element}.");
                } else {
                    println!("Element '{element}' is not in the request.");
                }
            }
            "clear" => {
                session.request.elements.clear();
                println!("Request cleared.");
            }
            "show" => print_request(&session.request),
            "rounding" => match args.first().map(|v| v.parse::<CrewRounding>()) {
                Some(Ok(rounding)) => {
                    session.rounding = rounding;
                    println!("Crew rounding set to {rounding}.");
                }
                Some(Err(err)) => println!("{err}"),
                None => println!("Usage: rounding <floor|ceil>"),
            },
            "compute" => match session.compute() {
                Ok(estimate) => {
                    print_estimate(&estimate);
                    session.last = Some(estimate);
                }
                Err(err) => println!("Error: {err}"),
            },
            "commit" => session.commit(),
            "estimates" => match session.store.list_estimates() {
                Ok(listings) if listings.is_empty() => println!("No stored estimates."),
                Ok(listings) => {
                    for listing in listings {
                        println!(
                            "  #{} {} [{}] {}",
                            listing.id,
                            listing.summary.project_name,
                            listing.created_at.format("%Y-%m-%d %H:%M"),
                            listing.summary.to_cli_summary()
                        );
                    }
                }
                Err(err) => println!("Error: {err}"),
            },
            "progress" => session.progress(args),
            "status" => session.status(),
            "save" | "load" => {
                let (Some(format), Some(path)) = (args.first(), args.get(1)) else {
                    println!("Usage: {cmd} <json|csv> <path>");
                    continue;
                };
                if cmd == "save" {
                    session.save(format, path);
                } else {
                    session.load(format, path);
                }
            }
            other => println!("Unknown command '{other}'. Type 'help'."),
        }
    }
}
