use std::io::{self, Write};
use std::str::FromStr;

use chrono::NaiveDate;
use project_lines::persistence::{export_lines_to_csv, load_store_from_json, save_store_to_json};
use project_lines::view::{bookings_frame, lines_frame, render_frame};
use project_lines::{
    ArticleRef, Deletion, LinePlanner, NewProjectLine, PlannerConfig, PlannerStore, ProjectLine, ProjectRef,
    telemetry,
};
use rust_decimal::Decimal;

type Planner = LinePlanner<PlannerStore>;

fn parse_day_list(s: &str) -> Result<Vec<NaiveDate>, String> {
    s.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| {
            NaiveDate::parse_from_str(p, "%Y-%m-%d").map_err(|_| format!("Invalid date '{p}'"))
        })
        .collect()
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

fn render_lines(lines: &[ProjectLine]) -> String {
    match lines_frame(lines) {
        Ok(df) => render_frame(&df),
        Err(e) => format!("Render error: {}", e),
    }
}

fn show_group(planner: &Planner, group_id: i64) {
    match planner.group(group_id) {
        Ok(group) => {
            println!(
                "Group {} (project {}, article {}): sold {}, unallocated {}",
                group.group_id,
                group.project_id,
                group.article_id,
                group.sold_total.normalize(),
                group.unallocated().normalize()
            );
            println!("{}", render_lines(&group.lines));
        }
        Err(e) => println!("Error: {}", e),
    }
}

fn show_group_of(planner: &Planner, line_id: i64) {
    match planner.group_of(line_id) {
        Ok(group) => show_group(planner, group.group_id),
        Err(e) => println!("Error: {}", e),
    }
}

fn print_help() {
    println!(
        "Commands:\n  help                                   Show this help\n  project <id> <code> <client> <name...> Register a project for booking titles\n  article <id> <name...>                 Register an article for booking titles\n  line <project> <article> <qty> <amount>\n                                         Enter a sold line (opens a group)\n  show <group>                           Show a group\n  lines <project>                        Show every line of a project\n  alloc <line> <resource> <YYYY-MM-DD,...>\n                                         Allocate days from a remainder\n  span <line> <resource> <start> <end>   Allocate the working days of a span\n  repair <line>                          Split unplanned quantity into a new remainder\n  sync <line>                            Synchronize the booking of a line\n  realize <line> <qty>                   Record realized quantity\n  reassign <line> <resource>             Move an allocation to another resource\n  delete <line>                          Delete a line\n  bookings                               Show all bookings\n  export <project> <csv_path>            Export a project's lines to CSV\n  save <json_path>                       Save the in-memory store\n  load <json_path>                       Replace the in-memory store from JSON\n  quit|exit                              Exit"
    );
}

fn open_planner(config: &PlannerConfig) -> Result<Planner, String> {
    let store = PlannerStore::open(config).map_err(|e| e.to_string())?;
    LinePlanner::from_config(store, config).map_err(|e| e.to_string())
}

fn main() {
    let config = match PlannerConfig::load(None) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Config error: {}", e);
            PlannerConfig::default()
        }
    };
    telemetry::init(&config.log_filter);

    let mut planner = match open_planner(&config) {
        Ok(planner) => planner,
        Err(e) => {
            eprintln!("Failed to open store: {}", e);
            std::process::exit(1);
        }
    };

    println!(
        "Project Lines (CLI, {} store) - type 'help' for commands\n",
        planner.store().describe()
    );

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

        let mut parts = input.split_whitespace();
        let cmd = parts.next().unwrap_or("");

        match cmd {
            "help" => print_help(),
            "quit" | "exit" => break,
            "project" => {
                let id_s = parts.next();
                let code = parts.next();
                let client = parts.next();
                let name: Vec<&str> = parts.collect();
                match (id_s, code, client, !name.is_empty()) {
                    (Some(id_s), Some(code), Some(client), true) => {
                        let id: i64 = match id_s.parse() { Ok(v) => v, Err(_) => { println!("Invalid id"); continue; } };
                        let project = ProjectRef::new(id, name.join(" "), code, client);
                        match planner.register_project(&project) {
                            Ok(()) => println!("Project {} registered.", id),
                            Err(e) => println!("Error: {}", e),
                        }
                    }
                    _ => println!("Usage: project <id> <code> <client> <name...>"),
                }
            }
            "article" => {
                let id_s = parts.next();
                let name: Vec<&str> = parts.collect();
                match (id_s, !name.is_empty()) {
                    (Some(id_s), true) => {
                        let id: i64 = match id_s.parse() { Ok(v) => v, Err(_) => { println!("Invalid id"); continue; } };
                        match planner.register_article(&ArticleRef::new(id, name.join(" "))) {
                            Ok(()) => println!("Article {} registered.", id),
                            Err(e) => println!("Error: {}", e),
                        }
                    }
                    _ => println!("Usage: article <id> <name...>"),
                }
            }
            "line" => {
                let fields = (parts.next(), parts.next(), parts.next(), parts.next());
                match fields {
                    (Some(project_s), Some(article_s), Some(qty_s), Some(amount_s)) => {
                        let project_id: i64 = match project_s.parse() { Ok(v) => v, Err(_) => { println!("Invalid project id"); continue; } };
                        let article_id: i64 = match article_s.parse() { Ok(v) => v, Err(_) => { println!("Invalid article id"); continue; } };
                        let quantity = match Decimal::from_str(qty_s) { Ok(v) => v, Err(_) => { println!("Invalid quantity"); continue; } };
                        let amount = match Decimal::from_str(amount_s) { Ok(v) => v, Err(_) => { println!("Invalid amount"); continue; } };
                        let new_line = NewProjectLine { project_id, article_id, quantity, amount };
                        match planner.create_line(new_line) {
                            Ok(created) => {
                                println!("Created line {} (group {}).", created.id, created.group_id);
                                show_group(&planner, created.group_id);
                            }
                            Err(e) => println!("Error: {}", e),
                        }
                    }
                    _ => println!("Usage: line <project> <article> <qty> <amount>"),
                }
            }
            "show" => match parts.next().map(str::parse::<i64>) {
                Some(Ok(group_id)) => show_group(&planner, group_id),
                _ => println!("Usage: show <group>"),
            },
            "lines" => match parts.next().map(str::parse::<i64>) {
                Some(Ok(project_id)) => match planner.project_lines(project_id) {
                    Ok(lines) => println!("{}", render_lines(&lines)),
                    Err(e) => println!("Error: {}", e),
                },
                _ => println!("Usage: lines <project>"),
            },
            "alloc" => {
                let fields = (parts.next(), parts.next(), parts.next());
                match fields {
                    (Some(line_s), Some(resource), Some(days_s)) => {
                        let line_id: i64 = match line_s.parse() { Ok(v) => v, Err(_) => { println!("Invalid line id"); continue; } };
                        let days = match parse_day_list(days_s) { Ok(v) => v, Err(e) => { println!("{} (YYYY-MM-DD)", e); continue; } };
                        match planner.allocate(line_id, resource, days) {
                            Ok(allocation) => {
                                println!(
                                    "Allocated {} day(s) to {} in {} range(s) for {}.",
                                    allocation.allocated_quantity.normalize(),
                                    allocation.resource_id,
                                    allocation.ranges.len(),
                                    allocation.allocated_amount
                                );
                                show_group(&planner, allocation.group_id);
                            }
                            Err(e) => println!("Error: {}", e),
                        }
                    }
                    _ => println!("Usage: alloc <line> <resource> <YYYY-MM-DD,...>"),
                }
            }
            "span" => {
                let fields = (parts.next(), parts.next(), parts.next(), parts.next());
                match fields {
                    (Some(line_s), Some(resource), Some(start_s), Some(end_s)) => {
                        let line_id: i64 = match line_s.parse() { Ok(v) => v, Err(_) => { println!("Invalid line id"); continue; } };
                        let (Some(start), Some(end)) = (parse_date(start_s), parse_date(end_s)) else {
                            println!("Invalid date (YYYY-MM-DD)");
                            continue;
                        };
                        match planner.allocate_span(line_id, resource, start, end) {
                            Ok(allocation) => {
                                println!(
                                    "Allocated {} working day(s) to {} in {} range(s) for {}.",
                                    allocation.allocated_quantity.normalize(),
                                    allocation.resource_id,
                                    allocation.ranges.len(),
                                    allocation.allocated_amount
                                );
                                show_group(&planner, allocation.group_id);
                            }
                            Err(e) => println!("Error: {}", e),
                        }
                    }
                    _ => println!("Usage: span <line> <resource> <start> <end>"),
                }
            }
            "repair" => match parts.next().map(str::parse::<i64>) {
                Some(Ok(line_id)) => match planner.report_remainder(line_id) {
                    Ok(split) => {
                        println!(
                            "Line {} kept {} for {}; new remainder {} holds {} for {}.",
                            split.source_id,
                            split.kept_quantity.normalize(),
                            split.kept_amount,
                            split.remainder_id,
                            split.remainder_quantity.normalize(),
                            split.remainder_amount
                        );
                        show_group(&planner, split.group_id);
                    }
                    Err(e) => println!("Error: {}", e),
                },
                _ => println!("Usage: repair <line>"),
            },
            "sync" => match parts.next().map(str::parse::<i64>) {
                Some(Ok(line_id)) => match planner.sync_booking(line_id) {
                    Ok(outcome) => println!("Booking sync for line {}: {:?}", line_id, outcome),
                    Err(e) => println!("Error: {}", e),
                },
                _ => println!("Usage: sync <line>"),
            },
            "realize" => {
                let fields = (parts.next(), parts.next());
                match fields {
                    (Some(line_s), Some(qty_s)) => {
                        let line_id: i64 = match line_s.parse() { Ok(v) => v, Err(_) => { println!("Invalid line id"); continue; } };
                        let quantity = match Decimal::from_str(qty_s) { Ok(v) => v, Err(_) => { println!("Invalid quantity"); continue; } };
                        match planner.set_realized_quantity(line_id, quantity) {
                            Ok(updated) => {
                                println!("realized_quantity set.");
                                show_group(&planner, updated.group_id);
                            }
                            Err(e) => println!("Error: {}", e),
                        }
                    }
                    _ => println!("Usage: realize <line> <qty>"),
                }
            }
            "reassign" => {
                let fields = (parts.next(), parts.next());
                match fields {
                    (Some(line_s), Some(resource)) => {
                        let line_id: i64 = match line_s.parse() { Ok(v) => v, Err(_) => { println!("Invalid line id"); continue; } };
                        match planner.reassign(line_id, resource) {
                            Ok(outcome) => {
                                println!("Line {} reassigned to {} ({:?}).", line_id, resource, outcome);
                                show_group_of(&planner, line_id);
                            }
                            Err(e) => println!("Error: {}", e),
                        }
                    }
                    _ => println!("Usage: reassign <line> <resource>"),
                }
            }
            "delete" => match parts.next().map(str::parse::<i64>) {
                Some(Ok(line_id)) => match planner.delete_line(line_id) {
                    Ok(deletion) => {
                        println!("Deleted line {}.", line_id);
                        if let Deletion::AllocationReleased { remainder_id, .. } = &deletion {
                            show_group_of(&planner, *remainder_id);
                        } else {
                            println!("{:?}", deletion);
                        }
                    }
                    Err(e) => println!("Error: {}", e),
                },
                _ => println!("Usage: delete <line>"),
            },
            "bookings" => match planner.bookings() {
                Ok(bookings) => match bookings_frame(&bookings) {
                    Ok(df) => println!("{}", render_frame(&df)),
                    Err(e) => println!("Render error: {}", e),
                },
                Err(e) => println!("Error: {}", e),
            },
            "export" => {
                let fields = (parts.next(), parts.next());
                match fields {
                    (Some(project_s), Some(path)) => {
                        let project_id: i64 = match project_s.parse() { Ok(v) => v, Err(_) => { println!("Invalid project id"); continue; } };
                        let rows = match planner.project_lines(project_id) {
                            Ok(lines) => lines.iter().map(ProjectLine::to_row).collect::<Vec<_>>(),
                            Err(e) => { println!("Error: {}", e); continue; }
                        };
                        match export_lines_to_csv(&rows, path) {
                            Ok(()) => println!("Exported {} line(s) to {}", rows.len(), path),
                            Err(e) => println!("Export error: {}", e),
                        }
                    }
                    _ => println!("Usage: export <project> <csv_path>"),
                }
            }
            "save" => match parts.next() {
                Some(path) => match planner.store().as_memory() {
                    Some(store) => match save_store_to_json(store, path) {
                        Ok(()) => println!("Store saved to {}", path),
                        Err(e) => println!("Save error: {}", e),
                    },
                    None => println!("save only applies to the in-memory store"),
                },
                None => println!("Usage: save <json_path>"),
            },
            "load" => match parts.next() {
                Some(path) => {
                    if planner.store().as_memory().is_none() {
                        println!("load only applies to the in-memory store");
                        continue;
                    }
                    match load_store_from_json(path) {
                        Ok(store) => match LinePlanner::from_config(PlannerStore::Memory(store), &config) {
                            Ok(loaded) => {
                                planner = loaded;
                                println!("Store loaded from {}", path);
                            }
                            Err(e) => println!("Load error: {}", e),
                        },
                        Err(e) => println!("Load error: {}", e),
                    }
                }
                None => println!("Usage: load <json_path>"),
            },
            _ => {
                println!("Unknown command. Type 'help'.");
            }
        }
    }
}
