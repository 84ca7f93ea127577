//! CLI tool to manage the database schema.
//!
//! Usage:
//!   cargo run --bin tasktrack-migrate -- up
//!   cargo run --bin tasktrack-migrate -- down [--steps <n>]
//!   cargo run --bin tasktrack-migrate -- status

use std::env;

use tracing_subscriber::EnvFilter;

use tasktrack_lib::config::Config;
use tasktrack_lib::db::DbPool;
use tasktrack_lib::db::migrations::{MigrationRunner, MigrationState};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage();
        std::process::exit(1);
    }

    let command = &args[1];
    if matches!(command.as_str(), "help" | "--help" | "-h") {
        print_usage();
        return;
    }

    let steps = if command.as_str() == "down" {
        steps_or_exit(&args)
    } else {
        1
    };

    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            std::process::exit(1);
        }
    };

    let pool = match DbPool::new(&config).await {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error connecting to database: {}", e);
            std::process::exit(1);
        }
    };

    match command.as_str() {
        "up" => up(&pool).await,
        "down" => down(&pool, steps).await,
        "status" => status(&pool).await,
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            std::process::exit(1);
        }
    }
}

/// Parse the arguments after `down`. Only `--steps N` / `-n N` is accepted.
fn parse_steps_arg(args: &[String]) -> Result<usize, String> {
    let mut steps = 1;
    let mut rest = args.iter().skip(2);
    while let Some(arg) = rest.next() {
        match arg.as_str() {
            "--steps" | "-n" => {
                let value = rest
                    .next()
                    .ok_or_else(|| format!("{} requires a value", arg))?;
                steps = match value.parse::<usize>() {
                    Ok(n) if n > 0 => n,
                    _ => return Err(format!("{} must be a positive integer, got '{}'", arg, value)),
                };
            }
            other => return Err(format!("Unknown argument for down: {}", other)),
        }
    }
    Ok(steps)
}

async fn up(pool: &DbPool) {
    match MigrationRunner::new(pool.connection()).up().await {
        Ok(applied) if applied.is_empty() => println!("Schema is up to date."),
        Ok(applied) => {
            for name in &applied {
                println!("Applied  {}", name);
            }
            println!("{} migration(s) applied.", applied.len());
        }
        Err(e) => {
            eprintln!("Migration failed: {}", e);
            std::process::exit(1);
        }
    }
}

async fn down(pool: &DbPool, steps: usize) {
    match MigrationRunner::new(pool.connection()).down(steps).await {
        Ok(reverted) if reverted.is_empty() => println!("Nothing to revert."),
        Ok(reverted) => {
            for name in &reverted {
                println!("Reverted {}", name);
            }
            println!("Backfilled data is not restored by reverting.");
        }
        Err(e) => {
            eprintln!("Revert failed: {}", e);
            std::process::exit(1);
        }
    }
}

async fn status(pool: &DbPool) {
    let units = match MigrationRunner::new(pool.connection()).status().await {
        Ok(u) => u,
        Err(e) => {
            eprintln!("Error reading migration status: {}", e);
            std::process::exit(1);
        }
    };

    println!();
    println!("{:<10} {}", "STATE", "MIGRATION");
    println!("{}", "-".repeat(60));
    for unit in &units {
        println!("{:<10} {}", unit.state.as_str(), unit.name);
    }
    println!();

    let pending = units
        .iter()
        .filter(|u| u.state == MigrationState::Pending)
        .count();
    println!("{} applied, {} pending", units.len() - pending, pending);
}

fn steps_or_exit(args: &[String]) -> usize {
    match parse_steps_arg(args) {
        Ok(steps) => steps,
        Err(e) => {
            eprintln!("Error: {}", e);
            print_usage();
            std::process::exit(1);
        }
    }
}

fn print_usage() {
    eprintln!("Tasktrack schema migrations");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  tasktrack-migrate up                  Apply all pending migrations");
    eprintln!("  tasktrack-migrate down [--steps <n>]  Revert the latest n migrations (default 1)");
    eprintln!("  tasktrack-migrate status              List migrations and their state");
    eprintln!();
    eprintln!("Connection settings come from DATABASE_URL or DB_HOST/DB_PORT/DB_USER/DB_PASSWORD/DB_NAME.");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        ["tasktrack-migrate", "down"]
            .iter()
            .chain(list)
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn test_steps_default_and_explicit() {
        assert_eq!(parse_steps_arg(&args(&[])), Ok(1));
        assert_eq!(parse_steps_arg(&args(&["--steps", "3"])), Ok(3));
        assert_eq!(parse_steps_arg(&args(&["-n", "2"])), Ok(2));
    }

    #[test]
    fn test_steps_rejects_bad_arguments() {
        assert!(parse_steps_arg(&args(&["--steps"])).is_err());
        assert!(parse_steps_arg(&args(&["--steps", "0"])).is_err());
        assert!(parse_steps_arg(&args(&["--steps", "two"])).is_err());
        assert!(parse_steps_arg(&args(&["--step", "2"])).is_err());
        assert!(parse_steps_arg(&args(&["3"])).is_err());
    }
}
