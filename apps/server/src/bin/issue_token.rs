//! CLI tool to mint session tokens.
//!
//! Usage:
//!   cargo run --bin issue-token -- --user 0192f0c4-... --ttl 3600
//!   cargo run --bin issue-token -- --bootstrap-admin "Release Manager"

use std::env;

use testdesk_lib::auth::{DEFAULT_TOKEN_TTL_SECS, SessionKey, issue_token};
use testdesk_lib::config::Config;
use testdesk_lib::db::DbPool;
use testdesk_lib::models::UserRole;
use uuid::Uuid;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let args: Vec<String> = env::args().collect();

    // Parse arguments
    let mut user: Option<String> = None;
    let mut bootstrap_admin: Option<String> = None;
    let mut ttl = DEFAULT_TOKEN_TTL_SECS;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--user" | "-u" => {
                i += 1;
                if i < args.len() {
                    user = Some(args[i].clone());
                }
            }
            "--bootstrap-admin" | "-b" => {
                i += 1;
                if i < args.len() {
                    bootstrap_admin = Some(args[i].clone());
                }
            }
            "--ttl" | "-t" => {
                i += 1;
                ttl = match args.get(i).map(|v| v.parse::<u64>()) {
                    Some(Ok(secs)) if secs > 0 => secs,
                    _ => {
                        eprintln!("Error: --ttl expects a positive number of seconds");
                        std::process::exit(1);
                    }
                };
            }
            "--help" | "-h" => {
                print_usage();
                return;
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    if user.is_some() == bootstrap_admin.is_some() {
        eprintln!("Error: exactly one of --user or --bootstrap-admin is required");
        print_usage();
        std::process::exit(1);
    }

    // Load config and connect
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            std::process::exit(1);
        }
    };

    let pool = match DbPool::connect(&config.database_url, 1).await {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error connecting to database: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = pool.run_migrations().await {
        eprintln!("Error running migrations: {}", e);
        std::process::exit(1);
    }

    // Resolve the subject
    let (user_id, name, role) = if let Some(admin_name) = bootstrap_admin {
        match pool.insert_user(&admin_name, None, UserRole::Admin).await {
            Ok(u) => (u.id, u.name, UserRole::Admin),
            Err(e) => {
                eprintln!("Error creating admin user: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        let raw = user.unwrap_or_default();
        let id = match Uuid::parse_str(&raw) {
            Ok(id) => id,
            Err(_) => {
                eprintln!("Error: '{}' is not a valid user id", raw);
                std::process::exit(1);
            }
        };
        let record = match pool.get_user_by_id(id).await {
            Ok(Some(u)) => u,
            Ok(None) => {
                eprintln!("Error: user {} not found", id);
                std::process::exit(1);
            }
            Err(e) => {
                eprintln!("Error loading user: {}", e);
                std::process::exit(1);
            }
        };
        let Some(role) = UserRole::parse(&record.role) else {
            eprintln!("Error: user {} has unknown role '{}'", id, record.role);
            std::process::exit(1);
        };
        (record.id, record.name, role)
    };

    let key = SessionKey::new(config.jwt_secret.clone());
    let token = match issue_token(user_id, role, &key, ttl) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Error minting token: {}", e);
            std::process::exit(1);
        }
    };

    // Output
    println!();
    println!("════════════════════════════════════════════════════════════════");
    println!("  Session Token Issued");
    println!("════════════════════════════════════════════════════════════════");
    println!();
    println!("  User:    {} ({})", name, user_id);
    println!("  Role:    {}", role);
    println!("  Expires: in {} seconds", ttl);
    println!();
    println!("  Token:");
    println!("  {}", token);
    println!();
    println!("  Send it as: Authorization: Bearer <token>");
    println!();
}

fn print_usage() {
    eprintln!();
    eprintln!("Usage: issue-token (--user <UUID> | --bootstrap-admin <NAME>) [--ttl <SECONDS>]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -u, --user <UUID>              Existing user to mint a token for");
    eprintln!("  -b, --bootstrap-admin <NAME>   Create an admin user and mint its token");
    eprintln!("  -t, --ttl <SECONDS>            Token lifetime (default: 43200)");
    eprintln!("  -h, --help                     Show this help message");
    eprintln!();
}
