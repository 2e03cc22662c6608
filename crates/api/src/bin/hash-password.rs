//! Password hashing utility for Gatehouse
//!
//! Produces an Argon2id hash suitable for `ADMIN_PASSWORD_HASH`, so the
//! bootstrap admin can be configured without a plaintext password.
//!
//! Usage:
//!   cargo run --bin hash-password
//!   cargo run --bin hash-password "MySecurePassword123!"
//!
//! The cost comes from `PASSWORD_HASH_COST` (default 12), the same setting
//! the server uses for new hashes.

use std::env;
use std::io::{self, Write};

use gatehouse_api::auth::{hash_password, password, validate_password_strength};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cost = match env::var("PASSWORD_HASH_COST") {
        Ok(raw) => raw
            .parse::<u32>()
            .ok()
            .filter(|c| (password::MIN_COST..=password::MAX_COST).contains(c))
            .ok_or("PASSWORD_HASH_COST must be an integer between 1 and 31")?,
        Err(_) => password::DEFAULT_COST,
    };

    let password = if let Some(pwd) = env::args().nth(1) {
        pwd
    } else {
        // stdin keeps the password out of the process list
        print!("Enter password to hash: ");
        io::stdout().flush()?;

        let mut password = String::new();
        io::stdin().read_line(&mut password)?;
        password.trim().to_string()
    };

    if password.is_empty() {
        eprintln!("Error: Password cannot be empty");
        std::process::exit(1);
    }

    if let Err(e) = validate_password_strength(&password) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }

    let password_hash = hash_password(&password, cost)?;

    println!("\n===========================================");
    println!("Password Hash (Argon2id, cost {cost}):");
    println!("===========================================");
    println!("{password_hash}");
    println!("===========================================\n");

    println!("Usage:");
    println!("Set it alongside ADMIN_EMAIL in the server environment, single-quoted:");
    println!("ADMIN_PASSWORD_HASH='{password_hash}'");

    Ok(())
}
