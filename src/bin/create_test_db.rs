use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use time::{Duration, OffsetDateTime};

use cashflow::{
    Email, NewTransaction, PasswordHash, ValidatedPassword, create_transaction, create_user,
    initialize_db,
};

/// A utility for creating a test database for the CashFlow server.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

const TEST_EMAIL: &str = "test@example.com";
const TEST_PASSWORD: &str = "test";

/// Label and amount of the sample transactions, oldest first.
const SAMPLE_TRANSACTIONS: [(&str, f64); 9] = [
    ("发工资", 20000.0),
    ("房租", -4500.0),
    ("超市买菜", -236.8),
    ("咖啡", -35.0),
    ("打车", -42.5),
    ("Freelance project", 3200.0),
    ("电影票", -90.0),
    ("午饭", -28.0),
    ("咖啡", -32.0),
];

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Creating test user {TEST_EMAIL} with password \"{TEST_PASSWORD}\"...");

    let password_hash = PasswordHash::new(
        ValidatedPassword::new_unchecked(TEST_PASSWORD),
        PasswordHash::DEFAULT_COST,
    )?;
    let user = create_user(Email::new(TEST_EMAIL)?, password_hash, &conn)?;

    println!("Creating sample transactions...");

    let start = OffsetDateTime::now_utc() - Duration::days(SAMPLE_TRANSACTIONS.len() as i64);
    for (day, (label, amount)) in SAMPLE_TRANSACTIONS.into_iter().enumerate() {
        let transaction = NewTransaction::new(label, amount)?.date(start + Duration::days(day as i64));
        create_transaction(user.id, transaction, &conn)?;
    }

    println!("Success!");

    Ok(())
}
