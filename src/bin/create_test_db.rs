use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use time::{Date, Month, OffsetDateTime};

use finboard::{UserID, initialize_db, scan_all_owners};

/// A utility for creating a test database for the finboard server.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,

    /// The ID of the user that owns the test data.
    #[arg(long, default_value_t = 1)]
    user_id: i64,
}

struct SeedRule<'a> {
    description: &'a str,
    amount: f64,
    kind: &'a str,
    category: &'a str,
    frequency: &'a str,
    day_of_week: Option<u8>,
    day_of_month: Option<u8>,
    start_date: Date,
    auto_create: bool,
}

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

    let owner_id = UserID::new(args.user_id);
    let today = OffsetDateTime::now_utc().date();
    let month_start = Date::from_calendar_date(today.year(), today.month(), 1)?;

    println!("Creating categories for user {owner_id}...");

    for name in ["Housing", "Income", "Fitness", "Subscriptions", "Insurance"] {
        conn.execute(
            "INSERT INTO category (owner_id, name) VALUES (?1, ?2)",
            (owner_id, name),
        )?;
    }

    println!("Creating recurring transactions...");

    // Each start date falls on its selector so it is also the first occurrence.
    let rules = [
        SeedRule {
            description: "Coffee",
            amount: 5.5,
            kind: "expense",
            category: "Subscriptions",
            frequency: "daily",
            day_of_week: None,
            day_of_month: None,
            start_date: month_start,
            auto_create: false,
        },
        SeedRule {
            description: "Gym",
            amount: 25.0,
            kind: "expense",
            category: "Fitness",
            frequency: "weekly",
            day_of_week: Some(month_start.weekday().number_days_from_sunday()),
            day_of_month: None,
            start_date: month_start,
            auto_create: true,
        },
        SeedRule {
            description: "Salary",
            amount: 3200.0,
            kind: "income",
            category: "Income",
            frequency: "biweekly",
            day_of_week: Some(month_start.weekday().number_days_from_sunday()),
            day_of_month: None,
            start_date: month_start,
            auto_create: true,
        },
        SeedRule {
            description: "Rent",
            amount: 1800.0,
            kind: "expense",
            category: "Housing",
            frequency: "monthly",
            day_of_week: None,
            day_of_month: Some(1),
            start_date: month_start,
            auto_create: true,
        },
        SeedRule {
            description: "Car insurance",
            amount: 240.0,
            kind: "expense",
            category: "Insurance",
            frequency: "quarterly",
            day_of_week: None,
            day_of_month: Some(1),
            start_date: month_start,
            auto_create: true,
        },
        SeedRule {
            description: "Streaming service",
            amount: 120.0,
            kind: "expense",
            category: "Subscriptions",
            frequency: "yearly",
            day_of_week: None,
            day_of_month: Some(1),
            start_date: Date::from_calendar_date(today.year(), Month::January, 1)?,
            auto_create: true,
        },
    ];

    for rule in rules {
        let category_id: i64 = conn.query_row(
            "SELECT id FROM category WHERE owner_id = ?1 AND name = ?2",
            (owner_id, rule.category),
            |row| row.get(0),
        )?;

        conn.execute(
            "INSERT INTO recurring_rule (owner_id, description, amount, kind, category_id,
                frequency, interval_count, day_of_week, day_of_month, start_date, next_due_date,
                auto_create)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7, ?8, ?9, ?9, ?10)",
            (
                owner_id,
                rule.description,
                rule.amount,
                rule.kind,
                category_id,
                rule.frequency,
                rule.day_of_week,
                rule.day_of_month,
                rule.start_date,
                rule.auto_create,
            ),
        )?;
    }

    println!("Creating due transactions...");

    let summary = scan_all_owners(today, &conn)?;

    println!(
        "Created {} transactions, {} rules ended.",
        summary.created.len(),
        summary.ended
    );

    println!("Success!");

    Ok(())
}
