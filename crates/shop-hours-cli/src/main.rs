use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use clap::{Parser, Subcommand};
use serde::Serialize;
use shop_hours::{
    busy_blocks, easter_sunday, estimate_duration, CalendarKind, HairLength, HairProfile,
    HairTexture, HairThickness, Service, ServiceKind,
};
use tracing_subscriber::{fmt, EnvFilter};

mod shop_file;

use shop_file::ShopFile;

#[derive(Parser)]
#[command(name = "shophours", version, about = "Barbershop opening hours and bookable slots")]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the opening hours for one or more consecutive dates
    Hours {
        /// Path to the shop JSON file
        #[arg(long, value_name = "FILE")]
        shop: PathBuf,
        /// First date (YYYY-MM-DD)
        #[arg(long)]
        date: NaiveDate,
        /// Number of consecutive days
        #[arg(long, default_value_t = 1)]
        days: u32,
    },
    /// List the bookable slots on a date
    Slots {
        #[arg(long, value_name = "FILE")]
        shop: PathBuf,
        #[arg(long)]
        date: NaiveDate,
        /// Service duration in minutes
        #[arg(long)]
        duration: u32,
        /// Only count this staff member's appointments as busy
        #[arg(long)]
        staff: Option<String>,
        /// Reference time (YYYY-MM-DDTHH:MM:SS); defaults to the shop's local now
        #[arg(long)]
        now: Option<NaiveDateTime>,
    },
    /// List the holidays of a year
    Holidays {
        #[arg(long)]
        year: i32,
        #[arg(long, default_value = "france")]
        calendar: CalendarKind,
    },
    /// Print Easter Sunday of a year
    Easter {
        #[arg(long)]
        year: i32,
    },
    /// Estimate a service duration from a hair profile
    Estimate {
        /// Catalogue base duration in minutes
        #[arg(long)]
        minutes: u32,
        #[arg(long, default_value = "haircut")]
        kind: ServiceKind,
        #[arg(long)]
        length: Option<HairLength>,
        #[arg(long)]
        thickness: Option<HairThickness>,
        #[arg(long)]
        texture: Option<HairTexture>,
        /// Round the estimate up to this many minutes
        #[arg(long, default_value_t = 15)]
        quantum: u32,
    },
}

fn init_tracing() {
    let _ = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.cmd {
        Commands::Hours { shop, date, days } => {
            if days == 0 {
                bail!("--days must be at least 1");
            }
            let engine = ShopFile::load(&shop)?.engine()?;
            let last = date
                .checked_add_days(chrono::Days::new(u64::from(days - 1)))
                .context("date window overflows the calendar")?;
            print_json(&engine.hours_between(date, last)?)?;
        }
        Commands::Slots {
            shop,
            date,
            duration,
            staff,
            now,
        } => {
            let file = ShopFile::load(&shop)?;
            let engine = file.engine()?;
            let now = match now {
                Some(now) => now,
                None => file.local_now()?,
            };
            let busy = busy_blocks(&file.appointments, staff.as_deref());
            let slots = engine.generate_slots(date, duration, &busy, now)?;
            tracing::info!(shop_id = %file.shop_id, %date, count = slots.len(), "generated slots");
            print_json(&slots)?;
        }
        Commands::Holidays { year, calendar } => {
            print_json(&calendar.calendar().holidays_in(year))?;
        }
        Commands::Easter { year } => match easter_sunday(year) {
            Some(date) => println!("{date}"),
            None => bail!("year {year} is outside the Gregorian range 1583-9999"),
        },
        Commands::Estimate {
            minutes,
            kind,
            length,
            thickness,
            texture,
            quantum,
        } => {
            let profile = (length.is_some() || thickness.is_some() || texture.is_some()).then(|| {
                HairProfile {
                    length: length.unwrap_or_default(),
                    thickness: thickness.unwrap_or_default(),
                    texture: texture.unwrap_or_default(),
                }
            });
            let service = Service::new("cli", kind, minutes);
            let estimate = estimate_duration(&service, profile.as_ref(), quantum)?;
            print_json(&serde_json::json!({
                "base_minutes": minutes,
                "estimated_minutes": estimate,
                "profile": profile,
            }))?;
        }
    }
    Ok(())
}
