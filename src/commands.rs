//! Command implementations

use std::fs;

use anyhow::{Context, Result};
use serde::Serialize;

use medtrans_rates::access::User;
use medtrans_rates::audit::AuditEntry;
use medtrans_rates::config::AppConfig;
use medtrans_rates::pricing::requests::{
    parse_count, parse_decimal, AddOns, DeadheadMultiplier, Markup, MarkupKind,
};
use medtrans_rates::pricing::responses::{format_money, RateOverview, RatePreview};
use medtrans_rates::pricing::{quote_summary, RateSchedule, RateService, RateTable, ServiceType, TripRequest};
use medtrans_rates::store::FileStore;

use crate::cli::{Cli, Commands, OutputFormat, QuoteArgs, RatesAction, UsersAction};

/// Execute a CLI command
pub fn execute(cli: Cli, mut config: AppConfig) -> Result<()> {
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }

    let store = FileStore::open(&config.data_dir)
        .with_context(|| format!("Failed to open store in {}", config.data_dir.display()))?;
    let mut service = RateService::new(store, &config);
    let format = cli.format;

    match cli.command {
        Commands::Quote(args) => {
            let request = build_request(&args)?;
            let breakdown = service.quote(&request)?;
            match format {
                OutputFormat::Json => print_json(&breakdown)?,
                OutputFormat::Table => println!("{}", quote_summary(&request, &breakdown)),
            }
        }

        Commands::Rates { action } => match action {
            RatesAction::Show => {
                let table = service.rates()?;
                match format {
                    OutputFormat::Json => print_json(&*table)?,
                    OutputFormat::Table => print_rate_table(&table),
                }
            }
            RatesAction::Set { file } => {
                let raw = fs::read_to_string(&file)
                    .with_context(|| format!("Failed to read {}", file.display()))?;
                let table: RateTable = serde_json::from_str(&raw)
                    .with_context(|| format!("Invalid rate table in {}", file.display()))?;
                service.update_rates(table)?;
                println!("Rate table saved.");
            }
            RatesAction::Reset => {
                service.reset_rates()?;
                println!("Rate table reset to defaults.");
            }
            RatesAction::Preview { miles, deadhead } => {
                let previews = service.preview(parse_decimal(&miles), parse_decimal(&deadhead))?;
                match format {
                    OutputFormat::Json => print_json(&previews)?,
                    OutputFormat::Table => print_previews(&previews),
                }
            }
            RatesAction::Overview => {
                let overview = service.overview()?;
                match format {
                    OutputFormat::Json => print_json(&overview)?,
                    OutputFormat::Table => print_overview(&overview),
                }
            }
        },

        Commands::Users { action } => match action {
            UsersAction::List => {
                let current = service.current_user()?;
                let users = service.directory().users();
                match format {
                    OutputFormat::Json => print_json(&users)?,
                    OutputFormat::Table => {
                        for user in users {
                            print_user(user, user.id == current.id);
                        }
                    }
                }
            }
            UsersAction::Whoami => {
                let user = service.current_user()?;
                match format {
                    OutputFormat::Json => print_json(&user)?,
                    OutputFormat::Table => print_user(&user, true),
                }
            }
            UsersAction::Switch { id } => {
                let user = service.switch_user(id)?;
                println!("Switched to {} ({})", user.name, user.role);
            }
        },

        Commands::Audit { limit } => {
            let entries = service.audit_entries(limit)?;
            match format {
                OutputFormat::Json => print_json(&entries)?,
                OutputFormat::Table => print_audit(&entries),
            }
        }
    }

    Ok(())
}

fn build_request(args: &QuoteArgs) -> Result<TripRequest> {
    if let Some(path) = &args.request {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let request = TripRequest::from_json(&raw)
            .with_context(|| format!("Unreadable trip request in {}", path.display()))?;
        return Ok(request);
    }

    Ok(TripRequest {
        service_type: args.service.as_str().into(),
        rate_type: args.rate.as_str().into(),
        trip_type: args.trip.as_str().into(),
        miles: parse_decimal(&args.miles),
        deadhead_miles: parse_decimal(&args.deadhead),
        deadhead_multiplier: DeadheadMultiplier::from(parse_decimal(&args.deadhead_multiplier)),
        add_ons: AddOns {
            ramp_fee: args.ramp,
            wait_time_minutes: parse_decimal(&args.wait),
            second_driver: args.second_driver,
            companion_count: parse_count(&args.companions),
            escort_hours: parse_decimal(&args.escort_hours),
            airport_meet_greet: args.airport.trim().to_string(),
            stop_over_count: parse_count(&args.stop_overs),
            multi_destination_legs: parse_count(&args.legs),
        },
        markup: Markup {
            kind: MarkupKind::from(args.markup_type.as_str()),
            value: parse_decimal(&args.markup),
        },
    })
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_rate_table(table: &RateTable) {
    println!("{:<12} {:<10} {:>10} {:>10}", "Service", "Schedule", "Base", "Per Mile");
    for schedule in RateSchedule::ALL {
        for service in ServiceType::ALL {
            println!(
                "{:<12} {:<10} {:>10} {:>10}",
                service.label(),
                schedule.key_segment(),
                format_money(table.base_fares.schedule(schedule).get(service)),
                format_money(table.mileage_rates.schedule(schedule).get(service)),
            );
        }
    }

    println!();
    println!("One-way fees:");
    for service in ServiceType::ALL {
        println!("  {:<12} {}", service.label(), format_money(table.one_way_rate(service)));
    }

    println!();
    println!("Minimum fares:");
    for (key, amount) in &table.minimum_fares {
        println!("  {:<30} {}", key.to_string(), format_money(*amount));
    }

    let settings = &table.settings;
    println!();
    println!("Deadhead rate:          {}/mile", format_money(table.deadhead_rate));
    println!("Minimum miles:          {}", settings.minimum_miles);
    println!("Deadhead free miles:    {}", settings.deadhead_free_miles);
    println!("Round mileage to 10:    {}", yes_no(settings.round_mileage_to_ten));
    println!("Round deadhead to $5:   {}", yes_no(settings.round_deadhead_to_five));
    println!("Round total to $5:      {}", yes_no(settings.round_total_to_five));
}

fn print_previews(previews: &[RatePreview]) {
    for preview in previews {
        println!(
            "{:<12} {} miles + {} deadhead = {} + {} + {} = {}",
            preview.service_type.label(),
            preview.miles.normalize(),
            preview.deadhead_miles.normalize(),
            format_money(preview.base_fare),
            format_money(preview.mileage_cost),
            format_money(preview.deadhead_cost),
            format_money(preview.total),
        );
    }
}

fn print_overview(overview: &RateOverview) {
    println!(
        "Base rates:    {} - {}",
        format_money(overview.base_fare_min),
        format_money(overview.base_fare_max)
    );
    println!(
        "Mileage rates: {} - {}",
        format_money(overview.mileage_rate_min),
        format_money(overview.mileage_rate_max)
    );
    println!("Deadhead rate: {}/mile", format_money(overview.deadhead_rate));
}

fn print_user(user: &User, current: bool) {
    let marker = if current { "*" } else { " " };
    let presence = if user.is_online {
        "online".to_string()
    } else {
        format!("last seen {}", user.last_seen.format("%Y-%m-%d %H:%M UTC"))
    };
    println!(
        "{} {:>2}  {:<14} {:<11} {:<28} {}",
        marker, user.id, user.name, user.role, user.email, presence
    );
}

fn print_audit(entries: &[AuditEntry]) {
    if entries.is_empty() {
        println!("No audit entries.");
        return;
    }
    for entry in entries {
        println!(
            "{}  {:<16} {:<14} {:<11} {}",
            entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
            entry.action.to_string(),
            entry.user_name,
            entry.user_role,
            entry.details
        );
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use medtrans_rates::pricing::{calculate, AddOnKind, RateType, TripType};
    use rust_decimal_macros::dec;

    fn quote_args(flags: &[&str]) -> QuoteArgs {
        let mut argv = vec!["medtrans-rates", "quote"];
        argv.extend_from_slice(flags);
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Quote(args) => args,
            _ => panic!("expected quote command"),
        }
    }

    #[test]
    fn test_build_request_defaults() {
        let request = build_request(&quote_args(&[])).unwrap();
        assert_eq!(request, TripRequest::default());
    }

    #[test]
    fn test_build_request_from_flags() {
        let args = quote_args(&[
            "--service", "wheelchair",
            "--rate", "offHours",
            "--trip", "roundtrip",
            "--miles", "12.5",
            "--deadhead", "abc",
            "--deadhead-multiplier", "4",
            "--ramp",
            "--companions", "2.9",
            "--stop-overs=-1",
            "--legs", "3",
            "--escort-hours", "1.5",
            "--markup-type", "percent",
            "--markup", "10",
        ]);
        let request = build_request(&args).unwrap();

        assert_eq!(request.service_type, ServiceType::Wheelchair);
        assert_eq!(request.rate_type, RateType::OffHours);
        assert_eq!(request.trip_type, TripType::RoundTrip);
        assert_eq!(request.miles, dec!(12.5));
        assert_eq!(request.deadhead_miles, dec!(0));
        assert_eq!(request.deadhead_multiplier, DeadheadMultiplier::Quadruple);
        assert!(request.add_ons.ramp_fee);
        assert!(!request.add_ons.second_driver);
        assert_eq!(request.add_ons.companion_count, 2);
        assert_eq!(request.add_ons.stop_over_count, 0);
        assert_eq!(request.add_ons.multi_destination_legs, 3);
        assert_eq!(request.add_ons.escort_hours, dec!(1.5));
        assert_eq!(request.markup, Markup::percent(dec!(10)));
    }

    #[test]
    fn test_airport_flag_prices_like_json() {
        let table = RateTable::default();
        let json = TripRequest::from_json(r#"{"addOns": {"airportMeetGreet": "ord"}}"#).unwrap();

        for airport in ["ord", "ORD", " ORD "] {
            let flags = build_request(&quote_args(&["--airport", airport])).unwrap();
            let from_json = TripRequest::from_json(&format!(
                r#"{{"addOns": {{"airportMeetGreet": "{}"}}}}"#,
                airport
            ))
            .unwrap();
            assert_eq!(
                calculate(&table, &flags).add_on_costs[&AddOnKind::AirportMeetGreet],
                calculate(&table, &from_json).add_on_costs[&AddOnKind::AirportMeetGreet],
            );
        }
        assert_eq!(
            calculate(&table, &json).add_on_costs[&AddOnKind::AirportMeetGreet],
            dec!(70)
        );
    }

    #[test]
    fn test_build_request_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trip.json");
        fs::write(&path, r#"{"serviceType": "stretcher", "miles": "7", "addOns": null}"#).unwrap();

        let args = quote_args(&["--request", path.to_str().unwrap()]);
        let request = build_request(&args).unwrap();
        assert_eq!(request.service_type, ServiceType::Stretcher);
        assert_eq!(request.miles, dec!(7));

        fs::write(&path, "{\"miles\": ").unwrap();
        let err = build_request(&args).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<medtrans_rates::AppError>(),
            Some(medtrans_rates::AppError::InvalidRequest(_))
        ));
    }
}
