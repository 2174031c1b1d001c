#![deny(warnings)]

//! Headless CLI: loads the reference tables, evaluates scenario files and
//! lists the choices and defaults the tables offer.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use data_pipeline::{load_reference_data, DataSources};
use fleet_core::{FuelType, ReferenceData, VehicleKey, INCENTIVE_CAPS};
use fleet_scenario::{Evaluation, Resolver, ScenarioAnswers, ScenarioBuilder, ScenarioInputs};
use rust_decimal::Decimal;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("GIT_SHA"),
    " ",
    env!("BUILD_DATE"),
    ")"
);

/// Compare the cost of ownership and emissions of an incumbent fleet against
/// an alternative powertrain.
#[derive(Parser)]
#[command(name = "altfleet", version = VERSION, about, long_about = None)]
struct Cli {
    /// Directory holding the four reference CSV tables
    #[arg(
        long,
        global = true,
        env = "ALTFLEET_DATA_DIR",
        default_value = "assets/data"
    )]
    data_dir: PathBuf,
    #[command(subcommand)]
    command: Cmd,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Cmd {
    /// Evaluate a YAML or JSON scenario file
    Evaluate {
        scenario: PathBuf,
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
    /// List the valid choices for the next selection
    Options {
        #[arg(long)]
        application: Option<String>,
        #[arg(long)]
        configuration: Option<String>,
        #[arg(long, requires = "configuration")]
        weight_class: Option<String>,
    },
    /// Show the table defaults for a vehicle, fuel pair and province
    Defaults {
        #[arg(long)]
        province: String,
        #[arg(long)]
        weight_class: String,
        #[arg(long)]
        configuration: String,
        #[arg(long)]
        existing: FuelType,
        #[arg(long)]
        alternative: FuelType,
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
    /// Print the federal incentive maxima per vehicle class
    Incentives {
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
}

fn load_data(dir: &Path) -> Result<ReferenceData> {
    let sources = DataSources::from_dir(dir);
    load_reference_data(&sources)
        .with_context(|| format!("loading reference tables from {}", dir.display()))
}

fn read_answers(path: &Path) -> Result<ScenarioAnswers> {
    let text =
        fs::read_to_string(path).with_context(|| format!("reading scenario {}", path.display()))?;
    let is_json = path
        .extension()
        .map(|e| e.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    let answers = if is_json {
        serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?
    } else {
        serde_yaml::from_str(&text).with_context(|| format!("parsing {}", path.display()))?
    };
    Ok(answers)
}

fn money(v: Decimal) -> String {
    v.round_dp(2).to_string()
}

fn percent(p: Option<f64>) -> String {
    match p {
        Some(p) => format!("{p:.1}%"),
        None => "n/a".to_string(),
    }
}

fn print_evaluation(eval: &Evaluation) {
    let fuels = eval.fuels;
    println!(
        "{} ({}) in {}: {} vs {}",
        eval.vehicle, eval.application, eval.province, fuels.base, fuels.alternative
    );
    println!(
        "{} vehicles, {} years, {} km/day, {} days/year, discount rate {}",
        eval.inputs.vehicle_count,
        eval.inputs.lifetime_years,
        eval.inputs.daily_distance_km,
        eval.inputs.operating_days,
        eval.inputs.discount_rate
    );
    println!(
        "Fuel cost per km: {} {} | {} {}",
        fuels.base,
        money(eval.fuel_cost_per_km.base),
        fuels.alternative,
        money(eval.fuel_cost_per_km.alternative)
    );
    if eval.infrastructure.total > Decimal::ZERO {
        println!(
            "Infrastructure: {} (subsidy {})",
            money(eval.infrastructure.total),
            money(eval.infrastructure.subsidy)
        );
    }

    println!();
    println!("Cumulative discounted cost ($)");
    let subsidised = eval.cumulative.has_subsidies();
    let mut header = format!("{:>4}  {:>16}  {:>16}", "Year", fuels.base, fuels.alternative);
    if subsidised {
        header.push_str(&format!("  {:>16}", "with subsidies"));
    }
    println!("{header}");
    for row in &eval.cumulative.rows {
        let mut line = format!(
            "{:>4}  {:>16}  {:>16}",
            row.year,
            money(row.base),
            money(row.alternative)
        );
        if let Some(s) = row.alternative_with_subsidies {
            line.push_str(&format!("  {:>16}", money(s)));
        }
        println!("{line}");
    }

    println!();
    println!("Total cost of ownership, present value ($)");
    let alternative = eval.stacked.alternative_fuel;
    for tech in &eval.stacked.technologies {
        let parts: Vec<String> = tech
            .buckets()
            .into_iter()
            .map(|(category, value)| format!("{} {}", category.label(alternative), money(value)))
            .collect();
        println!(
            "{}: {} | total {}",
            tech.name,
            parts.join(", "),
            money(tech.total())
        );
    }

    let r = &eval.emissions.reductions;
    println!();
    println!(
        "GHG: {:.1} t vs {:.1} t",
        eval.emissions.base.ghg_tonnes, eval.emissions.alternative.ghg_tonnes
    );
    println!(
        "GHG reduction: {:.1} t ({})",
        r.ghg_tonnes,
        percent(r.ghg_percent)
    );
    println!(
        "NOx reduction: {:.2} kg ({})",
        r.nox_kg,
        percent(r.nox_percent)
    );
    println!(
        "PM2.5 reduction: {:.3} kg ({})",
        r.pm25_kg,
        percent(r.pm25_percent)
    );
}

fn evaluate(data: &ReferenceData, path: &Path, format: Format) -> Result<()> {
    let answers = read_answers(path)?;
    let outcome = answers.apply(data).and_then(|scenario| scenario.evaluate());
    let eval = match outcome {
        Ok(eval) => eval,
        Err(e) if e.is_incomplete() => {
            // Partially filled scenarios are expected; nothing to compute yet.
            debug!(error = %e, "scenario incomplete");
            println!("{e}");
            return Ok(());
        }
        Err(e) => {
            return Err(anyhow::Error::new(e).context(format!("evaluating {}", path.display())))
        }
    };
    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&eval)?),
        Format::Text => print_evaluation(&eval),
    }
    Ok(())
}

fn print_list<T: std::fmt::Display>(title: &str, items: &[T]) {
    println!("{title}:");
    for item in items {
        println!("  {item}");
    }
}

fn options(
    data: &ReferenceData,
    application: Option<&str>,
    configuration: Option<&str>,
    weight_class: Option<&str>,
) -> Result<()> {
    let resolver = Resolver::new(data);
    match (application, configuration, weight_class) {
        (_, Some(configuration), Some(weight_class)) => {
            let key = VehicleKey::new(weight_class, configuration);
            resolver.duty_cycle(&key)?;
            print_list("Existing fuels", &resolver.existing_fuels(&key));
            print_list("Alternative fuels", &resolver.alternative_fuels(&key));
        }
        (_, Some(configuration), None) => {
            print_list("Weight classes", &resolver.weight_classes(configuration)?);
        }
        (Some(application), None, _) => {
            let configurations = resolver.configurations(application)?;
            if configurations.is_empty() {
                bail!("no configurations for application {application:?}");
            }
            print_list("Configurations", &configurations);
        }
        (None, None, _) => {
            print_list("Provinces", &resolver.provinces());
            print_list("Applications", &resolver.applications());
            let chargers: Vec<String> = resolver
                .charging_options()
                .iter()
                .map(|c| format!("{} ({})", c.label(), c.price))
                .collect();
            print_list("Charger models", &chargers);
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct DefaultsReport<'a> {
    vehicle: &'a VehicleKey,
    application: &'a str,
    province: &'a str,
    provincial_tax_pct: Decimal,
    efficiency_units: [&'static str; 2],
    price_units: [&'static str; 2],
    inputs: ScenarioInputs,
}

fn defaults(
    data: &ReferenceData,
    province: &str,
    weight_class: &str,
    configuration: &str,
    existing: FuelType,
    alternative: FuelType,
    format: Format,
) -> Result<()> {
    let key = VehicleKey::new(weight_class, configuration);
    let application = Resolver::new(data).duty_cycle(&key)?.application.as_str();
    let selection = ScenarioBuilder::new(data)
        .province(province)?
        .application(application)?
        .configuration(configuration)?
        .weight_class(weight_class)?
        .existing_fuel(existing)?
        .alternative_fuel(alternative)?;
    let report = DefaultsReport {
        vehicle: selection.key(),
        application,
        province: &selection.province().province,
        provincial_tax_pct: selection.province().taxes_perc,
        efficiency_units: [existing.efficiency_unit(), alternative.efficiency_unit()],
        price_units: [existing.price_unit(), alternative.price_unit()],
        inputs: selection.default_inputs(),
    };
    if format == Format::Json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    let i = &report.inputs;
    println!("{} ({}) in {}", report.vehicle, report.application, report.province);
    println!("Provincial tax: {}%", report.provincial_tax_pct);
    println!(
        "Daily distance: {} km | days/year: {} | lifetime: {} years | discount rate: {}",
        i.daily_distance_km, i.operating_days, i.lifetime_years, i.discount_rate
    );
    for (fuel, t) in [
        (existing, i.technologies.base),
        (alternative, i.technologies.alternative),
    ] {
        println!(
            "{}: efficiency {} {} | fuel {} {} | price {} | maintenance {} $/km",
            fuel,
            t.efficiency,
            fuel.efficiency_unit(),
            t.fuel_price,
            fuel.price_unit(),
            t.purchase_price,
            t.maintenance_per_km
        );
    }
    Ok(())
}

fn incentives(format: Format) -> Result<()> {
    if format == Format::Json {
        println!("{}", serde_json::to_string_pretty(&INCENTIVE_CAPS)?);
        return Ok(());
    }
    for cap in INCENTIVE_CAPS.iter() {
        println!("{:<36} {:>8} CAD", cap.vehicle_class, cap.max_amount);
    }
    Ok(())
}

fn main() -> Result<()> {
    // Logs go to stderr so JSON on stdout stays clean.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    info!(version = VERSION, data_dir = %cli.data_dir.display(), "starting altfleet");

    match cli.command {
        Cmd::Incentives { format } => incentives(format),
        Cmd::Evaluate { scenario, format } => {
            let data = load_data(&cli.data_dir)?;
            evaluate(&data, &scenario, format)
        }
        Cmd::Options {
            application,
            configuration,
            weight_class,
        } => {
            let data = load_data(&cli.data_dir)?;
            options(
                &data,
                application.as_deref(),
                configuration.as_deref(),
                weight_class.as_deref(),
            )
        }
        Cmd::Defaults {
            province,
            weight_class,
            configuration,
            existing,
            alternative,
            format,
        } => {
            let data = load_data(&cli.data_dir)?;
            defaults(
                &data,
                &province,
                &weight_class,
                &configuration,
                existing,
                alternative,
                format,
            )
        }
    }
}
