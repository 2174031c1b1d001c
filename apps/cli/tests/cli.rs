use std::path::PathBuf;
use std::process::Command;

use assert_cmd::prelude::{CommandCargoExt, OutputAssertExt};
use predicates::prelude::*;

fn repo_path(rel: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../..")
        .join(rel)
}

fn altfleet() -> Result<Command, Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("altfleet")?;
    cmd.env_remove("ALTFLEET_DATA_DIR")
        .env("RUST_LOG", "warn")
        .arg("--data-dir")
        .arg(repo_path("assets/data"));
    Ok(cmd)
}

#[test]
fn evaluates_sample_scenario() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = altfleet()?;
    cmd.arg("evaluate").arg(repo_path("assets/scenarios/bev_delivery.yaml"));
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Class 6 Box Truck"))
        .stdout(predicate::str::contains("Battery electric (with subsidies)"))
        .stdout(predicate::str::contains("GHG reduction"));
    Ok(())
}

#[test]
fn json_output_is_machine_readable() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = altfleet()?;
    cmd.args(["evaluate", "--format", "json"])
        .arg(repo_path("assets/scenarios/hydrogen_tractor.yaml"));
    let output = cmd.output()?;
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(value["fuels"]["alternative"], "Hydrogen Fuel Cell");
    assert_eq!(value["stacked"]["technologies"].as_array().map(Vec::len), Some(3));
    assert!(value["emissions"]["reductions"]["ghg_tonnes"].as_f64().unwrap() > 0.0);
    Ok(())
}

#[test]
fn incomplete_scenario_is_not_an_error() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = altfleet()?;
    cmd.arg("evaluate").arg(repo_path("assets/scenarios/incomplete.yaml"));
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(
            "Please complete previous sections: existing fuel",
        ));
    Ok(())
}

#[test]
fn options_walk_the_tables() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = altfleet()?;
    cmd.args(["options", "--application", "Freight and Cargo"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Box Truck"))
        .stdout(predicate::str::contains("Transit Bus").not());

    let mut cmd = altfleet()?;
    cmd.args([
        "options",
        "--configuration",
        "Day Cab Tractor",
        "--weight-class",
        "Class 8",
    ]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Hydrogen Fuel Cell"))
        .stdout(predicate::str::contains("Gasoline").not());
    Ok(())
}

#[test]
fn defaults_come_from_tables() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = altfleet()?;
    cmd.args([
        "defaults",
        "--province",
        "Ontario",
        "--weight-class",
        "Class 4",
        "--configuration",
        "Step Van",
        "--existing",
        "Gasoline",
        "--alternative",
        "Battery electric",
    ]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Daily distance: 120 km"))
        .stdout(predicate::str::contains("kWh/km"));
    Ok(())
}

#[test]
fn incentives_lists_caps() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = altfleet()?;
    cmd.arg("incentives");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("CLASS 2B"))
        .stdout(predicate::str::contains("200000 CAD"))
        .stdout(predicate::str::contains("USD").not());

    let mut cmd = altfleet()?;
    cmd.args(["incentives", "--format", "json"]);
    let output = cmd.output()?;
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(value[0]["max_amount"], 200_000);
    Ok(())
}

#[test]
fn weight_class_needs_configuration() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = altfleet()?;
    cmd.args(["options", "--weight-class", "Class 8"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("--configuration"));
    Ok(())
}

#[test]
fn missing_data_dir_fails() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("altfleet")?;
    cmd.args(["--data-dir", "/nonexistent/altfleet", "options"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("loading reference tables"));
    Ok(())
}
