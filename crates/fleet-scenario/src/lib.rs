#![deny(warnings)]

//! Scenario assembly for a two-technology fleet comparison.
//!
//! A scenario is built stage by stage against the reference tables
//! (province, application, configuration, weight class, incumbent fuel,
//! alternative fuel), pre-filled with table defaults, then evaluated into
//! cost charts and emission reductions.

pub mod answers;
pub mod builder;
pub mod evaluate;
pub mod inputs;
pub mod resolver;

pub use answers::ScenarioAnswers;
pub use builder::{
    ApplicationSelected, ConfigurationSelected, IncumbentSelected, ProvinceSelected,
    ScenarioBuilder, TechnologySelection, VehicleSelected,
};
pub use evaluate::{Evaluation, Scenario};
pub use inputs::{
    ChargerOrder, InfrastructureCost, InfrastructureTotals, ScenarioInputs, TechnologyInputs,
};
pub use resolver::{ResolveError, Resolver};

use fleet_core::FuelType;
use fleet_econ::EconError;
use fleet_emissions::EmissionsError;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ScenarioError {
    /// Recoverable: the named answers still need to be given.
    #[error("Please complete previous sections: {}", .missing.join(", "))]
    Incomplete { missing: Vec<&'static str> },
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error(transparent)]
    Econ(#[from] EconError),
    #[error(transparent)]
    Emissions(#[from] EmissionsError),
    #[error("bottom-up infrastructure estimates need chargers; {0} uses refuelling")]
    BottomUpRequiresCharging(FuelType),
}

impl ScenarioError {
    pub fn is_incomplete(&self) -> bool {
        matches!(self, ScenarioError::Incomplete { .. })
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use fleet_core::{
        ChargingEquipmentOption, DutyCycleDefault, FuelType, ProvinceEnergyProfile,
        ReferenceData, VehicleSpec,
    };
    use rust_decimal::Decimal;
    use std::path::PathBuf;

    fn vehicle(
        weight_class: &str,
        configuration: &str,
        powertrain: FuelType,
        efficiency: (i64, u32),
        price: i64,
        ghg_ef: f64,
    ) -> VehicleSpec {
        let tailpipe = powertrain.unit_family() == fleet_core::UnitFamily::LiquidPer100Km;
        VehicleSpec {
            weight_class: weight_class.into(),
            configuration: configuration.into(),
            powertrain,
            efficiency: Decimal::new(efficiency.0, efficiency.1),
            default_price: Decimal::new(price, 0),
            maintenance_per_km: Decimal::new(18, 2),
            ghg_ef,
            nox_ef: if tailpipe { 1.1 } else { 0.0 },
            pm25_ef: 0.01,
        }
    }

    fn duty(
        application: &str,
        weight_class: &str,
        configuration: &str,
        km: i64,
        days: u32,
        years: u32,
    ) -> DutyCycleDefault {
        DutyCycleDefault {
            application: application.into(),
            weight_class: weight_class.into(),
            configuration: configuration.into(),
            average_daily_distance_km: Decimal::new(km, 0),
            yearly_days_operation: days,
            years_ownership: years,
        }
    }

    fn province(name: &str, tax: (i64, u32), grid: f64, h2: f64) -> ProvinceEnergyProfile {
        ProvinceEnergyProfile {
            province: name.into(),
            diesel: Decimal::new(172, 2),
            gasoline: Decimal::new(158, 2),
            electricity: Decimal::new(13, 2),
            hev: Decimal::new(172, 2),
            biodiesel_b20: Decimal::new(178, 2),
            renewable_diesel_r99: Decimal::new(219, 2),
            hydrogen: Decimal::new(16, 0),
            taxes_perc: Decimal::new(tax.0, tax.1),
            grid_intensity: grid,
            hydrogen_intensity: h2,
        }
    }

    fn charger(power: &str, ports: &str, price: i64) -> ChargingEquipmentOption {
        ChargingEquipmentOption {
            power_level: power.into(),
            port_configuration: ports.into(),
            price: Decimal::new(price, 0),
        }
    }

    /// Small hand-written tables: a step van with a gasoline option, a day
    /// cab tractor with hydrogen, a transit bus with hydrogen and a hybrid.
    pub fn reference_data() -> ReferenceData {
        use FuelType::*;
        let vehicles = vec![
            vehicle("Class 4", "Step Van", Diesel, (18, 0), 95_000, 560.0),
            vehicle("Class 4", "Step Van", Gasoline, (24, 0), 85_000, 610.0),
            vehicle("Class 4", "Step Van", BiodieselB20, (18, 0), 95_000, 480.0),
            vehicle("Class 4", "Step Van", BatteryElectric, (55, 2), 180_000, 0.0),
            vehicle("Class 8", "Day Cab Tractor", Diesel, (38, 0), 210_000, 1_150.0),
            vehicle("Class 8", "Day Cab Tractor", BiodieselB20, (38, 0), 210_000, 990.0),
            vehicle("Class 8", "Day Cab Tractor", RenewableDieselR99, (38, 0), 210_000, 400.0),
            vehicle("Class 8", "Day Cab Tractor", BatteryElectric, (16, 1), 420_000, 0.0),
            vehicle("Class 8", "Day Cab Tractor", HydrogenFuelCell, (85, 1), 480_000, 0.0),
            vehicle("Class 8", "Transit Bus", Diesel, (50, 0), 650_000, 1_400.0),
            vehicle("Class 8", "Transit Bus", BiodieselB20, (50, 0), 650_000, 1_200.0),
            vehicle("Class 8", "Transit Bus", RenewableDieselR99, (50, 0), 650_000, 480.0),
            vehicle("Class 8", "Transit Bus", BatteryElectric, (12, 1), 1_100_000, 0.0),
            vehicle("Class 8", "Transit Bus", HydrogenFuelCell, (9, 0), 1_300_000, 0.0),
            vehicle("Class 8", "Transit Bus", Hev, (40, 0), 850_000, 1_100.0),
        ];
        let duty_cycles = vec![
            duty("Freight and Cargo", "Class 4", "Step Van", 120, 260, 10),
            duty("Freight and Cargo", "Class 8", "Day Cab Tractor", 300, 250, 8),
            duty("Passenger Transport", "Class 8", "Transit Bus", 220, 330, 12),
        ];
        let charging = vec![
            charger("Level 2 19.2 kW", "Single Port", 9_000),
            charger("DCFC 50 kW", "Single Port", 45_000),
            charger("DCFC 150 kW", "Dual Port", 120_000),
        ];
        let provinces = vec![
            province("Ontario", (13, 0), 30.0, 10_100.0),
            province("Quebec", (14_975, 3), 1.7, 2_500.0),
        ];
        match ReferenceData::new(vehicles, charging, duty_cycles, provinces) {
            Ok(data) => data,
            Err(e) => panic!("fixture tables are invalid: {e}"),
        }
    }

    /// The tables shipped under `assets/data`.
    pub fn bundled() -> ReferenceData {
        let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../assets/data");
        match data_pipeline::load_reference_data(&data_pipeline::DataSources::from_dir(dir)) {
            Ok(data) => data,
            Err(e) => panic!("bundled tables failed to load: {e}"),
        }
    }
}
