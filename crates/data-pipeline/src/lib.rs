#![deny(warnings)]

//! Reference-table ingestion: reads the vehicle, charging, duty-cycle and
//! province CSV files into a validated [`ReferenceData`].

use fleet_core::{
    ChargingEquipmentOption, DutyCycleDefault, ProvinceEnergyProfile, ReferenceData,
    ValidationError, VehicleSpec,
};
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

pub const VEHICLES_FILE: &str = "MHDV_costs_efficiency_final.csv";
pub const CHARGING_FILE: &str = "MHDV_charging_infa_prices_final.csv";
pub const DUTY_CYCLES_FILE: &str = "MHDV_duty_cycles_final.csv";
pub const PROVINCE_ENERGY_FILE: &str = "province_energy_prices.csv";

/// Errors raised while loading reference data.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("cannot open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed table {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("invalid reference data: {0}")]
    Invalid(#[from] ValidationError),
}

/// Locations of the four reference tables.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DataSources {
    pub vehicles: PathBuf,
    pub charging: PathBuf,
    pub duty_cycles: PathBuf,
    pub province_energy: PathBuf,
}

impl DataSources {
    /// Standard file names inside `dir`.
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref();
        Self {
            vehicles: dir.join(VEHICLES_FILE),
            charging: dir.join(CHARGING_FILE),
            duty_cycles: dir.join(DUTY_CYCLES_FILE),
            province_energy: dir.join(PROVINCE_ENERGY_FILE),
        }
    }
}

/// Deserialize every row of a CSV stream. `origin` names the source in errors.
pub fn read_rows<T: DeserializeOwned, R: Read>(
    reader: R,
    origin: &Path,
) -> Result<Vec<T>, DataError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut rows = Vec::new();
    for result in rdr.deserialize() {
        let row: T = result.map_err(|source| DataError::Csv {
            path: origin.to_path_buf(),
            source,
        })?;
        rows.push(row);
    }
    Ok(rows)
}

/// Read a whole CSV table from disk.
pub fn read_table<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, DataError> {
    let file = File::open(path).map_err(|source| DataError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let rows: Vec<T> = read_rows(file, path)?;
    debug!(path = %path.display(), rows = rows.len(), "table read");
    Ok(rows)
}

/// Load and validate all reference tables.
pub fn load_reference_data(sources: &DataSources) -> Result<ReferenceData, DataError> {
    let vehicles: Vec<VehicleSpec> = read_table(&sources.vehicles)?;
    let charging: Vec<ChargingEquipmentOption> = read_table(&sources.charging)?;
    let duty_cycles: Vec<DutyCycleDefault> = read_table(&sources.duty_cycles)?;
    let provinces: Vec<ProvinceEnergyProfile> = read_table(&sources.province_energy)?;
    let data = ReferenceData::new(vehicles, charging, duty_cycles, provinces)?;
    info!(
        vehicles = data.vehicles().len(),
        duty_cycles = data.duty_cycles().len(),
        provinces = data.provinces().len(),
        "reference data loaded"
    );
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleet_core::{FuelType, VehicleKey};
    use rust_decimal::Decimal;

    fn assets() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../assets/data")
    }

    #[test]
    fn bundled_tables_load() {
        let data = load_reference_data(&DataSources::from_dir(assets())).unwrap();
        assert!(!data.vehicles().is_empty());
        assert!(!data.charging().is_empty());
        assert_eq!(data.provinces().len(), 13);
        let key = VehicleKey::new("Class 8", "Day Cab Tractor");
        assert!(data.duty_cycle(&key).is_some());
        assert!(data.vehicle_spec(&key, FuelType::Diesel).is_some());
        assert!(data.vehicle_spec(&key, FuelType::HydrogenFuelCell).is_some());
    }

    #[test]
    fn vehicle_columns_map_to_fields() {
        let csv = "\
WeightClass,Configuration,Powertrain,FuelEfficiencyCAD,Default_price,Maintenance,GHG EF,NOx EF,PM2.5 EF,Source
Class 6, Box Truck ,Battery electric,0.95,210000,0.14,0,0,0.004,estimate
";
        let rows: Vec<VehicleSpec> = read_rows(csv.as_bytes(), Path::new("inline.csv")).unwrap();
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.configuration, "Box Truck");
        assert_eq!(row.powertrain, FuelType::BatteryElectric);
        assert_eq!(row.efficiency, Decimal::new(95, 2));
        assert_eq!(row.default_price, Decimal::new(210_000, 0));
        assert_eq!(row.pm25_ef, 0.004);
    }

    #[test]
    fn charging_labels_join_power_and_ports() {
        let csv = "PowerLevel,PortConfiguration,Price\nDCFC 50 kW,Single Port,45000\n";
        let rows: Vec<ChargingEquipmentOption> =
            read_rows(csv.as_bytes(), Path::new("inline.csv")).unwrap();
        assert_eq!(rows[0].label(), "DCFC 50 kW Single Port");
    }

    #[test]
    fn unknown_powertrain_is_a_csv_error() {
        let csv = "\
WeightClass,Configuration,Powertrain,FuelEfficiencyCAD,Default_price,Maintenance,GHG EF,NOx EF,PM2.5 EF
Class 6,Box Truck,Propane,30,120000,0.2,700,1,0.01
";
        let err = read_rows::<VehicleSpec, _>(csv.as_bytes(), Path::new("bad.csv")).unwrap_err();
        assert!(matches!(err, DataError::Csv { .. }));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = read_table::<VehicleSpec>(Path::new("does/not/exist.csv")).unwrap_err();
        match err {
            DataError::Io { path, .. } => assert_eq!(path, PathBuf::from("does/not/exist.csv")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn duplicate_rows_fail_the_load() {
        let dir = assets();
        let mut sources = DataSources::from_dir(&dir);
        sources.duty_cycles = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests/fixtures/duplicate_duty_cycles.csv");
        let err = load_reference_data(&sources).unwrap_err();
        assert!(matches!(
            err,
            DataError::Invalid(ValidationError::DuplicateRow { .. })
        ));
    }
}
