//! Option lists and row lookups over the reference tables.

use fleet_core::{
    ChargingEquipmentOption, DutyCycleDefault, FuelType, ProvinceEnergyProfile, ReferenceData,
    VehicleKey, VehicleSpec,
};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ResolveError {
    #[error("{0} must be selected first")]
    MissingPrerequisite(&'static str),
    #[error("{value:?} is not a valid {field}; choose one of: {}", .options.join(", "))]
    InvalidChoice {
        field: &'static str,
        value: String,
        options: Vec<String>,
    },
    #[error("no {powertrain} vehicle data for {key}")]
    MissingVehicleSpec {
        key: VehicleKey,
        powertrain: FuelType,
    },
    #[error("no duty cycle defaults for {0}")]
    MissingDutyCycle(VehicleKey),
    #[error("no energy profile for {0:?}")]
    MissingProvince(String),
    #[error("unknown charger model {0:?}")]
    UnknownCharger(String),
}

/// Alternatives offered for every vehicle; hydrogen and hybrids only when
/// the vehicle table has a row for them.
const ALWAYS_OFFERED: [FuelType; 3] = [
    FuelType::BiodieselB20,
    FuelType::RenewableDieselR99,
    FuelType::BatteryElectric,
];
const OFFERED_IF_LISTED: [FuelType; 2] = [FuelType::HydrogenFuelCell, FuelType::Hev];

#[derive(Clone, Copy, Debug)]
pub struct Resolver<'a> {
    data: &'a ReferenceData,
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut out: Vec<&str> = Vec::new();
    for v in values {
        if !out.contains(&v) {
            out.push(v);
        }
    }
    out
}

impl<'a> Resolver<'a> {
    pub fn new(data: &'a ReferenceData) -> Self {
        Self { data }
    }

    pub fn data(&self) -> &'a ReferenceData {
        self.data
    }

    /// Province names in table order.
    pub fn provinces(&self) -> Vec<&'a str> {
        self.data
            .provinces()
            .iter()
            .map(|p| p.province.as_str())
            .collect()
    }

    pub fn applications(&self) -> Vec<&'a str> {
        distinct(self.data.duty_cycles().iter().map(|d| d.application.as_str()))
    }

    /// Configurations used by an application, in table order.
    pub fn configurations(&self, application: &str) -> Result<Vec<&'a str>, ResolveError> {
        if application.trim().is_empty() {
            return Err(ResolveError::MissingPrerequisite("application"));
        }
        Ok(distinct(
            self.data
                .duty_cycles()
                .iter()
                .filter(|d| d.application == application)
                .map(|d| d.configuration.as_str()),
        ))
    }

    /// Weight classes offered for a configuration.
    pub fn weight_classes(&self, configuration: &str) -> Result<Vec<&'a str>, ResolveError> {
        if configuration.trim().is_empty() {
            return Err(ResolveError::MissingPrerequisite("configuration"));
        }
        Ok(distinct(
            self.data
                .duty_cycles()
                .iter()
                .filter(|d| d.configuration == configuration)
                .map(|d| d.weight_class.as_str()),
        ))
    }

    /// Diesel always; Gasoline when the vehicle table lists it for `key`.
    pub fn existing_fuels(&self, key: &VehicleKey) -> Vec<FuelType> {
        let mut fuels = vec![FuelType::Diesel];
        if self.data.vehicle_spec(key, FuelType::Gasoline).is_some() {
            fuels.push(FuelType::Gasoline);
        }
        fuels
    }

    pub fn alternative_fuels(&self, key: &VehicleKey) -> Vec<FuelType> {
        let mut fuels = ALWAYS_OFFERED.to_vec();
        fuels.extend(
            OFFERED_IF_LISTED
                .into_iter()
                .filter(|f| self.data.vehicle_spec(key, *f).is_some()),
        );
        fuels
    }

    pub fn duty_cycle(&self, key: &VehicleKey) -> Result<&'a DutyCycleDefault, ResolveError> {
        self.data
            .duty_cycle(key)
            .ok_or_else(|| ResolveError::MissingDutyCycle(key.clone()))
    }

    pub fn vehicle_spec(
        &self,
        key: &VehicleKey,
        powertrain: FuelType,
    ) -> Result<&'a VehicleSpec, ResolveError> {
        self.data
            .vehicle_spec(key, powertrain)
            .ok_or_else(|| ResolveError::MissingVehicleSpec {
                key: key.clone(),
                powertrain,
            })
    }

    pub fn province(&self, name: &str) -> Result<&'a ProvinceEnergyProfile, ResolveError> {
        self.data
            .province(name)
            .ok_or_else(|| ResolveError::MissingProvince(name.to_string()))
    }

    pub fn charging_options(&self) -> &'a [ChargingEquipmentOption] {
        self.data.charging()
    }

    pub fn charging_option(
        &self,
        label: &str,
    ) -> Result<&'a ChargingEquipmentOption, ResolveError> {
        self.data
            .charging_option(label)
            .ok_or_else(|| ResolveError::UnknownCharger(label.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use proptest::prelude::*;

    #[test]
    fn option_lists_follow_table_order() {
        let data = fixtures::reference_data();
        let r = Resolver::new(&data);
        assert_eq!(r.provinces(), vec!["Ontario", "Quebec"]);
        assert_eq!(r.applications(), vec!["Freight and Cargo", "Passenger Transport"]);
        assert_eq!(
            r.configurations("Freight and Cargo").unwrap(),
            vec!["Step Van", "Day Cab Tractor"]
        );
        assert_eq!(r.weight_classes("Transit Bus").unwrap(), vec!["Class 8"]);
        assert!(r.configurations("Mining").unwrap().is_empty());
    }

    #[test]
    fn empty_prerequisites_are_reported() {
        let data = fixtures::reference_data();
        let r = Resolver::new(&data);
        assert_eq!(
            r.configurations(""),
            Err(ResolveError::MissingPrerequisite("application"))
        );
        assert_eq!(
            r.weight_classes("  "),
            Err(ResolveError::MissingPrerequisite("configuration"))
        );
    }

    #[test]
    fn alternative_fuels_append_hydrogen_then_hybrid() {
        let data = fixtures::reference_data();
        let r = Resolver::new(&data);
        let bus = VehicleKey::new("Class 8", "Transit Bus");
        assert_eq!(
            r.alternative_fuels(&bus),
            vec![
                FuelType::BiodieselB20,
                FuelType::RenewableDieselR99,
                FuelType::BatteryElectric,
                FuelType::HydrogenFuelCell,
                FuelType::Hev,
            ]
        );
        let van = VehicleKey::new("Class 4", "Step Van");
        assert_eq!(r.alternative_fuels(&van), ALWAYS_OFFERED.to_vec());
    }

    #[test]
    fn missing_rows_are_typed() {
        let data = fixtures::reference_data();
        let r = Resolver::new(&data);
        let key = VehicleKey::new("Class 2B", "Pickup");
        assert_eq!(
            r.duty_cycle(&key),
            Err(ResolveError::MissingDutyCycle(key.clone()))
        );
        assert!(matches!(
            r.vehicle_spec(&key, FuelType::Diesel),
            Err(ResolveError::MissingVehicleSpec { .. })
        ));
        assert_eq!(
            r.province("Atlantis"),
            Err(ResolveError::MissingProvince("Atlantis".into()))
        );
        assert_eq!(
            r.charging_option("Level 9").unwrap_err().to_string(),
            "unknown charger model \"Level 9\""
        );
    }

    #[test]
    fn invalid_choice_lists_options() {
        let err = ResolveError::InvalidChoice {
            field: "province",
            value: "Atlantis".into(),
            options: vec!["Ontario".into(), "Quebec".into()],
        };
        assert_eq!(
            err.to_string(),
            "\"Atlantis\" is not a valid province; choose one of: Ontario, Quebec"
        );
    }

    #[test]
    fn bundled_duty_defaults_match_their_row() {
        let data = fixtures::bundled();
        let r = Resolver::new(&data);
        for row in data.duty_cycles() {
            let found = r.duty_cycle(&row.key()).unwrap();
            assert_eq!(found.average_daily_distance_km, row.average_daily_distance_km);
            assert_eq!(found.yearly_days_operation, row.yearly_days_operation);
            assert_eq!(found.years_ownership, row.years_ownership);
        }
    }

    proptest! {
        #[test]
        fn gasoline_offered_iff_listed(idx in 0usize..64) {
            let data = fixtures::bundled();
            let r = Resolver::new(&data);
            let rows = data.duty_cycles();
            let key = rows[idx % rows.len()].key();
            let fuels = r.existing_fuels(&key);
            prop_assert_eq!(fuels[0], FuelType::Diesel);
            prop_assert_eq!(
                fuels.contains(&FuelType::Gasoline),
                data.vehicle_spec(&key, FuelType::Gasoline).is_some()
            );
        }
    }
}
