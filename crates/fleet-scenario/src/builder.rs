//! Staged scenario selection.
//!
//! Each stage owns the answers given so far and offers only the next choice,
//! so a scenario can't be evaluated with an upstream answer missing. Choices
//! are checked against the resolver's option list for that stage.

use crate::inputs::{default_discount_rate, InfrastructureCost, ScenarioInputs, TechnologyInputs};
use crate::resolver::{ResolveError, Resolver};
use crate::Scenario;
use fleet_core::{
    DutyCycleDefault, FuelType, Paired, ProvinceEnergyProfile, ReferenceData, VehicleKey,
    VehicleSpec,
};
use rust_decimal::Decimal;
use tracing::debug;

fn choose<'a>(
    field: &'static str,
    value: &str,
    options: Vec<&'a str>,
) -> Result<&'a str, ResolveError> {
    match options.iter().copied().find(|o| *o == value) {
        Some(found) => Ok(found),
        None => Err(ResolveError::InvalidChoice {
            field,
            value: value.to_string(),
            options: options.into_iter().map(str::to_string).collect(),
        }),
    }
}

fn choose_fuel(
    field: &'static str,
    value: FuelType,
    options: Vec<FuelType>,
) -> Result<FuelType, ResolveError> {
    if options.contains(&value) {
        return Ok(value);
    }
    Err(ResolveError::InvalidChoice {
        field,
        value: value.to_string(),
        options: options.iter().map(|f| f.to_string()).collect(),
    })
}

/// Start of a scenario: nothing chosen yet.
#[derive(Clone, Copy, Debug)]
pub struct ScenarioBuilder<'a> {
    resolver: Resolver<'a>,
}

impl<'a> ScenarioBuilder<'a> {
    pub fn new(data: &'a ReferenceData) -> Self {
        Self {
            resolver: Resolver::new(data),
        }
    }

    pub fn province_options(&self) -> Vec<&'a str> {
        self.resolver.provinces()
    }

    pub fn province(self, name: &str) -> Result<ProvinceSelected<'a>, ResolveError> {
        let name = choose("province", name, self.province_options())?;
        Ok(ProvinceSelected {
            resolver: self.resolver,
            province: self.resolver.province(name)?,
        })
    }
}

#[derive(Clone, Copy, Debug)]
pub struct ProvinceSelected<'a> {
    resolver: Resolver<'a>,
    province: &'a ProvinceEnergyProfile,
}

impl<'a> ProvinceSelected<'a> {
    pub fn application_options(&self) -> Vec<&'a str> {
        self.resolver.applications()
    }

    pub fn application(self, application: &str) -> Result<ApplicationSelected<'a>, ResolveError> {
        let application = choose("application", application, self.application_options())?;
        Ok(ApplicationSelected {
            prev: self,
            application,
        })
    }
}

#[derive(Clone, Copy, Debug)]
pub struct ApplicationSelected<'a> {
    prev: ProvinceSelected<'a>,
    application: &'a str,
}

impl<'a> ApplicationSelected<'a> {
    pub fn configuration_options(&self) -> Vec<&'a str> {
        // `application` came from the option list, so it is never empty.
        self.prev
            .resolver
            .configurations(self.application)
            .unwrap_or_default()
    }

    pub fn configuration(
        self,
        configuration: &str,
    ) -> Result<ConfigurationSelected<'a>, ResolveError> {
        let configuration = choose("configuration", configuration, self.configuration_options())?;
        Ok(ConfigurationSelected {
            prev: self,
            configuration,
        })
    }
}

#[derive(Clone, Copy, Debug)]
pub struct ConfigurationSelected<'a> {
    prev: ApplicationSelected<'a>,
    configuration: &'a str,
}

impl<'a> ConfigurationSelected<'a> {
    pub fn weight_class_options(&self) -> Vec<&'a str> {
        self.prev
            .prev
            .resolver
            .weight_classes(self.configuration)
            .unwrap_or_default()
    }

    pub fn weight_class(self, weight_class: &str) -> Result<VehicleSelected<'a>, ResolveError> {
        let weight_class = choose("weight class", weight_class, self.weight_class_options())?;
        let key = VehicleKey::new(weight_class, self.configuration);
        let duty_cycle = self.prev.prev.resolver.duty_cycle(&key)?;
        Ok(VehicleSelected {
            resolver: self.prev.prev.resolver,
            province: self.prev.prev.province,
            application: self.prev.application,
            key,
            duty_cycle,
        })
    }
}

/// Vehicle fully identified; fuel choices come next.
#[derive(Clone, Debug)]
pub struct VehicleSelected<'a> {
    resolver: Resolver<'a>,
    province: &'a ProvinceEnergyProfile,
    application: &'a str,
    key: VehicleKey,
    duty_cycle: &'a DutyCycleDefault,
}

impl<'a> VehicleSelected<'a> {
    pub fn key(&self) -> &VehicleKey {
        &self.key
    }

    pub fn duty_cycle(&self) -> &'a DutyCycleDefault {
        self.duty_cycle
    }

    pub fn existing_fuel_options(&self) -> Vec<FuelType> {
        self.resolver.existing_fuels(&self.key)
    }

    pub fn existing_fuel(self, fuel: FuelType) -> Result<IncumbentSelected<'a>, ResolveError> {
        let fuel = choose_fuel("existing fuel", fuel, self.existing_fuel_options())?;
        let existing = self.resolver.vehicle_spec(&self.key, fuel)?;
        Ok(IncumbentSelected {
            prev: self,
            existing,
        })
    }
}

#[derive(Clone, Debug)]
pub struct IncumbentSelected<'a> {
    prev: VehicleSelected<'a>,
    existing: &'a VehicleSpec,
}

impl<'a> IncumbentSelected<'a> {
    pub fn alternative_fuel_options(&self) -> Vec<FuelType> {
        self.prev.resolver.alternative_fuels(&self.prev.key)
    }

    pub fn alternative_fuel(self, fuel: FuelType) -> Result<TechnologySelection<'a>, ResolveError> {
        let fuel = choose_fuel("alternative fuel", fuel, self.alternative_fuel_options())?;
        let alternative = self.prev.resolver.vehicle_spec(&self.prev.key, fuel)?;
        let VehicleSelected {
            resolver,
            province,
            application,
            key,
            duty_cycle,
        } = self.prev;
        Ok(TechnologySelection {
            resolver,
            province,
            application,
            key,
            duty_cycle,
            vehicles: Paired::new(self.existing, alternative),
        })
    }
}

/// Every selection made; each reference row the scenario needs is resolved.
#[derive(Clone, Debug)]
pub struct TechnologySelection<'a> {
    resolver: Resolver<'a>,
    province: &'a ProvinceEnergyProfile,
    application: &'a str,
    key: VehicleKey,
    duty_cycle: &'a DutyCycleDefault,
    vehicles: Paired<&'a VehicleSpec>,
}

impl<'a> TechnologySelection<'a> {
    pub fn resolver(&self) -> &Resolver<'a> {
        &self.resolver
    }

    pub fn province(&self) -> &'a ProvinceEnergyProfile {
        self.province
    }

    pub fn application(&self) -> &'a str {
        self.application
    }

    pub fn key(&self) -> &VehicleKey {
        &self.key
    }

    pub fn duty_cycle(&self) -> &'a DutyCycleDefault {
        self.duty_cycle
    }

    pub fn vehicles(&self) -> Paired<&'a VehicleSpec> {
        self.vehicles
    }

    pub fn fuels(&self) -> Paired<FuelType> {
        self.vehicles.map(|v| v.powertrain)
    }

    /// Inputs as the reference tables suggest them. The vehicle count starts
    /// at zero and has to be given.
    pub fn default_inputs(&self) -> ScenarioInputs {
        let technologies = self
            .vehicles
            .map(|v| TechnologyInputs::from_tables(v, self.province));
        debug!(
            key = %self.key,
            province = %self.province.province,
            distance_km = %self.duty_cycle.average_daily_distance_km,
            days = self.duty_cycle.yearly_days_operation,
            lifetime = self.duty_cycle.years_ownership,
            "defaults resolved"
        );
        ScenarioInputs {
            technologies,
            vehicle_count: 0,
            daily_distance_km: self.duty_cycle.average_daily_distance_km,
            operating_days: self.duty_cycle.yearly_days_operation,
            lifetime_years: self.duty_cycle.years_ownership,
            discount_rate: default_discount_rate(),
            vehicle_subsidy: Decimal::ZERO,
            insurance_per_km: None,
            depreciation_pct: None,
            infrastructure: InfrastructureCost::Omitted,
        }
    }

    pub fn with_defaults(self) -> Scenario<'a> {
        let inputs = self.default_inputs();
        Scenario::new(self, inputs)
    }
}
