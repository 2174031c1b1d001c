//! User answers as stored in a scenario file.

use crate::builder::ScenarioBuilder;
use crate::inputs::{InfrastructureCost, ScenarioInputs};
use crate::{Scenario, ScenarioError};
use fleet_core::{FuelType, Paired, ReferenceData};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Answers to the scenario prompts. Anything left out keeps the table
/// default; selections left out stop the scenario at that stage.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScenarioAnswers {
    pub province: Option<String>,
    pub application: Option<String>,
    pub configuration: Option<String>,
    pub weight_class: Option<String>,
    pub existing_fuel: Option<FuelType>,
    pub alternative_fuel: Option<FuelType>,

    pub existing_efficiency: Option<Decimal>,
    pub alternative_efficiency: Option<Decimal>,
    pub vehicle_count: Option<u32>,
    pub daily_distance_km: Option<Decimal>,
    pub operating_days: Option<u32>,
    pub lifetime_years: Option<u32>,
    pub discount_rate: Option<Decimal>,
    pub existing_fuel_price: Option<Decimal>,
    pub alternative_fuel_price: Option<Decimal>,
    pub existing_vehicle_price: Option<Decimal>,
    pub alternative_vehicle_price: Option<Decimal>,
    pub vehicle_subsidy: Option<Decimal>,
    pub existing_maintenance_per_km: Option<Decimal>,
    pub alternative_maintenance_per_km: Option<Decimal>,
    pub insurance_per_km: Option<Paired<Decimal>>,
    pub depreciation_pct: Option<Paired<Decimal>>,
    pub infrastructure: Option<InfrastructureCost>,
}

/// A blank answer counts as not given.
fn required<'v>(value: &'v Option<String>, stage: &'static str) -> Result<&'v str, ScenarioError> {
    value
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ScenarioError::Incomplete {
            missing: vec![stage],
        })
}

fn required_fuel(value: Option<FuelType>, stage: &'static str) -> Result<FuelType, ScenarioError> {
    value.ok_or_else(|| ScenarioError::Incomplete {
        missing: vec![stage],
    })
}

fn set<T: Copy>(target: &mut T, answer: Option<T>) {
    if let Some(v) = answer {
        *target = v;
    }
}

impl ScenarioAnswers {
    /// Walk the selection stages in order, then overlay the numeric answers
    /// on the table defaults.
    pub fn apply<'a>(&self, data: &'a ReferenceData) -> Result<Scenario<'a>, ScenarioError> {
        let selection = ScenarioBuilder::new(data)
            .province(required(&self.province, "province")?)?
            .application(required(&self.application, "vehicle application")?)?
            .configuration(required(&self.configuration, "vehicle configuration")?)?
            .weight_class(required(&self.weight_class, "weight class")?)?
            .existing_fuel(required_fuel(self.existing_fuel, "existing fuel")?)?
            .alternative_fuel(required_fuel(self.alternative_fuel, "alternative fuel")?)?;
        let mut scenario = selection.with_defaults();
        self.overlay(&mut scenario.inputs);
        Ok(scenario)
    }

    fn overlay(&self, inputs: &mut ScenarioInputs) {
        let t = &mut inputs.technologies;
        set(&mut t.base.efficiency, self.existing_efficiency);
        set(&mut t.alternative.efficiency, self.alternative_efficiency);
        set(&mut t.base.fuel_price, self.existing_fuel_price);
        set(&mut t.alternative.fuel_price, self.alternative_fuel_price);
        set(&mut t.base.purchase_price, self.existing_vehicle_price);
        set(&mut t.alternative.purchase_price, self.alternative_vehicle_price);
        set(&mut t.base.maintenance_per_km, self.existing_maintenance_per_km);
        set(
            &mut t.alternative.maintenance_per_km,
            self.alternative_maintenance_per_km,
        );
        set(&mut inputs.vehicle_count, self.vehicle_count);
        set(&mut inputs.daily_distance_km, self.daily_distance_km);
        set(&mut inputs.operating_days, self.operating_days);
        set(&mut inputs.lifetime_years, self.lifetime_years);
        set(&mut inputs.discount_rate, self.discount_rate);
        set(&mut inputs.vehicle_subsidy, self.vehicle_subsidy);
        if self.insurance_per_km.is_some() {
            inputs.insurance_per_km = self.insurance_per_km;
        }
        if self.depreciation_pct.is_some() {
            inputs.depreciation_pct = self.depreciation_pct;
        }
        if let Some(infra) = &self.infrastructure {
            inputs.infrastructure = infra.clone();
        }
    }
}
