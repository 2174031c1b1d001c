//! A complete scenario and the cost/emissions pipeline run over it.

use crate::builder::TechnologySelection;
use crate::inputs::{InfrastructureTotals, ScenarioInputs};
use crate::ScenarioError;
use fleet_core::{max_federal_incentive, FuelType, Paired, VehicleKey};
use fleet_econ::{
    cumulative_chart, discounted_tco, fuel_cost_per_km, stacked_breakdown, stacked_chart,
    CostInputs, CumulativeCost, CumulativeCostChart, StackedCost, StackedCostChart,
};
use fleet_emissions::{
    emissions_report, ActivityProfile, EmissionsError, EmissionsReport, PowertrainFactors,
};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, warn};

/// Selected vehicles plus the numeric answers. `inputs` may be edited freely;
/// `evaluate` re-checks it on every call.
#[derive(Clone, Debug)]
pub struct Scenario<'a> {
    selection: TechnologySelection<'a>,
    pub inputs: ScenarioInputs,
}

/// Everything a front end renders for one scenario.
#[derive(Clone, Debug, Serialize)]
pub struct Evaluation {
    pub province: String,
    pub application: String,
    pub vehicle: VehicleKey,
    pub fuels: Paired<FuelType>,
    pub inputs: ScenarioInputs,
    pub fuel_cost_per_km: Paired<Decimal>,
    pub infrastructure: InfrastructureTotals,
    pub cumulative: CumulativeCost,
    pub cumulative_chart: CumulativeCostChart,
    pub stacked: StackedCost,
    pub stacked_chart: StackedCostChart,
    pub emissions: EmissionsReport,
}

impl<'a> Scenario<'a> {
    pub fn new(selection: TechnologySelection<'a>, inputs: ScenarioInputs) -> Self {
        Self { selection, inputs }
    }

    pub fn selection(&self) -> &TechnologySelection<'a> {
        &self.selection
    }

    pub fn fuels(&self) -> Paired<FuelType> {
        self.selection.fuels()
    }

    pub fn check_complete(&self) -> Result<(), ScenarioError> {
        let missing = self.inputs.missing_fields();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ScenarioError::Incomplete { missing })
        }
    }

    pub fn fuel_cost_per_km(&self) -> Result<Paired<Decimal>, ScenarioError> {
        let fuels = self.fuels();
        let t = &self.inputs.technologies;
        Ok(Paired::new(
            fuel_cost_per_km(fuels.base, t.base.fuel_price, t.base.efficiency)?,
            fuel_cost_per_km(
                fuels.alternative,
                t.alternative.fuel_price,
                t.alternative.efficiency,
            )?,
        ))
    }

    pub fn infrastructure_totals(&self) -> Result<InfrastructureTotals, ScenarioError> {
        self.inputs
            .infrastructure
            .totals(self.fuels().alternative, self.selection.resolver())
    }

    /// Resolved inputs for the cost model.
    pub fn cost_inputs(&self) -> Result<CostInputs, ScenarioError> {
        self.check_complete()?;
        let fuels = self.fuels();
        let infra = self.infrastructure_totals()?;
        let t = &self.inputs.technologies;
        let inputs = CostInputs {
            base_fuel: fuels.base,
            alternative_fuel: fuels.alternative,
            vehicle_count: self.inputs.vehicle_count,
            lifetime_years: self.inputs.lifetime_years,
            daily_distance_km: self.inputs.daily_distance_km,
            operating_days: self.inputs.operating_days,
            discount_rate: self.inputs.discount_rate,
            provincial_tax_pct: self.selection.province().taxes_perc,
            purchase_price: t.map(|x| x.purchase_price),
            maintenance_per_km: t.map(|x| x.maintenance_per_km),
            fuel_per_km: self.fuel_cost_per_km()?,
            insurance_per_km: self.inputs.insurance_per_km,
            depreciation_pct: self.inputs.depreciation_pct,
            vehicle_subsidy: self.inputs.vehicle_subsidy,
            infrastructure_cost: infra.total,
            infrastructure_subsidy: infra.subsidy,
        };
        inputs.validate()?;
        Ok(inputs)
    }

    pub fn activity(&self) -> Result<ActivityProfile, ScenarioError> {
        let daily_distance_km = self
            .inputs
            .daily_distance_km
            .to_f64()
            .ok_or(EmissionsError::NonFinite("daily distance"))?;
        Ok(ActivityProfile {
            vehicle_count: self.inputs.vehicle_count,
            lifetime_years: self.inputs.lifetime_years,
            daily_distance_km,
            operating_days: self.inputs.operating_days,
        })
    }

    pub fn emission_factors(&self) -> Result<Paired<PowertrainFactors>, ScenarioError> {
        let vehicles = self.selection.vehicles();
        let province = self.selection.province();
        let t = &self.inputs.technologies;
        Ok(Paired::new(
            PowertrainFactors::from_spec(vehicles.base, t.base.efficiency, province)?,
            PowertrainFactors::from_spec(vehicles.alternative, t.alternative.efficiency, province)?,
        ))
    }

    fn warn_above_incentive_cap(&self) {
        let weight_class = &self.selection.key().weight_class;
        if let Some(cap) = max_federal_incentive(weight_class) {
            if self.inputs.vehicle_subsidy > Decimal::from(cap) {
                warn!(
                    weight_class = %weight_class,
                    subsidy = %self.inputs.vehicle_subsidy,
                    cap,
                    "vehicle subsidy exceeds the federal incentive maximum for this class"
                );
            }
        }
    }

    /// Full pipeline: completeness, cost views, charts and emissions.
    pub fn evaluate(&self) -> Result<Evaluation, ScenarioError> {
        let cost_inputs = self.cost_inputs()?;
        self.warn_above_incentive_cap();
        let infrastructure = self.infrastructure_totals()?;

        let cumulative = discounted_tco(&cost_inputs)?;
        let stacked = stacked_breakdown(&cost_inputs)?;
        let emissions = emissions_report(&self.activity()?, &self.emission_factors()?)?;

        info!(
            vehicle = %self.selection.key(),
            base = %cost_inputs.base_fuel,
            alternative = %cost_inputs.alternative_fuel,
            ghg_reduction_t = emissions.reductions.ghg_tonnes,
            "scenario evaluated"
        );
        Ok(Evaluation {
            province: self.selection.province().province.clone(),
            application: self.selection.application().to_string(),
            vehicle: self.selection.key().clone(),
            fuels: self.fuels(),
            inputs: self.inputs.clone(),
            fuel_cost_per_km: cost_inputs.fuel_per_km,
            infrastructure,
            cumulative_chart: cumulative_chart(&cumulative)?,
            cumulative,
            stacked_chart: stacked_chart(&stacked)?,
            stacked,
            emissions,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::fixtures;
    use crate::inputs::{ChargerOrder, InfrastructureCost};
    use crate::{ScenarioBuilder, ScenarioError};
    use fleet_core::{FuelType, Paired, ReferenceData};
    use fleet_econ::{CostCategory, DisplayScale, EconError};
    use rust_decimal::Decimal;

    fn bus(data: &ReferenceData, alternative: FuelType) -> super::Scenario<'_> {
        ScenarioBuilder::new(data)
            .province("Ontario")
            .unwrap()
            .application("Passenger Transport")
            .unwrap()
            .configuration("Transit Bus")
            .unwrap()
            .weight_class("Class 8")
            .unwrap()
            .existing_fuel(FuelType::Diesel)
            .unwrap()
            .alternative_fuel(alternative)
            .unwrap()
            .with_defaults()
    }

    #[test]
    fn zero_vehicles_is_incomplete() {
        let data = fixtures::reference_data();
        let scenario = bus(&data, FuelType::BatteryElectric);
        let err = scenario.evaluate().unwrap_err();
        assert_eq!(
            err,
            ScenarioError::Incomplete {
                missing: vec!["number of vehicles"]
            }
        );
        assert_eq!(
            err.to_string(),
            "Please complete previous sections: number of vehicles"
        );
    }

    #[test]
    fn electric_bus_end_to_end() {
        let data = fixtures::reference_data();
        let mut scenario = bus(&data, FuelType::BatteryElectric);
        scenario.inputs.vehicle_count = 4;
        scenario.inputs.vehicle_subsidy = Decimal::new(150_000, 0);
        scenario.inputs.infrastructure = InfrastructureCost::BottomUp {
            chargers: vec![ChargerOrder {
                label: "DCFC 50 kW Single Port".into(),
                unit_price: None,
                quantity: 2,
            }],
            construction_and_grid: Decimal::new(30_000, 0),
            subsidy: Decimal::ZERO,
        };
        let eval = scenario.evaluate().unwrap();

        assert_eq!(eval.infrastructure.total, Decimal::new(2 * 45_000 + 30_000, 0));
        let lifetime = scenario.inputs.lifetime_years as usize;
        assert_eq!(eval.cumulative.rows.len(), lifetime + 1);
        assert!(eval.cumulative.has_subsidies());
        assert_eq!(eval.cumulative_chart.series.len(), 3);
        assert_eq!(eval.cumulative_chart.scale, DisplayScale::Millions);
        assert_eq!(
            eval.stacked.categories,
            vec![
                CostCategory::Vehicle,
                CostCategory::Infrastructure,
                CostCategory::Maintenance,
                CostCategory::Fuel
            ]
        );
        assert_eq!(
            eval.stacked_chart.series[1].category,
            "Charging Infrastructure"
        );
        assert!(eval.emissions.reductions.ghg_tonnes > 0.0);
        assert_eq!(
            eval.fuel_cost_per_km.alternative,
            Decimal::new(13, 2) * Decimal::new(12, 1)
        );
    }

    #[test]
    fn hydrogen_rejects_bottom_up_chargers() {
        let data = fixtures::reference_data();
        let mut scenario = bus(&data, FuelType::HydrogenFuelCell);
        scenario.inputs.vehicle_count = 2;
        scenario.inputs.infrastructure = InfrastructureCost::BottomUp {
            chargers: vec![],
            construction_and_grid: Decimal::new(10_000, 0),
            subsidy: Decimal::ZERO,
        };
        assert_eq!(
            scenario.evaluate().unwrap_err(),
            ScenarioError::BottomUpRequiresCharging(FuelType::HydrogenFuelCell)
        );
    }

    #[test]
    fn cost_model_errors_propagate() {
        let data = fixtures::reference_data();
        let mut scenario = bus(&data, FuelType::BiodieselB20);
        scenario.inputs.vehicle_count = 1;
        scenario.inputs.discount_rate = Decimal::new(2, 0);
        assert_eq!(
            scenario.evaluate().unwrap_err(),
            ScenarioError::Econ(EconError::InvalidRate(Decimal::new(2, 0)))
        );
    }

    #[test]
    fn cost_inputs_carry_tax_and_fuel_rates() {
        let data = fixtures::reference_data();
        let mut scenario = bus(&data, FuelType::BiodieselB20);
        scenario.inputs.vehicle_count = 3;
        scenario.inputs.insurance_per_km =
            Some(Paired::new(Decimal::new(5, 2), Decimal::new(5, 2)));
        let ci = scenario.cost_inputs().unwrap();
        assert_eq!(ci.provincial_tax_pct, Decimal::new(13, 0));
        assert_eq!(ci.infrastructure_cost, Decimal::ZERO);
        let t = &scenario.inputs.technologies;
        assert_eq!(
            ci.fuel_per_km.base,
            t.base.fuel_price * t.base.efficiency / Decimal::ONE_HUNDRED
        );
        assert_eq!(ci.insurance_per_km, scenario.inputs.insurance_per_km);
    }

    #[test]
    fn negative_maintenance_is_invalid_not_missing() {
        let data = fixtures::reference_data();
        let mut scenario = bus(&data, FuelType::BatteryElectric);
        scenario.inputs.vehicle_count = 2;
        scenario.inputs.technologies.alternative.maintenance_per_km = Decimal::new(-1, 2);
        assert!(scenario.check_complete().is_ok());
        assert_eq!(
            scenario.evaluate().unwrap_err(),
            ScenarioError::Econ(EconError::NegativeMoney("alternative maintenance"))
        );
    }

    #[test]
    fn oversized_answers_are_reported() {
        let data = fixtures::reference_data();
        let mut scenario = bus(&data, FuelType::BatteryElectric);
        scenario.inputs.vehicle_count = 2;
        scenario.inputs.daily_distance_km = Decimal::from_i128_with_scale(10i128.pow(26), 0);
        let err = scenario.evaluate().unwrap_err();
        assert!(
            matches!(
                err,
                ScenarioError::Econ(EconError::OutOfRange {
                    field: "daily distance",
                    ..
                })
            ),
            "{err:?}"
        );

        let mut scenario = bus(&data, FuelType::BatteryElectric);
        scenario.inputs.vehicle_count = 2;
        scenario.inputs.technologies.alternative.fuel_price = Decimal::MAX;
        scenario.inputs.technologies.alternative.efficiency = Decimal::new(2, 0);
        assert_eq!(
            scenario.evaluate().unwrap_err(),
            ScenarioError::Econ(EconError::NonFinite)
        );
    }
}
