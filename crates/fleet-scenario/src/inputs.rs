//! Numeric answers of a scenario and the infrastructure cost entry.

use crate::resolver::Resolver;
use crate::ScenarioError;
use fleet_core::{FuelType, InfrastructureKind, Paired, ProvinceEnergyProfile, VehicleSpec};
use fleet_econ::EconError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub fn default_discount_rate() -> Decimal {
    Decimal::new(3, 2)
}

/// Overridable figures for one technology.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechnologyInputs {
    /// In the fuel's efficiency unit.
    pub efficiency: Decimal,
    pub purchase_price: Decimal,
    /// $/km
    pub maintenance_per_km: Decimal,
    /// In the fuel's price unit.
    pub fuel_price: Decimal,
}

impl TechnologyInputs {
    pub fn from_tables(spec: &VehicleSpec, province: &ProvinceEnergyProfile) -> Self {
        Self {
            efficiency: spec.efficiency,
            purchase_price: spec.default_price,
            maintenance_per_km: spec.maintenance_per_km,
            fuel_price: province.price_for(spec.powertrain),
        }
    }
}

/// One charger model in a bottom-up estimate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChargerOrder {
    /// Charging table label, e.g. "DCFC 50 kW Single Port".
    pub label: String,
    /// Overrides the table price when set.
    #[serde(default)]
    pub unit_price: Option<Decimal>,
    pub quantity: u32,
}

/// How the alternative's site infrastructure is costed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "approach", rename_all = "snake_case")]
pub enum InfrastructureCost {
    #[default]
    Omitted,
    /// Total cost typed in directly.
    Direct {
        total: Decimal,
        #[serde(default)]
        subsidy: Decimal,
    },
    /// Chargers priced from the charging table plus site work. Battery
    /// electric only.
    BottomUp {
        chargers: Vec<ChargerOrder>,
        #[serde(default)]
        construction_and_grid: Decimal,
        #[serde(default)]
        subsidy: Decimal,
    },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfrastructureTotals {
    /// Charger hardware only; zero unless estimated bottom-up.
    pub stations: Decimal,
    pub total: Decimal,
    pub subsidy: Decimal,
}

impl InfrastructureCost {
    pub fn totals(
        &self,
        alternative: FuelType,
        resolver: &Resolver<'_>,
    ) -> Result<InfrastructureTotals, ScenarioError> {
        match self {
            InfrastructureCost::Omitted => Ok(InfrastructureTotals::default()),
            InfrastructureCost::Direct { total, subsidy } => Ok(InfrastructureTotals {
                stations: Decimal::ZERO,
                total: *total,
                subsidy: *subsidy,
            }),
            InfrastructureCost::BottomUp {
                chargers,
                construction_and_grid,
                subsidy,
            } => {
                if alternative.infrastructure() != Some(InfrastructureKind::Charging) {
                    return Err(ScenarioError::BottomUpRequiresCharging(alternative));
                }
                let mut stations = Decimal::ZERO;
                for order in chargers {
                    let listed = resolver.charging_option(&order.label)?;
                    let price = order.unit_price.unwrap_or(listed.price);
                    if price < Decimal::ZERO {
                        return Err(EconError::NegativeMoney("charger price").into());
                    }
                    stations = price
                        .checked_mul(Decimal::from(order.quantity))
                        .and_then(|cost| stations.checked_add(cost))
                        .ok_or(EconError::NonFinite)?;
                }
                let total = stations
                    .checked_add(*construction_and_grid)
                    .ok_or(EconError::NonFinite)?;
                Ok(InfrastructureTotals {
                    stations,
                    total,
                    subsidy: *subsidy,
                })
            }
        }
    }
}

/// Every numeric answer of a scenario, pre-filled from the reference tables.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScenarioInputs {
    pub technologies: Paired<TechnologyInputs>,
    pub vehicle_count: u32,
    pub daily_distance_km: Decimal,
    pub operating_days: u32,
    pub lifetime_years: u32,
    pub discount_rate: Decimal,
    /// Per alternative vehicle.
    pub vehicle_subsidy: Decimal,
    /// $/km per technology when insurance is included.
    pub insurance_per_km: Option<Paired<Decimal>>,
    /// Yearly percent per technology when resale is included.
    pub depreciation_pct: Option<Paired<Decimal>>,
    pub infrastructure: InfrastructureCost,
}

impl ScenarioInputs {
    /// Names of required answers that are still zero.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let t = &self.technologies;
        let checks: [(&'static str, bool); 10] = [
            ("number of vehicles", self.vehicle_count > 0),
            ("daily distance", self.daily_distance_km > Decimal::ZERO),
            ("days of operation", self.operating_days > 0),
            ("vehicle lifetime", self.lifetime_years > 0),
            ("existing fuel efficiency", t.base.efficiency > Decimal::ZERO),
            ("alternative fuel efficiency", t.alternative.efficiency > Decimal::ZERO),
            ("existing fuel price", t.base.fuel_price > Decimal::ZERO),
            ("alternative fuel price", t.alternative.fuel_price > Decimal::ZERO),
            ("existing vehicle price", t.base.purchase_price > Decimal::ZERO),
            ("alternative vehicle price", t.alternative.purchase_price > Decimal::ZERO),
        ];
        checks
            .into_iter()
            .filter(|(_, ok)| !ok)
            .map(|(name, _)| name)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    fn order(label: &str, unit_price: Option<i64>, quantity: u32) -> ChargerOrder {
        ChargerOrder {
            label: label.into(),
            unit_price: unit_price.map(|p| Decimal::new(p, 0)),
            quantity,
        }
    }

    #[test]
    fn bottom_up_sums_stations_and_site_work() {
        let data = fixtures::reference_data();
        let r = Resolver::new(&data);
        let infra = InfrastructureCost::BottomUp {
            chargers: vec![
                order("Level 2 19.2 kW Single Port", None, 4),
                order("DCFC 50 kW Single Port", Some(40_000), 2),
            ],
            construction_and_grid: Decimal::new(60_000, 0),
            subsidy: Decimal::new(25_000, 0),
        };
        let totals = infra.totals(FuelType::BatteryElectric, &r).unwrap();
        assert_eq!(totals.stations, Decimal::new(4 * 9_000 + 2 * 40_000, 0));
        assert_eq!(totals.total, Decimal::new(116_000 + 60_000, 0));
        assert_eq!(totals.subsidy, Decimal::new(25_000, 0));
    }

    #[test]
    fn bottom_up_is_for_chargers_only() {
        let data = fixtures::reference_data();
        let r = Resolver::new(&data);
        let infra = InfrastructureCost::BottomUp {
            chargers: vec![],
            construction_and_grid: Decimal::ZERO,
            subsidy: Decimal::ZERO,
        };
        assert_eq!(
            infra.totals(FuelType::HydrogenFuelCell, &r),
            Err(ScenarioError::BottomUpRequiresCharging(FuelType::HydrogenFuelCell))
        );
    }

    #[test]
    fn unknown_charger_is_rejected() {
        let data = fixtures::reference_data();
        let r = Resolver::new(&data);
        let infra = InfrastructureCost::BottomUp {
            chargers: vec![order("Level 5 Warp", None, 1)],
            construction_and_grid: Decimal::ZERO,
            subsidy: Decimal::ZERO,
        };
        assert!(matches!(
            infra.totals(FuelType::BatteryElectric, &r),
            Err(ScenarioError::Resolve(_))
        ));
    }

    #[test]
    fn direct_and_omitted_totals() {
        let data = fixtures::reference_data();
        let r = Resolver::new(&data);
        let direct = InfrastructureCost::Direct {
            total: Decimal::new(250_000, 0),
            subsidy: Decimal::new(50_000, 0),
        };
        let totals = direct.totals(FuelType::HydrogenFuelCell, &r).unwrap();
        assert_eq!(totals.total, Decimal::new(250_000, 0));
        assert_eq!(totals.stations, Decimal::ZERO);
        assert_eq!(
            InfrastructureCost::Omitted
                .totals(FuelType::BiodieselB20, &r)
                .unwrap(),
            InfrastructureTotals::default()
        );
    }

    #[test]
    fn infrastructure_entry_is_tagged() {
        let json = r#"{"approach":"direct","total":"120000"}"#;
        let infra: InfrastructureCost = serde_json::from_str(json).unwrap();
        assert_eq!(
            infra,
            InfrastructureCost::Direct {
                total: Decimal::new(120_000, 0),
                subsidy: Decimal::ZERO
            }
        );
    }
}
