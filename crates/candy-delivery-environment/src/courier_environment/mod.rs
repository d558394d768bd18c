pub mod courier_type;

use std::collections::BTreeSet;
use std::fmt;

use rust_decimal::Decimal;
use serde::Deserialize;
use serde::Serialize;

use self::courier_type::CourierType;
use crate::time_environment::TimeSpan;

#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CourierId(pub u64);

#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionId(pub u64);

impl fmt::Display for CourierId
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for RegionId
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "{}", self.0)
    }
}

/// The replaceable part of a courier. Capacity and speed coefficient are
/// looked up from the courier type and never stored.
#[derive(PartialEq, Eq, Debug, Clone, Serialize, Deserialize)]
pub struct CourierProfile
{
    pub courier_type: CourierType,
    pub regions: BTreeSet<RegionId>,
    pub working_hours: Vec<TimeSpan>,
}

impl CourierProfile
{
    pub fn capacity_kg(&self) -> Decimal
    {
        self.courier_type.capacity_kg()
    }

    pub fn speed_coefficient(&self) -> u32
    {
        self.courier_type.speed_coefficient()
    }

    /// Fields missing from the patch keep their current value.
    pub fn apply(&self, patch: &CourierPatch) -> CourierProfile
    {
        CourierProfile {
            courier_type: patch.courier_type.unwrap_or(self.courier_type),
            regions: patch
                .regions
                .clone()
                .unwrap_or_else(|| self.regions.clone()),
            working_hours: patch
                .working_hours
                .clone()
                .unwrap_or_else(|| self.working_hours.clone()),
        }
    }
}

#[derive(PartialEq, Eq, Debug, Clone, Serialize, Deserialize)]
pub struct Courier
{
    pub id: CourierId,
    #[serde(flatten)]
    pub profile: CourierProfile,
}

impl Courier
{
    pub fn new(
        id: CourierId,
        courier_type: CourierType,
        regions: impl IntoIterator<Item = RegionId>,
        working_hours: Vec<TimeSpan>,
    ) -> Self
    {
        Self {
            id,
            profile: CourierProfile {
                courier_type,
                regions: regions.into_iter().collect(),
                working_hours,
            },
        }
    }

    pub fn capacity_kg(&self) -> Decimal
    {
        self.profile.capacity_kg()
    }
}

/// Closed whitelist of the courier fields that may change after
/// registration. The id is not one of them.
#[derive(PartialEq, Eq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct CourierPatch
{
    pub courier_type: Option<CourierType>,
    pub regions: Option<BTreeSet<RegionId>>,
    pub working_hours: Option<Vec<TimeSpan>>,
}

impl CourierPatch
{
    pub fn is_empty(&self) -> bool
    {
        self.courier_type.is_none() && self.regions.is_none() && self.working_hours.is_none()
    }
}
