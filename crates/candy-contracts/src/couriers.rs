use std::collections::BTreeSet;

use candy_delivery_environment::ValidationError;
use candy_delivery_environment::assignment::CourierStatus;
use candy_delivery_environment::courier_environment::Courier;
use candy_delivery_environment::courier_environment::CourierId;
use candy_delivery_environment::courier_environment::CourierPatch;
use candy_delivery_environment::courier_environment::RegionId;
use candy_delivery_environment::courier_environment::courier_type::CourierType;
use candy_delivery_environment::error::positive;
use candy_delivery_environment::time_environment::TimeSpan;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::GatewayError;
use crate::convert_batch;
use crate::orders::OrderStatusItem;

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CourierItem {
    pub courier_id: i64,
    pub courier_type: String,
    pub regions: Vec<i64>,
    pub working_hours: Vec<String>,
}

impl TryFrom<CourierItem> for Courier {
    type Error = ValidationError;

    fn try_from(item: CourierItem) -> Result<Self, Self::Error> {
        Ok(Courier::new(
            CourierId(positive("courier_id", item.courier_id)?),
            item.courier_type.try_into()?,
            regions(item.regions)?,
            time_spans(item.working_hours)?,
        ))
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct CouriersPostRequest {
    pub data: Vec<Value>,
}

impl CouriersPostRequest {
    /// Rejects the whole batch if any item is invalid.
    pub fn into_couriers(self) -> Result<Vec<Courier>, GatewayError> {
        convert_batch::<CourierItem, Courier>(self.data, "courier_id")
            .map_err(GatewayError::InvalidCouriers)
    }
}

/// Only these three fields of a courier can be changed; anything else in the
/// body is refused.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct CourierPatchRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub courier_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regions: Option<Vec<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_hours: Option<Vec<String>>,
}

impl TryFrom<CourierPatchRequest> for CourierPatch {
    type Error = ValidationError;

    fn try_from(request: CourierPatchRequest) -> Result<Self, Self::Error> {
        let patch = CourierPatch {
            courier_type: request
                .courier_type
                .map(CourierType::try_from)
                .transpose()?,
            regions: request.regions.map(regions).transpose()?,
            working_hours: request.working_hours.map(time_spans).transpose()?,
        };

        if patch.is_empty() {
            return Err(ValidationError::EmptyPatch);
        }
        Ok(patch)
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdItem {
    pub id: u64,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct CouriersCreated {
    pub couriers: Vec<IdItem>,
}

impl CouriersCreated {
    pub fn new(courier_ids: impl IntoIterator<Item = CourierId>) -> Self {
        Self {
            couriers: courier_ids
                .into_iter()
                .map(|courier_id| IdItem { id: courier_id.0 })
                .collect(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct CourierResponse {
    pub courier_id: u64,
    pub courier_type: String,
    pub regions: Vec<u64>,
    pub working_hours: Vec<String>,
}

impl From<&Courier> for CourierResponse {
    fn from(courier: &Courier) -> Self {
        Self {
            courier_id: courier.id.0,
            courier_type: courier.profile.courier_type.to_string(),
            regions: courier.profile.regions.iter().map(|region| region.0).collect(),
            working_hours: courier
                .profile
                .working_hours
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct CourierStatusResponse {
    #[serde(flatten)]
    pub courier: CourierResponse,
    pub orders: Vec<OrderStatusItem>,
}

impl From<&CourierStatus> for CourierStatusResponse {
    fn from(status: &CourierStatus) -> Self {
        Self {
            courier: CourierResponse::from(&status.courier),
            orders: status
                .assignments
                .iter()
                .map(|(order, assignment)| OrderStatusItem::new(order, assignment))
                .collect(),
        }
    }
}

pub(crate) fn regions(regions: Vec<i64>) -> Result<BTreeSet<RegionId>, ValidationError> {
    regions
        .into_iter()
        .map(|region| positive("region", region).map(RegionId))
        .collect()
}

pub(crate) fn time_spans(spans: Vec<String>) -> Result<Vec<TimeSpan>, ValidationError> {
    spans.iter().map(|span| span.parse()).collect()
}
