pub mod driver;
pub mod logging;
pub mod worker_pool;

use std::sync::Arc;

use arc_swap::ArcSwap;
use candy_configuration::SystemConfigurations;
use candy_contracts::DispatchRequest;
use candy_contracts::DispatchResponse;
use candy_contracts::GatewayError;
use candy_contracts::couriers::CourierResponse;
use candy_contracts::couriers::CourierStatusResponse;
use candy_contracts::couriers::CouriersCreated;
use candy_contracts::orders::AssignResponse;
use candy_contracts::orders::CompleteResponse;
use candy_contracts::orders::OrdersCreated;
use candy_delivery_environment::ValidationError;
use candy_delivery_environment::courier_environment::CourierId;
use candy_delivery_environment::courier_environment::CourierPatch;
use candy_delivery_environment::error::positive;
use candy_delivery_environment::order::Order;
use candy_delivery_environment::order::OrderId;
use candy_dispatch_engine::Clock;
use candy_dispatch_engine::DispatchEngine;
use candy_dispatch_engine::DispatchError;
use candy_dispatch_engine::ErrorKind;
use candy_dispatch_engine::SystemClock;
use candy_store::Store;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::Level;
use tracing::event;
use tracing::instrument;

/// Everything a caller needs to turn a failed request into a reply: whether
/// it was the caller's fault, a message, and for rejected batches the ids of
/// the invalid items.
#[derive(Debug, Error, Clone, PartialEq, Serialize)]
#[error("{message}")]
pub struct DispatchFailure {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl From<DispatchError> for DispatchFailure {
    fn from(error: DispatchError) -> Self {
        Self {
            kind: error.kind(),
            message: error.to_string(),
            details: None,
        }
    }
}

impl From<GatewayError> for DispatchFailure {
    fn from(error: GatewayError) -> Self {
        Self {
            kind: ErrorKind::BusinessRule,
            message: error.to_string(),
            details: error.validation_error_body(),
        }
    }
}

impl From<ValidationError> for DispatchFailure {
    fn from(error: ValidationError) -> Self {
        GatewayError::from(error).into()
    }
}

pub struct Orchestrator<S, C = SystemClock> {
    pub system_configurations: Arc<ArcSwap<SystemConfigurations>>,
    engine: DispatchEngine<S, C>,
}

impl<S: Store> Orchestrator<S> {
    pub fn new(system_configurations: Arc<ArcSwap<SystemConfigurations>>, store: S) -> Self {
        Self::with_engine(system_configurations, DispatchEngine::new(store))
    }
}

impl<S: Store, C: Clock> Orchestrator<S, C> {
    pub fn with_engine(
        system_configurations: Arc<ArcSwap<SystemConfigurations>>,
        engine: DispatchEngine<S, C>,
    ) -> Self {
        Self {
            system_configurations,
            engine,
        }
    }

    pub fn engine(&self) -> &DispatchEngine<S, C> {
        &self.engine
    }

    #[instrument(level = "info", skip_all, fields(message_type = request.message_type()))]
    pub fn handle(&self, request: DispatchRequest) -> Result<DispatchResponse, DispatchFailure> {
        let result = self.dispatch(request);

        if let Err(failure) = &result {
            match failure.kind {
                ErrorKind::BusinessRule => {
                    event!(Level::WARN, reason = %failure.message, "request rejected")
                }
                ErrorKind::Infrastructure => {
                    event!(Level::ERROR, reason = %failure.message, "request failed")
                }
            }
        }
        result
    }

    fn dispatch(&self, request: DispatchRequest) -> Result<DispatchResponse, DispatchFailure> {
        match request {
            DispatchRequest::RegisterCouriers(request) => {
                let couriers = request.into_couriers()?;
                let courier_ids = self.engine.register_couriers(couriers)?;
                Ok(DispatchResponse::CouriersCreated(CouriersCreated::new(
                    courier_ids,
                )))
            }
            DispatchRequest::RegisterOrders(request) => {
                let orders = request.into_orders()?;
                let order_ids = self.engine.register_orders(orders)?;
                Ok(DispatchResponse::OrdersCreated(OrdersCreated::new(order_ids)))
            }
            DispatchRequest::UpdateCourier { courier_id, patch } => {
                let courier_id = CourierId(positive("courier_id", courier_id)?);
                let patch = CourierPatch::try_from(patch)?;
                let courier = self.engine.apply_courier_update(courier_id, &patch)?;
                Ok(DispatchResponse::CourierUpdated(CourierResponse::from(
                    &courier,
                )))
            }
            DispatchRequest::AssignOrders(request) => {
                let allocation = self.engine.assign_free_orders(request.courier_id()?)?;
                Ok(DispatchResponse::OrdersAssigned(AssignResponse::new(
                    allocation.orders.iter().map(Order::id),
                    allocation.assigned_at,
                )))
            }
            DispatchRequest::CompleteOrder(request) => {
                let (courier_id, order_id, completed_at) = request.validate()?;
                let completion = self
                    .engine
                    .complete_order_for(courier_id, order_id, completed_at)?;
                Ok(DispatchResponse::OrderCompleted(CompleteResponse {
                    order_id: completion.order_id.0,
                }))
            }
            DispatchRequest::CourierStatus { courier_id } => {
                let courier_id = CourierId(positive("courier_id", courier_id)?);
                let status = self.engine.courier_status(courier_id)?;
                Ok(DispatchResponse::CourierStatus(
                    status.as_ref().map(CourierStatusResponse::from),
                ))
            }
            DispatchRequest::OrderStatus { order_id } => {
                let order_id = OrderId(positive("order_id", order_id)?);
                let status = self.engine.order_status(order_id)?;
                Ok(DispatchResponse::OrderStatus(
                    status.as_ref().map(CourierStatusResponse::from),
                ))
            }
        }
    }
}
