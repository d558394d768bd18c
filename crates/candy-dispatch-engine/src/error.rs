use candy_delivery_environment::ValidationError;
use candy_delivery_environment::assignment::OrderState;
use candy_delivery_environment::assignment::TransitionError;
use candy_delivery_environment::courier_environment::CourierId;
use candy_delivery_environment::order::OrderId;
use candy_store::StoreError;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DispatchError
{
    #[error("courier {0} does not exist")]
    CourierNotFound(CourierId),
    #[error("order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("order {0} is not assigned to any courier")]
    OrderNotAssigned(OrderId),
    #[error("order {order_id} is held by courier {holder}, not by courier {requested}")]
    OrderHeldByAnotherCourier {
        order_id: OrderId,
        holder: CourierId,
        requested: CourierId,
    },
    #[error("order {order_id}: {source}")]
    InvalidTransition {
        order_id: OrderId,
        source: TransitionError,
    },
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Whether a failure is the caller's fault or the system's.
#[derive(PartialEq, Eq, Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind
{
    BusinessRule,
    Infrastructure,
}

impl DispatchError
{
    pub fn kind(&self) -> ErrorKind
    {
        match self {
            DispatchError::Store(_) => ErrorKind::Infrastructure,
            _ => ErrorKind::BusinessRule,
        }
    }

    pub(crate) fn from_transition(order_id: OrderId, error: TransitionError) -> Self
    {
        match error.from {
            OrderState::Free => DispatchError::OrderNotAssigned(order_id),
            _ => DispatchError::InvalidTransition {
                order_id,
                source: error,
            },
        }
    }
}
