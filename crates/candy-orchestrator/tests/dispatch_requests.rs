use std::sync::Arc;

use arc_swap::ArcSwap;
use candy_configuration::SystemConfigurations;
use candy_contracts::DispatchRequest;
use candy_dispatch_engine::Clock;
use candy_dispatch_engine::DispatchEngine;
use candy_dispatch_engine::ErrorKind;
use candy_orchestrator::Orchestrator;
use candy_store::MemoryStore;
use chrono::DateTime;
use chrono::TimeZone;
use chrono::Utc;
use serde_json::Value;
use serde_json::json;

struct FixedClock(DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

fn orchestrator() -> Orchestrator<MemoryStore, FixedClock> {
    let system_configurations =
        SystemConfigurations::from_toml_str("[logging]\nlog_dir = \"./logs\"").unwrap();
    let clock = FixedClock(Utc.with_ymd_and_hms(2021, 1, 10, 9, 32, 14).unwrap());

    Orchestrator::with_engine(
        Arc::new(ArcSwap::from_pointee(system_configurations)),
        DispatchEngine::with_clock(MemoryStore::default(), clock),
    )
}

fn handle(orchestrator: &Orchestrator<MemoryStore, FixedClock>, request: Value) -> Value {
    let request: DispatchRequest = serde_json::from_value(request).unwrap();

    match orchestrator.handle(request) {
        Ok(response) => serde_json::to_value(response).unwrap(),
        Err(failure) => json!({ "failure": failure }),
    }
}

fn registered() -> Orchestrator<MemoryStore, FixedClock> {
    let orchestrator = orchestrator();

    let couriers = handle(
        &orchestrator,
        json!({
            "message_type": "RegisterCouriers",
            "data": [
                {
                    "courier_id": 1,
                    "courier_type": "foot",
                    "regions": [1, 12, 22],
                    "working_hours": ["11:35-14:05", "09:00-11:00"]
                },
                {
                    "courier_id": 2,
                    "courier_type": "bike",
                    "regions": [22],
                    "working_hours": ["09:00-18:00"]
                },
                {
                    "courier_id": 3,
                    "courier_type": "car",
                    "regions": [12, 22, 23, 33],
                    "working_hours": []
                }
            ]
        }),
    );
    assert_eq!(
        couriers,
        json!({
            "response_type": "CouriersCreated",
            "body": { "couriers": [{ "id": 1 }, { "id": 2 }, { "id": 3 }] }
        })
    );

    let orders = handle(
        &orchestrator,
        json!({
            "message_type": "RegisterOrders",
            "data": [
                { "order_id": 1, "weight": 0.23, "region": 12, "delivery_hours": ["09:00-18:00"] },
                { "order_id": 2, "weight": 15, "region": 1, "delivery_hours": ["09:00-18:00"] },
                {
                    "order_id": 3,
                    "weight": 0.01,
                    "region": 22,
                    "delivery_hours": ["09:00-12:00", "16:00-21:30"]
                }
            ]
        }),
    );
    assert_eq!(
        orders,
        json!({
            "response_type": "OrdersCreated",
            "body": { "orders": [{ "id": 1 }, { "id": 2 }, { "id": 3 }] }
        })
    );

    orchestrator
}

fn assign(orchestrator: &Orchestrator<MemoryStore, FixedClock>, courier_id: i64) -> Value {
    handle(
        orchestrator,
        json!({ "message_type": "AssignOrders", "courier_id": courier_id }),
    )
}

#[test]
fn test_assign_and_complete() {
    let orchestrator = registered();

    assert_eq!(
        assign(&orchestrator, 1),
        json!({
            "response_type": "OrdersAssigned",
            "body": {
                "orders": [{ "id": 1 }, { "id": 3 }],
                "assign_time": "2021-01-10T09:32:14.000000Z"
            }
        })
    );
    assert_eq!(
        assign(&orchestrator, 2),
        json!({ "response_type": "OrdersAssigned", "body": { "orders": [] } })
    );

    let complete = json!({
        "message_type": "CompleteOrder",
        "courier_id": 1,
        "order_id": 3,
        "complete_time": "2021-01-10T10:33:01.42Z"
    });
    let completed = json!({ "response_type": "OrderCompleted", "body": { "order_id": 3 } });

    assert_eq!(handle(&orchestrator, complete.clone()), completed);
    assert_eq!(handle(&orchestrator, complete), completed);

    let status = handle(
        &orchestrator,
        json!({ "message_type": "CourierStatus", "courier_id": 1 }),
    );
    assert_eq!(status["response_type"], "CourierStatus");
    assert_eq!(status["body"]["courier_id"], 1);
    assert_eq!(status["body"]["orders"][0]["order_id"], 1);
    assert_eq!(status["body"]["orders"][0]["weight"], json!(0.23));
    assert!(status["body"]["orders"][0]["weight"].is_number());
    assert!(status["body"]["orders"][0].get("complete_time").is_none());
    assert_eq!(
        status["body"]["orders"][1]["complete_time"],
        "2021-01-10T10:33:01.420000Z"
    );
}

#[test]
fn test_courier_update_releases_orders_to_other_couriers() {
    let orchestrator = registered();
    assign(&orchestrator, 1);

    let updated = handle(
        &orchestrator,
        json!({
            "message_type": "UpdateCourier",
            "courier_id": 1,
            "patch": { "regions": [12] }
        }),
    );
    assert_eq!(updated["response_type"], "CourierUpdated");
    assert_eq!(updated["body"]["regions"], json!([12]));
    assert_eq!(updated["body"]["courier_type"], "foot");

    assert_eq!(
        assign(&orchestrator, 2)["body"]["orders"],
        json!([{ "id": 3 }])
    );

    let order_status = handle(
        &orchestrator,
        json!({ "message_type": "OrderStatus", "order_id": 3 }),
    );
    assert_eq!(order_status["body"]["courier_id"], 2);
    assert_eq!(order_status["body"]["orders"].as_array().unwrap().len(), 1);
}

#[test]
fn test_invalid_batches_list_every_rejected_item() {
    let orchestrator = orchestrator();

    let response = handle(
        &orchestrator,
        json!({
            "message_type": "RegisterCouriers",
            "data": [
                { "courier_id": 1, "courier_type": "foot", "regions": [1], "working_hours": [] },
                { "courier_id": 2, "courier_type": "boat", "regions": [1], "working_hours": [] },
                { "courier_id": 3, "courier_type": "car", "regions": [1], "working_hours": ["25:00-26:00"] }
            ]
        }),
    );

    assert_eq!(response["failure"]["kind"], "business_rule");
    assert_eq!(
        response["failure"]["details"],
        json!({ "validation_error": { "couriers": [{ "id": 2 }, { "id": 3 }] } })
    );

    let nothing_stored = handle(
        &orchestrator,
        json!({ "message_type": "CourierStatus", "courier_id": 1 }),
    );
    assert_eq!(
        nothing_stored,
        json!({ "response_type": "CourierStatus", "body": null })
    );
}

#[test]
fn test_business_rule_failures() {
    let orchestrator = registered();
    assign(&orchestrator, 1);

    let wrong_courier = handle(
        &orchestrator,
        json!({
            "message_type": "CompleteOrder",
            "courier_id": 2,
            "order_id": 1,
            "complete_time": "2021-01-10T10:33:01Z"
        }),
    );
    assert_eq!(wrong_courier["failure"]["kind"], "business_rule");
    assert!(wrong_courier["failure"].get("details").is_none());

    let before_assignment = handle(
        &orchestrator,
        json!({
            "message_type": "CompleteOrder",
            "courier_id": 1,
            "order_id": 1,
            "complete_time": "2021-01-10T09:00:00Z"
        }),
    );
    assert_eq!(before_assignment["failure"]["kind"], "business_rule");

    let empty_patch = handle(
        &orchestrator,
        json!({ "message_type": "UpdateCourier", "courier_id": 1, "patch": {} }),
    );
    assert_eq!(empty_patch["failure"]["kind"], "business_rule");

    let unknown_courier = assign(&orchestrator, 44);
    assert_eq!(unknown_courier["failure"]["kind"], "business_rule");

    let negative_id = assign(&orchestrator, -1);
    assert_eq!(negative_id["failure"]["kind"], "business_rule");
}

#[test]
fn test_store_failures_are_infrastructure() {
    let orchestrator = registered();
    orchestrator.engine().store().fail_next_commit();

    let response = assign(&orchestrator, 1);
    assert_eq!(response["failure"]["kind"], "infrastructure");

    assert_eq!(
        assign(&orchestrator, 1)["body"]["orders"],
        json!([{ "id": 1 }, { "id": 3 }])
    );
}

#[test]
fn test_failures_convert_from_engine_errors() {
    let orchestrator = orchestrator();

    let failure = orchestrator
        .handle(DispatchRequest::AssignOrders(
            candy_contracts::orders::AssignRequest { courier_id: 7 },
        ))
        .unwrap_err();

    assert_eq!(failure.kind, ErrorKind::BusinessRule);
    assert_eq!(failure.message, "courier 7 does not exist");
}
