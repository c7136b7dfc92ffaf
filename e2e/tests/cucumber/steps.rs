use cucumber::{given, then, when};
use e2e::mock_accrual::MockReply;
use log::*;
use loyalty_engine::{
    db_types::{OrderStatusType, Points},
    order_objects::SubmitOrderResult,
    pipeline::Backpressure,
    AccountApiError,
    OrderFlowError,
};

use crate::cucumber::LoyaltyWorld;

fn points(value: f64) -> Points {
    Points::try_from(value).expect("Not a valid points amount")
}

//--------------------------------------    Setup    -----------------------------------------------------------------

#[given("a fresh loyalty database")]
async fn fresh_database(world: &mut LoyaltyWorld) {
    world.start_database().await;
}

#[given("the accrual system is running")]
fn accrual_system_running(world: &mut LoyaltyWorld) {
    world.start_accrual_system();
}

// Given the pipeline is running with 2 workers and a queue of 10
#[given(expr = "the pipeline is running with {int} workers and a queue of {int}")]
fn pipeline_running(world: &mut LoyaltyWorld, workers: usize, capacity: usize) {
    world.start_pipeline(workers, capacity, Backpressure::Block);
}

#[given(expr = "the pipeline is running with {int} workers and a fail-fast queue of {int}")]
fn pipeline_running_fail_fast(world: &mut LoyaltyWorld, workers: usize, capacity: usize) {
    world.start_pipeline(workers, capacity, Backpressure::FailFast);
}

#[given(expr = "user {word} exists")]
async fn user_exists(world: &mut LoyaltyWorld, login: String) {
    let id = world.create_user(&login).await;
    debug!("🌍️ Created user {login} with id {id}");
}

//--------------------------------------  Accrual scripts  -----------------------------------------------------------

// Given the accrual system reports order "12345678903" as PROCESSED with 500 points
#[given(expr = "the accrual system reports order {string} as PROCESSED with {float} points")]
fn script_processed(world: &mut LoyaltyWorld, number: String, accrual: f64) {
    world.accrual_system().script(&number, [MockReply::processed(accrual)]);
}

#[given(expr = "the accrual system reports order {string} as {word}")]
fn script_status(world: &mut LoyaltyWorld, number: String, status: String) {
    world.accrual_system().script(&number, [MockReply::status(&status)]);
}

#[given(expr = "the accrual system rate limits order {string} with a retry delay of {int} seconds")]
fn script_rate_limit(world: &mut LoyaltyWorld, number: String, retry_after: u64) {
    world.accrual_system().script(&number, [MockReply::TooManyRequests { retry_after: Some(retry_after) }]);
}

#[given(expr = "the accrual system does not know order {string}")]
fn script_unknown(world: &mut LoyaltyWorld, number: String) {
    world.accrual_system().script(&number, [MockReply::NoContent]);
}

#[given(expr = "the accrual system fails for order {string}")]
fn script_failure(world: &mut LoyaltyWorld, number: String) {
    world.accrual_system().script(&number, [MockReply::ServerError]);
}

//--------------------------------------      Orders     -------------------------------------------------------------

#[when(expr = "{word} submits order {string}")]
async fn submit_order(world: &mut LoyaltyWorld, login: String, number: String) {
    let user_id = world.user_id(&login);
    let result = world.order_flow_api().submit_order(&number, user_id).await;
    debug!("🌍️ {login} submitted order {number}: {result:?}");
    world.last_submission = Some(result);
}

#[when("the pipeline has finished")]
async fn pipeline_finished(world: &mut LoyaltyWorld) {
    world.wait_for_idle_pipeline().await;
}

#[then("the order is accepted")]
fn order_accepted(world: &mut LoyaltyWorld) {
    match world.last_submission.take().expect("No order was submitted") {
        Ok(SubmitOrderResult::Accepted(order)) => assert_eq!(order.status, OrderStatusType::New),
        other => panic!("Expected the order to be accepted, got {other:?}"),
    }
}

#[then("the order was already submitted by the same user")]
fn order_already_submitted(world: &mut LoyaltyWorld) {
    let result = world.last_submission.take().expect("No order was submitted");
    assert!(
        matches!(result, Ok(SubmitOrderResult::AlreadySubmittedBySameUser(_))),
        "Expected a repeat submission, got {result:?}"
    );
}

#[then("the order is rejected because another user submitted it")]
fn order_conflict(world: &mut LoyaltyWorld) {
    let result = world.last_submission.take().expect("No order was submitted");
    assert!(
        matches!(result, Err(OrderFlowError::AlreadySubmittedByOtherUser(_))),
        "Expected a conflict, got {result:?}"
    );
}

#[then("the order is rejected as an invalid order number")]
fn order_invalid(world: &mut LoyaltyWorld) {
    let result = world.last_submission.take().expect("No order was submitted");
    assert!(matches!(result, Err(OrderFlowError::InvalidFormat(_))), "Expected a format error, got {result:?}");
}

#[then(expr = "order {string} does not exist")]
async fn order_does_not_exist(world: &mut LoyaltyWorld, number: String) {
    let order = world.database_order(&number).await;
    assert!(order.is_none(), "Expected order {number} not to exist, got {order:?}");
}

#[then(expr = "order {string} belongs to {word}")]
async fn order_belongs_to(world: &mut LoyaltyWorld, number: String, login: String) {
    let order = world.order(&number).await;
    assert_eq!(order.user_id, world.user_id(&login));
}

#[then(expr = "order {string} has status {word}")]
async fn order_has_status(world: &mut LoyaltyWorld, number: String, status: String) {
    let expected = status.parse::<OrderStatusType>().expect("Unknown status");
    let order = world.order(&number).await;
    assert_eq!(order.status, expected, "Order {number} has status {}", order.status);
}

#[then(expr = "order {string} has an accrual of {float} points")]
async fn order_has_accrual(world: &mut LoyaltyWorld, number: String, accrual: f64) {
    let order = world.order(&number).await;
    assert_eq!(order.accrual, Some(points(accrual)));
}

#[then(expr = "order {string} has no accrual")]
async fn order_has_no_accrual(world: &mut LoyaltyWorld, number: String) {
    let order = world.order(&number).await;
    assert_eq!(order.accrual, None);
}

#[then(expr = "the accrual system was asked about order {string} {int} times")]
fn accrual_calls(world: &mut LoyaltyWorld, number: String, calls: usize) {
    assert_eq!(world.accrual_system().calls(&number), calls);
}

//--------------------------------------     Balances    -------------------------------------------------------------

#[then(expr = "{word} has a balance of {float} points with {float} withdrawn")]
async fn user_balance(world: &mut LoyaltyWorld, login: String, current: f64, withdrawn: f64) {
    let balance = world.account_api().balance(world.user_id(&login)).await.expect("Could not fetch balance");
    assert_eq!(balance.current, points(current), "{login} has {} points", balance.current);
    assert_eq!(balance.withdrawn, points(withdrawn), "{login} has withdrawn {} points", balance.withdrawn);
}

#[when(expr = "{word} withdraws {float} points against order {string}")]
async fn withdraw(world: &mut LoyaltyWorld, login: String, amount: f64, number: String) {
    let user_id = world.user_id(&login);
    let result = world.account_api().withdraw(user_id, &number, points(amount)).await;
    debug!("🌍️ {login} withdrew {amount} against {number}: {result:?}");
    world.last_withdrawal = Some(result);
}

#[then("the withdrawal succeeds")]
fn withdrawal_succeeds(world: &mut LoyaltyWorld) {
    let result = world.last_withdrawal.take().expect("No withdrawal was made");
    assert!(result.is_ok(), "Expected the withdrawal to succeed, got {result:?}");
}

#[then("the withdrawal is rejected for insufficient funds")]
fn withdrawal_insufficient(world: &mut LoyaltyWorld) {
    let result = world.last_withdrawal.take().expect("No withdrawal was made");
    assert!(matches!(result, Err(AccountApiError::InsufficientFunds { .. })), "Got {result:?}");
}

#[then("the withdrawal is rejected because the order number has been used")]
fn withdrawal_duplicate(world: &mut LoyaltyWorld) {
    let result = world.last_withdrawal.take().expect("No withdrawal was made");
    assert!(matches!(result, Err(AccountApiError::WithdrawalAlreadyExists(_))), "Got {result:?}");
}

#[then("the withdrawal is rejected as an invalid order number")]
fn withdrawal_invalid(world: &mut LoyaltyWorld) {
    let result = world.last_withdrawal.take().expect("No withdrawal was made");
    assert!(matches!(result, Err(AccountApiError::InvalidFormat(_))), "Got {result:?}");
}

#[then(expr = "{word} has made {int} withdrawal(s)")]
async fn withdrawal_count(world: &mut LoyaltyWorld, login: String, count: usize) {
    let withdrawals = world.account_api().withdrawals(world.user_id(&login)).await.expect("Could not fetch withdrawals");
    assert_eq!(withdrawals.len(), count);
}
