use futures_util::future::join_all;
use loyalty_engine::{
    db_types::{NewOrder, NewWithdrawal, OrderStatusType, Points, TerminalStatus},
    test_utils::prepare_env::prepare_test_env,
    LedgerManagement,
    LoyaltyDatabase,
    OrderManagement,
    SettlementResult,
};

const ORDERS: [&str; 6] =
    ["12345678903", "79927398713", "4561261212345467", "4532015112830366", "6011514433546201", "371449635398431"];

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_settlements_credit_every_order() {
    let mut db = prepare_test_env().await;
    let user = db.create_user("alice").await.unwrap();
    let mut ids = Vec::new();
    for number in ORDERS {
        ids.push(db.insert_order(NewOrder::new(number, user.id)).await.unwrap().id);
    }
    let settlements = ids.iter().map(|id| {
        let db = db.clone();
        let id = *id;
        tokio::spawn(async move { db.settle_order(id, TerminalStatus::Processed(Points::from(1025))).await })
    });
    let results = join_all(settlements).await;
    for r in results {
        let r = r.unwrap().unwrap();
        assert!(matches!(r, SettlementResult::Settled { .. }), "Got {r:?}");
    }
    let user = db.fetch_user(user.id).await.unwrap().unwrap();
    assert_eq!(user.current_balance, Points::from(6150));
    let orders = db.fetch_orders_for_user(user.id).await.unwrap();
    assert!(orders.iter().all(|o| o.status == OrderStatusType::Processed));
    db.close().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_settlements_of_one_order_credit_once() {
    let mut db = prepare_test_env().await;
    let user = db.create_user("alice").await.unwrap();
    let order = db.insert_order(NewOrder::new("12345678903", user.id)).await.unwrap();
    let id = order.id;
    let settlements = (0..8).map(|_| {
        let db = db.clone();
        tokio::spawn(async move { db.settle_order(id, TerminalStatus::Processed(Points::from_points(500))).await })
    });
    let results = join_all(settlements).await.into_iter().map(|r| r.unwrap().unwrap()).collect::<Vec<_>>();
    let settled = results.iter().filter(|r| !r.is_already_settled()).count();
    assert_eq!(settled, 1);
    let user = db.fetch_user(user.id).await.unwrap().unwrap();
    assert_eq!(user.current_balance, Points::from_points(500));
    db.close().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn withdrawals_race_with_settlements() {
    let mut db = prepare_test_env().await;
    let user = db.create_user("alice").await.unwrap();
    let first = db.insert_order(NewOrder::new("12345678903", user.id)).await.unwrap();
    db.settle_order(first.id, TerminalStatus::Processed(Points::from_points(100))).await.unwrap();
    let second = db.insert_order(NewOrder::new("79927398713", user.id)).await.unwrap().id;
    let user_id = user.id;

    let settle = {
        let db = db.clone();
        tokio::spawn(async move { db.settle_order(second, TerminalStatus::Processed(Points::from_points(50))).await })
    };
    let withdrawals = ["2377225624", "346436439", "9278923470"].map(|number| {
        let db = db.clone();
        let w = NewWithdrawal::new(user_id, number, Points::from_points(40));
        tokio::spawn(async move { db.withdraw(w).await })
    });
    settle.await.unwrap().unwrap();
    let succeeded = join_all(withdrawals).await.into_iter().filter(|r| matches!(r, Ok(Ok(_)))).count();
    // 150 points in total. At most three 40 point withdrawals fit, and the balance never goes negative.
    let user = db.fetch_user(user.id).await.unwrap().unwrap();
    assert!(user.current_balance >= Points::default());
    assert_eq!(user.withdrawn, Points::from_points(40 * succeeded as i64));
    assert_eq!(user.current_balance + user.withdrawn, Points::from_points(150));
    db.close().await.unwrap();
}
