use std::{collections::HashMap, fmt::Debug, time::Duration};

use cucumber::World;
use e2e::mock_accrual::MockAccrualServer;
use log::*;
use loyalty_engine::{
    accrual::{AccrualClient, AccrualClientConfig, HttpAccrualTransport},
    db_types::{Order, Withdrawal},
    order_objects::SubmitOrderResult,
    pipeline::{AccrualPipeline, Backpressure, OrderProcessor, OrderQueue, PipelineConfig},
    test_utils::prepare_env::{prepare_test_env_with_url, random_db_path},
    AccountApi,
    AccountApiError,
    LedgerManagement,
    LoyaltyDatabase,
    OrderFlowApi,
    OrderFlowError,
    OrderManagement,
    SqliteDatabase,
};

#[derive(World)]
#[world(init = Self::new)]
pub struct LoyaltyWorld {
    pub db_url: String,
    pub db: Option<SqliteDatabase>,
    pub accrual: Option<MockAccrualServer>,
    pub pipeline: Option<AccrualPipeline>,
    pub queue: Option<OrderQueue>,
    pub users: HashMap<String, i64>,
    pub last_submission: Option<Result<SubmitOrderResult, OrderFlowError>>,
    pub last_withdrawal: Option<Result<Withdrawal, AccountApiError>>,
}

impl Debug for LoyaltyWorld {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LoyaltyWorld ({}, users: {:?})", self.db_url, self.users)
    }
}

impl LoyaltyWorld {
    fn new() -> Self {
        Self {
            db_url: random_db_path(),
            db: None,
            accrual: None,
            pipeline: None,
            queue: None,
            users: HashMap::new(),
            last_submission: None,
            last_withdrawal: None,
        }
    }

    pub async fn start_database(&mut self) {
        let db = prepare_test_env_with_url(&self.db_url).await;
        debug!("🌍️ Created database: {}", self.db_url);
        self.db = Some(db);
    }

    pub fn database(&self) -> &SqliteDatabase {
        self.db.as_ref().expect("Database not started")
    }

    pub fn start_accrual_system(&mut self) {
        let server = MockAccrualServer::start().expect("Could not start the mock accrual system");
        self.accrual = Some(server);
    }

    pub fn accrual_system(&self) -> &MockAccrualServer {
        self.accrual.as_ref().expect("Accrual system not started")
    }

    pub fn start_pipeline(&mut self, workers: usize, queue_capacity: usize, backpressure: Backpressure) {
        let accrual = AccrualClientConfig::new(self.accrual_system().address())
            .with_retry_interval(Duration::from_millis(20))
            .with_max_retry_delay(Duration::from_millis(100))
            .with_request_timeout(Duration::from_secs(2));
        let transport = HttpAccrualTransport::new(accrual.clone()).expect("Could not create transport");
        let processor = OrderProcessor::new(self.database().clone(), AccrualClient::new(transport, &accrual));
        let config = PipelineConfig { workers, queue_capacity, backpressure, shutdown_timeout: Duration::from_secs(2) };
        let pipeline = AccrualPipeline::start(config, processor);
        self.queue = Some(pipeline.queue());
        self.pipeline = Some(pipeline);
    }

    pub fn order_flow_api(&self) -> OrderFlowApi<SqliteDatabase> {
        let queue = self.queue.clone().expect("Pipeline not started");
        OrderFlowApi::new(self.database().clone(), queue)
    }

    pub fn account_api(&self) -> AccountApi<SqliteDatabase> {
        AccountApi::new(self.database().clone())
    }

    pub async fn create_user(&mut self, login: &str) -> i64 {
        let user = self.database().create_user(login).await.expect("Could not create user");
        self.users.insert(login.to_string(), user.id);
        user.id
    }

    pub fn user_id(&self, login: &str) -> i64 {
        *self.users.get(login).unwrap_or_else(|| panic!("Unknown user {login}"))
    }

    pub async fn database_order(&self, number: &str) -> Option<Order> {
        self.database().fetch_order_by_number(number).await.expect("Error fetching order")
    }

    pub async fn order(&self, number: &str) -> Order {
        self.database_order(number).await.unwrap_or_else(|| panic!("Order {number} does not exist"))
    }

    /// Waits until nothing is queued or being processed.
    pub async fn wait_for_idle_pipeline(&self) {
        let queue = self.queue.as_ref().expect("Pipeline not started");
        for _ in 0..500 {
            if queue.in_flight() == 0 {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("The pipeline is still busy after 5 seconds");
    }

    pub async fn stop(&mut self) {
        self.queue = None;
        if let Some(pipeline) = self.pipeline.take() {
            info!("🌍️ Stopping pipeline: {:?}", pipeline.shutdown().await);
        }
        if let Some(server) = self.accrual.take() {
            server.stop().await;
        }
        if let Some(mut db) = self.db.take() {
            if let Err(e) = db.close().await {
                warn!("🌍️ Error closing database: {e}");
            }
        }
    }
}
