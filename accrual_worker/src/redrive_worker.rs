use log::*;
use loyalty_engine::{OrderFlowApi, OrderFlowError, OrderManagement};
use tokio::task::JoinHandle;

use crate::config::RedriveConfig;

/// Starts the re-drive worker. Do not await the returned JoinHandle, as it will run indefinitely.
///
/// The first pass runs immediately and picks up every unresolved order, which recovers the orders that were in the
/// pipeline when the worker last stopped. Later passes only pick up orders that have been idle for
/// `config.stale_after`.
pub fn start_redrive_worker<B>(api: OrderFlowApi<B>, config: RedriveConfig) -> JoinHandle<()>
where B: OrderManagement + 'static {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(config.interval);
        let mut stale_after = None;
        info!("🕰️ Re-drive worker started");
        loop {
            timer.tick().await;
            debug!("🕰️ Running re-drive job");
            match api.redrive_unresolved(stale_after).await {
                Ok(result) => {
                    if result.candidates > 0 {
                        info!(
                            "🕰️ {} unresolved orders found. {} re-queued, {} already in flight, {} deferred",
                            result.candidates, result.enqueued, result.in_flight, result.deferred
                        );
                    }
                },
                Err(OrderFlowError::PipelineClosed) => {
                    info!("🕰️ The pipeline has closed. Re-drive worker stopping.");
                    break;
                },
                Err(e) => {
                    error!("🕰️ Error running re-drive job: {e}");
                },
            }
            stale_after = Some(config.stale_after);
        }
    })
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use loyalty_engine::{
        accrual::{AccrualClient, AccrualClientConfig},
        db_types::{NewOrder, OrderStatusType},
        pipeline::{AccrualPipeline, OrderProcessor, PipelineConfig, ShutdownOutcome},
        test_utils::{
            prepare_env::prepare_test_env,
            scripted_transport::{self as scripted, ScriptedTransport},
        },
        LedgerManagement,
        OrderManagement,
    };
    use lp_common::Points;

    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn orders_left_behind_are_picked_up_on_start() {
        let db = prepare_test_env().await;
        let alice = db.create_user("alice").await.unwrap();
        // Stored by the intake, but never queued (e.g. the previous run was stopped)
        let o1 = db.insert_order(NewOrder::new("12345678903", alice.id)).await.unwrap();
        let o2 = db.insert_order(NewOrder::new("79927398713", alice.id)).await.unwrap();
        db.mark_order_processing(o2.id).await.unwrap();

        let transport = ScriptedTransport::default();
        transport.script("12345678903", [scripted::processed("12345678903", 100.5)]);
        transport.script("79927398713", [scripted::invalid("79927398713")]);
        let accrual = AccrualClientConfig::new("http://accrual.test").with_retry_interval(Duration::from_millis(1));
        let processor = OrderProcessor::new(db.clone(), AccrualClient::new(transport, &accrual));
        let pipeline = AccrualPipeline::start(PipelineConfig::default(), processor);
        let api = OrderFlowApi::new(db.clone(), pipeline.queue());
        let redrive = RedriveConfig { interval: Duration::from_secs(3600), stale_after: Duration::from_secs(3600) };
        let handle = start_redrive_worker(api, redrive);

        let mut settled = false;
        for _ in 0..200 {
            let orders = db.fetch_orders_for_user(alice.id).await.unwrap();
            if orders.iter().all(|o| o.is_terminal()) {
                settled = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(settled, "Re-drive did not pick up the unresolved orders");
        handle.abort();
        assert_eq!(pipeline.shutdown().await, ShutdownOutcome::Drained);
        assert_eq!(db.fetch_order_by_id(o1.id).await.unwrap().unwrap().status, OrderStatusType::Processed);
        assert_eq!(db.fetch_order_by_id(o2.id).await.unwrap().unwrap().status, OrderStatusType::Invalid);
        assert_eq!(db.fetch_user(alice.id).await.unwrap().unwrap().current_balance, Points::from(10050));
    }
}
