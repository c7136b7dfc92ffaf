use std::{
    collections::{HashMap, VecDeque},
    io,
    sync::Mutex,
};

use actix_web::{
    dev::ServerHandle,
    http::StatusCode,
    web,
    App,
    HttpResponse,
    HttpServer,
};
use log::*;
use serde_json::json;

/// A canned answer from the mock accrual system.
#[derive(Debug, Clone, PartialEq)]
pub enum MockReply {
    /// `200 OK` with a JSON body
    Status { status: String, accrual: Option<f64> },
    NoContent,
    TooManyRequests { retry_after: Option<u64> },
    ServerError,
    Code(u16),
    /// `200 OK` with a body that is not valid JSON
    Garbage,
}

impl MockReply {
    pub fn processed(accrual: f64) -> Self {
        Self::Status { status: "PROCESSED".into(), accrual: Some(accrual) }
    }

    pub fn status(status: &str) -> Self {
        Self::Status { status: status.to_uppercase(), accrual: None }
    }

    fn respond(&self, number: &str) -> HttpResponse {
        match self {
            MockReply::Status { status, accrual: Some(a) } => {
                HttpResponse::Ok().json(json!({ "order": number, "status": status, "accrual": a }))
            },
            MockReply::Status { status, accrual: None } => {
                HttpResponse::Ok().json(json!({ "order": number, "status": status }))
            },
            MockReply::NoContent => HttpResponse::NoContent().finish(),
            MockReply::TooManyRequests { retry_after: Some(secs) } => {
                HttpResponse::TooManyRequests().insert_header(("Retry-After", secs.to_string())).finish()
            },
            MockReply::TooManyRequests { retry_after: None } => HttpResponse::TooManyRequests().finish(),
            MockReply::ServerError => HttpResponse::InternalServerError().finish(),
            MockReply::Code(code) => {
                HttpResponse::build(StatusCode::from_u16(*code).unwrap_or(StatusCode::IM_A_TEAPOT)).finish()
            },
            MockReply::Garbage => HttpResponse::Ok().content_type("application/json").body("{not json"),
        }
    }
}

#[derive(Default)]
struct MockState {
    scripts: Mutex<HashMap<String, VecDeque<MockReply>>>,
    calls: Mutex<HashMap<String, usize>>,
}

async fn order_status(path: web::Path<String>, state: web::Data<MockState>) -> HttpResponse {
    let number = path.into_inner();
    *state.calls.lock().expect("lock poisoned").entry(number.clone()).or_default() += 1;
    let reply = state.scripts.lock().expect("lock poisoned").get_mut(&number).and_then(|q| q.pop_front());
    let reply = reply.unwrap_or(MockReply::NoContent);
    trace!("🤖️ Mock accrual system answering {reply:?} for order {number}");
    reply.respond(&number)
}

/// An HTTP server that answers `GET /api/orders/{number}` from per-order scripts. Orders without a script, or whose
/// script has run out, get `204 No Content`.
pub struct MockAccrualServer {
    address: String,
    state: web::Data<MockState>,
    handle: ServerHandle,
}

impl MockAccrualServer {
    /// Starts the server on a random local port. Must be called from within a Tokio runtime.
    pub fn start() -> io::Result<Self> {
        let state = web::Data::new(MockState::default());
        let app_state = state.clone();
        let server = HttpServer::new(move || {
            App::new().app_data(app_state.clone()).route("/api/orders/{number}", web::get().to(order_status))
        })
        .workers(1)
        .bind(("127.0.0.1", 0))?;
        let address = server
            .addrs()
            .first()
            .map(|a| format!("http://{a}"))
            .ok_or_else(|| io::Error::new(io::ErrorKind::AddrNotAvailable, "Mock server has no address"))?;
        let server = server.run();
        let handle = server.handle();
        tokio::spawn(async move {
            if let Err(e) = server.await {
                warn!("🤖️ Mock accrual server error: {e}");
            }
        });
        info!("🤖️ Mock accrual system listening on {address}");
        Ok(Self { address, state, handle })
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn script<I: IntoIterator<Item = MockReply>>(&self, number: &str, replies: I) {
        let mut scripts = self.state.scripts.lock().expect("lock poisoned");
        scripts.entry(number.to_string()).or_default().extend(replies);
    }

    pub fn calls(&self, number: &str) -> usize {
        self.state.calls.lock().expect("lock poisoned").get(number).copied().unwrap_or_default()
    }

    pub fn total_calls(&self) -> usize {
        self.state.calls.lock().expect("lock poisoned").values().sum()
    }

    pub async fn stop(self) {
        self.handle.stop(true).await;
        debug!("🤖️ Mock accrual system stopped");
    }
}
