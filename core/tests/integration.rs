//! Full timer and dashboard lifecycle against the live mock store.
//!
//! # Design
//! Starts the mock store on a random port, then drives every core
//! operation over real HTTP using ureq. `HttpStore` is the host side of
//! the host-does-IO split: it executes the requests `StoreClient` builds
//! and feeds the responses back through the matching parsers.

use std::cell::RefCell;
use std::thread::sleep;
use std::time::Duration;

use clientflow_core::{
    collections, dashboard, store::fetch_tasks, store::TASK_FIELDS, tracking, AggregateQuery,
    AggregateValue, Method, Notifier, NullNotifier, ProjectId, RecordStore, StoreClient,
    StoreError, StoreRequest, StoreResponse, TimerService,
};
use serde_json::{json, Value};

/// Record-store backed by a real HTTP round trip.
#[derive(Clone)]
struct HttpStore {
    client: StoreClient,
    agent: ureq::Agent,
}

impl HttpStore {
    fn new(base_url: &str) -> Self {
        // Disable ureq's status-as-error behavior so the parsers see
        // non-2xx responses as data.
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self {
            client: StoreClient::new(base_url),
            agent,
        }
    }

    fn execute(&self, req: StoreRequest) -> Result<StoreResponse, StoreError> {
        let result = match (req.method, req.body) {
            (Method::Get, _) => self.agent.get(&req.url).call(),
            (Method::Post, Some(body)) => self
                .agent
                .post(&req.url)
                .content_type("application/json")
                .send(body.as_bytes()),
            (Method::Post, None) => self.agent.post(&req.url).send_empty(),
            (Method::Put, Some(body)) => self
                .agent
                .put(&req.url)
                .content_type("application/json")
                .send(body.as_bytes()),
            (Method::Put, None) => self.agent.put(&req.url).send_empty(),
        };

        let mut response = result.map_err(|e| StoreError::Persistence {
            message: format!("transport error: {e}"),
        })?;

        let status = response.status().as_u16();
        let body = response.body_mut().read_to_string().unwrap_or_default();
        Ok(StoreResponse { status, body })
    }
}

impl RecordStore for HttpStore {
    fn fetch_all(&self, collection: &str, fields: &[&str]) -> Result<Vec<Value>, StoreError> {
        let req = self.client.build_fetch_all(collection, fields)?;
        self.client.parse_fetch_all(self.execute(req)?)
    }

    fn fetch_by_id(&self, collection: &str, id: i64, fields: &[&str]) -> Result<Value, StoreError> {
        let req = self.client.build_fetch_by_id(collection, id, fields);
        self.client.parse_fetch_by_id(self.execute(req)?)
    }

    fn create(&self, collection: &str, records: Vec<Value>) -> Result<Vec<Value>, StoreError> {
        let req = self.client.build_create(collection, &records)?;
        self.client.parse_create(self.execute(req)?)
    }

    fn update(&self, collection: &str, records: Vec<Value>) -> Result<Vec<Value>, StoreError> {
        let req = self.client.build_update(collection, &records)?;
        self.client.parse_update(self.execute(req)?)
    }

    fn delete(&self, collection: &str, ids: &[i64]) -> Result<(), StoreError> {
        let req = self.client.build_delete(collection, ids)?;
        self.client.parse_delete(self.execute(req)?)
    }

    fn aggregate(
        &self,
        collection: &str,
        queries: &[AggregateQuery],
    ) -> Result<Vec<AggregateValue>, StoreError> {
        let req = self.client.build_aggregate(collection, queries)?;
        self.client.parse_aggregate(self.execute(req)?)
    }
}

struct CollectingNotifier(RefCell<Vec<String>>);

impl CollectingNotifier {
    fn new() -> Self {
        Self(RefCell::new(Vec::new()))
    }
}

impl Notifier for CollectingNotifier {
    fn notify_success(&self, message: &str) {
        self.0.borrow_mut().push(format!("ok: {message}"));
    }
    fn notify_error(&self, message: &str) {
        self.0.borrow_mut().push(format!("err: {message}"));
    }
}

/// Start the mock store on a random port and return its base URL.
fn spawn_store() -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_store::run(listener).await
        })
        .unwrap();
    });

    format!("http://{addr}")
}

fn record_id(record: &Value) -> i64 {
    record["Id"].as_i64().unwrap()
}

#[test]
fn timer_and_aggregation_lifecycle() {
    let base = spawn_store();
    let store = HttpStore::new(&base);

    // Step 1: seed a client, an active project, and two pending tasks.
    // The second task carries its project id as a string, like parts of
    // the production dataset do.
    store
        .create(
            collections::CLIENT,
            vec![json!({"Name": "Acme", "status": "active"})],
        )
        .unwrap();
    let projects = store
        .create(
            collections::PROJECT,
            vec![json!({"Name": "Site relaunch", "status": "active"})],
        )
        .unwrap();
    let project_id = record_id(&projects[0]);

    let tasks = store
        .create(
            collections::TASK,
            vec![
                json!({
                    "title": "Wireframes",
                    "status": "in-progress",
                    "totalTime": 0,
                    "projectId": project_id,
                }),
                json!({
                    "title": "Content draft",
                    "status": "todo",
                    "totalTime": 0,
                    "projectId": project_id.to_string(),
                }),
            ],
        )
        .unwrap();
    let tracked_id = record_id(&tasks[0]);

    // Step 2: dashboard counts reflect the seed data.
    let summary = dashboard::dashboard_data(&store, &NullNotifier);
    assert_eq!(summary.summary.total_clients, 1);
    assert_eq!(summary.summary.active_projects, 1);
    assert_eq!(summary.summary.pending_tasks, 2);
    assert_eq!(summary.summary.completed_tasks, 0);

    // Step 3: run a timer session.
    let timers = TimerService::new(store.clone(), NullNotifier);
    timers.start(tracked_id).unwrap();

    let err = timers.start(tracked_id).unwrap_err();
    assert!(matches!(err, StoreError::InvalidState("timer already running")));

    sleep(Duration::from_millis(100));
    let entry = timers.stop(tracked_id).unwrap();
    assert!(entry.duration_ms >= 50, "duration: {}", entry.duration_ms);
    assert_eq!(entry.date, entry.start_time.date_naive());

    // Step 4: the store holds the folded total and a cleared timer.
    let record = store
        .fetch_by_id(collections::TASK, tracked_id, TASK_FIELDS)
        .unwrap();
    assert_eq!(record["totalTime"].as_u64().unwrap(), entry.duration_ms);
    assert_eq!(record["activeTimer"], Value::Null);

    // Step 5: stop again fails, missing task fails.
    let err = timers.stop(tracked_id).unwrap_err();
    assert!(matches!(err, StoreError::InvalidState("no active timer")));
    let err = timers.start(9_999).unwrap_err();
    assert!(matches!(err, StoreError::NotFound));

    // Step 6: aggregation sees the tracked time; the string-form project id
    // on the second task normalizes to the same project.
    let all_tasks = fetch_tasks(&store).unwrap();
    let overall = tracking::overall_summary(&all_tasks);
    assert_eq!(overall.total_time_ms, entry.duration_ms);
    assert_eq!(overall.active_timers, 0);
    assert_eq!(overall.breakdown.len(), 1);
    assert_eq!(overall.breakdown[0].task_id, tracked_id);
    assert_eq!(overall.breakdown[0].title, "Wireframes");

    let by_number = tracking::project_summary(&all_tasks, ProjectId::from(project_id));
    let by_string: ProjectId = project_id.to_string().parse().unwrap();
    let by_string = tracking::project_summary(&all_tasks, by_string);
    assert_eq!(by_number, by_string);
    assert_eq!(by_number.total_entries, 2);
    assert_eq!(by_number.total_time_ms, entry.duration_ms);

    // Step 7: delete one task and watch the counts move.
    let other_id = record_id(&tasks[1]);
    store.delete(collections::TASK, &[other_id]).unwrap();
    assert_eq!(fetch_tasks(&store).unwrap().len(), 1);

    let err = store.delete(collections::TASK, &[other_id]).unwrap_err();
    assert!(matches!(err, StoreError::Persistence { .. }));
}

#[test]
fn dashboard_fails_soft_when_backend_is_unreachable() {
    // Nothing listens here; every call is a transport error.
    let store = HttpStore::new("http://127.0.0.1:9");
    let notifier = CollectingNotifier::new();

    let summary = dashboard::dashboard_data(&store, &notifier);
    assert_eq!(summary, dashboard::DashboardSummary::empty());
    assert!(summary.recent_activity.is_empty());

    let messages = notifier.0.borrow();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].starts_with("err: Failed to fetch dashboard data"));
}

#[test]
fn tracking_fails_soft_when_backend_is_unreachable() {
    let store = HttpStore::new("http://127.0.0.1:9");
    let notifier = CollectingNotifier::new();

    let summary = tracking::overall_summary_from_store(&store, &notifier);
    assert_eq!(summary, tracking::TimeTrackingSummary::default());
    assert!(notifier.0.borrow()[0].starts_with("err: Failed to load time tracking"));
}
