use async_trait::async_trait;
use resolv_application::{APOLOGY, ServiceSessionFactory, SessionFactory, TurnController};
use resolv_core::resolution::{ResolutionCategory, ResolutionStore};
use resolv_core::tool::ToolInvocation;
use resolv_core::{ResolvError, Result};
use resolv_interaction::{DialogueOptions, DialogueSession, ModelRequest, ModelResponse, ModelService};
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

// ============================================================================
// Test doubles
// ============================================================================

enum Step {
    Reply(Result<ModelResponse>),
    /// Waits until released, then replies.
    Gate(Arc<Notify>, ModelResponse),
    /// Never answers.
    Hang,
}

/// Model service that plays back a fixed script, one step per request.
struct ScriptedModel {
    steps: Mutex<VecDeque<Step>>,
    requests: AtomicUsize,
    last_request_tool_results: Mutex<Vec<(String, String)>>,
    /// Board watched while requests arrive
    board: Option<ResolutionStore>,
    /// Board size seen by each request that carried tool results
    board_len_at_results: Mutex<Vec<usize>>,
}

impl ScriptedModel {
    fn new(steps: Vec<Step>) -> Arc<Self> {
        Arc::new(Self::build(steps, None))
    }

    fn watching(steps: Vec<Step>, board: ResolutionStore) -> Arc<Self> {
        Arc::new(Self::build(steps, Some(board)))
    }

    fn build(steps: Vec<Step>, board: Option<ResolutionStore>) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            requests: AtomicUsize::new(0),
            last_request_tool_results: Mutex::new(Vec::new()),
            board,
            board_len_at_results: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ModelService for ScriptedModel {
    fn describe(&self) -> String {
        "scripted model".to_string()
    }

    async fn ensure_ready(&self) -> Result<()> {
        Ok(())
    }

    async fn generate(&self, request: ModelRequest<'_>) -> Result<ModelResponse> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if let Some(last) = request.turns.last() {
            *self.last_request_tool_results.lock().unwrap() = last
                .results()
                .map(|r| (r.invocation_id.clone(), r.outcome.clone()))
                .collect();

            if let Some(board) = &self.board {
                if last.results().next().is_some() {
                    self.board_len_at_results.lock().unwrap().push(board.len());
                }
            }
        }

        let step = self.steps.lock().unwrap().pop_front();
        match step {
            Some(Step::Reply(reply)) => reply,
            Some(Step::Gate(gate, reply)) => {
                gate.notified().await;
                Ok(reply)
            }
            Some(Step::Hang) => std::future::pending().await,
            None => Err(ResolvError::service("script exhausted")),
        }
    }
}

/// Factory that fails a fixed number of times before succeeding.
struct FlakyFactory {
    failures_left: AtomicUsize,
    inner: ServiceSessionFactory,
}

#[async_trait]
impl SessionFactory for FlakyFactory {
    async fn create_session(&self) -> Result<DialogueSession> {
        if self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(ResolvError::initialization("missing credentials"));
        }
        self.inner.create_session().await
    }
}

fn save_call(id: &str, args: Value) -> ToolInvocation {
    let Value::Object(arguments) = args else {
        panic!("arguments must be an object");
    };
    ToolInvocation::new(id, "saveResolution", arguments)
}

fn run_more_args() -> Value {
    json!({
        "title": "Run more",
        "category": "Health",
        "motivation": "stress relief",
        "firstStep": "buying shoes"
    })
}

fn controller_for(model: Arc<ScriptedModel>) -> (TurnController, ResolutionStore) {
    let store = ResolutionStore::new();
    let factory = Arc::new(ServiceSessionFactory::new(model, DialogueOptions::default()));
    (TurnController::new(factory, store.clone()), store)
}

// ============================================================================
// Scenarios
// ============================================================================

#[tokio::test]
async fn test_run_more_scenario_commits_one_resolution() {
    let model = ScriptedModel::new(vec![
        Step::Reply(Ok(ModelResponse::invocations(vec![save_call(
            "call-1",
            run_more_args(),
        )]))),
        Step::Reply(Ok(ModelResponse::text(
            "Great! I've added \"Run more\" to your board.",
        ))),
    ]);
    let (controller, store) = controller_for(model.clone());

    let reply = controller
        .send_user_message(
            "I want to run more, my why is stress relief, first step is buying shoes, category Health",
        )
        .await
        .expect("message should be accepted");

    assert!(!reply.is_empty());
    assert_ne!(reply, APOLOGY);
    assert_eq!(store.len(), 1);

    let saved = &store.snapshot()[0];
    assert_eq!(saved.title, "Run more");
    assert_eq!(saved.category, ResolutionCategory::Health);
    assert_eq!(saved.motivation, "stress relief");
    assert_eq!(saved.first_step, "buying shoes");
    assert!(!saved.id.is_empty());
    assert_eq!(model.requests.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_commits_land_before_results_reach_model() {
    let mut bad = run_more_args();
    bad["category"] = json!("Hobbies");
    let mut second = run_more_args();
    second["title"] = json!("Read twelve books");
    second["category"] = json!("Personal Growth");

    let store = ResolutionStore::new();
    let model = ScriptedModel::watching(
        vec![
            Step::Reply(Ok(ModelResponse::invocations(vec![
                save_call("good", run_more_args()),
                save_call("bad", bad),
            ]))),
            Step::Reply(Ok(ModelResponse::invocations(vec![save_call(
                "second", second,
            )]))),
            Step::Reply(Ok(ModelResponse::text("Both are on your board."))),
        ],
        store.clone(),
    );
    let factory = Arc::new(ServiceSessionFactory::new(
        model.clone(),
        DialogueOptions::default(),
    ));
    let controller = TurnController::new(factory, store.clone());

    controller.send_user_message("save them").await.unwrap();

    assert_eq!(*model.board_len_at_results.lock().unwrap(), vec![1, 2]);
    assert_eq!(store.len(), 2);
}

#[tokio::test]
async fn test_transport_failure_returns_apology_and_recovers() {
    let model = ScriptedModel::new(vec![
        Step::Reply(Err(ResolvError::Service {
            message: "connection reset by peer".into(),
            status_code: None,
            is_retryable: true,
        })),
        Step::Reply(Ok(ModelResponse::text("Welcome back!"))),
    ]);
    let (controller, store) = controller_for(model);

    let reply = controller.send_user_message("hello").await;
    assert_eq!(reply.as_deref(), Some(APOLOGY));
    assert!(store.is_empty());
    assert!(!controller.is_busy());

    let reply = controller.send_user_message("hello again").await;
    assert_eq!(reply.as_deref(), Some("Welcome back!"));
}

#[tokio::test]
async fn test_mixed_round_commits_only_valid_invocation() {
    let mut bad = run_more_args();
    bad["category"] = json!("Hobbies");
    let model = ScriptedModel::new(vec![
        Step::Reply(Ok(ModelResponse::invocations(vec![
            save_call("good", run_more_args()),
            save_call("bad", bad),
        ]))),
        Step::Reply(Ok(ModelResponse::text("Saved one, which category for the other?"))),
    ]);
    let (controller, store) = controller_for(model.clone());

    controller.send_user_message("save both").await.unwrap();

    assert_eq!(store.len(), 1);
    let results = model.last_request_tool_results.lock().unwrap().clone();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].0, "good");
    assert_eq!(results[0].1, "Resolution saved successfully to the board.");
    assert_eq!(results[1].0, "bad");
    assert!(results[1].1.contains("Hobbies"));
    assert!(!results[1].1.contains("successfully"));
}

#[tokio::test]
async fn test_blank_messages_are_ignored() {
    let model = ScriptedModel::new(Vec::new());
    let (controller, _) = controller_for(model.clone());

    assert_eq!(controller.send_user_message("").await, None);
    assert_eq!(controller.send_user_message("  \n\t").await, None);
    assert_eq!(model.requests.load(Ordering::SeqCst), 0);
    assert_eq!(controller.history_len().await, 0);
}

#[tokio::test]
async fn test_second_message_is_rejected_while_first_in_flight() {
    let gate = Arc::new(Notify::new());
    let model = ScriptedModel::new(vec![Step::Gate(
        gate.clone(),
        ModelResponse::text("first reply"),
    )]);
    let (controller, _) = controller_for(model.clone());
    let controller = Arc::new(controller);

    let first = {
        let controller = controller.clone();
        tokio::spawn(async move { controller.send_user_message("first").await })
    };

    while !controller.is_busy() {
        tokio::task::yield_now().await;
    }
    assert_eq!(controller.send_user_message("second").await, None);

    gate.notify_one();
    assert_eq!(first.await.unwrap().as_deref(), Some("first reply"));
    assert!(!controller.is_busy());
    assert_eq!(model.requests.load(Ordering::SeqCst), 1);
    // user + assistant from the first message only
    assert_eq!(controller.history_len().await, 2);
}

#[tokio::test(start_paused = true)]
async fn test_timeout_returns_apology_and_clears_busy_flag() {
    let model = ScriptedModel::new(vec![
        Step::Hang,
        Step::Reply(Ok(ModelResponse::text("back online"))),
    ]);
    let (controller, store) = controller_for(model);
    let controller = controller.with_request_timeout(Duration::from_secs(5));

    let reply = controller.send_user_message("are you there?").await;
    assert_eq!(reply.as_deref(), Some(APOLOGY));
    assert!(!controller.is_busy());
    assert!(store.is_empty());

    let reply = controller.send_user_message("retry").await;
    assert_eq!(reply.as_deref(), Some("back online"));
}

#[tokio::test]
async fn test_runaway_tool_loop_is_capped() {
    let steps = (0..10)
        .map(|i| {
            Step::Reply(Ok(ModelResponse::invocations(vec![save_call(
                &format!("call-{i}"),
                json!({"title": "x"}),
            )])))
        })
        .collect();
    let model = ScriptedModel::new(steps);
    let store = ResolutionStore::new();
    let factory = Arc::new(ServiceSessionFactory::new(
        model.clone(),
        DialogueOptions::default().with_max_rounds(4),
    ));
    let controller = TurnController::new(factory, store.clone());

    let reply = controller.send_user_message("loop").await;

    assert_eq!(reply.as_deref(), Some(APOLOGY));
    assert_eq!(model.requests.load(Ordering::SeqCst), 4);
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_initialization_failure_is_retried_on_next_message() {
    let model = ScriptedModel::new(vec![Step::Reply(Ok(ModelResponse::text("Hi!")))]);
    let factory = Arc::new(FlakyFactory {
        failures_left: AtomicUsize::new(1),
        inner: ServiceSessionFactory::new(model, DialogueOptions::default()),
    });
    let controller = TurnController::new(factory, ResolutionStore::new());

    assert_eq!(
        controller.send_user_message("hello").await.as_deref(),
        Some(APOLOGY)
    );
    assert_eq!(controller.history_len().await, 0);
    assert_eq!(
        controller.send_user_message("hello").await.as_deref(),
        Some("Hi!")
    );
}

#[tokio::test]
async fn test_identical_scripts_yield_identical_boards() {
    async fn run_once() -> (Vec<(String, ResolutionCategory, String, String)>, String) {
        let mut second = run_more_args();
        second["title"] = json!("Save money");
        second["category"] = json!("Finance");
        let model = ScriptedModel::new(vec![
            Step::Reply(Ok(ModelResponse::invocations(vec![
                save_call("a", run_more_args()),
                save_call("b", second),
            ]))),
            Step::Reply(Ok(ModelResponse::text("Both are on your board."))),
        ]);
        let (controller, store) = controller_for(model);
        let reply = controller.send_user_message("save them").await.unwrap();
        let board = store
            .snapshot()
            .into_iter()
            .map(|r| (r.title, r.category, r.motivation, r.first_step))
            .collect();
        (board, reply)
    }

    let (first_board, first_reply) = run_once().await;
    let (second_board, second_reply) = run_once().await;

    assert_eq!(first_board, second_board);
    assert_eq!(first_reply, second_reply);
    // most recent first
    assert_eq!(first_board[0].0, "Save money");
    assert_eq!(first_board[1].0, "Run more");
}

#[tokio::test]
async fn test_removed_resolutions_leave_the_board() {
    let model = ScriptedModel::new(vec![
        Step::Reply(Ok(ModelResponse::invocations(vec![save_call(
            "call-1",
            run_more_args(),
        )]))),
        Step::Reply(Ok(ModelResponse::text("Saved."))),
    ]);
    let (controller, store) = controller_for(model);
    controller.send_user_message("save it").await.unwrap();

    let id = store.snapshot()[0].id.clone();
    let removed = controller.remove_resolution(&id).expect("should remove");
    assert_eq!(removed.title, "Run more");
    assert!(store.is_empty());
    assert!(controller.remove_resolution(&id).is_none());
}
