use async_trait::async_trait;
use docex_api_client::ApiClient;
use docex_controller::{spawn, ControllerConfig, ControllerHandle};
use docex_core::{
    ClientConfig, ExtractionResult, Extractor, Phase, SelectedFile, SelectionSource, SubmitError,
    UploadState, View,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;

const MB: u64 = 1024 * 1024;

fn controller_for(extractor: Arc<dyn Extractor>, timeout: Duration) -> ControllerHandle {
    let (handle, _join) = spawn(
        extractor,
        ControllerConfig {
            request_timeout: timeout,
            ..Default::default()
        },
    );
    handle
}

fn api_client(url: &str) -> Arc<ApiClient> {
    let config = ClientConfig::default()
        .with_api_url(url)
        .with_timeout(Duration::from_secs(5));
    Arc::new(ApiClient::new(&config).expect("client"))
}

fn sized_file(suffix: &str, size: u64) -> (tempfile::NamedTempFile, SelectedFile) {
    let tmp = tempfile::Builder::new()
        .prefix("upload")
        .suffix(suffix)
        .tempfile()
        .unwrap();
    tmp.as_file().set_len(size).unwrap();
    let file = SelectedFile::from_path(tmp.path(), None).unwrap();
    (tmp, file)
}

fn pdf(name: &str) -> SelectedFile {
    SelectedFile::from_bytes(name, "application/pdf", b"%PDF-1.4".to_vec())
}

/// Counts calls and answers each one with a fixed successful result.
struct Counting {
    calls: AtomicUsize,
    result: ExtractionResult,
}

#[async_trait]
impl Extractor for Counting {
    async fn extract(&self, _file: &SelectedFile) -> Result<ExtractionResult, SubmitError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.result.clone())
    }
}

/// Never answers.
struct Hanging;

#[async_trait]
impl Extractor for Hanging {
    async fn extract(&self, _file: &SelectedFile) -> Result<ExtractionResult, SubmitError> {
        std::future::pending::<Result<ExtractionResult, SubmitError>>().await
    }
}

/// Answers a call for a file only once that file's gate is released.
struct Gated {
    gates: Mutex<HashMap<String, (oneshot::Receiver<()>, oneshot::Sender<()>)>>,
}

/// Test side of one gated call.
struct Gate {
    release: oneshot::Sender<()>,
    returned: oneshot::Receiver<()>,
}

impl Gate {
    /// Let the call answer and wait until `extract` has returned.
    async fn open(self) {
        self.release.send(()).unwrap();
        self.returned.await.unwrap();
    }
}

impl Gated {
    fn new(names: &[&str]) -> (Arc<Self>, HashMap<String, Gate>) {
        let mut test_side = HashMap::new();
        let mut gates = HashMap::new();
        for name in names {
            let (release, release_rx) = oneshot::channel();
            let (returned_tx, returned) = oneshot::channel();
            test_side.insert(name.to_string(), Gate { release, returned });
            gates.insert(name.to_string(), (release_rx, returned_tx));
        }
        (
            Arc::new(Self {
                gates: Mutex::new(gates),
            }),
            test_side,
        )
    }
}

#[async_trait]
impl Extractor for Gated {
    async fn extract(&self, file: &SelectedFile) -> Result<ExtractionResult, SubmitError> {
        let gate = self.gates.lock().unwrap().remove(&file.name);
        let result = ExtractionResult {
            name: Some(file.name.clone()),
            ..Default::default()
        };
        if let Some((release, returned)) = gate {
            let _ = release.await;
            let _ = returned.send(());
        }
        Ok(result)
    }
}

/// Push a no-op through the loop. Everything sent to the controller before it
/// has been applied once this returns.
async fn drain(handle: &ControllerHandle) {
    handle
        .select(SelectionSource::FilePicker, Vec::new())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_two_megabyte_pdf_reaches_success_with_percent_confidence() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/extract")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"name":"A","email":"a@x.com","confidence":0.87}"#)
        .create_async()
        .await;

    let handle = controller_for(api_client(&server.url()), Duration::from_secs(5));
    let (_tmp, file) = sized_file(".pdf", 2 * MB);

    let mut phases = vec![handle.state().phase()];
    let after_select = handle
        .select(SelectionSource::FilePicker, vec![file])
        .await
        .unwrap();
    phases.push(after_select.phase());
    let settled = handle.settled(after_select).await.unwrap();
    phases.push(settled.phase());

    assert_eq!(phases, vec![Phase::Idle, Phase::Loading, Phase::Success]);
    let View::Success { result, file } = View::of(&settled) else {
        panic!("expected success view");
    };
    assert_eq!(result.name, "A");
    assert_eq!(result.email, "a@x.com");
    assert_eq!(result.confidence.as_deref(), Some("87%"));
    assert_eq!(file.size_mb, "2.00");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_fifteen_megabyte_png_is_rejected_without_request() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/extract")
        .expect(0)
        .create_async()
        .await;

    let handle = controller_for(api_client(&server.url()), Duration::from_secs(5));
    let (_tmp, file) = sized_file(".png", 15 * MB);

    assert_eq!(handle.state().phase(), Phase::Idle);
    let after_select = handle
        .select(SelectionSource::DragDrop, vec![file])
        .await
        .unwrap();

    assert_eq!(after_select.phase(), Phase::Error);
    assert_eq!(
        after_select.error_message(),
        Some("File size must be less than 10MB")
    );
    drain(&handle).await;
    mock.assert_async().await;
}

#[tokio::test]
async fn test_network_failure_after_valid_pdf_shows_generic_message() {
    let handle = controller_for(api_client("http://127.0.0.1:1"), Duration::from_secs(5));

    let mut phases = vec![handle.state().phase()];
    let after_select = handle
        .select(SelectionSource::FilePicker, vec![pdf("cv.pdf")])
        .await
        .unwrap();
    phases.push(after_select.phase());
    let settled = handle.settled(after_select).await.unwrap();
    phases.push(settled.phase());

    assert_eq!(phases, vec![Phase::Idle, Phase::Loading, Phase::Error]);
    assert_eq!(settled.error_message(), Some("Failed to process file"));
}

#[tokio::test]
async fn test_server_error_and_malformed_body_look_the_same() {
    let mut server = mockito::Server::new_async().await;
    let _bad_status = server
        .mock("POST", "/api/extract")
        .match_body(mockito::Matcher::Regex(r#"filename="a.pdf""#.to_string()))
        .with_status(500)
        .with_body(r#"{"error":"Internal server error: quota exceeded"}"#)
        .expect(1)
        .create_async()
        .await;

    let handle = controller_for(api_client(&server.url()), Duration::from_secs(5));
    let status_failure = handle
        .select_and_settle(SelectionSource::FilePicker, vec![pdf("a.pdf")])
        .await
        .unwrap();

    let _malformed = server
        .mock("POST", "/api/extract")
        .match_body(mockito::Matcher::Regex(r#"filename="b.pdf""#.to_string()))
        .with_status(200)
        .with_body("{\"name\": ")
        .create_async()
        .await;

    let malformed_failure = handle
        .select_and_settle(SelectionSource::FilePicker, vec![pdf("b.pdf")])
        .await
        .unwrap();

    assert_eq!(status_failure.error_message(), Some("Failed to process file"));
    assert_eq!(
        View::of(&status_failure),
        View::of(&malformed_failure),
        "the user cannot tell the two failures apart"
    );
}

#[tokio::test]
async fn test_hung_request_times_out_into_error() {
    let handle = controller_for(Arc::new(Hanging), Duration::from_millis(50));

    let settled = handle
        .select_and_settle(SelectionSource::DragDrop, vec![pdf("slow.pdf")])
        .await
        .unwrap();

    assert_eq!(settled.phase(), Phase::Error);
    assert_eq!(settled.error_message(), Some("Failed to process file"));
    assert_eq!(
        settled.file().map(|f| f.name.as_str()),
        Some("slow.pdf")
    );
}

#[tokio::test]
async fn test_rejected_type_never_calls_extractor() {
    let extractor = Arc::new(Counting {
        calls: AtomicUsize::new(0),
        result: ExtractionResult::default(),
    });
    let handle = controller_for(extractor.clone(), Duration::from_secs(5));

    for mime in ["image/jpeg", "text/plain", "application/zip"] {
        let state = handle
            .select(
                SelectionSource::FilePicker,
                vec![SelectedFile::from_bytes("x", mime, vec![1, 2, 3])],
            )
            .await
            .unwrap();
        assert_eq!(
            state.error_message(),
            Some("Only PDF and PNG files are allowed")
        );
    }

    drain(&handle).await;
    assert_eq!(extractor.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_name_only_response_renders_not_found_email() {
    let extractor = Arc::new(Counting {
        calls: AtomicUsize::new(0),
        result: ExtractionResult {
            name: Some("Jane Doe".into()),
            ..Default::default()
        },
    });
    let handle = controller_for(extractor.clone(), Duration::from_secs(5));

    let settled = handle
        .select_and_settle(
            SelectionSource::DragDrop,
            vec![pdf("jane.pdf"), pdf("ignored.pdf")],
        )
        .await
        .unwrap();

    let text = View::of(&settled).to_string();
    assert!(text.contains("Name: Jane Doe"));
    assert!(text.contains("Email: Not found"));
    assert!(!text.contains("Confidence"));
    assert_eq!(extractor.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_stale_response_after_reselection_is_discarded() {
    let (extractor, mut gates) = Gated::new(&["first.pdf", "second.pdf"]);
    let handle = controller_for(extractor, Duration::from_secs(5));

    let first = handle
        .select(SelectionSource::DragDrop, vec![pdf("first.pdf")])
        .await
        .unwrap();
    let second = handle
        .select(SelectionSource::DragDrop, vec![pdf("second.pdf")])
        .await
        .unwrap();
    assert!(second.tracked_token() > first.tracked_token());

    // Answer the newer request first, then let the older one arrive late.
    let first_gate = gates.remove("first.pdf").unwrap();
    let second_gate = gates.remove("second.pdf").unwrap();
    second_gate.open().await;
    let settled = handle.settled(second).await.unwrap();
    assert_eq!(
        settled.result().and_then(|r| r.name.as_deref()),
        Some("second.pdf")
    );

    first_gate.open().await;
    drain(&handle).await;

    let current = handle.state();
    assert_eq!(current.phase(), Phase::Success);
    assert_eq!(
        current.result().and_then(|r| r.name.as_deref()),
        Some("second.pdf")
    );
}

#[tokio::test]
async fn test_reset_while_loading_ignores_late_response() {
    let (extractor, mut gates) = Gated::new(&["a.pdf"]);
    let handle = controller_for(extractor, Duration::from_secs(5));

    let loading = handle
        .select(SelectionSource::FilePicker, vec![pdf("a.pdf")])
        .await
        .unwrap();
    assert_eq!(loading.phase(), Phase::Loading);

    let once = handle.reset().await.unwrap();
    let twice = handle.reset().await.unwrap();
    assert_eq!(once, UploadState::Idle);
    assert_eq!(twice, once);

    gates.remove("a.pdf").unwrap().open().await;
    drain(&handle).await;
    assert_eq!(handle.state(), UploadState::Idle);
}

#[tokio::test]
async fn test_subscribers_see_the_settled_state() {
    let extractor = Arc::new(Counting {
        calls: AtomicUsize::new(0),
        result: ExtractionResult {
            email: Some("a@x.com".into()),
            ..Default::default()
        },
    });
    let handle = controller_for(extractor, Duration::from_secs(5));
    let mut rx = handle.subscribe();

    handle
        .select(SelectionSource::FilePicker, vec![pdf("a.pdf")])
        .await
        .unwrap();

    let state = rx
        .wait_for(|s| s.phase() == Phase::Success)
        .await
        .unwrap()
        .clone();
    assert_eq!(
        state.result().and_then(|r| r.email.as_deref()),
        Some("a@x.com")
    );
}

#[tokio::test]
async fn test_no_op_inputs_do_not_notify_subscribers() {
    let extractor = Arc::new(Counting {
        calls: AtomicUsize::new(0),
        result: ExtractionResult::default(),
    });
    let handle = controller_for(extractor, Duration::from_secs(5));
    let mut rx = handle.subscribe();
    rx.borrow_and_update();

    handle
        .select(SelectionSource::DragDrop, Vec::new())
        .await
        .unwrap();
    handle.reset().await.unwrap();
    assert!(!rx.has_changed().unwrap());

    handle
        .select(SelectionSource::DragDrop, vec![pdf("a.pdf")])
        .await
        .unwrap();
    assert!(rx.has_changed().unwrap());
}
