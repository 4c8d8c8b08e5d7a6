//! Drives the forward backend against a fake engine served by `tiny_http`.

use std::io::Read;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use flotilla_backends::{BackendKind, serve_factory};
use flotilla_beam::{Object, ObjectError};
use rstest::{fixture, rstest};
use serde_json::{Value, json};
use tiny_http::{Header, Method, Request, Response, Server, StatusCode};

#[derive(Debug, Clone)]
struct FakeContainer {
    id: String,
    name: String,
    image: String,
    running: bool,
}

#[derive(Debug, Default)]
struct EngineState {
    containers: Vec<FakeContainer>,
    requests: Vec<String>,
}

impl EngineState {
    fn find(&mut self, reference: &str) -> Option<&mut FakeContainer> {
        self.containers
            .iter_mut()
            .find(|container| container.id == reference || container.name == reference)
    }
}

struct FakeEngine {
    port: u16,
    state: Arc<Mutex<EngineState>>,
    stop: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl FakeEngine {
    fn start() -> Self {
        let server = Server::http("127.0.0.1:0").expect("bind fake engine");
        let port = server
            .server_addr()
            .to_ip()
            .expect("fake engine listens on TCP")
            .port();
        let state = Arc::new(Mutex::new(EngineState::default()));
        let stop = Arc::new(AtomicBool::new(false));

        let worker_state = Arc::clone(&state);
        let worker_stop = Arc::clone(&stop);
        let worker = thread::spawn(move || {
            while !worker_stop.load(Ordering::SeqCst) {
                match server.recv_timeout(Duration::from_millis(50)) {
                    Ok(Some(request)) => handle(&worker_state, request),
                    Ok(None) => continue,
                    Err(_) => break,
                }
            }
        });

        Self {
            port,
            state,
            stop,
            worker: Some(worker),
        }
    }

    fn address(&self) -> String {
        format!("tcp://127.0.0.1:{}", self.port)
    }

    fn requests(&self) -> Vec<String> {
        self.state.lock().expect("engine state").requests.clone()
    }
}

impl Drop for FakeEngine {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn json_response(status: u16, body: &Value) -> Response<std::io::Cursor<Vec<u8>>> {
    Response::from_string(body.to_string())
        .with_status_code(StatusCode(status))
        .with_header(
            Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
                .expect("content type header"),
        )
}

fn handle(state: &Mutex<EngineState>, mut request: Request) {
    let mut body = String::new();
    request
        .as_reader()
        .read_to_string(&mut body)
        .expect("read request body");
    let method = request.method().clone();
    let url = request.url().to_owned();

    let mut state = state.lock().expect("engine state");
    state.requests.push(format!("{method} {url}"));

    let segments: Vec<&str> = url.trim_start_matches('/').split('/').collect();
    let response = match (&method, segments.as_slice()) {
        (Method::Get, ["_ping"]) => Response::from_string("OK"),
        (Method::Get, ["containers", "json?all=1"]) => {
            let listed: Vec<Value> = state
                .containers
                .iter()
                .map(|container| {
                    json!({ "Id": container.id, "Names": [format!("/{}", container.name)] })
                })
                .collect();
            json_response(200, &Value::Array(listed))
        }
        (Method::Post, ["containers", create]) if create.starts_with("create") => {
            let spec: Value = serde_json::from_str(&body).expect("creation spec");
            let image = spec["Image"].as_str().unwrap_or_default().to_owned();
            if image == "missing" {
                json_response(404, &json!({ "message": "No such image: missing" }))
            } else {
                let id = format!("c0ffee{:06}", state.containers.len() + 1);
                let name = create
                    .split_once("?name=")
                    .map_or_else(|| id.clone(), |(_, name)| name.to_owned());
                state.containers.push(FakeContainer {
                    id: id.clone(),
                    name,
                    image,
                    running: false,
                });
                json_response(201, &json!({ "Id": id, "Warnings": [] }))
            }
        }
        (Method::Get, ["containers", reference, "json"]) => match state.find(reference) {
            Some(container) => json_response(
                200,
                &json!({
                    "Id": container.id,
                    "Name": format!("/{}", container.name),
                    "Config": { "Image": container.image },
                    "State": { "Status": if container.running { "running" } else { "created" } },
                }),
            ),
            None => json_response(
                404,
                &json!({ "message": format!("No such container: {reference}") }),
            ),
        },
        (Method::Post, ["containers", reference, action]) => {
            let starting = *action == "start";
            match state.find(reference) {
                Some(container) if container.running == starting => {
                    Response::from_string("").with_status_code(StatusCode(304))
                }
                Some(container) => {
                    container.running = starting;
                    Response::from_string("").with_status_code(StatusCode(204))
                }
                None => json_response(
                    404,
                    &json!({ "message": format!("No such container: {reference}") }),
                ),
            }
        }
        _ => json_response(404, &json!({ "message": "page not found" })),
    };
    let _ = request.respond(response);
}

#[fixture]
fn engine() -> FakeEngine {
    FakeEngine::start()
}

fn instance(engine: &FakeEngine) -> Object {
    Object::new(serve_factory(BackendKind::Forward))
        .with_timeout(Some(Duration::from_secs(5)))
        .spawn(&engine.address())
        .expect("spawn forward instance")
}

#[rstest]
fn start_pings_the_engine(engine: FakeEngine) {
    instance(&engine).start().expect("start");
    assert_eq!(engine.requests(), ["GET /_ping"]);
}

#[rstest]
fn create_then_describe(engine: FakeEngine) {
    let instance = instance(&engine);
    let container = instance
        .spawn(r#"{"Image":"nginx","Name":"web"}"#)
        .expect("create");
    let description: Value =
        serde_json::from_str(&container.get().expect("get")).expect("description json");

    assert_eq!(description["Id"], "c0ffee000001");
    assert_eq!(description["Name"], "web");
    assert_eq!(description["Image"], "nginx");
    assert_eq!(
        engine.requests().first().map(String::as_str),
        Some("POST /containers/create?name=web")
    );
}

#[rstest]
fn ls_strips_leading_slash_and_keeps_order(engine: FakeEngine) {
    let instance = instance(&engine);
    for name in ["b", "a"] {
        instance
            .spawn(&format!(r#"{{"Image":"busybox","Name":"{name}"}}"#))
            .expect("create");
    }
    assert_eq!(instance.ls().expect("ls"), ["b", "a"]);
}

#[rstest]
fn attached_container_starts_and_stops(engine: FakeEngine) {
    let instance = instance(&engine);
    instance
        .spawn(r#"{"Image":"nginx","Name":"web"}"#)
        .expect("create");

    let web = instance.child("web").expect("attach");
    web.start().expect("start");
    assert_eq!(
        web.start(),
        Err(ObjectError::StartFailed(
            "container c0ffee000001 is already running".into()
        ))
    );
    web.stop().expect("stop");
    assert!(
        engine
            .requests()
            .contains(&"POST /containers/c0ffee000001/stop".to_owned())
    );
}

#[rstest]
fn unknown_container_fails_attach(engine: FakeEngine) {
    assert_eq!(
        instance(&engine).attach("ghost").map(|_| ()),
        Err(ObjectError::AttachFailed("no such container: ghost".into()))
    );
}

#[rstest]
fn engine_message_is_relayed(engine: FakeEngine) {
    assert_eq!(
        instance(&engine).spawn(r#"{"Image":"missing"}"#).map(|_| ()),
        Err(ObjectError::SpawnFailed("No such image: missing".into()))
    );
}

#[test]
fn unreachable_engine_fails_start() {
    let instance = Object::new(serve_factory(BackendKind::Forward))
        .with_timeout(Some(Duration::from_secs(10)))
        .spawn("tcp://127.0.0.1:1")
        .expect("spawn does not dial the engine");
    let error = instance.start().expect_err("start must fail");
    let message = error.reply_message().unwrap_or_default();
    assert!(
        message.starts_with("failed to connect to engine at tcp://127.0.0.1:1"),
        "{message}"
    );
}

const CHUNKED_HEAD: &[u8] =
    b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nTransfer-Encoding: chunked\r\n\r\n";
// The first chunk ends in `0\r\n` so the bytes on the wire end in `0\r\n\r\n`
// before the body is complete.
const FIRST_CHUNK: &[u8] = b"2b\r\n[{\"Id\":\"c1\",\"Names\":[\"/web\"],\"Created\":10\r\n\r\n";
const LAST_CHUNKS: &[u8] = b"2\r\n}]\r\n0\r\n\r\n";

/// Answers one request with a chunked listing split across two writes.
fn reply_in_two_writes(mut stream: impl std::io::Read + std::io::Write) {
    let mut head = Vec::new();
    let mut byte = [0_u8; 1];
    while !head.ends_with(b"\r\n\r\n") {
        stream.read_exact(&mut byte).expect("read request");
        head.extend_from_slice(&byte);
    }
    stream.write_all(CHUNKED_HEAD).expect("write head");
    stream.write_all(FIRST_CHUNK).expect("write first chunk");
    stream.flush().expect("flush");
    thread::sleep(Duration::from_millis(100));
    stream.write_all(LAST_CHUNKS).expect("write last chunks");
}

#[test]
fn chunked_listing_survives_a_terminator_lookalike() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("addr").port();
    let engine = thread::spawn(move || {
        let (stream, _) = listener.accept().expect("accept");
        reply_in_two_writes(stream);
    });

    let instance = Object::new(serve_factory(BackendKind::Forward))
        .with_timeout(Some(Duration::from_secs(5)))
        .spawn(&format!("tcp://127.0.0.1:{port}"))
        .expect("spawn forward instance");
    assert_eq!(instance.ls().expect("ls"), ["web"]);
    engine.join().expect("engine thread");
}

#[cfg(unix)]
#[test]
fn unix_socket_engine_is_reachable() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("engine.sock");
    let listener = std::os::unix::net::UnixListener::bind(&path).expect("bind");
    let engine = thread::spawn(move || {
        let (stream, _) = listener.accept().expect("accept");
        reply_in_two_writes(stream);
    });

    let instance = Object::new(serve_factory(BackendKind::Forward))
        .with_timeout(Some(Duration::from_secs(5)))
        .spawn(&format!("unix://{}", path.display()))
        .expect("spawn forward instance");
    assert_eq!(instance.ls().expect("ls"), ["web"]);
    engine.join().expect("engine thread");
}
