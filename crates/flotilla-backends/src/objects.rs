//! Factory, instance and container objects.
//!
//! A factory answers `Spawn(address)` with an instance bound to one engine.
//! The instance exposes the engine's containers: `Ls` lists them, `Spawn`
//! creates one, `Attach(name)` opens one, and `Attach("")` subscribes the
//! caller to the instance's event stream.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use flotilla_beam::{Dispatcher, Handler, HandlerError, HandlerResult, Message, Reply, Sender, Verb};
use serde_json::json;
use tracing::debug;

use crate::engine::ContainerEngine;
use crate::errors::EngineError;
use crate::events::EventHub;
use crate::forward::ForwardEngine;
use crate::kind::BackendKind;
use crate::memory::MemoryEngine;

const OBJECTS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::objects");

static NEXT_INSTANCE: AtomicU64 = AtomicU64::new(1);

/// Serves a factory object that instantiates `kind` backends.
#[must_use]
pub fn serve_factory(kind: BackendKind) -> Sender {
    Dispatcher::new()
        .with(Verb::Spawn, move |message: &Message| -> HandlerResult {
            let address = message.first_arg().unwrap_or_default();
            let engine: Arc<dyn ContainerEngine> = match kind {
                BackendKind::Debug => Arc::new(MemoryEngine::new()),
                BackendKind::Forward => Arc::new(ForwardEngine::connect(address)?),
            };
            debug!(target: OBJECTS_TARGET, backend = %kind, address, "spawning instance");
            Ok(Reply::Object(serve_instance(kind.as_str(), address, engine)))
        })
        .with(Verb::Get, move |_: &Message| -> HandlerResult {
            Ok(Reply::Text(json!({ "Backend": kind.as_str() }).to_string()))
        })
        .serve()
}

/// Serves an instance object over `engine`.
///
/// `label` names the backend in descriptions and events; `address` is the
/// argument the instance was spawned with.
#[must_use]
pub fn serve_instance(label: &str, address: &str, engine: Arc<dyn ContainerEngine>) -> Sender {
    let id = format!("{:012x}", NEXT_INSTANCE.fetch_add(1, Ordering::Relaxed));
    let instance = Arc::new_cyclic(|this| Instance {
        this: this.clone(),
        id,
        label: label.to_owned(),
        address: address.to_owned(),
        engine,
        events: EventHub::default(),
        running: AtomicBool::new(false),
    });
    instance_dispatcher(&instance).serve()
}

fn bind<T>(target: Arc<T>, verb: fn(&T, &Message) -> HandlerResult) -> impl Handler
where
    T: Send + Sync + 'static,
{
    move |message: &Message| verb(&target, message)
}

struct Instance {
    this: Weak<Instance>,
    id: String,
    label: String,
    address: String,
    engine: Arc<dyn ContainerEngine>,
    events: EventHub,
    running: AtomicBool,
}

fn instance_dispatcher(instance: &Arc<Instance>) -> Dispatcher {
    let verbs: [(Verb, fn(&Instance, &Message) -> HandlerResult); 8] = [
        (Verb::Spawn, Instance::spawn),
        (Verb::Attach, Instance::attach),
        (Verb::Start, Instance::start),
        (Verb::Stop, Instance::stop),
        (Verb::Ls, Instance::ls),
        (Verb::Get, Instance::get),
        (Verb::Log, Instance::log),
        (Verb::Error, Instance::error),
    ];
    verbs
        .into_iter()
        .fold(Dispatcher::new(), |dispatcher, (verb, handler)| {
            dispatcher.with(verb, bind(Arc::clone(instance), handler))
        })
}

impl Instance {
    fn spawn(&self, message: &Message) -> HandlerResult {
        let spec = message.first_arg().unwrap_or_default();
        let id = self.engine.create(spec)?;
        self.events.log(format!("created container {id}"));
        Ok(Reply::Object(self.serve_container(id)))
    }

    fn attach(&self, message: &Message) -> HandlerResult {
        let name = message.first_arg().unwrap_or_default();
        if !name.is_empty() {
            let id = self
                .engine
                .resolve(name)?
                .ok_or_else(|| EngineError::NoSuchContainer(name.to_owned()))?;
            return Ok(Reply::Object(self.serve_container(id)));
        }

        let subscriber = message
            .ret
            .clone()
            .ok_or_else(|| HandlerError::new("attach requires a return channel"))?;
        let this = self
            .this
            .upgrade()
            .ok_or_else(|| HandlerError::new("instance is shutting down"))?;
        self.events.subscribe(subscriber);
        debug!(target: OBJECTS_TARGET, instance = %self.id, "session attached");
        Ok(Reply::Object(instance_dispatcher(&this).serve()))
    }

    fn start(&self, _: &Message) -> HandlerResult {
        self.engine.ping()?;
        self.running.store(true, Ordering::SeqCst);
        self.events
            .log(format!("{} backend started against {}", self.label, self.address));
        Ok(Reply::Empty)
    }

    fn stop(&self, _: &Message) -> HandlerResult {
        self.running.store(false, Ordering::SeqCst);
        self.events.log(format!("{} backend stopped", self.label));
        Ok(Reply::Empty)
    }

    fn ls(&self, _: &Message) -> HandlerResult {
        Ok(Reply::Names(self.engine.list()?))
    }

    fn get(&self, _: &Message) -> HandlerResult {
        let description = json!({
            "Id": self.id,
            "Backend": self.label,
            "Engine": self.address,
            "Running": self.running.load(Ordering::SeqCst),
        });
        Ok(Reply::Text(description.to_string()))
    }

    fn log(&self, message: &Message) -> HandlerResult {
        self.events.log(message.args.join(" "));
        Ok(Reply::Empty)
    }

    fn error(&self, message: &Message) -> HandlerResult {
        self.events.error(message.first_arg().unwrap_or_default());
        Ok(Reply::Empty)
    }

    fn serve_container(&self, id: String) -> Sender {
        let container = Arc::new(Container {
            id,
            engine: Arc::clone(&self.engine),
            events: self.events.clone(),
        });
        Dispatcher::new()
            .with(Verb::Start, bind(Arc::clone(&container), Container::start))
            .with(Verb::Stop, bind(Arc::clone(&container), Container::stop))
            .with(Verb::Get, bind(container, Container::get))
            .serve()
    }
}

struct Container {
    id: String,
    engine: Arc<dyn ContainerEngine>,
    events: EventHub,
}

impl Container {
    fn start(&self, _: &Message) -> HandlerResult {
        self.engine.start(&self.id)?;
        self.events.log(format!("started container {}", self.id));
        Ok(Reply::Empty)
    }

    fn stop(&self, _: &Message) -> HandlerResult {
        self.engine.stop(&self.id)?;
        self.events.log(format!("stopped container {}", self.id));
        Ok(Reply::Empty)
    }

    fn get(&self, _: &Message) -> HandlerResult {
        let description = self.engine.inspect(&self.id)?;
        Ok(Reply::Text(
            serde_json::to_string(&description).map_err(EngineError::from)?,
        ))
    }
}
