#![allow(dead_code)]

use std::{
    future::Future,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use futures_channel::oneshot;
use weave_di::{
    from_fn, Argument, CallArgs, Constructible, DynError, Instance, Invocable, StaticRegistry,
    UnknownMethod,
};

pub const MODULE: &str = "example_classes";

#[derive(Debug)]
pub struct Foo {
    pub name: String,
}

pub struct Bar {
    pub foo: Arc<Foo>,
    pub label: Option<String>,
}

#[derive(Debug, Default)]
pub struct Spam {
    pub ham: Mutex<Option<String>>,
    pub eggs: Mutex<Vec<i64>>,
}
impl Spam {
    pub fn ham(&self) -> Option<String> {
        self.ham.lock().unwrap().clone()
    }

    pub fn eggs(&self) -> Vec<i64> {
        self.eggs.lock().unwrap().clone()
    }
}
impl Invocable for Spam {
    fn invoke(&self, method: &str, args: CallArgs) -> Result<Option<Instance>, DynError> {
        match method {
            "set_ham" => {
                let ham = args
                    .get(0, "ham")
                    .and_then(Argument::as_str)
                    .ok_or("set_ham needs a ham")?;
                *self.ham.lock().unwrap() = Some(ham.to_string());
                Ok(None)
            }
            "set_eggs" => {
                let eggs = args
                    .get(0, "eggs")
                    .and_then(Argument::as_sequence)
                    .ok_or("set_eggs needs a list of eggs")?;
                *self.eggs.lock().unwrap() = eggs.iter().filter_map(Argument::as_i64).collect();
                Ok(None)
            }
            _ => Err(UnknownMethod::of::<Self>(method).into()),
        }
    }
}

/// Builds other services through its methods
pub struct Factory {
    pub prefix: String,
}
impl Invocable for Factory {
    fn invoke(&self, method: &str, args: CallArgs) -> Result<Option<Instance>, DynError> {
        match method {
            "get_foo" => Ok(Some(Instance::new(Foo {
                name: self.prefix.clone(),
            }))),
            "get_spam" => {
                let spam = Spam::default();
                if let Some(ham) = args.get(0, "ham").and_then(Argument::as_str) {
                    *spam.ham.lock().unwrap() = Some(format!("{}{ham}", self.prefix));
                }
                Ok(Some(Instance::invocable(spam)))
            }
            "get_more_spam" => {
                let ham = args
                    .named("ham")
                    .and_then(Argument::as_str)
                    .ok_or("get_more_spam needs a ham")?;
                let eggs = args
                    .named("eggs")
                    .and_then(Argument::as_i64)
                    .ok_or("get_more_spam needs eggs")?;
                let spam = Spam {
                    ham: Mutex::new(Some(ham.to_string())),
                    eggs: Mutex::new(vec![eggs]),
                };
                Ok(Some(Instance::invocable(spam)))
            }
            "get_nothing" => Ok(None),
            _ => Err(UnknownMethod::of::<Self>(method).into()),
        }
    }
}

/// Keeps every service handed to it
pub struct Node {
    pub dependencies: Vec<Instance>,
}

/// Builds [`Node`]s and counts how often it was called
pub struct CountedNode {
    pub built: Arc<AtomicUsize>,
}
impl Constructible for CountedNode {
    type Provides = Node;

    fn construct(
        &self,
        args: CallArgs,
    ) -> impl Future<Output = Result<Self::Provides, impl Into<DynError>>> + Send + '_ {
        async move {
            self.built.fetch_add(1, Ordering::SeqCst);
            let dependencies = args
                .args
                .iter()
                .filter_map(Argument::as_instance)
                .cloned()
                .collect();
            Ok::<_, DynError>(Node { dependencies })
        }
    }
}

pub struct Signal;

/// Only finishes once the matching [`Signaller`] was constructed
pub struct Waiter {
    pub receiver: Mutex<Option<oneshot::Receiver<()>>>,
}
impl Constructible for Waiter {
    type Provides = Signal;

    fn construct(
        &self,
        _args: CallArgs,
    ) -> impl Future<Output = Result<Self::Provides, impl Into<DynError>>> + Send + '_ {
        async move {
            let receiver = self
                .receiver
                .lock()
                .unwrap()
                .take()
                .ok_or("the waiter can only be built once")?;
            receiver.await?;
            Ok::<_, DynError>(Signal)
        }
    }
}

pub struct Signaller {
    pub sender: Mutex<Option<oneshot::Sender<()>>>,
}
impl Constructible for Signaller {
    type Provides = Signal;

    fn construct(
        &self,
        _args: CallArgs,
    ) -> impl Future<Output = Result<Self::Provides, impl Into<DynError>>> + Send + '_ {
        async move {
            if let Some(sender) = self.sender.lock().unwrap().take() {
                let _ = sender.send(());
            }
            Ok::<_, DynError>(Signal)
        }
    }
}

/// Never finishes
pub struct Pending;
impl Constructible for Pending {
    type Provides = Signal;

    fn construct(
        &self,
        _args: CallArgs,
    ) -> impl Future<Output = Result<Self::Provides, impl Into<DynError>>> + Send + '_ {
        async move {
            futures::future::pending::<()>().await;
            Ok::<_, DynError>(Signal)
        }
    }
}

/// Registry with all example classes
///
/// Returns the counter of the `Node` class as well
pub fn registry() -> (StaticRegistry, Arc<AtomicUsize>) {
    let built = Arc::new(AtomicUsize::new(0));
    let (sender, receiver) = oneshot::channel();

    let registry = StaticRegistry::new()
        .add_constructor(
            MODULE,
            "Foo",
            from_fn(|args: CallArgs| -> Result<Instance, DynError> {
                let name = args.get(0, "name").and_then(Argument::as_str).unwrap_or("foo");
                Ok(Instance::new(Foo {
                    name: name.to_string(),
                }))
            }),
        )
        .add_constructor(
            MODULE,
            "Bar",
            from_fn(|args: CallArgs| -> Result<Instance, DynError> {
                let foo = args
                    .get(0, "foo")
                    .and_then(|arg| arg.service::<Foo>())
                    .ok_or("bar needs a foo")?;
                let label = args
                    .get(1, "label")
                    .and_then(Argument::as_str)
                    .map(str::to_string);
                Ok(Instance::new(Bar { foo, label }))
            }),
        )
        .add_constructor(
            MODULE,
            "Spam",
            from_fn(|_: CallArgs| Ok::<_, DynError>(Instance::invocable(Spam::default()))),
        )
        .add_constructor(
            MODULE,
            "Factory",
            from_fn(|args: CallArgs| -> Result<Instance, DynError> {
                let prefix = args.get(0, "prefix").and_then(Argument::as_str).unwrap_or("");
                Ok(Instance::invocable(Factory {
                    prefix: prefix.to_string(),
                }))
            }),
        )
        .add_constructor(
            MODULE,
            "Failing",
            from_fn(|_: CallArgs| Err::<Instance, _>("boom")),
        )
        .add_constructor(
            MODULE,
            "Node",
            CountedNode {
                built: built.clone(),
            },
        )
        .add_constructor(
            MODULE,
            "Waiter",
            Waiter {
                receiver: Mutex::new(Some(receiver)),
            },
        )
        .add_constructor(
            MODULE,
            "Signaller",
            Signaller {
                sender: Mutex::new(Some(sender)),
            },
        )
        .add_constructor(MODULE, "Pending", Pending)
        .add_symbol(MODULE, Some("VERSION"), Instance::new("1.0".to_string()))
        .add_symbol("settings", None, Instance::new(8080_u16));

    (registry, built)
}
