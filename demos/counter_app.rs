//! Complete counter application demonstrating all features together

use scopestore::{
    Action, LoggingMiddleware, Reducer, ReducerFn, Scope, State, Store, StoreError,
};

#[derive(Clone, Debug, PartialEq)]
struct Counter {
    count: i32,
    step: i32,
}

impl Scope for Counter {
    const KEY: &'static str = "counter";
}

#[derive(Clone, Debug, PartialEq, Default)]
struct History(Vec<i32>);

impl Scope for History {
    const KEY: &'static str = "history";
}

struct CounterReducer;

impl Reducer for CounterReducer {
    type State = Counter;

    fn key(&self) -> &str {
        Counter::KEY
    }

    fn initial_state(&self) -> Counter {
        Counter { count: 0, step: 1 }
    }

    fn reduce(&self, state: &Counter, action: &Action) -> Option<Counter> {
        match action.action_type() {
            "INCREMENT" => Some(Counter {
                count: state.count + state.step,
                ..state.clone()
            }),
            "DECREMENT" => Some(Counter {
                count: state.count - state.step,
                ..state.clone()
            }),
            "SET_STEP" => action.payload::<i32>().map(|step| Counter {
                step: *step,
                ..state.clone()
            }),
            _ => None,
        }
    }
}

fn main() -> Result<(), StoreError> {
    env_logger::init();
    println!("=== Complete Counter Application ===\n");

    println!("1. Building the store");
    let store = Store::builder()
        .reducer(CounterReducer)?
        .reducer(
            ReducerFn::scoped(History::default(), |history: &History, action: &Action| -> Option<History> {
                let mut entries = history.0.clone();
                entries.push(*action.payload::<i32>()?);
                Some(History(entries))
            })
            .on(["RECORD"]),
        )?
        .middleware(LoggingMiddleware::new())
        .build()?;

    println!("\n2. Subscribing");
    store.add_scope_listener(|counter: &Counter| {
        println!("   [Counter] count: {}, step: {}", counter.count, counter.step);
    })?;
    store.add_projection_listener(
        |state: &State| state.get_scope::<Counter>().map_or(0, |c| c.count) % 2 == 0,
        |even: &bool| println!("   [Parity] even: {}", even),
    )?;

    // Record every count into the history scope
    let recorder = store.clone();
    store.add_scope_listener(move |counter: &Counter| {
        if let Err(err) = recorder.dispatch(Action::with_payload("RECORD", counter.count)) {
            eprintln!("   failed to record: {}", err);
        }
    })?;

    println!("\n3. Incrementing...");
    for _ in 0..3 {
        store.dispatch(Action::new("INCREMENT"))?;
    }

    println!("\n4. Changing step size to 5");
    store.dispatch(Action::with_payload("SET_STEP", 5i32))?;

    println!("\n5. Decrementing...");
    for _ in 0..2 {
        store.dispatch(Action::new("DECREMENT"))?;
    }

    if let Some(history) = store.scope::<History>() {
        println!("\n6. History: {:?}", history.0);
    }

    println!("\n7. Resetting...");
    store.reset(State::new())?;

    if let Some(history) = store.scope::<History>() {
        println!("\n8. Final history: {:?}", history.0);
    }

    store.shutdown();
    println!("\n✓ Counter application complete!");
    Ok(())
}
