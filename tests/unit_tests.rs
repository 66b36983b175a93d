//! Integration tests for synchronous dispatch.
//!
//! Native functions are bound, exposed as host functions and called the way
//! host code would call them: with host values, receiving host values or
//! host exceptions.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use hostbind::num_enum::{IntoPrimitive, TryFromPrimitive};
use hostbind::prelude::*;
use hostbind::{BindError, HostErrorKind, host_enum};
use parking_lot::Mutex;

fn add() -> HostFunction {
    BoundFunction::new("Add", |a: i32, b: i32| a + b).to_host_function()
}

// =============================================================================
// End-to-end
// =============================================================================

#[test]
fn test_add_end_to_end() {
    let add = add();
    assert_eq!(add.call(&[2.into(), 3.into()]).unwrap(), HostValue::Number(5.0));

    let err = add.call(&[2.into()]).unwrap_err();
    assert_eq!(err.kind, HostErrorKind::TypeError);
    assert_eq!(err.message, "Wrong number of arguments");

    let err = add.call(&[2.into(), "x".into()]).unwrap_err();
    assert_eq!(err.kind, HostErrorKind::TypeError);
    assert_eq!(err.message, "Type of arg1 is mismatched");
}

#[test]
fn test_arity_is_enforced_for_every_count() {
    let add = add();
    for count in [0usize, 1, 3, 4] {
        let args: Vec<HostValue> = (0..count).map(|i| HostValue::from(i as i32)).collect();
        let err = add.call(&args).unwrap_err();
        assert_eq!(err.message, "Wrong number of arguments", "count {count}");
    }
}

#[test]
fn test_mismatch_short_circuits_before_native() {
    let calls = Arc::new(AtomicUsize::new(0));
    let c = calls.clone();
    let f = BoundFunction::new("count", move |_a: String, _b: bool, _c: f64| {
        c.fetch_add(1, Ordering::SeqCst);
    })
    .to_host_function();

    let err = f.call(&[1.into(), 2.into(), "x".into()]).unwrap_err();
    assert_eq!(err.message, "Type of arg0 is mismatched");
    let err = f.call(&["a".into(), true.into(), "x".into()]).unwrap_err();
    assert_eq!(err.message, "Type of arg2 is mismatched");
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    f.call(&["a".into(), true.into(), 1.5.into()]).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_integer_range_and_integrality() {
    let f = BoundFunction::new("byte", |b: u8| b).to_host_function();
    assert_eq!(f.call(&[255.into()]).unwrap(), HostValue::Number(255.0));
    assert!(f.call(&[256.into()]).is_err());
    assert!(f.call(&[(-1).into()]).is_err());
    assert!(f.call(&[1.5.into()]).is_err());
}

// =============================================================================
// Defaults
// =============================================================================

#[test]
fn test_trailing_defaults() {
    let f = BoundFunction::new("greet", |name: String, punct: String, times: u32| {
        format!("{name}{}", punct.repeat(times as usize))
    })
    .with_defaults((None, Some("!".to_string()), Some(1)))
    .unwrap()
    .to_host_function();

    assert_eq!(f.call(&["hi".into()]).unwrap(), HostValue::from("hi!"));
    assert_eq!(f.call(&["hi".into(), "?".into()]).unwrap(), HostValue::from("hi?"));
    assert_eq!(
        f.call(&["hi".into(), "?".into(), 3.into()]).unwrap(),
        HostValue::from("hi???")
    );
    assert!(f.call(&[]).is_err());
}

#[test]
fn test_non_trailing_defaults_rejected() {
    let err = BoundFunction::new("f", |a: i32, b: i32| a - b)
        .with_defaults((Some(1), None))
        .unwrap_err();
    assert_eq!(err, BindError::InvalidDefaults);
}

#[test]
fn test_call_site_defaults() {
    let f = BoundFunction::new("sub", |a: i32, b: i32| a - b);
    let value = f
        .invoke_with_defaults(&CallContext::new(&[10.into()]), &(None, Some(4)))
        .unwrap();
    assert_eq!(value, HostValue::Number(6.0));
}

// =============================================================================
// Methods
// =============================================================================

struct Counter {
    count: i64,
}

impl Counter {
    fn get(&self) -> i64 {
        self.count
    }

    fn add(&mut self, by: i64) -> i64 {
        self.count += by;
        self.count
    }

    fn into_report(self, label: String) -> String {
        format!("{label}: {}", self.count)
    }
}

#[test]
fn test_method_receivers() {
    let shared = Arc::new(Counter { count: 3 });
    let get = BoundFunction::method("get", shared, Counter::get).to_host_function();
    assert_eq!(get.call(&[]).unwrap(), HostValue::Number(3.0));

    let counter = Arc::new(Mutex::new(Counter { count: 0 }));
    let add = BoundFunction::method_mut("add", counter.clone(), Counter::add).to_host_function();
    add.call(&[5.into()]).unwrap();
    add.call(&[2.into()]).unwrap();
    assert_eq!(counter.lock().count, 7);

    let report = BoundFunction::method_once("report", Counter { count: 9 }, Counter::into_report)
        .to_host_function();
    assert_eq!(report.call(&["total".into()]).unwrap(), HostValue::from("total: 9"));
    let err = report.call(&["again".into()]).unwrap_err();
    assert_eq!(err.kind, HostErrorKind::Error);
    assert!(err.message.contains("consumed"));
}

// =============================================================================
// Errors from native code
// =============================================================================

#[test]
fn test_native_errors_become_host_errors() {
    let parse = BoundFunction::new("parse", |s: String| -> anyhow::Result<i32> {
        let n = s.trim().parse::<i32>()?;
        Ok(n)
    })
    .to_host_function();
    assert_eq!(parse.call(&[" 12 ".into()]).unwrap(), HostValue::Number(12.0));
    let err = parse.call(&["twelve".into()]).unwrap_err();
    assert_eq!(err.kind, HostErrorKind::Error);
    assert!(err.message.contains("invalid digit"));
}

#[test]
fn test_host_exception_passes_through_callback() {
    let thrower = HostFunction::new("thrower", |_| Err(HostError::range_error("out of range")));
    let apply = BoundFunction::new("apply", |cb: Callback<(i32,), i32>| cb.call((1,)))
        .to_host_function();
    let err = apply.call(&[thrower.into()]).unwrap_err();
    assert_eq!(err, HostError::range_error("out of range"));
}

// =============================================================================
// Conversions
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
enum Shape {
    Circle = 1,
    Square = 2,
}

host_enum!(Shape);

#[test]
fn test_enum_parameters() {
    let sides = BoundFunction::new("sides", |s: Shape| match s {
        Shape::Circle => 0u32,
        Shape::Square => 4,
    })
    .to_host_function();
    assert_eq!(sides.call(&[2.into()]).unwrap(), HostValue::Number(4.0));
    let err = sides.call(&[3.into()]).unwrap_err();
    assert_eq!(err.message, "Type of arg0 is mismatched");
}

#[test]
fn test_sequences_and_options() {
    let total = BoundFunction::new("total", |xs: Vec<f64>, scale: Option<f64>| {
        xs.iter().sum::<f64>() * scale.unwrap_or(1.0)
    })
    .to_host_function();
    let xs = HostValue::Array(vec![1.into(), 2.into(), 3.5.into()]);
    assert_eq!(total.call(&[xs.clone(), HostValue::Null]).unwrap(), HostValue::Number(6.5));
    assert_eq!(total.call(&[xs, 2.into()]).unwrap(), HostValue::Number(13.0));

    let bad = HostValue::Array(vec![1.into(), "two".into()]);
    assert!(total.call(&[bad, HostValue::Undefined]).is_err());
}

#[test]
fn test_callback_invocation() {
    let twice = BoundFunction::new("twice", |f: Callback<(i32,), i32>, x: i32| {
        let once = f.call((x,))?;
        f.call((once,))
    })
    .to_host_function();
    let inc = HostFunction::new("inc", |ctx| {
        let n = ctx.get(0).as_number().unwrap_or(0.0);
        Ok(HostValue::Number(n + 1.0))
    });
    assert_eq!(twice.call(&[inc.into(), 5.into()]).unwrap(), HostValue::Number(7.0));
}

#[test]
fn test_variant_map_parameter() {
    let describe = BoundFunction::new("describe", |m: VariantMap| {
        let name: String = m.get_as("name")?;
        let age: u32 = m.get_as("age")?;
        Ok::<_, NativeError>(format!("{name} ({age})"))
    })
    .to_host_function();
    let person = HostObject::new().with("name", "Ada").with("age", 36);
    assert_eq!(describe.call(&[person.into()]).unwrap(), HostValue::from("Ada (36)"));
}

#[test]
fn test_bound_function_metadata() {
    let f = BoundFunction::new("clamp", |x: f64, lo: f64, hi: f64| x.clamp(lo, hi))
        .with_defaults((None, Some(0.0), Some(1.0)))
        .unwrap();
    assert_eq!(f.name(), "clamp");
    assert_eq!(f.arity(), 3);
    assert_eq!(f.required_arity(), 1);
    let host = f.into_host();
    assert_eq!(host.as_function().unwrap().name(), "clamp");
}
