#![expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]

use pretty_assertions::assert_eq;
use proptest::prelude::*;

use lumo_value::FailureKind;

use super::*;

const CHECKED: NumericArithmetic = NumericArithmetic::new(Overflow::Checked);
const WRAPPING: NumericArithmetic = NumericArithmetic::new(Overflow::Wrapping);
const SATURATING: NumericArithmetic = NumericArithmetic::new(Overflow::Saturating);

fn int(n: i64) -> Value {
    Value::int(n)
}

#[test]
fn test_int_ops_stay_integral() {
    assert_eq!(CHECKED.add(&int(2), &int(3)).unwrap().as_int(), Some(5));
    assert_eq!(CHECKED.sub(&int(2), &int(3)).unwrap().as_int(), Some(-1));
    assert_eq!(CHECKED.mul(&int(4), &int(3)).unwrap().as_int(), Some(12));
    assert_eq!(CHECKED.rem(&int(-7), &int(3)).unwrap().as_int(), Some(-1));
}

#[test]
fn test_exact_division_stays_int() {
    assert_eq!(CHECKED.div(&int(6), &int(3)).unwrap().as_int(), Some(2));
    let v = CHECKED.div(&int(7), &int(2)).unwrap();
    assert_eq!(v.as_number().map(Number::is_float), Some(true));
    assert_eq!(v, Value::float(3.5));
}

#[test]
fn test_float_promotion() {
    let v = CHECKED.add(&int(1), &Value::float(0.5)).unwrap();
    assert_eq!(v, Value::float(1.5));
    assert!(v.as_number().unwrap().is_float());
}

#[test]
fn test_division_by_zero() {
    let err = CHECKED.div(&int(1), &int(0)).unwrap_err();
    assert_eq!(err.category(), FailureKind::ArithmeticError);
    assert_eq!(err.message, "division by zero");
    assert!(CHECKED.div(&Value::float(1.0), &Value::float(0.0)).is_err());
    let err = CHECKED.rem(&int(1), &int(0)).unwrap_err();
    assert_eq!(err.message, "modulo by zero");
}

#[test]
fn test_overflow_policies() {
    let max = int(i64::MAX);
    let err = CHECKED.add(&max, &int(1)).unwrap_err();
    assert_eq!(err.category(), FailureKind::ArithmeticError);
    assert_eq!(WRAPPING.add(&max, &int(1)).unwrap().as_int(), Some(i64::MIN));
    assert_eq!(SATURATING.add(&max, &int(1)).unwrap().as_int(), Some(i64::MAX));
    assert!(CHECKED.negate(&int(i64::MIN)).is_err());
    assert!(CHECKED.div(&int(i64::MIN), &int(-1)).is_err());
    assert_eq!(SATURATING.div(&int(i64::MIN), &int(-1)).unwrap().as_int(), Some(i64::MAX));
    assert_eq!(CHECKED.rem(&int(i64::MIN), &int(-1)).unwrap().as_int(), Some(0));
}

#[test]
fn test_string_concatenation() {
    let v = CHECKED.add(&Value::from("Hello, "), &Value::from("World")).unwrap();
    assert_eq!(v, Value::from("Hello, World"));
    let v = CHECKED.add(&Value::from("n="), &int(3)).unwrap();
    assert_eq!(v, Value::from("n=3"));
    let v = CHECKED.add(&Value::float(1.5), &Value::from("x")).unwrap();
    assert_eq!(v, Value::from("1.5x"));
}

#[test]
fn test_string_concatenation_rejects_other_kinds() {
    let err = CHECKED.add(&Value::from("a"), &Value::Nil).unwrap_err();
    assert_eq!(err.category(), FailureKind::TypeError);
    assert_eq!(err.message, "operator `+` cannot be applied to string and nil");
    assert!(CHECKED.add(&Value::Bool(true), &Value::from("a")).is_err());
    assert!(CHECKED.add(&Value::from("a"), &Value::empty_object()).is_err());
}

#[test]
fn test_non_numeric_operands_fail() {
    let err = CHECKED.add(&Value::Nil, &int(1)).unwrap_err();
    assert_eq!(err.category(), FailureKind::TypeError);
    assert_eq!(err.message, "operator `+` cannot be applied to nil and number");
    assert!(CHECKED.mul(&Value::Bool(true), &int(1)).is_err());
    assert!(CHECKED.negate(&Value::from("x")).is_err());
}

#[test]
fn test_compare() {
    assert_eq!(CHECKED.compare(&int(1), &Value::float(1.5)).unwrap(), Ordering::Less);
    assert_eq!(
        CHECKED.compare(&Value::from("b"), &Value::from("a")).unwrap(),
        Ordering::Greater
    );
    let err = CHECKED
        .compare(&Value::float(f64::NAN), &int(1))
        .unwrap_err();
    assert_eq!(err.category(), FailureKind::TypeError);
    assert!(CHECKED.compare(&int(1), &Value::from("1")).is_err());
}

proptest! {
    #[test]
    fn prop_wrapping_matches_i64(a in any::<i64>(), b in any::<i64>()) {
        prop_assert_eq!(WRAPPING.add(&int(a), &int(b)).unwrap().as_int(), Some(a.wrapping_add(b)));
        prop_assert_eq!(WRAPPING.mul(&int(a), &int(b)).unwrap().as_int(), Some(a.wrapping_mul(b)));
    }

    #[test]
    fn prop_checked_agrees_when_no_overflow(a in -1_000_000i64..1_000_000, b in -1_000_000i64..1_000_000) {
        prop_assert_eq!(CHECKED.add(&int(a), &int(b)).unwrap().as_int(), Some(a + b));
        prop_assert_eq!(CHECKED.sub(&int(a), &int(b)).unwrap().as_int(), Some(a - b));
    }

    #[test]
    fn prop_compare_is_antisymmetric(a in any::<i64>(), b in -1e12f64..1e12) {
        let ab = CHECKED.compare(&int(a), &Value::float(b)).unwrap();
        let ba = CHECKED.compare(&Value::float(b), &int(a)).unwrap();
        prop_assert_eq!(ab, ba.reverse());
    }

    #[test]
    fn prop_exact_division_round_trips(a in -10_000i64..10_000, b in 1i64..100) {
        let product = CHECKED.mul(&int(a), &int(b)).unwrap();
        prop_assert_eq!(CHECKED.div(&product, &int(b)).unwrap().as_int(), Some(a));
    }
}
