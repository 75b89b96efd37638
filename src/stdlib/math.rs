//! The `math` namespace: float math over the shared Num variant.

use super::common::*;
use crate::error::{Error, Result};
use crate::value::Value;
use rand::Rng;

pub fn abs(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 1)?;
    Ok(Value::Num(as_num(&args[0])?.abs()))
}

pub fn ceil(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 1)?;
    Ok(Value::Num(as_num(&args[0])?.ceil()))
}

pub fn floor(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 1)?;
    Ok(Value::Num(as_num(&args[0])?.floor()))
}

/// Usage: round(2.5) -> 3
pub fn round(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 1)?;
    Ok(Value::Num(as_num(&args[0])?.round()))
}

pub fn sqrt(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 1)?;
    let n = as_num(&args[0])?;
    if n < 0.0 {
        return Err(Error::Domain(format!("Square root of negative number: {}", n)));
    }
    Ok(Value::Num(n.sqrt()))
}

pub fn pow(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 2)?;
    Ok(Value::Num(as_num(&args[0])?.powf(as_num(&args[1])?)))
}

pub fn exp(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 1)?;
    Ok(Value::Num(as_num(&args[0])?.exp()))
}

/// Natural logarithm.
pub fn log(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 1)?;
    let n = as_num(&args[0])?;
    if n <= 0.0 {
        return Err(Error::Domain(format!("Logarithm of non-positive number: {}", n)));
    }
    Ok(Value::Num(n.ln()))
}

pub fn sin(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 1)?;
    Ok(Value::Num(as_num(&args[0])?.sin()))
}

pub fn cos(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 1)?;
    Ok(Value::Num(as_num(&args[0])?.cos()))
}

pub fn tan(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 1)?;
    Ok(Value::Num(as_num(&args[0])?.tan()))
}

pub fn asin(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 1)?;
    inverse_trig(as_num(&args[0])?, f64::asin)
}

pub fn acos(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 1)?;
    inverse_trig(as_num(&args[0])?, f64::acos)
}

pub fn atan(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 1)?;
    Ok(Value::Num(as_num(&args[0])?.atan()))
}

fn inverse_trig(n: f64, f: fn(f64) -> f64) -> Result<Value> {
    if !(-1.0..=1.0).contains(&n) {
        return Err(Error::Domain(format!("Value out of range [-1, 1]: {}", n)));
    }
    Ok(Value::Num(f(n)))
}

/// Usage: avg([1, 2, 3]) -> 2
pub fn avg(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 1)?;
    let items = forced_items(as_arr(&args[0])?)?;
    if items.is_empty() {
        return Err(Error::Domain("Expected a non-empty array".to_string()));
    }
    let mut total = 0.0;
    for item in &items {
        total += as_num(item)?;
    }
    Ok(Value::Num(total / items.len() as f64))
}

/// Usage: sum([1, 2, 3]) -> 6
pub fn sum(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 1)?;
    let items = forced_items(as_arr(&args[0])?)?;
    let mut total = 0.0;
    for item in &items {
        total += as_num(item)?;
    }
    Ok(Value::Num(total))
}

/// Usage: clamp(11, 1, 10) -> 10
pub fn clamp(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 3)?;
    let n = as_num(&args[0])?;
    let low = as_num(&args[1])?;
    let high = as_num(&args[2])?;
    if low > high {
        return Err(Error::Domain(format!("Invalid clamp range: {} > {}", low, high)));
    }
    Ok(Value::Num(n.clamp(low, high)))
}

pub fn modulo(args: &[Value]) -> Result<Value> {
    super::core::modulo(args)
}

/// The base-2 exponent of the IEEE-754 decomposition (frexp semantics).
/// Usage: exponent(8) -> 4
pub fn exponent(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 1)?;
    let (_, exponent) = frexp(as_num(&args[0])?);
    Ok(Value::Num(exponent as f64))
}

/// The fraction in [0.5, 1) of the IEEE-754 decomposition.
/// Usage: mantissa(8) -> 0.5
pub fn mantissa(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 1)?;
    let (mantissa, _) = frexp(as_num(&args[0])?);
    Ok(Value::Num(mantissa))
}

fn frexp(n: f64) -> (f64, i32) {
    if n == 0.0 || !n.is_finite() {
        return (n, 0);
    }
    let exponent = n.abs().log2().floor() as i32 + 1;
    let mantissa = n / (2.0f64).powi(exponent);
    (mantissa, exponent)
}

/// A uniform double in [0, 1).
pub fn random(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 0)?;
    Ok(Value::Num(rand::thread_rng().gen::<f64>()))
}

/// A uniform integer in [0, bound).
/// Usage: randomInt(10) -> 0..9
pub fn random_int(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 1)?;
    let bound = as_int(&args[0])?;
    if bound <= 0 {
        return Err(Error::Domain(format!("Invalid bound: {}", bound)));
    }
    Ok(Value::Num(rand::thread_rng().gen_range(0..bound) as f64))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(n: f64) -> Value {
        Value::Num(n)
    }

    #[test]
    fn test_rounding_family() {
        assert_eq!(ceil(&[num(1.2)]).unwrap(), num(2.0));
        assert_eq!(floor(&[num(1.8)]).unwrap(), num(1.0));
        assert_eq!(round(&[num(2.5)]).unwrap(), num(3.0));
        assert_eq!(abs(&[num(-3.0)]).unwrap(), num(3.0));
    }

    #[test]
    fn test_mantissa_exponent_decomposition() {
        assert_eq!(exponent(&[num(8.0)]).unwrap(), num(4.0));
        assert_eq!(mantissa(&[num(8.0)]).unwrap(), num(0.5));
        // n == mantissa * 2^exponent
        for n in [1.0, 3.5, 100.0, 0.125] {
            let m = match mantissa(&[num(n)]).unwrap() {
                Value::Num(m) => m,
                _ => unreachable!(),
            };
            let e = match exponent(&[num(n)]).unwrap() {
                Value::Num(e) => e,
                _ => unreachable!(),
            };
            assert!((m * (2.0f64).powi(e as i32) - n).abs() < 1e-12);
            assert!((0.5..1.0).contains(&m));
        }
    }

    #[test]
    fn test_aggregates() {
        let input = Value::array(vec![num(1.0), num(2.0), num(3.0)]);
        assert_eq!(avg(&[input.clone()]).unwrap(), num(2.0));
        assert_eq!(sum(&[input]).unwrap(), num(6.0));
        assert_eq!(sum(&[Value::array(vec![])]).unwrap(), num(0.0));
        assert!(avg(&[Value::array(vec![])]).is_err());
    }

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(&[num(11.0), num(1.0), num(10.0)]).unwrap(), num(10.0));
        assert_eq!(clamp(&[num(-1.0), num(1.0), num(10.0)]).unwrap(), num(1.0));
        assert_eq!(clamp(&[num(5.0), num(1.0), num(10.0)]).unwrap(), num(5.0));
    }

    #[test]
    fn test_domain_errors() {
        assert!(sqrt(&[num(-1.0)]).is_err());
        assert!(log(&[num(0.0)]).is_err());
        assert!(asin(&[num(2.0)]).is_err());
    }

    #[test]
    fn test_random_ranges() {
        for _ in 0..100 {
            match random(&[]).unwrap() {
                Value::Num(n) => assert!((0.0..1.0).contains(&n)),
                _ => unreachable!(),
            }
            match random_int(&[num(10.0)]).unwrap() {
                Value::Num(n) => {
                    assert!((0.0..10.0).contains(&n));
                    assert_eq!(n.fract(), 0.0);
                }
                _ => unreachable!(),
            }
        }
    }
}
