use crate::config::types::{HarnessError, Result};

fn gcd(mut a: i64, mut b: i64) -> i64 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

/// Smallest positive number divisible by every integer in `[low, high]`
pub fn smallest_common_multiple(low: i32, high: i32) -> Result<i64> {
    if low < 1 {
        return Err(HarnessError::InvalidTestCase(format!(
            "interval must start at 1 or above, got {}",
            low
        )));
    }
    if low > high {
        return Err(HarnessError::InvalidTestCase(format!(
            "interval [{}, {}] is empty",
            low, high
        )));
    }

    let mut acc: i64 = 1;
    for n in low as i64..=high as i64 {
        let step = n / gcd(acc, n);
        acc = acc.checked_mul(step).ok_or_else(|| {
            HarnessError::InvalidTestCase(format!(
                "lcm of [{}, {}] overflows a 64-bit integer",
                low, high
            ))
        })?;
    }
    Ok(acc)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_values() {
        assert_eq!(smallest_common_multiple(1, 1).unwrap(), 1);
        assert_eq!(smallest_common_multiple(1, 10).unwrap(), 2520);
        assert_eq!(smallest_common_multiple(5, 7).unwrap(), 210);
        assert_eq!(smallest_common_multiple(1, 22).unwrap(), 232_792_560);
    }

    #[test]
    fn every_member_divides_result() {
        for low in 1..=22 {
            for high in low..=22 {
                let lcm = smallest_common_multiple(low, high).unwrap();
                assert!((low..=high).all(|n| lcm % n as i64 == 0), "[{low}, {high}]");
            }
        }
    }

    #[test]
    fn rejects_reversed_and_non_positive_intervals() {
        assert!(matches!(
            smallest_common_multiple(5, 4),
            Err(HarnessError::InvalidTestCase(_))
        ));
        assert!(smallest_common_multiple(0, 4).is_err());
    }

    #[test]
    fn overflow_is_an_error_not_a_wrap() {
        assert!(smallest_common_multiple(1, 100).is_err());
    }
}
