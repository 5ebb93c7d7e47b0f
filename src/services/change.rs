/// Day-over-day percentage change, rounded to 2 decimal places.
///
/// An absent or non-positive previous price yields 0 rather than a
/// division error; the UI shows "no change" until a second successful
/// fetch establishes a baseline.
pub fn percent_change(current: f64, previous: Option<f64>) -> f64 {
    let Some(previous) = previous else {
        return 0.0;
    };

    if previous <= 0.0 {
        return 0.0;
    }

    let change = (current - previous) / previous * 100.0;
    (change * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ten_percent_up() {
        assert_eq!(percent_change(110.0, Some(100.0)), 10.0);
    }

    #[test]
    fn ten_percent_down() {
        assert_eq!(percent_change(90.0, Some(100.0)), -10.0);
    }

    #[test]
    fn zero_previous_is_zero_change() {
        assert_eq!(percent_change(85.17, Some(0.0)), 0.0);
    }

    #[test]
    fn absent_previous_is_zero_change() {
        assert_eq!(percent_change(85.17, None), 0.0);
    }

    #[test]
    fn rounds_to_two_decimals() {
        // 1/3 of a percent up
        assert_eq!(percent_change(100.3333, Some(100.0)), 0.33);
    }
}
