use chrono::{Datelike, Local, NaiveDate};

/// Clock capability injected into the pipeline driver so output naming is
/// testable without touching the real date.
pub trait Clock {
    fn today(&self) -> NaiveDate;
}

/// Wall-clock implementation used by the CLI
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Filename stamp in the `day_month_year` form the downstream consumers of
/// the datasets expect (no zero padding).
pub fn file_stamp(date: NaiveDate) -> String {
    format!("{}_{}_{}", date.day(), date.month(), date.year())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_stamp_has_no_zero_padding() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(file_stamp(date), "7_3_2024");
    }
}
