//! Metric extraction from trainer log text.
//!
//! The trainer prints lines such as `Eval_AverageReturn : 4713.65`. Labels
//! are matched case-sensitively, whitespace around the colon is optional, and
//! the value may carry a sign or an exponent.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Log labels the drivers understand
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    EvalAverageReturn,
    EvalStdReturn,
    /// Return of the expert's own rollouts, logged on the first iteration
    InitialDataCollectionAverageReturn,
}

impl Metric {
    pub fn label(self) -> &'static str {
        match self {
            Metric::EvalAverageReturn => "Eval_AverageReturn",
            Metric::EvalStdReturn => "Eval_StdReturn",
            Metric::InitialDataCollectionAverageReturn => "Initial_DataCollection_AverageReturn",
        }
    }

    fn pattern(self) -> &'static Regex {
        match self {
            Metric::EvalAverageReturn => Lazy::force(&EVAL_AVERAGE_RETURN),
            Metric::EvalStdReturn => Lazy::force(&EVAL_STD_RETURN),
            Metric::InitialDataCollectionAverageReturn => Lazy::force(&INITIAL_AVERAGE_RETURN),
        }
    }
}

const FLOAT: &str = r"[-+]?(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][-+]?\d+)?";

fn label_pattern(label: &str) -> Regex {
    // \b keeps `Eval_AverageReturn` from matching inside longer labels
    Regex::new(&format!(r"\b{}\s*:\s*({})", regex::escape(label), FLOAT))
        .expect("metric pattern is valid")
}

static EVAL_AVERAGE_RETURN: Lazy<Regex> = Lazy::new(|| label_pattern(Metric::EvalAverageReturn.label()));
static EVAL_STD_RETURN: Lazy<Regex> = Lazy::new(|| label_pattern(Metric::EvalStdReturn.label()));
static INITIAL_AVERAGE_RETURN: Lazy<Regex> =
    Lazy::new(|| label_pattern(Metric::InitialDataCollectionAverageReturn.label()));

/// Mean and standard deviation of evaluation return
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvalSummary {
    pub mean: f64,
    pub std: f64,
}

impl EvalSummary {
    pub fn new(mean: f64, std: f64) -> Self {
        Self { mean, std }
    }

    pub fn lower(&self) -> f64 {
        self.mean - self.std
    }

    pub fn upper(&self) -> f64 {
        self.mean + self.std
    }
}

/// First value logged under `metric`, or `None` if the label never appears
pub fn extract_scalar(text: &str, metric: Metric) -> Option<f64> {
    metric
        .pattern()
        .captures(text)
        .and_then(|caps| caps[1].parse().ok())
}

/// Every value logged under `metric`, in the order they appear
pub fn extract_all(text: &str, metric: Metric) -> Vec<f64> {
    metric
        .pattern()
        .captures_iter(text)
        .filter_map(|caps| caps[1].parse().ok())
        .collect()
}

/// First evaluation mean/std pair. Both must be present.
pub fn extract_eval(text: &str) -> Option<EvalSummary> {
    let mean = extract_scalar(text, Metric::EvalAverageReturn)?;
    let std = extract_scalar(text, Metric::EvalStdReturn)?;
    Some(EvalSummary::new(mean, std))
}

/// One evaluation pair per training iteration, in execution order.
///
/// Means and stds are paired by position; a trailing unpaired value is
/// dropped.
pub fn extract_eval_series(text: &str) -> Vec<EvalSummary> {
    extract_all(text, Metric::EvalAverageReturn)
        .into_iter()
        .zip(extract_all(text, Metric::EvalStdReturn))
        .map(|(mean, std)| EvalSummary::new(mean, std))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const DAGGER_LOG: &str = "\
********** Iteration 0 ************
Collecting data to be used for training...
Training agent using sampled data from replay buffer...
Eval_AverageReturn : 1012.5
Eval_StdReturn : 12.25
Train_AverageReturn : 4713.6533203125
Initial_DataCollection_AverageReturn : 4713.6533203125
Done logging...

********** Iteration 1 ************
Eval_AverageReturn : 2500
Eval_StdReturn : 30.5
Train_AverageReturn : 4700.1
Done logging...

********** Iteration 2 ************
Eval_AverageReturn : 4600.75
Eval_StdReturn : 80.0
Done logging...
";

    #[test]
    fn test_extract_eval_pair() {
        let text = "Eval_AverageReturn : 1234.56\nEval_StdReturn : 78.90\n";
        assert_eq!(extract_eval(text), Some(EvalSummary::new(1234.56, 78.90)));
    }

    #[test]
    fn test_missing_label_yields_none() {
        let text = "Eval_StdReturn : 78.90\nTraceback (most recent call last):\n";
        assert_eq!(extract_scalar(text, Metric::EvalAverageReturn), None);
        assert_eq!(extract_eval(text), None);
        assert_eq!(extract_scalar("", Metric::EvalStdReturn), None);
    }

    #[test]
    fn test_series_in_appearance_order() {
        let series = extract_eval_series(DAGGER_LOG);
        assert_eq!(
            series,
            vec![
                EvalSummary::new(1012.5, 12.25),
                EvalSummary::new(2500.0, 30.5),
                EvalSummary::new(4600.75, 80.0),
            ]
        );
    }

    #[test]
    fn test_initial_return_is_not_an_eval_return() {
        assert_eq!(
            extract_scalar(DAGGER_LOG, Metric::InitialDataCollectionAverageReturn),
            Some(4713.6533203125)
        );
        assert_eq!(extract_all(DAGGER_LOG, Metric::EvalAverageReturn).len(), 3);

        let text = "Initial_DataCollection_AverageReturn : 99.0\n";
        assert_eq!(extract_scalar(text, Metric::EvalAverageReturn), None);
    }

    #[test]
    fn test_whitespace_around_colon() {
        assert_eq!(extract_scalar("Eval_StdReturn:3.5", Metric::EvalStdReturn), Some(3.5));
        assert_eq!(extract_scalar("Eval_StdReturn   :\t3.5", Metric::EvalStdReturn), Some(3.5));
    }

    #[test]
    fn test_labels_are_case_sensitive() {
        assert_eq!(extract_scalar("eval_averagereturn : 1.0", Metric::EvalAverageReturn), None);
    }

    #[test]
    fn test_signed_and_exponent_values() {
        assert_eq!(extract_scalar("Eval_AverageReturn : -54.25", Metric::EvalAverageReturn), Some(-54.25));
        assert_eq!(extract_scalar("Eval_AverageReturn : 1.5e3", Metric::EvalAverageReturn), Some(1500.0));
        assert_eq!(extract_scalar("Eval_AverageReturn : .5", Metric::EvalAverageReturn), Some(0.5));
    }

    #[test]
    fn test_unpaired_trailing_mean_is_dropped() {
        let text = "Eval_AverageReturn : 1\nEval_StdReturn : 0.1\nEval_AverageReturn : 2\n";
        assert_eq!(extract_eval_series(text), vec![EvalSummary::new(1.0, 0.1)]);
    }

    #[test]
    fn test_error_bounds() {
        let summary = EvalSummary::new(10.0, 2.5);
        assert_eq!(summary.lower(), 7.5);
        assert_eq!(summary.upper(), 12.5);
    }

    proptest! {
        #[test]
        fn test_logged_values_round_trip(mean in -1.0e6f64..1.0e6, std in 0.0f64..1.0e5) {
            let text = format!("noise\nEval_AverageReturn : {}\nmore noise\nEval_StdReturn : {}\n", mean, std);
            prop_assert_eq!(extract_eval(&text), Some(EvalSummary::new(mean, std)));
        }
    }
}
