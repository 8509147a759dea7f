use crate::ml::models::{ClassMetrics, ModelMetrics};
use ndarray::Array2;
use std::collections::BTreeMap;
use std::fmt::Write;

/// Accuracy, per-class precision/recall/F1 and averages on held-out data
pub fn evaluate(y_true: &[usize], y_pred: &[usize], classes: &[String]) -> ModelMetrics {
    let n_classes = classes.len();
    let mut confusion = Array2::<usize>::zeros((n_classes, n_classes));
    for (&t, &p) in y_true.iter().zip(y_pred) {
        if t < n_classes && p < n_classes {
            confusion[[t, p]] += 1;
        }
    }

    let n_samples = y_true.len();
    let correct: usize = (0..n_classes).map(|c| confusion[[c, c]]).sum();
    let accuracy = if n_samples > 0 {
        correct as f64 / n_samples as f64
    } else {
        0.0
    };

    let mut per_class = BTreeMap::new();
    let mut ordered = Vec::with_capacity(n_classes);
    for (class_idx, name) in classes.iter().enumerate() {
        let tp = confusion[[class_idx, class_idx]];
        let predicted: usize = confusion.column(class_idx).sum();
        let support: usize = confusion.row(class_idx).sum();

        let precision = ratio(tp, predicted);
        let recall = ratio(tp, support);
        let f1_score = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };

        let metrics = ClassMetrics {
            precision,
            recall,
            f1_score,
            support,
        };
        ordered.push(metrics.clone());
        per_class.insert(name.clone(), metrics);
    }

    ModelMetrics {
        accuracy,
        macro_avg: average(&ordered, false),
        weighted_avg: average(&ordered, true),
        confusion_matrix: confusion,
        per_class_metrics: per_class,
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den > 0 {
        num as f64 / den as f64
    } else {
        0.0
    }
}

fn average(metrics: &[ClassMetrics], weighted: bool) -> ClassMetrics {
    let support: usize = metrics.iter().map(|m| m.support).sum();
    let weights: Vec<f64> = metrics
        .iter()
        .map(|m| if weighted { m.support as f64 } else { 1.0 })
        .collect();
    let total: f64 = weights.iter().sum();
    let mean = |f: fn(&ClassMetrics) -> f64| {
        if total > 0.0 {
            metrics.iter().zip(&weights).map(|(m, w)| f(m) * w).sum::<f64>() / total
        } else {
            0.0
        }
    };

    ClassMetrics {
        precision: mean(|m| m.precision),
        recall: mean(|m| m.recall),
        f1_score: mean(|m| m.f1_score),
        support,
    }
}

impl ModelMetrics {
    /// Tabular report, one row per class followed by accuracy and averages
    pub fn report(&self) -> String {
        let width = self
            .per_class_metrics
            .keys()
            .map(String::len)
            .chain(std::iter::once("weighted avg".len()))
            .max()
            .unwrap_or(12);

        let mut out = String::new();
        let _ = writeln!(
            out,
            "{:>width$} {:>9} {:>9} {:>9} {:>9}",
            "", "precision", "recall", "f1-score", "support"
        );
        out.push('\n');
        for (name, m) in &self.per_class_metrics {
            let _ = writeln!(out, "{}", row(name, m, width));
        }
        out.push('\n');
        let support = self.macro_avg.support;
        let _ = writeln!(
            out,
            "{:>width$} {:>9} {:>9} {:>9.2} {:>9}",
            "accuracy", "", "", self.accuracy, support
        );
        let _ = writeln!(out, "{}", row("macro avg", &self.macro_avg, width));
        let _ = writeln!(out, "{}", row("weighted avg", &self.weighted_avg, width));
        out
    }
}

fn row(name: &str, m: &ClassMetrics, width: usize) -> String {
    format!(
        "{:>width$} {:>9.2} {:>9.2} {:>9.2} {:>9}",
        name, m.precision, m.recall, m.f1_score, m.support
    )
}
