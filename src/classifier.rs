use serde::{Deserialize, Serialize};

/// Full-batch training schedule for the softmax fit. Deterministic: zero
/// initialization, fixed epoch count, no shuffling inside the fit itself.
#[derive(Debug, Clone, Copy)]
pub struct TrainConfig {
    pub epochs: usize,
    pub learning_rate: f64,
    pub lr_decay: f64,
    pub l2: f64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        TrainConfig {
            epochs: 300,
            learning_rate: 0.5,
            lr_decay: 0.01,
            l2: 1e-3,
        }
    }
}

/// Multinomial logistic model over an encoded situation vector. Weights
/// are row-major per class; `classes` fixes the output order everywhere
/// the model is read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoftmaxModel {
    pub classes: Vec<String>,
    pub weights: Vec<Vec<f64>>,
    pub bias: Vec<f64>,
}

impl SoftmaxModel {
    /// Fits by full-batch gradient descent on the cross-entropy loss with
    /// L2 shrinkage and a decaying step size. `labels` index into
    /// `classes`.
    pub fn fit(
        features: &[Vec<f64>],
        labels: &[usize],
        classes: Vec<String>,
        cfg: TrainConfig,
    ) -> SoftmaxModel {
        let k = classes.len();
        let width = features.first().map(Vec::len).unwrap_or(0);
        let mut model = SoftmaxModel {
            classes,
            weights: vec![vec![0.0; width]; k],
            bias: vec![0.0; k],
        };
        if k == 0 || features.is_empty() {
            return model;
        }

        let n = features.len() as f64;
        let mut grad_w = vec![vec![0.0; width]; k];
        let mut grad_b = vec![0.0; k];
        for epoch in 0..cfg.epochs {
            for row in &mut grad_w {
                row.fill(0.0);
            }
            grad_b.fill(0.0);

            for (x, &label) in features.iter().zip(labels) {
                let probs = model.predict_proba(x);
                for c in 0..k {
                    let err = probs[c] - if c == label { 1.0 } else { 0.0 };
                    for (g, xv) in grad_w[c].iter_mut().zip(x) {
                        *g += err * xv;
                    }
                    grad_b[c] += err;
                }
            }

            let lr = cfg.learning_rate / (1.0 + cfg.lr_decay * epoch as f64);
            for c in 0..k {
                for j in 0..width {
                    let g = grad_w[c][j] / n + cfg.l2 * model.weights[c][j];
                    model.weights[c][j] -= lr * g;
                }
                model.bias[c] -= lr * grad_b[c] / n;
            }
        }
        model
    }

    /// Class probabilities via max-shifted softmax, stable for large
    /// scores.
    pub fn predict_proba(&self, x: &[f64]) -> Vec<f64> {
        let scores: Vec<f64> = self
            .weights
            .iter()
            .zip(&self.bias)
            .map(|(w, b)| dot(w, x) + b)
            .collect();
        let max = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let exps: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
        let total: f64 = exps.iter().sum();
        if total > 0.0 {
            exps.iter().map(|e| e / total).collect()
        } else {
            vec![1.0 / self.classes.len().max(1) as f64; self.classes.len()]
        }
    }

    /// Index of the most probable class.
    pub fn predict(&self, x: &[f64]) -> usize {
        let probs = self.predict_proba(x);
        let mut best = 0;
        for (i, p) in probs.iter().enumerate() {
            if *p > probs[best] {
                best = i;
            }
        }
        best
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

pub fn accuracy(model: &SoftmaxModel, features: &[Vec<f64>], labels: &[usize]) -> f64 {
    if features.is_empty() {
        return 0.0;
    }
    let hits = features
        .iter()
        .zip(labels)
        .filter(|&(ref x, &y)| model.predict(x) == y)
        .count();
    hits as f64 / features.len() as f64
}

/// Mean negative log-likelihood of the true class, clamped away from
/// log(0).
pub fn log_loss(model: &SoftmaxModel, features: &[Vec<f64>], labels: &[usize]) -> f64 {
    if features.is_empty() {
        return 0.0;
    }
    let mut total = 0.0;
    for (x, &y) in features.iter().zip(labels) {
        let p = model.predict_proba(x)[y].max(1e-15);
        total -= p.ln();
    }
    total / features.len() as f64
}

/// Holdout precision/recall for one class.
#[derive(Debug, Clone)]
pub struct ClassReport {
    pub class: String,
    pub precision: f64,
    pub recall: f64,
    pub support: usize,
}

pub fn class_report(
    model: &SoftmaxModel,
    features: &[Vec<f64>],
    labels: &[usize],
) -> Vec<ClassReport> {
    let k = model.classes.len();
    let mut tp = vec![0usize; k];
    let mut fp = vec![0usize; k];
    let mut fn_ = vec![0usize; k];
    for (x, &y) in features.iter().zip(labels) {
        let pred = model.predict(x);
        if pred == y {
            tp[y] += 1;
        } else {
            fp[pred] += 1;
            fn_[y] += 1;
        }
    }
    (0..k)
        .map(|c| {
            let predicted = tp[c] + fp[c];
            let actual = tp[c] + fn_[c];
            ClassReport {
                class: model.classes[c].clone(),
                precision: if predicted > 0 { tp[c] as f64 / predicted as f64 } else { 0.0 },
                recall: if actual > 0 { tp[c] as f64 / actual as f64 } else { 0.0 },
                support: actual,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn separable_two_class() -> (Vec<Vec<f64>>, Vec<usize>) {
        let mut xs = Vec::new();
        let mut ys = Vec::new();
        for i in 0..20 {
            let wiggle = (i % 5) as f64 * 0.05;
            xs.push(vec![1.0 + wiggle, 1.0 - wiggle]);
            ys.push(0);
            xs.push(vec![-1.0 - wiggle, -1.0 + wiggle]);
            ys.push(1);
        }
        (xs, ys)
    }

    #[test]
    fn separable_classes_are_learned() {
        let (xs, ys) = separable_two_class();
        let model = SoftmaxModel::fit(
            &xs,
            &ys,
            vec!["Run".into(), "Pass".into()],
            TrainConfig::default(),
        );
        assert_eq!(accuracy(&model, &xs, &ys), 1.0);
        assert!(log_loss(&model, &xs, &ys) < (2.0f64).ln());
    }

    #[test]
    fn probabilities_sum_to_one() {
        let (xs, ys) = separable_two_class();
        let model = SoftmaxModel::fit(
            &xs,
            &ys,
            vec!["Run".into(), "Pass".into()],
            TrainConfig::default(),
        );
        for x in &xs {
            let p = model.predict_proba(x);
            assert_eq!(p.len(), 2);
            assert!((p.iter().sum::<f64>() - 1.0).abs() < 1e-9);
            assert!(p.iter().all(|v| *v >= 0.0));
        }
    }

    #[test]
    fn three_classes_separate_on_axes() {
        let mut xs = Vec::new();
        let mut ys = Vec::new();
        for i in 0..15 {
            let w = (i % 3) as f64 * 0.1;
            xs.push(vec![2.0 + w, 0.0, 0.0]);
            ys.push(0);
            xs.push(vec![0.0, 2.0 + w, 0.0]);
            ys.push(1);
            xs.push(vec![0.0, 0.0, 2.0 + w]);
            ys.push(2);
        }
        let model = SoftmaxModel::fit(
            &xs,
            &ys,
            vec!["Left".into(), "Right".into(), "Middle".into()],
            TrainConfig::default(),
        );
        assert_eq!(accuracy(&model, &xs, &ys), 1.0);
        let report = class_report(&model, &xs, &ys);
        assert_eq!(report.len(), 3);
        for r in &report {
            assert_eq!(r.precision, 1.0);
            assert_eq!(r.recall, 1.0);
            assert_eq!(r.support, 15);
        }
    }

    #[test]
    fn fit_is_deterministic() {
        let (xs, ys) = separable_two_class();
        let classes = vec!["Run".to_string(), "Pass".to_string()];
        let a = SoftmaxModel::fit(&xs, &ys, classes.clone(), TrainConfig::default());
        let b = SoftmaxModel::fit(&xs, &ys, classes, TrainConfig::default());
        assert_eq!(a.weights, b.weights);
        assert_eq!(a.bias, b.bias);
    }

    #[test]
    fn single_class_always_predicts_it() {
        let xs = vec![vec![0.3, -0.2]; 8];
        let ys = vec![0usize; 8];
        let model = SoftmaxModel::fit(&xs, &ys, vec!["Pass".into()], TrainConfig::default());
        assert_eq!(model.predict(&[5.0, 5.0]), 0);
        assert_eq!(model.predict_proba(&[5.0, 5.0]), vec![1.0]);
    }
}
