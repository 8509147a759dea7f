/// Training, prediction and inspection entry points
///
/// - `Trainer`: dataset → noise → stratified split → fit → evaluate → persist
/// - `Predictor`: one feature vector in, one risk response out
/// - `InspectionReport`: read-only model summary with a sample prediction
pub mod inspector;
pub mod predictor;
pub mod trainer;

pub use inspector::InspectionReport;
pub use predictor::{assess_risk, render_line, Predictor};
pub use trainer::{Trainer, TrainingReport};
