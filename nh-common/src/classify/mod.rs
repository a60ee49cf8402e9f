//! Genre-affinity classification
//!
//! Feature selection, the classifier contract, the bundled linear model
//! artifact and the adapter interpreting classifier output.

pub mod adapter;
pub mod classifier;
pub mod features;
pub mod labels;
pub mod linear;

pub use adapter::{run_predictions, Prediction, TopClass};
pub use classifier::{Classifier, ClassifierError, ClassifierHandle, ConfidenceClassifier};
pub use features::{select_feature_columns, FeatureMatrix};
pub use labels::{class_code_to_label, ClassCode, CLASS_LABELS};
pub use linear::{load_classifier, LinearModel};
