/// Training data ingestion and augmentation
///
/// - CSV loading with fail-fast on a missing file
/// - Gaussian sensor-noise simulation with a non-negativity floor
pub mod loader;
pub mod noise;

pub use loader::{load_dataset, read_dataset, Dataset, LABEL_COLUMN};
pub use noise::{NoiseAugmenter, NoiseConfig};
