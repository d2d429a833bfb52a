/// Online assessment: hazard alerts and flood risk aggregation.
///
/// Submodules:
/// - `engine` — heatwave, cold wave and storm checks over recent + forecast data.
/// - `risk`   — combines an external flood probability with active alerts.

pub mod engine;
pub mod risk;

pub use engine::{Alert, AlertEngine, AlertKind, AlertSeverity, AlertThresholds};
pub use risk::{aggregate, ClassifierOutcome, ContributingFactors, RiskAssessment, RiskCategory};
