pub mod clear_sky;
pub mod coefficients;
pub mod collaborators;
pub mod coordinates;
pub mod geoadmin;
pub mod orchestrator;
pub mod pvgis;
pub mod regional_irradiance;
pub mod roof_estimator;
pub mod simulation;
pub mod yield_calculator;
